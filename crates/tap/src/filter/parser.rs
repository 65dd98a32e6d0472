//! Filter expression lexer and recursive-descent parser
//!
//! Precedence, loosest first: `or`, `and`, `not`, then a parenthesised
//! expression or a single field test.

use std::fmt;

use regex::Regex;

use super::expr::{CmpOp, Expr, Literal};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Int(i128),
    Str(String),
    Op(CmpOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "'{}'", name),
            Self::Int(v) => write!(f, "'{}'", v),
            Self::Str(s) => write!(f, "\"{}\"", s),
            Self::Op(op) => write!(f, "'{}'", op.symbol()),
            Self::And => f.write_str("'&&'"),
            Self::Or => f.write_str("'||'"),
            Self::Not => f.write_str("'!'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
        }
    }
}

#[derive(Debug)]
struct Spanned {
    token: Token,
    offset: usize,
}

/// Parse a complete filter expression
pub(crate) fn parse(input: &str) -> Result<Expr, String> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err("empty filter".to_string());
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;

    if let Some(extra) = parser.tokens.get(parser.pos) {
        return Err(format!(
            "unexpected {} at offset {}",
            extra.token, extra.offset
        ));
    }
    Ok(expr)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

fn tokenize(input: &str) -> Result<Vec<Spanned>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = match c {
            '(' => {
                chars.next();
                Token::LParen
            }
            ')' => {
                chars.next();
                Token::RParen
            }
            '&' | '|' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == c).is_none() {
                    return Err(format!("expected '{}{}' at offset {}", c, c, offset));
                }
                if c == '&' { Token::And } else { Token::Or }
            }
            '!' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == '=').is_some() {
                    Token::Op(CmpOp::Ne)
                } else {
                    Token::Not
                }
            }
            '=' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == '=').is_none() {
                    return Err(format!("expected '==' at offset {}", offset));
                }
                Token::Op(CmpOp::Eq)
            }
            '>' | '<' => {
                chars.next();
                let or_equal = chars.next_if(|&(_, n)| n == '=').is_some();
                Token::Op(match (c, or_equal) {
                    ('>', false) => CmpOp::Gt,
                    ('>', true) => CmpOp::Ge,
                    (_, false) => CmpOp::Lt,
                    (_, true) => CmpOp::Le,
                })
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        None => {
                            return Err(format!(
                                "unterminated string starting at offset {}",
                                offset
                            ));
                        }
                        Some((_, '"')) => break,
                        Some((at, '\\')) => match chars.next() {
                            Some((_, e @ ('"' | '\\'))) => value.push(e),
                            Some((_, e)) => {
                                return Err(format!("unknown escape '\\{}' at offset {}", e, at));
                            }
                            None => {
                                return Err(format!(
                                    "unterminated string starting at offset {}",
                                    offset
                                ));
                            }
                        },
                        Some((_, other)) => value.push(other),
                    }
                }
                Token::Str(value)
            }
            '-' | '0'..='9' => {
                let mut text = String::new();
                while let Some((_, n)) =
                    chars.next_if(|&(_, n)| n.is_ascii_alphanumeric() || (n == '-' && text.is_empty()))
                {
                    text.push(n);
                }
                Token::Int(parse_int(&text).ok_or_else(|| {
                    format!("invalid integer '{}' at offset {}", text, offset)
                })?)
            }
            c if is_ident_start(c) => {
                let mut name = String::new();
                while let Some((_, n)) = chars.next_if(|&(_, n)| is_ident_char(n)) {
                    name.push(n);
                }
                keyword(&name).unwrap_or(Token::Ident(name))
            }
            other => {
                return Err(format!("unexpected character '{}' at offset {}", other, offset));
            }
        };

        tokens.push(Spanned { token, offset });
    }

    Ok(tokens)
}

fn keyword(word: &str) -> Option<Token> {
    Some(match word {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "eq" => Token::Op(CmpOp::Eq),
        "ne" => Token::Op(CmpOp::Ne),
        "gt" => Token::Op(CmpOp::Gt),
        "ge" => Token::Op(CmpOp::Ge),
        "lt" => Token::Op(CmpOp::Lt),
        "le" => Token::Op(CmpOp::Le),
        _ => return None,
    })
}

fn parse_int(text: &str) -> Option<i128> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i128::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i128>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Deepest nesting of `!` and parentheses a filter may use
pub(crate) const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Open `!` and `(` around the current position
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn next(&mut self) -> Option<&Spanned> {
        let spanned = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(spanned)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Enter one nesting level opened by the token at `offset`
    fn descend(&mut self, offset: usize) -> Result<(), String> {
        if self.depth >= MAX_DEPTH {
            return Err(format!("filter nested too deeply at offset {}", offset));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut terms = vec![self.parse_and()?];
        while self.eat(&Token::Or) {
            terms.push(self.parse_and()?);
        }
        Ok(match terms.len() {
            1 => terms.remove(0),
            _ => Expr::Or(terms),
        })
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut terms = vec![self.parse_unary()?];
        while self.eat(&Token::And) {
            terms.push(self.parse_unary()?);
        }
        Ok(match terms.len() {
            1 => terms.remove(0),
            _ => Expr::And(terms),
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        let Some(Spanned {
            token: Token::Not,
            offset,
        }) = self.tokens.get(self.pos)
        else {
            return self.parse_primary();
        };
        let offset = *offset;
        self.pos += 1;

        self.descend(offset)?;
        let inner = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Not(Box::new(inner)))
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        let Some(Spanned { token, offset }) = self.next() else {
            return Err("unexpected end of filter".to_string());
        };
        let offset = *offset;

        match token.clone() {
            Token::LParen => {
                self.descend(offset)?;
                let inner = self.parse_or()?;
                if !self.eat(&Token::RParen) {
                    return Err(format!("missing ')' for '(' at offset {}", offset));
                }
                self.depth -= 1;
                Ok(inner)
            }
            Token::Ident(field) => self.parse_test(field),
            other => Err(format!("unexpected {} at offset {}", other, offset)),
        }
    }

    fn parse_test(&mut self, field: String) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Op(op)) => {
                let op = *op;
                self.pos += 1;
                let value = self.parse_literal(op.symbol())?;
                Ok(Expr::Compare { field, op, value })
            }
            Some(Token::Ident(word)) if word == "contains" => {
                self.pos += 1;
                match self.parse_literal("contains")? {
                    Literal::Str(value) => Ok(Expr::Contains { field, value }),
                    _ => Err(format!("'contains' on {} needs a quoted string", field)),
                }
            }
            Some(Token::Ident(word)) if word == "matches" => {
                self.pos += 1;
                match self.parse_literal("matches")? {
                    Literal::Str(pattern) => {
                        let regex = Regex::new(&pattern)
                            .map_err(|e| format!("invalid regex \"{}\": {}", pattern, e))?;
                        Ok(Expr::Matches { field, regex })
                    }
                    _ => Err(format!("'matches' on {} needs a quoted pattern", field)),
                }
            }
            _ => Ok(Expr::Exists(field)),
        }
    }

    fn parse_literal(&mut self, after: &str) -> Result<Literal, String> {
        match self.next().map(|s| s.token.clone()) {
            Some(Token::Int(v)) => Ok(Literal::Int(v)),
            Some(Token::Str(s)) => Ok(Literal::Str(s)),
            Some(Token::Ident(word)) if word == "true" => Ok(Literal::Bool(true)),
            Some(Token::Ident(word)) if word == "false" => Ok(Literal::Bool(false)),
            _ => Err(format!("expected a value after '{}'", after)),
        }
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
