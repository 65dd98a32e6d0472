//! Filter syntax tree and evaluation

use std::cmp::Ordering;

use regex::Regex;

use crate::packet::{DecodedPacket, FieldValue};

/// Relational operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CmpOp {
    fn test(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
        }
    }

    pub(crate) fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

/// Literal operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Literal {
    // i128 holds every u64 and i64 field value
    Int(i128),
    Str(String),
    Bool(bool),
}

#[derive(Debug)]
pub(crate) enum Expr {
    Exists(String),
    Compare {
        field: String,
        op: CmpOp,
        value: Literal,
    },
    Contains {
        field: String,
        value: String,
    },
    Matches {
        field: String,
        regex: Regex,
    },
    Not(Box<Expr>),
    /// At least two terms; chains stay flat so their length adds no depth
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub(crate) fn eval(&self, packet: &dyn DecodedPacket) -> bool {
        match self {
            Self::Exists(field) => packet.field(field).is_some(),
            Self::Compare { field, op, value } => packet
                .field(field)
                .is_some_and(|v| compare(v, *op, value)),
            Self::Contains { field, value } => packet
                .field(field)
                .is_some_and(|v| contains(v, value)),
            Self::Matches { field, regex } => packet.field(field).is_some_and(|v| match v {
                FieldValue::Str(s) => regex.is_match(s),
                FieldValue::Bytes(b) => std::str::from_utf8(b).is_ok_and(|s| regex.is_match(s)),
                _ => false,
            }),
            Self::Not(inner) => !inner.eval(packet),
            Self::And(terms) => terms.iter().all(|t| t.eval(packet)),
            Self::Or(terms) => terms.iter().any(|t| t.eval(packet)),
        }
    }

    /// Append every field name the expression reads, once each
    pub(crate) fn collect_fields(&self, out: &mut Vec<String>) {
        let field = match self {
            Self::Exists(field)
            | Self::Compare { field, .. }
            | Self::Contains { field, .. }
            | Self::Matches { field, .. } => field,
            Self::Not(inner) => return inner.collect_fields(out),
            Self::And(terms) | Self::Or(terms) => {
                for term in terms {
                    term.collect_fields(out);
                }
                return;
            }
        };
        if !out.iter().any(|f| f == field) {
            out.push(field.clone());
        }
    }
}

fn compare(value: FieldValue<'_>, op: CmpOp, literal: &Literal) -> bool {
    let ordering = match (value, literal) {
        (FieldValue::UInt(v), Literal::Int(l)) => i128::from(v).cmp(l),
        (FieldValue::Int(v), Literal::Int(l)) => i128::from(v).cmp(l),
        (FieldValue::Str(v), Literal::Str(l)) => v.cmp(l.as_str()),
        (FieldValue::Bytes(v), Literal::Str(l)) => v.cmp(l.as_bytes()),
        (FieldValue::Bool(v), Literal::Bool(l)) => {
            return match op {
                CmpOp::Eq => v == *l,
                CmpOp::Ne => v != *l,
                _ => false,
            };
        }
        _ => return false,
    };
    op.test(ordering)
}

fn contains(value: FieldValue<'_>, needle: &str) -> bool {
    match value {
        FieldValue::Str(s) => s.contains(needle),
        FieldValue::Bytes(b) => {
            let needle = needle.as_bytes();
            needle.is_empty() || b.windows(needle.len()).any(|w| w == needle)
        }
        _ => false,
    }
}
