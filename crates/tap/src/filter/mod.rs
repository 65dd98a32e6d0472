//! Listener filters
//!
//! A listener may carry a filter: an expression compiled once at subscribe
//! time and evaluated against the fully decoded packet for every event on
//! the listener's tap. Compilation can fail (the subscription is refused);
//! evaluation cannot, a predicate that does not apply simply does not match.
//!
//! The compiler is pluggable through [`FilterCompiler`]. The built-in
//! [`FieldFilterCompiler`] understands a small display-filter language:
//!
//! | Form | Meaning |
//! |------|---------|
//! | `tcp` | field is present |
//! | `frame.len > 100` | comparison: `==` `!=` `>` `>=` `<` `<=` or `eq` `ne` `gt` `ge` `lt` `le` |
//! | `http.host contains "example"` | substring (strings) or byte sequence (bytes) |
//! | `http.user_agent matches "^curl/"` | regular expression |
//! | `a && b`, `a and b` | both |
//! | `a \|\| b`, `a or b` | either |
//! | `!a`, `not a` | negation |
//!
//! Literals are integers (decimal or `0x` hex, optionally negative), quoted
//! strings (`\"` and `\\` escapes) and `true`/`false`. Comparing values of
//! different kinds, or reading a field the packet lacks, yields false.

mod expr;
mod parser;

use std::fmt;

use crate::packet::DecodedPacket;

use self::expr::Expr;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// A filter ready to be evaluated against decoded packets
pub trait CompiledFilter: fmt::Debug {
    /// Check whether the packet passes the filter
    fn matches(&self, packet: &dyn DecodedPacket) -> bool;

    /// Fields the filter reads, primed on the packet before decoding
    fn fields(&self) -> &[String];
}

/// Turns filter text into a [`CompiledFilter`]
pub trait FilterCompiler: fmt::Debug {
    /// Compile a filter expression
    ///
    /// # Errors
    ///
    /// Returns a human-readable message when the expression is invalid.
    fn compile(&self, expr: &str) -> Result<Box<dyn CompiledFilter>, String>;
}

/// Compiler for the built-in field filter language
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldFilterCompiler;

impl FilterCompiler for FieldFilterCompiler {
    fn compile(&self, expr: &str) -> Result<Box<dyn CompiledFilter>, String> {
        FieldFilter::parse(expr).map(|f| Box::new(f) as Box<dyn CompiledFilter>)
    }
}

/// A compiled field filter
#[derive(Debug)]
pub struct FieldFilter {
    expr: Expr,
    fields: Vec<String>,
}

impl FieldFilter {
    /// Parse a filter expression
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending token and its offset.
    pub fn parse(input: &str) -> Result<Self, String> {
        let expr = parser::parse(input)?;
        let mut fields = Vec::new();
        expr.collect_fields(&mut fields);
        Ok(Self { expr, fields })
    }
}

impl CompiledFilter for FieldFilter {
    #[inline]
    fn matches(&self, packet: &dyn DecodedPacket) -> bool {
        self.expr.eval(packet)
    }

    fn fields(&self) -> &[String] {
        &self.fields
    }
}
