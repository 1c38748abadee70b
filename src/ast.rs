// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! OQL abstract syntax tree types.
//!
//! The parser produces a [`ParsedQuery`]: the header clauses plus the WHERE
//! criteria as a tree of [`Expression`] nodes over [`Condition`] chains of
//! [`Comparator`] leaves. The types serialize to JSON so a parsed query can
//! cross a process boundary before being resolved against a local schema.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A parsed OQL query: header clauses plus the optional WHERE criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// The original query text, verbatim.
    pub text: String,
    /// Selected property names; empty or `["*"]` means all.
    pub properties: Vec<String>,
    pub root_type: String,
    pub criteria: Option<Expression>,
    pub sort_by: String,
    pub descending: bool,
    pub limit: i32,
    pub page: i32,
    pub match_case: bool,
    pub map_reduce: bool,
}

/// Comparison operators.
///
/// [`CompareOp::SCAN_ORDER`] is the fixed order the parser tries tokens in:
/// multi-character operators before their single-character prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Gte,   // >=
    Lte,   // <=
    Neq,   // !=
    Eq,    // =
    Gt,    // >
    Lt,    // <
    NotIn, // " not in "
    In,    // " in "
}

impl CompareOp {
    pub const SCAN_ORDER: [CompareOp; 8] = [
        CompareOp::Gte,
        CompareOp::Lte,
        CompareOp::Neq,
        CompareOp::Eq,
        CompareOp::Gt,
        CompareOp::Lt,
        CompareOp::NotIn,
        CompareOp::In,
    ];

    /// The source token, spaces included for the word operators.
    pub fn token(self) -> &'static str {
        match self {
            CompareOp::Gte => ">=",
            CompareOp::Lte => "<=",
            CompareOp::Neq => "!=",
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::NotIn => " not in ",
            CompareOp::In => " in ",
        }
    }
}

/// Logical connectives between comparators and between expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    /// The source token, spaces included.
    pub fn token(self) -> &'static str {
        match self {
            LogicalOp::And => " and ",
            LogicalOp::Or => " or ",
        }
    }
}

/// The predicate leaf: left operand, operator, right operand.
///
/// Operand text is already normalized (identifiers lowercased, quoted
/// literals stripped) but unbound; the resolver attaches accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparator {
    pub left: String,
    pub op: CompareOp,
    pub right: String,
}

/// A flat chain of comparators joined by per-link connectives at a single
/// parenthesization level. `op` is `None` on the terminal link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub comparator: Comparator,
    pub op: Option<LogicalOp>,
    pub next: Option<Box<Condition>>,
}

/// A node of the WHERE tree.
///
/// Exactly one of `condition` / `child` is present: `condition` holds a
/// flat chain at this level, `child` a parenthesized sub-tree. `next` is
/// the sibling expression in reading order, linked by `op`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub condition: Option<Condition>,
    pub child: Option<Box<Expression>>,
    pub op: Option<LogicalOp>,
    pub next: Option<Box<Expression>>,
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.left, self.op.token(), self.right)
    }
}

impl Condition {
    fn write_chain(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.comparator)?;
        if let (Some(op), Some(next)) = (self.op, &self.next) {
            write!(f, "{}", op.token())?;
            next.write_chain(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Condition {
    /// Renders the whole chain wrapped in parentheses: `(a=1 and b=2)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        self.write_chain(f)?;
        write!(f, ")")
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(condition) = &self.condition {
            write!(f, "{condition}")?;
        } else {
            write!(f, "(")?;
        }
        if let Some(child) = &self.child {
            write!(f, "{child}")?;
        }
        if self.condition.is_none() {
            write!(f, ")")?;
        }
        if let (Some(op), Some(next)) = (self.op, &self.next) {
            write!(f, "{}{}", op.token(), next)?;
        }
        Ok(())
    }
}

fn indent(lvl: usize) -> String {
    let mut out = String::from("|");
    for _ in 0..lvl {
        out.push_str("--");
    }
    out
}

impl Comparator {
    /// Indented one-line dump of this leaf, for debugging parse output.
    pub fn visualize(&self, lvl: usize) -> String {
        format!(
            "{}Comparator ({}{}{})\n",
            indent(lvl),
            self.left,
            self.op.token(),
            self.right
        )
    }
}

impl Condition {
    /// Indented dump of this chain, for debugging parse output.
    pub fn visualize(&self, lvl: usize) -> String {
        let mut out = format!("{}Condition\n", indent(lvl));
        out.push_str(&self.comparator.visualize(lvl + 1));
        if let (Some(op), Some(next)) = (self.op, &self.next) {
            out.push_str(&indent(lvl));
            out.push_str(op.token().trim());
            out.push('\n');
            out.push_str(&next.visualize(lvl));
        }
        out
    }
}

impl Expression {
    /// Indented dump of this tree, for debugging parse output.
    pub fn visualize(&self, lvl: usize) -> String {
        let mut out = format!("{}Expression\n", indent(lvl));
        if let Some(condition) = &self.condition {
            out.push_str(&condition.visualize(lvl + 1));
        }
        if let Some(child) = &self.child {
            out.push_str(&child.visualize(lvl + 1));
        }
        if let (Some(op), Some(next)) = (self.op, &self.next) {
            out.push_str(&indent(lvl));
            out.push_str(op.token().trim());
            out.push('\n');
            out.push_str(&next.visualize(lvl));
        }
        out
    }
}
