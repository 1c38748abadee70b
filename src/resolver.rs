// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Binds parsed identifiers to schema accessors.
//!
//! The resolver walks the parsed criteria tree and produces a parallel
//! resolved tree in which each comparator carries the accessors its
//! operands bound to. Either side of a comparator may bind; a side that
//! does not is a literal, and a comparator where neither side binds is
//! rejected.

use std::fmt;
use std::sync::Arc;

use crate::ast::{CompareOp, Comparator, Condition, Expression, LogicalOp};
use crate::error::{OqlError, Result};
use crate::schema::{Accessor, Schema, TypeNode};

/// A comparator with its operands bound against the schema.
pub struct ResolvedComparator {
    pub(crate) left: String,
    pub(crate) left_binding: Option<Arc<dyn Accessor>>,
    pub(crate) op: CompareOp,
    pub(crate) right: String,
    pub(crate) right_binding: Option<Arc<dyn Accessor>>,
}

/// A resolved condition chain.
pub struct ResolvedCondition {
    pub(crate) comparator: ResolvedComparator,
    pub(crate) op: Option<LogicalOp>,
    pub(crate) next: Option<Box<ResolvedCondition>>,
}

/// A resolved expression tree, evaluable against records.
pub struct ResolvedExpression {
    pub(crate) condition: Option<ResolvedCondition>,
    pub(crate) child: Option<Box<ResolvedExpression>>,
    pub(crate) op: Option<LogicalOp>,
    pub(crate) next: Option<Box<ResolvedExpression>>,
}

/// Fully qualify an identifier: prepend the lowercased root type name
/// unless the identifier already begins with it.
pub(crate) fn property_path(ident: &str, root_type: &str) -> String {
    let root = root_type.to_lowercase();
    if ident.to_lowercase().starts_with(&root) {
        ident.to_string()
    } else {
        format!("{root}.{ident}")
    }
}

pub(crate) fn resolve_expression(
    expr: &Expression,
    root: &TypeNode,
    schema: &dyn Schema,
) -> Result<ResolvedExpression> {
    let condition = match &expr.condition {
        Some(c) => Some(resolve_condition(c, root, schema)?),
        None => None,
    };
    let child = match &expr.child {
        Some(c) => Some(Box::new(resolve_expression(c, root, schema)?)),
        None => None,
    };
    let next = match &expr.next {
        Some(n) => Some(Box::new(resolve_expression(n, root, schema)?)),
        None => None,
    };
    Ok(ResolvedExpression {
        condition,
        child,
        op: expr.op,
        next,
    })
}

fn resolve_condition(
    cond: &Condition,
    root: &TypeNode,
    schema: &dyn Schema,
) -> Result<ResolvedCondition> {
    let comparator = resolve_comparator(&cond.comparator, root, schema)?;
    let next = match &cond.next {
        Some(n) => Some(Box::new(resolve_condition(n, root, schema)?)),
        None => None,
    };
    Ok(ResolvedCondition {
        comparator,
        op: cond.op,
        next,
    })
}

fn resolve_comparator(
    cmp: &Comparator,
    root: &TypeNode,
    schema: &dyn Schema,
) -> Result<ResolvedComparator> {
    let left_binding = schema.property_of(&property_path(&cmp.left, &root.type_name));
    let right_binding = schema.property_of(&property_path(&cmp.right, &root.type_name));
    if left_binding.is_none() && right_binding.is_none() {
        return Err(OqlError::Resolve(format!(
            "no property on either side of: {cmp}"
        )));
    }
    Ok(ResolvedComparator {
        left: cmp.left.clone(),
        left_binding,
        op: cmp.op,
        right: cmp.right.clone(),
        right_binding,
    })
}

impl ResolvedComparator {
    /// The literal side, when the other side carries the binding. Callers
    /// use this for fast-path lookups when the predicate reduces to
    /// `key = literal`.
    pub fn key_of(&self) -> &str {
        if self.left_binding.is_none() {
            &self.left
        } else if self.right_binding.is_none() {
            &self.right
        } else {
            ""
        }
    }

    /// The operand paired with `name`, scanning both sides.
    pub fn value_for_parameter(&self, name: &str) -> &str {
        if self.right == name {
            &self.left
        } else if self.left == name {
            &self.right
        } else {
            ""
        }
    }
}

impl ResolvedCondition {
    pub fn key_of(&self) -> &str {
        self.comparator.key_of()
    }

    pub fn value_for_parameter(&self, name: &str) -> &str {
        let val = self.comparator.value_for_parameter(name);
        if !val.is_empty() {
            return val;
        }
        match &self.next {
            Some(next) => next.value_for_parameter(name),
            None => "",
        }
    }
}

impl ResolvedExpression {
    pub fn key_of(&self) -> &str {
        if let Some(condition) = &self.condition {
            return condition.key_of();
        }
        if let Some(child) = &self.child {
            return child.key_of();
        }
        match &self.next {
            Some(next) => next.key_of(),
            None => "",
        }
    }

    pub fn value_for_parameter(&self, name: &str) -> &str {
        if let Some(condition) = &self.condition {
            let val = condition.value_for_parameter(name);
            if !val.is_empty() {
                return val;
            }
        }
        if let Some(child) = &self.child {
            let val = child.value_for_parameter(name);
            if !val.is_empty() {
                return val;
            }
        }
        if let Some(next) = &self.next {
            let val = next.value_for_parameter(name);
            if !val.is_empty() {
                return val;
            }
        }
        ""
    }
}

impl fmt::Display for ResolvedComparator {
    /// Bound sides render as their canonical property id, literal sides
    /// verbatim.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.left_binding {
            Some(binding) => write!(f, "{}", binding.property_id())?,
            None => write!(f, "{}", self.left)?,
        }
        write!(f, "{}", self.op.token())?;
        match &self.right_binding {
            Some(binding) => write!(f, "{}", binding.property_id()),
            None => write!(f, "{}", self.right),
        }
    }
}

impl ResolvedCondition {
    fn write_chain(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.comparator)?;
        if let (Some(op), Some(next)) = (self.op, &self.next) {
            write!(f, "{}", op.token())?;
            next.write_chain(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for ResolvedCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        self.write_chain(f)?;
        write!(f, ")")
    }
}

impl fmt::Display for ResolvedExpression {
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
