// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Boolean evaluation of a resolved criteria tree against records.
//!
//! Evaluation is purely functional: no mutation, no I/O, bounded by tree
//! depth. Missing branches are neutral under the active connective, so an
//! `or` node defaults its absent operands to false and everything else
//! defaults to true. The match-case flag is applied here, once per
//! comparator, before kernel dispatch.

use crate::ast::LogicalOp;
use crate::compare;
use crate::error::Result;
use crate::resolver::{ResolvedComparator, ResolvedCondition, ResolvedExpression};
use crate::schema::Record;
use crate::value::Value;

impl ResolvedExpression {
    /// Evaluate this node against a record.
    pub fn matches(&self, record: &dyn Record, match_case: bool) -> Result<bool> {
        let neutral = !matches!(self.op, Some(LogicalOp::Or));
        let mut cond = neutral;
        let mut child = neutral;
        let mut next = neutral;
        if let Some(c) = &self.condition {
            cond = c.matches(record, match_case)?;
        }
        if let Some(c) = &self.child {
            child = c.matches(record, match_case)?;
        }
        if let Some(n) = &self.next {
            next = n.matches(record, match_case)?;
        }
        Ok(match self.op {
            Some(LogicalOp::Or) => cond || child || next,
            // A missing connective behaves as AND.
            _ => cond && child && next,
        })
    }
}

impl ResolvedCondition {
    pub fn matches(&self, record: &dyn Record, match_case: bool) -> Result<bool> {
        let cmp = self.comparator.matches(record, match_case)?;
        let mut next = !matches!(self.op, Some(LogicalOp::Or));
        if let Some(n) = &self.next {
            next = n.matches(record, match_case)?;
        }
        Ok(match self.op {
            Some(LogicalOp::Or) => cmp || next,
            _ => cmp && next,
        })
    }
}

impl ResolvedComparator {
    /// Materialize both operands and dispatch to the kernels. An accessor
    /// failure on either side aborts the record's evaluation.
    pub fn matches(&self, record: &dyn Record, match_case: bool) -> Result<bool> {
        let left = match &self.left_binding {
            Some(binding) => binding.get(record)?,
            None => Value::Str(self.left.clone()),
        };
        let right = match &self.right_binding {
            Some(binding) => binding.get(record)?,
            None => Value::Str(self.right.clone()),
        };
        let (left, right) = if match_case {
            (left, right)
        } else {
            (left.to_lowercase(), right.to_lowercase())
        };
        Ok(compare::compare(self.op, &left, &right))
    }
}
