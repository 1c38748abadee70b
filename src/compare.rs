// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Comparator kernels: type-aware comparison of tagged values.
//!
//! Every operator follows the same two-step contract: pick a comparison
//! kind from the operand shapes, then run the kind-specific kernel. Shape
//! mismatches are non-matches, never errors, so a query stays total over
//! heterogeneous records.

use crate::ast::CompareOp;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Str,
    Int,
    Uint,
    Ref,
}

/// Compare two operand values under the given operator.
pub(crate) fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    match kind_of(left, right) {
        Kind::Str => compare_str(op, left, right),
        Kind::Int => compare_int(op, left, right),
        Kind::Uint => compare_uint(op, left, right),
        Kind::Ref => compare_ref(op, left, right),
    }
}

/// The scalar kind of a single operand. Containers contribute the kind of
/// their first element; an empty container counts as string.
fn scalar_kind(v: &Value) -> Kind {
    match v {
        Value::Str(_) => Kind::Str,
        Value::Int(_) => Kind::Int,
        Value::Uint(_) => Kind::Uint,
        Value::Nil => Kind::Ref,
        Value::List(items) => items.first().map(scalar_kind).unwrap_or(Kind::Str),
        Value::Map(entries) => entries.values().next().map(scalar_kind).unwrap_or(Kind::Str),
    }
}

/// The comparison kind for a pair of operands: the first non-string side
/// wins, so a literal beside a numeric field compares numerically.
fn kind_of(left: &Value, right: &Value) -> Kind {
    let lk = scalar_kind(left);
    if lk != Kind::Str {
        lk
    } else {
        scalar_kind(right)
    }
}

/// The elements of a container operand, `None` for scalars. Maps behave as
/// the list of their values.
fn elements(v: &Value) -> Option<Vec<&Value>> {
    match v {
        Value::List(items) => Some(items.iter().collect()),
        Value::Map(entries) => Some(entries.values().collect()),
        _ => None,
    }
}

fn scalar_str(v: &Value) -> Option<&str> {
    match v {
        Value::Str(s) => Some(s),
        _ => None,
    }
}

fn strip_single_quotes(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

// =========================================================================
// String kernel
// =========================================================================

fn compare_str(op: CompareOp, left: &Value, right: &Value) -> bool {
    match op {
        CompareOp::Eq => str_eq(left, right),
        CompareOp::Neq => str_rel(left, right, |a, z| a != z),
        CompareOp::Gt => str_rel(left, right, |a, z| a > z),
        CompareOp::Lt => str_rel(left, right, |a, z| a < z),
        CompareOp::Gte => str_rel(left, right, |a, z| a >= z),
        CompareOp::Lte => str_rel(left, right, |a, z| a <= z),
        CompareOp::In => str_in(left, right),
        CompareOp::NotIn => !str_in(left, right),
    }
}

/// String equality with the special cases: `nil` matches empty, a bare `*`
/// on either side always matches, and a right side containing `*` matches
/// if any non-empty fragment between the stars is a substring of the left
/// (contains-any, not a strict glob). A container on either side matches
/// if any element does.
fn str_eq(left: &Value, right: &Value) -> bool {
    if let Some(items) = elements(left) {
        return items.into_iter().any(|v| str_eq(v, right));
    }
    if let Some(items) = elements(right) {
        return items.into_iter().any(|v| str_eq(left, v));
    }
    let (a, z) = match (scalar_str(left), scalar_str(right)) {
        (Some(a), Some(z)) => (strip_single_quotes(a), strip_single_quotes(z)),
        _ => return false,
    };
    if a == "nil" && z.is_empty() || z == "nil" && a.is_empty() {
        return true;
    }
    if a == "*" || z == "*" {
        return true;
    }
    if z.contains('*') {
        return z.split('*').any(|part| !part.is_empty() && a.contains(part));
    }
    a == z
}

/// Plain lexical relation, no wildcards. Containers match any-element.
fn str_rel(left: &Value, right: &Value, rel: fn(&str, &str) -> bool) -> bool {
    if let Some(items) = elements(left) {
        return items.into_iter().any(|v| str_rel(v, right, rel));
    }
    if let Some(items) = elements(right) {
        return items.into_iter().any(|v| str_rel(left, v, rel));
    }
    match (scalar_str(left), scalar_str(right)) {
        (Some(a), Some(z)) => rel(strip_single_quotes(a), strip_single_quotes(z)),
        _ => false,
    }
}

/// Membership of the left in the right's `[a,b,c]` list literal. Always
/// case-insensitive.
fn str_in(left: &Value, right: &Value) -> bool {
    if let Some(items) = elements(left) {
        return items.into_iter().any(|v| str_in(v, right));
    }
    let a = match scalar_str(left) {
        Some(a) => strip_single_quotes(a).to_lowercase(),
        None => return false,
    };
    let z = match scalar_str(right) {
        Some(z) => z,
        None => return false,
    };
    match bracket_list(z) {
        Some(values) => values.iter().any(|v| v.to_lowercase() == a),
        None => false,
    }
}

// =========================================================================
// Integer kernels
// =========================================================================

fn to_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(*i),
        Value::Uint(u) => i64::try_from(*u).ok(),
        Value::Str(s) => s.parse().ok(),
        _ => None,
    }
}

fn to_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Uint(u) => Some(*u),
        Value::Int(i) => u64::try_from(*i).ok(),
        Value::Str(s) => s.parse().ok(),
        _ => None,
    }
}

fn is_nil_literal(v: &Value) -> bool {
    matches!(v, Value::Str(s) if s == "nil")
}

fn compare_int(op: CompareOp, left: &Value, right: &Value) -> bool {
    match op {
        CompareOp::Eq => int_eq(left, right),
        CompareOp::Neq => int_rel(left, right, |a, z| a != z),
        CompareOp::Gt => int_rel(left, right, |a, z| a > z),
        CompareOp::Lt => int_rel(left, right, |a, z| a < z),
        CompareOp::Gte => int_rel(left, right, |a, z| a >= z),
        CompareOp::Lte => int_rel(left, right, |a, z| a <= z),
        CompareOp::In => int_in(left, right, to_i64),
        CompareOp::NotIn => !int_in(left, right, to_i64),
    }
}

/// Signed equality with the nil concession: the literal `nil` on one side
/// matches a parsed zero on the other.
fn int_eq(left: &Value, right: &Value) -> bool {
    if let Some(items) = elements(left) {
        return items.into_iter().any(|v| int_eq(v, right));
    }
    if let Some(items) = elements(right) {
        return items.into_iter().any(|v| int_eq(left, v));
    }
    let a = to_i64(left);
    let z = to_i64(right);
    if is_nil_literal(right) && a == Some(0) {
        return true;
    }
    if is_nil_literal(left) && z == Some(0) {
        return true;
    }
    matches!((a, z), (Some(a), Some(z)) if a == z)
}

fn int_rel(left: &Value, right: &Value, rel: fn(i64, i64) -> bool) -> bool {
    if let Some(items) = elements(left) {
        return items.into_iter().any(|v| int_rel(v, right, rel));
    }
    if let Some(items) = elements(right) {
        return items.into_iter().any(|v| int_rel(left, v, rel));
    }
    match (to_i64(left), to_i64(right)) {
        (Some(a), Some(z)) => rel(a, z),
        _ => false,
    }
}

/// Membership of the left in the right's `[n,m,...]` list literal, parsed
/// with the given conversion. An unparseable element is a non-match.
fn int_in<T: PartialEq>(left: &Value, right: &Value, conv: fn(&Value) -> Option<T>) -> bool {
    if let Some(items) = elements(left) {
        return items.into_iter().any(|v| int_in(v, right, conv));
    }
    let a = match conv(left) {
        Some(a) => a,
        None => return false,
    };
    let z = match scalar_str(right) {
        Some(z) => z,
        None => return false,
    };
    let values = match bracket_list(z) {
        Some(values) => values,
        None => return false,
    };
    for v in values {
        match conv(&Value::Str(v.to_string())) {
            Some(n) => {
                if n == a {
                    return true;
                }
            }
            None => return false,
        }
    }
    false
}

fn compare_uint(op: CompareOp, left: &Value, right: &Value) -> bool {
    match op {
        CompareOp::Eq => uint_rel(left, right, |a, z| a == z),
        CompareOp::Neq => uint_rel(left, right, |a, z| a != z),
        CompareOp::Gt => uint_rel(left, right, |a, z| a > z),
        CompareOp::Lt => uint_rel(left, right, |a, z| a < z),
        CompareOp::Gte => uint_rel(left, right, |a, z| a >= z),
        CompareOp::Lte => uint_rel(left, right, |a, z| a <= z),
        CompareOp::In => int_in(left, right, to_u64),
        CompareOp::NotIn => !int_in(left, right, to_u64),
    }
}

/// Unsigned relation; unlike the signed kernel there is no nil concession.
fn uint_rel(left: &Value, right: &Value, rel: fn(u64, u64) -> bool) -> bool {
    if let Some(items) = elements(left) {
        return items.into_iter().any(|v| uint_rel(v, right, rel));
    }
    if let Some(items) = elements(right) {
        return items.into_iter().any(|v| uint_rel(left, v, rel));
    }
    match (to_u64(left), to_u64(right)) {
        (Some(a), Some(z)) => rel(a, z),
        _ => false,
    }
}

// =========================================================================
// Reference kernel
// =========================================================================

/// Equality only: the literal `nil` on one side matches an absent
/// reference on the other. Every other operator on the reference kind is a
/// type mismatch.
fn compare_ref(op: CompareOp, left: &Value, right: &Value) -> bool {
    if op != CompareOp::Eq {
        return false;
    }
    match (left, right) {
        (Value::Nil, Value::Str(s)) | (Value::Str(s), Value::Nil) => s == "nil",
        _ => false,
    }
}

/// The elements of a `[a,b,c]` list literal: the slice between the first
/// `[` and the first `]`, comma-split, single quotes stripped per element.
fn bracket_list(s: &str) -> Option<Vec<&str>> {
    let open = s.find('[')?;
    let close = s.find(']')?;
    if close < open {
        return None;
    }
    Some(s[open + 1..close].split(',').map(strip_single_quotes).collect())
}
