// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Tagged field values produced by schema accessors.
//!
//! The query core never inspects host record types directly. Accessors
//! materialize fields into this closed variant and the comparator kernels
//! dispatch on its shape.

use std::collections::BTreeMap;

/// A field value materialized by an [`Accessor`](crate::schema::Accessor).
///
/// The accessor chooses the shape once; the kernels never probe beyond it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Uint(u64),
    /// An absent reference (nil pointer, unset optional field).
    Nil,
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(u) => Some(*u),
            Value::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Lowercase every string in this value, recursing into containers.
    /// Non-string shapes are returned unchanged. Applied by the evaluator
    /// when the query's match-case flag is off.
    pub fn to_lowercase(&self) -> Value {
        match self {
            Value::Str(s) => Value::Str(s.to_lowercase()),
            Value::List(items) => Value::List(items.iter().map(Value::to_lowercase).collect()),
            Value::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_lowercase()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Value {
        Value::Uint(u)
    }
}
