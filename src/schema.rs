// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! The host schema interface consumed by the query core.
//!
//! The core is oblivious to how records store their fields: the host
//! supplies a [`Schema`] that resolves type names and dotted property paths
//! into [`Accessor`] capabilities. Implementations may back accessors with
//! generated code, hand-written shims, or any other mechanism.

use std::any::Any;
use std::sync::Arc;

use crate::error::Result;
use crate::value::Value;

/// A record that can be evaluated against a query.
///
/// Host record types opt in by exposing `Any` downcasting (used by their
/// accessors) and a way to produce an empty instance of the same concrete
/// type, which projection populates through the projected accessors.
pub trait Record: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// An empty record of the same concrete type as `self`.
    fn fresh(&self) -> Box<dyn Record>;
}

/// Read/write capability for one dotted property path on a record type.
///
/// `get` must be safe to call from multiple threads at once; `set` is only
/// invoked on freshly allocated, unshared clones during projection.
pub trait Accessor: Send + Sync {
    fn get(&self, record: &dyn Record) -> Result<Value>;

    fn set(&self, record: &mut dyn Record, value: Value) -> Result<()>;

    /// The canonical dotted path identifier, e.g. `device.ports.speed`.
    fn property_id(&self) -> &str;
}

/// A root type resolved by the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    pub type_name: String,
}

/// The type schema supplied by the host application.
pub trait Schema: Send + Sync {
    /// Look up a root type by name. Lookups are case-insensitive.
    fn node(&self, type_name: &str) -> Option<TypeNode>;

    /// Look up the accessor for a dotted property path rooted at a type
    /// name, e.g. `device.vendor`. Lookups are case-insensitive.
    fn property_of(&self, path: &str) -> Option<Arc<dyn Accessor>>;
}
