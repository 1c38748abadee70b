// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! The query facade: a resolved, immutable query evaluable against records.
//!
//! A [`Query`] bundles the resolved criteria tree with the projection,
//! sort, paging and flag clauses of the header. Construction is
//! single-threaded; once built, the query is immutable and may be matched
//! against many records concurrently, provided the host accessors are
//! thread-safe for `get`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::ParsedQuery;
use crate::error::{OqlError, Result};
use crate::parser;
use crate::resolver::{self, ResolvedExpression};
use crate::schema::{Accessor, Record, Schema, TypeNode};
use crate::value::Value;

pub struct Query {
    root_type: TypeNode,
    properties: Vec<Arc<dyn Accessor>>,
    properties_map: HashMap<String, Arc<dyn Accessor>>,
    criteria: Option<ResolvedExpression>,
    sort_binding: Option<Arc<dyn Accessor>>,
    parsed: ParsedQuery,
}

impl Query {
    /// Parse and resolve a query text in one step.
    pub fn parse(text: &str, schema: &dyn Schema) -> Result<Query> {
        Query::from_parsed(parser::parse(text)?, schema)
    }

    /// Resolve an already-parsed query against a schema.
    pub fn from_parsed(parsed: ParsedQuery, schema: &dyn Schema) -> Result<Query> {
        let root_type = schema.node(&parsed.root_type).ok_or_else(|| {
            OqlError::Resolve(format!("unknown root type: {}", parsed.root_type))
        })?;

        let mut properties = Vec::new();
        let mut properties_map = HashMap::new();
        let star = parsed.properties.len() == 1 && parsed.properties[0] == "*";
        if !star {
            for col in &parsed.properties {
                let path = resolver::property_path(col, &root_type.type_name);
                let prop = schema
                    .property_of(&path)
                    .ok_or_else(|| OqlError::Resolve(format!("unknown column: {path}")))?;
                properties_map.insert(col.clone(), Arc::clone(&prop));
                properties.push(prop);
            }
        }

        let criteria = match &parsed.criteria {
            Some(expr) => Some(resolver::resolve_expression(expr, &root_type, schema)?),
            None => None,
        };

        let sort_binding = if parsed.sort_by.is_empty() {
            None
        } else {
            let path = format!("{}.{}", root_type.type_name, parsed.sort_by);
            Some(schema.property_of(&path).ok_or_else(|| {
                OqlError::Resolve(format!("unknown sort-by property: {path}"))
            })?)
        };

        Ok(Query {
            root_type,
            properties,
            properties_map,
            criteria,
            sort_binding,
            parsed,
        })
    }

    /// Evaluate the criteria against a record. A query without a WHERE
    /// clause matches everything.
    pub fn try_matches(&self, record: &dyn Record) -> Result<bool> {
        match &self.criteria {
            Some(criteria) => criteria.matches(record, self.parsed.match_case),
            None => Ok(true),
        }
    }

    /// Infallible match: an evaluation error is logged and the record is
    /// excluded.
    pub fn matches(&self, record: &dyn Record) -> bool {
        match self.try_matches(record) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::error!(query = %self.parsed.text, error = %e, "match failed");
                false
            }
        }
    }

    /// Keep the matching records. With `only_projected` set and a concrete
    /// projection list, each match is replaced by a fresh record of the
    /// same type carrying only the projected properties. Records that fail
    /// evaluation or projection are skipped.
    pub fn filter(
        &self,
        records: Vec<Box<dyn Record>>,
        only_projected: bool,
    ) -> Vec<Box<dyn Record>> {
        let mut result = Vec::new();
        for record in records {
            if !self.matches(record.as_ref()) {
                continue;
            }
            if !only_projected || self.properties.is_empty() {
                result.push(record);
            } else if let Some(projected) = self.project(record.as_ref()) {
                result.push(projected);
            }
        }
        result
    }

    fn project(&self, record: &dyn Record) -> Option<Box<dyn Record>> {
        let mut clone = record.fresh();
        for prop in &self.properties {
            let value = match prop.get(record) {
                Ok(value) => value,
                Err(e) => {
                    tracing::error!(property = prop.property_id(), error = %e, "projection read failed");
                    return None;
                }
            };
            if let Err(e) = prop.set(clone.as_mut(), value) {
                tracing::error!(property = prop.property_id(), error = %e, "projection write failed");
                return None;
            }
        }
        Some(clone)
    }

    /// The sort-by value of a record, `None` when the query has no sort-by
    /// clause or the accessor fails (logged).
    pub fn sort_key(&self, record: &dyn Record) -> Option<Value> {
        let binding = self.sort_binding.as_ref()?;
        match binding.get(record) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(error = %e, "sort key extraction failed");
                None
            }
        }
    }

    /// The literal side of the first comparator whose other side carries a
    /// binding; empty when there is no criteria or no such comparator.
    pub fn key_of(&self) -> &str {
        match &self.criteria {
            Some(criteria) => criteria.key_of(),
            None => "",
        }
    }

    /// The operand paired with `name` anywhere in the criteria, first hit
    /// wins; empty when absent.
    pub fn value_for_parameter(&self, name: &str) -> &str {
        match &self.criteria {
            Some(criteria) => criteria.value_for_parameter(name),
            None => "",
        }
    }

    /// Deterministic digest of the raw query text.
    pub fn hash(&self) -> String {
        blake3::hash(self.parsed.text.as_bytes()).to_hex().to_string()
    }

    pub fn text(&self) -> &str {
        &self.parsed.text
    }

    pub fn root_type(&self) -> &TypeNode {
        &self.root_type
    }

    pub fn criteria(&self) -> Option<&ResolvedExpression> {
        self.criteria.as_ref()
    }

    /// The projected accessors, in selection order. Empty for `*`.
    pub fn properties(&self) -> &[Arc<dyn Accessor>] {
        &self.properties
    }

    /// The projected accessors keyed by the selected column name.
    pub fn properties_map(&self) -> &HashMap<String, Arc<dyn Accessor>> {
        &self.properties_map
    }

    pub fn sort_by(&self) -> &str {
        &self.parsed.sort_by
    }

    pub fn descending(&self) -> bool {
        self.parsed.descending
    }

    pub fn limit(&self) -> i32 {
        self.parsed.limit
    }

    pub fn page(&self) -> i32 {
        self.parsed.page
    }

    pub fn match_case(&self) -> bool {
        self.parsed.match_case
    }

    pub fn map_reduce(&self) -> bool {
        self.parsed.map_reduce
    }

    pub fn parsed(&self) -> &ParsedQuery {
        &self.parsed
    }
}

impl fmt::Display for Query {
    /// Reconstructed query text from the resolved parts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Select ")?;
        for (i, prop) in self.properties.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", prop.property_id())?;
        }
        write!(f, " From {}", self.root_type.type_name)?;
        if let Some(criteria) = &self.criteria {
            write!(f, " Where {criteria}")?;
        }
        Ok(())
    }
}
