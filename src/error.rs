// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors surfaced by query construction and evaluation.
///
/// Parse and resolve errors abort construction. Eval errors abort a single
/// record's evaluation; the facade decides whether to propagate or log them.
#[derive(Error, Debug)]
pub enum OqlError {
    #[error("syntax error: {0}")]
    Parse(String),
    #[error("cannot resolve: {0}")]
    Resolve(String),
    #[error("accessor failure: {0}")]
    Eval(String),
}

pub type Result<T> = std::result::Result<T, OqlError>;
