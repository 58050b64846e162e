// Copyright 2026 Tracedb Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for Tracedb
//!
//! This module defines the recoverable errors surfaced to the SQL engine.
//! Invariant violations (forbidden mapping overlaps, missing id columns,
//! untranslatable constraint ops reaching execution) are programmer errors
//! and terminate the process via panics instead of appearing here.

use thiserror::Error;

/// Result type alias for Tracedb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the query bridge
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Planning errors (returned from BestIndex)
    // =========================================================================
    /// Table-function argument column has no constraint
    #[error("missing constraint on argument column '{column}' in function {function}")]
    MissingArgumentConstraint { function: String, column: String },

    /// Table-function argument column constrained with a non-equality op
    #[error("only equality constraints supported on argument column '{column}' in function {function}")]
    NonEqArgumentConstraint { function: String, column: String },

    /// Table-function argument column constrained more than once
    #[error("multiple constraints on argument column '{column}' in function {function}")]
    DuplicateArgumentConstraint { function: String, column: String },

    // =========================================================================
    // Execution errors (returned from Filter)
    // =========================================================================
    /// REGEXP right-hand side was not a string value
    #[error("regexp value has to be a string")]
    RegexValueNotString,

    /// REGEXP pattern failed to compile
    #[error("invalid regexp pattern '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    /// Invalid argument handed to a table function
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Table-function computation failed; message is wrapped with the table name
    #[error("{table}: {message}")]
    TableFunction { table: String, message: String },

    // =========================================================================
    // Registry errors
    // =========================================================================
    /// Named runtime table not present in the registry
    #[error("runtime table '{0}' not found")]
    TableNotFound(String),
}

impl Error {
    /// Wrap an inner error message with the name of the table function that
    /// produced it.
    pub fn table_function(table: impl Into<String>, inner: &Error) -> Self {
        Error::TableFunction {
            table: table.into(),
            message: inner.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_function_wrapping() {
        let inner = Error::TableNotFound("ancestors".to_string());
        let wrapped = Error::table_function("ancestor_slice", &inner);
        assert_eq!(
            wrapped.to_string(),
            "ancestor_slice: runtime table 'ancestors' not found"
        );
    }

    #[test]
    fn test_argument_constraint_messages() {
        let err = Error::MissingArgumentConstraint {
            function: "descendant_slice".to_string(),
            column: "start_id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "missing constraint on argument column 'start_id' in function descendant_slice"
        );
    }
}
