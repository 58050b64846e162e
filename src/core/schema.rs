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

//! Schema types - column definitions for the virtual-table bridge
//!
//! A [`Schema`] describes the columns a table exposes to the SQL engine.
//! The per-column flags drive planning: `is_id` marks the primary-key
//! column (exactly one per table), `is_sorted` marks columns stored in
//! ascending order, `is_set_id` marks densely grouped columns, and
//! `is_hidden` marks table-function argument columns.

use std::fmt;

/// SQL-visible column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// 64-bit signed integer
    Long,

    /// 64-bit floating point
    Double,

    /// UTF-8 text
    String,

    /// Opaque byte string
    Bytes,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Long => write!(f, "BIGINT"),
            SqlType::Double => write!(f, "DOUBLE"),
            SqlType::String => write!(f, "TEXT"),
            SqlType::Bytes => write!(f, "BLOB"),
        }
    }
}

/// A column definition in a table schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    /// Column name
    pub name: String,

    /// SQL type of the column
    pub sql_type: SqlType,

    /// Whether this is the table's id (primary key) column
    pub is_id: bool,

    /// Whether this column stores set ids (dense group markers)
    pub is_set_id: bool,

    /// Whether the column's values are stored in ascending order
    pub is_sorted: bool,

    /// Whether this column is a table-function argument rather than data
    pub is_hidden: bool,
}

impl ColumnSchema {
    /// Create a plain data column
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            is_id: false,
            is_set_id: false,
            is_sorted: false,
            is_hidden: false,
        }
    }

    /// Create the table's id column (sorted by construction)
    pub fn id(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: SqlType::Long,
            is_id: true,
            is_set_id: false,
            is_sorted: true,
            is_hidden: false,
        }
    }

    /// Mark the column as stored in ascending order
    pub fn sorted(mut self) -> Self {
        self.is_sorted = true;
        self
    }

    /// Mark the column as a set-id column
    pub fn set_id(mut self) -> Self {
        self.is_set_id = true;
        self
    }

    /// Mark the column as a hidden table-function argument
    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }
}

impl fmt::Display for ColumnSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.sql_type)?;
        if self.is_id {
            write!(f, " PRIMARY KEY")?;
        }
        if self.is_hidden {
            write!(f, " HIDDEN")?;
        }
        Ok(())
    }
}

/// Table schema definition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    /// Column definitions, in declaration order
    pub columns: Vec<ColumnSchema>,
}

impl Schema {
    /// Create a schema from a list of columns
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    /// Column definition by index
    #[inline]
    pub fn column(&self, idx: u32) -> &ColumnSchema {
        &self.columns[idx as usize]
    }

    /// Index of the id column, if exactly one exists
    pub fn id_column_index(&self) -> Option<u32> {
        let mut it = self.columns.iter().enumerate().filter(|(_, c)| c.is_id);
        let first = it.next()?;
        if it.next().is_some() {
            return None;
        }
        Some(first.0 as u32)
    }

    /// Number of hidden (argument) columns
    pub fn hidden_column_count(&self) -> u32 {
        self.columns.iter().filter(|c| c.is_hidden).count() as u32
    }
}
