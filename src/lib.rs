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

//! # Tracedb - trace-analysis database core
//!
//! Tracedb exposes in-memory columnar trace tables through a SQL
//! virtual-table interface and tracks virtual memory mappings for
//! stack-sample symbolization.
//!
//! ## Components
//!
//! - **Virtual-table query bridge** ([`vtab`]) - accepts SQL-engine
//!   callbacks (constraint analysis, index selection, row iteration) and
//!   translates them onto columnar tables, with a mini cost model,
//!   constraint reordering, ordering elimination, and an opportunistic
//!   sort-and-cache policy for repeated constraint shapes.
//! - **Mapping tracker** ([`mapping`]) - indexes kernel, user-process, and
//!   unclassified memory mappings by address range and by (name, build id),
//!   and hooks jitted code regions via a delegate so the same program
//!   counter can resolve to different frames over time.
//! - **Columnar table abstraction** ([`table`]) - the contract the bridge
//!   drives, plus a concrete in-memory implementation.
//! - **Stack-profile storage** ([`profile`]) - process-wide string, frame,
//!   and mapping tables shared by the tracker.
//!
//! The core is single-threaded cooperative: every operation runs on the
//! thread of the SQL engine's callback and nothing suspends.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tracedb::core::{ColumnSchema, Schema, SqlType, SqlValue};
//! use tracedb::table::OwnedTable;
//! use tracedb::vtab::{
//!     BestIndexInfo, DbTable, FilterHistory, QueryConstraints, SqlConstraint, SqlOp,
//! };
//!
//! let schema = Schema::new(vec![
//!     ColumnSchema::id("id"),
//!     ColumnSchema::new("name", SqlType::String),
//! ]);
//! let data = OwnedTable::from_rows(
//!     schema,
//!     vec![
//!         vec![SqlValue::Long(0), SqlValue::from("binder")],
//!         vec![SqlValue::Long(1), SqlValue::from("logd")],
//!     ],
//! );
//!
//! let table = DbTable::static_table("threads", Arc::new(data), None).unwrap();
//! let qc = QueryConstraints::new(
//!     vec![SqlConstraint { column: 0, op: SqlOp::Eq }],
//!     vec![],
//! );
//!
//! let mut info = BestIndexInfo::for_query(&qc);
//! table.best_index(&qc, &mut info).unwrap();
//!
//! let mut cursor = table.open_cursor();
//! cursor
//!     .filter(&qc, &[SqlValue::Long(1)], FilterHistory::Different)
//!     .unwrap();
//! assert_eq!(cursor.column(1), SqlValue::from("logd"));
//! ```

pub mod core;
pub mod mapping;
pub mod profile;
pub mod table;
pub mod vtab;

// Re-export main types for convenience
pub use crate::core::{ColumnSchema, Error, Result, Schema, SqlType, SqlValue};

pub use crate::table::{Constraint, DataTable, FilterOp, Order, OwnedTable, RowMap};

pub use crate::vtab::{
    BestIndexInfo, Cursor, DbTable, FilterHistory, QueryCache, QueryConstraints,
    RuntimeTableRegistry, SqlConstraint, SqlOp, SqlOrderBy, TableComputation, TableFunction,
};

pub use crate::mapping::{
    AddressRange, AddressRangeMap, BuildId, CreateMappingParams, JitDelegate, MappingKind,
    MappingTracker, UniquePid, VirtualMemoryMapping,
};

pub use crate::profile::{FrameId, MappingId, ProfileContext, StringId};
