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

//! Virtual-table query bridge
//!
//! Translates SQL-engine callbacks (constraint analysis, index selection,
//! row iteration) into operations on the columnar table layer:
//!
//! - [`DbTable`] - schema, best-index, and cursor-open front end
//! - [`Cursor`] - per-query state: translation, sort-cache policy, iteration
//! - [`estimate_cost`] - the cost model behind BestIndex
//! - [`modify_constraints`] - constraint reordering and ordering pruning
//! - [`QueryCache`] - shared sorted-copy cache

pub mod constraints;
pub mod cost;
pub mod cursor;
pub mod planner;
pub mod query_cache;
pub mod table;

pub use constraints::{
    BestIndexInfo, FilterHistory, QueryConstraints, SqlConstraint, SqlOp, SqlOrderBy,
};
pub use cost::{estimate_cost, QueryCost};
pub use cursor::Cursor;
pub use planner::modify_constraints;
pub use query_cache::{QueryCache, DEFAULT_CACHE_SIZE};
pub use table::{DbTable, RuntimeTableRegistry, TableComputation, TableFunction};
