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

//! Virtual-table front end
//!
//! [`DbTable`] answers the SQL engine's schema, best-index, and cursor-open
//! requests for one exposed table. A table is parametrized by its
//! [`TableComputation`]:
//!
//! - `Static` wraps a fixed columnar table
//! - `Runtime` wraps a named table owned by a [`RuntimeTableRegistry`]
//! - `TableFunction` wraps a producer that computes a table from the
//!   values bound to its hidden argument columns

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::core::{Error, Result, Schema, SqlValue};
use crate::table::{DataTable, OwnedTable};

use super::constraints::{BestIndexInfo, QueryConstraints};
use super::cost::estimate_cost;
use super::cursor::Cursor;
use super::planner::modify_constraints;
use super::query_cache::QueryCache;

/// A parametrized table producer backing a table-function virtual table
pub trait TableFunction: Send + Sync {
    /// Schema of the produced table, including hidden argument columns
    fn create_schema(&self) -> Schema;

    /// Row-count estimate for cost modelling, before arguments are known
    fn estimate_row_count(&self) -> u32;

    /// Compute the output table for one set of argument values
    fn compute_table(&self, arguments: &[SqlValue]) -> Result<OwnedTable>;
}

/// Registry of named, externally managed runtime tables
#[derive(Default)]
pub struct RuntimeTableRegistry {
    tables: RwLock<FxHashMap<String, Arc<OwnedTable>>>,
}

impl RuntimeTableRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under `name`, replacing any previous entry
    pub fn register(&self, name: impl Into<String>, table: Arc<OwnedTable>) {
        self.tables.write().insert(name.into(), table);
    }

    /// Fetch a table by name
    pub fn get(&self, name: &str) -> Option<Arc<OwnedTable>> {
        self.tables.read().get(name).cloned()
    }

    /// Erase the named entry, if present
    pub fn erase(&self, name: &str) {
        self.tables.write().remove(name);
    }

    /// Number of registered tables
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    /// Returns true if no tables are registered
    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }
}

/// How a [`DbTable`] obtains the columnar table it exposes
#[derive(Clone)]
pub enum TableComputation {
    /// A fixed columnar table
    Static(Arc<dyn DataTable>),

    /// A named table fetched from (and erased back into) a registry
    Runtime(Arc<RuntimeTableRegistry>),

    /// A parametrized producer driven by hidden-column arguments
    TableFunction(Arc<dyn TableFunction>),
}

/// One virtual table exposed to the SQL engine
pub struct DbTable {
    name: String,
    computation: TableComputation,
    cache: Option<Arc<QueryCache>>,
    schema: Schema,
    runtime_table: Option<Arc<OwnedTable>>,
}

impl std::fmt::Debug for DbTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbTable")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl DbTable {
    /// Initialize a table, resolving its schema per computation variant.
    ///
    /// Panics if the resolved schema does not carry exactly one id column;
    /// every exposed table must have one and this is a programming error,
    /// not a query error.
    pub fn init(
        name: impl Into<String>,
        computation: TableComputation,
        cache: Option<Arc<QueryCache>>,
    ) -> Result<Self> {
        let name = name.into();
        let (schema, runtime_table) = match &computation {
            TableComputation::Static(table) => (table.schema().clone(), None),
            TableComputation::Runtime(registry) => {
                let table = registry
                    .get(&name)
                    .ok_or_else(|| Error::TableNotFound(name.clone()))?;
                assert!(
                    !table.schema().columns.is_empty(),
                    "runtime table '{name}' has no columns"
                );
                (table.schema().clone(), Some(table))
            }
            TableComputation::TableFunction(f) => (f.create_schema(), None),
        };

        assert!(
            schema.id_column_index().is_some(),
            "id column not found in {name}; all tables need exactly one id column"
        );

        Ok(Self {
            name,
            computation,
            cache,
            schema,
            runtime_table,
        })
    }

    /// Convenience constructor for a static table
    pub fn static_table(
        name: impl Into<String>,
        table: Arc<dyn DataTable>,
        cache: Option<Arc<QueryCache>>,
    ) -> Result<Self> {
        Self::init(name, TableComputation::Static(table), cache)
    }

    /// Convenience constructor for a registry-backed runtime table
    pub fn runtime_table(
        name: impl Into<String>,
        registry: Arc<RuntimeTableRegistry>,
        cache: Option<Arc<QueryCache>>,
    ) -> Result<Self> {
        Self::init(name, TableComputation::Runtime(registry), cache)
    }

    /// Convenience constructor for a table function
    pub fn table_function(
        name: impl Into<String>,
        function: Arc<dyn TableFunction>,
        cache: Option<Arc<QueryCache>>,
    ) -> Result<Self> {
        Self::init(name, TableComputation::TableFunction(function), cache)
    }

    /// Table name as exposed to the SQL engine
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema declared to the SQL engine
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn computation(&self) -> &TableComputation {
        &self.computation
    }

    pub(crate) fn cache(&self) -> Option<&Arc<QueryCache>> {
        self.cache.as_ref()
    }

    pub(crate) fn resolved_runtime_table(&self) -> Option<&Arc<OwnedTable>> {
        self.runtime_table.as_ref()
    }

    /// Answer the SQL engine's index-selection request.
    ///
    /// On success, fills `info` with the cost estimate, per-constraint omit
    /// flags, and the order-by omit flag. For table functions, first
    /// validates that every hidden column carries exactly one equality
    /// constraint; a violation is returned as an error the engine maps to
    /// its constraint-violation sentinel.
    pub fn best_index(&self, qc: &QueryConstraints, info: &mut BestIndexInfo) -> Result<()> {
        let row_count = match &self.computation {
            TableComputation::Static(table) => table.row_count(),
            TableComputation::Runtime(_) => self
                .runtime_table
                .as_ref()
                .expect("runtime table resolved at init")
                .row_count(),
            TableComputation::TableFunction(f) => {
                self.validate_table_function_arguments(qc)?;
                f.estimate_row_count()
            }
        };

        let cost = estimate_cost(&self.schema, row_count, qc);
        info.estimated_cost = cost.cost;
        info.estimated_rows = cost.rows;

        // Only omit engine-side filtering for constraints the cursor can
        // execute itself.
        info.omit_constraint.clear();
        info.omit_constraint
            .extend(qc.constraints().iter().map(|c| c.op.to_filter_op().is_some()));

        // The cursor honours all orderings.
        info.omit_order_by = true;
        Ok(())
    }

    /// Apply the constraint planner to `qc` in place
    pub fn modify_constraints(&self, qc: &mut QueryConstraints) {
        modify_constraints(&self.schema, qc);
    }

    /// Open a cursor over this table
    pub fn open_cursor(&self) -> Cursor<'_> {
        Cursor::new(self)
    }

    /// Hidden columns are argument slots: each must be constrained exactly
    /// once, by equality.
    fn validate_table_function_arguments(&self, qc: &QueryConstraints) -> Result<()> {
        for (i, col) in self.schema.columns.iter().enumerate() {
            if !col.is_hidden {
                continue;
            }
            let mut on_column = qc
                .constraints()
                .iter()
                .filter(|c| c.column as usize == i);
            let first = on_column.next().ok_or_else(|| Error::MissingArgumentConstraint {
                function: self.name.clone(),
                column: col.name.clone(),
            })?;
            if !first.op.is_eq() {
                return Err(Error::NonEqArgumentConstraint {
                    function: self.name.clone(),
                    column: col.name.clone(),
                });
            }
            if on_column.next().is_some() {
                return Err(Error::DuplicateArgumentConstraint {
                    function: self.name.clone(),
                    column: col.name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Drop for DbTable {
    fn drop(&mut self) {
        // A runtime table's registry entry lives exactly as long as the
        // virtual table exposing it.
        if let TableComputation::Runtime(registry) = &self.computation {
            registry.erase(&self.name);
        }
    }
}
