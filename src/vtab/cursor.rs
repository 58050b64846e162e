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

//! Cursor - one active query over a virtual table
//!
//! The SQL engine opens a cursor per query, calls Filter with the
//! constraint set and bound values, then drives Next/Eof/Column/RowId.
//! The cursor translates constraints to the columnar layer, routes hidden
//! column values into table-function argument slots, and applies an
//! opportunistic sort-and-cache policy when the engine keeps repeating the
//! same constraint shape (typically an equality probe inside a join loop).

use std::sync::Arc;

use regex::Regex;
use smallvec::SmallVec;

use crate::core::{Error, Result, SqlValue};
use crate::table::{Constraint, DataTable, FilterOp, Order, OwnedTable, TableIterator};

use super::constraints::{FilterHistory, QueryConstraints};
use super::table::{DbTable, TableComputation};

/// Populate the sorted-copy cache on exactly the third consecutive Filter
/// call with an identical constraint shape.
const REPEATED_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    SingleRow,
    Table,
}

/// One active query over a [`DbTable`]
///
/// The cursor borrows its table: the SQL engine owns the cursor, and the
/// borrow guarantees the table outlives every cursor over it.
pub struct Cursor<'t> {
    table: &'t DbTable,

    /// Source for Static and Runtime variants, latched at open
    upstream: Option<Arc<dyn DataTable>>,

    /// Output of the last table-function computation
    dynamic_table: Option<Arc<OwnedTable>>,

    /// Sorted copy latched from the query cache
    sorted_cache_table: Option<Arc<OwnedTable>>,

    /// Per-column argument slot; `Some` marks hidden argument columns
    argument_index_per_column: Vec<Option<u32>>,

    /// Table-function argument values, by slot
    arguments: SmallVec<[SqlValue; 2]>,

    // Constraint and order buffers are reused across Filter calls to
    // avoid reallocating on nested subqueries.
    constraints: Vec<Constraint>,
    orders: Vec<Order>,

    repeated_cache_count: u32,
    mode: Mode,
    single_row: Option<u32>,
    iterator: Option<TableIterator>,
    eof: bool,
}

impl<'t> Cursor<'t> {
    pub(crate) fn new(table: &'t DbTable) -> Self {
        let ncols = table.schema().columns.len();
        let (argument_index_per_column, argument_count) = match table.computation() {
            TableComputation::Static(_) | TableComputation::Runtime(_) => (vec![None; ncols], 0),
            TableComputation::TableFunction(_) => {
                let mut next_slot = 0u32;
                let slots = table
                    .schema()
                    .columns
                    .iter()
                    .map(|col| {
                        col.is_hidden.then(|| {
                            let slot = next_slot;
                            next_slot += 1;
                            slot
                        })
                    })
                    .collect();
                (slots, next_slot)
            }
        };

        let upstream: Option<Arc<dyn DataTable>> = match table.computation() {
            TableComputation::Static(t) => Some(t.clone()),
            TableComputation::Runtime(_) => table
                .resolved_runtime_table()
                .map(|t| t.clone() as Arc<dyn DataTable>),
            TableComputation::TableFunction(_) => None,
        };

        Self {
            table,
            upstream,
            dynamic_table: None,
            sorted_cache_table: None,
            argument_index_per_column,
            arguments: smallvec::smallvec![SqlValue::Null; argument_count as usize],
            constraints: Vec::new(),
            orders: Vec::new(),
            repeated_cache_count: 0,
            mode: Mode::SingleRow,
            single_row: None,
            iterator: None,
            eof: true,
        }
    }

    /// Begin a new scan with the given constraint set and bound values.
    ///
    /// `argv` carries one value per constraint, in constraint order. On
    /// error the cursor is left in a defined state at EOF with no iterator
    /// held.
    pub fn filter(
        &mut self,
        qc: &QueryConstraints,
        argv: &[SqlValue],
        history: FilterHistory,
    ) -> Result<()> {
        // Drop any previous iterator before touching the source again, and
        // before any early error return.
        self.iterator = None;

        let result = self.filter_impl(qc, argv, history);
        if result.is_err() {
            self.mode = Mode::SingleRow;
            self.single_row = None;
            self.eof = true;
        }
        result
    }

    fn filter_impl(
        &mut self,
        qc: &QueryConstraints,
        argv: &[SqlValue],
        history: FilterHistory,
    ) -> Result<()> {
        self.populate_constraints_and_arguments(qc, argv)?;
        self.populate_orders(qc);

        match self.table.computation() {
            TableComputation::Static(_) | TableComputation::Runtime(_) => {
                self.try_cache_create_sorted_table(qc, history);
            }
            TableComputation::TableFunction(f) => {
                tracing::debug!(table = self.table.name(), "table function call");
                let computed = f.compute_table(&self.arguments).map_err(|e| Error::TableFunction {
                    table: self.table.name().to_string(),
                    message: e.to_string(),
                })?;
                self.dynamic_table = Some(Arc::new(computed));
            }
        }

        let source = self.source_table();
        if tracing::enabled!(tracing::Level::TRACE) {
            let constraints: Vec<String> = self.constraints.iter().map(ToString::to_string).collect();
            let orders: Vec<String> = self.orders.iter().map(ToString::to_string).collect();
            tracing::trace!(
                table = self.table.name(),
                constraints = %constraints.join(", "),
                orders = %orders.join(", "),
                "filter and sort"
            );
        }

        let filter_map = source.query_to_row_map(&self.constraints, &self.orders);
        if filter_map.is_range() && filter_map.len() <= 1 {
            // Repeated id-equality probes (joins on id columns) filter down
            // to a single ranged row; serving that from a stack-held index
            // avoids allocating a table view and an iterator per probe.
            self.mode = Mode::SingleRow;
            self.single_row = (filter_map.len() == 1).then(|| filter_map.get(0));
            self.eof = self.single_row.is_none();
        } else {
            self.mode = Mode::Table;
            let iter = TableIterator::new(source, filter_map);
            self.eof = iter.eof();
            self.iterator = Some(iter);
        }
        Ok(())
    }

    fn populate_constraints_and_arguments(
        &mut self,
        qc: &QueryConstraints,
        argv: &[SqlValue],
    ) -> Result<()> {
        self.constraints.clear();
        for (cs, value) in qc.constraints().iter().zip(argv) {
            // An untranslatable op means the SQL engine filters those rows
            // itself; the omit flag for it was left false in BestIndex.
            let Some(op) = cs.op.to_filter_op() else {
                continue;
            };

            if op == FilterOp::Regex {
                let pattern = value.as_str().ok_or(Error::RegexValueNotString)?;
                Regex::new(pattern).map_err(|e| Error::InvalidRegex {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
            }

            match self.argument_index_per_column[cs.column as usize] {
                Some(slot) => self.arguments[slot as usize] = value.clone(),
                None => self.constraints.push(Constraint {
                    col: cs.column,
                    op,
                    value: value.clone(),
                }),
            }
        }
        Ok(())
    }

    fn populate_orders(&mut self, qc: &QueryConstraints) {
        self.orders.clear();
        self.orders.extend(qc.order_by().iter().map(|ob| Order {
            col: ob.column,
            desc: ob.desc,
        }));
    }

    /// Opportunistically latch (or build) a sorted copy of the upstream
    /// table when the engine keeps issuing the same constraint shape.
    fn try_cache_create_sorted_table(&mut self, qc: &QueryConstraints, history: FilterHistory) {
        // Tables with caching disabled pass no cache handle.
        let Some(cache) = self.table.cache() else {
            return;
        };
        let upstream = self
            .upstream
            .as_ref()
            .expect("static and runtime cursors latch their upstream at open");

        if history == FilterHistory::Different {
            self.repeated_cache_count = 0;

            // Another cursor may already have cached this shape.
            self.sorted_cache_table = cache.get_if_cached(upstream, qc.constraints());
            return;
        }

        if self.sorted_cache_table.is_some() {
            return;
        }
        self.repeated_cache_count += 1;
        if self.repeated_cache_count != REPEATED_THRESHOLD {
            return;
        }

        // Only a lone equality constraint benefits: the sorted copy turns
        // the repeated probe into a binary search.
        let [c] = qc.constraints() else {
            return;
        };
        if !c.op.is_eq() {
            return;
        }
        // A column that is already sorted needs no copy.
        if self.table.schema().column(c.column).is_sorted {
            return;
        }

        let col = c.column;
        let sorted = cache.get_or_cache(upstream, qc.constraints(), || {
            upstream.sort(&[Order { col, desc: false }])
        });
        self.sorted_cache_table = Some(sorted);
    }

    /// The table this cursor filters against: the latched sorted copy when
    /// one exists, else the computed or upstream table.
    fn source_table(&self) -> Arc<dyn DataTable> {
        if let Some(sorted) = &self.sorted_cache_table {
            return sorted.clone();
        }
        if let Some(dynamic) = &self.dynamic_table {
            return dynamic.clone();
        }
        self.upstream
            .as_ref()
            .expect("cursor has no source before filter")
            .clone()
    }

    /// Advance to the next row
    pub fn next(&mut self) {
        match self.mode {
            Mode::SingleRow => {
                self.single_row = None;
                self.eof = true;
            }
            Mode::Table => {
                let iter = self.iterator.as_mut().expect("table mode holds an iterator");
                iter.next();
                self.eof = iter.eof();
            }
        }
    }

    /// Returns true when the scan is exhausted
    pub fn eof(&self) -> bool {
        self.eof
    }

    /// Value of `col` at the current row
    pub fn column(&self, col: u32) -> SqlValue {
        match self.mode {
            Mode::SingleRow => {
                let row = self.single_row.expect("column read past eof");
                self.source_table().cell(row, col)
            }
            Mode::Table => self
                .iterator
                .as_ref()
                .expect("table mode holds an iterator")
                .column(col),
        }
    }

    /// Source-table row index of the current row
    pub fn row_id(&self) -> i64 {
        match self.mode {
            Mode::SingleRow => i64::from(self.single_row.expect("row_id read past eof")),
            Mode::Table => i64::from(
                self.iterator
                    .as_ref()
                    .expect("table mode holds an iterator")
                    .row_id(),
            ),
        }
    }

    /// True when the current scan runs against a cached sorted copy
    pub fn uses_sorted_cache(&self) -> bool {
        self.sorted_cache_table.is_some()
    }

    /// True when the current scan is in single-row mode (no iterator held)
    pub fn is_single_row(&self) -> bool {
        self.mode == Mode::SingleRow && self.iterator.is_none()
    }

    /// Bound table-function argument values, by slot
    pub fn arguments(&self) -> &[SqlValue] {
        &self.arguments
    }

    /// The constraints this cursor executes itself
    pub fn executed_constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}
