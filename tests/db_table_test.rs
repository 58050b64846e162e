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

//! Virtual-Table Bridge Tests
//!
//! Drives DbTable and Cursor the way the SQL engine does: BestIndex with
//! a constraint set, ModifyConstraints, then Filter/Next/Eof/Column.

use std::sync::Arc;

use tracedb::core::{ColumnSchema, Error, Schema, SqlType, SqlValue};
use tracedb::table::{DataTable, FilterOp, Order, OwnedTable, RowMap};
use tracedb::vtab::{
    BestIndexInfo, DbTable, FilterHistory, QueryConstraints, RuntimeTableRegistry,
    SqlConstraint, SqlOp, SqlOrderBy, TableFunction,
};

fn sched_schema() -> Schema {
    Schema::new(vec![
        ColumnSchema::id("id"),
        ColumnSchema::new("ts", SqlType::Long).sorted(),
        ColumnSchema::new("comm", SqlType::String),
    ])
}

fn sched_table() -> Arc<dyn DataTable> {
    Arc::new(OwnedTable::from_rows(
        sched_schema(),
        vec![
            vec![SqlValue::Long(0), SqlValue::Long(100), SqlValue::from("idle")],
            vec![SqlValue::Long(1), SqlValue::Long(200), SqlValue::from("logd")],
            vec![SqlValue::Long(2), SqlValue::Long(300), SqlValue::from("idle")],
            vec![SqlValue::Long(3), SqlValue::Long(400), SqlValue::from("binder")],
        ],
    ))
}

fn c(column: u32, op: SqlOp) -> SqlConstraint {
    SqlConstraint { column, op }
}

fn collect_column(cursor: &mut tracedb::vtab::Cursor<'_>, col: u32) -> Vec<SqlValue> {
    let mut out = Vec::new();
    while !cursor.eof() {
        out.push(cursor.column(col));
        cursor.next();
    }
    out
}

// =============================================================================
// End-to-end filtering
// =============================================================================

#[test]
fn test_full_scan() {
    let table = DbTable::static_table("sched", sched_table(), None).unwrap();
    let qc = QueryConstraints::default();
    let mut cursor = table.open_cursor();
    cursor.filter(&qc, &[], FilterHistory::Different).unwrap();
    assert_eq!(
        collect_column(&mut cursor, 2),
        vec![
            SqlValue::from("idle"),
            SqlValue::from("logd"),
            SqlValue::from("idle"),
            SqlValue::from("binder"),
        ]
    );
}

#[test]
fn test_filter_and_order_desc() {
    let table = DbTable::static_table("sched", sched_table(), None).unwrap();
    let qc = QueryConstraints::new(
        vec![c(2, SqlOp::Eq)],
        vec![SqlOrderBy {
            column: 1,
            desc: true,
        }],
    );
    let mut cursor = table.open_cursor();
    cursor
        .filter(&qc, &[SqlValue::from("idle")], FilterHistory::Different)
        .unwrap();
    assert_eq!(
        collect_column(&mut cursor, 1),
        vec![SqlValue::Long(300), SqlValue::Long(100)]
    );
}

#[test]
fn test_omitted_constraints_are_really_executed() {
    // The omit flag promises the engine it can skip re-checking; the
    // cursor must therefore return only matching rows.
    let table = DbTable::static_table("sched", sched_table(), None).unwrap();
    let qc = QueryConstraints::new(vec![c(2, SqlOp::Glob)], vec![]);

    let mut info = BestIndexInfo::for_query(&qc);
    table.best_index(&qc, &mut info).unwrap();
    assert_eq!(info.omit_constraint, vec![true]);

    let mut cursor = table.open_cursor();
    cursor
        .filter(&qc, &[SqlValue::from("*e")], FilterHistory::Different)
        .unwrap();
    assert_eq!(
        collect_column(&mut cursor, 2),
        vec![SqlValue::from("idle"), SqlValue::from("idle")]
    );
}

#[test]
fn test_untranslatable_constraint_is_skipped() {
    let table = DbTable::static_table("sched", sched_table(), None).unwrap();
    let qc = QueryConstraints::new(vec![c(2, SqlOp::Like)], vec![]);
    let mut cursor = table.open_cursor();
    // The engine keeps the LIKE for itself; the cursor scans everything.
    cursor
        .filter(&qc, &[SqlValue::from("%d%")], FilterHistory::Different)
        .unwrap();
    assert!(cursor.executed_constraints().is_empty());
    assert_eq!(collect_column(&mut cursor, 0).len(), 4);
}

// =============================================================================
// Single-row fast path
// =============================================================================

#[test]
fn test_single_row_fast_path() {
    let table = DbTable::static_table("sched", sched_table(), None).unwrap();
    let qc = QueryConstraints::new(vec![c(0, SqlOp::Eq)], vec![]);
    let mut cursor = table.open_cursor();
    cursor
        .filter(&qc, &[SqlValue::Long(2)], FilterHistory::Different)
        .unwrap();

    assert!(cursor.is_single_row());
    assert!(!cursor.eof());
    assert_eq!(cursor.row_id(), 2);
    assert_eq!(cursor.column(2), SqlValue::from("idle"));
    cursor.next();
    assert!(cursor.eof());
}

#[test]
fn test_empty_result_is_immediate_eof() {
    let table = DbTable::static_table("sched", sched_table(), None).unwrap();
    let qc = QueryConstraints::new(vec![c(0, SqlOp::Eq)], vec![]);
    let mut cursor = table.open_cursor();
    cursor
        .filter(&qc, &[SqlValue::Long(99)], FilterHistory::Different)
        .unwrap();
    assert!(cursor.is_single_row());
    assert!(cursor.eof());
}

// =============================================================================
// Cost estimation through BestIndex
// =============================================================================

/// A table that only reports a row count; planning never touches rows.
struct CountOnlyTable {
    schema: Schema,
    rows: u32,
}

impl DataTable for CountOnlyTable {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn row_count(&self) -> u32 {
        self.rows
    }

    fn cell(&self, _row: u32, _col: u32) -> SqlValue {
        unreachable!("planning-only table")
    }

    fn query_to_row_map(&self, _constraints: &[tracedb::table::Constraint], _orders: &[Order]) -> RowMap {
        RowMap::empty()
    }

    fn sort(&self, _orders: &[Order]) -> OwnedTable {
        unreachable!("planning-only table")
    }
}

#[test]
fn test_id_eq_cost_fast_track() {
    let table = DbTable::static_table(
        "sched",
        Arc::new(CountOnlyTable {
            schema: sched_schema(),
            rows: 1_000_000,
        }),
        None,
    )
    .unwrap();

    let qc = QueryConstraints::new(vec![c(0, SqlOp::Eq)], vec![]);
    let mut info = BestIndexInfo::for_query(&qc);
    table.best_index(&qc, &mut info).unwrap();

    // 1000 fixed + 10 id filter + 2 iteration, one estimated row.
    assert_eq!(info.estimated_rows, 1);
    assert_eq!(info.estimated_cost, 1012.0);
}

#[test]
fn test_cost_monotone_in_row_count_through_best_index() {
    let qc = QueryConstraints::new(vec![c(2, SqlOp::Ge)], vec![]);
    let mut last = 0.0;
    for rows in [0u32, 100, 10_000, 1_000_000] {
        let table = DbTable::static_table(
            "sched",
            Arc::new(CountOnlyTable {
                schema: sched_schema(),
                rows,
            }),
            None,
        )
        .unwrap();
        let mut info = BestIndexInfo::for_query(&qc);
        table.best_index(&qc, &mut info).unwrap();
        assert!(info.estimated_cost >= last);
        last = info.estimated_cost;
    }
}

// =============================================================================
// ModifyConstraints
// =============================================================================

#[test]
fn test_modify_constraints_prunes_orders() {
    let table = DbTable::static_table("sched", sched_table(), None).unwrap();
    let mut qc = QueryConstraints::new(
        vec![c(2, SqlOp::Eq), c(0, SqlOp::Eq)],
        vec![
            SqlOrderBy {
                column: 2,
                desc: false,
            },
            SqlOrderBy {
                column: 1,
                desc: false,
            },
        ],
    );
    table.modify_constraints(&mut qc);

    // The id constraint moves first; the comm order dies to the equality
    // constraint and the trailing sorted-ascending ts order is dropped.
    assert_eq!(qc.constraints()[0].column, 0);
    assert!(qc.order_by().is_empty());
}

// =============================================================================
// Table functions
// =============================================================================

/// Emits `count` rows `v = base, base+1, ...` for arguments (base, count).
struct SequenceFunction;

impl SequenceFunction {
    fn schema() -> Schema {
        Schema::new(vec![
            ColumnSchema::new("v", SqlType::Long),
            ColumnSchema::id("id"),
            ColumnSchema::new("base", SqlType::Long).hidden(),
            ColumnSchema::new("count", SqlType::Long).hidden(),
        ])
    }
}

impl TableFunction for SequenceFunction {
    fn create_schema(&self) -> Schema {
        Self::schema()
    }

    fn estimate_row_count(&self) -> u32 {
        100
    }

    fn compute_table(&self, arguments: &[SqlValue]) -> tracedb::core::Result<OwnedTable> {
        let base = arguments[0]
            .as_long()
            .ok_or_else(|| Error::InvalidArgument("base must be an integer".to_string()))?;
        let count = arguments[1].as_long().unwrap_or(0);
        let rows = (0..count)
            .map(|i| {
                vec![
                    SqlValue::Long(base + i),
                    SqlValue::Long(i),
                    arguments[0].clone(),
                    arguments[1].clone(),
                ]
            })
            .collect();
        Ok(OwnedTable::from_rows(Self::schema(), rows))
    }
}

#[test]
fn test_table_function_argument_routing() {
    let table = DbTable::table_function("sequence", Arc::new(SequenceFunction), None).unwrap();
    // Constraints: base = 5, count = 3, v > 6.
    let qc = QueryConstraints::new(
        vec![c(2, SqlOp::Eq), c(3, SqlOp::Eq), c(0, SqlOp::Gt)],
        vec![],
    );
    let mut cursor = table.open_cursor();
    cursor
        .filter(
            &qc,
            &[SqlValue::Long(5), SqlValue::Long(3), SqlValue::Long(6)],
            FilterHistory::Different,
        )
        .unwrap();

    // Hidden-column values landed in argument slots, not constraints.
    assert_eq!(
        cursor.arguments(),
        &[SqlValue::Long(5), SqlValue::Long(3)]
    );
    assert_eq!(cursor.executed_constraints().len(), 1);
    assert_eq!(cursor.executed_constraints()[0].col, 0);
    assert_eq!(cursor.executed_constraints()[0].op, FilterOp::Gt);
    assert_eq!(cursor.executed_constraints()[0].value, SqlValue::Long(6));

    // Rows are 5, 6, 7; the v > 6 constraint leaves just 7.
    assert_eq!(collect_column(&mut cursor, 0), vec![SqlValue::Long(7)]);
}

#[test]
fn test_table_function_missing_argument_is_constraint_error() {
    let table = DbTable::table_function("sequence", Arc::new(SequenceFunction), None).unwrap();
    let qc = QueryConstraints::new(vec![c(2, SqlOp::Eq)], vec![]);
    let mut info = BestIndexInfo::for_query(&qc);
    let err = table.best_index(&qc, &mut info).unwrap_err();
    assert_eq!(
        err,
        Error::MissingArgumentConstraint {
            function: "sequence".to_string(),
            column: "count".to_string(),
        }
    );
}

#[test]
fn test_table_function_non_eq_argument_is_constraint_error() {
    let table = DbTable::table_function("sequence", Arc::new(SequenceFunction), None).unwrap();
    let qc = QueryConstraints::new(vec![c(2, SqlOp::Gt), c(3, SqlOp::Eq)], vec![]);
    let mut info = BestIndexInfo::for_query(&qc);
    let err = table.best_index(&qc, &mut info).unwrap_err();
    assert_eq!(
        err,
        Error::NonEqArgumentConstraint {
            function: "sequence".to_string(),
            column: "base".to_string(),
        }
    );
}

#[test]
fn test_table_function_duplicate_argument_is_constraint_error() {
    let table = DbTable::table_function("sequence", Arc::new(SequenceFunction), None).unwrap();
    let qc = QueryConstraints::new(
        vec![c(2, SqlOp::Eq), c(2, SqlOp::Eq), c(3, SqlOp::Eq)],
        vec![],
    );
    let mut info = BestIndexInfo::for_query(&qc);
    let err = table.best_index(&qc, &mut info).unwrap_err();
    assert_eq!(
        err,
        Error::DuplicateArgumentConstraint {
            function: "sequence".to_string(),
            column: "base".to_string(),
        }
    );
}

#[test]
fn test_table_function_error_is_wrapped_with_name() {
    let table = DbTable::table_function("sequence", Arc::new(SequenceFunction), None).unwrap();
    let qc = QueryConstraints::new(vec![c(2, SqlOp::Eq), c(3, SqlOp::Eq)], vec![]);
    let mut cursor = table.open_cursor();
    // A non-integer base makes the function fail.
    let err = cursor
        .filter(
            &qc,
            &[SqlValue::from("oops"), SqlValue::Long(3)],
            FilterHistory::Different,
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "sequence: invalid argument: base must be an integer"
    );
    assert!(cursor.eof());
}

// =============================================================================
// Regex constraints
// =============================================================================

#[cfg(feature = "regexp")]
#[test]
fn test_regexp_filters_rows() {
    let table = DbTable::static_table("sched", sched_table(), None).unwrap();
    let qc = QueryConstraints::new(vec![c(2, SqlOp::Regexp)], vec![]);
    let mut cursor = table.open_cursor();
    cursor
        .filter(&qc, &[SqlValue::from("^(logd|binder)$")], FilterHistory::Different)
        .unwrap();
    assert_eq!(
        collect_column(&mut cursor, 2),
        vec![SqlValue::from("logd"), SqlValue::from("binder")]
    );
}

#[cfg(feature = "regexp")]
#[test]
fn test_regexp_value_must_be_string() {
    let table = DbTable::static_table("sched", sched_table(), None).unwrap();
    let qc = QueryConstraints::new(vec![c(2, SqlOp::Regexp)], vec![]);
    let mut cursor = table.open_cursor();
    let err = cursor
        .filter(&qc, &[SqlValue::Long(1)], FilterHistory::Different)
        .unwrap_err();
    assert_eq!(err, Error::RegexValueNotString);
    assert!(cursor.eof());
}

#[cfg(feature = "regexp")]
#[test]
fn test_regexp_pattern_must_compile() {
    let table = DbTable::static_table("sched", sched_table(), None).unwrap();
    let qc = QueryConstraints::new(vec![c(2, SqlOp::Regexp)], vec![]);
    let mut cursor = table.open_cursor();
    let err = cursor
        .filter(&qc, &[SqlValue::from("(unclosed")], FilterHistory::Different)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRegex { .. }));
    assert!(cursor.eof());
}

// =============================================================================
// Runtime tables
// =============================================================================

#[test]
fn test_runtime_table_end_to_end() {
    let registry = Arc::new(RuntimeTableRegistry::new());
    registry.register(
        "spans",
        Arc::new(OwnedTable::from_rows(
            sched_schema(),
            vec![vec![
                SqlValue::Long(0),
                SqlValue::Long(100),
                SqlValue::from("work"),
            ]],
        )),
    );

    {
        let table = DbTable::runtime_table("spans", registry.clone(), None).unwrap();
        let qc = QueryConstraints::default();
        let mut cursor = table.open_cursor();
        cursor.filter(&qc, &[], FilterHistory::Different).unwrap();
        assert_eq!(collect_column(&mut cursor, 2), vec![SqlValue::from("work")]);
    }

    // Dropping the virtual table erased the registry entry.
    assert!(registry.get("spans").is_none());
}
