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

//! In-memory columnar table
//!
//! [`OwnedTable`] stores data column-major and implements the full
//! [`DataTable`] contract: scan filtering into a [`RowMap`] and stable
//! multi-column sorts. Sorted copies produced by [`OwnedTable::sort`] are
//! what the query cache holds.

use std::cmp::Ordering;

use regex::Regex;

use super::glob::GlobPattern;
use super::row_map::RowMap;
use super::{Constraint, DataTable, FilterOp, Order};
use crate::core::{Schema, SqlValue};

/// An owned, immutable, column-major table
#[derive(Debug, Clone)]
pub struct OwnedTable {
    schema: Schema,
    columns: Vec<Vec<SqlValue>>,
    row_count: u32,
}

impl OwnedTable {
    /// Create a table from column-major data
    ///
    /// The number of columns must match the schema and all columns must
    /// have the same length.
    pub fn new(schema: Schema, columns: Vec<Vec<SqlValue>>) -> Self {
        assert_eq!(
            schema.columns.len(),
            columns.len(),
            "column count does not match schema"
        );
        let row_count = columns.first().map_or(0, Vec::len);
        assert!(
            columns.iter().all(|c| c.len() == row_count),
            "columns have unequal lengths"
        );
        Self {
            schema,
            columns,
            row_count: row_count as u32,
        }
    }

    /// Create a table from row-major data
    pub fn from_rows(schema: Schema, rows: Vec<Vec<SqlValue>>) -> Self {
        let ncols = schema.columns.len();
        let mut columns: Vec<Vec<SqlValue>> = vec![Vec::with_capacity(rows.len()); ncols];
        for row in rows {
            assert_eq!(row.len(), ncols, "row width does not match schema");
            for (col, value) in columns.iter_mut().zip(row) {
                col.push(value);
            }
        }
        let row_count = columns.first().map_or(0, Vec::len) as u32;
        Self {
            schema,
            columns,
            row_count,
        }
    }

    fn column(&self, col: u32) -> &[SqlValue] {
        &self.columns[col as usize]
    }

    /// Compare two rows under an ordering chain
    fn compare_rows(&self, a: u32, b: u32, orders: &[Order]) -> Ordering {
        for o in orders {
            let col = self.column(o.col);
            let ord = col[a as usize].total_cmp(&col[b as usize]);
            let ord = if o.desc { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl DataTable for OwnedTable {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn row_count(&self) -> u32 {
        self.row_count
    }

    fn cell(&self, row: u32, col: u32) -> SqlValue {
        self.columns[col as usize][row as usize].clone()
    }

    fn query_to_row_map(&self, constraints: &[Constraint], orders: &[Order]) -> RowMap {
        if constraints.is_empty() && orders.is_empty() {
            return RowMap::all(self.row_count);
        }

        let mut rows: Vec<u32> = (0..self.row_count).collect();
        for c in constraints {
            let matcher = Matcher::new(c);
            let col = self.column(c.col);
            rows.retain(|&r| matcher.matches(&col[r as usize]));
        }

        if !orders.is_empty() {
            rows.sort_by(|&a, &b| self.compare_rows(a, b, orders));
        }

        RowMap::from_index_vec(rows)
    }

    fn sort(&self, orders: &[Order]) -> OwnedTable {
        let mut rows: Vec<u32> = (0..self.row_count).collect();
        rows.sort_by(|&a, &b| self.compare_rows(a, b, orders));

        let columns = self
            .columns
            .iter()
            .map(|col| rows.iter().map(|&r| col[r as usize].clone()).collect())
            .collect();

        // A permutation invalidates every sortedness claim except the one
        // the leading ascending order establishes.
        let mut schema = self.schema.clone();
        for col in &mut schema.columns {
            col.is_sorted = false;
        }
        if let Some(first) = orders.first() {
            if !first.desc {
                schema.columns[first.col as usize].is_sorted = true;
            }
        }

        OwnedTable::new(schema, columns)
    }
}

/// A prepared single-constraint predicate
enum Matcher<'a> {
    Cmp(FilterOp, &'a SqlValue),
    IsNull,
    IsNotNull,
    Glob(GlobPattern),
    Regex(Option<Regex>),
}

impl<'a> Matcher<'a> {
    fn new(c: &'a Constraint) -> Self {
        match c.op {
            FilterOp::IsNull => Matcher::IsNull,
            FilterOp::IsNotNull => Matcher::IsNotNull,
            FilterOp::Glob => {
                let pattern = c.value.as_str().unwrap_or("");
                Matcher::Glob(GlobPattern::new(pattern))
            }
            FilterOp::Regex => {
                let regex = c.value.as_str().and_then(|p| Regex::new(p).ok());
                Matcher::Regex(regex)
            }
            op => Matcher::Cmp(op, &c.value),
        }
    }

    fn matches(&self, value: &SqlValue) -> bool {
        match self {
            Matcher::IsNull => value.is_null(),
            Matcher::IsNotNull => !value.is_null(),
            Matcher::Glob(pattern) => value.as_str().is_some_and(|s| pattern.matches(s)),
            Matcher::Regex(regex) => match (regex, value.as_str()) {
                (Some(re), Some(s)) => re.is_match(s),
                _ => false,
            },
            Matcher::Cmp(op, rhs) => {
                let Some(ord) = value.compare(rhs) else {
                    return false;
                };
                match op {
                    FilterOp::Eq => ord == Ordering::Equal,
                    FilterOp::Ne => ord != Ordering::Equal,
                    FilterOp::Lt => ord == Ordering::Less,
                    FilterOp::Le => ord != Ordering::Greater,
                    FilterOp::Gt => ord == Ordering::Greater,
                    FilterOp::Ge => ord != Ordering::Less,
                    _ => unreachable!("pattern ops handled above"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ColumnSchema, SqlType};

    fn test_table() -> OwnedTable {
        let schema = Schema::new(vec![
            ColumnSchema::id("id"),
            ColumnSchema::new("ts", SqlType::Long).sorted(),
            ColumnSchema::new("name", SqlType::String),
        ]);
        OwnedTable::from_rows(
            schema,
            vec![
                vec![SqlValue::Long(0), SqlValue::Long(100), SqlValue::from("idle")],
                vec![SqlValue::Long(1), SqlValue::Long(200), SqlValue::from("sched")],
                vec![SqlValue::Long(2), SqlValue::Long(300), SqlValue::from("idle")],
                vec![SqlValue::Long(3), SqlValue::Long(400), SqlValue::Null],
            ],
        )
    }

    fn eq(col: u32, value: SqlValue) -> Constraint {
        Constraint {
            col,
            op: FilterOp::Eq,
            value,
        }
    }

    #[test]
    fn test_unconstrained_is_full_range() {
        let t = test_table();
        assert_eq!(t.query_to_row_map(&[], &[]), RowMap::Range { start: 0, end: 4 });
    }

    #[test]
    fn test_eq_filter() {
        let t = test_table();
        let rm = t.query_to_row_map(&[eq(2, SqlValue::from("idle"))], &[]);
        assert_eq!(rm.iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_id_eq_collapses_to_single_range() {
        let t = test_table();
        let rm = t.query_to_row_map(&[eq(0, SqlValue::Long(2))], &[]);
        assert_eq!(rm, RowMap::Range { start: 2, end: 3 });
    }

    #[test]
    fn test_range_filter_skips_null() {
        let t = test_table();
        let rm = t.query_to_row_map(
            &[Constraint {
                col: 2,
                op: FilterOp::Ne,
                value: SqlValue::from("sched"),
            }],
            &[],
        );
        // Row 3 has a NULL name; comparisons never match NULL.
        assert_eq!(rm.iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_is_null() {
        let t = test_table();
        let rm = t.query_to_row_map(
            &[Constraint {
                col: 2,
                op: FilterOp::IsNull,
                value: SqlValue::Null,
            }],
            &[],
        );
        assert_eq!(rm.iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_order_desc() {
        let t = test_table();
        let rm = t.query_to_row_map(&[], &[Order { col: 1, desc: true }]);
        assert_eq!(rm.iter().collect::<Vec<_>>(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_glob_filter() {
        let t = test_table();
        let rm = t.query_to_row_map(
            &[Constraint {
                col: 2,
                op: FilterOp::Glob,
                value: SqlValue::from("id*"),
            }],
            &[],
        );
        assert_eq!(rm.iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_sort_marks_leading_column_sorted() {
        let t = test_table();
        let sorted = t.sort(&[Order { col: 2, desc: false }]);
        assert!(sorted.schema().columns[2].is_sorted);
        assert!(!sorted.schema().columns[1].is_sorted);
        // NULL sorts first.
        assert_eq!(sorted.cell(0, 2), SqlValue::Null);
        assert_eq!(sorted.cell(1, 2), SqlValue::from("idle"));
    }

    #[test]
    fn test_sort_is_stable() {
        let t = test_table();
        let sorted = t.sort(&[Order { col: 2, desc: false }]);
        // The two "idle" rows keep their relative order (ids 0 then 2).
        assert_eq!(sorted.cell(1, 0), SqlValue::Long(0));
        assert_eq!(sorted.cell(2, 0), SqlValue::Long(2));
    }
}
