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

//! Cost model for the virtual-table bridge
//!
//! Estimates the cost of a constraint set against a table so the SQL
//! engine's planner can choose between query plans. The constants are
//! relative units tuned empirically, not wall-clock time; the only
//! contractual property is that cost never decreases as the table grows.
//!
//! The model walks the constraints in order, shrinking the running row
//! estimate as each one applies:
//! - id-column equality pins the result to one row at a small fixed cost
//!   (a full filter call is roughly 10x the cost of iterating one row,
//!   which matters when the engine drives the table once per joined row)
//! - a lone equality, or equality on a sorted column, can binary search
//! - range constraints on sorted columns also binary search
//! - everything else is a scan that at best halves the row count

use crate::core::Schema;

use super::constraints::QueryConstraints;

/// Fixed set-up and tear-down cost of a query, in rows-equivalent units
const FIXED_QUERY_COST: f64 = 1000.0;

/// Estimated cost and cardinality for a constraint set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryCost {
    /// Total estimated cost
    pub cost: f64,

    /// Estimated number of returned rows
    pub rows: u32,
}

/// Estimate the cost of running `qc` against a table of `row_count` rows.
pub fn estimate_cost(schema: &Schema, row_count: u32, qc: &QueryConstraints) -> QueryCost {
    // An empty table pays only the fixed cost, and zero is an honest row
    // estimate rather than a planner hint.
    let mut current_row_count = row_count;
    if current_row_count == 0 {
        return QueryCost {
            cost: FIXED_QUERY_COST,
            rows: 0,
        };
    }

    let mut filter_cost = 0.0;
    let cs = qc.constraints();
    for c in cs {
        if current_row_count < 2 {
            break;
        }
        let col_schema = schema.column(c.column);
        let rows = f64::from(current_row_count);
        if c.op.is_eq() && col_schema.is_id {
            filter_cost += 10.0;
            current_row_count = 1;
        } else if c.op.is_eq() {
            filter_cost += if cs.len() == 1 || col_schema.is_sorted {
                rows.log2()
            } else {
                rows
            };
            current_row_count = shrink_by_double_log(current_row_count);
        } else if col_schema.is_sorted && c.op.is_range() {
            filter_cost += rows.log2();
            current_row_count = shrink_by_double_log(current_row_count);
        } else {
            filter_cost += rows;
            current_row_count = (current_row_count / 2).max(1);
        }
    }

    let final_rows = f64::from(current_row_count);
    let sort_cost = (qc.order_by().len() as f64) * final_rows * final_rows.log2();
    let iteration_cost = final_rows * 2.0;

    QueryCost {
        cost: FIXED_QUERY_COST + filter_cost + sort_cost + iteration_cost,
        rows: current_row_count,
    }
}

/// Rough heuristic: an equality or sorted-range constraint cuts the row
/// count down by about double the log of the row count.
fn shrink_by_double_log(row_count: u32) -> u32 {
    let rows = f64::from(row_count);
    let estimated = rows / (2.0 * rows.log2());
    (estimated as u32).max(1)
}
