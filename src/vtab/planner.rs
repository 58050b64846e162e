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

//! Constraint planner
//!
//! Rewrites a constraint set in place before the cost model sees it:
//! cheap-to-filter columns move to the front, and orderings the table
//! satisfies for free are dropped. The rewrites are advisory; result
//! correctness never depends on them.

use crate::core::Schema;

use super::constraints::QueryConstraints;

/// Reorder constraints by column cheapness and prune redundant orderings.
pub fn modify_constraints(schema: &Schema, qc: &mut QueryConstraints) {
    // Cheapest columns first: id, then set-id, then sorted. The sort is
    // stable so equally-ranked constraints keep the engine's order.
    qc.mutable_constraints().sort_by_key(|c| {
        let col = schema.column(c.column);
        (!col.is_id, !col.is_set_id, !col.is_sorted)
    });

    // An equality constraint fixes its column to a single value, so any
    // ordering on that column is a no-op.
    let eq_columns: Vec<u32> = qc
        .constraints()
        .iter()
        .filter(|c| c.op.is_eq())
        .map(|c| c.column)
        .collect();
    qc.mutable_order_by()
        .retain(|o| !eq_columns.contains(&o.column));

    // Walk the orderings from the back and pop the trailing run that the
    // storage order already satisfies: ascending orders on sorted columns.
    let ob = qc.mutable_order_by();
    while let Some(last) = ob.last() {
        if last.desc || !schema.column(last.column).is_sorted {
            break;
        }
        ob.pop();
    }
}
