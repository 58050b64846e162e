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

//! Query constraints - the SQL engine's side of the bridge
//!
//! [`QueryConstraints`] is what BestIndex and Filter receive from the SQL
//! engine: per-column [`SqlOp`] constraints (values arrive separately at
//! Filter time) and order-by directives. [`SqlOp`] covers every operator
//! the engine may hand over; [`FilterOp`](crate::table::FilterOp) covers
//! the subset the bridge executes itself, and
//! [`SqlOp::to_filter_op`] is the translation between the two.

use crate::table::FilterOp;

/// A constraint operator as received from the SQL engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlOp {
    /// Equality (=)
    Eq,

    /// Inequality (!=)
    Ne,

    /// Less than (<)
    Lt,

    /// Less than or equal (<=)
    Le,

    /// Greater than (>)
    Gt,

    /// Greater than or equal (>=)
    Ge,

    /// IS NULL check
    IsNull,

    /// IS NOT NULL check
    IsNotNull,

    /// GLOB pattern match
    Glob,

    /// REGEXP match
    Regexp,

    /// LIKE pattern match (left to the SQL engine)
    Like,

    /// LIMIT pushdown (left to the SQL engine)
    Limit,

    /// OFFSET pushdown (left to the SQL engine)
    Offset,

    /// IS comparison (left to the SQL engine)
    Is,

    /// IS NOT comparison (left to the SQL engine)
    IsNot,
}

impl SqlOp {
    /// Translate to the op the bridge executes itself.
    ///
    /// Returns `None` for operators left to the SQL engine; the omit flag
    /// stays false for those and the engine re-checks the rows. REGEXP
    /// translates only when the build carries regex support.
    pub fn to_filter_op(self) -> Option<FilterOp> {
        match self {
            SqlOp::Eq => Some(FilterOp::Eq),
            SqlOp::Ne => Some(FilterOp::Ne),
            SqlOp::Lt => Some(FilterOp::Lt),
            SqlOp::Le => Some(FilterOp::Le),
            SqlOp::Gt => Some(FilterOp::Gt),
            SqlOp::Ge => Some(FilterOp::Ge),
            SqlOp::IsNull => Some(FilterOp::IsNull),
            SqlOp::IsNotNull => Some(FilterOp::IsNotNull),
            SqlOp::Glob => Some(FilterOp::Glob),
            #[cfg(feature = "regexp")]
            SqlOp::Regexp => Some(FilterOp::Regex),
            #[cfg(not(feature = "regexp"))]
            SqlOp::Regexp => None,
            SqlOp::Like | SqlOp::Limit | SqlOp::Offset | SqlOp::Is | SqlOp::IsNot => None,
        }
    }

    /// Returns true for the equality operator
    #[inline]
    pub fn is_eq(self) -> bool {
        self == SqlOp::Eq
    }

    /// Returns true for the four range operators (<, <=, >, >=)
    #[inline]
    pub fn is_range(self) -> bool {
        matches!(self, SqlOp::Lt | SqlOp::Le | SqlOp::Gt | SqlOp::Ge)
    }
}

/// A single constraint as received from the SQL engine
///
/// The right-hand value is not part of the constraint; values arrive as a
/// separate argument vector when Filter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlConstraint {
    /// Column index into the table schema
    pub column: u32,

    /// Constraint operator
    pub op: SqlOp,
}

/// A single order-by directive as received from the SQL engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlOrderBy {
    /// Column index into the table schema
    pub column: u32,

    /// Descending when true
    pub desc: bool,
}

/// The constraint set the SQL engine hands to BestIndex and Filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryConstraints {
    constraints: Vec<SqlConstraint>,
    order_by: Vec<SqlOrderBy>,
}

impl QueryConstraints {
    /// Create a constraint set
    pub fn new(constraints: Vec<SqlConstraint>, order_by: Vec<SqlOrderBy>) -> Self {
        Self {
            constraints,
            order_by,
        }
    }

    /// The constraints, in the engine's order
    pub fn constraints(&self) -> &[SqlConstraint] {
        &self.constraints
    }

    /// The order-by directives, in the engine's order
    pub fn order_by(&self) -> &[SqlOrderBy] {
        &self.order_by
    }

    /// Mutable access for the constraint planner
    pub fn mutable_constraints(&mut self) -> &mut Vec<SqlConstraint> {
        &mut self.constraints
    }

    /// Mutable access for the constraint planner
    pub fn mutable_order_by(&mut self) -> &mut Vec<SqlOrderBy> {
        &mut self.order_by
    }
}

/// Advisory flag from the SQL engine: does the current constraint shape
/// match the previous Filter call on this cursor?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterHistory {
    /// New constraint shape
    Different,

    /// Identical shape to the last call
    Same,
}

/// BestIndex output returned to the SQL engine
#[derive(Debug, Clone, Default)]
pub struct BestIndexInfo {
    /// Per-constraint: true when the bridge evaluates the constraint
    /// itself and the engine may skip re-checking it
    pub omit_constraint: Vec<bool>,

    /// True when the bridge honours all orderings itself
    pub omit_order_by: bool,

    /// Estimated query cost, in rows-equivalent units
    pub estimated_cost: f64,

    /// Estimated number of returned rows
    pub estimated_rows: u32,
}

impl BestIndexInfo {
    /// Prepare an output block for a constraint set
    pub fn for_query(qc: &QueryConstraints) -> Self {
        Self {
            omit_constraint: vec![false; qc.constraints().len()],
            ..Default::default()
        }
    }
}
