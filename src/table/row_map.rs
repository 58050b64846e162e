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

//! RowMap - a compact representation of a subset of table rows
//!
//! A [`RowMap`] is either a contiguous range of row indices or an explicit
//! index vector. Filters produce row maps; iteration applies them back to
//! the source table. Contiguous index vectors collapse to the range form so
//! downstream fast paths (single-row cursors) trigger without a scan.

/// A subset of rows in a columnar table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowMap {
    /// Contiguous half-open range of row indices
    Range { start: u32, end: u32 },

    /// Explicit row indices, in output order
    Index(Vec<u32>),
}

impl RowMap {
    /// Row map selecting every row of an `n`-row table
    pub fn all(n: u32) -> Self {
        RowMap::Range { start: 0, end: n }
    }

    /// Empty row map
    pub fn empty() -> Self {
        RowMap::Range { start: 0, end: 0 }
    }

    /// Build from an index vector, collapsing a contiguous ascending run
    /// back into the range form.
    pub fn from_index_vec(rows: Vec<u32>) -> Self {
        if rows.is_empty() {
            return RowMap::empty();
        }
        let contiguous = rows.windows(2).all(|w| w[1] == w[0] + 1);
        if contiguous {
            return RowMap::Range {
                start: rows[0],
                end: rows[rows.len() - 1] + 1,
            };
        }
        RowMap::Index(rows)
    }

    /// Number of selected rows
    pub fn len(&self) -> u32 {
        match self {
            RowMap::Range { start, end } => end - start,
            RowMap::Index(rows) => rows.len() as u32,
        }
    }

    /// Returns true if no rows are selected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if this is the contiguous range form
    pub fn is_range(&self) -> bool {
        matches!(self, RowMap::Range { .. })
    }

    /// Source row index of the `i`-th selected row
    pub fn get(&self, i: u32) -> u32 {
        match self {
            RowMap::Range { start, .. } => start + i,
            RowMap::Index(rows) => rows[i as usize],
        }
    }

    /// Iterate the selected source row indices in output order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}
