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

//! Runtime SQL values
//!
//! [`SqlValue`] is the value type flowing between the SQL engine and the
//! columnar tables: constraint right-hand sides, table-function arguments,
//! and cell contents all use it.
//!
//! Ordering follows SQL type precedence: NULL < numeric < TEXT < BLOB.
//! Longs and doubles compare numerically across variants, and doubles use a
//! total order so sorts stay stable in the presence of NaN.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A runtime SQL value
#[derive(Debug, Clone)]
pub enum SqlValue {
    /// SQL NULL
    Null,

    /// 64-bit signed integer
    Long(i64),

    /// 64-bit floating point
    Double(f64),

    /// UTF-8 text (Arc for cheap cloning)
    String(Arc<str>),

    /// Opaque byte string (Arc for cheap cloning)
    Bytes(Arc<[u8]>),
}

impl SqlValue {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a text value
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        SqlValue::String(s.into())
    }

    /// Create a blob value
    pub fn bytes(b: impl Into<Arc<[u8]>>) -> Self {
        SqlValue::Bytes(b.into())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns true if this value is NULL
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Returns the text payload, if this is a string value
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is a long value
    #[inline]
    pub fn as_long(&self) -> Option<i64> {
        match self {
            SqlValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the floating-point payload, if this is a double value
    #[inline]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            SqlValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    // =========================================================================
    // Comparison
    // =========================================================================

    /// Rank of the value's type in SQL ordering: NULL < numeric < TEXT < BLOB
    #[inline]
    fn type_rank(&self) -> u8 {
        match self {
            SqlValue::Null => 0,
            SqlValue::Long(_) | SqlValue::Double(_) => 1,
            SqlValue::String(_) => 2,
            SqlValue::Bytes(_) => 3,
        }
    }

    /// Total ordering over values, used for sorting.
    ///
    /// NULLs sort first; longs and doubles compare numerically across
    /// variants; NaN orders via IEEE total ordering.
    pub fn total_cmp(&self, other: &SqlValue) -> Ordering {
        use SqlValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Long(a), Long(b)) => a.cmp(b),
            (Double(a), Double(b)) => a.total_cmp(b),
            (Long(a), Double(b)) => (*a as f64).total_cmp(b),
            (Double(a), Long(b)) => a.total_cmp(&(*b as f64)),
            (String(a), String(b)) => a.as_ref().cmp(b.as_ref()),
            (Bytes(a), Bytes(b)) => a.as_ref().cmp(b.as_ref()),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    /// Comparison for filtering.
    ///
    /// Returns `None` when either side is NULL: SQL comparison operators
    /// never match NULL, only IS NULL / IS NOT NULL do.
    pub fn compare(&self, other: &SqlValue) -> Option<Ordering> {
        if self.is_null() || other.is_null() {
            return None;
        }
        Some(self.total_cmp(other))
    }
}

impl PartialEq for SqlValue {
    fn eq(&self, other: &Self) -> bool {
        self.total_cmp(other) == Ordering::Equal
    }
}

impl Eq for SqlValue {}

impl Hash for SqlValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            SqlValue::Null => state.write_u8(0),
            SqlValue::Long(v) => {
                state.write_u8(1);
                v.hash(state);
            }
            SqlValue::Double(v) => {
                state.write_u8(2);
                v.to_bits().hash(state);
            }
            SqlValue::String(s) => {
                state.write_u8(3);
                s.hash(state);
            }
            SqlValue::Bytes(b) => {
                state.write_u8(4);
                b.hash(state);
            }
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "<null>"),
            SqlValue::Long(v) => write!(f, "{v}"),
            SqlValue::Double(v) => write!(f, "{v}"),
            SqlValue::String(s) => write!(f, "{s}"),
            SqlValue::Bytes(_) => write!(f, "<bytes>"),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Long(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Double(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(Arc::from(v))
    }
}
