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

//! Query cache for sorted table copies
//!
//! Repeated equality filters on an unsorted column are served much faster
//! from a copy of the table sorted by that column. The cache maps a
//! fingerprint of (source table, constraint shape) to such a copy, shared
//! across every cursor over the same table. The key carries no constraint
//! values: `c0 = 42` and `c0 = 43` both want the table sorted by `c0`.
//! Cached copies are `Arc`-held and outlive the cursor that built them.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::table::{DataTable, OwnedTable};

use super::constraints::SqlConstraint;

/// Default number of cached sorted copies
pub const DEFAULT_CACHE_SIZE: usize = 128;

/// Cache key: identity of the source table plus the constraint shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    /// Address of the source table's data, used as an identity token.
    /// Valid because cached copies are only ever keyed by tables that
    /// stay alive for the lifetime of the process-wide cache.
    table: usize,
    constraints: Vec<SqlConstraint>,
}

impl CacheKey {
    fn new(table: &Arc<dyn DataTable>, constraints: &[SqlConstraint]) -> Self {
        Self {
            table: Arc::as_ptr(table) as *const () as usize,
            constraints: constraints.to_vec(),
        }
    }
}

/// Process-wide cache of sorted table copies
pub struct QueryCache {
    entries: Mutex<LruCache<CacheKey, Arc<OwnedTable>, ahash::RandomState>>,
}

impl QueryCache {
    /// Create a cache holding at most `capacity` sorted copies
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            entries: Mutex::new(LruCache::with_hasher(capacity, ahash::RandomState::new())),
        }
    }

    /// Look up a cached sorted copy for this (table, constraints) pair
    pub fn get_if_cached(
        &self,
        table: &Arc<dyn DataTable>,
        constraints: &[SqlConstraint],
    ) -> Option<Arc<OwnedTable>> {
        let key = CacheKey::new(table, constraints);
        self.entries.lock().get(&key).cloned()
    }

    /// Return the cached copy, or build and cache one via `build`
    pub fn get_or_cache(
        &self,
        table: &Arc<dyn DataTable>,
        constraints: &[SqlConstraint],
        build: impl FnOnce() -> OwnedTable,
    ) -> Arc<OwnedTable> {
        let key = CacheKey::new(table, constraints);
        let mut entries = self.entries.lock();
        if let Some(cached) = entries.get(&key) {
            return cached.clone();
        }
        let built = Arc::new(build());
        entries.put(key, built.clone());
        built
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}
