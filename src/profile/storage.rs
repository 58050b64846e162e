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

//! Stack-profile storage
//!
//! Process-wide tables the mapping tracker writes into: an interned string
//! pool, the stack-profile mapping table, and the stack-profile frame
//! table. Ids are dense and assigned in insertion order; rows are never
//! removed. Access is serialized by the single-threaded core; the locks
//! only keep the shared handles `Sync`.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

/// Id of an interned string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringId(u32);

/// Id of a row in the stack-profile mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MappingId(u32);

/// Id of a row in the stack-profile frame table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u32);

macro_rules! impl_id {
    ($($ty:ident),*) => {
        $(impl $ty {
            /// Wrap a raw id value
            pub fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// The raw id value
            pub fn raw(self) -> u32 {
                self.0
            }
        })*
    };
}
impl_id!(StringId, MappingId, FrameId);

/// A row in the stack-profile mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingRow {
    /// Interned hex rendering of the build id; the empty string when absent
    pub build_id: StringId,

    /// File offset of the exact load segment
    pub exact_offset: u64,

    /// File offset of the first load segment
    pub start_offset: u64,

    /// Start of the mapped address range
    pub start: u64,

    /// End (exclusive) of the mapped address range
    pub end: u64,

    /// Load bias applied when the binary was mapped
    pub load_bias: u64,

    /// Interned mapping name
    pub name: StringId,
}

/// A row in the stack-profile frame table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRow {
    /// Interned function name
    pub name: StringId,

    /// Mapping the frame belongs to
    pub mapping: MappingId,

    /// Program counter relative to the mapping start
    pub rel_pc: u64,
}

#[derive(Default)]
struct StringPool {
    ids: FxHashMap<Arc<str>, StringId>,
    strings: Vec<Arc<str>>,
}

/// The string, mapping, and frame tables backing stack profiles
#[derive(Default)]
pub struct ProfileStorage {
    strings: RwLock<StringPool>,
    mappings: RwLock<Vec<MappingRow>>,
    frames: RwLock<Vec<FrameRow>>,
}

impl ProfileStorage {
    /// Intern a string, returning its stable id
    pub fn intern_string(&self, s: &str) -> StringId {
        if let Some(&id) = self.strings.read().ids.get(s) {
            return id;
        }
        let mut pool = self.strings.write();
        if let Some(&id) = pool.ids.get(s) {
            return id;
        }
        let id = StringId(pool.strings.len() as u32);
        let interned: Arc<str> = Arc::from(s);
        pool.strings.push(interned.clone());
        pool.ids.insert(interned, id);
        id
    }

    /// Resolve an interned string
    pub fn string(&self, id: StringId) -> Arc<str> {
        self.strings.read().strings[id.0 as usize].clone()
    }

    /// Insert a mapping row, returning its dense id
    pub fn insert_mapping(&self, row: MappingRow) -> MappingId {
        let mut mappings = self.mappings.write();
        let id = MappingId(mappings.len() as u32);
        mappings.push(row);
        id
    }

    /// Read back a mapping row
    pub fn mapping_row(&self, id: MappingId) -> MappingRow {
        self.mappings.read()[id.0 as usize]
    }

    /// Number of mapping rows
    pub fn mapping_count(&self) -> u32 {
        self.mappings.read().len() as u32
    }

    /// Insert a frame row, returning its dense id
    pub fn insert_frame(&self, row: FrameRow) -> FrameId {
        let mut frames = self.frames.write();
        let id = FrameId(frames.len() as u32);
        frames.push(row);
        id
    }

    /// Read back a frame row
    pub fn frame_row(&self, id: FrameId) -> FrameRow {
        self.frames.read()[id.0 as usize]
    }

    /// Number of frame rows
    pub fn frame_count(&self) -> u32 {
        self.frames.read().len() as u32
    }
}

/// Downstream consumer of frame-creation events
///
/// Symbolization passes read the creation sequence to find frames that
/// still need symbols attached.
#[derive(Default)]
pub struct StackProfileTracker {
    created: Mutex<Vec<FrameId>>,
}

impl StackProfileTracker {
    /// Record that a new frame row was created
    pub fn on_frame_created(&self, frame_id: FrameId) {
        self.created.lock().push(frame_id);
    }

    /// Snapshot of the creation sequence, in order
    pub fn created_frames(&self) -> Vec<FrameId> {
        self.created.lock().clone()
    }
}

/// The process-wide collaborators shared by every tracker and mapping
#[derive(Default)]
pub struct ProfileContext {
    /// String, mapping, and frame tables
    pub storage: ProfileStorage,

    /// Frame-creation notification sink
    pub stack_profile_tracker: StackProfileTracker,
}

impl ProfileContext {
    /// Create a fresh context behind a shared handle
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_interning_is_idempotent() {
        let storage = ProfileStorage::default();
        let a = storage.intern_string("main");
        let b = storage.intern_string("main");
        let c = storage.intern_string("malloc");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(&*storage.string(a), "main");
    }

    #[test]
    fn test_ids_are_dense_and_ordered() {
        let storage = ProfileStorage::default();
        let name = storage.intern_string("f");
        let m = storage.insert_mapping(MappingRow {
            build_id: storage.intern_string(""),
            exact_offset: 0,
            start_offset: 0,
            start: 0x1000,
            end: 0x2000,
            load_bias: 0,
            name,
        });
        let f0 = storage.insert_frame(FrameRow {
            name,
            mapping: m,
            rel_pc: 0x10,
        });
        let f1 = storage.insert_frame(FrameRow {
            name,
            mapping: m,
            rel_pc: 0x20,
        });
        assert_eq!(f0.raw(), 0);
        assert_eq!(f1.raw(), 1);
        assert_eq!(storage.frame_row(f1).rel_pc, 0x20);
    }

    #[test]
    fn test_frame_creation_notifications_in_order() {
        let tracker = StackProfileTracker::default();
        tracker.on_frame_created(FrameId::new(2));
        tracker.on_frame_created(FrameId::new(0));
        assert_eq!(
            tracker.created_frames(),
            vec![FrameId::new(2), FrameId::new(0)]
        );
    }
}
