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

//! Virtual memory mappings
//!
//! A [`VirtualMemoryMapping`] ties an address range in some address space
//! (a user process, the kernel, or unclassified) to a file or code region,
//! and interns the stack frames observed inside it. Mappings belonging to
//! a jitted code region carry a weak back-reference to the region's
//! [`JitDelegate`](super::tracker::JitDelegate): jitted code moves over
//! time, so the same program counter can resolve to different frames and
//! frame creation is delegated instead of interned locally.

use std::fmt::Write as _;
use std::sync::{Arc, Weak};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::profile::{FrameId, FrameRow, MappingId, MappingRow, ProfileContext, StringId};

use super::address_range::AddressRange;
use super::tracker::JitDelegate;

/// Process-unique id assigned by the trace importer
pub type UniquePid = u32;

/// Opaque byte string identifying a binary artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildId(Vec<u8>);

impl BuildId {
    /// Wrap raw build-id bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lower-case hex rendering, as stored in the mapping table
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.0.len() * 2);
        for b in &self.0 {
            let _ = write!(out, "{b:02x}");
        }
        out
    }
}

/// Everything needed to create a mapping
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CreateMappingParams {
    /// Address range the mapping covers
    pub memory_range: AddressRange,

    /// File offset of the exact load segment
    pub exact_offset: u64,

    /// File offset of the first load segment
    pub start_offset: u64,

    /// Load bias applied when the binary was mapped
    pub load_bias: u64,

    /// Mapping name (file path or synthetic marker)
    pub name: String,

    /// Build id of the backing artifact, when known
    pub build_id: Option<BuildId>,
}

/// Which address space a mapping belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    /// A mapping in a user process's address space
    User(UniquePid),

    /// A kernel-space mapping (the kernel core or a module)
    Kernel,

    /// A mapping whose address space could not be classified
    Other,
}

/// Frame-interning key: relative pc plus interned function name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FrameKey {
    rel_pc: u64,
    name_id: StringId,
}

/// Per-mapping deduplication of (rel_pc, function name) into frame ids
#[derive(Default)]
pub struct FrameInterner {
    interned: FxHashMap<FrameKey, FrameId>,
    by_rel_pc: FxHashMap<u64, SmallVec<[FrameId; 1]>>,
}

impl FrameInterner {
    fn get(&self, key: FrameKey) -> Option<FrameId> {
        self.interned.get(&key).copied()
    }

    fn insert(&mut self, key: FrameKey, id: FrameId) {
        self.interned.insert(key, id);
    }

    fn record_at(&mut self, rel_pc: u64, id: FrameId) {
        self.by_rel_pc.entry(rel_pc).or_default().push(id);
    }

    fn frames_at(&self, rel_pc: u64) -> &[FrameId] {
        self.by_rel_pc.get(&rel_pc).map_or(&[], |v| v.as_slice())
    }
}

/// A single mapping owned by the tracker
pub struct VirtualMemoryMapping {
    context: Arc<ProfileContext>,
    mapping_id: MappingId,
    memory_range: AddressRange,
    offset: u64,
    load_bias: u64,
    name: String,
    build_id: Option<BuildId>,
    kind: MappingKind,
    jit_delegate: Option<Weak<dyn JitDelegate>>,
    interner: FrameInterner,
}

impl VirtualMemoryMapping {
    /// Create a mapping and insert its row into the mapping table
    pub(crate) fn new(
        context: Arc<ProfileContext>,
        kind: MappingKind,
        params: CreateMappingParams,
    ) -> Self {
        let build_id_hex = params
            .build_id
            .as_ref()
            .map_or_else(String::new, BuildId::to_hex);
        let row = MappingRow {
            build_id: context.storage.intern_string(&build_id_hex),
            exact_offset: params.exact_offset,
            start_offset: params.start_offset,
            start: params.memory_range.start(),
            end: params.memory_range.end(),
            load_bias: params.load_bias,
            name: context.storage.intern_string(&params.name),
        };
        let mapping_id = context.storage.insert_mapping(row);

        Self {
            context,
            mapping_id,
            memory_range: params.memory_range,
            offset: params.exact_offset,
            load_bias: params.load_bias,
            name: params.name,
            build_id: params.build_id,
            kind,
            jit_delegate: None,
            interner: FrameInterner::default(),
        }
    }

    /// Id of this mapping's row in the mapping table
    pub fn mapping_id(&self) -> MappingId {
        self.mapping_id
    }

    /// The covered address range; immutable after creation
    pub fn memory_range(&self) -> AddressRange {
        self.memory_range
    }

    /// File offset of the exact load segment
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Load bias applied when the binary was mapped
    pub fn load_bias(&self) -> u64 {
        self.load_bias
    }

    /// Mapping name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build id, when known
    pub fn build_id(&self) -> Option<&BuildId> {
        self.build_id.as_ref()
    }

    /// Which address space this mapping belongs to
    pub fn kind(&self) -> MappingKind {
        self.kind
    }

    /// Owning process, for user mappings
    pub fn upid(&self) -> Option<UniquePid> {
        match self.kind {
            MappingKind::User(upid) => Some(upid),
            _ => None,
        }
    }

    /// Attach (or replace) the JIT delegate responsible for this mapping
    pub(crate) fn set_jit_delegate(&mut self, delegate: Weak<dyn JitDelegate>) {
        self.jit_delegate = Some(delegate);
    }

    /// Returns true if a live JIT delegate is attached
    pub fn has_jit_delegate(&self) -> bool {
        self.jit_delegate
            .as_ref()
            .is_some_and(|d| d.strong_count() > 0)
    }

    /// Returns true if `delegate` is the one attached to this mapping
    pub fn is_delegated_to(&self, delegate: &Arc<dyn JitDelegate>) -> bool {
        self.jit_delegate
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|d| Arc::ptr_eq(&d, delegate))
    }

    /// Intern the frame at `rel_pc` with the given function name.
    ///
    /// Jitted mappings forward to their delegate; all others intern
    /// locally, inserting a frame row on first sight. Repeated calls with
    /// the same (rel_pc, name) return the same id and notify no one.
    pub fn intern_frame(&mut self, rel_pc: u64, function_name: &str) -> FrameId {
        let delegate = self.jit_delegate.as_ref().and_then(Weak::upgrade);
        let (frame_id, was_new) = match delegate {
            Some(d) => d.intern_frame(self, rel_pc, function_name),
            None => self.intern_frame_impl(rel_pc, function_name),
        };
        if was_new {
            self.interner.record_at(rel_pc, frame_id);
            self.context.stack_profile_tracker.on_frame_created(frame_id);
        }
        frame_id
    }

    /// Frame ids previously interned at `rel_pc`, in creation order.
    /// Multiple ids appear when the function name differed between calls.
    pub fn find_frame_ids(&self, rel_pc: u64) -> &[FrameId] {
        self.interner.frames_at(rel_pc)
    }

    /// Default interning path: dedup on (rel_pc, interned name), insert a
    /// frame row on miss. Public so JIT delegates can fall back to it.
    pub fn intern_frame_impl(&mut self, rel_pc: u64, function_name: &str) -> (FrameId, bool) {
        let key = FrameKey {
            rel_pc,
            name_id: self.context.storage.intern_string(function_name),
        };
        if let Some(id) = self.interner.get(key) {
            return (id, false);
        }

        let frame_id = self.context.storage.insert_frame(FrameRow {
            name: key.name_id,
            mapping: self.mapping_id,
            rel_pc,
        });
        self.interner.insert(key, frame_id);
        (frame_id, true)
    }
}
