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

//! Mapping tracker
//!
//! Tracks three kinds of mappings: user-space ([`MappingKind::User`]),
//! kernel-space ([`MappingKind::Kernel`]), and unclassified mappings for
//! data sources that do not say which address space they observed.
//!
//! The tracker owns every mapping it creates for its whole lifetime and
//! hands out [`MappingId`]s; all secondary indexes (by range, by name and
//! build id, by creation params) resolve back through the tracker.
//!
//! Overlapping mappings are not allowed. When two ranges collide the trace
//! is malformed or the importer has a bug, and the process aborts.
//! The one overlap-tolerant operation is [`MappingTracker::add_jit_range`],
//! which replaces previously registered jit ranges wholesale.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::profile::{FrameId, MappingId, ProfileContext};

use super::address_range::{AddressRange, AddressRangeMap};
use super::mapping::{
    BuildId, CreateMappingParams, MappingKind, UniquePid, VirtualMemoryMapping,
};

/// Frame-interning capability for jitted memory regions.
///
/// Jitted code can move in memory over time, so the same program counter
/// may refer to different functions at different points in the trace. The
/// tracker does not track such moves; it forwards frame creation inside a
/// registered jit range to the range's delegate.
pub trait JitDelegate: Send + Sync {
    /// Forward a frame-interning request.
    ///
    /// Returns the frame id and whether a new frame row was created.
    fn intern_frame(
        &self,
        mapping: &mut VirtualMemoryMapping,
        rel_pc: u64,
        function_name: &str,
    ) -> (FrameId, bool);

    /// Materialize a mapping for an address lookup inside the jit range.
    ///
    /// Some producers emit no mmap events for jitted regions, so a lookup
    /// can land in a jit range with no mapping underneath; the delegate
    /// creates one on the fly, owned by the tracker like any other.
    fn create_mapping(&self, tracker: &mut MappingTracker) -> MappingId;
}

/// Secondary-index key over (name, build id)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NameAndBuildId {
    name: String,
    build_id: Option<BuildId>,
}

/// Keeps track of all aspects relative to memory mappings
pub struct MappingTracker {
    context: Arc<ProfileContext>,

    /// Owning store; every other index resolves through this one
    mappings_by_id: FxHashMap<MappingId, VirtualMemoryMapping>,

    interned_mappings: FxHashMap<CreateMappingParams, MappingId>,
    mappings_by_name_and_build_id: FxHashMap<NameAndBuildId, Vec<MappingId>>,

    user_memory: FxHashMap<UniquePid, AddressRangeMap<MappingId>>,
    kernel_modules: AddressRangeMap<MappingId>,
    kernel: Option<MappingId>,

    jit_delegates: FxHashMap<UniquePid, AddressRangeMap<Arc<dyn JitDelegate>>>,
}

/// The kernel core is named either of these; everything else kernel-side
/// is a module.
fn is_kernel_module(name: &str) -> bool {
    !name.starts_with("[kernel.kallsyms]") && name != "/kernel"
}

impl MappingTracker {
    /// Create a tracker writing into the given profile context
    pub fn new(context: Arc<ProfileContext>) -> Self {
        Self {
            context,
            mappings_by_id: FxHashMap::default(),
            interned_mappings: FxHashMap::default(),
            mappings_by_name_and_build_id: FxHashMap::default(),
            user_memory: FxHashMap::default(),
            kernel_modules: AddressRangeMap::new(),
            kernel: None,
            jit_delegates: FxHashMap::default(),
        }
    }

    /// Resolve a mapping id; ids handed out by this tracker always resolve
    pub fn mapping(&self, id: MappingId) -> &VirtualMemoryMapping {
        self.mappings_by_id
            .get(&id)
            .expect("mapping id not owned by this tracker")
    }

    /// Mutable resolution, for frame interning
    pub fn mapping_mut(&mut self, id: MappingId) -> &mut VirtualMemoryMapping {
        self.mappings_by_id
            .get_mut(&id)
            .expect("mapping id not owned by this tracker")
    }

    /// Number of mappings created so far
    pub fn mapping_count(&self) -> usize {
        self.mappings_by_id.len()
    }

    /// Create a new kernel-space mapping.
    ///
    /// Names other than the kernel-core markers (`[kernel.kallsyms]*`,
    /// `/kernel`) are kernel modules and must not overlap each other. The
    /// kernel core is a singleton: creating it twice returns the existing
    /// mapping, and disagreeing about its range aborts.
    pub fn create_kernel_memory_mapping(&mut self, params: CreateMappingParams) -> MappingId {
        let is_module = is_kernel_module(&params.name);

        if !is_module {
            if let Some(kernel_id) = self.kernel {
                let existing = self.mapping(kernel_id);
                assert!(
                    params.memory_range == existing.memory_range(),
                    "kernel core mapping recreated with range {} != {}",
                    params.memory_range,
                    existing.memory_range()
                );
                return kernel_id;
            }
        }

        let mapping =
            VirtualMemoryMapping::new(self.context.clone(), MappingKind::Kernel, params);
        let id = mapping.mapping_id();

        if is_module {
            assert!(
                self.kernel_modules.emplace(mapping.memory_range(), id),
                "kernel module '{}' overlaps an existing module at {}",
                mapping.name(),
                mapping.memory_range()
            );
        } else {
            self.kernel = Some(id);
        }

        self.add_mapping(mapping)
    }

    /// Return the kernel core mapping, creating a sentinel one if needed.
    ///
    /// The sentinel covers no addresses (`[0, 0)`) and carries a load bias
    /// of `u64::MAX`; callers that learn the real kernel layout later
    /// create the core properly before relying on address lookups.
    pub fn get_or_create_kernel_memory_mapping_default(&mut self) -> MappingId {
        if let Some(kernel_id) = self.kernel {
            return kernel_id;
        }
        self.create_kernel_memory_mapping(CreateMappingParams {
            memory_range: AddressRange::new(0, 0),
            exact_offset: 0,
            start_offset: 0,
            load_bias: u64::MAX,
            name: "/kernel".to_string(),
            build_id: None,
        })
    }

    /// Create a new user-space mapping for `upid`.
    ///
    /// The range must be disjoint from the process's existing mappings.
    /// A jit range overlapping the new mapping must contain it entirely
    /// and becomes its frame-interning delegate.
    pub fn create_user_memory_mapping(
        &mut self,
        upid: UniquePid,
        params: CreateMappingParams,
    ) -> MappingId {
        let mapping_range = params.memory_range;
        let mut mapping =
            VirtualMemoryMapping::new(self.context.clone(), MappingKind::User(upid), params);
        let id = mapping.mapping_id();

        assert!(
            self.user_memory
                .entry(upid)
                .or_default()
                .emplace(mapping_range, id),
            "user mapping '{}' overlaps an existing mapping of upid {} at {}",
            mapping.name(),
            upid,
            mapping_range
        );

        if let Some(delegates) = self.jit_delegates.get(&upid) {
            delegates.for_overlaps(mapping_range, |jit_range, delegate| {
                assert!(
                    jit_range.contains_range(mapping_range),
                    "jit range {jit_range} partially overlaps user mapping at {mapping_range}"
                );
                mapping.set_jit_delegate(Arc::downgrade(delegate));
            });
        }

        self.add_mapping(mapping)
    }

    /// Return the mapping for `params`, creating an unclassified one on
    /// first sight. Structurally equal params intern to the same mapping.
    pub fn intern_memory_mapping(&mut self, params: CreateMappingParams) -> MappingId {
        if let Some(&id) = self.interned_mappings.get(&params) {
            return id;
        }

        let mapping =
            VirtualMemoryMapping::new(self.context.clone(), MappingKind::Other, params.clone());
        let id = mapping.mapping_id();
        self.interned_mappings.insert(params, id);
        self.add_mapping(mapping)
    }

    /// Find the kernel mapping containing `address`: modules first, then
    /// the kernel core.
    pub fn find_kernel_mapping_for_address(&self, address: u64) -> Option<MappingId> {
        if let Some((_, &id)) = self.kernel_modules.find(address) {
            return Some(id);
        }
        let kernel_id = self.kernel?;
        self.mapping(kernel_id)
            .memory_range()
            .contains(address)
            .then_some(kernel_id)
    }

    /// Find the user mapping of `upid` containing `address`.
    ///
    /// When no mapping covers the address but a registered jit range does,
    /// the jit delegate materializes one on the fly.
    pub fn find_user_mapping_for_address(
        &mut self,
        upid: UniquePid,
        address: u64,
    ) -> Option<MappingId> {
        if let Some(ranges) = self.user_memory.get(&upid) {
            if let Some((_, &id)) = ranges.find(address) {
                return Some(id);
            }
        }

        let delegate = self
            .jit_delegates
            .get(&upid)
            .and_then(|ranges| ranges.find(address))
            .map(|(_, delegate)| delegate.clone());
        delegate.map(|d| d.create_mapping(self))
    }

    /// Mappings registered under (name, build id), in creation order
    pub fn find_mappings(&self, name: &str, build_id: Option<&BuildId>) -> Vec<MappingId> {
        let key = NameAndBuildId {
            name: name.to_string(),
            build_id: build_id.cloned(),
        };
        self.mappings_by_name_and_build_id
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    /// Mark a range of `upid`'s memory as containing jitted code.
    ///
    /// Existing jit ranges overlapping the new one are dropped wholesale.
    /// Existing user mappings inside the range are re-delegated to the new
    /// delegate; a user mapping only partially covered aborts.
    pub fn add_jit_range(
        &mut self,
        upid: UniquePid,
        jit_range: AddressRange,
        delegate: Arc<dyn JitDelegate>,
    ) {
        self.jit_delegates
            .entry(upid)
            .or_default()
            .delete_overlaps_and_emplace(jit_range, delegate.clone());

        let mut delegated = Vec::new();
        if let Some(ranges) = self.user_memory.get(&upid) {
            ranges.for_overlaps(jit_range, |mapping_range, &id| {
                assert!(
                    jit_range.contains_range(mapping_range),
                    "jit range {jit_range} partially overlaps user mapping at {mapping_range}"
                );
                delegated.push(id);
            });
        }
        for id in delegated {
            self.mapping_mut(id).set_jit_delegate(Arc::downgrade(&delegate));
        }
    }

    fn add_mapping(&mut self, mapping: VirtualMemoryMapping) -> MappingId {
        let id = mapping.mapping_id();
        let key = NameAndBuildId {
            name: mapping.name().to_string(),
            build_id: mapping.build_id().cloned(),
        };
        self.mappings_by_name_and_build_id
            .entry(key)
            .or_default()
            .push(id);

        let previous = self.mappings_by_id.insert(id, mapping);
        assert!(previous.is_none(), "duplicate mapping id {id:?}");
        id
    }
}
