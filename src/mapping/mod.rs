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

//! Memory-mapping tracker
//!
//! Indexes kernel, user-process, and unclassified virtual memory mappings
//! by address range and by (name, build id) so stack samples can be
//! symbolized:
//!
//! - [`AddressRange`] / [`AddressRangeMap`] - disjoint interval indexing
//! - [`VirtualMemoryMapping`] - one mapping plus its frame interner
//! - [`MappingTracker`] - the composed per-trace tracker
//! - [`JitDelegate`] - frame-interning hook for jitted code regions

pub mod address_range;
pub mod mapping;
pub mod tracker;

pub use address_range::{AddressRange, AddressRangeMap};
pub use mapping::{
    BuildId, CreateMappingParams, FrameInterner, MappingKind, UniquePid, VirtualMemoryMapping,
};
pub use tracker::{JitDelegate, MappingTracker};
