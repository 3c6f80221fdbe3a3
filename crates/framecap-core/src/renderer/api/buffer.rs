// Copyright 2025 eraflo
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

//! Buffers: usage flags, descriptor and handle.

use crate::framecap_bitflags;
use std::borrow::Cow;

framecap_bitflags! {
    /// What a buffer may be used for. Bit values match wgpu's.
    pub struct BufferUsage: u32 {
        /// CPU-readable through mapping.
        const MAP_READ = 1 << 0;
        /// Copy source.
        const COPY_SRC = 1 << 2;
        /// Copy destination; required by `write_buffer`.
        const COPY_DST = 1 << 3;
        /// Uniform binding.
        const UNIFORM = 1 << 6;
    }
}

/// Parameters of [`GraphicsDevice::create_buffer`](crate::renderer::GraphicsDevice::create_buffer).
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// Debug label.
    pub label: Option<Cow<'a, str>>,
    /// Size in bytes.
    pub size: u64,
    /// Allowed uses.
    pub usage: BufferUsage,
    /// Create the buffer already mapped.
    pub mapped_at_creation: bool,
}

/// Id of a buffer owned by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);
