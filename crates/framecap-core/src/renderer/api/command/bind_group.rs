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

//! Bind group layouts and bind groups.
//!
//! A layout fixes the binding slots a shader expects; a group fills those
//! slots with concrete buffers, views and samplers.

use crate::renderer::api::buffer::BufferId;
use crate::renderer::api::flags::ShaderStageFlags;
use crate::renderer::api::texture::{SamplerId, TextureViewDimension, TextureViewId};

/// Id of a bind group layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindGroupLayoutId(pub usize);

/// Id of a bind group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindGroupId(pub usize);

/// What sampling a texture binding returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSampleType {
    /// Normalized or float texels.
    Float {
        /// `true` when a filtering sampler may be used.
        filterable: bool,
    },
    /// Unsigned integer texels.
    Uint,
}

/// Sampler slot kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerBindingType {
    /// Allows linear filtering.
    Filtering,
    /// Nearest only.
    NonFiltering,
}

/// Resource kind expected at a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingType {
    /// Uniform buffer.
    UniformBuffer {
        /// Smallest buffer range accepted, if checked up front.
        min_binding_size: Option<std::num::NonZeroU64>,
    },
    /// Sampled texture.
    Texture {
        /// Texel type.
        sample_type: TextureSampleType,
        /// View shape.
        view_dimension: TextureViewDimension,
    },
    /// Sampler.
    Sampler(SamplerBindingType),
}

/// One slot of a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindGroupLayoutEntry {
    /// `@binding(n)` index in WGSL.
    pub binding: u32,
    /// Stages that read the slot.
    pub visibility: ShaderStageFlags,
    /// Expected resource kind.
    pub ty: BindingType,
}

/// Parameters of [`GraphicsDevice::create_bind_group_layout`](crate::renderer::GraphicsDevice::create_bind_group_layout).
#[derive(Debug, Clone)]
pub struct BindGroupLayoutDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// Slots, in any order.
    pub entries: &'a [BindGroupLayoutEntry],
}

/// A byte range of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferBinding {
    /// Buffer id.
    pub buffer: BufferId,
    /// Start of the range.
    pub offset: u64,
    /// Length of the range; `None` runs to the end.
    pub size: Option<std::num::NonZeroU64>,
}

/// The resource placed in one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingResource {
    /// A buffer range.
    Buffer(BufferBinding),
    /// A texture view.
    TextureView(TextureViewId),
    /// A sampler.
    Sampler(SamplerId),
}

/// One filled slot of a bind group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindGroupEntry {
    /// Slot index.
    pub binding: u32,
    /// What fills it.
    pub resource: BindingResource,
}

/// Parameters of [`GraphicsDevice::create_bind_group`](crate::renderer::GraphicsDevice::create_bind_group).
#[derive(Debug, Clone)]
pub struct BindGroupDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// Layout the entries must match.
    pub layout: BindGroupLayoutId,
    /// One entry per layout slot.
    pub entries: &'a [BindGroupEntry],
}
