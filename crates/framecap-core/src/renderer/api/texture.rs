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

//! Textures, texture views and samplers.

use crate::framecap_bitflags;
use crate::math::Extent3D;
use crate::renderer::api::enums::{SampleCount, TextureFormat};
use std::borrow::Cow;

/// Texture shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// A row of texels.
    D1,
    /// An image; the only shape the capture path uses.
    D2,
    /// A volume.
    D3,
}

/// How a view interprets its texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureViewDimension {
    /// A single 2D layer.
    D2,
    /// Several 2D layers.
    D2Array,
}

/// Sampler behaviour for coordinates outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// Tile: `1.1` samples `0.1`.
    Repeat,
    /// Clamp: `1.1` samples the edge texel.
    ClampToEdge,
    /// Tile with every other repetition flipped.
    MirrorRepeat,
}

/// Texel filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest texel.
    Nearest,
    /// Bilinear blend of the four nearest texels.
    Linear,
}

framecap_bitflags! {
    /// What a texture may be used for. Bit values match wgpu's.
    pub struct TextureUsage: u32 {
        /// Copy source, including readback.
        const COPY_SRC = 1 << 0;
        /// Copy destination, including `write_texture` uploads.
        const COPY_DST = 1 << 1;
        /// Sampled from shaders.
        const TEXTURE_BINDING = 1 << 2;
        /// Rendered into as a color attachment.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

/// Parameters of [`GraphicsDevice::create_texture`](crate::renderer::GraphicsDevice::create_texture).
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// Debug label.
    pub label: Option<Cow<'a, str>>,
    /// Width, height and depth or layer count.
    pub size: Extent3D,
    /// Mip levels; 1 for render targets.
    pub mip_level_count: u32,
    /// Samples per texel.
    pub sample_count: SampleCount,
    /// Shape.
    pub dimension: TextureDimension,
    /// Texel format.
    pub format: TextureFormat,
    /// Allowed uses.
    pub usage: TextureUsage,
}

impl<'a> TextureDescriptor<'a> {
    /// A single-mip, single-sample 2D texture.
    pub fn new_2d(
        label: impl Into<Cow<'a, str>>,
        size: Extent3D,
        format: TextureFormat,
        usage: TextureUsage,
    ) -> Self {
        Self {
            label: Some(label.into()),
            size,
            mip_level_count: 1,
            sample_count: SampleCount::X1,
            dimension: TextureDimension::D2,
            format,
            usage,
        }
    }
}

/// Parameters of [`GraphicsDevice::create_texture_view`](crate::renderer::GraphicsDevice::create_texture_view).
///
/// The default describes a view of the whole texture in its own format.
#[derive(Debug, Clone, Default)]
pub struct TextureViewDescriptor<'a> {
    /// Debug label.
    pub label: Option<Cow<'a, str>>,
    /// Reinterpreted format; `None` keeps the texture's.
    pub format: Option<TextureFormat>,
    /// View shape; `None` follows the texture.
    pub dimension: Option<TextureViewDimension>,
    /// First visible mip.
    pub base_mip_level: u32,
    /// Visible mip count; `None` means all remaining.
    pub mip_level_count: Option<u32>,
}

/// Parameters of [`GraphicsDevice::create_sampler`](crate::renderer::GraphicsDevice::create_sampler).
#[derive(Debug, Clone)]
pub struct SamplerDescriptor<'a> {
    /// Debug label.
    pub label: Option<Cow<'a, str>>,
    /// Horizontal wrapping.
    pub address_mode_u: AddressMode,
    /// Vertical wrapping.
    pub address_mode_v: AddressMode,
    /// Depth wrapping.
    pub address_mode_w: AddressMode,
    /// Filter when upscaling.
    pub mag_filter: FilterMode,
    /// Filter when downscaling.
    pub min_filter: FilterMode,
    /// Filter across mips.
    pub mipmap_filter: FilterMode,
    /// Lowest mip the sampler may pick.
    pub lod_min_clamp: f32,
    /// Highest mip the sampler may pick.
    pub lod_max_clamp: f32,
}

/// Id of a texture owned by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Id of a texture view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureViewId(pub usize);

/// Id of a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerId(pub usize);
