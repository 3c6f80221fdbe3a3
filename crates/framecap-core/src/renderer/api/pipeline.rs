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

//! Pipeline layout and render pipeline descriptors.

use crate::renderer::api::command::BindGroupLayoutId;
use crate::renderer::api::enums::{PrimitiveTopology, SampleCount, TextureFormat};
use crate::renderer::api::flags::ColorWrites;
use crate::renderer::api::shader::ShaderModuleId;
use std::borrow::Cow;

/// Id of a pipeline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineLayoutId(pub usize);

/// Describes the bind group layouts a pipeline expects, in group order.
#[derive(Debug, Clone)]
pub struct PipelineLayoutDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Bind group layouts; index `i` is `@group(i)` in the shader.
    pub bind_group_layouts: &'a [BindGroupLayoutId],
}

/// How a pipeline writes to one color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorTargetStateDescriptor {
    /// Format of the attachment this pipeline renders into.
    pub format: TextureFormat,
    /// Channels written by the pipeline. Blending is always disabled.
    pub write_mask: ColorWrites,
}

/// Multisampling of a pipeline's color targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MultisampleStateDescriptor {
    /// Samples per pixel; must match the attachments.
    pub count: SampleCount,
}

/// Parameters of [`GraphicsDevice::create_render_pipeline`](crate::renderer::GraphicsDevice::create_render_pipeline).
///
/// Pipelines here never consume vertex buffers: vertices are generated in the
/// vertex shader from the vertex index.
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Module holding the vertex stage.
    pub vertex_shader_module: ShaderModuleId,
    /// Vertex entry point, e.g. `vs_main`.
    pub vertex_entry_point: Cow<'a, str>,
    /// Module holding the fragment stage. `None` disables rasterized output.
    pub fragment_shader_module: Option<ShaderModuleId>,
    /// Fragment entry point; required when a fragment module is set.
    pub fragment_entry_point: Option<Cow<'a, str>>,
    /// The pipeline layout. `None` lets the backend derive one.
    pub layout: Option<PipelineLayoutId>,
    /// Primitive assembly mode.
    pub primitive_topology: PrimitiveTopology,
    /// One entry per color attachment of the passes using this pipeline.
    pub color_target_states: Cow<'a, [ColorTargetStateDescriptor]>,
    /// Multisampling.
    pub multisample_state: MultisampleStateDescriptor,
}

/// Id of a render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderPipelineId(pub usize);
