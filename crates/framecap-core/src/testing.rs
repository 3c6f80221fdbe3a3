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

//! An in-memory [`GraphicsDevice`] that records what it is asked to do.
//!
//! It validates ids and usages the way a real backend would, keeps every
//! object it creates in maps that tests can inspect, and logs the commands
//! recorded into its encoders. No GPU is involved.

use crate::math::{Extent3D, LinearRgba, Origin3D};
use crate::renderer::api::*;
use crate::renderer::error::{PipelineError, ResourceError, ShaderError};
use crate::renderer::traits::{CommandEncoder, GraphicsDevice, RenderPass};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard};

/// A command captured by a [`RecordingDevice`] encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    /// A render pass was opened.
    BeginRenderPass {
        /// The pass label.
        label: Option<String>,
        /// Color attachment views, in order.
        color_views: Vec<TextureViewId>,
        /// Load operation of each color attachment.
        loads: Vec<LoadOp<LinearRgba>>,
        /// Store operation of each color attachment.
        stores: Vec<StoreOp>,
    },
    /// The viewport was set.
    SetViewport(Viewport),
    /// A pipeline was bound.
    SetPipeline(RenderPipelineId),
    /// A bind group was bound.
    SetBindGroup {
        /// Group index.
        index: u32,
        /// The bound group.
        bind_group: BindGroupId,
    },
    /// A draw call.
    Draw {
        /// Vertex range.
        vertices: Range<u32>,
        /// Instance range.
        instances: Range<u32>,
    },
    /// The render pass was closed.
    EndRenderPass,
    /// A texture-to-texture copy.
    CopyTextureToTexture {
        /// Copy source.
        source: TextureId,
        /// Copy destination.
        destination: TextureId,
        /// Copied extent.
        size: Extent3D,
    },
}

/// The parameters a texture was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRecord {
    /// Texture size.
    pub size: Extent3D,
    /// Texel format.
    pub format: TextureFormat,
    /// Declared usages.
    pub usage: TextureUsage,
}

/// The filtering state a sampler was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerRecord {
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// U address mode.
    pub address_mode_u: AddressMode,
    /// V address mode.
    pub address_mode_v: AddressMode,
}

#[derive(Debug, Default)]
struct RecordingState {
    next_id: usize,
    next_command_buffer: u64,
    textures: HashMap<TextureId, TextureRecord>,
    texture_views: HashMap<TextureViewId, TextureId>,
    samplers: HashMap<SamplerId, SamplerRecord>,
    buffers: HashMap<BufferId, u64>,
    shader_modules: HashSet<ShaderModuleId>,
    bind_group_layouts: HashSet<BindGroupLayoutId>,
    bind_groups: HashMap<BindGroupId, Vec<BindGroupEntry>>,
    pipeline_layouts: HashSet<PipelineLayoutId>,
    pipelines: HashMap<RenderPipelineId, Vec<TextureFormat>>,
    created_textures: usize,
    created_bind_groups: usize,
    created_pipelines: usize,
    buffer_writes: Vec<(BufferId, u64, Vec<u8>)>,
    commands: Vec<RecordedCommand>,
    finished: HashSet<CommandBufferId>,
    submitted: Vec<CommandBufferId>,
    fail_texture_creation: bool,
}

impl RecordingState {
    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }
}

/// A [`GraphicsDevice`] test double. Cloning shares the recorded state.
#[derive(Debug, Clone, Default)]
pub struct RecordingDevice {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingDevice {
    /// Creates an empty device.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RecordingState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes every subsequent `create_texture` call fail.
    pub fn set_fail_texture_creation(&self, fail: bool) {
        self.state().fail_texture_creation = fail;
    }

    /// Number of textures currently alive.
    pub fn live_texture_count(&self) -> usize {
        self.state().textures.len()
    }

    /// Number of texture views currently alive.
    pub fn live_texture_view_count(&self) -> usize {
        self.state().texture_views.len()
    }

    /// Number of textures ever created.
    pub fn created_texture_count(&self) -> usize {
        self.state().created_textures
    }

    /// Number of bind groups currently alive.
    pub fn live_bind_group_count(&self) -> usize {
        self.state().bind_groups.len()
    }

    /// Number of bind groups ever created.
    pub fn created_bind_group_count(&self) -> usize {
        self.state().created_bind_groups
    }

    /// Number of render pipelines currently alive.
    pub fn live_pipeline_count(&self) -> usize {
        self.state().pipelines.len()
    }

    /// Number of render pipelines ever created.
    pub fn created_pipeline_count(&self) -> usize {
        self.state().created_pipelines
    }

    /// Total number of live objects of every kind.
    pub fn live_object_count(&self) -> usize {
        let state = self.state();
        state.textures.len()
            + state.texture_views.len()
            + state.samplers.len()
            + state.buffers.len()
            + state.shader_modules.len()
            + state.bind_group_layouts.len()
            + state.bind_groups.len()
            + state.pipeline_layouts.len()
            + state.pipelines.len()
    }

    /// The format a live texture was created with.
    pub fn texture_format(&self, id: TextureId) -> Option<TextureFormat> {
        self.state().textures.get(&id).map(|t| t.format)
    }

    /// The full creation record of a live texture.
    pub fn texture(&self, id: TextureId) -> Option<TextureRecord> {
        self.state().textures.get(&id).copied()
    }

    /// The texture a live view points at.
    pub fn texture_of_view(&self, view: TextureViewId) -> Option<TextureId> {
        self.state().texture_views.get(&view).copied()
    }

    /// Filtering state of every live sampler.
    pub fn samplers(&self) -> Vec<SamplerRecord> {
        self.state().samplers.values().copied().collect()
    }

    /// Color target formats of a live pipeline.
    pub fn pipeline_formats(&self, id: RenderPipelineId) -> Option<Vec<TextureFormat>> {
        self.state().pipelines.get(&id).cloned()
    }

    /// Entries of a live bind group.
    pub fn bind_group_entries(&self, id: BindGroupId) -> Option<Vec<BindGroupEntry>> {
        self.state().bind_groups.get(&id).cloned()
    }

    /// Every `write_buffer` call, in order.
    pub fn buffer_writes(&self) -> Vec<(BufferId, u64, Vec<u8>)> {
        self.state().buffer_writes.clone()
    }

    /// Every command recorded by any encoder, in order.
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.state().commands.clone()
    }

    /// Forgets recorded commands and buffer writes.
    pub fn clear_commands(&self) {
        let mut state = self.state();
        state.commands.clear();
        state.buffer_writes.clear();
    }

    /// Number of command buffers submitted.
    pub fn submitted_count(&self) -> usize {
        self.state().submitted.len()
    }
}

fn label_of<'a>(label: &'a Option<std::borrow::Cow<'_, str>>) -> &'a str {
    label.as_deref().unwrap_or_default()
}

impl GraphicsDevice for RecordingDevice {
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        let ShaderSourceData::Wgsl(source) = &descriptor.source;
        if source.trim().is_empty() {
            return Err(ShaderError::CompilationError {
                label: descriptor.label.unwrap_or_default().to_string(),
                details: "empty source".to_string(),
            }
            .into());
        }
        let mut state = self.state();
        let id = ShaderModuleId(state.next_id());
        state.shader_modules.insert(id);
        Ok(id)
    }

    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError> {
        if self.state().shader_modules.remove(&id) {
            Ok(())
        } else {
            Err(ShaderError::NotFound { id }.into())
        }
    }

    fn create_bind_group_layout(
        &self,
        _descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        let mut state = self.state();
        let id = BindGroupLayoutId(state.next_id());
        state.bind_group_layouts.insert(id);
        Ok(id)
    }

    fn destroy_bind_group_layout(&self, id: BindGroupLayoutId) -> Result<(), ResourceError> {
        if self.state().bind_group_layouts.remove(&id) {
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn create_bind_group(
        &self,
        descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError> {
        let mut state = self.state();
        if !state.bind_group_layouts.contains(&descriptor.layout) {
            return Err(ResourceError::NotFound);
        }
        for entry in descriptor.entries {
            let known = match entry.resource {
                BindingResource::Buffer(binding) => state.buffers.contains_key(&binding.buffer),
                BindingResource::TextureView(view) => state.texture_views.contains_key(&view),
                BindingResource::Sampler(sampler) => state.samplers.contains_key(&sampler),
            };
            if !known {
                return Err(ResourceError::NotFound);
            }
        }
        let id = BindGroupId(state.next_id());
        state.bind_groups.insert(id, descriptor.entries.to_vec());
        state.created_bind_groups += 1;
        Ok(id)
    }

    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError> {
        match self.state().bind_groups.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ResourceError::NotFound),
        }
    }

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        let mut state = self.state();
        if let Some(missing) = descriptor
            .bind_group_layouts
            .iter()
            .find(|l| !state.bind_group_layouts.contains(l))
        {
            return Err(PipelineError::LayoutCreationFailed(format!(
                "unknown bind group layout {missing:?}"
            ))
            .into());
        }
        let id = PipelineLayoutId(state.next_id());
        state.pipeline_layouts.insert(id);
        Ok(id)
    }

    fn destroy_pipeline_layout(&self, id: PipelineLayoutId) -> Result<(), ResourceError> {
        if self.state().pipeline_layouts.remove(&id) {
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        let mut state = self.state();
        let label = descriptor.label.as_deref().map(String::from);
        let modules = std::iter::once(descriptor.vertex_shader_module)
            .chain(descriptor.fragment_shader_module);
        for module in modules {
            if !state.shader_modules.contains(&module) {
                return Err(PipelineError::InvalidShaderModuleForPipeline {
                    id: module,
                    pipeline_label: label,
                }
                .into());
            }
        }
        if let (Some(shader_id), None) = (
            descriptor.fragment_shader_module,
            &descriptor.fragment_entry_point,
        ) {
            return Err(PipelineError::MissingEntryPointForFragmentShader {
                pipeline_label: label,
                shader_id,
            }
            .into());
        }
        if let Some(layout) = descriptor.layout {
            if !state.pipeline_layouts.contains(&layout) {
                return Err(ResourceError::NotFound);
            }
        }
        let id = RenderPipelineId(state.next_id());
        let formats = descriptor
            .color_target_states
            .iter()
            .map(|t| t.format)
            .collect();
        state.pipelines.insert(id, formats);
        state.created_pipelines += 1;
        Ok(id)
    }

    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError> {
        match self.state().pipelines.remove(&id) {
            Some(_) => Ok(()),
            None => Err(PipelineError::InvalidRenderPipeline { id }.into()),
        }
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let mut state = self.state();
        let id = BufferId(state.next_id());
        state.buffers.insert(id, descriptor.size);
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        match self.state().buffers.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ResourceError::NotFound),
        }
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut state = self.state();
        let size = *state.buffers.get(&id).ok_or(ResourceError::NotFound)?;
        if offset + data.len() as u64 > size {
            return Err(ResourceError::OutOfBounds);
        }
        state.buffer_writes.push((id, offset, data.to_vec()));
        Ok(())
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let mut state = self.state();
        if state.fail_texture_creation {
            return Err(ResourceError::BackendError(format!(
                "texture creation disabled ('{}')",
                label_of(&descriptor.label)
            )));
        }
        let id = TextureId(state.next_id());
        state.textures.insert(
            id,
            TextureRecord {
                size: descriptor.size,
                format: descriptor.format,
                usage: descriptor.usage,
            },
        );
        state.created_textures += 1;
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        match self.state().textures.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ResourceError::NotFound),
        }
    }

    fn write_texture(
        &self,
        texture_id: TextureId,
        data: &[u8],
        _bytes_per_row: Option<u32>,
        _offset: Origin3D,
        size: Extent3D,
    ) -> Result<(), ResourceError> {
        let state = self.state();
        let texture = state
            .textures
            .get(&texture_id)
            .ok_or(ResourceError::NotFound)?;
        let expected = size.width as u64
            * size.height as u64
            * size.depth_or_array_layers as u64
            * texture.format.bytes_per_pixel() as u64;
        if (data.len() as u64) < expected {
            return Err(ResourceError::OutOfBounds);
        }
        Ok(())
    }

    fn create_texture_view(
        &self,
        texture_id: TextureId,
        _descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        let mut state = self.state();
        if !state.textures.contains_key(&texture_id) {
            return Err(ResourceError::NotFound);
        }
        let id = TextureViewId(state.next_id());
        state.texture_views.insert(id, texture_id);
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        match self.state().texture_views.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ResourceError::NotFound),
        }
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let mut state = self.state();
        let id = SamplerId(state.next_id());
        state.samplers.insert(
            id,
            SamplerRecord {
                mag_filter: descriptor.mag_filter,
                min_filter: descriptor.min_filter,
                address_mode_u: descriptor.address_mode_u,
                address_mode_v: descriptor.address_mode_v,
            },
        );
        Ok(id)
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        match self.state().samplers.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ResourceError::NotFound),
        }
    }

    fn create_command_encoder(&self, _label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(RecordingEncoder {
            device: self.clone(),
        })
    }

    fn submit_command_buffer(&self, command_buffer: CommandBufferId) {
        let mut state = self.state();
        if state.finished.remove(&command_buffer) {
            state.submitted.push(command_buffer);
        } else {
            log::error!("RecordingDevice: unknown command buffer {command_buffer:?}");
        }
    }

    fn get_adapter_info(&self) -> RendererAdapterInfo {
        RendererAdapterInfo {
            name: "RecordingDevice".to_string(),
            backend_type: GraphicsBackendType::Unknown,
            device_type: RendererDeviceType::Cpu,
        }
    }
}

/// The encoder handed out by [`RecordingDevice`].
struct RecordingEncoder {
    device: RecordingDevice,
}

impl RecordingEncoder {
    fn record(&self, command: RecordedCommand) {
        self.device.state().commands.push(command);
    }
}

impl CommandEncoder for RecordingEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'encoder>,
    ) -> Result<Box<dyn RenderPass<'encoder> + 'encoder>, ResourceError> {
        {
            let state = self.device.state();
            for attachment in descriptor.color_attachments {
                let texture = state
                    .texture_views
                    .get(attachment.view)
                    .and_then(|t| state.textures.get(t))
                    .ok_or(ResourceError::NotFound)?;
                if !texture.usage.contains(TextureUsage::RENDER_ATTACHMENT) {
                    return Err(ResourceError::InvalidDescriptor(
                        "color attachment lacks RENDER_ATTACHMENT usage".into(),
                    ));
                }
            }
        }
        self.record(RecordedCommand::BeginRenderPass {
            label: descriptor.label.map(String::from),
            color_views: descriptor.color_attachments.iter().map(|a| *a.view).collect(),
            loads: descriptor
                .color_attachments
                .iter()
                .map(|a| a.ops.load.clone())
                .collect(),
            stores: descriptor
                .color_attachments
                .iter()
                .map(|a| a.ops.store)
                .collect(),
        });
        Ok(Box::new(RecordingRenderPass {
            device: self.device.clone(),
            _encoder: PhantomData,
        }))
    }

    fn copy_texture_to_texture(
        &mut self,
        source: &TextureId,
        destination: &TextureId,
        size: Extent3D,
    ) -> Result<(), ResourceError> {
        {
            let state = self.device.state();
            let src = state.textures.get(source).ok_or(ResourceError::NotFound)?;
            let dst = state
                .textures
                .get(destination)
                .ok_or(ResourceError::NotFound)?;
            if !src.usage.contains(TextureUsage::COPY_SRC)
                || !dst.usage.contains(TextureUsage::COPY_DST)
            {
                return Err(ResourceError::InvalidDescriptor(
                    "copy requires COPY_SRC on the source and COPY_DST on the destination".into(),
                ));
            }
            if src.format != dst.format {
                return Err(ResourceError::InvalidDescriptor(format!(
                    "copy between {:?} and {:?}",
                    src.format, dst.format
                )));
            }
            let fits = |t: &TextureRecord| t.size.width >= size.width && t.size.height >= size.height;
            if !fits(src) || !fits(dst) {
                return Err(ResourceError::OutOfBounds);
            }
        }
        self.record(RecordedCommand::CopyTextureToTexture {
            source: *source,
            destination: *destination,
            size,
        });
        Ok(())
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        let mut state = self.device.state();
        state.next_command_buffer += 1;
        let id = CommandBufferId(state.next_command_buffer);
        state.finished.insert(id);
        id
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct RecordingRenderPass<'a> {
    device: RecordingDevice,
    _encoder: PhantomData<&'a mut ()>,
}

impl RecordingRenderPass<'_> {
    fn record(&self, command: RecordedCommand) {
        self.device.state().commands.push(command);
    }
}

impl<'pass> RenderPass<'pass> for RecordingRenderPass<'pass> {
    fn set_viewport(&mut self, viewport: &Viewport) {
        self.record(RecordedCommand::SetViewport(*viewport));
    }

    fn set_pipeline(&mut self, pipeline: &'pass RenderPipelineId) {
        self.record(RecordedCommand::SetPipeline(*pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &'pass BindGroupId) {
        self.record(RecordedCommand::SetBindGroup {
            index,
            bind_group: *bind_group,
        });
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.record(RecordedCommand::Draw {
            vertices,
            instances,
        });
    }
}

impl Drop for RecordingRenderPass<'_> {
    fn drop(&mut self) {
        self.record(RecordedCommand::EndRenderPass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Extent2D;

    fn small_texture(label: &str) -> TextureDescriptor<'_> {
        TextureDescriptor::new_2d(
            label,
            Extent2D::new(4, 4).into(),
            TextureFormat::Rgba8Unorm,
            TextureUsage::COPY_DST,
        )
    }

    #[test]
    fn test_forced_texture_failure_names_the_texture() {
        let device = RecordingDevice::new();
        device.set_fail_texture_creation(true);

        let err = device.create_texture(&small_texture("scratch")).unwrap_err();
        assert!(err.to_string().contains("'scratch'"), "{err}");
        assert_eq!(device.live_object_count(), 0);
    }

    #[test]
    fn test_created_texture_is_tracked_until_destroyed() {
        let device = RecordingDevice::new();
        let texture = device.create_texture(&small_texture("scratch")).unwrap();
        assert_eq!(device.live_object_count(), 1);

        device.destroy_texture(texture).unwrap();
        assert_eq!(device.live_object_count(), 0);
        assert!(device.destroy_texture(texture).is_err());
    }
}
