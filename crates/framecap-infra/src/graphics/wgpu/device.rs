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

use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use framecap_core::math::{Extent3D, Origin3D};
use framecap_core::renderer::api::*;
use framecap_core::renderer::traits::CommandEncoder;
use framecap_core::renderer::{GraphicsDevice, PipelineError, ResourceError, ShaderError};

use super::command::WgpuCommandEncoder;
use super::context::WgpuGraphicsContext;
use super::conversions::{from_wgpu_backend, from_wgpu_device_type, IntoWgpu};

#[derive(Debug)]
pub(crate) struct WgpuBufferEntry {
    pub(crate) wgpu_buffer: Arc<wgpu::Buffer>,
    pub(crate) size: u64,
}

#[derive(Debug)]
pub(crate) struct WgpuTextureEntry {
    pub(crate) wgpu_texture: Arc<wgpu::Texture>,
    pub(crate) format: TextureFormat,
    pub(crate) size: Extent3D,
}

/// The internal, non-clonable state of the WgpuDevice.
#[derive(Debug)]
struct WgpuDeviceInternal {
    context: WgpuGraphicsContext,
    shader_modules: Mutex<HashMap<ShaderModuleId, Arc<wgpu::ShaderModule>>>,
    bind_group_layouts: Mutex<HashMap<BindGroupLayoutId, Arc<wgpu::BindGroupLayout>>>,
    bind_groups: Mutex<HashMap<BindGroupId, Arc<wgpu::BindGroup>>>,
    pipeline_layouts: Mutex<HashMap<PipelineLayoutId, Arc<wgpu::PipelineLayout>>>,
    pipelines: Mutex<HashMap<RenderPipelineId, Arc<wgpu::RenderPipeline>>>,
    buffers: Mutex<HashMap<BufferId, WgpuBufferEntry>>,
    textures: Mutex<HashMap<TextureId, WgpuTextureEntry>>,
    texture_views: Mutex<HashMap<TextureViewId, Arc<wgpu::TextureView>>>,
    samplers: Mutex<HashMap<SamplerId, Arc<wgpu::Sampler>>>,

    /// One counter for every resource kind; ids never repeat across kinds.
    next_resource_id: AtomicUsize,

    /// Command buffers that have been finished but not yet submitted.
    pending_command_buffers: Mutex<HashMap<CommandBufferId, wgpu::CommandBuffer>>,
    command_buffer_id_counter: AtomicU64,
}

/// A clonable, thread-safe handle to a headless wgpu device.
///
/// Resources are kept in id-keyed maps; destroying an id drops the device's
/// reference, and wgpu frees the object once no recorded work uses it.
#[derive(Clone, Debug)]
pub struct WgpuDevice {
    internal: Arc<WgpuDeviceInternal>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, ResourceError> {
    mutex
        .lock()
        .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned ({what}): {e}")))
}

fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn get_arc<K: Eq + Hash, V>(map: &Mutex<HashMap<K, Arc<V>>>, id: &K) -> Option<Arc<V>> {
    lock_recover(map).get(id).cloned()
}

fn remove_entry<K: Eq + Hash, V>(
    map: &Mutex<HashMap<K, V>>,
    what: &str,
    id: &K,
) -> Result<V, ResourceError> {
    lock(map, what)?.remove(id).ok_or(ResourceError::NotFound)
}

/// Resources a bind group entry points at, resolved before the wgpu call.
enum ResolvedBinding {
    Buffer(Arc<wgpu::Buffer>, u64, Option<NonZeroU64>),
    TextureView(Arc<wgpu::TextureView>),
    Sampler(Arc<wgpu::Sampler>),
}

impl WgpuDevice {
    pub fn new(context: WgpuGraphicsContext) -> Self {
        Self {
            internal: Arc::new(WgpuDeviceInternal {
                context,
                shader_modules: Mutex::new(HashMap::new()),
                bind_group_layouts: Mutex::new(HashMap::new()),
                bind_groups: Mutex::new(HashMap::new()),
                pipeline_layouts: Mutex::new(HashMap::new()),
                pipelines: Mutex::new(HashMap::new()),
                buffers: Mutex::new(HashMap::new()),
                textures: Mutex::new(HashMap::new()),
                texture_views: Mutex::new(HashMap::new()),
                samplers: Mutex::new(HashMap::new()),
                next_resource_id: AtomicUsize::new(0),
                pending_command_buffers: Mutex::new(HashMap::new()),
                command_buffer_id_counter: AtomicU64::new(0),
            }),
        }
    }

    /// Opens a headless device on the default adapter.
    pub fn new_headless() -> anyhow::Result<Self> {
        Ok(Self::new(WgpuGraphicsContext::new_headless_blocking()?))
    }

    pub fn context(&self) -> &WgpuGraphicsContext {
        &self.internal.context
    }

    fn next_id(&self) -> usize {
        self.internal.next_resource_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn get_wgpu_render_pipeline(
        &self,
        id: RenderPipelineId,
    ) -> Option<Arc<wgpu::RenderPipeline>> {
        get_arc(&self.internal.pipelines, &id)
    }

    pub(crate) fn get_wgpu_bind_group(&self, id: BindGroupId) -> Option<Arc<wgpu::BindGroup>> {
        get_arc(&self.internal.bind_groups, &id)
    }

    pub(crate) fn get_wgpu_texture_view(
        &self,
        id: &TextureViewId,
    ) -> Option<Arc<wgpu::TextureView>> {
        get_arc(&self.internal.texture_views, id)
    }

    pub(crate) fn get_wgpu_texture(&self, id: &TextureId) -> Option<Arc<wgpu::Texture>> {
        lock_recover(&self.internal.textures)
            .get(id)
            .map(|entry| Arc::clone(&entry.wgpu_texture))
    }

    /// Registers a finished wgpu::CommandBuffer and returns an abstract ID for it.
    pub(crate) fn register_command_buffer(&self, buffer: wgpu::CommandBuffer) -> CommandBufferId {
        let id = CommandBufferId(
            self.internal
                .command_buffer_id_counter
                .fetch_add(1, Ordering::SeqCst),
        );
        lock_recover(&self.internal.pending_command_buffers).insert(id, buffer);
        id
    }

    /// Blocks until all submitted work has completed.
    pub fn wait_idle(&self) -> Result<(), ResourceError> {
        self.internal
            .context
            .device
            .poll(wgpu::PollType::Wait)
            .map(|_| ())
            .map_err(|e| ResourceError::BackendError(format!("Device poll failed: {e}")))
    }

    /// Copies the first mip level of a texture back to the CPU.
    ///
    /// Rows are returned tightly packed, in the texture's own texel layout.
    /// Blocks until the GPU has finished all work submitted so far.
    pub fn read_texture(&self, id: TextureId) -> Result<Vec<u8>, ResourceError> {
        let (texture, format, size) = {
            let textures = lock(&self.internal.textures, "textures")?;
            let entry = textures.get(&id).ok_or(ResourceError::NotFound)?;
            (Arc::clone(&entry.wgpu_texture), entry.format, entry.size)
        };

        let unpadded_bytes_per_row = size.width * format.bytes_per_pixel();
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let device = &self.internal.context.device;
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Texture Readback Buffer"),
            size: padded_bytes_per_row as u64 * size.height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Texture Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(size.height),
                },
            },
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
        );
        self.internal
            .context
            .queue
            .submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = flume::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver only disappears if the caller already failed.
            let _ = sender.send(result);
        });
        self.wait_idle()?;

        receiver
            .recv()
            .map_err(|e| ResourceError::BackendError(format!("Readback channel closed: {e}")))?
            .map_err(|e| ResourceError::BackendError(format!("Buffer mapping failed: {e}")))?;

        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * size.height) as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks(padded_bytes_per_row as usize) {
                pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
            }
        }
        staging.unmap();

        log::debug!(
            "WgpuDevice: Read back {} bytes from texture ID: {:?}",
            pixels.len(),
            id
        );
        Ok(pixels)
    }
}

impl GraphicsDevice for WgpuDevice {
    // --- Shader Module Operations ---

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        let wgpu_source = match &descriptor.source {
            ShaderSourceData::Wgsl(cow_str) => wgpu::ShaderSource::Wgsl(cow_str.clone()),
        };
        let label = descriptor.label;

        let device = &self.internal.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label,
            source: wgpu_source,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::CompilationError {
                label: label.unwrap_or_default().to_string(),
                details: error.to_string(),
            }
            .into());
        }

        let id = ShaderModuleId(self.next_id());
        lock(&self.internal.shader_modules, "shader_modules")?.insert(id, Arc::new(module));

        log::info!(
            "WgpuDevice: Successfully created shader module '{:?}' with ID: {:?}",
            label.unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError> {
        match remove_entry(&self.internal.shader_modules, "shader_modules", &id) {
            Ok(_) => {
                log::debug!("WgpuDevice: Destroyed shader module with ID: {id:?}");
                Ok(())
            }
            Err(ResourceError::NotFound) => Err(ShaderError::NotFound { id }.into()),
            Err(e) => Err(e),
        }
    }

    // --- Bind Group Operations ---

    fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = descriptor
            .entries
            .iter()
            .map(|entry| wgpu::BindGroupLayoutEntry {
                binding: entry.binding,
                visibility: entry.visibility.into_wgpu(),
                ty: entry.ty.clone().into_wgpu(),
                count: None,
            })
            .collect();

        let layout = self.internal.context.device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: descriptor.label,
                entries: &entries,
            },
        );
        let id = BindGroupLayoutId(self.next_id());
        lock(&self.internal.bind_group_layouts, "bind_group_layouts")?.insert(id, Arc::new(layout));

        log::info!(
            "WgpuDevice: Created bind group layout '{:?}' with ID: {:?}",
            descriptor.label.unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_bind_group_layout(&self, id: BindGroupLayoutId) -> Result<(), ResourceError> {
        remove_entry(&self.internal.bind_group_layouts, "bind_group_layouts", &id)?;
        log::debug!("WgpuDevice: Destroyed bind group layout with ID: {id:?}");
        Ok(())
    }

    fn create_bind_group(
        &self,
        descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError> {
        let layout = get_arc(&self.internal.bind_group_layouts, &descriptor.layout)
            .ok_or(ResourceError::NotFound)?;

        let resolved = descriptor
            .entries
            .iter()
            .map(|entry| {
                let resource = match entry.resource {
                    BindingResource::Buffer(binding) => lock(&self.internal.buffers, "buffers")?
                        .get(&binding.buffer)
                        .map(|b| {
                            ResolvedBinding::Buffer(
                                Arc::clone(&b.wgpu_buffer),
                                binding.offset,
                                binding.size,
                            )
                        }),
                    BindingResource::TextureView(view) => {
                        self.get_wgpu_texture_view(&view).map(ResolvedBinding::TextureView)
                    }
                    BindingResource::Sampler(sampler) => {
                        get_arc(&self.internal.samplers, &sampler).map(ResolvedBinding::Sampler)
                    }
                };
                resource
                    .map(|r| (entry.binding, r))
                    .ok_or(ResourceError::NotFound)
            })
            .collect::<Result<Vec<_>, ResourceError>>()?;

        let entries: Vec<wgpu::BindGroupEntry> = resolved
            .iter()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: match resource {
                    ResolvedBinding::Buffer(buffer, offset, size) => {
                        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: buffer.as_ref(),
                            offset: *offset,
                            size: *size,
                        })
                    }
                    ResolvedBinding::TextureView(view) => {
                        wgpu::BindingResource::TextureView(view.as_ref())
                    }
                    ResolvedBinding::Sampler(sampler) => {
                        wgpu::BindingResource::Sampler(sampler.as_ref())
                    }
                },
            })
            .collect();

        let bind_group =
            self.internal
                .context
                .device
                .create_bind_group(&wgpu::BindGroupDescriptor {
                    label: descriptor.label,
                    layout: &layout,
                    entries: &entries,
                });
        let id = BindGroupId(self.next_id());
        lock(&self.internal.bind_groups, "bind_groups")?.insert(id, Arc::new(bind_group));
        log::trace!("WgpuDevice: Created bind group with ID: {id:?}");
        Ok(id)
    }

    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError> {
        remove_entry(&self.internal.bind_groups, "bind_groups", &id)?;
        log::trace!("WgpuDevice: Destroyed bind group with ID: {id:?}");
        Ok(())
    }

    // --- Render Pipeline Operations ---

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        let layouts = {
            let map = lock(&self.internal.bind_group_layouts, "bind_group_layouts")?;
            descriptor
                .bind_group_layouts
                .iter()
                .map(|id| {
                    map.get(id).cloned().ok_or_else(|| {
                        PipelineError::LayoutCreationFailed(format!(
                            "unknown bind group layout {id:?}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, PipelineError>>()?
        };
        let layout_refs: Vec<&wgpu::BindGroupLayout> = layouts.iter().map(|l| l.as_ref()).collect();

        let layout = self.internal.context.device.create_pipeline_layout(
            &wgpu::PipelineLayoutDescriptor {
                label: descriptor.label.as_deref(),
                bind_group_layouts: &layout_refs,
                push_constant_ranges: &[],
            },
        );
        let id = PipelineLayoutId(self.next_id());
        lock(&self.internal.pipeline_layouts, "pipeline_layouts")?.insert(id, Arc::new(layout));
        log::debug!(
            "WgpuDevice: Created pipeline layout '{:?}' with ID: {:?}",
            descriptor.label,
            id
        );
        Ok(id)
    }

    fn destroy_pipeline_layout(&self, id: PipelineLayoutId) -> Result<(), ResourceError> {
        remove_entry(&self.internal.pipeline_layouts, "pipeline_layouts", &id)?;
        log::debug!("WgpuDevice: Destroyed pipeline layout with ID: {id:?}");
        Ok(())
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        log::debug!(
            "WgpuDevice: Creating render pipeline with label: {:?}",
            descriptor.label
        );
        let pipeline_label = || descriptor.label.as_deref().map(String::from);

        let vs_module = get_arc(
            &self.internal.shader_modules,
            &descriptor.vertex_shader_module,
        )
        .ok_or_else(|| PipelineError::InvalidShaderModuleForPipeline {
            id: descriptor.vertex_shader_module,
            pipeline_label: pipeline_label(),
        })?;

        let fragment = match descriptor.fragment_shader_module {
            Some(fs_id) => {
                let module = get_arc(&self.internal.shader_modules, &fs_id).ok_or_else(|| {
                    PipelineError::InvalidShaderModuleForPipeline {
                        id: fs_id,
                        pipeline_label: pipeline_label(),
                    }
                })?;
                let entry_point = descriptor.fragment_entry_point.as_deref().ok_or_else(|| {
                    PipelineError::MissingEntryPointForFragmentShader {
                        pipeline_label: pipeline_label(),
                        shader_id: fs_id,
                    }
                })?;
                Some((module, entry_point))
            }
            None => None,
        };

        let layout = match descriptor.layout {
            Some(layout_id) => Some(
                get_arc(&self.internal.pipeline_layouts, &layout_id)
                    .ok_or(ResourceError::NotFound)?,
            ),
            None => None,
        };

        let targets: Vec<Option<wgpu::ColorTargetState>> = descriptor
            .color_target_states
            .iter()
            .map(|target| {
                Some(wgpu::ColorTargetState {
                    format: target.format.into_wgpu(),
                    blend: None,
                    write_mask: target.write_mask.into_wgpu(),
                })
            })
            .collect();

        let wgpu_descriptor = wgpu::RenderPipelineDescriptor {
            label: descriptor.label.as_deref(),
            layout: layout.as_deref(),
            vertex: wgpu::VertexState {
                module: &vs_module,
                entry_point: Some(&*descriptor.vertex_entry_point),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: fragment
                .as_ref()
                .map(|(module, entry_point)| wgpu::FragmentState {
                    module,
                    entry_point: Some(*entry_point),
                    targets: &targets,
                    compilation_options: Default::default(),
                }),
            primitive: wgpu::PrimitiveState {
                topology: descriptor.primitive_topology.into_wgpu(),
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: descriptor.multisample_state.count.into_wgpu(),
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        };

        let device = &self.internal.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu_descriptor);
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ResourceError::BackendError(format!(
                "Render pipeline {:?} is invalid: {error}",
                descriptor.label
            )));
        }

        let id = RenderPipelineId(self.next_id());
        lock(&self.internal.pipelines, "pipelines")?.insert(id, Arc::new(pipeline));
        log::info!(
            "WgpuDevice: Successfully created render pipeline '{:?}' with ID: {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError> {
        match remove_entry(&self.internal.pipelines, "pipelines", &id) {
            Ok(_) => {
                log::debug!("WgpuDevice: Destroyed render pipeline with ID: {id:?}");
                Ok(())
            }
            Err(ResourceError::NotFound) => Err(PipelineError::InvalidRenderPipeline { id }.into()),
            Err(e) => Err(e),
        }
    }

    // --- Buffer Operations ---

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let buffer = self
            .internal
            .context
            .device
            .create_buffer(&wgpu::BufferDescriptor {
                label: descriptor.label.as_deref(),
                size: descriptor.size,
                usage: descriptor.usage.into_wgpu(),
                mapped_at_creation: descriptor.mapped_at_creation,
            });
        let id = BufferId(self.next_id());
        lock(&self.internal.buffers, "buffers")?.insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: Arc::new(buffer),
                size: descriptor.size,
            },
        );
        log::info!(
            "WgpuDevice: Created buffer '{:?}' with ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            descriptor.size
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        remove_entry(&self.internal.buffers, "buffers", &id)?;
        log::debug!("WgpuDevice: Destroyed buffer with ID: {id:?}");
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let buffers = lock(&self.internal.buffers, "buffers")?;
        let entry = buffers.get(&id).ok_or(ResourceError::NotFound)?;
        if offset + data.len() as u64 > entry.size {
            return Err(ResourceError::OutOfBounds);
        }
        self.internal
            .context
            .queue
            .write_buffer(&entry.wgpu_buffer, offset, data);
        Ok(())
    }

    // --- Texture Operations ---

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let texture = self
            .internal
            .context
            .device
            .create_texture(&wgpu::TextureDescriptor {
                label: descriptor.label.as_deref(),
                size: descriptor.size.into_wgpu(),
                mip_level_count: descriptor.mip_level_count,
                sample_count: descriptor.sample_count.into_wgpu(),
                dimension: descriptor.dimension.into_wgpu(),
                format: descriptor.format.into_wgpu(),
                usage: descriptor.usage.into_wgpu(),
                view_formats: &[],
            });
        let id = TextureId(self.next_id());
        lock(&self.internal.textures, "textures")?.insert(
            id,
            WgpuTextureEntry {
                wgpu_texture: Arc::new(texture),
                format: descriptor.format,
                size: descriptor.size,
            },
        );
        log::info!(
            "WgpuDevice: Created texture '{:?}' with ID: {:?}, {}x{} {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.format
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        remove_entry(&self.internal.textures, "textures", &id)?;
        log::debug!("WgpuDevice: Destroyed texture with ID: {id:?}");
        Ok(())
    }

    fn write_texture(
        &self,
        texture_id: TextureId,
        data: &[u8],
        bytes_per_row: Option<u32>,
        offset: Origin3D,
        size: Extent3D,
    ) -> Result<(), ResourceError> {
        let texture = self
            .get_wgpu_texture(&texture_id)
            .ok_or(ResourceError::NotFound)?;

        self.internal.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: offset.into_wgpu(),
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row,
                rows_per_image: None,
            },
            size.into_wgpu(),
        );
        log::debug!(
            "WgpuDevice: Wrote {} bytes to texture ID: {:?} at offset {:?}",
            data.len(),
            texture_id,
            offset
        );
        Ok(())
    }

    fn create_texture_view(
        &self,
        texture_id: TextureId,
        descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        let texture = self
            .get_wgpu_texture(&texture_id)
            .ok_or(ResourceError::NotFound)?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: descriptor.label.as_deref(),
            format: descriptor.format.map(|f| f.into_wgpu()),
            dimension: descriptor.dimension.map(|d| d.into_wgpu()),
            usage: None,
            aspect: wgpu::TextureAspect::All,
            base_mip_level: descriptor.base_mip_level,
            mip_level_count: descriptor.mip_level_count,
            base_array_layer: 0,
            array_layer_count: None,
        });
        let id = TextureViewId(self.next_id());
        lock(&self.internal.texture_views, "texture_views")?.insert(id, Arc::new(view));
        log::info!(
            "WgpuDevice: Created texture view '{:?}' for texture ID: {:?} with ID: {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            texture_id,
            id
        );
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        remove_entry(&self.internal.texture_views, "texture_views", &id)?;
        log::debug!("WgpuDevice: Destroyed texture view with ID: {id:?}");
        Ok(())
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let sampler = self
            .internal
            .context
            .device
            .create_sampler(&wgpu::SamplerDescriptor {
                label: descriptor.label.as_deref(),
                address_mode_u: descriptor.address_mode_u.into_wgpu(),
                address_mode_v: descriptor.address_mode_v.into_wgpu(),
                address_mode_w: descriptor.address_mode_w.into_wgpu(),
                mag_filter: descriptor.mag_filter.into_wgpu(),
                min_filter: descriptor.min_filter.into_wgpu(),
                mipmap_filter: descriptor.mipmap_filter.into_wgpu(),
                lod_min_clamp: descriptor.lod_min_clamp,
                lod_max_clamp: descriptor.lod_max_clamp,
                compare: None,
                anisotropy_clamp: 1,
                border_color: None,
            });
        let id = SamplerId(self.next_id());
        lock(&self.internal.samplers, "samplers")?.insert(id, Arc::new(sampler));
        log::info!(
            "WgpuDevice: Created sampler '{:?}' with ID: {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        remove_entry(&self.internal.samplers, "samplers", &id)?;
        log::debug!("WgpuDevice: Destroyed sampler with ID: {id:?}");
        Ok(())
    }

    // --- Command Operations ---

    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder> {
        let encoder = self
            .internal
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label });
        Box::new(WgpuCommandEncoder {
            encoder,
            device: self.clone(),
        })
    }

    fn submit_command_buffer(&self, command_buffer_id: CommandBufferId) {
        let buffer = lock_recover(&self.internal.pending_command_buffers).remove(&command_buffer_id);
        if let Some(buffer) = buffer {
            self.internal.context.queue.submit(std::iter::once(buffer));
        } else {
            log::error!(
                "Attempted to submit a CommandBufferId ({:?}) that does not exist.",
                command_buffer_id
            );
        }
    }

    fn get_adapter_info(&self) -> RendererAdapterInfo {
        let context = &self.internal.context;
        RendererAdapterInfo {
            name: context.adapter_name.clone(),
            backend_type: from_wgpu_backend(context.adapter_backend),
            device_type: from_wgpu_device_type(context.adapter_device_type),
        }
    }
}
