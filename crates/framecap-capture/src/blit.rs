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

//! The GPU pass resampling the scene color buffer into a capture target.

use crate::error::CaptureError;
use crate::shaders::RESAMPLE_WGSL;
use crate::state::lock;
use bytemuck::{Pod, Zeroable};
use framecap_core::event::RenderFinishFrame;
use framecap_core::math::{Extent2D, Extent3D, IntRect};
use framecap_core::renderer::api::*;
use framecap_core::renderer::{
    GraphicsDevice, PooledRenderTarget, PooledRenderTargetDesc, RenderTargetPool, ResourceError,
    TextureRenderTarget,
};
use std::borrow::Cow;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Mutex;

/// Usage of the intermediate surface the blit renders into.
pub const SURFACE_USAGE: TextureUsage = TextureUsage::from_bits_truncate(
    TextureUsage::RENDER_ATTACHMENT.bits() | TextureUsage::COPY_SRC.bits(),
);

/// Vertex-stage uniforms mapping the fullscreen triangle onto the source region.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BlitUniforms {
    /// Top-left corner of the region, in normalized source coordinates.
    pub uv_offset: [f32; 2],
    /// Size of the region, in normalized source coordinates.
    pub uv_scale: [f32; 2],
}

impl BlitUniforms {
    /// Uniforms sampling `region` out of a source of `source_size`.
    ///
    /// An empty region, or one that does not fit the source, samples the
    /// whole source instead.
    pub fn for_region(region: IntRect, source_size: Extent2D) -> Self {
        if source_size.is_empty() || region.is_empty() || !region.fits_within(source_size) {
            return Self::FULL;
        }
        let (w, h) = (source_size.width as f32, source_size.height as f32);
        Self {
            uv_offset: [region.x as f32 / w, region.y as f32 / h],
            uv_scale: [region.width as f32 / w, region.height as f32 / h],
        }
    }

    /// Samples the whole source.
    pub const FULL: Self = Self {
        uv_offset: [0.0, 0.0],
        uv_scale: [1.0, 1.0],
    };
}

/// What one capture invocation writes: derived from the published target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureDescriptor {
    /// Destination size.
    pub size: Extent2D,
    /// Destination texel format, without the sRGB flag applied.
    pub format: TextureFormat,
    /// Whether the destination stores sRGB-encoded texels.
    pub srgb: bool,
}

impl CaptureDescriptor {
    /// Describes a capture into `target`.
    pub fn from_target(target: &TextureRenderTarget) -> Self {
        Self {
            size: target.size(),
            format: target.format(),
            srgb: target.srgb(),
        }
    }

    /// The format the GPU surfaces are created with.
    pub fn effective_format(&self) -> TextureFormat {
        self.format.with_srgb(self.srgb)
    }

    /// The pooled surface matching this capture.
    pub fn surface_desc(&self) -> PooledRenderTargetDesc {
        PooledRenderTargetDesc {
            size: self.size,
            format: self.effective_format(),
            usage: SURFACE_USAGE,
        }
    }
}

/// Result of a blit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitOutcome {
    /// The resample was recorded into the frame's encoder.
    Captured,
    /// Nothing usable to write into; nothing was recorded.
    Skipped,
}

/// GPU objects created on first use and kept until shutdown.
#[derive(Debug, Default)]
struct BlitResources {
    shader: Option<ShaderModuleId>,
    bind_group_layout: Option<BindGroupLayoutId>,
    pipeline_layout: Option<PipelineLayoutId>,
    sampler: Option<SamplerId>,
    uniform_buffer: Option<BufferId>,
    pipelines: HashMap<TextureFormat, RenderPipelineId>,
}

#[derive(Debug, Clone, Copy)]
struct SharedObjects {
    shader: ShaderModuleId,
    bind_group_layout: BindGroupLayoutId,
    pipeline_layout: PipelineLayoutId,
    sampler: SamplerId,
    uniform_buffer: BufferId,
}

impl BlitResources {
    fn ensure_shared(
        &mut self,
        device: &dyn GraphicsDevice,
        label: &str,
    ) -> Result<SharedObjects, ResourceError> {
        let shader = match self.shader {
            Some(id) => id,
            None => *self.shader.insert(device.create_shader_module(
                &ShaderModuleDescriptor {
                    label: Some(label),
                    source: ShaderSourceData::Wgsl(Cow::Borrowed(RESAMPLE_WGSL)),
                },
            )?),
        };

        let bind_group_layout = match self.bind_group_layout {
            Some(id) => id,
            None => *self
                .bind_group_layout
                .insert(device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                    label: Some(label),
                    entries: &[
                        BindGroupLayoutEntry {
                            binding: 0,
                            visibility: ShaderStageFlags::FRAGMENT,
                            ty: BindingType::Texture {
                                sample_type: TextureSampleType::Float { filterable: true },
                                view_dimension: TextureViewDimension::D2,
                            },
                        },
                        BindGroupLayoutEntry {
                            binding: 1,
                            visibility: ShaderStageFlags::FRAGMENT,
                            ty: BindingType::Sampler(SamplerBindingType::Filtering),
                        },
                        BindGroupLayoutEntry {
                            binding: 2,
                            visibility: ShaderStageFlags::VERTEX,
                            ty: BindingType::UniformBuffer {
                                min_binding_size: NonZeroU64::new(
                                    std::mem::size_of::<BlitUniforms>() as u64,
                                ),
                            },
                        },
                    ],
                })?),
        };

        let pipeline_layout = match self.pipeline_layout {
            Some(id) => id,
            None => *self
                .pipeline_layout
                .insert(device.create_pipeline_layout(&PipelineLayoutDescriptor {
                    label: Some(Cow::Borrowed(label)),
                    bind_group_layouts: &[bind_group_layout],
                })?),
        };

        let sampler = match self.sampler {
            Some(id) => id,
            None => *self.sampler.insert(device.create_sampler(&SamplerDescriptor {
                label: Some(Cow::Borrowed(label)),
                address_mode_u: AddressMode::ClampToEdge,
                address_mode_v: AddressMode::ClampToEdge,
                address_mode_w: AddressMode::ClampToEdge,
                mag_filter: FilterMode::Linear,
                min_filter: FilterMode::Linear,
                mipmap_filter: FilterMode::Nearest,
                lod_min_clamp: 0.0,
                lod_max_clamp: 32.0,
            })?),
        };

        let uniform_buffer = match self.uniform_buffer {
            Some(id) => id,
            None => *self.uniform_buffer.insert(device.create_buffer(&BufferDescriptor {
                label: Some(Cow::Borrowed(label)),
                size: std::mem::size_of::<BlitUniforms>() as u64,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
                mapped_at_creation: false,
            })?),
        };

        Ok(SharedObjects {
            shader,
            bind_group_layout,
            pipeline_layout,
            sampler,
            uniform_buffer,
        })
    }

    fn pipeline_for(
        &mut self,
        device: &dyn GraphicsDevice,
        shared: &SharedObjects,
        format: TextureFormat,
        label: &str,
    ) -> Result<RenderPipelineId, ResourceError> {
        if let Some(&pipeline) = self.pipelines.get(&format) {
            return Ok(pipeline);
        }
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(Cow::Owned(format!("{label} Resample ({format:?})"))),
            vertex_shader_module: shared.shader,
            vertex_entry_point: Cow::Borrowed("vs_main"),
            fragment_shader_module: Some(shared.shader),
            fragment_entry_point: Some(Cow::Borrowed("fs_main")),
            layout: Some(shared.pipeline_layout),
            primitive_topology: PrimitiveTopology::TriangleList,
            color_target_states: Cow::Owned(vec![ColorTargetStateDescriptor {
                format,
                write_mask: ColorWrites::ALL,
            }]),
            multisample_state: MultisampleStateDescriptor::default(),
        })?;
        log::info!("{label}: created resample pipeline for {format:?}");
        self.pipelines.insert(format, pipeline);
        Ok(pipeline)
    }

    /// Destroys everything, returning how many objects failed to go away.
    fn release(&mut self, device: &dyn GraphicsDevice) -> usize {
        let mut results = Vec::new();
        for (_, pipeline) in self.pipelines.drain() {
            results.push(device.destroy_render_pipeline(pipeline));
        }
        if let Some(id) = self.pipeline_layout.take() {
            results.push(device.destroy_pipeline_layout(id));
        }
        if let Some(id) = self.bind_group_layout.take() {
            results.push(device.destroy_bind_group_layout(id));
        }
        if let Some(id) = self.sampler.take() {
            results.push(device.destroy_sampler(id));
        }
        if let Some(id) = self.uniform_buffer.take() {
            results.push(device.destroy_buffer(id));
        }
        if let Some(id) = self.shader.take() {
            results.push(device.destroy_shader_module(id));
        }
        results
            .into_iter()
            .filter_map(Result::err)
            .inspect(|e| log::warn!("ResampleBlitPass: failed to release GPU object: {e}"))
            .count()
    }
}

/// Resamples the scene color buffer into a [`TextureRenderTarget`].
///
/// The source region is drawn with a fullscreen triangle and a bilinear,
/// clamp-to-edge sampler into a pooled surface of the target's size and
/// format, which is then copied into the target texture. Pipelines are
/// cached per destination format.
#[derive(Debug)]
pub struct ResampleBlitPass {
    label: String,
    pool: RenderTargetPool,
    resources: Mutex<BlitResources>,
}

impl ResampleBlitPass {
    /// Creates a pass whose surfaces may idle for `pool_max_idle_frames` ticks.
    pub fn new(label: impl Into<String>, pool_max_idle_frames: u64) -> Self {
        Self {
            label: label.into(),
            pool: RenderTargetPool::new(pool_max_idle_frames),
            resources: Mutex::new(BlitResources::default()),
        }
    }

    /// The pool holding the intermediate surfaces.
    pub fn pool(&self) -> &RenderTargetPool {
        &self.pool
    }

    /// Number of cached render pipelines.
    pub fn pipeline_count(&self) -> usize {
        lock(&self.resources).pipelines.len()
    }

    /// Records the resample of `frame` into `target`.
    ///
    /// A missing target, a target without a GPU resource or an empty scene
    /// yields [`BlitOutcome::Skipped`] and records nothing.
    pub fn execute(
        &self,
        device: &dyn GraphicsDevice,
        frame: &mut RenderFinishFrame<'_>,
        target: Option<&TextureRenderTarget>,
    ) -> Result<BlitOutcome, CaptureError> {
        let Some(target) = target else {
            return Ok(BlitOutcome::Skipped);
        };
        let Some(destination) = target.resource() else {
            log::trace!("{}: target '{}' has no GPU resource", self.label, target.label());
            return Ok(BlitOutcome::Skipped);
        };
        if frame.scene_size.is_empty() {
            return Ok(BlitOutcome::Skipped);
        }

        let capture = CaptureDescriptor::from_target(target);
        let surface = self.pool.acquire(device, &capture.surface_desc())?;

        let (shared, pipeline) = {
            let mut resources = lock(&self.resources);
            let shared = resources.ensure_shared(device, &self.label)?;
            let pipeline =
                resources.pipeline_for(device, &shared, capture.effective_format(), &self.label)?;
            (shared, pipeline)
        };

        let uniforms = BlitUniforms::for_region(frame.view_rect, frame.scene_size);
        device.write_buffer(shared.uniform_buffer, 0, bytemuck::bytes_of(&uniforms))?;

        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some(&self.label),
            layout: shared.bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(frame.scene_color),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(shared.sampler),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: BindingResource::Buffer(BufferBinding {
                        buffer: shared.uniform_buffer,
                        offset: 0,
                        size: None,
                    }),
                },
            ],
        })?;

        let recorded = self.record(
            frame,
            &surface,
            pipeline,
            bind_group,
            capture.size,
            destination.texture,
        );
        if let Err(e) = device.destroy_bind_group(bind_group) {
            log::warn!("{}: failed to release bind group: {e}", self.label);
        }
        recorded?;

        log::trace!(
            "{}: frame {} resampled {:?} -> {:?}",
            self.label,
            frame.frame_index,
            frame.view_rect,
            capture.size
        );
        Ok(BlitOutcome::Captured)
    }

    fn record(
        &self,
        frame: &mut RenderFinishFrame<'_>,
        surface: &PooledRenderTarget,
        pipeline: RenderPipelineId,
        bind_group: BindGroupId,
        size: Extent2D,
        destination: TextureId,
    ) -> Result<(), ResourceError> {
        let surface_view = surface.view();
        {
            let color_attachments = [RenderPassColorAttachment {
                view: &surface_view,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Load,
                    store: StoreOp::Store,
                },
            }];
            let descriptor = RenderPassDescriptor {
                label: Some(&self.label),
                color_attachments: &color_attachments,
            };
            let mut pass = frame.encoder.begin_render_pass(&descriptor)?;
            pass.set_viewport(&Viewport::from_extent(size));
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group);
            pass.draw(0..3, 0..1);
        }
        frame
            .encoder
            .copy_texture_to_texture(&surface.texture(), &destination, Extent3D::from(size))
    }

    /// Destroys the cached GPU objects and every free pooled surface.
    ///
    /// Returns the number of objects that could not be released.
    pub fn shutdown(&self, device: &dyn GraphicsDevice) -> usize {
        let failures = lock(&self.resources).release(device);
        let surfaces = self.pool.release_all(device);
        log::debug!(
            "{}: blit pass shut down ({surfaces} pooled surfaces released)",
            self.label
        );
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use framecap_core::testing::{RecordedCommand, RecordingDevice};

    struct Scene {
        view: TextureViewId,
        size: Extent2D,
    }

    fn scene(device: &RecordingDevice, size: Extent2D) -> Scene {
        let texture = device
            .create_texture(&TextureDescriptor::new_2d(
                "scene",
                size.into(),
                TextureFormat::Rgba16Float,
                TextureUsage::TEXTURE_BINDING | TextureUsage::RENDER_ATTACHMENT,
            ))
            .unwrap();
        let view = device
            .create_texture_view(texture, &TextureViewDescriptor::default())
            .unwrap();
        Scene { view, size }
    }

    fn run(
        pass: &ResampleBlitPass,
        device: &RecordingDevice,
        scene: &Scene,
        view_rect: IntRect,
        target: Option<&TextureRenderTarget>,
    ) -> Result<BlitOutcome, CaptureError> {
        let mut encoder = device.create_command_encoder(None);
        let mut frame = RenderFinishFrame {
            encoder: encoder.as_mut(),
            scene_color: scene.view,
            scene_size: scene.size,
            view_rect,
            frame_index: 0,
        };
        pass.execute(device, &mut frame, target)
    }

    fn ready_target(device: &RecordingDevice, width: u32, height: u32) -> TextureRenderTarget {
        let target =
            TextureRenderTarget::new(Extent2D::new(width, height), TextureFormat::Rgba8Unorm, false);
        target.init_resource(device).unwrap();
        target
    }

    #[test]
    fn test_region_uniforms() {
        let u = BlitUniforms::for_region(IntRect::new(50, 0, 50, 25), Extent2D::new(100, 50));
        assert_relative_eq!(u.uv_offset[0], 0.5);
        assert_relative_eq!(u.uv_offset[1], 0.0);
        assert_relative_eq!(u.uv_scale[0], 0.5);
        assert_relative_eq!(u.uv_scale[1], 0.5);
    }

    #[test]
    fn test_out_of_bounds_region_samples_everything() {
        let size = Extent2D::new(100, 50);
        assert_eq!(
            BlitUniforms::for_region(IntRect::new(60, 0, 50, 50), size),
            BlitUniforms::FULL
        );
        assert_eq!(BlitUniforms::for_region(IntRect::default(), size), BlitUniforms::FULL);
    }

    #[test]
    fn test_surface_desc_applies_srgb() {
        let target = TextureRenderTarget::new(Extent2D::new(8, 8), TextureFormat::Rgba8Unorm, true);
        let desc = CaptureDescriptor::from_target(&target).surface_desc();
        assert_eq!(desc.format, TextureFormat::Rgba8UnormSrgb);
        assert!(desc.usage.contains(TextureUsage::RENDER_ATTACHMENT));
        assert!(desc.usage.contains(TextureUsage::COPY_SRC));
    }

    #[test]
    fn test_missing_target_is_skipped() {
        let device = RecordingDevice::new();
        let scene = scene(&device, Extent2D::new(100, 50));
        let pass = ResampleBlitPass::new("test", 4);

        let outcome = run(&pass, &device, &scene, IntRect::from_extent(scene.size), None).unwrap();
        assert_eq!(outcome, BlitOutcome::Skipped);

        let uninitialized =
            TextureRenderTarget::new(Extent2D::new(8, 8), TextureFormat::Rgba8Unorm, false);
        let outcome = run(
            &pass,
            &device,
            &scene,
            IntRect::from_extent(scene.size),
            Some(&uninitialized),
        )
        .unwrap();
        assert_eq!(outcome, BlitOutcome::Skipped);
        assert!(device.commands().is_empty());
        assert_eq!(device.created_pipeline_count(), 0);
    }

    #[test]
    fn test_blit_records_fullscreen_draw_then_copy() {
        let device = RecordingDevice::new();
        let scene = scene(&device, Extent2D::new(100, 50));
        let target = ready_target(&device, 50, 50);
        let pass = ResampleBlitPass::new("test", 4);

        let outcome =
            run(&pass, &device, &scene, IntRect::from_extent(scene.size), Some(&target)).unwrap();
        assert_eq!(outcome, BlitOutcome::Captured);

        let commands = device.commands();
        assert_eq!(commands.len(), 7);
        match &commands[0] {
            RecordedCommand::BeginRenderPass { loads, stores, .. } => {
                assert_eq!(loads, &vec![LoadOp::Load]);
                assert_eq!(stores, &vec![StoreOp::Store]);
            }
            other => panic!("expected a render pass, got {other:?}"),
        }
        assert_eq!(
            commands[1],
            RecordedCommand::SetViewport(Viewport::from_extent(Extent2D::new(50, 50)))
        );
        assert!(matches!(commands[2], RecordedCommand::SetPipeline(_)));
        assert!(matches!(
            commands[3],
            RecordedCommand::SetBindGroup { index: 0, .. }
        ));
        assert_eq!(
            commands[4],
            RecordedCommand::Draw {
                vertices: 0..3,
                instances: 0..1
            }
        );
        assert_eq!(commands[5], RecordedCommand::EndRenderPass);
        match &commands[6] {
            RecordedCommand::CopyTextureToTexture {
                destination, size, ..
            } => {
                assert_eq!(*destination, target.resource().unwrap().texture);
                assert_eq!(*size, Extent3D::from(Extent2D::new(50, 50)));
            }
            other => panic!("expected a copy, got {other:?}"),
        }

        // The per-invocation bind group is gone, the surface went back to the pool.
        assert_eq!(device.created_bind_group_count(), 1);
        assert_eq!(device.live_bind_group_count(), 0);
        assert_eq!(pass.pool().free_count(), 1);
    }

    #[test]
    fn test_sampler_is_bilinear_clamped() {
        let device = RecordingDevice::new();
        let scene = scene(&device, Extent2D::new(16, 16));
        let target = ready_target(&device, 16, 16);
        let pass = ResampleBlitPass::new("test", 4);
        run(&pass, &device, &scene, IntRect::from_extent(scene.size), Some(&target)).unwrap();

        let samplers = device.samplers();
        assert_eq!(samplers.len(), 1);
        assert_eq!(samplers[0].mag_filter, FilterMode::Linear);
        assert_eq!(samplers[0].min_filter, FilterMode::Linear);
        assert_eq!(samplers[0].address_mode_u, AddressMode::ClampToEdge);
        assert_eq!(samplers[0].address_mode_v, AddressMode::ClampToEdge);
    }

    #[test]
    fn test_uniforms_follow_view_rect() {
        let device = RecordingDevice::new();
        let scene = scene(&device, Extent2D::new(100, 50));
        let target = ready_target(&device, 25, 25);
        let pass = ResampleBlitPass::new("test", 4);
        run(&pass, &device, &scene, IntRect::new(0, 25, 50, 25), Some(&target)).unwrap();

        let writes = device.buffer_writes();
        let (_, offset, bytes) = writes.last().unwrap();
        assert_eq!(*offset, 0);
        let uniforms: BlitUniforms = bytemuck::pod_read_unaligned(bytes);
        assert_relative_eq!(uniforms.uv_offset[1], 0.5);
        assert_relative_eq!(uniforms.uv_scale[0], 0.5);
    }

    #[test]
    fn test_pipeline_and_surface_reused() {
        let device = RecordingDevice::new();
        let scene = scene(&device, Extent2D::new(64, 64));
        let target = ready_target(&device, 32, 32);
        let pass = ResampleBlitPass::new("test", 4);

        run(&pass, &device, &scene, IntRect::from_extent(scene.size), Some(&target)).unwrap();
        let textures_after_first = device.created_texture_count();
        run(&pass, &device, &scene, IntRect::from_extent(scene.size), Some(&target)).unwrap();

        assert_eq!(device.created_pipeline_count(), 1);
        assert_eq!(device.created_texture_count(), textures_after_first);
        assert_eq!(pass.pool().len(), 1);
    }

    #[test]
    fn test_pipeline_cached_per_format() {
        let device = RecordingDevice::new();
        let scene = scene(&device, Extent2D::new(64, 64));
        let linear = ready_target(&device, 32, 32);
        let srgb = TextureRenderTarget::new(Extent2D::new(32, 32), TextureFormat::Rgba8Unorm, true);
        srgb.init_resource(&device).unwrap();
        let pass = ResampleBlitPass::new("test", 4);

        run(&pass, &device, &scene, IntRect::from_extent(scene.size), Some(&linear)).unwrap();
        run(&pass, &device, &scene, IntRect::from_extent(scene.size), Some(&srgb)).unwrap();

        assert_eq!(pass.pipeline_count(), 2);
        assert_eq!(pass.pool().len(), 2);
    }

    #[test]
    fn test_surface_allocation_failure_is_an_error() {
        let device = RecordingDevice::new();
        let scene = scene(&device, Extent2D::new(64, 64));
        let target = ready_target(&device, 32, 32);
        let pass = ResampleBlitPass::new("test", 4);

        device.set_fail_texture_creation(true);
        let err = run(&pass, &device, &scene, IntRect::from_extent(scene.size), Some(&target))
            .unwrap_err();
        assert!(matches!(err, CaptureError::Resource(_)));
        assert!(device.commands().is_empty());
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let device = RecordingDevice::new();
        let scene = scene(&device, Extent2D::new(64, 64));
        let target = ready_target(&device, 32, 32);
        let baseline = device.live_object_count();
        let pass = ResampleBlitPass::new("test", 4);

        run(&pass, &device, &scene, IntRect::from_extent(scene.size), Some(&target)).unwrap();
        assert!(device.live_object_count() > baseline);

        assert_eq!(pass.shutdown(&device), 0);
        assert_eq!(device.live_object_count(), baseline);
        assert_eq!(pass.pipeline_count(), 0);
    }
}
