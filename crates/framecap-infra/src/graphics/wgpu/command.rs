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

use framecap_core::math::Extent3D;
use framecap_core::renderer::api::command::{
    BindGroupId, CommandBufferId, RenderPassDescriptor, Viewport,
};
use framecap_core::renderer::traits::{CommandEncoder, RenderPass};
use framecap_core::renderer::{RenderPipelineId, ResourceError, TextureId};
use std::any::Any;
use std::ops::Range;
use std::sync::Arc;

use super::conversions::IntoWgpu;
use super::device::WgpuDevice;

pub struct WgpuRenderPass<'a> {
    pub(crate) pass: wgpu::RenderPass<'a>,
    pub(crate) device: &'a WgpuDevice,
}

impl<'pass> RenderPass<'pass> for WgpuRenderPass<'pass> {
    fn set_viewport(&mut self, viewport: &Viewport) {
        self.pass.set_viewport(
            viewport.x,
            viewport.y,
            viewport.width,
            viewport.height,
            viewport.min_depth,
            viewport.max_depth,
        );
    }

    fn set_pipeline(&mut self, pipeline_id: &'pass RenderPipelineId) {
        if let Some(pipeline) = self.device.get_wgpu_render_pipeline(*pipeline_id) {
            self.pass.set_pipeline(&pipeline);
        } else {
            log::warn!(
                "WgpuRenderPass: RenderPipelineId {:?} not found.",
                pipeline_id
            );
        }
    }

    fn set_bind_group(&mut self, index: u32, bind_group_id: &'pass BindGroupId) {
        if let Some(bind_group) = self.device.get_wgpu_bind_group(*bind_group_id) {
            self.pass.set_bind_group(index, bind_group.as_ref(), &[]);
        } else {
            log::warn!("WgpuRenderPass: BindGroupId {:?} not found.", bind_group_id);
        }
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.pass.draw(vertices, instances);
    }
}

pub struct WgpuCommandEncoder {
    pub(crate) encoder: wgpu::CommandEncoder,
    pub(crate) device: WgpuDevice,
}

impl WgpuCommandEncoder {
    /// Gives direct access to the wgpu encoder, for work outside the abstract API.
    pub fn wgpu_encoder_mut(&mut self) -> &mut wgpu::CommandEncoder {
        &mut self.encoder
    }

    fn texture(&self, id: &TextureId) -> Result<Arc<wgpu::Texture>, ResourceError> {
        self.device
            .get_wgpu_texture(id)
            .ok_or(ResourceError::NotFound)
    }
}

impl CommandEncoder for WgpuCommandEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'encoder>,
    ) -> Result<Box<dyn RenderPass<'encoder> + 'encoder>, ResourceError> {
        let mut views: Vec<Arc<wgpu::TextureView>> = Vec::new();
        let mut resolve_targets: Vec<Option<Arc<wgpu::TextureView>>> = Vec::new();

        for att in descriptor.color_attachments.iter() {
            let view = self
                .device
                .get_wgpu_texture_view(att.view)
                .ok_or(ResourceError::NotFound)?;
            views.push(view);

            let resolve = match att.resolve_target {
                Some(rt_id) => Some(
                    self.device
                        .get_wgpu_texture_view(rt_id)
                        .ok_or(ResourceError::NotFound)?,
                ),
                None => None,
            };
            resolve_targets.push(resolve);
        }

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = descriptor
            .color_attachments
            .iter()
            .enumerate()
            .map(|(i, att)| {
                Some(wgpu::RenderPassColorAttachment {
                    view: views[i].as_ref(),
                    depth_slice: None,
                    resolve_target: resolve_targets[i].as_deref(),
                    ops: wgpu::Operations {
                        load: att.ops.load.clone().into_wgpu(),
                        store: att.ops.store.into_wgpu(),
                    },
                })
            })
            .collect();

        let wgpu_descriptor = wgpu::RenderPassDescriptor {
            label: descriptor.label,
            color_attachments: &color_attachments,
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        };

        let pass = self.encoder.begin_render_pass(&wgpu_descriptor);

        Ok(Box::new(WgpuRenderPass {
            pass,
            device: &self.device,
        }))
    }

    fn copy_texture_to_texture(
        &mut self,
        source: &TextureId,
        destination: &TextureId,
        size: Extent3D,
    ) -> Result<(), ResourceError> {
        let src = self.texture(source)?;
        let dst = self.texture(destination)?;

        if src.format() != dst.format() {
            return Err(ResourceError::InvalidDescriptor(format!(
                "cannot copy {:?} into {:?}",
                src.format(),
                dst.format()
            )));
        }
        let fits = |t: &wgpu::Texture| size.width <= t.width() && size.height <= t.height();
        if !fits(&src) || !fits(&dst) {
            return Err(ResourceError::OutOfBounds);
        }

        self.encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &src,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &dst,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            size.into_wgpu(),
        );
        Ok(())
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        let this = *self;
        this.device.register_command_buffer(this.encoder.finish())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
