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

use crate::math::Extent3D;
use crate::renderer::api::command::{
    BindGroupId, CommandBufferId, RenderPassDescriptor, Viewport,
};
use crate::renderer::api::pipeline::RenderPipelineId;
use crate::renderer::api::texture::TextureId;
use crate::renderer::error::ResourceError;
use std::any::Any;
use std::ops::Range;

/// An open render pass on a [`CommandEncoder`].
///
/// Ids passed in must outlive the pass (`'pass`). Dropping the pass ends it.
pub trait RenderPass<'pass> {
    /// Viewport for the following draws.
    fn set_viewport(&mut self, viewport: &Viewport);

    /// Pipeline for the following draws. Unknown ids are logged and skipped.
    fn set_pipeline(&mut self, pipeline: &'pass RenderPipelineId);

    /// Binds `bind_group` as `@group(index)`.
    fn set_bind_group(&mut self, index: u32, bind_group: &'pass BindGroupId);

    /// Draws without vertex or index buffers.
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);
}

/// Records GPU work into one command buffer.
///
/// Render passes and texture copies are recorded in call order.
pub trait CommandEncoder {
    /// Opens a render pass. Only one pass can be open at a time.
    ///
    /// Fails when an attachment view is unknown.
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'encoder>,
    ) -> Result<Box<dyn RenderPass<'encoder> + 'encoder>, ResourceError>;

    /// Records a copy of the first mip of `source` into `destination`.
    ///
    /// Both textures must share a format, and `size` must fit in both.
    fn copy_texture_to_texture(
        &mut self,
        source: &TextureId,
        destination: &TextureId,
        size: Extent3D,
    ) -> Result<(), ResourceError>;

    /// Closes recording; the id is passed to
    /// [`GraphicsDevice::submit_command_buffer`](crate::renderer::GraphicsDevice::submit_command_buffer).
    fn finish(self: Box<Self>) -> CommandBufferId;

    /// Downcasting hook for backend-specific access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
