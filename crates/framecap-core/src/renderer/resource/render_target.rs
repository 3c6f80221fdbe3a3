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

//! A texture-backed render target that capture passes write into.

use super::lock_recover;
use crate::math::{Extent2D, Extent3D};
use crate::renderer::api::enums::TextureFormat;
use crate::renderer::api::texture::{
    TextureDescriptor, TextureId, TextureUsage, TextureViewDescriptor, TextureViewId,
};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GraphicsDevice;
use std::borrow::Cow;
use std::sync::Mutex;

/// The GPU objects backing an initialized [`TextureRenderTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetResource {
    /// The texture holding the target's pixels.
    pub texture: TextureId,
    /// A view over the whole texture.
    pub view: TextureViewId,
}

/// A fixed-size offscreen color target.
///
/// The description (size, format, sRGB flag) is immutable. The GPU resource
/// is created by [`init_resource`](Self::init_resource) and may be released
/// and re-created at any time, so readers must treat [`resource`](Self::resource)
/// as a snapshot.
#[derive(Debug)]
pub struct TextureRenderTarget {
    label: String,
    size: Extent2D,
    format: TextureFormat,
    srgb: bool,
    resource: Mutex<Option<RenderTargetResource>>,
}

impl TextureRenderTarget {
    /// Usage flags of the backing texture: it is rendered or copied into,
    /// and may be sampled or read back afterwards.
    pub const USAGE: TextureUsage = TextureUsage::from_bits_truncate(
        TextureUsage::RENDER_ATTACHMENT.bits()
            | TextureUsage::COPY_DST.bits()
            | TextureUsage::COPY_SRC.bits()
            | TextureUsage::TEXTURE_BINDING.bits(),
    );

    /// Describes a new target. No GPU memory is allocated yet.
    pub fn new(size: Extent2D, format: TextureFormat, srgb: bool) -> Self {
        Self {
            label: "TextureRenderTarget".to_string(),
            size,
            format,
            srgb,
            resource: Mutex::new(None),
        }
    }

    /// Sets the debug label used for the backing GPU objects.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// The debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Size in pixels.
    pub fn size(&self) -> Extent2D {
        self.size
    }

    /// The base pixel format, before the sRGB flag is applied.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Whether the target stores sRGB-encoded values.
    pub fn srgb(&self) -> bool {
        self.srgb
    }

    /// The format actually used by the GPU texture.
    pub fn effective_format(&self) -> TextureFormat {
        self.format.with_srgb(self.srgb)
    }

    /// The current GPU resource, if initialized.
    pub fn resource(&self) -> Option<RenderTargetResource> {
        *lock_recover(&self.resource)
    }

    /// Allocates the backing texture and view. Does nothing if already initialized.
    pub fn init_resource(
        &self,
        device: &dyn GraphicsDevice,
    ) -> Result<RenderTargetResource, ResourceError> {
        let mut slot = lock_recover(&self.resource);
        if let Some(existing) = *slot {
            return Ok(existing);
        }
        if self.size.is_empty() {
            return Err(ResourceError::InvalidDescriptor(format!(
                "render target '{}' has an empty size {}x{}",
                self.label, self.size.width, self.size.height
            )));
        }

        let texture = device.create_texture(&TextureDescriptor::new_2d(
            Cow::Borrowed(self.label.as_str()),
            Extent3D::from(self.size),
            self.effective_format(),
            Self::USAGE,
        ))?;
        let view = match device.create_texture_view(
            texture,
            &TextureViewDescriptor {
                label: Some(Cow::Owned(format!("{} View", self.label))),
                ..Default::default()
            },
        ) {
            Ok(view) => view,
            Err(err) => {
                if let Err(destroy_err) = device.destroy_texture(texture) {
                    log::warn!(
                        "TextureRenderTarget: failed to destroy texture {texture:?} after view error: {destroy_err}"
                    );
                }
                return Err(err);
            }
        };

        let resource = RenderTargetResource { texture, view };
        *slot = Some(resource);
        log::debug!(
            "TextureRenderTarget '{}': initialized {}x{} {:?}",
            self.label,
            self.size.width,
            self.size.height,
            self.effective_format()
        );
        Ok(resource)
    }

    /// Releases the GPU resource. Returns `false` if nothing was allocated.
    pub fn release_resource(&self, device: &dyn GraphicsDevice) -> Result<bool, ResourceError> {
        let Some(resource) = lock_recover(&self.resource).take() else {
            return Ok(false);
        };
        device.destroy_texture_view(resource.view)?;
        device.destroy_texture(resource.texture)?;
        log::debug!("TextureRenderTarget '{}': released", self.label);
        Ok(true)
    }
}
