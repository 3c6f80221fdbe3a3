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

//! A pool of transient render surfaces reused across frames.
//!
//! Passes describe the surface they need with a [`PooledRenderTargetDesc`]
//! and lease one for the duration of a frame. A free surface with an
//! identical description is reused; otherwise a new one is allocated. Leases
//! return their surface to the pool when dropped, and surfaces left idle for
//! too long are destroyed by [`RenderTargetPool::tick`].

use super::lock_recover;
use crate::math::{Extent2D, Extent3D};
use crate::renderer::api::enums::TextureFormat;
use crate::renderer::api::texture::{
    TextureDescriptor, TextureId, TextureUsage, TextureViewDescriptor, TextureViewId,
};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GraphicsDevice;
use std::borrow::Cow;
use std::sync::{Arc, Mutex, Weak};

/// Describes a pooled surface. Two requests share a surface only when their
/// descriptions are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PooledRenderTargetDesc {
    /// Size in pixels.
    pub size: Extent2D,
    /// Texel format, sRGB variant included.
    pub format: TextureFormat,
    /// Required usages.
    pub usage: TextureUsage,
}

#[derive(Debug)]
struct PoolEntry {
    id: u64,
    desc: PooledRenderTargetDesc,
    texture: TextureId,
    view: TextureViewId,
    in_use: bool,
    last_used_frame: u64,
}

#[derive(Debug, Default)]
struct PoolState {
    entries: Vec<PoolEntry>,
    frame: u64,
    next_entry_id: u64,
}

/// A lease on a pooled surface. Dropping it hands the surface back to the pool.
#[derive(Debug)]
pub struct PooledRenderTarget {
    entry_id: u64,
    desc: PooledRenderTargetDesc,
    texture: TextureId,
    view: TextureViewId,
    pool: Weak<Mutex<PoolState>>,
}

impl PooledRenderTarget {
    /// The leased texture.
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    /// A view over the whole leased texture.
    pub fn view(&self) -> TextureViewId {
        self.view
    }

    /// The description the surface was allocated with.
    pub fn desc(&self) -> &PooledRenderTargetDesc {
        &self.desc
    }
}

impl Drop for PooledRenderTarget {
    fn drop(&mut self) {
        // The pool may already be gone; the surface is then simply forgotten.
        let Some(pool) = self.pool.upgrade() else {
            return;
        };
        let mut state = lock_recover(&pool);
        let frame = state.frame;
        if let Some(entry) = state.entries.iter_mut().find(|e| e.id == self.entry_id) {
            entry.in_use = false;
            entry.last_used_frame = frame;
        }
    }
}

/// Hands out render surfaces, reusing free ones with identical descriptions.
///
/// The pool is shared between the thread that ages it and the render thread
/// that leases from it, so all methods take `&self`.
#[derive(Debug)]
pub struct RenderTargetPool {
    state: Arc<Mutex<PoolState>>,
    max_idle_frames: u64,
}

impl RenderTargetPool {
    /// Creates an empty pool. Free surfaces idle for more than
    /// `max_idle_frames` ticks are destroyed.
    pub fn new(max_idle_frames: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(PoolState::default())),
            max_idle_frames,
        }
    }

    /// The idle threshold, in ticks.
    pub fn max_idle_frames(&self) -> u64 {
        self.max_idle_frames
    }

    /// Leases a surface matching `desc`, allocating one if no free surface matches.
    pub fn acquire(
        &self,
        device: &dyn GraphicsDevice,
        desc: &PooledRenderTargetDesc,
    ) -> Result<PooledRenderTarget, ResourceError> {
        let mut state = lock_recover(&self.state);

        if let Some(entry) = state
            .entries
            .iter_mut()
            .find(|e| !e.in_use && e.desc == *desc)
        {
            entry.in_use = true;
            log::trace!("RenderTargetPool: reusing surface #{}", entry.id);
            return Ok(self.lease(entry));
        }

        if desc.size.is_empty() {
            return Err(ResourceError::InvalidDescriptor(format!(
                "pooled surface of size {}x{}",
                desc.size.width, desc.size.height
            )));
        }

        let id = state.next_entry_id;
        let texture = device.create_texture(&TextureDescriptor::new_2d(
            Cow::Owned(format!("PooledRenderTarget #{id}")),
            Extent3D::from(desc.size),
            desc.format,
            desc.usage,
        ))?;
        let view = match device.create_texture_view(texture, &TextureViewDescriptor::default()) {
            Ok(view) => view,
            Err(err) => {
                if let Err(destroy_err) = device.destroy_texture(texture) {
                    log::warn!("RenderTargetPool: failed to destroy texture {texture:?}: {destroy_err}");
                }
                return Err(err);
            }
        };

        state.next_entry_id += 1;
        let frame = state.frame;
        state.entries.push(PoolEntry {
            id,
            desc: *desc,
            texture,
            view,
            in_use: true,
            last_used_frame: frame,
        });
        log::debug!(
            "RenderTargetPool: allocated surface #{id} ({}x{} {:?}), pool size {}",
            desc.size.width,
            desc.size.height,
            desc.format,
            state.entries.len()
        );

        let entry = state
            .entries
            .last()
            .ok_or_else(|| ResourceError::BackendError("pool entry vanished".into()))?;
        Ok(self.lease(entry))
    }

    fn lease(&self, entry: &PoolEntry) -> PooledRenderTarget {
        PooledRenderTarget {
            entry_id: entry.id,
            desc: entry.desc,
            texture: entry.texture,
            view: entry.view,
            pool: Arc::downgrade(&self.state),
        }
    }

    /// Advances the pool clock by one frame and destroys free surfaces that
    /// have been idle for more than `max_idle_frames`. Returns how many were destroyed.
    pub fn tick(&self, device: &dyn GraphicsDevice) -> usize {
        let expired = {
            let mut state = lock_recover(&self.state);
            state.frame += 1;
            let frame = state.frame;
            let max_idle = self.max_idle_frames;
            let (expired, kept): (Vec<_>, Vec<_>) = state
                .entries
                .drain(..)
                .partition(|e| !e.in_use && frame - e.last_used_frame > max_idle);
            state.entries = kept;
            expired
        };

        let count = expired.len();
        for entry in expired {
            Self::destroy_entry(device, &entry);
        }
        if count > 0 {
            log::debug!("RenderTargetPool: released {count} idle surface(s)");
        }
        count
    }

    /// Destroys every free surface. Leased surfaces are kept. Returns how many were destroyed.
    pub fn release_all(&self, device: &dyn GraphicsDevice) -> usize {
        let free = {
            let mut state = lock_recover(&self.state);
            let (free, leased): (Vec<_>, Vec<_>) =
                state.entries.drain(..).partition(|e| !e.in_use);
            state.entries = leased;
            free
        };
        for entry in &free {
            Self::destroy_entry(device, entry);
        }
        free.len()
    }

    fn destroy_entry(device: &dyn GraphicsDevice, entry: &PoolEntry) {
        if let Err(e) = device.destroy_texture_view(entry.view) {
            log::warn!("RenderTargetPool: failed to destroy view of surface #{}: {e}", entry.id);
        }
        if let Err(e) = device.destroy_texture(entry.texture) {
            log::warn!("RenderTargetPool: failed to destroy surface #{}: {e}", entry.id);
        }
    }

    /// Total number of surfaces owned by the pool.
    pub fn len(&self) -> usize {
        lock_recover(&self.state).entries.len()
    }

    /// Returns `true` if the pool owns no surface.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of surfaces not currently leased.
    pub fn free_count(&self) -> usize {
        lock_recover(&self.state)
            .entries
            .iter()
            .filter(|e| !e.in_use)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingDevice;

    fn desc(width: u32, height: u32) -> PooledRenderTargetDesc {
        PooledRenderTargetDesc {
            size: Extent2D::new(width, height),
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::COPY_SRC,
        }
    }

    #[test]
    fn test_reuses_free_surface_with_same_desc() {
        let device = RecordingDevice::new();
        let pool = RenderTargetPool::new(4);

        let first = pool.acquire(&device, &desc(64, 32)).unwrap();
        let texture = first.texture();
        drop(first);
        assert_eq!(pool.free_count(), 1);

        let second = pool.acquire(&device, &desc(64, 32)).unwrap();
        assert_eq!(second.texture(), texture);
        assert_eq!(pool.len(), 1);
        assert_eq!(device.created_texture_count(), 1);
    }

    #[test]
    fn test_leased_surface_is_not_shared() {
        let device = RecordingDevice::new();
        let pool = RenderTargetPool::new(4);

        let a = pool.acquire(&device, &desc(16, 16)).unwrap();
        let b = pool.acquire(&device, &desc(16, 16)).unwrap();
        assert_ne!(a.texture(), b.texture());
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn test_different_desc_allocates_new_surface() {
        let device = RecordingDevice::new();
        let pool = RenderTargetPool::new(4);

        drop(pool.acquire(&device, &desc(16, 16)).unwrap());
        let srgb = PooledRenderTargetDesc {
            format: TextureFormat::Rgba8UnormSrgb,
            ..desc(16, 16)
        };
        let lease = pool.acquire(&device, &srgb).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(
            device.texture_format(lease.texture()),
            Some(TextureFormat::Rgba8UnormSrgb)
        );
    }

    #[test]
    fn test_tick_releases_idle_surfaces() {
        let device = RecordingDevice::new();
        let pool = RenderTargetPool::new(2);

        drop(pool.acquire(&device, &desc(8, 8)).unwrap());
        let _held = pool.acquire(&device, &desc(4, 4)).unwrap();

        assert_eq!(pool.tick(&device), 0);
        assert_eq!(pool.tick(&device), 0);
        // Third tick: the free surface has been idle for three frames.
        assert_eq!(pool.tick(&device), 1);
        assert_eq!(pool.len(), 1);
        assert_eq!(device.live_texture_count(), 1);
    }

    #[test]
    fn test_release_all_keeps_leased_surfaces() {
        let device = RecordingDevice::new();
        let pool = RenderTargetPool::new(8);

        drop(pool.acquire(&device, &desc(8, 8)).unwrap());
        let held = pool.acquire(&device, &desc(4, 4)).unwrap();

        assert_eq!(pool.release_all(&device), 1);
        assert_eq!(pool.len(), 1);
        drop(held);
        assert_eq!(pool.release_all(&device), 1);
        assert!(pool.is_empty());
        assert_eq!(device.live_texture_count(), 0);
    }

    #[test]
    fn test_empty_desc_is_rejected() {
        let device = RecordingDevice::new();
        let pool = RenderTargetPool::new(8);
        assert!(matches!(
            pool.acquire(&device, &desc(0, 8)),
            Err(ResourceError::InvalidDescriptor(_))
        ));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_lease_outliving_pool_is_harmless() {
        let device = RecordingDevice::new();
        let pool = RenderTargetPool::new(8);
        let lease = pool.acquire(&device, &desc(8, 8)).unwrap();
        drop(pool);
        drop(lease);
    }
}
