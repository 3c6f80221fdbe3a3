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

//! State shared between the controlling thread and the render thread.

use crate::stats::CaptureStats;
use framecap_core::renderer::TextureRenderTarget;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Capture state read by the render-finish listener.
///
/// The one-shot flag and the published target sit behind two independent
/// locks. The flag lock is only held for a read-modify-write. The target
/// lock is held by the render thread for a whole blit, and by the
/// controlling thread only while swapping the `Arc`.
#[derive(Debug)]
pub struct SharedCaptureState {
    capture_every_frame: AtomicBool,
    one_shot_pending: Mutex<bool>,
    published_target: Mutex<Option<Arc<TextureRenderTarget>>>,
    stats: CaptureStats,
}

impl SharedCaptureState {
    /// Creates unpublished state with the given cadence.
    pub fn new(capture_every_frame: bool) -> Self {
        Self {
            capture_every_frame: AtomicBool::new(capture_every_frame),
            one_shot_pending: Mutex::new(false),
            published_target: Mutex::new(None),
            stats: CaptureStats::new(),
        }
    }

    /// Whether every notification should capture.
    pub fn capture_every_frame(&self) -> bool {
        self.capture_every_frame.load(Ordering::Acquire)
    }

    /// Sets the capture cadence.
    pub fn set_capture_every_frame(&self, every_frame: bool) {
        self.capture_every_frame.store(every_frame, Ordering::Release);
    }

    /// Whether a one-shot capture is waiting for the next notification.
    pub fn one_shot_pending(&self) -> bool {
        *lock(&self.one_shot_pending)
    }

    /// Marks a one-shot capture as pending.
    pub fn request_one_shot(&self) {
        *lock(&self.one_shot_pending) = true;
    }

    /// Clears the one-shot flag, returning its previous value.
    pub fn clear_one_shot(&self) -> bool {
        std::mem::replace(&mut *lock(&self.one_shot_pending), false)
    }

    /// Whether the next notification should perform a capture.
    pub fn wants_capture(&self) -> bool {
        self.capture_every_frame() || self.one_shot_pending()
    }

    /// The target currently visible to the render thread.
    pub fn published_target(&self) -> Option<Arc<TextureRenderTarget>> {
        lock(&self.published_target).clone()
    }

    /// Publishes `desired` if it is not already the published target.
    ///
    /// Targets are compared by identity. Returns `true` when a swap happened.
    pub fn publish(&self, desired: &Option<Arc<TextureRenderTarget>>) -> bool {
        let mut published = lock(&self.published_target);
        let same = match (published.as_ref(), desired.as_ref()) {
            (Some(current), Some(wanted)) => Arc::ptr_eq(current, wanted),
            (None, None) => true,
            _ => false,
        };
        if !same {
            *published = desired.clone();
        }
        !same
    }

    /// Locks the published target for the duration of a blit.
    pub fn lock_target(&self) -> MutexGuard<'_, Option<Arc<TextureRenderTarget>>> {
        lock(&self.published_target)
    }

    /// Capture counters.
    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecap_core::math::Extent2D;
    use framecap_core::renderer::TextureFormat;

    fn target() -> Arc<TextureRenderTarget> {
        Arc::new(TextureRenderTarget::new(
            Extent2D::new(4, 4),
            TextureFormat::Rgba8Unorm,
            false,
        ))
    }

    #[test]
    fn test_one_shot_flag() {
        let state = SharedCaptureState::new(false);
        assert!(!state.wants_capture());
        state.request_one_shot();
        assert!(state.wants_capture());
        assert!(state.clear_one_shot());
        assert!(!state.clear_one_shot());
        assert!(!state.wants_capture());
    }

    #[test]
    fn test_publish_compares_identity() {
        let state = SharedCaptureState::new(true);
        let a = target();
        let twin = target();

        assert!(!state.publish(&None));
        assert!(state.publish(&Some(a.clone())));
        assert!(!state.publish(&Some(a.clone())));
        assert!(state.publish(&Some(twin.clone())));
        assert!(Arc::ptr_eq(&state.published_target().unwrap(), &twin));
        assert!(state.publish(&None));
        assert!(state.published_target().is_none());
    }

    #[test]
    fn test_poisoned_flag_lock_is_recovered() {
        let state = Arc::new(SharedCaptureState::new(false));
        let poisoner = state.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.one_shot_pending.lock().unwrap();
            panic!("poison the flag lock");
        })
        .join();

        state.request_one_shot();
        assert!(state.one_shot_pending());
    }
}
