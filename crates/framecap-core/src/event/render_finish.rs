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

//! The "3D rendering finished" multicast notification.
//!
//! The host renderer owns a [`RenderFinishDelegate`] and calls
//! [`broadcast`](RenderFinishDelegate::broadcast) on its render thread once the
//! scene color buffer for a frame is complete, before the frame's command
//! buffer is submitted. Listeners record extra GPU work into the same encoder.
//!
//! Other systems see the delegate only through the
//! [`RenderNotificationService`] trait, which is what gets registered in the
//! [`ServiceRegistry`](crate::ServiceRegistry).

use crate::math::{Extent2D, IntRect};
use crate::renderer::api::texture::TextureViewId;
use crate::renderer::traits::CommandEncoder;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// An opaque token identifying one subscription on a notification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    /// The raw subscription number. Only meaningful for diagnostics.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Everything a listener needs to record GPU work at the end of a frame.
pub struct RenderFinishFrame<'a> {
    /// The encoder recording the current frame.
    pub encoder: &'a mut dyn CommandEncoder,
    /// A sampleable view of the finished scene color buffer.
    pub scene_color: TextureViewId,
    /// Full size of the scene color texture, in pixels.
    pub scene_size: Extent2D,
    /// The region of the scene color texture holding the view.
    pub view_rect: IntRect,
    /// Monotonic frame counter maintained by the host.
    pub frame_index: u64,
}

impl fmt::Debug for RenderFinishFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderFinishFrame")
            .field("scene_color", &self.scene_color)
            .field("scene_size", &self.scene_size)
            .field("view_rect", &self.view_rect)
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}

/// A callback invoked on the render thread when a frame's 3D rendering is done.
pub trait RenderFinishListener: Send + Sync {
    /// Records work for the finished frame. Must not panic.
    fn on_render_finish(&self, frame: &mut RenderFinishFrame<'_>);
}

/// Subscription management for the render-finish notification.
pub trait RenderNotificationService: Send + Sync {
    /// Adds a listener and returns the handle that removes it.
    fn subscribe(&self, listener: Arc<dyn RenderFinishListener>) -> SubscriptionHandle;

    /// Removes a listener. Returns `false` if the handle was not subscribed.
    fn unsubscribe(&self, handle: SubscriptionHandle) -> bool;

    /// Returns `true` while `handle` is subscribed.
    fn is_subscribed(&self, handle: SubscriptionHandle) -> bool;

    /// Number of current subscriptions.
    fn subscriber_count(&self) -> usize;
}

type Subscribers = Vec<(SubscriptionHandle, Arc<dyn RenderFinishListener>)>;

/// The concrete multicast delegate owned by the host renderer.
///
/// Broadcasting works on a snapshot of the subscriber list, so subscribing or
/// unsubscribing from another thread never waits for an in-flight broadcast.
/// A listener removed during a broadcast may still receive that one call.
pub struct RenderFinishDelegate {
    subscribers: RwLock<Subscribers>,
    next_handle: AtomicU64,
}

impl RenderFinishDelegate {
    /// Creates a delegate without subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Subscribers> {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Subscribers> {
        self.subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Invokes every subscribed listener with `frame`, in subscription order.
    /// Returns the number of listeners called.
    pub fn broadcast(&self, frame: &mut RenderFinishFrame<'_>) -> usize {
        let snapshot: Vec<Arc<dyn RenderFinishListener>> =
            self.read().iter().map(|(_, l)| Arc::clone(l)).collect();
        log::trace!(
            "RenderFinishDelegate: frame {} -> {} listener(s)",
            frame.frame_index,
            snapshot.len()
        );
        for listener in &snapshot {
            listener.on_render_finish(frame);
        }
        snapshot.len()
    }
}

impl Default for RenderFinishDelegate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RenderFinishDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderFinishDelegate")
            .field("subscribers", &self.read().len())
            .finish()
    }
}

impl RenderNotificationService for RenderFinishDelegate {
    fn subscribe(&self, listener: Arc<dyn RenderFinishListener>) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.write().push((handle, listener));
        log::debug!("RenderFinishDelegate: subscribed {handle:?}");
        handle
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut subscribers = self.write();
        let before = subscribers.len();
        subscribers.retain(|(h, _)| *h != handle);
        let removed = subscribers.len() != before;
        if removed {
            log::debug!("RenderFinishDelegate: unsubscribed {handle:?}");
        }
        removed
    }

    fn is_subscribed(&self, handle: SubscriptionHandle) -> bool {
        self.read().iter().any(|(h, _)| *h == handle)
    }

    fn subscriber_count(&self) -> usize {
        self.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::GraphicsDevice;
    use crate::testing::RecordingDevice;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingListener {
        calls: AtomicUsize,
    }

    impl RenderFinishListener for CountingListener {
        fn on_render_finish(&self, _frame: &mut RenderFinishFrame<'_>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn broadcast_once(delegate: &RenderFinishDelegate) -> usize {
        let device = RecordingDevice::new();
        let mut encoder = device.create_command_encoder(None);
        let mut frame = RenderFinishFrame {
            encoder: encoder.as_mut(),
            scene_color: TextureViewId(0),
            scene_size: Extent2D::new(4, 4),
            view_rect: IntRect::new(0, 0, 4, 4),
            frame_index: 0,
        };
        delegate.broadcast(&mut frame)
    }

    #[test]
    fn test_subscribe_and_broadcast() {
        let delegate = RenderFinishDelegate::new();
        let listener = Arc::new(CountingListener::default());
        let handle = delegate.subscribe(listener.clone());

        assert!(delegate.is_subscribed(handle));
        assert_eq!(delegate.subscriber_count(), 1);
        assert_eq!(broadcast_once(&delegate), 1);
        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let delegate = RenderFinishDelegate::new();
        let listener = Arc::new(CountingListener::default());
        let handle = delegate.subscribe(listener.clone());

        assert!(delegate.unsubscribe(handle));
        assert!(!delegate.unsubscribe(handle));
        assert!(!delegate.is_subscribed(handle));
        assert_eq!(broadcast_once(&delegate), 0);
        assert_eq!(listener.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handles_are_unique() {
        let delegate = RenderFinishDelegate::new();
        let listener: Arc<dyn RenderFinishListener> = Arc::new(CountingListener::default());
        let a = delegate.subscribe(listener.clone());
        let b = delegate.subscribe(listener);
        assert_ne!(a, b);
        assert_eq!(delegate.subscriber_count(), 2);
    }

    struct SelfRemovingListener {
        delegate: Arc<RenderFinishDelegate>,
        handle: std::sync::Mutex<Option<SubscriptionHandle>>,
    }

    impl RenderFinishListener for SelfRemovingListener {
        fn on_render_finish(&self, _frame: &mut RenderFinishFrame<'_>) {
            if let Some(handle) = self.handle.lock().unwrap().take() {
                self.delegate.unsubscribe(handle);
            }
        }
    }

    #[test]
    fn test_unsubscribe_from_inside_broadcast_does_not_deadlock() {
        let delegate = Arc::new(RenderFinishDelegate::new());
        let listener = Arc::new(SelfRemovingListener {
            delegate: delegate.clone(),
            handle: std::sync::Mutex::new(None),
        });
        let handle = delegate.subscribe(listener.clone());
        *listener.handle.lock().unwrap() = Some(handle);

        assert_eq!(broadcast_once(&delegate), 1);
        assert_eq!(delegate.subscriber_count(), 0);
    }
}
