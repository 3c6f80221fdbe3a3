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

//! The host-facing scene capture component.

use crate::binding::CaptureBindingController;
use crate::blit::{BlitOutcome, ResampleBlitPass};
use crate::settings::CaptureSettings;
use crate::state::SharedCaptureState;
use crate::stats::CaptureStatsSnapshot;
use framecap_core::event::{RenderFinishFrame, RenderFinishListener};
use framecap_core::lifecycle::{Activatable, Tickable};
use framecap_core::renderer::{GraphicsDevice, TextureRenderTarget};
use framecap_core::{ServiceRegistry, Stopwatch};
use std::sync::Arc;

/// The callback subscribed to the render-finish notification.
///
/// It only holds the pieces the render thread needs, so the notification
/// service never keeps the component itself alive.
struct CaptureListener {
    label: String,
    device: Arc<dyn GraphicsDevice>,
    state: Arc<SharedCaptureState>,
    blit: Arc<ResampleBlitPass>,
}

impl RenderFinishListener for CaptureListener {
    fn on_render_finish(&self, frame: &mut RenderFinishFrame<'_>) {
        if !self.state.wants_capture() {
            log::trace!("{}: frame {} not captured", self.label, frame.frame_index);
            return;
        }

        {
            let target = self.state.lock_target();
            let stopwatch = Stopwatch::new();
            match self
                .blit
                .execute(self.device.as_ref(), frame, target.as_deref())
            {
                Ok(BlitOutcome::Captured) => self
                    .state
                    .stats()
                    .record_capture(stopwatch.elapsed_us()),
                Ok(BlitOutcome::Skipped) => self.state.stats().record_skip(),
                Err(e) => {
                    log::warn!(
                        "{}: capture of frame {} failed: {e}",
                        self.label,
                        frame.frame_index
                    );
                    self.state.stats().record_failure();
                }
            }
        }

        self.state.clear_one_shot();
    }
}

/// Captures the rendered scene into a [`TextureRenderTarget`].
///
/// The host drives it through [`Activatable`] and [`Tickable`] on its
/// controlling thread. Captures are recorded on the render thread when the
/// render-finish notification fires.
///
/// Target and cadence changes are published on the next tick. A one-shot
/// [`capture_scene`](Self::capture_scene) binds immediately.
pub struct FrameCaptureComponent {
    settings: CaptureSettings,
    device: Arc<dyn GraphicsDevice>,
    state: Arc<SharedCaptureState>,
    blit: Arc<ResampleBlitPass>,
    controller: CaptureBindingController,
    active: bool,
    activated_once: bool,
}

impl FrameCaptureComponent {
    /// Creates an inactive, unbound component.
    pub fn new(
        settings: CaptureSettings,
        services: Arc<ServiceRegistry>,
        device: Arc<dyn GraphicsDevice>,
    ) -> Self {
        let state = Arc::new(SharedCaptureState::new(settings.capture_every_frame));
        let blit = Arc::new(ResampleBlitPass::new(
            settings.label.clone(),
            settings.pool_max_idle_frames,
        ));
        let listener = Arc::new(CaptureListener {
            label: settings.label.clone(),
            device: device.clone(),
            state: state.clone(),
            blit: blit.clone(),
        });
        let controller =
            CaptureBindingController::new(settings.label.clone(), services, state.clone(), listener);

        Self {
            settings,
            device,
            state,
            blit,
            controller,
            active: false,
            activated_once: false,
        }
    }

    /// The settings the component was created with.
    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Enables or disables capturing on every frame.
    pub fn set_capture_every_frame(&mut self, every_frame: bool) {
        self.controller.set_cadence(every_frame);
    }

    /// Whether every frame is captured.
    pub fn capture_every_frame(&self) -> bool {
        self.controller.capture_every_frame()
    }

    /// Sets the texture captures are written into. Takes effect on the next tick.
    pub fn set_texture_target(&mut self, target: Option<Arc<TextureRenderTarget>>) {
        self.controller.set_desired_target(target);
    }

    /// The texture captures will be written into.
    pub fn texture_target(&self) -> Option<Arc<TextureRenderTarget>> {
        self.controller.desired_target()
    }

    /// The texture currently visible to the render thread.
    pub fn published_target(&self) -> Option<Arc<TextureRenderTarget>> {
        self.state.published_target()
    }

    /// Captures the next rendered frame once, whatever the cadence.
    ///
    /// Ignored while the component is inactive, unless it is about to
    /// auto-activate on its first tick.
    pub fn capture_scene(&mut self) {
        if !self.active && !self.awaiting_auto_activation() {
            log::debug!("{}: inactive, ignoring capture request", self.settings.label);
            return;
        }
        self.controller.request_capture_once();
    }

    /// Whether a one-shot capture is still waiting for a frame.
    pub fn capture_pending(&self) -> bool {
        self.state.one_shot_pending()
    }

    /// Whether the component is subscribed to the render-finish notification.
    pub fn is_bound(&self) -> bool {
        self.controller.is_bound()
    }

    /// Capture counters.
    pub fn stats(&self) -> CaptureStatsSnapshot {
        self.state.stats().snapshot()
    }

    /// The blit pass, for inspecting its pool and pipeline cache.
    pub fn blit_pass(&self) -> &ResampleBlitPass {
        &self.blit
    }

    fn awaiting_auto_activation(&self) -> bool {
        self.settings.auto_activate && !self.activated_once
    }
}

impl Activatable for FrameCaptureComponent {
    fn on_activate(&mut self) {
        self.active = true;
        self.activated_once = true;
        self.controller.on_activate();
    }

    fn on_deactivate(&mut self) {
        self.active = false;
        self.controller.on_deactivate();
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Tickable for FrameCaptureComponent {
    fn tick(&mut self, delta_seconds: f32) {
        if !self.active {
            if !self.awaiting_auto_activation() {
                return;
            }
            log::debug!("{}: auto-activating", self.settings.label);
            self.on_activate();
        }

        self.controller.on_tick(delta_seconds);

        let freed = self.blit.pool().tick(self.device.as_ref());
        if freed > 0 {
            log::trace!("{}: freed {freed} idle surfaces", self.settings.label);
        }
    }
}

impl Drop for FrameCaptureComponent {
    fn drop(&mut self) {
        self.controller.on_deactivate();
        let failures = self.blit.shutdown(self.device.as_ref());
        if failures > 0 {
            log::warn!(
                "{}: {failures} GPU objects could not be released",
                self.settings.label
            );
        }
    }
}

impl std::fmt::Debug for FrameCaptureComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCaptureComponent")
            .field("label", &self.settings.label)
            .field("active", &self.active)
            .field("controller", &self.controller)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecap_core::event::{RenderFinishDelegate, RenderNotificationService};
    use framecap_core::testing::RecordingDevice;

    fn component(settings: CaptureSettings) -> (Arc<RenderFinishDelegate>, FrameCaptureComponent) {
        let delegate = Arc::new(RenderFinishDelegate::new());
        let services = Arc::new(ServiceRegistry::new());
        services.insert::<Arc<dyn RenderNotificationService>>(delegate.clone());
        let device: Arc<dyn GraphicsDevice> = Arc::new(RecordingDevice::new());
        (delegate, FrameCaptureComponent::new(settings, services, device))
    }

    #[test]
    fn test_new_component_is_unbound_and_inactive() {
        let (delegate, component) = component(CaptureSettings::default());
        assert!(!component.is_active());
        assert!(!component.is_bound());
        assert!(component.capture_every_frame());
        assert!(component.texture_target().is_none());
        assert_eq!(delegate.subscriber_count(), 0);
    }

    #[test]
    fn test_auto_activation_on_first_tick() {
        let (delegate, mut component) = component(CaptureSettings::default());
        component.tick(0.016);
        assert!(component.is_active());
        assert!(component.is_bound());
        assert_eq!(delegate.subscriber_count(), 1);
    }

    #[test]
    fn test_no_auto_activation_after_explicit_deactivate() {
        let (delegate, mut component) = component(CaptureSettings::default());
        component.on_activate();
        component.on_deactivate();
        component.tick(0.016);
        assert!(!component.is_active());
        assert_eq!(delegate.subscriber_count(), 0);
    }

    #[test]
    fn test_auto_activation_disabled() {
        let (delegate, mut component) = component(CaptureSettings {
            auto_activate: false,
            ..Default::default()
        });
        component.tick(0.016);
        assert!(!component.is_active());
        assert_eq!(delegate.subscriber_count(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let (delegate, mut component) = component(CaptureSettings::default());
        component.on_activate();
        assert_eq!(delegate.subscriber_count(), 1);
        drop(component);
        assert_eq!(delegate.subscriber_count(), 0);
    }
}
