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

//! Attaches and detaches the capture listener from the render-finish
//! notification.

use crate::state::SharedCaptureState;
use framecap_core::event::{RenderFinishListener, RenderNotificationService, SubscriptionHandle};
use framecap_core::renderer::TextureRenderTarget;
use framecap_core::ServiceRegistry;
use std::sync::{Arc, Weak};

/// A live subscription and the service it was made on.
struct Binding {
    handle: SubscriptionHandle,
    service: Weak<dyn RenderNotificationService>,
}

impl Binding {
    fn is_live(&self) -> bool {
        self.service
            .upgrade()
            .is_some_and(|service| service.is_subscribed(self.handle))
    }
}

/// Keeps the listener's subscription in line with the desired capture state.
///
/// All methods run on the controlling thread. The render thread only ever
/// sees the [`SharedCaptureState`] and the listener.
pub struct CaptureBindingController {
    label: String,
    services: Arc<ServiceRegistry>,
    state: Arc<SharedCaptureState>,
    listener: Arc<dyn RenderFinishListener>,
    desired_target: Option<Arc<TextureRenderTarget>>,
    binding: Option<Binding>,
}

impl CaptureBindingController {
    /// Creates an unbound controller.
    ///
    /// The notification service is looked up in `services` as an
    /// `Arc<dyn RenderNotificationService>` each time a subscription is needed.
    pub fn new(
        label: impl Into<String>,
        services: Arc<ServiceRegistry>,
        state: Arc<SharedCaptureState>,
        listener: Arc<dyn RenderFinishListener>,
    ) -> Self {
        Self {
            label: label.into(),
            services,
            state,
            listener,
            desired_target: None,
            binding: None,
        }
    }

    /// Requests exactly one capture on the next notification.
    pub fn request_capture_once(&mut self) {
        self.state.request_one_shot();
        self.update_binding(true);
    }

    /// Records the capture cadence. The binding follows on the next tick.
    pub fn set_cadence(&mut self, every_frame: bool) {
        self.state.set_capture_every_frame(every_frame);
    }

    /// The recorded capture cadence.
    pub fn capture_every_frame(&self) -> bool {
        self.state.capture_every_frame()
    }

    /// Sets the target to publish on the next tick.
    pub fn set_desired_target(&mut self, target: Option<Arc<TextureRenderTarget>>) {
        self.desired_target = target;
    }

    /// The target that will be published on the next tick.
    pub fn desired_target(&self) -> Option<Arc<TextureRenderTarget>> {
        self.desired_target.clone()
    }

    /// Whether the listener holds a live subscription.
    pub fn is_bound(&self) -> bool {
        self.binding.as_ref().is_some_and(Binding::is_live)
    }

    /// The handle of the current subscription, live or not.
    pub fn handle(&self) -> Option<SubscriptionHandle> {
        self.binding.as_ref().map(|b| b.handle)
    }

    /// Subscribes or unsubscribes so that the bound state matches
    /// `should_be_enabled`. Calling it repeatedly with the same value is a no-op.
    pub fn update_binding(&mut self, should_be_enabled: bool) {
        let bound = self.drop_stale_binding();
        match (should_be_enabled, bound) {
            (true, false) => self.attach(),
            (false, true) => self.detach(),
            _ => {}
        }
    }

    /// Binds if per-frame capture is enabled.
    pub fn on_activate(&mut self) {
        self.update_binding(self.state.capture_every_frame());
    }

    /// Unbinds and discards any pending one-shot capture.
    pub fn on_deactivate(&mut self) {
        if self.state.clear_one_shot() {
            log::debug!("{}: discarded pending one-shot capture", self.label);
        }
        self.update_binding(false);
    }

    /// Publishes the desired target and refreshes the binding.
    pub fn on_tick(&mut self, _delta_seconds: f32) {
        if self.state.publish(&self.desired_target) {
            log::debug!(
                "{}: published target '{}'",
                self.label,
                self.desired_target
                    .as_deref()
                    .map_or("<none>", TextureRenderTarget::label)
            );
        }
        self.update_binding(self.state.wants_capture());
    }

    fn drop_stale_binding(&mut self) -> bool {
        match &self.binding {
            Some(binding) if binding.is_live() => true,
            Some(binding) => {
                log::debug!(
                    "{}: subscription {:?} is stale, forgetting it",
                    self.label,
                    binding.handle
                );
                self.binding = None;
                false
            }
            None => false,
        }
    }

    fn attach(&mut self) {
        let Some(service) = self.services.get::<Arc<dyn RenderNotificationService>>() else {
            log::debug!(
                "{}: render notification service unavailable, staying unbound",
                self.label
            );
            return;
        };
        let handle = service.subscribe(self.listener.clone());
        log::debug!("{}: bound with {:?}", self.label, handle);
        self.binding = Some(Binding {
            handle,
            service: Arc::downgrade(&service),
        });
    }

    fn detach(&mut self) {
        let Some(binding) = self.binding.take() else {
            return;
        };
        if let Some(service) = binding.service.upgrade() {
            service.unsubscribe(binding.handle);
        }
        log::debug!("{}: unbound {:?}", self.label, binding.handle);
    }
}

impl std::fmt::Debug for CaptureBindingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureBindingController")
            .field("label", &self.label)
            .field("handle", &self.handle())
            .field("has_desired_target", &self.desired_target.is_some())
            .finish()
    }
}
