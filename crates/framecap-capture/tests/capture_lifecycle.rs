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

use framecap_capture::{CaptureSettings, FrameCaptureComponent};
use framecap_core::event::{RenderFinishDelegate, RenderFinishFrame, RenderNotificationService};
use framecap_core::lifecycle::{Activatable, Tickable};
use framecap_core::math::{Extent2D, IntRect};
use framecap_core::renderer::{
    GraphicsDevice, TextureDescriptor, TextureFormat, TextureRenderTarget, TextureUsage,
    TextureViewDescriptor, TextureViewId,
};
use framecap_core::testing::{RecordedCommand, RecordingDevice};
use framecap_core::ServiceRegistry;
use std::sync::Arc;

const DT: f32 = 1.0 / 60.0;

struct Harness {
    device: Arc<RecordingDevice>,
    delegate: Arc<RenderFinishDelegate>,
    services: Arc<ServiceRegistry>,
    scene_view: TextureViewId,
    scene_size: Extent2D,
    frame_index: u64,
}

impl Harness {
    fn new() -> Self {
        let harness = Self::without_service();
        harness
            .services
            .insert::<Arc<dyn RenderNotificationService>>(harness.delegate.clone());
        harness
    }

    fn without_service() -> Self {
        let device = Arc::new(RecordingDevice::new());
        let scene_size = Extent2D::new(100, 50);
        let scene = device
            .create_texture(&TextureDescriptor::new_2d(
                "scene color",
                scene_size.into(),
                TextureFormat::Rgba8Unorm,
                TextureUsage::TEXTURE_BINDING | TextureUsage::RENDER_ATTACHMENT,
            ))
            .unwrap();
        let scene_view = device
            .create_texture_view(scene, &TextureViewDescriptor::default())
            .unwrap();
        Self {
            device,
            delegate: Arc::new(RenderFinishDelegate::new()),
            services: Arc::new(ServiceRegistry::new()),
            scene_view,
            scene_size,
            frame_index: 0,
        }
    }

    fn component(&self, settings: CaptureSettings) -> FrameCaptureComponent {
        let device: Arc<dyn GraphicsDevice> = self.device.clone();
        FrameCaptureComponent::new(settings, self.services.clone(), device)
    }

    fn target(&self, width: u32, height: u32) -> Arc<TextureRenderTarget> {
        let target = TextureRenderTarget::new(
            Extent2D::new(width, height),
            TextureFormat::Rgba8Unorm,
            false,
        );
        target.init_resource(self.device.as_ref()).unwrap();
        Arc::new(target)
    }

    /// Fires one render-finish notification and submits the frame.
    fn render(&mut self) -> usize {
        self.frame_index += 1;
        let mut encoder = self.device.create_command_encoder(Some("frame"));
        let notified = {
            let mut frame = RenderFinishFrame {
                encoder: encoder.as_mut(),
                scene_color: self.scene_view,
                scene_size: self.scene_size,
                view_rect: IntRect::from_extent(self.scene_size),
                frame_index: self.frame_index,
            };
            self.delegate.broadcast(&mut frame)
        };
        self.device.submit_command_buffer(encoder.finish());
        notified
    }

    fn copies_into(&self, target: &TextureRenderTarget) -> usize {
        let texture = target.resource().unwrap().texture;
        self.device
            .commands()
            .iter()
            .filter(|c| {
                matches!(c, RecordedCommand::CopyTextureToTexture { destination, .. } if *destination == texture)
            })
            .count()
    }
}

fn on_demand() -> CaptureSettings {
    CaptureSettings {
        capture_every_frame: false,
        ..Default::default()
    }
}

#[test]
fn test_repeated_activation_keeps_one_subscription() {
    let harness = Harness::new();
    let mut component = harness.component(CaptureSettings::default());

    component.on_activate();
    component.on_activate();
    component.tick(DT);
    component.tick(DT);
    assert!(component.is_bound());
    assert_eq!(harness.delegate.subscriber_count(), 1);

    component.on_deactivate();
    assert!(!component.is_bound());
    assert_eq!(harness.delegate.subscriber_count(), 0);
}

#[test]
fn test_one_shot_captures_exactly_once() {
    let mut harness = Harness::new();
    let mut component = harness.component(on_demand());
    let target = harness.target(50, 50);

    component.on_activate();
    component.set_texture_target(Some(target.clone()));
    component.tick(DT);
    assert!(!component.is_bound());

    component.capture_scene();
    assert!(component.is_bound());
    assert!(component.capture_pending());

    assert_eq!(harness.render(), 1);
    assert_eq!(harness.copies_into(&target), 1);
    assert!(!component.capture_pending());

    // Still subscribed until the next tick, but nothing is captured.
    assert_eq!(harness.render(), 1);
    assert_eq!(harness.copies_into(&target), 1);

    component.tick(DT);
    assert!(!component.is_bound());
    assert_eq!(component.stats().captures, 1);
}

#[test]
fn test_only_last_target_is_published() {
    let mut harness = Harness::new();
    let mut component = harness.component(CaptureSettings::default());
    let first = harness.target(32, 32);
    let second = harness.target(64, 64);

    component.on_activate();
    component.set_texture_target(Some(first.clone()));
    component.set_texture_target(Some(second.clone()));
    assert!(component.published_target().is_none());

    component.tick(DT);
    let published = component.published_target().unwrap();
    assert!(Arc::ptr_eq(&published, &second));

    harness.render();
    assert_eq!(harness.copies_into(&first), 0);
    assert_eq!(harness.copies_into(&second), 1);
}

#[test]
fn test_turning_off_cadence_unbinds_on_next_tick() {
    let harness = Harness::new();
    let mut component = harness.component(CaptureSettings::default());
    component.on_activate();
    component.tick(DT);
    assert!(component.is_bound());

    component.set_capture_every_frame(false);
    assert!(component.is_bound());
    component.tick(DT);
    assert!(!component.is_bound());
    assert_eq!(harness.delegate.subscriber_count(), 0);
}

#[test]
fn test_pending_one_shot_keeps_binding_after_cadence_off() {
    let mut harness = Harness::new();
    let mut component = harness.component(CaptureSettings::default());
    let target = harness.target(50, 50);
    component.on_activate();
    component.set_texture_target(Some(target.clone()));
    component.tick(DT);

    component.set_capture_every_frame(false);
    component.capture_scene();
    component.tick(DT);
    assert!(component.is_bound());

    harness.render();
    component.tick(DT);
    assert!(!component.is_bound());
    assert_eq!(harness.copies_into(&target), 1);
}

#[test]
fn test_missing_target_is_a_no_op() {
    let mut harness = Harness::new();
    let mut component = harness.component(on_demand());
    component.on_activate();
    component.capture_scene();

    harness.render();
    assert!(harness.device.commands().is_empty());
    assert!(!component.capture_pending());
    let stats = component.stats();
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.captures, 0);
}

#[test]
fn test_deactivate_discards_pending_capture() {
    let mut harness = Harness::new();
    let mut component = harness.component(on_demand());
    component.set_texture_target(Some(harness.target(8, 8)));
    component.on_activate();
    component.tick(DT);
    component.capture_scene();
    component.on_deactivate();

    assert!(!component.capture_pending());
    assert_eq!(harness.render(), 0);
    assert!(harness.device.commands().is_empty());
}

#[test]
fn test_capture_request_after_deactivate_is_ignored() {
    let mut harness = Harness::new();
    let mut component = harness.component(on_demand());
    component.set_texture_target(Some(harness.target(8, 8)));
    component.on_activate();
    component.on_deactivate();

    component.capture_scene();
    for _ in 0..5 {
        component.tick(DT);
    }
    assert!(!component.is_active());
    assert!(!component.is_bound());
    assert!(!component.capture_pending());
    assert_eq!(harness.delegate.subscriber_count(), 0);
    assert_eq!(harness.render(), 0);
    assert_eq!(component.stats().skipped, 0);
}

#[test]
fn test_capture_request_without_activation_is_ignored() {
    let harness = Harness::new();
    let mut component = harness.component(CaptureSettings {
        auto_activate: false,
        ..on_demand()
    });
    component.capture_scene();
    component.tick(DT);
    assert!(!component.is_bound());
    assert_eq!(harness.delegate.subscriber_count(), 0);
}

#[test]
fn test_capture_request_before_auto_activation_is_kept() {
    let mut harness = Harness::new();
    let mut component = harness.component(on_demand());
    let target = harness.target(8, 8);
    component.set_texture_target(Some(target.clone()));

    component.capture_scene();
    assert!(component.capture_pending());
    component.tick(DT);
    assert!(component.is_active());

    assert_eq!(harness.render(), 1);
    assert_eq!(harness.copies_into(&target), 1);
    component.tick(DT);
    assert!(!component.is_bound());
}

#[test]
fn test_binds_once_service_appears() {
    let harness = Harness::without_service();
    let mut component = harness.component(CaptureSettings::default());
    component.on_activate();
    component.tick(DT);
    assert!(!component.is_bound());

    harness
        .services
        .insert::<Arc<dyn RenderNotificationService>>(harness.delegate.clone());
    component.tick(DT);
    assert!(component.is_bound());
    assert_eq!(harness.delegate.subscriber_count(), 1);
}

#[test]
fn test_stale_subscription_is_replaced() {
    let harness = Harness::without_service();
    let old = Arc::new(RenderFinishDelegate::new());
    harness
        .services
        .insert::<Arc<dyn RenderNotificationService>>(old.clone());
    let mut component = harness.component(CaptureSettings::default());
    component.on_activate();
    assert_eq!(old.subscriber_count(), 1);

    // The renderer is recreated with a fresh delegate.
    harness
        .services
        .insert::<Arc<dyn RenderNotificationService>>(harness.delegate.clone());
    drop(old);
    assert!(!component.is_bound());

    component.tick(DT);
    assert!(component.is_bound());
    assert_eq!(harness.delegate.subscriber_count(), 1);
}

#[test]
fn test_gpu_failure_is_counted_not_propagated() {
    let mut harness = Harness::new();
    let mut component = harness.component(on_demand());
    component.set_texture_target(Some(harness.target(16, 16)));
    component.on_activate();
    component.tick(DT);
    component.capture_scene();

    harness.device.set_fail_texture_creation(true);
    harness.render();

    assert!(!component.capture_pending());
    assert_eq!(component.stats().failed, 1);
    assert_eq!(component.stats().captures, 0);
}

#[test]
fn test_drop_releases_gpu_objects() {
    let mut harness = Harness::new();
    let target = harness.target(16, 16);
    let baseline = harness.device.live_object_count();
    {
        let mut component = harness.component(CaptureSettings::default());
        component.set_texture_target(Some(target));
        component.tick(DT);
        harness.render();
        assert!(harness.device.live_object_count() > baseline);
    }
    assert_eq!(harness.delegate.subscriber_count(), 0);
    assert_eq!(harness.device.live_object_count(), baseline);
}

#[test]
fn test_render_thread_broadcasts_while_ticking() {
    let mut harness = Harness::new();
    let target = harness.target(25, 25);
    let mut component = harness.component(CaptureSettings::default());
    component.set_texture_target(Some(target.clone()));
    component.tick(DT);

    let device = harness.device.clone();
    let delegate = harness.delegate.clone();
    let scene_view = harness.scene_view;
    let scene_size = harness.scene_size;
    let render_thread = std::thread::spawn(move || {
        for frame_index in 0..200 {
            let mut encoder = device.create_command_encoder(None);
            {
                let mut frame = RenderFinishFrame {
                    encoder: encoder.as_mut(),
                    scene_color: scene_view,
                    scene_size,
                    view_rect: IntRect::from_extent(scene_size),
                    frame_index,
                };
                delegate.broadcast(&mut frame);
            }
            device.submit_command_buffer(encoder.finish());
        }
    });

    for i in 0..200 {
        component.set_capture_every_frame(i % 3 != 0);
        if i % 7 == 0 {
            component.capture_scene();
        }
        component.tick(DT);
    }
    render_thread.join().unwrap();

    component.on_deactivate();
    assert_eq!(harness.delegate.subscriber_count(), 0);
    let stats = component.stats();
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.captures as usize, harness.copies_into(&target));

    // Nothing captures once unbound.
    let before = harness.copies_into(&target);
    harness.render();
    assert_eq!(harness.copies_into(&target), before);
}
