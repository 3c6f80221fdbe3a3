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
use framecap_core::lifecycle::Tickable;
use framecap_core::math::{Extent2D, IntRect};
use framecap_core::renderer::{
    GraphicsDevice, TextureDescriptor, TextureFormat, TextureRenderTarget, TextureUsage,
    TextureViewDescriptor,
};
use framecap_core::testing::RecordingDevice;
use framecap_core::ServiceRegistry;
use std::sync::Arc;

fn setup(
    max_idle_frames: u64,
) -> (
    Arc<RecordingDevice>,
    Arc<RenderFinishDelegate>,
    FrameCaptureComponent,
) {
    let device = Arc::new(RecordingDevice::new());
    let delegate = Arc::new(RenderFinishDelegate::new());
    let services = Arc::new(ServiceRegistry::new());
    services.insert::<Arc<dyn RenderNotificationService>>(delegate.clone());
    let settings = CaptureSettings {
        pool_max_idle_frames: max_idle_frames,
        ..Default::default()
    };
    let dyn_device: Arc<dyn GraphicsDevice> = device.clone();
    let component = FrameCaptureComponent::new(settings, services, dyn_device);
    (device, delegate, component)
}

fn render(device: &RecordingDevice, delegate: &RenderFinishDelegate) {
    let size = Extent2D::new(128, 72);
    let texture = device
        .create_texture(&TextureDescriptor::new_2d(
            "scene color",
            size.into(),
            TextureFormat::Rgba8Unorm,
            TextureUsage::TEXTURE_BINDING,
        ))
        .unwrap();
    let view = device
        .create_texture_view(texture, &TextureViewDescriptor::default())
        .unwrap();

    let mut encoder = device.create_command_encoder(None);
    {
        let mut frame = RenderFinishFrame {
            encoder: encoder.as_mut(),
            scene_color: view,
            scene_size: size,
            view_rect: IntRect::from_extent(size),
            frame_index: 0,
        };
        delegate.broadcast(&mut frame);
    }
    device.submit_command_buffer(encoder.finish());

    device.destroy_texture_view(view).unwrap();
    device.destroy_texture(texture).unwrap();
}

fn target(device: &RecordingDevice, size: Extent2D) -> Arc<TextureRenderTarget> {
    let target = TextureRenderTarget::new(size, TextureFormat::Bgra8Unorm, false);
    target.init_resource(device).unwrap();
    Arc::new(target)
}

#[test]
fn test_surface_reused_across_frames() {
    let (device, delegate, mut component) = setup(8);
    component.set_texture_target(Some(target(&device, Extent2D::new(64, 36))));

    component.tick(0.016);
    render(&device, &delegate);
    let created = device.created_texture_count();

    for _ in 0..5 {
        component.tick(0.016);
        render(&device, &delegate);
    }

    // Each frame creates one scene texture; the capture surface is reused.
    assert_eq!(device.created_texture_count(), created + 5);
    assert_eq!(component.blit_pass().pool().len(), 1);
    assert_eq!(component.stats().captures, 6);
}

#[test]
fn test_new_size_gets_new_surface() {
    let (device, delegate, mut component) = setup(8);
    component.set_texture_target(Some(target(&device, Extent2D::new(64, 36))));
    component.tick(0.016);
    render(&device, &delegate);

    component.set_texture_target(Some(target(&device, Extent2D::new(32, 18))));
    component.tick(0.016);
    render(&device, &delegate);

    let pool = component.blit_pass().pool();
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.free_count(), 2);
    assert_eq!(component.blit_pass().pipeline_count(), 1);
}

#[test]
fn test_idle_surfaces_are_aged_out() {
    let (device, delegate, mut component) = setup(2);
    component.set_texture_target(Some(target(&device, Extent2D::new(64, 36))));
    component.tick(0.016);
    render(&device, &delegate);
    assert_eq!(component.blit_pass().pool().len(), 1);

    component.set_capture_every_frame(false);
    for _ in 0..4 {
        component.tick(0.016);
    }
    assert!(component.blit_pass().pool().is_empty());
    assert_eq!(device.live_texture_count(), 1);
}
