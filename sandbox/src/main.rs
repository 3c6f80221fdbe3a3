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

//! Headless capture demo.
//!
//! Usage: `sandbox [OUTPUT.png] [FRAMES] [SCENE_WxH] [TARGET_WxH]`
//!
//! Renders a moving gradient into an offscreen "scene" texture, lets a
//! `FrameCaptureComponent` resample it into a render target every frame and
//! writes the last captured frame to disk.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use env_logger::{Builder, Env};
use framecap_capture::{CaptureSettings, FrameCaptureComponent};
use framecap_core::event::{RenderFinishDelegate, RenderFinishFrame, RenderNotificationService};
use framecap_core::lifecycle::{Activatable, Tickable};
use framecap_core::math::{Extent2D, IntRect, Origin3D};
use framecap_core::renderer::{
    GraphicsDevice, TextureDescriptor, TextureFormat, TextureId, TextureRenderTarget,
    TextureUsage, TextureViewDescriptor,
};
use framecap_core::ServiceRegistry;
use framecap_infra::WgpuDevice;

const FRAME_DT: f32 = 1.0 / 60.0;

struct Args {
    output: PathBuf,
    frames: u64,
    scene_size: Extent2D,
    target_size: Extent2D,
}

fn parse_extent(text: &str) -> Result<Extent2D> {
    let (w, h) = text
        .split_once('x')
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got '{text}'"))?;
    let extent = Extent2D::new(w.trim().parse()?, h.trim().parse()?);
    if extent.is_empty() {
        bail!("extent '{text}' has a zero dimension");
    }
    Ok(extent)
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("capture.png"));
    let frames = match args.next() {
        Some(n) => n.parse().context("frame count must be an integer")?,
        None => 3,
    };
    let scene_size = match args.next() {
        Some(text) => parse_extent(&text)?,
        None => Extent2D::new(320, 180),
    };
    let target_size = match args.next() {
        Some(text) => parse_extent(&text)?,
        None => Extent2D::new(128, 128),
    };
    Ok(Args {
        output,
        frames,
        scene_size,
        target_size,
    })
}

/// A diagonal gradient that scrolls horizontally with the frame index.
fn scene_pixels(size: Extent2D, frame: u64) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size.width * size.height * 4) as usize);
    let shift = (frame * 8) as u32;
    for y in 0..size.height {
        for x in 0..size.width {
            let u = ((x + shift) % size.width) as f32 / size.width as f32;
            let v = y as f32 / size.height as f32;
            pixels.extend_from_slice(&[
                (u * 255.0) as u8,
                (v * 255.0) as u8,
                ((1.0 - u) * 255.0) as u8,
                255,
            ]);
        }
    }
    pixels
}

fn upload_scene(
    device: &WgpuDevice,
    texture: TextureId,
    size: Extent2D,
    frame: u64,
) -> Result<()> {
    device.write_texture(
        texture,
        &scene_pixels(size, frame),
        Some(size.width * 4),
        Origin3D::default(),
        size.into(),
    )?;
    Ok(())
}

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .filter_module("wgpu_core", log::LevelFilter::Warn)
        .init();
    let args = parse_args()?;

    let device = WgpuDevice::new_headless().context("failed to open a headless wgpu device")?;
    let info = device.get_adapter_info();
    log::info!(
        "Adapter: {} ({:?}, {:?})",
        info.name,
        info.backend_type,
        info.device_type
    );
    let gpu: Arc<dyn GraphicsDevice> = Arc::new(device.clone());

    let scene = device.create_texture(&TextureDescriptor::new_2d(
        "Sandbox Scene Color",
        args.scene_size.into(),
        TextureFormat::Rgba8Unorm,
        TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
    ))?;
    let scene_view = device.create_texture_view(scene, &TextureViewDescriptor::default())?;

    let delegate = Arc::new(RenderFinishDelegate::new());
    let services = Arc::new(ServiceRegistry::new());
    services.insert::<Arc<dyn RenderNotificationService>>(delegate.clone());

    let target = TextureRenderTarget::new(args.target_size, TextureFormat::Rgba8Unorm, false)
        .with_label("Sandbox Capture Target");
    target.init_resource(gpu.as_ref())?;
    let target = Arc::new(target);

    let settings = CaptureSettings::from_env()?;
    log::info!("Capture settings: {}", serde_json::to_string(&settings)?);
    let mut component = FrameCaptureComponent::new(settings, services, gpu.clone());
    component.set_texture_target(Some(target.clone()));
    if !component.settings().auto_activate {
        component.on_activate();
    }

    for frame_index in 1..=args.frames {
        upload_scene(&device, scene, args.scene_size, frame_index)?;
        // On-demand cadence still grabs the last frame.
        if frame_index == args.frames && !component.capture_every_frame() {
            component.capture_scene();
        }
        component.tick(FRAME_DT);

        let mut encoder = gpu.create_command_encoder(Some("Sandbox Frame Encoder"));
        let notified = {
            let mut frame = RenderFinishFrame {
                encoder: encoder.as_mut(),
                scene_color: scene_view,
                scene_size: args.scene_size,
                view_rect: IntRect::from_extent(args.scene_size),
                frame_index,
            };
            delegate.broadcast(&mut frame)
        };
        gpu.submit_command_buffer(encoder.finish());
        log::debug!("Frame {frame_index}: {notified} listener(s) notified");
    }
    device.wait_idle()?;

    let texture = target
        .resource()
        .ok_or_else(|| anyhow!("capture target lost its GPU resource"))?
        .texture;
    let pixels = device.read_texture(texture)?;
    let size = args.target_size;
    let image = image::RgbaImage::from_raw(size.width, size.height, pixels)
        .ok_or_else(|| anyhow!("readback size does not match the target"))?;
    image
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!("Wrote {}", args.output.display());

    println!("{}", serde_json::to_string_pretty(&component.stats())?);

    component.on_deactivate();
    target.release_resource(gpu.as_ref())?;
    device.destroy_texture_view(scene_view)?;
    device.destroy_texture(scene)?;
    Ok(())
}
