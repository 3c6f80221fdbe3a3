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

//! # Framecap Capture
//!
//! Captures the rendered scene into an offscreen texture.
//!
//! [`FrameCaptureComponent`] subscribes to the renderer's render-finish
//! notification while a capture is wanted and, on the render thread,
//! resamples the scene color buffer into the published
//! [`TextureRenderTarget`](framecap_core::renderer::TextureRenderTarget)
//! with a fullscreen bilinear blit.

pub mod binding;
pub mod blit;
pub mod component;
pub mod error;
pub mod settings;
pub mod shaders;
pub mod state;
pub mod stats;

pub use binding::CaptureBindingController;
pub use blit::{BlitOutcome, BlitUniforms, CaptureDescriptor, ResampleBlitPass};
pub use component::FrameCaptureComponent;
pub use error::CaptureError;
pub use settings::CaptureSettings;
pub use state::SharedCaptureState;
pub use stats::{CaptureStats, CaptureStatsSnapshot};
