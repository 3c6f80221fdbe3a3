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

//! Capture configuration.

use crate::error::CaptureError;
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`CaptureSettings::capture_every_frame`].
pub const ENV_EVERY_FRAME: &str = "FRAMECAP_EVERY_FRAME";
/// Environment variable overriding [`CaptureSettings::auto_activate`].
pub const ENV_AUTO_ACTIVATE: &str = "FRAMECAP_AUTO_ACTIVATE";
/// Environment variable overriding [`CaptureSettings::pool_max_idle_frames`].
pub const ENV_POOL_MAX_IDLE_FRAMES: &str = "FRAMECAP_POOL_MAX_IDLE_FRAMES";

/// Settings of a [`FrameCaptureComponent`](crate::FrameCaptureComponent).
///
/// Missing JSON fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Capture on every render-finish notification.
    pub capture_every_frame: bool,
    /// Activate on the first tick if the host never activated the component.
    pub auto_activate: bool,
    /// Frames a free pooled surface may stay idle before being destroyed.
    pub pool_max_idle_frames: u64,
    /// Label used for GPU objects and log lines.
    pub label: String,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            capture_every_frame: true,
            auto_activate: true,
            pool_max_idle_frames: 8,
            label: "FrameCapture".to_string(),
        }
    }
}

impl CaptureSettings {
    /// Parses settings from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, CaptureError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Default settings with overrides read from the process environment.
    pub fn from_env() -> Result<Self, CaptureError> {
        let mut settings = Self::default();
        settings.apply_env_overrides(|var| std::env::var(var).ok())?;
        Ok(settings)
    }

    /// Applies overrides looked up through `lookup`. Unset variables are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), CaptureError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_EVERY_FRAME) {
            self.capture_every_frame = parse_bool(ENV_EVERY_FRAME, value)?;
        }
        if let Some(value) = lookup(ENV_AUTO_ACTIVATE) {
            self.auto_activate = parse_bool(ENV_AUTO_ACTIVATE, value)?;
        }
        if let Some(value) = lookup(ENV_POOL_MAX_IDLE_FRAMES) {
            self.pool_max_idle_frames = value
                .trim()
                .parse()
                .map_err(|_| CaptureError::InvalidEnv {
                    var: ENV_POOL_MAX_IDLE_FRAMES,
                    value,
                })?;
        }
        Ok(())
    }
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, CaptureError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CaptureError::InvalidEnv { var, value }),
    }
}
