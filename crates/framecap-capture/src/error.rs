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

//! Errors raised by the capture crate.

use framecap_core::renderer::ResourceError;

/// Errors produced while configuring or running a capture.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// A GPU object could not be created, written or recorded.
    #[error("gpu resource error: {0}")]
    Resource(#[from] ResourceError),
    /// Settings JSON could not be parsed.
    #[error("settings parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
    /// An environment override held a value of the wrong type.
    #[error("invalid value '{value}' for {var}")]
    InvalidEnv {
        /// The variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_error_converts() {
        let err: CaptureError = ResourceError::NotFound.into();
        assert!(matches!(err, CaptureError::Resource(ResourceError::NotFound)));
        assert!(err.to_string().starts_with("gpu resource error"));
    }

    #[test]
    fn test_invalid_env_message() {
        let err = CaptureError::InvalidEnv {
            var: "FRAMECAP_EVERY_FRAME",
            value: "maybe".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value 'maybe' for FRAMECAP_EVERY_FRAME"
        );
    }
}
