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

//! Embedded shader sources.

/// Resample shader: a pass-through fullscreen triangle (`vs_main`) and a
/// single bilinear texture fetch (`fs_main`).
///
/// Bindings of group 0:
/// - `0`: source texture (`texture_2d<f32>`, fragment)
/// - `1`: filtering sampler (fragment)
/// - `2`: `BlitUniforms { uv_offset, uv_scale }` (vertex)
pub const RESAMPLE_WGSL: &str = include_str!("resample.wgsl");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_shader_valid() {
        assert!(RESAMPLE_WGSL.contains("@vertex"));
        assert!(RESAMPLE_WGSL.contains("@fragment"));
        assert!(RESAMPLE_WGSL.contains("fn vs_main"));
        assert!(RESAMPLE_WGSL.contains("fn fs_main"));
    }
}
