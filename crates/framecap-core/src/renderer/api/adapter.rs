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

//! Information about the physical adapter behind a `GraphicsDevice`.

/// The graphics API a device was created on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphicsBackendType {
    /// Vulkan.
    Vulkan,
    /// Apple Metal.
    Metal,
    /// DirectX 12.
    Dx12,
    /// OpenGL / GLES.
    OpenGL,
    /// WebGPU running inside a browser.
    WebGpu,
    /// Any other or unknown backend (including test doubles).
    Unknown,
}

/// The kind of physical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererDeviceType {
    /// A GPU integrated with the CPU.
    IntegratedGpu,
    /// A dedicated GPU.
    DiscreteGpu,
    /// A virtualized GPU.
    VirtualGpu,
    /// A software rasterizer.
    Cpu,
    /// Unknown device type.
    Unknown,
}

/// Describes the adapter a device runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererAdapterInfo {
    /// Human-readable adapter name.
    pub name: String,
    /// Backend API in use.
    pub backend_type: GraphicsBackendType,
    /// Physical device kind.
    pub device_type: RendererDeviceType,
}
