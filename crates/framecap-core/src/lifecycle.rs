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

//! Capabilities a host exposes to its components.
//!
//! Components do not inherit from an engine base type. Instead they implement
//! the capabilities they need and the host drives them through these traits.

/// A component that can be switched on and off by its host.
pub trait Activatable {
    /// Called when the host activates the component.
    fn on_activate(&mut self);

    /// Called when the host deactivates the component or before it is destroyed.
    fn on_deactivate(&mut self);

    /// Returns `true` between `on_activate` and `on_deactivate`.
    fn is_active(&self) -> bool;
}

/// A component updated once per frame on the controlling thread.
pub trait Tickable {
    /// Advances the component by `delta_seconds`.
    fn tick(&mut self, delta_seconds: f32);
}
