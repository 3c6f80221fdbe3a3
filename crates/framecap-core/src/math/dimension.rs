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

//! Provides structs for representing extents (sizes), origins (offsets) and
//! rectangles in pixel space.
//!
//! These types describe the dimensions of textures and the viewed region of a
//! rendered scene. They use integer components, making them suitable for
//! pixel-based coordinates and sizes.

/// A two-dimensional extent, typically representing width and height.
///
/// This is commonly used for texture dimensions and render target sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A three-dimensional extent, representing width, height, and depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent3D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
    /// The depth or number of array layers.
    pub depth_or_array_layers: u32,
}

impl From<Extent2D> for Extent3D {
    fn from(extent: Extent2D) -> Self {
        Self {
            width: extent.width,
            height: extent.height,
            depth_or_array_layers: 1,
        }
    }
}

/// A three-dimensional origin, representing an (x, y, z) offset.
///
/// Used to specify the corner of a texture region or an offset into a
/// texture array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Origin3D {
    /// The x-coordinate of the origin.
    pub x: u32,
    /// The y-coordinate of the origin.
    pub y: u32,
    /// The z-coordinate or array layer of the origin.
    pub z: u32,
}

/// An integer rectangle in pixel space, given by its top-left corner and size.
///
/// The renderer uses it to describe the sub-region of the scene color buffer
/// that holds the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IntRect {
    /// Left edge, in pixels.
    pub x: u32,
    /// Top edge, in pixels.
    pub y: u32,
    /// Width, in pixels.
    pub width: u32,
    /// Height, in pixels.
    pub height: u32,
}

impl IntRect {
    /// Creates a new rectangle.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle anchored at the origin covering the whole `extent`.
    pub const fn from_extent(extent: Extent2D) -> Self {
        Self::new(0, 0, extent.width, extent.height)
    }

    /// The size of the rectangle.
    pub const fn size(&self) -> Extent2D {
        Extent2D::new(self.width, self.height)
    }

    /// Returns `true` if the rectangle covers no pixel.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if the rectangle lies fully inside `extent`.
    pub fn fits_within(&self, extent: Extent2D) -> bool {
        self.x as u64 + self.width as u64 <= extent.width as u64
            && self.y as u64 + self.height as u64 <= extent.height as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent3d_from_extent2d() {
        let extent: Extent3D = Extent2D::new(64, 32).into();
        assert_eq!(extent.width, 64);
        assert_eq!(extent.height, 32);
        assert_eq!(extent.depth_or_array_layers, 1);
    }

    #[test]
    fn test_extent2d_empty() {
        assert!(Extent2D::new(0, 10).is_empty());
        assert!(!Extent2D::new(3, 4).is_empty());
    }

    #[test]
    fn test_int_rect_from_extent() {
        let rect = IntRect::from_extent(Extent2D::new(100, 50));
        assert_eq!(rect, IntRect::new(0, 0, 100, 50));
        assert_eq!(rect.size(), Extent2D::new(100, 50));
    }

    #[test]
    fn test_int_rect_fits_within() {
        let bounds = Extent2D::new(100, 50);
        assert!(IntRect::new(10, 10, 90, 40).fits_within(bounds));
        assert!(!IntRect::new(10, 10, 91, 40).fits_within(bounds));
        assert!(!IntRect::new(u32::MAX, 0, 1, 1).fits_within(bounds));
    }
}
