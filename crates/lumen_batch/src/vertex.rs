//! Vertex layouts
//!
//! Both layouts are `#[repr(C)]` and `bytemuck::Pod` so a geometry buffer can
//! be handed to a GPU upload as raw bytes.

use lumen_paint::{Color, Point};

/// A fully featured vertex: position, color and picture sampling
///
/// Layout (36 bytes):
/// - position: `vec2<f32>`
/// - color: `vec4<f32>`
/// - picture: `vec2<f32>` - coordinates inside the bound picture
/// - intensity: `f32` - 0.0 draws plain color, 1.0 samples the picture fully
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    pub position: Point,
    pub color: Color,
    pub picture: Point,
    pub intensity: f32,
}

impl Vertex {
    pub const fn new(position: Point, color: Color, picture: Point, intensity: f32) -> Self {
        Self {
            position,
            color,
            picture,
            intensity,
        }
    }

    /// Untextured vertex
    pub const fn colored(position: Point, color: Color) -> Self {
        Self::new(position, color, Point::ZERO, 0.0)
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::colored(Point::ZERO, Color::WHITE)
    }
}

/// A vertex without picture sampling, for solid shapes
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatVertex {
    pub position: Point,
    pub color: Color,
}

impl FlatVertex {
    pub const fn new(position: Point, color: Color) -> Self {
        Self { position, color }
    }
}

impl Default for FlatVertex {
    fn default() -> Self {
        Self::new(Point::ZERO, Color::WHITE)
    }
}

impl From<FlatVertex> for Vertex {
    fn from(v: FlatVertex) -> Self {
        Vertex::colored(v.position, v.color)
    }
}
