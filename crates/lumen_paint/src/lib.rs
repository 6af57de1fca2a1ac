//! Lumen Paint primitives
//!
//! The small set of value types every Lumen drawing crate shares.
//!
//! # Features
//!
//! - RGBA colors with component-wise masking
//! - Points and rectangles
//! - 2D affine transforms with point projection
//!
//! All types are `#[repr(C)]` and implement `bytemuck::Pod`, so they can be
//! embedded directly in GPU vertex layouts.

pub mod color;
pub mod primitives;
pub mod transform;

pub use color::Color;
pub use primitives::{Point, Rect};
pub use transform::Transform2D;
