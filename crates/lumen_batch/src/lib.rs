//! Lumen Batch
//!
//! Draw batching for 2D sprites and vector shapes: geometry from many
//! objects that share one picture is merged into a single buffer, so a
//! renderer can issue one draw call instead of many.
//!
//! # Overview
//!
//! - [`Triangles`] / [`TrianglesBuffer`]: geometry buffers with aliasing range
//!   views and narrowing field copies
//! - [`Picture`]: identity-compared handle to an image source
//! - [`Drawer`]: a buffer bound to one picture, with dirty tracking for
//!   downstream caches
//! - [`Batch`]: accumulates geometry, baking its transform and color mask in
//!   at merge time
//! - [`BatchTriangles`] / [`BatchPicture`]: per-draw proxies bound to a batch
//! - [`Sprite`]: a picture frame drawn as a quad
//!
//! Nothing in this crate is thread-aware. Batches and their proxies are
//! `!Send`; keep them on the render thread.

pub mod batch;
pub mod drawer;
pub mod error;
pub mod picture;
pub mod sprite;
pub mod triangles;
pub mod vertex;

pub use batch::{Batch, BatchId, BatchPicture, BatchTriangles};
pub use drawer::{DirtyFlag, Drawer, Ingest, RenderTarget};
pub use error::{BatchError, ErrorKind, GeometryError, Result};
pub use picture::{Picture, PictureData, PictureSource};
pub use sprite::Sprite;
pub use triangles::{
    FlatTrianglesData, FlatTrianglesView, Triangles, TrianglesBuffer, TrianglesData,
    TrianglesView,
};
pub use vertex::{FlatVertex, Vertex};
