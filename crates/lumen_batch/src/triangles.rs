//! Geometry buffers
//!
//! [`Triangles`] is the capability set every geometry buffer exposes: length,
//! aliasing range views, a narrowing field copy and deep copies. Fields a
//! buffer does not carry are reported as `None` by the per-vertex accessors,
//! and [`Triangles::update`] only touches fields both sides carry.
//!
//! Views returned by [`Triangles::slice`] borrow the parent mutably, so the
//! parent cannot be resized while a view is alive.

use std::fmt;
use std::ops::Range;

use lumen_paint::{Color, Point};

use crate::error::GeometryError;
use crate::vertex::{FlatVertex, Vertex};

/// A run of vertices, three per triangle
pub trait Triangles: fmt::Debug {
    /// Number of vertices
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutable view over `range`. Writes through the view land in this buffer.
    fn slice(&mut self, range: Range<usize>) -> Result<Box<dyn Triangles + '_>, GeometryError>;

    /// Copy every field both buffers carry from `source`.
    ///
    /// Fails without writing anything when the lengths differ.
    fn update(&mut self, source: &dyn Triangles) -> Result<(), GeometryError>;

    /// Independent buffer with identical contents
    fn copy(&self) -> Box<dyn TrianglesBuffer>;

    fn position(&self, _i: usize) -> Option<Point> {
        None
    }

    fn color(&self, _i: usize) -> Option<Color> {
        None
    }

    /// Picture coordinates and sampling intensity
    fn picture(&self, _i: usize) -> Option<(Point, f32)> {
        None
    }

    /// Contiguous full vertices, when the buffer stores them that way
    fn as_vertices(&self) -> Option<&[Vertex]> {
        None
    }
}

/// A geometry buffer that owns its storage and can be resized
pub trait TrianglesBuffer: Triangles {
    /// Grow with default vertices or truncate
    fn set_len(&mut self, len: usize);
}

pub(crate) fn check_range(range: &Range<usize>, len: usize) -> Result<(), GeometryError> {
    if range.start > range.end || range.end > len {
        return Err(GeometryError::SliceOutOfRange {
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}

pub(crate) fn check_len(expected: usize, source: &dyn Triangles) -> Result<(), GeometryError> {
    let found = source.len();
    if found != expected {
        return Err(GeometryError::LengthMismatch { expected, found });
    }
    Ok(())
}

fn update_vertices(dst: &mut [Vertex], source: &dyn Triangles) -> Result<(), GeometryError> {
    check_len(dst.len(), source)?;
    if let Some(src) = source.as_vertices() {
        dst.copy_from_slice(src);
        return Ok(());
    }
    for (i, v) in dst.iter_mut().enumerate() {
        if let Some(position) = source.position(i) {
            v.position = position;
        }
        if let Some(color) = source.color(i) {
            v.color = color;
        }
        if let Some((picture, intensity)) = source.picture(i) {
            v.picture = picture;
            v.intensity = intensity;
        }
    }
    Ok(())
}

fn update_flat(dst: &mut [FlatVertex], source: &dyn Triangles) -> Result<(), GeometryError> {
    check_len(dst.len(), source)?;
    for (i, v) in dst.iter_mut().enumerate() {
        if let Some(position) = source.position(i) {
            v.position = position;
        }
        if let Some(color) = source.color(i) {
            v.color = color;
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Full vertices
// ─────────────────────────────────────────────────────────────────────────────

/// Owned buffer of full [`Vertex`] values
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrianglesData {
    vertices: Vec<Vertex>,
}

impl TrianglesData {
    /// `len` default vertices (white, untextured, at the origin)
    pub fn new(len: usize) -> Self {
        Self {
            vertices: vec![Vertex::default(); len],
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
        }
    }

    pub fn from_vertices(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    pub fn push_triangle(&mut self, triangle: [Vertex; 3]) {
        self.vertices.extend_from_slice(&triangle);
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Raw bytes for a vertex buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }
}

impl From<Vec<Vertex>> for TrianglesData {
    fn from(vertices: Vec<Vertex>) -> Self {
        Self::from_vertices(vertices)
    }
}

impl Triangles for TrianglesData {
    fn len(&self) -> usize {
        self.vertices.len()
    }

    fn slice(&mut self, range: Range<usize>) -> Result<Box<dyn Triangles + '_>, GeometryError> {
        check_range(&range, self.vertices.len())?;
        Ok(Box::new(TrianglesView {
            vertices: &mut self.vertices[range],
        }))
    }

    fn update(&mut self, source: &dyn Triangles) -> Result<(), GeometryError> {
        update_vertices(&mut self.vertices, source)
    }

    fn copy(&self) -> Box<dyn TrianglesBuffer> {
        Box::new(self.clone())
    }

    fn position(&self, i: usize) -> Option<Point> {
        self.vertices.get(i).map(|v| v.position)
    }

    fn color(&self, i: usize) -> Option<Color> {
        self.vertices.get(i).map(|v| v.color)
    }

    fn picture(&self, i: usize) -> Option<(Point, f32)> {
        self.vertices.get(i).map(|v| (v.picture, v.intensity))
    }

    fn as_vertices(&self) -> Option<&[Vertex]> {
        Some(self.vertices.as_slice())
    }
}

impl TrianglesBuffer for TrianglesData {
    fn set_len(&mut self, len: usize) {
        self.vertices.resize(len, Vertex::default());
    }
}

/// Mutable view over a range of full vertices
#[derive(Debug)]
pub struct TrianglesView<'a> {
    vertices: &'a mut [Vertex],
}

impl<'a> TrianglesView<'a> {
    pub fn new(vertices: &'a mut [Vertex]) -> Self {
        Self { vertices }
    }

    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut *self.vertices
    }
}

impl Triangles for TrianglesView<'_> {
    fn len(&self) -> usize {
        self.vertices.len()
    }

    fn slice(&mut self, range: Range<usize>) -> Result<Box<dyn Triangles + '_>, GeometryError> {
        check_range(&range, self.vertices.len())?;
        Ok(Box::new(TrianglesView {
            vertices: &mut self.vertices[range],
        }))
    }

    fn update(&mut self, source: &dyn Triangles) -> Result<(), GeometryError> {
        update_vertices(self.vertices, source)
    }

    fn copy(&self) -> Box<dyn TrianglesBuffer> {
        Box::new(TrianglesData::from_vertices(self.vertices.to_vec()))
    }

    fn position(&self, i: usize) -> Option<Point> {
        self.vertices.get(i).map(|v| v.position)
    }

    fn color(&self, i: usize) -> Option<Color> {
        self.vertices.get(i).map(|v| v.color)
    }

    fn picture(&self, i: usize) -> Option<(Point, f32)> {
        self.vertices.get(i).map(|v| (v.picture, v.intensity))
    }

    fn as_vertices(&self) -> Option<&[Vertex]> {
        Some(&*self.vertices)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Flat vertices (no picture sampling)
// ─────────────────────────────────────────────────────────────────────────────

/// Owned buffer of [`FlatVertex`] values: position and color only
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatTrianglesData {
    vertices: Vec<FlatVertex>,
}

impl FlatTrianglesData {
    pub fn new(len: usize) -> Self {
        Self {
            vertices: vec![FlatVertex::default(); len],
        }
    }

    pub fn from_vertices(vertices: Vec<FlatVertex>) -> Self {
        Self { vertices }
    }

    pub fn push_triangle(&mut self, triangle: [FlatVertex; 3]) {
        self.vertices.extend_from_slice(&triangle);
    }

    pub fn vertices(&self) -> &[FlatVertex] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut [FlatVertex] {
        &mut self.vertices
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Reset every vertex to the default without changing the length
    pub fn reset(&mut self) {
        self.vertices.fill(FlatVertex::default());
    }
}

impl Triangles for FlatTrianglesData {
    fn len(&self) -> usize {
        self.vertices.len()
    }

    fn slice(&mut self, range: Range<usize>) -> Result<Box<dyn Triangles + '_>, GeometryError> {
        check_range(&range, self.vertices.len())?;
        Ok(Box::new(FlatTrianglesView {
            vertices: &mut self.vertices[range],
        }))
    }

    fn update(&mut self, source: &dyn Triangles) -> Result<(), GeometryError> {
        update_flat(&mut self.vertices, source)
    }

    fn copy(&self) -> Box<dyn TrianglesBuffer> {
        Box::new(self.clone())
    }

    fn position(&self, i: usize) -> Option<Point> {
        self.vertices.get(i).map(|v| v.position)
    }

    fn color(&self, i: usize) -> Option<Color> {
        self.vertices.get(i).map(|v| v.color)
    }
}

impl TrianglesBuffer for FlatTrianglesData {
    fn set_len(&mut self, len: usize) {
        self.vertices.resize(len, FlatVertex::default());
    }
}

/// Mutable view over a range of flat vertices
#[derive(Debug)]
pub struct FlatTrianglesView<'a> {
    vertices: &'a mut [FlatVertex],
}

impl Triangles for FlatTrianglesView<'_> {
    fn len(&self) -> usize {
        self.vertices.len()
    }

    fn slice(&mut self, range: Range<usize>) -> Result<Box<dyn Triangles + '_>, GeometryError> {
        check_range(&range, self.vertices.len())?;
        Ok(Box::new(FlatTrianglesView {
            vertices: &mut self.vertices[range],
        }))
    }

    fn update(&mut self, source: &dyn Triangles) -> Result<(), GeometryError> {
        update_flat(self.vertices, source)
    }

    fn copy(&self) -> Box<dyn TrianglesBuffer> {
        Box::new(FlatTrianglesData::from_vertices(self.vertices.to_vec()))
    }

    fn position(&self, i: usize) -> Option<Point> {
        self.vertices.get(i).map(|v| v.position)
    }

    fn color(&self, i: usize) -> Option<Color> {
        self.vertices.get(i).map(|v| v.color)
    }
}
