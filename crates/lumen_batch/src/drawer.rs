//! Drawer - a geometry buffer bound to one picture
//!
//! The drawer cannot observe mutations made to its buffer from outside, so
//! anyone who changes the buffer through [`Drawer::triangles_mut`] must call
//! [`Drawer::notify_external_change`] afterwards. The dirty flag is the only
//! signal downstream caches (a GPU vertex buffer, for instance) get that they
//! need to re-synchronize.

use std::fmt;

use crate::error::Result;
use crate::picture::Picture;
use crate::triangles::{Triangles, TrianglesBuffer};

/// Change tracking for a geometry buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyFlag {
    dirty: bool,
    revision: u64,
}

impl DirtyFlag {
    /// Starts dirty: nothing has been synchronized yet
    pub const fn new() -> Self {
        Self {
            dirty: true,
            revision: 0,
        }
    }

    /// Record a change
    pub fn mark(&mut self) {
        self.dirty = true;
        self.revision = self.revision.wrapping_add(1);
    }

    /// Consumer has caught up with the latest change
    pub fn acknowledge(&mut self) {
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Monotonic change counter, for consumers that cache per revision
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl Default for DirtyFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// What a [`RenderTarget`] receives from a drawer
///
/// Geometry and picture are borrowed immutably and stay unchanged for the
/// duration of the call.
pub struct Ingest<'a> {
    geometry: &'a dyn Triangles,
    picture: &'a Picture,
    changes: &'a mut DirtyFlag,
}

impl<'a> Ingest<'a> {
    pub fn geometry(&self) -> &'a dyn Triangles {
        self.geometry
    }

    pub fn picture(&self) -> &'a Picture {
        self.picture
    }

    /// Geometry changed since the last acknowledgement
    pub fn is_dirty(&self) -> bool {
        self.changes.is_dirty()
    }

    pub fn revision(&self) -> u64 {
        self.changes.revision()
    }

    /// Call after re-synchronizing a cached copy of the geometry
    pub fn acknowledge(&mut self) {
        self.changes.acknowledge();
    }
}

impl fmt::Debug for Ingest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ingest")
            .field("vertices", &self.geometry.len())
            .field("picture", self.picture)
            .field("changes", &*self.changes)
            .finish()
    }
}

/// Sink for accumulated geometry, e.g. a GPU renderer or another batch
pub trait RenderTarget {
    fn ingest(&mut self, ingest: Ingest<'_>) -> Result<()>;
}

/// A geometry buffer, the picture it samples and its dirty flag
pub struct Drawer {
    triangles: Box<dyn TrianglesBuffer>,
    picture: Picture,
    changes: DirtyFlag,
}

impl Drawer {
    pub fn new(triangles: impl TrianglesBuffer + 'static, picture: Picture) -> Self {
        Self::from_boxed(Box::new(triangles), picture)
    }

    pub fn from_boxed(triangles: Box<dyn TrianglesBuffer>, picture: Picture) -> Self {
        Self {
            triangles,
            picture,
            changes: DirtyFlag::new(),
        }
    }

    pub fn triangles(&self) -> &(dyn TrianglesBuffer + 'static) {
        &*self.triangles
    }

    /// Direct access to the buffer. Call [`notify_external_change`] after
    /// mutating it.
    ///
    /// [`notify_external_change`]: Self::notify_external_change
    pub fn triangles_mut(&mut self) -> &mut (dyn TrianglesBuffer + 'static) {
        &mut *self.triangles
    }

    pub fn picture(&self) -> &Picture {
        &self.picture
    }

    pub fn notify_external_change(&mut self) {
        self.changes.mark();
    }

    /// Drop all geometry
    pub fn clear(&mut self) {
        self.triangles.set_len(0);
        self.changes.mark();
    }

    pub fn is_dirty(&self) -> bool {
        self.changes.is_dirty()
    }

    pub fn revision(&self) -> u64 {
        self.changes.revision()
    }

    pub fn changes(&self) -> DirtyFlag {
        self.changes
    }

    /// Hand the buffer and picture to `target`
    pub fn draw_into(&mut self, target: &mut dyn RenderTarget) -> Result<()> {
        target.ingest(Ingest {
            geometry: &*self.triangles,
            picture: &self.picture,
            changes: &mut self.changes,
        })
    }
}

impl fmt::Debug for Drawer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drawer")
            .field("vertices", &self.triangles.len())
            .field("picture", &self.picture)
            .field("changes", &self.changes)
            .finish()
    }
}
