//! Batch - many draws sharing one picture, merged into a single buffer
//!
//! Objects are not drawn onto a batch directly. A caller asks the batch for
//! a [`BatchTriangles`] (a private copy of its geometry) and a
//! [`BatchPicture`] (a checked handle to the batch picture), then draws the
//! triangles through the picture:
//!
//! ```
//! use lumen_batch::{Batch, Picture, PictureData, TrianglesData, Vertex};
//! use lumen_paint::{Color, Point, Rect, Transform2D};
//!
//! let picture = Picture::new(PictureData::new(Rect::new(0.0, 0.0, 16.0, 16.0)));
//! let mut batch = Batch::new(TrianglesData::default(), picture.clone());
//!
//! let mut tri = TrianglesData::default();
//! tri.push_triangle([
//!     Vertex::colored(Point::new(0.0, 0.0), Color::WHITE),
//!     Vertex::colored(Point::new(1.0, 0.0), Color::WHITE),
//!     Vertex::colored(Point::new(0.0, 1.0), Color::WHITE),
//! ]);
//!
//! let mut triangles = batch.make_triangles(&tri);
//! let pic = batch.make_picture(&picture)?;
//!
//! batch.set_transform(Transform2D::translate(10.0, 0.0));
//! pic.draw(&mut triangles)?;
//! assert_eq!(batch.len(), 3);
//! # Ok::<(), lumen_batch::BatchError>(())
//! ```
//!
//! The batch transform and color mask are baked into the geometry at the
//! moment it is merged. Changing them later does not touch what is already
//! in the buffer.
//!
//! Batch state is shared with its proxies through `Rc<RefCell<_>>`, so none of
//! these types are `Send`: a batch lives on the thread that renders it.
//! Drawing while the borrow returned by [`Batch::container`] is alive fails
//! with [`BatchError::BatchBusy`].

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::ops::Range;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use lumen_paint::{Color, Point, Rect, Transform2D};

use crate::drawer::{Drawer, Ingest, RenderTarget};
use crate::error::{BatchError, GeometryError, Result};
use crate::picture::Picture;
use crate::triangles::{FlatTrianglesData, Triangles, TrianglesBuffer};
use crate::vertex::Vertex;

static NEXT_BATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Ownership token identifying one batch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(u64);

impl BatchId {
    pub(crate) fn next() -> Self {
        Self(NEXT_BATCH_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct BatchState {
    id: BatchId,
    drawer: Drawer,
    transform: Transform2D,
    color_mask: Color,
}

impl BatchState {
    /// Append `local` to the container with the current transform and mask.
    ///
    /// `scratch` must have the same length as `local`.
    fn merge(&mut self, local: &dyn Triangles, scratch: &mut FlatTrianglesData) -> Result<()> {
        // Fields `local` lacks must not keep values from a previous merge
        scratch.reset();
        scratch.update(local)?;
        for v in scratch.vertices_mut() {
            v.position = self.transform.project(v.position);
            v.color = self.color_mask * v.color;
        }

        let added = local.len();
        let container = self.drawer.triangles_mut();
        let start = container.len();
        container.set_len(start + added);

        if let Err(err) = write_tail(container, start..start + added, local, scratch) {
            container.set_len(start);
            return Err(err.into());
        }
        self.drawer.notify_external_change();

        tracing::trace!(
            batch = %self.id,
            added,
            len = start + added,
            "merged triangles into batch"
        );
        Ok(())
    }
}

fn lock(state: &RefCell<BatchState>, batch: BatchId) -> Result<RefMut<'_, BatchState>> {
    state.try_borrow_mut().map_err(|_| {
        tracing::warn!(batch = %batch, "batch state already borrowed");
        BatchError::BatchBusy { batch }
    })
}

/// Untransformed fields first, then the transformed position and color on top
fn write_tail(
    container: &mut dyn TrianglesBuffer,
    range: Range<usize>,
    local: &dyn Triangles,
    scratch: &FlatTrianglesData,
) -> std::result::Result<(), GeometryError> {
    let mut tail = container.slice(range)?;
    tail.update(local)?;
    tail.update(scratch)
}

/// Accumulates geometry from many objects sharing one picture
pub struct Batch {
    id: BatchId,
    state: Rc<RefCell<BatchState>>,
}

impl Batch {
    /// Create a batch over `container`, bound to `picture` for its lifetime.
    ///
    /// The batch carries exactly the vertex fields the container supports.
    /// A container without color cannot be color masked.
    pub fn new(container: impl TrianglesBuffer + 'static, picture: Picture) -> Self {
        Self::from_drawer(Drawer::new(container, picture))
    }

    pub fn from_drawer(drawer: Drawer) -> Self {
        let id = BatchId::next();
        tracing::debug!(
            batch = %id,
            len = drawer.triangles().len(),
            bounds = ?drawer.picture().bounds(),
            "created batch"
        );
        Self {
            id,
            state: Rc::new(RefCell::new(BatchState {
                id,
                drawer,
                transform: Transform2D::identity(),
                color_mask: Color::WHITE,
            })),
        }
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn picture(&self) -> Picture {
        self.state.borrow().drawer.picture().clone()
    }

    /// Transform applied to geometry merged after this call
    pub fn set_transform(&mut self, transform: Transform2D) {
        self.state.borrow_mut().transform = transform;
    }

    pub fn transform(&self) -> Transform2D {
        self.state.borrow().transform
    }

    /// Mask multiplied into the color of geometry merged after this call.
    /// `None` resets to white.
    pub fn set_color_mask(&mut self, mask: Option<Color>) {
        self.state.borrow_mut().color_mask = mask.unwrap_or(Color::WHITE);
    }

    pub fn color_mask(&self) -> Color {
        self.state.borrow().color_mask
    }

    /// Remove all merged geometry
    pub fn clear(&mut self) {
        let mut state = self.state.borrow_mut();
        let dropped = state.drawer.triangles().len();
        state.drawer.clear();
        tracing::debug!(batch = %state.id, dropped, "cleared batch");
    }

    /// Tell the batch its container was changed from outside
    pub fn notify_external_change(&mut self) {
        self.state.borrow_mut().drawer.notify_external_change();
    }

    pub fn is_dirty(&self) -> bool {
        self.state.borrow().drawer.is_dirty()
    }

    pub fn revision(&self) -> u64 {
        self.state.borrow().drawer.revision()
    }

    /// Vertices currently in the container
    pub fn len(&self) -> usize {
        self.state.borrow().drawer.triangles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn container(&self) -> Ref<'_, dyn TrianglesBuffer + 'static> {
        Ref::map(self.state.borrow(), |s| s.drawer.triangles())
    }

    /// Mutable access to the container. Call
    /// [`notify_external_change`](Self::notify_external_change) after
    /// changing it.
    pub fn container_mut(&mut self) -> RefMut<'_, dyn TrianglesBuffer + 'static> {
        RefMut::map(self.state.borrow_mut(), |s| s.drawer.triangles_mut())
    }

    /// Draw everything accumulated so far onto `target`
    pub fn draw(&self, target: &mut dyn RenderTarget) -> Result<()> {
        lock(&self.state, self.id)?.drawer.draw_into(target)
    }

    /// Private copy of `source` that draws onto this batch
    pub fn make_triangles(&self, source: &dyn Triangles) -> BatchTriangles {
        BatchTriangles {
            owner: self.id(),
            local: source.copy(),
            scratch: FlatTrianglesData::new(source.len()),
            batch: Rc::clone(&self.state),
        }
    }

    /// Handle to this batch's picture.
    ///
    /// Fails when `picture` is not the very picture the batch was created
    /// with; drawing with a mismatched picture would render wrong output.
    pub fn make_picture(&self, picture: &Picture) -> Result<BatchPicture> {
        let state = self.state.borrow();
        if !state.drawer.picture().same(picture) {
            tracing::warn!(batch = %state.id, "picture is not the batch picture");
            return Err(BatchError::ForeignPicture { batch: state.id });
        }
        Ok(BatchPicture {
            owner: state.id,
            picture: picture.clone(),
            batch: Rc::clone(&self.state),
        })
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Batch")
            .field("id", &state.id)
            .field("drawer", &state.drawer)
            .field("transform", &state.transform)
            .field("color_mask", &state.color_mask)
            .finish()
    }
}

/// A batch accepts geometry from other drawers bound to the same picture,
/// merging it under its own transform and color mask.
impl RenderTarget for Batch {
    fn ingest(&mut self, ingest: Ingest<'_>) -> Result<()> {
        let picture = self.make_picture(ingest.picture())?;
        let mut triangles = self.make_triangles(ingest.geometry());
        picture.draw(&mut triangles)
    }
}

/// Geometry bound to one batch
///
/// Holds a private copy of the caller's geometry, so the caller's buffer is
/// never touched by merges, plus a scratch buffer of the same length where
/// transformed positions and colors are computed.
pub struct BatchTriangles {
    owner: BatchId,
    local: Box<dyn TrianglesBuffer>,
    scratch: FlatTrianglesData,
    batch: Rc<RefCell<BatchState>>,
}

impl BatchTriangles {
    pub fn owner(&self) -> BatchId {
        self.owner
    }

    /// Merge into the owning batch without a picture (untextured draw)
    pub fn draw(&mut self) -> Result<()> {
        lock(&self.batch, self.owner)?.merge(&*self.local, &mut self.scratch)
    }
}

impl Clone for BatchTriangles {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            local: self.local.copy(),
            scratch: self.scratch.clone(),
            batch: Rc::clone(&self.batch),
        }
    }
}

impl fmt::Debug for BatchTriangles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchTriangles")
            .field("owner", &self.owner)
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}

impl Triangles for BatchTriangles {
    fn len(&self) -> usize {
        self.local.len()
    }

    fn slice(&mut self, range: Range<usize>) -> std::result::Result<Box<dyn Triangles + '_>, GeometryError> {
        self.local.slice(range)
    }

    fn update(&mut self, source: &dyn Triangles) -> std::result::Result<(), GeometryError> {
        self.local.update(source)
    }

    fn copy(&self) -> Box<dyn TrianglesBuffer> {
        Box::new(self.clone())
    }

    fn position(&self, i: usize) -> Option<Point> {
        self.local.position(i)
    }

    fn color(&self, i: usize) -> Option<Color> {
        self.local.color(i)
    }

    fn picture(&self, i: usize) -> Option<(Point, f32)> {
        self.local.picture(i)
    }

    fn as_vertices(&self) -> Option<&[Vertex]> {
        self.local.as_vertices()
    }
}

impl TrianglesBuffer for BatchTriangles {
    fn set_len(&mut self, len: usize) {
        self.local.set_len(len);
        self.scratch.set_len(len);
    }
}

/// The batch picture, bound to one batch
#[derive(Clone)]
pub struct BatchPicture {
    owner: BatchId,
    picture: Picture,
    batch: Rc<RefCell<BatchState>>,
}

impl BatchPicture {
    pub fn owner(&self) -> BatchId {
        self.owner
    }

    pub fn picture(&self) -> &Picture {
        &self.picture
    }

    pub fn bounds(&self) -> Rect {
        self.picture.bounds()
    }

    /// Merge `triangles` into the batch.
    ///
    /// Fails when `triangles` were made by a different batch.
    pub fn draw(&self, triangles: &mut BatchTriangles) -> Result<()> {
        if triangles.owner != self.owner {
            tracing::warn!(
                owner = %triangles.owner,
                target = %self.owner,
                "triangles drawn through another batch's picture"
            );
            return Err(BatchError::ForeignTriangles {
                owner: triangles.owner,
                target: self.owner,
            });
        }
        lock(&self.batch, self.owner)?.merge(&*triangles.local, &mut triangles.scratch)
    }
}

impl fmt::Debug for BatchPicture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchPicture")
            .field("owner", &self.owner)
            .field("picture", &self.picture)
            .finish_non_exhaustive()
    }
}
