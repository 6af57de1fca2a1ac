//! Integration tests for draw batching
//!
//! These tests verify that:
//! - Merged geometry lands in the batch container with transform and mask baked in
//! - Later transform or mask changes never rewrite already merged geometry
//! - Proxies refuse pictures and triangles that belong to another batch
//! - Clearing, external changes and drawing keep the dirty flag honest

use std::ops::Range;

use lumen_batch::{
    Batch, BatchError, ErrorKind, FlatTrianglesData, FlatVertex, GeometryError, Ingest, Picture,
    PictureData, RenderTarget, Triangles, TrianglesBuffer, TrianglesData, Vertex,
};
use lumen_paint::{Color, Point, Rect, Transform2D};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn atlas() -> Picture {
    Picture::new(PictureData::new(Rect::new(0.0, 0.0, 64.0, 64.0)))
}

fn triangle(color: Color) -> TrianglesData {
    TrianglesData::from_vertices(vec![
        Vertex::new(Point::new(0.0, 0.0), color, Point::new(0.0, 0.0), 1.0),
        Vertex::new(Point::new(1.0, 0.0), color, Point::new(16.0, 0.0), 1.0),
        Vertex::new(Point::new(0.0, 1.0), color, Point::new(0.0, 16.0), 1.0),
    ])
}

/// Merge `source` into `batch` through a fresh pair of proxies
fn merge(batch: &Batch, source: &dyn Triangles) -> Result<(), BatchError> {
    let mut triangles = batch.make_triangles(source);
    let picture = batch.make_picture(&batch.picture())?;
    picture.draw(&mut triangles)
}

fn positions(batch: &Batch) -> Vec<Point> {
    let container = batch.container();
    (0..container.len())
        .filter_map(|i| container.position(i))
        .collect()
}

fn colors(batch: &Batch) -> Vec<Color> {
    let container = batch.container();
    (0..container.len())
        .filter_map(|i| container.color(i))
        .collect()
}

/// Geometry that carries positions only
#[derive(Debug, Default)]
struct Outline {
    points: Vec<Point>,
}

#[derive(Debug)]
struct OutlineView<'a> {
    points: &'a mut [Point],
}

fn update_points(dst: &mut [Point], source: &dyn Triangles) -> Result<(), GeometryError> {
    if source.len() != dst.len() {
        return Err(GeometryError::LengthMismatch {
            expected: dst.len(),
            found: source.len(),
        });
    }
    for (i, p) in dst.iter_mut().enumerate() {
        if let Some(position) = source.position(i) {
            *p = position;
        }
    }
    Ok(())
}

fn slice_points(
    points: &mut [Point],
    range: Range<usize>,
) -> Result<Box<dyn Triangles + '_>, GeometryError> {
    let len = points.len();
    match points.get_mut(range.clone()) {
        Some(points) => Ok(Box::new(OutlineView { points })),
        None => Err(GeometryError::SliceOutOfRange {
            start: range.start,
            end: range.end,
            len,
        }),
    }
}

impl Triangles for Outline {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn slice(&mut self, range: Range<usize>) -> Result<Box<dyn Triangles + '_>, GeometryError> {
        slice_points(&mut self.points, range)
    }

    fn update(&mut self, source: &dyn Triangles) -> Result<(), GeometryError> {
        update_points(&mut self.points, source)
    }

    fn copy(&self) -> Box<dyn TrianglesBuffer> {
        Box::new(Outline {
            points: self.points.clone(),
        })
    }

    fn position(&self, i: usize) -> Option<Point> {
        self.points.get(i).copied()
    }
}

impl TrianglesBuffer for Outline {
    fn set_len(&mut self, len: usize) {
        self.points.resize(len, Point::ZERO);
    }
}

impl Triangles for OutlineView<'_> {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn slice(&mut self, range: Range<usize>) -> Result<Box<dyn Triangles + '_>, GeometryError> {
        slice_points(self.points, range)
    }

    fn update(&mut self, source: &dyn Triangles) -> Result<(), GeometryError> {
        update_points(self.points, source)
    }

    fn copy(&self) -> Box<dyn TrianglesBuffer> {
        Box::new(Outline {
            points: self.points.to_vec(),
        })
    }

    fn position(&self, i: usize) -> Option<Point> {
        self.points.get(i).copied()
    }
}

/// Records every ingest, acknowledging the dirty flag like a GPU cache would
#[derive(Default)]
struct RecordingTarget {
    ingested: Vec<(usize, bool)>,
}

impl RenderTarget for RecordingTarget {
    fn ingest(&mut self, mut ingest: Ingest<'_>) -> lumen_batch::Result<()> {
        self.ingested
            .push((ingest.geometry().len(), ingest.is_dirty()));
        ingest.acknowledge();
        Ok(())
    }
}

#[test]
fn test_merge_applies_color_mask() {
    init_tracing();
    let mut batch = Batch::new(TrianglesData::default(), atlas());
    batch.set_color_mask(Some(Color::new(0.5, 0.5, 0.5, 1.0)));

    merge(&batch, &triangle(Color::WHITE)).unwrap();

    assert_eq!(batch.len(), 3);
    assert!(batch.is_dirty());
    assert_eq!(colors(&batch), vec![Color::new(0.5, 0.5, 0.5, 1.0); 3]);
    assert_eq!(
        positions(&batch),
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0)
        ]
    );
}

#[test]
fn test_merge_grows_by_source_length_and_sets_dirty() {
    init_tracing();
    let batch = Batch::new(TrianglesData::default(), atlas());
    let mut target = RecordingTarget::default();

    let mut source = triangle(Color::RED);
    source.set_len(6);
    for k in 1..=3 {
        batch.draw(&mut target).unwrap();
        assert!(!batch.is_dirty());

        merge(&batch, &source).unwrap();
        assert_eq!(batch.len(), 6 * k);
        assert!(batch.is_dirty());
    }
}

#[test]
fn test_identity_merge_duplicates_source() {
    init_tracing();
    let mut batch = Batch::new(TrianglesData::default(), atlas());
    merge(&batch, &triangle(Color::GREEN)).unwrap();
    batch.clear();

    let source = triangle(Color::GREEN);
    merge(&batch, &source).unwrap();
    merge(&batch, &source).unwrap();

    let container = batch.container();
    let merged = container.as_vertices().unwrap();
    assert_eq!(&merged[..3], source.vertices());
    assert_eq!(&merged[3..], source.vertices());
}

#[test]
fn test_transform_is_baked_at_merge_time() {
    init_tracing();
    let mut batch = Batch::new(TrianglesData::default(), atlas());

    batch.set_transform(Transform2D::translate(10.0, 0.0));
    merge(&batch, &triangle(Color::WHITE)).unwrap();

    batch.set_transform(Transform2D::scale_uniform(3.0));
    batch.set_color_mask(Some(Color::RED));
    merge(&batch, &triangle(Color::WHITE)).unwrap();

    let p = positions(&batch);
    assert_eq!(&p[..3], &[Point::new(10.0, 0.0), Point::new(11.0, 0.0), Point::new(10.0, 1.0)]);
    assert_eq!(&p[3..], &[Point::new(0.0, 0.0), Point::new(3.0, 0.0), Point::new(0.0, 3.0)]);

    let c = colors(&batch);
    assert!(c[..3].iter().all(|&c| c == Color::WHITE));
    assert!(c[3..].iter().all(|&c| c == Color::RED));
}

#[test]
fn test_picture_coordinates_survive_merge() {
    init_tracing();
    let mut batch = Batch::new(TrianglesData::default(), atlas());
    batch.set_transform(Transform2D::rotate(1.0).then(&Transform2D::translate(5.0, 5.0)));
    merge(&batch, &triangle(Color::WHITE)).unwrap();

    let container = batch.container();
    assert_eq!(container.picture(1), Some((Point::new(16.0, 0.0), 1.0)));
    assert_eq!(container.picture(2), Some((Point::new(0.0, 16.0), 1.0)));
}

#[test]
fn test_source_geometry_is_not_mutated() {
    init_tracing();
    let mut batch = Batch::new(TrianglesData::default(), atlas());
    batch.set_transform(Transform2D::translate(100.0, 100.0));
    batch.set_color_mask(Some(Color::BLUE));

    let source = triangle(Color::WHITE);
    let mut triangles = batch.make_triangles(&source);
    let picture = batch.make_picture(&batch.picture()).unwrap();
    picture.draw(&mut triangles).unwrap();
    picture.draw(&mut triangles).unwrap();

    assert_eq!(source, triangle(Color::WHITE));
    assert_eq!(triangles.position(0), Some(Point::new(0.0, 0.0)));
    assert_eq!(triangles.color(0), Some(Color::WHITE));
    assert_eq!(batch.container().position(3), Some(Point::new(100.0, 100.0)));
}

#[test]
fn test_proxy_updates_apply_to_next_merge() {
    init_tracing();
    let batch = Batch::new(TrianglesData::default(), atlas());
    let mut triangles = batch.make_triangles(&triangle(Color::WHITE));
    let picture = batch.make_picture(&batch.picture()).unwrap();

    picture.draw(&mut triangles).unwrap();
    {
        let mut first = triangles.slice(0..1).unwrap();
        first
            .update(&TrianglesData::from_vertices(vec![Vertex::colored(
                Point::new(-1.0, -1.0),
                Color::BLACK,
            )]))
            .unwrap();
    }
    picture.draw(&mut triangles).unwrap();

    let p = positions(&batch);
    assert_eq!(p[0], Point::new(0.0, 0.0));
    assert_eq!(p[3], Point::new(-1.0, -1.0));
    assert_eq!(colors(&batch)[3], Color::BLACK);
}

#[test]
fn test_foreign_picture_is_rejected() {
    init_tracing();
    let batch = Batch::new(TrianglesData::default(), atlas());

    // Same bounds and pixels, different resource
    let err = batch.make_picture(&atlas()).unwrap_err();
    assert_eq!(err, BatchError::ForeignPicture { batch: batch.id() });
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);
}

#[test]
fn test_triangles_from_other_batch_are_rejected() {
    init_tracing();
    let shared = atlas();
    let x = Batch::new(TrianglesData::default(), shared.clone());
    let y = Batch::new(TrianglesData::default(), shared.clone());

    let mut from_x = x.make_triangles(&triangle(Color::WHITE));
    let through_y = y.make_picture(&shared).unwrap();

    let err = through_y.draw(&mut from_x).unwrap_err();
    assert_eq!(
        err,
        BatchError::ForeignTriangles {
            owner: x.id(),
            target: y.id()
        }
    );
    assert!(err.is_invariant_violation());
    assert!(x.is_empty());
    assert!(y.is_empty());
}

#[test]
fn test_clear_then_merge_behaves_like_fresh_batch() {
    init_tracing();
    let mut batch = Batch::new(TrianglesData::default(), atlas());
    let mut target = RecordingTarget::default();
    for _ in 0..3 {
        merge(&batch, &triangle(Color::WHITE)).unwrap();
    }
    assert_eq!(batch.len(), 9);
    batch.draw(&mut target).unwrap();

    batch.clear();
    assert_eq!(batch.len(), 0);
    assert!(batch.is_dirty());

    batch.set_color_mask(Some(Color::new(0.5, 0.5, 0.5, 1.0)));
    merge(&batch, &triangle(Color::WHITE)).unwrap();
    assert_eq!(batch.len(), 3);
    assert_eq!(colors(&batch), vec![Color::new(0.5, 0.5, 0.5, 1.0); 3]);
}

#[test]
fn test_external_change_needs_notification() {
    init_tracing();
    let mut batch = Batch::new(TrianglesData::default(), atlas());
    let mut target = RecordingTarget::default();
    batch.draw(&mut target).unwrap();

    batch.container_mut().set_len(3);
    assert!(!batch.is_dirty());
    batch.notify_external_change();
    assert!(batch.is_dirty());

    batch.draw(&mut target).unwrap();
    assert_eq!(target.ingested, vec![(0, true), (3, true)]);
}

#[test]
fn test_flat_container_drops_picture_fields() {
    init_tracing();
    let mut batch = Batch::new(FlatTrianglesData::default(), atlas());
    batch.set_transform(Transform2D::translate(1.0, 1.0));
    merge(&batch, &triangle(Color::WHITE)).unwrap();

    let container = batch.container();
    assert_eq!(container.len(), 3);
    assert_eq!(container.position(0), Some(Point::new(1.0, 1.0)));
    assert!(container.picture(0).is_none());
}

#[test]
fn test_flat_source_gets_mask_color_and_no_texture() {
    init_tracing();
    let mut batch = Batch::new(TrianglesData::default(), atlas());
    batch.set_color_mask(Some(Color::RED));

    let mut flat = FlatTrianglesData::default();
    flat.push_triangle([
        FlatVertex::new(Point::new(0.0, 0.0), Color::WHITE),
        FlatVertex::new(Point::new(2.0, 0.0), Color::WHITE),
        FlatVertex::new(Point::new(0.0, 2.0), Color::WHITE),
    ]);
    merge(&batch, &flat).unwrap();
    merge(&batch, &flat).unwrap();

    let container = batch.container();
    assert_eq!(container.color(4), Some(Color::RED));
    assert_eq!(container.picture(4), Some((Point::ZERO, 0.0)));
}

#[test]
fn test_batch_draws_into_batch() {
    init_tracing();
    let shared = atlas();
    let mut inner = Batch::new(TrianglesData::default(), shared.clone());
    inner.set_transform(Transform2D::translate(1.0, 0.0));
    merge(&inner, &triangle(Color::WHITE)).unwrap();

    let mut outer = Batch::new(TrianglesData::default(), shared);
    outer.set_transform(Transform2D::translate(0.0, 10.0));
    outer.set_color_mask(Some(Color::new(1.0, 1.0, 1.0, 0.5)));
    inner.draw(&mut outer).unwrap();

    assert_eq!(outer.len(), 3);
    assert_eq!(positions(&outer)[1], Point::new(2.0, 10.0));
    assert_eq!(colors(&outer)[1], Color::new(1.0, 1.0, 1.0, 0.5));
    // Drawing does not consume the inner batch
    assert_eq!(inner.len(), 3);
}

#[test]
fn test_batch_into_batch_with_other_picture_fails() {
    init_tracing();
    let inner = Batch::new(TrianglesData::default(), atlas());
    let mut outer = Batch::new(TrianglesData::default(), atlas());

    let err = inner.draw(&mut outer).unwrap_err();
    assert_eq!(err, BatchError::ForeignPicture { batch: outer.id() });
}

#[test]
fn test_mask_does_not_compound_for_colorless_source() {
    init_tracing();
    let mask = Color::new(0.5, 0.5, 0.5, 1.0);
    let mut batch = Batch::new(TrianglesData::default(), atlas());
    batch.set_color_mask(Some(mask));

    let outline = Outline {
        points: vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
        ],
    };
    let mut triangles = batch.make_triangles(&outline);
    let picture = batch.make_picture(&batch.picture()).unwrap();
    picture.draw(&mut triangles).unwrap();
    picture.draw(&mut triangles).unwrap();

    assert_eq!(batch.len(), 6);
    assert_eq!(colors(&batch), vec![mask; 6]);
    assert_eq!(positions(&batch)[4], Point::new(1.0, 0.0));
}

#[test]
fn test_draw_with_container_borrowed_fails_without_panicking() {
    init_tracing();
    let batch = Batch::new(TrianglesData::default(), atlas());
    let mut triangles = batch.make_triangles(&triangle(Color::WHITE));
    let picture = batch.make_picture(&batch.picture()).unwrap();
    let mut target = RecordingTarget::default();

    {
        let _container = batch.container();
        let err = picture.draw(&mut triangles).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert_eq!(err, BatchError::BatchBusy { batch: batch.id() });
        assert!(batch.draw(&mut target).is_err());
    }

    assert!(target.ingested.is_empty());
    picture.draw(&mut triangles).unwrap();
    batch.draw(&mut target).unwrap();
    assert_eq!(target.ingested, vec![(3, true)]);
}
