//! Pictures: drawable image sources
//!
//! A [`Picture`] is a shared handle. Two handles are equal only when they
//! point at the same underlying source; two sources with identical pixels
//! are still different pictures.

use std::fmt;
use std::sync::Arc;

use lumen_paint::{Color, Point, Rect};

/// Anything that can be sampled as a picture
pub trait PictureSource: fmt::Debug + Send + Sync {
    fn bounds(&self) -> Rect;
}

/// Shared, identity-compared handle to a [`PictureSource`]
#[derive(Clone)]
pub struct Picture {
    source: Arc<dyn PictureSource>,
}

impl Picture {
    pub fn new(source: impl PictureSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub fn from_arc(source: Arc<dyn PictureSource>) -> Self {
        Self { source }
    }

    pub fn bounds(&self) -> Rect {
        self.source.bounds()
    }

    pub fn source(&self) -> &dyn PictureSource {
        &*self.source
    }

    /// True when both handles refer to the same source
    pub fn same(&self, other: &Picture) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.source), Arc::as_ptr(&other.source))
    }
}

impl PartialEq for Picture {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Picture {}

impl fmt::Debug for Picture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Picture")
            .field("addr", &Arc::as_ptr(&self.source).cast::<()>())
            .field("bounds", &self.bounds())
            .finish()
    }
}

/// CPU-side picture: a row-major grid of colors covering `bounds`
#[derive(Clone, Debug, PartialEq)]
pub struct PictureData {
    bounds: Rect,
    stride: usize,
    pixels: Vec<Color>,
}

impl PictureData {
    /// Fully transparent picture covering `bounds` (rounded up to whole pixels)
    pub fn new(bounds: Rect) -> Self {
        let width = bounds.width.max(0.0).ceil() as usize;
        let height = bounds.height.max(0.0).ceil() as usize;
        Self {
            bounds,
            stride: width,
            pixels: vec![Color::TRANSPARENT; width * height],
        }
    }

    /// Picture at the origin from `width * height` colors in row-major order.
    ///
    /// Returns `None` when the pixel count does not match the size.
    pub fn from_colors(width: usize, height: usize, pixels: Vec<Color>) -> Option<Self> {
        if pixels.len() != width * height {
            return None;
        }
        Some(Self {
            bounds: Rect::new(0.0, 0.0, width as f32, height as f32),
            stride: width,
            pixels,
        })
    }

    /// Convert a decoded RGBA image
    #[cfg(feature = "image")]
    pub fn from_rgba_image(image: &image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let pixels = image
            .pixels()
            .map(|p| Color::from_rgba8(p[0], p[1], p[2], p[3]))
            .collect();
        Self {
            bounds: Rect::new(0.0, 0.0, width as f32, height as f32),
            stride: width as usize,
            pixels,
        }
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Color at `at`, transparent outside the bounds
    pub fn color_at(&self, at: Point) -> Color {
        if !self.bounds.contains(at) {
            return Color::TRANSPARENT;
        }
        let col = (at.x - self.bounds.x).floor() as usize;
        let row = (at.y - self.bounds.y).floor() as usize;
        self.pixels
            .get(row * self.stride + col)
            .copied()
            .unwrap_or(Color::TRANSPARENT)
    }
}

impl PictureSource for PictureData {
    fn bounds(&self) -> Rect {
        self.bounds
    }
}
