//! Sprite - a picture frame drawn as a textured quad

use lumen_paint::{Color, Point, Rect, Transform2D};

use crate::batch::{Batch, BatchPicture, BatchTriangles};
use crate::error::Result;
use crate::picture::Picture;
use crate::triangles::{Triangles, TrianglesData};
use crate::vertex::Vertex;

struct SpriteCache {
    triangles: BatchTriangles,
    picture: BatchPicture,
}

/// A rectangular region of a picture, centered on the origin
///
/// Drawing a sprite sets the batch transform (and color mask) and merges
/// two triangles. The batch proxies are kept between draws and only
/// re-created when the sprite is drawn into a different batch.
pub struct Sprite {
    picture: Picture,
    frame: Rect,
    geometry: TrianglesData,
    cache: Option<SpriteCache>,
}

impl Sprite {
    pub fn new(picture: Picture, frame: Rect) -> Self {
        Self {
            picture,
            frame,
            geometry: quad(frame),
            cache: None,
        }
    }

    pub fn picture(&self) -> &Picture {
        &self.picture
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// The sprite's own (untransformed) geometry
    pub fn geometry(&self) -> &TrianglesData {
        &self.geometry
    }

    pub fn set_picture(&mut self, picture: Picture) {
        if !self.picture.same(&picture) {
            self.picture = picture;
            self.cache = None;
        }
    }

    pub fn set_frame(&mut self, frame: Rect) -> Result<()> {
        if frame == self.frame {
            return Ok(());
        }
        self.frame = frame;
        self.geometry = quad(frame);
        if let Some(cache) = &mut self.cache {
            cache.triangles.update(&self.geometry)?;
        }
        Ok(())
    }

    /// Draw with `matrix` and a white mask
    pub fn draw(&mut self, batch: &mut Batch, matrix: Transform2D) -> Result<()> {
        self.draw_color_mask(batch, matrix, None)
    }

    pub fn draw_color_mask(
        &mut self,
        batch: &mut Batch,
        matrix: Transform2D,
        mask: Option<Color>,
    ) -> Result<()> {
        batch.set_transform(matrix);
        batch.set_color_mask(mask);

        let mut cache = match self.cache.take() {
            Some(cache) if cache.picture.owner() == batch.id() => cache,
            _ => SpriteCache {
                picture: batch.make_picture(&self.picture)?,
                triangles: batch.make_triangles(&self.geometry),
            },
        };
        let result = cache.picture.draw(&mut cache.triangles);
        self.cache = Some(cache);
        result
    }
}

/// Two triangles covering `frame`, centered on the origin, sampling `frame`
fn quad(frame: Rect) -> TrianglesData {
    let center = frame.center();
    let (hw, hh) = (frame.width / 2.0, frame.height / 2.0);
    let corners = [
        Point::new(-hw, -hh),
        Point::new(hw, -hh),
        Point::new(hw, hh),
        Point::new(-hw, -hh),
        Point::new(hw, hh),
        Point::new(-hw, hh),
    ];
    TrianglesData::from_vertices(
        corners
            .iter()
            .map(|&p| {
                Vertex::new(
                    p,
                    Color::WHITE,
                    Point::new(center.x + p.x, center.y + p.y),
                    1.0,
                )
            })
            .collect(),
    )
}
