//! SVG parsing and rasterization for pane content.

use crate::hits::ReadIndex;
use crate::panel::{ContentBounds, ViewBox};
use resvg::tiny_skia;
use resvg::usvg;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when parsing or rendering a fragment.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to parse SVG: {0}")]
    Parse(#[from] usvg::Error),
    #[error("invalid raster size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("failed to write image '{path}': {source}")]
    Save {
        path: String,
        source: image::ImageError,
    },
}

/// Rendered pixels with premultiplied alpha, ready for texture creation.
pub struct Raster {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Raster {
    /// Converts to a straight-alpha image.
    pub fn to_image(&self) -> image::RgbaImage {
        let mut straight = Vec::with_capacity(self.pixels.len());
        for px in self.pixels.chunks_exact(4) {
            let alpha = px[3];
            if alpha == 0 {
                straight.extend_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            let a = u32::from(alpha);
            let unmultiply = |c: u8| ((u32::from(c) * 255 + a / 2) / a).min(255) as u8;
            straight.extend_from_slice(&[
                unmultiply(px[0]),
                unmultiply(px[1]),
                unmultiply(px[2]),
                alpha,
            ]);
        }

        image::RgbaImage::from_raw(self.width, self.height, straight).unwrap_or_default()
    }

    pub fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        self.to_image()
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|source| RenderError::Save {
                path: path.display().to_string(),
                source,
            })
    }
}

/// Shared parsing options; loads the system font database once.
pub struct SvgRenderer {
    options: usvg::Options<'static>,
}

impl SvgRenderer {
    pub fn new() -> Self {
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();
        log::debug!("Loaded {} font faces", options.fontdb.len());
        Self { options }
    }

    /// Parses fragment markup into a renderable document.
    pub fn parse(&self, markup: &str) -> Result<SvgDocument, RenderError> {
        let tree = usvg::Tree::from_str(markup, &self.options)?;

        let bbox = tree.root().abs_bounding_box();
        let bounds = ContentBounds::new(
            f64::from(bbox.x()),
            f64::from(bbox.y()),
            f64::from(bbox.width()),
            f64::from(bbox.height()),
        );

        Ok(SvgDocument {
            tree,
            bounds,
            reads: ReadIndex::from_markup(markup),
        })
    }
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// A parsed fragment: render tree, content bounds and read hit index.
pub struct SvgDocument {
    tree: usvg::Tree,
    bounds: ContentBounds,
    reads: ReadIndex,
}

impl SvgDocument {
    /// Bounding box of everything drawn, in content coordinates.
    pub fn bounds(&self) -> ContentBounds {
        self.bounds
    }

    pub fn reads(&self) -> &ReadIndex {
        &self.reads
    }

    /// Read under a content coordinate.
    pub fn read_at(&self, x: f64, y: f64) -> Option<&str> {
        self.reads.read_at(x, y)
    }

    /// Rasterizes the part of the document inside `view_box` into `width`×`height` pixels.
    pub fn rasterize(
        &self,
        view_box: ViewBox,
        width: u32,
        height: u32,
    ) -> Result<Raster, RenderError> {
        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or(RenderError::InvalidSize { width, height })?;

        let (scale, [offset_x, offset_y]) =
            view_box.meet_transform(f64::from(width), f64::from(height));
        if scale > 0.0 {
            let transform = tiny_skia::Transform::from_row(
                scale as f32,
                0.0,
                0.0,
                scale as f32,
                offset_x as f32,
                offset_y as f32,
            );
            resvg::render(&self.tree, transform, &mut pixmap.as_mut());
        }

        Ok(Raster {
            width,
            height,
            pixels: pixmap.take(),
        })
    }

    /// Rasterizes the whole document at its natural size.
    pub fn rasterize_full(&self) -> Result<Raster, RenderError> {
        let size = self.tree.size();
        let (width, height) = (size.width().ceil() as u32, size.height().ceil() as u32);
        let view_box = ViewBox {
            x: 0.0,
            y: 0.0,
            width: f64::from(size.width()),
            height: f64::from(size.height()),
        };
        self.rasterize(view_box, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENT: &str = r#"<?xml version="1.0" encoding="utf-8" ?><svg baseProfile="full" height="100%" version="1.1" width="100%" viewBox="0 0 200 100" xmlns="http://www.w3.org/2000/svg"><defs /><g class="svg_viewport">
        <rect x="20" y="10" width="100" height="40" fill="purple" class="read" data-readid="r1"/>
        <rect x="150" y="60" width="30" height="20" fill="red" class="read" data-readid="r2"/>
        </g></svg>"#;

    fn renderer() -> SvgRenderer {
        SvgRenderer {
            options: usvg::Options::default(),
        }
    }

    #[test]
    fn measures_content_bounds() {
        let doc = renderer().parse(FRAGMENT).unwrap();
        assert_eq!(doc.bounds(), ContentBounds::new(20.0, 10.0, 160.0, 70.0));
        assert_eq!(doc.reads().len(), 2);
        assert_eq!(doc.read_at(160.0, 70.0), Some("r2"));
    }

    #[test]
    fn rasterizes_view_box() {
        let doc = renderer().parse(FRAGMENT).unwrap();
        let view_box = ViewBox { x: 20.0, y: 10.0, width: 100.0, height: 40.0 };

        let raster = doc.rasterize(view_box, 50, 20).unwrap();
        assert_eq!((raster.width, raster.height), (50, 20));
        assert_eq!(raster.pixels.len(), 50 * 20 * 4);

        // The first read fills the whole view.
        let center = ((10 * 50 + 25) * 4) as usize;
        assert_eq!(raster.pixels[center + 3], 255);
    }

    #[test]
    fn rejects_empty_raster() {
        let doc = renderer().parse(FRAGMENT).unwrap();
        assert!(matches!(
            doc.rasterize(ViewBox::default(), 0, 10),
            Err(RenderError::InvalidSize { .. })
        ));
    }

    #[test]
    fn rejects_invalid_markup() {
        assert!(matches!(renderer().parse("<svg"), Err(RenderError::Parse(_))));
    }

    #[test]
    fn straight_alpha_conversion() {
        let raster = Raster {
            pixels: vec![64, 0, 0, 128, 0, 0, 0, 0],
            width: 2,
            height: 1,
        };
        let image = raster.to_image();
        assert_eq!(image.get_pixel(0, 0).0, [128, 0, 0, 128]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0, 0, 0]);
    }
}
