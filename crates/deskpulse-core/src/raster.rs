//! Bitmap to terminal text, two pixel rows per text row.
//!
//! Each output cell is an upper-half-block glyph: the foreground paints the
//! upper pixel and the background paints the lower one.

use image::{imageops::FilterType, DynamicImage, GenericImageView, RgbImage};
use std::fmt::Write as _;
use thiserror::Error;

pub const DEFAULT_ART_WIDTH: u32 = 40;
pub const UPPER_HALF_BLOCK: char = '\u{2580}';

const SGR_RESET: &str = "\x1b[0m";

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("target width must be at least one cell")]
    ZeroWidth,
    #[error("source image is empty ({width}x{height})")]
    EmptySource { width: u32, height: u32 },
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfBlock {
    pub top: [u8; 3],
    pub bottom: [u8; 3],
}

/// Immutable text block produced by [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArt {
    rows: Vec<Vec<HalfBlock>>,
}

impl RenderedArt {
    pub fn rows(&self) -> &[Vec<HalfBlock>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// 24-bit ANSI rendition, one line per row.
    pub fn to_ansi(&self) -> String {
        let mut out = String::with_capacity(self.width() * self.height() * 40);
        for row in &self.rows {
            for cell in row {
                let [tr, tg, tb] = cell.top;
                let [br, bg, bb] = cell.bottom;
                let _ = write!(
                    out,
                    "\x1b[38;2;{tr};{tg};{tb}m\x1b[48;2;{br};{bg};{bb}m{UPPER_HALF_BLOCK}"
                );
            }
            out.push_str(SGR_RESET);
            out.push('\n');
        }
        out
    }
}

/// Resamples `image` to a `width` x `width` pixel square with Lanczos3 and
/// packs it into half-block rows.
pub fn render(image: &DynamicImage, width: u32) -> Result<RenderedArt, RasterError> {
    if width == 0 {
        return Err(RasterError::ZeroWidth);
    }
    let (source_width, source_height) = image.dimensions();
    if source_width == 0 || source_height == 0 {
        return Err(RasterError::EmptySource {
            width: source_width,
            height: source_height,
        });
    }
    let resized = image.resize_exact(width, width, FilterType::Lanczos3).to_rgb8();
    Ok(pack_half_blocks(&resized))
}

pub fn render_bytes(bytes: &[u8], width: u32) -> Result<RenderedArt, RasterError> {
    let image = image::load_from_memory(bytes)?;
    render(&image, width)
}

/// An odd final pixel row is used for both halves of its cell.
pub fn pack_half_blocks(pixels: &RgbImage) -> RenderedArt {
    let (width, height) = pixels.dimensions();
    let mut rows = Vec::with_capacity(height.div_ceil(2) as usize);
    for y in (0..height).step_by(2) {
        let mut row = Vec::with_capacity(width as usize);
        for x in 0..width {
            let top = pixels.get_pixel(x, y).0;
            let bottom = if y + 1 < height {
                pixels.get_pixel(x, y + 1).0
            } else {
                top
            };
            row.push(HalfBlock { top, bottom });
        }
        rows.push(row);
    }
    RenderedArt { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn striped(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |_, y| Rgb([(y * 10) as u8, 0, 255]))
    }

    #[test]
    fn packs_two_pixel_rows_per_text_row() {
        let art = pack_half_blocks(&striped(3, 4));
        assert_eq!(art.height(), 2);
        assert_eq!(art.width(), 3);
        assert_eq!(art.rows()[0][1].top, [0, 0, 255]);
        assert_eq!(art.rows()[0][1].bottom, [10, 0, 255]);
        assert_eq!(art.rows()[1][2].top, [20, 0, 255]);
        assert_eq!(art.rows()[1][2].bottom, [30, 0, 255]);
    }

    #[test]
    fn odd_height_reuses_last_row_for_both_halves() {
        let art = pack_half_blocks(&striped(2, 3));
        assert_eq!(art.height(), 2);
        let last = art.rows()[1][0];
        assert_eq!(last.top, [20, 0, 255]);
        assert_eq!(last.bottom, last.top);
    }

    #[test]
    fn render_produces_square_pixel_grid() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 32, Rgb([200, 100, 50])));
        let art = render(&image, 6).expect("render");
        assert_eq!(art.width(), 6);
        assert_eq!(art.height(), 3);
        // Resampling a flat color may drift by one step from float rounding.
        let close = |pixel: [u8; 3]| {
            pixel
                .iter()
                .zip([200u8, 100, 50])
                .all(|(got, want)| got.abs_diff(want) <= 1)
        };
        for row in art.rows() {
            for cell in row {
                assert!(close(cell.top), "top {:?}", cell.top);
                assert!(close(cell.bottom), "bottom {:?}", cell.bottom);
            }
        }
    }

    #[test]
    fn render_with_odd_width_does_not_read_past_last_row() {
        let image = DynamicImage::ImageRgb8(striped(10, 10));
        let art = render(&image, 5).expect("render");
        assert_eq!(art.height(), 3);
        let last = art.rows()[2][4];
        assert_eq!(last.top, last.bottom);
    }

    #[test]
    fn render_rejects_zero_width_and_empty_source() {
        let image = DynamicImage::ImageRgb8(striped(4, 4));
        assert!(matches!(render(&image, 0), Err(RasterError::ZeroWidth)));

        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(
            render(&empty, 4),
            Err(RasterError::EmptySource { .. })
        ));
    }

    #[test]
    fn render_bytes_decodes_png() {
        let mut encoded = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])))
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .expect("encode");
        let art = render_bytes(&encoded, 4).expect("render");
        assert_eq!(art.height(), 2);
        assert_eq!(art.width(), 4);

        assert!(matches!(
            render_bytes(b"not an image", 4),
            Err(RasterError::Decode(_))
        ));
    }

    #[test]
    fn ansi_output_sets_both_colors_and_resets_each_row() {
        let art = pack_half_blocks(&RgbImage::from_pixel(1, 2, Rgb([9, 8, 7])));
        assert_eq!(
            art.to_ansi(),
            "\x1b[38;2;9;8;7m\x1b[48;2;9;8;7m\u{2580}\x1b[0m\n"
        );
    }
}
