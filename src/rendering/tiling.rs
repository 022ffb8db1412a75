//! Tiled previews of a seamless pattern tile.
//!
//! Composes an `n x n` grid from a single PNG tile. Purely presentational:
//! it repeats the producer's tile as-is.

use crate::error::RenderError;
use tiny_skia::{Pixmap, PixmapPaint, Transform};

/// Largest grid edge accepted
pub const MAX_TILES: u32 = 6;

/// Largest output edge in pixels
pub const MAX_EDGE_PX: u32 = 16_384;

/// Repeat a PNG tile into an `n x n` grid and encode the result as PNG
pub fn tile_png(png: &[u8], n: u32) -> Result<Vec<u8>, RenderError> {
    if n == 0 || n > MAX_TILES {
        return Err(RenderError::UnsupportedTileCount(n));
    }

    let tile = Pixmap::decode_png(png).map_err(|e| RenderError::PngDecode(e.to_string()))?;
    let (w, h) = (tile.width(), tile.height());

    let width = w.checked_mul(n).filter(|&v| v <= MAX_EDGE_PX);
    let height = h.checked_mul(n).filter(|&v| v <= MAX_EDGE_PX);
    let (Some(width), Some(height)) = (width, height) else {
        return Err(RenderError::PixmapAllocation);
    };

    let mut canvas = Pixmap::new(width, height).ok_or(RenderError::PixmapAllocation)?;
    let paint = PixmapPaint::default();
    for row in 0..n {
        for col in 0..n {
            canvas.draw_pixmap(
                (col * w) as i32,
                (row * h) as i32,
                tile.as_ref(),
                &paint,
                Transform::identity(),
                None,
            );
        }
    }

    tracing::debug!(tile_w = w, tile_h = h, n, "Composed tiled preview");
    canvas
        .encode_png()
        .map_err(|e| RenderError::PngEncode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    fn two_tone_tile() -> Vec<u8> {
        let mut tile = Pixmap::new(2, 1).unwrap();
        tile.fill(Color::from_rgba8(255, 0, 0, 255));
        let blue = tiny_skia::PremultipliedColorU8::from_rgba(0, 0, 255, 255).unwrap();
        tile.pixels_mut()[1] = blue;
        tile.encode_png().unwrap()
    }

    #[test]
    fn test_tile_grid_dimensions_and_pixels() {
        let out = tile_png(&two_tone_tile(), 3).unwrap();
        let grid = Pixmap::decode_png(&out).unwrap();

        assert_eq!((grid.width(), grid.height()), (6, 3));
        for row in 0..3 {
            for col in 0..3 {
                let red = grid.pixel(col * 2, row).unwrap();
                let blue = grid.pixel(col * 2 + 1, row).unwrap();
                assert_eq!((red.red(), red.blue()), (255, 0));
                assert_eq!((blue.red(), blue.blue()), (0, 255));
            }
        }
    }

    #[test]
    fn test_single_tile_is_identity_size() {
        let out = tile_png(&two_tone_tile(), 1).unwrap();
        let grid = Pixmap::decode_png(&out).unwrap();
        assert_eq!((grid.width(), grid.height()), (2, 1));
    }

    #[test]
    fn test_rejects_bad_tile_count() {
        assert!(matches!(
            tile_png(&two_tone_tile(), 0),
            Err(RenderError::UnsupportedTileCount(0))
        ));
        assert!(matches!(
            tile_png(&two_tone_tile(), MAX_TILES + 1),
            Err(RenderError::UnsupportedTileCount(_))
        ));
    }

    #[test]
    fn test_rejects_non_png() {
        assert!(matches!(
            tile_png(b"not a png", 2),
            Err(RenderError::PngDecode(_))
        ));
    }
}
