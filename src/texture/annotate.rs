//! Debug overlay for tile textures: border and centered address label.
//!
//! Used to visually verify tile alignment during development. The label only
//! ever contains tile addresses ("z/x/y"), so a tiny built-in 5x7 glyph set
//! covers it without pulling in a font stack.

use image::{Rgba, RgbaImage};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
/// Pixel scale applied to the 5x7 glyphs.
const GLYPH_SCALE: u32 = 2;
/// Horizontal advance between characters, unscaled.
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

/// 5x7 bitmaps, one row per byte, bit 4 = leftmost column.
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '/' => [0x01, 0x01, 0x02, 0x04, 0x08, 0x10, 0x10],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        'x' => [0x00, 0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11],
        'y' => [0x00, 0x00, 0x11, 0x11, 0x0F, 0x01, 0x0E],
        'z' => [0x00, 0x00, 0x1F, 0x02, 0x04, 0x08, 0x1F],
        ' ' => [0x00; 7],
        _ => return None,
    };
    Some(rows)
}

/// Draw a one-pixel border along the image edge.
pub fn draw_border(img: &mut RgbaImage, color: [u8; 4]) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    for x in 0..w {
        img.put_pixel(x, 0, Rgba(color));
        img.put_pixel(x, h - 1, Rgba(color));
    }
    for y in 0..h {
        img.put_pixel(0, y, Rgba(color));
        img.put_pixel(w - 1, y, Rgba(color));
    }
}

/// Draw a label centered in the image. Characters without a glyph render as
/// blanks.
pub fn draw_centered_label(img: &mut RgbaImage, label: &str, color: [u8; 4]) {
    let (w, h) = img.dimensions();
    let n = label.chars().count() as u32;
    if n == 0 {
        return;
    }
    let text_w = n * GLYPH_ADVANCE * GLYPH_SCALE;
    let text_h = GLYPH_HEIGHT * GLYPH_SCALE;
    let x0 = w.saturating_sub(text_w) / 2;
    let y0 = h.saturating_sub(text_h) / 2;

    for (ci, c) in label.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let cx = x0 + ci as u32 * GLYPH_ADVANCE * GLYPH_SCALE;
        for (ry, row) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if row & (1u8 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                for sy in 0..GLYPH_SCALE {
                    for sx in 0..GLYPH_SCALE {
                        let px = cx + col * GLYPH_SCALE + sx;
                        let py = y0 + ry as u32 * GLYPH_SCALE + sy;
                        if px < w && py < h {
                            img.put_pixel(px, py, Rgba(color));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];

    #[test]
    fn test_border_marks_edges_only() {
        let mut img = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        draw_border(&mut img, WHITE);
        assert_eq!(img.get_pixel(0, 0).0, WHITE);
        assert_eq!(img.get_pixel(15, 7).0, WHITE);
        assert_eq!(img.get_pixel(7, 15).0, WHITE);
        assert_eq!(img.get_pixel(7, 7).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_label_changes_center_pixels() {
        let mut img = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]));
        draw_centered_label(&mut img, "2/1/3", WHITE);
        let lit = img.pixels().filter(|p| p.0 == WHITE).count();
        assert!(lit > 0);
        // everything drawn stays near the vertical center
        for (_, y, p) in img.enumerate_pixels() {
            if p.0 == WHITE {
                assert!((y as i32 - 32).abs() <= 10);
            }
        }
    }

    #[test]
    fn test_unknown_chars_render_blank() {
        let mut img = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 255]));
        draw_centered_label(&mut img, "@@", WHITE);
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_label_on_tiny_image_does_not_panic() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        draw_centered_label(&mut img, "12/345/678", WHITE);
        draw_border(&mut img, WHITE);
    }
}
