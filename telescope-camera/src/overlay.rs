use image::{Rgb, RgbImage};
use telescope_types::{CameraInfo, OverlayConfig, OverlayType};

use crate::font::glyph_rows;
use crate::policy::OverlayRenderer;

/// Renders crosshair/grid/circle overlays onto a decoded JPEG image and
/// re-encodes it. `Custom` overlays are left to the caller's own renderer;
/// this implementation treats them as a no-op passthrough.
pub struct DefaultOverlayRenderer;

impl OverlayRenderer for DefaultOverlayRenderer {
    fn render(&self, image_bytes: &[u8], config: &OverlayConfig, _info: &CameraInfo) -> anyhow::Result<Vec<u8>> {
        if !config.enabled || config.overlay_type == OverlayType::None {
            return Ok(image_bytes.to_vec());
        }
        let decoded = image::load_from_memory(image_bytes)?.to_rgb8();
        let mut img = decoded;
        let color = Rgb([config.color.r, config.color.g, config.color.b]);

        match config.overlay_type {
            OverlayType::Crosshair => draw_crosshair(&mut img, color),
            OverlayType::Grid => draw_grid(&mut img, color),
            OverlayType::Circles => draw_circles(&mut img, color),
            OverlayType::Custom | OverlayType::None => {}
        }

        let mut out = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut out);
        img.write_to(&mut cursor, image::ImageOutputFormat::Jpeg(85))?;
        Ok(out)
    }
}

fn blend(img: &mut RgbImage, x: u32, y: u32, color: Rgb<u8>, alpha: f32) {
    if x >= img.width() || y >= img.height() {
        return;
    }
    let existing = img.get_pixel(x, y).0;
    let blended = [0, 1, 2].map(|i| {
        (existing[i] as f32 * (1.0 - alpha) + color.0[i] as f32 * alpha).round() as u8
    });
    img.put_pixel(x, y, Rgb(blended));
}

fn draw_crosshair(img: &mut RgbImage, color: Rgb<u8>) {
    let (w, h) = (img.width(), img.height());
    let (cx, cy) = (w / 2, h / 2);
    for x in 0..w {
        blend(img, x, cy, color, 0.8);
    }
    for y in 0..h {
        blend(img, cx, y, color, 0.8);
    }
}

fn draw_grid(img: &mut RgbImage, color: Rgb<u8>) {
    let (w, h) = (img.width(), img.height());
    let step = (w.max(1) / 10).max(1);
    let mut x = 0;
    while x < w {
        for y in 0..h {
            blend(img, x, y, color, 0.4);
        }
        x += step;
    }
    let mut y = 0;
    while y < h {
        for x in 0..w {
            blend(img, x, y, color, 0.4);
        }
        y += step;
    }
}

fn draw_circles(img: &mut RgbImage, color: Rgb<u8>) {
    let (w, h) = (img.width(), img.height());
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let max_r = cx.min(cy);
    for frac in [0.25, 0.5, 0.75, 1.0] {
        let r = max_r * frac;
        let steps = (2.0 * std::f32::consts::PI * r).ceil() as u32 + 1;
        for i in 0..steps {
            let theta = i as f32 / steps as f32 * std::f32::consts::TAU;
            let x = (cx + r * theta.cos()).round();
            let y = (cy + r * theta.sin()).round();
            if x >= 0.0 && y >= 0.0 {
                blend(img, x as u32, y as u32, color, 0.8);
            }
        }
    }
}

/// Stamps a single line of text into the top-left corner of an 8-bit
/// grayscale buffer using a small built-in bitmap font, alpha-blending each
/// glyph's pixels onto the buffer (the same blend-over-buffer approach as
/// the driver-level overlay stamping, just against a byte buffer instead of
/// a typed pixel-format image).
pub fn stamp_text_gray(pixels: &mut [u8], width: u32, height: u32, text: &str) {
    const GLYPH_W: u32 = 5;
    const GLYPH_H: u32 = 7;
    const SCALE: u32 = 2;
    const MARGIN: u32 = 4;

    for (i, ch) in text.chars().enumerate() {
        let rows = glyph_rows(ch);
        let gx0 = MARGIN + i as u32 * (GLYPH_W + 1) * SCALE;
        if gx0 + GLYPH_W * SCALE >= width {
            break;
        }
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                for sy in 0..SCALE {
                    for sx in 0..SCALE {
                        let x = gx0 + col * SCALE + sx;
                        let y = MARGIN + row as u32 * SCALE + sy;
                        if x >= width || y >= height {
                            continue;
                        }
                        let idx = (y * width + x) as usize;
                        if let Some(px) = pixels.get_mut(idx) {
                            *px = 255;
                        }
                    }
                }
            }
        }
    }
}
