use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, GrayImage, ImageBuffer, Luma};

/// Encodes an 8-bit grayscale buffer as JPEG at the given quality (0-100).
pub fn encode_jpeg_gray(pixels: &[u8], width: u32, height: u32, quality: u8) -> anyhow::Result<Vec<u8>> {
    anyhow::ensure!(
        pixels.len() as u64 == width as u64 * height as u64,
        "buffer length {} does not match {width}x{height}",
        pixels.len()
    );
    let img: GrayImage = ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels.to_vec())
        .ok_or_else(|| anyhow::anyhow!("invalid buffer dimensions"))?;

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder.encode(img.as_raw(), width, height, ColorType::L8)?;
    Ok(out)
}

/// Right-shifts a RAW16 little-endian buffer down to 8 bits and applies a
/// min/max auto-stretch, mirroring the streaming pipeline's display
/// conversion of a RAW16 sensor frame.
pub fn raw16_to_display_gray8(raw: &[u16]) -> Vec<u8> {
    let (min, max) = raw.iter().fold((u16::MAX, u16::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if max > min {
        let range = (max - min) as f32;
        raw.iter()
            .map(|&v| (((v - min) as f32) * 255.0 / range).round().clamp(0.0, 255.0) as u8)
            .collect()
    } else {
        raw.iter().map(|&v| (v >> 8) as u8).collect()
    }
}
