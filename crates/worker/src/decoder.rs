use anyhow::{Context, Result, bail};

/// Decodes raw camera frames to tightly packed RGB (3 bytes per pixel).
pub trait FrameDecoder: Send {
    /// Returns a reference into the decoder's internal buffer, valid until
    /// the next call.
    fn decode(&mut self, raw: &[u8], width: u32, height: u32) -> Result<&[u8]>;
}

/// YUYV (YUV 4:2:2) decoder: 4 bytes carry 2 pixels as [Y0, U, Y1, V].
pub struct YuyvDecoder {
    rgb: Vec<u8>,
}

impl YuyvDecoder {
    pub fn new() -> Self {
        Self { rgb: Vec::new() }
    }
}

impl Default for YuyvDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder for YuyvDecoder {
    fn decode(&mut self, raw: &[u8], width: u32, height: u32) -> Result<&[u8]> {
        let pixel_count = (width * height) as usize;
        let rgb_size = pixel_count * 3;
        let row_bytes = (width * 2) as usize;

        if raw.len() < row_bytes * height as usize {
            bail!(
                "YUYV frame too short: {} bytes for {}x{}",
                raw.len(),
                width,
                height
            );
        }

        self.rgb.resize(rgb_size, 0);

        // Driver may pad rows; honor the actual stride.
        let stride = raw.len() / height as usize;
        let mut out = 0;

        for row in 0..height as usize {
            let row_data = &raw[row * stride..row * stride + row_bytes];

            for quad in row_data.chunks_exact(4) {
                let y0 = quad[0] as i32;
                let u = quad[1] as i32 - 128;
                let y1 = quad[2] as i32;
                let v = quad[3] as i32 - 128;

                // BT.601, fixed point with an 8-bit fraction:
                // R = Y + 1.402 V, G = Y - 0.344 U - 0.714 V, B = Y + 1.772 U
                let rv = (359 * v) >> 8;
                let gu = (88 * u + 183 * v) >> 8;
                let bu = (454 * u) >> 8;

                for y in [y0, y1] {
                    self.rgb[out] = (y + rv).clamp(0, 255) as u8;
                    self.rgb[out + 1] = (y - gu).clamp(0, 255) as u8;
                    self.rgb[out + 2] = (y + bu).clamp(0, 255) as u8;
                    out += 3;
                }
            }
        }

        Ok(&self.rgb[..rgb_size])
    }
}

/// MJPEG decoder backed by the `image` crate's JPEG support.
pub struct MjpegDecoder {
    rgb: Vec<u8>,
}

impl MjpegDecoder {
    pub fn new() -> Self {
        Self { rgb: Vec::new() }
    }
}

impl Default for MjpegDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder for MjpegDecoder {
    fn decode(&mut self, raw: &[u8], width: u32, height: u32) -> Result<&[u8]> {
        let img = image::load_from_memory_with_format(raw, image::ImageFormat::Jpeg)
            .context("MJPEG frame decode failed")?
            .into_rgb8();

        if (img.width(), img.height()) != (width, height) {
            bail!(
                "MJPEG frame is {}x{}, expected {}x{}",
                img.width(),
                img.height(),
                width,
                height
            );
        }

        self.rgb.clear();
        self.rgb.extend_from_slice(img.as_raw());
        Ok(&self.rgb)
    }
}

/// BT.601 luma conversion for the detector's single-channel input.
pub fn rgb_to_luma(rgb: &[u8], luma: &mut Vec<u8>) {
    luma.clear();
    luma.reserve(rgb.len() / 3);
    for px in rgb.chunks_exact(3) {
        let y = (77 * px[0] as u32 + 150 * px[1] as u32 + 29 * px[2] as u32) >> 8;
        luma.push(y as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuyv_neutral_chroma_decodes_to_gray() {
        let mut decoder = YuyvDecoder::new();
        // 2x1 frame, Y=128, neutral U/V.
        let rgb = decoder.decode(&[128, 128, 128, 128], 2, 1).unwrap();
        assert_eq!(rgb.len(), 6);
        for &b in rgb {
            assert!((b as i32 - 128).abs() <= 2, "expected near-gray, got {b}");
        }
    }

    #[test]
    fn yuyv_rejects_truncated_frame() {
        let mut decoder = YuyvDecoder::new();
        assert!(decoder.decode(&[128, 128], 2, 2).is_err());
    }

    #[test]
    fn mjpeg_rejects_garbage() {
        let mut decoder = MjpegDecoder::new();
        assert!(decoder.decode(&[0, 1, 2, 3], 640, 480).is_err());
    }

    #[test]
    fn mjpeg_roundtrip_preserves_dimensions() {
        use image::RgbImage;
        use std::io::Cursor;

        let img = RgbImage::from_pixel(8, 4, image::Rgb([200, 10, 10]));
        let mut jpeg = Cursor::new(Vec::new());
        img.write_to(&mut jpeg, image::ImageFormat::Jpeg).unwrap();

        let mut decoder = MjpegDecoder::new();
        let rgb = decoder.decode(jpeg.get_ref(), 8, 4).unwrap();
        assert_eq!(rgb.len(), 8 * 4 * 3);

        // Wrong expected dimensions must be caught, not silently resized.
        assert!(decoder.decode(jpeg.get_ref(), 4, 8).is_err());
    }

    #[test]
    fn luma_weights_sum_to_full_scale() {
        let mut luma = Vec::new();
        rgb_to_luma(&[255, 255, 255, 0, 0, 0], &mut luma);
        assert_eq!(luma.len(), 2);
        assert!(luma[0] >= 250, "white should map near 255, got {}", luma[0]);
        assert_eq!(luma[1], 0);
    }
}
