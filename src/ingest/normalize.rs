use anyhow::{anyhow, Result};

/// Raw pixel layouts delivered by capture devices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb24,
    Nv12,
    /// Packed 4:2:2, `Y0 U Y1 V` per pixel pair.
    Yuyv,
}

/// Convert a raw capture buffer to tightly packed RGBA with opaque alpha.
pub fn normalize_to_rgba(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>> {
    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
    match format {
        PixelFormat::Rgb24 => {
            check_len("RGB", pixels, pixel_count.checked_mul(3))?;
            let mut rgba = Vec::with_capacity(pixel_count * 4);
            for px in pixels.chunks_exact(3) {
                rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
            Ok(rgba)
        }
        PixelFormat::Nv12 => nv12_to_rgba(pixels, width as usize, height as usize),
        PixelFormat::Yuyv => {
            if width % 2 != 0 {
                return Err(anyhow!("YUYV frame width must be even, got {}", width));
            }
            check_len("YUYV", pixels, pixel_count.checked_mul(2))?;
            let mut rgba = Vec::with_capacity(pixel_count * 4);
            for quad in pixels.chunks_exact(4) {
                let (y0, u, y1, v) = (quad[0], quad[1], quad[2], quad[3]);
                rgba.extend_from_slice(&yuv_to_rgba(y0, u, v));
                rgba.extend_from_slice(&yuv_to_rgba(y1, u, v));
            }
            Ok(rgba)
        }
    }
}

fn check_len(name: &str, pixels: &[u8], expected: Option<usize>) -> Result<()> {
    let expected = expected.ok_or_else(|| anyhow!("{} frame dimensions overflow", name))?;
    if pixels.len() != expected {
        return Err(anyhow!(
            "{} frame length mismatch: expected {}, got {}",
            name,
            expected,
            pixels.len()
        ));
    }
    Ok(())
}

fn nv12_to_rgba(pixels: &[u8], w: usize, h: usize) -> Result<Vec<u8>> {
    let y_plane = w * h;
    check_len("NV12", pixels, y_plane.checked_add(y_plane / 2))?;

    let mut rgba = vec![0u8; y_plane * 4];
    for j in 0..h {
        for i in 0..w {
            let uv_index = y_plane + (j / 2) * w + (i / 2) * 2;
            let px = yuv_to_rgba(pixels[j * w + i], pixels[uv_index], pixels[uv_index + 1]);
            let offset = (j * w + i) * 4;
            rgba[offset..offset + 4].copy_from_slice(&px);
        }
    }
    Ok(rgba)
}

fn yuv_to_rgba(y: u8, u: u8, v: u8) -> [u8; 4] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;
    [
        clamp_to_u8(y + 1.402_f32 * v),
        clamp_to_u8(y - 0.344_136_f32 * u - 0.714_136_f32 * v),
        clamp_to_u8(y + 1.772_f32 * u),
        255,
    ]
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nv12_conversion_produces_gray() -> Result<()> {
        let nv12 = [vec![128u8; 4], vec![128u8; 2]].concat();
        let rgba = normalize_to_rgba(&nv12, 2, 2, PixelFormat::Nv12)?;
        assert_eq!(rgba, [128u8, 128, 128, 255].repeat(4));
        Ok(())
    }

    #[test]
    fn yuyv_conversion_expands_pixel_pairs() -> Result<()> {
        let yuyv = [255u8, 128, 0, 128];
        let rgba = normalize_to_rgba(&yuyv, 2, 1, PixelFormat::Yuyv)?;
        assert_eq!(rgba, vec![255, 255, 255, 255, 0, 0, 0, 255]);
        assert!(normalize_to_rgba(&yuyv[..3], 2, 1, PixelFormat::Yuyv).is_err());
        Ok(())
    }

    #[test]
    fn rgb_gains_opaque_alpha_and_validates_length() -> Result<()> {
        let rgba = normalize_to_rgba(&[1, 2, 3, 4, 5, 6], 2, 1, PixelFormat::Rgb24)?;
        assert_eq!(rgba, vec![1, 2, 3, 255, 4, 5, 6, 255]);
        assert!(normalize_to_rgba(&[1u8; 5], 2, 1, PixelFormat::Rgb24).is_err());
        Ok(())
    }
}
