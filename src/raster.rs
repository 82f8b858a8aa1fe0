use std::io::Cursor;

use image::imageops::FilterType;

use crate::{
    composite,
    error::{PosterError, PosterResult},
};

/// Hard cap on width and height, in pixels per axis.
pub const MAX_DIMENSION: u32 = 10_000;

/// Owned pixel buffer every render stage reads and writes.
#[derive(Clone, Debug)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub data: Vec<u8>,
}

impl Raster {
    /// Fully transparent buffer.
    pub fn blank(width: u32, height: u32) -> PosterResult<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Buffer with every pixel set to `px`.
    pub fn filled(width: u32, height: u32, px: [u8; 4]) -> PosterResult<Self> {
        let len = byte_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len / 4 {
            data.extend_from_slice(&px);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_premul_data(width: u32, height: u32, data: Vec<u8>) -> PosterResult<Self> {
        let len = byte_len(width, height)?;
        if data.len() != len {
            return Err(PosterError::image_processing(
                "raster data does not match width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Decode encoded image bytes (PNG, JPEG, ...) and convert to
    /// premultiplied RGBA8.
    pub fn decode(bytes: &[u8]) -> PosterResult<Self> {
        let dyn_img = image::load_from_memory(bytes)
            .map_err(|err| PosterError::image_processing(format!("decode image: {err}")))?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut data = rgba.into_raw();
        premultiply_rgba8_in_place(&mut data);

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    /// Lanczos3 resample to exactly `width` x `height`.
    ///
    /// Operates directly on the premultiplied buffer so transparent
    /// neighborhoods cannot bleed halos into the result.
    pub fn resize(&self, width: u32, height: u32) -> PosterResult<Self> {
        if width == 0 || height == 0 {
            return Err(PosterError::invalid_input(
                "resize target must be at least 1x1",
            ));
        }
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        let img = image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| PosterError::image_processing("raster buffer shape mismatch"))?;
        let resized = image::imageops::resize(&img, width, height, FilterType::Lanczos3);
        Ok(Self {
            width,
            height,
            data: resized.into_raw(),
        })
    }

    /// Source-over blit of `src` with its top-left corner at
    /// (`origin_x`, `origin_y`). Off-canvas regions are clipped, so negative
    /// origins and overhangs are fine.
    pub fn blit_over(
        &mut self,
        src: &Raster,
        origin_x: i64,
        origin_y: i64,
        opacity: f32,
    ) -> PosterResult<()> {
        let x0 = origin_x.max(0);
        let y0 = origin_y.max(0);
        let x1 = (origin_x + i64::from(src.width)).min(i64::from(self.width));
        let y1 = (origin_y + i64::from(src.height)).min(i64::from(self.height));
        if x0 >= x1 || y0 >= y1 {
            return Ok(());
        }

        let run = ((x1 - x0) as usize) * 4;
        for dy in y0..y1 {
            let sy = (dy - origin_y) as usize;
            let sx = (x0 - origin_x) as usize;
            let si = (sy * (src.width as usize) + sx) * 4;
            let di = ((dy as usize) * (self.width as usize) + (x0 as usize)) * 4;
            composite::over_in_place(
                &mut self.data[di..di + run],
                &src.data[si..si + run],
                opacity,
            )?;
        }
        Ok(())
    }

    /// Encode as PNG with straight (unpremultiplied) alpha.
    pub fn to_png(&self) -> PosterResult<Vec<u8>> {
        let straight = unpremultiply_rgba8(&self.data);
        let img = image::RgbaImage::from_raw(self.width, self.height, straight)
            .ok_or_else(|| PosterError::image_processing("raster buffer shape mismatch"))?;
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|err| PosterError::image_processing(format!("encode png: {err}")))?;
        Ok(buf)
    }

    /// Encode as JPEG, dropping alpha. `quality` is the usual 1..=100 scale.
    pub fn to_jpeg(&self, quality: u8) -> PosterResult<Vec<u8>> {
        let straight = unpremultiply_rgba8(&self.data);
        let rgb: Vec<u8> = straight
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        let img = image::RgbImage::from_raw(self.width, self.height, rgb)
            .ok_or_else(|| PosterError::image_processing("raster buffer shape mismatch"))?;
        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
        img.write_with_encoder(encoder)
            .map_err(|err| PosterError::image_processing(format!("encode jpeg: {err}")))?;
        Ok(buf)
    }
}

fn byte_len(width: u32, height: u32) -> PosterResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| PosterError::image_processing("raster size overflow"))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

fn unpremultiply_rgba8(premul: &[u8]) -> Vec<u8> {
    let mut out = premul.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        for c in &mut px[..3] {
            let v = (u16::from(*c) * 255 + a / 2) / a;
            *c = v.min(255) as u8;
        }
    }
    out
}
