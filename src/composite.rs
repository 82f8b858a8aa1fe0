use crate::error::{PosterError, PosterResult};

pub type PremulRgba8 = [u8; 4];

/// Source-over blend of premultiplied pixels with an extra opacity factor.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> PosterResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(PosterError::image_processing(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Destination-in: keep `dst` only where the mask has alpha, scaled by it.
///
/// Both buffers are premultiplied, so every channel is scaled by the mask's
/// alpha, not just the alpha plane.
pub fn alpha_intersect_in_place(dst: &mut [u8], mask: &[u8]) -> PosterResult<()> {
    if dst.len() != mask.len() || !dst.len().is_multiple_of(4) {
        return Err(PosterError::image_processing(
            "alpha_intersect_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, m) in dst.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let ma = u16::from(m[3]);
        for c in d.iter_mut() {
            *c = mul_div255(u16::from(*c), ma);
        }
    }
    Ok(())
}

/// Uniform alpha multiply, the degenerate alpha-intersection with a constant
/// mask.
pub fn multiply_alpha_in_place(dst: &mut [u8], opacity: f32) {
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    if op == 255 {
        return;
    }
    for px in dst.chunks_exact_mut(4) {
        for c in px.iter_mut() {
            *c = mul_div255(u16::from(*c), op);
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}
