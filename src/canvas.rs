use crate::{
    color::{Color, is_valid_hex_color, parse_color},
    error::{PosterError, PosterResult},
    raster::{MAX_DIMENSION, Raster},
};

/// Requested canvas dimensions as they arrive from template JSON.
///
/// Kept as `f64` so a fractional value like `100.5` is representable and can
/// be rejected with a precise message instead of being truncated on parse.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct CanvasSpec {
    pub width: f64,
    pub height: f64,
}

impl CanvasSpec {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Checked conversion to pixel dimensions.
    pub fn resolve(&self) -> PosterResult<(u32, u32)> {
        let width = check_dimension(self.width)
            .map_err(|reason| PosterError::invalid_input(format!("canvas.width {reason}")))?;
        let height = check_dimension(self.height)
            .map_err(|reason| PosterError::invalid_input(format!("canvas.height {reason}")))?;
        Ok((width, height))
    }
}

/// One dimension of a canvas or resize target. Returns the reason string
/// without a field name so callers can prefix their own path.
pub(crate) fn check_dimension(value: f64) -> Result<u32, String> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(format!("must be an integer, got {value}"));
    }
    if value < 1.0 {
        return Err(format!("must be positive, got {value}"));
    }
    if value > f64::from(MAX_DIMENSION) {
        return Err(format!("must be at most {MAX_DIMENSION}, got {value}"));
    }
    Ok(value as u32)
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Fill {
    Solid {
        color: String,
    },
    Gradient {
        direction: GradientDirection,
        stops: Vec<GradientStop>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradientDirection {
    ToBottom,
    ToRight,
    ToBottomRight,
    Radial,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GradientStop {
    pub color: String,
    /// Stop position along the gradient axis, percent in `[0, 100]`.
    pub position: f64,
}

pub const MIN_GRADIENT_STOPS: usize = 2;
pub const MAX_GRADIENT_STOPS: usize = 4;

/// Build the background raster for a poster.
#[tracing::instrument(skip(fill))]
pub fn create_canvas(spec: &CanvasSpec, fill: &Fill) -> PosterResult<Raster> {
    let (width, height) = spec.resolve()?;
    match fill {
        Fill::Solid { color } => {
            if !is_valid_hex_color(color) {
                return Err(PosterError::invalid_input(format!(
                    "solid fill requires a hex color like #rrggbb, got '{color}'"
                )));
            }
            let px = parse_color(color)?.to_premul_rgba8();
            Raster::filled(width, height, px)
        }
        Fill::Gradient { direction, stops } => {
            let stops = resolve_stops(stops)?;
            Ok(gradient_raster(width, height, *direction, &stops))
        }
    }
}

/// Validate count, positions, and colors, then sort by position.
pub(crate) fn resolve_stops(stops: &[GradientStop]) -> PosterResult<Vec<(Color, f64)>> {
    if stops.len() < MIN_GRADIENT_STOPS || stops.len() > MAX_GRADIENT_STOPS {
        return Err(PosterError::invalid_input(format!(
            "gradient requires {MIN_GRADIENT_STOPS} to {MAX_GRADIENT_STOPS} stops, got {}",
            stops.len()
        )));
    }
    let mut resolved = Vec::with_capacity(stops.len());
    for stop in stops {
        if !stop.position.is_finite() || !(0.0..=100.0).contains(&stop.position) {
            return Err(PosterError::invalid_input(format!(
                "gradient stop position must be within 0..=100, got {}",
                stop.position
            )));
        }
        resolved.push((parse_color(&stop.color)?, stop.position));
    }
    resolved.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(resolved)
}

fn gradient_raster(
    width: u32,
    height: u32,
    direction: GradientDirection,
    stops: &[(Color, f64)],
) -> Raster {
    let w = width as usize;
    let h = height as usize;
    let mut data = vec![0u8; w * h * 4];

    match direction {
        GradientDirection::ToBottom => {
            for y in 0..h {
                let t = axis_fraction(y, h);
                let px = color_at(stops, t).to_premul_rgba8();
                for chunk in data[y * w * 4..(y + 1) * w * 4].chunks_exact_mut(4) {
                    chunk.copy_from_slice(&px);
                }
            }
        }
        GradientDirection::ToRight => {
            let columns: Vec<[u8; 4]> = (0..w)
                .map(|x| color_at(stops, axis_fraction(x, w)).to_premul_rgba8())
                .collect();
            for y in 0..h {
                for (x, px) in columns.iter().enumerate() {
                    data[(y * w + x) * 4..(y * w + x) * 4 + 4].copy_from_slice(px);
                }
            }
        }
        GradientDirection::ToBottomRight => {
            // Project each pixel onto the (w, h) diagonal so the gradient axis
            // runs corner to corner regardless of aspect ratio.
            let wf = width as f64;
            let hf = height as f64;
            let denom = ((w.saturating_sub(1)) as f64) * wf + ((h.saturating_sub(1)) as f64) * hf;
            for y in 0..h {
                for x in 0..w {
                    let t = if denom > 0.0 {
                        ((x as f64) * wf + (y as f64) * hf) / denom
                    } else {
                        0.0
                    };
                    let px = color_at(stops, t).to_premul_rgba8();
                    data[(y * w + x) * 4..(y * w + x) * 4 + 4].copy_from_slice(&px);
                }
            }
        }
        GradientDirection::Radial => {
            let cx = ((w - 1) as f64) / 2.0;
            let cy = ((h - 1) as f64) / 2.0;
            let corner = cx.hypot(cy);
            for y in 0..h {
                for x in 0..w {
                    let dist = ((x as f64) - cx).hypot((y as f64) - cy);
                    let t = if corner > 0.0 { dist / corner } else { 0.0 };
                    let px = color_at(stops, t.min(1.0)).to_premul_rgba8();
                    data[(y * w + x) * 4..(y * w + x) * 4 + 4].copy_from_slice(&px);
                }
            }
        }
    }

    Raster {
        width,
        height,
        data,
    }
}

/// Fraction of the way along one axis, 0 at the first pixel, 1 at the last.
fn axis_fraction(i: usize, len: usize) -> f64 {
    if len <= 1 {
        0.0
    } else {
        (i as f64) / ((len - 1) as f64)
    }
}

/// Piecewise-linear interpolation over sorted stops; positions before the
/// first stop or past the last clamp to the edge colors.
fn color_at(stops: &[(Color, f64)], t: f64) -> Color {
    let pos = t * 100.0;
    let (first, last) = (&stops[0], &stops[stops.len() - 1]);
    if pos <= first.1 {
        return first.0;
    }
    if pos >= last.1 {
        return last.0;
    }
    for pair in stops.windows(2) {
        let (a, pa) = (pair[0].0, pair[0].1);
        let (b, pb) = (pair[1].0, pair[1].1);
        if pos <= pb {
            if pb - pa <= f64::EPSILON {
                return b;
            }
            let u = ((pos - pa) / (pb - pa)) as f32;
            return Color {
                r: lerp_u8(a.r, b.r, u),
                g: lerp_u8(a.g, b.g, u),
                b: lerp_u8(a.b, b.b, u),
                alpha: a.alpha + (b.alpha - a.alpha) * u,
            };
        }
    }
    last.0
}

fn lerp_u8(a: u8, b: u8, u: f32) -> u8 {
    let v = f32::from(a) + (f32::from(b) - f32::from(a)) * u;
    v.round().clamp(0.0, 255.0) as u8
}
