//! Photo-layer compositor.
//!
//! Every layer runs the same fixed stage order: resize, mask, border, shadow,
//! opacity, position. Processed layers land on the background in array order,
//! later layers on top.

use crate::{
    blur,
    color::parse_color,
    composite,
    error::{PosterError, PosterResult, wrap_processing},
    layer::{BorderSpec, CompositeLayer, LayerSize, MaskShape, NamedPosition, Position, ShadowSpec},
    markup::{self, SvgDoc},
    raster::{MAX_DIMENSION, Raster},
};

pub const MAX_BORDER_WIDTH: f64 = 200.0;
pub const MAX_SHADOW_BLUR: f64 = 100.0;
pub const MAX_SHADOW_OFFSET: f64 = 1_000.0;

/// Composite `layers` over `background` and return the merged raster.
///
/// An empty layer list returns a copy of the background.
#[tracing::instrument(skip(background, layers))]
pub fn composite_image(background: &Raster, layers: &[CompositeLayer]) -> PosterResult<Raster> {
    let mut out = background.clone();
    for (index, layer) in layers.iter().enumerate() {
        let placed = process_layer(layer, out.width, out.height)
            .map_err(wrap_processing)
            .map_err(|err| match err {
                PosterError::InvalidInput(msg) => {
                    PosterError::InvalidInput(format!("layer {index}: {msg}"))
                }
                other => other,
            })?;
        out.blit_over(&placed.raster, placed.origin_x, placed.origin_y, 1.0)?;
    }
    Ok(out)
}

struct PlacedLayer {
    raster: Raster,
    origin_x: i64,
    origin_y: i64,
}

fn process_layer(
    layer: &CompositeLayer,
    canvas_w: u32,
    canvas_h: u32,
) -> PosterResult<PlacedLayer> {
    let mut img = stage_resize(&layer.image, layer.size.as_ref())?;
    img = stage_mask(img, &layer.mask)?;
    if let Some(border) = &layer.border {
        img = stage_border(img, &layer.mask, border)?;
    }

    // Positioning resolves against the pre-shadow footprint so the visible
    // image lands where the caller asked even after shadow padding.
    let placed_w = img.width;
    let placed_h = img.height;

    let mut pad = (0u32, 0u32);
    if let Some(shadow) = &layer.shadow {
        let (shadowed, pad_x, pad_y) = stage_shadow(&img, shadow)?;
        img = shadowed;
        pad = (pad_x, pad_y);
    }

    if let Some(opacity) = layer.opacity {
        stage_opacity(&mut img, opacity)?;
    }

    let (x, y) = resolve_position(&layer.position, canvas_w, canvas_h, placed_w, placed_h);
    Ok(PlacedLayer {
        raster: img,
        origin_x: x - i64::from(pad.0),
        origin_y: y - i64::from(pad.1),
    })
}

fn stage_resize(src: &Raster, size: Option<&LayerSize>) -> PosterResult<Raster> {
    let Some(size) = size else {
        return Ok(src.clone());
    };
    let (width, height) = resolve_size(src.width, src.height, size)?;
    if width > src.width || height > src.height {
        tracing::warn!(
            "upscaling layer from {}x{} to {width}x{height} may lose quality",
            src.width,
            src.height
        );
    }
    src.resize(width, height)
}

/// Resolve a [`LayerSize`] against the source dimensions, deriving a missing
/// axis from the aspect ratio (integer-rounded).
pub(crate) fn resolve_size(src_w: u32, src_h: u32, size: &LayerSize) -> PosterResult<(u32, u32)> {
    let check = |v: f64, axis: &str| -> PosterResult<f64> {
        if !v.is_finite() || v <= 0.0 {
            return Err(PosterError::invalid_input(format!(
                "layer size.{axis} must be > 0, got {v}"
            )));
        }
        Ok(v)
    };

    let (w, h) = match (size.width, size.height) {
        (None, None) => {
            return Err(PosterError::invalid_input(
                "layer size requires width or height",
            ));
        }
        (Some(w), Some(h)) => (check(w, "width")?, check(h, "height")?),
        (Some(w), None) => {
            let w = check(w, "width")?;
            (w, w * f64::from(src_h) / f64::from(src_w))
        }
        (None, Some(h)) => {
            let h = check(h, "height")?;
            (h * f64::from(src_w) / f64::from(src_h), h)
        }
    };

    let w = w.round().max(1.0);
    let h = h.round().max(1.0);
    if w > f64::from(MAX_DIMENSION) || h > f64::from(MAX_DIMENSION) {
        return Err(PosterError::invalid_input(format!(
            "layer resize target {w}x{h} exceeds maximum dimension {MAX_DIMENSION}"
        )));
    }
    Ok((w as u32, h as u32))
}

/// Keep only the pixels inside the mask shape (destination-in).
fn stage_mask(img: Raster, mask: &MaskShape) -> PosterResult<Raster> {
    let w = f64::from(img.width);
    let h = f64::from(img.height);
    let shape = match mask {
        MaskShape::None => return Ok(img),
        MaskShape::Circle => {
            markup::circle_element(w / 2.0, h / 2.0, w.min(h) / 2.0, "#ffffff")
        }
        MaskShape::RoundedRect { radius } => {
            if !radius.is_finite() || *radius < 0.0 {
                return Err(PosterError::invalid_input(format!(
                    "mask radius must be >= 0, got {radius}"
                )));
            }
            let clamped = radius.min(w / 2.0).min(h / 2.0);
            markup::rounded_rect_element(0.0, 0.0, w, h, clamped, "#ffffff")
        }
    };

    let mut doc = SvgDoc::new(img.width, img.height);
    doc.push(shape);
    let mask_raster = markup::rasterize_markup(&doc.finish(), img.width, img.height)?;

    let mut out = img;
    composite::alpha_intersect_in_place(&mut out.data, &mask_raster.data)?;
    Ok(out)
}

/// Solid border following the mask contour; grows the layer by the border
/// width on every side.
fn stage_border(img: Raster, mask: &MaskShape, border: &BorderSpec) -> PosterResult<Raster> {
    if !border.width.is_finite() || border.width < 0.0 || border.width > MAX_BORDER_WIDTH {
        return Err(PosterError::invalid_input(format!(
            "border width must be within 0..={MAX_BORDER_WIDTH}, got {}",
            border.width
        )));
    }
    let color = parse_color(&border.color)?;
    let b = border.width.round() as u32;
    if b == 0 {
        return Ok(img);
    }

    let out_w = img.width + 2 * b;
    let out_h = img.height + 2 * b;
    let css = color.to_css();

    let mut backdrop = match mask {
        MaskShape::None => Raster::filled(out_w, out_h, color.to_premul_rgba8())?,
        MaskShape::Circle => {
            let r = f64::from(img.width.min(img.height)) / 2.0 + f64::from(b);
            let mut doc = SvgDoc::new(out_w, out_h);
            doc.push(markup::circle_element(
                f64::from(out_w) / 2.0,
                f64::from(out_h) / 2.0,
                r,
                &css,
            ));
            markup::rasterize_markup(&doc.finish(), out_w, out_h)?
        }
        MaskShape::RoundedRect { radius } => {
            let inner = radius
                .max(0.0)
                .min(f64::from(img.width) / 2.0)
                .min(f64::from(img.height) / 2.0);
            let outer = inner + f64::from(b);
            let mut doc = SvgDoc::new(out_w, out_h);
            doc.push(markup::rounded_rect_element(
                0.0,
                0.0,
                f64::from(out_w),
                f64::from(out_h),
                outer,
                &css,
            ));
            markup::rasterize_markup(&doc.finish(), out_w, out_h)?
        }
    };

    backdrop.blit_over(&img, i64::from(b), i64::from(b), 1.0)?;
    Ok(backdrop)
}

/// Blurred, colorized silhouette beneath the image on an enlarged canvas.
///
/// Padding is `|offset| + 2*blur` per axis; the image sits at the padding
/// origin and the silhouette is displaced by the shadow offset from it.
/// Returns the padded raster plus the per-axis padding for position
/// correction.
fn stage_shadow(img: &Raster, spec: &ShadowSpec) -> PosterResult<(Raster, u32, u32)> {
    if !spec.blur.is_finite() || spec.blur < 0.0 || spec.blur > MAX_SHADOW_BLUR {
        return Err(PosterError::invalid_input(format!(
            "shadow blur must be within 0..={MAX_SHADOW_BLUR}, got {}",
            spec.blur
        )));
    }
    // The offset cap keeps the pad arithmetic below inside u32.
    for (axis, value) in [("x", spec.offset_x), ("y", spec.offset_y)] {
        if !value.is_finite() || value.abs() > MAX_SHADOW_OFFSET {
            return Err(PosterError::invalid_input(format!(
                "shadow offset {axis} magnitude must be at most {MAX_SHADOW_OFFSET}, got {value}"
            )));
        }
    }
    let color = parse_color(&spec.color)?;

    let blur_px = spec.blur.round() as u32;
    let offset_x = spec.offset_x.round() as i64;
    let offset_y = spec.offset_y.round() as i64;
    let pad_x = offset_x.unsigned_abs() as u32 + 2 * blur_px;
    let pad_y = offset_y.unsigned_abs() as u32 + 2 * blur_px;

    let out_w = img.width + 2 * pad_x;
    let out_h = img.height + 2 * pad_y;

    let shadow_px = color.to_premul_rgba8();
    let mut silhouette = Raster::blank(img.width, img.height)?;
    for (dst, src) in silhouette
        .data
        .chunks_exact_mut(4)
        .zip(img.data.chunks_exact(4))
    {
        let a = u16::from(src[3]);
        for (d, s) in dst.iter_mut().zip(shadow_px.iter()) {
            *d = ((u16::from(*s) * a + 127) / 255) as u8;
        }
    }

    let mut canvas = Raster::blank(out_w, out_h)?;
    canvas.blit_over(
        &silhouette,
        i64::from(pad_x) + offset_x,
        i64::from(pad_y) + offset_y,
        1.0,
    )?;

    if blur_px > 0 {
        canvas.data = blur::blur_rgba8_premul(
            &canvas.data,
            out_w,
            out_h,
            blur_px,
            (spec.blur / 2.0) as f32,
        )?;
    }

    canvas.blit_over(img, i64::from(pad_x), i64::from(pad_y), 1.0)?;
    Ok((canvas, pad_x, pad_y))
}

fn stage_opacity(img: &mut Raster, opacity: f64) -> PosterResult<()> {
    if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
        return Err(PosterError::invalid_input(format!(
            "layer opacity must be within 0..=1, got {opacity}"
        )));
    }
    if opacity < 1.0 {
        composite::multiply_alpha_in_place(&mut img.data, opacity as f32);
    }
    Ok(())
}

/// Top-left blit origin for a layer of `layer_w` x `layer_h` on the canvas.
pub(crate) fn resolve_position(
    position: &Position,
    canvas_w: u32,
    canvas_h: u32,
    layer_w: u32,
    layer_h: u32,
) -> (i64, i64) {
    let cw = i64::from(canvas_w);
    let ch = i64::from(canvas_h);
    let lw = i64::from(layer_w);
    let lh = i64::from(layer_h);
    match position {
        Position::Offset { x, y } => (*x, *y),
        Position::Named(named) => match named {
            NamedPosition::Center => ((cw - lw) / 2, (ch - lh) / 2),
            NamedPosition::TopCenter => ((cw - lw) / 2, 0),
            NamedPosition::BottomCenter => ((cw - lw) / 2, ch - lh),
            NamedPosition::LeftCenter => (0, (ch - lh) / 2),
            NamedPosition::RightCenter => (cw - lw, (ch - lh) / 2),
        },
    }
}
