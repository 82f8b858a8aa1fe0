//! Styled text rendering through generated vector markup.
//!
//! Glyph shaping, stroking, and drop shadows are resvg's job; this module
//! computes the markup (validated style, transformed content, auto-fit size,
//! escaped text) and composites the rasterized result.

use std::sync::Arc;

use crate::{
    error::{PosterError, PosterResult, wrap_processing},
    fonts::FontRegistry,
    layer::{NamedPosition, Position, ShadowSpec},
    markup::{self, SvgDoc},
    raster::Raster,
};

pub const MAX_FONT_SIZE: f64 = 500.0;
pub const MAX_LETTER_SPACING: f64 = 100.0;
pub const MAX_STROKE_WIDTH: f64 = 50.0;

/// Width-estimation factor: average glyph advance as a fraction of the font
/// size. Deliberately inexact; auto-fit depends on this exact heuristic, not
/// on real glyph metrics.
const WIDTH_FACTOR: f64 = 0.6;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<StrokeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_transform: Option<TextTransform>,
}

impl TextStyle {
    pub fn new(font_family: impl Into<String>, font_size: f64, color: impl Into<String>) -> Self {
        Self {
            font_family: font_family.into(),
            font_size,
            color: color.into(),
            align: None,
            letter_spacing: None,
            stroke: None,
            shadow: None,
            max_width: None,
            text_transform: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrokeSpec {
    /// Outline thickness in pixels, 0..=50.
    pub width: f64,
    pub color: String,
}

/// One text layer to draw onto a raster.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextLayer {
    pub content: String,
    pub position: Position,
    pub style: TextStyle,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TextOptions {
    /// Fail instead of falling back when a font family is unregistered.
    pub strict_font: bool,
}

/// Render `layers` onto a copy of `image` in array order.
///
/// Every style is validated before any rendering work happens.
#[tracing::instrument(skip(image, layers, fonts, opts))]
pub fn add_text(
    image: &Raster,
    layers: &[TextLayer],
    fonts: &FontRegistry,
    opts: &TextOptions,
) -> PosterResult<Raster> {
    let mut out = image.clone();
    if layers.is_empty() {
        return Ok(out);
    }

    for (index, layer) in layers.iter().enumerate() {
        validate_style(&layer.style).map_err(|err| prefix_layer(index, err))?;
    }

    let fontdb = fonts.fontdb();
    for (index, layer) in layers.iter().enumerate() {
        let rendered = render_layer(out.width, out.height, layer, fonts, opts, fontdb.clone())
            .map_err(wrap_processing)
            .map_err(|err| prefix_layer(index, err))?;
        out.blit_over(&rendered, 0, 0, 1.0)?;
    }
    Ok(out)
}

fn prefix_layer(index: usize, err: PosterError) -> PosterError {
    match err {
        PosterError::InvalidInput(msg) => {
            PosterError::InvalidInput(format!("text layer {index}: {msg}"))
        }
        other => other,
    }
}

pub(crate) fn validate_style(style: &TextStyle) -> PosterResult<()> {
    if style.font_family.trim().is_empty() {
        return Err(PosterError::invalid_input(
            "style.fontFamily must be non-empty",
        ));
    }
    if !style.font_size.is_finite() || !(1.0..=MAX_FONT_SIZE).contains(&style.font_size) {
        return Err(PosterError::invalid_input(format!(
            "style.fontSize must be within 1..={MAX_FONT_SIZE}, got {}",
            style.font_size
        )));
    }
    crate::color::parse_color(&style.color)?;

    if let Some(spacing) = style.letter_spacing
        && (!spacing.is_finite() || spacing.abs() > MAX_LETTER_SPACING)
    {
        return Err(PosterError::invalid_input(format!(
            "style.letterSpacing magnitude must be at most {MAX_LETTER_SPACING}, got {spacing}"
        )));
    }

    if let Some(stroke) = &style.stroke {
        if !stroke.width.is_finite() || !(0.0..=MAX_STROKE_WIDTH).contains(&stroke.width) {
            return Err(PosterError::invalid_input(format!(
                "style.stroke.width must be within 0..={MAX_STROKE_WIDTH}, got {}",
                stroke.width
            )));
        }
        crate::color::parse_color(&stroke.color)?;
    }

    if let Some(shadow) = &style.shadow {
        let max_blur = crate::compose::MAX_SHADOW_BLUR;
        if !shadow.blur.is_finite() || !(0.0..=max_blur).contains(&shadow.blur) {
            return Err(PosterError::invalid_input(format!(
                "style.shadow.blur must be within 0..={max_blur}, got {}",
                shadow.blur
            )));
        }
        let max_offset = crate::compose::MAX_SHADOW_OFFSET;
        for (field, value) in [("offsetX", shadow.offset_x), ("offsetY", shadow.offset_y)] {
            if !value.is_finite() || value.abs() > max_offset {
                return Err(PosterError::invalid_input(format!(
                    "style.shadow.{field} magnitude must be at most {max_offset}, got {value}"
                )));
            }
        }
        crate::color::parse_color(&shadow.color)?;
    }

    if let Some(max_width) = style.max_width
        && (!max_width.is_finite() || max_width <= 0.0)
    {
        return Err(PosterError::invalid_input(format!(
            "style.maxWidth must be > 0, got {max_width}"
        )));
    }

    Ok(())
}

fn render_layer(
    width: u32,
    height: u32,
    layer: &TextLayer,
    fonts: &FontRegistry,
    opts: &TextOptions,
    fontdb: Arc<usvg::fontdb::Database>,
) -> PosterResult<Raster> {
    let family = resolve_family(&layer.style.font_family, fonts, opts)?;
    let svg = layer_markup(width, height, layer, &family);
    markup::rasterize_markup_with_fonts(&svg, width, height, fontdb)
}

fn resolve_family(
    family: &str,
    fonts: &FontRegistry,
    opts: &TextOptions,
) -> PosterResult<String> {
    if fonts.contains(family) {
        return Ok(family.to_string());
    }
    if opts.strict_font {
        return Err(PosterError::invalid_input(format!(
            "font family '{family}' is not registered"
        )));
    }
    tracing::warn!(
        "font family '{family}' is not registered, falling back to '{}'",
        fonts.default_family()
    );
    Ok(fonts.default_family().to_string())
}

/// Build the full SVG document for one text layer.
pub(crate) fn layer_markup(width: u32, height: u32, layer: &TextLayer, family: &str) -> String {
    let style = &layer.style;
    let content = apply_transform(&layer.content, style.text_transform);
    let size = fit_font_size(&content, style);

    let (x, y) = anchor_point(&layer.position, width, height);
    let anchor = text_anchor(style.align, &layer.position);
    let escaped = markup::escape_xml(&content);
    let family = markup::sanitize_font_family(family);
    let fill = crate::color::parse_color(&style.color)
        .map(|c| c.to_css())
        .unwrap_or_else(|_| style.color.clone());

    let mut common = format!(
        r#"x="{x}" y="{y}" font-family="{family}" font-size="{size}" text-anchor="{anchor}""#
    );
    if let Some(spacing) = style.letter_spacing
        && spacing != 0.0
    {
        common.push_str(&format!(r#" letter-spacing="{spacing}""#));
    }

    let mut doc = SvgDoc::new(width, height);
    let mut body = String::new();

    if let Some(stroke) = &style.stroke
        && stroke.width > 0.0
    {
        let stroke_css = crate::color::parse_color(&stroke.color)
            .map(|c| c.to_css())
            .unwrap_or_else(|_| stroke.color.clone());
        // Under-copy carries the outline at double width so half of it
        // survives beneath the fill copy drawn on top.
        body.push_str(&format!(
            r#"<text {common} fill="{fill}" stroke="{stroke_css}" stroke-width="{w}" stroke-linejoin="round">{escaped}</text>"#,
            w = stroke.width * 2.0,
        ));
    }
    body.push_str(&format!(r#"<text {common} fill="{fill}">{escaped}</text>"#));

    if let Some(shadow) = &style.shadow {
        let flood = crate::color::parse_color(&shadow.color)
            .map(|c| c.to_css())
            .unwrap_or_else(|_| shadow.color.clone());
        doc.push_def(format!(
            r#"<filter id="text-shadow" x="-50%" y="-50%" width="200%" height="200%"><feDropShadow dx="{dx}" dy="{dy}" stdDeviation="{std}" flood-color="{flood}"/></filter>"#,
            dx = shadow.offset_x,
            dy = shadow.offset_y,
            std = shadow.blur / 2.0,
        ));
        doc.push(format!(r#"<g filter="url(#text-shadow)">{body}</g>"#));
    } else {
        doc.push(body);
    }

    doc.finish()
}

/// Apply the CSS-style text transform before layout or width estimation.
pub(crate) fn apply_transform(content: &str, transform: Option<TextTransform>) -> String {
    match transform {
        None | Some(TextTransform::None) => content.to_string(),
        Some(TextTransform::Uppercase) => content.to_uppercase(),
        Some(TextTransform::Lowercase) => content.to_lowercase(),
        Some(TextTransform::Capitalize) => {
            let mut out = String::with_capacity(content.len());
            let mut at_word_start = true;
            for c in content.chars() {
                if c.is_whitespace() {
                    at_word_start = true;
                    out.push(c);
                } else if at_word_start {
                    out.extend(c.to_uppercase());
                    at_word_start = false;
                } else {
                    out.push(c);
                }
            }
            out
        }
    }
}

/// Shrink the font size until the estimated width fits `maxWidth`.
///
/// Width estimate: `chars * size * 0.6 + (chars - 1) * letterSpacing`.
pub(crate) fn fit_font_size(content: &str, style: &TextStyle) -> u32 {
    let base = style.font_size.round().max(1.0) as u32;
    let Some(max_width) = style.max_width else {
        return base;
    };
    let chars = content.chars().count();
    if chars == 0 {
        return base;
    }

    let spacing = style.letter_spacing.unwrap_or(0.0);
    let mut size = base;
    while size > 1 && estimated_width(chars, f64::from(size), spacing) > max_width {
        size -= 1;
    }
    if size < base {
        tracing::warn!(
            "auto-fit reduced font size from {base} to {size} to satisfy maxWidth {max_width}"
        );
    }
    size
}

fn estimated_width(chars: usize, font_size: f64, letter_spacing: f64) -> f64 {
    (chars as f64) * font_size * WIDTH_FACTOR
        + (chars.saturating_sub(1) as f64) * letter_spacing
}

/// Baseline anchor for the text element.
fn anchor_point(position: &Position, width: u32, height: u32) -> (i64, i64) {
    let w = i64::from(width);
    let h = i64::from(height);
    match position {
        Position::Offset { x, y } => (*x, *y),
        Position::Named(named) => match named {
            NamedPosition::Center => (w / 2, h / 2),
            NamedPosition::TopCenter => (w / 2, h / 10),
            NamedPosition::BottomCenter => (w / 2, h * 9 / 10),
            NamedPosition::LeftCenter => (w / 10, h / 2),
            NamedPosition::RightCenter => (w * 9 / 10, h / 2),
        },
    }
}

/// SVG `text-anchor` for the layer: explicit alignment wins, named anchors
/// otherwise imply a sensible default, and raw offsets keep SVG's `start`.
fn text_anchor(align: Option<TextAlign>, position: &Position) -> &'static str {
    match align {
        Some(TextAlign::Left) => "start",
        Some(TextAlign::Center) => "middle",
        Some(TextAlign::Right) => "end",
        None => match position {
            Position::Named(NamedPosition::LeftCenter) => "start",
            Position::Named(NamedPosition::RightCenter) => "end",
            Position::Named(_) => "middle",
            Position::Offset { .. } => "start",
        },
    }
}
