//! Structural and security validation for poster templates.
//!
//! Validation accumulates every violation instead of stopping at the first,
//! so a caller can surface the complete list in one pass. Each message is
//! prefixed with a `$`-rooted field path (`$.canvas.height`,
//! `$.photos[0].size.width`).

use crate::{
    canvas::{self, GradientStop, MAX_GRADIENT_STOPS, MIN_GRADIENT_STOPS},
    color::{is_valid_hex_color, parse_color},
    compose::{MAX_BORDER_WIDTH, MAX_SHADOW_BLUR, MAX_SHADOW_OFFSET},
    error::{PosterError, PosterResult},
    layer::{BorderSpec, LayerSize, MaskShape, ShadowSpec},
    raster::MAX_DIMENSION,
    template::{BackgroundSpec, PhotoSlot, PosterTemplate, TextSlot},
    text::{MAX_FONT_SIZE, MAX_LETTER_SPACING, MAX_STROKE_WIDTH, TextStyle},
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathElem {
    Field(&'static str),
    Index(usize),
}

fn format_path(path: &[PathElem]) -> String {
    let mut s = String::from("$");
    for p in path {
        match *p {
            PathElem::Field(name) => {
                s.push('.');
                s.push_str(name);
            }
            PathElem::Index(i) => {
                s.push('[');
                s.push_str(&i.to_string());
                s.push(']');
            }
        }
    }
    s
}

fn push(errors: &mut Vec<String>, path: &[PathElem], message: impl std::fmt::Display) {
    errors.push(format!("{}: {message}", format_path(path)));
}

/// Outcome of [`validate_template`]: every violation, not just the first.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Validate a template against the structural and security rules.
///
/// Pure; never fails. An empty `errors` list means the template is usable.
pub fn validate_template(template: &PosterTemplate) -> ValidationReport {
    let mut errors = Vec::new();

    if template.id.trim().is_empty() {
        push(&mut errors, &[PathElem::Field("id")], "must be non-empty");
    }
    if template.name.trim().is_empty() {
        push(&mut errors, &[PathElem::Field("name")], "must be non-empty");
    }
    if template.version.trim().is_empty() {
        push(
            &mut errors,
            &[PathElem::Field("version")],
            "must be non-empty",
        );
    }

    if let Err(reason) = canvas::check_dimension(template.canvas.width) {
        push(
            &mut errors,
            &[PathElem::Field("canvas"), PathElem::Field("width")],
            reason,
        );
    }
    if let Err(reason) = canvas::check_dimension(template.canvas.height) {
        push(
            &mut errors,
            &[PathElem::Field("canvas"), PathElem::Field("height")],
            reason,
        );
    }

    validate_background(&template.background, &mut errors);

    for (i, slot) in template.photos.iter().enumerate() {
        validate_photo_slot(slot, i, &mut errors);
    }
    for (i, slot) in template.text.iter().enumerate() {
        validate_text_slot(slot, i, &mut errors);
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

/// Boolean wrapper over [`validate_template`].
pub fn is_valid_template(template: &PosterTemplate) -> bool {
    validate_template(template).valid
}

fn validate_background(background: &BackgroundSpec, errors: &mut Vec<String>) {
    let base = [PathElem::Field("background")];
    match background {
        BackgroundSpec::Solid { color } => {
            if !is_valid_hex_color(color) {
                push(
                    errors,
                    &[base.as_slice(), &[PathElem::Field("color")]].concat(),
                    format!("must be a hex color like #1a1a2e, got '{color}'"),
                );
            }
        }
        BackgroundSpec::Gradient { direction: _, stops } => {
            validate_stops(stops, &base, errors);
        }
        BackgroundSpec::Image { path } => {
            if let Err(reason) = check_rel_path(path) {
                push(
                    errors,
                    &[base.as_slice(), &[PathElem::Field("path")]].concat(),
                    reason,
                );
            }
        }
    }
}

fn validate_stops(stops: &[GradientStop], base: &[PathElem], errors: &mut Vec<String>) {
    if stops.len() < MIN_GRADIENT_STOPS || stops.len() > MAX_GRADIENT_STOPS {
        push(
            errors,
            &[base, &[PathElem::Field("stops")]].concat(),
            format!(
                "gradient requires {MIN_GRADIENT_STOPS} to {MAX_GRADIENT_STOPS} stops, got {}",
                stops.len()
            ),
        );
    }
    for (i, stop) in stops.iter().enumerate() {
        let stop_base = [
            base,
            &[PathElem::Field("stops"), PathElem::Index(i)] as &[PathElem],
        ]
        .concat();
        if !stop.position.is_finite() || !(0.0..=100.0).contains(&stop.position) {
            push(
                errors,
                &[stop_base.as_slice(), &[PathElem::Field("position")]].concat(),
                format!("must be within [0, 100], got {}", stop.position),
            );
        }
        if parse_color(&stop.color).is_err() {
            push(
                errors,
                &[stop_base.as_slice(), &[PathElem::Field("color")]].concat(),
                format!("must be a hex or rgba color, got '{}'", stop.color),
            );
        }
    }
}

fn validate_photo_slot(slot: &PhotoSlot, index: usize, errors: &mut Vec<String>) {
    let base = [PathElem::Field("photos"), PathElem::Index(index)];

    if let Some(size) = &slot.size {
        validate_size(size, &base, errors);
    }

    if let MaskShape::RoundedRect { radius } = &slot.mask
        && (!radius.is_finite() || *radius < 0.0)
    {
        push(
            errors,
            &[
                base.as_slice(),
                &[PathElem::Field("mask"), PathElem::Field("radius")],
            ]
            .concat(),
            format!("must be >= 0, got {radius}"),
        );
    }

    if let Some(border) = &slot.border {
        validate_border(border, &base, errors);
    }
    if let Some(shadow) = &slot.shadow {
        validate_shadow(shadow, &base, errors);
    }

    if let Some(opacity) = slot.opacity
        && (!opacity.is_finite() || !(0.0..=1.0).contains(&opacity))
    {
        push(
            errors,
            &[base.as_slice(), &[PathElem::Field("opacity")]].concat(),
            format!("must be within [0, 1], got {opacity}"),
        );
    }
}

fn validate_size(size: &LayerSize, base: &[PathElem], errors: &mut Vec<String>) {
    let size_base = [base, &[PathElem::Field("size")] as &[PathElem]].concat();
    if size.width.is_none() && size.height.is_none() {
        push(
            errors,
            &size_base,
            "requires at least one of width or height",
        );
        return;
    }
    for (field, value) in [("width", size.width), ("height", size.height)] {
        let Some(value) = value else { continue };
        let path = [size_base.as_slice(), &[PathElem::Field(field)]].concat();
        if !value.is_finite() || value <= 0.0 {
            push(errors, &path, format!("must be > 0, got {value}"));
        } else if value > f64::from(MAX_DIMENSION) {
            push(
                errors,
                &path,
                format!("must be at most {MAX_DIMENSION}, got {value}"),
            );
        }
    }
}

fn validate_border(border: &BorderSpec, base: &[PathElem], errors: &mut Vec<String>) {
    if !border.width.is_finite() || !(0.0..=MAX_BORDER_WIDTH).contains(&border.width) {
        push(
            errors,
            &[
                base,
                &[PathElem::Field("border"), PathElem::Field("width")] as &[PathElem],
            ]
            .concat(),
            format!(
                "must be within [0, {MAX_BORDER_WIDTH}], got {}",
                border.width
            ),
        );
    }
    if parse_color(&border.color).is_err() {
        push(
            errors,
            &[
                base,
                &[PathElem::Field("border"), PathElem::Field("color")] as &[PathElem],
            ]
            .concat(),
            format!("must be a hex or rgba color, got '{}'", border.color),
        );
    }
}

fn validate_shadow(shadow: &ShadowSpec, base: &[PathElem], errors: &mut Vec<String>) {
    let shadow_base = [base, &[PathElem::Field("shadow")] as &[PathElem]].concat();
    if !shadow.blur.is_finite() || !(0.0..=MAX_SHADOW_BLUR).contains(&shadow.blur) {
        push(
            errors,
            &[shadow_base.as_slice(), &[PathElem::Field("blur")]].concat(),
            format!("must be within [0, {MAX_SHADOW_BLUR}], got {}", shadow.blur),
        );
    }
    for (field, value) in [("offsetX", shadow.offset_x), ("offsetY", shadow.offset_y)] {
        if !value.is_finite() || value.abs() > MAX_SHADOW_OFFSET {
            push(
                errors,
                &[shadow_base.as_slice(), &[PathElem::Field(field)]].concat(),
                format!("magnitude must be at most {MAX_SHADOW_OFFSET}, got {value}"),
            );
        }
    }
    if parse_color(&shadow.color).is_err() {
        push(
            errors,
            &[shadow_base.as_slice(), &[PathElem::Field("color")]].concat(),
            format!("must be a hex or rgba color, got '{}'", shadow.color),
        );
    }
}

fn validate_text_slot(slot: &TextSlot, index: usize, errors: &mut Vec<String>) {
    // Empty content is a valid placeholder; render requests fill it through
    // a text override.
    let base = [PathElem::Field("text"), PathElem::Index(index)];
    validate_text_style(&slot.style, &base, errors);
}

fn validate_text_style(style: &TextStyle, base: &[PathElem], errors: &mut Vec<String>) {
    let style_base = [base, &[PathElem::Field("style")] as &[PathElem]].concat();

    if style.font_family.trim().is_empty() {
        push(
            errors,
            &[style_base.as_slice(), &[PathElem::Field("fontFamily")]].concat(),
            "must be non-empty",
        );
    }
    if !style.font_size.is_finite() || !(1.0..=MAX_FONT_SIZE).contains(&style.font_size) {
        push(
            errors,
            &[style_base.as_slice(), &[PathElem::Field("fontSize")]].concat(),
            format!("must be within [1, {MAX_FONT_SIZE}], got {}", style.font_size),
        );
    }
    if parse_color(&style.color).is_err() {
        push(
            errors,
            &[style_base.as_slice(), &[PathElem::Field("color")]].concat(),
            format!("must be a hex or rgba color, got '{}'", style.color),
        );
    }

    if let Some(spacing) = style.letter_spacing
        && (!spacing.is_finite() || spacing.abs() > MAX_LETTER_SPACING)
    {
        push(
            errors,
            &[style_base.as_slice(), &[PathElem::Field("letterSpacing")]].concat(),
            format!("magnitude must be at most {MAX_LETTER_SPACING}, got {spacing}"),
        );
    }

    if let Some(stroke) = &style.stroke {
        if !stroke.width.is_finite() || !(0.0..=MAX_STROKE_WIDTH).contains(&stroke.width) {
            push(
                errors,
                &[
                    style_base.as_slice(),
                    &[PathElem::Field("stroke"), PathElem::Field("width")],
                ]
                .concat(),
                format!("must be within [0, {MAX_STROKE_WIDTH}], got {}", stroke.width),
            );
        }
        if parse_color(&stroke.color).is_err() {
            push(
                errors,
                &[
                    style_base.as_slice(),
                    &[PathElem::Field("stroke"), PathElem::Field("color")],
                ]
                .concat(),
                format!("must be a hex or rgba color, got '{}'", stroke.color),
            );
        }
    }

    if let Some(shadow) = &style.shadow {
        validate_shadow(shadow, &style_base, errors);
    }

    if let Some(max_width) = style.max_width
        && (!max_width.is_finite() || max_width <= 0.0)
    {
        push(
            errors,
            &[style_base.as_slice(), &[PathElem::Field("maxWidth")]].concat(),
            format!("must be > 0, got {max_width}"),
        );
    }
}

/// Normalize and validate a template-relative asset path.
///
/// The normalized result uses `/` separators and drops `.` segments. Absolute
/// paths (POSIX, Windows drive, UNC) and parent traversals are rejected so a
/// template can never read outside the caller's asset root.
pub fn normalize_rel_path(source: &str) -> PosterResult<String> {
    check_rel_path(source).map_err(PosterError::invalid_input)
}

fn check_rel_path(source: &str) -> Result<String, String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') || is_windows_absolute(&s) {
        return Err("asset paths must be relative".to_string());
    }
    if s.is_empty() {
        return Err("asset path must be non-empty".to_string());
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err("asset paths must not contain '..' (path traversal)".to_string());
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err("asset path must contain a file name".to_string());
    }

    Ok(out.join("/"))
}

fn is_windows_absolute(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CanvasSpec, GradientDirection};
    use crate::layer::Position;
    use crate::template::{PhotoSlot, TextSlot};
    use crate::text::TextStyle;

    fn minimal_ok() -> PosterTemplate {
        PosterTemplate {
            id: "finals".to_string(),
            name: "Finals".to_string(),
            description: String::new(),
            version: "1.0".to_string(),
            canvas: CanvasSpec {
                width: 1080.0,
                height: 1350.0,
            },
            background: BackgroundSpec::Solid {
                color: "#1a1a2e".to_string(),
            },
            photos: vec![
                PhotoSlot::new()
                    .size(LayerSize::width(400.0))
                    .mask(MaskShape::Circle),
            ],
            text: vec![
                TextSlot::new("CHAMPIONS", TextStyle::new("Bebas Neue", 96.0, "#ffffff"))
                    .position(Position::Named(crate::layer::NamedPosition::TopCenter)),
            ],
        }
    }

    #[test]
    fn ok_template_validates() {
        let report = validate_template(&minimal_ok());
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert!(is_valid_template(&minimal_ok()));
    }

    #[test]
    fn rejects_oversized_canvas_naming_the_field() {
        let mut t = minimal_ok();
        t.canvas.height = 20_000.0;
        let report = validate_template(&t);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("canvas.height")));
    }

    #[test]
    fn rejects_fractional_canvas_width() {
        let mut t = minimal_ok();
        t.canvas.width = 100.5;
        let report = validate_template(&t);
        assert!(report.errors.iter().any(|e| e.contains("canvas.width")));
    }

    #[test]
    fn rejects_empty_identity_fields() {
        let mut t = minimal_ok();
        t.id = String::new();
        t.name = "  ".to_string();
        t.version = String::new();
        let report = validate_template(&t);
        assert!(report.errors.iter().any(|e| e.starts_with("$.id")));
        assert!(report.errors.iter().any(|e| e.starts_with("$.name")));
        assert!(report.errors.iter().any(|e| e.starts_with("$.version")));
    }

    #[test]
    fn rejects_absolute_background_path() {
        let mut t = minimal_ok();
        t.background = BackgroundSpec::Image {
            path: "/etc/passwd".to_string(),
        };
        let report = validate_template(&t);
        assert!(report.errors.iter().any(|e| e.contains("must be relative")));
    }

    #[test]
    fn rejects_traversal_background_path() {
        let mut t = minimal_ok();
        t.background = BackgroundSpec::Image {
            path: "../../etc/passwd".to_string(),
        };
        let report = validate_template(&t);
        assert!(report.errors.iter().any(|e| e.contains("traversal")));
    }

    #[test]
    fn rejects_windows_absolute_background_path() {
        let mut t = minimal_ok();
        t.background = BackgroundSpec::Image {
            path: r"C:\photos\bg.png".to_string(),
        };
        let report = validate_template(&t);
        assert!(report.errors.iter().any(|e| e.contains("must be relative")));
    }

    #[test]
    fn rejects_bad_gradient_stops_with_indexed_paths() {
        let mut t = minimal_ok();
        t.background = BackgroundSpec::Gradient {
            direction: GradientDirection::ToBottom,
            stops: vec![
                GradientStop {
                    color: "#102030".to_string(),
                    position: 0.0,
                },
                GradientStop {
                    color: "not-a-color".to_string(),
                    position: 150.0,
                },
            ],
        };
        let report = validate_template(&t);
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("background.stops[1].position"))
        );
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("background.stops[1].color"))
        );
    }

    #[test]
    fn rejects_photo_slot_violations_with_indexed_paths() {
        let mut t = minimal_ok();
        t.photos = vec![
            PhotoSlot::new().size(LayerSize::width(400.0)),
            PhotoSlot::new()
                .size(LayerSize::exact(-5.0, 20_000.0))
                .mask(MaskShape::RoundedRect { radius: -1.0 })
                .border(BorderSpec {
                    width: 300.0,
                    color: "blue".to_string(),
                })
                .opacity(1.5),
        ];
        let report = validate_template(&t);
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("photos[1].size.width"))
        );
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("photos[1].size.height"))
        );
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("photos[1].mask.radius"))
        );
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("photos[1].border.width"))
        );
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("photos[1].border.color"))
        );
        assert!(report.errors.iter().any(|e| e.contains("photos[1].opacity")));
    }

    #[test]
    fn rejects_shadow_offsets_beyond_cap() {
        let mut t = minimal_ok();
        t.photos[0] = PhotoSlot::new().shadow(ShadowSpec {
            blur: 8.0,
            offset_x: 2_147_483_648.0,
            offset_y: -6.0,
            color: "#000000".to_string(),
        });
        let report = validate_template(&t);
        assert!(!report.valid);
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("photos[0].shadow.offsetX"))
        );
        assert!(!report.errors.iter().any(|e| e.contains("offsetY")));
    }

    #[test]
    fn rejects_text_style_violations_with_indexed_paths() {
        let mut t = minimal_ok();
        t.text[0].style.font_size = 900.0;
        t.text[0].style.color = "purple".to_string();
        let report = validate_template(&t);
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("text[0].style.fontSize"))
        );
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("text[0].style.color"))
        );
    }

    #[test]
    fn rejects_text_shadow_offsets_beyond_cap() {
        let mut t = minimal_ok();
        t.text[0].style.shadow = Some(ShadowSpec {
            blur: 4.0,
            offset_x: 0.0,
            offset_y: 5_000.0,
            color: "#000000".to_string(),
        });
        let report = validate_template(&t);
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("text[0].style.shadow.offsetY"))
        );
    }

    #[test]
    fn empty_text_content_is_a_valid_placeholder() {
        let mut t = minimal_ok();
        t.text[0].content = String::new();
        let report = validate_template(&t);
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn accumulates_every_violation() {
        let mut t = minimal_ok();
        t.id = String::new();
        t.canvas.width = 0.0;
        t.text[0].style.font_size = 0.0;
        let report = validate_template(&t);
        assert!(report.errors.len() >= 3);
    }

    #[test]
    fn normalize_path_cross_platform() {
        assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
        assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
        assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
        assert!(normalize_rel_path("../x.png").is_err());
        assert!(normalize_rel_path("/x.png").is_err());
        assert!(normalize_rel_path("").is_err());
        assert!(normalize_rel_path(".").is_err());
    }
}
