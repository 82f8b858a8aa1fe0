//! Posterforge generates championship-poster images from declarative
//! templates.
//!
//! A [`PosterTemplate`] describes one poster: canvas dimensions, a background
//! (solid color, gradient, or image), photo slots, and text slots. Rendering
//! is a linear pipeline:
//!
//! 1. **Validate**: [`validate_template`] checks the template and reports
//!    every violation at once
//! 2. **Background**: [`create_canvas`] produces the base raster
//! 3. **Composite**: [`composite_image`] places photo layers (resize, mask,
//!    border, shadow, opacity, position, in that order)
//! 4. **Text**: [`add_text`] draws styled text through generated SVG
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Premultiplied RGBA8** end-to-end: every [`Raster`] holds premultiplied
//!   pixels; encoders unpremultiply at the output boundary.
//! - **Fail before pixels**: caller input is checked up front and rejected as
//!   [`PosterError::InvalidInput`] before expensive raster work starts.
#![forbid(unsafe_code)]

pub mod canvas;
pub mod color;
pub mod compose;
pub mod dsl;
pub mod error;
pub mod fonts;
pub mod layer;
pub mod pipeline;
pub mod raster;
pub mod template;
pub mod text;

pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod markup;

pub use canvas::{CanvasSpec, Fill, GradientDirection, GradientStop, create_canvas};
pub use color::{Color, is_valid_hex_color, parse_color};
pub use compose::composite_image;
pub use dsl::TemplateBuilder;
pub use error::{PosterError, PosterResult};
pub use fonts::{BundledFonts, FontRegistry};
pub use layer::{
    BorderSpec, CompositeLayer, LayerSize, MaskShape, NamedPosition, Position, ShadowSpec,
};
pub use pipeline::{PosterInputs, RenderOptions, render_poster};
pub use raster::{MAX_DIMENSION, Raster};
pub use template::registry::{TemplateRegistry, TemplateSummary};
pub use template::validate::{
    ValidationReport, is_valid_template, normalize_rel_path, validate_template,
};
pub use template::{BackgroundSpec, PhotoSlot, PosterTemplate, TextSlot, template_from_json};
pub use text::{StrokeSpec, TextAlign, TextLayer, TextOptions, TextStyle, TextTransform, add_text};
