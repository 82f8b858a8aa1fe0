//! End-to-end poster rendering.
//!
//! This is the primary one-shot API for producing pixels from a template.
//!
//! Pipeline:
//! 1. [`validate_template`](crate::template::validate::validate_template)
//! 2. background (canvas fill, or an image under the caller's asset root)
//! 3. [`composite_image`](crate::compose::composite_image) over the photo slots
//! 4. [`add_text`](crate::text::add_text) over the text slots
//!
//! Returns a [`Raster`] of premultiplied RGBA8 pixels; the caller picks the
//! output encoding explicitly (`to_png` / `to_jpeg`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    canvas::{CanvasSpec, Fill, create_canvas},
    compose::composite_image,
    error::{PosterError, PosterResult},
    fonts::FontRegistry,
    layer::CompositeLayer,
    raster::Raster,
    template::{
        BackgroundSpec, PosterTemplate,
        validate::{normalize_rel_path, validate_template},
    },
    text::{TextLayer, TextOptions, add_text},
};

/// Per-request inputs accompanying a template.
#[derive(Clone, Debug, Default)]
pub struct PosterInputs {
    /// One decoded photo per photo slot, in slot order.
    pub photos: Vec<Raster>,
    /// Content overrides for text slots, keyed by slot index.
    pub text_overrides: BTreeMap<usize, String>,
}

impl PosterInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn photo(mut self, image: Raster) -> Self {
        self.photos.push(image);
        self
    }

    pub fn text_override(mut self, slot: usize, content: impl Into<String>) -> Self {
        self.text_overrides.insert(slot, content.into());
        self
    }
}

/// Options for [`render_poster`].
#[derive(Clone, Debug, Default)]
pub struct RenderOptions {
    /// Root directory resolved against template-relative asset paths. Image
    /// backgrounds fail without one.
    pub asset_root: Option<PathBuf>,
    /// Fail instead of falling back when a text font family is unregistered.
    pub strict_font: bool,
}

#[tracing::instrument(skip(template, inputs, fonts, opts), fields(id = %template.id))]
pub fn render_poster(
    template: &PosterTemplate,
    inputs: &PosterInputs,
    fonts: &FontRegistry,
    opts: &RenderOptions,
) -> PosterResult<Raster> {
    let report = validate_template(template);
    if !report.valid {
        return Err(PosterError::TemplateValidation(report.errors));
    }

    let background = build_background(template, opts)?;

    if inputs.photos.len() != template.photos.len() {
        return Err(PosterError::invalid_input(format!(
            "template has {} photo slots but {} photos were supplied",
            template.photos.len(),
            inputs.photos.len()
        )));
    }
    let layers: Vec<CompositeLayer> = template
        .photos
        .iter()
        .zip(inputs.photos.iter())
        .map(|(slot, image)| slot.with_image(image.clone()))
        .collect();
    let composited = composite_image(&background, &layers)?;

    let text_layers = text_layers_for(template, inputs);
    add_text(
        &composited,
        &text_layers,
        fonts,
        &TextOptions {
            strict_font: opts.strict_font,
        },
    )
}

fn build_background(template: &PosterTemplate, opts: &RenderOptions) -> PosterResult<Raster> {
    match &template.background {
        BackgroundSpec::Solid { color } => create_canvas(
            &template.canvas,
            &Fill::Solid {
                color: color.clone(),
            },
        ),
        BackgroundSpec::Gradient { direction, stops } => create_canvas(
            &template.canvas,
            &Fill::Gradient {
                direction: *direction,
                stops: stops.clone(),
            },
        ),
        BackgroundSpec::Image { path } => {
            let Some(asset_root) = opts.asset_root.as_deref() else {
                return Err(PosterError::invalid_input(
                    "image background requires an asset root",
                ));
            };
            image_background(&template.canvas, path, asset_root)
        }
    }
}

/// Load and fit an image background. The path is re-checked here so a
/// template that skipped registration still cannot escape the asset root.
fn image_background(spec: &CanvasSpec, path: &str, asset_root: &Path) -> PosterResult<Raster> {
    let rel = normalize_rel_path(path)?;
    let full = asset_root.join(rel);
    let bytes = std::fs::read(&full)
        .with_context(|| format!("read background image {}", full.display()))?;
    let image = Raster::decode(&bytes)?;
    let (width, height) = spec.resolve()?;
    image.resize(width, height)
}

fn text_layers_for(template: &PosterTemplate, inputs: &PosterInputs) -> Vec<TextLayer> {
    template
        .text
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let mut layer = slot.to_layer();
            if let Some(content) = inputs.text_overrides.get(&i) {
                layer.content.clone_from(content);
            }
            layer
        })
        .collect()
}
