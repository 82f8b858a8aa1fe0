//! Declarative poster templates.
//!
//! A [`PosterTemplate`] is the JSON-facing description of one poster: canvas
//! dimensions, a background, photo slots, and text slots. Validation lives in
//! [`validate`], the id-keyed store in [`registry`].

pub mod registry;
pub mod validate;

use crate::{
    canvas::{CanvasSpec, Fill, GradientDirection, GradientStop},
    error::{PosterError, PosterResult},
    layer::{BorderSpec, CompositeLayer, LayerSize, MaskShape, Position, ShadowSpec},
    raster::Raster,
    text::{TextLayer, TextStyle},
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PosterTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    pub canvas: CanvasSpec,
    pub background: BackgroundSpec,
    #[serde(default)]
    pub photos: Vec<PhotoSlot>,
    #[serde(default)]
    pub text: Vec<TextSlot>,
}

/// Background of the poster canvas.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BackgroundSpec {
    Solid {
        color: String,
    },
    Gradient {
        direction: GradientDirection,
        stops: Vec<GradientStop>,
    },
    /// Image file, relative to the caller's asset root.
    Image {
        path: String,
    },
}

impl BackgroundSpec {
    /// Canvas fill for the non-image arms.
    pub fn as_fill(&self) -> Option<Fill> {
        match self {
            Self::Solid { color } => Some(Fill::Solid {
                color: color.clone(),
            }),
            Self::Gradient { direction, stops } => Some(Fill::Gradient {
                direction: *direction,
                stops: stops.clone(),
            }),
            Self::Image { .. } => None,
        }
    }
}

/// One photo layer slot: everything a [`CompositeLayer`] carries except the
/// image itself, which arrives per render request.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct PhotoSlot {
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<LayerSize>,
    #[serde(default)]
    pub mask: MaskShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<BorderSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl PhotoSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn size(mut self, size: LayerSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn mask(mut self, mask: MaskShape) -> Self {
        self.mask = mask;
        self
    }

    pub fn border(mut self, border: BorderSpec) -> Self {
        self.border = Some(border);
        self
    }

    pub fn shadow(mut self, shadow: ShadowSpec) -> Self {
        self.shadow = Some(shadow);
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// Attach a decoded photo, producing the layer the compositor consumes.
    pub fn with_image(&self, image: Raster) -> CompositeLayer {
        CompositeLayer {
            image,
            position: self.position,
            size: self.size,
            mask: self.mask,
            border: self.border.clone(),
            shadow: self.shadow.clone(),
            opacity: self.opacity,
        }
    }
}

/// One text layer slot. `content` is the default; callers may override it per
/// render request.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextSlot {
    pub content: String,
    #[serde(default)]
    pub position: Position,
    pub style: TextStyle,
}

impl TextSlot {
    pub fn new(content: impl Into<String>, style: TextStyle) -> Self {
        Self {
            content: content.into(),
            position: Position::default(),
            style,
        }
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn to_layer(&self) -> TextLayer {
        TextLayer {
            content: self.content.clone(),
            position: self.position,
            style: self.style.clone(),
        }
    }
}

/// Parse a template from its JSON representation.
pub fn template_from_json(json: &str) -> PosterResult<PosterTemplate> {
    serde_json::from_str(json)
        .map_err(|err| PosterError::invalid_input(format!("parse template JSON: {err}")))
}
