use crate::raster::Raster;

/// Placement of a layer on the canvas: a named anchor or an explicit
/// top-left offset in pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Position {
    Named(NamedPosition),
    Offset { x: i64, y: i64 },
}

impl Default for Position {
    fn default() -> Self {
        Self::Named(NamedPosition::Center)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamedPosition {
    Center,
    TopCenter,
    BottomCenter,
    LeftCenter,
    RightCenter,
}

/// Requested layer dimensions; a missing axis is derived from the source
/// aspect ratio.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerSize {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl LayerSize {
    pub fn width(width: f64) -> Self {
        Self {
            width: Some(width),
            height: None,
        }
    }

    pub fn height(height: f64) -> Self {
        Self {
            width: None,
            height: Some(height),
        }
    }

    pub fn exact(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MaskShape {
    None,
    Circle,
    RoundedRect { radius: f64 },
}

impl Default for MaskShape {
    fn default() -> Self {
        Self::None
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BorderSpec {
    /// Border thickness in pixels, 0..=200.
    pub width: f64,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowSpec {
    /// Blur strength, 0..=100.
    pub blur: f64,
    /// Horizontal displacement in pixels, -1000..=1000.
    #[serde(default)]
    pub offset_x: f64,
    /// Vertical displacement in pixels, -1000..=1000.
    #[serde(default)]
    pub offset_y: f64,
    pub color: String,
}

/// One photo layer ready for compositing.
#[derive(Clone, Debug)]
pub struct CompositeLayer {
    pub image: Raster,
    pub position: Position,
    pub size: Option<LayerSize>,
    pub mask: MaskShape,
    pub border: Option<BorderSpec>,
    pub shadow: Option<ShadowSpec>,
    pub opacity: Option<f64>,
}

impl CompositeLayer {
    pub fn new(image: Raster) -> Self {
        Self {
            image,
            position: Position::default(),
            size: None,
            mask: MaskShape::None,
            border: None,
            shadow: None,
            opacity: None,
        }
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_deserializes_named_and_offset() {
        let named: Position = serde_json::from_str(r#""bottom-center""#).unwrap();
        assert_eq!(named, Position::Named(NamedPosition::BottomCenter));

        let offset: Position = serde_json::from_str(r#"{"x": -20, "y": 35}"#).unwrap();
        assert_eq!(offset, Position::Offset { x: -20, y: 35 });
    }

    #[test]
    fn position_rejects_unknown_anchor() {
        assert!(serde_json::from_str::<Position>(r#""top-left""#).is_err());
    }

    #[test]
    fn mask_shape_tags_roundtrip() {
        let circle: MaskShape = serde_json::from_str(r#"{"type": "circle"}"#).unwrap();
        assert_eq!(circle, MaskShape::Circle);

        let rr: MaskShape =
            serde_json::from_str(r#"{"type": "rounded-rect", "radius": 24}"#).unwrap();
        assert_eq!(rr, MaskShape::RoundedRect { radius: 24.0 });

        let json = serde_json::to_string(&MaskShape::Circle).unwrap();
        assert!(json.contains(r#""type":"circle""#));
    }

    #[test]
    fn shadow_uses_camel_case_offsets() {
        let shadow: ShadowSpec = serde_json::from_str(
            r#"{"blur": 10, "offsetX": 4, "offsetY": -6, "color": "rgba(0,0,0,0.5)"}"#,
        )
        .unwrap();
        assert_eq!(shadow.offset_x, 4.0);
        assert_eq!(shadow.offset_y, -6.0);

        let defaulted: ShadowSpec =
            serde_json::from_str(r##"{"blur": 5, "color": "#000000"}"##).unwrap();
        assert_eq!(defaulted.offset_x, 0.0);
        assert_eq!(defaulted.offset_y, 0.0);
    }
}
