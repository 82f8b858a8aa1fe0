use crate::{
    canvas::CanvasSpec,
    error::{PosterError, PosterResult},
    template::{
        BackgroundSpec, PhotoSlot, PosterTemplate, TextSlot, validate::validate_template,
    },
};

/// Fluent construction of a validated [`PosterTemplate`].
pub struct TemplateBuilder {
    id: String,
    name: String,
    description: String,
    version: String,
    canvas: CanvasSpec,
    background: BackgroundSpec,
    photos: Vec<PhotoSlot>,
    text: Vec<TextSlot>,
}

impl TemplateBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>, canvas: CanvasSpec) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            version: "1.0".to_string(),
            canvas,
            background: BackgroundSpec::Solid {
                color: "#000000".to_string(),
            },
            photos: Vec::new(),
            text: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn background(mut self, background: BackgroundSpec) -> Self {
        self.background = background;
        self
    }

    pub fn photo(mut self, slot: PhotoSlot) -> Self {
        self.photos.push(slot);
        self
    }

    pub fn text(mut self, slot: TextSlot) -> Self {
        self.text.push(slot);
        self
    }

    pub fn build(self) -> PosterResult<PosterTemplate> {
        let template = PosterTemplate {
            id: self.id,
            name: self.name,
            description: self.description,
            version: self.version,
            canvas: self.canvas,
            background: self.background,
            photos: self.photos,
            text: self.text,
        };
        let report = validate_template(&template);
        if !report.valid {
            return Err(PosterError::TemplateValidation(report.errors));
        }
        Ok(template)
    }
}
