//! Id-keyed template store.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::{
    error::{PosterError, PosterResult},
    template::{PosterTemplate, validate::validate_template},
};

/// Listing row for registered templates.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Caller-owned template store keyed by template id.
///
/// Writes are last-writer-wins; reads interleave safely with writes.
/// Production populates the registry once at startup.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    inner: RwLock<HashMap<String, PosterTemplate>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a template, silently overwriting any existing
    /// registration under the same id.
    #[tracing::instrument(skip(self, template), fields(id = %template.id))]
    pub fn register(&self, template: PosterTemplate) -> PosterResult<()> {
        let report = validate_template(&template);
        if !report.valid {
            return Err(PosterError::TemplateValidation(report.errors));
        }
        if let Ok(mut map) = self.inner.write() {
            map.insert(template.id.clone(), template);
        }
        Ok(())
    }

    /// Clone of the template registered under `id`.
    pub fn load(&self, id: &str) -> PosterResult<PosterTemplate> {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(id).cloned())
            .ok_or_else(|| PosterError::template_not_found(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner
            .read()
            .map(|map| map.contains_key(id))
            .unwrap_or(false)
    }

    /// Summaries of every registered template, sorted by id.
    pub fn list(&self) -> Vec<TemplateSummary> {
        let mut rows: Vec<TemplateSummary> = self
            .inner
            .read()
            .map(|map| {
                map.values()
                    .map(|t| TemplateSummary {
                        id: t.id.clone(),
                        name: t.name.clone(),
                        description: t.description.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }

    /// Every registered template, sorted by id.
    pub fn all(&self) -> Vec<PosterTemplate> {
        let mut rows: Vec<PosterTemplate> = self
            .inner
            .read()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }

    /// Test seam.
    pub fn clear(&self) {
        if let Ok(mut map) = self.inner.write() {
            map.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasSpec;
    use crate::template::BackgroundSpec;

    fn template(id: &str, name: &str) -> PosterTemplate {
        PosterTemplate {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("{name} layout"),
            version: "1.0".to_string(),
            canvas: CanvasSpec {
                width: 1080.0,
                height: 1350.0,
            },
            background: BackgroundSpec::Solid {
                color: "#1a1a2e".to_string(),
            },
            photos: vec![],
            text: vec![],
        }
    }

    #[test]
    fn register_then_load_roundtrips() {
        let registry = TemplateRegistry::new();
        registry.register(template("finals", "Finals")).unwrap();
        let loaded = registry.load("finals").unwrap();
        assert_eq!(loaded.name, "Finals");
        assert!(registry.contains("finals"));
    }

    #[test]
    fn load_unknown_id_names_it() {
        let registry = TemplateRegistry::new();
        let err = registry.load("missing-id").unwrap_err();
        assert!(matches!(err, PosterError::TemplateNotFound(_)));
        assert!(err.to_string().contains("missing-id"));
    }

    #[test]
    fn register_invalid_template_carries_every_error() {
        let registry = TemplateRegistry::new();
        let mut bad = template("x", "X");
        bad.canvas.width = 0.0;
        bad.canvas.height = 20_000.0;
        let err = registry.register(bad).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.len() >= 2);
        assert!(errors.iter().any(|e| e.contains("canvas.height")));
        assert!(!registry.contains("x"));
    }

    #[test]
    fn reregistration_overwrites_silently() {
        let registry = TemplateRegistry::new();
        registry.register(template("finals", "First")).unwrap();
        registry.register(template("finals", "Second")).unwrap();
        assert_eq!(registry.load("finals").unwrap().name, "Second");
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn list_is_sorted_by_id() {
        let registry = TemplateRegistry::new();
        registry.register(template("b-semi", "Semi")).unwrap();
        registry.register(template("a-final", "Final")).unwrap();
        let rows = registry.list();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "a-final");
        assert_eq!(rows[1].id, "b-semi");
        assert_eq!(rows[0].description, "Final layout");
    }

    #[test]
    fn clear_empties_the_registry() {
        let registry = TemplateRegistry::new();
        registry.register(template("finals", "Finals")).unwrap();
        registry.clear();
        assert!(!registry.contains("finals"));
        assert!(registry.all().is_empty());
    }
}
