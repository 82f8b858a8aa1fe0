use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, RwLock},
};

use anyhow::Context;

use crate::error::PosterResult;

/// Generic family every renderer can resolve without any registration.
pub const DEFAULT_FAMILY: &str = "sans-serif";

/// Directory scanned by [`FontRegistry::init_bundled_default`].
pub const BUNDLED_FONT_DIR: &str = "assets/fonts";

/// Outcome of a bulk bundled-font load. Per-file failures are data, not
/// errors: partial font availability is an expected startup condition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BundledFonts {
    pub loaded: Vec<String>,
    pub failed: Vec<String>,
}

/// Family name to font binary map shared by text rendering.
///
/// Caller-owned and `Arc`-shareable. Writes are last-writer-wins; reads
/// interleave safely with writes. Production populates it once at startup and
/// treats it as append-only; [`FontRegistry::clear`] exists for tests.
#[derive(Debug, Default)]
pub struct FontRegistry {
    inner: RwLock<HashMap<String, Arc<Vec<u8>>>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` under `family`, silently replacing any previous entry.
    pub fn register(&self, family: impl Into<String>, bytes: Vec<u8>) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(family.into(), Arc::new(bytes));
        }
    }

    /// Read a font file and register it under `family`.
    pub fn register_file(
        &self,
        family: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> PosterResult<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read font file '{}'", path.display()))?;
        self.register(family, bytes);
        Ok(())
    }

    /// Load every `ttf`/`otf`/`ttc` file in `dir`, keyed by the family name
    /// probed from the binary (file stem when the face carries no name).
    ///
    /// A file that cannot be read or parsed lands in `failed` under its stem
    /// and does not abort the batch.
    pub fn init_bundled(&self, dir: &Path) -> BundledFonts {
        let mut report = BundledFonts::default();
        let Ok(rd) = std::fs::read_dir(dir) else {
            tracing::warn!("bundled font directory '{}' is not readable", dir.display());
            return report;
        };

        let mut paths: Vec<_> = rd.flatten().map(|entry| entry.path()).collect();
        paths.sort();

        for path in paths {
            if !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
                continue;
            };
            let ext = ext.to_ascii_lowercase();
            if ext != "ttf" && ext != "otf" && ext != "ttc" {
                continue;
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("font")
                .to_string();

            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!("skipping unreadable bundled font '{}': {err}", path.display());
                    report.failed.push(stem);
                    continue;
                }
            };

            match probe_family(&bytes) {
                Some(probed) => {
                    let family = probed.unwrap_or_else(|| stem.clone());
                    tracing::debug!("registered bundled font '{family}' from '{}'", path.display());
                    self.register(family.clone(), bytes);
                    report.loaded.push(family);
                }
                None => {
                    tracing::warn!("bundled file '{}' is not a parsable font", path.display());
                    report.failed.push(stem);
                }
            }
        }

        report
    }

    /// [`FontRegistry::init_bundled`] against the crate's bundled directory.
    pub fn init_bundled_default(&self) -> BundledFonts {
        self.init_bundled(Path::new(BUNDLED_FONT_DIR))
    }

    /// No-throw lookup; callers decide the fallback policy.
    pub fn get(&self, family: &str) -> Option<Arc<Vec<u8>>> {
        self.inner.read().ok().and_then(|map| map.get(family).cloned())
    }

    pub fn contains(&self, family: &str) -> bool {
        self.inner
            .read()
            .map(|map| map.contains_key(family))
            .unwrap_or(false)
    }

    pub fn default_family(&self) -> &'static str {
        DEFAULT_FAMILY
    }

    /// Registered family names, sorted.
    pub fn families(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .inner
            .read()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        out.sort();
        out
    }

    /// Test seam.
    pub fn clear(&self) {
        if let Ok(mut map) = self.inner.write() {
            map.clear();
        }
    }

    /// Font database for SVG rasterization: system fonts plus every
    /// registered face.
    pub fn fontdb(&self) -> Arc<usvg::fontdb::Database> {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Ok(map) = self.inner.read() {
            for bytes in map.values() {
                db.load_font_source(usvg::fontdb::Source::Binary(bytes.clone()));
            }
        }
        Arc::new(db)
    }
}

/// `None` when the bytes hold no parsable face; `Some(None)` when a face
/// exists but carries no family name.
fn probe_family(bytes: &[u8]) -> Option<Option<String>> {
    let mut db = usvg::fontdb::Database::new();
    db.load_font_data(bytes.to_vec());
    let face = db.faces().next()?;
    Some(face.families.first().map(|(name, _)| name.clone()))
}
