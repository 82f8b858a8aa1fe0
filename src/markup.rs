//! Internal vector-markup builder and rasterizer.
//!
//! Masks, shape-aware borders, shadow filters, and text all render through a
//! small generated-SVG seam, rasterized by `resvg`. Callers never see the
//! markup; the seam keeps "generate SVG then rasterize" an implementation
//! strategy rather than a contract.

use std::sync::Arc;

use crate::{
    error::{PosterError, PosterResult},
    raster::Raster,
};

/// One SVG document under construction.
#[derive(Debug)]
pub struct SvgDoc {
    width: u32,
    height: u32,
    defs: Vec<String>,
    body: Vec<String>,
}

impl SvgDoc {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            defs: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Append markup to the `<defs>` section (filters, gradients).
    pub fn push_def(&mut self, markup: impl Into<String>) {
        self.defs.push(markup.into());
    }

    /// Append an element to the document body, drawn after everything
    /// already pushed.
    pub fn push(&mut self, markup: impl Into<String>) {
        self.body.push(markup.into());
    }

    pub fn finish(&self) -> String {
        let mut out = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        );
        if !self.defs.is_empty() {
            out.push_str("<defs>");
            for def in &self.defs {
                out.push_str(def);
            }
            out.push_str("</defs>");
        }
        for el in &self.body {
            out.push_str(el);
        }
        out.push_str("</svg>");
        out
    }
}

pub fn rect_element(x: f64, y: f64, width: f64, height: f64, fill: &str) -> String {
    format!(r#"<rect x="{x}" y="{y}" width="{width}" height="{height}" fill="{fill}"/>"#)
}

pub fn rounded_rect_element(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    radius: f64,
    fill: &str,
) -> String {
    format!(
        r#"<rect x="{x}" y="{y}" width="{width}" height="{height}" rx="{radius}" ry="{radius}" fill="{fill}"/>"#
    )
}

pub fn circle_element(cx: f64, cy: f64, r: f64, fill: &str) -> String {
    format!(r#"<circle cx="{cx}" cy="{cy}" r="{r}" fill="{fill}"/>"#)
}

/// XML-entity escaping for text content and attribute values.
///
/// Content may be untrusted user input headed into generated markup, so this
/// is a security control, not cosmetics.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Strip characters that could break out of a font-family attribute or smuggle
/// markup/CSS through it. Families are looked up by name, never interpreted,
/// so dropping characters is safe.
pub fn sanitize_font_family(s: &str) -> String {
    s.chars()
        .filter(|c| {
            !matches!(c, '"' | '\'' | '<' | '>' | '&' | ';' | '{' | '}' | '\\') && !c.is_control()
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Rasterize markup that contains no text elements.
pub fn rasterize_markup(svg: &str, width: u32, height: u32) -> PosterResult<Raster> {
    rasterize(svg, width, height, &usvg::Options::default())
}

/// Rasterize markup that may contain text, resolving families against `fontdb`.
pub fn rasterize_markup_with_fonts(
    svg: &str,
    width: u32,
    height: u32,
    fontdb: Arc<usvg::fontdb::Database>,
) -> PosterResult<Raster> {
    let opts = usvg::Options {
        fontdb,
        ..Default::default()
    };
    rasterize(svg, width, height, &opts)
}

fn rasterize(svg: &str, width: u32, height: u32, opts: &usvg::Options) -> PosterResult<Raster> {
    let tree = usvg::Tree::from_data(svg.as_bytes(), opts)
        .map_err(|err| PosterError::image_processing(format!("parse generated markup: {err}")))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| PosterError::image_processing("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(&tree, xform, &mut pixmap.as_mut());

    // tiny_skia pixmap bytes are already premultiplied RGBA8.
    Raster::from_premul_data(width, height, pixmap.data().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_orders_defs_before_body() {
        let mut doc = SvgDoc::new(10, 20);
        doc.push(rect_element(0.0, 0.0, 10.0, 20.0, "#ffffff"));
        doc.push_def(r#"<filter id="f"/>"#);
        let svg = doc.finish();

        assert!(
            svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20""#)
        );
        let defs_at = svg.find("<defs>").unwrap();
        let rect_at = svg.find("<rect").unwrap();
        assert!(defs_at < rect_at);
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn escape_xml_neutralizes_markup() {
        assert_eq!(
            escape_xml(r#"<script>alert("x") & 'more'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &apos;more&apos;&lt;/script&gt;"
        );
        assert_eq!(escape_xml("plain text"), "plain text");
    }

    #[test]
    fn sanitize_font_family_strips_breaking_characters() {
        assert_eq!(
            sanitize_font_family(r#"Arial"; </style>{x}\'"#),
            "Arial /stylex"
        );
        assert_eq!(sanitize_font_family("Bebas Neue"), "Bebas Neue");
    }

    #[test]
    fn rasterize_circle_covers_center_not_corner() {
        let mut doc = SvgDoc::new(21, 21);
        doc.push(circle_element(10.5, 10.5, 10.5, "#ffffff"));
        let raster = rasterize_markup(&doc.finish(), 21, 21).unwrap();

        assert_eq!((raster.width, raster.height), (21, 21));
        assert_eq!(raster.pixel(10, 10).unwrap()[3], 255);
        assert_eq!(raster.pixel(0, 0).unwrap()[3], 0);
    }

    #[test]
    fn rasterize_rounded_rect_clips_corner_only() {
        let mut doc = SvgDoc::new(40, 40);
        doc.push(rounded_rect_element(0.0, 0.0, 40.0, 40.0, 12.0, "#ffffff"));
        let raster = rasterize_markup(&doc.finish(), 40, 40).unwrap();

        assert_eq!(raster.pixel(0, 0).unwrap()[3], 0);
        assert_eq!(raster.pixel(20, 20).unwrap()[3], 255);
        assert_eq!(raster.pixel(20, 0).unwrap()[3], 255);
    }

    #[test]
    fn rasterize_rejects_malformed_markup() {
        let err = rasterize_markup("<svg", 4, 4).unwrap_err();
        assert!(err.to_string().contains("image processing"));
    }
}
