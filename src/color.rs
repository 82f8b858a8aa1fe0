use crate::error::{PosterError, PosterResult};

/// Normalized RGBA color parsed from user input.
///
/// Channels are 8-bit; alpha stays fractional because template colors carry
/// CSS-style `rgba(...)` alpha in [0,1].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}

impl Color {
    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 1.0 }
    }

    /// Premultiplied RGBA8 pixel for this color.
    pub fn to_premul_rgba8(self) -> [u8; 4] {
        let a = ((self.alpha.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
        let premul = |c: u8| (((u16::from(c) * a) + 127) / 255) as u8;
        [premul(self.r), premul(self.g), premul(self.b), a as u8]
    }

    /// CSS color string accepted by the vector-markup rasterizer.
    pub fn to_css(self) -> String {
        if self.alpha >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({},{},{},{})", self.r, self.g, self.b, self.alpha)
        }
    }
}

/// True iff `s` is `#` followed by exactly 6 hex digits.
pub fn is_valid_hex_color(s: &str) -> bool {
    let Some(digits) = s.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Permissive probe for `rgba(r,g,b,a)` strings.
///
/// Returns `None` instead of an error because callers use it to decide
/// between color formats.
pub fn parse_rgba_color(s: &str) -> Option<Color> {
    let inner = s.trim().strip_prefix("rgba(")?.strip_suffix(')')?;
    let mut parts = inner.split(',');

    let mut channel = || -> Option<u8> {
        let v: u32 = parts.next()?.trim().parse().ok()?;
        u8::try_from(v).ok()
    };
    let r = channel()?;
    let g = channel()?;
    let b = channel()?;

    let alpha: f32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
        return None;
    }

    Some(Color { r, g, b, alpha })
}

/// Parse a color from `#rrggbb` hex or `rgba(r,g,b,a)` notation.
pub fn parse_color(s: &str) -> PosterResult<Color> {
    if is_valid_hex_color(s) {
        let digits = &s[1..];
        let byte_at = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
        let (r, g, b) = match (byte_at(0), byte_at(2), byte_at(4)) {
            (Ok(r), Ok(g), Ok(b)) => (r, g, b),
            _ => return Err(PosterError::invalid_input(format!("invalid hex color '{s}'"))),
        };
        return Ok(Color::opaque(r, g, b));
    }
    if let Some(color) = parse_rgba_color(s) {
        return Ok(color);
    }
    Err(PosterError::invalid_input(format!(
        "invalid color '{s}': expected #rrggbb or rgba(r,g,b,a)"
    )))
}
