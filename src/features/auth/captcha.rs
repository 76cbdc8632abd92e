//! Client-side CAPTCHA challenge.
//!
//! The code is known to the client, so this is only a local speed bump in
//! front of the authoritative server-side check. Rendering draws onto any
//! [`DrawingSurface`]: a flat background, low-opacity noise dots, faint noise
//! lines, then each character with its own rotation, jitter, size and hue.

use rand::{Rng, seq::SliceRandom, thread_rng};
use std::fmt::Write as _;

pub const CODE_LENGTH: usize = 5;
/// Failed checks allowed before the challenge regenerates itself.
pub const MAX_ATTEMPTS: u32 = 3;

/// Alphanumerics without the look-alikes `0 O o 1 l I`.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789";

pub const DEFAULT_WIDTH: f64 = 150.0;
pub const DEFAULT_HEIGHT: f64 = 50.0;
const NOISE_DOTS: usize = 40;
const NOISE_LINES: usize = 4;
const FONT_SIZES: [f64; 4] = [22.0, 24.0, 26.0, 28.0];
const MAX_ROTATION: f64 = 0.35;
const JITTER_X: f64 = 3.0;
const JITTER_Y: f64 = 4.0;

/// Generates a fresh challenge code.
#[must_use]
pub fn generate() -> String {
    generate_with(&mut thread_rng())
}

pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// Case-insensitive exact match; surrounding whitespace in the input is ignored.
#[must_use]
pub fn verify(user_input: &str, code: &str) -> bool {
    !code.is_empty() && user_input.trim().eq_ignore_ascii_case(code)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptchaCheck {
    Verified,
    Mismatch { attempts_left: u32 },
    /// The last allowed attempt failed and a new code replaced the old one.
    Regenerated,
}

#[derive(Clone, Debug)]
pub struct CaptchaChallenge {
    code: String,
    user_input: String,
    verified: bool,
    attempts: u32,
}

impl Default for CaptchaChallenge {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptchaChallenge {
    #[must_use]
    pub fn new() -> Self {
        Self::with_code(generate())
    }

    #[must_use]
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            user_input: String::new(),
            verified: false,
            attempts: 0,
        }
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Replaces the typed answer. Any earlier verification no longer holds.
    pub fn set_input(&mut self, input: &str) {
        self.user_input = input.to_string();
        self.verified = false;
    }

    /// Checks the current input against the code.
    pub fn check(&mut self) -> CaptchaCheck {
        if verify(&self.user_input, &self.code) {
            self.verified = true;
            return CaptchaCheck::Verified;
        }

        self.verified = false;
        self.attempts += 1;
        if self.attempts >= MAX_ATTEMPTS {
            self.regenerate();
            CaptchaCheck::Regenerated
        } else {
            CaptchaCheck::Mismatch {
                attempts_left: MAX_ATTEMPTS - self.attempts,
            }
        }
    }

    /// Discards the current code for a different one and resets all progress.
    pub fn regenerate(&mut self) {
        self.regenerate_with(&mut thread_rng());
    }

    pub fn regenerate_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut code = generate_with(rng);
        while code == self.code {
            code = generate_with(rng);
        }
        self.code = code;
        self.user_input.clear();
        self.verified = false;
        self.attempts = 0;
    }

    /// Paints the current code onto `surface`.
    pub fn render(&self, surface: &mut dyn DrawingSurface) {
        render(&self.code, surface);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f64,
}

impl Color {
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, alpha: f64) -> Self {
        Self { r, g, b, alpha }
    }

    /// Converts HSL (hue in degrees, saturation and lightness in 0..=1).
    #[must_use]
    pub fn hsla(hue: f64, saturation: f64, lightness: f64, alpha: f64) -> Self {
        let hue = hue.rem_euclid(360.0);
        let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let h = hue / 60.0;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u8 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = lightness - chroma / 2.0;
        let channel = |value: f64| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Self::rgba(channel(r), channel(g), channel(b), alpha)
    }

    #[must_use]
    pub fn css(&self) -> String {
        format!("rgba({},{},{},{:.2})", self.r, self.g, self.b, self.alpha)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphStyle {
    pub font_size: f64,
    /// Rotation in radians around the glyph anchor.
    pub angle: f64,
    pub color: Color,
}

/// Minimal 2D drawing surface, shaped after a canvas context.
pub trait DrawingSurface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color);
    fn fill_dot(&mut self, x: f64, y: f64, radius: f64, color: Color);
    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Color);
    fn fill_glyph(&mut self, glyph: char, x: f64, y: f64, style: GlyphStyle);
}

/// Renders `code` with fresh randomness.
pub fn render(code: &str, surface: &mut dyn DrawingSurface) {
    render_with(code, surface, &mut thread_rng());
}

pub fn render_with<R: Rng + ?Sized>(code: &str, surface: &mut dyn DrawingSurface, rng: &mut R) {
    let width = surface.width();
    let height = surface.height();
    // Nothing to draw on, and random positions need a non-empty range.
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return;
    }

    surface.fill_rect(0.0, 0.0, width, height, Color::rgba(243, 244, 246, 1.0));

    for _ in 0..NOISE_DOTS {
        let color = Color::hsla(
            rng.gen_range(0.0..360.0),
            0.3,
            0.5,
            rng.gen_range(0.15..0.35),
        );
        surface.fill_dot(
            rng.gen_range(0.0..width),
            rng.gen_range(0.0..height),
            rng.gen_range(1.0..2.0),
            color,
        );
    }

    for _ in 0..NOISE_LINES {
        let color = Color::hsla(
            rng.gen_range(0.0..360.0),
            0.3,
            0.5,
            rng.gen_range(0.2..0.35),
        );
        surface.stroke_line(
            (rng.gen_range(0.0..width), rng.gen_range(0.0..height)),
            (rng.gen_range(0.0..width), rng.gen_range(0.0..height)),
            1.0,
            color,
        );
    }

    let count = code.chars().count();
    if count == 0 {
        return;
    }
    let slot = width / (count as f64 + 1.0);
    for (index, glyph) in code.chars().enumerate() {
        let font_size = *FONT_SIZES.choose(rng).unwrap_or(&FONT_SIZES[0]);
        let style = GlyphStyle {
            font_size,
            angle: rng.gen_range(-MAX_ROTATION..=MAX_ROTATION),
            color: Color::hsla(rng.gen_range(0.0..360.0), 0.7, 0.35, 1.0),
        };
        let x = slot * (index as f64 + 1.0) + rng.gen_range(-JITTER_X..=JITTER_X);
        let y = height / 2.0 + font_size / 3.0 + rng.gen_range(-JITTER_Y..=JITTER_Y);
        surface.fill_glyph(glyph, x, y, style);
    }
}

/// Surface that accumulates SVG elements.
#[derive(Clone, Debug)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    elements: Vec<String>,
}

impl Default for SvgSurface {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl SvgSurface {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }

    #[must_use]
    pub fn to_svg(&self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        for element in &self.elements {
            svg.push_str(element);
        }
        svg.push_str("</svg>");
        svg
    }
}

impl DrawingSurface for SvgSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        self.elements.push(format!(
            r#"<rect x="{x:.1}" y="{y:.1}" width="{width:.1}" height="{height:.1}" fill="{}"/>"#,
            color.css()
        ));
    }

    fn fill_dot(&mut self, x: f64, y: f64, radius: f64, color: Color) {
        self.elements.push(format!(
            r#"<circle cx="{x:.1}" cy="{y:.1}" r="{radius:.1}" fill="{}"/>"#,
            color.css()
        ));
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Color) {
        self.elements.push(format!(
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{width:.1}"/>"#,
            from.0,
            from.1,
            to.0,
            to.1,
            color.css()
        ));
    }

    fn fill_glyph(&mut self, glyph: char, x: f64, y: f64, style: GlyphStyle) {
        let mut element = String::new();
        let _ = write!(
            element,
            r#"<text x="{x:.1}" y="{y:.1}" font-family="monospace" font-weight="bold" font-size="{:.0}" fill="{}" transform="rotate({:.1} {x:.1} {y:.1})">{}</text>"#,
            style.font_size,
            style.color.css(),
            style.angle.to_degrees(),
            escape_xml(glyph)
        );
        self.elements.push(element);
    }
}

fn escape_xml(glyph: char) -> String {
    match glyph {
        '&' => "&amp;".to_string(),
        '<' => "&lt;".to_string(),
        '>' => "&gt;".to_string(),
        '"' => "&quot;".to_string(),
        other => other.to_string(),
    }
}
