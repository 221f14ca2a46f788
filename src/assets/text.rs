use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::error::{SlidecastError, SlidecastResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl TextBrushRgba8 {
    /// Brush from straight RGBA8.
    pub fn from_rgba(rgba: [u8; 4]) -> Self {
        Self {
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        }
    }
}

/// Measures the advance width of a single line of text.
pub trait TextMeasure {
    /// Width in pixels of `text` laid out on one line at `size_px`.
    fn measure(&mut self, text: &str, size_px: f32) -> f32;
}

/// Fixed per-character advance, used when no font is configured.
#[derive(Clone, Copy, Debug)]
pub struct ApproxMeasure {
    /// Advance of one character as a fraction of the font size.
    pub em_advance: f32,
}

impl Default for ApproxMeasure {
    fn default() -> Self {
        Self { em_advance: 0.55 }
    }
}

impl TextMeasure for ApproxMeasure {
    fn measure(&mut self, text: &str, size_px: f32) -> f32 {
        text.chars().count() as f32 * size_px * self.em_advance
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    font_bytes: Arc<Vec<u8>>,
    family_name: String,
    width_cache: HashMap<(String, u32), f32>,
}

impl std::fmt::Debug for TextLayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayoutEngine")
            .field("family_name", &self.family_name)
            .field("font_bytes", &self.font_bytes.len())
            .finish_non_exhaustive()
    }
}

impl TextLayoutEngine {
    /// Register `font_bytes` and construct fresh Parley contexts.
    pub fn new(font_bytes: Arc<Vec<u8>>) -> SlidecastResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.as_ref().clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            SlidecastError::acquisition("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| SlidecastError::acquisition("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            font_bytes,
            family_name,
            width_cache: HashMap::new(),
        })
    }

    /// Family name of the registered font.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Raw bytes of the registered font.
    pub fn font_bytes(&self) -> &Arc<Vec<u8>> {
        &self.font_bytes
    }

    /// Shape and lay out a single unwrapped line.
    pub fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> SlidecastResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(SlidecastError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

impl TextMeasure for TextLayoutEngine {
    fn measure(&mut self, text: &str, size_px: f32) -> f32 {
        let key = (text.to_owned(), size_px.to_bits());
        if let Some(w) = self.width_cache.get(&key) {
            return *w;
        }
        let w = match self.layout_line(text, size_px, TextBrushRgba8::default()) {
            Ok(layout) => layout.width(),
            Err(_) => ApproxMeasure::default().measure(text, size_px),
        };
        self.width_cache.insert(key, w);
        w
    }
}
