use std::sync::Arc;

use crate::assets::text::{ApproxMeasure, TextBrushRgba8, TextLayoutEngine, TextMeasure};
use crate::foundation::error::SlidecastResult;

struct FontBackend {
    engine: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
}

/// Measures and draws single text lines onto a `vello_cpu` context.
///
/// Without font bytes, measurement falls back to [`ApproxMeasure`] and glyphs are not drawn; every
/// non-text element still renders.
pub(crate) struct TextPainter {
    backend: Option<FontBackend>,
    approx: ApproxMeasure,
}

impl TextPainter {
    pub(crate) fn new(font_bytes: Option<Arc<Vec<u8>>>) -> SlidecastResult<Self> {
        let backend = match font_bytes {
            Some(bytes) => {
                let font = vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
                    0,
                );
                let engine = TextLayoutEngine::new(bytes)?;
                tracing::debug!(family = engine.family_name(), "text font registered");
                Some(FontBackend { engine, font })
            }
            None => {
                tracing::warn!("no font configured, slide text will not be drawn");
                None
            }
        };
        Ok(Self {
            backend,
            approx: ApproxMeasure::default(),
        })
    }

    pub(crate) fn has_font(&self) -> bool {
        self.backend.is_some()
    }

    /// Draw `text` on one line with its top-left corner at `(x, top)`.
    pub(crate) fn draw_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        size_px: f32,
        rgba: [u8; 4],
        x: f64,
        top: f64,
    ) -> SlidecastResult<()> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(());
        };
        if text.is_empty() {
            return Ok(());
        }

        let layout = backend
            .engine
            .layout_line(text, size_px, TextBrushRgba8::from_rgba(rgba))?;
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, top)));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&backend.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }
}

impl TextMeasure for TextPainter {
    fn measure(&mut self, text: &str, size_px: f32) -> f32 {
        match self.backend.as_mut() {
            Some(b) => b.engine.measure(text, size_px),
            None => self.approx.measure(text, size_px),
        }
    }
}
