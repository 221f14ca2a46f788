use std::sync::Arc;

use kurbo::Shape;

use crate::assets::decode::PreparedImage;
use crate::assets::text::TextMeasure;
use crate::deck::slides::SlideDeck;
use crate::deck::style::{BrandColor, StyleConfig};
use crate::foundation::core::{Canvas, Rect, Rgba8Premul, RoundedRect};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::paint::{
    ImagePaint, affine_to_cpu, bezpath_to_cpu, diagonal_gradient_image,
};
use crate::render::surface::DrawingSurface;
use crate::render::text::TextPainter;
use crate::render::wrap::wrap_greedy;

/// Gradient end color (`#0f172a`).
pub const DARK_NEUTRAL: BrandColor = BrandColor {
    r: 0x0f,
    g: 0x17,
    b: 0x2a,
};
/// Opacity of a slide's cover-fit backdrop image.
pub const IMAGE_BACKDROP_OPACITY: f32 = 0.25;
/// Title/subtitle vertical offset at the start of a slide's entrance, in pixels.
pub const TITLE_SETTLE_PX: f64 = 16.0;
/// Label drawn in the bottom-right corner of every frame.
pub const WATERMARK_TEXT: &str = "Made with Slidecast";

const REFERENCE_HEIGHT: f64 = 1920.0;
const WHITE: [u8; 4] = [255, 255, 255, 255];
const SUBTITLE_RGBA: [u8; 4] = [255, 255, 255, 210];
const CARD_RGBA: [u8; 4] = [255, 255, 255, 36];
const WATERMARK_RGBA: [u8; 4] = [255, 255, 255, 150];
// Approximate rendered line box of a single line, as a multiple of font size.
const LINE_BOX: f64 = 1.2;

/// Pixel geometry of a slide for one canvas size. Sizes scale with canvas height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlideLayout {
    /// `height / 1920`.
    pub scale: f64,
    /// Horizontal page margin.
    pub pad: f64,
    /// Title font size.
    pub title_px: f32,
    /// Subtitle font size.
    pub subtitle_px: f32,
    /// Benefit text font size.
    pub body_px: f32,
    /// CTA label font size.
    pub cta_px: f32,
    /// Watermark font size.
    pub watermark_px: f32,
    /// Top of the title line once the entrance has settled.
    pub title_top: f64,
    /// Card over the middle third of the canvas.
    pub card: Rect,
    /// Card corner radius.
    pub card_radius: f64,
    /// Inner padding between card edge and benefit text.
    pub card_inset: f64,
    /// Baseline-to-baseline distance of benefit lines.
    pub line_height: f64,
    /// Horizontal padding on each side of the CTA label.
    pub cta_pad_x: f64,
    /// CTA pill height.
    pub cta_height: f64,
    /// Gap between the last benefit line and the CTA pill.
    pub cta_gap: f64,
    /// Distance from the bottom edge to the watermark line box.
    pub watermark_margin: f64,
}

impl SlideLayout {
    /// Layout for `canvas`.
    pub fn for_canvas(canvas: Canvas) -> Self {
        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);
        let s = h / REFERENCE_HEIGHT;
        let pad = w * 0.08;
        let body_px = (56.0 * s) as f32;
        let cta_px = (40.0 * s) as f32;
        Self {
            scale: s,
            pad,
            title_px: (72.0 * s) as f32,
            subtitle_px: (40.0 * s) as f32,
            body_px,
            cta_px,
            watermark_px: (24.0 * s) as f32,
            title_top: h * 0.08,
            card: Rect::new(pad, h / 3.0, w - pad, h * 2.0 / 3.0),
            card_radius: 32.0 * s,
            card_inset: 48.0 * s,
            line_height: f64::from(body_px) * 1.3,
            cta_pad_x: 36.0 * s,
            cta_height: f64::from(cta_px) * 2.2,
            cta_gap: 32.0 * s,
            watermark_margin: 40.0 * s,
        }
    }

    /// Width available to benefit text inside the card.
    pub fn text_max_width(&self) -> f64 {
        (self.card.width() - 2.0 * self.card_inset).max(1.0)
    }

    /// Title top for an eased entrance value: `+TITLE_SETTLE_PX` at 0, settled at 1.
    pub fn title_top_at(&self, eased: f64) -> f64 {
        self.title_top + TITLE_SETTLE_PX * (1.0 - eased.clamp(0.0, 1.0))
    }
}

/// Draws slides onto a [`DrawingSurface`].
///
/// Each call fully redraws the surface from `(slide, eased)` and the inputs fixed at construction,
/// so the same arguments always produce the same pixels.
pub struct FrameRenderer {
    canvas: Canvas,
    layout: SlideLayout,
    brand: BrandColor,
    title: String,
    subtitle: String,
    call_to_action: String,
    cta_width: f64,
    watermark_width: f64,
    slide_lines: Vec<Vec<String>>,
    images: Vec<Option<ImagePaint>>,
    backdrop: vello_cpu::Image,
    text: TextPainter,
}

impl std::fmt::Debug for FrameRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRenderer")
            .field("canvas", &self.canvas)
            .field("slides", &self.slide_lines.len())
            .field("has_font", &self.text.has_font())
            .finish_non_exhaustive()
    }
}

impl FrameRenderer {
    /// Prepare a renderer for `deck` on `canvas`.
    ///
    /// `images[i]` is the decoded image of slide `i`; missing entries render without an image.
    pub fn new(
        canvas: Canvas,
        style: &StyleConfig,
        deck: &SlideDeck,
        images: &[Option<Arc<PreparedImage>>],
        font: Option<Arc<Vec<u8>>>,
    ) -> SlidecastResult<Self> {
        if deck.is_empty() {
            return Err(SlidecastError::validation("renderer needs at least one slide"));
        }
        let brand = style.brand()?;
        let layout = SlideLayout::for_canvas(canvas);
        let mut text = TextPainter::new(font)?;

        let max_w = layout.text_max_width() as f32;
        let slide_lines = deck
            .slides()
            .iter()
            .map(|s| wrap_greedy(&s.text, max_w, layout.body_px, &mut text))
            .collect::<Vec<_>>();
        let cta_width = f64::from(text.measure(&style.call_to_action, layout.cta_px));
        let watermark_width = f64::from(text.measure(WATERMARK_TEXT, layout.watermark_px));

        let images = (0..deck.len())
            .map(|i| {
                let prepared = images.get(i)?.as_ref()?;
                match ImagePaint::from_prepared(prepared) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        tracing::warn!(slide = i + 1, error = %e, "slide image unusable, drawing without it");
                        None
                    }
                }
            })
            .collect::<Vec<_>>();

        let [br, bg, bb, _] = brand.rgba(255);
        let backdrop = diagonal_gradient_image(
            Rgba8Premul::from_straight_rgba(br, bg, bb, 255),
            Rgba8Premul::from_straight_rgba(DARK_NEUTRAL.r, DARK_NEUTRAL.g, DARK_NEUTRAL.b, 255),
            canvas.width,
            canvas.height,
        )?;

        Ok(Self {
            canvas,
            layout,
            brand,
            title: style.title.clone(),
            subtitle: style.subtitle.clone(),
            call_to_action: style.call_to_action.clone(),
            cta_width,
            watermark_width,
            slide_lines,
            images,
            backdrop,
            text,
        })
    }

    /// Canvas this renderer draws for.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Slide geometry.
    pub fn layout(&self) -> &SlideLayout {
        &self.layout
    }

    /// Number of slides.
    pub fn slide_count(&self) -> usize {
        self.slide_lines.len()
    }

    /// Wrapped benefit lines of slide `slide`.
    pub fn lines(&self, slide: usize) -> Option<&[String]> {
        self.slide_lines.get(slide).map(Vec::as_slice)
    }

    /// Whether slide `slide` has a usable backdrop image.
    pub fn has_image(&self, slide: usize) -> bool {
        matches!(self.images.get(slide), Some(Some(_)))
    }

    /// Bounds of the CTA pill on slide `slide`, directly below its benefit text.
    pub fn cta_rect(&self, slide: usize) -> Option<Rect> {
        let lines = self.slide_lines.get(slide)?;
        let l = &self.layout;
        let text_bottom = l.card.y0 + l.card_inset + lines.len() as f64 * l.line_height;
        let x0 = l.card.x0 + l.card_inset;
        let y0 = text_bottom + l.cta_gap;
        Some(Rect::new(
            x0,
            y0,
            x0 + self.cta_width + 2.0 * l.cta_pad_x,
            y0 + l.cta_height,
        ))
    }

    /// Redraw `surface` with slide `slide` at entrance value `eased`.
    pub fn draw(
        &mut self,
        surface: &mut DrawingSurface,
        slide: usize,
        eased: f64,
    ) -> SlidecastResult<()> {
        if surface.canvas() != self.canvas {
            return Err(SlidecastError::validation(format!(
                "surface {}x{} does not match renderer canvas {}x{}",
                surface.canvas().width,
                surface.canvas().height,
                self.canvas.width,
                self.canvas.height
            )));
        }
        if slide >= self.slide_count() {
            return Err(SlidecastError::validation(format!(
                "slide {slide} out of range (deck has {})",
                self.slide_count()
            )));
        }
        surface.redraw(|ctx| self.paint(ctx, slide, eased))
    }

    fn paint(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        slide: usize,
        eased: f64,
    ) -> SlidecastResult<()> {
        let w = f64::from(self.canvas.width);
        let h = f64::from(self.canvas.height);
        let l = self.layout;

        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(self.backdrop.clone());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));

        if let Some(Some(img)) = self.images.get(slide) {
            ctx.set_transform(affine_to_cpu(img.cover_transform(w, h)));
            ctx.set_paint(img.paint.clone());
            ctx.push_opacity_layer(IMAGE_BACKDROP_OPACITY);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(img.w),
                f64::from(img.h),
            ));
            ctx.pop_layer();
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        }

        let title_top = l.title_top_at(eased);
        self.text
            .draw_line(ctx, &self.title, l.title_px, WHITE, l.pad, title_top)?;
        let subtitle_top = title_top + f64::from(l.title_px) * 1.25;
        self.text.draw_line(
            ctx,
            &self.subtitle,
            l.subtitle_px,
            SUBTITLE_RGBA,
            l.pad,
            subtitle_top,
        )?;

        fill_rounded(ctx, l.card, l.card_radius, CARD_RGBA);

        let text_x = l.card.x0 + l.card_inset;
        for (i, line) in self.slide_lines[slide].iter().enumerate() {
            let top = l.card.y0 + l.card_inset + i as f64 * l.line_height;
            self.text.draw_line(ctx, line, l.body_px, WHITE, text_x, top)?;
        }

        if let Some(pill) = self.cta_rect(slide) {
            fill_rounded(ctx, pill, pill.height() / 2.0, WHITE);
            let label_top = pill.y0 + (pill.height() - f64::from(l.cta_px) * LINE_BOX) / 2.0;
            self.text.draw_line(
                ctx,
                &self.call_to_action,
                l.cta_px,
                self.brand.rgba(255),
                pill.x0 + l.cta_pad_x,
                label_top,
            )?;
        }

        let wm_top = h - l.watermark_margin - f64::from(l.watermark_px) * LINE_BOX;
        self.text.draw_line(
            ctx,
            WATERMARK_TEXT,
            l.watermark_px,
            WATERMARK_RGBA,
            w - l.pad - self.watermark_width,
            wm_top,
        )?;
        Ok(())
    }
}

fn fill_rounded(ctx: &mut vello_cpu::RenderContext, rect: Rect, radius: f64, rgba: [u8; 4]) {
    let path = RoundedRect::from_rect(rect, radius).to_path(0.1);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        rgba[0], rgba[1], rgba[2], rgba[3],
    ));
    ctx.fill_path(&bezpath_to_cpu(&path));
}

#[cfg(test)]
#[path = "../../tests/unit/render/slide.rs"]
mod tests;
