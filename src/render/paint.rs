use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Affine, BezPath, Rgba8Premul};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::foundation::math::lerp_u8;

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> SlidecastResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| SlidecastError::acquisition("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| SlidecastError::acquisition("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(SlidecastError::acquisition("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

pub(crate) fn rgba_premul_to_image(
    bytes_premul: &[u8],
    width: u32,
    height: u32,
) -> SlidecastResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes_premul, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Canvas-sized diagonal gradient from the top-left corner (`start`) to the bottom-right (`end`).
///
/// The gradient axis runs along the canvas diagonal, so `t = (x*w + y*h) / (w^2 + h^2)`.
pub(crate) fn diagonal_gradient_image(
    start: Rgba8Premul,
    end: Rgba8Premul,
    w: u32,
    h: u32,
) -> SlidecastResult<vello_cpu::Image> {
    let mut bytes = vec![0u8; (w as usize).saturating_mul(h as usize).saturating_mul(4)];
    let wf = w.max(1) as f32 - 1.0;
    let hf = h.max(1) as f32 - 1.0;
    let denom = wf * wf + hf * hf;
    for y in 0..h {
        for x in 0..w {
            let t = if denom <= 0.0 {
                0.0
            } else {
                ((x as f32) * wf + (y as f32) * hf) / denom
            };
            let idx = ((y as usize) * (w as usize) + (x as usize)) * 4;
            bytes[idx..idx + 4].copy_from_slice(&[
                lerp_u8(start.r, end.r, t),
                lerp_u8(start.g, end.g, t),
                lerp_u8(start.b, end.b, t),
                lerp_u8(start.a, end.a, t),
            ]);
        }
    }
    rgba_premul_to_image(&bytes, w, h)
}

/// A decoded slide image ready to paint, plus its native size.
#[derive(Clone)]
pub(crate) struct ImagePaint {
    pub(crate) paint: vello_cpu::Image,
    pub(crate) w: u32,
    pub(crate) h: u32,
}

impl ImagePaint {
    pub(crate) fn from_prepared(img: &PreparedImage) -> SlidecastResult<Self> {
        Ok(Self {
            paint: rgba_premul_to_image(&img.rgba8_premul, img.width, img.height)?,
            w: img.width,
            h: img.height,
        })
    }

    /// Transform that scales the image to cover `cw x ch` and centers it; overflow is cropped.
    pub(crate) fn cover_transform(&self, cw: f64, ch: f64) -> Affine {
        let iw = f64::from(self.w.max(1));
        let ih = f64::from(self.h.max(1));
        let scale = (cw / iw).max(ch / ih);
        let dx = (cw - iw * scale) / 2.0;
        let dy = (ch - ih * scale) / 2.0;
        Affine::translate((dx, dy)) * Affine::scale(scale)
    }
}
