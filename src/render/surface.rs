use crate::foundation::core::Canvas;
use crate::foundation::error::{SlidecastError, SlidecastResult};

/// A rendered frame as RGBA8 pixels.
///
/// Frames read back from a [`DrawingSurface`] are premultiplied alpha; the flag keeps that explicit
/// at API boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)` as `[r, g, b, a]`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Fixed-size pixel buffer the slide renderer draws into, one frame at a time.
pub struct DrawingSurface {
    canvas: Canvas,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl std::fmt::Debug for DrawingSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingSurface")
            .field("canvas", &self.canvas)
            .finish_non_exhaustive()
    }
}

impl DrawingSurface {
    /// Allocate a surface for `canvas`.
    ///
    /// Fails with an acquisition error when the size is zero, odd (the encoder needs yuv420p), or
    /// exceeds the rasterizer's 16-bit limits.
    pub fn acquire(canvas: Canvas) -> SlidecastResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(SlidecastError::acquisition(
                "drawing surface width/height must be non-zero",
            ));
        }
        if !canvas.width.is_multiple_of(2) || !canvas.height.is_multiple_of(2) {
            return Err(SlidecastError::acquisition(
                "drawing surface width/height must be even",
            ));
        }
        let w: u16 = canvas.width.try_into().map_err(|_| {
            SlidecastError::acquisition(format!("surface width {} exceeds u16", canvas.width))
        })?;
        let h: u16 = canvas.height.try_into().map_err(|_| {
            SlidecastError::acquisition(format!("surface height {} exceeds u16", canvas.height))
        })?;

        tracing::debug!(width = w, height = h, "drawing surface acquired");
        Ok(Self {
            canvas,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    /// Surface dimensions.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Replace the surface contents with whatever `f` draws.
    ///
    /// The previous contents are discarded, never blended.
    pub fn redraw(
        &mut self,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> SlidecastResult<()>,
    ) -> SlidecastResult<()> {
        self.ctx.reset();
        f(&mut self.ctx)?;
        self.ctx.flush();
        self.pixmap.data_as_u8_slice_mut().fill(0);
        self.ctx.render_to_pixmap(&mut self.pixmap);
        Ok(())
    }

    /// Copy the current contents out.
    pub fn read_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }
}
