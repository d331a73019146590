//! Local framebuffer back-store shared between the engine worker and the UI.
//!
//! The engine's paint path writes decoded output here; the UI reads it once
//! per render tick. Both sides go through a short-lived [`parking_lot::RwLock`]
//! so a frame is never observed mid-resize.

use crate::error::{EngineError, EngineResult};
use parking_lot::RwLock;
use rdp_common::Rect;
use std::sync::Arc;

/// Pixel formats the back-store can hold.
///
/// Fixed to BGRA32: it maps directly onto the presentation surface without a
/// per-frame conversion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Bgra32,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Bgra32 => 4,
        }
    }
}

/// Largest dimension the back-store accepts, matching the display-control
/// monitor bounds.
pub const MAX_FRAMEBUFFER_DIM: u32 = 8192;

/// Shared handle to the session framebuffer.
pub type FramebufferHandle = Arc<RwLock<GdiBuffer>>;

/// CPU-side desktop image plus per-frame dirty-region tracking.
#[derive(Debug)]
pub struct GdiBuffer {
    format: PixelFormat,
    width: u32,
    height: u32,
    stride: u32,
    data: Vec<u8>,
    dirty: Option<Rect>,
}

impl GdiBuffer {
    /// Allocate a zeroed buffer. Fails on zero or out-of-range dimensions.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> EngineResult<Self> {
        check_dims(width, height)?;
        let stride = width * format.bytes_per_pixel();
        Ok(Self {
            format,
            width,
            height,
            stride,
            data: vec![0; (stride * height) as usize],
            dirty: None,
        })
    }

    /// Wrap in the shared handle type.
    pub fn into_handle(self) -> FramebufferHandle {
        Arc::new(RwLock::new(self))
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Reallocate for a new desktop geometry. Existing content is discarded;
    /// the whole surface is marked dirty so the next end-paint repaints it.
    pub fn resize(&mut self, width: u32, height: u32) -> EngineResult<()> {
        check_dims(width, height)?;
        self.width = width;
        self.height = height;
        self.stride = width * self.format.bytes_per_pixel();
        self.data = vec![0; (self.stride * height) as usize];
        self.dirty = Some(Rect::new(0, 0, width, height));
        Ok(())
    }

    /// Extend the per-frame invalid region.
    pub fn mark_dirty(&mut self, rect: Rect) {
        self.dirty = Some(match self.dirty {
            Some(cur) => cur.union(&rect),
            None => rect,
        });
    }

    /// Take and clear the invalid region accumulated since the last paint.
    pub fn take_dirty(&mut self) -> Option<Rect> {
        self.dirty.take()
    }

    /// Reset the invalid region at the start of a paint cycle.
    pub fn clear_dirty(&mut self) {
        self.dirty = None;
    }
}

fn check_dims(width: u32, height: u32) -> EngineResult<()> {
    if width == 0 || height == 0 || width > MAX_FRAMEBUFFER_DIM || height > MAX_FRAMEBUFFER_DIM {
        return Err(EngineError::Internal(format!(
            "invalid framebuffer dimensions {width}x{height}"
        )));
    }
    Ok(())
}
