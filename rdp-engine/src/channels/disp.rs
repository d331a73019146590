//! Display-control channel contract (monitor layout requests).

use crate::error::EngineResult;
use bitflags::bitflags;

/// Smallest monitor width the channel accepts.
pub const MIN_MONITOR_WIDTH: u32 = 200;
/// Largest monitor width the channel accepts.
pub const MAX_MONITOR_WIDTH: u32 = 8192;
/// Smallest monitor height the channel accepts.
pub const MIN_MONITOR_HEIGHT: u32 = 200;
/// Largest monitor height the channel accepts.
pub const MAX_MONITOR_HEIGHT: u32 = 8192;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MonitorLayoutFlags: u32 {
        const PRIMARY = 0x0000_0001;
    }
}

/// Monitor orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape = 0,
    Portrait = 90,
    LandscapeFlipped = 180,
    PortraitFlipped = 270,
}

/// One monitor entry of a layout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorLayout {
    pub flags: MonitorLayoutFlags,
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    /// Physical size in millimetres; zero means unspecified.
    pub physical_width: u32,
    pub physical_height: u32,
    pub orientation: Orientation,
    pub desktop_scale_factor: u32,
    pub device_scale_factor: u32,
}

impl MonitorLayout {
    /// Single primary monitor at the origin with default scaling.
    pub fn primary(width: u32, height: u32) -> Self {
        Self {
            flags: MonitorLayoutFlags::PRIMARY,
            left: 0,
            top: 0,
            width,
            height,
            physical_width: 0,
            physical_height: 0,
            orientation: Orientation::Landscape,
            desktop_scale_factor: 100,
            device_scale_factor: 100,
        }
    }
}

/// Client-to-server send capability for the display-control channel.
pub trait DispSender: Send + Sync {
    fn send_monitor_layout(&self, layouts: &[MonitorLayout]) -> EngineResult<()>;
}
