//! Display-control channel coordination.
//!
//! Outgoing monitor layouts are clamped to the channel's size bounds, forced
//! to even dimensions (odd widths break some server-side codecs), and rate
//! limited so a resize storm cannot flood the channel.

use crate::channels::ChannelHandler;
use parking_lot::Mutex;
use rdp_engine::channels::disp::{
    DispSender, MonitorLayout, MAX_MONITOR_HEIGHT, MAX_MONITOR_WIDTH, MIN_MONITOR_HEIGHT,
    MIN_MONITOR_WIDTH,
};
use rdp_engine::channels::DISP_CHANNEL_NAME;
use rdp_engine::EngineResult;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Minimum spacing between two layout requests.
const MIN_SEND_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Default)]
struct DisplayInner {
    sender: Option<Arc<dyn DispSender>>,
    last_sent: Option<Instant>,
}

/// Session-side display-control handler.
#[derive(Default)]
pub struct DisplayControlHandler {
    inner: Mutex<DisplayInner>,
}

impl DisplayControlHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, sender: Arc<dyn DispSender>) {
        let mut inner = self.inner.lock();
        inner.sender = Some(sender);
        inner.last_sent = None;
    }

    pub fn detach(&self) {
        self.inner.lock().sender = None;
    }

    /// Request a new desktop geometry as a single primary monitor.
    ///
    /// Returns `Ok(true)` when the request went out, `Ok(false)` when it was
    /// suppressed (channel down, or inside the rate-limit window).
    pub fn send_layout(&self, width: u32, height: u32) -> EngineResult<bool> {
        self.send_layout_at(Instant::now(), width, height)
    }

    fn send_layout_at(&self, now: Instant, width: u32, height: u32) -> EngineResult<bool> {
        let sender = {
            let mut inner = self.inner.lock();
            let Some(sender) = inner.sender.clone() else {
                return Ok(false);
            };
            if let Some(last) = inner.last_sent {
                if now.duration_since(last) < MIN_SEND_INTERVAL {
                    return Ok(false);
                }
            }
            inner.last_sent = Some(now);
            sender
        };
        let (width, height) = sanitize_dimensions(width, height);
        debug!(width, height, "requesting monitor layout");
        sender.send_monitor_layout(&[MonitorLayout::primary(width, height)])?;
        Ok(true)
    }
}

impl ChannelHandler for DisplayControlHandler {
    fn name(&self) -> &'static str {
        DISP_CHANNEL_NAME
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().sender.is_some()
    }
}

/// Clamp to the channel bounds, then round down to even.
fn sanitize_dimensions(width: u32, height: u32) -> (u32, u32) {
    let width = width.clamp(MIN_MONITOR_WIDTH, MAX_MONITOR_WIDTH) & !1;
    let height = height.clamp(MIN_MONITOR_HEIGHT, MAX_MONITOR_HEIGHT) & !1;
    (width, height)
}
