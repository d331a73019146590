//! Audio output channel tracking.
//!
//! Playback itself happens inside the engine; the session only tracks
//! whether the channel came up so the UI can reflect it.

use crate::channels::ChannelHandler;
use rdp_engine::channels::RDPSND_CHANNEL_NAME;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct AudioHandler {
    connected: AtomicBool,
}

impl AudioHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl ChannelHandler for AudioHandler {
    fn name(&self) -> &'static str {
        RDPSND_CHANNEL_NAME
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
