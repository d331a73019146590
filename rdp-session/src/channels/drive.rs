//! Drive redirection channel tracking.
//!
//! File access is served inside the engine; the session tracks channel
//! state and remembers which local path is exposed.

use crate::channels::ChannelHandler;
use parking_lot::Mutex;
use rdp_engine::channels::RDPDR_CHANNEL_NAME;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct DriveHandler {
    connected: AtomicBool,
    shared_path: Mutex<Option<String>>,
}

impl DriveHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn set_shared_path(&self, path: Option<String>) {
        *self.shared_path.lock() = path;
    }

    pub fn shared_path(&self) -> Option<String> {
        self.shared_path.lock().clone()
    }
}

impl ChannelHandler for DriveHandler {
    fn name(&self) -> &'static str {
        RDPDR_CHANNEL_NAME
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
