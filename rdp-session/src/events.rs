//! Cross-thread session events.
//!
//! The worker thread publishes these over a crossbeam channel; the UI drains
//! the receiver once per render tick. Events are edge-triggered, payload-free
//! notifications: the UI reads current geometry and pixels from the shared
//! framebuffer handle and errors from the controller's `last_error`.

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Notifications crossing from the session worker to the UI thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A paint cycle completed; the framebuffer has fresh content.
    FrameReady,
    /// The desktop was re-allocated; re-read the framebuffer geometry.
    Resized,
    /// The connection failed; the error is available from the controller.
    ConnectionError,
    /// The session ended and the worker is exiting.
    Disconnected,
}

/// Build the worker-to-UI event channel.
pub fn event_channel() -> (Sender<SessionEvent>, Receiver<SessionEvent>) {
    unbounded()
}
