//! Per-channel coordination state owned by the session controller.
//!
//! Channel handlers live for the whole session; the engine attaches a send
//! capability when a channel comes up and the session detaches it when the
//! channel goes down or the session ends.

pub mod audio;
pub mod clipboard;
pub mod display;
pub mod drive;

/// Common surface of the per-channel handlers.
pub trait ChannelHandler {
    /// Channel name as announced by the engine.
    fn name(&self) -> &'static str;
    /// True while the channel is up and has a send capability attached.
    fn is_connected(&self) -> bool;
}
