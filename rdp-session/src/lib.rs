//! Session controller for the remote desktop viewer.
//!
//! Sits between the UI and a protocol engine: owns the connection lifecycle
//! state machine and its worker thread, receives the engine's callbacks, and
//! coordinates the virtual channels (clipboard, display control, audio,
//! drive redirection). Events for the UI cross a crossbeam channel; pixels
//! cross through the shared framebuffer handle.

pub mod channels;
pub mod errors;
pub mod events;
pub mod profile;
mod session;

pub use errors::{SessionError, SessionErrorKind};
pub use events::{event_channel, SessionEvent};
pub use profile::{ConnectionProfile, UntrustedCertPolicy};
pub use session::{SessionController, SessionState};
