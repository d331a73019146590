//! The engine and callback-handler traits forming the session/engine seam.
//!
//! The original design recovered a controller object from an opaque context
//! pointer inside C trampolines; here the dispatch table is an
//! [`EngineEventHandler`] trait object registered once per session.

use crate::cert::{CertificateInfo, CertificateVerdict};
use crate::channels::cliprdr::{CliprdrSender, ClipboardServerMessage};
use crate::channels::disp::DispSender;
use crate::error::EngineResult;
use crate::framebuffer::{FramebufferHandle, PixelFormat};
use crate::input::{KeyboardFlags, PointerFlags};
use crate::settings::EngineSettings;
use std::sync::Arc;
use std::time::Duration;

/// Send capability delivered with a channel-connected notification.
///
/// Audio and drive redirection are handled inside the engine; the session
/// only tracks their up/down state.
pub enum ChannelEndpoint {
    Clipboard(Arc<dyn CliprdrSender>),
    DisplayControl(Arc<dyn DispSender>),
    Audio,
    Drive,
}

/// Callback contract implemented by the session controller.
///
/// All methods are invoked synchronously on the worker thread, either from
/// inside the blocking `connect` call or from `process_events`.
pub trait EngineEventHandler: Send + Sync {
    /// Before the transport handshake. Returning false aborts the connect.
    fn pre_connect(&self, engine: &dyn Engine) -> bool;

    /// After the handshake succeeded. Returning false aborts the connect.
    fn post_connect(&self, engine: &dyn Engine) -> bool;

    /// Always invoked on teardown, even after a failed connect.
    fn post_disconnect(&self, engine: &dyn Engine);

    /// Start of a paint cycle. Returning false signals a fatal paint error.
    fn begin_paint(&self, engine: &dyn Engine) -> bool;

    /// End of a paint cycle. Returning false signals a fatal paint error.
    fn end_paint(&self, engine: &dyn Engine) -> bool;

    /// Server-initiated desktop geometry change; the negotiated size is
    /// readable from the engine settings. Returning false is fatal.
    fn desktop_resize(&self, engine: &dyn Engine) -> bool;

    /// TLS certificate presented by the server.
    fn verify_certificate(&self, cert: &CertificateInfo) -> CertificateVerdict;

    /// A virtual channel came up; `endpoint` carries its send capability.
    fn channel_connected(&self, name: &str, endpoint: ChannelEndpoint);

    /// A virtual channel went down.
    fn channel_disconnected(&self, name: &str);

    /// Server-to-client clipboard traffic.
    fn clipboard_message(&self, message: ClipboardServerMessage);
}

/// Protocol engine boundary.
///
/// Implementations use interior mutability: the worker thread drives
/// `connect`/`wait_for_activity`/`process_events`/`disconnect`, while
/// `abort_connect` and the input sends may arrive from the UI thread
/// (the session serializes input sends behind its own lock).
pub trait Engine: Send + Sync {
    /// Apply a settings snapshot. Must precede `connect`.
    fn apply_settings(&self, settings: EngineSettings) -> EngineResult<()>;

    /// Snapshot of the current settings, including negotiated geometry.
    fn settings(&self) -> EngineSettings;

    /// Install the callback dispatch table. Must precede `connect`; the
    /// engine drops the handler again in `disconnect`.
    fn register_handler(&self, handler: Arc<dyn EngineEventHandler>);

    /// Load channel add-ins. Called from the pre-connect callback.
    fn load_addins(&self) -> EngineResult<()>;

    /// Blocking connect-and-handshake. Invokes the pre-connect, certificate
    /// and post-connect callbacks on the caller's stack.
    fn connect(&self) -> EngineResult<()>;

    /// Interrupt an in-progress `connect`. Callable from any thread.
    fn abort_connect(&self);

    /// Block until protocol activity is ready or `timeout` elapses. The
    /// timeout exists so the caller can re-check its cancellation flag; it
    /// is not a protocol timeout.
    fn wait_for_activity(&self, timeout: Duration) -> EngineResult<()>;

    /// Process ready protocol events, invoking paint/resize/channel
    /// callbacks. An error is unrecoverable for the session.
    fn process_events(&self) -> EngineResult<()>;

    /// True once the engine itself decided the session must end.
    fn shall_disconnect(&self) -> bool;

    /// Tear the session down and release the handler. Idempotent; safe to
    /// call after a failed connect.
    fn disconnect(&self);

    /// Allocate the local back-store at the negotiated geometry. Called from
    /// the post-connect callback.
    fn init_framebuffer(&self, format: PixelFormat) -> EngineResult<FramebufferHandle>;

    fn send_keyboard_event(&self, flags: KeyboardFlags, code: u8) -> EngineResult<()>;
    fn send_mouse_event(&self, flags: PointerFlags, x: u16, y: u16) -> EngineResult<()>;
    fn send_extended_mouse_event(&self, flags: PointerFlags, x: u16, y: u16) -> EngineResult<()>;
}
