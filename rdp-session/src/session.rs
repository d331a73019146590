//! Session controller: connection lifecycle and the worker thread.
//!
//! `connect` spawns a worker that drives the engine's blocking connect and
//! then its event loop; every engine callback lands in [`SessionCore`] on
//! that worker thread. The UI thread only touches the controller surface:
//! state queries, input sends, clipboard and resolution requests, and
//! `disconnect`, which flags the worker and joins it.

use crate::channels::audio::AudioHandler;
use crate::channels::clipboard::ClipboardHandler;
use crate::channels::display::DisplayControlHandler;
use crate::channels::drive::DriveHandler;
use crate::channels::ChannelHandler;
use crate::errors::SessionError;
use crate::events::SessionEvent;
use crate::profile::{ConnectionProfile, UntrustedCertPolicy};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use rdp_engine::channels::{
    CLIPRDR_CHANNEL_NAME, DISP_CHANNEL_NAME, RDPDR_CHANNEL_NAME, RDPSND_CHANNEL_NAME,
};
use rdp_engine::{
    CertificateInfo, CertificateVerdict, ChannelEndpoint, Engine, EngineEventHandler, EngineError,
    EngineResult, FramebufferHandle, KeyboardFlags, PixelFormat, PointerFlags,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long the worker blocks waiting for engine activity before re-checking
/// its cancellation flags.
const ACTIVITY_WAIT: Duration = Duration::from_millis(100);

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    Disconnecting,
    /// The last connection attempt or session failed; see the last error.
    Failed,
}

#[derive(Clone, Copy, Default)]
struct CertConfig {
    policy: UntrustedCertPolicy,
    ignore_certificate: bool,
}

/// Callback state shared between the controller and the worker thread.
struct SessionCore {
    state: Mutex<SessionState>,
    events: Sender<SessionEvent>,
    framebuffer: Mutex<Option<FramebufferHandle>>,
    last_error: Mutex<Option<SessionError>>,
    /// Set by the UI thread to ask the worker to exit.
    should_disconnect: AtomicBool,
    cert: Mutex<CertConfig>,

    clipboard: ClipboardHandler,
    display: DisplayControlHandler,
    audio: AudioHandler,
    drive: DriveHandler,
}

impl SessionCore {
    fn new(events: Sender<SessionEvent>) -> Self {
        Self {
            state: Mutex::new(SessionState::Idle),
            events,
            framebuffer: Mutex::new(None),
            last_error: Mutex::new(None),
            should_disconnect: AtomicBool::new(false),
            cert: Mutex::new(CertConfig::default()),
            clipboard: ClipboardHandler::new(),
            display: DisplayControlHandler::new(),
            audio: AudioHandler::new(),
            drive: DriveHandler::new(),
        }
    }

    fn state(&self) -> SessionState {
        *self.state.lock()
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock() = state;
    }

    fn should_disconnect(&self) -> bool {
        self.should_disconnect.load(Ordering::SeqCst)
    }

    fn emit(&self, event: SessionEvent) {
        // A dropped receiver means the UI is gone; nothing left to notify.
        let _ = self.events.send(event);
    }

    fn record_error(&self, err: &EngineError) -> SessionError {
        let session_err = SessionError::from(err);
        *self.last_error.lock() = Some(session_err.clone());
        session_err
    }
}

impl EngineEventHandler for SessionCore {
    fn pre_connect(&self, engine: &dyn Engine) -> bool {
        if let Err(err) = engine.load_addins() {
            error!(%err, "channel add-in load failed");
            self.record_error(&err);
            return false;
        }
        true
    }

    fn post_connect(&self, engine: &dyn Engine) -> bool {
        let fb = match engine.init_framebuffer(PixelFormat::Bgra32) {
            Ok(fb) => fb,
            Err(err) => {
                error!(%err, "framebuffer allocation failed");
                self.record_error(&err);
                return false;
            }
        };
        *self.framebuffer.lock() = Some(fb);
        self.set_state(SessionState::Connected);
        info!("session established");
        // Lets the UI leave the connecting screen before the first paint.
        self.emit(SessionEvent::FrameReady);
        true
    }

    fn post_disconnect(&self, _engine: &dyn Engine) {
        self.clipboard.detach();
        self.display.detach();
        self.audio.set_connected(false);
        self.drive.set_connected(false);
        *self.framebuffer.lock() = None;
    }

    fn begin_paint(&self, _engine: &dyn Engine) -> bool {
        if let Some(fb) = self.framebuffer.lock().clone() {
            fb.write().clear_dirty();
        }
        true
    }

    fn end_paint(&self, _engine: &dyn Engine) -> bool {
        let Some(fb) = self.framebuffer.lock().clone() else {
            return true;
        };
        let dirty = fb.write().take_dirty();
        if dirty.is_some_and(|r| !r.is_empty()) {
            self.emit(SessionEvent::FrameReady);
        }
        true
    }

    fn desktop_resize(&self, engine: &dyn Engine) -> bool {
        let (width, height) = engine.settings().desktop_size();
        let Some(fb) = self.framebuffer.lock().clone() else {
            return false;
        };
        if let Err(err) = fb.write().resize(width, height) {
            error!(%err, width, height, "desktop resize failed");
            self.record_error(&err);
            return false;
        }
        info!(width, height, "desktop resized");
        self.emit(SessionEvent::Resized);
        true
    }

    fn verify_certificate(&self, cert: &CertificateInfo) -> CertificateVerdict {
        let config = *self.cert.lock();
        if config.ignore_certificate {
            return CertificateVerdict::AcceptPermanent;
        }
        match config.policy {
            UntrustedCertPolicy::AcceptTemporarily => {
                warn!(
                    host = %cert.host,
                    subject = %cert.subject,
                    issuer = %cert.issuer,
                    fingerprint = %cert.fingerprint,
                    "accepting untrusted certificate for this session"
                );
                CertificateVerdict::AcceptOnce
            }
            UntrustedCertPolicy::Reject => {
                warn!(
                    host = %cert.host,
                    subject = %cert.subject,
                    issuer = %cert.issuer,
                    fingerprint = %cert.fingerprint,
                    "rejecting untrusted certificate"
                );
                CertificateVerdict::Reject
            }
        }
    }

    fn channel_connected(&self, name: &str, endpoint: ChannelEndpoint) {
        debug!(name, "channel connected");
        match endpoint {
            ChannelEndpoint::Clipboard(sender) => self.clipboard.attach(sender),
            ChannelEndpoint::DisplayControl(sender) => self.display.attach(sender),
            ChannelEndpoint::Audio => self.audio.set_connected(true),
            ChannelEndpoint::Drive => self.drive.set_connected(true),
        }
    }

    fn channel_disconnected(&self, name: &str) {
        debug!(name, "channel disconnected");
        match name {
            CLIPRDR_CHANNEL_NAME => self.clipboard.detach(),
            DISP_CHANNEL_NAME => self.display.detach(),
            RDPSND_CHANNEL_NAME => self.audio.set_connected(false),
            RDPDR_CHANNEL_NAME => self.drive.set_connected(false),
            other => debug!(name = other, "unknown channel"),
        }
    }

    fn clipboard_message(&self, message: rdp_engine::channels::cliprdr::ClipboardServerMessage) {
        if let Err(err) = self.clipboard.handle_message(message) {
            warn!(%err, "clipboard message handling failed");
        }
    }
}

/// The UI-facing session handle.
pub struct SessionController {
    engine: Arc<dyn Engine>,
    core: Arc<SessionCore>,
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Serializes input sends from the UI thread against the engine.
    send_lock: Mutex<()>,
}

impl SessionController {
    pub fn new(engine: Arc<dyn Engine>, events: Sender<SessionEvent>) -> Self {
        Self {
            engine,
            core: Arc::new(SessionCore::new(events)),
            worker: Mutex::new(None),
            send_lock: Mutex::new(()),
        }
    }

    pub fn state(&self) -> SessionState {
        self.core.state()
    }

    pub fn is_connected(&self) -> bool {
        self.core.state() == SessionState::Connected
    }

    /// Error recorded by the most recent failure, if any.
    pub fn last_error(&self) -> Option<SessionError> {
        self.core.last_error.lock().clone()
    }

    /// Shared handle to the desktop back-store, present while connected.
    pub fn framebuffer(&self) -> Option<FramebufferHandle> {
        self.core.framebuffer.lock().clone()
    }

    /// Start a connection attempt. Returns immediately; progress is reported
    /// through the event channel.
    pub fn connect(&self, profile: &ConnectionProfile) -> Result<(), SessionError> {
        match self.core.state() {
            SessionState::Idle | SessionState::Failed => {}
            state => {
                warn!(?state, "connect requested while session active");
                return Err(SessionError {
                    kind: crate::errors::SessionErrorKind::Internal,
                    detail: "a session is already active".into(),
                });
            }
        }
        // Reap a worker left over from a finished session.
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }

        *self.core.cert.lock() = CertConfig {
            policy: profile.cert_policy,
            ignore_certificate: profile.ignore_certificate,
        };
        self.core.drive.set_shared_path(profile.redirect_drive.clone());
        *self.core.last_error.lock() = None;
        self.core.should_disconnect.store(false, Ordering::SeqCst);

        if let Err(err) = self.engine.apply_settings(profile.to_settings()) {
            return Err(self.core.record_error(&err));
        }
        self.engine.register_handler(self.core.clone());
        self.core.set_state(SessionState::Connecting);
        info!(host = %profile.hostname, port = profile.port, "connecting");

        let engine = self.engine.clone();
        let core = self.core.clone();
        let handle = std::thread::Builder::new()
            .name("rdp-session".into())
            .spawn(move || worker_main(engine, core))
            .map_err(|e| SessionError {
                kind: crate::errors::SessionErrorKind::Internal,
                detail: format!("failed to spawn session worker: {e}"),
            })?;
        *self.worker.lock() = Some(handle);
        Ok(())
    }

    /// End the session (or cancel an in-progress connect) and wait for the
    /// worker to exit. Idempotent.
    pub fn disconnect(&self) {
        self.core.should_disconnect.store(true, Ordering::SeqCst);
        self.engine.abort_connect();
        if let Some(handle) = self.worker.lock().take() {
            debug!("waiting for session worker");
            let _ = handle.join();
        }
    }

    /// Ask the server for a new desktop geometry. Returns `Ok(true)` when
    /// the request was sent.
    pub fn request_resolution_change(&self, width: u32, height: u32) -> EngineResult<bool> {
        if !self.is_connected() {
            return Ok(false);
        }
        self.core.display.send_layout(width, height)
    }

    /// Offer local clipboard text to the server.
    pub fn send_clipboard_text(&self, text: String) -> EngineResult<()> {
        self.core.clipboard.set_local_text(text)
    }

    /// Server clipboard text received since the last call, if any.
    pub fn received_clipboard_text(&self) -> Option<String> {
        self.core.clipboard.take_remote_text()
    }

    /// True while the display-control channel is up.
    pub fn supports_resolution_change(&self) -> bool {
        self.core.display.is_connected()
    }

    pub fn send_keyboard_event(&self, flags: KeyboardFlags, code: u8) -> EngineResult<()> {
        if !self.is_connected() {
            return Ok(());
        }
        let _guard = self.send_lock.lock();
        self.engine.send_keyboard_event(flags, code)
    }

    pub fn send_mouse_event(&self, flags: PointerFlags, x: u16, y: u16) -> EngineResult<()> {
        if !self.is_connected() {
            return Ok(());
        }
        let _guard = self.send_lock.lock();
        self.engine.send_mouse_event(flags, x, y)
    }

    pub fn send_extended_mouse_event(
        &self,
        flags: PointerFlags,
        x: u16,
        y: u16,
    ) -> EngineResult<()> {
        if !self.is_connected() {
            return Ok(());
        }
        let _guard = self.send_lock.lock();
        self.engine.send_extended_mouse_event(flags, x, y)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Worker thread body: blocking connect, then the event pump.
fn worker_main(engine: Arc<dyn Engine>, core: Arc<SessionCore>) {
    if let Err(err) = engine.connect() {
        engine.disconnect();
        // A locally cancelled connect is not a failure.
        if matches!(err, EngineError::Aborted) && core.should_disconnect() {
            info!("connect cancelled");
            core.set_state(SessionState::Idle);
            core.emit(SessionEvent::Disconnected);
        } else {
            error!(%err, "connect failed");
            core.record_error(&err);
            core.set_state(SessionState::Failed);
            core.emit(SessionEvent::ConnectionError);
        }
        return;
    }

    let mut runtime_error = None;
    loop {
        if core.should_disconnect() || engine.shall_disconnect() {
            break;
        }
        if let Err(err) = engine.wait_for_activity(ACTIVITY_WAIT) {
            runtime_error = Some(err);
            break;
        }
        if let Err(err) = engine.process_events() {
            runtime_error = Some(err);
            break;
        }
    }

    core.set_state(SessionState::Disconnecting);
    engine.disconnect();

    match runtime_error {
        Some(err) => {
            error!(%err, "session ended with an error");
            core.record_error(&err);
            core.set_state(SessionState::Failed);
            core.emit(SessionEvent::ConnectionError);
        }
        None => {
            info!("session ended");
            core.set_state(SessionState::Idle);
        }
    }
    core.emit(SessionEvent::Disconnected);
}
