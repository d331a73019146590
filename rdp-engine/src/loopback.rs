//! In-process engine simulating a cooperative server.
//!
//! Used by the viewer as a stand-in backend and by session integration tests
//! to drive every callback path without a network: it paints a moving test
//! pattern, brings up the configured channels, echoes clipboard traffic, and
//! honors monitor-layout requests with a desktop resize on the next tick.

use crate::cert::{CertificateInfo, CertificateVerdict};
use crate::channels::cliprdr::{
    ClipboardCapabilities, ClipboardFormat, ClipboardServerMessage, CliprdrSender,
    FormatDataRequest, FormatDataResponse, FormatList, FormatListResponse, CF_UNICODETEXT,
};
use crate::channels::disp::{DispSender, MonitorLayout};
use crate::channels::{
    CLIPRDR_CHANNEL_NAME, DISP_CHANNEL_NAME, RDPDR_CHANNEL_NAME, RDPSND_CHANNEL_NAME,
};
use crate::engine::{ChannelEndpoint, Engine, EngineEventHandler};
use crate::error::{EngineError, EngineResult};
use crate::framebuffer::{FramebufferHandle, GdiBuffer, PixelFormat};
use crate::input::{KeyboardFlags, PointerFlags};
use crate::settings::EngineSettings;
use parking_lot::{Mutex, RwLock};
use rdp_common::Rect;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::debug;

/// Knobs controlling the simulated server.
#[derive(Debug, Clone)]
pub struct LoopbackBehavior {
    /// Fail the blocking connect with this error instead of succeeding.
    pub fail_connect: Option<EngineError>,
    /// Fail the add-in load step (aborts connect from the pre-connect path).
    pub fail_addins: bool,
    /// Simulated handshake duration; `abort_connect` interrupts it.
    pub connect_delay: Duration,
    /// Certificate presented to the verification callback.
    pub certificate: CertificateInfo,
    /// Text the simulated server serves for clipboard data requests.
    pub server_clipboard_text: String,
}

impl Default for LoopbackBehavior {
    fn default() -> Self {
        Self {
            fail_connect: None,
            fail_addins: false,
            connect_delay: Duration::ZERO,
            certificate: CertificateInfo {
                host: "loopback".into(),
                port: 3389,
                common_name: "loopback".into(),
                subject: "CN=loopback".into(),
                issuer: "CN=loopback-ca".into(),
                fingerprint: "00:11:22:33:44:55".into(),
            },
            server_clipboard_text: "loopback clipboard".into(),
        }
    }
}

/// Client-to-server clipboard sends recorded for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientClipboardMessage {
    Capabilities(ClipboardCapabilities),
    FormatList(FormatList),
    FormatListResponse(FormatListResponse),
    FormatDataRequest(FormatDataRequest),
    FormatDataResponse(FormatDataResponse),
}

/// Simulated protocol engine.
pub struct LoopbackEngine {
    weak: Weak<LoopbackEngine>,
    behavior: LoopbackBehavior,

    settings: Mutex<EngineSettings>,
    handler: RwLock<Option<Arc<dyn EngineEventHandler>>>,
    framebuffer: Mutex<Option<FramebufferHandle>>,

    connected: AtomicBool,
    announced: AtomicBool,
    abort: AtomicBool,
    shall_disconnect: AtomicBool,
    tick: AtomicU64,

    pending_resize: Mutex<Option<(u32, u32)>>,
    queued: Mutex<VecDeque<ClipboardServerMessage>>,

    sent_clipboard: Mutex<Vec<ClientClipboardMessage>>,
    sent_layouts: Mutex<Vec<MonitorLayout>>,
    sent_keys: Mutex<Vec<(KeyboardFlags, u8)>>,
    sent_pointer: Mutex<Vec<(PointerFlags, u16, u16)>>,
    verdict: Mutex<Option<CertificateVerdict>>,
}

impl LoopbackEngine {
    pub fn new(behavior: LoopbackBehavior) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            weak: weak.clone(),
            behavior,
            settings: Mutex::new(EngineSettings::default()),
            handler: RwLock::new(None),
            framebuffer: Mutex::new(None),
            connected: AtomicBool::new(false),
            announced: AtomicBool::new(false),
            abort: AtomicBool::new(false),
            shall_disconnect: AtomicBool::new(false),
            tick: AtomicU64::new(0),
            pending_resize: Mutex::new(None),
            queued: Mutex::new(VecDeque::new()),
            sent_clipboard: Mutex::new(Vec::new()),
            sent_layouts: Mutex::new(Vec::new()),
            sent_keys: Mutex::new(Vec::new()),
            sent_pointer: Mutex::new(Vec::new()),
            verdict: Mutex::new(None),
        })
    }

    /// Queue a server-to-client clipboard message for the next process tick.
    pub fn push_server_message(&self, message: ClipboardServerMessage) {
        self.queued.lock().push_back(message);
    }

    /// Simulate the server ending the session.
    pub fn request_disconnect(&self) {
        self.shall_disconnect.store(true, Ordering::SeqCst);
    }

    /// Clipboard messages the client has sent so far.
    pub fn sent_clipboard(&self) -> Vec<ClientClipboardMessage> {
        self.sent_clipboard.lock().clone()
    }

    /// Monitor layouts the client has sent so far.
    pub fn sent_layouts(&self) -> Vec<MonitorLayout> {
        self.sent_layouts.lock().clone()
    }

    /// Keyboard events the client has sent so far.
    pub fn sent_keys(&self) -> Vec<(KeyboardFlags, u8)> {
        self.sent_keys.lock().clone()
    }

    /// Pointer events the client has sent so far.
    pub fn sent_pointer(&self) -> Vec<(PointerFlags, u16, u16)> {
        self.sent_pointer.lock().clone()
    }

    /// Verdict the verification callback returned for the presented
    /// certificate, if the handshake got that far.
    pub fn certificate_verdict(&self) -> Option<CertificateVerdict> {
        *self.verdict.lock()
    }

    fn current_handler(&self) -> EngineResult<Arc<dyn EngineEventHandler>> {
        self.handler
            .read()
            .clone()
            .ok_or_else(|| EngineError::Internal("no event handler registered".into()))
    }

    fn record_clipboard(&self, message: ClientClipboardMessage) {
        self.sent_clipboard.lock().push(message);
    }

    /// First process tick after connect: bring up the configured channels
    /// and signal clipboard monitor-ready.
    fn announce_channels(&self, handler: &Arc<dyn EngineEventHandler>) {
        let settings = self.settings.lock().clone();
        if settings.channels.clipboard {
            let sender = Arc::new(LoopbackCliprdr {
                engine: self.weak.clone(),
            });
            handler.channel_connected(CLIPRDR_CHANNEL_NAME, ChannelEndpoint::Clipboard(sender));
            self.queued
                .lock()
                .push_back(ClipboardServerMessage::MonitorReady);
        }
        if settings.support_display_control {
            let sender = Arc::new(LoopbackDisp {
                engine: self.weak.clone(),
            });
            handler.channel_connected(DISP_CHANNEL_NAME, ChannelEndpoint::DisplayControl(sender));
        }
        if settings.channels.audio {
            handler.channel_connected(RDPSND_CHANNEL_NAME, ChannelEndpoint::Audio);
        }
        if settings.channels.drive_redirect {
            handler.channel_connected(RDPDR_CHANNEL_NAME, ChannelEndpoint::Drive);
        }
    }

    /// Paint a one-pixel-high moving band so every tick dirties the surface.
    fn paint_tick(&self, handler: &Arc<dyn EngineEventHandler>) -> EngineResult<()> {
        let Some(fb) = self.framebuffer.lock().clone() else {
            return Ok(());
        };
        if !handler.begin_paint(self) {
            return Err(EngineError::Protocol("begin-paint callback failed".into()));
        }
        let tick = self.tick.fetch_add(1, Ordering::Relaxed);
        {
            let mut fb = fb.write();
            let (width, height) = (fb.width(), fb.height());
            let stride = fb.stride() as usize;
            let row = (tick % height as u64) as usize;
            let shade = (tick % 255) as u8;
            let data = fb.data_mut();
            for px in data[row * stride..row * stride + stride].chunks_exact_mut(4) {
                px[0] = shade; // B
                px[1] = shade.wrapping_add(64); // G
                px[2] = shade.wrapping_add(128); // R
                px[3] = 0xFF;
            }
            fb.mark_dirty(Rect::new(0, row as i32, width, 1));
        }
        if !handler.end_paint(self) {
            return Err(EngineError::Protocol("end-paint callback failed".into()));
        }
        Ok(())
    }
}

impl Engine for LoopbackEngine {
    fn apply_settings(&self, settings: EngineSettings) -> EngineResult<()> {
        *self.settings.lock() = settings;
        Ok(())
    }

    fn settings(&self) -> EngineSettings {
        self.settings.lock().clone()
    }

    fn register_handler(&self, handler: Arc<dyn EngineEventHandler>) {
        *self.handler.write() = Some(handler);
    }

    fn load_addins(&self) -> EngineResult<()> {
        if self.behavior.fail_addins {
            return Err(EngineError::Internal("add-in load failed".into()));
        }
        Ok(())
    }

    fn connect(&self) -> EngineResult<()> {
        if let Some(err) = &self.behavior.fail_connect {
            return Err(err.clone());
        }
        let handler = self.current_handler()?;

        if !handler.pre_connect(self) {
            return Err(EngineError::ConnectionFailed(
                "pre-connect callback aborted the connection".into(),
            ));
        }

        // Simulated handshake; stays responsive to abort_connect.
        let deadline = Instant::now() + self.behavior.connect_delay;
        while Instant::now() < deadline {
            if self.abort.load(Ordering::SeqCst) {
                return Err(EngineError::Aborted);
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        if self.abort.load(Ordering::SeqCst) {
            return Err(EngineError::Aborted);
        }

        let verdict = handler.verify_certificate(&self.behavior.certificate);
        *self.verdict.lock() = Some(verdict);
        if verdict == CertificateVerdict::Reject {
            return Err(EngineError::CertificateRejected);
        }

        if !handler.post_connect(self) {
            return Err(EngineError::ConnectionFailed(
                "post-connect callback aborted the connection".into(),
            ));
        }
        self.connected.store(true, Ordering::SeqCst);
        debug!("loopback engine connected");
        Ok(())
    }

    fn abort_connect(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    fn wait_for_activity(&self, timeout: Duration) -> EngineResult<()> {
        // The simulation always has a frame to paint; sleep briefly so the
        // caller's cancellation flag stays responsive.
        std::thread::sleep(timeout.min(Duration::from_millis(5)));
        Ok(())
    }

    fn process_events(&self) -> EngineResult<()> {
        if !self.connected.load(Ordering::SeqCst) || self.shall_disconnect() {
            return Ok(());
        }
        let handler = self.current_handler()?;

        if !self.announced.swap(true, Ordering::SeqCst) {
            self.announce_channels(&handler);
        }

        if let Some((width, height)) = self.pending_resize.lock().take() {
            {
                let mut settings = self.settings.lock();
                settings.desktop_width = width;
                settings.desktop_height = height;
            }
            if !handler.desktop_resize(self) {
                return Err(EngineError::Internal(
                    "desktop-resize callback failed".into(),
                ));
            }
        }

        loop {
            let Some(message) = self.queued.lock().pop_front() else {
                break;
            };
            handler.clipboard_message(message);
        }

        self.paint_tick(&handler)
    }

    fn shall_disconnect(&self) -> bool {
        self.shall_disconnect.load(Ordering::SeqCst)
    }

    fn disconnect(&self) {
        let handler = self.handler.write().take();
        if let Some(handler) = handler {
            handler.post_disconnect(self);
        }
        self.connected.store(false, Ordering::SeqCst);
        *self.framebuffer.lock() = None;
        debug!("loopback engine disconnected");
    }

    fn init_framebuffer(&self, format: PixelFormat) -> EngineResult<FramebufferHandle> {
        let (width, height) = self.settings.lock().desktop_size();
        let handle = GdiBuffer::new(width, height, format)?.into_handle();
        *self.framebuffer.lock() = Some(handle.clone());
        Ok(handle)
    }

    fn send_keyboard_event(&self, flags: KeyboardFlags, code: u8) -> EngineResult<()> {
        self.sent_keys.lock().push((flags, code));
        Ok(())
    }

    fn send_mouse_event(&self, flags: PointerFlags, x: u16, y: u16) -> EngineResult<()> {
        self.sent_pointer.lock().push((flags, x, y));
        Ok(())
    }

    fn send_extended_mouse_event(&self, flags: PointerFlags, x: u16, y: u16) -> EngineResult<()> {
        self.sent_pointer.lock().push((flags, x, y));
        Ok(())
    }
}

/// Clipboard send capability backed by the simulated server: a client format
/// list is acknowledged and, when it offers Unicode text, answered with a
/// data request; a client data request is served the scripted server text.
struct LoopbackCliprdr {
    engine: Weak<LoopbackEngine>,
}

impl LoopbackCliprdr {
    fn engine(&self) -> EngineResult<Arc<LoopbackEngine>> {
        self.engine
            .upgrade()
            .ok_or_else(|| EngineError::Channel { code: 0x1 })
    }
}

impl CliprdrSender for LoopbackCliprdr {
    fn send_capabilities(&self, caps: &ClipboardCapabilities) -> EngineResult<()> {
        self.engine()?
            .record_clipboard(ClientClipboardMessage::Capabilities(caps.clone()));
        Ok(())
    }

    fn send_format_list(&self, list: &FormatList) -> EngineResult<()> {
        let engine = self.engine()?;
        engine.record_clipboard(ClientClipboardMessage::FormatList(list.clone()));
        engine.push_server_message(ClipboardServerMessage::FormatListResponse(
            FormatListResponse { ok: true },
        ));
        if list.formats.iter().any(|f| f.id == CF_UNICODETEXT) {
            engine.push_server_message(ClipboardServerMessage::FormatDataRequest(
                FormatDataRequest {
                    format_id: CF_UNICODETEXT,
                },
            ));
        }
        Ok(())
    }

    fn send_format_list_response(&self, response: FormatListResponse) -> EngineResult<()> {
        self.engine()?
            .record_clipboard(ClientClipboardMessage::FormatListResponse(response));
        Ok(())
    }

    fn send_format_data_request(&self, request: FormatDataRequest) -> EngineResult<()> {
        let engine = self.engine()?;
        engine.record_clipboard(ClientClipboardMessage::FormatDataRequest(request));
        let data = utf16le_with_terminator(&engine.behavior.server_clipboard_text);
        engine.push_server_message(ClipboardServerMessage::FormatDataResponse(
            FormatDataResponse { ok: true, data },
        ));
        Ok(())
    }

    fn send_format_data_response(&self, response: &FormatDataResponse) -> EngineResult<()> {
        self.engine()?
            .record_clipboard(ClientClipboardMessage::FormatDataResponse(response.clone()));
        Ok(())
    }
}

/// Display-control send capability: a layout request resizes the simulated
/// desktop on the next process tick.
struct LoopbackDisp {
    engine: Weak<LoopbackEngine>,
}

impl DispSender for LoopbackDisp {
    fn send_monitor_layout(&self, layouts: &[MonitorLayout]) -> EngineResult<()> {
        let engine = self
            .engine
            .upgrade()
            .ok_or(EngineError::Channel { code: 0x1 })?;
        engine.sent_layouts.lock().extend_from_slice(layouts);
        if let Some(primary) = layouts.first() {
            *engine.pending_resize.lock() = Some((primary.width, primary.height));
        }
        Ok(())
    }
}

fn utf16le_with_terminator(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

/// A convenience format list offering only Unicode text, as a server with
/// text on its clipboard would announce.
pub fn unicode_text_format_list() -> FormatList {
    FormatList {
        formats: vec![ClipboardFormat::new(CF_UNICODETEXT)],
    }
}
