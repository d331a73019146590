//! Clipboard channel coordination.
//!
//! Protocol choreography, driven entirely from the worker thread:
//! monitor-ready triggers the capability announcement and an initial format
//! list; a server format list is scanned for a text format, acknowledged,
//! and followed by a data request; a server data request is answered from
//! the local text slot, or explicitly failed so the peer is never left
//! waiting.

use crate::channels::ChannelHandler;
use parking_lot::Mutex;
use rdp_engine::channels::cliprdr::{
    ClipboardCapabilities, ClipboardFormat, ClipboardGeneralFlags, ClipboardServerMessage,
    CliprdrSender, FormatDataRequest, FormatDataResponse, FormatList, FormatListResponse,
    CB_CAPS_VERSION_2, CF_TEXT, CF_UNICODETEXT,
};
use rdp_engine::channels::CLIPRDR_CHANNEL_NAME;
use rdp_engine::EngineResult;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Default)]
struct ClipboardInner {
    sender: Option<Arc<dyn CliprdrSender>>,
    /// Set once the server signalled monitor-ready.
    ready: bool,
    /// Text most recently placed on the local clipboard.
    local_text: Option<String>,
    /// Text received from the server, latched until the UI takes it.
    remote_text: Option<String>,
    /// Format id of the data request we are waiting on, if any.
    pending_request: Option<u32>,
}

/// Session-side clipboard state machine.
#[derive(Default)]
pub struct ClipboardHandler {
    inner: Mutex<ClipboardInner>,
}

impl ClipboardHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel came up; store the send capability.
    pub fn attach(&self, sender: Arc<dyn CliprdrSender>) {
        let mut inner = self.inner.lock();
        inner.sender = Some(sender);
        inner.ready = false;
        inner.pending_request = None;
    }

    /// Channel went down; later sends become no-ops. Latched text belongs
    /// to the session that just ended, so it is dropped too.
    pub fn detach(&self) {
        let mut inner = self.inner.lock();
        inner.sender = None;
        inner.ready = false;
        inner.pending_request = None;
        inner.local_text = None;
        inner.remote_text = None;
    }

    /// Update the local text slot and, once the channel is ready, announce
    /// the text formats to the server.
    pub fn set_local_text(&self, text: String) -> EngineResult<()> {
        let mut inner = self.inner.lock();
        inner.local_text = Some(text);
        if !inner.ready {
            return Ok(());
        }
        let Some(sender) = inner.sender.clone() else {
            return Ok(());
        };
        drop(inner);
        sender.send_format_list(&text_format_list())
    }

    /// Take the latched server clipboard text, if any arrived since the
    /// last call.
    pub fn take_remote_text(&self) -> Option<String> {
        self.inner.lock().remote_text.take()
    }

    /// Dispatch one server-to-client message.
    pub fn handle_message(&self, message: ClipboardServerMessage) -> EngineResult<()> {
        match message {
            ClipboardServerMessage::MonitorReady => self.on_monitor_ready(),
            ClipboardServerMessage::Capabilities(caps) => {
                debug!(version = caps.version, "server clipboard capabilities");
                Ok(())
            }
            ClipboardServerMessage::FormatList(list) => self.on_format_list(&list),
            ClipboardServerMessage::FormatListResponse(response) => {
                if !response.ok {
                    warn!("server rejected our clipboard format list");
                }
                Ok(())
            }
            ClipboardServerMessage::FormatDataRequest(request) => self.on_data_request(request),
            ClipboardServerMessage::FormatDataResponse(response) => self.on_data_response(response),
        }
    }

    fn on_monitor_ready(&self) -> EngineResult<()> {
        let sender = {
            let mut inner = self.inner.lock();
            inner.ready = true;
            inner.sender.clone()
        };
        let Some(sender) = sender else {
            return Ok(());
        };
        sender.send_capabilities(&ClipboardCapabilities {
            version: CB_CAPS_VERSION_2,
            flags: ClipboardGeneralFlags::USE_LONG_FORMAT_NAMES,
        })?;
        // Announce whatever is on the local clipboard right away; an empty
        // list tells the server we currently offer nothing.
        let list = if self.inner.lock().local_text.is_some() {
            text_format_list()
        } else {
            FormatList::default()
        };
        sender.send_format_list(&list)
    }

    /// Server announced its clipboard contents. Acknowledge, then request
    /// the best text format if one is offered.
    fn on_format_list(&self, list: &FormatList) -> EngineResult<()> {
        let sender = self.inner.lock().sender.clone();
        let Some(sender) = sender else {
            return Ok(());
        };
        sender.send_format_list_response(FormatListResponse { ok: true })?;

        let chosen = preferred_text_format(list);
        let Some(format_id) = chosen else {
            trace!("server format list offers no text format");
            return Ok(());
        };
        self.inner.lock().pending_request = Some(format_id);
        sender.send_format_data_request(FormatDataRequest { format_id })
    }

    /// Server wants our clipboard data. Requests are always answered; a
    /// request we cannot satisfy gets an explicit failure response.
    fn on_data_request(&self, request: FormatDataRequest) -> EngineResult<()> {
        let (sender, local_text) = {
            let inner = self.inner.lock();
            (inner.sender.clone(), inner.local_text.clone())
        };
        let Some(sender) = sender else {
            return Ok(());
        };
        // An empty staged payload is as unsatisfiable as no payload at all.
        let response = match (request.format_id, local_text) {
            (CF_UNICODETEXT, Some(text)) if !text.is_empty() => FormatDataResponse {
                ok: true,
                data: encode_utf16le(&text),
            },
            (CF_TEXT, Some(text)) if !text.is_empty() => FormatDataResponse {
                ok: true,
                data: encode_latin1(&text),
            },
            _ => {
                warn!(format_id = request.format_id, "unsatisfiable clipboard data request");
                FormatDataResponse::fail()
            }
        };
        sender.send_format_data_response(&response)
    }

    fn on_data_response(&self, response: FormatDataResponse) -> EngineResult<()> {
        let Some(format_id) = self.inner.lock().pending_request.take() else {
            trace!("unsolicited clipboard data response, dropping");
            return Ok(());
        };
        if !response.ok {
            debug!("server failed our clipboard data request");
            return Ok(());
        }
        let text = match format_id {
            CF_UNICODETEXT => decode_utf16le(&response.data),
            CF_TEXT => decode_latin1(&response.data),
            _ => None,
        };
        if let Some(text) = text {
            self.inner.lock().remote_text = Some(text);
        }
        Ok(())
    }
}

impl ChannelHandler for ClipboardHandler {
    fn name(&self) -> &'static str {
        CLIPRDR_CHANNEL_NAME
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().sender.is_some()
    }
}

fn text_format_list() -> FormatList {
    FormatList {
        formats: vec![
            ClipboardFormat::new(CF_UNICODETEXT),
            ClipboardFormat::new(CF_TEXT),
        ],
    }
}

/// Unicode text is preferred over ANSI text when the server offers both.
fn preferred_text_format(list: &FormatList) -> Option<u32> {
    if list.formats.iter().any(|f| f.id == CF_UNICODETEXT) {
        Some(CF_UNICODETEXT)
    } else if list.formats.iter().any(|f| f.id == CF_TEXT) {
        Some(CF_TEXT)
    } else {
        None
    }
}

/// UTF-16LE with a terminating NUL, as the wire format requires.
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

/// Decode UTF-16LE up to the first NUL. Unpaired surrogates are dropped
/// rather than replaced; an empty or odd-length payload yields nothing.
pub fn decode_utf16le(data: &[u8]) -> Option<String> {
    if data.is_empty() || data.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .take_while(|&u| u != 0)
        .collect();
    let text: String = char::decode_utf16(units.into_iter())
        .filter_map(Result::ok)
        .collect();
    Some(text)
}

fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
        .chain(std::iter::once(0))
        .collect()
}

fn decode_latin1(data: &[u8]) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    Some(
        data.iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect(),
    )
}
