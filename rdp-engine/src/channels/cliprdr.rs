//! Clipboard channel message contracts.

use crate::error::EngineResult;
use bitflags::bitflags;

/// ANSI text clipboard format id.
pub const CF_TEXT: u32 = 1;
/// UTF-16LE text clipboard format id.
pub const CF_UNICODETEXT: u32 = 13;

/// Clipboard capability protocol version 2.
pub const CB_CAPS_VERSION_2: u32 = 2;

bitflags! {
    /// General clipboard capability flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClipboardGeneralFlags: u32 {
        const USE_LONG_FORMAT_NAMES = 0x0000_0002;
    }
}

/// One entry of a clipboard format list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardFormat {
    pub id: u32,
    pub name: Option<String>,
}

impl ClipboardFormat {
    pub fn new(id: u32) -> Self {
        Self { id, name: None }
    }
}

/// Capability announcement, sent by either side once the monitor is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardCapabilities {
    pub version: u32,
    pub flags: ClipboardGeneralFlags,
}

/// Formats currently available on the announcing side's clipboard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormatList {
    pub formats: Vec<ClipboardFormat>,
}

/// Acknowledgement of a received format list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatListResponse {
    pub ok: bool,
}

/// Request for the data behind one announced format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDataRequest {
    pub format_id: u32,
}

/// Reply to a data request; `ok == false` carries no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDataResponse {
    pub ok: bool,
    pub data: Vec<u8>,
}

impl FormatDataResponse {
    /// Explicit failure reply; requests are never left unanswered.
    pub fn fail() -> Self {
        Self {
            ok: false,
            data: Vec::new(),
        }
    }
}

/// Server-to-client clipboard traffic, delivered on the worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardServerMessage {
    /// The channel is live; the client should announce its capabilities.
    MonitorReady,
    Capabilities(ClipboardCapabilities),
    FormatList(FormatList),
    FormatListResponse(FormatListResponse),
    FormatDataRequest(FormatDataRequest),
    FormatDataResponse(FormatDataResponse),
}

/// Client-to-server send capability for the clipboard channel, handed to the
/// session on channel-connected.
pub trait CliprdrSender: Send + Sync {
    fn send_capabilities(&self, caps: &ClipboardCapabilities) -> EngineResult<()>;
    fn send_format_list(&self, list: &FormatList) -> EngineResult<()>;
    fn send_format_list_response(&self, response: FormatListResponse) -> EngineResult<()>;
    fn send_format_data_request(&self, request: FormatDataRequest) -> EngineResult<()>;
    fn send_format_data_response(&self, response: &FormatDataResponse) -> EngineResult<()>;
}
