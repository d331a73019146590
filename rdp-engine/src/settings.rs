//! Engine settings object, applied once per connection attempt.

/// Performance-related feature toggles forwarded to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceFlags {
    pub wallpaper: bool,
    pub font_smoothing: bool,
    pub desktop_composition: bool,
    pub themes: bool,
}

impl Default for PerformanceFlags {
    fn default() -> Self {
        Self {
            wallpaper: false,
            font_smoothing: true,
            desktop_composition: false,
            themes: true,
        }
    }
}

/// Which virtual channels the engine should bring up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSettings {
    pub clipboard: bool,
    pub audio: bool,
    pub drive_redirect: bool,
    /// Local directory exposed when drive redirection is enabled.
    pub drive_redirect_path: Option<String>,
}

/// Immutable snapshot of everything the engine needs to establish a session.
///
/// Applied before `connect`; the engine may update `desktop_width`/`height`
/// during resolution negotiation, which is why [`crate::Engine::settings`]
/// returns a snapshot rather than a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub domain: String,
    pub password: String,

    pub desktop_width: u32,
    pub desktop_height: u32,
    pub color_depth: u32,
    pub fullscreen: bool,

    /// Advertise the display-control channel capability.
    pub support_display_control: bool,
    /// Request server-side dynamic resolution updates.
    pub dynamic_resolution: bool,

    pub auto_logon: bool,
    pub ignore_certificate: bool,

    pub performance: PerformanceFlags,
    pub channels: ChannelSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            port: 3389,
            username: String::new(),
            domain: String::new(),
            password: String::new(),
            desktop_width: 1920,
            desktop_height: 1080,
            color_depth: 32,
            fullscreen: false,
            support_display_control: true,
            dynamic_resolution: true,
            auto_logon: false,
            ignore_certificate: false,
            performance: PerformanceFlags::default(),
            channels: ChannelSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Currently negotiated desktop geometry.
    pub fn desktop_size(&self) -> (u32, u32) {
        (self.desktop_width, self.desktop_height)
    }
}
