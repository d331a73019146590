//! Connection profiles: the user-facing connection description, serialized
//! to JSON, and its mapping onto engine settings.

use rdp_engine::{ChannelSettings, EngineSettings, PerformanceFlags};
use serde::{Deserialize, Serialize};

/// Policy for certificates that fail chain or hostname verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UntrustedCertPolicy {
    /// Accept for this session only; nothing is persisted.
    #[default]
    AcceptTemporarily,
    /// Refuse the connection.
    Reject,
}

fn default_port() -> u16 {
    3389
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_color_depth() -> u32 {
    32
}

fn default_true() -> bool {
    true
}

/// A saved connection description.
///
/// The password is intentionally not serialized; it is collected at connect
/// time and only lives in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionProfile {
    pub name: String,
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub domain: String,
    #[serde(skip)]
    pub password: String,

    #[serde(default = "default_width")]
    pub desktop_width: u32,
    #[serde(default = "default_height")]
    pub desktop_height: u32,
    #[serde(default = "default_color_depth")]
    pub color_depth: u32,
    pub fullscreen: bool,

    /// Negotiate the display-control channel and follow window resizes.
    #[serde(default = "default_true")]
    pub dynamic_resolution: bool,

    #[serde(default = "default_true")]
    pub redirect_clipboard: bool,
    pub redirect_audio: bool,
    pub redirect_drive: Option<String>,

    pub cert_policy: UntrustedCertPolicy,
    /// Skip verification entirely and trust any certificate.
    pub ignore_certificate: bool,

    pub show_wallpaper: bool,
    #[serde(default = "default_true")]
    pub font_smoothing: bool,
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            hostname: String::new(),
            port: default_port(),
            username: String::new(),
            domain: String::new(),
            password: String::new(),
            desktop_width: default_width(),
            desktop_height: default_height(),
            color_depth: default_color_depth(),
            fullscreen: false,
            dynamic_resolution: true,
            redirect_clipboard: true,
            redirect_audio: false,
            redirect_drive: None,
            cert_policy: UntrustedCertPolicy::default(),
            ignore_certificate: false,
            show_wallpaper: false,
            font_smoothing: true,
        }
    }
}

impl ConnectionProfile {
    /// Translate the profile into the settings snapshot the engine consumes.
    pub fn to_settings(&self) -> EngineSettings {
        EngineSettings {
            hostname: self.hostname.clone(),
            port: self.port,
            username: self.username.clone(),
            domain: self.domain.clone(),
            password: self.password.clone(),
            desktop_width: self.desktop_width,
            desktop_height: self.desktop_height,
            color_depth: self.color_depth,
            fullscreen: self.fullscreen,
            support_display_control: self.dynamic_resolution,
            dynamic_resolution: self.dynamic_resolution,
            // Skip the interactive logon screen when credentials are complete.
            auto_logon: !self.username.is_empty() && !self.password.is_empty(),
            ignore_certificate: self.ignore_certificate,
            performance: PerformanceFlags {
                wallpaper: self.show_wallpaper,
                font_smoothing: self.font_smoothing,
                ..PerformanceFlags::default()
            },
            channels: ChannelSettings {
                clipboard: self.redirect_clipboard,
                audio: self.redirect_audio,
                drive_redirect: self.redirect_drive.is_some(),
                drive_redirect_path: self.redirect_drive.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn settings_mapping_enables_auto_logon_with_full_credentials() {
        let mut profile = ConnectionProfile {
            hostname: "host.example".into(),
            username: "alice".into(),
            password: "secret".into(),
            ..ConnectionProfile::default()
        };
        let settings = profile.to_settings();
        assert!(settings.auto_logon);
        assert_eq!(settings.port, 3389);
        assert!(settings.channels.clipboard);

        profile.password.clear();
        assert!(!profile.to_settings().auto_logon);
    }

    #[test]
    fn drive_redirection_follows_the_configured_path() {
        let profile = ConnectionProfile {
            redirect_drive: Some("/home/alice/share".into()),
            ..ConnectionProfile::default()
        };
        let settings = profile.to_settings();
        assert!(settings.channels.drive_redirect);
        assert_eq!(
            settings.channels.drive_redirect_path.as_deref(),
            Some("/home/alice/share")
        );
    }

    #[test]
    fn json_round_trip_drops_the_password() {
        let profile = ConnectionProfile {
            name: "work".into(),
            hostname: "ts.example".into(),
            username: "alice".into(),
            password: "secret".into(),
            cert_policy: UntrustedCertPolicy::Reject,
            ..ConnectionProfile::default()
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("secret"));

        let restored: ConnectionProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.password, "");
        assert_eq!(restored.hostname, "ts.example");
        assert_eq!(restored.cert_policy, UntrustedCertPolicy::Reject);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let restored: ConnectionProfile =
            serde_json::from_str(r#"{"name":"min","hostname":"h"}"#).unwrap();
        assert_eq!(restored.port, 3389);
        assert_eq!(restored.desktop_width, 1920);
        assert!(restored.dynamic_resolution);
        assert!(restored.redirect_clipboard);
    }
}
