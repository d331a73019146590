use anyhow::{Context, Result};
use clap::Parser;
use rdp_session::{ConnectionProfile, UntrustedCertPolicy};
use tracing::info;

mod app;

#[derive(Parser, Debug)]
#[command(name = "rrdpviewer")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address (host or host:port). When omitted, the connect
    /// dialog opens instead.
    #[arg(value_name = "SERVER")]
    server: Option<String>,

    /// Username for the remote session
    #[arg(short, long, default_value = "")]
    username: String,

    /// Logon domain
    #[arg(short, long, default_value = "")]
    domain: String,

    /// Verbose logging level (repeat for more verbosity: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Full screen mode
    #[arg(short, long)]
    fullscreen: bool,

    /// Initial desktop width
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial desktop height
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Keep the desktop size fixed instead of following the window
    #[arg(long)]
    no_dynamic_resolution: bool,

    /// Disable clipboard redirection
    #[arg(long)]
    no_clipboard: bool,

    /// Refuse servers whose certificate fails verification
    #[arg(long)]
    reject_untrusted_cert: bool,

    /// Trust any certificate without verification
    #[arg(long)]
    ignore_certificate: bool,
}

fn parse_server_address(server: &str) -> Result<(String, u16)> {
    if let Some((host, port)) = server.rsplit_once(':') {
        let port: u16 = port.parse().context("Invalid port number")?;
        Ok((host.to_string(), port))
    } else {
        Ok((server.to_string(), 3389))
    }
}

fn init_logging(level: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match level {
        0 => EnvFilter::new("info"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let mut profile = ConnectionProfile {
        username: args.username,
        domain: args.domain,
        desktop_width: args.width,
        desktop_height: args.height,
        fullscreen: args.fullscreen,
        dynamic_resolution: !args.no_dynamic_resolution,
        redirect_clipboard: !args.no_clipboard,
        ignore_certificate: args.ignore_certificate,
        cert_policy: if args.reject_untrusted_cert {
            UntrustedCertPolicy::Reject
        } else {
            UntrustedCertPolicy::AcceptTemporarily
        },
        ..ConnectionProfile::default()
    };

    let autoconnect = if let Some(server) = &args.server {
        let (host, port) = parse_server_address(server).context("Failed to parse server address")?;
        info!("Connecting to {}:{}", host, port);
        profile.hostname = host;
        profile.port = port;
        true
    } else {
        false
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([args.width as f32, args.height as f32])
            .with_title("Remote Desktop Viewer")
            .with_fullscreen(args.fullscreen),
        ..Default::default()
    };

    eframe::run_native(
        "Remote Desktop Viewer",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::RdpViewerApp::new(cc, profile, autoconnect)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_address() {
        assert_eq!(
            parse_server_address("ts.example").unwrap(),
            ("ts.example".to_string(), 3389)
        );
        assert_eq!(
            parse_server_address("ts.example:13389").unwrap(),
            ("ts.example".to_string(), 13389)
        );
        assert!(parse_server_address("ts.example:notaport").is_err());
    }
}
