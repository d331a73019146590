//! Virtual-channel contracts: names, message shapes, and the send capabilities
//! an engine hands to the session when a channel comes up.

pub mod cliprdr;
pub mod disp;

/// Static virtual channel carrying clipboard redirection.
pub const CLIPRDR_CHANNEL_NAME: &str = "cliprdr";
/// Dynamic virtual channel carrying display-control (resolution) requests.
pub const DISP_CHANNEL_NAME: &str = "Microsoft::Windows::RDS::DisplayControl";
/// Static virtual channel carrying audio output.
pub const RDPSND_CHANNEL_NAME: &str = "rdpsnd";
/// Static virtual channel carrying device (drive) redirection.
pub const RDPDR_CHANNEL_NAME: &str = "rdpdr";
