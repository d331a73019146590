//! Protocol-engine boundary for the remote desktop viewer.
//!
//! This crate defines the seam between the session controller and a protocol
//! engine: the [`Engine`] trait a backend implements, the
//! [`EngineEventHandler`] callback table the session registers, the settings
//! and error types crossing that seam, and the virtual-channel contracts
//! (`channels`). [`loopback`] provides an in-process engine used by the
//! viewer and by session integration tests.

pub mod cert;
pub mod channels;
mod engine;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod loopback;
pub mod settings;

pub use cert::{CertificateInfo, CertificateVerdict};
pub use engine::{ChannelEndpoint, Engine, EngineEventHandler};
pub use error::{EngineError, EngineResult};
pub use framebuffer::{FramebufferHandle, GdiBuffer, PixelFormat, MAX_FRAMEBUFFER_DIM};
pub use input::{KeyboardFlags, PointerFlags, WHEEL_ROTATION_MASK};
pub use settings::{ChannelSettings, EngineSettings, PerformanceFlags};
