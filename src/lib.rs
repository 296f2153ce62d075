//! Display pipeline and TV output control for VideoCore single-board
//! computers.
//!
//! Two entry points share one hardware context:
//!
//! - [`DisplaySession`] decodes a still image through the hardware
//!   reader, decoder and renderer chain and presents it on the
//!   integrated LCD panel or an HDMI monitor, with an exclusive
//!   open/close lifecycle and idempotent teardown.
//! - [`OutputService`] enumerates CEA and DMT timing modes, validates
//!   and issues mode switches, restores the hardware-preferred mode and
//!   powers the output down. Switches settle asynchronously; poll
//!   [`OutputService::status`] or use [`OutputService::wait_for_mode`]
//!   to observe completion.
//!
//! The hardware itself sits behind [`hal::DisplayHardware`];
//! [`hal::FakeVideoCore`] stands in for it off-target.

pub mod error;
pub mod hal;
pub mod host;
pub mod modes;
pub mod service;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use error::{DisplayError, Result};
pub use host::DisplayHost;
pub use modes::{AspectRatio, ModeCatalog, ModeDescriptor, ModeGroup, OutputStatus, ScanMode};
pub use service::OutputService;
pub use session::{DisplaySession, SessionConfig};
pub use types::{DisplayTarget, PowerState};
