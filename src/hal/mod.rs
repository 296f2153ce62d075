//! Hardware seam
//!
//! The decode and render pipeline and the TV output hardware live
//! behind this narrow command interface. [`FakeVideoCore`] stands in
//! for the firmware when developing off-target.

pub mod fake;

pub use fake::FakeVideoCore;

use std::path::Path;

use thiserror::Error;

use crate::modes::{ModeDescriptor, ModeGroup, OutputStatus};
use crate::session::SessionConfig;
use crate::types::DisplayTarget;

/// Faults reported by the pipeline or output hardware
#[derive(Debug, Error)]
pub enum HardwareError {
    /// The video subsystem could not be reached
    #[error("video subsystem unreachable: {0}")]
    Unreachable(String),

    /// A command was accepted but failed on the hardware side
    #[error("hardware command failed: {0}")]
    CommandFailed(String),

    /// Pipeline construction or teardown failed
    #[error("pipeline {stage} failed: {detail}")]
    Pipeline {
        /// Stage that failed (reader, decoder, renderer, teardown)
        stage: &'static str,
        /// Hardware-reported detail
        detail: String,
    },
}

/// Ticket for one acquired decode and render pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineHandle(pub(crate) u64);

/// Result of scanning one mode group
///
/// The firmware reports the preferred mode pair as scan out-values, so
/// every scan carries both the table and the preferred pair.
#[derive(Debug, Clone)]
pub struct ModeScan {
    /// Supported modes in the hardware's preference order
    pub modes: Vec<ModeDescriptor>,
    /// Group of the hardware-preferred mode
    pub preferred_group: ModeGroup,
    /// Code of the hardware-preferred mode
    pub preferred_code: u16,
}

/// Narrow command interface to the display hardware
///
/// Implementations are shared between sessions and services. Command
/// serialization is the host's responsibility, not the implementor's.
pub trait DisplayHardware: Send + Sync {
    /// List the supported modes for `group`
    fn scan_modes(&self, group: ModeGroup) -> Result<ModeScan, HardwareError>;

    /// Snapshot the active output state
    fn display_state(&self) -> Result<OutputStatus, HardwareError>;

    /// Switch the output to an explicit mode; settles asynchronously
    fn set_mode_explicit(&self, group: ModeGroup, code: u16) -> Result<(), HardwareError>;

    /// Switch the output back to its preferred mode; settles asynchronously
    fn set_mode_preferred(&self) -> Result<(), HardwareError>;

    /// Disable the output's power and signal; a no-op when already off
    fn power_off(&self) -> Result<(), HardwareError>;

    /// Build and start a reader, decoder and renderer chain presenting
    /// `path` on `target`
    fn acquire_pipeline(
        &self,
        target: DisplayTarget,
        path: &Path,
        config: &SessionConfig,
    ) -> Result<PipelineHandle, HardwareError>;

    /// Stop and release a previously acquired pipeline
    fn release_pipeline(&self, handle: PipelineHandle) -> Result<(), HardwareError>;
}
