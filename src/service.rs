//! TV output service
//!
//! Stateless command facade over the output hardware: status queries,
//! mode catalogs, validated mode switching and power control. Mode and
//! power commands act on the TV output path and are serialized by the
//! host; switches settle asynchronously and `wait_for_mode` is the
//! advisory poll helper for callers that need confirmation.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{DisplayError, Result};
use crate::hal::HardwareError;
use crate::host::HostShared;
use crate::modes::{ModeCatalog, ModeDescriptor, ModeGroup, OutputStatus};
use crate::types::DisplayTarget;

/// Poll interval used by `wait_for_mode`
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Command facade for the TV output path
///
/// Holds no state of its own; every call queries or commands the live
/// hardware.
pub struct OutputService {
    shared: Arc<HostShared>,
}

impl OutputService {
    pub(crate) fn new(shared: Arc<HostShared>) -> Self {
        OutputService { shared }
    }

    /// Snapshot of the active output mode and power state
    pub fn status(&self) -> Result<OutputStatus> {
        Ok(self.shared.hw().display_state()?)
    }

    /// Supported modes for `group`, in the hardware's preference order
    pub fn modes(&self, group: ModeGroup) -> Result<ModeCatalog> {
        let scan = self.shared.hw().scan_modes(group)?;
        Ok(ModeCatalog::new(
            group,
            scan.modes,
            (scan.preferred_group, scan.preferred_code),
        ))
    }

    /// The mode the hardware reports as its default for the connected
    /// display
    pub fn preferred_mode(&self) -> Result<ModeDescriptor> {
        // Scanning reports the preferred pair; the pair's own group
        // scan carries the full descriptor.
        let cea = self.modes(ModeGroup::Cea)?;
        let dmt = self.modes(ModeGroup::Dmt)?;
        let (group, code) = dmt.preferred();
        let catalog = match group {
            ModeGroup::Cea => &cea,
            ModeGroup::Dmt => &dmt,
        };
        catalog.get(code).cloned().ok_or_else(|| {
            DisplayError::Hardware(HardwareError::CommandFailed(format!(
                "preferred mode {} {} missing from its catalog",
                group, code
            )))
        })
    }

    /// Switch to an explicit mode.
    ///
    /// The code is validated against the group's catalog before any
    /// hardware command is issued. Returns as soon as the switch is
    /// commanded; the new mode appears in `status()` once the hardware
    /// settle interval has elapsed.
    pub fn set_explicit(&self, group: ModeGroup, code: u16) -> Result<()> {
        let catalog = self.modes(group)?;
        if !catalog.contains(code) {
            return Err(DisplayError::invalid_value(
                "mode code",
                format!("{} {}", group, code),
            ));
        }
        let _serial = self.shared.command_lock(DisplayTarget::Hdmi);
        self.shared.hw().set_mode_explicit(group, code)?;
        log::info!("output switch commanded: {} mode {}", group, code);
        Ok(())
    }

    /// Switch back to the hardware-preferred mode; settles like
    /// `set_explicit`
    pub fn set_preferred(&self) -> Result<()> {
        let _serial = self.shared.command_lock(DisplayTarget::Hdmi);
        self.shared.hw().set_mode_preferred()?;
        log::info!("output switch to preferred mode commanded");
        Ok(())
    }

    /// Disable output power and signal; a no-op when already off
    pub fn power_off(&self) -> Result<()> {
        let _serial = self.shared.command_lock(DisplayTarget::Hdmi);
        self.shared.hw().power_off()?;
        log::info!("output powered off");
        Ok(())
    }

    /// Poll until `status()` reports the given mode as active.
    ///
    /// Advisory only: settling is hardware defined, and `true` means
    /// the mode was observed, not that the panel finished re-syncing.
    /// Returns `false` when `timeout` elapses first.
    pub fn wait_for_mode(&self, group: ModeGroup, code: u16, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.status()?.is_mode(group, code) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(POLL_INTERVAL.min(timeout));
        }
    }
}
