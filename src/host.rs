//! Shared hardware context
//!
//! Sessions and output services are handed out by a [`DisplayHost`],
//! which owns the hardware handle and arbitrates the physical outputs:
//! one mutating command at a time per output, one open session per
//! output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{DisplayError, Result};
use crate::hal::DisplayHardware;
use crate::service::OutputService;
use crate::session::{DisplaySession, SessionConfig};
use crate::types::DisplayTarget;

/// Handle to the board's display hardware
///
/// Cloning clones the handle; all clones share the same hardware and
/// the same per-output arbitration.
#[derive(Clone)]
pub struct DisplayHost {
    shared: Arc<HostShared>,
}

impl DisplayHost {
    /// Bind a host to a hardware implementation
    pub fn new(hw: impl DisplayHardware + 'static) -> Self {
        DisplayHost {
            shared: Arc::new(HostShared {
                hw: Box::new(hw),
                gates: [OutputGate::new(), OutputGate::new()],
            }),
        }
    }

    /// Session on the default output (HDMI)
    pub fn session(&self) -> DisplaySession {
        self.session_with(SessionConfig::default())
    }

    /// Session on an explicit output
    pub fn session_on(&self, target: DisplayTarget) -> DisplaySession {
        self.session_with(SessionConfig { target, ..SessionConfig::default() })
    }

    /// Session with full display-region configuration
    pub fn session_with(&self, config: SessionConfig) -> DisplaySession {
        DisplaySession::new(self.shared.clone(), config)
    }

    /// Service handle for TV output queries and commands
    pub fn output_service(&self) -> OutputService {
        OutputService::new(self.shared.clone())
    }
}

pub(crate) struct HostShared {
    hw: Box<dyn DisplayHardware>,
    gates: [OutputGate; DisplayTarget::ALL.len()],
}

/// Per-output arbitration: command serialization plus session ownership
struct OutputGate {
    commands: Mutex<()>,
    claimed: AtomicBool,
}

impl OutputGate {
    fn new() -> Self {
        OutputGate { commands: Mutex::new(()), claimed: AtomicBool::new(false) }
    }
}

impl HostShared {
    pub(crate) fn hw(&self) -> &dyn DisplayHardware {
        self.hw.as_ref()
    }

    fn gate(&self, target: DisplayTarget) -> &OutputGate {
        match target {
            DisplayTarget::Lcd => &self.gates[0],
            DisplayTarget::Hdmi => &self.gates[1],
        }
    }

    /// Serialize a mutating hardware command against `target`
    pub(crate) fn command_lock(&self, target: DisplayTarget) -> MutexGuard<'_, ()> {
        self.gate(target)
            .commands
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim exclusive session ownership of `target`
    pub(crate) fn claim_output(&self, target: DisplayTarget) -> Result<()> {
        let gate = self.gate(target);
        if gate
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DisplayError::OutputBusy(target));
        }
        Ok(())
    }

    /// Release a previously claimed output
    pub(crate) fn release_output(&self, target: DisplayTarget) {
        self.gate(target).claimed.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::FakeVideoCore;

    #[test]
    fn test_claim_is_exclusive_per_output() {
        let host = DisplayHost::new(FakeVideoCore::new());
        host.shared.claim_output(DisplayTarget::Hdmi).unwrap();
        assert!(matches!(
            host.shared.claim_output(DisplayTarget::Hdmi),
            Err(DisplayError::OutputBusy(DisplayTarget::Hdmi))
        ));
        host.shared.claim_output(DisplayTarget::Lcd).unwrap();

        host.shared.release_output(DisplayTarget::Hdmi);
        host.shared.claim_output(DisplayTarget::Hdmi).unwrap();
    }

    #[test]
    fn test_cloned_hosts_share_arbitration() {
        let host = DisplayHost::new(FakeVideoCore::new());
        let other = host.clone();
        host.shared.claim_output(DisplayTarget::Hdmi).unwrap();
        assert!(other.shared.claim_output(DisplayTarget::Hdmi).is_err());
    }
}
