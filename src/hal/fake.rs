//! Software stand-in for the VideoCore firmware
//!
//! Minimally reproduces the output state machine in a predictable and
//! configurable way: fixed mode tables, a settle interval before a
//! commanded switch becomes observable, and a ledger of live pipelines
//! so tests can assert nothing leaked.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use image::ImageReader;

use crate::modes::{AspectRatio, ModeDescriptor, ModeGroup, OutputStatus, ScanMode};
use crate::session::SessionConfig;
use crate::types::{DisplayTarget, PowerState};

use super::{DisplayHardware, HardwareError, ModeScan, PipelineHandle};

/// Default settle interval for simulated mode switches
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(120);

/// Hardware double backed by in-memory state
///
/// Clones share state, so a test can keep one handle for inspection
/// while the host owns another.
#[derive(Clone)]
pub struct FakeVideoCore {
    state: Arc<Mutex<CoreState>>,
}

struct CoreState {
    cea: Vec<ModeDescriptor>,
    dmt: Vec<ModeDescriptor>,
    preferred: (ModeGroup, u16),
    power: PowerState,
    active: (ModeGroup, u16),
    pending: Option<PendingSwitch>,
    settle: Duration,
    pipelines: HashMap<u64, LivePipeline>,
    next_handle: u64,
    commands_issued: u64,
}

struct PendingSwitch {
    group: ModeGroup,
    code: u16,
    ready_at: Instant,
}

struct LivePipeline {
    target: DisplayTarget,
    uri: String,
}

impl FakeVideoCore {
    /// Fresh double: default mode tables, preferred CEA 16 active,
    /// output powered on
    pub fn new() -> Self {
        let preferred = (ModeGroup::Cea, 16);
        FakeVideoCore {
            state: Arc::new(Mutex::new(CoreState {
                cea: cea_modes(),
                dmt: dmt_modes(),
                preferred,
                power: PowerState::On,
                active: preferred,
                pending: None,
                settle: DEFAULT_SETTLE,
                pipelines: HashMap::new(),
                next_handle: 1,
                commands_issued: 0,
            })),
        }
    }

    /// Replace the settle interval (tests use short values)
    pub fn with_settle(self, settle: Duration) -> Self {
        self.lock().settle = settle;
        self
    }

    /// Number of live pipelines
    pub fn live_pipelines(&self) -> usize {
        self.lock().pipelines.len()
    }

    /// Number of mutating output commands accepted so far
    pub fn commands_issued(&self) -> u64 {
        self.lock().commands_issued
    }

    fn lock(&self) -> MutexGuard<'_, CoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for FakeVideoCore {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreState {
    fn settle_pending(&mut self) {
        if let Some(pending) = &self.pending {
            if Instant::now() >= pending.ready_at {
                self.active = (pending.group, pending.code);
                self.power = PowerState::On;
                self.pending = None;
            }
        }
    }

    fn table(&self, group: ModeGroup) -> &[ModeDescriptor] {
        match group {
            ModeGroup::Cea => &self.cea,
            ModeGroup::Dmt => &self.dmt,
        }
    }

    fn descriptor(&self, group: ModeGroup, code: u16) -> Option<&ModeDescriptor> {
        self.table(group).iter().find(|mode| mode.code == code)
    }

    fn queue_switch(&mut self, group: ModeGroup, code: u16) {
        self.commands_issued += 1;
        self.pending = Some(PendingSwitch {
            group,
            code,
            ready_at: Instant::now() + self.settle,
        });
    }
}

impl DisplayHardware for FakeVideoCore {
    fn scan_modes(&self, group: ModeGroup) -> Result<ModeScan, HardwareError> {
        let state = self.lock();
        Ok(ModeScan {
            modes: state.table(group).to_vec(),
            preferred_group: state.preferred.0,
            preferred_code: state.preferred.1,
        })
    }

    fn display_state(&self) -> Result<OutputStatus, HardwareError> {
        let mut state = self.lock();
        state.settle_pending();
        let (group, code) = state.active;
        let mode = state.descriptor(group, code).ok_or_else(|| {
            HardwareError::CommandFailed(format!("active mode {} {} missing from table", group, code))
        })?;
        Ok(OutputStatus {
            power: state.power,
            group,
            code,
            width: mode.width,
            height: mode.height,
            frame_rate: mode.frame_rate,
            scan: mode.scan,
            aspect: mode.aspect,
        })
    }

    fn set_mode_explicit(&self, group: ModeGroup, code: u16) -> Result<(), HardwareError> {
        let mut state = self.lock();
        if state.descriptor(group, code).is_none() {
            return Err(HardwareError::CommandFailed(format!(
                "mode {} {} not supported",
                group, code
            )));
        }
        state.queue_switch(group, code);
        log::debug!("fake videocore: switch to {} mode {} queued", group, code);
        Ok(())
    }

    fn set_mode_preferred(&self) -> Result<(), HardwareError> {
        let mut state = self.lock();
        let (group, code) = state.preferred;
        state.queue_switch(group, code);
        log::debug!("fake videocore: switch to preferred {} mode {} queued", group, code);
        Ok(())
    }

    fn power_off(&self) -> Result<(), HardwareError> {
        let mut state = self.lock();
        state.commands_issued += 1;
        state.pending = None;
        state.power = PowerState::Off;
        log::debug!("fake videocore: output powered off");
        Ok(())
    }

    fn acquire_pipeline(
        &self,
        target: DisplayTarget,
        path: &Path,
        config: &SessionConfig,
    ) -> Result<PipelineHandle, HardwareError> {
        let reader = ImageReader::open(path)
            .map_err(|err| HardwareError::Pipeline { stage: "reader", detail: err.to_string() })?
            .with_guessed_format()
            .map_err(|err| HardwareError::Pipeline { stage: "reader", detail: err.to_string() })?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|err| HardwareError::Pipeline { stage: "decoder", detail: err.to_string() })?;

        let mut state = self.lock();
        let handle = PipelineHandle(state.next_handle);
        state.next_handle += 1;
        state.pipelines.insert(
            handle.0,
            LivePipeline { target, uri: path.display().to_string() },
        );
        log::debug!(
            "fake videocore: pipeline {} presenting {}x{} on {} (layer {})",
            handle.0,
            width,
            height,
            target,
            config.layer
        );
        Ok(handle)
    }

    fn release_pipeline(&self, handle: PipelineHandle) -> Result<(), HardwareError> {
        let mut state = self.lock();
        match state.pipelines.remove(&handle.0) {
            Some(pipeline) => {
                log::debug!(
                    "fake videocore: pipeline {} ('{}' on {}) released",
                    handle.0,
                    pipeline.uri,
                    pipeline.target
                );
                Ok(())
            }
            None => Err(HardwareError::Pipeline {
                stage: "teardown",
                detail: format!("no live pipeline {}", handle.0),
            }),
        }
    }
}

fn mode(
    group: ModeGroup,
    code: u16,
    width: u32,
    height: u32,
    frame_rate: u32,
    pixel_freq: u32,
    scan: ScanMode,
    aspect: AspectRatio,
) -> ModeDescriptor {
    ModeDescriptor { group, code, width, height, frame_rate, pixel_freq, scan, aspect }
}

// Tables keep an EDID-like preference order, not code order.
fn cea_modes() -> Vec<ModeDescriptor> {
    use AspectRatio::{R16x9, R4x3};
    use ScanMode::{Interlaced, Progressive};

    let g = ModeGroup::Cea;
    vec![
        mode(g, 16, 1920, 1080, 60, 148_500_000, Progressive, R16x9),
        mode(g, 4, 1280, 720, 60, 74_250_000, Progressive, R16x9),
        mode(g, 31, 1920, 1080, 50, 148_500_000, Progressive, R16x9),
        mode(g, 19, 1280, 720, 50, 74_250_000, Progressive, R16x9),
        mode(g, 5, 1920, 1080, 60, 74_250_000, Interlaced, R16x9),
        mode(g, 1, 640, 480, 60, 25_175_000, Progressive, R4x3),
        mode(g, 21, 1440, 576, 50, 27_000_000, Interlaced, R4x3),
        mode(g, 22, 1440, 576, 50, 27_000_000, Interlaced, R16x9),
    ]
}

fn dmt_modes() -> Vec<ModeDescriptor> {
    use AspectRatio::{R15x9, R16x10, R16x9, R4x3, R5x4};
    use ScanMode::Progressive;

    let g = ModeGroup::Dmt;
    vec![
        mode(g, 82, 1920, 1080, 60, 148_500_000, Progressive, R16x9),
        mode(g, 35, 1280, 1024, 60, 108_000_000, Progressive, R5x4),
        mode(g, 28, 1280, 800, 60, 83_500_000, Progressive, R16x10),
        mode(g, 39, 1360, 768, 60, 85_500_000, Progressive, R16x9),
        mode(g, 16, 1024, 768, 60, 65_000_000, Progressive, R4x3),
        mode(g, 22, 1280, 768, 60, 68_250_000, Progressive, R15x9),
        mode(g, 9, 800, 600, 60, 40_000_000, Progressive, R4x3),
        mode(g, 4, 640, 480, 60, 25_175_000, Progressive, R4x3),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_cover_both_groups() {
        let core = FakeVideoCore::new();
        for group in ModeGroup::ALL {
            let scan = core.scan_modes(group).unwrap();
            assert!(!scan.modes.is_empty());
            assert!(scan.modes.iter().all(|mode| mode.group == group));
        }
    }

    #[test]
    fn test_state_reflects_switch_after_settle() {
        let core = FakeVideoCore::new().with_settle(Duration::ZERO);
        core.set_mode_explicit(ModeGroup::Dmt, 9).unwrap();
        let status = core.display_state().unwrap();
        assert!(status.is_mode(ModeGroup::Dmt, 9));
        assert_eq!(status.width, 800);
    }

    #[test]
    fn test_switch_is_pending_during_settle() {
        let core = FakeVideoCore::new().with_settle(Duration::from_secs(60));
        core.set_mode_explicit(ModeGroup::Cea, 4).unwrap();
        let status = core.display_state().unwrap();
        assert!(status.is_mode(ModeGroup::Cea, 16));
    }

    #[test]
    fn test_unsupported_mode_is_a_command_failure() {
        let core = FakeVideoCore::new();
        let result = core.set_mode_explicit(ModeGroup::Cea, 999);
        assert!(matches!(result, Err(HardwareError::CommandFailed(_))));
    }

    #[test]
    fn test_release_of_unknown_pipeline_faults() {
        let core = FakeVideoCore::new();
        let result = core.release_pipeline(PipelineHandle(77));
        assert!(matches!(result, Err(HardwareError::Pipeline { .. })));
    }
}
