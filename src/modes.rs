//! Timing mode descriptors and the per-group mode catalog
//!
//! Pure data. Descriptors are produced by hardware scans and never
//! constructed by callers; the catalog validates mode codes before the
//! output service issues any switching command.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DisplayError;
use crate::types::PowerState;

/// Family of standardized display timings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ModeGroup {
    /// Consumer-electronics timings (CEA-861)
    Cea = 1,
    /// Computer-monitor timings (VESA DMT)
    Dmt = 2,
}

impl ModeGroup {
    /// Both timing families
    pub const ALL: [ModeGroup; 2] = [ModeGroup::Cea, ModeGroup::Dmt];

    /// Firmware resolution-group identifier
    pub fn id(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ModeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeGroup::Cea => write!(f, "CEA"),
            ModeGroup::Dmt => write!(f, "DMT"),
        }
    }
}

impl TryFrom<i32> for ModeGroup {
    type Error = DisplayError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ModeGroup::Cea),
            2 => Ok(ModeGroup::Dmt),
            other => Err(DisplayError::invalid_value("mode group", other.to_string())),
        }
    }
}

impl FromStr for ModeGroup {
    type Err = DisplayError;

    // The firmware's group lookup is case-insensitive; keep that.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("cea") {
            Ok(ModeGroup::Cea)
        } else if s.eq_ignore_ascii_case("dmt") {
            Ok(ModeGroup::Dmt)
        } else {
            Err(DisplayError::invalid_value("mode group", s))
        }
    }
}

/// Progressive or interlaced scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanMode {
    /// Whole frames each refresh
    Progressive,
    /// Alternating fields each refresh
    Interlaced,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Progressive => write!(f, "p"),
            ScanMode::Interlaced => write!(f, "i"),
        }
    }
}

/// Picture aspect ratio as reported by the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    R4x3,
    R14x9,
    R16x9,
    R5x4,
    R16x10,
    R15x9,
    R64x27,
    Unknown,
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AspectRatio::R4x3 => "4:3",
            AspectRatio::R14x9 => "14:9",
            AspectRatio::R16x9 => "16:9",
            AspectRatio::R5x4 => "5:4",
            AspectRatio::R16x10 => "16:10",
            AspectRatio::R15x9 => "15:9",
            AspectRatio::R64x27 => "64:27 (21:9)",
            AspectRatio::Unknown => "unknown AR",
        };
        write!(f, "{}", label)
    }
}

/// One hardware-reported timing mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDescriptor {
    /// Timing family the mode belongs to
    pub group: ModeGroup,
    /// Mode code, unique within its group
    pub code: u16,
    /// Active width in pixels
    pub width: u32,
    /// Active height in pixels
    pub height: u32,
    /// Vertical refresh in Hz
    pub frame_rate: u32,
    /// Pixel clock in Hz
    pub pixel_freq: u32,
    /// Progressive or interlaced
    pub scan: ScanMode,
    /// Picture aspect ratio
    pub aspect: AspectRatio,
}

impl ModeDescriptor {
    /// Pixel clock in MHz, as status tools print it
    pub fn pixel_clock_mhz(&self) -> u32 {
        self.pixel_freq / 1_000_000
    }

    /// Compact timing label, e.g. `1920x1080p60`
    pub fn timing_label(&self) -> String {
        format!("{}x{}{}{}", self.width, self.height, self.scan, self.frame_rate)
    }
}

impl fmt::Display for ModeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mode {}: {} {}",
            self.group,
            self.code,
            self.timing_label(),
            self.aspect
        )
    }
}

/// Snapshot of one group's supported modes
///
/// Entries keep the hardware's own preference order, not code order.
/// Iteration is restartable; every `iter` call walks the full snapshot
/// again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeCatalog {
    group: ModeGroup,
    modes: Vec<ModeDescriptor>,
    preferred_group: ModeGroup,
    preferred_code: u16,
}

impl ModeCatalog {
    pub(crate) fn new(
        group: ModeGroup,
        modes: Vec<ModeDescriptor>,
        preferred: (ModeGroup, u16),
    ) -> Self {
        ModeCatalog {
            group,
            modes,
            preferred_group: preferred.0,
            preferred_code: preferred.1,
        }
    }

    /// Group this catalog was scanned for
    pub fn group(&self) -> ModeGroup {
        self.group
    }

    /// Number of modes advertised for the group
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    /// True when the hardware advertises no modes for the group
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Walk the snapshot in hardware preference order
    pub fn iter(&self) -> std::slice::Iter<'_, ModeDescriptor> {
        self.modes.iter()
    }

    /// Look up a mode by code
    pub fn get(&self, code: u16) -> Option<&ModeDescriptor> {
        self.modes.iter().find(|mode| mode.code == code)
    }

    /// Whether `code` is advertised in this catalog
    pub fn contains(&self, code: u16) -> bool {
        self.get(code).is_some()
    }

    /// Preferred mode pair the hardware reported during the scan
    ///
    /// The pair may name a mode in the other group.
    pub fn preferred(&self) -> (ModeGroup, u16) {
        (self.preferred_group, self.preferred_code)
    }
}

impl<'a> IntoIterator for &'a ModeCatalog {
    type Item = &'a ModeDescriptor;
    type IntoIter = std::slice::Iter<'a, ModeDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Snapshot of the active output state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputStatus {
    /// Output power/signal state
    pub power: PowerState,
    /// Timing family of the active mode
    pub group: ModeGroup,
    /// Code of the active mode
    pub code: u16,
    /// Active width in pixels
    pub width: u32,
    /// Active height in pixels
    pub height: u32,
    /// Vertical refresh in Hz
    pub frame_rate: u32,
    /// Progressive or interlaced
    pub scan: ScanMode,
    /// Picture aspect ratio
    pub aspect: AspectRatio,
}

impl OutputStatus {
    /// Whether the given mode is active and the output is powered
    pub fn is_mode(&self, group: ModeGroup, code: u16) -> bool {
        self.power == PowerState::On && self.group == group && self.code == code
    }
}

impl fmt::Display for OutputStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.power {
            PowerState::Off => write!(f, "output off"),
            PowerState::On => write!(
                f,
                "output on: {} mode {}, {}x{}{}{} {}",
                self.group,
                self.code,
                self.width,
                self.height,
                self.scan,
                self.frame_rate,
                self.aspect
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mode() -> ModeDescriptor {
        ModeDescriptor {
            group: ModeGroup::Cea,
            code: 16,
            width: 1920,
            height: 1080,
            frame_rate: 60,
            pixel_freq: 148_500_000,
            scan: ScanMode::Progressive,
            aspect: AspectRatio::R16x9,
        }
    }

    #[test]
    fn test_group_ids_are_stable() {
        assert_eq!(ModeGroup::Cea.id(), 1);
        assert_eq!(ModeGroup::Dmt.id(), 2);
    }

    #[test]
    fn test_group_parse_accepts_both_families() {
        assert_eq!("CEA".parse::<ModeGroup>().unwrap(), ModeGroup::Cea);
        assert_eq!("dmt".parse::<ModeGroup>().unwrap(), ModeGroup::Dmt);
        assert_eq!(ModeGroup::try_from(1).unwrap(), ModeGroup::Cea);
    }

    #[test]
    fn test_group_parse_rejects_out_of_domain_values() {
        assert!(matches!(
            "".parse::<ModeGroup>(),
            Err(DisplayError::InvalidValue { .. })
        ));
        assert!(matches!(
            "3232".parse::<ModeGroup>(),
            Err(DisplayError::InvalidValue { .. })
        ));
        assert!(matches!(
            ModeGroup::try_from(3232),
            Err(DisplayError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_descriptor_display_and_labels() {
        let mode = sample_mode();
        assert_eq!(mode.timing_label(), "1920x1080p60");
        assert_eq!(mode.pixel_clock_mhz(), 148);
        assert_eq!(mode.to_string(), "CEA mode 16: 1920x1080p60 16:9");
    }

    #[test]
    fn test_aspect_ratio_labels() {
        assert_eq!(AspectRatio::R64x27.to_string(), "64:27 (21:9)");
        assert_eq!(AspectRatio::Unknown.to_string(), "unknown AR");
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = ModeCatalog::new(
            ModeGroup::Cea,
            vec![sample_mode()],
            (ModeGroup::Cea, 16),
        );
        assert_eq!(catalog.len(), 1);
        assert!(!catalog.is_empty());
        assert!(catalog.contains(16));
        assert!(!catalog.contains(4));
        assert_eq!(catalog.get(16).unwrap().width, 1920);
        assert_eq!(catalog.preferred(), (ModeGroup::Cea, 16));
    }

    #[test]
    fn test_catalog_iteration_is_restartable() {
        let catalog = ModeCatalog::new(
            ModeGroup::Cea,
            vec![sample_mode()],
            (ModeGroup::Cea, 16),
        );
        let first: Vec<u16> = catalog.iter().map(|mode| mode.code).collect();
        let second: Vec<u16> = catalog.iter().map(|mode| mode.code).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_status_serde_roundtrip() {
        let status = OutputStatus {
            power: PowerState::On,
            group: ModeGroup::Cea,
            code: 16,
            width: 1920,
            height: 1080,
            frame_rate: 60,
            scan: ScanMode::Progressive,
            aspect: AspectRatio::R16x9,
        };
        let json = serde_json::to_string(&status).unwrap();
        let back: OutputStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
        assert_eq!(status.to_string(), "output on: CEA mode 16, 1920x1080p60 16:9");
    }
}
