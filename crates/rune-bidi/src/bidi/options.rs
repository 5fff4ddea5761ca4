//! Reordering modes and the option sets that tune them.

use core::fmt;
use core::str::FromStr;

use bitflags::bitflags;

use crate::bidi::implicit::NumberPolicy;
use crate::error::{BidiError, Result};

/// Reordering algorithm variants.
///
/// The numeric values match the raw mode numbers accepted by
/// [`ReorderingMode::try_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReorderingMode {
    /// Standard logical-to-visual UBA.
    Default,
    /// Like `Default`, but numbers between L and R text group with R.
    NumbersSpecial,
    /// Numbers stay with adjacent R text unless surrounded by L text.
    GroupNumbersWithR,
    /// Logical-to-logical flip of the paragraph direction at run level.
    RunsOnly,
    /// Visual-to-logical, treating numbers as L.
    InverseNumbersAsL,
    /// Visual-to-logical, the inverse of `Default`.
    InverseLikeDirect,
    /// Visual-to-logical, the inverse of `NumbersSpecial`.
    InverseForNumbersSpecial,
}

impl ReorderingMode {
    pub const ALL: [ReorderingMode; 7] = [
        ReorderingMode::Default,
        ReorderingMode::NumbersSpecial,
        ReorderingMode::GroupNumbersWithR,
        ReorderingMode::RunsOnly,
        ReorderingMode::InverseNumbersAsL,
        ReorderingMode::InverseLikeDirect,
        ReorderingMode::InverseForNumbersSpecial,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReorderingMode::Default => "default",
            ReorderingMode::NumbersSpecial => "numbers-special",
            ReorderingMode::GroupNumbersWithR => "group-numbers-with-r",
            ReorderingMode::RunsOnly => "runs-only",
            ReorderingMode::InverseNumbersAsL => "inverse-numbers-as-l",
            ReorderingMode::InverseLikeDirect => "inverse-like-direct",
            ReorderingMode::InverseForNumbersSpecial => "inverse-for-numbers-special",
        }
    }

    /// Whether the input is treated as visually ordered text.
    pub fn is_visual_to_logical(self) -> bool {
        matches!(
            self,
            ReorderingMode::InverseNumbersAsL
                | ReorderingMode::InverseLikeDirect
                | ReorderingMode::InverseForNumbersSpecial
        )
    }

    pub(crate) fn number_policy(self) -> NumberPolicy {
        match self {
            ReorderingMode::NumbersSpecial | ReorderingMode::InverseForNumbersSpecial => {
                NumberPolicy::NumbersSpecial
            }
            ReorderingMode::GroupNumbersWithR => NumberPolicy::GroupWithR,
            ReorderingMode::InverseNumbersAsL => NumberPolicy::AsL,
            ReorderingMode::Default
            | ReorderingMode::RunsOnly
            | ReorderingMode::InverseLikeDirect => NumberPolicy::Standard,
        }
    }

    /// Modes that read odd-level text from its visual right edge, i.e.
    /// in the order a reader of the logical result would.
    pub(crate) fn reads_rtl_from_visual_end(self) -> bool {
        matches!(
            self,
            ReorderingMode::InverseLikeDirect | ReorderingMode::InverseForNumbersSpecial
        )
    }

    /// Logical-to-visual mode whose output an inverse pass must reproduce.
    pub(crate) fn direct_counterpart(self) -> Option<ReorderingMode> {
        match self {
            ReorderingMode::InverseLikeDirect | ReorderingMode::RunsOnly => {
                Some(ReorderingMode::Default)
            }
            ReorderingMode::InverseForNumbersSpecial => Some(ReorderingMode::NumbersSpecial),
            _ => None,
        }
    }
}

impl Default for ReorderingMode {
    fn default() -> Self {
        ReorderingMode::Default
    }
}

impl TryFrom<u32> for ReorderingMode {
    type Error = BidiError;

    fn try_from(raw: u32) -> Result<Self> {
        usize::try_from(raw)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or_else(|| BidiError::InvalidConfiguration(format!("unknown reordering mode {raw}")))
    }
}

impl From<ReorderingMode> for u32 {
    fn from(mode: ReorderingMode) -> u32 {
        mode as u32
    }
}

impl FromStr for ReorderingMode {
    type Err = BidiError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == wanted)
            .ok_or_else(|| BidiError::InvalidConfiguration(format!("unknown reordering mode `{s}`")))
    }
}

impl fmt::Display for ReorderingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Options applied while resolving levels and runs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ReorderingOptions: u32 {
        /// Insert LRM/RLM so the result survives the opposite transform.
        const INSERT_MARKS = 0x1;
        /// Drop bidi controls from the output. Cancels `INSERT_MARKS`.
        const REMOVE_CONTROLS = 0x2;
        /// Only process text up to the last paragraph separator.
        const STREAMING = 0x4;
    }
}

bitflags! {
    /// Options applied when rendering the reordered text.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WriteOptions: u32 {
        /// Keep combining marks after their base inside reversed runs.
        const KEEP_BASE_COMBINING = 0x1;
        /// Replace mirrored characters at odd levels (rule L4).
        const DO_MIRRORING = 0x2;
        /// Surround runs that do not start/end with their own strong
        /// direction (typically numbers) with marks.
        const INSERT_LRM_FOR_NUMERIC = 0x4;
        /// Strip LRM, RLM, ALM, ZWJ, ZWNJ and explicit formatting characters.
        const REMOVE_BIDI_CONTROLS = 0x8;
        /// Emit the result right to left.
        const OUTPUT_REVERSE = 0x10;
    }
}

macro_rules! option_parsing {
    ($ty:ident, $what:literal) => {
        impl $ty {
            /// Build from raw bits, rejecting unknown ones.
            pub fn from_raw(bits: u32) -> Result<Self> {
                Self::from_bits(bits).ok_or_else(|| {
                    BidiError::InvalidConfiguration(format!(
                        concat!("unknown ", $what, " bits {:#x}"),
                        bits & !Self::all().bits()
                    ))
                })
            }

            /// Parse a single flag name, e.g. `insert-marks` or `INSERT_MARKS`.
            pub fn parse_name(name: &str) -> Result<Self> {
                let normalized = name.trim().to_ascii_uppercase().replace('-', "_");
                Self::from_name(&normalized).ok_or_else(|| {
                    BidiError::InvalidConfiguration(format!(concat!("unknown ", $what, " `{}`"), name))
                })
            }

            /// Union of the named flags.
            pub fn parse_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
                names
                    .iter()
                    .try_fold(Self::empty(), |acc, name| Ok(acc | Self::parse_name(name.as_ref())?))
            }
        }
    };
}

option_parsing!(ReorderingOptions, "reordering option");
option_parsing!(WriteOptions, "write option");

/// How the reordering mode was chosen.
///
/// Older callers flip a single "inverse" switch; newer ones pick a mode.
/// Both are kept in one value so the two can never disagree:
/// `LegacyInverse(true)` behaves exactly like
/// `Mode(ReorderingMode::InverseNumbersAsL)` and `LegacyInverse(false)`
/// like `Mode(ReorderingMode::Default)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSelection {
    Mode(ReorderingMode),
    LegacyInverse(bool),
}

impl ModeSelection {
    pub fn effective_mode(self) -> ReorderingMode {
        match self {
            ModeSelection::Mode(mode) => mode,
            ModeSelection::LegacyInverse(true) => ReorderingMode::InverseNumbersAsL,
            ModeSelection::LegacyInverse(false) => ReorderingMode::Default,
        }
    }

    /// The legacy inverse flag as observed by callers: set only while
    /// the effective mode is `InverseNumbersAsL`. Selecting
    /// `InverseLikeDirect` or `InverseForNumbersSpecial` reads back `false`.
    pub fn is_inverse(self) -> bool {
        self.effective_mode() == ReorderingMode::InverseNumbersAsL
    }
}

impl Default for ModeSelection {
    fn default() -> Self {
        ModeSelection::Mode(ReorderingMode::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_mode_numbers_round_trip() {
        for (raw, mode) in ReorderingMode::ALL.into_iter().enumerate() {
            assert_eq!(ReorderingMode::try_from(raw as u32).unwrap(), mode);
            assert_eq!(u32::from(mode), raw as u32);
        }
        assert!(matches!(
            ReorderingMode::try_from(7),
            Err(BidiError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!(
            "inverse-like-direct".parse::<ReorderingMode>().unwrap(),
            ReorderingMode::InverseLikeDirect
        );
        assert_eq!(
            "RUNS_ONLY".parse::<ReorderingMode>().unwrap(),
            ReorderingMode::RunsOnly
        );
        assert!("sideways".parse::<ReorderingMode>().is_err());
    }

    #[test]
    fn option_bits_match_raw_values() {
        assert_eq!(ReorderingOptions::STREAMING.bits(), 4);
        assert_eq!(WriteOptions::OUTPUT_REVERSE.bits(), 16);
        assert_eq!(
            WriteOptions::from_raw(3).unwrap(),
            WriteOptions::KEEP_BASE_COMBINING | WriteOptions::DO_MIRRORING
        );
        assert!(ReorderingOptions::from_raw(8).is_err());
        assert!(WriteOptions::from_raw(0x20).is_err());
    }

    #[test]
    fn parses_option_names() {
        let opts = WriteOptions::parse_names(&["do-mirroring", "KEEP_BASE_COMBINING"]).unwrap();
        assert_eq!(opts, WriteOptions::DO_MIRRORING | WriteOptions::KEEP_BASE_COMBINING);
        assert!(ReorderingOptions::parse_name("insert-lrm").is_err());
    }

    #[test]
    fn legacy_inverse_maps_to_numbers_as_l() {
        let legacy = ModeSelection::LegacyInverse(true);
        assert_eq!(legacy.effective_mode(), ReorderingMode::InverseNumbersAsL);
        assert!(legacy.is_inverse());
        assert!(!ModeSelection::LegacyInverse(false).is_inverse());
    }

    #[test]
    fn inverse_family_modes_do_not_read_as_inverse() {
        assert!(!ModeSelection::Mode(ReorderingMode::InverseLikeDirect).is_inverse());
        assert!(!ModeSelection::Mode(ReorderingMode::InverseForNumbersSpecial).is_inverse());
        assert!(ModeSelection::Mode(ReorderingMode::InverseNumbersAsL).is_inverse());
    }
}
