//! DST transition policies for recurring daily intervals.
//!
//! A daily `[begin, end)` range is written as two wall-clock readings. On the
//! days a zone springs forward or falls back, one or both readings may be
//! skipped or repeated, and the two policy axes below decide how the range is
//! mapped onto real instants. See [`HourRange`](crate::HourRange).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which boundary wins when the range cannot honor both.
///
/// Under [`DurationPolicy::PreserveDuration`] the pinned boundary is the
/// anchor and the other one is derived from it. Under
/// [`DurationPolicy::PreserveCivilTime`] it picks the occurrence of a
/// repeated (ambiguous) reading: the early one when pinned to the start, the
/// late one when pinned to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPinning {
    #[default]
    PinStart,
    PinEnd,
}

/// What a range keeps constant across a clock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationPolicy {
    /// Each boundary keeps its literal clock reading; the elapsed time may
    /// grow or shrink by the size of the transition.
    #[default]
    PreserveCivilTime,
    /// Elapsed real time always equals the nominal `end - begin` difference.
    PreserveDuration,
}

impl fmt::Display for BoundaryPinning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoundaryPinning::PinStart => "start",
            BoundaryPinning::PinEnd => "end",
        })
    }
}

impl fmt::Display for DurationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DurationPolicy::PreserveCivilTime => "civil",
            DurationPolicy::PreserveDuration => "duration",
        })
    }
}

impl FromStr for BoundaryPinning {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "start" | "begin" | "pin_start" => Ok(BoundaryPinning::PinStart),
            "end" | "pin_end" => Ok(BoundaryPinning::PinEnd),
            other => Err(format!("unknown boundary pinning '{other}' (expected start|end)")),
        }
    }
}

impl FromStr for DurationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "civil" | "wall" | "preserve_civil_time" => Ok(DurationPolicy::PreserveCivilTime),
            "duration" | "preserve_duration" => Ok(DurationPolicy::PreserveDuration),
            other => Err(format!(
                "unknown duration policy '{other}' (expected civil|duration)"
            )),
        }
    }
}
