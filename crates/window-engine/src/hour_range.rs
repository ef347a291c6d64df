//! Daily recurring time-of-day intervals.
//!
//! An [`HourRange`] is a `[begin, end)` pair of wall-clock readings applied to
//! every calendar date in the zone of the instant being evaluated. On most
//! days both readings map to exactly one instant. On clock-change days the
//! range is resolved with its [`BoundaryPinning`] and [`DurationPolicy`]:
//!
//! 1. A boundary inside a spring-forward gap is *forced* past the gap by the
//!    gap's length, whatever the policies say. Under
//!    [`DurationPolicy::PreserveDuration`] the other boundary is then derived
//!    from it (plus or minus the nominal duration).
//! 2. Otherwise, under [`DurationPolicy::PreserveCivilTime`] each boundary
//!    resolves on its own, a repeated reading taking its early occurrence
//!    when pinned to the start and its late one when pinned to the end.
//! 3. Otherwise, under [`DurationPolicy::PreserveDuration`], the pinned
//!    boundary is the anchor (early occurrence for a start, late for an end)
//!    and the other boundary is the anchor plus or minus the nominal duration
//!    in real time.
//!
//! Shifted intervals can spill over local midnight in either direction, so
//! evaluation looks at the intervals of the previous, current and next date.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike};

use crate::civil::{self, CivilTime};
use crate::dst::{BoundaryPinning, DurationPolicy};
use crate::error::{Result, WindowError};

/// A daily `[begin, end)` interval in wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HourRange {
    begin: NaiveTime,
    end: NaiveTime,
    pinning: BoundaryPinning,
    duration: DurationPolicy,
}

/// One day's interval after DST resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInterval<Tz: TimeZone> {
    pub begin: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> ResolvedInterval<Tz> {
    /// Half-open containment. An inverted interval contains nothing.
    pub fn contains(&self, at: &DateTime<Tz>) -> bool {
        self.begin <= *at && *at < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }
}

impl HourRange {
    /// Build a range with the default policies
    /// ([`BoundaryPinning::PinStart`], [`DurationPolicy::PreserveCivilTime`]).
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidInterval`] unless `begin < end`. Ranges
    /// spanning midnight are not supported.
    pub fn new(begin: NaiveTime, end: NaiveTime) -> Result<Self> {
        if end <= begin {
            return Err(WindowError::InvalidInterval(format!(
                "hour range must end after it begins, got {}~{}",
                ClockReading(begin),
                ClockReading(end)
            )));
        }
        Ok(Self {
            begin,
            end,
            pinning: BoundaryPinning::default(),
            duration: DurationPolicy::default(),
        })
    }

    /// Build a range from hour and minute components.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidInterval`] if a component is out of range
    /// (hours `0..=23`, minutes `0..=59`) or the range is empty or inverted.
    pub fn from_hm(
        begin_hour: u32,
        begin_minute: u32,
        end_hour: u32,
        end_minute: u32,
    ) -> Result<Self> {
        Self::new(
            time_of_day(begin_hour, begin_minute)?,
            time_of_day(end_hour, end_minute)?,
        )
    }

    pub fn with_pinning(mut self, pinning: BoundaryPinning) -> Self {
        self.pinning = pinning;
        self
    }

    pub fn with_duration_policy(mut self, duration: DurationPolicy) -> Self {
        self.duration = duration;
        self
    }

    pub fn begin(&self) -> NaiveTime {
        self.begin
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn pinning(&self) -> BoundaryPinning {
        self.pinning
    }

    pub fn duration_policy(&self) -> DurationPolicy {
        self.duration
    }

    /// The clock-reading difference `end - begin`.
    pub fn nominal_duration(&self) -> Duration {
        self.end - self.begin
    }

    /// Map this range onto real instants for `date` in `tz`.
    pub fn resolve<Tz: TimeZone>(&self, tz: &Tz, date: NaiveDate) -> ResolvedInterval<Tz> {
        let begin = civil::resolve(tz, date, self.begin);
        let end = civil::resolve(tz, date, self.end);
        let nominal = self.nominal_duration();
        let preserve_duration = self.duration == DurationPolicy::PreserveDuration;

        let (begin, end) = match (begin, end) {
            (
                CivilTime::Nonexistent { shifted: begin, .. },
                CivilTime::Nonexistent { shifted: end, .. },
            ) => {
                if !preserve_duration {
                    (begin, end)
                } else {
                    match self.pinning {
                        BoundaryPinning::PinStart => (begin.clone(), after(&begin, nominal)),
                        BoundaryPinning::PinEnd => (before(&end, nominal), end),
                    }
                }
            }
            (CivilTime::Nonexistent { shifted: begin, .. }, end) => {
                if preserve_duration {
                    (begin.clone(), after(&begin, nominal))
                } else {
                    (begin, self.pick(&end))
                }
            }
            (begin, CivilTime::Nonexistent { shifted: end, .. }) => {
                if preserve_duration {
                    (before(&end, nominal), end)
                } else {
                    (self.pick(&begin), end)
                }
            }
            (begin, end) => match (self.duration, self.pinning) {
                (DurationPolicy::PreserveCivilTime, _) => (self.pick(&begin), self.pick(&end)),
                (DurationPolicy::PreserveDuration, BoundaryPinning::PinStart) => {
                    let anchor = begin.earliest();
                    (anchor.clone(), after(&anchor, nominal))
                }
                (DurationPolicy::PreserveDuration, BoundaryPinning::PinEnd) => {
                    let anchor = end.latest();
                    (before(&anchor, nominal), anchor)
                }
            },
        };

        ResolvedInterval { begin, end }
    }

    pub fn evaluate<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        let tz = at.timezone();
        let date = at.date_naive();
        [date.pred_opt(), Some(date), date.succ_opt()]
            .into_iter()
            .flatten()
            .any(|d| self.resolve(&tz, d).contains(at))
    }

    /// Earliest resolved boundary strictly after `at`, looking from the
    /// previous date up to two dates ahead.
    pub(crate) fn next_boundary_candidate<Tz: TimeZone>(
        &self,
        at: &DateTime<Tz>,
    ) -> Option<DateTime<Tz>> {
        let tz = at.timezone();
        let today = at.date_naive();
        let first = today.pred_opt().unwrap_or(today);

        let mut best: Option<DateTime<Tz>> = None;
        for date in first.iter_days().take(4) {
            let interval = self.resolve(&tz, date);
            for boundary in [interval.begin, interval.end] {
                if boundary > *at && best.as_ref().is_none_or(|b| boundary < *b) {
                    best = Some(boundary);
                }
            }
        }
        best
    }

    /// Occurrence choice for a boundary resolved on its own.
    fn pick<Tz: TimeZone>(&self, civil: &CivilTime<Tz>) -> DateTime<Tz> {
        match self.pinning {
            BoundaryPinning::PinStart => civil.earliest(),
            BoundaryPinning::PinEnd => civil.latest(),
        }
    }
}

/// `anchor + length`, or `anchor` when that passes the last representable instant.
fn after<Tz: TimeZone>(anchor: &DateTime<Tz>, length: Duration) -> DateTime<Tz> {
    anchor
        .clone()
        .checked_add_signed(length)
        .unwrap_or_else(|| anchor.clone())
}

/// `anchor - length`, or `anchor` when that precedes the first representable instant.
fn before<Tz: TimeZone>(anchor: &DateTime<Tz>, length: Duration) -> DateTime<Tz> {
    anchor
        .clone()
        .checked_sub_signed(length)
        .unwrap_or_else(|| anchor.clone())
}

impl fmt::Display for HourRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", ClockReading(self.begin), ClockReading(self.end))
    }
}

/// `H:MM` rendering used by the rule language.
struct ClockReading(NaiveTime);

impl fmt::Display for ClockReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.0.hour(), self.0.minute())
    }
}

fn time_of_day(hour: u32, minute: u32) -> Result<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
        WindowError::InvalidInterval(format!("invalid time of day {hour}:{minute:02}"))
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────
