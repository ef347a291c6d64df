//! Civil-time resolution.
//!
//! Maps a wall-clock reading (zone, date, time of day) onto absolute instants.
//! A reading is either [`CivilTime::Regular`] (exactly one instant),
//! [`CivilTime::Nonexistent`] (skipped by a forward clock change) or
//! [`CivilTime::Ambiguous`] (repeated by a backward clock change). Neither of
//! the irregular cases is an error: callers pick an instant according to their
//! own policy.
//!
//! Everything here is generic over [`chrono::TimeZone`], so it works the same
//! for `chrono_tz::Tz`, `FixedOffset` and `Utc`.

use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone,
};

/// The classification of one wall-clock reading in one zone.
#[derive(Debug, Clone, PartialEq)]
pub enum CivilTime<Tz: TimeZone> {
    /// The reading occurs exactly once.
    Regular(DateTime<Tz>),
    /// The reading falls inside a spring-forward gap.
    Nonexistent {
        /// First skipped reading (the clock value just before the jump).
        gap_start: NaiveDateTime,
        /// First reading after the jump.
        gap_end: NaiveDateTime,
        /// The reading pushed forward by the length of the gap,
        /// `gap_end + (literal - gap_start)`, in the post-transition offset.
        shifted: DateTime<Tz>,
    },
    /// The reading occurs twice; `early < late`.
    Ambiguous {
        early: DateTime<Tz>,
        late: DateTime<Tz>,
    },
}

impl<Tz: TimeZone> CivilTime<Tz> {
    /// The instant to use when the earlier interpretation is wanted.
    pub fn earliest(&self) -> DateTime<Tz> {
        match self {
            CivilTime::Regular(dt) => dt.clone(),
            CivilTime::Nonexistent { shifted, .. } => shifted.clone(),
            CivilTime::Ambiguous { early, .. } => early.clone(),
        }
    }

    /// The instant to use when the later interpretation is wanted.
    pub fn latest(&self) -> DateTime<Tz> {
        match self {
            CivilTime::Regular(dt) => dt.clone(),
            CivilTime::Nonexistent { shifted, .. } => shifted.clone(),
            CivilTime::Ambiguous { late, .. } => late.clone(),
        }
    }

    pub fn is_nonexistent(&self) -> bool {
        matches!(self, CivilTime::Nonexistent { .. })
    }
}

/// Classify `time` on `date` in `tz`.
pub fn resolve<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> CivilTime<Tz> {
    resolve_local(tz, date.and_time(time))
}

/// Classify a naive local datetime in `tz`.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> CivilTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => CivilTime::Regular(dt),
        LocalResult::Ambiguous(a, b) => {
            if a <= b {
                CivilTime::Ambiguous { early: a, late: b }
            } else {
                CivilTime::Ambiguous { early: b, late: a }
            }
        }
        LocalResult::None => locate_gap(tz, local),
    }
}

/// The instant a local date starts at.
///
/// A skipped midnight starts the day at the end of the gap; a repeated one at
/// its first occurrence.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    resolve(tz, date, NaiveTime::MIN).earliest()
}

/// The first local midnight strictly after `at`, starting the search at `date`.
pub(crate) fn midnight_after<Tz: TimeZone>(
    tz: &Tz,
    mut date: NaiveDate,
    at: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    loop {
        let midnight = local_midnight(tz, date);
        if midnight > *at {
            return Some(midnight);
        }
        date = date.succ_opt()?;
    }
}

/// Build the `Nonexistent` classification for a skipped reading.
///
/// The offsets one day either side of the reading bracket the transition;
/// bisecting on whole seconds finds the instant the new offset takes effect.
fn locate_gap<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> CivilTime<Tz> {
    let day = Duration::days(1);
    let lower = local.checked_sub_signed(day).unwrap_or(local);
    let upper = local.checked_add_signed(day).unwrap_or(local);
    let before = offset_at(tz, lower);
    let after = offset_at(tz, upper);

    let mut lo = lower.and_utc().timestamp();
    let mut hi = upper.and_utc().timestamp();
    if before != after {
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            match DateTime::from_timestamp(mid, 0) {
                Some(instant) if offset_at(tz, instant.naive_utc()) == before => lo = mid,
                Some(_) => hi = mid,
                None => break,
            }
        }
    }

    let transition = DateTime::from_timestamp(hi, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or(local);
    let (gap_start, gap_end) = if before == after {
        (local, local)
    } else {
        (
            transition
                .checked_add_signed(Duration::seconds(before.local_minus_utc().into()))
                .unwrap_or(local),
            transition
                .checked_add_signed(Duration::seconds(after.local_minus_utc().into()))
                .unwrap_or(local),
        )
    };

    let shifted_local = gap_end
        .checked_add_signed(local - gap_start)
        .unwrap_or(gap_end);
    // Readings past either end of the calendar clamp to that end
    let shifted_utc = shifted_local
        .checked_sub_signed(Duration::seconds(after.local_minus_utc().into()))
        .unwrap_or(if after.local_minus_utc() < 0 {
            NaiveDateTime::MAX
        } else {
            NaiveDateTime::MIN
        });
    tracing::trace!(
        %local,
        %gap_start,
        %gap_end,
        "civil time falls in a clock gap"
    );

    CivilTime::Nonexistent {
        gap_start,
        gap_end,
        shifted: tz.from_utc_datetime(&shifted_utc),
    }
}

fn offset_at<Tz: TimeZone>(tz: &Tz, utc: NaiveDateTime) -> FixedOffset {
    tz.offset_from_utc_datetime(&utc).fix()
}
