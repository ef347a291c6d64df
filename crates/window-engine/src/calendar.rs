//! Calendar atoms: day of week, day of month, month of year.
//!
//! These depend only on the civil date of the instant in its own zone. Their
//! boundaries are always local midnights, computed directly from the date
//! rather than by stepping through time.

use std::fmt;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Weekday};

use crate::civil::midnight_after;
use crate::error::{Result, WindowError};

// ── WeekDay ─────────────────────────────────────────────────────────────────

/// True for the whole of one day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekDay {
    day: Weekday,
}

impl WeekDay {
    pub fn new(day: Weekday) -> Self {
        Self { day }
    }

    pub fn day(&self) -> Weekday {
        self.day
    }

    pub fn evaluate<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        at.weekday() == self.day
    }

    /// Next midnight when matching; otherwise the midnight starting the next
    /// date with this weekday.
    pub(crate) fn next_boundary_candidate<Tz: TimeZone>(
        &self,
        at: &DateTime<Tz>,
    ) -> Option<DateTime<Tz>> {
        let current = at.weekday().num_days_from_monday();
        let target = self.day.num_days_from_monday();
        let days_ahead = if current == target {
            1
        } else {
            (target + 7 - current) % 7
        };
        let date = at.date_naive().checked_add_days(Days::new(days_ahead.into()))?;
        midnight_after(&at.timezone(), date, at)
    }
}

impl fmt::Display for WeekDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(weekday_token(self.day))
    }
}

// ── DayOfMonth ──────────────────────────────────────────────────────────────

/// True for the whole of one day number in every month that has it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayOfMonth {
    day: u32,
}

impl DayOfMonth {
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidInterval`] unless `day` is in `1..=31`.
    pub fn new(day: u32) -> Result<Self> {
        if !(1..=31).contains(&day) {
            return Err(WindowError::InvalidInterval(format!(
                "day of month must be between 1 and 31, got {day}"
            )));
        }
        Ok(Self { day })
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn evaluate<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        at.day() == self.day
    }

    pub(crate) fn next_boundary_candidate<Tz: TimeZone>(
        &self,
        at: &DateTime<Tz>,
    ) -> Option<DateTime<Tz>> {
        let today = at.date_naive();
        let date = if self.evaluate(at) {
            today.succ_opt()?
        } else {
            self.next_matching_date(today)?
        };
        midnight_after(&at.timezone(), date, at)
    }

    /// The first date after `from` carrying this day number, skipping months
    /// too short to have it.
    fn next_matching_date(&self, from: NaiveDate) -> Option<NaiveDate> {
        if from.day() < self.day {
            if let Some(date) = from.with_day(self.day) {
                return Some(date);
            }
        }
        let (mut year, mut month) = (from.year(), from.month());
        // No day number is missing from two consecutive months.
        for _ in 0..12 {
            (year, month) = next_month(year, month);
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, self.day) {
                return Some(date);
            }
        }
        None
    }
}

impl fmt::Display for DayOfMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.day)
    }
}

// ── Month ───────────────────────────────────────────────────────────────────

/// True for the whole of one month of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Month {
    month: chrono::Month,
}

impl Month {
    pub fn new(month: chrono::Month) -> Self {
        Self { month }
    }

    /// # Errors
    ///
    /// Returns [`WindowError::InvalidInterval`] unless `number` is in `1..=12`.
    pub fn from_number(number: u32) -> Result<Self> {
        u8::try_from(number)
            .ok()
            .and_then(|n| chrono::Month::try_from(n).ok())
            .map(Self::new)
            .ok_or_else(|| {
                WindowError::InvalidInterval(format!(
                    "month must be between 1 and 12, got {number}"
                ))
            })
    }

    pub fn month(&self) -> chrono::Month {
        self.month
    }

    pub fn evaluate<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        at.month() == self.month.number_from_month()
    }

    /// First day of the following month when matching; otherwise the first
    /// day of the stored month, this year or next.
    pub(crate) fn next_boundary_candidate<Tz: TimeZone>(
        &self,
        at: &DateTime<Tz>,
    ) -> Option<DateTime<Tz>> {
        let (year, month) = (at.year(), at.month());
        let target = self.month.number_from_month();
        let (year, month) = if month == target {
            next_month(year, month)
        } else if target > month {
            (year, target)
        } else {
            (year.checked_add(1)?, target)
        };
        let date = NaiveDate::from_ymd_opt(year, month, 1)?;
        midnight_after(&at.timezone(), date, at)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(month_token(self.month))
    }
}

// ── Token helpers ───────────────────────────────────────────────────────────

/// Parse a rule-language weekday token (`mon` … `sun`).
pub(crate) fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parse a rule-language month token (`jan` … `dec`).
pub(crate) fn parse_month(s: &str) -> Option<chrono::Month> {
    use chrono::Month::*;
    match s {
        "jan" => Some(January),
        "feb" => Some(February),
        "mar" => Some(March),
        "apr" => Some(April),
        "may" => Some(May),
        "jun" => Some(June),
        "jul" => Some(July),
        "aug" => Some(August),
        "sep" => Some(September),
        "oct" => Some(October),
        "nov" => Some(November),
        "dec" => Some(December),
        _ => None,
    }
}

fn weekday_token(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

fn month_token(month: chrono::Month) -> &'static str {
    use chrono::Month::*;
    match month {
        January => "jan",
        February => "feb",
        March => "mar",
        April => "apr",
        May => "may",
        June => "jun",
        July => "jul",
        August => "aug",
        September => "sep",
        October => "oct",
        November => "nov",
        December => "dec",
    }
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
