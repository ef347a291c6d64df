//! Next-transition search.
//!
//! Every node reports boundary *candidates*: instants where its own state may
//! change. A combinator's candidate is not necessarily a change of the
//! combined value (two weekdays ending and starting at the same midnight, an
//! intersection of disjoint sets). The search walks the candidates in order
//! and stops at the first one where the value actually differs.
//!
//! Candidates always move strictly forward, so the walk cannot stall on a
//! shared boundary. It can, however, go on forever for trees such as
//! `mon & wed` that never change. The walk is therefore bounded by
//! [`SearchOptions::horizon`], and further by the tree's own period: a tree
//! with no day-of-month or month atom repeats every week except on clock
//! change dates, which come back every year, so it is only searched for
//! [`WEEKLY_TREE_SPAN_DAYS`].

use chrono::{DateTime, Duration, TimeZone};

use crate::predicate::Predicate;

/// Days in one 400-year Gregorian cycle. Calendar atoms repeat exactly after
/// it, and it is a whole number of weeks.
pub const GREGORIAN_CYCLE_DAYS: i64 = 146_097;

/// Longest search for trees built from weekdays, hour ranges and constants:
/// a leap year plus one week, so every clock change of the year is seen on
/// every weekday alignment it can take within that year.
pub const WEEKLY_TREE_SPAN_DAYS: i64 = 366 + 7;

/// Options for [`Predicate::next_transition_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// How far past the starting instant to look for a change before
    /// concluding there is none.
    pub horizon: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            horizon: Duration::days(GREGORIAN_CYCLE_DAYS),
        }
    }
}

impl SearchOptions {
    pub fn with_horizon(horizon: Duration) -> Self {
        Self { horizon }
    }
}

impl Predicate {
    /// The earliest instant strictly after `at` where [`evaluate`] differs
    /// from `evaluate(at)`, or `None` if the value never changes again.
    ///
    /// Searches up to one Gregorian cycle ahead, or one year for trees
    /// without day-of-month and month atoms; see
    /// [`next_transition_with_options`] for a custom horizon.
    ///
    /// [`evaluate`]: Predicate::evaluate
    /// [`next_transition_with_options`]: Predicate::next_transition_with_options
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Weekday};
    /// use chrono_tz::Europe::Paris;
    /// use window_engine::{Predicate, WeekDay};
    ///
    /// let window = Predicate::from(WeekDay::new(Weekday::Mon)) | WeekDay::new(Weekday::Wed).into();
    /// // Wednesday, November 6 2024
    /// let at = Paris.with_ymd_and_hms(2024, 11, 6, 1, 42, 29).unwrap();
    /// assert!(window.evaluate(&at));
    /// let next = window.next_transition(&at).unwrap();
    /// assert_eq!(next, Paris.with_ymd_and_hms(2024, 11, 7, 0, 0, 0).unwrap());
    /// ```
    pub fn next_transition<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.next_transition_with_options(at, &SearchOptions::default())
    }

    /// [`next_transition`](Predicate::next_transition) with an explicit
    /// search horizon. `None` means no change within `options.horizon`, or
    /// within [`WEEKLY_TREE_SPAN_DAYS`] when that is shorter and the tree has
    /// no day-of-month or month atom.
    pub fn next_transition_with_options<Tz: TimeZone>(
        &self,
        at: &DateTime<Tz>,
        options: &SearchOptions,
    ) -> Option<DateTime<Tz>> {
        let initial = self.evaluate(at);
        let horizon = if self.has_date_atoms() {
            options.horizon
        } else {
            options.horizon.min(Duration::days(WEEKLY_TREE_SPAN_DAYS))
        };
        let limit = at.clone().checked_add_signed(horizon);
        let mut cursor = at.clone();

        loop {
            let candidate = self.next_boundary_candidate(&cursor)?;
            debug_assert!(candidate > cursor, "boundary candidate did not advance");
            if candidate <= cursor {
                return None;
            }
            if limit.as_ref().is_some_and(|limit| candidate > *limit) {
                tracing::debug!(
                    horizon_days = horizon.num_days(),
                    "no transition within search horizon"
                );
                return None;
            }
            if self.evaluate(&candidate) != initial {
                return Some(candidate);
            }
            cursor = candidate;
        }
    }

    fn has_date_atoms(&self) -> bool {
        match self {
            Predicate::DayOfMonth(_) | Predicate::Month(_) => true,
            Predicate::Union(a, b)
            | Predicate::Intersection(a, b)
            | Predicate::Difference(a, b)
            | Predicate::SymmetricDifference(a, b) => a.has_date_atoms() || b.has_date_atoms(),
            Predicate::Complement(a) => a.has_date_atoms(),
            Predicate::Always
            | Predicate::Never
            | Predicate::Constant(_)
            | Predicate::WeekDay(_)
            | Predicate::HourRange(_) => false,
        }
    }

    /// Successive transitions after `start`, each paired with the value that
    /// holds from that instant on.
    pub fn transitions<Tz: TimeZone>(&self, start: &DateTime<Tz>) -> Transitions<'_, Tz> {
        self.transitions_with_options(start, SearchOptions::default())
    }

    pub fn transitions_with_options<Tz: TimeZone>(
        &self,
        start: &DateTime<Tz>,
        options: SearchOptions,
    ) -> Transitions<'_, Tz> {
        Transitions {
            predicate: self,
            cursor: Some(start.clone()),
            options,
        }
    }
}

/// Iterator returned by [`Predicate::transitions`].
#[derive(Debug, Clone)]
pub struct Transitions<'a, Tz: TimeZone> {
    predicate: &'a Predicate,
    cursor: Option<DateTime<Tz>>,
    options: SearchOptions,
}

impl<Tz: TimeZone> Iterator for Transitions<'_, Tz> {
    type Item = (DateTime<Tz>, bool);

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.cursor.take()?;
        let next = self
            .predicate
            .next_transition_with_options(&at, &self.options)?;
        let value = self.predicate.evaluate(&next);
        self.cursor = Some(next.clone());
        Some((next, value))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
