//! The temporal predicate tree.
//!
//! [`Predicate`] is a closed set of node kinds: constant leaves, calendar and
//! clock atoms, and boolean combinators. Combinator children are held in
//! [`Arc`]s so a subtree bound once (e.g. by a `let` in a rule program) can be
//! referenced from many places without copying. Nodes are never mutated, so a
//! tree can be queried from any number of threads at once.
//!
//! The transition search over a tree lives in [`crate::search`].

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not, Sub};
use std::sync::Arc;

use chrono::{DateTime, TimeZone};

use crate::calendar::{DayOfMonth, Month, WeekDay};
use crate::hour_range::HourRange;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Always,
    Never,
    Constant(bool),
    WeekDay(WeekDay),
    DayOfMonth(DayOfMonth),
    Month(Month),
    HourRange(HourRange),
    Union(Arc<Predicate>, Arc<Predicate>),
    Intersection(Arc<Predicate>, Arc<Predicate>),
    /// `a` and not `b`.
    Difference(Arc<Predicate>, Arc<Predicate>),
    SymmetricDifference(Arc<Predicate>, Arc<Predicate>),
    Complement(Arc<Predicate>),
}

impl Predicate {
    pub fn union(a: impl Into<Arc<Predicate>>, b: impl Into<Arc<Predicate>>) -> Self {
        Predicate::Union(a.into(), b.into())
    }

    pub fn intersection(a: impl Into<Arc<Predicate>>, b: impl Into<Arc<Predicate>>) -> Self {
        Predicate::Intersection(a.into(), b.into())
    }

    pub fn difference(a: impl Into<Arc<Predicate>>, b: impl Into<Arc<Predicate>>) -> Self {
        Predicate::Difference(a.into(), b.into())
    }

    pub fn symmetric_difference(
        a: impl Into<Arc<Predicate>>,
        b: impl Into<Arc<Predicate>>,
    ) -> Self {
        Predicate::SymmetricDifference(a.into(), b.into())
    }

    pub fn complement(a: impl Into<Arc<Predicate>>) -> Self {
        Predicate::Complement(a.into())
    }

    /// Whether the window is open at `at`, judged in `at`'s own zone.
    pub fn evaluate<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Never => false,
            Predicate::Constant(value) => *value,
            Predicate::WeekDay(atom) => atom.evaluate(at),
            Predicate::DayOfMonth(atom) => atom.evaluate(at),
            Predicate::Month(atom) => atom.evaluate(at),
            Predicate::HourRange(atom) => atom.evaluate(at),
            Predicate::Union(a, b) => a.evaluate(at) || b.evaluate(at),
            Predicate::Intersection(a, b) => a.evaluate(at) && b.evaluate(at),
            Predicate::Difference(a, b) => a.evaluate(at) && !b.evaluate(at),
            Predicate::SymmetricDifference(a, b) => a.evaluate(at) != b.evaluate(at),
            Predicate::Complement(a) => !a.evaluate(at),
        }
    }

    /// Earliest instant strictly after `at` where this node's own state may
    /// change. For combinators this is only a candidate: the combined value
    /// need not flip there.
    pub(crate) fn next_boundary_candidate<Tz: TimeZone>(
        &self,
        at: &DateTime<Tz>,
    ) -> Option<DateTime<Tz>> {
        match self {
            Predicate::Always | Predicate::Never | Predicate::Constant(_) => None,
            Predicate::WeekDay(atom) => atom.next_boundary_candidate(at),
            Predicate::DayOfMonth(atom) => atom.next_boundary_candidate(at),
            Predicate::Month(atom) => atom.next_boundary_candidate(at),
            Predicate::HourRange(atom) => atom.next_boundary_candidate(at),
            Predicate::Union(a, b)
            | Predicate::Intersection(a, b)
            | Predicate::Difference(a, b)
            | Predicate::SymmetricDifference(a, b) => earliest(
                a.next_boundary_candidate(at),
                b.next_boundary_candidate(at),
            ),
            Predicate::Complement(a) => a.next_boundary_candidate(at),
        }
    }
}

fn earliest<Tz: TimeZone>(
    a: Option<DateTime<Tz>>,
    b: Option<DateTime<Tz>>,
) -> Option<DateTime<Tz>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b < a { b } else { a }),
        (a, None) => a,
        (None, b) => b,
    }
}

// ── Conversions ─────────────────────────────────────────────────────────────

impl From<bool> for Predicate {
    fn from(value: bool) -> Self {
        Predicate::Constant(value)
    }
}

impl From<WeekDay> for Predicate {
    fn from(atom: WeekDay) -> Self {
        Predicate::WeekDay(atom)
    }
}

impl From<DayOfMonth> for Predicate {
    fn from(atom: DayOfMonth) -> Self {
        Predicate::DayOfMonth(atom)
    }
}

impl From<Month> for Predicate {
    fn from(atom: Month) -> Self {
        Predicate::Month(atom)
    }
}

impl From<HourRange> for Predicate {
    fn from(atom: HourRange) -> Self {
        Predicate::HourRange(atom)
    }
}

// ── Operators, mirroring the rule language ──────────────────────────────────

impl BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Predicate) -> Predicate {
        Predicate::union(self, rhs)
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        Predicate::intersection(self, rhs)
    }
}

impl Sub for Predicate {
    type Output = Predicate;

    fn sub(self, rhs: Predicate) -> Predicate {
        Predicate::difference(self, rhs)
    }
}

impl BitXor for Predicate {
    type Output = Predicate;

    fn bitxor(self, rhs: Predicate) -> Predicate {
        Predicate::symmetric_difference(self, rhs)
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        Predicate::complement(self)
    }
}

/// Renders the tree in rule-language syntax, parenthesizing every binary node.
/// Context flags print as the constant they were bound to.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Always => f.write_str("always"),
            Predicate::Never => f.write_str("never"),
            Predicate::Constant(true) => f.write_str("always"),
            Predicate::Constant(false) => f.write_str("never"),
            Predicate::WeekDay(atom) => write!(f, "{atom}"),
            Predicate::DayOfMonth(atom) => write!(f, "{atom}"),
            Predicate::Month(atom) => write!(f, "{atom}"),
            Predicate::HourRange(atom) => write!(f, "{atom}"),
            Predicate::Union(a, b) => write!(f, "({a} | {b})"),
            Predicate::Intersection(a, b) => write!(f, "({a} & {b})"),
            Predicate::Difference(a, b) => write!(f, "({a} - {b})"),
            Predicate::SymmetricDifference(a, b) => write!(f, "({a} ^ {b})"),
            Predicate::Complement(a) => write!(f, "~{a}"),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use chrono_tz::{Europe, Tz};

    fn paris(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Tz> {
        Europe::Paris
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .single()
            .unwrap()
    }

    fn weekday(day: Weekday) -> Predicate {
        WeekDay::new(day).into()
    }

    fn hours(bh: u32, bm: u32, eh: u32, em: u32) -> Predicate {
        HourRange::from_hm(bh, bm, eh, em).unwrap().into()
    }

    #[test]
    fn test_constants_have_no_candidates() {
        let at = paris(2024, 11, 4, 11, 3, 42);
        for p in [Predicate::Always, Predicate::Never, Predicate::Constant(true)] {
            assert_eq!(p.next_boundary_candidate(&at), None);
        }
        assert!(Predicate::Always.evaluate(&at));
        assert!(!Predicate::Never.evaluate(&at));
        assert!(!Predicate::from(false).evaluate(&at));
    }

    #[test]
    fn test_operators_build_matching_nodes() {
        let mon = weekday(Weekday::Mon);
        let wed = weekday(Weekday::Wed);
        assert!(matches!(mon.clone() | wed.clone(), Predicate::Union(_, _)));
        assert!(matches!(mon.clone() & wed.clone(), Predicate::Intersection(_, _)));
        assert!(matches!(mon.clone() - wed.clone(), Predicate::Difference(_, _)));
        assert!(matches!(
            mon.clone() ^ wed,
            Predicate::SymmetricDifference(_, _)
        ));
        assert!(matches!(!mon, Predicate::Complement(_)));
    }

    #[test]
    fn test_boolean_laws_at_an_instant() {
        let monday = paris(2024, 11, 4, 11, 3, 42);
        let mon = weekday(Weekday::Mon);
        let morning = hours(9, 0, 12, 0);
        let afternoon = hours(13, 0, 18, 0);

        assert!((mon.clone() | afternoon.clone()).evaluate(&monday));
        assert!((mon.clone() & morning.clone()).evaluate(&monday));
        assert!(!(mon.clone() & afternoon.clone()).evaluate(&monday));
        assert!(!(mon.clone() - morning.clone()).evaluate(&monday));
        assert!((mon.clone() - afternoon.clone()).evaluate(&monday));
        assert!(!(mon.clone() ^ morning.clone()).evaluate(&monday));
        assert!((mon ^ afternoon.clone()).evaluate(&monday));
        assert!((!afternoon).evaluate(&monday));
    }

    #[test]
    fn test_candidate_is_earliest_child_candidate() {
        let at = paris(2024, 11, 4, 11, 3, 42);
        let p = weekday(Weekday::Mon) & hours(9, 30, 13, 30);
        assert_eq!(
            p.next_boundary_candidate(&at).unwrap(),
            paris(2024, 11, 4, 13, 30, 0)
        );

        // One side without candidates defers to the other
        let p = Predicate::Always & weekday(Weekday::Mon);
        assert_eq!(
            p.next_boundary_candidate(&at).unwrap(),
            paris(2024, 11, 5, 0, 0, 0)
        );
    }

    #[test]
    fn test_complement_forwards_candidate() {
        let at = paris(2024, 11, 4, 11, 3, 42);
        let inner = hours(11, 0, 12, 0);
        let outer = !inner.clone();
        assert_eq!(
            outer.next_boundary_candidate(&at),
            inner.next_boundary_candidate(&at)
        );
    }

    #[test]
    fn test_shared_subtrees() {
        let shared: Arc<Predicate> = Arc::new(weekday(Weekday::Fri));
        let p = Predicate::union(shared.clone(), Predicate::complement(shared.clone()));
        assert_eq!(Arc::strong_count(&shared), 3);
        assert!(p.evaluate(&paris(2024, 11, 8, 9, 0, 0)));
        assert!(p.evaluate(&paris(2024, 11, 9, 9, 0, 0)));
    }

    #[test]
    fn test_display_round_trips_rule_syntax() {
        let p = (weekday(Weekday::Mon) | weekday(Weekday::Tue)) & !hours(9, 30, 13, 30)
            - Predicate::Always;
        assert_eq!(p.to_string(), "((mon | tue) & (~9:30~13:30 - always))");
    }

    #[test]
    fn test_display_of_context_flags() {
        let p = Predicate::Constant(true) - Predicate::Constant(false);
        assert_eq!(p.to_string(), "(always - never)");
    }

    #[test]
    fn test_tree_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Predicate>();
    }
}
