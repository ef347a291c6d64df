//! Laws every window must obey, checked over random trees, zones and instants.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use proptest::prelude::*;
use window_engine::{
    BoundaryPinning, DayOfMonth, DurationPolicy, HourRange, Month, Predicate, SearchOptions,
    WeekDay,
};

// 2020-01-01T00:00:00Z .. 2030-01-01T00:00:00Z
const FIRST_SECOND: i64 = 1_577_836_800;
const LAST_SECOND: i64 = 1_893_456_000;

fn options() -> SearchOptions {
    SearchOptions::with_horizon(Duration::days(60))
}

// ── Strategies ──────────────────────────────────────────────────────────────

fn zone() -> impl Strategy<Value = Tz> {
    prop::sample::select(vec![
        chrono_tz::Europe::Paris,
        chrono_tz::America::New_York,
        chrono_tz::Australia::Lord_Howe,
        chrono_tz::UTC,
    ])
}

fn instant() -> impl Strategy<Value = DateTime<Tz>> {
    (zone(), FIRST_SECOND..LAST_SECOND)
        .prop_map(|(tz, secs)| Utc.timestamp_opt(secs, 0).unwrap().with_timezone(&tz))
}

fn weekday() -> impl Strategy<Value = Weekday> {
    prop::sample::select(vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ])
}

fn minute_of_day(minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap()
}

fn hour_range() -> impl Strategy<Value = HourRange> {
    let bounds = (0u32..1439).prop_flat_map(|begin| (Just(begin), (begin + 1)..1440));
    let pinning = prop::sample::select(vec![BoundaryPinning::PinStart, BoundaryPinning::PinEnd]);
    let duration = prop::sample::select(vec![
        DurationPolicy::PreserveCivilTime,
        DurationPolicy::PreserveDuration,
    ]);
    (bounds, pinning, duration).prop_map(|((begin, end), pinning, duration)| {
        HourRange::new(minute_of_day(begin), minute_of_day(end))
            .unwrap()
            .with_pinning(pinning)
            .with_duration_policy(duration)
    })
}

fn leaf() -> impl Strategy<Value = Predicate> {
    prop_oneof![
        Just(Predicate::Always),
        Just(Predicate::Never),
        weekday().prop_map(|day| WeekDay::new(day).into()),
        (1u32..=31).prop_map(|day| DayOfMonth::new(day).unwrap().into()),
        (1u32..=12).prop_map(|month| Month::from_number(month).unwrap().into()),
        hour_range().prop_map(Predicate::from),
        hour_range().prop_map(Predicate::from),
    ]
}

fn predicate() -> impl Strategy<Value = Predicate> {
    leaf().prop_recursive(3, 12, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a | b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a & b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a - b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a ^ b),
            inner.prop_map(|a| !a),
        ]
    })
}

// ── Laws ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn transition_flips_value_and_nothing_changes_before_it(
        window in predicate(),
        at in instant(),
    ) {
        let before = window.evaluate(&at);
        match window.next_transition_with_options(&at, &options()) {
            Some(next) => {
                prop_assert!(next > at);
                prop_assert_ne!(window.evaluate(&next), before);
                let step = (next.clone() - at.clone()) / 8;
                for k in 1..8 {
                    let sample = at.clone() + step * k;
                    prop_assert_eq!(window.evaluate(&sample), before, "changed at {}", sample);
                }
                prop_assert_ne!(
                    window.next_transition_with_options(&next, &options()),
                    Some(next.clone())
                );
            }
            None => {
                let step = options().horizon / 16;
                for k in 1..16 {
                    let sample = at.clone() + step * k;
                    prop_assert_eq!(window.evaluate(&sample), before, "changed at {}", sample);
                }
            }
        }
    }

    #[test]
    fn successive_transitions_alternate(window in predicate(), at in instant()) {
        let mut value = window.evaluate(&at);
        let mut previous = at.clone();
        for (next, active) in window.transitions_with_options(&at, options()).take(4) {
            prop_assert!(next > previous);
            prop_assert_ne!(active, value);
            prop_assert_eq!(active, window.evaluate(&next));
            value = active;
            previous = next;
        }
    }

    #[test]
    fn complement_negates_and_shares_transitions(window in predicate(), at in instant()) {
        let negated = !window.clone();
        prop_assert_eq!(negated.evaluate(&at), !window.evaluate(&at));
        prop_assert_eq!(
            negated.next_transition_with_options(&at, &options()),
            window.next_transition_with_options(&at, &options())
        );
    }

    #[test]
    fn combinators_follow_boolean_algebra(
        a in predicate(),
        b in predicate(),
        at in instant(),
    ) {
        let (x, y) = (a.evaluate(&at), b.evaluate(&at));
        prop_assert_eq!((a.clone() | b.clone()).evaluate(&at), x || y);
        prop_assert_eq!((a.clone() & b.clone()).evaluate(&at), x && y);
        prop_assert_eq!((a.clone() - b.clone()).evaluate(&at), x && !y);
        prop_assert_eq!((a.clone() ^ b.clone()).evaluate(&at), x != y);
        prop_assert_eq!(
            (a.clone() - b.clone()).evaluate(&at),
            (a.clone() & !b.clone()).evaluate(&at)
        );
        prop_assert_eq!((!(a.clone() | b.clone())).evaluate(&at), (!a & !b).evaluate(&at));
    }

    #[test]
    fn self_symmetric_difference_never_holds(window in predicate(), at in instant()) {
        let empty = window.clone() ^ window;
        prop_assert!(!empty.evaluate(&at));
        prop_assert_eq!(empty.next_transition_with_options(&at, &options()), None);
    }

    #[test]
    fn weekday_depends_only_on_local_date(day in weekday(), at in instant()) {
        let window = Predicate::from(WeekDay::new(day));
        prop_assert_eq!(window.evaluate(&at), at.weekday() == day);
    }

    #[test]
    fn preserved_duration_is_nominal(
        range in hour_range(),
        tz in zone(),
        offset in 0i64..3653,
    ) {
        let range = range.with_duration_policy(DurationPolicy::PreserveDuration);
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Duration::days(offset);
        let interval = range.resolve(&tz, date);
        prop_assert_eq!(interval.end - interval.begin, range.nominal_duration());
    }
}

// ── Clock changes ───────────────────────────────────────────────────────────

/// The nights around every Paris clock change from 2020 to 2029, for every
/// policy pair, obey the same transition law as random instants do.
#[test]
fn paris_clock_change_nights_are_consistent() {
    let tz = chrono_tz::Europe::Paris;
    let ranges = [(1, 30, 3, 30), (1, 30, 2, 30), (2, 30, 4, 30), (2, 15, 2, 45)];
    let policies = [
        (BoundaryPinning::PinStart, DurationPolicy::PreserveCivilTime),
        (BoundaryPinning::PinEnd, DurationPolicy::PreserveCivilTime),
        (BoundaryPinning::PinStart, DurationPolicy::PreserveDuration),
        (BoundaryPinning::PinEnd, DurationPolicy::PreserveDuration),
    ];

    for year in 2020..2030 {
        for month in [3, 10] {
            // Last Sunday of the month
            let last = NaiveDate::from_ymd_opt(year, month, 31).unwrap();
            let sunday = last - Duration::days(last.weekday().num_days_from_sunday().into());
            let evening = tz
                .from_local_datetime(&sunday.pred_opt().unwrap().and_hms_opt(20, 0, 0).unwrap())
                .single()
                .unwrap();

            for &(bh, bm, eh, em) in &ranges {
                for &(pinning, duration) in &policies {
                    let window = Predicate::from(
                        HourRange::from_hm(bh, bm, eh, em)
                            .unwrap()
                            .with_pinning(pinning)
                            .with_duration_policy(duration),
                    );
                    let mut value = window.evaluate(&evening);
                    let mut previous = evening;
                    for (next, active) in window.transitions_with_options(&evening, options()).take(4) {
                        assert!(next > previous, "{window} {pinning} {duration} on {sunday}");
                        assert_ne!(active, value, "{window} {pinning} {duration} at {next}");
                        let mid = previous + (next - previous) / 2;
                        assert_eq!(
                            window.evaluate(&mid),
                            value,
                            "{window} {pinning} {duration} at {mid}"
                        );
                        value = active;
                        previous = next;
                    }
                }
            }
        }
    }
}
