//! String-level queries over a built window.
//!
//! Takes RFC 3339 instants and IANA zone names, returns serializable reports.
//! The predicate is evaluated in the requested zone, so `mon` means Monday
//! *there* regardless of the offset carried by the input string.
//!
//! - [`window_status`]: is the window open now, and when does that change
//! - [`upcoming_transitions`]: the next N changes

use chrono::{DateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{Result, WindowError};
use crate::predicate::Predicate;

/// State of a window at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowStatus {
    /// The queried instant in the target zone (RFC 3339 with offset).
    pub evaluated_at: String,
    /// The IANA zone name the window was evaluated in.
    pub timezone: String,
    /// The zone's UTC offset at `evaluated_at` (e.g. "+01:00").
    pub utc_offset: String,
    /// Whether the window is open at `evaluated_at`.
    pub active: bool,
    /// When `active` next flips, if it ever does.
    pub next_transition: Option<String>,
}

/// One change of a window's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// The instant of the change (RFC 3339 with offset).
    pub at: String,
    /// The value from `at` on.
    pub active: bool,
}

/// Evaluate `window` at `datetime` as seen from `timezone`.
///
/// # Errors
///
/// Returns [`WindowError::InvalidDatetime`] if `datetime` is not RFC 3339, or
/// [`WindowError::InvalidTimezone`] if `timezone` is not an IANA zone name.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use window_engine::{parse, window_status};
///
/// let window = parse("return 9:30~13:30 & mon", &HashMap::new()).unwrap();
/// let status = window_status(&window, "2024-11-04T10:03:42Z", "Europe/Paris").unwrap();
/// assert!(status.active);
/// assert_eq!(status.next_transition.as_deref(), Some("2024-11-04T13:30:00+01:00"));
/// ```
pub fn window_status(window: &Predicate, datetime: &str, timezone: &str) -> Result<WindowStatus> {
    let tz = parse_timezone(timezone)?;
    let at = parse_rfc3339(datetime)?.with_timezone(&tz);

    Ok(WindowStatus {
        evaluated_at: at.to_rfc3339(),
        timezone: timezone.to_string(),
        utc_offset: format_utc_offset(&at),
        active: window.evaluate(&at),
        next_transition: window.next_transition(&at).map(|t| t.to_rfc3339()),
    })
}

/// The next `count` transitions of `window` after `datetime`, as seen from
/// `timezone`. Fewer are returned if the window stops changing.
///
/// # Errors
///
/// Same as [`window_status`].
pub fn upcoming_transitions(
    window: &Predicate,
    datetime: &str,
    timezone: &str,
    count: usize,
) -> Result<Vec<Transition>> {
    let tz = parse_timezone(timezone)?;
    let at = parse_rfc3339(datetime)?.with_timezone(&tz);

    Ok(window
        .transitions(&at)
        .take(count)
        .map(|(at, active)| Transition {
            at: at.to_rfc3339(),
            active,
        })
        .collect())
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// Parse an RFC 3339 datetime string into `DateTime<Utc>`.
fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| WindowError::InvalidDatetime(format!("'{s}': {e}")))
}

/// Parse an IANA timezone string into `Tz`.
fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| WindowError::InvalidTimezone(format!("'{s}'")))
}

fn format_utc_offset<T: TimeZone>(dt: &DateTime<T>) -> String {
    let offset_secs = dt.offset().fix().local_minus_utc();
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    format!("{sign}{:02}:{:02}", abs_secs / 3600, (abs_secs % 3600) / 60)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekDay;
    use crate::hour_range::HourRange;
    use chrono::Weekday;

    fn office_hours() -> Predicate {
        Predicate::from(HourRange::from_hm(9, 30, 13, 30).unwrap())
            & Predicate::from(WeekDay::new(Weekday::Mon))
    }

    #[test]
    fn test_status_in_target_zone() {
        let status = window_status(&office_hours(), "2024-11-04T10:03:42Z", "Europe/Paris").unwrap();
        assert_eq!(status.evaluated_at, "2024-11-04T11:03:42+01:00");
        assert_eq!(status.timezone, "Europe/Paris");
        assert_eq!(status.utc_offset, "+01:00");
        assert!(status.active);
        assert_eq!(
            status.next_transition.as_deref(),
            Some("2024-11-04T13:30:00+01:00")
        );
    }

    #[test]
    fn test_input_offset_does_not_pick_the_zone() {
        // 02:00 on Tuesday in Tokyo is still Monday evening in New York
        let status = window_status(
            &Predicate::from(WeekDay::new(Weekday::Mon)),
            "2024-11-05T02:00:00+09:00",
            "America/New_York",
        )
        .unwrap();
        assert!(status.active);
        assert_eq!(status.evaluated_at, "2024-11-04T12:00:00-05:00");
        assert_eq!(status.utc_offset, "-05:00");
        assert_eq!(
            status.next_transition.as_deref(),
            Some("2024-11-05T00:00:00-05:00")
        );
    }

    #[test]
    fn test_constant_window_has_no_transition() {
        let status = window_status(&Predicate::Always, "2024-11-04T10:00:00Z", "UTC").unwrap();
        assert!(status.active);
        assert_eq!(status.next_transition, None);
    }

    #[test]
    fn test_upcoming_transitions_alternate() {
        let transitions =
            upcoming_transitions(&office_hours(), "2024-11-04T06:00:00Z", "Europe/Paris", 4)
                .unwrap();
        assert_eq!(
            transitions,
            vec![
                Transition {
                    at: "2024-11-04T09:30:00+01:00".to_string(),
                    active: true,
                },
                Transition {
                    at: "2024-11-04T13:30:00+01:00".to_string(),
                    active: false,
                },
                Transition {
                    at: "2024-11-11T09:30:00+01:00".to_string(),
                    active: true,
                },
                Transition {
                    at: "2024-11-11T13:30:00+01:00".to_string(),
                    active: false,
                },
            ]
        );
    }

    #[test]
    fn test_upcoming_transitions_of_constant_is_empty() {
        let transitions = upcoming_transitions(&Predicate::Never, "2024-11-04T06:00:00Z", "UTC", 3)
            .unwrap();
        assert!(transitions.is_empty());
    }

    #[test]
    fn test_invalid_inputs() {
        let window = office_hours();
        assert!(matches!(
            window_status(&window, "yesterday", "UTC"),
            Err(WindowError::InvalidDatetime(_))
        ));
        assert!(matches!(
            window_status(&window, "2024-11-04T10:00:00Z", "Mars/Olympus_Mons"),
            Err(WindowError::InvalidTimezone(_))
        ));
        assert!(matches!(
            upcoming_transitions(&window, "2024-11-04", "UTC", 1),
            Err(WindowError::InvalidDatetime(_))
        ));
    }

    #[test]
    fn test_status_serializes_to_json() {
        let status = window_status(&office_hours(), "2024-11-04T14:00:00Z", "Europe/Paris").unwrap();
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["active"], false);
        assert_eq!(json["timezone"], "Europe/Paris");
        assert_eq!(json["next_transition"], "2024-11-11T09:30:00+01:00");
    }
}
