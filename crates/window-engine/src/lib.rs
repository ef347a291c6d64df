//! # window-engine
//!
//! Recurring time windows as composable predicates.
//!
//! A window such as "business hours, except public holidays" is a tree of
//! calendar atoms (weekday, day of month, month, daily hour range) combined
//! with boolean operators. For any instant the tree answers two questions:
//! is the window open, and when does that next change. Daily hour ranges are
//! resolved against the zone's clock changes with an explicit, configurable
//! policy, so answers stay correct across DST transitions.
//!
//! Windows are built in code or parsed from a small rule language:
//!
//! ```
//! use std::collections::HashMap;
//! use chrono::TimeZone;
//! use chrono_tz::Europe::Paris;
//!
//! let window = window_engine::parse(
//!     "let work_day be when mon | tue | wed | thu | fri\n\
//!      return (9:30~18:30 & work_day) - (25 & dec)",
//!     &HashMap::new(),
//! )
//! .unwrap();
//!
//! let at = Paris.with_ymd_and_hms(2024, 11, 4, 11, 3, 42).unwrap();
//! assert!(window.evaluate(&at));
//! assert_eq!(
//!     window.next_transition(&at),
//!     Some(Paris.with_ymd_and_hms(2024, 11, 4, 18, 30, 0).unwrap())
//! );
//! ```
//!
//! ## Modules
//!
//! - [`predicate`]: the predicate tree and its boolean operators
//! - [`calendar`]: weekday, day-of-month and month atoms
//! - [`hour_range`]: daily hour ranges and their DST resolution
//! - [`dst`]: boundary pinning and duration policies
//! - [`civil`]: wall-clock readings classified as regular, skipped or repeated
//! - [`search`]: next-transition search
//! - [`parser`]: the rule language
//! - [`window`]: RFC 3339 / IANA string-level queries
//! - [`error`]: error types

pub mod calendar;
pub mod civil;
pub mod dst;
pub mod error;
pub mod hour_range;
pub mod parser;
pub mod predicate;
pub mod search;
pub mod window;

pub use calendar::{DayOfMonth, Month, WeekDay};
pub use civil::CivilTime;
pub use dst::{BoundaryPinning, DurationPolicy};
pub use error::{Result, WindowError};
pub use hour_range::{HourRange, ResolvedInterval};
pub use parser::{parse, parse_with_options, ParseOptions};
pub use predicate::Predicate;
pub use search::{SearchOptions, Transitions};
pub use window::{upcoming_transitions, window_status, Transition, WindowStatus};
