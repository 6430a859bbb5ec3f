//! Incremental request windows
//!
//! Insight history is only retained for `buffer_days`, and the most recent
//! `latency_offset_days` are not finalized yet. A window therefore always
//! ends at `today - latency_offset_days` and never starts before
//! `today - buffer_days`, whatever the stored bookmark says.

use crate::error::{Error, Result};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

/// Window limits, from config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    /// Oldest day the API still serves, counted back from today
    pub buffer_days: u32,
    /// Days before insight values are final
    pub latency_offset_days: u32,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            buffer_days: 30,
            latency_offset_days: 1,
        }
    }
}

/// How the lower bound of a window was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStart {
    /// First run: default backfill window
    NoBookmark,
    /// Continued from the stored bookmark
    Resumed,
    /// Stored bookmark was older than the horizon
    Clamped,
}

/// An inclusive date window to request insights for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// Lower bound
    pub since: NaiveDate,
    /// Upper bound
    pub until: NaiveDate,
    /// How `since` was chosen
    pub start: WindowStart,
    /// Bookmark the window was built from
    pub previous: Option<NaiveDate>,
}

impl DateWindow {
    /// Bookmark to store once the whole window has been read.
    ///
    /// This is the window's upper bound, not the newest record date. It never
    /// moves behind the bookmark the window was built from.
    pub fn next_bookmark(&self) -> NaiveDate {
        match self.previous {
            Some(previous) if previous > self.until => previous,
            _ => self.until,
        }
    }

    /// `next_bookmark` in its stored form
    pub fn next_bookmark_value(&self) -> String {
        self.next_bookmark().format("%Y-%m-%d").to_string()
    }
}

/// Compute the request window for an incremental stream
pub fn build_range(
    bookmark: Option<&str>,
    today: NaiveDate,
    policy: &WindowPolicy,
) -> Result<DateWindow> {
    let horizon = days_before(today, policy.buffer_days)?;
    let until = days_before(today, policy.latency_offset_days)?;

    let previous = bookmark.map(parse_bookmark_date).transpose()?;

    let (since, start) = match previous {
        None => {
            info!(
                buffer_days = policy.buffer_days,
                "No bookmark, getting insight data since {horizon}"
            );
            (horizon, WindowStart::NoBookmark)
        }
        Some(date) if date < horizon => {
            warn!(
                bookmark = %date,
                buffer_days = policy.buffer_days,
                "Start date is earlier than {} days from today, force using {horizon}",
                policy.buffer_days
            );
            (horizon, WindowStart::Clamped)
        }
        Some(date) => {
            info!(bookmark = %date, "Resuming from bookmark");
            (date, WindowStart::Resumed)
        }
    };

    Ok(DateWindow {
        since: since.min(until),
        until,
        start,
        previous,
    })
}

/// Parse a stored bookmark.
///
/// Accepts `YYYY-MM-DD`, RFC 3339, Graph API timestamps
/// (`2023-01-10T08:00:00+0000`) and `YYYY-MM-DD HH:MM:SS`.
pub fn parse_bookmark_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc().date());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z") {
        return Ok(dt.naive_utc().date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }

    Err(Error::state(format!("Invalid bookmark date: '{value}'")))
}

fn days_before(today: NaiveDate, days: u32) -> Result<NaiveDate> {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .ok_or_else(|| Error::state(format!("Cannot go back {days} days from {today}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_no_bookmark_uses_default_window() {
        let window = build_range(None, date("2023-02-01"), &WindowPolicy::default()).unwrap();

        assert_eq!(window.start, WindowStart::NoBookmark);
        assert_eq!(window.since, date("2023-01-02"));
        assert_eq!(window.until, date("2023-01-31"));
        assert_eq!(window.next_bookmark_value(), "2023-01-31");
    }

    #[test]
    fn test_recent_bookmark_is_resumed() {
        let window = build_range(
            Some("2023-01-10"),
            date("2023-02-01"),
            &WindowPolicy::default(),
        )
        .unwrap();

        assert_eq!(window.start, WindowStart::Resumed);
        assert_eq!(window.since, date("2023-01-10"));
        assert_eq!(window.until, date("2023-01-31"));
        assert_eq!(window.next_bookmark_value(), "2023-01-31");
    }

    #[test]
    fn test_old_bookmark_is_clamped_to_horizon() {
        let window = build_range(
            Some("2022-06-01"),
            date("2023-02-01"),
            &WindowPolicy::default(),
        )
        .unwrap();

        assert_eq!(window.start, WindowStart::Clamped);
        assert_eq!(window.since, date("2023-01-02"));
    }

    #[test]
    fn test_bookmark_on_horizon_is_not_clamped() {
        let window = build_range(
            Some("2023-01-02"),
            date("2023-02-01"),
            &WindowPolicy::default(),
        )
        .unwrap();

        assert_eq!(window.start, WindowStart::Resumed);
        assert_eq!(window.since, date("2023-01-02"));
    }

    #[test]
    fn test_future_bookmark_never_inverts_window() {
        let window = build_range(
            Some("2023-03-01"),
            date("2023-02-01"),
            &WindowPolicy::default(),
        )
        .unwrap();

        assert!(window.since <= window.until);
        assert_eq!(window.since, window.until);
        // Bookmarks never move backwards
        assert_eq!(window.next_bookmark(), date("2023-03-01"));
    }

    #[test]
    fn test_latency_larger_than_buffer_never_inverts_window() {
        let policy = WindowPolicy {
            buffer_days: 2,
            latency_offset_days: 5,
        };
        for bookmark in [None, Some("2023-01-01"), Some("2023-01-31")] {
            let window = build_range(bookmark, date("2023-02-01"), &policy).unwrap();
            assert!(window.since <= window.until, "{bookmark:?}");
            assert_eq!(window.until, date("2023-01-27"));
        }
    }

    #[test]
    fn test_bookmark_formats() {
        let expected = date("2023-01-10");
        for value in [
            "2023-01-10",
            "2023-01-10T08:00:00+00:00",
            "2023-01-10T08:00:00Z",
            "2023-01-10T08:00:00+0000",
            "2023-01-10 00:00:00",
        ] {
            assert_eq!(parse_bookmark_date(value).unwrap(), expected, "{value}");
        }
    }

    #[test]
    fn test_invalid_bookmark_is_an_error() {
        let err = build_range(
            Some("last tuesday"),
            date("2023-02-01"),
            &WindowPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::State { .. }));
    }
}
