//! Deadline tracking.
//!
//! Pure derivation of a case's time-based state from its registration
//! timestamp, extension flag, and a caller-supplied `now`. Nothing here
//! touches storage, so every detail view recomputes from scratch.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::CaseRecord;

/// Resolution window without an extension, in days.
pub const BASE_LIMIT_DAYS: i64 = 15;
/// Resolution window once the one-time extension is granted.
pub const EXTENDED_LIMIT_DAYS: i64 = 30;
/// How close to the limit a case turns urgent.
pub const URGENT_WINDOW_DAYS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    OnTime,
    Urgent,
    Overdue,
}

impl DeadlineStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::OnTime => "En tiempo",
            Self::Urgent => "Urgente",
            Self::Overdue => "Vencido",
        }
    }

    /// Presentation hint consumed by the gateway's clients.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::OnTime => "success",
            Self::Urgent => "warning",
            Self::Overdue => "danger",
        }
    }
}

/// Whole days elapsed since registration, floored.
pub fn elapsed_days(registered: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - registered).num_days()
}

pub fn limit_days(extension_granted: bool) -> i64 {
    if extension_granted {
        EXTENDED_LIMIT_DAYS
    } else {
        BASE_LIMIT_DAYS
    }
}

/// Percentage of the window consumed, capped at 100. Total: a zero or
/// negative limit yields 0 instead of dividing by zero.
pub fn progress_percent(elapsed: i64, limit: i64) -> u8 {
    if limit <= 0 {
        return 0;
    }
    let consumed = (elapsed.max(0) * 100) / limit;
    consumed.min(100) as u8
}

/// Thresholds are inclusive: exactly at the limit is overdue, not urgent.
pub fn classify(elapsed: i64, limit: i64) -> DeadlineStatus {
    if elapsed >= limit {
        DeadlineStatus::Overdue
    } else if elapsed >= limit - URGENT_WINDOW_DAYS {
        DeadlineStatus::Urgent
    } else {
        DeadlineStatus::OnTime
    }
}

/// Everything a detail view needs about a case's deadline.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DeadlineReport {
    pub elapsed_days: i64,
    pub limit_days: i64,
    pub progress_percent: u8,
    pub status: DeadlineStatus,
}

impl DeadlineReport {
    pub fn for_case(case: &CaseRecord, now: DateTime<Utc>) -> Self {
        let elapsed = elapsed_days(case.date_registered, now);
        let limit = limit_days(case.extension_granted);
        Self {
            elapsed_days: elapsed,
            limit_days: limit,
            progress_percent: progress_percent(elapsed, limit),
            status: classify(elapsed, limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{
        BASE_LIMIT_DAYS, DeadlineStatus, classify, elapsed_days, limit_days, progress_percent,
    };

    #[test]
    fn elapsed_days_floors_partial_days() {
        let registered = Utc
            .with_ymd_and_hms(2026, 8, 1, 10, 0, 0)
            .single()
            .expect("valid");
        let now = registered + Duration::days(3) + Duration::hours(23);
        assert_eq!(elapsed_days(registered, now), 3);
    }

    #[test]
    fn limit_doubles_once_extended() {
        assert_eq!(limit_days(false), 15);
        assert_eq!(limit_days(true), 30);
    }

    #[test]
    fn progress_floors_and_caps() {
        assert_eq!(progress_percent(7, 15), 46);
        assert_eq!(progress_percent(20, 15), 100);
        assert_eq!(progress_percent(15, 15), 100);
        assert_eq!(progress_percent(0, 15), 0);
    }

    #[test]
    fn progress_is_total_on_degenerate_limits() {
        assert_eq!(progress_percent(10, 0), 0);
        assert_eq!(progress_percent(-2, 15), 0);
    }

    #[test]
    fn classify_boundaries_are_inclusive() {
        assert_eq!(classify(9, BASE_LIMIT_DAYS), DeadlineStatus::OnTime);
        assert_eq!(classify(10, BASE_LIMIT_DAYS), DeadlineStatus::Urgent);
        assert_eq!(classify(14, BASE_LIMIT_DAYS), DeadlineStatus::Urgent);
        assert_eq!(classify(15, BASE_LIMIT_DAYS), DeadlineStatus::Overdue);
        assert_eq!(classify(40, BASE_LIMIT_DAYS), DeadlineStatus::Overdue);
    }

    #[test]
    fn extended_case_stays_on_time_longer() {
        assert_eq!(classify(20, 30), DeadlineStatus::OnTime);
        assert_eq!(classify(25, 30), DeadlineStatus::Urgent);
        assert_eq!(classify(30, 30), DeadlineStatus::Overdue);
    }

    #[test]
    fn future_registration_reads_as_on_time() {
        assert_eq!(classify(-1, BASE_LIMIT_DAYS), DeadlineStatus::OnTime);
        assert_eq!(progress_percent(-1, BASE_LIMIT_DAYS), 0);
    }
}
