//! Urgency classification for a card's received/start/due/end dates.
//!
//! Every rule is a pure function of `now` and the card's dates. Nothing is
//! stored: the board recomputes statuses each time it draws, and the UI loop
//! refreshes `now` on a timer so badges age without user input.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overdue by at least this many days turns a due date `long-overdue`.
pub const LONG_OVERDUE_DAYS: i64 = 2;

/// Due within this many days turns a due date `almost-due`.
pub const ALMOST_DUE_DAYS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateStatus {
    Future,
    Current,
    Due,
    AlmostDue,
    LongOverdue,
    Early,
    Overdue,
    /// Present date that deliberately carries no urgency flag.
    None,
}

impl DateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DateStatus::Future => "future",
            DateStatus::Current => "current",
            DateStatus::Due => "due",
            DateStatus::AlmostDue => "almost-due",
            DateStatus::LongOverdue => "long-overdue",
            DateStatus::Early => "early",
            DateStatus::Overdue => "overdue",
            DateStatus::None => "none",
        }
    }
}

impl fmt::Display for DateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four optional instants a card can carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDates {
    pub received_at: Option<DateTime<Utc>>,
    pub start_at: Option<DateTime<Utc>>,
    pub due_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

/// One status per date field; `None` when the field is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateStatuses {
    pub received: Option<DateStatus>,
    pub start: Option<DateStatus>,
    pub due: Option<DateStatus>,
    pub end: Option<DateStatus>,
}

pub fn received_status(now: DateTime<Utc>, received_at: DateTime<Utc>) -> DateStatus {
    if received_at > now {
        DateStatus::Future
    } else {
        DateStatus::Current
    }
}

/// A start after the due or end date is flagged before the `future` check.
pub fn start_status(
    now: DateTime<Utc>,
    start_at: DateTime<Utc>,
    due_at: Option<DateTime<Utc>>,
    end_at: Option<DateTime<Utc>>,
) -> DateStatus {
    let after_end = end_at.is_some_and(|end| start_at > end);
    let after_due = due_at.is_some_and(|due| start_at > due);
    if after_end || after_due {
        DateStatus::LongOverdue
    } else if start_at > now {
        DateStatus::Future
    } else {
        DateStatus::Current
    }
}

/// Once a card has an end date its due date is no longer urgent: it reads
/// `current` when the work finished before the deadline and carries no flag
/// otherwise.
pub fn due_status(
    now: DateTime<Utc>,
    due_at: DateTime<Utc>,
    end_at: Option<DateTime<Utc>>,
) -> DateStatus {
    if let Some(end) = end_at {
        return if end < due_at {
            DateStatus::Current
        } else {
            DateStatus::None
        };
    }

    let elapsed = now - due_at;
    if elapsed >= Duration::days(LONG_OVERDUE_DAYS) {
        DateStatus::LongOverdue
    } else if elapsed >= Duration::zero() {
        DateStatus::Due
    } else if elapsed >= -Duration::days(ALMOST_DUE_DAYS) {
        DateStatus::AlmostDue
    } else {
        DateStatus::None
    }
}

pub fn end_status(
    end_at: DateTime<Utc>,
    start_at: Option<DateTime<Utc>>,
    due_at: Option<DateTime<Utc>>,
) -> DateStatus {
    if start_at.is_some_and(|start| end_at < start) {
        return DateStatus::Early;
    }
    match due_at {
        Some(due) if end_at < due => DateStatus::Early,
        Some(due) if end_at > due => DateStatus::Overdue,
        _ => DateStatus::Current,
    }
}

pub fn classify(now: DateTime<Utc>, dates: &CardDates) -> DateStatuses {
    DateStatuses {
        received: dates.received_at.map(|at| received_status(now, at)),
        start: dates
            .start_at
            .map(|at| start_status(now, at, dates.due_at, dates.end_at)),
        due: dates.due_at.map(|at| due_status(now, at, dates.end_at)),
        end: dates
            .end_at
            .map(|at| end_status(at, dates.start_at, dates.due_at)),
    }
}
