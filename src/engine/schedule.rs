//! Checkpoint schedule.
//!
//! Walks a date range in fixed 7-day steps, alternating between income
//! and bill checkpoints and always starting on income.

use chrono::{Duration, NaiveDate};
use std::fmt;

/// Days between consecutive checkpoints.
pub const STEP_DAYS: i64 = 7;

/// Which handler a checkpoint runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Income,
    Bill,
}

impl Phase {
    /// Phase of the following checkpoint.
    pub fn next(self) -> Self {
        match self {
            Phase::Income => Phase::Bill,
            Phase::Bill => Phase::Income,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Income => write!(f, "income"),
            Phase::Bill => write!(f, "bill"),
        }
    }
}

/// A single scheduled event date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub date: NaiveDate,
    pub phase: Phase,
}

/// Iterator over the checkpoints in `[start, end]`.
#[derive(Debug, Clone)]
pub struct Schedule {
    next: Option<Checkpoint>,
    end: NaiveDate,
}

impl Schedule {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            next: Some(Checkpoint { date: start, phase: Phase::Income }),
            end,
        }
    }
}

impl Iterator for Schedule {
    type Item = Checkpoint;

    fn next(&mut self) -> Option<Checkpoint> {
        let current = self.next.take()?;
        if current.date > self.end {
            return None;
        }
        self.next = current
            .date
            .checked_add_signed(Duration::days(STEP_DAYS))
            .map(|date| Checkpoint { date, phase: current.phase.next() });
        Some(current)
    }
}
