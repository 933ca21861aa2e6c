// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Scheduled time windows and overlap arithmetic.
//!
//! Windows are stored as minutes since midnight with an exclusive end.
//! An end of 1440 means the window runs to midnight.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// Minimum gap between back-to-back assignments before a travel-buffer
/// warning is raised.
pub const TRAVEL_BUFFER_MINUTES: u16 = 30;

/// Minutes in a day; the maximum exclusive end of a window.
const MINUTES_PER_DAY: u16 = 1440;

/// A same-day scheduled time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeWindow {
    start_min: u16,
    end_min: u16,
}

impl TimeWindow {
    /// Creates a window from minutes since midnight.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTimeWindow` if `start_min >= end_min`
    /// or `end_min` exceeds 1440.
    pub const fn new(start_min: u16, end_min: u16) -> Result<Self, DomainError> {
        if start_min >= end_min || end_min > MINUTES_PER_DAY {
            return Err(DomainError::InvalidTimeWindow { start_min, end_min });
        }
        Ok(Self { start_min, end_min })
    }

    /// Creates a window from wall-clock times.
    ///
    /// An end time of exactly midnight is treated as the end of the day.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTimeWindow` if the resulting window is empty.
    pub fn from_times(start: time::Time, end: time::Time) -> Result<Self, DomainError> {
        let start_min: u16 = u16::from(start.hour()) * 60 + u16::from(start.minute());
        let end_min: u16 = if end == time::Time::MIDNIGHT {
            MINUTES_PER_DAY
        } else {
            u16::from(end.hour()) * 60 + u16::from(end.minute())
        };
        Self::new(start_min, end_min)
    }

    /// Start of the window in minutes since midnight.
    #[must_use]
    pub const fn start_min(&self) -> u16 {
        self.start_min
    }

    /// Exclusive end of the window in minutes since midnight.
    #[must_use]
    pub const fn end_min(&self) -> u16 {
        self.end_min
    }

    /// Returns true if the two windows share at least one minute.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start_min < other.end_min && other.start_min < self.end_min
    }

    /// Gap in minutes between two non-overlapping windows.
    ///
    /// Returns `None` when the windows overlap.
    #[must_use]
    pub const fn gap_minutes(&self, other: &Self) -> Option<u16> {
        if self.overlaps(other) {
            return None;
        }
        if self.end_min <= other.start_min {
            Some(other.start_min - self.end_min)
        } else {
            Some(self.start_min - other.end_min)
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start_min / 60,
            self.start_min % 60,
            self.end_min / 60,
            self.end_min % 60
        )
    }
}
