// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Staff availability rules.
//!
//! Rules are read-only input to the conflict detector. A rule either
//! recurs weekly inside a validity range or covers a one-off date span.

use crate::error::DomainError;
use crate::time_window::TimeWindow;
use crate::types::{RuleId, StaffId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, Weekday};

/// What a matching rule says about the staff member's availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityType {
    /// The staff member cannot work the window. Blocking.
    Unavailable,
    /// The staff member prefers this window. Informational.
    Preferred,
    /// The staff member would rather not work the window. Warning.
    NotPreferred,
}

impl AvailabilityType {
    /// Returns the string representation of the availability type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable => "UNAVAILABLE",
            Self::Preferred => "PREFERRED",
            Self::NotPreferred => "NOT_PREFERRED",
        }
    }
}

impl FromStr for AvailabilityType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNAVAILABLE" => Ok(Self::Unavailable),
            "PREFERRED" => Ok(Self::Preferred),
            "NOT_PREFERRED" => Ok(Self::NotPreferred),
            _ => Err(DomainError::InvalidAvailabilityType(s.to_string())),
        }
    }
}

impl std::fmt::Display for AvailabilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// When an availability rule applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "rule_type")]
pub enum RuleKind {
    /// Recurs on one weekday within the rule's validity range.
    WeeklyRecurring {
        /// The weekday the rule recurs on.
        weekday: Weekday,
        /// The covered time window.
        window: TimeWindow,
    },
    /// Covers every time window in an inclusive date span.
    OneOff {
        /// First covered date.
        from: Date,
        /// Last covered date.
        to: Date,
    },
}

/// A single staff availability rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    /// The rule identifier.
    pub id: RuleId,
    /// The staff member the rule is about.
    pub staff_id: StaffId,
    /// When the rule applies.
    pub kind: RuleKind,
    /// What the rule says when it applies.
    pub availability: AvailabilityType,
    /// Free-text context for supervisors.
    pub notes: Option<String>,
}

impl AvailabilityRule {
    /// Returns true if this rule covers the given date and window.
    #[must_use]
    pub fn applies_to(&self, date: Date, window: &TimeWindow) -> bool {
        match &self.kind {
            RuleKind::WeeklyRecurring {
                weekday,
                window: rule_window,
            } => date.weekday() == *weekday && rule_window.overlaps(window),
            RuleKind::OneOff { from, to } => *from <= date && date <= *to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn date(year: i32, month: Month, day: u8) -> Date {
        match Date::from_calendar_date(year, month, day) {
            Ok(d) => d,
            Err(e) => panic!("valid date: {e}"),
        }
    }

    fn window(start: u16, end: u16) -> TimeWindow {
        match TimeWindow::new(start, end) {
            Ok(w) => w,
            Err(e) => panic!("valid window: {e}"),
        }
    }

    fn weekly_rule(weekday: Weekday, start: u16, end: u16) -> AvailabilityRule {
        AvailabilityRule {
            id: RuleId::new(1),
            staff_id: StaffId::new(1),
            kind: RuleKind::WeeklyRecurring {
                weekday,
                window: window(start, end),
            },
            availability: AvailabilityType::Unavailable,
            notes: None,
        }
    }

    #[test]
    fn test_weekly_rule_matches_weekday_and_window() {
        // 2026-03-02 is a Monday
        let rule = weekly_rule(Weekday::Monday, 1080, 1320);
        assert!(rule.applies_to(date(2026, Month::March, 2), &window(1200, 1260)));
    }

    #[test]
    fn test_weekly_rule_ignores_other_weekdays() {
        let rule = weekly_rule(Weekday::Monday, 1080, 1320);
        assert!(!rule.applies_to(date(2026, Month::March, 3), &window(1200, 1260)));
    }

    #[test]
    fn test_weekly_rule_ignores_disjoint_window() {
        let rule = weekly_rule(Weekday::Monday, 1080, 1320);
        assert!(!rule.applies_to(date(2026, Month::March, 2), &window(480, 600)));
    }

    #[test]
    fn test_one_off_rule_covers_inclusive_span() {
        let rule = AvailabilityRule {
            id: RuleId::new(2),
            staff_id: StaffId::new(1),
            kind: RuleKind::OneOff {
                from: date(2026, Month::March, 2),
                to: date(2026, Month::March, 4),
            },
            availability: AvailabilityType::Unavailable,
            notes: Some(String::from("out of town")),
        };
        assert!(rule.applies_to(date(2026, Month::March, 2), &window(600, 700)));
        assert!(rule.applies_to(date(2026, Month::March, 4), &window(600, 700)));
        assert!(!rule.applies_to(date(2026, Month::March, 5), &window(600, 700)));
    }
}
