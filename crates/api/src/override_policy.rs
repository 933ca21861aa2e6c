// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Override reason policy.
//!
//! A locked-period override is recorded in the audit trail, so the
//! reason has to be substantial enough to be useful to whoever reviews
//! it later. The engine only requires a non-empty reason; this policy
//! is the API boundary's stricter gate.

use thiserror::Error;

/// Override reason policy errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverridePolicyError {
    /// No reason was supplied with the override flag.
    #[error("An override reason is required when overriding a locked period")]
    Missing,

    /// The reason is too short to be a useful audit entry.
    #[error("Override reason must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    /// The reason exceeds the stored column length.
    #[error("Override reason must be at most {max_length} characters long")]
    TooLong { max_length: usize },
}

/// Override reason policy configuration.
pub struct OverridePolicy {
    /// Minimum reason length, in characters.
    pub min_length: usize,
    /// Maximum reason length, in characters.
    pub max_length: usize,
}

impl Default for OverridePolicy {
    fn default() -> Self {
        Self {
            min_length: 10,
            max_length: 500,
        }
    }
}

impl OverridePolicy {
    /// Validates an override reason against the policy.
    ///
    /// # Errors
    ///
    /// Returns an `OverridePolicyError` if the reason is absent, too
    /// short after trimming, or too long.
    pub fn validate(&self, reason: Option<&str>) -> Result<(), OverridePolicyError> {
        let trimmed: &str = reason.map_or("", str::trim);
        if trimmed.is_empty() {
            return Err(OverridePolicyError::Missing);
        }
        let length: usize = trimmed.chars().count();
        if length < self.min_length {
            return Err(OverridePolicyError::TooShort {
                min_length: self.min_length,
            });
        }
        if length > self.max_length {
            return Err(OverridePolicyError::TooLong {
                max_length: self.max_length,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_reason_rejected() {
        let policy = OverridePolicy::default();
        assert_eq!(policy.validate(None), Err(OverridePolicyError::Missing));
        assert_eq!(
            policy.validate(Some("   ")),
            Err(OverridePolicyError::Missing)
        );
    }

    #[test]
    fn test_short_reason_rejected() {
        let policy = OverridePolicy::default();
        assert_eq!(
            policy.validate(Some("too short")),
            Err(OverridePolicyError::TooShort { min_length: 10 })
        );
    }

    #[test]
    fn test_long_reason_rejected() {
        let policy = OverridePolicy::default();
        let reason: String = "x".repeat(501);
        assert_eq!(
            policy.validate(Some(&reason)),
            Err(OverridePolicyError::TooLong { max_length: 500 })
        );
    }

    #[test]
    fn test_reasonable_reason_accepted() {
        let policy = OverridePolicy::default();
        assert_eq!(
            policy.validate(Some("Client moved the visit to Thursday")),
            Ok(())
        );
    }

    #[test]
    fn test_trimmed_length_is_what_counts() {
        let policy = OverridePolicy::default();
        assert_eq!(
            policy.validate(Some("  late swap  ")),
            Err(OverridePolicyError::TooShort { min_length: 10 })
        );
    }
}
