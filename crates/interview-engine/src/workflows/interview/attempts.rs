use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::DailyAttempts;

pub const DEFAULT_MAX_WARNINGS: u32 = 3;

/// Ceiling on sessions started per calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyLimit {
    #[default]
    Unlimited,
    PerDay(u32),
}

impl DailyLimit {
    pub fn allows(self, count: u32) -> bool {
        match self {
            DailyLimit::Unlimited => true,
            DailyLimit::PerDay(ceiling) => count < ceiling,
        }
    }
}

impl fmt::Display for DailyLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DailyLimit::Unlimited => f.write_str("unlimited"),
            DailyLimit::PerDay(ceiling) => write!(f, "{ceiling}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("daily limit must be 'unlimited' or a non-negative integer")]
pub struct ParseDailyLimitError;

impl FromStr for DailyLimit {
    type Err = ParseDailyLimitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("unlimited") {
            return Ok(DailyLimit::Unlimited);
        }
        trimmed
            .parse::<u32>()
            .map(DailyLimit::PerDay)
            .map_err(|_| ParseDailyLimitError)
    }
}

/// Result of a focus-loss signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningOutcome {
    pub warnings: u32,
    pub notice: Option<String>,
}

/// Daily attempt accounting and the session warning threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPolicy {
    daily_limit: DailyLimit,
    max_warnings: u32,
}

impl Default for AttemptPolicy {
    fn default() -> Self {
        Self::new(DailyLimit::Unlimited, DEFAULT_MAX_WARNINGS)
    }
}

impl AttemptPolicy {
    pub fn new(daily_limit: DailyLimit, max_warnings: u32) -> Self {
        Self {
            daily_limit,
            max_warnings: max_warnings.max(1),
        }
    }

    pub fn daily_limit(&self) -> DailyLimit {
        self.daily_limit
    }

    pub fn max_warnings(&self) -> u32 {
        self.max_warnings
    }

    /// Roll the counter over when it belongs to another day.
    pub fn refresh(&self, attempts: DailyAttempts, today: NaiveDate) -> DailyAttempts {
        if attempts.date == today {
            attempts
        } else {
            DailyAttempts::fresh(today)
        }
    }

    /// Whether a new session may start today. Rollover is applied before the ceiling check.
    pub fn can_start(&self, attempts: DailyAttempts, today: NaiveDate) -> bool {
        self.daily_limit.allows(self.refresh(attempts, today).count)
    }

    pub fn record_attempt(&self, attempts: DailyAttempts, today: NaiveDate) -> DailyAttempts {
        let current = self.refresh(attempts, today);
        DailyAttempts {
            count: current.count.saturating_add(1),
            date: today,
        }
    }

    pub fn limit_notice(&self) -> String {
        format!(
            "Daily interview limit of {} reached. Review your past reports and try again tomorrow.",
            self.daily_limit
        )
    }

    /// Count a focus-loss event. Notices stop once the threshold has been reached.
    pub fn register_warning(&self, warnings: u32) -> WarningOutcome {
        let next = warnings.saturating_add(1);
        let notice = (warnings < self.max_warnings).then(|| {
            if next >= self.max_warnings {
                format!(
                    "Warning {next}/{}: leaving the interview window again is recorded; this session will be flagged.",
                    self.max_warnings
                )
            } else {
                format!(
                    "Warning {next}/{}: please keep the interview window in focus.",
                    self.max_warnings
                )
            }
        });
        WarningOutcome {
            warnings: next,
            notice,
        }
    }

    pub fn fraud_status(&self, warnings: u32) -> bool {
        warnings >= self.max_warnings
    }
}
