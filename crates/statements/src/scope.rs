//! Report scope: the time window a statement is computed over.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StatementError;

/// The window of invoices a statement covers: one calendar month, or every
/// invoice on file ("all outstanding").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "kebab-case")]
pub enum StatementScope {
    Month { year: i32, month: u32 },
    AllOutstanding,
}

impl StatementScope {
    /// Scope covering one calendar month. Rejects structurally invalid
    /// parameters before any computation starts.
    pub fn month(year: i32, month: u32) -> Result<Self, StatementError> {
        let scope = Self::Month { year, month };
        scope.validate()?;
        Ok(scope)
    }

    pub fn all_outstanding() -> Self {
        Self::AllOutstanding
    }

    /// Structural validation; the gate every statement request passes
    /// before the first read.
    pub fn validate(&self) -> Result<(), StatementError> {
        match *self {
            Self::AllOutstanding => Ok(()),
            Self::Month { year, month } => {
                if !(1..=12).contains(&month) {
                    return Err(StatementError::invalid_scope(format!(
                        "month must be between 1 and 12, got {month}"
                    )));
                }
                if Self::month_window(year, month).is_none() {
                    return Err(StatementError::invalid_scope(format!(
                        "year {year} is out of range"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Whether `date` falls inside this scope.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Self::AllOutstanding => true,
            Self::Month { year, month } => Self::month_window(year, month)
                .is_some_and(|(start, end)| start <= date && date < end),
        }
    }

    /// Label carried on the assembled statement, e.g. `"2025-11"`.
    pub fn label(&self) -> String {
        match *self {
            Self::AllOutstanding => "all-outstanding".to_string(),
            Self::Month { year, month } => format!("{year:04}-{month:02}"),
        }
    }

    /// Closed-open month window `[1st, 1st of next month)`. December wraps
    /// into January of the next year.
    fn month_window(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some((start, end))
    }
}
