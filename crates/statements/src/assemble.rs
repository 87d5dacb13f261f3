//! Statement Assembler: the final nested response.
//!
//! Pure composition over the classifier's output; introduces no new numeric
//! derivation. A statement lives for one request and is never persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::PatientSummary;
use crate::classify::{ClassifiedPatients, SectionTotals};
use crate::scope::StatementScope;

/// One side of the paid/unpaid partition with its totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSection {
    pub patients: Vec<PatientSummary>,
    pub totals: SectionTotals,
}

/// The computed report: per-section patient lists with drill-down detail,
/// section totals, and the scope descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Scope label, e.g. `"2025-11"` or `"all-outstanding"`.
    pub generated_scope: String,
    pub as_of: NaiveDate,
    pub paid: StatementSection,
    pub unpaid: StatementSection,
}

pub fn assemble(
    scope: &StatementScope,
    as_of: NaiveDate,
    classified: ClassifiedPatients,
) -> Statement {
    let paid_totals = classified.paid_totals();
    let unpaid_totals = classified.unpaid_totals();
    Statement {
        generated_scope: scope.label(),
        as_of,
        paid: StatementSection {
            patients: classified.paid,
            totals: paid_totals,
        },
        unpaid: StatementSection {
            patients: classified.unpaid,
            totals: unpaid_totals,
        },
    }
}
