//! Classifier: routes each patient into exactly one statement section.
//!
//! The single source of truth for section membership is the computed
//! balance: a patient is "paid" iff every invoice in scope has a zero
//! balance due. The recorded `Invoice.status` is advisory CRUD metadata and
//! is never consulted here.

use serde::{Deserialize, Serialize};

use crate::aggregate::PatientSummary;

/// Elementwise sums of a section's member totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTotals {
    pub total_invoiced: u64,
    pub payments_received: u64,
    pub balance: u64,
}

impl SectionTotals {
    pub fn for_patients(patients: &[PatientSummary]) -> Self {
        let mut totals = Self::default();
        for summary in patients {
            totals.total_invoiced = totals.total_invoiced.saturating_add(summary.total_invoiced);
            totals.payments_received = totals
                .payments_received
                .saturating_add(summary.payments_received);
            totals.balance = totals.balance.saturating_add(summary.balance);
        }
        totals
    }
}

/// The paid/unpaid partition: total and disjoint over the aggregator's
/// output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedPatients {
    pub paid: Vec<PatientSummary>,
    pub unpaid: Vec<PatientSummary>,
}

impl ClassifiedPatients {
    pub fn paid_totals(&self) -> SectionTotals {
        SectionTotals::for_patients(&self.paid)
    }

    pub fn unpaid_totals(&self) -> SectionTotals {
        SectionTotals::for_patients(&self.unpaid)
    }
}

/// Route each patient: every invoice settled → paid, anything outstanding →
/// unpaid.
pub fn classify(summaries: Vec<PatientSummary>) -> ClassifiedPatients {
    let (paid, unpaid) = summaries
        .into_iter()
        .partition(|summary| summary.invoices.iter().all(|inv| inv.balance_due == 0));
    ClassifiedPatients { paid, unpaid }
}
