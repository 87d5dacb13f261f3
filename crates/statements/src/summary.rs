//! Patient financial summary view.
//!
//! A per-patient rollup of financial standing across a scope: gross charges,
//! insurance vs patient portions, collections, counts, and payment-method
//! breakdown. Backs the billing/collections dashboard; recomputed from the
//! snapshot on every call, never stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clinibill_billing::PaymentMethod;
use clinibill_core::PatientId;

use crate::aggregate::{PatientSummary, aggregate_patients};
use crate::error::PatientFlag;
use crate::reader::LedgerSnapshot;

/// One patient's complete financial status within a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientFinancialSummary {
    pub patient_id: PatientId,
    pub patient_name: String,
    pub flags: Vec<PatientFlag>,
    /// Σ gross charge over the patient's invoices in scope.
    pub total_invoiced: u64,
    pub total_insurance_portion: u64,
    pub total_patient_portion: u64,
    /// Σ payments applied against patient portions.
    pub total_paid: u64,
    pub outstanding_balance: u64,
    pub invoice_count: u32,
    pub payment_count: u32,
    /// Invoices with a zero balance due.
    pub settled_invoices: u32,
    /// Invoices still carrying a balance.
    pub open_invoices: u32,
    pub cash_payments: u32,
    pub card_payments: u32,
    pub has_outstanding_balance: bool,
}

/// Financial summaries for every patient in the snapshot, in the same
/// stable order as the statement sections.
pub fn financial_summaries(
    snapshot: &LedgerSnapshot,
    as_of: NaiveDate,
) -> Vec<PatientFinancialSummary> {
    aggregate_patients(snapshot, as_of)
        .into_iter()
        .map(summarize)
        .collect()
}

fn summarize(summary: PatientSummary) -> PatientFinancialSummary {
    let total_invoiced = summary
        .invoices
        .iter()
        .fold(0u64, |sum, inv| sum.saturating_add(inv.gross_charge));
    let total_insurance_portion = summary
        .invoices
        .iter()
        .fold(0u64, |sum, inv| sum.saturating_add(inv.insurance_portion));
    let settled_invoices = summary
        .invoices
        .iter()
        .filter(|inv| inv.balance_due == 0)
        .count() as u32;
    let open_invoices = summary.invoices.len() as u32 - settled_invoices;
    let cash_payments = summary
        .payments
        .iter()
        .filter(|p| p.method == PaymentMethod::Cash)
        .count() as u32;
    let card_payments = summary
        .payments
        .iter()
        .filter(|p| p.method == PaymentMethod::Card)
        .count() as u32;

    PatientFinancialSummary {
        patient_id: summary.patient_id,
        patient_name: summary.patient_name,
        flags: summary.flags,
        total_invoiced,
        total_insurance_portion,
        total_patient_portion: summary.total_invoiced,
        total_paid: summary.payments_received,
        outstanding_balance: summary.balance,
        invoice_count: summary.invoices.len() as u32,
        payment_count: summary.payments.len() as u32,
        settled_invoices,
        open_invoices,
        cash_payments,
        card_payments,
        has_outstanding_balance: summary.balance > 0,
    }
}
