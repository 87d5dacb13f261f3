//! Patient Aggregator: invoice-level results grouped per patient.
//!
//! One summary per distinct patient in the snapshot; no patient is dropped
//! even when every balance is zero. Carries the nested invoice, service, and
//! payment breakdown for drill-down display.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clinibill_billing::{Payment, PaymentMethod};
use clinibill_core::{InvoiceId, PatientId, PaymentId};

use crate::balance::{InvoiceBalance, compute_patient_balances};
use crate::error::PatientFlag;
use crate::reader::LedgerSnapshot;

/// A distinct billed service rolled up across a patient's invoices in scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLine {
    pub description: String,
    pub qty: u64,
    /// Total billed for this service, in smallest currency unit.
    pub amount: u64,
}

/// One payment in the flattened drill-down list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLine {
    pub payment_id: PaymentId,
    pub invoice_id: Option<InvoiceId>,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub amount: u64,
}

impl PaymentLine {
    fn from_payment(payment: &Payment) -> Self {
        Self {
            payment_id: payment.payment_id,
            invoice_id: payment.invoice_id,
            payment_date: payment.payment_date,
            method: payment.method,
            amount: payment.amount,
        }
    }
}

/// Per-patient rollup of the invoices in scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub patient_id: PatientId,
    /// Display name, or the raw identifier when no patient record resolved.
    pub patient_name: String,
    pub flags: Vec<PatientFlag>,
    /// Σ `patient_portion` over the patient's invoices in scope.
    pub total_invoiced: u64,
    /// Σ payments applied to those invoices.
    pub payments_received: u64,
    /// `total_invoiced − payments_received`; never negative.
    pub balance: u64,
    /// Highest `days_outstanding` over open invoices; 0 when none.
    pub max_aging_days: i64,
    pub invoices: Vec<InvoiceBalance>,
    pub services: Vec<ServiceLine>,
    pub payments: Vec<PaymentLine>,
}

/// Aggregate the snapshot into one summary per patient, ordered by display
/// name (ties broken by id) for stable statement output.
pub fn aggregate_patients(snapshot: &LedgerSnapshot, as_of: NaiveDate) -> Vec<PatientSummary> {
    let mut summaries: Vec<PatientSummary> = snapshot
        .patient_ids()
        .into_iter()
        .map(|patient_id| summarize_patient(snapshot, patient_id, as_of))
        .collect();
    summaries.sort_by(|a, b| {
        (a.patient_name.as_str(), a.patient_id).cmp(&(b.patient_name.as_str(), b.patient_id))
    });
    summaries
}

fn summarize_patient(
    snapshot: &LedgerSnapshot,
    patient_id: PatientId,
    as_of: NaiveDate,
) -> PatientSummary {
    let invoices = compute_patient_balances(snapshot, patient_id, as_of);

    let total_invoiced = invoices
        .iter()
        .fold(0u64, |sum, inv| sum.saturating_add(inv.patient_portion));
    let payments_received = invoices
        .iter()
        .fold(0u64, |sum, inv| sum.saturating_add(inv.total_paid));
    let balance = invoices
        .iter()
        .fold(0u64, |sum, inv| sum.saturating_add(inv.balance_due));
    let max_aging_days = invoices
        .iter()
        .filter(|inv| inv.balance_due > 0)
        .map(|inv| inv.days_outstanding)
        .max()
        .unwrap_or(0);

    // Distinct services, rolled up by description; BTreeMap keeps the
    // statement order stable.
    let mut services: BTreeMap<String, ServiceLine> = BTreeMap::new();
    for inv in &invoices {
        for line in snapshot.lines(inv.invoice_id) {
            let entry = services
                .entry(line.description.clone())
                .or_insert_with(|| ServiceLine {
                    description: line.description.clone(),
                    qty: 0,
                    amount: 0,
                });
            entry.qty = entry.qty.saturating_add(line.qty as u64);
            entry.amount = entry.amount.saturating_add(line.total().unwrap_or(u64::MAX));
        }
    }

    let mut payments: Vec<PaymentLine> = invoices
        .iter()
        .flat_map(|inv| snapshot.attributed_payments(inv.invoice_id))
        .chain(snapshot.unattributed_payments(patient_id))
        .map(PaymentLine::from_payment)
        .collect();
    payments.sort_by(|a, b| (a.payment_date, a.payment_id).cmp(&(b.payment_date, b.payment_id)));

    let (patient_name, flags) = match snapshot.patient(patient_id) {
        Some(patient) => (patient.display_name(), Vec::new()),
        None => (patient_id.to_string(), vec![PatientFlag::MissingPatient]),
    };

    PatientSummary {
        patient_id,
        patient_name,
        flags,
        total_invoiced,
        payments_received,
        balance,
        max_aging_days,
        invoices,
        services: services.into_values().collect(),
        payments,
    }
}
