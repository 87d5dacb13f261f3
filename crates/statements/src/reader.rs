//! Ledger Reader: one immutable snapshot per computation.
//!
//! Pulls the closed set of invoices for a scope, their line items, and the
//! payments that can touch them, then builds explicit in-memory indexes once
//! instead of re-scanning per lookup. Records are fetched invoices-first:
//! payments recorded strictly after the invoice read began may be missed,
//! which is the documented staleness window, not a correctness violation.

use std::collections::{HashMap, HashSet};

use clinibill_billing::{Invoice, InvoiceLine, Patient, Payment};
use clinibill_core::{InvoiceId, PatientId};

use crate::error::StatementError;
use crate::scope::StatementScope;
use crate::source::{InvoiceSource, PatientDirectory, PaymentSource};

/// Immutable, indexed view of the billing records in one scope.
///
/// Invoices are held oldest-first (date, then id) so per-patient walks see
/// them in allocation order. Payments attributed to an invoice outside the
/// scope set belong to another scope's statement and are not retained.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    scope: StatementScope,
    invoices: Vec<Invoice>,
    lines: HashMap<InvoiceId, Vec<InvoiceLine>>,
    attributed: HashMap<InvoiceId, Vec<Payment>>,
    unattributed: HashMap<PatientId, Vec<Payment>>,
    by_patient: HashMap<PatientId, Vec<usize>>,
    patients: HashMap<PatientId, Patient>,
}

impl LedgerSnapshot {
    pub fn scope(&self) -> &StatementScope {
        &self.scope
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }

    /// All invoices in scope, oldest-first.
    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    /// Line items of one invoice, in line order.
    pub fn lines(&self, invoice_id: InvoiceId) -> &[InvoiceLine] {
        self.lines
            .get(&invoice_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Payments explicitly tagged with one in-scope invoice, date order.
    pub fn attributed_payments(&self, invoice_id: InvoiceId) -> &[Payment] {
        self.attributed
            .get(&invoice_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// A patient's payments carrying no invoice reference, date order.
    pub fn unattributed_payments(&self, patient_id: PatientId) -> &[Payment] {
        self.unattributed
            .get(&patient_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// A patient's in-scope invoices, oldest-first.
    pub fn patient_invoices(&self, patient_id: PatientId) -> Vec<&Invoice> {
        self.by_patient
            .get(&patient_id)
            .map(|indexes| indexes.iter().map(|&i| &self.invoices[i]).collect())
            .unwrap_or_default()
    }

    /// Distinct patients with at least one invoice in scope, in id order.
    pub fn patient_ids(&self) -> Vec<PatientId> {
        let mut ids: Vec<PatientId> = self.by_patient.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Resolved patient record, if the directory knew the identifier.
    pub fn patient(&self, patient_id: PatientId) -> Option<&Patient> {
        self.patients.get(&patient_id)
    }
}

/// Assembles [`LedgerSnapshot`]s from the three record sources.
pub struct LedgerReader<I, P, D> {
    invoices: I,
    payments: P,
    patients: D,
}

impl<I, P, D> LedgerReader<I, P, D>
where
    I: InvoiceSource,
    P: PaymentSource,
    D: PatientDirectory,
{
    pub fn new(invoices: I, payments: P, patients: D) -> Self {
        Self {
            invoices,
            payments,
            patients,
        }
    }

    /// Take one read-only snapshot for `scope`.
    ///
    /// An empty scope yields an empty snapshot, not an error; a source
    /// failure aborts with [`StatementError::UpstreamRead`].
    pub fn snapshot(&self, scope: &StatementScope) -> Result<LedgerSnapshot, StatementError> {
        scope.validate()?;

        let mut invoices = self.invoices.invoices_in(scope)?;
        let fetched = invoices.len();
        invoices.retain(|inv| scope.contains(inv.invoice_date));
        if invoices.len() != fetched {
            tracing::warn!(
                dropped = fetched - invoices.len(),
                scope = %scope.label(),
                "invoice source returned records outside scope"
            );
        }
        invoices.sort_by(|a, b| {
            (a.invoice_date, a.invoice_id).cmp(&(b.invoice_date, b.invoice_id))
        });

        let invoice_ids: Vec<InvoiceId> = invoices.iter().map(|inv| inv.invoice_id).collect();
        let invoice_set: HashSet<InvoiceId> = invoice_ids.iter().copied().collect();

        let mut by_patient: HashMap<PatientId, Vec<usize>> = HashMap::new();
        for (index, inv) in invoices.iter().enumerate() {
            by_patient.entry(inv.patient_id).or_default().push(index);
        }
        let mut patient_ids: Vec<PatientId> = by_patient.keys().copied().collect();
        patient_ids.sort();
        let patient_set: HashSet<PatientId> = patient_ids.iter().copied().collect();

        let mut lines: HashMap<InvoiceId, Vec<InvoiceLine>> = HashMap::new();
        for line in self.invoices.lines_for(&invoice_ids)? {
            if invoice_set.contains(&line.invoice_id) {
                lines.entry(line.invoice_id).or_default().push(line);
            } else {
                tracing::debug!(invoice_id = %line.invoice_id, "line for unknown invoice ignored");
            }
        }
        for invoice_lines in lines.values_mut() {
            invoice_lines.sort_by_key(|line| line.line_no);
        }

        let mut attributed: HashMap<InvoiceId, Vec<Payment>> = HashMap::new();
        let mut unattributed: HashMap<PatientId, Vec<Payment>> = HashMap::new();
        for payment in self.payments.payments_for(&invoice_ids, &patient_ids)? {
            match payment.invoice_id {
                Some(invoice_id) if invoice_set.contains(&invoice_id) => {
                    attributed.entry(invoice_id).or_default().push(payment);
                }
                Some(invoice_id) => {
                    tracing::debug!(
                        payment_id = %payment.payment_id,
                        invoice_id = %invoice_id,
                        "payment attributed outside scope ignored"
                    );
                }
                None if patient_set.contains(&payment.patient_id) => {
                    unattributed
                        .entry(payment.patient_id)
                        .or_default()
                        .push(payment);
                }
                None => {
                    tracing::debug!(
                        payment_id = %payment.payment_id,
                        "unattributed payment for patient without invoices in scope ignored"
                    );
                }
            }
        }
        for payments in attributed.values_mut().chain(unattributed.values_mut()) {
            payments.sort_by(|a, b| {
                (a.payment_date, a.payment_id).cmp(&(b.payment_date, b.payment_id))
            });
        }

        let mut patients = HashMap::new();
        for patient_id in &patient_ids {
            match self.patients.patient(patient_id) {
                Ok(Some(patient)) => {
                    patients.insert(*patient_id, patient);
                }
                Ok(None) => {}
                // Display-name resolution is best-effort: degrade to the
                // raw identifier instead of failing the statement.
                Err(e) => {
                    tracing::warn!(
                        patient_id = %patient_id,
                        error = %e,
                        "patient lookup failed, labeling with raw identifier"
                    );
                }
            }
        }

        tracing::debug!(
            scope = %scope.label(),
            invoices = invoices.len(),
            patients = patient_ids.len(),
            "ledger snapshot assembled"
        );

        Ok(LedgerSnapshot {
            scope: *scope,
            invoices,
            lines,
            attributed,
            unattributed,
            by_patient,
            patients,
        })
    }
}
