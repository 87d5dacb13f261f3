//! Record source abstractions.
//!
//! The engine consumes records owned by the surrounding CRUD layer through
//! three lookup interfaces: invoices (with joinable line items) for a scope,
//! payments for a set of invoices/patients, and best-effort patient
//! display-name resolution. `InMemoryLedger` implements all three for
//! tests and embedded use.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use thiserror::Error;

use clinibill_billing::{Invoice, InvoiceLine, Patient, Payment};
use clinibill_core::{InvoiceId, PatientId};

use crate::scope::StatementScope;

/// A record source could not retrieve records at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("record source unavailable: {0}")]
pub struct SourceError(String);

impl SourceError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Invoice lookup: all invoices (with joinable line items) for a scope.
pub trait InvoiceSource: Send + Sync {
    /// Every invoice whose `invoice_date` falls in `scope`.
    fn invoices_in(&self, scope: &StatementScope) -> Result<Vec<Invoice>, SourceError>;

    /// Every line item belonging to one of `invoice_ids`.
    fn lines_for(&self, invoice_ids: &[InvoiceId]) -> Result<Vec<InvoiceLine>, SourceError>;
}

/// Payment lookup for a set of invoices and patients.
pub trait PaymentSource: Send + Sync {
    /// Every payment tagged with one of `invoice_ids`, plus every payment
    /// recorded against one of `patient_ids` (catches unattributed ones).
    fn payments_for(
        &self,
        invoice_ids: &[InvoiceId],
        patient_ids: &[PatientId],
    ) -> Result<Vec<Payment>, SourceError>;
}

/// Best-effort patient lookup for display-name resolution.
pub trait PatientDirectory: Send + Sync {
    fn patient(&self, patient_id: &PatientId) -> Result<Option<Patient>, SourceError>;
}

impl<S> InvoiceSource for Arc<S>
where
    S: InvoiceSource + ?Sized,
{
    fn invoices_in(&self, scope: &StatementScope) -> Result<Vec<Invoice>, SourceError> {
        (**self).invoices_in(scope)
    }

    fn lines_for(&self, invoice_ids: &[InvoiceId]) -> Result<Vec<InvoiceLine>, SourceError> {
        (**self).lines_for(invoice_ids)
    }
}

impl<S> PaymentSource for Arc<S>
where
    S: PaymentSource + ?Sized,
{
    fn payments_for(
        &self,
        invoice_ids: &[InvoiceId],
        patient_ids: &[PatientId],
    ) -> Result<Vec<Payment>, SourceError> {
        (**self).payments_for(invoice_ids, patient_ids)
    }
}

impl<S> PatientDirectory for Arc<S>
where
    S: PatientDirectory + ?Sized,
{
    fn patient(&self, patient_id: &PatientId) -> Result<Option<Patient>, SourceError> {
        (**self).patient(patient_id)
    }
}

#[derive(Debug, Default)]
struct LedgerRecords {
    invoices: Vec<Invoice>,
    lines: Vec<InvoiceLine>,
    payments: Vec<Payment>,
    patients: HashMap<PatientId, Patient>,
}

/// In-memory record store implementing all three source interfaces, for
/// tests and embedded hosts.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    inner: RwLock<LedgerRecords>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_invoice(&self, invoice: Invoice, lines: Vec<InvoiceLine>) {
        if let Ok(mut records) = self.inner.write() {
            records.invoices.push(invoice);
            records.lines.extend(lines);
        }
    }

    pub fn insert_payment(&self, payment: Payment) {
        if let Ok(mut records) = self.inner.write() {
            records.payments.push(payment);
        }
    }

    pub fn insert_patient(&self, patient: Patient) {
        if let Ok(mut records) = self.inner.write() {
            records.patients.insert(patient.patient_id, patient);
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, LedgerRecords>, SourceError> {
        self.inner
            .read()
            .map_err(|_| SourceError::new("ledger lock poisoned"))
    }
}

impl InvoiceSource for InMemoryLedger {
    fn invoices_in(&self, scope: &StatementScope) -> Result<Vec<Invoice>, SourceError> {
        let records = self.read()?;
        Ok(records
            .invoices
            .iter()
            .filter(|inv| scope.contains(inv.invoice_date))
            .cloned()
            .collect())
    }

    fn lines_for(&self, invoice_ids: &[InvoiceId]) -> Result<Vec<InvoiceLine>, SourceError> {
        let wanted: HashSet<InvoiceId> = invoice_ids.iter().copied().collect();
        let records = self.read()?;
        Ok(records
            .lines
            .iter()
            .filter(|line| wanted.contains(&line.invoice_id))
            .cloned()
            .collect())
    }
}

impl PaymentSource for InMemoryLedger {
    fn payments_for(
        &self,
        invoice_ids: &[InvoiceId],
        patient_ids: &[PatientId],
    ) -> Result<Vec<Payment>, SourceError> {
        let invoices: HashSet<InvoiceId> = invoice_ids.iter().copied().collect();
        let patients: HashSet<PatientId> = patient_ids.iter().copied().collect();
        let records = self.read()?;
        Ok(records
            .payments
            .iter()
            .filter(|p| {
                p.invoice_id.is_some_and(|id| invoices.contains(&id))
                    || patients.contains(&p.patient_id)
            })
            .cloned()
            .collect())
    }
}

impl PatientDirectory for InMemoryLedger {
    fn patient(&self, patient_id: &PatientId) -> Result<Option<Patient>, SourceError> {
        let records = self.read()?;
        Ok(records.patients.get(patient_id).cloned())
    }
}
