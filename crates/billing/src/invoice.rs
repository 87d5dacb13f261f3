use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clinibill_core::{DomainError, DomainResult, InvoiceId, PatientId, VisitId};

/// Invoice status as recorded by the CRUD layer.
///
/// Advisory only: it is set when payments are entered and can drift from the
/// balance computed out of line items and payments (e.g. a payment deleted
/// after the status was bumped). Statement classification never consults it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Partial,
    Paid,
}

impl InvoiceStatus {
    /// Status implied by the applied payments against the patient portion.
    ///
    /// Mirrors the rule the CRUD layer uses when it bumps the stored status:
    /// fully covered → paid, anything applied → partial, otherwise pending.
    pub fn derive(patient_portion: u64, applied: u64) -> Self {
        if applied >= patient_portion {
            Self::Paid
        } else if applied > 0 {
            Self::Partial
        } else {
            Self::Pending
        }
    }
}

/// A priced service entry belonging to one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub invoice_id: InvoiceId,
    pub line_no: u32,
    pub description: String,
    pub qty: u32,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

impl InvoiceLine {
    /// Line total (`qty × unit_price`) with overflow checked.
    pub fn total(&self) -> DomainResult<u64> {
        (self.qty as u64)
            .checked_mul(self.unit_price)
            .ok_or_else(|| DomainError::invariant("invoice line amount overflow"))
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation(
                "invoice line description must not be empty",
            ));
        }
        self.total()?;
        Ok(())
    }
}

/// A billable record for services rendered, split into insurance and patient
/// portions. Both portions are in smallest currency unit; either may be zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: InvoiceId,
    pub patient_id: PatientId,
    pub visit_id: Option<VisitId>,
    pub invoice_date: NaiveDate,
    pub status: InvoiceStatus,
    /// Portion of the gross charge billed to insurance, in smallest unit.
    pub insurance_portion: u64,
    /// Portion of the gross charge billed to the patient, in smallest unit.
    pub patient_portion: u64,
}

impl Invoice {
    /// `insurance_portion + patient_portion`, overflow checked.
    ///
    /// Should reconcile with the line-item-derived gross charge; the
    /// statement engine flags invoices where it does not.
    pub fn declared_total(&self) -> DomainResult<u64> {
        self.insurance_portion
            .checked_add(self.patient_portion)
            .ok_or_else(|| DomainError::invariant("invoice portion overflow"))
    }

    pub fn validate(&self) -> DomainResult<()> {
        self.declared_total()?;
        Ok(())
    }
}

/// Gross charge of an invoice: Σ(`qty × unit_price`) over its line items.
pub fn gross_charge(lines: &[InvoiceLine]) -> DomainResult<u64> {
    let mut total: u64 = 0;
    for line in lines {
        total = total
            .checked_add(line.total()?)
            .ok_or_else(|| DomainError::invariant("invoice gross charge overflow"))?;
    }
    Ok(total)
}
