use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clinibill_core::{InvoiceId, PatientId, PaymentId};

/// How a payment was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Insurance,
    Government,
}

/// A recorded amount received, optionally tied to a specific invoice.
///
/// A payment without an `invoice_id` is *unattributed*: the statement engine
/// applies it against the patient's oldest outstanding invoice first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub patient_id: PatientId,
    pub invoice_id: Option<InvoiceId>,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    /// Amount in smallest currency unit (e.g., cents).
    pub amount: u64,
}

impl Payment {
    pub fn is_attributed(&self) -> bool {
        self.invoice_id.is_some()
    }
}
