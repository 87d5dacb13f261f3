//! Statement engine error taxonomy.
//!
//! Malformed input and upstream failures abort the whole computation.
//! Data-quality findings detected mid-computation are recorded as flags
//! attached to the affected entries and never abort: every entity in scope
//! appears in exactly one output bucket, flagged if in doubt.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use clinibill_billing::InvoiceStatus;

use crate::source::SourceError;

/// Fatal statement engine error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatementError {
    /// Structurally invalid scope parameters, rejected before any read.
    #[error("invalid scope: {0}")]
    InvalidScope(String),

    /// A record source failed; no partial statement is returned, since
    /// partial billing data is actively misleading.
    #[error("upstream read failure: {0}")]
    UpstreamRead(#[from] SourceError),
}

impl StatementError {
    pub fn invalid_scope(msg: impl Into<String>) -> Self {
        Self::InvalidScope(msg.into())
    }
}

/// Non-fatal data-quality finding attached to an invoice entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvoiceFlag {
    /// The line-item-derived gross charge and the recorded
    /// insurance/patient split disagree beyond the rounding tolerance.
    /// `patient_portion` stays authoritative for billing.
    InconsistentSplit {
        gross_charge: u64,
        declared_total: u64,
    },

    /// The recorded advisory status disagrees with the status derived from
    /// applied payments.
    StatusDrift {
        recorded: InvoiceStatus,
        derived: InvoiceStatus,
    },
}

/// Non-fatal data-quality finding attached to a patient entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatientFlag {
    /// No patient record resolved for this identifier; the summary is
    /// labeled with the raw identifier instead of a display name.
    MissingPatient,
}
