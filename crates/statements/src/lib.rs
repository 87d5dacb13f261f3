//! Billing ledger reconciliation and statement aggregation.
//!
//! The engine behind monthly patient statements and the patient financial
//! summary view: it reads one immutable snapshot of invoices, line items,
//! and payments for a scope, derives per-invoice balances and aging, groups
//! them per patient, partitions patients into paid/unpaid sections, and
//! assembles the final statement. Every call recomputes from source records;
//! nothing derived is ever persisted.
//!
//! Implemented purely as deterministic domain logic over the snapshot and an
//! injected as-of date (no IO beyond the record sources, no HTTP, no storage).

pub mod aggregate;
pub mod assemble;
pub mod balance;
pub mod classify;
pub mod engine;
pub mod error;
pub mod reader;
pub mod scope;
pub mod source;
pub mod summary;

pub use aggregate::{PatientSummary, PaymentLine, ServiceLine, aggregate_patients};
pub use assemble::{Statement, StatementSection, assemble};
pub use balance::{
    AgingBucket, InvoiceBalance, SPLIT_TOLERANCE, allocate_oldest_first, compute_invoice_balance,
    compute_patient_balances,
};
pub use classify::{ClassifiedPatients, SectionTotals, classify};
pub use engine::StatementEngine;
pub use error::{InvoiceFlag, PatientFlag, StatementError};
pub use reader::{LedgerReader, LedgerSnapshot};
pub use scope::StatementScope;
pub use source::{
    InMemoryLedger, InvoiceSource, PatientDirectory, PaymentSource, SourceError,
};
pub use summary::{PatientFinancialSummary, financial_summaries};
