//! The statement engine: one stateless pipeline per request.
//!
//! Reader → Balance Calculator → Patient Aggregator → Classifier →
//! Assembler. Each invocation is a pure function of its snapshot and the
//! as-of date; concurrent requests share nothing and need no coordination.

use chrono::{NaiveDate, Utc};

use crate::aggregate::aggregate_patients;
use crate::assemble::{Statement, assemble};
use crate::classify::classify;
use crate::error::StatementError;
use crate::reader::LedgerReader;
use crate::scope::StatementScope;
use crate::source::{InvoiceSource, PatientDirectory, PaymentSource};
use crate::summary::{PatientFinancialSummary, financial_summaries};

/// Entry point exposed to the surrounding CRUD/API layer.
pub struct StatementEngine<I, P, D> {
    reader: LedgerReader<I, P, D>,
}

impl<I, P, D> StatementEngine<I, P, D>
where
    I: InvoiceSource,
    P: PaymentSource,
    D: PatientDirectory,
{
    pub fn new(invoices: I, payments: P, patients: D) -> Self {
        Self {
            reader: LedgerReader::new(invoices, payments, patients),
        }
    }

    /// Generate the statement for `scope`, aging balances as of today.
    pub fn generate_statement(&self, scope: StatementScope) -> Result<Statement, StatementError> {
        self.generate_statement_as_of(scope, Utc::now().date_naive())
    }

    /// Deterministic variant with an injected as-of date: identical snapshot
    /// and date produce byte-identical output.
    pub fn generate_statement_as_of(
        &self,
        scope: StatementScope,
        as_of: NaiveDate,
    ) -> Result<Statement, StatementError> {
        let snapshot = self.reader.snapshot(&scope)?;
        let summaries = aggregate_patients(&snapshot, as_of);
        let statement = assemble(&scope, as_of, classify(summaries));
        tracing::info!(
            scope = %statement.generated_scope,
            paid = statement.paid.patients.len(),
            unpaid = statement.unpaid.patients.len(),
            "statement generated"
        );
        Ok(statement)
    }

    /// Per-patient financial summaries for `scope`, as of today.
    pub fn financial_summary(
        &self,
        scope: StatementScope,
    ) -> Result<Vec<PatientFinancialSummary>, StatementError> {
        self.financial_summary_as_of(scope, Utc::now().date_naive())
    }

    /// Deterministic variant of [`Self::financial_summary`].
    pub fn financial_summary_as_of(
        &self,
        scope: StatementScope,
        as_of: NaiveDate,
    ) -> Result<Vec<PatientFinancialSummary>, StatementError> {
        let snapshot = self.reader.snapshot(&scope)?;
        let summaries = financial_summaries(&snapshot, as_of);
        tracing::info!(
            scope = %scope.label(),
            patients = summaries.len(),
            "financial summary generated"
        );
        Ok(summaries)
    }
}
