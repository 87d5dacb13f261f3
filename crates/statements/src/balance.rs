//! Balance Calculator: per-invoice charges, applied payments, and aging.
//!
//! Pure arithmetic over the snapshot and an injected as-of date. Amounts are
//! in smallest currency unit; payments apply to an invoice only up to its
//! patient portion, so a recorded overpayment never produces a negative
//! balance anywhere downstream.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clinibill_billing::{Invoice, InvoiceLine, InvoiceStatus, gross_charge};
use clinibill_core::{InvoiceId, PatientId, VisitId};

use crate::error::InvoiceFlag;
use crate::reader::LedgerSnapshot;

/// Allowed disagreement, in smallest currency unit, between the line-derived
/// gross charge and the recorded portion split. Integer-cent splits of a
/// percentage-based insurance coverage can round off by one cent.
pub const SPLIT_TOLERANCE: u64 = 1;

/// Banded classification of how long a balance has been outstanding.
///
/// Bands are closed-open: `[0,31)`, `[31,61)`, `[61,91)`, `[91,∞)`. A tie at
/// a boundary (exactly 30 days) falls into the lower bucket. A settled
/// invoice has no bucket and reports `n/a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgingBucket {
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "31-60")]
    Days31To60,
    #[serde(rename = "61-90")]
    Days61To90,
    #[serde(rename = "90+")]
    Over90,
    #[serde(rename = "n/a")]
    NotApplicable,
}

impl AgingBucket {
    /// Bucket for an outstanding balance aged `days_outstanding` days.
    pub fn for_age(days_outstanding: i64) -> Self {
        if days_outstanding < 31 {
            Self::Current
        } else if days_outstanding < 61 {
            Self::Days31To60
        } else if days_outstanding < 91 {
            Self::Days61To90
        } else {
            Self::Over90
        }
    }
}

impl core::fmt::Display for AgingBucket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Current => "current",
            Self::Days31To60 => "31-60",
            Self::Days61To90 => "61-90",
            Self::Over90 => "90+",
            Self::NotApplicable => "n/a",
        };
        f.write_str(label)
    }
}

/// One invoice's computed standing as of the statement date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceBalance {
    pub invoice_id: InvoiceId,
    pub patient_id: PatientId,
    pub visit_id: Option<VisitId>,
    pub invoice_date: NaiveDate,
    /// Status as recorded by the CRUD layer; advisory, may drift.
    pub recorded_status: InvoiceStatus,
    pub insurance_portion: u64,
    pub patient_portion: u64,
    /// Σ(`qty × unit_price`) over the invoice's line items.
    pub gross_charge: u64,
    /// Payments applied against the patient portion (tagged + allocated).
    pub total_paid: u64,
    pub balance_due: u64,
    /// Whole days from invoice date to the as-of date; 0 when settled.
    pub days_outstanding: i64,
    pub aging_bucket: AgingBucket,
    pub flags: Vec<InvoiceFlag>,
}

/// Compute one invoice's balance given the payments applied to it.
///
/// `applied` is capped at the patient portion by the caller-facing
/// entry points; the clamp here keeps the function total regardless.
pub fn compute_invoice_balance(
    invoice: &Invoice,
    lines: &[InvoiceLine],
    applied: u64,
    as_of: NaiveDate,
) -> InvoiceBalance {
    // Sums are clamped at u64::MAX on overflow; the inconsistency flag
    // fires for such invoices anyway.
    let gross = gross_charge(lines).unwrap_or(u64::MAX);
    let declared = invoice.declared_total().unwrap_or(u64::MAX);

    let mut flags = Vec::new();
    if gross.abs_diff(declared) > SPLIT_TOLERANCE {
        flags.push(InvoiceFlag::InconsistentSplit {
            gross_charge: gross,
            declared_total: declared,
        });
    }

    let balance_due = invoice.patient_portion.saturating_sub(applied);
    let days_outstanding = if balance_due > 0 {
        as_of
            .signed_duration_since(invoice.invoice_date)
            .num_days()
            .max(0)
    } else {
        0
    };
    let aging_bucket = if balance_due > 0 {
        AgingBucket::for_age(days_outstanding)
    } else {
        AgingBucket::NotApplicable
    };

    let derived = InvoiceStatus::derive(invoice.patient_portion, applied);
    if derived != invoice.status {
        flags.push(InvoiceFlag::StatusDrift {
            recorded: invoice.status,
            derived,
        });
    }

    InvoiceBalance {
        invoice_id: invoice.invoice_id,
        patient_id: invoice.patient_id,
        visit_id: invoice.visit_id,
        invoice_date: invoice.invoice_date,
        recorded_status: invoice.status,
        insurance_portion: invoice.insurance_portion,
        patient_portion: invoice.patient_portion,
        gross_charge: gross,
        total_paid: applied,
        balance_due,
        days_outstanding,
        aging_bucket,
        flags,
    }
}

/// Oldest-first allocation of an unattributed payment pool.
///
/// Walks `remaining` in order, paying each balance down before moving on;
/// never exceeds an invoice's remaining balance. Returns the per-invoice
/// allocations and the pool leftover no invoice could absorb.
pub fn allocate_oldest_first(remaining: &[u64], pool: u64) -> (Vec<u64>, u64) {
    let mut left = pool;
    let mut allocations = Vec::with_capacity(remaining.len());
    for &due in remaining {
        let take = left.min(due);
        allocations.push(take);
        left -= take;
    }
    (allocations, left)
}

/// Balances for every invoice of one patient in the snapshot.
///
/// Tagged payments apply to their invoice (capped at the patient portion);
/// the patient's unattributed payments are then allocated oldest-invoice
/// first against what remains.
pub fn compute_patient_balances(
    snapshot: &LedgerSnapshot,
    patient_id: PatientId,
    as_of: NaiveDate,
) -> Vec<InvoiceBalance> {
    let invoices = snapshot.patient_invoices(patient_id);

    let attributed: Vec<u64> = invoices
        .iter()
        .map(|inv| {
            let tagged = snapshot
                .attributed_payments(inv.invoice_id)
                .iter()
                .fold(0u64, |sum, p| sum.saturating_add(p.amount));
            tagged.min(inv.patient_portion)
        })
        .collect();

    let remaining: Vec<u64> = invoices
        .iter()
        .zip(&attributed)
        .map(|(inv, paid)| inv.patient_portion.saturating_sub(*paid))
        .collect();

    let pool = snapshot
        .unattributed_payments(patient_id)
        .iter()
        .fold(0u64, |sum, p| sum.saturating_add(p.amount));
    let (allocations, leftover) = allocate_oldest_first(&remaining, pool);
    if leftover > 0 {
        tracing::debug!(
            patient_id = %patient_id,
            leftover,
            "unattributed payments exceed open balances; surplus not applied"
        );
    }

    invoices
        .into_iter()
        .zip(attributed)
        .zip(allocations)
        .map(|((inv, tagged), allocated)| {
            compute_invoice_balance(
                inv,
                snapshot.lines(inv.invoice_id),
                tagged.saturating_add(allocated),
                as_of,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(invoice_date: NaiveDate, patient_portion: u64, insurance_portion: u64) -> Invoice {
        Invoice {
            invoice_id: InvoiceId::new(),
            patient_id: PatientId::new(),
            visit_id: None,
            invoice_date,
            status: InvoiceStatus::Pending,
            insurance_portion,
            patient_portion,
        }
    }

    fn line(invoice_id: InvoiceId, qty: u32, unit_price: u64) -> InvoiceLine {
        InvoiceLine {
            invoice_id,
            line_no: 1,
            description: "Consultation".to_string(),
            qty,
            unit_price,
        }
    }

    #[test]
    fn aging_bucket_boundaries_are_closed_open() {
        assert_eq!(AgingBucket::for_age(0), AgingBucket::Current);
        assert_eq!(AgingBucket::for_age(30), AgingBucket::Current);
        assert_eq!(AgingBucket::for_age(31), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_age(60), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_age(61), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_age(90), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_age(91), AgingBucket::Over90);
        assert_eq!(AgingBucket::for_age(400), AgingBucket::Over90);
    }

    #[test]
    fn settled_invoice_has_no_bucket_and_zero_age() {
        let inv = invoice(date(2025, 9, 1), 10_000, 0);
        let result = compute_invoice_balance(
            &inv,
            &[line(inv.invoice_id, 1, 10_000)],
            10_000,
            date(2025, 11, 30),
        );
        assert_eq!(result.balance_due, 0);
        assert_eq!(result.days_outstanding, 0);
        assert_eq!(result.aging_bucket, AgingBucket::NotApplicable);
    }

    #[test]
    fn outstanding_invoice_ages_in_whole_days() {
        let inv = invoice(date(2025, 10, 1), 20_000, 0);
        let result = compute_invoice_balance(
            &inv,
            &[line(inv.invoice_id, 1, 20_000)],
            5_000,
            date(2025, 11, 15),
        );
        assert_eq!(result.balance_due, 15_000);
        assert_eq!(result.days_outstanding, 45);
        assert_eq!(result.aging_bucket, AgingBucket::Days31To60);
    }

    #[test]
    fn invoice_dated_after_as_of_ages_zero_days() {
        let inv = invoice(date(2025, 11, 20), 5_000, 0);
        let result = compute_invoice_balance(
            &inv,
            &[line(inv.invoice_id, 1, 5_000)],
            0,
            date(2025, 11, 15),
        );
        assert_eq!(result.days_outstanding, 0);
        assert_eq!(result.aging_bucket, AgingBucket::Current);
    }

    #[test]
    fn overpayment_clamps_balance_at_zero() {
        let inv = invoice(date(2025, 11, 1), 10_000, 0);
        let result = compute_invoice_balance(
            &inv,
            &[line(inv.invoice_id, 1, 10_000)],
            15_000,
            date(2025, 11, 30),
        );
        assert_eq!(result.balance_due, 0);
    }

    #[test]
    fn split_within_tolerance_is_not_flagged() {
        // 70/30 split of an odd amount rounds off by one cent.
        let inv = invoice(date(2025, 11, 1), 3_000, 7_001);
        let result = compute_invoice_balance(
            &inv,
            &[line(inv.invoice_id, 1, 10_000)],
            0,
            date(2025, 11, 30),
        );
        assert!(
            !result
                .flags
                .iter()
                .any(|f| matches!(f, InvoiceFlag::InconsistentSplit { .. }))
        );
    }

    #[test]
    fn split_beyond_tolerance_is_flagged_not_fatal() {
        let inv = invoice(date(2025, 11, 1), 3_000, 5_000);
        let result = compute_invoice_balance(
            &inv,
            &[line(inv.invoice_id, 1, 10_000)],
            0,
            date(2025, 11, 30),
        );
        assert!(result.flags.contains(&InvoiceFlag::InconsistentSplit {
            gross_charge: 10_000,
            declared_total: 8_000,
        }));
        // patient_portion stays authoritative for billing.
        assert_eq!(result.balance_due, 3_000);
    }

    #[test]
    fn stale_recorded_status_is_flagged_as_drift() {
        let mut inv = invoice(date(2025, 11, 1), 10_000, 0);
        inv.status = InvoiceStatus::Paid;
        let result = compute_invoice_balance(
            &inv,
            &[line(inv.invoice_id, 1, 10_000)],
            2_000,
            date(2025, 11, 30),
        );
        assert!(result.flags.contains(&InvoiceFlag::StatusDrift {
            recorded: InvoiceStatus::Paid,
            derived: InvoiceStatus::Partial,
        }));
    }

    #[test]
    fn allocation_clears_oldest_before_newer() {
        // 30.00 unattributed, older invoice owes 10.00, newer 50.00.
        let (allocations, leftover) = allocate_oldest_first(&[1_000, 5_000], 3_000);
        assert_eq!(allocations, vec![1_000, 2_000]);
        assert_eq!(leftover, 0);
    }

    #[test]
    fn allocation_surplus_is_left_over() {
        let (allocations, leftover) = allocate_oldest_first(&[1_000], 4_000);
        assert_eq!(allocations, vec![1_000]);
        assert_eq!(leftover, 3_000);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: allocation conserves the pool and never exceeds any
        /// invoice's remaining balance.
        #[test]
        fn allocation_conserves_pool(
            remaining in prop::collection::vec(0u64..1_000_000u64, 0..12),
            pool in 0u64..3_000_000u64,
        ) {
            let (allocations, leftover) = allocate_oldest_first(&remaining, pool);
            prop_assert_eq!(allocations.len(), remaining.len());
            for (allocated, due) in allocations.iter().zip(&remaining) {
                prop_assert!(allocated <= due);
            }
            let applied: u64 = allocations.iter().sum();
            prop_assert_eq!(applied + leftover, pool);
        }

        /// Property: a balance is never negative (clamped subtraction) and
        /// never exceeds the patient portion.
        #[test]
        fn balance_is_clamped_into_range(
            patient_portion in 0u64..10_000_000u64,
            applied in 0u64..20_000_000u64,
        ) {
            let inv = invoice(date(2025, 6, 1), patient_portion, 0);
            let result = compute_invoice_balance(&inv, &[], applied, date(2025, 8, 1));
            prop_assert!(result.balance_due <= patient_portion);
        }
    }
}
