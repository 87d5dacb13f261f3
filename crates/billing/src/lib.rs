//! Billing records domain module.
//!
//! This crate contains the billing records the statement engine consumes:
//! invoices with their line items, payments, and the patient reference used
//! for labeling. The records are owned and mutated by the surrounding CRUD
//! layer; everything here treats them as read-only inputs.

pub mod invoice;
pub mod patient;
pub mod payment;

pub use invoice::{Invoice, InvoiceLine, InvoiceStatus, gross_charge};
pub use patient::Patient;
pub use payment::{Payment, PaymentMethod};
