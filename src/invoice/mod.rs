//! Invoice-line synthesis and the invoice document store.
//!
//! [`synthesize_invoice`] turns a billing period into a structured line list
//! (sections, priced product lines, informational notes) without touching any
//! state; persisting the result and marking the period billed is done by
//! [`Subscription::bill_period`](crate::subscription::Subscription::bill_period).

mod document;
mod store;
mod synthesis;

pub use document::{Invoice, InvoiceDraft, InvoiceLine, InvoiceTotals};
pub use store::{InvoiceStore, MemoryInvoiceStore};
pub use synthesis::{BillingContext, EffectiveParameters, synthesize_invoice};
