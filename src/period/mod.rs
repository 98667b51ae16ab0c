//! Billing periods.
//!
//! A period captures the four cadran readings of one invoicing interval, the
//! quantities to bill, the TURPE amounts to show, and a snapshot of the
//! subscription parameters in force when it was created.

mod factory;
mod model;

pub use factory::{NewPeriod, create_period, monthly_interval, smoothed_provisions};
pub use model::{BillingPeriod, Cadrans, ParameterSnapshot, Provisions};
