//! Metering-bridge API.
//!
//! The external metering system looks subscriptions up by metering point
//! (PDL), opens ad-hoc billing periods and writes raw cadran readings and
//! TURPE amounts onto periods before they are billed. Requests and responses
//! are serde types; [`from_json`] and [`to_json`] carry them over the wire.
//!
//! # Example
//!
//! ```
//! use kilowatt::bridge::*;
//! use kilowatt::core::*;
//! use kilowatt::engine::BillingEngine;
//! use kilowatt::invoice::MemoryInvoiceStore;
//! use kilowatt::subscription::{MemoryPartnerRegistry, SubscriptionBuilder};
//!
//! let mut engine = BillingEngine::new(
//!     BillingConfig::default(),
//!     ProductCatalog::standard(),
//!     MemoryPartnerRegistry::new(),
//!     MemoryInvoiceStore::new("INV-", 2024),
//! ).unwrap();
//! engine.register_subscription(
//!     SubscriptionBuilder::new(PowerTier::new(9).unwrap(), TariffType::HpHc)
//!         .metering_point("09876543210987"),
//! ).unwrap();
//!
//! let request: BillingPeriodRequest = from_json(r#"{
//!     "subscription": "SUB-00001",
//!     "start_date": "2024-02-01",
//!     "end_date": "2024-03-01",
//!     "kind": "monthly"
//! }"#).unwrap();
//! let period = engine.create_billing_period(request).unwrap();
//! assert_eq!(period.days, 29);
//!
//! let found = engine.get_subscriptions_by_metering_point(&["09876543210987"]);
//! assert_eq!(found[0].reference, "SUB-00001");
//! ```

mod api;
mod payload;

pub use payload::{
    BillingPeriodRequest, ConsumptionUpdate, PeriodSummary, SubscriptionSummary, from_json,
    to_json,
};
