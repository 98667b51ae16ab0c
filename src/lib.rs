//! # kilowatt
//!
//! Billing engine for electricity supply subscriptions: versioned price
//! grids, monthly billing periods with cadran readings and smoothed
//! provisions, and invoice-line synthesis for Base and Peak/Off-peak (HP/HC)
//! tariffs.
//!
//! All monetary values and quantities use [`rust_decimal::Decimal`], never
//! floating point. Each billing period keeps a snapshot of the contract
//! parameters it was created under, so later contract changes never alter
//! how a past period is billed.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use kilowatt::core::*;
//! use kilowatt::engine::BillingEngine;
//! use kilowatt::grid::{PriceGridBuilder, PriceLine};
//! use kilowatt::invoice::{InvoiceStore, MemoryInvoiceStore};
//! use kilowatt::period::{Cadrans, NewPeriod};
//! use kilowatt::subscription::{MemoryPartnerRegistry, SubscriptionBuilder};
//! use rust_decimal_macros::dec;
//!
//! let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
//!
//! let mut engine = BillingEngine::new(
//!     BillingConfig::default(),
//!     ProductCatalog::standard(),
//!     MemoryPartnerRegistry::new().with("CUST-1", "Jeanne Martin"),
//!     MemoryInvoiceStore::new("INV-", 2024),
//! ).unwrap();
//! engine.grids_mut().create(
//!     PriceGridBuilder::new("Tariffs 2024", date(2024, 1, 1))
//!         .current(true)
//!         .line(PriceLine::subscription_fee("SUBSCRIPTION", dec!(12.00)))
//!         .line(PriceLine::energy("ENERGY_BASE", dec!(0.2276))),
//! ).unwrap();
//!
//! let sub = engine.register_subscription(
//!     SubscriptionBuilder::new(PowerTier::new(6).unwrap(), TariffType::Base).customer("CUST-1"),
//! ).unwrap();
//! let period = engine.create_period(
//!     sub,
//!     NewPeriod::monthly(date(2024, 1, 1), date(2024, 1, 31))
//!         .with_cadrans(Cadrans::new(dec!(0), dec!(0), dec!(100), dec!(0))),
//! ).unwrap();
//!
//! // 30 days at 6 kVA: 12.00 × 6/3 / 30 = 0.80 a day. Consumption is not
//! // smoothed, so the energy line bills nothing until provisions are set.
//! let draft = engine.preview_invoice(sub, period).unwrap();
//! assert_eq!(draft.net_total().unwrap(), dec!(24.00));
//!
//! let invoice = engine.bill_period(sub, period).unwrap();
//! assert_eq!(engine.store().get_invoice(invoice).unwrap().number, "INV-2024-001");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Price grids, periods, subscriptions, invoice synthesis, engine |
//! | `bridge` | Metering-bridge API with JSON payloads |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod grid;

#[cfg(feature = "core")]
pub mod period;

#[cfg(feature = "core")]
pub mod subscription;

#[cfg(feature = "core")]
pub mod invoice;

#[cfg(feature = "core")]
pub mod engine;

#[cfg(feature = "bridge")]
pub mod bridge;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
