//! Versioned price grids.
//!
//! A grid holds one [`PriceLine`] per product: energy prices in €/kWh and
//! subscription fees as a monthly price for 3 kVA, prorated linearly by
//! power. Grids are dated, but the grid used for invoicing is the one flagged
//! current in the [`PriceGridRegistry`].
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use kilowatt::core::ProductCatalog;
//! use kilowatt::grid::*;
//! use rust_decimal_macros::dec;
//!
//! let mut grids = PriceGridRegistry::new();
//! grids.create(
//!     PriceGridBuilder::new("2024", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
//!         .current(true)
//!         .line(PriceLine::subscription_fee("SUBSCRIPTION", dec!(12.00)))
//!         .line(PriceLine::energy("ENERGY_BASE", dec!(0.2276))),
//! ).unwrap();
//!
//! let grid = grids.get_active_grid(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).unwrap();
//! let daily = compute_subscription_fee_daily(
//!     grid, &ProductCatalog::standard(), dec!(6), dec!(0), false,
//! ).unwrap();
//! assert_eq!(daily, dec!(0.80));
//! ```

mod fee;
mod registry;
mod version;

pub use fee::compute_subscription_fee_daily;
pub use registry::PriceGridRegistry;
pub use version::{PriceGridBuilder, PriceGridVersion, PriceKind, PriceLine};
