use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::BillingError;

/// The products invoice synthesis needs to know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingProduct {
    StandardSubscription,
    SolidaritySubscription,
    BaseEnergy,
    PeakEnergy,
    OffPeakEnergy,
}

impl BillingProduct {
    /// Subscription-fee product for the given solidarity flag.
    pub fn subscription(solidarity: bool) -> Self {
        if solidarity {
            Self::SolidaritySubscription
        } else {
            Self::StandardSubscription
        }
    }
}

impl fmt::Display for BillingProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StandardSubscription => "standard subscription",
            Self::SolidaritySubscription => "solidarity subscription",
            Self::BaseEnergy => "base energy",
            Self::PeakEnergy => "peak energy",
            Self::OffPeakEnergy => "off-peak energy",
        };
        f.write_str(name)
    }
}

/// A catalog entry. Price lines refer to products by `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub code: String,
    pub name: String,
}

impl Product {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Mapping from [`BillingProduct`] to catalog products, set up once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    products: HashMap<BillingProduct, Product>,
}

impl ProductCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The usual five products.
    pub fn standard() -> Self {
        Self::new()
            .with(
                BillingProduct::StandardSubscription,
                Product::new("SUBSCRIPTION", "Subscription"),
            )
            .with(
                BillingProduct::SolidaritySubscription,
                Product::new("SUBSCRIPTION_SOLIDARITY", "Solidarity subscription"),
            )
            .with(
                BillingProduct::BaseEnergy,
                Product::new("ENERGY_BASE", "Base energy"),
            )
            .with(
                BillingProduct::PeakEnergy,
                Product::new("ENERGY_HP", "Peak hours energy"),
            )
            .with(
                BillingProduct::OffPeakEnergy,
                Product::new("ENERGY_HC", "Off-peak hours energy"),
            )
    }

    pub fn with(mut self, kind: BillingProduct, product: Product) -> Self {
        self.products.insert(kind, product);
        self
    }

    /// Look up the product for `kind`.
    pub fn resolve(&self, kind: BillingProduct) -> Result<&Product, BillingError> {
        self.products
            .get(&kind)
            .ok_or_else(|| BillingError::UnresolvedProduct(kind.to_string()))
    }
}
