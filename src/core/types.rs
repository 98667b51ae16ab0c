use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::BillingError;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a price grid version.
    GridId
);
id_type!(
    /// Identifier of a subscription.
    SubscriptionId
);
id_type!(
    /// Identifier of a billing period.
    PeriodId
);
id_type!(
    /// Identifier of an invoice in the document store.
    InvoiceId
);

/// Metering scheme of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffType {
    /// Flat price whatever the time of day.
    Base,
    /// Peak hours / off-peak hours.
    HpHc,
}

impl TariffType {
    /// Canonical key, as stored on the subscription.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::HpHc => "hp_hc",
        }
    }

    /// Human label, as snapshotted on billing periods.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Base => "Base",
            Self::HpHc => "Peak / Off-peak hours",
        }
    }

    /// Parse from the canonical key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "base" => Some(Self::Base),
            "hp_hc" | "hphc" => Some(Self::HpHc),
            _ => None,
        }
    }

    /// Resolve a snapshotted tariff value.
    ///
    /// Snapshots may hold either the key or a label, so anything equal to
    /// `"base"` or containing `"Base"` is Base and everything else is HP/HC.
    pub fn from_snapshot(value: &str) -> Self {
        if value == "base" || value.contains("Base") {
            Self::Base
        } else {
            Self::HpHc
        }
    }
}

impl fmt::Display for TariffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Subscribed power, one of the standard tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PowerTier(u8);

impl PowerTier {
    /// Standard tiers, in kVA.
    pub const STANDARD: [u8; 9] = [3, 6, 9, 12, 15, 18, 24, 30, 36];

    pub fn new(kva: u8) -> Result<Self, BillingError> {
        if Self::STANDARD.contains(&kva) {
            Ok(Self(kva))
        } else {
            Err(BillingError::Builder(format!(
                "{kva} kVA is not a standard power tier"
            )))
        }
    }

    pub fn kva(&self) -> u8 {
        self.0
    }

    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }

    /// Label stored in period snapshots, e.g. "6 kVA".
    pub fn label(&self) -> String {
        format!("{} kVA", self.0)
    }
}

impl TryFrom<u8> for PowerTier {
    type Error = BillingError;

    fn try_from(kva: u8) -> Result<Self, Self::Error> {
        Self::new(kva)
    }
}

impl From<PowerTier> for u8 {
    fn from(tier: PowerTier) -> u8 {
        tier.0
    }
}

impl fmt::Display for PowerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kVA", self.0)
    }
}

/// Read a power value such as `"6"`, `"6 kVA"` or `"6,5 kVA"`.
///
/// Any positive number up to [`MAX_POWER_KVA`] is accepted, including
/// non-standard tiers.
pub fn parse_power_kva(raw: &str) -> Result<Decimal, BillingError> {
    let trimmed = raw.trim();
    let number = trimmed
        .strip_suffix("kVA")
        .or_else(|| trimmed.strip_suffix("kva"))
        .unwrap_or(trimmed)
        .trim()
        .replace(',', ".");
    match Decimal::from_str(&number) {
        Ok(kva) if kva > Decimal::ZERO && kva <= MAX_POWER_KVA => Ok(kva),
        _ => Err(BillingError::InvalidPowerFormat(raw.to_string())),
    }
}

/// Nature of a billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Monthly,
    Regularization,
    Adjustment,
}

/// How the customer pays. Recorded only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    DirectDebit,
    EnergyCheque,
    LocalCurrency,
    Cash,
    Transfer,
    Cheque,
}

/// Share of a combined provision that goes to peak hours when no split
/// target exists.
pub const DEFAULT_PEAK_SHARE: Decimal = dec!(0.70);

/// Largest power value read from a snapshot.
pub const MAX_POWER_KVA: Decimal = dec!(1000);

/// Largest energy reading or billed quantity accepted for one period.
pub const MAX_PERIOD_KWH: Decimal = dec!(1000000000);
