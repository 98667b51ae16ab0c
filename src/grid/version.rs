use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::core::{BillingError, GridId};

/// How a price line is entered and used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceKind {
    /// Monthly fee for a 3 kVA base, prorated by power.
    SubscriptionFee,
    /// Price per kWh.
    Energy,
    /// Flat amount.
    Other,
}

impl PriceKind {
    /// Unit the administrator enters the price in.
    pub fn entry_unit(&self) -> &'static str {
        match self {
            Self::SubscriptionFee => "€/month (3 kVA base)",
            Self::Energy => "€/kWh",
            Self::Other => "€",
        }
    }

    /// Unit of [`PriceLine::internal_price`].
    pub fn computation_unit(&self) -> &'static str {
        match self {
            Self::SubscriptionFee => "€/day",
            Self::Energy => "€/kWh",
            Self::Other => "€",
        }
    }
}

/// One product's price inside a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLine {
    /// Catalog code of the priced product.
    pub product_code: String,
    pub kind: PriceKind,
    /// Monthly price for 3 kVA. Only meaningful for subscription fees.
    pub base_price_per_3kva_month: Decimal,
    /// Unit price. Only meaningful for energy and other lines.
    pub unit_price: Decimal,
}

impl PriceLine {
    pub fn subscription_fee(product_code: impl Into<String>, per_3kva_month: Decimal) -> Self {
        Self {
            product_code: product_code.into(),
            kind: PriceKind::SubscriptionFee,
            base_price_per_3kva_month: per_3kva_month,
            unit_price: Decimal::ZERO,
        }
    }

    pub fn energy(product_code: impl Into<String>, per_kwh: Decimal) -> Self {
        Self {
            product_code: product_code.into(),
            kind: PriceKind::Energy,
            base_price_per_3kva_month: Decimal::ZERO,
            unit_price: per_kwh,
        }
    }

    pub fn other(product_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            product_code: product_code.into(),
            kind: PriceKind::Other,
            base_price_per_3kva_month: Decimal::ZERO,
            unit_price: amount,
        }
    }

    /// Price used in computations: the daily rate per 3 kVA for subscription
    /// fees, the unit price otherwise.
    pub fn internal_price(&self) -> Decimal {
        match self.kind {
            PriceKind::SubscriptionFee => self.base_price_per_3kva_month / dec!(30),
            PriceKind::Energy | PriceKind::Other => self.unit_price,
        }
    }
}

/// A dated version of the price table.
///
/// Only `valid_until` (auto-close) and `is_current` change after creation,
/// and only through [`PriceGridRegistry`](super::PriceGridRegistry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceGridVersion {
    id: GridId,
    name: String,
    valid_from: NaiveDate,
    pub(super) valid_until: Option<NaiveDate>,
    pub(super) is_current: bool,
    lines: Vec<PriceLine>,
}

impl PriceGridVersion {
    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn valid_from(&self) -> NaiveDate {
        self.valid_from
    }

    /// Last day of validity; `None` while the grid is open-ended.
    pub fn valid_until(&self) -> Option<NaiveDate> {
        self.valid_until
    }

    pub fn is_current(&self) -> bool {
        self.is_current
    }

    pub fn is_open(&self) -> bool {
        self.valid_until.is_none()
    }

    pub fn lines(&self) -> &[PriceLine] {
        &self.lines
    }

    /// Whether `date` falls inside `[valid_from, valid_until]`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.valid_from && self.valid_until.is_none_or(|until| date <= until)
    }

    /// The line of `kind` for `product_code`, if any.
    pub fn line(&self, product_code: &str, kind: PriceKind) -> Option<&PriceLine> {
        self.lines
            .iter()
            .find(|l| l.product_code == product_code && l.kind == kind)
    }

    /// Internal prices of all energy and other lines, keyed by product code.
    pub fn price_map(&self) -> HashMap<String, Decimal> {
        self.lines
            .iter()
            .filter(|l| l.kind != PriceKind::SubscriptionFee)
            .map(|l| (l.product_code.clone(), l.internal_price()))
            .collect()
    }
}

/// Builder for a new grid version, handed to
/// [`PriceGridRegistry::create`](super::PriceGridRegistry::create).
#[derive(Debug, Clone)]
pub struct PriceGridBuilder {
    name: String,
    valid_from: NaiveDate,
    valid_until: Option<NaiveDate>,
    is_current: bool,
    lines: Vec<PriceLine>,
}

impl PriceGridBuilder {
    pub fn new(name: impl Into<String>, valid_from: NaiveDate) -> Self {
        Self {
            name: name.into(),
            valid_from,
            valid_until: None,
            is_current: false,
            lines: Vec::new(),
        }
    }

    pub fn valid_until(mut self, date: NaiveDate) -> Self {
        self.valid_until = Some(date);
        self
    }

    /// Flag the new grid as the current one.
    pub fn current(mut self, is_current: bool) -> Self {
        self.is_current = is_current;
        self
    }

    pub fn line(mut self, line: PriceLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn lines(mut self, lines: impl IntoIterator<Item = PriceLine>) -> Self {
        self.lines.extend(lines);
        self
    }

    pub(super) fn is_current(&self) -> bool {
        self.is_current
    }

    pub(super) fn starts_on(&self) -> NaiveDate {
        self.valid_from
    }

    pub(super) fn build(self, id: GridId) -> Result<PriceGridVersion, BillingError> {
        if self.name.trim().is_empty() {
            return Err(BillingError::Builder("grid name is required".into()));
        }
        if let Some(until) = self.valid_until {
            if until < self.valid_from {
                return Err(BillingError::Builder(format!(
                    "grid '{}' ends ({until}) before it starts ({})",
                    self.name, self.valid_from
                )));
            }
        }

        let mut seen = HashSet::new();
        for line in &self.lines {
            if !seen.insert(line.product_code.as_str()) {
                return Err(BillingError::DuplicatePriceLine {
                    grid: self.name.clone(),
                    product: line.product_code.clone(),
                });
            }
        }

        Ok(PriceGridVersion {
            id,
            name: self.name,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            is_current: self.is_current,
            lines: self.lines,
        })
    }
}
