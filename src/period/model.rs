use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{
    BillingError, InvoiceId, MAX_PERIOD_KWH, PeriodId, PeriodKind, SubscriptionId, TariffType,
};
use crate::subscription::Subscription;

/// Raw energy readings for the four time-of-use buckets, in kWh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cadrans {
    pub peak_high_season: Decimal,
    pub peak_low_season: Decimal,
    pub offpeak_high_season: Decimal,
    pub offpeak_low_season: Decimal,
}

impl Cadrans {
    pub fn new(
        peak_high_season: Decimal,
        peak_low_season: Decimal,
        offpeak_high_season: Decimal,
        offpeak_low_season: Decimal,
    ) -> Self {
        Self {
            peak_high_season,
            peak_low_season,
            offpeak_high_season,
            offpeak_low_season,
        }
    }

    pub fn peak(&self) -> Result<Decimal, BillingError> {
        sum_kwh(self.peak_high_season, self.peak_low_season)
    }

    pub fn offpeak(&self) -> Result<Decimal, BillingError> {
        sum_kwh(self.offpeak_high_season, self.offpeak_low_season)
    }

    /// Total consumption, all buckets.
    pub fn base(&self) -> Result<Decimal, BillingError> {
        sum_kwh(self.peak()?, self.offpeak()?)
    }

    /// Reject negative readings and readings above [`MAX_PERIOD_KWH`].
    pub fn validate(&self) -> Result<(), BillingError> {
        check_kwh(
            "energy reading",
            &[
                self.peak_high_season,
                self.peak_low_season,
                self.offpeak_high_season,
                self.offpeak_low_season,
            ],
        )
    }
}

/// Quantities billed on the invoice, in kWh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Provisions {
    pub peak_kwh: Decimal,
    pub offpeak_kwh: Decimal,
    pub base_kwh: Decimal,
}

impl Provisions {
    pub fn base(kwh: Decimal) -> Self {
        Self {
            base_kwh: kwh,
            ..Self::default()
        }
    }

    pub fn peak_offpeak(peak_kwh: Decimal, offpeak_kwh: Decimal) -> Self {
        Self {
            peak_kwh,
            offpeak_kwh,
            ..Self::default()
        }
    }

    /// Billed quantities equal to metered consumption.
    pub fn from_consumption(cadrans: &Cadrans, tariff: TariffType) -> Result<Self, BillingError> {
        Ok(match tariff {
            TariffType::Base => Self::base(cadrans.base()?),
            TariffType::HpHc => Self::peak_offpeak(cadrans.peak()?, cadrans.offpeak()?),
        })
    }

    pub fn validate(&self) -> Result<(), BillingError> {
        check_kwh(
            "billed quantity",
            &[self.peak_kwh, self.offpeak_kwh, self.base_kwh],
        )
    }
}

fn sum_kwh(a: Decimal, b: Decimal) -> Result<Decimal, BillingError> {
    a.checked_add(b)
        .ok_or_else(|| BillingError::Arithmetic(format!("{a} kWh + {b} kWh overflows")))
}

fn check_kwh(what: &str, values: &[Decimal]) -> Result<(), BillingError> {
    match values
        .iter()
        .find(|kwh| **kwh < Decimal::ZERO || **kwh > MAX_PERIOD_KWH)
    {
        Some(kwh) => Err(BillingError::Builder(format!(
            "{what} out of range: {kwh} kWh (0 to {MAX_PERIOD_KWH})"
        ))),
        None => Ok(()),
    }
}

/// Subscription parameters in force when a period was created.
///
/// Captured once and never changed, so a period is always invoiced with the
/// parameters of its own time. Tariff and power are kept in their label form
/// ("Base", "6 kVA"); they are empty on periods recorded before snapshots
/// existed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    tariff_type: Option<String>,
    power_tier: Option<String>,
    solidarity: bool,
    smoothed: bool,
    monthly_provision_kwh: Option<Decimal>,
    pro_surcharge_percent: Option<Decimal>,
}

impl ParameterSnapshot {
    pub fn capture(subscription: &Subscription) -> Self {
        Self {
            tariff_type: Some(subscription.tariff.label().to_string()),
            power_tier: Some(subscription.power.label()),
            solidarity: subscription.solidarity_tariff,
            smoothed: subscription.smoothed,
            monthly_provision_kwh: subscription.monthly_provision_kwh,
            pro_surcharge_percent: Some(subscription.pro_surcharge_percent),
        }
    }

    /// Snapshot of a period imported from before snapshots were recorded.
    pub fn legacy(solidarity: bool) -> Self {
        Self {
            solidarity,
            ..Self::default()
        }
    }

    /// Snapshot from raw stored values, as written by external systems.
    pub fn from_stored(
        tariff_type: Option<String>,
        power_tier: Option<String>,
        solidarity: bool,
        smoothed: bool,
        monthly_provision_kwh: Option<Decimal>,
        pro_surcharge_percent: Option<Decimal>,
    ) -> Self {
        Self {
            tariff_type,
            power_tier,
            solidarity,
            smoothed,
            monthly_provision_kwh,
            pro_surcharge_percent,
        }
    }

    pub fn tariff_type(&self) -> Option<&str> {
        self.tariff_type.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn power_tier(&self) -> Option<&str> {
        self.power_tier.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn solidarity(&self) -> bool {
        self.solidarity
    }

    pub fn smoothed(&self) -> bool {
        self.smoothed
    }

    pub fn monthly_provision_kwh(&self) -> Option<Decimal> {
        self.monthly_provision_kwh
    }

    pub fn pro_surcharge_percent(&self) -> Option<Decimal> {
        self.pro_surcharge_percent
    }
}

/// One invoicing interval of one subscription.
///
/// The interval is `[start_date, end_date)`. A period is unbilled until an
/// invoice is linked to it; that link never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingPeriod {
    id: PeriodId,
    subscription_id: SubscriptionId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    kind: PeriodKind,
    pub cadrans: Cadrans,
    pub provisions: Provisions,
    /// Fixed TURPE amount (€), computed externally.
    pub turpe_fixed: Decimal,
    /// Variable TURPE amount (€), computed externally.
    pub turpe_variable: Decimal,
    snapshot: ParameterSnapshot,
    invoice: Option<InvoiceId>,
}

impl BillingPeriod {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: PeriodId,
        subscription_id: SubscriptionId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        kind: PeriodKind,
        cadrans: Cadrans,
        provisions: Provisions,
        snapshot: ParameterSnapshot,
    ) -> Self {
        Self {
            id,
            subscription_id,
            start_date,
            end_date,
            kind,
            cadrans,
            provisions,
            turpe_fixed: Decimal::ZERO,
            turpe_variable: Decimal::ZERO,
            snapshot,
            invoice: None,
        }
    }

    pub fn id(&self) -> PeriodId {
        self.id
    }

    pub fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn kind(&self) -> PeriodKind {
        self.kind
    }

    /// Number of days, end date excluded.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Month and year of the start date, e.g. "January 2024".
    pub fn label(&self) -> String {
        self.start_date.format("%B %Y").to_string()
    }

    pub fn energy_peak(&self) -> Result<Decimal, BillingError> {
        self.cadrans.peak()
    }

    pub fn energy_offpeak(&self) -> Result<Decimal, BillingError> {
        self.cadrans.offpeak()
    }

    pub fn energy_base(&self) -> Result<Decimal, BillingError> {
        self.cadrans.base()
    }

    pub fn snapshot(&self) -> &ParameterSnapshot {
        &self.snapshot
    }

    /// The linked invoice, once billed.
    pub fn invoice_ref(&self) -> Option<InvoiceId> {
        self.invoice
    }

    pub fn is_billed(&self) -> bool {
        self.invoice.is_some()
    }

    pub(crate) fn ensure_unbilled(&self) -> Result<(), BillingError> {
        if self.is_billed() {
            return Err(BillingError::AlreadyBilled {
                period: self.label(),
            });
        }
        Ok(())
    }

    pub(crate) fn mark_billed(&mut self, invoice: InvoiceId) -> Result<(), BillingError> {
        self.ensure_unbilled()?;
        self.invoice = Some(invoice);
        Ok(())
    }

    /// Set the billed quantities from metered consumption. On error the
    /// provisions are left unchanged.
    pub fn derive_provisions_from_consumption(
        &mut self,
        tariff: TariffType,
    ) -> Result<(), BillingError> {
        self.provisions = Provisions::from_consumption(&self.cadrans, tariff)?;
        Ok(())
    }
}
