use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{
    BillingError, InvoiceId, PaymentMode, PeriodId, PowerTier, SubscriptionId, TariffType,
};
use crate::period::BillingPeriod;

/// An electricity supply contract.
///
/// Live parameters are public and may change over time; each billing period
/// keeps its own snapshot of them. The reference and the period list are only
/// changed through the crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    id: SubscriptionId,
    reference: String,
    /// Billing party, as known to the partner registry.
    pub customer_ref: Option<String>,
    /// Inactive subscriptions are left out of the monthly period sweep.
    pub active: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub power: PowerTier,
    pub tariff: TariffType,
    /// Smoothed billing: a fixed provisional quantity is billed every month.
    pub smoothed: bool,
    /// Combined monthly provision target in kWh.
    pub monthly_provision_kwh: Option<Decimal>,
    /// Monthly peak-hours target (HP/HC only).
    pub provision_peak_kwh: Option<Decimal>,
    /// Monthly off-peak-hours target (HP/HC only).
    pub provision_offpeak_kwh: Option<Decimal>,
    pub solidarity_tariff: bool,
    /// Surcharge applied to the subscription fee for professional customers.
    pub pro_surcharge_percent: Decimal,
    pub payment_mode: Option<PaymentMode>,
    /// Metering point identifier (PDL).
    pub metering_point: Option<String>,
    periods: Vec<BillingPeriod>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Sequence-generated reference, fixed at creation.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Billing periods, ordered by start date.
    pub fn periods(&self) -> &[BillingPeriod] {
        &self.periods
    }

    pub fn period(&self, id: PeriodId) -> Option<&BillingPeriod> {
        self.periods.iter().find(|p| p.id() == id)
    }

    pub(crate) fn period_mut(&mut self, id: PeriodId) -> Option<&mut BillingPeriod> {
        self.periods.iter_mut().find(|p| p.id() == id)
    }

    /// Whether a period with exactly these dates exists.
    pub fn has_period(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.periods
            .iter()
            .any(|p| p.start_date() == start && p.end_date() == end)
    }

    /// Invoices of this subscription, through its periods.
    pub fn invoice_ids(&self) -> Vec<InvoiceId> {
        self.periods.iter().filter_map(|p| p.invoice_ref()).collect()
    }

    /// Insert a period, keeping start-date order. Periods with equal start
    /// dates keep their insertion order.
    pub(crate) fn push_period(&mut self, period: BillingPeriod) {
        let at = self
            .periods
            .partition_point(|p| p.start_date() <= period.start_date());
        self.periods.insert(at, period);
    }
}

/// Builder for [`Subscription`].
///
/// ```
/// use kilowatt::core::{PowerTier, TariffType};
/// use kilowatt::subscription::SubscriptionBuilder;
/// use rust_decimal_macros::dec;
///
/// let builder = SubscriptionBuilder::new(PowerTier::new(6).unwrap(), TariffType::Base)
///     .customer("CUST-1")
///     .metering_point("14500000000001")
///     .smoothed(dec!(280));
/// ```
#[derive(Debug, Clone)]
pub struct SubscriptionBuilder {
    customer_ref: Option<String>,
    active: bool,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    power: PowerTier,
    tariff: TariffType,
    smoothed: bool,
    monthly_provision_kwh: Option<Decimal>,
    provision_peak_kwh: Option<Decimal>,
    provision_offpeak_kwh: Option<Decimal>,
    solidarity_tariff: bool,
    pro_surcharge_percent: Decimal,
    payment_mode: Option<PaymentMode>,
    metering_point: Option<String>,
}

impl SubscriptionBuilder {
    pub fn new(power: PowerTier, tariff: TariffType) -> Self {
        Self {
            customer_ref: None,
            active: true,
            start_date: None,
            end_date: None,
            power,
            tariff,
            smoothed: false,
            monthly_provision_kwh: None,
            provision_peak_kwh: None,
            provision_offpeak_kwh: None,
            solidarity_tariff: false,
            pro_surcharge_percent: Decimal::ZERO,
            payment_mode: None,
            metering_point: None,
        }
    }

    pub fn customer(mut self, customer_ref: impl Into<String>) -> Self {
        self.customer_ref = Some(customer_ref.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn dates(mut self, start: NaiveDate, end: Option<NaiveDate>) -> Self {
        self.start_date = Some(start);
        self.end_date = end;
        self
    }

    /// Smoothed billing with a combined monthly target.
    pub fn smoothed(mut self, monthly_kwh: Decimal) -> Self {
        self.smoothed = true;
        self.monthly_provision_kwh = Some(monthly_kwh);
        self
    }

    /// Smoothed billing with separate peak / off-peak monthly targets.
    pub fn smoothed_split(mut self, peak_kwh: Decimal, offpeak_kwh: Decimal) -> Self {
        self.smoothed = true;
        self.provision_peak_kwh = Some(peak_kwh);
        self.provision_offpeak_kwh = Some(offpeak_kwh);
        self
    }

    pub fn solidarity(mut self) -> Self {
        self.solidarity_tariff = true;
        self
    }

    pub fn pro_surcharge(mut self, percent: Decimal) -> Self {
        self.pro_surcharge_percent = percent;
        self
    }

    pub fn payment_mode(mut self, mode: PaymentMode) -> Self {
        self.payment_mode = Some(mode);
        self
    }

    pub fn metering_point(mut self, pdl: impl Into<String>) -> Self {
        self.metering_point = Some(pdl.into());
        self
    }

    pub(crate) fn build(
        self,
        id: SubscriptionId,
        reference: String,
    ) -> Result<Subscription, BillingError> {
        if self.pro_surcharge_percent < Decimal::ZERO {
            return Err(BillingError::Builder(
                "PRO surcharge cannot be negative".into(),
            ));
        }
        let targets = [
            self.monthly_provision_kwh,
            self.provision_peak_kwh,
            self.provision_offpeak_kwh,
        ];
        if targets.iter().flatten().any(|kwh| *kwh < Decimal::ZERO) {
            return Err(BillingError::Builder(
                "provision targets cannot be negative".into(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(BillingError::Builder(format!(
                    "subscription ends ({end}) before it starts ({start})"
                )));
            }
        }

        Ok(Subscription {
            id,
            reference,
            customer_ref: self.customer_ref,
            active: self.active,
            start_date: self.start_date,
            end_date: self.end_date,
            power: self.power,
            tariff: self.tariff,
            smoothed: self.smoothed,
            monthly_provision_kwh: self.monthly_provision_kwh,
            provision_peak_kwh: self.provision_peak_kwh,
            provision_offpeak_kwh: self.provision_offpeak_kwh,
            solidarity_tariff: self.solidarity_tariff,
            pro_surcharge_percent: self.pro_surcharge_percent,
            payment_mode: self.payment_mode,
            metering_point: self.metering_point,
            periods: Vec::new(),
        })
    }
}
