use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::model::{BillingPeriod, Cadrans, ParameterSnapshot, Provisions};
use crate::core::{BillingConfig, BillingError, PeriodId, PeriodKind, TariffType};
use crate::subscription::Subscription;

/// Input for a new billing period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: PeriodKind,
    #[serde(default)]
    pub cadrans: Cadrans,
    #[serde(default)]
    pub turpe_fixed: Decimal,
    #[serde(default)]
    pub turpe_variable: Decimal,
    /// Explicit billed quantities. When absent they come from the
    /// subscription's smoothing targets.
    #[serde(default)]
    pub provisions: Option<Provisions>,
    /// Stored snapshot for periods imported from another system. When absent
    /// the subscription's current parameters are captured.
    #[serde(default)]
    pub snapshot: Option<ParameterSnapshot>,
}

impl NewPeriod {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, kind: PeriodKind) -> Self {
        Self {
            start_date,
            end_date,
            kind,
            cadrans: Cadrans::default(),
            turpe_fixed: Decimal::ZERO,
            turpe_variable: Decimal::ZERO,
            provisions: None,
            snapshot: None,
        }
    }

    pub fn monthly(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self::new(start_date, end_date, PeriodKind::Monthly)
    }

    pub fn with_cadrans(mut self, cadrans: Cadrans) -> Self {
        self.cadrans = cadrans;
        self
    }

    pub fn with_turpe(mut self, fixed: Decimal, variable: Decimal) -> Self {
        self.turpe_fixed = fixed;
        self.turpe_variable = variable;
        self
    }

    pub fn with_provisions(mut self, provisions: Provisions) -> Self {
        self.provisions = Some(provisions);
        self
    }

    pub fn with_snapshot(mut self, snapshot: ParameterSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

/// Build a period for `subscription`, snapshotting its parameters.
pub fn create_period(
    subscription: &Subscription,
    id: PeriodId,
    new: NewPeriod,
    config: &BillingConfig,
) -> Result<BillingPeriod, BillingError> {
    if new.end_date <= new.start_date {
        return Err(BillingError::Builder(format!(
            "period end ({}) must be after its start ({})",
            new.end_date, new.start_date
        )));
    }
    if new.turpe_fixed < Decimal::ZERO || new.turpe_variable < Decimal::ZERO {
        return Err(BillingError::Builder(
            "TURPE amounts cannot be negative".into(),
        ));
    }

    new.cadrans.validate()?;
    if let Some(provisions) = &new.provisions {
        provisions.validate()?;
    }

    let snapshot = new
        .snapshot
        .unwrap_or_else(|| ParameterSnapshot::capture(subscription));
    let provisions = new
        .provisions
        .unwrap_or_else(|| snapshot_provisions(&snapshot, subscription, config));

    let mut period = BillingPeriod::new(
        id,
        subscription.id(),
        new.start_date,
        new.end_date,
        new.kind,
        new.cadrans,
        provisions,
        snapshot,
    );
    period.turpe_fixed = new.turpe_fixed;
    period.turpe_variable = new.turpe_variable;
    Ok(period)
}

/// Billed quantities for a smoothed subscription.
///
/// Base tariffs bill the monthly target. HP/HC tariffs bill the split targets
/// when either is set, otherwise the combined target split by
/// [`BillingConfig::peak_share`]. Non-smoothed subscriptions get zero until
/// real consumption is known.
pub fn smoothed_provisions(subscription: &Subscription, config: &BillingConfig) -> Provisions {
    snapshot_provisions(&ParameterSnapshot::capture(subscription), subscription, config)
}

/// Initial billed quantities under `snapshot`.
///
/// Smoothing, tariff and the combined target come from the snapshot. The
/// split targets are not snapshotted and are read from the subscription.
fn snapshot_provisions(
    snapshot: &ParameterSnapshot,
    subscription: &Subscription,
    config: &BillingConfig,
) -> Provisions {
    if !snapshot.smoothed() {
        return Provisions::default();
    }
    let tariff = snapshot
        .tariff_type()
        .map(TariffType::from_snapshot)
        .unwrap_or(subscription.tariff);
    let monthly = snapshot
        .monthly_provision_kwh()
        .or(subscription.monthly_provision_kwh);
    match tariff {
        TariffType::Base => Provisions::base(monthly.unwrap_or(Decimal::ZERO)),
        TariffType::HpHc => {
            match (
                subscription.provision_peak_kwh,
                subscription.provision_offpeak_kwh,
            ) {
                (None, None) => match monthly {
                    Some(total) => {
                        let peak = total * config.peak_share;
                        Provisions::peak_offpeak(peak, total - peak)
                    }
                    None => Provisions::default(),
                },
                (peak, offpeak) => Provisions::peak_offpeak(
                    peak.unwrap_or(Decimal::ZERO),
                    offpeak.unwrap_or(Decimal::ZERO),
                ),
            }
        }
    }
}

/// The canonical monthly interval for a sweep run on `today`: first day of
/// the previous month to first day of the current month.
pub fn monthly_interval(today: NaiveDate) -> Result<(NaiveDate, NaiveDate), BillingError> {
    let current = today.with_day(1);
    let previous = current
        .and_then(|first| first.pred_opt())
        .and_then(|last| last.with_day(1));
    match (previous, current) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(BillingError::Builder(format!(
            "no previous month for {today}"
        ))),
    }
}
