use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::{
    BillingError, InvoiceId, PaymentMode, PeriodId, PeriodKind, PowerTier, TariffType,
};
use crate::period::{BillingPeriod, Cadrans, NewPeriod, Provisions};
use crate::subscription::Subscription;

/// A subscription as seen by the metering bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSummary {
    pub reference: String,
    pub metering_point: Option<String>,
    pub customer_ref: Option<String>,
    pub active: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub power: PowerTier,
    pub tariff: TariffType,
    pub smoothed: bool,
    pub monthly_provision_kwh: Option<Decimal>,
    pub provision_peak_kwh: Option<Decimal>,
    pub provision_offpeak_kwh: Option<Decimal>,
    pub solidarity_tariff: bool,
    pub payment_mode: Option<PaymentMode>,
}

impl From<&Subscription> for SubscriptionSummary {
    fn from(sub: &Subscription) -> Self {
        Self {
            reference: sub.reference().to_string(),
            metering_point: sub.metering_point.clone(),
            customer_ref: sub.customer_ref.clone(),
            active: sub.active,
            start_date: sub.start_date,
            end_date: sub.end_date,
            power: sub.power,
            tariff: sub.tariff,
            smoothed: sub.smoothed,
            monthly_provision_kwh: sub.monthly_provision_kwh,
            provision_peak_kwh: sub.provision_peak_kwh,
            provision_offpeak_kwh: sub.provision_offpeak_kwh,
            solidarity_tariff: sub.solidarity_tariff,
            payment_mode: sub.payment_mode,
        }
    }
}

/// A billing period as seen by the metering bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub id: PeriodId,
    pub subscription: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: PeriodKind,
    pub label: String,
    pub days: i64,
    pub cadrans: Cadrans,
    pub provisions: Provisions,
    pub turpe_fixed: Decimal,
    pub turpe_variable: Decimal,
    pub invoice: Option<InvoiceId>,
}

impl PeriodSummary {
    pub fn new(sub: &Subscription, period: &BillingPeriod) -> Self {
        Self {
            id: period.id(),
            subscription: sub.reference().to_string(),
            start_date: period.start_date(),
            end_date: period.end_date(),
            kind: period.kind(),
            label: period.label(),
            days: period.days(),
            cadrans: period.cadrans,
            provisions: period.provisions,
            turpe_fixed: period.turpe_fixed,
            turpe_variable: period.turpe_variable,
            invoice: period.invoice_ref(),
        }
    }
}

/// Ad-hoc period creation for the subscription with the given reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingPeriodRequest {
    pub subscription: String,
    #[serde(flatten)]
    pub period: NewPeriod,
}

/// Metered values for one existing period. Absent fields are left as they
/// are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionUpdate {
    pub period_id: PeriodId,
    #[serde(default)]
    pub cadrans: Option<Cadrans>,
    #[serde(default)]
    pub turpe_fixed: Option<Decimal>,
    #[serde(default)]
    pub turpe_variable: Option<Decimal>,
    /// Explicit billed quantities; otherwise non-smoothed periods take them
    /// from the cadrans.
    #[serde(default)]
    pub provisions: Option<Provisions>,
}

impl ConsumptionUpdate {
    pub fn new(period_id: PeriodId) -> Self {
        Self {
            period_id,
            cadrans: None,
            turpe_fixed: None,
            turpe_variable: None,
            provisions: None,
        }
    }

    pub fn cadrans(mut self, cadrans: Cadrans) -> Self {
        self.cadrans = Some(cadrans);
        self
    }

    pub fn turpe(mut self, fixed: Decimal, variable: Decimal) -> Self {
        self.turpe_fixed = Some(fixed);
        self.turpe_variable = Some(variable);
        self
    }

    pub fn provisions(mut self, provisions: Provisions) -> Self {
        self.provisions = Some(provisions);
        self
    }

    pub(super) fn check(&self) -> Result<(), BillingError> {
        let amounts = [self.turpe_fixed, self.turpe_variable];
        if amounts.iter().flatten().any(|a| *a < Decimal::ZERO) {
            return Err(BillingError::Builder(format!(
                "period {}: TURPE amounts cannot be negative",
                self.period_id
            )));
        }
        let with_period = |e: BillingError| match e {
            BillingError::Builder(msg) => {
                BillingError::Builder(format!("period {}: {msg}", self.period_id))
            }
            other => other,
        };
        if let Some(cadrans) = &self.cadrans {
            cadrans.validate().map_err(with_period)?;
        }
        if let Some(provisions) = &self.provisions {
            provisions.validate().map_err(with_period)?;
        }
        Ok(())
    }
}

/// Decode a bridge payload.
pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, BillingError> {
    serde_json::from_str(json).map_err(|e| BillingError::Builder(format!("invalid payload: {e}")))
}

/// Encode a bridge response.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, BillingError> {
    serde_json::to_string(value)
        .map_err(|e| BillingError::Builder(format!("cannot encode response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn consumption_update_accepts_partial_json() {
        let update: ConsumptionUpdate =
            from_json(r#"{"period_id": 7, "turpe_fixed": "8.50"}"#).unwrap();
        assert_eq!(update.period_id, PeriodId(7));
        assert_eq!(update.turpe_fixed, Some(dec!(8.50)));
        assert!(update.cadrans.is_none());
        assert!(update.turpe_variable.is_none());
    }

    #[test]
    fn period_request_is_flat() {
        let request: BillingPeriodRequest = from_json(
            r#"{
                "subscription": "SUB-00001",
                "start_date": "2024-03-01",
                "end_date": "2024-04-01",
                "kind": "regularization",
                "turpe_fixed": "3.10"
            }"#,
        )
        .unwrap();
        assert_eq!(request.subscription, "SUB-00001");
        assert_eq!(request.period.kind, PeriodKind::Regularization);
        assert_eq!(request.period.turpe_fixed, dec!(3.10));
        assert_eq!(request.period.cadrans, Cadrans::default());
    }

    #[test]
    fn negative_readings_are_rejected() {
        let update = ConsumptionUpdate::new(PeriodId(1)).cadrans(Cadrans::new(
            dec!(-1),
            dec!(0),
            dec!(0),
            dec!(0),
        ));
        assert!(matches!(update.check(), Err(BillingError::Builder(_))));
    }

    #[test]
    fn oversized_readings_are_rejected() {
        let update: ConsumptionUpdate = from_json(
            r#"{
                "period_id": 3,
                "cadrans": {
                    "peak_high_season": "79228162514264337593543950335",
                    "peak_low_season": "79228162514264337593543950335",
                    "offpeak_high_season": "0",
                    "offpeak_low_season": "0"
                }
            }"#,
        )
        .unwrap();
        let err = update.check().unwrap_err();
        assert!(err.to_string().contains("period #3: energy reading out of range"));

        let update = ConsumptionUpdate::new(PeriodId(3))
            .provisions(Provisions::base(Decimal::MAX));
        assert!(matches!(update.check(), Err(BillingError::Builder(_))));
    }

    #[test]
    fn garbage_is_a_builder_error() {
        let err = from_json::<ConsumptionUpdate>("{not json").unwrap_err();
        assert!(err.to_string().starts_with("builder error: invalid payload"));
    }
}
