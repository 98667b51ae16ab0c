use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::BillingError;
use super::types::DEFAULT_PEAK_SHARE;

/// Policy inputs for period creation and invoice synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Share of a combined monthly provision billed as peak hours on smoothed
    /// HP/HC subscriptions. The remainder is off-peak.
    pub peak_share: Decimal,
    /// Invoice currency (ISO 4217).
    pub currency: String,
    /// Label of the section heading the subscription-fee line.
    pub subscription_section: String,
    /// Label of the section heading the energy lines.
    pub energy_section: String,
    /// Prefix of subscription references.
    pub subscription_prefix: String,
    /// Prefix of invoice numbers.
    pub invoice_prefix: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            peak_share: DEFAULT_PEAK_SHARE,
            currency: "EUR".into(),
            subscription_section: "Subscription".into(),
            energy_section: "Energy".into(),
            subscription_prefix: "SUB-".into(),
            invoice_prefix: "INV-".into(),
        }
    }
}

impl BillingConfig {
    /// Read a configuration from JSON. Missing keys take their defaults.
    #[cfg(feature = "bridge")]
    pub fn from_json(json: &str) -> Result<Self, BillingError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| BillingError::Builder(format!("invalid billing config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the policy values are usable.
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.peak_share < Decimal::ZERO || self.peak_share > Decimal::ONE {
            return Err(BillingError::Builder(format!(
                "peak share must be between 0 and 1, got {}",
                self.peak_share
            )));
        }
        if self.currency.len() != 3 {
            return Err(BillingError::Builder(
                "currency code must be 3 characters (ISO 4217)".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`BillingConfig`].
///
/// ```
/// use kilowatt::core::BillingConfigBuilder;
/// use rust_decimal_macros::dec;
///
/// let config = BillingConfigBuilder::new()
///     .peak_share(dec!(0.65))
///     .invoice_prefix("FAC-")
///     .build()
///     .unwrap();
/// assert_eq!(config.peak_share, dec!(0.65));
/// ```
#[derive(Debug, Default)]
pub struct BillingConfigBuilder {
    config: BillingConfig,
}

impl BillingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peak_share(mut self, share: Decimal) -> Self {
        self.config.peak_share = share;
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.config.currency = code.into();
        self
    }

    pub fn section_labels(
        mut self,
        subscription: impl Into<String>,
        energy: impl Into<String>,
    ) -> Self {
        self.config.subscription_section = subscription.into();
        self.config.energy_section = energy.into();
        self
    }

    pub fn subscription_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.subscription_prefix = prefix.into();
        self
    }

    pub fn invoice_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.invoice_prefix = prefix.into();
        self
    }

    pub fn build(self) -> Result<BillingConfig, BillingError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults() {
        let config = BillingConfig::default();
        assert_eq!(config.peak_share, dec!(0.70));
        assert_eq!(config.currency, "EUR");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_share_above_one() {
        let err = BillingConfigBuilder::new().peak_share(dec!(1.2)).build();
        assert!(matches!(err, Err(BillingError::Builder(_))));
    }

    #[test]
    fn rejects_bad_currency() {
        assert!(BillingConfigBuilder::new().currency("EURO").build().is_err());
    }
}
