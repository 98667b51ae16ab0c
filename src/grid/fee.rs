use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::version::{PriceGridVersion, PriceKind};
use crate::core::{BillingError, BillingProduct, ProductCatalog};

/// Daily subscription fee for a given power.
///
/// `daily = base_per_3kva_month * (power_kva / 3) * (1 + pro_surcharge_percent / 100) / 30`
///
/// The fee is linear in power, so any positive value works, standard tier or
/// not. The solidarity flag selects the solidarity subscription product
/// instead of the standard one.
pub fn compute_subscription_fee_daily(
    grid: &PriceGridVersion,
    catalog: &ProductCatalog,
    power_kva: Decimal,
    pro_surcharge_percent: Decimal,
    solidarity: bool,
) -> Result<Decimal, BillingError> {
    let product = catalog.resolve(BillingProduct::subscription(solidarity))?;
    let line = grid
        .line(&product.code, PriceKind::SubscriptionFee)
        .ok_or_else(|| BillingError::MissingPriceLine {
            grid: grid.name().to_string(),
            product: product.name.clone(),
        })?;

    let overflow = || {
        BillingError::Arithmetic(format!(
            "subscription fee for {power_kva} kVA in grid '{}' overflows",
            grid.name()
        ))
    };
    let mut monthly = line
        .base_price_per_3kva_month
        .checked_mul(power_kva)
        .ok_or_else(overflow)?
        / dec!(3);
    if pro_surcharge_percent > Decimal::ZERO {
        let factor = Decimal::ONE
            .checked_add(pro_surcharge_percent / dec!(100))
            .ok_or_else(overflow)?;
        monthly = monthly.checked_mul(factor).ok_or_else(overflow)?;
    }
    Ok(monthly / dec!(30))
}
