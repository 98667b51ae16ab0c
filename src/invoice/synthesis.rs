use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};

use super::document::{InvoiceDraft, InvoiceLine};
use crate::core::{
    BillingConfig, BillingError, BillingProduct, ProductCatalog, TariffType, parse_power_kva,
};
use crate::grid::{PriceGridRegistry, PriceGridVersion, compute_subscription_fee_daily};
use crate::period::BillingPeriod;
use crate::subscription::Subscription;

/// Read-only inputs of invoice synthesis.
#[derive(Debug, Clone, Copy)]
pub struct BillingContext<'a> {
    pub grids: &'a PriceGridRegistry,
    pub catalog: &'a ProductCatalog,
    pub config: &'a BillingConfig,
}

/// Contract parameters a period is billed with: the period's snapshot, or
/// the subscription's live values where the snapshot has none.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveParameters {
    pub power_kva: Decimal,
    pub tariff: TariffType,
    pub solidarity: bool,
    pub pro_surcharge_percent: Decimal,
}

impl EffectiveParameters {
    pub fn resolve(
        subscription: &Subscription,
        period: &BillingPeriod,
    ) -> Result<Self, BillingError> {
        let snapshot = period.snapshot();
        let power_kva = match snapshot.power_tier() {
            Some(raw) => parse_power_kva(raw)?,
            None => subscription.power.as_decimal(),
        };
        let tariff = snapshot
            .tariff_type()
            .map(TariffType::from_snapshot)
            .unwrap_or(subscription.tariff);
        let pro_surcharge_percent = snapshot
            .pro_surcharge_percent()
            .unwrap_or(subscription.pro_surcharge_percent);

        Ok(Self {
            power_kva,
            tariff,
            solidarity: snapshot.solidarity(),
            pro_surcharge_percent,
        })
    }

    /// "PRO" for professional customers (any surcharge), "PART" otherwise.
    pub fn customer_marker(&self) -> &'static str {
        if self.pro_surcharge_percent > Decimal::ZERO {
            "PRO"
        } else {
            "PART"
        }
    }
}

/// Build the invoice line list for one period.
///
/// Nothing is persisted: any error leaves no trace. Layout:
///
/// 1. section "Subscription", the subscription-fee line (days × daily fee),
///    a fixed TURPE note when non-zero
/// 2. section "Energy", one Base line or both Peak and Off-peak lines (even
///    at zero quantity), a variable TURPE note when non-zero
pub fn synthesize_invoice(
    subscription: &Subscription,
    period: &BillingPeriod,
    customer_ref: &str,
    ctx: &BillingContext<'_>,
) -> Result<InvoiceDraft, BillingError> {
    period.ensure_unbilled()?;

    let grid = ctx.grids.get_active_grid(period.end_date())?;
    let prices = grid.price_map();
    let params = EffectiveParameters::resolve(subscription, period)?;

    let mut lines = Vec::with_capacity(8);

    lines.push(InvoiceLine::section(&ctx.config.subscription_section));
    let fee_product = ctx
        .catalog
        .resolve(BillingProduct::subscription(params.solidarity))?;
    let daily_fee = compute_subscription_fee_daily(
        grid,
        ctx.catalog,
        params.power_kva,
        params.pro_surcharge_percent,
        params.solidarity,
    )?;
    lines.push(InvoiceLine::product(
        fee_product.code.clone(),
        format!(
            "{} {} kVA {}",
            fee_product.name,
            params.power_kva.normalize(),
            params.customer_marker()
        ),
        Decimal::from(period.days()),
        daily_fee,
    ));
    if period.turpe_fixed > Decimal::ZERO {
        lines.push(InvoiceLine::note(format!(
            "Including fixed TURPE: {}€",
            money(period.turpe_fixed)
        )));
    }

    lines.push(InvoiceLine::section(&ctx.config.energy_section));
    match params.tariff {
        TariffType::Base => {
            lines.push(energy_line(
                grid,
                &prices,
                ctx.catalog,
                BillingProduct::BaseEnergy,
                period.provisions.base_kwh,
            )?);
        }
        TariffType::HpHc => {
            lines.push(energy_line(
                grid,
                &prices,
                ctx.catalog,
                BillingProduct::PeakEnergy,
                period.provisions.peak_kwh,
            )?);
            lines.push(energy_line(
                grid,
                &prices,
                ctx.catalog,
                BillingProduct::OffPeakEnergy,
                period.provisions.offpeak_kwh,
            )?);
        }
    }
    if period.turpe_variable > Decimal::ZERO {
        lines.push(InvoiceLine::note(format!(
            "Including variable TURPE: {}€",
            money(period.turpe_variable)
        )));
    }

    let draft = InvoiceDraft {
        customer_ref: customer_ref.to_string(),
        subscription_ref: subscription.reference().to_string(),
        period_id: period.id(),
        date: period.end_date(),
        currency: ctx.config.currency.clone(),
        lines,
    };
    draft.net_total()?;
    Ok(draft)
}

fn energy_line(
    grid: &PriceGridVersion,
    prices: &HashMap<String, Decimal>,
    catalog: &ProductCatalog,
    kind: BillingProduct,
    quantity: Decimal,
) -> Result<InvoiceLine, BillingError> {
    let product = catalog.resolve(kind)?;
    let unit_price = prices
        .get(&product.code)
        .copied()
        .ok_or_else(|| BillingError::MissingPriceLine {
            grid: grid.name().to_string(),
            product: product.name.clone(),
        })?;
    Ok(InvoiceLine::product(
        product.code.clone(),
        product.name.clone(),
        quantity,
        unit_price,
    ))
}

fn money(amount: Decimal) -> String {
    let mut cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    cents.to_string()
}
