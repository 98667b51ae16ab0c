use chrono::NaiveDate;

use super::payload::{BillingPeriodRequest, ConsumptionUpdate, PeriodSummary, SubscriptionSummary};
use crate::core::{BillingError, PeriodId, TariffType};
use crate::engine::BillingEngine;
use crate::invoice::InvoiceStore;
use crate::period::{BillingPeriod, Provisions};
use crate::subscription::{PartnerRegistry, Subscription};

impl<P, S> BillingEngine<P, S>
where
    P: PartnerRegistry,
    S: InvoiceStore,
{
    /// Subscriptions attached to any of the given metering points.
    pub fn get_subscriptions_by_metering_point<T: AsRef<str>>(
        &self,
        metering_points: &[T],
    ) -> Vec<SubscriptionSummary> {
        self.subscriptions()
            .filter(|sub| {
                sub.metering_point
                    .as_deref()
                    .is_some_and(|pdl| metering_points.iter().any(|m| m.as_ref() == pdl))
            })
            .map(SubscriptionSummary::from)
            .collect()
    }

    /// Periods of a subscription lying entirely within `from..=to`. A missing
    /// bound leaves that side open.
    pub fn get_billing_periods(
        &self,
        subscription: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<PeriodSummary>, BillingError> {
        let sub = self.by_reference(subscription)?;
        Ok(sub
            .periods()
            .iter()
            .filter(|p| from.is_none_or(|from| p.start_date() >= from))
            .filter(|p| to.is_none_or(|to| p.end_date() <= to))
            .map(|p| PeriodSummary::new(sub, p))
            .collect())
    }

    pub fn create_billing_period(
        &mut self,
        request: BillingPeriodRequest,
    ) -> Result<PeriodSummary, BillingError> {
        let sub_id = self.by_reference(&request.subscription)?.id();
        let period_id = self.create_period(sub_id, request.period)?;

        let sub = self.subscription(sub_id)?;
        let period = sub
            .period(period_id)
            .ok_or(BillingError::UnknownPeriod(period_id))?;
        tracing::info!(
            subscription = %sub.reference(),
            period = %period.label(),
            "Billing period created from bridge"
        );
        Ok(PeriodSummary::new(sub, period))
    }

    /// Write metered values onto existing periods.
    ///
    /// Every update is checked, and every derived quantity computed, before
    /// any is applied: an unknown or already billed period, or a value out of
    /// range, rejects the whole batch. For non-smoothed periods the billed
    /// quantities follow the new cadrans unless the update carries explicit
    /// provisions.
    pub fn update_consumption_data(
        &mut self,
        updates: Vec<ConsumptionUpdate>,
    ) -> Result<usize, BillingError> {
        let mut plan = Vec::with_capacity(updates.len());
        for update in &updates {
            update.check()?;
            let (index, sub, period) = self.locate_period(update.period_id)?;
            period.ensure_unbilled()?;
            let provisions = match update.provisions {
                Some(provisions) => Some(provisions),
                None if !period.snapshot().smoothed() => {
                    let cadrans = update.cadrans.unwrap_or(period.cadrans);
                    Some(Provisions::from_consumption(
                        &cadrans,
                        effective_tariff(sub, period),
                    )?)
                }
                None => None,
            };
            plan.push((index, provisions));
        }
        let count = plan.len();

        for (update, (index, provisions)) in updates.into_iter().zip(plan) {
            let period = self.subscriptions_mut()[index]
                .period_mut(update.period_id)
                .ok_or(BillingError::UnknownPeriod(update.period_id))?;

            if let Some(cadrans) = update.cadrans {
                period.cadrans = cadrans;
            }
            if let Some(amount) = update.turpe_fixed {
                period.turpe_fixed = amount;
            }
            if let Some(amount) = update.turpe_variable {
                period.turpe_variable = amount;
            }
            if let Some(provisions) = provisions {
                period.provisions = provisions;
            }
            tracing::debug!(period = %update.period_id, "Consumption data updated");
        }

        tracing::info!(count, "Consumption data received");
        Ok(count)
    }

    fn by_reference(&self, reference: &str) -> Result<&Subscription, BillingError> {
        self.find_by_reference(reference)
            .ok_or_else(|| BillingError::UnknownReference(reference.to_string()))
    }

    /// The owning subscription with its index, and the period itself.
    fn locate_period(
        &self,
        id: PeriodId,
    ) -> Result<(usize, &Subscription, &BillingPeriod), BillingError> {
        self.subscriptions()
            .enumerate()
            .find_map(|(index, sub)| sub.period(id).map(|p| (index, sub, p)))
            .ok_or(BillingError::UnknownPeriod(id))
    }
}

/// Tariff the period is billed with: its snapshot, else the live one.
fn effective_tariff(sub: &Subscription, period: &BillingPeriod) -> TariffType {
    period
        .snapshot()
        .tariff_type()
        .map(TariffType::from_snapshot)
        .unwrap_or(sub.tariff)
}
