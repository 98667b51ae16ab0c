//! Billing engine: owns grids, subscriptions and their periods, and runs the
//! monthly period sweep and invoicing against an invoice store and a partner
//! registry.
//!
//! Every mutating operation takes `&mut self`, so "resolve grid, read prices,
//! emit lines, mark billed" can never interleave with a grid switch.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use kilowatt::core::*;
//! use kilowatt::engine::BillingEngine;
//! use kilowatt::grid::{PriceGridBuilder, PriceLine};
//! use kilowatt::invoice::MemoryInvoiceStore;
//! use kilowatt::period::NewPeriod;
//! use kilowatt::subscription::{MemoryPartnerRegistry, SubscriptionBuilder};
//! use rust_decimal_macros::dec;
//!
//! let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
//! let mut engine = BillingEngine::new(
//!     BillingConfig::default(),
//!     ProductCatalog::standard(),
//!     MemoryPartnerRegistry::new().with("CUST-1", "Jeanne Martin"),
//!     MemoryInvoiceStore::new("INV-", 2024),
//! ).unwrap();
//!
//! engine.grids_mut().create(
//!     PriceGridBuilder::new("2024", date(2024, 1, 1))
//!         .current(true)
//!         .line(PriceLine::subscription_fee("SUBSCRIPTION", dec!(12.00)))
//!         .line(PriceLine::energy("ENERGY_BASE", dec!(0.2276))),
//! ).unwrap();
//!
//! let sub = engine.register_subscription(
//!     SubscriptionBuilder::new(PowerTier::new(6).unwrap(), TariffType::Base)
//!         .customer("CUST-1")
//!         .smoothed(dec!(280)),
//! ).unwrap();
//! engine.create_period(sub, NewPeriod::monthly(date(2024, 1, 1), date(2024, 1, 31))).unwrap();
//!
//! let invoices = engine.generate_invoices(sub).unwrap();
//! assert_eq!(invoices.len(), 1);
//! ```

use chrono::NaiveDate;

use crate::core::{
    BillingConfig, BillingError, InvoiceId, PeriodId, ProductCatalog, ReferenceSequence,
    SubscriptionId,
};
use crate::grid::PriceGridRegistry;
use crate::invoice::{BillingContext, Invoice, InvoiceDraft, InvoiceStore, synthesize_invoice};
use crate::period::{NewPeriod, create_period, monthly_interval};
use crate::subscription::{PartnerRegistry, Subscription, SubscriptionBuilder};

/// Outcome of invoicing one subscription in a bulk run.
#[derive(Debug)]
pub struct SubscriptionOutcome {
    pub subscription: String,
    pub result: Result<Vec<InvoiceId>, BillingError>,
}

/// Result of [`BillingEngine::generate_all_invoices`].
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<SubscriptionOutcome>,
}

impl BatchReport {
    /// All invoices created in the run.
    pub fn invoices(&self) -> Vec<InvoiceId> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
            .copied()
            .collect()
    }

    /// Subscriptions whose run stopped on an error.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &BillingError)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(_) => None,
            Err(e) => Some((o.subscription.as_str(), e)),
        })
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

pub struct BillingEngine<P, S> {
    config: BillingConfig,
    catalog: ProductCatalog,
    grids: PriceGridRegistry,
    subscriptions: Vec<Subscription>,
    partners: P,
    store: S,
    references: ReferenceSequence,
    next_period_id: u64,
}

impl<P, S> BillingEngine<P, S>
where
    P: PartnerRegistry,
    S: InvoiceStore,
{
    pub fn new(
        config: BillingConfig,
        catalog: ProductCatalog,
        partners: P,
        store: S,
    ) -> Result<Self, BillingError> {
        config.validate()?;
        let references = ReferenceSequence::new(config.subscription_prefix.clone());
        Ok(Self {
            config,
            catalog,
            grids: PriceGridRegistry::new(),
            subscriptions: Vec::new(),
            partners,
            store,
            references,
            next_period_id: 1,
        })
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn grids(&self) -> &PriceGridRegistry {
        &self.grids
    }

    pub fn grids_mut(&mut self) -> &mut PriceGridRegistry {
        &mut self.grids
    }

    pub fn partners(&self) -> &P {
        &self.partners
    }

    pub fn partners_mut(&mut self) -> &mut P {
        &mut self.partners
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a subscription and give it the next reference.
    pub fn register_subscription(
        &mut self,
        builder: SubscriptionBuilder,
    ) -> Result<SubscriptionId, BillingError> {
        let id = SubscriptionId(self.subscriptions.len() as u64 + 1);
        let reference = self.references.peek();
        let subscription = builder.build(id, reference)?;
        self.references.next_reference();
        tracing::info!(subscription = %subscription.reference(), "Subscription registered");
        self.subscriptions.push(subscription);
        Ok(id)
    }

    pub fn subscription(&self, id: SubscriptionId) -> Result<&Subscription, BillingError> {
        self.subscriptions
            .iter()
            .find(|s| s.id() == id)
            .ok_or(BillingError::UnknownSubscription(id))
    }

    /// Live parameters only; reference and periods stay protected.
    pub fn subscription_mut(
        &mut self,
        id: SubscriptionId,
    ) -> Result<&mut Subscription, BillingError> {
        self.subscriptions
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(BillingError::UnknownSubscription(id))
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.iter()
    }

    pub fn find_by_reference(&self, reference: &str) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| s.reference() == reference)
    }

    /// Add a period to a subscription.
    pub fn create_period(
        &mut self,
        subscription: SubscriptionId,
        new: NewPeriod,
    ) -> Result<PeriodId, BillingError> {
        let id = PeriodId(self.next_period_id);
        let config = &self.config;
        let sub = self
            .subscriptions
            .iter_mut()
            .find(|s| s.id() == subscription)
            .ok_or(BillingError::UnknownSubscription(subscription))?;
        let period = create_period(sub, id, new, config)?;
        sub.push_period(period);
        self.next_period_id += 1;
        Ok(id)
    }

    /// Create last month's period for every active subscription that does not
    /// already have one with exactly those dates. Returns how many were created.
    pub fn generate_monthly_periods(&mut self, today: NaiveDate) -> Result<usize, BillingError> {
        let (start, end) = monthly_interval(today)?;
        let due: Vec<SubscriptionId> = self
            .subscriptions
            .iter()
            .filter(|s| s.active && !s.has_period(start, end))
            .map(Subscription::id)
            .collect();

        for id in &due {
            self.create_period(*id, NewPeriod::monthly(start, end))?;
        }

        let active = self.subscriptions.iter().filter(|s| s.active).count();
        tracing::info!(
            created = due.len(),
            active,
            %start,
            %end,
            "Monthly billing periods created"
        );
        Ok(due.len())
    }

    /// Invoice one period of a subscription.
    pub fn bill_period(
        &mut self,
        subscription: SubscriptionId,
        period: PeriodId,
    ) -> Result<InvoiceId, BillingError> {
        let ctx = BillingContext {
            grids: &self.grids,
            catalog: &self.catalog,
            config: &self.config,
        };
        let sub = self
            .subscriptions
            .iter_mut()
            .find(|s| s.id() == subscription)
            .ok_or(BillingError::UnknownSubscription(subscription))?;
        let customer = sub
            .customer_ref
            .clone()
            .ok_or_else(|| BillingError::UnknownCustomer(sub.reference().to_string()))?;
        if self.partners.find(&customer).is_none() {
            return Err(BillingError::UnknownCustomer(customer));
        }
        sub.bill_period(period, &customer, &ctx, &mut self.store)
    }

    /// Invoice every unbilled period of one subscription.
    pub fn generate_invoices(
        &mut self,
        subscription: SubscriptionId,
    ) -> Result<Vec<InvoiceId>, BillingError> {
        let ctx = BillingContext {
            grids: &self.grids,
            catalog: &self.catalog,
            config: &self.config,
        };
        let sub = self
            .subscriptions
            .iter_mut()
            .find(|s| s.id() == subscription)
            .ok_or(BillingError::UnknownSubscription(subscription))?;
        sub.generate_invoices(&self.partners, &ctx, &mut self.store)
    }

    /// Invoice every subscription. A failure stops only the subscription it
    /// happened in.
    pub fn generate_all_invoices(&mut self) -> BatchReport {
        let ctx = BillingContext {
            grids: &self.grids,
            catalog: &self.catalog,
            config: &self.config,
        };
        let outcomes = self
            .subscriptions
            .iter_mut()
            .map(|sub| SubscriptionOutcome {
                subscription: sub.reference().to_string(),
                result: sub.generate_invoices(&self.partners, &ctx, &mut self.store),
            })
            .collect();
        BatchReport { outcomes }
    }

    /// Read-only view for invoice synthesis.
    pub fn context(&self) -> BillingContext<'_> {
        BillingContext {
            grids: &self.grids,
            catalog: &self.catalog,
            config: &self.config,
        }
    }

    /// The invoice a period would get, without billing it.
    pub fn preview_invoice(
        &self,
        subscription: SubscriptionId,
        period: PeriodId,
    ) -> Result<InvoiceDraft, BillingError> {
        let sub = self.subscription(subscription)?;
        let period = sub
            .period(period)
            .ok_or(BillingError::UnknownPeriod(period))?;
        let customer = sub.customer_ref.as_deref().unwrap_or_default();
        synthesize_invoice(sub, period, customer, &self.context())
    }

    /// Invoices of a subscription, read back from the store.
    pub fn invoices(&self, subscription: SubscriptionId) -> Result<Vec<Invoice>, BillingError> {
        Ok(self
            .subscription(subscription)?
            .invoice_ids()
            .into_iter()
            .filter_map(|id| self.store.get_invoice(id))
            .collect())
    }

    #[cfg(feature = "bridge")]
    pub(crate) fn subscriptions_mut(&mut self) -> &mut [Subscription] {
        &mut self.subscriptions
    }
}
