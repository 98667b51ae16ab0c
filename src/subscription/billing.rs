use super::model::Subscription;
use super::partner::PartnerRegistry;
use crate::core::{BillingError, InvoiceId, PeriodId};
use crate::invoice::{BillingContext, InvoiceStore, synthesize_invoice};

impl Subscription {
    /// Invoice one period: synthesize its lines, persist the invoice and link
    /// it to the period.
    ///
    /// On any error no invoice is stored and the period stays unbilled.
    pub fn bill_period<S>(
        &mut self,
        period_id: PeriodId,
        customer_ref: &str,
        ctx: &BillingContext<'_>,
        store: &mut S,
    ) -> Result<InvoiceId, BillingError>
    where
        S: InvoiceStore + ?Sized,
    {
        let period = self
            .period(period_id)
            .ok_or(BillingError::UnknownPeriod(period_id))?;
        let label = period.label();
        let draft = synthesize_invoice(self, period, customer_ref, ctx)?;

        let invoice = store.create_invoice(draft)?;
        self.period_mut(period_id)
            .ok_or(BillingError::UnknownPeriod(period_id))?
            .mark_billed(invoice)?;

        tracing::info!(
            subscription = %self.reference(),
            period = %label,
            invoice = %invoice,
            "Invoice created"
        );
        Ok(invoice)
    }

    /// Invoice every unbilled period, oldest first.
    ///
    /// The first failing period stops the run: its error is logged and
    /// returned wrapped with the period label. Periods billed before it stay
    /// billed. A subscription without a customer is skipped.
    pub fn generate_invoices<P, S>(
        &mut self,
        partners: &P,
        ctx: &BillingContext<'_>,
        store: &mut S,
    ) -> Result<Vec<InvoiceId>, BillingError>
    where
        P: PartnerRegistry + ?Sized,
        S: InvoiceStore + ?Sized,
    {
        let Some(customer) = self.customer_ref.clone() else {
            tracing::warn!(subscription = %self.reference(), "Subscription has no customer, skipped");
            return Ok(Vec::new());
        };
        if partners.find(&customer).is_none() {
            return Err(BillingError::UnknownCustomer(customer));
        }

        let pending: Vec<(PeriodId, String)> = self
            .periods()
            .iter()
            .filter(|p| !p.is_billed())
            .map(|p| (p.id(), p.label()))
            .collect();

        let mut created = Vec::with_capacity(pending.len());
        for (period_id, label) in pending {
            match self.bill_period(period_id, &customer, ctx, store) {
                Ok(invoice) => created.push(invoice),
                Err(e) => {
                    tracing::error!(
                        subscription = %self.reference(),
                        period = %label,
                        error = %e,
                        "Invoice creation failed"
                    );
                    return Err(e.for_period(label));
                }
            }
        }
        Ok(created)
    }
}
