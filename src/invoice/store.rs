use super::document::{Invoice, InvoiceDraft, InvoiceTotals};
use crate::core::{BillingConfig, BillingError, InvoiceId, PeriodId, ReferenceSequence};

/// The accounting document store invoices are persisted to.
pub trait InvoiceStore {
    /// Persist a new invoice and return its id.
    fn create_invoice(&mut self, draft: InvoiceDraft) -> Result<InvoiceId, BillingError>;

    /// Read back an invoice.
    fn get_invoice(&self, id: InvoiceId) -> Option<Invoice>;
}

/// In-memory [`InvoiceStore`] numbering invoices per year.
#[derive(Debug, Clone)]
pub struct MemoryInvoiceStore {
    invoices: Vec<Invoice>,
    numbers: ReferenceSequence,
}

impl MemoryInvoiceStore {
    /// Numbers start at `{prefix}{year}-001`.
    pub fn new(prefix: impl Into<String>, year: i32) -> Self {
        Self {
            invoices: Vec::new(),
            numbers: ReferenceSequence::yearly(prefix, year),
        }
    }

    /// Numbered with the configured invoice prefix.
    pub fn from_config(config: &BillingConfig, year: i32) -> Self {
        Self::new(config.invoice_prefix.clone(), year)
    }

    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Invoice> {
        self.invoices.iter()
    }

    pub fn for_period(&self, period: PeriodId) -> Option<&Invoice> {
        self.invoices.iter().find(|inv| inv.period_id == period)
    }
}

impl InvoiceStore for MemoryInvoiceStore {
    fn create_invoice(&mut self, draft: InvoiceDraft) -> Result<InvoiceId, BillingError> {
        if draft.customer_ref.trim().is_empty() {
            return Err(BillingError::Store("invoice has no customer".into()));
        }
        if self.for_period(draft.period_id).is_some() {
            return Err(BillingError::Store(format!(
                "period {} already has an invoice",
                draft.period_id
            )));
        }

        let totals = InvoiceTotals::of(&draft.lines)?;

        self.numbers.auto_advance(draft.date);
        let id = InvoiceId(self.invoices.len() as u64 + 1);
        let number = self.numbers.next_reference();
        self.invoices.push(Invoice::from_draft(id, number, draft, totals));
        Ok(id)
    }

    fn get_invoice(&self, id: InvoiceId) -> Option<Invoice> {
        self.invoices.iter().find(|inv| inv.id == id).cloned()
    }
}
