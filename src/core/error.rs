use thiserror::Error;

use super::types::{GridId, PeriodId, SubscriptionId};

/// Errors raised by grid resolution, period creation and invoice synthesis.
///
/// All of them are business errors: they point at missing configuration or a
/// double-billing attempt and are never retried automatically.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BillingError {
    /// No price grid carries the "current" flag.
    #[error("no price grid is flagged as current")]
    NoActiveGrid,

    /// Another grid already carries the "current" flag.
    #[error("only one price grid can be current at a time; '{current}' is already current")]
    MultipleCurrentGrids { current: String },

    /// The resolved grid has no price for a required product.
    #[error("no price for product '{product}' in grid '{grid}'")]
    MissingPriceLine { grid: String, product: String },

    /// A grid would carry two lines for the same product.
    #[error("product '{product}' appears more than once in grid '{grid}'")]
    DuplicatePriceLine { grid: String, product: String },

    /// A snapshotted power value cannot be read as a number of kVA.
    #[error("invalid power format: '{0}'")]
    InvalidPowerFormat(String),

    /// The period already has an invoice.
    #[error("period {period} is already billed")]
    AlreadyBilled { period: String },

    /// A billing product has no entry in the product catalog.
    #[error("product not found in catalog: {0}")]
    UnresolvedProduct(String),

    /// The subscription's billing party is unknown to the partner registry.
    #[error("unknown customer: {0}")]
    UnknownCustomer(String),

    #[error("unknown price grid: {0}")]
    UnknownGrid(GridId),

    #[error("unknown subscription: {0}")]
    UnknownSubscription(SubscriptionId),

    /// No subscription carries this reference code.
    #[error("unknown subscription reference: {0}")]
    UnknownReference(String),

    #[error("unknown billing period: {0}")]
    UnknownPeriod(PeriodId),

    /// An amount or quantity does not fit in a decimal.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// Builder encountered invalid or missing input.
    #[error("builder error: {0}")]
    Builder(String),

    /// The invoice document store refused the document.
    #[error("invoice store error: {0}")]
    Store(String),

    /// A per-period failure, labelled with the period it happened on.
    #[error("invoice creation failed for {label}: {source}")]
    Period {
        label: String,
        #[source]
        source: Box<BillingError>,
    },
}

impl BillingError {
    /// Wrap this error with the label of the period being billed.
    pub fn for_period(self, label: impl Into<String>) -> Self {
        BillingError::Period {
            label: label.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through period labels.
    pub fn root(&self) -> &BillingError {
        match self {
            BillingError::Period { source, .. } => source.root(),
            other => other,
        }
    }
}
