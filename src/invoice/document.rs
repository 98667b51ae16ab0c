use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::core::{BillingError, InvoiceId, PeriodId};

/// One entry of an invoice's line list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "display_type", rename_all = "snake_case")]
pub enum InvoiceLine {
    /// Heading that groups the lines below it. No amount.
    Section { label: String },
    /// Informational text. No amount.
    Note { text: String },
    /// A priced product line.
    Product {
        product_code: String,
        description: String,
        quantity: Decimal,
        unit_price: Decimal,
    },
}

impl InvoiceLine {
    pub fn section(label: impl Into<String>) -> Self {
        Self::Section {
            label: label.into(),
        }
    }

    pub fn note(text: impl Into<String>) -> Self {
        Self::Note { text: text.into() }
    }

    pub fn product(
        product_code: impl Into<String>,
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        Self::Product {
            product_code: product_code.into(),
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    pub fn is_product(&self) -> bool {
        matches!(self, Self::Product { .. })
    }

    /// Section label, note text or product description.
    pub fn text(&self) -> &str {
        match self {
            Self::Section { label } => label,
            Self::Note { text } => text,
            Self::Product { description, .. } => description,
        }
    }

    /// Line amount rounded to cents; zero for sections and notes.
    pub fn amount(&self) -> Result<Decimal, BillingError> {
        match self {
            Self::Product {
                description,
                quantity,
                unit_price,
                ..
            } => quantity
                .checked_mul(*unit_price)
                .map(round_half_up)
                .ok_or_else(|| {
                    BillingError::Arithmetic(format!(
                        "{description}: {quantity} x {unit_price} overflows"
                    ))
                }),
            Self::Section { .. } | Self::Note { .. } => Ok(Decimal::ZERO),
        }
    }
}

/// Everything the document store needs to persist an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub customer_ref: String,
    pub subscription_ref: String,
    pub period_id: PeriodId,
    pub date: NaiveDate,
    pub currency: String,
    pub lines: Vec<InvoiceLine>,
}

impl InvoiceDraft {
    pub fn product_lines(&self) -> impl Iterator<Item = &InvoiceLine> {
        self.lines.iter().filter(|l| l.is_product())
    }

    pub fn net_total(&self) -> Result<Decimal, BillingError> {
        sum_amounts(&self.lines)
    }
}

/// A persisted invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// Sequential invoice number, e.g. "INV-2024-001".
    pub number: String,
    pub customer_ref: String,
    pub subscription_ref: String,
    pub period_id: PeriodId,
    pub date: NaiveDate,
    pub currency: String,
    pub lines: Vec<InvoiceLine>,
    pub totals: InvoiceTotals,
}

impl Invoice {
    pub fn from_draft(
        id: InvoiceId,
        number: String,
        draft: InvoiceDraft,
        totals: InvoiceTotals,
    ) -> Self {
        Self {
            id,
            number,
            customer_ref: draft.customer_ref,
            subscription_ref: draft.subscription_ref,
            period_id: draft.period_id,
            date: draft.date,
            currency: draft.currency,
            lines: draft.lines,
            totals,
        }
    }

    /// File name for the printed invoice.
    pub fn report_filename(&self) -> String {
        format!(
            "Energy_Invoice_{}_{}",
            self.subscription_ref, self.number
        )
    }
}

/// Totals read back for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Sum of product line amounts.
    pub net_total: Decimal,
    pub product_lines: usize,
}

impl InvoiceTotals {
    pub fn of(lines: &[InvoiceLine]) -> Result<Self, BillingError> {
        Ok(Self {
            net_total: sum_amounts(lines)?,
            product_lines: lines.iter().filter(|l| l.is_product()).count(),
        })
    }
}

fn sum_amounts(lines: &[InvoiceLine]) -> Result<Decimal, BillingError> {
    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        total
            .checked_add(line.amount()?)
            .ok_or_else(|| BillingError::Arithmetic("invoice total overflows".into()))
    })
}

/// Round to cents, half away from zero.
fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amounts() {
        assert_eq!(
            InvoiceLine::product("X", "x", dec!(30), dec!(0.80)).amount().unwrap(),
            dec!(24.00)
        );
        assert_eq!(
            InvoiceLine::product("X", "x", dec!(280), dec!(0.2276)).amount().unwrap(),
            dec!(63.73)
        );
        assert_eq!(InvoiceLine::note("n").amount().unwrap(), Decimal::ZERO);
        assert_eq!(InvoiceLine::section("s").amount().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn half_cents_round_up() {
        assert_eq!(
            InvoiceLine::product("X", "x", dec!(1), dec!(0.125)).amount().unwrap(),
            dec!(0.13)
        );
    }

    #[test]
    fn totals_skip_non_product_lines() {
        let lines = vec![
            InvoiceLine::section("Subscription"),
            InvoiceLine::product("A", "a", dec!(30), dec!(0.80)),
            InvoiceLine::note("Including fixed TURPE: 8.50€"),
            InvoiceLine::product("B", "b", dec!(280), dec!(0.2276)),
        ];
        let totals = InvoiceTotals::of(&lines).unwrap();
        assert_eq!(totals.net_total, dec!(87.73));
        assert_eq!(totals.product_lines, 2);
    }

    #[test]
    fn oversized_line_is_an_error() {
        let line = InvoiceLine::product("X", "x", Decimal::MAX, dec!(2));
        assert!(matches!(line.amount(), Err(BillingError::Arithmetic(_))));

        let lines = vec![
            InvoiceLine::product("A", "a", Decimal::MAX, dec!(1)),
            InvoiceLine::product("B", "b", Decimal::MAX, dec!(1)),
        ];
        assert!(matches!(
            InvoiceTotals::of(&lines),
            Err(BillingError::Arithmetic(_))
        ));
    }

    #[test]
    fn line_serializes_with_display_type() {
        let json = serde_json::to_value(InvoiceLine::section("Energy")).unwrap();
        assert_eq!(json["display_type"], "section");
        assert_eq!(json["label"], "Energy");
    }
}
