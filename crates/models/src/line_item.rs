use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use crate::enums::LineItemKind;
use crate::errors::ModelError;

/// One billable row of an invoice or budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub kind: LineItemKind,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn amount(&self) -> Decimal {
        round2(self.quantity * self.unit_price)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.description.trim().is_empty() {
            return Err(ModelError::validation("line item description required"));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(ModelError::validation("line item quantity must be > 0"));
        }
        if self.unit_price < Decimal::ZERO {
            return Err(ModelError::validation("line item unit_price must be >= 0"));
        }
        Ok(())
    }
}

/// JSONB column holding the line items of a document.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, FromJsonQueryResult)]
pub struct LineItems(pub Vec<LineItem>);

impl LineItems {
    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> { self.0.iter() }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.0.is_empty() {
            return Err(ModelError::validation("at least one line item is required"));
        }
        self.0.iter().try_for_each(LineItem::validate)
    }

    pub fn subtotal(&self) -> Decimal {
        self.0.iter().map(LineItem::amount).sum()
    }

    /// Sum of line amounts of the given kind, before discount and tax.
    pub fn subtotal_of(&self, kind: LineItemKind) -> Decimal {
        self.0.iter().filter(|i| i.kind == kind).map(LineItem::amount).sum()
    }
}

impl From<Vec<LineItem>> for LineItems {
    fn from(items: Vec<LineItem>) -> Self { Self(items) }
}

/// Server-side computed money fields of a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Round half away from zero to cents.
pub fn round2(v: Decimal) -> Decimal {
    v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `subtotal - discount + tax`, where tax applies to the discounted base.
pub fn compute_totals(items: &LineItems, discount: Decimal, tax_rate: Decimal) -> Result<Totals, ModelError> {
    items.validate()?;
    if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE_HUNDRED {
        return Err(ModelError::validation("tax_rate must be within 0..=100"));
    }
    let subtotal = items.subtotal();
    if discount < Decimal::ZERO || discount > subtotal {
        return Err(ModelError::validation("discount must be within 0..=subtotal"));
    }
    let base = subtotal - discount;
    let tax_amount = round2(base * tax_rate / Decimal::ONE_HUNDRED);
    Ok(Totals { subtotal, discount, tax_rate, tax_amount, total: base + tax_amount })
}
