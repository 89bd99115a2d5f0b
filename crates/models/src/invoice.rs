use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::InvoiceStatus;
use crate::line_item::{LineItems, Totals};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub number: String,
    pub client_id: Uuid,
    #[sea_orm(column_type = "JsonBinary")]
    pub items: LineItems,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub tax_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub tax_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub discount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount_paid: Decimal,
    pub status: InvoiceStatus,
    pub issue_date: Date,
    pub due_date: Date,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_delete = "Restrict"
    )]
    Client,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef { Relation::Client.def() }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef { Relation::Payments.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn balance(&self) -> Decimal {
        self.total - self.amount_paid
    }

    pub fn apply_totals(&mut self, t: Totals) {
        self.subtotal = t.subtotal;
        self.discount = t.discount;
        self.tax_rate = t.tax_rate;
        self.tax_amount = t.tax_amount;
        self.total = t.total;
    }

    /// Status implied by the amount paid, keeping `overdue` while a balance remains.
    pub fn status_after_payment(&self) -> InvoiceStatus {
        if self.amount_paid >= self.total {
            InvoiceStatus::Paid
        } else if self.status == InvoiceStatus::Overdue {
            InvoiceStatus::Overdue
        } else if self.amount_paid > Decimal::ZERO {
            InvoiceStatus::PartiallyPaid
        } else {
            InvoiceStatus::Issued
        }
    }
}

/// `INV-000042`
pub fn format_number(prefix: &str, seq: u64) -> String {
    format!("{prefix}-{seq:06}")
}

/// Parse the numeric suffix of a document number; `None` for foreign formats.
pub fn parse_number(prefix: &str, number: &str) -> Option<u64> {
    number.strip_prefix(prefix)?.strip_prefix('-')?.parse().ok()
}

pub const NUMBER_PREFIX: &str = "INV";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_format_roundtrip() {
        assert_eq!(format_number(NUMBER_PREFIX, 42), "INV-000042");
        assert_eq!(parse_number(NUMBER_PREFIX, "INV-000042"), Some(42));
        assert_eq!(parse_number(NUMBER_PREFIX, "BUD-000042"), None);
        assert_eq!(parse_number(NUMBER_PREFIX, "INV-12a"), None);
    }
}
