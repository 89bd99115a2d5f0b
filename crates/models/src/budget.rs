use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::BudgetStatus;
use crate::line_item::{LineItems, Totals};

/// Quote handed to the client before work starts.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget")]
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
    pub status: BudgetStatus,
    pub valid_until: Date,
    pub invoice_id: Option<Uuid>,
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
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef { Relation::Client.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn apply_totals(&mut self, t: Totals) {
        self.subtotal = t.subtotal;
        self.discount = t.discount;
        self.tax_rate = t.tax_rate;
        self.tax_amount = t.tax_amount;
        self.total = t.total;
    }

    pub fn is_expired_on(&self, today: Date) -> bool {
        self.status == BudgetStatus::Expired || (self.status == BudgetStatus::Pending && today > self.valid_until)
    }
}

pub const NUMBER_PREFIX: &str = "BUD";
