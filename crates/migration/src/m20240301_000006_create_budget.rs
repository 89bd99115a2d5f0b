//! Create `budget` table (quotes), convertible into invoices.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Budget::Table)
                    .if_not_exists()
                    .col(uuid(Budget::Id).primary_key())
                    .col(string_len(Budget::Number, 32).unique_key().not_null())
                    .col(uuid(Budget::ClientId).not_null())
                    .col(json_binary(Budget::Items).not_null())
                    .col(decimal_len(Budget::Subtotal, 12, 2).not_null())
                    .col(decimal_len(Budget::TaxRate, 5, 2).not_null())
                    .col(decimal_len(Budget::TaxAmount, 12, 2).not_null())
                    .col(decimal_len(Budget::Discount, 12, 2).not_null())
                    .col(decimal_len(Budget::Total, 12, 2).not_null())
                    .col(string_len(Budget::Status, 32).not_null())
                    .col(date(Budget::ValidUntil).not_null())
                    .col(uuid_null(Budget::InvoiceId))
                    .col(text_null(Budget::Notes))
                    .col(timestamp_with_time_zone(Budget::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Budget::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_client")
                            .from(Budget::Table, Budget::ClientId)
                            .to(Client::Table, Client::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Budget::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Budget {
    Table,
    Id,
    Number,
    ClientId,
    Items,
    Subtotal,
    TaxRate,
    TaxAmount,
    Discount,
    Total,
    Status,
    ValidUntil,
    InvoiceId,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Client { Table, Id }
