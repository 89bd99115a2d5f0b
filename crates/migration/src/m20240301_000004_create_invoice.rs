//! Create `invoice` table. Line items live in a JSONB column.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Invoice::Table)
                    .if_not_exists()
                    .col(uuid(Invoice::Id).primary_key())
                    .col(string_len(Invoice::Number, 32).unique_key().not_null())
                    .col(uuid(Invoice::ClientId).not_null())
                    .col(json_binary(Invoice::Items).not_null())
                    .col(decimal_len(Invoice::Subtotal, 12, 2).not_null())
                    .col(decimal_len(Invoice::TaxRate, 5, 2).not_null())
                    .col(decimal_len(Invoice::TaxAmount, 12, 2).not_null())
                    .col(decimal_len(Invoice::Discount, 12, 2).not_null())
                    .col(decimal_len(Invoice::Total, 12, 2).not_null())
                    .col(decimal_len(Invoice::AmountPaid, 12, 2).not_null())
                    .col(string_len(Invoice::Status, 32).not_null())
                    .col(date(Invoice::IssueDate).not_null())
                    .col(date(Invoice::DueDate).not_null())
                    .col(text_null(Invoice::Notes))
                    .col(timestamp_with_time_zone(Invoice::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Invoice::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoice_client")
                            .from(Invoice::Table, Invoice::ClientId)
                            .to(Client::Table, Client::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Invoice::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Invoice {
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
    AmountPaid,
    Status,
    IssueDate,
    DueDate,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Client { Table, Id }
