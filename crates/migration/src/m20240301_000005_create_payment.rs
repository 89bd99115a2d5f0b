//! Create `payment` table (payment history per invoice).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payment::Table)
                    .if_not_exists()
                    .col(uuid(Payment::Id).primary_key())
                    .col(uuid(Payment::InvoiceId).not_null())
                    .col(uuid(Payment::ClientId).not_null())
                    .col(decimal_len(Payment::Amount, 12, 2).not_null())
                    .col(string_len(Payment::Method, 32).not_null())
                    .col(string_len_null(Payment::Reference, 128))
                    .col(timestamp_with_time_zone(Payment::PaidAt).not_null())
                    .col(uuid_null(Payment::RecordedBy))
                    .col(timestamp_with_time_zone(Payment::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_invoice")
                            .from(Payment::Table, Payment::InvoiceId)
                            .to(Invoice::Table, Invoice::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Payment::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Payment { Table, Id, InvoiceId, ClientId, Amount, Method, Reference, PaidAt, RecordedBy, CreatedAt }

#[derive(DeriveIden)]
enum Invoice { Table, Id }
