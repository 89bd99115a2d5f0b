//! Create `expense` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Expense::Table)
                    .if_not_exists()
                    .col(uuid(Expense::Id).primary_key())
                    .col(string_len(Expense::Category, 32).not_null())
                    .col(string_len(Expense::Description, 255).not_null())
                    .col(decimal_len(Expense::Amount, 12, 2).not_null())
                    .col(date(Expense::ExpenseDate).not_null())
                    .col(string_len_null(Expense::Supplier, 128))
                    .col(boolean(Expense::TaxDeductible).not_null().default(false))
                    .col(timestamp_with_time_zone(Expense::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Expense::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Expense::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Expense { Table, Id, Category, Description, Amount, ExpenseDate, Supplier, TaxDeductible, CreatedAt, UpdatedAt }
