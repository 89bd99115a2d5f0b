//! Create `client` table: contact, vehicle and repair/payment state.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Client::Table)
                    .if_not_exists()
                    .col(uuid(Client::Id).primary_key())
                    .col(string_len(Client::Name, 128).not_null())
                    .col(string_len_null(Client::Email, 255))
                    .col(string_len(Client::Phone, 32).not_null())
                    .col(string_len_null(Client::Address, 255))
                    .col(string_len(Client::VehicleMake, 64).not_null())
                    .col(string_len(Client::VehicleModel, 64).not_null())
                    .col(integer_null(Client::VehicleYear))
                    .col(string_len(Client::LicensePlate, 16).unique_key().not_null())
                    .col(string_len_null(Client::Vin, 17))
                    .col(integer_null(Client::Mileage))
                    .col(text_null(Client::ProblemDescription))
                    .col(string_len(Client::RepairStatus, 32).not_null())
                    .col(string_len(Client::PaymentStatus, 32).not_null())
                    .col(decimal_len_null(Client::EstimatedCost, 12, 2))
                    .col(text_null(Client::Notes))
                    .col(timestamp_with_time_zone(Client::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Client::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Client::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Client {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Address,
    VehicleMake,
    VehicleModel,
    VehicleYear,
    LicensePlate,
    Vin,
    Mileage,
    ProblemDescription,
    RepairStatus,
    PaymentStatus,
    EstimatedCost,
    Notes,
    CreatedAt,
    UpdatedAt,
}
