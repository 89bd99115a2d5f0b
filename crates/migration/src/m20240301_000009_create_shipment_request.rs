//! Create `shipment_request` table for the sample-shipping workflow.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShipmentRequest::Table)
                    .if_not_exists()
                    .col(uuid(ShipmentRequest::Id).primary_key())
                    .col(string_len(ShipmentRequest::RequesterName, 128).not_null())
                    .col(string_len(ShipmentRequest::RequesterEmail, 255).not_null())
                    .col(string_len(ShipmentRequest::Institution, 255).not_null())
                    .col(string_len(ShipmentRequest::DestinationName, 255).not_null())
                    .col(text(ShipmentRequest::DestinationAddress).not_null())
                    .col(string_len(ShipmentRequest::SampleType, 128).not_null())
                    .col(integer(ShipmentRequest::SampleCount).not_null())
                    .col(string_len(ShipmentRequest::Temperature, 32).not_null())
                    .col(boolean(ShipmentRequest::Hazardous).not_null().default(false))
                    .col(string_len_null(ShipmentRequest::Carrier, 64))
                    .col(string_len_null(ShipmentRequest::TrackingNumber, 64))
                    .col(date(ShipmentRequest::RequestedShipDate).not_null())
                    .col(timestamp_with_time_zone_null(ShipmentRequest::ShippedAt))
                    .col(string_len(ShipmentRequest::Status, 32).not_null())
                    .col(text_null(ShipmentRequest::Notes))
                    .col(timestamp_with_time_zone(ShipmentRequest::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ShipmentRequest::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ShipmentRequest::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ShipmentRequest {
    Table,
    Id,
    RequesterName,
    RequesterEmail,
    Institution,
    DestinationName,
    DestinationAddress,
    SampleType,
    SampleCount,
    Temperature,
    Hazardous,
    Carrier,
    TrackingNumber,
    RequestedShipDate,
    ShippedAt,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}
