//! Create `appointment` table; mechanic reference is optional.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Appointment::Table)
                    .if_not_exists()
                    .col(uuid(Appointment::Id).primary_key())
                    .col(uuid(Appointment::ClientId).not_null())
                    .col(uuid_null(Appointment::MechanicId))
                    .col(timestamp_with_time_zone(Appointment::ScheduledAt).not_null())
                    .col(integer(Appointment::DurationMinutes).not_null())
                    .col(string_len(Appointment::ServiceType, 128).not_null())
                    .col(string_len(Appointment::Status, 32).not_null())
                    .col(text_null(Appointment::Notes))
                    .col(timestamp_with_time_zone(Appointment::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Appointment::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_appointment_client")
                            .from(Appointment::Table, Appointment::ClientId)
                            .to(Client::Table, Client::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_appointment_mechanic")
                            .from(Appointment::Table, Appointment::MechanicId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Appointment::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Appointment { Table, Id, ClientId, MechanicId, ScheduledAt, DurationMinutes, ServiceType, Status, Notes, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Client { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
