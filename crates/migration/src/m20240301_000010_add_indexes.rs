use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Client listing filters by repair status
        manager
            .create_index(
                Index::create()
                    .name("idx_client_repair_status")
                    .table(Client::Table)
                    .col(Client::RepairStatus)
                    .to_owned(),
            )
            .await?;

        // Invoice: per client history
        manager
            .create_index(
                Index::create()
                    .name("idx_invoice_client")
                    .table(Invoice::Table)
                    .col(Invoice::ClientId)
                    .to_owned(),
            )
            .await?;

        // Invoice: report windows by status and issue date
        manager
            .create_index(
                Index::create()
                    .name("idx_invoice_status_issue")
                    .table(Invoice::Table)
                    .col(Invoice::Status)
                    .col(Invoice::IssueDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_invoice")
                    .table(Payment::Table)
                    .col(Payment::InvoiceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_paid_at")
                    .table(Payment::Table)
                    .col(Payment::PaidAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_budget_client")
                    .table(Budget::Table)
                    .col(Budget::ClientId)
                    .to_owned(),
            )
            .await?;

        // Appointment: calendar lookups per mechanic
        manager
            .create_index(
                Index::create()
                    .name("idx_appointment_mechanic_time")
                    .table(Appointment::Table)
                    .col(Appointment::MechanicId)
                    .col(Appointment::ScheduledAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expense_date")
                    .table(Expense::Table)
                    .col(Expense::ExpenseDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shipment_status")
                    .table(ShipmentRequest::Table)
                    .col(ShipmentRequest::Status)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_index(Index::drop().name("idx_client_repair_status").table(Client::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_invoice_client").table(Invoice::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_invoice_status_issue").table(Invoice::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_payment_invoice").table(Payment::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_payment_paid_at").table(Payment::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_budget_client").table(Budget::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_appointment_mechanic_time").table(Appointment::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_expense_date").table(Expense::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_shipment_status").table(ShipmentRequest::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Client { Table, RepairStatus }

#[derive(DeriveIden)]
enum Invoice { Table, ClientId, Status, IssueDate }

#[derive(DeriveIden)]
enum Payment { Table, InvoiceId, PaidAt }

#[derive(DeriveIden)]
enum Budget { Table, ClientId }

#[derive(DeriveIden)]
enum Appointment { Table, MechanicId, ScheduledAt }

#[derive(DeriveIden)]
enum Expense { Table, ExpenseDate }

#[derive(DeriveIden)]
enum ShipmentRequest { Table, Status }
