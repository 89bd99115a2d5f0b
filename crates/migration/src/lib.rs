//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_user;
mod m20240301_000002_create_user_credentials;
mod m20240301_000003_create_client;
mod m20240301_000004_create_invoice;
mod m20240301_000005_create_payment;
mod m20240301_000006_create_budget;
mod m20240301_000007_create_appointment;
mod m20240301_000008_create_expense;
mod m20240301_000009_create_shipment_request;
mod m20240301_000010_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_user::Migration),
            Box::new(m20240301_000002_create_user_credentials::Migration),
            Box::new(m20240301_000003_create_client::Migration),
            Box::new(m20240301_000004_create_invoice::Migration),
            Box::new(m20240301_000005_create_payment::Migration),
            Box::new(m20240301_000006_create_budget::Migration),
            Box::new(m20240301_000007_create_appointment::Migration),
            Box::new(m20240301_000008_create_expense::Migration),
            Box::new(m20240301_000009_create_shipment_request::Migration),
            // Indexes should always be applied last
            Box::new(m20240301_000010_add_indexes::Migration),
        ]
    }
}
