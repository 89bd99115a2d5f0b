//! Database-backed entity tests.
//!
//! They need a reachable Postgres via `DATABASE_URL` and skip otherwise
//! (or when `SKIP_DB_TESTS` is set).


/// Transaction handling
pub mod transaction_tests;

use migration::MigratorTrait;
use sea_orm::DatabaseConnection;

pub(crate) async fn setup_test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip: database tests disabled (SKIP_DB_TESTS set or DATABASE_URL missing)");
        return None;
    }
    let db = match crate::db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {}", e);
        return None;
    }
    Some(db)
}

pub(crate) fn sample_client(plate: &str) -> crate::client::Model {
    let now = chrono::Utc::now().into();
    crate::client::Model {
        id: uuid::Uuid::new_v4(),
        name: "Lucia Ortega".into(),
        email: Some("lucia@example.com".into()),
        phone: "600123456".into(),
        address: None,
        vehicle_make: "Seat".into(),
        vehicle_model: "Ibiza".into(),
        vehicle_year: Some(2017),
        license_plate: plate.to_string(),
        vin: None,
        mileage: Some(98_000),
        problem_description: Some("brake noise".into()),
        repair_status: crate::enums::RepairStatus::Waiting,
        payment_status: crate::enums::PaymentStatus::Pending,
        estimated_cost: None,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}
