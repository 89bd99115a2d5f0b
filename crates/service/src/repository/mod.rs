//! Persistence seam of the service layer.
//!
//! Every entity is reached through `Repository<E>`, implemented once over
//! sea-orm and once over in-memory `MapStore`s. Services only ever hold
//! `Arc<dyn Repository<E>>`, so the same business rules run against
//! Postgres in production and against memory in tests and demos.

pub mod filters;
pub mod memory;
pub mod seaorm;

use std::{cmp::Ordering, path::Path, sync::Arc};

use async_trait::async_trait;
use futures::future::BoxFuture;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, Select, TransactionTrait};
use tracing::warn;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use models::{appointment, budget, client, expense, invoice, payment, shipment_request, user, user_credentials};

use crate::errors::ServiceError;
use crate::pagination::Pagination;

pub use filters::*;
pub use memory::MemoryRepository;
pub use seaorm::SeaOrmRepository;

/// Row type storable by any repository backend.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    fn id(&self) -> Uuid;

    /// Values that must be unique across rows, as `(index, value)` pairs.
    /// The in-memory backend enforces them the way the database indexes do.
    fn unique_keys(&self) -> Vec<(&'static str, String)> { Vec::new() }
}

/// Query criteria usable by both backends: `apply` narrows a sea-orm
/// select, `matches` and `compare` do the same over in-memory rows.
pub trait RecordFilter<E: EntityTrait>: Send + Sync {
    fn matches(&self, row: &E::Model) -> bool;
    fn compare(&self, a: &E::Model, b: &E::Model) -> Ordering;
    fn apply(&self, query: Select<E>) -> Select<E>;
}

#[async_trait]
pub trait Repository<E: EntityTrait>: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<E::Model>, ServiceError>;
    async fn insert(&self, row: E::Model) -> Result<E::Model, ServiceError>;
    /// Replace a stored row. `NotFound` when the id is unknown.
    async fn update(&self, row: E::Model) -> Result<E::Model, ServiceError>;
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
    /// Filtered, ordered rows plus the total number of matches.
    async fn find(&self, filter: &dyn RecordFilter<E>, page: Option<Pagination>) -> Result<(Vec<E::Model>, u64), ServiceError>;

    async fn find_all(&self, filter: &dyn RecordFilter<E>) -> Result<Vec<E::Model>, ServiceError> {
        Ok(self.find(filter, None).await?.0)
    }

    async fn find_one(&self, filter: &dyn RecordFilter<E>) -> Result<Option<E::Model>, ServiceError> {
        let (rows, _) = self.find(filter, Some(Pagination { page: 1, per_page: 1 })).await?;
        Ok(rows.into_iter().next())
    }
}

/// All repositories the services need, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn Repository<user::Entity>>,
    pub credentials: Arc<dyn Repository<user_credentials::Entity>>,
    pub clients: Arc<dyn Repository<client::Entity>>,
    pub invoices: Arc<dyn Repository<invoice::Entity>>,
    pub payments: Arc<dyn Repository<payment::Entity>>,
    pub budgets: Arc<dyn Repository<budget::Entity>>,
    pub appointments: Arc<dyn Repository<appointment::Entity>>,
    pub expenses: Arc<dyn Repository<expense::Entity>>,
    pub shipments: Arc<dyn Repository<shipment_request::Entity>>,
    /// Pool behind the sea-orm backend; `None` for memory backends and for
    /// repositories already bound to a transaction.
    db: Option<DatabaseConnection>,
}

impl Repositories {
    pub fn seaorm(db: DatabaseConnection) -> Self {
        let mut repos = Self::on_connection(Arc::new(db.clone()));
        repos.db = Some(db);
        repos
    }

    fn on_connection<C: ConnectionTrait + Send + Sync + 'static>(conn: Arc<C>) -> Self {
        Self {
            users: Arc::new(SeaOrmRepository::<user::Entity, C>::on(conn.clone())),
            credentials: Arc::new(SeaOrmRepository::<user_credentials::Entity, C>::on(conn.clone())),
            clients: Arc::new(SeaOrmRepository::<client::Entity, C>::on(conn.clone())),
            invoices: Arc::new(SeaOrmRepository::<invoice::Entity, C>::on(conn.clone())),
            payments: Arc::new(SeaOrmRepository::<payment::Entity, C>::on(conn.clone())),
            budgets: Arc::new(SeaOrmRepository::<budget::Entity, C>::on(conn.clone())),
            appointments: Arc::new(SeaOrmRepository::<appointment::Entity, C>::on(conn.clone())),
            expenses: Arc::new(SeaOrmRepository::<expense::Entity, C>::on(conn.clone())),
            shipments: Arc::new(SeaOrmRepository::<shipment_request::Entity, C>::on(conn)),
            db: None,
        }
    }

    /// Whether writes go through a database that supports transactions.
    pub fn is_transactional(&self) -> bool {
        self.db.is_some()
    }

    /// Run `work` against repositories bound to one database transaction,
    /// committed when it returns `Ok` and rolled back otherwise. Backends
    /// without a database run `work` directly on `self`.
    pub async fn transaction<T, F>(&self, work: F) -> Result<T, ServiceError>
    where
        T: Send,
        F: for<'r> FnOnce(&'r Repositories) -> BoxFuture<'r, Result<T, ServiceError>> + Send,
    {
        let Some(db) = &self.db else { return work(self).await };
        let txn = Arc::new(db.begin().await.map_err(ServiceError::from_db)?);
        let scoped = Self::on_connection(txn.clone());
        let out = work(&scoped).await;
        drop(scoped);
        let txn: DatabaseTransaction =
            Arc::try_unwrap(txn).map_err(|_| ServiceError::Db("transaction still referenced after work".into()))?;
        match out {
            Ok(value) => {
                txn.commit().await.map_err(ServiceError::from_db)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!(err = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Volatile in-process storage.
    pub fn memory() -> Self {
        Self {
            users: Arc::new(MemoryRepository::<user::Entity>::in_memory()),
            credentials: Arc::new(MemoryRepository::<user_credentials::Entity>::in_memory()),
            clients: Arc::new(MemoryRepository::<client::Entity>::in_memory()),
            invoices: Arc::new(MemoryRepository::<invoice::Entity>::in_memory()),
            payments: Arc::new(MemoryRepository::<payment::Entity>::in_memory()),
            budgets: Arc::new(MemoryRepository::<budget::Entity>::in_memory()),
            appointments: Arc::new(MemoryRepository::<appointment::Entity>::in_memory()),
            expenses: Arc::new(MemoryRepository::<expense::Entity>::in_memory()),
            shipments: Arc::new(MemoryRepository::<shipment_request::Entity>::in_memory()),
            db: None,
        }
    }

    /// In-memory storage snapshotted to one JSON file per entity under `dir`.
    pub async fn persistent(dir: &Path) -> Result<Self, ServiceError> {
        Ok(Self {
            users: Arc::new(MemoryRepository::<user::Entity>::open(dir.join("users.json")).await?),
            credentials: Arc::new(MemoryRepository::<user_credentials::Entity>::open(dir.join("user_credentials.json")).await?),
            clients: Arc::new(MemoryRepository::<client::Entity>::open(dir.join("clients.json")).await?),
            invoices: Arc::new(MemoryRepository::<invoice::Entity>::open(dir.join("invoices.json")).await?),
            payments: Arc::new(MemoryRepository::<payment::Entity>::open(dir.join("payments.json")).await?),
            budgets: Arc::new(MemoryRepository::<budget::Entity>::open(dir.join("budgets.json")).await?),
            appointments: Arc::new(MemoryRepository::<appointment::Entity>::open(dir.join("appointments.json")).await?),
            expenses: Arc::new(MemoryRepository::<expense::Entity>::open(dir.join("expenses.json")).await?),
            shipments: Arc::new(MemoryRepository::<shipment_request::Entity>::open(dir.join("shipment_requests.json")).await?),
            db: None,
        })
    }
}

impl Record for user::Model {
    fn id(&self) -> Uuid { self.id }
    fn unique_keys(&self) -> Vec<(&'static str, String)> { vec![("user_email", self.email.clone())] }
}

impl Record for user_credentials::Model {
    fn id(&self) -> Uuid { self.id }
    fn unique_keys(&self) -> Vec<(&'static str, String)> { vec![("user_credentials_user_id", self.user_id.to_string())] }
}

impl Record for client::Model {
    fn id(&self) -> Uuid { self.id }
    fn unique_keys(&self) -> Vec<(&'static str, String)> { vec![("client_license_plate", self.license_plate.clone())] }
}

impl Record for invoice::Model {
    fn id(&self) -> Uuid { self.id }
    fn unique_keys(&self) -> Vec<(&'static str, String)> { vec![("invoice_number", self.number.clone())] }
}

impl Record for budget::Model {
    fn id(&self) -> Uuid { self.id }
    fn unique_keys(&self) -> Vec<(&'static str, String)> { vec![("budget_number", self.number.clone())] }
}

impl Record for payment::Model {
    fn id(&self) -> Uuid { self.id }
}

impl Record for appointment::Model {
    fn id(&self) -> Uuid { self.id }
}

impl Record for expense::Model {
    fn id(&self) -> Uuid { self.id }
}

impl Record for shipment_request::Model {
    fn id(&self) -> Uuid { self.id }
}
