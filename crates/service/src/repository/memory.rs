use std::{marker::PhantomData, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use sea_orm::EntityTrait;
use uuid::Uuid;

use super::{Record, RecordFilter, Repository};
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::storage::MapStore;

/// `Repository` over a `MapStore`, used by the `memory` backend and tests.
pub struct MemoryRepository<E: EntityTrait>
where
    E::Model: Record,
{
    store: Arc<MapStore<Uuid, E::Model>>,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> MemoryRepository<E>
where
    E::Model: Record,
{
    pub fn in_memory() -> Self {
        Self { store: MapStore::in_memory(), _entity: PhantomData }
    }

    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        Ok(Self { store: MapStore::open(path).await?, _entity: PhantomData })
    }
}

fn unique_violation<M: Record>(rows: &std::collections::HashMap<Uuid, M>, row: &M) -> Option<String> {
    let keys = row.unique_keys();
    rows.values().filter(|other| other.id() != row.id()).find_map(|other| {
        other
            .unique_keys()
            .into_iter()
            .find(|k| keys.contains(k))
            .map(|(index, value)| format!("duplicate key value violates unique constraint \"{index}\" ({value})"))
    })
}

#[async_trait]
impl<E: EntityTrait> Repository<E> for MemoryRepository<E>
where
    E::Model: Record,
{
    async fn get(&self, id: Uuid) -> Result<Option<E::Model>, ServiceError> {
        Ok(self.store.get(&id).await)
    }

    async fn insert(&self, row: E::Model) -> Result<E::Model, ServiceError> {
        self.store
            .update_map(|map| {
                if map.contains_key(&row.id()) {
                    return Err(ServiceError::Conflict(format!("duplicate key value for id {}", row.id())));
                }
                if let Some(msg) = unique_violation(map, &row) {
                    return Err(ServiceError::Conflict(msg));
                }
                map.insert(row.id(), row.clone());
                Ok(row)
            })
            .await
    }

    async fn update(&self, row: E::Model) -> Result<E::Model, ServiceError> {
        self.store
            .update_map(|map| {
                if !map.contains_key(&row.id()) {
                    return Err(ServiceError::NotFound(format!("record {} not found", row.id())));
                }
                if let Some(msg) = unique_violation(map, &row) {
                    return Err(ServiceError::Conflict(msg));
                }
                map.insert(row.id(), row.clone());
                Ok(row)
            })
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        self.store.remove(&id).await
    }

    async fn find(&self, filter: &dyn RecordFilter<E>, page: Option<Pagination>) -> Result<(Vec<E::Model>, u64), ServiceError> {
        let mut rows: Vec<E::Model> = self.store.values().await.into_iter().filter(|r| filter.matches(r)).collect();
        rows.sort_by(|a, b| filter.compare(a, b));
        let total = rows.len() as u64;
        let rows = match page {
            Some(p) => p.slice(&rows),
            None => rows,
        };
        Ok((rows, total))
    }
}
