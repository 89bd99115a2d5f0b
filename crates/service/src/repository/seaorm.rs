use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, PaginatorTrait};
use uuid::Uuid;

use super::{RecordFilter, Repository};
use crate::errors::ServiceError;
use crate::pagination::Pagination;

/// SeaORM-backed repository implementation over a pooled connection or,
/// inside `Repositories::transaction`, a shared `DatabaseTransaction`.
pub struct SeaOrmRepository<E, C = DatabaseConnection> {
    db: Arc<C>,
    _entity: PhantomData<E>,
}

impl<E> SeaOrmRepository<E> {
    pub fn new(db: DatabaseConnection) -> Self { Self::on(Arc::new(db)) }
}

impl<E, C> SeaOrmRepository<E, C> {
    pub fn on(db: Arc<C>) -> Self { Self { db, _entity: PhantomData } }
}

fn map_update_err(e: DbErr) -> ServiceError {
    match e {
        DbErr::RecordNotUpdated => ServiceError::NotFound("record not found".into()),
        other => ServiceError::from_db(other),
    }
}

macro_rules! seaorm_repository {
    ($($module:ident),+ $(,)?) => {
        $(
            #[async_trait]
            impl<C> Repository<models::$module::Entity> for SeaOrmRepository<models::$module::Entity, C>
            where
                C: ConnectionTrait + Send + Sync + 'static,
            {
                async fn get(&self, id: Uuid) -> Result<Option<models::$module::Model>, ServiceError> {
                    models::$module::Entity::find_by_id(id).one(self.db.as_ref()).await.map_err(ServiceError::from_db)
                }

                async fn insert(&self, row: models::$module::Model) -> Result<models::$module::Model, ServiceError> {
                    row.into_active_model().reset_all().insert(self.db.as_ref()).await.map_err(ServiceError::from_db)
                }

                async fn update(&self, row: models::$module::Model) -> Result<models::$module::Model, ServiceError> {
                    row.into_active_model().reset_all().update(self.db.as_ref()).await.map_err(map_update_err)
                }

                async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
                    let res = models::$module::Entity::delete_by_id(id).exec(self.db.as_ref()).await.map_err(ServiceError::from_db)?;
                    Ok(res.rows_affected > 0)
                }

                async fn find(
                    &self,
                    filter: &dyn RecordFilter<models::$module::Entity>,
                    page: Option<Pagination>,
                ) -> Result<(Vec<models::$module::Model>, u64), ServiceError> {
                    let query = filter.apply(models::$module::Entity::find());
                    match page {
                        Some(p) => {
                            let (page_idx, per_page) = p.normalize();
                            // fetch_page is 0-based
                            let paginator = query.paginate(self.db.as_ref(), per_page);
                            let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
                            let rows = paginator.fetch_page(page_idx).await.map_err(ServiceError::from_db)?;
                            Ok((rows, total))
                        }
                        None => {
                            let rows = query.all(self.db.as_ref()).await.map_err(ServiceError::from_db)?;
                            let total = rows.len() as u64;
                            Ok((rows, total))
                        }
                    }
                }
            }
        )+
    };
}

seaorm_repository!(user, user_credentials, client, invoice, payment, budget, appointment, expense, shipment_request);
