use anyhow::Result;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, TransactionTrait};
use uuid::Uuid;

use super::{sample_client, setup_test_db};
use crate::client;

#[tokio::test]
async fn test_transaction_rollback_discards_client() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let plate = Uuid::new_v4().simple().to_string()[..10].to_ascii_uppercase();
    let txn = db.begin().await?;
    let created = sample_client(&plate).into_active_model().reset_all().insert(&txn).await?;
    txn.rollback().await?;

    let found = client::Entity::find_by_id(created.id).one(&db).await?;
    assert!(found.is_none());
    Ok(())
}

#[tokio::test]
async fn test_transaction_commit_persists_client() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let plate = Uuid::new_v4().simple().to_string()[..10].to_ascii_uppercase();
    let txn = db.begin().await?;
    let created = sample_client(&plate).into_active_model().reset_all().insert(&txn).await?;
    txn.commit().await?;

    let found = client::Entity::find_by_id(created.id).one(&db).await?;
    assert_eq!(found.map(|c| c.license_plate), Some(plate));
    client::Entity::delete_by_id(created.id).exec(&db).await?;
    Ok(())
}
