use chrono::Duration;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::AppointmentStatus;
use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appointment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    pub scheduled_at: DateTimeWithTimeZone,
    pub duration_minutes: i32,
    pub service_type: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_delete = "Cascade"
    )]
    Client,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::MechanicId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Mechanic,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef { Relation::Client.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub const MAX_DURATION_MINUTES: i32 = 12 * 60;

impl Model {
    pub fn ends_at(&self) -> DateTimeWithTimeZone {
        self.scheduled_at + Duration::minutes(self.duration_minutes as i64)
    }

    /// Half-open interval overlap: back-to-back slots do not collide.
    pub fn overlaps(&self, start: DateTimeWithTimeZone, minutes: i32) -> bool {
        let end = start + Duration::minutes(minutes as i64);
        self.scheduled_at < end && start < self.ends_at()
    }
}

pub fn validate_duration(minutes: i32) -> Result<(), ModelError> {
    if !(1..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(ModelError::validation("duration_minutes must be within 1..=720"));
    }
    Ok(())
}

pub fn validate_service_type(s: &str) -> Result<(), ModelError> {
    if s.trim().is_empty() {
        return Err(ModelError::validation("service_type required"));
    }
    Ok(())
}
