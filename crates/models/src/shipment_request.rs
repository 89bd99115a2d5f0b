//! Biological-sample shipment paperwork. Independent of the garage entities.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::{SampleTemperature, ShipmentStatus};
use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipment_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub requester_name: String,
    pub requester_email: String,
    pub institution: String,
    pub destination_name: String,
    pub destination_address: String,
    pub sample_type: String,
    pub sample_count: i32,
    pub temperature: SampleTemperature,
    pub hazardous: bool,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub requested_ship_date: Date,
    pub shipped_at: Option<DateTimeWithTimeZone>,
    pub status: ShipmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Content checks that must hold before the request leaves `draft`.
    pub fn validate_contents(&self) -> Result<(), ModelError> {
        for (field, value) in [
            ("requester_name", &self.requester_name),
            ("institution", &self.institution),
            ("destination_name", &self.destination_name),
            ("destination_address", &self.destination_address),
            ("sample_type", &self.sample_type),
        ] {
            if value.trim().is_empty() {
                return Err(ModelError::validation(format!("{field} required")));
            }
        }
        crate::user::validate_email(&self.requester_email)?;
        if self.sample_count < 1 {
            return Err(ModelError::validation("sample_count must be >= 1"));
        }
        let has_notes = self.notes.as_deref().is_some_and(|n| !n.trim().is_empty());
        if self.hazardous && self.temperature == SampleTemperature::Ambient && !has_notes {
            return Err(ModelError::validation("hazardous samples at ambient temperature require handling notes"));
        }
        Ok(())
    }
}
