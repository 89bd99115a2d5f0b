//! Garage customer together with the vehicle currently under repair.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::{PaymentStatus, RepairStatus};
use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "client")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_year: Option<i32>,
    #[sea_orm(unique)]
    pub license_plate: String,
    pub vin: Option<String>,
    pub mileage: Option<i32>,
    pub problem_description: Option<String>,
    pub repair_status: RepairStatus,
    pub payment_status: PaymentStatus,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub estimated_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
    #[sea_orm(has_many = "super::budget::Entity")]
    Budgets,
    #[sea_orm(has_many = "super::appointment::Entity")]
    Appointments,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef { Relation::Invoices.def() }
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef { Relation::Budgets.def() }
}

impl Related<super::appointment::Entity> for Entity {
    fn to() -> RelationDef { Relation::Appointments.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Plates are unique regardless of spacing, dashes or case.
pub fn normalize_plate(plate: &str) -> String {
    plate
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub fn validate_phone(phone: &str) -> Result<(), ModelError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < 6 {
        return Err(ModelError::validation("phone must contain at least 6 digits"));
    }
    if phone.chars().any(|c| !(c.is_ascii_digit() || " +-()".contains(c))) {
        return Err(ModelError::validation("phone contains invalid characters"));
    }
    Ok(())
}

pub fn validate_plate(plate: &str) -> Result<String, ModelError> {
    let normalized = normalize_plate(plate);
    if normalized.len() < 4 || normalized.len() > 12 {
        return Err(ModelError::validation("license_plate must have 4..=12 alphanumeric characters"));
    }
    Ok(normalized)
}

pub fn validate_vehicle_year(year: i32) -> Result<(), ModelError> {
    let max = chrono::Utc::now().format("%Y").to_string().parse::<i32>().unwrap_or(2100) + 1;
    if !(1900..=max).contains(&year) {
        return Err(ModelError::validation("vehicle_year out of range"));
    }
    Ok(())
}

pub fn validate_vin(vin: &str) -> Result<(), ModelError> {
    let v = vin.trim();
    if v.len() != 17 || !v.chars().all(|c| c.is_ascii_alphanumeric()) || v.contains(['I', 'O', 'Q', 'i', 'o', 'q']) {
        return Err(ModelError::validation("vin must be 17 characters without I, O or Q"));
    }
    Ok(())
}
