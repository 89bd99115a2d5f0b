//! Biological-sample shipment requests.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use common::types::Page;
use models::enums::{SampleTemperature, ShipmentStatus};
use models::shipment_request;

use crate::errors::ServiceError;
use crate::non_blank;
use crate::pagination::Pagination;
use crate::repository::{Repositories, ShipmentFilter};

#[derive(Debug, Clone, Deserialize)]
pub struct ShipmentInput {
    pub requester_name: String,
    pub requester_email: String,
    pub institution: String,
    pub destination_name: String,
    pub destination_address: String,
    pub sample_type: String,
    pub sample_count: i32,
    pub temperature: SampleTemperature,
    #[serde(default)]
    pub hazardous: bool,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub requested_ship_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipmentPatch {
    pub requester_name: Option<String>,
    pub requester_email: Option<String>,
    pub institution: Option<String>,
    pub destination_name: Option<String>,
    pub destination_address: Option<String>,
    pub sample_type: Option<String>,
    pub sample_count: Option<i32>,
    pub temperature: Option<SampleTemperature>,
    pub hazardous: Option<bool>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub requested_ship_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Status move; carrier and tracking may be supplied together with `shipped`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShipmentStatusChange {
    pub status: ShipmentStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
}

#[derive(Clone)]
pub struct ShipmentService {
    repos: Repositories,
}

impl ShipmentService {
    pub fn new(repos: Repositories) -> Self { Self { repos } }

    pub async fn list(&self, filter: ShipmentFilter, page: Pagination) -> Result<Page<shipment_request::Model>, ServiceError> {
        let (rows, total) = self.repos.shipments.find(&filter, Some(page)).await?;
        Ok(page.page_of(rows, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<shipment_request::Model, ServiceError> {
        self.repos.shipments.get(id).await?.ok_or_else(|| ServiceError::not_found("shipment request"))
    }

    #[instrument(skip(self, input), fields(institution = %input.institution))]
    pub async fn create(&self, input: ShipmentInput) -> Result<shipment_request::Model, ServiceError> {
        let now = crate::now();
        let row = shipment_request::Model {
            id: Uuid::new_v4(),
            requester_name: input.requester_name.trim().to_string(),
            requester_email: models::user::normalize_email(&input.requester_email),
            institution: input.institution.trim().to_string(),
            destination_name: input.destination_name.trim().to_string(),
            destination_address: input.destination_address.trim().to_string(),
            sample_type: input.sample_type.trim().to_string(),
            sample_count: input.sample_count,
            temperature: input.temperature,
            hazardous: input.hazardous,
            carrier: non_blank(input.carrier),
            tracking_number: non_blank(input.tracking_number),
            requested_ship_date: input.requested_ship_date,
            shipped_at: None,
            status: ShipmentStatus::Draft,
            notes: non_blank(input.notes),
            created_at: now,
            updated_at: now,
        };
        row.validate_contents()?;
        let created = self.repos.shipments.insert(row).await?;
        info!(shipment_id = %created.id, samples = created.sample_count, "shipment_request_created");
        Ok(created)
    }

    /// Only `draft` and `submitted` requests can be edited.
    pub async fn update(&self, id: Uuid, p: ShipmentPatch) -> Result<shipment_request::Model, ServiceError> {
        let mut s = self.get(id).await?;
        if !s.status.is_editable() {
            return Err(ServiceError::invalid_state(format!("shipment request is {}", s.status)));
        }
        if let Some(v) = p.requester_name { s.requester_name = v.trim().to_string(); }
        if let Some(v) = p.requester_email { s.requester_email = models::user::normalize_email(&v); }
        if let Some(v) = p.institution { s.institution = v.trim().to_string(); }
        if let Some(v) = p.destination_name { s.destination_name = v.trim().to_string(); }
        if let Some(v) = p.destination_address { s.destination_address = v.trim().to_string(); }
        if let Some(v) = p.sample_type { s.sample_type = v.trim().to_string(); }
        if let Some(v) = p.sample_count { s.sample_count = v; }
        if let Some(v) = p.temperature { s.temperature = v; }
        if let Some(v) = p.hazardous { s.hazardous = v; }
        if let Some(v) = p.carrier { s.carrier = non_blank(Some(v)); }
        if let Some(v) = p.tracking_number { s.tracking_number = non_blank(Some(v)); }
        if let Some(v) = p.requested_ship_date { s.requested_ship_date = v; }
        if let Some(v) = p.notes { s.notes = non_blank(Some(v)); }
        s.validate_contents()?;
        s.updated_at = crate::now();
        self.repos.shipments.update(s).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let s = self.get(id).await?;
        if s.status != ShipmentStatus::Draft {
            return Err(ServiceError::invalid_state("only draft shipment requests can be deleted"));
        }
        self.repos.shipments.delete(id).await?;
        Ok(())
    }

    #[instrument(skip(self, change), fields(to = %change.status))]
    pub async fn set_status(&self, id: Uuid, change: ShipmentStatusChange) -> Result<shipment_request::Model, ServiceError> {
        let mut s = self.get(id).await?;
        let next = change.status;
        if !s.status.can_transition_to(next) {
            return Err(ServiceError::invalid_state(format!("shipment cannot go from {} to {}", s.status, next)));
        }
        if let Some(c) = non_blank(change.carrier) { s.carrier = Some(c); }
        if let Some(t) = non_blank(change.tracking_number) { s.tracking_number = Some(t); }
        if matches!(next, ShipmentStatus::Submitted | ShipmentStatus::Approved | ShipmentStatus::Shipped) {
            s.validate_contents()?;
        }
        let now = crate::now();
        if next == ShipmentStatus::Shipped {
            if s.carrier.is_none() || s.tracking_number.is_none() {
                return Err(ServiceError::validation("carrier and tracking_number are required to ship"));
            }
            s.shipped_at = Some(now);
        }
        let prev = s.status;
        s.status = next;
        s.updated_at = now;
        let saved = self.repos.shipments.update(s).await?;
        info!(shipment_id = %id, from = %prev, to = %next, "shipment_status_changed");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{services, shipment_input};

    fn to(status: ShipmentStatus) -> ShipmentStatusChange {
        ShipmentStatusChange { status, carrier: None, tracking_number: None }
    }

    #[tokio::test]
    async fn full_workflow_to_delivered() -> Result<(), anyhow::Error> {
        let s = services();
        let r = s.shipments.create(shipment_input()).await?;
        assert_eq!(r.status, ShipmentStatus::Draft);
        assert!(matches!(s.shipments.set_status(r.id, to(ShipmentStatus::Shipped)).await, Err(ServiceError::InvalidState(_))));

        s.shipments.set_status(r.id, to(ShipmentStatus::Submitted)).await?;
        s.shipments.set_status(r.id, to(ShipmentStatus::Approved)).await?;
        assert!(matches!(s.shipments.set_status(r.id, to(ShipmentStatus::Shipped)).await, Err(ServiceError::Validation(_))));

        let shipped = s
            .shipments
            .set_status(
                r.id,
                ShipmentStatusChange { status: ShipmentStatus::Shipped, carrier: Some("DHL".into()), tracking_number: Some("JD0146".into()) },
            )
            .await?;
        assert!(shipped.shipped_at.is_some());
        assert!(matches!(s.shipments.update(r.id, ShipmentPatch::default()).await, Err(ServiceError::InvalidState(_))));
        let done = s.shipments.set_status(r.id, to(ShipmentStatus::Delivered)).await?;
        assert_eq!(done.status, ShipmentStatus::Delivered);
        assert!(s.shipments.delete(r.id).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn hazardous_ambient_needs_notes() -> Result<(), anyhow::Error> {
        let s = services();
        let mut input = shipment_input();
        input.hazardous = true;
        input.temperature = SampleTemperature::Ambient;
        assert!(s.shipments.create(input.clone()).await.is_err());
        input.notes = Some("UN3373, triple packaging".into());
        let r = s.shipments.create(input).await?;

        let cleared = s.shipments.update(r.id, ShipmentPatch { notes: Some(String::new()), ..Default::default() }).await;
        assert!(cleared.is_err());
        let frozen = s.shipments.update(r.id, ShipmentPatch { temperature: Some(SampleTemperature::Frozen), notes: Some(String::new()), ..Default::default() }).await?;
        assert_eq!(frozen.notes, None);
        Ok(())
    }

    #[tokio::test]
    async fn search_by_institution() -> Result<(), anyhow::Error> {
        let s = services();
        s.shipments.create(shipment_input()).await?;
        let hits = s.shipments.list(ShipmentFilter { q: Some("hospital".into()), ..Default::default() }, Pagination::default()).await?;
        assert_eq!(hits.total, 1);
        let misses = s.shipments.list(ShipmentFilter { status: Some(ShipmentStatus::Approved), ..Default::default() }, Pagination::default()).await?;
        assert_eq!(misses.total, 0);
        Ok(())
    }
}
