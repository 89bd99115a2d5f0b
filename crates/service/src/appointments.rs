//! Workshop calendar.

use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use common::types::Page;
use models::appointment::{self, validate_duration, validate_service_type};
use models::enums::AppointmentStatus;

use crate::errors::ServiceError;
use crate::invoices::check_range;
use crate::non_blank;
use crate::pagination::Pagination;
use crate::repository::{AppointmentFilter, Repositories};

pub const DEFAULT_DURATION_MINUTES: i32 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentInput {
    pub client_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    pub scheduled_at: DateTimeWithTimeZone,
    pub duration_minutes: Option<i32>,
    pub service_type: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentUpdate {
    pub mechanic_id: Option<Uuid>,
    pub scheduled_at: Option<DateTimeWithTimeZone>,
    pub duration_minutes: Option<i32>,
    pub service_type: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct AppointmentService {
    repos: Repositories,
}

impl AppointmentService {
    pub fn new(repos: Repositories) -> Self { Self { repos } }

    pub async fn list(&self, filter: AppointmentFilter, page: Pagination) -> Result<Page<appointment::Model>, ServiceError> {
        check_range(filter.from, filter.to)?;
        let (rows, total) = self.repos.appointments.find(&filter, Some(page)).await?;
        Ok(page.page_of(rows, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<appointment::Model, ServiceError> {
        self.repos.appointments.get(id).await?.ok_or_else(|| ServiceError::not_found("appointment"))
    }

    /// Appointments whose UTC day is `day`, earliest first.
    pub async fn on_day(&self, day: chrono::NaiveDate) -> Result<Vec<appointment::Model>, ServiceError> {
        self.repos.appointments.find_all(&AppointmentFilter { from: Some(day), to: Some(day), ..Default::default() }).await
    }

    /// Field rules plus the referenced client and mechanic.
    async fn check(&self, a: &appointment::Model) -> Result<(), ServiceError> {
        validate_duration(a.duration_minutes)?;
        validate_service_type(&a.service_type)?;
        if self.repos.clients.get(a.client_id).await?.is_none() {
            return Err(ServiceError::validation("client_id does not reference an existing client"));
        }
        if let Some(mid) = a.mechanic_id {
            match self.repos.users.get(mid).await? {
                Some(u) if u.active => {}
                _ => return Err(ServiceError::validation("mechanic_id does not reference an active user")),
            }
        }
        Ok(())
    }

    /// A mechanic cannot hold two overlapping slots that still occupy the calendar.
    async fn check_overlap(&self, a: &appointment::Model) -> Result<(), ServiceError> {
        let Some(mid) = a.mechanic_id else { return Ok(()) };
        if !a.status.occupies_slot() {
            return Ok(());
        }
        let filter = AppointmentFilter { mechanic_id: Some(mid), ..Default::default() };
        let clash = self
            .repos
            .appointments
            .find_all(&filter)
            .await?
            .into_iter()
            .find(|other| other.id != a.id && other.status.occupies_slot() && other.overlaps(a.scheduled_at, a.duration_minutes));
        match clash {
            Some(other) => Err(ServiceError::Conflict(format!(
                "mechanic already booked from {} for {} minutes",
                other.scheduled_at, other.duration_minutes
            ))),
            None => Ok(()),
        }
    }

    #[instrument(skip(self, input), fields(client_id = %input.client_id))]
    pub async fn create(&self, input: AppointmentInput) -> Result<appointment::Model, ServiceError> {
        let now = crate::now();
        let row = appointment::Model {
            id: Uuid::new_v4(),
            client_id: input.client_id,
            mechanic_id: input.mechanic_id,
            scheduled_at: input.scheduled_at,
            duration_minutes: input.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            service_type: input.service_type.trim().to_string(),
            status: AppointmentStatus::Scheduled,
            notes: non_blank(input.notes),
            created_at: now,
            updated_at: now,
        };
        self.check(&row).await?;
        self.check_overlap(&row).await?;
        let created = self.repos.appointments.insert(row).await?;
        info!(appointment_id = %created.id, at = %created.scheduled_at, "appointment_created");
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, upd: AppointmentUpdate) -> Result<appointment::Model, ServiceError> {
        let mut a = self.get(id).await?;
        if a.status.is_terminal() {
            return Err(ServiceError::invalid_state(format!("appointment is {}", a.status)));
        }
        if let Some(m) = upd.mechanic_id { a.mechanic_id = Some(m); }
        if let Some(t) = upd.scheduled_at { a.scheduled_at = t; }
        if let Some(d) = upd.duration_minutes { a.duration_minutes = d; }
        if let Some(s) = upd.service_type { a.service_type = s.trim().to_string(); }
        if let Some(n) = upd.notes { a.notes = non_blank(Some(n)); }
        self.check(&a).await?;
        self.check_overlap(&a).await?;
        a.updated_at = crate::now();
        self.repos.appointments.update(a).await
    }

    /// Terminal states (`completed`, `cancelled`, `no_show`) are final.
    #[instrument(skip(self))]
    pub async fn set_status(&self, id: Uuid, next: AppointmentStatus) -> Result<appointment::Model, ServiceError> {
        let mut a = self.get(id).await?;
        if a.status == next {
            return Ok(a);
        }
        if a.status.is_terminal() {
            return Err(ServiceError::invalid_state(format!("appointment is already {}", a.status)));
        }
        a.status = next;
        a.updated_at = crate::now();
        let saved = self.repos.appointments.update(a).await?;
        info!(appointment_id = %id, status = %next, "appointment_status_changed");
        Ok(saved)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.repos.appointments.delete(id).await? {
            return Err(ServiceError::not_found("appointment"));
        }
        Ok(())
    }
}
