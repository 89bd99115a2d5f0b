//! Client and vehicle intake, repair tracking and per-client history.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use common::types::Page;
use models::enums::{PaymentStatus, RepairStatus};
use models::{appointment, budget, client, invoice, payment, user};

use crate::errors::ServiceError;
use crate::non_blank;
use crate::pagination::Pagination;
use crate::repository::{AppointmentFilter, BudgetFilter, ClientFilter, InvoiceFilter, PaymentFilter, Repositories};

#[derive(Debug, Clone, Deserialize)]
pub struct ClientInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_year: Option<i32>,
    pub license_plate: String,
    pub vin: Option<String>,
    pub mileage: Option<i32>,
    pub problem_description: Option<String>,
    pub estimated_cost: Option<Decimal>,
    pub notes: Option<String>,
}

/// Partial update; blank strings clear optional text fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_year: Option<i32>,
    pub license_plate: Option<String>,
    pub vin: Option<String>,
    pub mileage: Option<i32>,
    pub problem_description: Option<String>,
    pub estimated_cost: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientHistory {
    pub client: client::Model,
    pub invoices: Vec<invoice::Model>,
    pub budgets: Vec<budget::Model>,
    pub appointments: Vec<appointment::Model>,
    pub payments: Vec<payment::Model>,
}

/// Normalize and check every field rule of a client row.
fn validate(c: &mut client::Model) -> Result<(), ServiceError> {
    c.name = c.name.trim().to_string();
    if c.name.is_empty() {
        return Err(ServiceError::validation("name required"));
    }
    client::validate_phone(&c.phone)?;
    c.phone = c.phone.trim().to_string();
    if let Some(email) = &c.email {
        user::validate_email(email)?;
        c.email = Some(user::normalize_email(email));
    }
    c.vehicle_make = c.vehicle_make.trim().to_string();
    c.vehicle_model = c.vehicle_model.trim().to_string();
    if c.vehicle_make.is_empty() || c.vehicle_model.is_empty() {
        return Err(ServiceError::validation("vehicle_make and vehicle_model required"));
    }
    c.license_plate = client::validate_plate(&c.license_plate)?;
    if let Some(year) = c.vehicle_year {
        client::validate_vehicle_year(year)?;
    }
    if let Some(vin) = &c.vin {
        client::validate_vin(vin)?;
        c.vin = Some(vin.trim().to_ascii_uppercase());
    }
    if c.mileage.is_some_and(|m| m < 0) {
        return Err(ServiceError::validation("mileage must be >= 0"));
    }
    if c.estimated_cost.is_some_and(|v| v < Decimal::ZERO) {
        return Err(ServiceError::validation("estimated_cost must be >= 0"));
    }
    Ok(())
}

/// Client-level payment state from the balances of its billed invoices.
pub fn derive_payment_status(invoices: &[invoice::Model]) -> PaymentStatus {
    let billed: Vec<&invoice::Model> = invoices.iter().filter(|i| i.status.is_billable()).collect();
    let total: Decimal = billed.iter().map(|i| i.total).sum();
    let paid: Decimal = billed.iter().map(|i| i.amount_paid).sum();
    if total > Decimal::ZERO && paid >= total {
        PaymentStatus::Paid
    } else if paid > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    }
}

#[derive(Clone)]
pub struct ClientService {
    repos: Repositories,
}

impl ClientService {
    pub fn new(repos: Repositories) -> Self { Self { repos } }

    pub async fn list(&self, filter: ClientFilter, page: Pagination) -> Result<Page<client::Model>, ServiceError> {
        let (rows, total) = self.repos.clients.find(&filter, Some(page)).await?;
        Ok(page.page_of(rows, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<client::Model, ServiceError> {
        self.repos.clients.get(id).await?.ok_or_else(|| ServiceError::not_found("client"))
    }

    #[instrument(skip(self, input), fields(plate = %input.license_plate))]
    pub async fn create(&self, input: ClientInput) -> Result<client::Model, ServiceError> {
        let now = crate::now();
        let mut row = client::Model {
            id: Uuid::new_v4(),
            name: input.name,
            email: non_blank(input.email),
            phone: input.phone,
            address: non_blank(input.address),
            vehicle_make: input.vehicle_make,
            vehicle_model: input.vehicle_model,
            vehicle_year: input.vehicle_year,
            license_plate: input.license_plate,
            vin: non_blank(input.vin),
            mileage: input.mileage,
            problem_description: non_blank(input.problem_description),
            repair_status: RepairStatus::Waiting,
            payment_status: PaymentStatus::Pending,
            estimated_cost: input.estimated_cost,
            notes: non_blank(input.notes),
            created_at: now,
            updated_at: now,
        };
        validate(&mut row)?;
        let created = self.repos.clients.insert(row).await?;
        info!(client_id = %created.id, plate = %created.license_plate, "client_created");
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, patch: ClientPatch) -> Result<client::Model, ServiceError> {
        let mut c = self.get(id).await?;
        if let Some(v) = patch.name { c.name = v; }
        if let Some(v) = patch.email { c.email = non_blank(Some(v)); }
        if let Some(v) = patch.phone { c.phone = v; }
        if let Some(v) = patch.address { c.address = non_blank(Some(v)); }
        if let Some(v) = patch.vehicle_make { c.vehicle_make = v; }
        if let Some(v) = patch.vehicle_model { c.vehicle_model = v; }
        if let Some(v) = patch.vehicle_year { c.vehicle_year = Some(v); }
        if let Some(v) = patch.license_plate { c.license_plate = v; }
        if let Some(v) = patch.vin { c.vin = non_blank(Some(v)); }
        if let Some(v) = patch.mileage { c.mileage = Some(v); }
        if let Some(v) = patch.problem_description { c.problem_description = non_blank(Some(v)); }
        if let Some(v) = patch.estimated_cost { c.estimated_cost = Some(v); }
        if let Some(v) = patch.notes { c.notes = non_blank(Some(v)); }
        validate(&mut c)?;
        c.updated_at = crate::now();
        self.repos.clients.update(c).await
    }

    /// Clients with billing records cannot be removed; their appointments go with them.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.get(id).await?;
        if self.repos.invoices.find_one(&InvoiceFilter::for_client(id)).await?.is_some() {
            return Err(ServiceError::invalid_state("client has invoices"));
        }
        let budgets = BudgetFilter { client_id: Some(id), ..Default::default() };
        if self.repos.budgets.find_one(&budgets).await?.is_some() {
            return Err(ServiceError::invalid_state("client has budgets"));
        }
        let appts = AppointmentFilter { client_id: Some(id), ..Default::default() };
        for a in self.repos.appointments.find_all(&appts).await? {
            self.repos.appointments.delete(a.id).await?;
        }
        self.repos.clients.delete(id).await?;
        info!(client_id = %id, "client_deleted");
        Ok(())
    }

    /// Move along the repair workflow. Same-state requests are no-ops.
    #[instrument(skip(self))]
    pub async fn set_repair_status(&self, id: Uuid, next: RepairStatus) -> Result<client::Model, ServiceError> {
        let mut c = self.get(id).await?;
        if c.repair_status == next {
            return Ok(c);
        }
        if !c.repair_status.can_transition_to(next) {
            return Err(ServiceError::invalid_state(format!("repair status cannot go from {} to {}", c.repair_status, next)));
        }
        let prev = c.repair_status;
        c.repair_status = next;
        c.updated_at = crate::now();
        let saved = self.repos.clients.update(c).await?;
        info!(client_id = %id, from = %prev, to = %next, "repair_status_changed");
        Ok(saved)
    }

    pub async fn set_payment_status(&self, id: Uuid, status: PaymentStatus) -> Result<client::Model, ServiceError> {
        let mut c = self.get(id).await?;
        if c.payment_status == status {
            return Ok(c);
        }
        c.payment_status = status;
        c.updated_at = crate::now();
        self.repos.clients.update(c).await
    }

    /// Recompute `payment_status` after invoice or payment changes.
    pub(crate) async fn refresh_payment_status(&self, id: Uuid) -> Result<(), ServiceError> {
        let invoices = self.repos.invoices.find_all(&InvoiceFilter::for_client(id)).await?;
        let status = derive_payment_status(&invoices);
        self.set_payment_status(id, status).await?;
        Ok(())
    }

    pub async fn history(&self, id: Uuid) -> Result<ClientHistory, ServiceError> {
        let client = self.get(id).await?;
        let invoices = self.repos.invoices.find_all(&InvoiceFilter::for_client(id)).await?;
        let budgets = self.repos.budgets.find_all(&BudgetFilter { client_id: Some(id), ..Default::default() }).await?;
        let appointments = self
            .repos
            .appointments
            .find_all(&AppointmentFilter { client_id: Some(id), ..Default::default() })
            .await?;
        let payments = self.repos.payments.find_all(&PaymentFilter { client_id: Some(id), ..Default::default() }).await?;
        Ok(ClientHistory { client, invoices, budgets, appointments, payments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client_input, services};

    #[tokio::test]
    async fn create_normalizes_and_rejects_duplicate_plate() -> Result<(), anyhow::Error> {
        let s = services();
        let c = s.clients.create(client_input("1234-bcd")).await?;
        assert_eq!(c.license_plate, "1234BCD");
        assert_eq!(c.repair_status, RepairStatus::Waiting);
        assert_eq!(c.payment_status, PaymentStatus::Pending);

        let dup = s.clients.create(client_input("1234 BCD")).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        let mut bad = client_input("5555XYZ");
        bad.phone = "12".into();
        assert!(s.clients.create(bad).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn repair_workflow_enforces_transitions() -> Result<(), anyhow::Error> {
        let s = services();
        let c = s.clients.create(client_input("7777KKK")).await?;
        let bad = s.clients.set_repair_status(c.id, RepairStatus::Delivered).await;
        assert!(matches!(bad, Err(ServiceError::InvalidState(_))));

        for next in [RepairStatus::InProgress, RepairStatus::Completed, RepairStatus::Delivered] {
            assert_eq!(s.clients.set_repair_status(c.id, next).await?.repair_status, next);
        }
        // same state is accepted, anything else is not
        assert!(s.clients.set_repair_status(c.id, RepairStatus::Delivered).await.is_ok());
        assert!(s.clients.set_repair_status(c.id, RepairStatus::Waiting).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn list_filters_and_searches() -> Result<(), anyhow::Error> {
        let s = services();
        let a = s.clients.create(client_input("1111AAA")).await?;
        let mut other = client_input("2222BBB");
        other.name = "Marta Gil".into();
        s.clients.create(other).await?;
        s.clients.set_repair_status(a.id, RepairStatus::InProgress).await?;

        let in_progress = s
            .clients
            .list(ClientFilter { repair_status: Some(RepairStatus::InProgress), ..Default::default() }, Pagination::default())
            .await?;
        assert_eq!(in_progress.total, 1);
        assert_eq!(in_progress.items[0].id, a.id);

        let marta = s.clients.list(ClientFilter { q: Some("MARTA".into()), ..Default::default() }, Pagination::default()).await?;
        assert_eq!(marta.items.len(), 1);
        assert_eq!(marta.items[0].license_plate, "2222BBB");
        Ok(())
    }

    #[tokio::test]
    async fn patch_updates_only_given_fields() -> Result<(), anyhow::Error> {
        let s = services();
        let c = s.clients.create(client_input("3333CCC")).await?;
        let patched = s
            .clients
            .update(c.id, ClientPatch { mileage: Some(120_000), notes: Some("  ".into()), ..Default::default() })
            .await?;
        assert_eq!(patched.mileage, Some(120_000));
        assert_eq!(patched.notes, None);
        assert_eq!(patched.name, c.name);
        Ok(())
    }

    #[test]
    fn payment_status_derivation() {
        use crate::test_support::invoice_row;
        use models::enums::InvoiceStatus;
        use rust_decimal_macros::dec;

        let mut a = invoice_row(dec!(100), InvoiceStatus::Issued);
        let b = invoice_row(dec!(50), InvoiceStatus::Draft);
        assert_eq!(derive_payment_status(&[a.clone(), b.clone()]), PaymentStatus::Pending);
        a.amount_paid = dec!(40);
        assert_eq!(derive_payment_status(&[a.clone(), b.clone()]), PaymentStatus::Partial);
        a.amount_paid = dec!(100);
        assert_eq!(derive_payment_status(&[a, b]), PaymentStatus::Paid);
        assert_eq!(derive_payment_status(&[]), PaymentStatus::Pending);
    }
}
