//! Invoicing: totals, numbering, lifecycle and payments.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use common::types::Page;
use configs::BusinessConfig;
use models::enums::{InvoiceStatus, PaymentMethod};
use models::invoice::{self, format_number, parse_number, NUMBER_PREFIX};
use models::line_item::{compute_totals, round2, LineItem, LineItems};
use models::payment;

use crate::clients::ClientService;
use crate::errors::ServiceError;
use crate::non_blank;
use crate::pagination::Pagination;
use crate::repository::{InvoiceFilter, PaymentFilter, Repositories};

/// Attempts at allocating a number before giving up on a unique-index race.
const NUMBER_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceInput {
    pub client_id: Uuid,
    pub items: Vec<LineItem>,
    pub discount: Option<Decimal>,
    /// Percent; the business default applies when absent.
    pub tax_rate: Option<Decimal>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Create directly as `issued` instead of `draft`.
    #[serde(default)]
    pub issue: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceUpdate {
    pub items: Option<Vec<LineItem>>,
    pub discount: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentInput {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    /// Defaults to now.
    pub paid_at: Option<DateTimeWithTimeZone>,
}

pub(crate) fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), ServiceError> {
    match (from, to) {
        (Some(f), Some(t)) if f > t => Err(ServiceError::validation("from must not be after to")),
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct InvoiceService {
    repos: Repositories,
    business: Arc<BusinessConfig>,
    clients: ClientService,
}

impl InvoiceService {
    pub fn new(repos: Repositories, business: Arc<BusinessConfig>, clients: ClientService) -> Self {
        Self { repos, business, clients }
    }

    /// Same service over other repositories, e.g. ones bound to a transaction.
    pub(crate) fn with_repos(&self, repos: Repositories) -> Self {
        Self { repos: repos.clone(), business: self.business.clone(), clients: ClientService::new(repos) }
    }

    pub async fn list(&self, filter: InvoiceFilter, page: Pagination) -> Result<Page<invoice::Model>, ServiceError> {
        check_range(filter.from, filter.to)?;
        let (rows, total) = self.repos.invoices.find(&filter, Some(page)).await?;
        Ok(page.page_of(rows, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<invoice::Model, ServiceError> {
        self.repos.invoices.get(id).await?.ok_or_else(|| ServiceError::not_found("invoice"))
    }

    async fn next_number(&self) -> Result<String, ServiceError> {
        let last = self.repos.invoices.find_one(&InvoiceFilter::by_number_desc()).await?;
        let seq = last.and_then(|i| parse_number(NUMBER_PREFIX, &i.number)).unwrap_or(0);
        Ok(format_number(NUMBER_PREFIX, seq + 1))
    }

    #[instrument(skip(self, input), fields(client_id = %input.client_id))]
    pub async fn create(&self, input: InvoiceInput) -> Result<invoice::Model, ServiceError> {
        let client = self
            .repos
            .clients
            .get(input.client_id)
            .await?
            .ok_or_else(|| ServiceError::validation("client_id does not reference an existing client"))?;

        let items = LineItems::from(input.items);
        let tax_rate = input.tax_rate.unwrap_or(self.business.default_tax_rate);
        let totals = compute_totals(&items, round2(input.discount.unwrap_or_default()), tax_rate)?;
        let issue_date = input.issue_date.unwrap_or_else(crate::today);
        let due_date = input.due_date.unwrap_or(issue_date + Duration::days(self.business.invoice_due_days));
        if due_date < issue_date {
            return Err(ServiceError::validation("due_date must not precede issue_date"));
        }

        let now = crate::now();
        let mut row = invoice::Model {
            id: Uuid::new_v4(),
            number: String::new(),
            client_id: client.id,
            items,
            subtotal: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::ZERO,
            amount_paid: Decimal::ZERO,
            status: if input.issue { InvoiceStatus::Issued } else { InvoiceStatus::Draft },
            issue_date,
            due_date,
            notes: non_blank(input.notes),
            created_at: now,
            updated_at: now,
        };
        row.apply_totals(totals);

        let mut attempt = 0;
        let created = loop {
            attempt += 1;
            row.number = self.next_number().await?;
            match self.repos.invoices.insert(row.clone()).await {
                Err(ServiceError::Conflict(msg)) if attempt < NUMBER_ATTEMPTS => {
                    warn!(number = %row.number, %msg, "invoice number taken, retrying");
                }
                other => break other?,
            }
        };
        info!(invoice_id = %created.id, number = %created.number, total = %created.total, status = %created.status, "invoice_created");
        if created.status.is_billable() {
            self.clients.refresh_payment_status(created.client_id).await?;
        }
        Ok(created)
    }

    /// Editable while `draft` or `issued` and nothing has been paid.
    #[instrument(skip(self, upd))]
    pub async fn update(&self, id: Uuid, upd: InvoiceUpdate) -> Result<invoice::Model, ServiceError> {
        let mut inv = self.get(id).await?;
        if !matches!(inv.status, InvoiceStatus::Draft | InvoiceStatus::Issued) || inv.amount_paid > Decimal::ZERO {
            return Err(ServiceError::invalid_state(format!("invoice {} can no longer be edited", inv.number)));
        }
        if let Some(items) = upd.items { inv.items = LineItems::from(items); }
        let discount = upd.discount.map(round2).unwrap_or(inv.discount);
        let tax_rate = upd.tax_rate.unwrap_or(inv.tax_rate);
        let totals = compute_totals(&inv.items, discount, tax_rate)?;
        inv.apply_totals(totals);
        if let Some(d) = upd.issue_date { inv.issue_date = d; }
        if let Some(d) = upd.due_date { inv.due_date = d; }
        if inv.due_date < inv.issue_date {
            return Err(ServiceError::validation("due_date must not precede issue_date"));
        }
        if let Some(n) = upd.notes { inv.notes = non_blank(Some(n)); }
        inv.updated_at = crate::now();
        let saved = self.repos.invoices.update(inv).await?;
        if saved.status.is_billable() {
            self.clients.refresh_payment_status(saved.client_id).await?;
        }
        Ok(saved)
    }

    /// Only drafts and cancelled invoices may be removed.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let inv = self.get(id).await?;
        if !matches!(inv.status, InvoiceStatus::Draft | InvoiceStatus::Cancelled) {
            return Err(ServiceError::invalid_state(format!("invoice {} is {}; only draft or cancelled invoices can be deleted", inv.number, inv.status)));
        }
        self.repos.invoices.delete(id).await?;
        info!(invoice_id = %id, number = %inv.number, "invoice_deleted");
        Ok(())
    }

    pub async fn issue(&self, id: Uuid) -> Result<invoice::Model, ServiceError> {
        let mut inv = self.get(id).await?;
        if inv.status != InvoiceStatus::Draft {
            return Err(ServiceError::invalid_state(format!("only draft invoices can be issued (status: {})", inv.status)));
        }
        inv.status = InvoiceStatus::Issued;
        inv.updated_at = crate::now();
        let saved = self.repos.invoices.update(inv).await?;
        self.clients.refresh_payment_status(saved.client_id).await?;
        info!(invoice_id = %id, number = %saved.number, "invoice_issued");
        Ok(saved)
    }

    pub async fn cancel(&self, id: Uuid) -> Result<invoice::Model, ServiceError> {
        let mut inv = self.get(id).await?;
        if inv.status == InvoiceStatus::Cancelled {
            return Ok(inv);
        }
        if inv.amount_paid > Decimal::ZERO {
            return Err(ServiceError::invalid_state(format!("invoice {} has payments and cannot be cancelled", inv.number)));
        }
        inv.status = InvoiceStatus::Cancelled;
        inv.updated_at = crate::now();
        let saved = self.repos.invoices.update(inv).await?;
        self.clients.refresh_payment_status(saved.client_id).await?;
        info!(invoice_id = %id, number = %saved.number, "invoice_cancelled");
        Ok(saved)
    }

    /// Apply a payment; the amount must be positive and within the balance.
    #[instrument(skip(self, input), fields(amount = %input.amount))]
    pub async fn record_payment(
        &self,
        id: Uuid,
        recorded_by: Option<Uuid>,
        input: PaymentInput,
    ) -> Result<(invoice::Model, payment::Model), ServiceError> {
        let mut inv = self.get(id).await?;
        match inv.status {
            InvoiceStatus::Draft | InvoiceStatus::Cancelled => {
                return Err(ServiceError::invalid_state(format!("cannot pay a {} invoice", inv.status)));
            }
            InvoiceStatus::Paid => return Err(ServiceError::invalid_state("invoice is already paid")),
            _ => {}
        }
        let amount = round2(input.amount);
        if amount <= Decimal::ZERO {
            return Err(ServiceError::validation("payment amount must be > 0"));
        }
        if amount > inv.balance() {
            return Err(ServiceError::validation(format!("payment {} exceeds outstanding balance {}", amount, inv.balance())));
        }

        let now = crate::now();
        let paid = self
            .repos
            .payments
            .insert(payment::Model {
                id: Uuid::new_v4(),
                invoice_id: inv.id,
                client_id: inv.client_id,
                amount,
                method: input.method,
                reference: non_blank(input.reference),
                paid_at: input.paid_at.unwrap_or(now),
                recorded_by,
                created_at: now,
            })
            .await?;

        inv.amount_paid += amount;
        inv.status = inv.status_after_payment();
        inv.updated_at = now;
        let inv = self.repos.invoices.update(inv).await?;
        self.clients.refresh_payment_status(inv.client_id).await?;
        info!(invoice_id = %inv.id, payment_id = %paid.id, balance = %inv.balance(), status = %inv.status, "payment_recorded");
        Ok((inv, paid))
    }

    pub async fn payments(&self, id: Uuid) -> Result<Vec<payment::Model>, ServiceError> {
        self.get(id).await?;
        self.repos.payments.find_all(&PaymentFilter { invoice_id: Some(id), ..Default::default() }).await
    }

    /// Flag issued or partially paid invoices whose due date is before `today`.
    #[instrument(skip(self))]
    pub async fn mark_overdue(&self, today: NaiveDate) -> Result<Vec<invoice::Model>, ServiceError> {
        let filter = InvoiceFilter {
            any_status: vec![InvoiceStatus::Issued, InvoiceStatus::PartiallyPaid],
            due_before: Some(today),
            ..Default::default()
        };
        let mut updated = Vec::new();
        for mut inv in self.repos.invoices.find_all(&filter).await? {
            inv.status = InvoiceStatus::Overdue;
            inv.updated_at = crate::now();
            updated.push(self.repos.invoices.update(inv).await?);
        }
        info!(event = "overdue_sweep", count = updated.len(), %today, "invoices marked overdue");
        Ok(updated)
    }

    /// Printable PDF of a single invoice.
    pub async fn pdf(&self, id: Uuid) -> Result<(String, Vec<u8>), ServiceError> {
        let inv = self.get(id).await?;
        let client = self.clients.get(inv.client_id).await?;
        let bytes = crate::reports::pdf::invoice_pdf(&inv, &client, &self.business)?;
        Ok((format!("{}.pdf", inv.number), bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client_input, invoice_input, services};
    use models::enums::PaymentStatus;
    use rust_decimal_macros::dec;

    fn pay(amount: Decimal) -> PaymentInput {
        PaymentInput { amount, method: PaymentMethod::Card, reference: None, paid_at: None }
    }

    #[tokio::test]
    async fn numbers_are_sequential_and_totals_server_side() -> Result<(), anyhow::Error> {
        let s = services();
        let c = s.clients.create(client_input("1000AAA")).await?;
        let a = s.invoices.create(invoice_input(c.id, false)).await?;
        let b = s.invoices.create(invoice_input(c.id, true)).await?;
        assert_eq!(a.number, "INV-000001");
        assert_eq!(b.number, "INV-000002");
        assert_eq!(a.status, InvoiceStatus::Draft);
        assert_eq!(b.status, InvoiceStatus::Issued);
        // 2 x 45 + 110 = 200, -20 discount, 21% of 180
        assert_eq!(a.subtotal, dec!(200.00));
        assert_eq!(a.tax_amount, dec!(37.80));
        assert_eq!(a.total, dec!(217.80));
        assert_eq!(a.due_date, a.issue_date + Duration::days(30));
        Ok(())
    }

    #[tokio::test]
    async fn numbering_continues_past_six_digits() -> Result<(), anyhow::Error> {
        let s = services();
        let c = s.clients.create(client_input("1000ABC")).await?;
        let mut seeded = crate::test_support::invoice_row(dec!(10), InvoiceStatus::Issued);
        seeded.number = "INV-999999".into();
        seeded.client_id = c.id;
        s.invoices.repos.invoices.insert(seeded).await?;

        let a = s.invoices.create(invoice_input(c.id, false)).await?;
        let b = s.invoices.create(invoice_input(c.id, false)).await?;
        assert_eq!(a.number, "INV-1000000");
        assert_eq!(b.number, "INV-1000001");
        Ok(())
    }

    #[tokio::test]
    async fn payments_progress_status_and_client() -> Result<(), anyhow::Error> {
        let s = services();
        let c = s.clients.create(client_input("1000BBB")).await?;
        let inv = s.invoices.create(invoice_input(c.id, true)).await?;

        let over = s.invoices.record_payment(inv.id, None, pay(dec!(300))).await;
        assert!(matches!(over, Err(ServiceError::Validation(_))));
        assert!(matches!(s.invoices.record_payment(inv.id, None, pay(dec!(0))).await, Err(ServiceError::Validation(_))));

        let (inv1, _) = s.invoices.record_payment(inv.id, None, pay(dec!(100))).await?;
        assert_eq!(inv1.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(s.clients.get(c.id).await?.payment_status, PaymentStatus::Partial);

        let (inv2, _) = s.invoices.record_payment(inv.id, None, pay(inv1.balance())).await?;
        assert_eq!(inv2.status, InvoiceStatus::Paid);
        assert_eq!(inv2.amount_paid, inv2.total);
        assert_eq!(s.clients.get(c.id).await?.payment_status, PaymentStatus::Paid);
        assert_eq!(s.invoices.payments(inv.id).await?.len(), 2);

        assert!(matches!(s.invoices.record_payment(inv.id, None, pay(dec!(1))).await, Err(ServiceError::InvalidState(_))));
        assert!(matches!(s.invoices.cancel(inv.id).await, Err(ServiceError::InvalidState(_))));
        Ok(())
    }

    #[tokio::test]
    async fn lifecycle_guards() -> Result<(), anyhow::Error> {
        let s = services();
        let c = s.clients.create(client_input("1000CCC")).await?;
        let draft = s.invoices.create(invoice_input(c.id, false)).await?;
        assert!(matches!(s.invoices.record_payment(draft.id, None, pay(dec!(1))).await, Err(ServiceError::InvalidState(_))));

        let edited = s.invoices.update(draft.id, InvoiceUpdate { discount: Some(dec!(0)), ..Default::default() }).await?;
        assert_eq!(edited.total, dec!(242.00));

        let issued = s.invoices.issue(draft.id).await?;
        assert!(matches!(s.invoices.issue(draft.id).await, Err(ServiceError::InvalidState(_))));
        assert!(matches!(s.invoices.delete(issued.id).await, Err(ServiceError::InvalidState(_))));

        s.invoices.record_payment(issued.id, None, pay(dec!(10))).await?;
        let locked = s.invoices.update(issued.id, InvoiceUpdate { notes: Some("x".into()), ..Default::default() }).await;
        assert!(matches!(locked, Err(ServiceError::InvalidState(_))));

        let other = s.invoices.create(invoice_input(c.id, false)).await?;
        s.invoices.cancel(other.id).await?;
        s.invoices.delete(other.id).await?;
        assert!(matches!(s.invoices.get(other.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn overdue_sweep_keeps_accepting_payments() -> Result<(), anyhow::Error> {
        let s = services();
        let c = s.clients.create(client_input("1000DDD")).await?;
        let mut input = invoice_input(c.id, true);
        input.issue_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        input.due_date = NaiveDate::from_ymd_opt(2024, 1, 31);
        let inv = s.invoices.create(input).await?;
        s.invoices.create(invoice_input(c.id, false)).await?;

        let swept = s.invoices.mark_overdue(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()).await?;
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].id, inv.id);

        let (after, _) = s.invoices.record_payment(inv.id, None, pay(dec!(50))).await?;
        assert_eq!(after.status, InvoiceStatus::Overdue);
        let (after, _) = s.invoices.record_payment(inv.id, None, pay(after.balance())).await?;
        assert_eq!(after.status, InvoiceStatus::Paid);
        Ok(())
    }

    #[tokio::test]
    async fn rejects_unknown_client_and_inverted_range() -> Result<(), anyhow::Error> {
        let s = services();
        let res = s.invoices.create(invoice_input(Uuid::new_v4(), false)).await;
        assert!(matches!(res, Err(ServiceError::Validation(_))));
        let filter = InvoiceFilter {
            from: NaiveDate::from_ymd_opt(2024, 5, 1),
            to: NaiveDate::from_ymd_opt(2024, 4, 1),
            ..Default::default()
        };
        assert!(matches!(s.invoices.list(filter, Pagination::default()).await, Err(ServiceError::Validation(_))));
        Ok(())
    }
}
