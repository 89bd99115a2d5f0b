//! Budgets (quotes): approval workflow and conversion into invoices.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use common::types::Page;
use configs::BusinessConfig;
use models::budget::{self, NUMBER_PREFIX};
use models::enums::BudgetStatus;
use models::invoice::{format_number, parse_number};
use models::line_item::{compute_totals, round2, LineItem, LineItems};

use crate::clients::ClientService;
use crate::errors::ServiceError;
use crate::invoices::{InvoiceInput, InvoiceService};
use crate::non_blank;
use crate::pagination::Pagination;
use crate::repository::{BudgetFilter, Repositories};

const NUMBER_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct BudgetInput {
    pub client_id: Uuid,
    pub items: Vec<LineItem>,
    pub discount: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    /// Defaults to today plus the configured validity.
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetUpdate {
    pub items: Option<Vec<LineItem>>,
    pub discount: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Pending budgets past `valid_until` read as `expired`.
fn effective(mut b: budget::Model, today: NaiveDate) -> budget::Model {
    if b.is_expired_on(today) {
        b.status = BudgetStatus::Expired;
    }
    b
}

#[derive(Clone)]
pub struct BudgetService {
    repos: Repositories,
    business: Arc<BusinessConfig>,
    invoices: InvoiceService,
}

impl BudgetService {
    pub fn new(repos: Repositories, business: Arc<BusinessConfig>, invoices: InvoiceService) -> Self {
        Self { repos, business, invoices }
    }

    pub async fn list(&self, filter: BudgetFilter, page: Pagination) -> Result<Page<budget::Model>, ServiceError> {
        let today = crate::today();
        let (rows, total) = self.repos.budgets.find(&filter, Some(page)).await?;
        Ok(page.page_of(rows.into_iter().map(|b| effective(b, today)).collect(), total))
    }

    pub async fn get(&self, id: Uuid) -> Result<budget::Model, ServiceError> {
        let b = self.repos.budgets.get(id).await?.ok_or_else(|| ServiceError::not_found("budget"))?;
        Ok(effective(b, crate::today()))
    }

    async fn next_number(&self) -> Result<String, ServiceError> {
        let last = self.repos.budgets.find_one(&BudgetFilter { number_desc: true, ..Default::default() }).await?;
        let seq = last.and_then(|b| parse_number(NUMBER_PREFIX, &b.number)).unwrap_or(0);
        Ok(format_number(NUMBER_PREFIX, seq + 1))
    }

    #[instrument(skip(self, input), fields(client_id = %input.client_id))]
    pub async fn create(&self, input: BudgetInput) -> Result<budget::Model, ServiceError> {
        if self.repos.clients.get(input.client_id).await?.is_none() {
            return Err(ServiceError::validation("client_id does not reference an existing client"));
        }
        let items = LineItems::from(input.items);
        let tax_rate = input.tax_rate.unwrap_or(self.business.default_tax_rate);
        let totals = compute_totals(&items, round2(input.discount.unwrap_or_default()), tax_rate)?;
        let today = crate::today();
        let valid_until = input.valid_until.unwrap_or(today + Duration::days(self.business.budget_valid_days));

        let now = crate::now();
        let mut row = budget::Model {
            id: Uuid::new_v4(),
            number: String::new(),
            client_id: input.client_id,
            items,
            subtotal: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::ZERO,
            status: BudgetStatus::Pending,
            valid_until,
            invoice_id: None,
            notes: non_blank(input.notes),
            created_at: now,
            updated_at: now,
        };
        row.apply_totals(totals);

        let mut attempt = 0;
        let created = loop {
            attempt += 1;
            row.number = self.next_number().await?;
            match self.repos.budgets.insert(row.clone()).await {
                Err(ServiceError::Conflict(msg)) if attempt < NUMBER_ATTEMPTS => {
                    warn!(number = %row.number, %msg, "budget number taken, retrying");
                }
                other => break other?,
            }
        };
        info!(budget_id = %created.id, number = %created.number, total = %created.total, "budget_created");
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, upd: BudgetUpdate) -> Result<budget::Model, ServiceError> {
        let mut b = self.get(id).await?;
        if b.status != BudgetStatus::Pending {
            return Err(ServiceError::invalid_state(format!("budget {} is {}; only pending budgets can be edited", b.number, b.status)));
        }
        if let Some(items) = upd.items { b.items = LineItems::from(items); }
        let discount = upd.discount.map(round2).unwrap_or(b.discount);
        let tax_rate = upd.tax_rate.unwrap_or(b.tax_rate);
        let totals = compute_totals(&b.items, discount, tax_rate)?;
        b.apply_totals(totals);
        if let Some(v) = upd.valid_until { b.valid_until = v; }
        if let Some(n) = upd.notes { b.notes = non_blank(Some(n)); }
        b.updated_at = crate::now();
        self.repos.budgets.update(b).await
    }

    /// Converted budgets stay as the audit trail of their invoice.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let b = self.get(id).await?;
        if b.status == BudgetStatus::Converted {
            return Err(ServiceError::invalid_state(format!("budget {} was converted into an invoice", b.number)));
        }
        self.repos.budgets.delete(id).await?;
        info!(budget_id = %id, number = %b.number, "budget_deleted");
        Ok(())
    }

    /// Leave `pending` for `next`. Expired budgets are persisted as such and refused.
    async fn decide(&self, id: Uuid, next: BudgetStatus) -> Result<budget::Model, ServiceError> {
        let mut b = self.repos.budgets.get(id).await?.ok_or_else(|| ServiceError::not_found("budget"))?;
        if b.status == BudgetStatus::Pending && b.is_expired_on(crate::today()) {
            b.status = BudgetStatus::Expired;
            b.updated_at = crate::now();
            let b = self.repos.budgets.update(b).await?;
            return Err(ServiceError::invalid_state(format!("budget {} expired on {}", b.number, b.valid_until)));
        }
        if b.status != BudgetStatus::Pending {
            return Err(ServiceError::invalid_state(format!("budget {} is {}, not pending", b.number, b.status)));
        }
        b.status = next;
        b.updated_at = crate::now();
        let saved = self.repos.budgets.update(b).await?;
        info!(budget_id = %id, status = %next, "budget_decided");
        Ok(saved)
    }

    pub async fn approve(&self, id: Uuid) -> Result<budget::Model, ServiceError> {
        self.decide(id, BudgetStatus::Approved).await
    }

    pub async fn reject(&self, id: Uuid) -> Result<budget::Model, ServiceError> {
        self.decide(id, BudgetStatus::Rejected).await
    }

    /// Turn an approved budget into an issued invoice with the same lines.
    #[instrument(skip(self))]
    pub async fn convert(&self, id: Uuid) -> Result<(budget::Model, models::invoice::Model), ServiceError> {
        let b = self.get(id).await?;
        if b.status != BudgetStatus::Approved {
            return Err(ServiceError::invalid_state(format!("budget {} is {}; only approved budgets convert", b.number, b.status)));
        }
        let input = InvoiceInput {
            client_id: b.client_id,
            items: b.items.0.clone(),
            discount: Some(b.discount),
            tax_rate: Some(b.tax_rate),
            issue_date: None,
            due_date: None,
            notes: Some(format!("From budget {}", b.number)),
            issue: true,
        };
        let invoices = self.invoices.clone();
        let undo_on_failure = !self.repos.is_transactional();
        let (b, invoice) = self
            .repos
            .transaction(move |repos| {
                Box::pin(async move {
                    let mut b = b;
                    let invoice = invoices.with_repos(repos.clone()).create(input).await?;
                    b.status = BudgetStatus::Converted;
                    b.invoice_id = Some(invoice.id);
                    b.updated_at = crate::now();
                    match repos.budgets.update(b).await {
                        Ok(b) => Ok((b, invoice)),
                        Err(e) => {
                            // Without a transaction the issued invoice must be removed by hand.
                            if undo_on_failure {
                                let undo = match repos.invoices.delete(invoice.id).await {
                                    Ok(_) => ClientService::new(repos.clone()).refresh_payment_status(invoice.client_id).await,
                                    Err(undo) => Err(undo),
                                };
                                if let Err(undo) = undo {
                                    warn!(invoice_id = %invoice.id, err = %undo, "cleanup after failed conversion incomplete");
                                }
                            }
                            Err(e)
                        }
                    }
                })
            })
            .await?;
        info!(budget_id = %b.id, invoice_id = %invoice.id, number = %invoice.number, "budget_converted");
        Ok((b, invoice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{RecordFilter, Repository};
    use crate::test_support::{budget_input, client_input, services};
    use models::enums::InvoiceStatus;

    #[tokio::test]
    async fn approve_then_convert_creates_issued_invoice() -> Result<(), anyhow::Error> {
        let s = services();
        let c = s.clients.create(client_input("3000AAA")).await?;
        let b = s.budgets.create(budget_input(c.id)).await?;
        assert_eq!(b.number, "BUD-000001");
        assert_eq!(b.status, BudgetStatus::Pending);
        assert!(matches!(s.budgets.convert(b.id).await, Err(ServiceError::InvalidState(_))));

        s.budgets.approve(b.id).await?;
        let (converted, invoice) = s.budgets.convert(b.id).await?;
        assert_eq!(converted.status, BudgetStatus::Converted);
        assert_eq!(converted.invoice_id, Some(invoice.id));
        assert_eq!(invoice.status, InvoiceStatus::Issued);
        assert_eq!(invoice.total, b.total);
        assert_eq!(invoice.items, b.items);
        assert!(matches!(s.budgets.convert(b.id).await, Err(ServiceError::InvalidState(_))));
        assert!(matches!(s.budgets.delete(b.id).await, Err(ServiceError::InvalidState(_))));
        Ok(())
    }

    #[tokio::test]
    async fn expired_budget_cannot_be_approved() -> Result<(), anyhow::Error> {
        let s = services();
        let c = s.clients.create(client_input("3000BBB")).await?;
        let mut input = budget_input(c.id);
        input.valid_until = NaiveDate::from_ymd_opt(2020, 1, 1);
        let b = s.budgets.create(input).await?;
        assert_eq!(s.budgets.get(b.id).await?.status, BudgetStatus::Expired);

        assert!(matches!(s.budgets.approve(b.id).await, Err(ServiceError::InvalidState(_))));
        let stored = s.budgets.repos.budgets.get(b.id).await?.expect("stored");
        assert_eq!(stored.status, BudgetStatus::Expired);
        Ok(())
    }

    #[tokio::test]
    async fn only_pending_budgets_are_editable_or_decidable() -> Result<(), anyhow::Error> {
        let s = services();
        let c = s.clients.create(client_input("3000CCC")).await?;
        let b = s.budgets.create(budget_input(c.id)).await?;
        let edited = s.budgets.update(b.id, BudgetUpdate { discount: Some(Decimal::ZERO), ..Default::default() }).await?;
        assert!(edited.total > b.total);

        s.budgets.reject(b.id).await?;
        assert!(matches!(s.budgets.approve(b.id).await, Err(ServiceError::InvalidState(_))));
        assert!(matches!(s.budgets.update(b.id, BudgetUpdate::default()).await, Err(ServiceError::InvalidState(_))));
        s.budgets.delete(b.id).await?;
        Ok(())
    }

    /// Budget store that refuses to persist the converted state.
    struct FailsOnConvert(Arc<dyn Repository<budget::Entity>>);

    #[async_trait::async_trait]
    impl Repository<budget::Entity> for FailsOnConvert {
        async fn get(&self, id: Uuid) -> Result<Option<budget::Model>, ServiceError> { self.0.get(id).await }
        async fn insert(&self, row: budget::Model) -> Result<budget::Model, ServiceError> { self.0.insert(row).await }
        async fn update(&self, row: budget::Model) -> Result<budget::Model, ServiceError> {
            if row.status == BudgetStatus::Converted {
                return Err(ServiceError::Db("disk full".into()));
            }
            self.0.update(row).await
        }
        async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> { self.0.delete(id).await }
        async fn find(
            &self,
            filter: &dyn RecordFilter<budget::Entity>,
            page: Option<Pagination>,
        ) -> Result<(Vec<budget::Model>, u64), ServiceError> {
            self.0.find(filter, page).await
        }
    }

    #[tokio::test]
    async fn failed_conversion_leaves_no_invoice_behind() -> Result<(), anyhow::Error> {
        let mut repos = Repositories::memory();
        repos.budgets = Arc::new(FailsOnConvert(repos.budgets.clone()));
        let auth = configs::AuthConfig { jwt_secret: "test-secret".into(), ..Default::default() };
        let s = crate::Services::new(repos, auth, BusinessConfig::default());

        let c = s.clients.create(client_input("3000DDD")).await?;
        let b = s.budgets.create(budget_input(c.id)).await?;
        s.budgets.approve(b.id).await?;
        assert!(matches!(s.budgets.convert(b.id).await, Err(ServiceError::Db(_))));

        assert_eq!(s.budgets.get(b.id).await?.status, BudgetStatus::Approved);
        let invoices = s.invoices.list(Default::default(), Pagination::default()).await?;
        assert_eq!(invoices.total, 0);
        assert_eq!(s.clients.get(c.id).await?.payment_status, models::enums::PaymentStatus::Pending);
        Ok(())
    }
}
