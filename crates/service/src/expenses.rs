use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use chrono::NaiveDate;

use common::types::Page;
use models::enums::ExpenseCategory;
use models::expense;
use models::line_item::round2;

use crate::errors::ServiceError;
use crate::invoices::check_range;
use crate::non_blank;
use crate::pagination::Pagination;
use crate::repository::{ExpenseFilter, Repositories};

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseInput {
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Decimal,
    pub expense_date: Option<NaiveDate>,
    pub supplier: Option<String>,
    #[serde(default)]
    pub tax_deductible: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseUpdate {
    pub category: Option<ExpenseCategory>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub expense_date: Option<NaiveDate>,
    pub supplier: Option<String>,
    pub tax_deductible: Option<bool>,
}

fn validate(e: &mut expense::Model) -> Result<(), ServiceError> {
    e.description = e.description.trim().to_string();
    if e.description.is_empty() {
        return Err(ServiceError::validation("description required"));
    }
    e.amount = round2(e.amount);
    if e.amount <= Decimal::ZERO {
        return Err(ServiceError::validation("amount must be > 0"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ExpenseService {
    repos: Repositories,
}

impl ExpenseService {
    pub fn new(repos: Repositories) -> Self { Self { repos } }

    pub async fn list(&self, filter: ExpenseFilter, page: Pagination) -> Result<Page<expense::Model>, ServiceError> {
        check_range(filter.from, filter.to)?;
        let (rows, total) = self.repos.expenses.find(&filter, Some(page)).await?;
        Ok(page.page_of(rows, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<expense::Model, ServiceError> {
        self.repos.expenses.get(id).await?.ok_or_else(|| ServiceError::not_found("expense"))
    }

    pub async fn create(&self, input: ExpenseInput) -> Result<expense::Model, ServiceError> {
        let now = crate::now();
        let mut row = expense::Model {
            id: Uuid::new_v4(),
            category: input.category,
            description: input.description,
            amount: input.amount,
            expense_date: input.expense_date.unwrap_or_else(crate::today),
            supplier: non_blank(input.supplier),
            tax_deductible: input.tax_deductible,
            created_at: now,
            updated_at: now,
        };
        validate(&mut row)?;
        let created = self.repos.expenses.insert(row).await?;
        info!(expense_id = %created.id, category = %created.category, amount = %created.amount, "expense_created");
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, upd: ExpenseUpdate) -> Result<expense::Model, ServiceError> {
        let mut e = self.get(id).await?;
        if let Some(v) = upd.category { e.category = v; }
        if let Some(v) = upd.description { e.description = v; }
        if let Some(v) = upd.amount { e.amount = v; }
        if let Some(v) = upd.expense_date { e.expense_date = v; }
        if let Some(v) = upd.supplier { e.supplier = non_blank(Some(v)); }
        if let Some(v) = upd.tax_deductible { e.tax_deductible = v; }
        validate(&mut e)?;
        e.updated_at = crate::now();
        self.repos.expenses.update(e).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.repos.expenses.delete(id).await? {
            return Err(ServiceError::not_found("expense"));
        }
        Ok(())
    }
}
