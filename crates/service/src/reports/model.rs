//! Shapes of the financial report. All money is rounded to cents.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::enums::ExpenseCategory;

pub const DEFAULT_TOP_CLIENTS: usize = 10;

/// Query of `GET /api/reports/financial*`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReportParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Reference date for aging and outstanding balances; defaults to today.
    pub as_of: Option<NaiveDate>,
    /// Number of clients in the ranking; defaults to 10.
    pub top: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Period {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub invoiced: Decimal,
    pub collected: Decimal,
    pub outstanding: Decimal,
    pub expenses: Decimal,
    pub net_income: Decimal,
    pub invoice_count: u64,
    pub average_invoice: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgingBucket {
    pub label: &'static str,
    pub amount: Decimal,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aging {
    pub buckets: Vec<AgingBucket>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub month: String,
    pub invoiced: Decimal,
    pub collected: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientMetrics {
    pub client_id: Uuid,
    pub client_name: String,
    pub invoice_count: u64,
    pub billed: Decimal,
    pub paid: Decimal,
    pub outstanding: Decimal,
    pub average_invoice: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxRateLine {
    pub rate: Decimal,
    pub taxable_base: Decimal,
    pub tax: Decimal,
    pub invoice_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxBreakdown {
    pub by_rate: Vec<TaxRateLine>,
    pub total_base: Decimal,
    pub total_tax: Decimal,
    pub deductible_expenses: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAmount {
    pub category: ExpenseCategory,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profitability {
    pub service_revenue: Decimal,
    pub parts_revenue: Decimal,
    /// Net of tax and discounts.
    pub total_revenue: Decimal,
    pub expenses_by_category: Vec<CategoryAmount>,
    pub total_expenses: Decimal,
    pub gross_profit: Decimal,
    pub margin_pct: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialReport {
    pub company: String,
    pub currency: String,
    pub period: Period,
    pub summary: Summary,
    pub aging: Aging,
    pub monthly: Vec<MonthlyTrend>,
    pub top_clients: Vec<ClientMetrics>,
    pub tax: TaxBreakdown,
    pub profitability: Profitability,
}
