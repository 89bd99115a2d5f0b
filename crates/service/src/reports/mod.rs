//! Financial reporting and the dashboard.
//!
//! `generator` is a pure function over loaded rows; this module loads the
//! rows, resolves the window and hands the result to the exporters.

pub mod generator;
pub mod model;
pub mod pdf;
pub mod xlsx;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use configs::BusinessConfig;
use models::appointment;
use models::enums::{BudgetStatus, RepairStatus};

use crate::errors::ServiceError;
use crate::invoices::check_range;
use crate::repository::{AppointmentFilter, BudgetFilter, ClientFilter, ExpenseFilter, InvoiceFilter, PaymentFilter, Repositories};

pub use generator::{generate, ReportData, Window};
pub use model::*;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub clients_by_repair_status: BTreeMap<String, u64>,
    pub todays_appointments: Vec<appointment::Model>,
    pub open_invoices: u64,
    pub open_balance: Decimal,
    pub pending_budgets: u64,
}

#[derive(Clone)]
pub struct ReportService {
    repos: Repositories,
    business: Arc<BusinessConfig>,
}

impl ReportService {
    pub fn new(repos: Repositories, business: Arc<BusinessConfig>) -> Self { Self { repos, business } }

    /// Build the report for `[from, to]`; `as_of` defaults to `today`.
    #[instrument(skip(self))]
    pub async fn financial(&self, params: ReportParams, today: NaiveDate) -> Result<FinancialReport, ServiceError> {
        check_range(Some(params.from), Some(params.to))?;
        let w = Window {
            from: params.from,
            to: params.to,
            as_of: params.as_of.unwrap_or(today),
            top: params.top.unwrap_or(DEFAULT_TOP_CLIENTS).clamp(1, 100),
        };

        let invoices = self
            .repos
            .invoices
            .find_all(&InvoiceFilter { to: Some(w.to.max(w.as_of)), ..Default::default() })
            .await?;
        let payments = self
            .repos
            .payments
            .find_all(&PaymentFilter { from: Some(w.from), to: Some(w.to), ..Default::default() })
            .await?;
        let expenses = self
            .repos
            .expenses
            .find_all(&ExpenseFilter { from: Some(w.from), to: Some(w.to), ..Default::default() })
            .await?;
        let clients = self.repos.clients.find_all(&ClientFilter::default()).await?;

        let data = ReportData { invoices: &invoices, payments: &payments, expenses: &expenses, clients: &clients };
        let report = generate(&self.business.company_name, &self.business.currency, w, &data);
        info!(
            event = "financial_report",
            from = %w.from,
            to = %w.to,
            invoices = report.summary.invoice_count,
            "report generated"
        );
        Ok(report)
    }

    pub async fn financial_pdf(&self, params: ReportParams, today: NaiveDate) -> Result<(String, Vec<u8>), ServiceError> {
        let report = self.financial(params, today).await?;
        let bytes = pdf::financial_report_pdf(&report)?;
        Ok((format!("financial-report-{}-{}.pdf", report.period.from, report.period.to), bytes))
    }

    pub async fn financial_xlsx(&self, params: ReportParams, today: NaiveDate) -> Result<(String, Vec<u8>), ServiceError> {
        let report = self.financial(params, today).await?;
        let bytes = xlsx::financial_report_xlsx(&report)?;
        Ok((format!("financial-report-{}-{}.xlsx", report.period.from, report.period.to), bytes))
    }

    pub async fn dashboard(&self, today: NaiveDate) -> Result<Dashboard, ServiceError> {
        let mut clients_by_repair_status: BTreeMap<String, u64> =
            RepairStatus::all().into_iter().map(|s| (s.to_string(), 0)).collect();
        for c in self.repos.clients.find_all(&ClientFilter::default()).await? {
            *clients_by_repair_status.entry(c.repair_status.to_string()).or_default() += 1;
        }

        let todays_appointments = self
            .repos
            .appointments
            .find_all(&AppointmentFilter { from: Some(today), to: Some(today), ..Default::default() })
            .await?;

        let open = self.repos.invoices.find_all(&InvoiceFilter::open()).await?;
        let pending_budgets = self
            .repos
            .budgets
            .find_all(&BudgetFilter { status: Some(BudgetStatus::Pending), ..Default::default() })
            .await?
            .into_iter()
            .filter(|b| !b.is_expired_on(today))
            .count() as u64;

        Ok(Dashboard {
            clients_by_repair_status,
            todays_appointments,
            open_invoices: open.len() as u64,
            open_balance: open.iter().map(|i| i.balance()).sum(),
            pending_budgets,
        })
    }
}
