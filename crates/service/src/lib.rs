//! Service layer of the garage backend.
//! - Business rules for every resource live here, independent of axum.
//! - Persistence goes through `repository::Repository`, backed by sea-orm or memory.
//! - Reports are pure aggregations with PDF/XLSX exporters on top.

pub mod errors;
pub mod pagination;
pub mod runtime;
pub mod storage;
pub mod repository;
pub mod auth;
pub mod users;
pub mod clients;
pub mod invoices;
pub mod payments;
pub mod budgets;
pub mod appointments;
pub mod expenses;
pub mod shipments;
pub mod reports;
pub mod services;
#[cfg(test)]
pub mod test_support;

pub use services::Services;

use chrono::{NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;

pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Trimmed value, `None` when blank.
pub(crate) fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
