//! Query criteria for every entity, shared by the HTTP query strings and
//! the services. Fields marked `serde(skip)` are only set internally.

use std::cmp::Ordering;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, QueryFilter, QueryOrder, Select};
use serde::Deserialize;
use uuid::Uuid;

use models::enums::{
    AppointmentStatus, BudgetStatus, ExpenseCategory, InvoiceStatus, PaymentStatus, RepairStatus, Role, ShipmentStatus,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use models::{appointment, budget, client, expense, invoice, payment, shipment_request, user, user_credentials};

use super::RecordFilter;

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn lower_like<C: sea_orm::sea_query::IntoColumnRef>(col: C, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern).escape('\\'))
}

/// Document numbers share a prefix and are zero padded, so a longer number
/// is always the larger one.
fn number_cmp(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn number_len<C: sea_orm::sea_query::IntoColumnRef>(col: C) -> SimpleExpr {
    Func::char_length(Expr::col(col)).into()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn trimmed(q: &Option<String>) -> Option<&str> {
    q.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn in_range(d: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.map_or(true, |f| d >= f) && to.map_or(true, |t| d <= t)
}

fn day_start(d: NaiveDate) -> DateTimeWithTimeZone {
    d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().fixed_offset()
}

fn utc_date(ts: &DateTimeWithTimeZone) -> NaiveDate {
    ts.with_timezone(&Utc).date_naive()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub active: Option<bool>,
    #[serde(skip)]
    pub email: Option<String>,
}

impl RecordFilter<user::Entity> for UserFilter {
    fn matches(&self, u: &user::Model) -> bool {
        self.role.map_or(true, |r| u.role == r)
            && self.active.map_or(true, |a| u.active == a)
            && self.email.as_ref().map_or(true, |e| &u.email == e)
    }

    fn compare(&self, a: &user::Model, b: &user::Model) -> Ordering {
        a.email.cmp(&b.email)
    }

    fn apply(&self, mut q: Select<user::Entity>) -> Select<user::Entity> {
        if let Some(r) = self.role { q = q.filter(user::Column::Role.eq(r)); }
        if let Some(a) = self.active { q = q.filter(user::Column::Active.eq(a)); }
        if let Some(e) = &self.email { q = q.filter(user::Column::Email.eq(e.clone())); }
        q.order_by_asc(user::Column::Email)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CredentialFilter {
    pub user_id: Option<Uuid>,
}

impl RecordFilter<user_credentials::Entity> for CredentialFilter {
    fn matches(&self, c: &user_credentials::Model) -> bool {
        self.user_id.map_or(true, |id| c.user_id == id)
    }

    fn compare(&self, a: &user_credentials::Model, b: &user_credentials::Model) -> Ordering {
        a.created_at.cmp(&b.created_at)
    }

    fn apply(&self, mut q: Select<user_credentials::Entity>) -> Select<user_credentials::Entity> {
        if let Some(id) = self.user_id { q = q.filter(user_credentials::Column::UserId.eq(id)); }
        q.order_by_asc(user_credentials::Column::CreatedAt)
    }
}

/// Client listing: newest first; `q` searches name, plate and phone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientFilter {
    pub repair_status: Option<RepairStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub q: Option<String>,
}

impl RecordFilter<client::Entity> for ClientFilter {
    fn matches(&self, c: &client::Model) -> bool {
        if self.repair_status.is_some_and(|s| c.repair_status != s) { return false; }
        if self.payment_status.is_some_and(|s| c.payment_status != s) { return false; }
        match trimmed(&self.q) {
            Some(q) => {
                let plate = client::normalize_plate(q);
                contains_ci(&c.name, q)
                    || (!plate.is_empty() && c.license_plate.contains(&plate))
                    || c.phone.contains(q)
            }
            None => true,
        }
    }

    fn compare(&self, a: &client::Model, b: &client::Model) -> Ordering {
        b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
    }

    fn apply(&self, mut q: Select<client::Entity>) -> Select<client::Entity> {
        if let Some(s) = self.repair_status { q = q.filter(client::Column::RepairStatus.eq(s)); }
        if let Some(s) = self.payment_status { q = q.filter(client::Column::PaymentStatus.eq(s)); }
        if let Some(text) = trimmed(&self.q) {
            let mut any = Condition::any()
                .add(lower_like(client::Column::Name, text))
                .add(client::Column::Phone.contains(text));
            let plate = client::normalize_plate(text);
            if !plate.is_empty() {
                any = any.add(client::Column::LicensePlate.contains(&plate));
            }
            q = q.filter(any);
        }
        q.order_by_desc(client::Column::CreatedAt).order_by_desc(client::Column::Id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvoiceOrder {
    /// Latest issue date first.
    #[default]
    Newest,
    /// Highest document number first; used for number allocation.
    NumberDesc,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub client_id: Option<Uuid>,
    /// Inclusive bounds on `issue_date`.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(skip)]
    pub any_status: Vec<InvoiceStatus>,
    /// Strictly before this due date.
    #[serde(skip)]
    pub due_before: Option<NaiveDate>,
    #[serde(skip)]
    pub order: InvoiceOrder,
}

impl InvoiceFilter {
    pub fn by_number_desc() -> Self { Self { order: InvoiceOrder::NumberDesc, ..Default::default() } }

    pub fn open() -> Self {
        Self { any_status: InvoiceStatus::all().into_iter().filter(|s| s.is_open()).collect(), ..Default::default() }
    }

    pub fn for_client(client_id: Uuid) -> Self { Self { client_id: Some(client_id), ..Default::default() } }
}

impl RecordFilter<invoice::Entity> for InvoiceFilter {
    fn matches(&self, i: &invoice::Model) -> bool {
        self.status.map_or(true, |s| i.status == s)
            && (self.any_status.is_empty() || self.any_status.contains(&i.status))
            && self.client_id.map_or(true, |c| i.client_id == c)
            && in_range(i.issue_date, self.from, self.to)
            && self.due_before.map_or(true, |d| i.due_date < d)
    }

    fn compare(&self, a: &invoice::Model, b: &invoice::Model) -> Ordering {
        match self.order {
            InvoiceOrder::Newest => b.issue_date.cmp(&a.issue_date).then_with(|| b.number.cmp(&a.number)),
            InvoiceOrder::NumberDesc => number_cmp(&b.number, &a.number),
        }
    }

    fn apply(&self, mut q: Select<invoice::Entity>) -> Select<invoice::Entity> {
        if let Some(s) = self.status { q = q.filter(invoice::Column::Status.eq(s)); }
        if !self.any_status.is_empty() { q = q.filter(invoice::Column::Status.is_in(self.any_status.clone())); }
        if let Some(c) = self.client_id { q = q.filter(invoice::Column::ClientId.eq(c)); }
        if let Some(f) = self.from { q = q.filter(invoice::Column::IssueDate.gte(f)); }
        if let Some(t) = self.to { q = q.filter(invoice::Column::IssueDate.lte(t)); }
        if let Some(d) = self.due_before { q = q.filter(invoice::Column::DueDate.lt(d)); }
        match self.order {
            InvoiceOrder::Newest => q.order_by_desc(invoice::Column::IssueDate).order_by_desc(invoice::Column::Number),
            InvoiceOrder::NumberDesc => q
                .order_by(number_len(invoice::Column::Number), sea_orm::sea_query::Order::Desc)
                .order_by_desc(invoice::Column::Number),
        }
    }
}

/// Payment history, newest first. `from`/`to` bound the UTC day of `paid_at`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentFilter {
    pub client_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(skip)]
    pub invoice_id: Option<Uuid>,
}

impl RecordFilter<payment::Entity> for PaymentFilter {
    fn matches(&self, p: &payment::Model) -> bool {
        self.client_id.map_or(true, |c| p.client_id == c)
            && self.invoice_id.map_or(true, |i| p.invoice_id == i)
            && in_range(utc_date(&p.paid_at), self.from, self.to)
    }

    fn compare(&self, a: &payment::Model, b: &payment::Model) -> Ordering {
        b.paid_at.cmp(&a.paid_at).then_with(|| b.id.cmp(&a.id))
    }

    fn apply(&self, mut q: Select<payment::Entity>) -> Select<payment::Entity> {
        if let Some(c) = self.client_id { q = q.filter(payment::Column::ClientId.eq(c)); }
        if let Some(i) = self.invoice_id { q = q.filter(payment::Column::InvoiceId.eq(i)); }
        if let Some(f) = self.from { q = q.filter(payment::Column::PaidAt.gte(day_start(f))); }
        if let Some(t) = self.to.and_then(|t| t.succ_opt()) { q = q.filter(payment::Column::PaidAt.lt(day_start(t))); }
        q.order_by_desc(payment::Column::PaidAt).order_by_desc(payment::Column::Id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetFilter {
    pub status: Option<BudgetStatus>,
    pub client_id: Option<Uuid>,
    #[serde(skip)]
    pub number_desc: bool,
}

impl RecordFilter<budget::Entity> for BudgetFilter {
    fn matches(&self, b: &budget::Model) -> bool {
        self.status.map_or(true, |s| b.status == s) && self.client_id.map_or(true, |c| b.client_id == c)
    }

    fn compare(&self, a: &budget::Model, b: &budget::Model) -> Ordering {
        if self.number_desc {
            number_cmp(&b.number, &a.number)
        } else {
            b.created_at.cmp(&a.created_at).then_with(|| b.number.cmp(&a.number))
        }
    }

    fn apply(&self, mut q: Select<budget::Entity>) -> Select<budget::Entity> {
        if let Some(s) = self.status { q = q.filter(budget::Column::Status.eq(s)); }
        if let Some(c) = self.client_id { q = q.filter(budget::Column::ClientId.eq(c)); }
        if self.number_desc {
            q.order_by(number_len(budget::Column::Number), sea_orm::sea_query::Order::Desc).order_by_desc(budget::Column::Number)
        } else {
            q.order_by_desc(budget::Column::CreatedAt).order_by_desc(budget::Column::Number)
        }
    }
}

/// Calendar view, earliest first. `from`/`to` bound the UTC day of `scheduled_at`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
    pub mechanic_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
}

impl RecordFilter<appointment::Entity> for AppointmentFilter {
    fn matches(&self, a: &appointment::Model) -> bool {
        self.status.map_or(true, |s| a.status == s)
            && self.mechanic_id.map_or(true, |m| a.mechanic_id == Some(m))
            && self.client_id.map_or(true, |c| a.client_id == c)
            && in_range(utc_date(&a.scheduled_at), self.from, self.to)
    }

    fn compare(&self, a: &appointment::Model, b: &appointment::Model) -> Ordering {
        a.scheduled_at.cmp(&b.scheduled_at).then_with(|| a.id.cmp(&b.id))
    }

    fn apply(&self, mut q: Select<appointment::Entity>) -> Select<appointment::Entity> {
        if let Some(s) = self.status { q = q.filter(appointment::Column::Status.eq(s)); }
        if let Some(m) = self.mechanic_id { q = q.filter(appointment::Column::MechanicId.eq(m)); }
        if let Some(c) = self.client_id { q = q.filter(appointment::Column::ClientId.eq(c)); }
        if let Some(f) = self.from { q = q.filter(appointment::Column::ScheduledAt.gte(day_start(f))); }
        if let Some(t) = self.to.and_then(|t| t.succ_opt()) { q = q.filter(appointment::Column::ScheduledAt.lt(day_start(t))); }
        q.order_by_asc(appointment::Column::ScheduledAt).order_by_asc(appointment::Column::Id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category: Option<ExpenseCategory>,
}

impl RecordFilter<expense::Entity> for ExpenseFilter {
    fn matches(&self, e: &expense::Model) -> bool {
        self.category.map_or(true, |c| e.category == c) && in_range(e.expense_date, self.from, self.to)
    }

    fn compare(&self, a: &expense::Model, b: &expense::Model) -> Ordering {
        b.expense_date.cmp(&a.expense_date).then_with(|| b.created_at.cmp(&a.created_at))
    }

    fn apply(&self, mut q: Select<expense::Entity>) -> Select<expense::Entity> {
        if let Some(c) = self.category { q = q.filter(expense::Column::Category.eq(c)); }
        if let Some(f) = self.from { q = q.filter(expense::Column::ExpenseDate.gte(f)); }
        if let Some(t) = self.to { q = q.filter(expense::Column::ExpenseDate.lte(t)); }
        q.order_by_desc(expense::Column::ExpenseDate).order_by_desc(expense::Column::CreatedAt)
    }
}

/// `q` searches requester, institution, destination and tracking number.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipmentFilter {
    pub status: Option<ShipmentStatus>,
    pub q: Option<String>,
}

impl RecordFilter<shipment_request::Entity> for ShipmentFilter {
    fn matches(&self, s: &shipment_request::Model) -> bool {
        if self.status.is_some_and(|st| s.status != st) { return false; }
        match trimmed(&self.q) {
            Some(q) => {
                contains_ci(&s.requester_name, q)
                    || contains_ci(&s.institution, q)
                    || contains_ci(&s.destination_name, q)
                    || s.tracking_number.as_deref().is_some_and(|t| contains_ci(t, q))
            }
            None => true,
        }
    }

    fn compare(&self, a: &shipment_request::Model, b: &shipment_request::Model) -> Ordering {
        b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
    }

    fn apply(&self, mut q: Select<shipment_request::Entity>) -> Select<shipment_request::Entity> {
        if let Some(s) = self.status { q = q.filter(shipment_request::Column::Status.eq(s)); }
        if let Some(text) = trimmed(&self.q) {
            q = q.filter(
                Condition::any()
                    .add(lower_like(shipment_request::Column::RequesterName, text))
                    .add(lower_like(shipment_request::Column::Institution, text))
                    .add(lower_like(shipment_request::Column::DestinationName, text))
                    .add(lower_like(shipment_request::Column::TrackingNumber, text)),
            );
        }
        q.order_by_desc(shipment_request::Column::CreatedAt).order_by_desc(shipment_request::Column::Id)
    }
}
