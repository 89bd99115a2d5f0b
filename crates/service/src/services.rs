//! Wiring of every service over one set of repositories.

use std::sync::Arc;

use configs::{AuthConfig, BusinessConfig};

use crate::appointments::AppointmentService;
use crate::auth::AuthService;
use crate::budgets::BudgetService;
use crate::clients::ClientService;
use crate::expenses::ExpenseService;
use crate::invoices::InvoiceService;
use crate::payments::PaymentService;
use crate::reports::ReportService;
use crate::repository::Repositories;
use crate::shipments::ShipmentService;
use crate::users::UserService;

/// Cheap to clone; every field shares the same repositories.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub users: UserService,
    pub clients: ClientService,
    pub invoices: InvoiceService,
    pub payments: PaymentService,
    pub budgets: BudgetService,
    pub appointments: AppointmentService,
    pub expenses: ExpenseService,
    pub shipments: ShipmentService,
    pub reports: ReportService,
    pub business: Arc<BusinessConfig>,
}

impl Services {
    pub fn new(repos: Repositories, auth: AuthConfig, business: BusinessConfig) -> Self {
        let business = Arc::new(business);
        let auth = AuthService::new(repos.clone(), auth);
        let clients = ClientService::new(repos.clone());
        let invoices = InvoiceService::new(repos.clone(), business.clone(), clients.clone());
        Self {
            users: UserService::new(repos.clone(), auth.clone()),
            payments: PaymentService::new(repos.clone()),
            budgets: BudgetService::new(repos.clone(), business.clone(), invoices.clone()),
            appointments: AppointmentService::new(repos.clone()),
            expenses: ExpenseService::new(repos.clone()),
            shipments: ShipmentService::new(repos.clone()),
            reports: ReportService::new(repos, business.clone()),
            auth,
            clients,
            invoices,
            business,
        }
    }
}
