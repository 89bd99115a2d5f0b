#![cfg(test)]
//! Fixtures shared by the unit tests. Everything runs on memory repositories.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use configs::{AuthConfig, BusinessConfig};
use models::enums::{ExpenseCategory, InvoiceStatus, LineItemKind, PaymentStatus, RepairStatus, SampleTemperature};
use models::line_item::{LineItem, LineItems};
use models::{client, expense, invoice};

use crate::budgets::BudgetInput;
use crate::clients::ClientInput;
use crate::invoices::InvoiceInput;
use crate::repository::Repositories;
use crate::shipments::ShipmentInput;
use crate::Services;

pub fn services() -> Services {
    let auth = AuthConfig { jwt_secret: "test-secret".into(), ..Default::default() };
    Services::new(Repositories::memory(), auth, BusinessConfig::default())
}

pub fn client_input(plate: &str) -> ClientInput {
    ClientInput {
        name: "Lucia Ortega".into(),
        email: Some("lucia@example.com".into()),
        phone: "600123456".into(),
        address: None,
        vehicle_make: "Seat".into(),
        vehicle_model: "Ibiza".into(),
        vehicle_year: Some(2017),
        license_plate: plate.into(),
        vin: None,
        mileage: Some(98_000),
        problem_description: Some("brake noise".into()),
        estimated_cost: None,
        notes: None,
    }
}

/// 2 h labour at 45 plus a 110 part; 20 off; default tax.
pub fn line_items() -> Vec<LineItem> {
    vec![
        LineItem { description: "labour".into(), kind: LineItemKind::Service, quantity: dec!(2), unit_price: dec!(45.00) },
        LineItem { description: "brake discs".into(), kind: LineItemKind::Part, quantity: dec!(1), unit_price: dec!(110.00) },
    ]
}

pub fn invoice_input(client_id: Uuid, issue: bool) -> InvoiceInput {
    InvoiceInput {
        client_id,
        items: line_items(),
        discount: Some(dec!(20)),
        tax_rate: None,
        issue_date: None,
        due_date: None,
        notes: None,
        issue,
    }
}

pub fn budget_input(client_id: Uuid) -> BudgetInput {
    BudgetInput { client_id, items: line_items(), discount: Some(dec!(20)), tax_rate: None, valid_until: None, notes: None }
}

pub fn shipment_input() -> ShipmentInput {
    ShipmentInput {
        requester_name: "Dr. Irene Soler".into(),
        requester_email: "irene@lab.test".into(),
        institution: "Hospital Clinic".into(),
        destination_name: "Central Biobank".into(),
        destination_address: "Calle Mayor 1, Madrid".into(),
        sample_type: "serum".into(),
        sample_count: 12,
        temperature: SampleTemperature::Frozen,
        hazardous: false,
        carrier: None,
        tracking_number: None,
        requested_ship_date: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
        notes: None,
    }
}

pub fn client_row(plate: &str) -> client::Model {
    let now = crate::now();
    client::Model {
        id: Uuid::new_v4(),
        name: format!("Lucia {plate}"),
        email: None,
        phone: "600123456".into(),
        address: None,
        vehicle_make: "Seat".into(),
        vehicle_model: "Ibiza".into(),
        vehicle_year: None,
        license_plate: plate.to_string(),
        vin: None,
        mileage: None,
        problem_description: None,
        repair_status: RepairStatus::Waiting,
        payment_status: PaymentStatus::Pending,
        estimated_cost: None,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

/// One service line worth `total`, untaxed, issued 2024-01-01 and due a month later.
pub fn invoice_row(total: Decimal, status: InvoiceStatus) -> invoice::Model {
    let now = crate::now();
    invoice::Model {
        id: Uuid::new_v4(),
        number: format!("INV-{}", Uuid::new_v4().simple()),
        client_id: Uuid::new_v4(),
        items: LineItems(vec![LineItem { description: "service".into(), kind: LineItemKind::Service, quantity: dec!(1), unit_price: total }]),
        subtotal: total,
        tax_rate: Decimal::ZERO,
        tax_amount: Decimal::ZERO,
        discount: Decimal::ZERO,
        total,
        amount_paid: Decimal::ZERO,
        status,
        issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

/// `other` expense dated 2024-03-`day`.
pub fn expense_row(day: u32, amount: Decimal) -> expense::Model {
    let now = crate::now();
    expense::Model {
        id: Uuid::new_v4(),
        category: ExpenseCategory::Other,
        description: "misc".into(),
        amount,
        expense_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        supplier: None,
        tax_deductible: false,
        created_at: now,
        updated_at: now,
    }
}
