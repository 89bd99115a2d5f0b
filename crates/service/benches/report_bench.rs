use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use uuid::Uuid;

use models::enums::{ExpenseCategory, InvoiceStatus, LineItemKind, PaymentMethod, PaymentStatus, RepairStatus};
use models::line_item::{compute_totals, LineItem, LineItems};
use models::{client, expense, invoice, payment};
use service::reports::{generate, ReportData, Window};

struct Fixture {
    invoices: Vec<invoice::Model>,
    payments: Vec<payment::Model>,
    expenses: Vec<expense::Model>,
    clients: Vec<client::Model>,
}

fn fixture(n: usize) -> Fixture {
    let now = Utc::now().into();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let clients: Vec<client::Model> = (0..50)
        .map(|i| client::Model {
            id: Uuid::new_v4(),
            name: format!("Client {i}"),
            email: None,
            phone: "600000000".into(),
            address: None,
            vehicle_make: "Seat".into(),
            vehicle_model: "Leon".into(),
            vehicle_year: None,
            license_plate: format!("{i:04}BCH"),
            vin: None,
            mileage: None,
            problem_description: None,
            repair_status: RepairStatus::Waiting,
            payment_status: PaymentStatus::Pending,
            estimated_cost: None,
            notes: None,
            created_at: now,
            updated_at: now,
        })
        .collect();

    let mut invoices = Vec::with_capacity(n);
    let mut payments = Vec::with_capacity(n);
    for i in 0..n {
        let items = LineItems(vec![
            LineItem { description: "labour".into(), kind: LineItemKind::Service, quantity: Decimal::from(1 + i % 4), unit_price: Decimal::new(4500, 2) },
            LineItem { description: "part".into(), kind: LineItemKind::Part, quantity: Decimal::ONE, unit_price: Decimal::new(8999, 2) },
        ]);
        let totals = compute_totals(&items, Decimal::ZERO, Decimal::from(21)).unwrap();
        let issue_date = start + Duration::days((i % 365) as i64);
        let mut inv = invoice::Model {
            id: Uuid::new_v4(),
            number: format!("INV-{:06}", i + 1),
            client_id: clients[i % clients.len()].id,
            items,
            subtotal: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::ZERO,
            amount_paid: Decimal::ZERO,
            status: InvoiceStatus::Issued,
            issue_date,
            due_date: issue_date + Duration::days(30),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        inv.apply_totals(totals);
        if i % 3 == 0 {
            inv.amount_paid = inv.total;
            inv.status = InvoiceStatus::Paid;
            let paid_at = Utc.from_utc_datetime(&(issue_date + Duration::days(5)).and_hms_opt(10, 0, 0).unwrap()).into();
            payments.push(payment::Model {
                id: Uuid::new_v4(),
                invoice_id: inv.id,
                client_id: inv.client_id,
                amount: inv.total,
                method: PaymentMethod::Card,
                reference: None,
                paid_at,
                recorded_by: None,
                created_at: now,
            });
        }
        invoices.push(inv);
    }

    let categories = ExpenseCategory::all();
    let expenses = (0..n / 4)
        .map(|i| expense::Model {
            id: Uuid::new_v4(),
            category: categories[i % categories.len()],
            description: "supplies".into(),
            amount: Decimal::new(12_000 + i as i64, 2),
            expense_date: start + Duration::days((i % 365) as i64),
            supplier: None,
            tax_deductible: i % 2 == 0,
            created_at: now,
            updated_at: now,
        })
        .collect();

    Fixture { invoices, payments, expenses, clients }
}

fn bench_report(c: &mut Criterion) {
    let f = fixture(5_000);
    let w = Window {
        from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        to: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        as_of: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        top: 10,
    };
    let data = ReportData { invoices: &f.invoices, payments: &f.payments, expenses: &f.expenses, clients: &f.clients };
    c.bench_function("financial_report_5k_invoices", |b| {
        b.iter(|| black_box(generate("Garage", "EUR", w, &data)))
    });
}

criterion_group!(benches, bench_report);
criterion_main!(benches);
