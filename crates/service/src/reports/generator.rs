//! Pure aggregation behind the financial report. No I/O happens here, so
//! the same rows always produce the same report.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use models::enums::{ExpenseCategory, LineItemKind};
use models::line_item::round2;
use models::{client, expense, invoice, payment};

use super::model::*;

/// Rows the report is computed from. Invoices may extend beyond the window;
/// open balances are taken from every invoice issued on or before `as_of`.
pub struct ReportData<'a> {
    pub invoices: &'a [invoice::Model],
    pub payments: &'a [payment::Model],
    pub expenses: &'a [expense::Model],
    pub clients: &'a [client::Model],
}

/// Resolved window of a report run.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub as_of: NaiveDate,
    pub top: usize,
}

impl Window {
    fn contains(&self, d: NaiveDate) -> bool {
        d >= self.from && d <= self.to
    }
}

fn month_key(d: NaiveDate) -> String {
    format!("{:04}-{:02}", d.year(), d.month())
}

fn paid_on(p: &payment::Model) -> NaiveDate {
    p.paid_at.with_timezone(&Utc).date_naive()
}

fn average(total: Decimal, count: u64) -> Decimal {
    if count == 0 { Decimal::ZERO } else { round2(total / Decimal::from(count)) }
}

/// Every `YYYY-MM` touched by `[from, to]`, in order.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> Vec<String> {
    let mut out = Vec::new();
    let (mut y, mut m) = (from.year(), from.month());
    while (y, m) <= (to.year(), to.month()) {
        out.push(format!("{y:04}-{m:02}"));
        if m == 12 { y += 1; m = 1; } else { m += 1; }
    }
    out
}

/// Bucket label for an invoice `days` past due.
pub fn aging_label(days_past_due: i64) -> &'static str {
    match days_past_due {
        i64::MIN..=0 => "current",
        1..=30 => "1-30",
        31..=60 => "31-60",
        61..=90 => "61-90",
        _ => "90+",
    }
}

const AGING_LABELS: [&str; 5] = ["current", "1-30", "31-60", "61-90", "90+"];

pub fn generate(company: &str, currency: &str, w: Window, data: &ReportData<'_>) -> FinancialReport {
    let billed: Vec<&invoice::Model> = data
        .invoices
        .iter()
        .filter(|i| i.status.is_billable() && w.contains(i.issue_date))
        .collect();
    let open: Vec<&invoice::Model> = data
        .invoices
        .iter()
        .filter(|i| i.status.is_open() && i.issue_date <= w.as_of && i.balance() > Decimal::ZERO)
        .collect();
    let payments: Vec<&payment::Model> = data.payments.iter().filter(|p| w.contains(paid_on(p))).collect();
    let expenses: Vec<&expense::Model> = data.expenses.iter().filter(|e| w.contains(e.expense_date)).collect();

    let invoiced: Decimal = billed.iter().map(|i| i.total).sum();
    let collected: Decimal = payments.iter().map(|p| p.amount).sum();
    let expenses_total: Decimal = expenses.iter().map(|e| e.amount).sum();
    let outstanding: Decimal = open.iter().map(|i| i.balance()).sum();
    let summary = Summary {
        invoiced,
        collected,
        outstanding,
        expenses: expenses_total,
        net_income: collected - expenses_total,
        invoice_count: billed.len() as u64,
        average_invoice: average(invoiced, billed.len() as u64),
    };

    FinancialReport {
        company: company.to_string(),
        currency: currency.to_string(),
        period: Period { from: w.from, to: w.to, as_of: w.as_of },
        summary,
        aging: aging(&open, w.as_of),
        monthly: monthly(w, &billed, &payments, &expenses),
        top_clients: client_metrics(&billed, data.clients, w.top),
        tax: tax_breakdown(&billed, &expenses),
        profitability: profitability(&billed, &expenses),
    }
}

fn aging(open: &[&invoice::Model], as_of: NaiveDate) -> Aging {
    let mut buckets: Vec<AgingBucket> = AGING_LABELS
        .iter()
        .map(|label| AgingBucket { label, amount: Decimal::ZERO, count: 0 })
        .collect();
    for inv in open {
        let label = aging_label((as_of - inv.due_date).num_days());
        if let Some(b) = buckets.iter_mut().find(|b| b.label == label) {
            b.amount += inv.balance();
            b.count += 1;
        }
    }
    let total = buckets.iter().map(|b| b.amount).sum();
    Aging { buckets, total }
}

fn monthly(w: Window, billed: &[&invoice::Model], payments: &[&payment::Model], expenses: &[&expense::Model]) -> Vec<MonthlyTrend> {
    let mut rows: BTreeMap<String, MonthlyTrend> = months_between(w.from, w.to)
        .into_iter()
        .map(|month| {
            let zero = MonthlyTrend {
                month: month.clone(),
                invoiced: Decimal::ZERO,
                collected: Decimal::ZERO,
                expenses: Decimal::ZERO,
                net: Decimal::ZERO,
            };
            (month, zero)
        })
        .collect();
    for i in billed {
        if let Some(r) = rows.get_mut(&month_key(i.issue_date)) { r.invoiced += i.total; }
    }
    for p in payments {
        if let Some(r) = rows.get_mut(&month_key(paid_on(p))) { r.collected += p.amount; }
    }
    for e in expenses {
        if let Some(r) = rows.get_mut(&month_key(e.expense_date)) { r.expenses += e.amount; }
    }
    rows.into_values()
        .map(|mut r| {
            r.net = r.collected - r.expenses;
            r
        })
        .collect()
}

fn client_metrics(billed: &[&invoice::Model], clients: &[client::Model], top: usize) -> Vec<ClientMetrics> {
    let names: HashMap<Uuid, &str> = clients.iter().map(|c| (c.id, c.name.as_str())).collect();
    let mut by_client: HashMap<Uuid, ClientMetrics> = HashMap::new();
    for i in billed {
        let m = by_client.entry(i.client_id).or_insert_with(|| ClientMetrics {
            client_id: i.client_id,
            client_name: names.get(&i.client_id).map_or_else(|| "(unknown client)".to_string(), |n| n.to_string()),
            invoice_count: 0,
            billed: Decimal::ZERO,
            paid: Decimal::ZERO,
            outstanding: Decimal::ZERO,
            average_invoice: Decimal::ZERO,
        });
        m.invoice_count += 1;
        m.billed += i.total;
        m.paid += i.amount_paid;
        m.outstanding += i.balance();
    }
    let mut ranked: Vec<ClientMetrics> = by_client
        .into_values()
        .map(|mut m| {
            m.average_invoice = average(m.billed, m.invoice_count);
            m
        })
        .collect();
    ranked.sort_by(|a, b| b.billed.cmp(&a.billed).then_with(|| a.client_name.cmp(&b.client_name)));
    ranked.truncate(top);
    ranked
}

fn tax_breakdown(billed: &[&invoice::Model], expenses: &[&expense::Model]) -> TaxBreakdown {
    let mut by_rate: BTreeMap<Decimal, TaxRateLine> = BTreeMap::new();
    for i in billed {
        // normalize so 21 and 21.00 share a line
        let rate = i.tax_rate.normalize();
        let line = by_rate.entry(rate).or_insert(TaxRateLine {
            rate,
            taxable_base: Decimal::ZERO,
            tax: Decimal::ZERO,
            invoice_count: 0,
        });
        line.taxable_base += i.subtotal - i.discount;
        line.tax += i.tax_amount;
        line.invoice_count += 1;
    }
    let by_rate: Vec<TaxRateLine> = by_rate.into_values().collect();
    TaxBreakdown {
        total_base: by_rate.iter().map(|l| l.taxable_base).sum(),
        total_tax: by_rate.iter().map(|l| l.tax).sum(),
        deductible_expenses: expenses.iter().filter(|e| e.tax_deductible).map(|e| e.amount).sum(),
        by_rate,
    }
}

fn profitability(billed: &[&invoice::Model], expenses: &[&expense::Model]) -> Profitability {
    let mut total_revenue = Decimal::ZERO;
    let mut service_raw = Decimal::ZERO;
    for i in billed {
        let net = i.subtotal - i.discount;
        total_revenue += net;
        if i.subtotal > Decimal::ZERO {
            service_raw += net * i.items.subtotal_of(LineItemKind::Service) / i.subtotal;
        }
    }
    let service_revenue = round2(service_raw);
    let expenses_by_category: Vec<CategoryAmount> = ExpenseCategory::all()
        .into_iter()
        .map(|category| CategoryAmount {
            category,
            amount: expenses.iter().filter(|e| e.category == category).map(|e| e.amount).sum(),
        })
        .collect();
    let total_expenses: Decimal = expenses_by_category.iter().map(|c| c.amount).sum();
    let gross_profit = total_revenue - total_expenses;
    let margin_pct = if total_revenue.is_zero() {
        Decimal::ZERO
    } else {
        round2(gross_profit * Decimal::ONE_HUNDRED / total_revenue)
    };
    Profitability {
        service_revenue,
        parts_revenue: total_revenue - service_revenue,
        total_revenue,
        expenses_by_category,
        total_expenses,
        gross_profit,
        margin_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client_row, expense_row, invoice_row};
    use chrono::TimeZone;
    use models::enums::{InvoiceStatus, PaymentMethod};
    use models::line_item::{LineItem, LineItems};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn window(from: NaiveDate, to: NaiveDate, as_of: NaiveDate) -> Window {
        Window { from, to, as_of, top: DEFAULT_TOP_CLIENTS }
    }

    fn empty() -> ReportData<'static> {
        ReportData { invoices: &[], payments: &[], expenses: &[], clients: &[] }
    }

    fn payment_on(inv: &invoice::Model, amount: Decimal, day: NaiveDate) -> payment::Model {
        let at = Utc.from_utc_datetime(&day.and_hms_opt(10, 0, 0).unwrap()).into();
        payment::Model {
            id: Uuid::new_v4(),
            invoice_id: inv.id,
            client_id: inv.client_id,
            amount,
            method: PaymentMethod::Cash,
            reference: None,
            paid_at: at,
            recorded_by: None,
            created_at: at,
        }
    }

    #[test]
    fn aging_buckets_follow_days_past_due() {
        assert_eq!(aging_label(-5), "current");
        assert_eq!(aging_label(0), "current");
        assert_eq!(aging_label(1), "1-30");
        assert_eq!(aging_label(30), "1-30");
        assert_eq!(aging_label(31), "31-60");
        assert_eq!(aging_label(61), "61-90");
        assert_eq!(aging_label(90), "61-90");
        assert_eq!(aging_label(91), "90+");

        let as_of = d(2024, 6, 30);
        let mk = |due: NaiveDate, total: Decimal, paid: Decimal| {
            let mut i = invoice_row(total, InvoiceStatus::Issued);
            i.issue_date = d(2024, 1, 1);
            i.due_date = due;
            i.amount_paid = paid;
            i
        };
        let invoices = vec![
            mk(d(2024, 7, 15), dec!(100), dec!(0)),
            mk(d(2024, 6, 10), dec!(200), dec!(50)),
            mk(d(2024, 3, 1), dec!(300), dec!(0)),
            mk(d(2024, 3, 2), dec!(10), dec!(10)),
        ];
        let report = generate("G", "EUR", window(d(2024, 1, 1), d(2024, 6, 30), as_of), &ReportData { invoices: &invoices, ..empty() });
        let by = |l: &str| report.aging.buckets.iter().find(|b| b.label == l).cloned().unwrap();
        assert_eq!(by("current").amount, dec!(100));
        assert_eq!(by("1-30").amount, dec!(150));
        assert_eq!(by("90+").count, 1);
        assert_eq!(by("31-60").count, 0);
        assert_eq!(report.aging.total, dec!(550));
        assert_eq!(report.summary.outstanding, report.aging.total);
    }

    #[test]
    fn months_without_activity_are_present() {
        assert_eq!(months_between(d(2023, 11, 15), d(2024, 2, 1)), vec!["2023-11", "2023-12", "2024-01", "2024-02"]);

        let mut inv = invoice_row(dec!(121), InvoiceStatus::Issued);
        inv.issue_date = d(2024, 1, 10);
        let pay = payment_on(&inv, dec!(121), d(2024, 3, 5));
        let exp = expense_row(20, dec!(40));
        let (invoices, payments, expenses) = (vec![inv], vec![pay], vec![exp]);
        let report = generate(
            "G",
            "EUR",
            window(d(2024, 1, 1), d(2024, 4, 30), d(2024, 4, 30)),
            &ReportData { invoices: &invoices, payments: &payments, expenses: &expenses, clients: &[] },
        );
        let months: Vec<&str> = report.monthly.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03", "2024-04"]);
        assert_eq!(report.monthly[0].invoiced, dec!(121));
        assert_eq!(report.monthly[1].net, Decimal::ZERO);
        assert_eq!(report.monthly[2].collected, dec!(121));
        // expense_row(20, ..) is dated 2024-03-20
        assert_eq!(report.monthly[2].net, dec!(81));
        assert_eq!(report.summary.net_income, dec!(81));
    }

    #[test]
    fn client_ranking_by_billed_and_limited() {
        let clients: Vec<client::Model> = (0..3).map(|n| client_row(&format!("500{n}XYZ"))).collect();
        let mut invoices = Vec::new();
        for (idx, total) in [(0usize, dec!(100)), (1, dec!(300)), (1, dec!(50)), (2, dec!(200))] {
            let mut i = invoice_row(total, InvoiceStatus::Issued);
            i.client_id = clients[idx].id;
            i.issue_date = d(2024, 5, 5);
            invoices.push(i);
        }
        let mut w = window(d(2024, 5, 1), d(2024, 5, 31), d(2024, 5, 31));
        w.top = 2;
        let report = generate("G", "EUR", w, &ReportData { invoices: &invoices, clients: &clients, ..empty() });
        assert_eq!(report.top_clients.len(), 2);
        assert_eq!(report.top_clients[0].client_id, clients[1].id);
        assert_eq!(report.top_clients[0].billed, dec!(350));
        assert_eq!(report.top_clients[0].invoice_count, 2);
        assert_eq!(report.top_clients[0].average_invoice, dec!(175));
        assert_eq!(report.top_clients[1].client_id, clients[2].id);
    }

    #[test]
    fn drafts_and_cancelled_are_not_revenue() {
        let mut a = invoice_row(dec!(100), InvoiceStatus::Draft);
        let mut b = invoice_row(dec!(100), InvoiceStatus::Cancelled);
        a.issue_date = d(2024, 2, 1);
        b.issue_date = d(2024, 2, 1);
        let invoices = vec![a, b];
        let report = generate("G", "EUR", window(d(2024, 2, 1), d(2024, 2, 29), d(2024, 2, 29)), &ReportData { invoices: &invoices, ..empty() });
        assert_eq!(report.summary.invoice_count, 0);
        assert_eq!(report.summary.average_invoice, Decimal::ZERO);
        assert_eq!(report.profitability.margin_pct, Decimal::ZERO);
        assert!(report.tax.by_rate.is_empty());
    }

    #[test]
    fn profitability_allocates_discount_pro_rata_and_groups_tax() {
        let mut inv = invoice_row(dec!(0), InvoiceStatus::Paid);
        inv.items = LineItems(vec![
            LineItem { description: "labour".into(), kind: LineItemKind::Service, quantity: dec!(3), unit_price: dec!(50) },
            LineItem { description: "filter".into(), kind: LineItemKind::Part, quantity: dec!(1), unit_price: dec!(50) },
        ]);
        inv.apply_totals(models::line_item::compute_totals(&inv.items, dec!(20), dec!(21)).unwrap());
        inv.amount_paid = inv.total;
        inv.issue_date = d(2024, 3, 3);
        let mut reduced = invoice_row(dec!(100), InvoiceStatus::Issued);
        reduced.apply_totals(models::line_item::compute_totals(&reduced.items, Decimal::ZERO, dec!(10.00)).unwrap());
        reduced.issue_date = d(2024, 3, 4);

        let mut exp = expense_row(10, dec!(30));
        exp.tax_deductible = true;
        let (invoices, expenses) = (vec![inv, reduced], vec![exp]);
        let report = generate(
            "G",
            "EUR",
            window(d(2024, 3, 1), d(2024, 3, 31), d(2024, 3, 31)),
            &ReportData { invoices: &invoices, expenses: &expenses, ..empty() },
        );
        let p = &report.profitability;
        // 180 net of a 20 discount split 3:1, plus 100 of pure labour
        assert_eq!(p.service_revenue, dec!(235));
        assert_eq!(p.parts_revenue, dec!(45));
        assert_eq!(p.total_revenue, dec!(280));
        assert_eq!(p.total_expenses, dec!(30));
        assert_eq!(p.gross_profit, dec!(250));
        assert_eq!(p.margin_pct, dec!(89.29));
        let other = p.expenses_by_category.iter().find(|c| c.category == ExpenseCategory::Other).unwrap();
        assert_eq!(other.amount, dec!(30));

        assert_eq!(report.tax.by_rate.len(), 2);
        assert_eq!(report.tax.by_rate[0].rate, dec!(10));
        assert_eq!(report.tax.by_rate[1].taxable_base, dec!(180));
        assert_eq!(report.tax.by_rate[1].tax, dec!(37.80));
        assert_eq!(report.tax.by_rate[0].tax, dec!(10));
        assert_eq!(report.tax.total_tax, dec!(47.80));
        assert_eq!(report.tax.deductible_expenses, dec!(30));
    }
}
