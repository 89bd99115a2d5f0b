//! Spreadsheet export, one worksheet per report section.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use super::model::FinancialReport;
use crate::errors::ServiceError;

fn num(v: Decimal) -> f64 {
    v.to_f64().unwrap_or_default()
}

fn sheet(name: &str, headers: &[&str], bold: &Format) -> Result<Worksheet, XlsxError> {
    let mut ws = Worksheet::new();
    ws.set_name(name)?;
    for (col, h) in headers.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, *h, bold)?;
        ws.set_column_width(col as u16, if col == 0 { 24 } else { 16 })?;
    }
    Ok(ws)
}

fn build(r: &FinancialReport) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");

    let mut ws = sheet("Summary", &["Metric", "Value"], &bold)?;
    let s = &r.summary;
    let rows = [
        ("Invoiced", s.invoiced),
        ("Collected", s.collected),
        ("Outstanding", s.outstanding),
        ("Expenses", s.expenses),
        ("Net income", s.net_income),
        ("Invoices", Decimal::from(s.invoice_count)),
        ("Average invoice", s.average_invoice),
    ];
    for (i, (label, value)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        ws.write_string(row, 0, *label)?;
        ws.write_number_with_format(row, 1, num(*value), &money)?;
    }
    ws.write_string(9, 0, format!("{} to {} (as of {})", r.period.from, r.period.to, r.period.as_of))?;
    workbook.push_worksheet(ws);

    let mut ws = sheet("Aging", &["Bucket", "Invoices", "Amount"], &bold)?;
    for (i, b) in r.aging.buckets.iter().enumerate() {
        let row = i as u32 + 1;
        ws.write_string(row, 0, b.label)?;
        ws.write_number(row, 1, b.count as f64)?;
        ws.write_number_with_format(row, 2, num(b.amount), &money)?;
    }
    workbook.push_worksheet(ws);

    let mut ws = sheet("Monthly", &["Month", "Invoiced", "Collected", "Expenses", "Net"], &bold)?;
    for (i, m) in r.monthly.iter().enumerate() {
        let row = i as u32 + 1;
        ws.write_string(row, 0, m.month.as_str())?;
        for (col, v) in [m.invoiced, m.collected, m.expenses, m.net].into_iter().enumerate() {
            ws.write_number_with_format(row, col as u16 + 1, num(v), &money)?;
        }
    }
    workbook.push_worksheet(ws);

    let mut ws = sheet("Clients", &["Client", "Invoices", "Billed", "Paid", "Outstanding", "Average"], &bold)?;
    for (i, c) in r.top_clients.iter().enumerate() {
        let row = i as u32 + 1;
        ws.write_string(row, 0, c.client_name.as_str())?;
        ws.write_number(row, 1, c.invoice_count as f64)?;
        for (col, v) in [c.billed, c.paid, c.outstanding, c.average_invoice].into_iter().enumerate() {
            ws.write_number_with_format(row, col as u16 + 2, num(v), &money)?;
        }
    }
    workbook.push_worksheet(ws);

    let mut ws = sheet("Tax", &["Rate %", "Taxable base", "Tax", "Invoices"], &bold)?;
    let mut row = 1;
    for l in &r.tax.by_rate {
        ws.write_number(row, 0, num(l.rate))?;
        ws.write_number_with_format(row, 1, num(l.taxable_base), &money)?;
        ws.write_number_with_format(row, 2, num(l.tax), &money)?;
        ws.write_number(row, 3, l.invoice_count as f64)?;
        row += 1;
    }
    ws.write_string_with_format(row, 0, "Total", &bold)?;
    ws.write_number_with_format(row, 1, num(r.tax.total_base), &money)?;
    ws.write_number_with_format(row, 2, num(r.tax.total_tax), &money)?;
    ws.write_string(row + 1, 0, "Deductible expenses")?;
    ws.write_number_with_format(row + 1, 1, num(r.tax.deductible_expenses), &money)?;
    workbook.push_worksheet(ws);

    let p = &r.profitability;
    let mut ws = sheet("Profitability", &["Line", "Amount"], &bold)?;
    let mut lines = vec![
        ("Services".to_string(), p.service_revenue),
        ("Parts".to_string(), p.parts_revenue),
        ("Total revenue".to_string(), p.total_revenue),
    ];
    lines.extend(p.expenses_by_category.iter().map(|c| (format!("Expenses: {}", c.category), c.amount)));
    lines.push(("Total expenses".to_string(), p.total_expenses));
    lines.push(("Gross profit".to_string(), p.gross_profit));
    lines.push(("Margin %".to_string(), p.margin_pct));
    for (i, (label, value)) in lines.iter().enumerate() {
        let row = i as u32 + 1;
        ws.write_string(row, 0, label.as_str())?;
        ws.write_number_with_format(row, 1, num(*value), &money)?;
    }
    workbook.push_worksheet(ws);

    workbook.save_to_buffer()
}

pub fn financial_report_xlsx(r: &FinancialReport) -> Result<Vec<u8>, ServiceError> {
    build(r).map_err(|e| ServiceError::Export(e.to_string()))
}
