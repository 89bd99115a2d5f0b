//! PDF rendering with printpdf's built-in Helvetica.
//!
//! Built-in fonts only cover ASCII reliably, so text is folded to ASCII
//! (`Lucía Muñoz` prints as `Lucia Munoz`) and wrapped to its column.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use rust_decimal::Decimal;

use configs::BusinessConfig;
use models::{client, invoice};

use super::model::FinancialReport;
use crate::errors::ServiceError;

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 18.0;
const LINE: f32 = 6.0;
/// Gap kept between neighbouring columns, in millimetres.
const CELL_GAP: f32 = 2.0;
/// Average Helvetica glyph width in em, rounded up for digits and capitals.
const GLYPH_EM: f32 = 0.56;
const PT_TO_MM: f32 = 0.3528;

fn export_err(e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Export(e.to_string())
}

fn money(v: Decimal, currency: &str) -> String {
    format!("{:.2} {}", v, currency)
}

fn fold_char(c: char) -> &'static str {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ª' => "a",
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => "A",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'É' | 'È' | 'Ê' | 'Ë' => "E",
        'í' | 'ì' | 'î' | 'ï' => "i",
        'Í' | 'Ì' | 'Î' | 'Ï' => "I",
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'º' => "o",
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => "O",
        'ú' | 'ù' | 'û' | 'ü' => "u",
        'Ú' | 'Ù' | 'Û' | 'Ü' => "U",
        'ñ' => "n",
        'Ñ' => "N",
        'ç' => "c",
        'Ç' => "C",
        'ß' => "ss",
        '€' => "EUR",
        '\u{2013}' | '\u{2014}' => "-",
        '\u{2018}' | '\u{2019}' => "'",
        '\u{201C}' | '\u{201D}' => "\"",
        c if c.is_whitespace() => " ",
        _ => "?",
    }
}

/// ASCII rendition of `text` for the built-in fonts.
fn ascii_fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() && !c.is_ascii_control() {
            out.push(c);
        } else {
            out.push_str(fold_char(c));
        }
    }
    out
}

/// Characters that fit `width` millimetres at `size` points.
fn chars_per_line(width: f32, size: f32) -> usize {
    ((width / (size * PT_TO_MM * GLYPH_EM)).floor() as usize).max(1)
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(text: &str, max: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let rest = word.split_off(max);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }
        let needed = if line.is_empty() { word.len() } else { line.len() + 1 + word.len() };
        if needed > max {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Top-down text cursor that starts a new page when it runs out of room.
struct Sheet {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl Sheet {
    fn new(title: &str) -> Result<Self, ServiceError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(export_err)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(export_err)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self { doc, layer, regular, bold, y: PAGE_H - MARGIN })
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_H - MARGIN;
        }
    }

    fn text(&mut self, text: &str, size: f32, bold: bool) {
        self.row(&[(0.0, text.to_string())], size, bold);
    }

    /// Cells placed at `x` millimetres from the left margin. Each cell wraps
    /// within its column, which ends where the next cell starts.
    fn row(&mut self, cells: &[(f32, String)], size: f32, bold: bool) {
        let content_w = PAGE_W - 2.0 * MARGIN;
        let columns: Vec<Vec<String>> = cells
            .iter()
            .enumerate()
            .map(|(i, (x, text))| {
                let end = cells.get(i + 1).map_or(content_w, |(next, _)| next - CELL_GAP);
                wrap(&ascii_fold(text), chars_per_line(end - x, size))
            })
            .collect();
        let height = columns.iter().map(Vec::len).max().unwrap_or(1);
        let step = LINE * size / 10.0;
        for line in 0..height {
            self.ensure_room(step);
            let font = if bold { &self.bold } else { &self.regular };
            for ((x, _), lines) in cells.iter().zip(&columns) {
                if let Some(text) = lines.get(line) {
                    self.layer.use_text(text.as_str(), size, Mm(MARGIN + x), Mm(self.y), font);
                }
            }
            self.y -= step;
        }
    }

    fn gap(&mut self) {
        self.y -= LINE / 2.0;
    }

    fn heading(&mut self, text: &str) {
        self.gap();
        self.ensure_room(LINE * 3.0);
        self.text(text, 13.0, true);
    }

    fn finish(self) -> Result<Vec<u8>, ServiceError> {
        self.doc.save_to_bytes().map_err(export_err)
    }
}

pub fn financial_report_pdf(r: &FinancialReport) -> Result<Vec<u8>, ServiceError> {
    let cur = r.currency.as_str();
    let mut s = Sheet::new(&format!("{} financial report", r.company))?;
    s.text(&r.company, 18.0, true);
    s.text(&format!("Financial report {} to {} (as of {})", r.period.from, r.period.to, r.period.as_of), 10.0, false);

    s.heading("Summary");
    for (label, value) in [
        ("Invoiced", money(r.summary.invoiced, cur)),
        ("Collected", money(r.summary.collected, cur)),
        ("Outstanding", money(r.summary.outstanding, cur)),
        ("Expenses", money(r.summary.expenses, cur)),
        ("Net income", money(r.summary.net_income, cur)),
        ("Invoices", r.summary.invoice_count.to_string()),
        ("Average invoice", money(r.summary.average_invoice, cur)),
    ] {
        s.row(&[(0.0, label.to_string()), (70.0, value)], 10.0, false);
    }

    s.heading("Aging");
    s.row(&[(0.0, "Bucket".into()), (50.0, "Invoices".into()), (90.0, "Amount".into())], 10.0, true);
    for b in &r.aging.buckets {
        s.row(&[(0.0, b.label.to_string()), (50.0, b.count.to_string()), (90.0, money(b.amount, cur))], 10.0, false);
    }

    s.heading("Monthly trends");
    s.row(
        &[(0.0, "Month".into()), (30.0, "Invoiced".into()), (70.0, "Collected".into()), (110.0, "Expenses".into()), (145.0, "Net".into())],
        10.0,
        true,
    );
    for m in &r.monthly {
        s.row(
            &[
                (0.0, m.month.clone()),
                (30.0, money(m.invoiced, cur)),
                (70.0, money(m.collected, cur)),
                (110.0, money(m.expenses, cur)),
                (145.0, money(m.net, cur)),
            ],
            10.0,
            false,
        );
    }

    s.heading("Top clients");
    s.row(&[(0.0, "Client".into()), (70.0, "Invoices".into()), (95.0, "Billed".into()), (135.0, "Outstanding".into())], 10.0, true);
    for c in &r.top_clients {
        s.row(
            &[
                (0.0, c.client_name.clone()),
                (70.0, c.invoice_count.to_string()),
                (95.0, money(c.billed, cur)),
                (135.0, money(c.outstanding, cur)),
            ],
            10.0,
            false,
        );
    }

    s.heading("Tax");
    for l in &r.tax.by_rate {
        s.row(&[(0.0, format!("{}%", l.rate)), (50.0, money(l.taxable_base, cur)), (100.0, money(l.tax, cur))], 10.0, false);
    }
    s.row(&[(0.0, "Total".into()), (50.0, money(r.tax.total_base, cur)), (100.0, money(r.tax.total_tax, cur))], 10.0, true);
    s.row(&[(0.0, "Deductible expenses".into()), (100.0, money(r.tax.deductible_expenses, cur))], 10.0, false);

    let p = &r.profitability;
    s.heading("Profitability");
    s.row(&[(0.0, "Services".into()), (70.0, money(p.service_revenue, cur))], 10.0, false);
    s.row(&[(0.0, "Parts".into()), (70.0, money(p.parts_revenue, cur))], 10.0, false);
    for c in p.expenses_by_category.iter().filter(|c| !c.amount.is_zero()) {
        s.row(&[(0.0, format!("Expenses: {}", c.category)), (70.0, money(c.amount, cur))], 10.0, false);
    }
    s.row(&[(0.0, "Gross profit".into()), (70.0, money(p.gross_profit, cur))], 10.0, true);
    s.row(&[(0.0, "Margin".into()), (70.0, format!("{:.2}%", p.margin_pct))], 10.0, false);

    s.finish()
}

pub fn invoice_pdf(inv: &invoice::Model, c: &client::Model, business: &BusinessConfig) -> Result<Vec<u8>, ServiceError> {
    let cur = business.currency.as_str();
    let mut s = Sheet::new(&format!("Invoice {}", inv.number))?;
    s.text(&business.company_name, 18.0, true);
    if let Some(addr) = &business.company_address { s.text(addr, 9.0, false); }
    if let Some(tax_id) = &business.tax_id { s.text(&format!("Tax ID {tax_id}"), 9.0, false); }

    s.heading(&format!("Invoice {}", inv.number));
    s.text(&format!("Status: {}   Issued: {}   Due: {}", inv.status, inv.issue_date, inv.due_date), 10.0, false);
    s.gap();
    s.text(&c.name, 11.0, true);
    s.text(&format!("{}{}", c.phone, c.email.as_deref().map(|e| format!("  {e}")).unwrap_or_default()), 10.0, false);
    s.text(&format!("{} {} ({})", c.vehicle_make, c.vehicle_model, c.license_plate), 10.0, false);

    s.heading("Items");
    s.row(
        &[(0.0, "Description".into()), (90.0, "Type".into()), (110.0, "Qty".into()), (125.0, "Unit".into()), (150.0, "Amount".into())],
        10.0,
        true,
    );
    for item in inv.items.iter() {
        s.row(
            &[
                (0.0, item.description.clone()),
                (90.0, item.kind.to_string()),
                (110.0, item.quantity.normalize().to_string()),
                (125.0, money(item.unit_price, cur)),
                (150.0, money(item.amount(), cur)),
            ],
            10.0,
            false,
        );
    }

    s.gap();
    for (label, value, bold) in [
        ("Subtotal", inv.subtotal, false),
        ("Discount", inv.discount, false),
        ("Tax", inv.tax_amount, false),
        ("Total", inv.total, true),
        ("Paid", inv.amount_paid, false),
        ("Balance due", inv.balance(), true),
    ] {
        s.row(&[(110.0, label.to_string()), (150.0, money(value, cur))], 10.0, bold);
    }
    if let Some(notes) = &inv.notes {
        s.gap();
        s.text(notes, 9.0, false);
    }

    s.finish()
}
