//! Invoice rendering: turns an order into a paginated A4 PDF on disk.
//!
//! Rendering is deterministic apart from the generation clock and the
//! invoice token. The document is produced fully in memory and moved into
//! place with a rename, so a failed render never leaves a partial file at
//! the final path.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};
use rand::{Rng, distr::Alphanumeric};
use thiserror::Error;

use crate::config::SellerConfig;
use crate::models::order::Order;

/// Errors that can occur while rendering an invoice.
#[derive(Debug, Error)]
pub enum RenderError {
    /// PDF document assembly failed.
    #[error("PDF generation failed: {0}")]
    Pdf(#[from] printpdf::Error),

    /// Writing the finished document to the invoices directory failed.
    #[error("Could not write invoice file: {0}")]
    Io(#[from] std::io::Error),
}

/// A rendered invoice on disk.
#[derive(Debug, Clone)]
pub struct InvoiceFile {
    /// Generated invoice number, e.g. `INV-1756550400123-ab12`.
    pub number: String,
    /// File name under the invoices directory.
    pub filename: String,
    /// Absolute or invoices-dir-relative path of the PDF.
    pub path: PathBuf,
    /// Number of pages in the document.
    pub pages: usize,
}

/// Renders order invoices into a fixed directory.
///
/// Cheap to clone; rendering is synchronous and callers on the async path
/// should move a clone into `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct InvoiceRenderer {
    invoices_dir: PathBuf,
    seller: SellerConfig,
}

// A4 geometry, in millimeters. The vertical cursor counts down from the
// page top; helpers convert to PDF bottom-left coordinates.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const LEFT: f32 = 15.0;
const RIGHT: f32 = PAGE_WIDTH - 15.0;
/// Content past this cursor position spills onto a new page.
const BODY_LIMIT: f32 = 272.0;
/// Top margin the cursor resets to on continuation pages.
const CONTINUATION_TOP: f32 = 20.0;
const FOOTER_Y: f32 = 285.0;
const ROW_HEIGHT: f32 = 7.0;
/// Left edge of the description column.
const DESC_X: f32 = 32.0;
/// Right edge of the unit-price column.
const UNIT_RIGHT: f32 = 150.0;

const PT_TO_MM: f32 = 0.352_778;

impl InvoiceRenderer {
    /// Create a renderer writing into `invoices_dir`.
    #[must_use]
    pub const fn new(invoices_dir: PathBuf, seller: SellerConfig) -> Self {
        Self {
            invoices_dir,
            seller,
        }
    }

    /// Render the order and persist the document.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` on any PDF or filesystem failure. On a
    /// non-success result no usable file exists at the returned path.
    pub fn render(&self, order: &Order) -> Result<InvoiceFile, RenderError> {
        let token = invoice_token();
        let number = format!("INV-{token}");
        let filename = format!("invoice-{token}.pdf");

        let (bytes, pages) = render_document(&self.seller, order, &number)?;

        let path = self.invoices_dir.join(&filename);
        let staging = self.invoices_dir.join(format!(".{filename}.tmp"));
        fs::write(&staging, &bytes)?;
        fs::rename(&staging, &path)?;

        tracing::debug!(
            invoice = %number,
            pages,
            bytes = bytes.len(),
            "Invoice rendered"
        );

        Ok(InvoiceFile {
            number,
            filename,
            path,
            pages,
        })
    }
}

/// Millisecond timestamp plus a random suffix. The suffix keeps two
/// checkouts inside the same millisecond from colliding on a filename.
fn invoice_token() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(4)
        .map(char::from)
        .collect();
    format!("{millis}-{}", suffix.to_lowercase())
}

/// Tracks the layer and vertical cursor of the page being written.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    /// Cursor, in mm from the page top.
    y: f32,
    pages: usize,
}

impl<'a> PageWriter<'a> {
    fn new(doc: &'a PdfDocumentReference, layer: PdfLayerReference) -> Self {
        Self {
            doc,
            layer,
            y: CONTINUATION_TOP,
            pages: 1,
        }
    }

    fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    /// Start a new page when fewer than `needed` millimeters remain.
    fn ensure_room(&mut self, needed: f32) {
        if self.y + needed > BODY_LIMIT {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = CONTINUATION_TOP;
            self.pages += 1;
        }
    }

    fn text(&self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.text_at(text, size, x, self.y, font);
    }

    fn text_at(&self, text: &str, size: f32, x: f32, y_top: f32, font: &IndirectFontRef) {
        self.layer
            .use_text(text, size, Mm(x), Mm(PAGE_HEIGHT - y_top), font);
    }

    fn text_right(&self, text: &str, size: f32, right_edge: f32, font: &IndirectFontRef) {
        self.text_right_at(text, size, right_edge, self.y, font);
    }

    fn text_right_at(
        &self,
        text: &str,
        size: f32,
        right_edge: f32,
        y_top: f32,
        font: &IndirectFontRef,
    ) {
        self.text_at(text, size, right_edge - text_width(text, size), y_top, font);
    }

    fn text_centered_at(&self, text: &str, size: f32, y_top: f32, font: &IndirectFontRef) {
        let x = (PAGE_WIDTH - text_width(text, size)) / 2.0;
        self.text_at(text, size, x, y_top, font);
    }

    /// Horizontal rule across the content width at the current cursor.
    fn rule(&self) {
        let y = Mm(PAGE_HEIGHT - self.y);
        let line = Line {
            points: vec![
                (Point::new(Mm(LEFT), y), false),
                (Point::new(Mm(RIGHT), y), false),
            ],
            is_closed: false,
        };
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(line);
    }
}

/// Builtin Helvetica carries no queryable metrics; an average advance of
/// half the font size is close enough for right-aligned numerals and labels.
fn text_width(text: &str, font_size: f32) -> f32 {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    chars as f32 * font_size * 0.5 * PT_TO_MM
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_owned()
    } else {
        let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        out.push_str("...");
        out
    }
}

fn or_dash(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() { "-" } else { trimmed }
}

#[allow(clippy::too_many_lines)]
fn render_document(
    seller: &SellerConfig,
    order: &Order,
    invoice_number: &str,
) -> Result<(Vec<u8>, usize), RenderError> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Invoice {invoice_number}"),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let first_layer = doc.get_page(page).get_layer(layer);
    let mut w = PageWriter::new(&doc, first_layer);

    // Seller identity block (left) and invoice metadata (right) share the
    // header area; metadata is right-aligned.
    w.text(&seller.name, 18.0, LEFT, &bold);
    let seller_email = seller.email.as_ref().map_or("-", |e| e.as_str());
    let seller_phone = seller.phone.as_deref().unwrap_or("-");
    w.text_at(&format!("Email: {seller_email}"), 10.0, LEFT, w.y + 8.0, &regular);
    w.text_at(&format!("Phone: {seller_phone}"), 10.0, LEFT, w.y + 13.0, &regular);

    w.text_right_at(&format!("Invoice: {invoice_number}"), 12.0, RIGHT, w.y, &regular);
    let generated = Utc::now().format("%d %b %Y %H:%M");
    w.text_right_at(&format!("Date: {generated}"), 12.0, RIGHT, w.y + 6.0, &regular);

    w.advance(28.0);

    // Bill-to block, one line per field, `-` for anything missing.
    w.text("Bill To:", 12.0, LEFT, &bold);
    w.advance(6.0);
    for field in [
        or_dash(&order.buyer_name),
        or_dash(order.buyer_email.as_str()),
        or_dash(&order.buyer_phone),
        or_dash(&order.location),
    ] {
        w.text(field, 10.0, LEFT, &regular);
        w.advance(5.0);
    }
    w.advance(5.0);

    // Line-item table header between two rules.
    w.rule();
    w.advance(6.0);
    w.text("Qty", 10.0, LEFT, &bold);
    w.text("Description", 10.0, DESC_X, &bold);
    w.text_right("Unit", 10.0, UNIT_RIGHT, &bold);
    w.text_right("Total", 10.0, RIGHT, &bold);
    w.advance(3.0);
    w.rule();
    w.advance(ROW_HEIGHT);

    for line in &order.lines {
        w.ensure_room(ROW_HEIGHT);
        w.text(&line.quantity.to_string(), 10.0, LEFT, &regular);
        w.text(&truncate(&line.name, 48), 10.0, DESC_X, &regular);
        w.text_right(&line.unit_price.format_ksh(), 10.0, UNIT_RIGHT, &regular);
        w.text_right(&line.line_total().format_ksh(), 10.0, RIGHT, &regular);
        w.advance(ROW_HEIGHT);
    }

    // Totals block: keep it on one page together with its rule.
    w.ensure_room(34.0);
    w.advance(2.0);
    w.rule();
    w.advance(8.0);
    w.text_right("Subtotal", 11.0, UNIT_RIGHT, &bold);
    w.text_right(&order.subtotal().format_ksh(), 11.0, RIGHT, &bold);
    w.advance(7.0);
    w.text_right("Delivery", 11.0, UNIT_RIGHT, &bold);
    w.text_right(&order.delivery_fee.format_ksh(), 11.0, RIGHT, &bold);
    w.advance(10.0);
    w.text_right("Total", 14.0, UNIT_RIGHT, &bold);
    w.text_right(&order.total().format_ksh(), 14.0, RIGHT, &bold);

    // Footer pinned near the bottom of the last page.
    w.text_centered_at("Thank you for your order!", 10.0, FOOTER_Y, &regular);

    let pages = w.pages;
    let bytes = doc.save_to_bytes()?;
    Ok((bytes, pages))
}
