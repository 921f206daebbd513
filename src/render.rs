use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::error::{Result, SourcingError};
use crate::models::Quotation;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 40.0;
const LINE_HEIGHT: f32 = 16.0;

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render a quotation as a standalone styled HTML document
pub fn render_html(quotation: &Quotation) -> String {
    let rows: String = quotation
        .items
        .iter()
        .map(|item| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                html_escape(&item.description),
                html_escape(&item.moq),
                html_escape(&item.price_per_unit),
                item.quantity,
                html_escape(&item.amount),
            )
        })
        .collect();

    let synthetic_banner = if quotation.synthetic {
        "<p class=\"synthetic\">Demonstration quotation - generated locally, not supplier data</p>"
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Quotation {id}</title>
<style>
  body {{ font-family: Helvetica, Arial, sans-serif; color: #1e1b4b; margin: 2rem; }}
  .header {{ background: #2962ff; color: #fff; padding: 1rem; text-align: center; }}
  .meta {{ display: flex; justify-content: space-between; margin: 1rem 0; }}
  .parties {{ display: flex; justify-content: space-between; margin-bottom: 1.5rem; }}
  .parties h3 {{ margin-bottom: 0.25rem; }}
  table {{ width: 100%; border-collapse: collapse; }}
  th, td {{ border: 1px solid #c7d2fe; padding: 0.5rem; text-align: left; }}
  th {{ background: #2962ff; color: #fff; }}
  .total {{ text-align: right; font-weight: bold; margin-top: 0.75rem; }}
  .synthetic {{ color: #b91c1c; font-weight: bold; }}
</style>
</head>
<body>
  <div class="header"><h1>QUOTATION</h1></div>
  {synthetic_banner}
  <div class="meta">
    <span>Quotation #: {id}</span>
    <span>Date: {date} &middot; Valid till: {valid_till}</span>
  </div>
  <div class="parties">
    <div>
      <h3>From</h3>
      <p>{supplier_name}<br>GSTIN: {supplier_gstin}<br>Phone: {supplier_phone}<br>Email: {supplier_email}<br>{supplier_address}</p>
    </div>
    <div>
      <h3>To</h3>
      <p>{seeker_name}<br>Phone: {seeker_phone}<br>Email: {seeker_email}<br>{seeker_address}</p>
    </div>
  </div>
  <table>
    <thead><tr><th>Description</th><th>MOQ</th><th>Price/Unit</th><th>Quantity</th><th>Amount</th></tr></thead>
    <tbody>{rows}</tbody>
  </table>
  <p class="total">Total: {total}</p>
</body>
</html>
"#,
        id = html_escape(&quotation.id),
        date = html_escape(&quotation.date),
        valid_till = html_escape(&quotation.valid_till),
        supplier_name = html_escape(&quotation.supplier_name),
        supplier_gstin = html_escape(&quotation.supplier_gstin),
        supplier_phone = html_escape(&quotation.supplier_phone),
        supplier_email = html_escape(&quotation.supplier_email),
        supplier_address = html_escape(&quotation.supplier_address),
        seeker_name = html_escape(&quotation.seeker_name),
        seeker_phone = html_escape(&quotation.seeker_phone),
        seeker_email = html_escape(&quotation.seeker_email),
        seeker_address = html_escape(&quotation.seeker_address),
        rows = rows,
        total = html_escape(&quotation.total_amount),
    )
}

/// Helvetica has no rupee glyph; fall back to a plain prefix in the PDF
fn pdf_text(text: &str) -> String {
    text.replace('\u{20b9}', "Rs ")
}

struct PageBuilder {
    operations: Vec<Operation>,
    cursor: f32,
}

impl PageBuilder {
    fn new() -> Self {
        Self {
            operations: Vec::new(),
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, rgb: (f32, f32, f32)) {
        self.operations.push(Operation::new(
            "rg",
            vec![rgb.0.into(), rgb.1.into(), rgb.2.into()],
        ));
        self.operations.push(Operation::new(
            "re",
            vec![x.into(), y.into(), w.into(), h.into()],
        ));
        self.operations.push(Operation::new("f", vec![]));
        // back to black for subsequent text
        self.operations
            .push(Operation::new("rg", vec![0.into(), 0.into(), 0.into()]));
    }

    fn text_at(&mut self, font: &str, size: f32, x: f32, y: f32, text: &str) {
        self.operations.push(Operation::new("BT", vec![]));
        self.operations
            .push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.operations
            .push(Operation::new("Td", vec![x.into(), y.into()]));
        self.operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(pdf_text(text))],
        ));
        self.operations.push(Operation::new("ET", vec![]));
    }

    fn line(&mut self, font: &str, size: f32, text: &str) {
        self.cursor -= LINE_HEIGHT;
        self.text_at(font, size, MARGIN, self.cursor, text);
    }

    fn gap(&mut self, height: f32) {
        self.cursor -= height;
    }
}

fn item_row_columns() -> [(&'static str, f32); 5] {
    [
        ("Description", MARGIN),
        ("MOQ", 260.0),
        ("Price/Unit", 340.0),
        ("Qty", 430.0),
        ("Amount", 480.0),
    ]
}

fn header_page(quotation: &Quotation) -> PageBuilder {
    let mut page = PageBuilder::new();

    // Title band across the top
    page.fill_rect(
        0.0,
        PAGE_HEIGHT - 60.0,
        PAGE_WIDTH,
        60.0,
        (0.16, 0.38, 1.0),
    );
    page.operations
        .push(Operation::new("rg", vec![1.into(), 1.into(), 1.into()]));
    page.text_at("F2", 22.0, PAGE_WIDTH / 2.0 - 60.0, PAGE_HEIGHT - 40.0, "QUOTATION");
    page.operations
        .push(Operation::new("rg", vec![0.into(), 0.into(), 0.into()]));
    page.cursor = PAGE_HEIGHT - 80.0;

    if quotation.synthetic {
        page.line("F2", 11.0, "Demonstration quotation - generated locally, not supplier data");
        page.gap(4.0);
    }

    page.line("F1", 11.0, &format!("Quotation #: {}", quotation.id));
    page.line("F1", 11.0, &format!("Date: {}", quotation.date));
    page.line("F1", 11.0, &format!("Valid till: {}", quotation.valid_till));
    page.gap(10.0);

    // From / To blocks
    let from_top = page.cursor;
    page.line("F2", 13.0, "From");
    page.line("F1", 11.0, &quotation.supplier_name);
    page.line("F1", 11.0, &format!("GSTIN: {}", quotation.supplier_gstin));
    page.line("F1", 11.0, &format!("Phone: {}", quotation.supplier_phone));
    page.line("F1", 11.0, &format!("Email: {}", quotation.supplier_email));
    page.line("F1", 11.0, &format!("Address: {}", quotation.supplier_address));

    let to_x = PAGE_WIDTH / 2.0 + 20.0;
    let mut y = from_top - LINE_HEIGHT;
    page.text_at("F2", 13.0, to_x, y, "To");
    for line in [
        quotation.seeker_name.clone(),
        format!("Phone: {}", quotation.seeker_phone),
        format!("Email: {}", quotation.seeker_email),
        format!("Address: {}", quotation.seeker_address),
    ] {
        y -= LINE_HEIGHT;
        page.text_at("F1", 11.0, to_x, y, &line);
    }

    page.gap(20.0);
    page
}

fn table_header(page: &mut PageBuilder) {
    page.cursor -= LINE_HEIGHT;
    for (label, x) in item_row_columns() {
        page.text_at("F2", 11.0, x, page.cursor, label);
    }
    page.gap(4.0);
}

/// Render a quotation to PDF bytes: header band, party blocks, then the item
/// table paginated across as many pages as needed.
pub fn render_pdf(quotation: &Quotation) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let font_bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_regular,
            "F2" => font_bold,
        },
    });

    let mut builders = Vec::new();
    let mut current = header_page(quotation);
    table_header(&mut current);

    for item in &quotation.items {
        // spill to a fresh page when the row would land in the bottom margin
        if current.cursor < MARGIN + LINE_HEIGHT * 2.0 {
            builders.push(current);
            current = PageBuilder::new();
            table_header(&mut current);
        }
        current.cursor -= LINE_HEIGHT;
        let cells = [
            item.description.clone(),
            item.moq.clone(),
            item.price_per_unit.clone(),
            item.quantity.to_string(),
            item.amount.clone(),
        ];
        for ((_, x), cell) in item_row_columns().iter().zip(cells.iter()) {
            current.text_at("F1", 10.0, *x, current.cursor, cell);
        }
    }

    current.gap(8.0);
    current.cursor -= LINE_HEIGHT;
    current.text_at("F2", 12.0, 380.0, current.cursor, "Total:");
    current.text_at("F2", 12.0, 460.0, current.cursor, &quotation.total_amount);
    builders.push(current);

    let mut kids: Vec<Object> = Vec::new();
    let page_count = builders.len();
    for builder in builders {
        let content = Content {
            operations: builder.operations,
        };
        let encoded = content
            .encode()
            .map_err(|e| SourcingError::Internal(format!("Failed to encode PDF content: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| SourcingError::Internal(format!("Failed to serialize PDF: {e}")))?;
    Ok(bytes)
}

/// Suggested download filename for a quotation PDF
pub fn pdf_filename(quotation: &Quotation) -> String {
    format!("quotation-{}.pdf", quotation.id)
}
