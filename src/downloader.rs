use rust_xlsxwriter::Workbook;
use serde::Serialize;

use crate::error::RefillError;
use crate::filter::RefillCandidate;

/// File name offered for the generated spreadsheet.
pub const EXPORT_FILE_NAME: &str = "Inventory_Refill_Report.xlsx";

pub const EXPORT_HEADER: [&str; 3] = ["Product Code", "Total Warehouse Stock", "Total Sales Stock"];

const TABLE_HEADER: [&str; 4] = [
    "Item Code",
    "Color Code",
    "Total Warehouse Stock",
    "Total Sales Stock",
];

/// One data row of the export sheet.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportRow {
    pub product_code: String,
    pub total_warehouse_stock: f64,
    pub total_sales_stock: f64,
}

/// The data rows written below [`EXPORT_HEADER`].
pub fn export_rows(candidates: &[RefillCandidate]) -> Result<Vec<ExportRow>, RefillError> {
    if candidates.is_empty() {
        return Err(RefillError::NothingToExport);
    }
    Ok(candidates
        .iter()
        .map(|c| ExportRow {
            product_code: c.product_code(),
            total_warehouse_stock: c.total_warehouse_stock,
            total_sales_stock: c.total_sales_stock,
        })
        .collect())
}

/// Convert refill candidates to XLSX format
///
/// Writes a single sheet with the export header and one row per candidate,
/// stock totals as numbers.
///
/// # Examples
/// ```
/// use refill::downloader::to_xlsx;
/// use refill::filter::RefillCandidate;
///
/// let candidates = vec![RefillCandidate {
///     item_code: "A1".into(),
///     color_code: "RED".into(),
///     total_warehouse_stock: 15.0,
///     total_sales_stock: 3.0,
/// }];
/// let bytes = to_xlsx(&candidates).unwrap();
/// assert!(bytes.starts_with(b"PK"));
/// ```
pub fn to_xlsx(candidates: &[RefillCandidate]) -> Result<Vec<u8>, RefillError> {
    let rows = export_rows(candidates)?;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, title) in EXPORT_HEADER.iter().enumerate() {
        worksheet.write_string(0, col as u16, *title)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, row.product_code.as_str())?;
        worksheet.write_number(r, 1, row.total_warehouse_stock)?;
        worksheet.write_number(r, 2, row.total_sales_stock)?;
    }

    let buffer = workbook.save_to_buffer()?;
    log::info!("exported {} refill rows ({} bytes)", rows.len(), buffer.len());
    Ok(buffer)
}

/// Same rows as [`to_xlsx`], as CSV text.
pub fn to_csv(candidates: &[RefillCandidate]) -> Result<String, RefillError> {
    let rows = export_rows(candidates)?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    let failed = |e: csv::Error| RefillError::ExportFailed(e.to_string());
    writer.write_record(EXPORT_HEADER).map_err(failed)?;
    for row in &rows {
        writer
            .write_record([
                row.product_code.clone(),
                row.total_warehouse_stock.to_string(),
                row.total_sales_stock.to_string(),
            ])
            .map_err(failed)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| RefillError::ExportFailed(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| RefillError::ExportFailed(e.to_string()))
}

/// Plain-text table of the candidates for terminal output.
pub fn render_table(candidates: &[RefillCandidate]) -> String {
    let body: Vec<[String; 4]> = candidates
        .iter()
        .map(|c| {
            [
                c.item_code.clone(),
                c.color_code.clone(),
                c.total_warehouse_stock.to_string(),
                c.total_sales_stock.to_string(),
            ]
        })
        .collect();

    let mut widths = TABLE_HEADER.map(|h| h.chars().count());
    for row in &body {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_line = |values: [&str; 4]| {
        let cells: Vec<String> = values
            .iter()
            .zip(widths)
            .map(|(value, width)| format!("{:<width$}", value, width = width))
            .collect();
        out.push_str(cells.join(" | ").trim_end());
        out.push('\n');
    };

    push_line(TABLE_HEADER);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line([
        rule[0].as_str(),
        rule[1].as_str(),
        rule[2].as_str(),
        rule[3].as_str(),
    ]);
    for row in &body {
        push_line([
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
        ]);
    }
    out
}
