use serde::Serialize;

use crate::aggregate::{AggregationSummary, aggregate};
use crate::cell::Row;
use crate::columns::{ColumnMap, locate_header, map_columns};
use crate::config::RefillConfig;
use crate::error::RefillError;
use crate::filter::{RefillCandidate, select_candidates};
use crate::loader::{FileKind, Upload, decode};
use crate::status::StatusObserver;

/// Rows echoed into the diagnostic log before analysis.
const PREVIEW_ROWS: usize = 10;

/// Outcome of analysing the rows of one sheet.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Analysis {
    /// 0-based index of the header row.
    pub header_row: usize,
    pub columns: ColumnMap,
    pub candidates: Vec<RefillCandidate>,
    pub summary: AggregationSummary,
}

/// A finished refill report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RefillReport {
    pub file_name: String,
    pub sheet: String,
    pub header_row: usize,
    pub candidates: Vec<RefillCandidate>,
    pub summary: AggregationSummary,
}

impl RefillReport {
    pub fn candidates(&self) -> &[RefillCandidate] {
        &self.candidates
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Header detection, column mapping, aggregation and filtering over decoded
/// rows. Pure: the same rows and configuration always give the same result.
pub fn analyze(rows: &[Row], config: &RefillConfig) -> Result<Analysis, RefillError> {
    let header_row = locate_header(rows, &config.columns, config.header_lookahead)?;
    let columns = map_columns(&rows[header_row], &config.columns)?;

    let aggregation = aggregate(&rows[header_row + 1..], &columns, config.key_mode);
    let candidates = select_candidates(&aggregation.groups, &config.rule(), config.order);

    Ok(Analysis {
        header_row,
        columns,
        candidates,
        summary: aggregation.summary,
    })
}

/// Run the whole report for one uploaded file.
///
/// Every failure is reported to `observer` as an error event before it is
/// returned; a successful run ends with a success event.
pub fn run<O: StatusObserver>(
    upload: &Upload,
    config: &RefillConfig,
    observer: &mut O,
) -> Result<RefillReport, RefillError> {
    observer.info(format!("checking file '{}'", upload.file_name));

    match run_stages(upload, config, observer) {
        Ok(report) => {
            if report.is_empty() {
                observer.success("scan complete: no products need a refill (0)");
            } else {
                observer.success(format!(
                    "scan complete: {} products need a refill",
                    report.candidates.len()
                ));
            }
            let summary = &report.summary;
            observer.info(format!(
                "summary: data_rows={}, skipped_missing_key={}, skipped_no_warehouse={}, groups={}, refill={}",
                summary.data_rows,
                summary.skipped_missing_key,
                summary.skipped_no_warehouse,
                summary.groups,
                report.candidates.len()
            ));
            Ok(report)
        }
        Err(err) => {
            observer.error(err.to_string());
            if let RefillError::MissingColumns { header, .. } = &err {
                observer.info(format!("header row found: {:?}", header));
            }
            Err(err)
        }
    }
}

fn run_stages<O: StatusObserver>(
    upload: &Upload,
    config: &RefillConfig,
    observer: &mut O,
) -> Result<RefillReport, RefillError> {
    config.validate()?;
    if upload.file_name.is_empty() {
        return Err(RefillError::NoFileSelected);
    }

    let kind = FileKind::from_file_name(&upload.file_name)?;
    observer.info(format!("supported extension: {}", kind));

    let mut workbook = decode(kind, &upload.bytes)?;
    let sheet_names = workbook.sheet_names();
    observer.info(format!("workbook opened, {} sheet(s)", sheet_names.len()));

    let sheet = match &config.sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| *s == name)
            .cloned()
            .ok_or_else(|| RefillError::SheetNotFound(name.clone()))?,
        None => sheet_names.first().cloned().ok_or(RefillError::NoSheets)?,
    };
    observer.info(format!("using sheet '{}'", sheet));

    let rows = workbook.rows(&sheet)?;
    if rows.is_empty() {
        return Err(RefillError::EmptySheet(sheet));
    }
    observer.info(format!("read {} rows", rows.len()));
    for (i, row) in rows.iter().take(PREVIEW_ROWS).enumerate() {
        let cells: Vec<String> = row.iter().map(|c| c.text()).collect();
        observer.info(format!("row {}: {:?}", i + 1, cells));
    }

    let analysis = analyze(&rows, config)?;
    observer.info(format!(
        "header row found at row {}; all required columns present",
        analysis.header_row + 1
    ));

    Ok(RefillReport {
        file_name: upload.file_name.clone(),
        sheet,
        header_row: analysis.header_row,
        candidates: analysis.candidates,
        summary: analysis.summary,
    })
}
