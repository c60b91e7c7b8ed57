use std::fmt;
use std::path::Path;

use crate::cell::{Cell, Row};
use crate::error::RefillError;

/// Sheet name given to the single sheet of a CSV file.
pub const CSV_SHEET_NAME: &str = "Sheet1";

/// Input formats recognised by their file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Xlsx,
    Xls,
    Csv,
}

impl FileKind {
    /// Detect the format from the text after the last `.` of `file_name`.
    ///
    /// This is a name check only; a misnamed file fails later when decoded.
    ///
    /// # Examples
    /// ```
    /// use refill::loader::FileKind;
    ///
    /// assert_eq!(FileKind::from_file_name("Stock.XLSX").unwrap(), FileKind::Xlsx);
    /// assert!(FileKind::from_file_name("stock.ods").is_err());
    /// ```
    pub fn from_file_name(file_name: &str) -> Result<FileKind, RefillError> {
        let extension = file_name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        match extension.as_str() {
            "xlsx" if file_name.contains('.') => Ok(FileKind::Xlsx),
            "xls" if file_name.contains('.') => Ok(FileKind::Xls),
            "csv" if file_name.contains('.') => Ok(FileKind::Csv),
            _ => Err(RefillError::UnsupportedExtension { extension }),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Xlsx => "xlsx",
            FileKind::Xls => "xls",
            FileKind::Csv => "csv",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.label())
    }
}

/// A file handed to the pipeline: its name and raw contents.
#[derive(Clone, Debug)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Upload {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk.
    ///
    /// # Examples
    /// ```no_run
    /// use refill::loader::Upload;
    ///
    /// match Upload::from_path("stock.xlsx") {
    ///     Ok(upload) => println!("read {} bytes", upload.bytes.len()),
    ///     Err(e) => eprintln!("Error reading file: {}", e),
    /// }
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Result<Upload, RefillError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Upload { file_name, bytes })
    }
}

/// A decoded workbook: sheet names in file order, rows on demand.
pub enum DecodedWorkbook {
    Csv(Vec<Row>),
    #[cfg(feature = "excel")]
    Excel(Box<calamine::Sheets<std::io::Cursor<Vec<u8>>>>),
}

impl DecodedWorkbook {
    pub fn sheet_names(&self) -> Vec<String> {
        match self {
            DecodedWorkbook::Csv(_) => vec![CSV_SHEET_NAME.to_string()],
            #[cfg(feature = "excel")]
            DecodedWorkbook::Excel(sheets) => {
                use calamine::Reader;
                sheets.sheet_names()
            }
        }
    }

    /// Rows of `sheet`, blank cells as [`Cell::Blank`].
    pub fn rows(&mut self, sheet: &str) -> Result<Vec<Row>, RefillError> {
        match self {
            DecodedWorkbook::Csv(rows) => {
                if sheet == CSV_SHEET_NAME {
                    Ok(std::mem::take(rows))
                } else {
                    Err(RefillError::SheetNotFound(sheet.to_string()))
                }
            }
            #[cfg(feature = "excel")]
            DecodedWorkbook::Excel(sheets) => {
                use calamine::Reader;
                let range = sheets
                    .worksheet_range(sheet)
                    .map_err(|e| RefillError::ParseFailed(format!("sheet '{}': {}", sheet, e)))?;
                Ok(range
                    .rows()
                    .map(|row| row.iter().map(excel_cell).collect())
                    .collect())
            }
        }
    }
}

/// Decode raw bytes according to `kind`.
pub fn decode(kind: FileKind, bytes: &[u8]) -> Result<DecodedWorkbook, RefillError> {
    match kind {
        FileKind::Csv => from_csv(bytes).map(DecodedWorkbook::Csv),
        FileKind::Xlsx | FileKind::Xls => from_excel(kind, bytes),
    }
}

/// Parse CSV bytes into rows. Records may have differing lengths, and
/// invalid UTF-8 is replaced rather than rejected.
pub fn from_csv(bytes: &[u8]) -> Result<Vec<Row>, RefillError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (line, record) in reader.byte_records().enumerate() {
        let record = record
            .map_err(|e| RefillError::ParseFailed(format!("CSV line {}: {}", line + 1, e)))?;
        rows.push(
            record
                .iter()
                .map(|field| Cell::from(&*String::from_utf8_lossy(field)))
                .collect(),
        );
    }
    Ok(rows)
}

#[cfg(feature = "excel")]
fn from_excel(kind: FileKind, bytes: &[u8]) -> Result<DecodedWorkbook, RefillError> {
    let cursor = std::io::Cursor::new(bytes.to_vec());
    let sheets = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| RefillError::ParseFailed(format!("{} workbook: {}", kind, e)))?;
    Ok(DecodedWorkbook::Excel(Box::new(sheets)))
}

#[cfg(not(feature = "excel"))]
fn from_excel(kind: FileKind, _bytes: &[u8]) -> Result<DecodedWorkbook, RefillError> {
    Err(RefillError::DecodeUnavailable {
        format: kind.label(),
    })
}

#[cfg(feature = "excel")]
fn excel_cell(data: &calamine::Data) -> Cell {
    use calamine::Data;

    match data {
        Data::Empty => Cell::Blank,
        Data::String(s) if s.is_empty() => Cell::Blank,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert_eq!(FileKind::from_file_name("a.CSV").unwrap(), FileKind::Csv);
        assert_eq!(FileKind::from_file_name("stock.v2.xls").unwrap(), FileKind::Xls);
    }

    #[test]
    fn extension_check_rejects_other_names() {
        for name in ["report.pdf", "xlsx", "", "stock.xlsx.bak"] {
            let err = FileKind::from_file_name(name).unwrap_err();
            assert_eq!(err.kind(), "UnsupportedExtension", "name {name:?}");
        }
    }

    #[test]
    fn csv_rows_keep_ragged_shape() {
        let rows = from_csv(b"Item Code,Color Code\nA1,RED,extra\n\"B,2\",\n").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].len(), 3);
        assert_eq!(rows[2][0], Cell::Text("B,2".into()));
        assert_eq!(rows[2][1], Cell::Blank);
    }

    #[test]
    fn csv_workbook_has_one_sheet() {
        let mut workbook = decode(FileKind::Csv, b"a,b\n").unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Sheet1"]);
        assert!(matches!(
            workbook.rows("Other"),
            Err(RefillError::SheetNotFound(_))
        ));
        assert_eq!(workbook.rows("Sheet1").unwrap().len(), 1);
    }

    #[cfg(feature = "excel")]
    #[test]
    fn garbage_bytes_fail_to_parse() {
        let err = decode(FileKind::Xlsx, b"definitely not a zip archive").err().unwrap();
        assert_eq!(err.kind(), "ParseFailed");
    }

    #[cfg(not(feature = "excel"))]
    #[test]
    fn excel_needs_the_excel_feature() {
        let err = decode(FileKind::Xlsx, b"").err().unwrap();
        assert_eq!(err.kind(), "DecodeUnavailable");
    }
}
