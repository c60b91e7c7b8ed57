use thiserror::Error;

/// Everything that can stop a refill run.
///
/// Every variant is fatal to the current run. Row-level problems (an
/// unparseable stock cell, a missing item code) are not errors; the aggregator
/// skips those rows and counts them instead.
#[derive(Debug, Error)]
pub enum RefillError {
    #[error("no file selected; choose an Excel (.xlsx/.xls) or CSV file")]
    NoFileSelected,

    #[error("unsupported file type '.{extension}'; use .xlsx, .xls or .csv")]
    UnsupportedExtension { extension: String },

    #[error("no decoder available for {format} files")]
    DecodeUnavailable { format: &'static str },

    #[error("failed to read file: {0}")]
    FileReadFailed(#[from] std::io::Error),

    #[error("failed to parse spreadsheet: {0}")]
    ParseFailed(String),

    #[error("the workbook contains no sheets")]
    NoSheets,

    #[error("sheet '{0}' was not found in the workbook")]
    SheetNotFound(String),

    #[error("sheet '{0}' is empty")]
    EmptySheet(String),

    #[error("could not find a header row within the first {lookahead} rows")]
    HeaderNotFound { lookahead: usize },

    #[error("missing required columns: {}", .missing.join(", "))]
    MissingColumns {
        missing: Vec<String>,
        header: Vec<String>,
    },

    #[error("nothing to export; the report has no refill candidates")]
    NothingToExport,

    #[error("failed to write export: {0}")]
    ExportFailed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RefillError {
    /// Stable tag used in API responses and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RefillError::NoFileSelected => "NoFileSelected",
            RefillError::UnsupportedExtension { .. } => "UnsupportedExtension",
            RefillError::DecodeUnavailable { .. } => "DecodeUnavailable",
            RefillError::FileReadFailed(_) => "FileReadFailed",
            RefillError::ParseFailed(_) => "ParseFailed",
            RefillError::NoSheets => "NoSheets",
            RefillError::SheetNotFound(_) => "SheetNotFound",
            RefillError::EmptySheet(_) => "EmptySheet",
            RefillError::HeaderNotFound { .. } => "HeaderNotFound",
            RefillError::MissingColumns { .. } => "MissingColumns",
            RefillError::NothingToExport => "NothingToExport",
            RefillError::ExportFailed(_) => "ExportFailed",
            RefillError::InvalidConfig(_) => "InvalidConfig",
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for RefillError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        RefillError::ExportFailed(err.to_string())
    }
}
