/*!
# Inventory Refill Report

Finds item + color combinations that need restocking in a warehouse/sales
stock spreadsheet, and exports them as a new spreadsheet.

## Overview

A stock export (`.xlsx`, `.xls` or `.csv`) rarely starts with its header on
row 1. The report scans the first rows for a header containing every required
column (matched case-insensitively against a synonym table), sums warehouse
and sales stock per item code and color code, and keeps the combinations whose
sales stay below a threshold while warehouse stock remains.

## Architecture

Data flows strictly forward:

bytes → rows → header index → column map → data rows → grouped totals →
filtered list → rendered/exported output

### Core
- **loader**: file-kind detection and the spreadsheet decoder (calamine for
  Excel, csv for CSV)
- **columns**: synonym table, header locator, column mapper
- **aggregate**: stock coercion and grouping by (item code, color code)
- **filter**: refill rule and candidate selection
- **pipeline**: runs the stages in order and reports status events

### Result sinks
- **downloader**: XLSX/CSV export and a plain-text table
- **app**: web page and JSON/file API (feature `web`)

### Ambient
- **config**: `RefillConfig`, loadable from TOML
- **status**: info/error/success events and the diagnostic log
- **error**: `RefillError`

## Defaults

| Setting | Value |
|---|---|
| Sales threshold | 6 (`total_sales < 6`) |
| Warehouse rule | `total_warehouse > 0` |
| Header lookahead | 50 rows |
| Group key | exact item/color text |
| Export file | `Inventory_Refill_Report.xlsx` |

## REST API Endpoints

- `GET /` - Upload page
- `POST /api/report` - Multipart field `file`; runs the report
- `GET /api/export?format=xlsx|csv` - Downloads the last report
- `GET /api/health` - Liveness check
*/

pub mod aggregate;
#[cfg(feature = "web")]
pub mod app;
pub mod cell;
pub mod columns;
pub mod config;
pub mod downloader;
pub mod error;
pub mod filter;
pub mod loader;
pub mod pipeline;
pub mod status;

pub use cell::{Cell, Row};
pub use config::RefillConfig;
pub use downloader::{EXPORT_FILE_NAME, render_table, to_csv, to_xlsx};
pub use error::RefillError;
pub use filter::{DEFAULT_SALES_THRESHOLD, RefillCandidate};
pub use loader::Upload;
pub use pipeline::{RefillReport, analyze, run};
pub use status::{Diagnostics, Severity, StatusEvent, StatusObserver};
