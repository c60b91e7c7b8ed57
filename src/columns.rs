//! Header detection and column mapping.
//!
//! The synonym table is plain data: each logical column lists the header
//! texts it accepts. Matching is an exact comparison of trimmed, lowercased
//! text, so `"ITEM CODE"` and `"Item Code"` resolve the same way.

use serde::{Deserialize, Serialize};

use crate::cell::Row;
use crate::error::RefillError;

/// Upper bound on the number of rows scanned for a header.
pub const DEFAULT_HEADER_LOOKAHEAD: usize = 50;

/// What a logical column is used for once it has been located.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    ItemCode,
    ColorCode,
    WarehouseStock,
    SalesStock,
    /// Must be present for the header to be recognised, but is not aggregated.
    Required,
}

impl ColumnRole {
    pub const AGGREGATED: [ColumnRole; 4] = [
        ColumnRole::ItemCode,
        ColumnRole::ColorCode,
        ColumnRole::WarehouseStock,
        ColumnRole::SalesStock,
    ];
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub role: ColumnRole,
    pub synonyms: Vec<String>,
}

impl ColumnSpec {
    pub fn new(name: &str, role: ColumnRole, synonyms: &[&str]) -> Self {
        ColumnSpec {
            name: name.to_string(),
            role,
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn matches(&self, normalized: &str) -> bool {
        self.synonyms
            .iter()
            .any(|s| s.trim().to_lowercase() == normalized)
    }
}

/// Logical column name → accepted header labels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymTable {
    pub columns: Vec<ColumnSpec>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        SynonymTable {
            columns: vec![
                ColumnSpec::new(
                    "Item Code",
                    ColumnRole::ItemCode,
                    &["Item Code", "ItemCode", "ITEM CODE"],
                ),
                ColumnSpec::new(
                    "Color Code",
                    ColumnRole::ColorCode,
                    &["Color Code", "ColorCode", "COLOR CODE"],
                ),
                ColumnSpec::new(
                    "Total Warehouse Stock",
                    ColumnRole::WarehouseStock,
                    &["Total Warehouse Stock", "Warehouse Stock", "FWareHouseStock"],
                ),
                ColumnSpec::new(
                    "Total Sales Stock",
                    ColumnRole::SalesStock,
                    &["Total Sales Stock", "Sales Stock"],
                ),
            ],
        }
    }
}

impl SynonymTable {
    /// Each aggregated role must appear exactly once, and every column needs
    /// at least one synonym.
    pub fn validate(&self) -> Result<(), RefillError> {
        for role in ColumnRole::AGGREGATED {
            let count = self.columns.iter().filter(|c| c.role == role).count();
            if count != 1 {
                return Err(RefillError::InvalidConfig(format!(
                    "column role {:?} must be configured exactly once, found {}",
                    role, count
                )));
            }
        }
        if let Some(column) = self.columns.iter().find(|c| c.synonyms.is_empty()) {
            return Err(RefillError::InvalidConfig(format!(
                "column '{}' has no synonyms",
                column.name
            )));
        }
        Ok(())
    }
}

/// One resolved logical column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedColumn {
    pub name: String,
    pub role: ColumnRole,
    pub index: usize,
}

/// Where each logical column lives in the data rows. Built once per file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnMap {
    pub item_code: usize,
    pub color_code: usize,
    pub warehouse_stock: usize,
    pub sales_stock: usize,
    pub resolved: Vec<ResolvedColumn>,
}

impl ColumnMap {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.resolved
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.index)
    }
}

/// Returns the index of the first row, among the first `lookahead` rows, that
/// contains a synonym for every column in `table`.
pub fn locate_header(
    rows: &[Row],
    table: &SynonymTable,
    lookahead: usize,
) -> Result<usize, RefillError> {
    rows.iter()
        .take(lookahead)
        .position(|row| {
            let cells: Vec<String> = row.iter().map(|c| c.normalized()).collect();
            table
                .columns
                .iter()
                .all(|spec| cells.iter().any(|cell| spec.matches(cell)))
        })
        .ok_or(RefillError::HeaderNotFound { lookahead })
}

/// Maps every column in `table` to the first matching cell of `header`.
///
/// All unresolved columns are reported together.
pub fn map_columns(header: &Row, table: &SynonymTable) -> Result<ColumnMap, RefillError> {
    let normalized: Vec<String> = header.iter().map(|c| c.normalized()).collect();

    let mut resolved = Vec::with_capacity(table.columns.len());
    let mut missing = Vec::new();
    for spec in &table.columns {
        match normalized.iter().position(|cell| spec.matches(cell)) {
            Some(index) => resolved.push(ResolvedColumn {
                name: spec.name.clone(),
                role: spec.role,
                index,
            }),
            None => missing.push(spec.name.clone()),
        }
    }

    let lookup = (
        role_index(&resolved, ColumnRole::ItemCode),
        role_index(&resolved, ColumnRole::ColorCode),
        role_index(&resolved, ColumnRole::WarehouseStock),
        role_index(&resolved, ColumnRole::SalesStock),
    );

    match lookup {
        (Some(item_code), Some(color_code), Some(warehouse_stock), Some(sales_stock))
            if missing.is_empty() =>
        {
            Ok(ColumnMap {
                item_code,
                color_code,
                warehouse_stock,
                sales_stock,
                resolved,
            })
        }
        _ => {
            if missing.is_empty() {
                // Only reachable with a table that skipped validation.
                missing.extend(
                    ColumnRole::AGGREGATED
                        .iter()
                        .filter(|role| role_index(&resolved, **role).is_none())
                        .map(|role| format!("{:?}", role)),
                );
            }
            Err(RefillError::MissingColumns {
                missing,
                header: header.iter().map(|c| c.text().trim().to_string()).collect(),
            })
        }
    }
}

fn role_index(resolved: &[ResolvedColumn], role: ColumnRole) -> Option<usize> {
    resolved.iter().find(|c| c.role == role).map(|c| c.index)
}
