use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::cell::{Cell, Row, cell_at};
use crate::columns::ColumnMap;

/// How item and color codes are turned into a group key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// Codes are used exactly as they appear in the file.
    #[default]
    Exact,
    /// Codes are trimmed and uppercased before grouping.
    Normalized,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKey {
    pub item_code: String,
    pub color_code: String,
}

impl GroupKey {
    fn new(item_code: String, color_code: String, mode: KeyMode) -> Self {
        match mode {
            KeyMode::Exact => GroupKey {
                item_code,
                color_code,
            },
            KeyMode::Normalized => GroupKey {
                item_code: item_code.trim().to_uppercase(),
                color_code: color_code.trim().to_uppercase(),
            },
        }
    }
}

/// Running totals for one item + color combination.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StockGroup {
    pub key: GroupKey,
    pub total_warehouse: f64,
    pub total_sales: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSummary {
    pub data_rows: usize,
    pub skipped_missing_key: usize,
    pub skipped_no_warehouse: usize,
    pub groups: usize,
}

/// Groups in creation order plus counters for the rows that were left out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregation {
    pub groups: Vec<StockGroup>,
    pub summary: AggregationSummary,
}

/// Warehouse stock that is missing, non-numeric or not positive counts as 0.
pub fn coerce_warehouse(row: &[Cell], index: usize) -> f64 {
    match cell_at(row, index).number() {
        Some(n) if n > 0.0 => n,
        _ => 0.0,
    }
}

/// Sales stock that is missing, non-numeric or negative counts as 0.
pub fn coerce_sales(row: &[Cell], index: usize) -> f64 {
    match cell_at(row, index).number() {
        Some(n) if n >= 0.0 => n,
        _ => 0.0,
    }
}

/// Sums warehouse and sales stock per (item code, color code).
///
/// Rows without both codes, and rows whose warehouse stock coerces to 0, do
/// not create or update a group.
pub fn aggregate(data_rows: &[Row], columns: &ColumnMap, mode: KeyMode) -> Aggregation {
    let mut groups: Vec<StockGroup> = Vec::new();
    let mut positions: HashMap<GroupKey, usize> = HashMap::new();
    let mut summary = AggregationSummary {
        data_rows: data_rows.len(),
        ..Default::default()
    };

    for row in data_rows {
        let item = cell_at(row, columns.item_code);
        let color = cell_at(row, columns.color_code);
        if item.is_blank() || color.is_blank() {
            summary.skipped_missing_key += 1;
            continue;
        }

        let warehouse = coerce_warehouse(row, columns.warehouse_stock);
        if warehouse == 0.0 {
            summary.skipped_no_warehouse += 1;
            continue;
        }
        let sales = coerce_sales(row, columns.sales_stock);

        let key = GroupKey::new(item.text(), color.text(), mode);
        match positions.get(&key) {
            Some(&pos) => {
                let group = &mut groups[pos];
                group.total_warehouse += warehouse;
                group.total_sales += sales;
            }
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push(StockGroup {
                    key,
                    total_warehouse: warehouse,
                    total_sales: sales,
                });
            }
        }
    }

    summary.groups = groups.len();
    log::debug!(
        "aggregated {} data rows into {} groups ({} without key, {} without warehouse stock)",
        summary.data_rows,
        summary.groups,
        summary.skipped_missing_key,
        summary.skipped_no_warehouse
    );

    Aggregation { groups, summary }
}
