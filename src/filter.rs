use serde::{Deserialize, Serialize};

use crate::aggregate::StockGroup;

/// Groups selling fewer than this many units are refill candidates.
pub const DEFAULT_SALES_THRESHOLD: u32 = 6;

/// Lower bound applied to a group's total warehouse stock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseRule {
    /// `total_warehouse > 0`
    #[default]
    Positive,
    /// `total_warehouse >= 0`
    NonNegative,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOrder {
    /// Order in which each item + color was first seen.
    #[default]
    FirstSeen,
    /// Item code, then color code.
    ProductCode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefillRule {
    pub sales_threshold: u32,
    pub warehouse: WarehouseRule,
}

impl Default for RefillRule {
    fn default() -> Self {
        RefillRule {
            sales_threshold: DEFAULT_SALES_THRESHOLD,
            warehouse: WarehouseRule::default(),
        }
    }
}

impl RefillRule {
    pub fn keeps(&self, group: &StockGroup) -> bool {
        let warehouse_ok = match self.warehouse {
            WarehouseRule::Positive => group.total_warehouse > 0.0,
            WarehouseRule::NonNegative => group.total_warehouse >= 0.0,
        };
        warehouse_ok && group.total_sales < f64::from(self.sales_threshold)
    }
}

/// An item + color combination that needs restocking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefillCandidate {
    pub item_code: String,
    pub color_code: String,
    pub total_warehouse_stock: f64,
    pub total_sales_stock: f64,
}

impl RefillCandidate {
    /// Item code and color code joined without a separator.
    pub fn product_code(&self) -> String {
        format!("{}{}", self.item_code, self.color_code)
    }
}

impl From<&StockGroup> for RefillCandidate {
    fn from(group: &StockGroup) -> Self {
        RefillCandidate {
            item_code: group.key.item_code.clone(),
            color_code: group.key.color_code.clone(),
            total_warehouse_stock: group.total_warehouse,
            total_sales_stock: group.total_sales,
        }
    }
}

pub fn select_candidates(
    groups: &[StockGroup],
    rule: &RefillRule,
    order: ReportOrder,
) -> Vec<RefillCandidate> {
    let mut candidates: Vec<RefillCandidate> = groups
        .iter()
        .filter(|g| rule.keeps(g))
        .map(RefillCandidate::from)
        .collect();

    if order == ReportOrder::ProductCode {
        candidates.sort_by(|a, b| {
            a.item_code
                .cmp(&b.item_code)
                .then_with(|| a.color_code.cmp(&b.color_code))
        });
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::GroupKey;

    fn group(item: &str, color: &str, warehouse: f64, sales: f64) -> StockGroup {
        StockGroup {
            key: GroupKey {
                item_code: item.to_string(),
                color_code: color.to_string(),
            },
            total_warehouse: warehouse,
            total_sales: sales,
        }
    }

    #[test]
    fn threshold_is_strict() {
        let rule = RefillRule::default();
        assert!(!rule.keeps(&group("A", "B", 10.0, 6.0)));
        assert!(rule.keeps(&group("A", "B", 10.0, 5.0)));
    }

    #[test]
    fn threshold_is_configurable() {
        let rule = RefillRule {
            sales_threshold: 4,
            ..Default::default()
        };
        assert!(rule.keeps(&group("A", "B", 1.0, 3.0)));
        assert!(!rule.keeps(&group("A", "B", 1.0, 4.0)));
    }

    #[test]
    fn warehouse_rule() {
        let empty = group("A", "B", 0.0, 0.0);
        assert!(!RefillRule::default().keeps(&empty));

        let lenient = RefillRule {
            warehouse: WarehouseRule::NonNegative,
            ..Default::default()
        };
        assert!(lenient.keeps(&empty));
    }

    #[test]
    fn keeps_creation_order_unless_sorted() {
        let groups = vec![
            group("B2", "RED", 3.0, 1.0),
            group("A9", "RED", 3.0, 9.0),
            group("A1", "GREEN", 2.0, 0.0),
            group("A1", "BLUE", 2.0, 0.0),
        ];
        let rule = RefillRule::default();

        let first_seen = select_candidates(&groups, &rule, ReportOrder::FirstSeen);
        let codes: Vec<String> = first_seen.iter().map(|c| c.product_code()).collect();
        assert_eq!(codes, vec!["B2RED", "A1GREEN", "A1BLUE"]);

        let sorted = select_candidates(&groups, &rule, ReportOrder::ProductCode);
        let codes: Vec<String> = sorted.iter().map(|c| c.product_code()).collect();
        assert_eq!(codes, vec!["A1BLUE", "A1GREEN", "B2RED"]);
    }
}
