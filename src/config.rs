use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::aggregate::KeyMode;
use crate::columns::{DEFAULT_HEADER_LOOKAHEAD, SynonymTable};
use crate::error::RefillError;
use crate::filter::{DEFAULT_SALES_THRESHOLD, RefillRule, ReportOrder, WarehouseRule};

/// Settings for one refill run.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// sales_threshold = 4
/// key_mode = "normalized"
///
/// [[columns]]
/// name = "Item Code"
/// role = "item_code"
/// synonyms = ["Item Code", "Article"]
/// ```
///
/// A `columns` list replaces the whole default synonym table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RefillConfig {
    pub sales_threshold: u32,
    pub warehouse_rule: WarehouseRule,
    pub key_mode: KeyMode,
    pub header_lookahead: usize,
    /// Sheet to read; the first sheet when unset.
    pub sheet: Option<String>,
    pub order: ReportOrder,
    pub columns: SynonymTable,
}

impl Default for RefillConfig {
    fn default() -> Self {
        RefillConfig {
            sales_threshold: DEFAULT_SALES_THRESHOLD,
            warehouse_rule: WarehouseRule::default(),
            key_mode: KeyMode::default(),
            header_lookahead: DEFAULT_HEADER_LOOKAHEAD,
            sheet: None,
            order: ReportOrder::default(),
            columns: SynonymTable::default(),
        }
    }
}

impl RefillConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, RefillError> {
        let config: RefillConfig =
            toml::from_str(text).map_err(|e| RefillError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RefillError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            RefillError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        log::info!("loaded configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), RefillError> {
        if self.header_lookahead == 0 {
            return Err(RefillError::InvalidConfig(
                "header_lookahead must be at least 1".to_string(),
            ));
        }
        self.columns.validate()
    }

    pub fn rule(&self) -> RefillRule {
        RefillRule {
            sales_threshold: self.sales_threshold,
            warehouse: self.warehouse_rule,
        }
    }
}
