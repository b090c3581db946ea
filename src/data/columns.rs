//! Header discovery and cell coercion shared by all normalizers.
//!
//! Feeds rename their columns between releases (`估算值` becomes
//! `2024-01-02-估算数据-估算值`, `成交额` becomes `成交金额`), so fields are
//! located by keyword rules instead of exact names.

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("{table}: no column for `{field}` among {columns:?}")]
    MissingColumn {
        table: &'static str,
        field: &'static str,
        columns: Vec<String>,
    },
}

/// Keyword rule locating one canonical field
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub field: &'static str,
    /// Header must contain at least one of these
    pub include: &'static [&'static str],
    /// Header must contain none of these
    pub exclude: &'static [&'static str],
}

impl ColumnRule {
    pub const fn new(
        field: &'static str,
        include: &'static [&'static str],
        exclude: &'static [&'static str],
    ) -> Self {
        Self {
            field,
            include,
            exclude,
        }
    }

    pub fn matches(&self, header: &str) -> bool {
        self.include.iter().any(|k| header.contains(k))
            && !self.exclude.iter().any(|k| header.contains(k))
    }
}

/// Resolved field -> column index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    fields: HashMap<&'static str, usize>,
}

impl ColumnMap {
    pub fn get(&self, field: &str) -> Option<usize> {
        self.fields.get(field).copied()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn require(
        &self,
        table: &'static str,
        field: &'static str,
        columns: &[String],
    ) -> Result<usize, NormalizeError> {
        self.get(field).ok_or_else(|| NormalizeError::MissingColumn {
            table,
            field,
            columns: columns.to_vec(),
        })
    }
}

/// Resolve fields against headers.
///
/// Rules are applied in order; each picks the first header it matches that no
/// earlier rule has claimed. Several rules may target the same field to express
/// a preference (the first one that finds a header wins).
pub fn resolve_columns(columns: &[String], rules: &[ColumnRule]) -> ColumnMap {
    let mut map = ColumnMap::default();
    let mut claimed = vec![false; columns.len()];

    for rule in rules {
        if map.contains(rule.field) {
            continue;
        }
        let found = columns
            .iter()
            .enumerate()
            .find(|(i, header)| !claimed[*i] && rule.matches(header));

        if let Some((i, _)) = found {
            claimed[i] = true;
            map.fields.insert(rule.field, i);
        }
    }

    map
}

/// Coerce a cell to a decimal. Placeholders (`-`, empty) and junk are missing,
/// never errors.
pub fn cell_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(Decimal::from(i));
            }
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
                .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))
        }
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_end_matches('%')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            if cleaned.is_empty() || cleaned.chars().all(|c| c == '-') {
                return None;
            }
            Decimal::from_str(&cleaned)
                .or_else(|_| Decimal::from_scientific(&cleaned))
                .ok()
        }
        _ => None,
    }
}

/// Coerce a cell to text; null and blank are missing
pub fn cell_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exclude_keeps_underlying_columns_apart() {
        let columns = headers(&["正股代码", "转债代码", "正股名称", "转债名称"]);
        let rules = [
            ColumnRule::new("symbol", &["代码"], &["正股"]),
            ColumnRule::new("name", &["名称"], &["正股"]),
            ColumnRule::new("stock_code", &["正股代码"], &[]),
        ];
        let map = resolve_columns(&columns, &rules);

        assert_eq!(map.get("symbol"), Some(1));
        assert_eq!(map.get("name"), Some(3));
        assert_eq!(map.get("stock_code"), Some(0));
    }

    #[test]
    fn test_preference_rules() {
        let columns = headers(&["纯债溢价率", "转股溢价率"]);
        let rules = [
            ColumnRule::new("premium_rate", &["转股溢价率"], &[]),
            ColumnRule::new("premium_rate", &["溢价率"], &[]),
        ];
        let map = resolve_columns(&columns, &rules);
        assert_eq!(map.get("premium_rate"), Some(1));

        // fallback when the preferred header is absent
        let map = resolve_columns(&headers(&["溢价率"]), &rules);
        assert_eq!(map.get("premium_rate"), Some(0));
    }

    #[test]
    fn test_claimed_header_not_reused() {
        let columns = headers(&["基金代码"]);
        let rules = [
            ColumnRule::new("symbol", &["代码"], &[]),
            ColumnRule::new("other", &["基金"], &[]),
        ];
        let map = resolve_columns(&columns, &rules);
        assert_eq!(map.get("symbol"), Some(0));
        assert_eq!(map.get("other"), None);
    }

    #[test]
    fn test_require_reports_columns() {
        let columns = headers(&["名称"]);
        let map = resolve_columns(&columns, &[ColumnRule::new("price", &["最新价"], &[])]);
        let err = map.require("lof_spot", "price", &columns).unwrap_err();
        assert!(err.to_string().contains("price"));
        assert!(err.to_string().contains("名称"));
    }

    #[test]
    fn test_cell_decimal() {
        assert_eq!(cell_decimal(&json!(1.52)), Some(dec!(1.52)));
        assert_eq!(cell_decimal(&json!(35000000)), Some(dec!(35000000)));
        assert_eq!(cell_decimal(&json!("1.4100")), Some(dec!(1.4100)));
        assert_eq!(cell_decimal(&json!(" 12.5% ")), Some(dec!(12.5)));
        assert_eq!(cell_decimal(&json!("1,234.5")), Some(dec!(1234.5)));
        assert_eq!(cell_decimal(&json!("-")), None);
        assert_eq!(cell_decimal(&json!("--")), None);
        assert_eq!(cell_decimal(&json!("")), None);
        assert_eq!(cell_decimal(&json!("停牌")), None);
        assert_eq!(cell_decimal(&Value::Null), None);
    }

    #[test]
    fn test_cell_string() {
        assert_eq!(cell_string(&json!(" 161226 ")), Some("161226".to_string()));
        assert_eq!(cell_string(&json!(204001)), Some("204001".to_string()));
        assert_eq!(cell_string(&json!("  ")), None);
        assert_eq!(cell_string(&Value::Null), None);
    }
}
