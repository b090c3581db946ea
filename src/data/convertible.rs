use crate::data::columns::{cell_decimal, cell_string, resolve_columns, ColumnRule, NormalizeError};
use crate::data::types::BondQuote;
use crate::exchange::RawTable;
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// The `正股` (underlying stock) columns share keywords with the bond's own
/// columns and must not be picked for them.
const BOND_RULES: [ColumnRule; 7] = [
    ColumnRule::new("symbol", &["代码"], &["正股"]),
    ColumnRule::new("name", &["名称"], &["正股"]),
    ColumnRule::new("price", &["最新价"], &["正股"]),
    ColumnRule::new("premium_rate", &["转股溢价率"], &[]),
    ColumnRule::new("premium_rate", &["溢价率"], &[]),
    ColumnRule::new("volume", &["成交", "金额"], &["正股"]),
    ColumnRule::new("stock_code", &["正股代码"], &[]),
];

/// Normalize the convertible bond comparison table
///
/// # Arguments
/// * `table` - Raw comparison table
/// * `assumed_volume` - Turnover given to every bond when the feed has no turnover column
pub fn normalize_bonds(table: &RawTable, assumed_volume: Decimal) -> Result<Vec<BondQuote>, NormalizeError> {
    let map = resolve_columns(&table.columns, &BOND_RULES);
    let price_col = map.require("convertible", "price", &table.columns)?;
    let premium_col = map.require("convertible", "premium_rate", &table.columns)?;
    let symbol_col = map.get("symbol");
    let name_col = map.get("name");
    let volume_col = map.get("volume");
    let stock_col = map.get("stock_code");

    if volume_col.is_none() {
        warn!(
            "convertible: no turnover column, assuming {} for every bond",
            assumed_volume
        );
    }

    let text = |row: usize, col: Option<usize>| col.and_then(|c| cell_string(table.cell(row, c)));

    let mut bonds = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let (Some(price), Some(premium_rate)) = (
            cell_decimal(table.cell(row, price_col)),
            cell_decimal(table.cell(row, premium_col)),
        ) else {
            continue;
        };
        if price <= Decimal::ZERO {
            continue;
        }

        let volume = match volume_col {
            Some(col) => match cell_decimal(table.cell(row, col)) {
                Some(v) => v,
                // unparseable turnover never passes a liquidity floor
                None => Decimal::ZERO,
            },
            None => assumed_volume,
        };

        bonds.push(BondQuote {
            symbol: text(row, symbol_col).unwrap_or_default(),
            name: text(row, name_col).unwrap_or_default(),
            price,
            premium_rate,
            volume,
            stock_code: text(row, stock_col).unwrap_or_default(),
            double_low: price + premium_rate,
        });
    }

    debug!("Normalized {} convertible bonds", bonds.len());
    Ok(bonds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> RawTable {
        RawTable::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    #[test]
    fn test_normalize_comparison_table() {
        let raw = table(
            &["转债代码", "转债名称", "转债最新价", "正股代码", "正股名称", "正股最新价", "纯债溢价率", "转股溢价率", "成交额"],
            vec![
                vec![
                    json!("113001"), json!("测试转债"), json!(105.5), json!("600001"), json!("测试股份"),
                    json!(9.8), json!(20.0), json!(6.25), json!(15000000),
                ],
                vec![
                    json!("113002"), json!("停牌转债"), json!("-"), json!("600002"), json!("停牌股份"),
                    json!(5.0), json!(1.0), json!(2.0), json!(0),
                ],
            ],
        );

        let bonds = normalize_bonds(&raw, dec!(20000000)).unwrap();
        assert_eq!(bonds.len(), 1);

        let bond = &bonds[0];
        assert_eq!(bond.symbol, "113001");
        assert_eq!(bond.name, "测试转债");
        assert_eq!(bond.price, dec!(105.5));
        assert_eq!(bond.premium_rate, dec!(6.25));
        assert_eq!(bond.stock_code, "600001");
        assert_eq!(bond.volume, dec!(15000000));
        assert_eq!(bond.double_low, dec!(111.75));
    }

    #[test]
    fn test_missing_optional_columns_get_defaults() {
        let raw = table(
            &["代码", "名称", "最新价", "溢价率"],
            vec![vec![json!("123001"), json!("某转债"), json!("118.2"), json!("3.1%")]],
        );

        let bonds = normalize_bonds(&raw, dec!(20000000)).unwrap();
        assert_eq!(bonds[0].volume, dec!(20000000));
        assert_eq!(bonds[0].stock_code, "");
        assert_eq!(bonds[0].double_low, dec!(121.3));
    }

    #[test]
    fn test_unreadable_turnover_is_zero() {
        let raw = table(
            &["代码", "名称", "最新价", "转股溢价率", "成交额"],
            vec![vec![json!("123002"), json!("无量转债"), json!(101.0), json!(4.0), json!("-")]],
        );

        let bonds = normalize_bonds(&raw, dec!(20000000)).unwrap();
        assert_eq!(bonds.len(), 1);
        assert_eq!(bonds[0].volume, Decimal::ZERO);
    }

    #[test]
    fn test_missing_premium_column_is_error() {
        let raw = table(&["代码", "最新价"], vec![]);
        let err = normalize_bonds(&raw, dec!(1)).unwrap_err();
        assert!(err.to_string().contains("premium_rate"));
    }

    #[test]
    fn test_non_positive_price_dropped() {
        let raw = table(
            &["代码", "最新价", "溢价率"],
            vec![vec![json!("1"), json!(0), json!(5)], vec![json!("2"), json!(-3), json!(5)]],
        );
        assert!(normalize_bonds(&raw, dec!(1)).unwrap().is_empty());
    }
}
