use crate::data::columns::{cell_decimal, cell_string, resolve_columns, ColumnRule, NormalizeError};
use crate::data::types::{FundQuote, ValuationSource};
use crate::exchange::RawTable;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tracing::{debug, warn};

const PRICE_RULES: [ColumnRule; 4] = [
    ColumnRule::new("symbol", &["代码"], &[]),
    ColumnRule::new("name", &["名称", "简称"], &[]),
    ColumnRule::new("price", &["最新价"], &[]),
    ColumnRule::new("volume", &["成交额"], &[]),
];

const ESTIMATE_RULES: [ColumnRule; 2] = [
    ColumnRule::new("symbol", &["代码"], &[]),
    ColumnRule::new("value", &["估算值", "实时估值"], &[]),
];

const NAV_RULES: [ColumnRule; 3] = [
    ColumnRule::new("symbol", &["代码"], &[]),
    ColumnRule::new("value", &["单位净值"], &[]),
    ColumnRule::new("date", &["日期"], &[]),
];

/// References at or below this are treated as bogus
const MIN_REFERENCE: Decimal = dec!(0.001);

/// Reference value keyed by symbol, with an optional as-of date
#[derive(Debug, Default)]
struct ReferenceLookup {
    values: HashMap<String, (Decimal, Option<String>)>,
}

impl ReferenceLookup {
    /// First row per symbol wins; rows without a usable value are skipped
    fn from_table(table: &RawTable, rules: &[ColumnRule], feed: &'static str) -> Self {
        let map = resolve_columns(&table.columns, rules);
        let (Some(symbol_col), Some(value_col)) = (map.get("symbol"), map.get("value")) else {
            warn!(
                "{}: code/value columns not found in {:?}, ignoring feed",
                feed, table.columns
            );
            return Self::default();
        };
        let date_col = map.get("date");

        let mut values = HashMap::new();
        for row in 0..table.len() {
            let Some(symbol) = cell_string(table.cell(row, symbol_col)) else {
                continue;
            };
            let Some(value) = cell_decimal(table.cell(row, value_col)) else {
                continue;
            };
            let date = date_col.and_then(|col| cell_string(table.cell(row, col)));
            values.entry(symbol).or_insert((value, date));
        }

        debug!("{}: {} usable references", feed, values.len());
        Self { values }
    }

    fn get(&self, symbol: &str) -> Option<&(Decimal, Option<String>)> {
        self.values.get(symbol)
    }
}

/// Premium of a price over its reference, in percent.
/// `None` when the reference is zero or the result overflows.
pub fn premium_rate(price: Decimal, reference: Decimal) -> Option<Decimal> {
    price
        .checked_sub(reference)?
        .checked_div(reference)?
        .checked_mul(dec!(100))
}

/// Merge the spot, real-time estimate and official NAV feeds into one
/// record per listed fund.
///
/// The spot table drives the merge. Estimate and NAV tables are optional;
/// when one is missing or unrecognizable every fund falls back to the other.
/// Funds with no reference value at all are dropped.
pub fn normalize_funds(
    spot: &RawTable,
    estimates: Option<&RawTable>,
    navs: Option<&RawTable>,
) -> Result<Vec<FundQuote>, NormalizeError> {
    let map = resolve_columns(&spot.columns, &PRICE_RULES);
    let symbol_col = map.require("lof_spot", "symbol", &spot.columns)?;
    let price_col = map.require("lof_spot", "price", &spot.columns)?;
    let name_col = map.get("name");
    let volume_col = map.get("volume");

    let estimates = estimates
        .map(|t| ReferenceLookup::from_table(t, &ESTIMATE_RULES, "fund_estimate"))
        .unwrap_or_default();
    let navs = navs
        .map(|t| ReferenceLookup::from_table(t, &NAV_RULES, "fund_nav"))
        .unwrap_or_default();

    let mut quotes = Vec::with_capacity(spot.len());
    let mut unpriced = 0usize;
    let mut unreferenced = 0usize;

    for row in 0..spot.len() {
        let Some(symbol) = cell_string(spot.cell(row, symbol_col)) else {
            continue;
        };
        let price = match cell_decimal(spot.cell(row, price_col)) {
            Some(p) if p > Decimal::ZERO => p,
            _ => {
                unpriced += 1;
                continue;
            }
        };

        let name = name_col
            .and_then(|col| cell_string(spot.cell(row, col)))
            .unwrap_or_default();
        let volume = volume_col.and_then(|col| cell_decimal(spot.cell(row, col)));

        let iopv_realtime = estimates.get(&symbol).map(|(v, _)| *v);
        let nav = navs.get(&symbol);
        let nav_official = nav.map(|(v, _)| *v);
        let nav_date = nav.and_then(|(_, d)| d.clone());

        let (reference_value, source) = match (iopv_realtime, nav_official) {
            (Some(v), _) => (v, ValuationSource::Realtime),
            (None, Some(v)) => (v, ValuationSource::OfficialNav),
            (None, None) => {
                unreferenced += 1;
                continue;
            }
        };

        if reference_value <= MIN_REFERENCE {
            unreferenced += 1;
            continue;
        }
        let Some(premium) = premium_rate(price, reference_value) else {
            warn!("{}: premium of {} over {} out of range, dropped", symbol, price, reference_value);
            unreferenced += 1;
            continue;
        };

        quotes.push(FundQuote {
            premium_rate: premium,
            symbol,
            name,
            price,
            volume,
            iopv_realtime,
            nav_official,
            nav_date,
            reference_value,
            source,
        });
    }

    debug!(
        "Normalized {} funds ({} without price, {} without reference)",
        quotes.len(),
        unpriced,
        unreferenced
    );

    Ok(quotes)
}
