use crate::data::columns::{cell_decimal, cell_string, resolve_columns, ColumnRule};
use crate::data::types::RepoQuote;
use crate::exchange::RawTable;
use tracing::warn;

const REPO_RULES: [ColumnRule; 4] = [
    ColumnRule::new("code", &["代码"], &[]),
    ColumnRule::new("name", &["名称"], &[]),
    ColumnRule::new("rate", &["最新价"], &[]),
    ColumnRule::new("change_percent", &["涨跌幅"], &[]),
];

/// Pick the configured repo codes out of the exchange tables (Shanghai then
/// Shenzhen). Output keeps table order.
pub fn normalize_repo(tables: &[&RawTable], codes: &[String]) -> Vec<RepoQuote> {
    let mut quotes = Vec::new();

    for table in tables {
        let map = resolve_columns(&table.columns, &REPO_RULES);
        let Some(code_col) = map.get("code") else {
            warn!("repo: no code column in {:?}", table.columns);
            continue;
        };

        for row in 0..table.len() {
            let Some(code) = cell_string(table.cell(row, code_col)) else {
                continue;
            };
            if !codes.iter().any(|c| *c == code) {
                continue;
            }

            quotes.push(RepoQuote {
                name: map
                    .get("name")
                    .and_then(|c| cell_string(table.cell(row, c)))
                    .unwrap_or_else(|| code.clone()),
                rate: map.get("rate").and_then(|c| cell_decimal(table.cell(row, c))),
                change_percent: map
                    .get("change_percent")
                    .and_then(|c| cell_decimal(table.cell(row, c))),
                code,
            });
        }
    }

    quotes
}
