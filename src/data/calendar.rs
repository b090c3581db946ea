use crate::data::columns::{cell_string, resolve_columns, ColumnRule};
use crate::data::types::{IpoCalendar, IpoItem, Notice};
use crate::exchange::RawTable;
use chrono::NaiveDate;

const STOCK_RULES: [ColumnRule; 4] = [
    ColumnRule::new("code", &["证券代码", "股票代码"], &[]),
    ColumnRule::new("name", &["证券简称", "股票简称"], &[]),
    ColumnRule::new("date", &["申购日期"], &[]),
    ColumnRule::new("price", &["发行价"], &[]),
];

const BOND_RULES: [ColumnRule; 3] = [
    ColumnRule::new("code", &["债券代码"], &[]),
    ColumnRule::new("name", &["债券简称"], &[]),
    ColumnRule::new("date", &["申购日期"], &[]),
];

const NOTICE_RULES: [ColumnRule; 2] = [
    ColumnRule::new("title", &["标题", "title"], &[]),
    ColumnRule::new("date", &["日期", "时间", "date", "time"], &[]),
];

/// Fixed face value of a new convertible bond
const BOND_SUBSCRIPTION_PRICE: &str = "100.00";

/// Subscriptions opening on `date`. A table without a `申购日期` column
/// contributes nothing.
pub fn ipo_for_date(stocks: Option<&RawTable>, bonds: Option<&RawTable>, date: NaiveDate) -> IpoCalendar {
    let day = date.format("%Y-%m-%d").to_string();

    IpoCalendar {
        stocks: stocks
            .map(|t| subscriptions(t, &STOCK_RULES, &day, |price| price.unwrap_or_else(|| "0".to_string())))
            .unwrap_or_default(),
        bonds: bonds
            .map(|t| subscriptions(t, &BOND_RULES, &day, |_| BOND_SUBSCRIPTION_PRICE.to_string()))
            .unwrap_or_default(),
    }
}

fn subscriptions(
    table: &RawTable,
    rules: &[ColumnRule],
    day: &str,
    price: impl Fn(Option<String>) -> String,
) -> Vec<IpoItem> {
    let map = resolve_columns(&table.columns, rules);
    let Some(date_col) = map.get("date") else {
        return Vec::new();
    };
    let text = |row: usize, field: &str| map.get(field).and_then(|c| cell_string(table.cell(row, c)));

    (0..table.len())
        .filter(|&row| {
            cell_string(table.cell(row, date_col))
                .map(|d| date_prefix(&d) == day)
                .unwrap_or(false)
        })
        .map(|row| IpoItem {
            code: text(row, "code").unwrap_or_else(|| "N/A".to_string()),
            name: text(row, "name").unwrap_or_else(|| "N/A".to_string()),
            price: price(text(row, "price")),
        })
        .collect()
}

/// `2024-01-02 00:00:00` -> `2024-01-02`
fn date_prefix(raw: &str) -> &str {
    raw.get(..10).unwrap_or(raw)
}

/// Announcement headlines, newest first as delivered
pub fn parse_notices(table: &RawTable) -> Vec<Notice> {
    let map = resolve_columns(&table.columns, &NOTICE_RULES);
    let Some(title_col) = map.get("title") else {
        return Vec::new();
    };
    let date_col = map.get("date");

    (0..table.len())
        .filter_map(|row| {
            let title = cell_string(table.cell(row, title_col))?;
            let date = date_col
                .and_then(|c| cell_string(table.cell(row, c)))
                .map(|d| date_prefix(&d).to_string())
                .unwrap_or_default();
            Some(Notice { date, title })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(columns: &[&str], rows: Vec<Vec<serde_json::Value>>) -> RawTable {
        RawTable::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn test_stocks_for_today() {
        let stocks = table(
            &["证券代码", "证券简称", "申购日期", "发行价"],
            vec![
                vec![json!("301001"), json!("N测试"), json!("2024-01-02 00:00:00"), json!(56.8)],
                vec![json!("301002"), json!("昨日股"), json!("2024-01-01 00:00:00"), json!(10)],
                vec![json!("301003"), json!("未定价"), json!("2024-01-02"), json!(null)],
            ],
        );

        let calendar = ipo_for_date(Some(&stocks), None, day());
        assert_eq!(calendar.stocks.len(), 2);
        assert_eq!(calendar.stocks[0].price, "56.8");
        assert_eq!(calendar.stocks[1].price, "0");
        assert!(calendar.bonds.is_empty());
    }

    #[test]
    fn test_bonds_use_face_value() {
        let bonds = table(
            &["债券代码", "债券简称", "申购日期"],
            vec![vec![json!("754001"), json!("测试发债"), json!("2024-01-02")]],
        );
        let calendar = ipo_for_date(None, Some(&bonds), day());
        assert_eq!(calendar.bonds[0].price, "100.00");
        assert_eq!(calendar.bonds[0].name, "测试发债");
    }

    #[test]
    fn test_missing_name_shows_placeholder() {
        let bonds = table(&["申购日期"], vec![vec![json!("2024-01-02")]]);
        let calendar = ipo_for_date(None, Some(&bonds), day());
        assert_eq!(calendar.bonds[0].code, "N/A");
        assert_eq!(calendar.bonds[0].name, "N/A");
    }

    #[test]
    fn test_no_date_column() {
        let stocks = table(&["证券代码"], vec![vec![json!("301001")]]);
        assert!(ipo_for_date(Some(&stocks), None, day()).is_empty());
    }

    #[test]
    fn test_parse_notices() {
        let notices = table(
            &["公告标题", "公告日期"],
            vec![
                vec![json!("关于不向下修正转股价格的公告"), json!("2024-01-02 00:00:00")],
                vec![json!(null), json!("2024-01-01")],
            ],
        );
        let parsed = parse_notices(&notices);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].date, "2024-01-02");
    }
}
