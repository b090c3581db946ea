use crate::data::{BondQuote, Notice};
use crate::utils::config::{ConvertibleConfig, NoticeConfig};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// A convertible bond picked by the double-low ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BondPick {
    pub code: String,
    pub name: String,
    pub stock_code: String,
    pub price: Decimal,
    pub premium: Decimal,
    pub double_low: Decimal,
    pub advice: String,
    /// Downward-revision headline, if any was found
    pub news: Option<String>,
}

/// Star rating by double-low score; lower is safer
pub fn rate_double_low(double_low: Decimal) -> &'static str {
    if double_low < dec!(115) {
        "⭐⭐⭐ 极品双低"
    } else if double_low < dec!(125) {
        "⭐⭐ 优质配置"
    } else {
        "⭐ 普通关注"
    }
}

/// Rank bonds by double-low within the price band and liquidity floor
///
/// Both price bounds are exclusive. Ties keep feed order.
pub fn select_double_low(bonds: &[BondQuote], settings: &ConvertibleConfig) -> Vec<BondPick> {
    let mut pool: Vec<&BondQuote> = bonds
        .iter()
        .filter(|b| {
            b.price > settings.min_price
                && b.price < settings.max_price
                && b.volume > settings.min_volume
        })
        .collect();

    pool.sort_by(|a, b| a.double_low.cmp(&b.double_low));

    pool.into_iter()
        .take(settings.limit)
        .map(|b| BondPick {
            code: b.symbol.clone(),
            name: b.name.clone(),
            stock_code: b.stock_code.clone(),
            price: b.price,
            premium: b.premium_rate,
            double_low: b.double_low,
            advice: rate_double_low(b.double_low).to_string(),
            news: None,
        })
        .collect()
}

/// Look for a conversion-price revision headline among recent notices.
///
/// Only the newest `max_items` notices are scanned, and only those dated
/// within `lookback_days` of `today`. Notices with unreadable dates are skipped.
pub fn find_revision_notice(notices: &[Notice], today: NaiveDate, settings: &NoticeConfig) -> Option<String> {
    let cutoff = today - Duration::days(settings.lookback_days);

    notices
        .iter()
        .take(settings.max_items)
        .filter(|n| {
            NaiveDate::parse_from_str(&n.date, "%Y-%m-%d")
                .map(|d| d >= cutoff)
                .unwrap_or(false)
        })
        .find(|n| settings.keywords.iter().any(|k| n.title.contains(k.as_str())))
        .map(|n| format!("📢 {} 公告: {}", n.date, n.title))
}

/// Attach a headline to a pick and let it override the rating.
/// A proposed revision is good news; a board decision not to revise is bad.
pub fn apply_notice(pick: &mut BondPick, news: Option<String>) {
    let Some(news) = news.filter(|n| !n.is_empty()) else {
        return;
    };

    if news.contains("向下修正") && !news.contains('不') {
        pick.advice = "🔥 突发利好！提议下修转股价！".to_string();
    } else if news.contains("不向下") || news.contains("不修正") {
        pick.advice = "❄️ 利空：公司决定不下修".to_string();
    }
    pick.news = Some(news);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bond(symbol: &str, price: Decimal, premium: Decimal, volume: Decimal) -> BondQuote {
        BondQuote {
            symbol: symbol.to_string(),
            name: format!("{}转债", symbol),
            price,
            premium_rate: premium,
            volume,
            stock_code: "600001".to_string(),
            double_low: price + premium,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn notice(date: &str, title: &str) -> Notice {
        Notice {
            date: date.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_rating_bands() {
        assert_eq!(rate_double_low(dec!(114.99)), "⭐⭐⭐ 极品双低");
        assert_eq!(rate_double_low(dec!(115)), "⭐⭐ 优质配置");
        assert_eq!(rate_double_low(dec!(125)), "⭐ 普通关注");
    }

    #[test]
    fn test_select_double_low_filters_and_ranks() {
        let bonds = vec![
            bond("A", dec!(120), dec!(10), dec!(20000000)),   // 130
            bond("B", dec!(105), dec!(5), dec!(20000000)),    // 110
            bond("C", dec!(135), dec!(1), dec!(20000000)),    // price too high
            bond("D", dec!(90), dec!(1), dec!(20000000)),     // price at bound
            bond("E", dec!(100), dec!(2), dec!(10000000)),    // illiquid at bound
            bond("F", dec!(110), dec!(8), dec!(30000000)),    // 118
        ];

        let picks = select_double_low(&bonds, &ConvertibleConfig::default());
        let codes: Vec<&str> = picks.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["B", "F", "A"]);
        assert_eq!(picks[0].advice, "⭐⭐⭐ 极品双低");
        assert_eq!(picks[2].advice, "⭐ 普通关注");
    }

    #[test]
    fn test_select_respects_limit() {
        let bonds: Vec<BondQuote> = (0..8)
            .map(|i| bond(&i.to_string(), dec!(100) + Decimal::from(i), dec!(1), dec!(20000000)))
            .collect();
        let settings = ConvertibleConfig {
            limit: 3,
            ..ConvertibleConfig::default()
        };
        let picks = select_double_low(&bonds, &settings);
        assert_eq!(picks.len(), 3);
        assert_eq!(picks[0].code, "0");
    }

    #[test]
    fn test_find_revision_notice_window() {
        let settings = NoticeConfig::default();
        let notices = vec![
            notice("2024-01-09", "2023年度业绩预告"),
            notice("2024-01-05", "关于董事会提议向下修正转股价格的公告"),
        ];
        assert_eq!(
            find_revision_notice(&notices, day(), &settings).as_deref(),
            Some("📢 2024-01-05 公告: 关于董事会提议向下修正转股价格的公告")
        );

        let stale = vec![notice("2024-01-01", "关于提议下修转股价格的公告")];
        assert_eq!(find_revision_notice(&stale, day(), &settings), None);

        let undated = vec![notice("", "关于提议下修转股价格的公告")];
        assert_eq!(find_revision_notice(&undated, day(), &settings), None);
    }

    #[test]
    fn test_find_revision_notice_only_scans_newest() {
        let settings = NoticeConfig {
            max_items: 1,
            ..NoticeConfig::default()
        };
        let notices = vec![
            notice("2024-01-09", "日常公告"),
            notice("2024-01-08", "关于不向下修正转股价格的公告"),
        ];
        assert_eq!(find_revision_notice(&notices, day(), &settings), None);
    }

    #[test]
    fn test_apply_notice_overrides_advice() {
        let bonds = vec![bond("A", dec!(105), dec!(5), dec!(20000000))];
        let mut pick = select_double_low(&bonds, &ConvertibleConfig::default()).remove(0);

        apply_notice(&mut pick, Some("📢 2024-01-02 公告: 关于提议向下修正转股价格的公告".to_string()));
        assert!(pick.advice.starts_with("🔥"));

        apply_notice(&mut pick, Some("📢 2024-01-03 公告: 关于不向下修正转股价格的公告".to_string()));
        assert!(pick.advice.starts_with("❄️"));
        assert!(pick.news.as_deref().unwrap().contains("不向下"));
    }

    #[test]
    fn test_apply_notice_without_news_keeps_rating() {
        let bonds = vec![bond("A", dec!(105), dec!(5), dec!(20000000))];
        let mut pick = select_double_low(&bonds, &ConvertibleConfig::default()).remove(0);
        apply_notice(&mut pick, None);
        apply_notice(&mut pick, Some(String::new()));
        assert_eq!(pick.advice, "⭐⭐⭐ 极品双低");
        assert_eq!(pick.news, None);
    }
}
