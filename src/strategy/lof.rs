use crate::data::{FundClass, FundQuote, ValuationSource};
use crate::utils::config::{ThresholdConfig, WatchEntry};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Commodity LOFs track futures; their NAV lags the market by a session
const COMMODITY_CODES: [&str; 1] = ["161226"];
const COMMODITY_KEYWORDS: [&str; 2] = ["白银", "黄金"];
const QDII_KEYWORDS: [&str; 5] = ["QDII", "标普", "纳指", "恒生", "教育"];

/// Fund category as inferred from its code and name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskTag {
    Commodity,
    Qdii,
    Ordinary,
}

impl fmt::Display for RiskTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTag::Commodity => write!(f, "[商品基]"),
            RiskTag::Qdii => write!(f, "[QDII]"),
            RiskTag::Ordinary => write!(f, "[普通]"),
        }
    }
}

impl RiskTag {
    pub fn classify(code: &str, name: &str) -> Self {
        if COMMODITY_CODES.iter().any(|c| code.contains(c))
            || COMMODITY_KEYWORDS.iter().any(|k| name.contains(k))
        {
            RiskTag::Commodity
        } else if QDII_KEYWORDS.iter().any(|k| name.contains(k)) {
            RiskTag::Qdii
        } else {
            RiskTag::Ordinary
        }
    }
}

/// Net premium and a human verdict for one fund
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundAnalysis {
    /// Premium after round-trip cost, 2 dp
    pub net_premium: Decimal,
    pub tag: RiskTag,
    pub advice: String,
}

/// A watchlist fund whose premium cleared its threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LofOpportunity {
    pub code: String,
    pub name: String,
    pub class: FundClass,
    pub price: Decimal,
    /// 2 dp
    pub premium: Decimal,
    /// Turnover in yuan, truncated
    pub volume: u64,
    pub tag: RiskTag,
    pub net_premium: Decimal,
    pub advice: String,
}

/// Judge a single fund
///
/// # Arguments
/// * `quote` - Normalized fund record
/// * `cost_rate` - Round-trip cost in percent
pub fn analyze_fund(quote: &FundQuote, cost_rate: Decimal) -> FundAnalysis {
    let premium = quote.premium_rate;
    let net_premium = (premium - cost_rate).round_dp(2);
    let tag = RiskTag::classify(&quote.symbol, &quote.name);

    let advice = match tag {
        RiskTag::Commodity if premium > dec!(10) => {
            "⚠️ 溢价极高，申购通常限额约100元，先小额试单，适合小资金多账户参与。".to_string()
        }
        RiskTag::Commodity => match (&quote.source, &quote.nav_date) {
            (ValuationSource::OfficialNav, Some(date)) => format!(
                "⚠️ 参考值为{}官方净值，请自行扣除今日商品期货涨跌幅后再判断。",
                date
            ),
            _ => "⚠️ 参考值可能滞后，请自行扣除今日商品期货涨跌幅后再判断。".to_string(),
        },
        RiskTag::Qdii if net_premium > dec!(2.5) => {
            "🔥 重点关注！收盘前确认美股期货没有大跌，T+2到账风险较高。".to_string()
        }
        RiskTag::Qdii if net_premium > dec!(1.0) => {
            "😐 扣费后空间有限，除非看好今晚美股上涨，否则不建议操作。".to_string()
        }
        RiskTag::Qdii => "❌ 扣除费用和T+2风险后期望为负，放弃。".to_string(),
        RiskTag::Ordinary => "留意流动性，成交额过低可能卖不出去。".to_string(),
    };

    FundAnalysis {
        net_premium,
        tag,
        advice,
    }
}

/// Walk the watchlist and keep the funds priced above their threshold.
/// Sorted by premium, highest first.
pub fn filter_opportunities(
    quotes: &[FundQuote],
    watchlist: &[WatchEntry],
    thresholds: &ThresholdConfig,
) -> Vec<LofOpportunity> {
    let mut opportunities = Vec::new();

    for entry in watchlist {
        let Some(quote) = quotes.iter().find(|q| q.symbol == entry.code) else {
            warn!("Watchlist fund {} not found in merged quotes", entry.code);
            continue;
        };

        let volume = quote.volume.unwrap_or(Decimal::ZERO);
        if volume < thresholds.min_volume {
            debug!(
                "{} turnover {} below minimum {}",
                entry.code, volume, thresholds.min_volume
            );
            continue;
        }

        let threshold = thresholds.premium_threshold(entry.class);
        if quote.premium_rate <= threshold {
            debug!(
                "{} premium {:.2}% not above {}%",
                entry.code, quote.premium_rate, threshold
            );
            continue;
        }

        let analysis = analyze_fund(quote, thresholds.cost_rate_pct);
        opportunities.push(LofOpportunity {
            code: entry.code.clone(),
            name: quote.name.clone(),
            class: entry.class,
            price: quote.price,
            premium: quote.premium_rate.round_dp(2),
            volume: volume.trunc().to_u64().unwrap_or(0),
            tag: analysis.tag,
            net_premium: analysis.net_premium,
            advice: analysis.advice,
        });
    }

    opportunities.sort_by(|a, b| b.premium.cmp(&a.premium));
    opportunities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(symbol: &str, name: &str, price: Decimal, reference: Decimal, volume: Option<Decimal>) -> FundQuote {
        FundQuote {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            volume,
            iopv_realtime: Some(reference),
            nav_official: None,
            nav_date: None,
            reference_value: reference,
            source: ValuationSource::Realtime,
            premium_rate: crate::data::premium_rate(price, reference).unwrap(),
        }
    }

    fn entry(code: &str, class: FundClass) -> WatchEntry {
        WatchEntry {
            code: code.to_string(),
            class,
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(RiskTag::classify("161226", "国投白银LOF"), RiskTag::Commodity);
        assert_eq!(RiskTag::classify("160719", "嘉实黄金"), RiskTag::Commodity);
        assert_eq!(RiskTag::classify("161128", "标普信息科技LOF"), RiskTag::Qdii);
        assert_eq!(RiskTag::classify("164906", "中概互联QDII"), RiskTag::Qdii);
        assert_eq!(RiskTag::classify("163406", "兴全合润LOF"), RiskTag::Ordinary);
    }

    #[test]
    fn test_analyze_qdii_bands() {
        let cost = dec!(0.6);

        let hot = analyze_fund(&quote("161128", "标普科技", dec!(1.04), dec!(1.00), None), cost);
        assert_eq!(hot.net_premium, dec!(3.40));
        assert!(hot.advice.starts_with("🔥"));

        let meh = analyze_fund(&quote("161128", "标普科技", dec!(1.02), dec!(1.00), None), cost);
        assert_eq!(meh.net_premium, dec!(1.40));
        assert!(meh.advice.starts_with("😐"));

        let none = analyze_fund(&quote("161128", "标普科技", dec!(1.01), dec!(1.00), None), cost);
        assert!(none.advice.starts_with("❌"));
    }

    #[test]
    fn test_analyze_commodity_uses_nav_date() {
        let mut silver = quote("161226", "国投白银LOF", dec!(1.05), dec!(1.00), None);
        silver.source = ValuationSource::OfficialNav;
        silver.nav_date = Some("2024-01-01".to_string());

        let analysis = analyze_fund(&silver, dec!(0.6));
        assert_eq!(analysis.tag, RiskTag::Commodity);
        assert!(analysis.advice.contains("2024-01-01"));

        let spike = analyze_fund(&quote("161226", "国投白银LOF", dec!(1.20), dec!(1.00), None), dec!(0.6));
        assert!(spike.advice.contains("限额"));
    }

    #[test]
    fn test_filter_thresholds_and_order() {
        let quotes = vec![
            quote("161226", "国投白银LOF", dec!(1.05), dec!(1.00), Some(dec!(50000000))),
            quote("161128", "标普科技", dec!(1.025), dec!(1.00), Some(dec!(3000000.7))),
            quote("161130", "纳指100", dec!(1.01), dec!(1.00), Some(dec!(9000000))),
            quote("160216", "国泰商品", dec!(1.10), dec!(1.00), Some(dec!(999))),
            quote("501018", "南方原油", dec!(1.10), dec!(1.00), None),
        ];
        let watchlist = vec![
            entry("161128", FundClass::Qdii),
            entry("161226", FundClass::Local),
            entry("161130", FundClass::Qdii),
            entry("160216", FundClass::Qdii),
            entry("501018", FundClass::Qdii),
            entry("999999", FundClass::Local),
        ];
        let thresholds = ThresholdConfig::default();

        let opps = filter_opportunities(&quotes, &watchlist, &thresholds);

        // 161130 under 2%, 160216 illiquid, 501018 no turnover, 999999 absent
        assert_eq!(opps.len(), 2);
        assert_eq!(opps[0].code, "161226");
        assert_eq!(opps[0].premium, dec!(5.00));
        assert_eq!(opps[1].code, "161128");
        assert_eq!(opps[1].volume, 3000000);
        assert_eq!(opps[1].class, FundClass::Qdii);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let quotes = vec![quote("161128", "标普科技", dec!(1.02), dec!(1.00), Some(dec!(5000000)))];
        let watchlist = vec![entry("161128", FundClass::Qdii)];
        assert!(filter_opportunities(&quotes, &watchlist, &ThresholdConfig::default()).is_empty());
    }
}
