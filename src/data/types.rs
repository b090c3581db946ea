use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Watchlist classification; picks the premium threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundClass {
    /// Cross-border fund, settles T+2 and tracks overseas markets
    #[serde(alias = "QDII")]
    Qdii,
    /// Domestic equity or commodity fund
    #[serde(alias = "LOCAL")]
    Local,
}

/// Which reference value a fund's premium was computed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationSource {
    /// Intraday estimate (IOPV) published during trading hours
    Realtime,
    /// Last official NAV, usually from the previous trading day
    OfficialNav,
}

impl fmt::Display for ValuationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuationSource::Realtime => write!(f, "实时估值"),
            ValuationSource::OfficialNav => write!(f, "官方净值"),
        }
    }
}

/// Canonical record for one listed fund after all feeds are merged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundQuote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,

    /// Turnover in yuan. Missing when the spot feed had no value.
    pub volume: Option<Decimal>,

    pub iopv_realtime: Option<Decimal>,
    pub nav_official: Option<Decimal>,
    pub nav_date: Option<String>,

    /// Estimate if present, else official NAV
    pub reference_value: Decimal,
    pub source: ValuationSource,

    /// (price - reference) / reference * 100
    pub premium_rate: Decimal,
}

/// Convertible bond quote with its double-low score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondQuote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
    /// Conversion premium in percent
    pub premium_rate: Decimal,
    pub volume: Decimal,
    /// Underlying stock code, empty when the feed did not carry it
    pub stock_code: String,
    /// price + premium_rate
    pub double_low: Decimal,
}

/// Treasury reverse repo quote. The "price" of a repo is its annualized rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoQuote {
    pub code: String,
    pub name: String,
    pub rate: Option<Decimal>,
    pub change_percent: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpoItem {
    pub code: String,
    pub name: String,
    /// Issue price as published; kept as text because feeds mix formats
    pub price: String,
}

/// New stocks and new convertible bonds open for subscription on one day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpoCalendar {
    pub stocks: Vec<IpoItem>,
    pub bonds: Vec<IpoItem>,
}

impl IpoCalendar {
    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty() && self.bonds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stocks.len() + self.bonds.len()
    }
}

/// Company announcement headline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// `YYYY-MM-DD`
    pub date: String,
    pub title: String,
}
