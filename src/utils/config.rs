use crate::data::FundClass;
use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Environment prefix for overrides, e.g. `PREMIUM_WATCH__THRESHOLDS__MIN_VOLUME`
pub const ENV_PREFIX: &str = "PREMIUM_WATCH";

/// Notices older than a year are never relevant to a revision headline
const MAX_LOOKBACK_DAYS: i64 = 366;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub watchlist: WatchlistConfig,
    pub thresholds: ThresholdConfig,
    pub convertible: ConvertibleConfig,
    pub repo: RepoConfig,
    pub notices: NoticeConfig,
    pub feeds: FeedsConfig,
    pub http: HttpConfig,
    pub notify: NotifyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Title of the pushed message
    pub report_title: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            report_title: "A股投资日报".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub code: String,
    pub class: FundClass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistConfig {
    pub funds: Vec<WatchEntry>,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        let entry = |code: &str, class| WatchEntry {
            code: code.to_string(),
            class,
        };
        Self {
            funds: vec![
                entry("161226", FundClass::Local),
                entry("161128", FundClass::Qdii),
                entry("161130", FundClass::Qdii),
                entry("164906", FundClass::Qdii),
                entry("160216", FundClass::Qdii),
                entry("501018", FundClass::Qdii),
            ],
        }
    }
}

/// LOF thresholds, all percentages in percent units (2.0 = 2%)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub qdii_premium_pct: Decimal,
    pub local_premium_pct: Decimal,
    /// Minimum turnover in yuan
    pub min_volume: Decimal,
    /// Round-trip cost of a subscribe-and-sell arbitrage
    pub cost_rate_pct: Decimal,
}

impl ThresholdConfig {
    /// Premium threshold for a watchlist class
    pub fn premium_threshold(&self, class: FundClass) -> Decimal {
        match class {
            FundClass::Qdii => self.qdii_premium_pct,
            FundClass::Local => self.local_premium_pct,
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            qdii_premium_pct: dec!(2.0),
            local_premium_pct: dec!(3.0),
            min_volume: dec!(1000000),
            cost_rate_pct: dec!(0.6),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertibleConfig {
    pub enabled: bool,
    /// How many double-low picks to report
    pub limit: usize,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub min_volume: Decimal,
    /// Turnover assumed when the feed carries no turnover column
    pub assumed_volume: Decimal,
}

impl Default for ConvertibleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 5,
            min_price: dec!(90),
            max_price: dec!(130),
            min_volume: dec!(10000000),
            assumed_volume: dec!(20000000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub enabled: bool,
    /// GC001 (Shanghai) and R-001 (Shenzhen) by default
    pub codes: Vec<String>,
    /// Show the repo section when any rate exceeds this, or on Thursdays
    pub show_rate_above: Decimal,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            codes: vec!["204001".to_string(), "131810".to_string()],
            show_rate_above: dec!(2.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    pub enabled: bool,
    pub lookback_days: i64,
    /// Only the newest N notices are scanned
    pub max_items: usize,
    pub keywords: Vec<String>,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lookback_days: 7,
            max_items: 10,
            keywords: ["向下修正", "下修", "不修正", "不向下"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// One HTTP JSON feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedEndpoint {
    /// Empty disables the feed. `{code}` is substituted for per-stock feeds.
    pub url: String,
    pub referer: String,
    /// Raw field key -> header, e.g. `f12` -> `代码`
    pub aliases: HashMap<String, String>,
    /// Header names for positional rows
    pub columns: Vec<String>,
}

impl FeedEndpoint {
    fn new(url: &str, referer: &str, aliases: &[(&str, &str)]) -> Self {
        Self {
            url: url.to_string(),
            referer: referer.to_string(),
            aliases: aliases
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            columns: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

const PUSH2_QUERY: &str =
    "pn=1&pz=5000&po=1&np=1&ut=bd1d9ddb04089700cf9c27f6f7426281&fltt=2&invt=2&fid=f3";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub lof_spot: FeedEndpoint,
    pub fund_estimate: FeedEndpoint,
    pub fund_nav: FeedEndpoint,
    pub convertible: FeedEndpoint,
    pub repo_sh: FeedEndpoint,
    pub repo_sz: FeedEndpoint,
    pub ipo_stocks: FeedEndpoint,
    pub ipo_bonds: FeedEndpoint,
    pub notices: FeedEndpoint,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        let quote = [("f12", "代码"), ("f14", "名称"), ("f2", "最新价")];

        Self {
            lof_spot: FeedEndpoint::new(
                &format!(
                    "https://88.push2.eastmoney.com/api/qt/clist/get?{}&fs=b:MK0404,b:MK0405,b:MK0406,b:MK0407&fields=f12,f14,f2,f6",
                    PUSH2_QUERY
                ),
                "https://quote.eastmoney.com/",
                &[quote[0], quote[1], quote[2], ("f6", "成交额")],
            ),
            fund_estimate: FeedEndpoint::new(
                "https://api.fund.eastmoney.com/FundGuZhi/GetFundGZList?type=1&sort=3&orderType=desc&canbuy=0&pageIndex=1&pageSize=20000",
                "https://fund.eastmoney.com/",
                &[
                    ("bzdm", "基金代码"),
                    ("jjjc", "基金名称"),
                    ("gsz", "估算数据-估算值"),
                    ("gszzl", "估算数据-估算增长率"),
                    ("gxrq", "估算日期"),
                ],
            ),
            fund_nav: FeedEndpoint::new(
                "https://fundmobapi.eastmoney.com/FundMNewApi/FundMNRank?FundType=0&SortColumn=RZDF&Sort=desc&pageIndex=1&pagesize=30000&deviceid=Wap&plat=Wap&product=EFund&version=2.0.0",
                "",
                &[
                    ("FCODE", "基金代码"),
                    ("SHORTNAME", "基金简称"),
                    ("PDATE", "日期"),
                    ("DWJZ", "单位净值"),
                ],
            ),
            convertible: FeedEndpoint::new(
                &format!(
                    "https://16.push2.eastmoney.com/api/qt/clist/get?{}&fs=b:MK0354&fields=f12,f14,f2,f6,f232,f234,f237",
                    PUSH2_QUERY
                ),
                "https://quote.eastmoney.com/",
                &[
                    ("f12", "转债代码"),
                    ("f14", "转债名称"),
                    ("f2", "转债最新价"),
                    ("f6", "成交额"),
                    ("f232", "正股代码"),
                    ("f234", "正股名称"),
                    ("f237", "转股溢价率"),
                ],
            ),
            repo_sh: FeedEndpoint::new(
                &format!(
                    "https://push2.eastmoney.com/api/qt/clist/get?{}&fs=m:1+b:MK0356&fields=f12,f14,f2,f3",
                    PUSH2_QUERY
                ),
                "https://quote.eastmoney.com/",
                &[quote[0], quote[1], quote[2], ("f3", "涨跌幅")],
            ),
            repo_sz: FeedEndpoint::new(
                &format!(
                    "https://push2.eastmoney.com/api/qt/clist/get?{}&fs=m:0+b:MK0356&fields=f12,f14,f2,f3",
                    PUSH2_QUERY
                ),
                "https://quote.eastmoney.com/",
                &[quote[0], quote[1], quote[2], ("f3", "涨跌幅")],
            ),
            ipo_stocks: FeedEndpoint::new(
                "https://datacenter-web.eastmoney.com/api/data/v1/get?sortColumns=APPLY_DATE&sortTypes=-1&pageSize=50&pageNumber=1&reportName=RPTA_APP_IPOAPPLY&columns=SECURITY_CODE,SECURITY_NAME,APPLY_DATE,ISSUE_PRICE&source=WEB&client=WEB",
                "https://data.eastmoney.com/",
                &[
                    ("SECURITY_CODE", "证券代码"),
                    ("SECURITY_NAME", "证券简称"),
                    ("APPLY_DATE", "申购日期"),
                    ("ISSUE_PRICE", "发行价"),
                ],
            ),
            ipo_bonds: FeedEndpoint::new(
                "https://datacenter-web.eastmoney.com/api/data/v1/get?sortColumns=PUBLIC_START_DATE&sortTypes=-1&pageSize=50&pageNumber=1&reportName=RPT_BOND_CB_LIST&columns=SECURITY_CODE,SECURITY_NAME_ABBR,PUBLIC_START_DATE&source=WEB&client=WEB",
                "https://data.eastmoney.com/",
                &[
                    ("SECURITY_CODE", "债券代码"),
                    ("SECURITY_NAME_ABBR", "债券简称"),
                    ("PUBLIC_START_DATE", "申购日期"),
                ],
            ),
            notices: FeedEndpoint::new(
                "https://np-anotice-stock.eastmoney.com/api/security/ann?sr=-1&page_size=10&page_index=1&ann_type=A&client_source=web&stock_list={code}",
                "https://data.eastmoney.com/",
                &[("title", "公告标题"), ("notice_date", "公告日期")],
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// WeCom group robot webhook. Empty skips delivery.
    pub webhook_url: String,
    /// WeCom rejects text content above 2048 bytes
    pub max_message_bytes: usize,
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            max_message_bytes: 2048,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub output: String,
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "pretty".to_string(),
            file_path: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file layered under environment overrides.
    /// A missing file falls back to built-in defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("reading configuration {}", path.display()))?;

        let mut config: Config = settings
            .try_deserialize()
            .with_context(|| format!("parsing configuration {}", path.display()))?;

        if config.notify.webhook_url.is_empty() {
            if let Ok(url) = std::env::var("WECOM_WEBHOOK_URL") {
                config.notify.webhook_url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML string directly, without environment layering
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.watchlist.funds.is_empty() {
            bail!("watchlist.funds is empty");
        }

        let t = &self.thresholds;
        for (name, value) in [
            ("qdii_premium_pct", t.qdii_premium_pct),
            ("local_premium_pct", t.local_premium_pct),
            ("min_volume", t.min_volume),
            ("cost_rate_pct", t.cost_rate_pct),
        ] {
            if value.is_sign_negative() {
                bail!("thresholds.{} must not be negative (got {})", name, value);
            }
        }

        let cb = &self.convertible;
        if cb.min_price >= cb.max_price {
            bail!(
                "convertible.min_price {} must be below max_price {}",
                cb.min_price,
                cb.max_price
            );
        }

        if !(0..=MAX_LOOKBACK_DAYS).contains(&self.notices.lookback_days) {
            bail!(
                "notices.lookback_days must be between 0 and {} (got {})",
                MAX_LOOKBACK_DAYS,
                self.notices.lookback_days
            );
        }

        if self.notify.max_message_bytes < 256 {
            bail!("notify.max_message_bytes is too small to hold a message");
        }

        if !self.notify.webhook_url.is_empty() {
            url::Url::parse(&self.notify.webhook_url).context("notify.webhook_url is not a valid URL")?;
        }

        Ok(())
    }
}
