use crate::data::{
    ipo_for_date, normalize_bonds, normalize_funds, normalize_repo, parse_notices, FundQuote, IpoCalendar,
};
use crate::exchange::{EastmoneyClient, RawTable};
use crate::notify::{Delivery, WeComNotifier};
use crate::report::{format_text_report, ReportInput};
use crate::strategy::{
    analyze_repo, apply_notice, filter_opportunities, find_revision_notice, select_double_low, should_show_repo,
    BondPick, RepoOpportunity,
};
use crate::utils::config::{Config, FeedEndpoint};
use anyhow::Context;
use chrono::{FixedOffset, NaiveDate, Utc};
use tracing::{debug, info, warn};

/// China Standard Time, the exchanges' clock
const CST_OFFSET_SECS: i32 = 8 * 3600;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Trading day the report is about
    pub today: NaiveDate,
    /// Print the report instead of pushing it
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            today: market_today(),
            dry_run: false,
        }
    }
}

/// What one run found and did
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub ipo_items: usize,
    pub repo_opportunities: usize,
    /// Whether the repo section makes it into the report
    pub repo_shown: bool,
    pub funds: usize,
    pub lof_opportunities: usize,
    pub bond_picks: usize,
    /// Rendered report, `None` on a quiet day
    pub report: Option<String>,
    /// `None` when nothing was pushed (quiet day or dry run)
    pub delivery: Option<Delivery>,
}

impl RunSummary {
    pub fn has_content(&self) -> bool {
        self.ipo_items > 0 || self.repo_shown || self.lof_opportunities > 0 || self.bond_picks > 0
    }
}

/// Current date on the exchanges' clock
pub fn market_today() -> NaiveDate {
    match FixedOffset::east_opt(CST_OFFSET_SECS) {
        Some(cst) => Utc::now().with_timezone(&cst).date_naive(),
        None => Utc::now().date_naive(),
    }
}

/// Fetch every feed, derive the signals and push the report.
///
/// A failing feed only empties its own section. Errors are returned for
/// client construction and notification failures.
pub async fn run(config: &Config, options: &RunOptions) -> anyhow::Result<RunSummary> {
    let client = EastmoneyClient::new(&config.http).context("failed to build feed client")?;
    let today = options.today;
    info!("Running premium watch for {}", today);

    // 1. IPO calendar
    let ipo = collect_ipo(&client, config, today).await;
    info!("✓ IPO: {} subscriptions today", ipo.len());

    // 2. Reverse repo
    let repo = collect_repo(&client, config, today).await;
    info!("✓ Repo: {} quotes", repo.len());

    // 3. LOF premiums
    let funds = collect_funds(&client, config).await;
    let lof_opportunities = filter_opportunities(&funds, &config.watchlist.funds, &config.thresholds);
    info!(
        "✓ LOF: {} funds merged, {} above threshold",
        funds.len(),
        lof_opportunities.len()
    );

    // 4. Convertible double-low with revision notices
    let bond_picks = collect_bonds(&client, config, today).await;
    info!("✓ Convertible: {} picks", bond_picks.len());

    let mut summary = RunSummary {
        ipo_items: ipo.len(),
        repo_opportunities: repo.len(),
        repo_shown: should_show_repo(&repo, today, config.repo.show_rate_above),
        funds: funds.len(),
        lof_opportunities: lof_opportunities.len(),
        bond_picks: bond_picks.len(),
        report: None,
        delivery: None,
    };

    if !summary.has_content() {
        info!("Quiet day: nothing to report, skipping notification");
        return Ok(summary);
    }

    let report = format_text_report(&ReportInput {
        today,
        ipo: &ipo,
        repo: &repo,
        funds: &funds,
        lof_opportunities: &lof_opportunities,
        bond_picks: &bond_picks,
        cost_rate: config.thresholds.cost_rate_pct,
        repo_rate_above: config.repo.show_rate_above,
    });

    if options.dry_run {
        println!("【{}】\n\n{}", config.general.report_title, report);
        info!("Dry run: webhook skipped");
    } else {
        let notifier = WeComNotifier::new(&config.notify).context("failed to build notifier")?;
        let delivery = notifier
            .send(&config.general.report_title, &report)
            .await
            .context("failed to deliver report")?;
        info!("✓ Notification: {:?}", delivery);
        summary.delivery = Some(delivery);
    }

    summary.report = Some(report);
    Ok(summary)
}

/// Fetch one feed; a disabled or failing feed yields `None`
async fn fetch_optional(client: &EastmoneyClient, feed: &str, endpoint: &FeedEndpoint) -> Option<RawTable> {
    match client.fetch_table(feed, endpoint).await {
        Ok(table) => Some(table),
        Err(e) if e.is_disabled() => {
            debug!("{}", e);
            None
        }
        Err(e) => {
            warn!("⚠️ {} unavailable: {}", feed, e);
            None
        }
    }
}

async fn collect_ipo(client: &EastmoneyClient, config: &Config, today: NaiveDate) -> IpoCalendar {
    let stocks = fetch_optional(client, "ipo_stocks", &config.feeds.ipo_stocks).await;
    let bonds = fetch_optional(client, "ipo_bonds", &config.feeds.ipo_bonds).await;

    ipo_for_date(stocks.as_ref(), bonds.as_ref(), today)
}

async fn collect_repo(client: &EastmoneyClient, config: &Config, today: NaiveDate) -> Vec<RepoOpportunity> {
    if !config.repo.enabled {
        return Vec::new();
    }

    let sh = fetch_optional(client, "repo_sh", &config.feeds.repo_sh).await;
    let sz = fetch_optional(client, "repo_sz", &config.feeds.repo_sz).await;
    let tables: Vec<&RawTable> = sh.iter().chain(sz.iter()).collect();

    let quotes = normalize_repo(&tables, &config.repo.codes);
    analyze_repo(&quotes, today)
}

async fn collect_funds(client: &EastmoneyClient, config: &Config) -> Vec<FundQuote> {
    let Some(spot) = fetch_optional(client, "lof_spot", &config.feeds.lof_spot).await else {
        return Vec::new();
    };
    let estimates = fetch_optional(client, "fund_estimate", &config.feeds.fund_estimate).await;
    let navs = fetch_optional(client, "fund_nav", &config.feeds.fund_nav).await;

    match normalize_funds(&spot, estimates.as_ref(), navs.as_ref()) {
        Ok(funds) => funds,
        Err(e) => {
            warn!("⚠️ LOF quotes unusable: {}", e);
            Vec::new()
        }
    }
}

async fn collect_bonds(client: &EastmoneyClient, config: &Config, today: NaiveDate) -> Vec<BondPick> {
    if !config.convertible.enabled {
        return Vec::new();
    }

    let Some(table) = fetch_optional(client, "convertible", &config.feeds.convertible).await else {
        return Vec::new();
    };
    let bonds = match normalize_bonds(&table, config.convertible.assumed_volume) {
        Ok(bonds) => bonds,
        Err(e) => {
            warn!("⚠️ Convertible quotes unusable: {}", e);
            return Vec::new();
        }
    };

    let mut picks = select_double_low(&bonds, &config.convertible);
    if !config.notices.enabled {
        return picks;
    }

    for pick in picks.iter_mut().filter(|p| !p.stock_code.is_empty()) {
        match client.fetch_notices(&config.feeds.notices, &pick.stock_code).await {
            Ok(table) => {
                let notices = parse_notices(&table);
                let news = find_revision_notice(&notices, today, &config.notices);
                apply_notice(pick, news);
            }
            Err(e) if e.is_disabled() => break,
            Err(e) => warn!("⚠️ Notices for {} unavailable: {}", pick.stock_code, e),
        }
    }

    picks
}
