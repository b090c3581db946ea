use crate::data::{FundQuote, IpoCalendar};
use crate::report::table::render_table;
use crate::strategy::{should_show_repo, BondPick, LofOpportunity, RepoOpportunity};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

const RULE_WIDTH: usize = 30;
const TOP_N: usize = 10;
const NAME_CHARS: usize = 6;

/// New stocks priced above this often break issue on listing
const HIGH_ISSUE_PRICE: Decimal = dec!(50);

/// Everything one report needs
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub today: NaiveDate,
    pub ipo: &'a IpoCalendar,
    pub repo: &'a [RepoOpportunity],
    /// All normalized funds, used for the market-wide top list
    pub funds: &'a [FundQuote],
    pub lof_opportunities: &'a [LofOpportunity],
    pub bond_picks: &'a [BondPick],
    pub cost_rate: Decimal,
    pub repo_rate_above: Decimal,
}

fn rule() -> String {
    "-".repeat(RULE_WIDTH)
}

/// Assemble the plain-text report pushed to the chat group
pub fn format_text_report(input: &ReportInput<'_>) -> String {
    let mut lines: Vec<String> = Vec::new();

    write_ipo(&mut lines, input.ipo);
    write_repo(&mut lines, input);
    write_lof_opportunities(&mut lines, input.lof_opportunities, input.cost_rate);
    write_lof_top(&mut lines, input.funds);
    write_bonds(&mut lines, input.bond_picks);

    lines.push(String::new());
    lines.push("⚠️ 风险提示：".to_string());
    lines.push("1. QDII/商品LOF参考值有滞后，操作前请对照期货走势。".to_string());
    lines.push("2. 转债避免追高价妖债，留意强赎风险。".to_string());

    lines.join("\n")
}

fn write_ipo(lines: &mut Vec<String>, ipo: &IpoCalendar) {
    if ipo.is_empty() {
        lines.push("📅 今日无新股/新债申购。".to_string());
        lines.push(String::new());
        return;
    }

    lines.push("📅 【今日打新提醒】".to_string());
    lines.push("💡 坚持申购，中签就是白赚！".to_string());
    lines.push(rule());

    for bond in &ipo.bonds {
        lines.push(format!("🎁 [新债] {} ({})", bond.name, bond.code));
        lines.push("   申购建议: 顶格申购，几乎无风险".to_string());
    }
    if !ipo.bonds.is_empty() && !ipo.stocks.is_empty() {
        lines.push("- - - -".to_string());
    }

    for stock in &ipo.stocks {
        let price = Decimal::from_str(stock.price.trim()).unwrap_or(Decimal::ZERO);
        lines.push(format!("🎰 [新股] {} ({})", stock.name, stock.code));
        lines.push(format!("   发行价: {}元", stock.price));

        if price > HIGH_ISSUE_PRICE {
            lines.push("   ⚠️ 提示: 高价新股，注意破发风险！".to_string());
        } else if stock.name.starts_with('C') || stock.name.starts_with('N') {
            lines.push("   ⚠️ 提示: 上市前5日无涨跌幅限制，波动极大。".to_string());
        } else {
            lines.push("   建议: 积极申购".to_string());
        }
    }

    lines.push(String::new());
}

fn write_repo(lines: &mut Vec<String>, input: &ReportInput<'_>) {
    if !should_show_repo(input.repo, input.today, input.repo_rate_above) {
        return;
    }

    lines.push("💰 【闲钱理财 · 国债逆回购】".to_string());
    lines.push("💡 操作：选择【卖出】(把钱借出去)".to_string());
    lines.push(rule());

    for item in input.repo {
        lines.push(format!("👉 {} ({})", item.name, item.code));
        lines.push(format!("   年化利率: {}% {}", item.rate, item.tag));
        lines.push(format!("   每10万收益: 约 {}", item.income_text()));
        lines.push(format!("   📝 {}", item.advice));
        lines.push(rule());
    }
    lines.push(String::new());
}

fn write_lof_opportunities(lines: &mut Vec<String>, opportunities: &[LofOpportunity], cost_rate: Decimal) {
    if opportunities.is_empty() {
        lines.push("😴 今日无符合策略的高溢价 LOF 机会。".to_string());
        lines.push(String::new());
        return;
    }

    lines.push("🚀 【LOF 高价值套利机会】".to_string());
    lines.push(format!("💡 扣费标准: {}% | 务必先试单，留意限购", cost_rate));
    lines.push(rule());

    for item in opportunities {
        lines.push(format!("👉 {} ({}) {}", item.name, item.code, item.tag));
        lines.push(format!("   现价: {} | 溢价率: {:.2}%", item.price, item.premium));
        lines.push(format!("   💰 净利(扣费): {:.2}%", item.net_premium));
        lines.push(format!("   📝 建议: {}", item.advice));
        lines.push(rule());
    }
    lines.push(String::new());
}

fn write_lof_top(lines: &mut Vec<String>, funds: &[FundQuote]) {
    lines.push(format!("📊 【LOF 溢价率 Top {}】", TOP_N));

    if funds.is_empty() {
        lines.push("暂无 LOF 数据。".to_string());
        return;
    }

    let mut ranked: Vec<&FundQuote> = funds.iter().collect();
    ranked.sort_by(|a, b| b.premium_rate.cmp(&a.premium_rate));

    let rows: Vec<Vec<String>> = ranked
        .iter()
        .take(TOP_N)
        .map(|q| {
            let turnover = q
                .volume
                .and_then(|v| (v / dec!(10000)).trunc().to_i64())
                .map(|w| format!("{}万", w))
                .unwrap_or_else(|| "-".to_string());
            vec![
                q.symbol.clone(),
                q.name.chars().take(NAME_CHARS).collect(),
                q.price.to_string(),
                format!("{:.2}%", q.premium_rate),
                turnover,
            ]
        })
        .collect();

    lines.push(render_table(&["代码", "名称", "现价", "溢价", "成交"], &rows));
}

fn write_bonds(lines: &mut Vec<String>, picks: &[BondPick]) {
    if picks.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("=".repeat(RULE_WIDTH));
    lines.push(format!("🐢 【可转债 · 双低策略 Top {}】", picks.len()));
    lines.push("💡 逻辑: 价格+溢价率 (越低越安全)".to_string());
    lines.push(rule());

    let rows: Vec<Vec<String>> = picks
        .iter()
        .map(|p| {
            vec![
                p.name.clone(),
                p.price.to_string(),
                format!("{:.2}%", p.premium),
                format!("{:.2}", p.double_low),
            ]
        })
        .collect();
    lines.push(render_table(&["名称", "价格", "溢价率", "双低值"], &rows));

    let with_news: Vec<&BondPick> = picks.iter().filter(|p| p.news.is_some()).collect();
    if !with_news.is_empty() {
        lines.push(String::new());
        lines.push("📰 【近期重要公告】".to_string());
        for pick in with_news {
            if let Some(news) = &pick.news {
                lines.push(format!("• {}: {} {}", pick.name, news, pick.advice));
            }
        }
    }

    lines.push(String::new());
    lines.push("📝 说明：双低值通常 <130 较安全，适合分散持有。".to_string());
}
