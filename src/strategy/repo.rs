use crate::data::RepoQuote;
use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Principal used for the income estimate
const PRINCIPAL: Decimal = dec!(100000);
const DAYS_PER_YEAR: Decimal = dec!(365);

/// Reverse repo worth mentioning, with its estimated income
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoOpportunity {
    pub code: String,
    pub name: String,
    /// Annualized, percent
    pub rate: Decimal,
    pub tag: &'static str,
    /// Days of interest earned by a 1-day repo opened today
    pub interest_days: i64,
    /// Income on 100,000 yuan for `interest_days`, 2 dp
    pub income_per_100k: Decimal,
    pub advice: String,
}

impl RepoOpportunity {
    pub fn income_text(&self) -> String {
        if self.interest_days > 1 {
            format!("{:.2}元 (计息{}天)", self.income_per_100k, self.interest_days)
        } else {
            format!("{:.2}元", self.income_per_100k)
        }
    }
}

/// A 1-day repo lent on Thursday is repaid on Friday but the cash is not
/// usable until Monday, so the exchange pays it three days of interest.
pub fn interest_days(today: NaiveDate) -> i64 {
    if today.weekday() == Weekday::Thu {
        3
    } else {
        1
    }
}

/// Rate band tag and advice for each quote that has a rate
pub fn analyze_repo(quotes: &[RepoQuote], today: NaiveDate) -> Vec<RepoOpportunity> {
    let days = interest_days(today);

    quotes
        .iter()
        .filter_map(|q| {
            let rate = q.rate?;
            let income = (PRINCIPAL * rate / dec!(100) / DAYS_PER_YEAR * Decimal::from(days)).round_dp(2);

            let (tag, mut advice) = if rate >= dec!(4) {
                ("[🔥 高息]", "利率罕见走高，闲置资金可以全部借出。".to_string())
            } else if rate >= dec!(2) {
                ("[偏高]", "利率高于活期理财，可借出闲置资金。".to_string())
            } else {
                ("[平常]", "利率平平，有闲钱可随手借出。".to_string())
            };
            if days > 1 {
                advice.push_str(" 今天借出1天期可拿周末共3天利息。");
            }

            Some(RepoOpportunity {
                code: q.code.clone(),
                name: q.name.clone(),
                rate,
                tag,
                interest_days: days,
                income_per_100k: income,
                advice,
            })
        })
        .collect()
}

/// The repo section is shown when any rate beats `rate_above`, or on Thursdays
pub fn should_show_repo(opportunities: &[RepoOpportunity], today: NaiveDate, rate_above: Decimal) -> bool {
    !opportunities.is_empty()
        && (opportunities.iter().any(|o| o.rate > rate_above) || today.weekday() == Weekday::Thu)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(code: &str, rate: Option<Decimal>) -> RepoQuote {
        RepoQuote {
            code: code.to_string(),
            name: code.to_string(),
            rate,
            change_percent: None,
        }
    }

    // 2024-01-04 was a Thursday
    fn thursday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
    }

    #[test]
    fn test_income_and_bands() {
        let opps = analyze_repo(&[quote("204001", Some(dec!(3.65))), quote("131810", None)], monday());
        assert_eq!(opps.len(), 1);
        assert_eq!(opps[0].tag, "[偏高]");
        assert_eq!(opps[0].income_per_100k, dec!(10.00));
        assert_eq!(opps[0].income_text(), "10.00元");
    }

    #[test]
    fn test_thursday_pays_three_days() {
        let opps = analyze_repo(&[quote("204001", Some(dec!(1.825)))], thursday());
        assert_eq!(opps[0].interest_days, 3);
        assert_eq!(opps[0].income_per_100k, dec!(15.00));
        assert_eq!(opps[0].tag, "[平常]");
        assert!(opps[0].advice.contains("3天"));
        assert!(opps[0].income_text().contains("计息3天"));
    }

    #[test]
    fn test_should_show_repo() {
        let low = analyze_repo(&[quote("204001", Some(dec!(1.5)))], monday());
        assert!(!should_show_repo(&low, monday(), dec!(2.0)));
        assert!(should_show_repo(&low, thursday(), dec!(2.0)));

        let high = analyze_repo(&[quote("204001", Some(dec!(4.2)))], monday());
        assert_eq!(high[0].tag, "[🔥 高息]");
        assert!(should_show_repo(&high, monday(), dec!(2.0)));

        assert!(!should_show_repo(&[], thursday(), dec!(2.0)));
    }
}
