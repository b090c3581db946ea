//! Premium calculation and filtering properties

use premium_watch::data::premium_rate;
use premium_watch::strategy::filter_opportunities;
use premium_watch::utils::config::{ThresholdConfig, WatchEntry};
use premium_watch::{FundClass, FundQuote, ValuationSource};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Prices in 0.001 yuan units, 0.001 to 10,000
fn price() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000).prop_map(|milli| Decimal::new(milli, 3))
}

fn quote(symbol: String, price: Decimal, reference: Decimal, volume: Decimal) -> FundQuote {
    FundQuote {
        symbol,
        name: "测试LOF".to_string(),
        price,
        volume: Some(volume),
        iopv_realtime: Some(reference),
        nav_official: None,
        nav_date: None,
        reference_value: reference,
        source: ValuationSource::Realtime,
        premium_rate: premium_rate(price, reference).unwrap(),
    }
}

proptest! {
    #[test]
    fn premium_sign_follows_price(price in price(), reference in price()) {
        let premium = premium_rate(price, reference).unwrap();

        prop_assert_eq!(premium > Decimal::ZERO, price > reference);
        prop_assert_eq!(premium < Decimal::ZERO, price < reference);
        prop_assert_eq!(premium.is_zero(), price == reference);
    }

    #[test]
    fn opportunities_clear_threshold_and_are_sorted(
        funds in prop::collection::vec((price(), price(), 0i64..5_000_000, any::<bool>()), 1..30)
    ) {
        let thresholds = ThresholdConfig::default();
        let mut quotes = Vec::new();
        let mut watchlist = Vec::new();

        for (i, (price, reference, volume, qdii)) in funds.into_iter().enumerate() {
            let code = format!("16{:04}", i);
            quotes.push(quote(code.clone(), price, reference, Decimal::from(volume)));
            watchlist.push(WatchEntry {
                code,
                class: if qdii { FundClass::Qdii } else { FundClass::Local },
            });
        }

        let picked = filter_opportunities(&quotes, &watchlist, &thresholds);

        for item in &picked {
            let source = quotes.iter().find(|q| q.symbol == item.code).unwrap();
            prop_assert!(source.premium_rate > thresholds.premium_threshold(item.class));
            prop_assert!(Decimal::from(item.volume) >= thresholds.min_volume);
        }
        for pair in picked.windows(2) {
            prop_assert!(pair[0].premium >= pair[1].premium);
        }
    }
}
