pub mod data;
pub mod exchange;
pub mod strategy;
pub mod report;
pub mod notify;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use data::{BondQuote, FundClass, FundQuote, IpoCalendar, Notice, RepoQuote, ValuationSource};
pub use exchange::{EastmoneyClient, FeedError, RawTable};
pub use strategy::{BondPick, LofOpportunity, RepoOpportunity, RiskTag};
pub use report::{format_text_report, ReportInput};
pub use notify::{Delivery, NotifyError, WeComNotifier};
pub use pipeline::{market_today, run, RunOptions, RunSummary};
pub use utils::Config;
