pub mod lof;
pub mod convertible;
pub mod repo;

pub use lof::{analyze_fund, filter_opportunities, FundAnalysis, LofOpportunity, RiskTag};
pub use convertible::{apply_notice, find_revision_notice, rate_double_low, select_double_low, BondPick};
pub use repo::{analyze_repo, interest_days, should_show_repo, RepoOpportunity};
