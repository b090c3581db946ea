pub mod eastmoney;

pub use eastmoney::{EastmoneyClient, FeedError, RawTable};
