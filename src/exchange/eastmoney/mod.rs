pub mod error;
pub mod types;
pub mod rest;

pub use error::FeedError;
pub use types::{parse_body, RawTable};
pub use rest::EastmoneyClient;
