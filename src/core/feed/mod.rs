pub mod fetcher;
pub mod parser;
pub mod types;

pub use fetcher::{fetch_feed, FetchError};
pub use parser::{parse_feed_bytes, FeedParseError};
pub use types::FeedItem;
