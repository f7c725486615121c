use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One `channel/item` entry of an RSS 2.0 document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub description: String,
    pub content: Option<String>,
}

impl FeedItem {
    /// Time of day the item was published, as shown in the item list.
    pub fn published_time(&self) -> String {
        self.published_at.format("%H:%M").to_string()
    }
}
