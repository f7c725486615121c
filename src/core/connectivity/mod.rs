use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Why (or whether) the feed host can be reached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConnectivityResult {
    Unreachable,
    FeedDown,
    Ok,
}

impl ConnectivityResult {
    pub fn is_reachable(self) -> bool {
        matches!(self, ConnectivityResult::Ok)
    }

    /// Status line shown to the user, `None` when there is nothing to report.
    pub fn message(self) -> Option<&'static str> {
        match self {
            ConnectivityResult::Unreachable => Some("Your Internet connection seems to be down"),
            ConnectivityResult::FeedDown => Some("Feed cannot be reached"),
            ConnectivityResult::Ok => None,
        }
    }
}

/// Checks `always_up_url` first and only then `service_url`.
///
/// The service is never contacted when the first check fails, so a dead
/// connection is never misreported as a feed outage.
pub async fn probe(
    client: &reqwest::Client,
    always_up_url: &str,
    service_url: &str,
    timeout: Duration,
) -> ConnectivityResult {
    if let Err(error) = check(client, always_up_url, timeout).await {
        tracing::warn!(url = always_up_url, %error, "internet probe failed");
        return ConnectivityResult::Unreachable;
    }
    if let Err(error) = check(client, service_url, timeout).await {
        tracing::warn!(url = service_url, %error, "feed probe failed");
        return ConnectivityResult::FeedDown;
    }
    tracing::debug!("connectivity probe passed");
    ConnectivityResult::Ok
}

async fn check(client: &reqwest::Client, url: &str, timeout: Duration) -> Result<(), reqwest::Error> {
    client
        .get(url)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}
