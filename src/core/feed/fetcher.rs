use super::parser::{parse_feed_bytes, FeedParseError};
use super::types::FeedItem;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),
    #[error("invalid feed: {0}")]
    Parse(#[from] FeedParseError),
}

/// Downloads the whole feed document and parses it.
///
/// No timeout is applied beyond whatever the client was built with.
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<Vec<FeedItem>, FetchError> {
    tracing::debug!(url, "fetching feed");
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let body = response.bytes().await?;
    let items = parse_feed_bytes(&body)?;
    tracing::info!(url, items = items.len(), "feed loaded");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::Router;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <item>
      <title>First</title>
      <link>http://forum.example.com/1</link>
      <pubDate>Wed, 03 Jan 2024 12:00:00 GMT</pubDate>
      <description>one</description>
    </item>
    <item>
      <title>Second</title>
      <link>http://forum.example.com/2</link>
      <pubDate>Wed, 03 Jan 2024 13:15:00 GMT</pubDate>
      <description>two</description>
    </item>
    <item>
      <title>Third</title>
      <link>http://forum.example.com/3</link>
      <pubDate>Wed, 03 Jan 2024 14:45:00 GMT</pubDate>
      <description>three</description>
    </item>
  </channel>
</rss>"#;

    async fn feed_handler() -> Response {
        (
            [(reqwest::header::CONTENT_TYPE, "application/rss+xml")],
            FEED,
        )
            .into_response()
    }

    async fn broken_date_handler() -> Response {
        FEED.replace("Wed, 03 Jan 2024 13:15:00 GMT", "yesterday")
            .into_response()
    }

    async fn unavailable_handler() -> Response {
        (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response()
    }

    async fn spawn_test_server() -> (String, tokio::task::JoinHandle<()>) {
        let app = Router::new()
            .route("/feed.xml", get(feed_handler))
            .route("/broken.xml", get(broken_date_handler))
            .route("/down.xml", get(unavailable_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("local addr should exist");
        let join_handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server should run");
        });
        (format!("http://{address}"), join_handle)
    }

    #[tokio::test]
    async fn fetch_feed_returns_every_item_in_order() {
        let (base, server_task) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let items = fetch_feed(&client, &format!("{base}/feed.xml"))
            .await
            .expect("fetch should succeed");
        let titles: Vec<&str> = items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, ["First", "Second", "Third"]);
        assert!(items.iter().all(|item| !item.link.is_empty()));

        server_task.abort();
    }

    #[tokio::test]
    async fn fetch_feed_fails_on_malformed_date() {
        let (base, server_task) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let error = fetch_feed(&client, &format!("{base}/broken.xml"))
            .await
            .expect_err("malformed date must fail the fetch");
        assert!(matches!(
            error,
            FetchError::Parse(FeedParseError::InvalidDate { index: 1, .. })
        ));

        server_task.abort();
    }

    #[tokio::test]
    async fn fetch_feed_reports_http_status() {
        let (base, server_task) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let error = fetch_feed(&client, &format!("{base}/down.xml"))
            .await
            .expect_err("503 must fail");
        assert!(matches!(error, FetchError::HttpStatus(503)));

        server_task.abort();
    }
}
