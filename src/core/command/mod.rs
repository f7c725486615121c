pub mod session;

use tokio::sync::mpsc::{self, UnboundedSender};

use crate::config::ReaderConfig;
use crate::core::connectivity::{probe, ConnectivityResult};
use crate::core::feed::{fetch_feed, FeedItem, FetchError};
use crate::core::host::{BrowserOpener, Host, PanelKind, PanelRow};

pub use session::Session;

/// Messages accepted by the UI loop.
#[derive(Debug)]
pub enum UiEvent {
    Probed(ConnectivityResult),
    FeedLoaded(Result<Vec<FeedItem>, FetchError>),
    /// `index` is `None` when the user dismissed the panel.
    PanelSelected {
        panel: PanelKind,
        index: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Idle,
    Loading,
    Errored,
    ListShown,
    ActionMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAction {
    ReadHere,
    OpenInBrowser,
}

impl ItemAction {
    /// Menu order.
    pub const ALL: [ItemAction; 2] = [ItemAction::ReadHere, ItemAction::OpenInBrowser];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemAction::ReadHere => "Read here",
            ItemAction::OpenInBrowser => "Open in browser",
        }
    }

    fn row(self, item: &FeedItem) -> PanelRow {
        let detail = match self {
            ItemAction::ReadHere => item.title.clone(),
            ItemAction::OpenInBrowser => item.link.clone(),
        };
        PanelRow::new(self.label(), detail)
    }
}

/// The "read the news feed" command.
///
/// Each [`run`](Self::run) is one invocation: the connectivity probe and the
/// feed download start together on background tasks and report back through a
/// queue that is drained on the caller's task, which acts as the UI thread.
#[derive(Debug, Clone)]
pub struct FeedReaderCommand {
    config: ReaderConfig,
    client: reqwest::Client,
}

impl FeedReaderCommand {
    pub fn new(config: ReaderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub async fn run<H: Host, B: BrowserOpener>(&self, host: &mut H, opener: &B) {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        self.spawn_probe(sender.clone());
        self.spawn_feed(sender.clone());

        let mut session = Session::new(sender);
        session.start(host);
        while let Some(event) = receiver.recv().await {
            session.handle(event, host, opener);
            if session.is_finished() {
                break;
            }
        }
        tracing::debug!("feed reader session finished");
    }

    fn spawn_probe(&self, sender: UnboundedSender<UiEvent>) {
        let client = self.client.clone();
        let always_online_url = self.config.always_online_url.clone();
        let feed_url = self.config.feed_url.clone();
        let timeout = self.config.probe_timeout;
        tokio::spawn(async move {
            let result = probe(&client, &always_online_url, &feed_url, timeout).await;
            let _ = sender.send(UiEvent::Probed(result));
        });
    }

    fn spawn_feed(&self, sender: UnboundedSender<UiEvent>) {
        let client = self.client.clone();
        let feed_url = self.config.feed_url.clone();
        tokio::spawn(async move {
            let result = fetch_feed(&client, &feed_url).await;
            let _ = sender.send(UiEvent::FeedLoaded(result));
        });
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{FakeBrowser, FakeHost};
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Forum</title>
    <item>
      <title>A</title>
      <link>http://x</link>
      <pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate>
      <description>d1</description>
    </item>
    <item>
      <title>B</title>
      <link>http://y</link>
      <pubDate>Tue, 02 Jan 2024 11:30:00 GMT</pubDate>
      <description>d2</description>
    </item>
  </channel>
</rss>"#;

    #[derive(Clone, Default)]
    struct AppState {
        feed_requests: Arc<AtomicUsize>,
    }

    async fn up_handler() -> StatusCode {
        StatusCode::OK
    }

    async fn feed_handler(State(state): State<AppState>) -> Response {
        state.feed_requests.fetch_add(1, Ordering::SeqCst);
        (
            [(reqwest::header::CONTENT_TYPE, "application/rss+xml")],
            FEED,
        )
            .into_response()
    }

    async fn spawn_test_server(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
        let app = Router::new()
            .route("/up", get(up_handler))
            .route("/feed.xml", get(feed_handler))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("local addr should exist");
        let join_handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server should run");
        });
        (format!("http://{address}"), join_handle)
    }

    fn command_for(always_online_url: String, feed_url: String) -> FeedReaderCommand {
        let config = ReaderConfig {
            always_online_url,
            feed_url,
            probe_timeout: Duration::from_secs(2),
        };
        FeedReaderCommand::new(config).expect("client should build")
    }

    #[tokio::test]
    async fn lists_two_items_then_opens_the_selected_link() {
        let (base, server_task) = spawn_test_server(AppState::default()).await;
        let command = command_for(format!("{base}/up"), format!("{base}/feed.xml"));
        let mut host = FakeHost::with_choices(&[0, 1]);
        let browser = FakeBrowser::default();

        command.run(&mut host, &browser).await;

        let log = host.log();
        let rows = &log.panels[0];
        assert_eq!(rows.len(), 2);
        assert!(rows[0].label.contains('A') && rows[0].label.contains("10:00"));
        assert!(rows[1].label.contains('B') && rows[1].label.contains("11:30"));
        assert_eq!(rows[0].detail.as_deref(), Some("http://x"));
        assert_eq!(browser.opened(), ["http://x"]);
        assert!(log.documents.is_empty());

        server_task.abort();
    }

    #[tokio::test]
    async fn cancelled_list_ends_without_side_effects() {
        let state = AppState::default();
        let (base, server_task) = spawn_test_server(state.clone()).await;
        let command = command_for(format!("{base}/up"), format!("{base}/feed.xml"));
        let mut host = FakeHost::with_choices(&[-1]);
        let browser = FakeBrowser::default();

        command.run(&mut host, &browser).await;

        let log = host.log();
        assert_eq!(log.panels.len(), 1);
        assert!(log.documents.is_empty());
        assert!(browser.opened().is_empty());
        // one probe request plus one feed request
        assert_eq!(state.feed_requests.load(Ordering::SeqCst), 2);

        server_task.abort();
    }

    #[tokio::test]
    async fn offline_probe_still_lets_the_list_through() {
        let (base, server_task) = spawn_test_server(AppState::default()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let dead = format!("http://{}/", listener.local_addr().expect("local addr"));
        drop(listener);

        let command = command_for(dead, format!("{base}/feed.xml"));
        let mut host = FakeHost::with_choices(&[-1]);
        let browser = FakeBrowser::default();

        command.run(&mut host, &browser).await;

        let log = host.log();
        assert_eq!(log.panels.len(), 1);
        assert_eq!(log.panels[0].len(), 2);

        server_task.abort();
    }

    #[tokio::test]
    async fn host_closing_the_list_silently_still_ends_the_run() {
        let (base, server_task) = spawn_test_server(AppState::default()).await;
        let command = command_for(format!("{base}/up"), format!("{base}/feed.xml"));
        // no scripted choice: the host drops the panel reply unanswered
        let mut host = FakeHost::with_choices(&[]);
        let browser = FakeBrowser::default();

        tokio::time::timeout(Duration::from_secs(10), command.run(&mut host, &browser))
            .await
            .expect("run must finish once the panel is dropped");

        let log = host.log();
        assert_eq!(log.panels.len(), 1);
        assert!(log.documents.is_empty());
        assert!(browser.opened().is_empty());

        server_task.abort();
    }

    #[tokio::test]
    async fn missing_feed_is_reported_as_feed_down() {
        let (base, server_task) = spawn_test_server(AppState::default()).await;
        let command = command_for(format!("{base}/up"), format!("{base}/missing.xml"));
        let mut host = FakeHost::with_choices(&[]);
        let browser = FakeBrowser::default();

        command.run(&mut host, &browser).await;

        let log = host.log();
        assert!(log.panels.is_empty());
        assert_eq!(log.statuses.last().map(String::as_str), Some("Feed cannot be reached"));

        server_task.abort();
    }
}
