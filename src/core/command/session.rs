use tokio::sync::mpsc::UnboundedSender;

use super::{ItemAction, ReaderState, UiEvent};
use crate::core::connectivity::ConnectivityResult;
use crate::core::feed::{FeedItem, FetchError};
use crate::core::host::{BrowserOpener, Host, PanelKind, PanelReply, PanelRow, ScratchDocument};

pub const LOADING_MESSAGE: &str = "Loading News Feed...";
pub const EMPTY_FEED_MESSAGE: &str = "The feed has no items";

/// UI-side state of one command invocation.
///
/// Every method runs on the UI loop. Probe and feed outcomes are aggregated
/// here so that neither one can hide the other.
#[derive(Debug)]
pub struct Session {
    state: ReaderState,
    items: Vec<FeedItem>,
    selected: Option<usize>,
    probe: Option<ConnectivityResult>,
    feed_error: Option<FetchError>,
    probe_pending: bool,
    feed_pending: bool,
    queue: UnboundedSender<UiEvent>,
}

impl Session {
    pub fn new(queue: UnboundedSender<UiEvent>) -> Self {
        Self {
            state: ReaderState::Idle,
            items: Vec::new(),
            selected: None,
            probe: None,
            feed_error: None,
            probe_pending: false,
            feed_pending: false,
            queue,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Both background results are in and nothing is waiting on the user.
    pub fn is_finished(&self) -> bool {
        self.state == ReaderState::Idle && !self.probe_pending && !self.feed_pending
    }

    pub fn start(&mut self, host: &mut impl Host) {
        host.status_message(LOADING_MESSAGE);
        self.state = ReaderState::Loading;
        self.probe_pending = true;
        self.feed_pending = true;
    }

    pub fn handle(&mut self, event: UiEvent, host: &mut impl Host, opener: &impl BrowserOpener) {
        match event {
            UiEvent::Probed(result) => self.on_probe(result, host),
            UiEvent::FeedLoaded(result) => self.on_feed(result, host),
            UiEvent::PanelSelected { panel, index } => self.on_selection(panel, index, host, opener),
        }
        tracing::trace!(state = ?self.state, "ui event handled");
    }

    fn on_probe(&mut self, result: ConnectivityResult, host: &mut impl Host) {
        self.probe_pending = false;
        self.probe = Some(result);
        if self.state != ReaderState::Loading {
            tracing::debug!(?result, state = ?self.state, "probe finished after the feed, not shown");
            return;
        }

        if let Some(message) = result.message() {
            host.status_message(message);
            self.feed_error = None;
            self.state = if self.feed_pending {
                ReaderState::Errored
            } else {
                ReaderState::Idle
            };
        } else if let Some(error) = self.feed_error.take() {
            self.report_feed_error(&error, host);
        }
    }

    fn on_feed(&mut self, result: Result<Vec<FeedItem>, FetchError>, host: &mut impl Host) {
        self.feed_pending = false;
        if !matches!(self.state, ReaderState::Loading | ReaderState::Errored) {
            tracing::debug!(state = ?self.state, "feed finished outside of loading, ignored");
            return;
        }

        match result {
            Ok(items) if items.is_empty() => {
                host.status_message(EMPTY_FEED_MESSAGE);
                self.state = ReaderState::Idle;
            }
            Ok(items) => {
                let rows = items.iter().map(item_row).collect();
                self.items = items;
                self.state = ReaderState::ListShown;
                host.show_quick_panel(rows, PanelReply::new(PanelKind::Items, self.queue.clone()));
            }
            Err(error) => {
                tracing::warn!(%error, "feed fetch failed");
                if self.probe.is_none() {
                    // Wait for the probe to say whether this is a connectivity problem.
                    self.feed_error = Some(error);
                } else if self.state == ReaderState::Errored {
                    self.state = ReaderState::Idle;
                } else {
                    self.report_feed_error(&error, host);
                }
            }
        }
    }

    fn on_selection(
        &mut self,
        panel: PanelKind,
        index: Option<usize>,
        host: &mut impl Host,
        opener: &impl BrowserOpener,
    ) {
        match (self.state, panel) {
            (ReaderState::ListShown, PanelKind::Items) => {
                let Some(index) = index.filter(|index| *index < self.items.len()) else {
                    if let Some(index) = index {
                        tracing::warn!(index, items = self.items.len(), "selection out of range");
                    }
                    self.dismiss();
                    return;
                };
                let item = &self.items[index];
                let rows = ItemAction::ALL
                    .iter()
                    .map(|action| action.row(item))
                    .collect();
                self.selected = Some(index);
                self.state = ReaderState::ActionMenu;
                host.show_quick_panel(rows, PanelReply::new(PanelKind::Actions, self.queue.clone()));
            }
            (ReaderState::ActionMenu, PanelKind::Actions) => {
                let action = index.and_then(ItemAction::from_index);
                let item = self.selected.and_then(|selected| self.items.get(selected));
                if let (Some(action), Some(item)) = (action, item) {
                    perform(action, item, host, opener);
                }
                self.dismiss();
            }
            (state, panel) => {
                tracing::debug!(?state, ?panel, "stale panel selection ignored");
            }
        }
    }

    fn report_feed_error(&mut self, error: &FetchError, host: &mut impl Host) {
        host.status_message(&format!("Feed could not be loaded: {error}"));
        self.state = ReaderState::Idle;
    }

    fn dismiss(&mut self) {
        self.items.clear();
        self.selected = None;
        self.state = ReaderState::Idle;
    }
}

pub fn item_row(item: &FeedItem) -> PanelRow {
    PanelRow::new(
        format!("{} - {}", item.published_time(), item.title),
        item.link.clone(),
    )
}

pub fn read_here_document(item: &FeedItem) -> ScratchDocument {
    ScratchDocument {
        name: item.title.clone(),
        content: [item.title.as_str(), item.link.as_str(), item.description.as_str()].join("\n\n"),
        read_only: true,
    }
}

fn perform(action: ItemAction, item: &FeedItem, host: &mut impl Host, opener: &impl BrowserOpener) {
    tracing::info!(?action, link = %item.link, "item action");
    match action {
        ItemAction::ReadHere => host.new_scratch_document(read_here_document(item)),
        ItemAction::OpenInBrowser => opener.open(&item.link),
    }
}
