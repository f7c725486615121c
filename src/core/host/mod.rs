//! The editor-side surface the reader talks to.
//!
//! A host renders status messages, quick panels and scratch documents. Quick
//! panel selections never call back into the reader directly: the host hands
//! the user's choice to a [`PanelReply`], which posts it onto the reader's UI
//! queue.

pub mod browser;
pub mod terminal;

use tokio::sync::mpsc::UnboundedSender;

use crate::core::command::UiEvent;

pub use browser::SystemBrowser;
pub use terminal::TerminalHost;

/// One selectable quick panel row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRow {
    pub label: String,
    pub detail: Option<String>,
}

impl PanelRow {
    pub fn new(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Items,
    Actions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchDocument {
    pub name: String,
    pub content: String,
    pub read_only: bool,
}

/// One-shot handle for answering a quick panel.
///
/// Dropping an unanswered reply counts as a cancel, so a host that closes a
/// panel without calling back still lets the reader finish.
#[derive(Debug)]
pub struct PanelReply {
    panel: PanelKind,
    sender: Option<UnboundedSender<UiEvent>>,
}

impl PanelReply {
    pub(crate) fn new(panel: PanelKind, sender: UnboundedSender<UiEvent>) -> Self {
        Self {
            panel,
            sender: Some(sender),
        }
    }

    pub fn panel(&self) -> PanelKind {
        self.panel
    }

    /// Reports the host's raw selection index; any negative index is a cancel.
    pub fn select(mut self, index: i64) {
        let index = usize::try_from(index).ok();
        self.send(index);
    }

    pub fn cancel(mut self) {
        self.send(None);
    }

    fn send(&mut self, index: Option<usize>) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        let event = UiEvent::PanelSelected {
            panel: self.panel,
            index,
        };
        if sender.send(event).is_err() {
            tracing::debug!(panel = ?self.panel, "reader already finished, dropping selection");
        }
    }
}

impl Drop for PanelReply {
    fn drop(&mut self) {
        if self.sender.is_some() {
            tracing::debug!(panel = ?self.panel, "panel closed without an answer");
            self.send(None);
        }
    }
}

/// Editor UI primitives used by the reader. Called only from the UI loop.
pub trait Host {
    fn status_message(&mut self, message: &str);

    fn show_quick_panel(&mut self, rows: Vec<PanelRow>, reply: PanelReply);

    fn new_scratch_document(&mut self, document: ScratchDocument);
}

/// Hands a URL to whatever opens links on this system. Fire-and-forget.
pub trait BrowserOpener {
    fn open(&self, url: &str);
}
