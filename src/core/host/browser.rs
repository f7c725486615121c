use super::BrowserOpener;

/// Opens links with the operating system's default browser.
#[derive(Debug, Clone, Default)]
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) {
        match webbrowser::open(url) {
            Ok(()) => tracing::info!(url, "opened link in browser"),
            Err(error) => tracing::warn!(url, %error, "failed to open link in browser"),
        }
    }
}
