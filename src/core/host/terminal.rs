use std::io::{self, BufRead, Write};
use std::thread;

use super::{Host, PanelReply, PanelRow, ScratchDocument};

const DOCUMENT_WIDTH: usize = 80;

/// A host that plays the editor from a terminal.
///
/// Status messages go to stderr, quick panels are numbered lists answered on
/// stdin, scratch documents are printed as plain text on stdout.
#[derive(Debug, Clone, Default)]
pub struct TerminalHost;

impl Host for TerminalHost {
    fn status_message(&mut self, message: &str) {
        eprintln!("[feed] {message}");
    }

    fn show_quick_panel(&mut self, rows: Vec<PanelRow>, reply: PanelReply) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", render_panel(&rows));
        let _ = write!(stdout, "select (number or search text, empty to cancel): ");
        let _ = stdout.flush();
        drop(stdout);

        // stdin is read off the UI loop; the answer comes back through the queue.
        thread::spawn(move || {
            let mut line = String::new();
            let read = io::stdin().lock().read_line(&mut line);
            match read {
                Ok(_) => match resolve_input(&rows, &line) {
                    Some(index) => reply.select(index as i64),
                    None => reply.cancel(),
                },
                Err(error) => {
                    tracing::warn!(%error, "failed to read selection");
                    reply.cancel();
                }
            }
        });
    }

    fn new_scratch_document(&mut self, document: ScratchDocument) {
        println!("{}", render_document(&document, DOCUMENT_WIDTH));
    }
}

pub fn render_panel(rows: &[PanelRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() * 2);
    for (position, row) in rows.iter().enumerate() {
        lines.push(format!("{:>3}. {}", position + 1, row.label));
        if let Some(detail) = &row.detail {
            lines.push(format!("     {detail}"));
        }
    }
    lines.join("\n")
}

/// Maps a typed answer onto a row index.
///
/// Numbers are 1-based positions; any other text selects the first row whose
/// label or detail contains it, ignoring case.
pub fn resolve_input(rows: &[PanelRow], input: &str) -> Option<usize> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("q") {
        return None;
    }
    if let Ok(position) = input.parse::<usize>() {
        return (1..=rows.len()).contains(&position).then(|| position - 1);
    }

    let needle = input.to_lowercase();
    rows.iter().position(|row| {
        row.label.to_lowercase().contains(&needle)
            || row
                .detail
                .as_deref()
                .is_some_and(|detail| detail.to_lowercase().contains(&needle))
    })
}

/// Renders a scratch document as plain text, converting markup per paragraph.
pub fn render_document(document: &ScratchDocument, width: usize) -> String {
    let rule = "=".repeat(width.min(document.name.chars().count().max(1)));
    let body = document
        .content
        .split("\n\n")
        .map(|block| html_to_text(block, width))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n{rule}\n\n{body}", document.name)
}

fn html_to_text(block: &str, width: usize) -> String {
    match html2text::config::plain().string_from_read(block.as_bytes(), width) {
        Ok(text) => text.trim_end().to_string(),
        Err(error) => {
            tracing::debug!(%error, "could not render markup, showing it raw");
            block.to_string()
        }
    }
}
