use std::borrow::Cow;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use encoding_rs::{Encoding, UTF_8};
use roxmltree::{Document, Node, ParsingOptions};

use super::types::FeedItem;

pub const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

const CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";

#[derive(Debug, thiserror::Error)]
pub enum FeedParseError {
    #[error("feed payload is empty")]
    EmptyPayload,
    #[error("unsupported feed encoding {0:?}")]
    UnknownEncoding(String),
    #[error("feed payload is not valid {0}")]
    Undecodable(&'static str),
    #[error("xml feed parse error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("item {index} is missing <{field}>")]
    MissingField { index: usize, field: &'static str },
    #[error("item {index} has an invalid pubDate {value:?}: {source}")]
    InvalidDate {
        index: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Parses an RSS 2.0 payload into its items, in document order.
///
/// Any malformed item fails the whole document.
pub fn parse_feed_bytes(raw: &[u8]) -> Result<Vec<FeedItem>, FeedParseError> {
    let trimmed = trim_leading_ascii_whitespace(raw);
    if trimmed.is_empty() {
        return Err(FeedParseError::EmptyPayload);
    }
    let text = decode_payload(trimmed)?;
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(&text, options)?;

    doc.root_element()
        .children()
        .filter(|node| node.has_tag_name("channel"))
        .flat_map(|channel| channel.children().filter(|node| node.has_tag_name("item")))
        .enumerate()
        .map(|(index, node)| item_from_node(index, node))
        .collect()
}

/// Decodes the payload using its BOM or XML declaration, UTF-8 otherwise.
///
/// Bytes that are invalid for the chosen encoding are an error, never replaced.
pub fn decode_payload(raw: &[u8]) -> Result<Cow<'_, str>, FeedParseError> {
    let (encoding, body) = match Encoding::for_bom(raw) {
        Some((encoding, bom_length)) => (encoding, &raw[bom_length..]),
        None => {
            let encoding = match declared_encoding(raw) {
                Some(label) => Encoding::for_label(label.as_bytes())
                    .ok_or_else(|| FeedParseError::UnknownEncoding(label.to_string()))?,
                None => UTF_8,
            };
            (encoding, raw)
        }
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or(FeedParseError::Undecodable(encoding.name()))
}

/// The `encoding` pseudo-attribute of a leading `<?xml ...?>` declaration.
fn declared_encoding(raw: &[u8]) -> Option<&str> {
    if !raw.starts_with(b"<?xml") {
        return None;
    }
    let end = raw.windows(2).position(|pair| pair == b"?>")?;
    let declaration = std::str::from_utf8(&raw[..end]).ok()?;
    let after_key = &declaration[declaration.find("encoding")? + "encoding".len()..];
    let after_equals = after_key.trim_start().strip_prefix('=')?.trim_start();
    let quote = after_equals.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &after_equals[1..];
    value.find(quote).map(|close| value[..close].trim())
}

pub fn parse_pub_date(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), PUB_DATE_FORMAT)?;
    Ok(Utc.from_utc_datetime(&naive))
}

fn item_from_node(index: usize, node: Node<'_, '_>) -> Result<FeedItem, FeedParseError> {
    let title = required_text(index, node, "title")?;
    let link = required_text(index, node, "link")?;
    let raw_date = required_text(index, node, "pubDate")?;
    let published_at = parse_pub_date(&raw_date).map_err(|source| FeedParseError::InvalidDate {
        index,
        value: raw_date.clone(),
        source,
    })?;
    let description = child_text(node, "description").unwrap_or_default();
    let content = node
        .children()
        .find(|child| child.has_tag_name((CONTENT_NAMESPACE, "encoded")))
        .map(collect_text);

    Ok(FeedItem {
        title,
        link,
        published_at,
        description,
        content,
    })
}

fn required_text(
    index: usize,
    node: Node<'_, '_>,
    field: &'static str,
) -> Result<String, FeedParseError> {
    child_text(node, field)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(FeedParseError::MissingField { index, field })
}

// Only un-prefixed children count; `dc:title` must not shadow `title`.
fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .find(|child| {
            child.is_element()
                && child.tag_name().namespace().is_none()
                && child.tag_name().name() == name
        })
        .map(collect_text)
}

// Text and CDATA children are both text nodes in roxmltree.
fn collect_text(node: Node<'_, '_>) -> String {
    node.children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect()
}

fn trim_leading_ascii_whitespace(raw: &[u8]) -> &[u8] {
    let start = raw
        .iter()
        .position(|byte| !byte.is_ascii_whitespace())
        .unwrap_or(raw.len());
    &raw[start..]
}
