//! Parser for the vMix XML status document.


use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use xmltree::{Element, XMLNode};

/// One poll's view of the running playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Title of the playlist input, used to detect item changes
    pub active_item_id: String,
    pub position_ms: u64,
    pub duration_ms: u64,
    /// Label of the selected playlist entry
    pub current_label: String,
    /// Label of the entry after the selected one, empty at the end of the list
    pub next_label: String,
}

impl Snapshot {
    /// Parse a status document, returning [`None`] when no playlist is running.
    ///
    /// Malformed documents are logged and treated the same as a missing playlist.
    #[must_use]
    pub fn from_status(document: &str) -> Option<Self> {
        parse_status(document)
            .inspect_err(|e| tracing::warn!(?e, "Failed to parse vMix status document"))
            .ok()
            .flatten()
    }

    /// Time left before the current item ends.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        Duration::from_millis(self.duration_ms.saturating_sub(self.position_ms))
    }
}

/// Parse a status document.
///
/// # Errors
///
/// Returns an error if the document is not well-formed XML or the running playlist carries
/// invalid attributes. A well-formed document without exactly one running playlist yields
/// `Ok(None)`.
pub fn parse_status(document: &str) -> Result<Option<Snapshot>> {
    let root = Element::parse(document.as_bytes()).context("Invalid XML")?;

    let mut inputs = Vec::new();
    collect_elements(&root, "input", &mut inputs);
    let mut running = inputs.into_iter().filter(|input| is_running_playlist(input));

    let Some(playlist) = running.next() else {
        return Ok(None);
    };
    if running.next().is_some() {
        tracing::debug!("More than one running playlist, ignoring status");
        return Ok(None);
    }

    let active_item_id = attribute(playlist, "title")?.to_owned();
    let position_ms = parse_millis(playlist, "position")?;
    let duration_ms = parse_millis(playlist, "duration")?;

    let items: Vec<&Element> = playlist
        .get_child("list")
        .map(|list| child_elements(list, "item").collect())
        .unwrap_or_default();
    let (current_label, next_label) = items
        .iter()
        .position(|item| item.attributes.get("selected").map(String::as_str) == Some("true"))
        .map(|i| {
            (
                item_label(items[i]),
                items.get(i + 1).map(|next| item_label(next)).unwrap_or_default(),
            )
        })
        .unwrap_or_default();

    Ok(Some(Snapshot {
        active_item_id,
        position_ms,
        duration_ms,
        current_label,
        next_label,
    }))
}

/// Reduce a stored media path to a display label.
///
/// Ignores surrounding whitespace (the document may be indented), keeps the last path
/// segment (split on `\` or `/`) and drops everything from its first `.`.
#[must_use]
pub fn extract_label(raw: &str) -> &str {
    let raw = raw.trim();
    let file_name = raw.rsplit(['\\', '/']).next().unwrap_or(raw);
    file_name.split('.').next().unwrap_or(file_name)
}

fn is_running_playlist(input: &Element) -> bool {
    input.attributes.get("type").map(String::as_str) == Some("VideoList")
        && input.attributes.get("state").map(String::as_str) == Some("Running")
}

fn item_label(item: &Element) -> String {
    item.get_text()
        .map(|text| extract_label(&text).to_owned())
        .unwrap_or_default()
}

fn attribute<'a>(element: &'a Element, name: &str) -> Result<&'a str> {
    element
        .attributes
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Playlist input has no {name} attribute"))
}

fn parse_millis(element: &Element, name: &str) -> Result<u64> {
    let value = attribute(element, name)?;
    value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Failed to parse {name}={value} as milliseconds"))
}

fn child_elements<'a>(parent: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> {
    parent.children.iter().filter_map(move |node| match node {
        XMLNode::Element(elem) if elem.name == name => Some(elem),
        _ => None,
    })
}

/// Depth-first search for every descendant (or self) named `name`.
fn collect_elements<'a>(element: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    if element.name == name {
        found.push(element);
    }
    for node in &element.children {
        if let XMLNode::Element(child) = node {
            collect_elements(child, name, found);
        }
    }
}
