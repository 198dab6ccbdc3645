// List-Coherence Analyzer — parses list-item structure into a nesting
// tree, detects list intros, and decides whether a list may be split. See
// spec.md §4.3.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::ListItemSource;

pub use crate::boundary::is_list_intro;

/// One node in the parsed list tree. Children only point downward — no
/// back-pointer is needed once the tree is built (spec §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItemNode {
    pub text: String,
    pub level: u8,
    pub children: Vec<ListItemNode>,
}

impl ListItemNode {
    fn new(text: impl Into<String>, level: u8) -> Self {
        Self {
            text: text.into(),
            level,
            children: Vec::new(),
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Marker family recognised for a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    Ordered,
    Unordered,
    Checklist,
    Definition,
    /// No marker: a continuation line appended to the previous item.
    Continuation,
}

static ORDERED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d+[.)]|[a-zA-Z][.)]|\([a-zA-Z0-9]+\)|[ivxlcdm]+[.)])\s+").unwrap());
static UNORDERED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[•●○■□▪▫·\-*–—]\s+").unwrap());
static CHECKLIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\[[ xX]\]|[☐☑☒])\s+").unwrap());
static DEFINITION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^:\n]{1,50}):\s+(.+)$").unwrap());

fn classify_marker(line: &str) -> MarkerKind {
    if CHECKLIST_MARKER.is_match(line) {
        MarkerKind::Checklist
    } else if ORDERED_MARKER.is_match(line) {
        MarkerKind::Ordered
    } else if UNORDERED_MARKER.is_match(line) {
        MarkerKind::Unordered
    } else if let Some(caps) = DEFINITION_MARKER.captures(line) {
        let term = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        if !term.contains('.') && term.len() <= 50 {
            MarkerKind::Definition
        } else {
            MarkerKind::Continuation
        }
    } else {
        MarkerKind::Continuation
    }
}

fn strip_marker(line: &str, kind: MarkerKind) -> String {
    let stripped = match kind {
        MarkerKind::Ordered => ORDERED_MARKER.replace(line, "").to_string(),
        MarkerKind::Unordered => UNORDERED_MARKER.replace(line, "").to_string(),
        MarkerKind::Checklist => CHECKLIST_MARKER.replace(line, "").to_string(),
        MarkerKind::Definition | MarkerKind::Continuation => line.to_string(),
    };
    stripped.trim().to_string()
}

/// Indent level for one raw line: tabs count as 4 spaces, two spaces per
/// nesting level.
pub fn indent_level(line: &str) -> u8 {
    let mut spaces = 0usize;
    for c in line.chars() {
        match c {
            '\t' => spaces += 4,
            ' ' => spaces += 1,
            _ => break,
        }
    }
    (spaces / 2) as u8
}

/// Parse raw list text (one item/continuation per line) into a nested tree.
pub fn parse_list(raw_lines: &[&str]) -> Vec<ListItemNode> {
    let mut roots: Vec<ListItemNode> = Vec::new();
    // Stack of (level, index-path into `roots` tree) is awkward in safe
    // Rust without unsafe back-pointers; instead we build with an explicit
    // stack of mutable references emulated via indices at each depth.
    let mut stack: Vec<(u8, Vec<usize>)> = Vec::new(); // (level, path)

    for raw_line in raw_lines {
        let trimmed_line = raw_line.trim_end();
        if trimmed_line.trim().is_empty() {
            continue;
        }
        let level = indent_level(raw_line);
        let content = trimmed_line.trim_start();
        let kind = classify_marker(content);

        if kind == MarkerKind::Continuation && !stack.is_empty() {
            // Append to the most recent item with a single intervening space.
            if let Some(node) = node_at_path(&mut roots, &last_path(&stack)) {
                node.text.push(' ');
                node.text.push_str(content.trim());
            }
            continue;
        }

        let text = strip_marker(content, kind);
        let node = ListItemNode::new(text, level);

        // Pop stack entries at level >= this one.
        while let Some((top_level, _)) = stack.last() {
            if *top_level >= level {
                stack.pop();
            } else {
                break;
            }
        }

        if let Some((_, parent_path)) = stack.last() {
            let parent_path = parent_path.clone();
            if let Some(parent) = node_at_path(&mut roots, &parent_path) {
                parent.children.push(node);
                let mut new_path = parent_path;
                new_path.push(parent.children.len() - 1);
                stack.push((level, new_path));
                continue;
            }
        }

        roots.push(node);
        stack.push((level, vec![roots.len() - 1]));
    }

    roots
}

fn last_path(stack: &[(u8, Vec<usize>)]) -> Vec<usize> {
    stack.last().map(|(_, p)| p.clone()).unwrap_or_default()
}

fn node_at_path<'a>(roots: &'a mut [ListItemNode], path: &[usize]) -> Option<&'a mut ListItemNode> {
    if path.is_empty() {
        return None;
    }
    let mut node = roots.get_mut(path[0])?;
    for &idx in &path[1..] {
        node = node.children.get_mut(idx)?;
    }
    Some(node)
}

/// Build a flat tree directly from document-model list items (which
/// already carry an explicit nesting level, so no indent parsing is
/// needed).
pub fn tree_from_sources(items: &[ListItemSource]) -> Vec<ListItemNode> {
    let mut roots: Vec<ListItemNode> = Vec::new();
    let mut stack: Vec<(u8, Vec<usize>)> = Vec::new();

    for item in items {
        let node = ListItemNode::new(item.text.clone(), item.level);
        while let Some((top_level, _)) = stack.last() {
            if *top_level >= item.level {
                stack.pop();
            } else {
                break;
            }
        }
        if let Some((_, parent_path)) = stack.last() {
            let parent_path = parent_path.clone();
            if let Some(parent) = node_at_path(&mut roots, &parent_path) {
                parent.children.push(node);
                let mut new_path = parent_path;
                new_path.push(parent.children.len() - 1);
                stack.push((item.level, new_path));
                continue;
            }
        }
        roots.push(node);
        stack.push((item.level, vec![roots.len() - 1]));
    }

    roots
}

/// Config for the list-coherence analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    pub max_list_size: usize,
    pub min_items_before_split: usize,
    pub preserve_nesting: bool,
    pub allow_split_at_level: u8,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            max_list_size: 2000,
            min_items_before_split: 5,
            preserve_nesting: true,
            allow_split_at_level: 0,
        }
    }
}

/// Outcome of a list split: two fragments, the first flagged incomplete.
#[derive(Debug, Clone)]
pub struct ListSplit {
    pub first: Vec<ListItemNode>,
    pub second: Vec<ListItemNode>,
    pub first_is_incomplete: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ListCoherenceAnalyzer {
    config: ListConfig,
}

impl ListCoherenceAnalyzer {
    pub fn new(config: ListConfig) -> Self {
        Self { config }
    }

    fn total_size(&self, items: &[ListItemNode]) -> usize {
        items
            .iter()
            .map(|item| item.text.len() + item.children.iter().map(|c| c.text.len() + 1).sum::<usize>())
            .sum()
    }

    fn count_items(&self, items: &[ListItemNode]) -> usize {
        items
            .iter()
            .map(|item| 1 + self.count_items(&item.children))
            .sum()
    }

    /// Whether the list should be kept as one chunk rather than split.
    pub fn should_keep_together(&self, items: &[ListItemNode]) -> bool {
        if self.total_size(items) <= self.config.max_list_size {
            return true;
        }
        if self.count_items(items) < self.config.min_items_before_split {
            return true;
        }
        if self.config.preserve_nesting {
            // Every candidate top-level split point lies above an item with
            // children -> can't split without breaking nesting.
            let candidates_all_have_children = (1..items.len())
                .all(|i| items[i - 1].has_children());
            if !items.is_empty() && candidates_all_have_children {
                return true;
            }
        }
        false
    }

    /// Split only between top-level items, at `allow_split_at_level` depth
    /// (default: only between root items). Returns `None` if there's no
    /// valid split point (e.g. fewer than 2 top-level items).
    pub fn split(&self, items: &[ListItemNode]) -> Option<ListSplit> {
        if self.config.allow_split_at_level != 0 || items.len() < 2 {
            tracing::debug!(items = items.len(), "list has no valid split point");
            return None;
        }
        let mid = items.len() / 2;
        let first = items[..mid].to_vec();
        let second = items[mid..].to_vec();
        tracing::debug!(first = first.len(), second = second.len(), "list split at top level");
        Some(ListSplit {
            first,
            second,
            first_is_incomplete: true,
        })
    }

    /// Render a list tree as markdown: numbered for ordered lists (counters
    /// reset per parent when ascending), `-` for unordered, two-space
    /// indent per nesting level.
    pub fn format(&self, items: &[ListItemNode], ordered: bool) -> String {
        let mut out = String::new();
        self.format_level(items, ordered, 0, &mut out);
        out.trim_end().to_string()
    }

    fn format_level(&self, items: &[ListItemNode], ordered: bool, depth: u8, out: &mut String) {
        let indent = "  ".repeat(depth as usize);
        for (i, item) in items.iter().enumerate() {
            if ordered {
                out.push_str(&format!("{indent}{}. {}\n", i + 1, item.text));
            } else {
                out.push_str(&format!("{indent}- {}\n", item.text));
            }
            if !item.children.is_empty() {
                self.format_level(&item.children, ordered, depth + 1, out);
            }
        }
    }
}
