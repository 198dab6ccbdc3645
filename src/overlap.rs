// Overlap Generator — produces sentence/paragraph/character overlap
// tails and splices them onto the following chunk. See spec.md §4.7.

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::size::count_words;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapStrategy {
    None,
    Character,
    Sentence,
    Paragraph,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlapConfig {
    pub strategy: OverlapStrategy,
    pub size: usize,
    pub min_overlap: usize,
    pub max_overlap: usize,
    pub preserve_words: bool,
    pub include_heading_context: bool,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            strategy: OverlapStrategy::Sentence,
            size: 100,
            min_overlap: 0,
            max_overlap: 500,
            preserve_words: true,
            include_heading_context: true,
        }
    }
}

/// Split sentences the same way `count_sentences` counts them: walk
/// terminators and slice at the offset right after each one.
fn split_sentences(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if (c == '.' || c == '!' || c == '?')
            && (i + 1 >= bytes.len() || (bytes[i + 1] as char).is_whitespace())
        {
            pieces.push(text[start..=i].trim());
            start = i + 1;
        }
        i += 1;
    }
    if start < bytes.len() {
        let rest = text[start..].trim();
        if !rest.is_empty() {
            pieces.push(rest);
        }
    }
    pieces.into_iter().filter(|s| !s.is_empty()).collect()
}

fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n").map(str::trim).filter(|s| !s.is_empty()).collect()
}

fn advance_to_whitespace(text: &str, byte_pos: usize) -> usize {
    let bytes = text.as_bytes();
    let mut pos = byte_pos.min(bytes.len());
    while pos < bytes.len() && !(bytes[pos] as char).is_whitespace() {
        pos += 1;
    }
    pos
}

/// Derive the raw overlap tail from `text` per the configured strategy,
/// before min/max enforcement.
fn raw_overlap(text: &str, config: &OverlapConfig) -> String {
    match config.strategy {
        OverlapStrategy::None => String::new(),
        OverlapStrategy::Character => {
            let len = text.len();
            let start = len.saturating_sub(config.size);
            let start = floor_char_boundary(text, start);
            let mut cut = start;
            if config.preserve_words && cut > 0 {
                cut = advance_to_whitespace(text, cut);
            }
            text[cut.min(len)..].trim().to_string()
        }
        OverlapStrategy::Sentence => {
            let sentences = split_sentences(text);
            let take = sentences.len().min(config.size);
            sentences[sentences.len() - take..].join(" ")
        }
        OverlapStrategy::Paragraph => {
            let paragraphs = split_paragraphs(text);
            let take = paragraphs.len().min(config.size);
            paragraphs[paragraphs.len() - take..].join("\n\n")
        }
    }
}

fn floor_char_boundary(text: &str, mut pos: usize) -> usize {
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Enforce `[min_overlap, max_overlap]` (measured in characters), falling
/// back to character overlap when a sentence strategy produced nothing,
/// and trimming at a sentence boundary (or word boundary) when over max.
fn enforce_bounds(overlap: String, text: &str, config: &OverlapConfig) -> String {
    let mut overlap = overlap;

    if overlap.len() < config.min_overlap && config.strategy == OverlapStrategy::Sentence {
        overlap = raw_overlap(text, &OverlapConfig {
            strategy: OverlapStrategy::Character,
            size: config.min_overlap.max(config.size),
            ..config.clone()
        });
    }

    if overlap.len() > config.max_overlap {
        let sentences = split_sentences(&overlap);
        let mut trimmed = String::new();
        for sentence in sentences.iter().rev() {
            let candidate = if trimmed.is_empty() {
                sentence.to_string()
            } else {
                format!("{sentence} {trimmed}")
            };
            if candidate.len() <= config.max_overlap {
                trimmed = candidate;
            } else {
                break;
            }
        }
        if trimmed.is_empty() {
            let cut = floor_char_boundary(&overlap, config.max_overlap);
            let mut cut = cut;
            if config.preserve_words {
                while cut > 0 && !overlap.as_bytes()[cut.saturating_sub(1)].is_ascii_whitespace() {
                    cut -= 1;
                }
            }
            trimmed = overlap[..cut].trim().to_string();
        }
        overlap = trimmed;
    }

    overlap
}

/// Compute the overlap tail to prepend to the following chunk, given the
/// preceding chunk's pre-overlap text.
pub fn compute_overlap(preceding_text: &str, config: &OverlapConfig) -> String {
    if config.strategy == OverlapStrategy::None || config.size == 0 {
        return String::new();
    }
    let raw = raw_overlap(preceding_text, config);
    enforce_bounds(raw, preceding_text, config)
}

/// Apply overlap across an entire chunk sequence in place, left to right.
/// Each chunk's pre-overlap text is fixed at the time this runs; applying
/// overlap to chunk i never reads chunk i+1 or later (spec §4.7 ordering
/// guarantee).
pub fn apply_overlap(chunks: &mut [Chunk], config: &OverlapConfig) {
    if config.strategy == OverlapStrategy::None || config.size == 0 || chunks.len() < 2 {
        return;
    }

    let pre_overlap_texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();

    for i in 1..chunks.len() {
        let overlap = compute_overlap(&pre_overlap_texts[i - 1], config);
        if overlap.is_empty() {
            continue;
        }

        let mut prefix = overlap.clone();
        if config.include_heading_context {
            if let Some(title) = &chunks[i].metadata.section_title {
                prefix = format!("[{title}]\n\n{prefix}");
            }
        }

        let expanded = format!("{prefix}\n\n{}", pre_overlap_texts[i]);
        chunks[i].content = expanded.clone();
        chunks[i].metadata.char_count = expanded.chars().count();
        chunks[i].metadata.word_count = count_words(&expanded);
        chunks[i].metadata.estimated_tokens = (chunks[i].metadata.char_count as f64 * 0.25).floor() as usize;
    }
}
