// Size Calculator — converts text to metrics in five incommensurable
// units, checks soft/hard limits, and proposes split/merge/truncate
// actions. See spec.md §4.1.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::boundary::Boundary;

/// The five units chunk sizes are measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Characters,
    Tokens,
    Words,
    Sentences,
    Paragraphs,
}

/// Whether a limit may be exceeded with a suggested remediation (`Soft`) or
/// must never be exceeded (`Hard`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitType {
    Soft,
    Hard,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizeLimit {
    pub value: usize,
    pub unit: Unit,
    pub limit_type: LimitType,
}

impl SizeLimit {
    pub fn new(value: usize, unit: Unit, limit_type: LimitType) -> Self {
        Self {
            value,
            unit,
            limit_type,
        }
    }
}

/// Every size-derived metric for a piece of text, one field per `Unit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeMetrics {
    pub characters: usize,
    pub tokens: usize,
    pub words: usize,
    pub sentences: usize,
    pub paragraphs: usize,
}

impl SizeMetrics {
    pub fn get(&self, unit: Unit) -> usize {
        match unit {
            Unit::Characters => self.characters,
            Unit::Tokens => self.tokens,
            Unit::Words => self.words,
            Unit::Sentences => self.sentences,
            Unit::Paragraphs => self.paragraphs,
        }
    }
}

/// What `SizeCalculator::check` recommends doing with an over/under-size
/// block of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestedAction {
    None,
    Split,
    Merge,
    Truncate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub metrics: SizeMetrics,
    pub is_valid: bool,
    pub reason: Option<String>,
    pub suggested_action: SuggestedAction,
    /// Signed distance (in `target.unit`) between the measured size and the
    /// target; positive means over target.
    pub target_diff: i64,
}

/// Size policy: target/min/max limits plus the knobs that affect how size
/// arithmetic and splitting behave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeConfig {
    pub target: SizeLimit,
    pub min: SizeLimit,
    pub max: SizeLimit,
    pub tokens_per_char: f64,
    pub allow_exceed_for_atomic_content: bool,
    pub merge_small_chunks: bool,
    pub split_at_semantic_boundaries: bool,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            target: SizeLimit::new(1000, Unit::Characters, LimitType::Soft),
            min: SizeLimit::new(100, Unit::Characters, LimitType::Soft),
            max: SizeLimit::new(2000, Unit::Characters, LimitType::Hard),
            tokens_per_char: 0.25,
            allow_exceed_for_atomic_content: true,
            merge_small_chunks: true,
            split_at_semantic_boundaries: true,
        }
    }
}

impl SizeConfig {
    /// Reject configurations no caller could have meant: a `min` limit
    /// that exceeds `max` when both are expressed in the same unit. Per
    /// spec §7 this is the one configuration shape treated as a real
    /// error rather than silently defaulted — `min`/`max` expressed in
    /// different units are left uncompared since there is no
    /// unambiguous caller intent to reject.
    pub fn validate(&self) -> crate::error::ChunkResult<()> {
        if self.min.unit == self.max.unit && self.min.value > self.max.value {
            return Err(crate::error::ChunkError::InvalidConfig(format!(
                "min ({} {:?}) exceeds max ({} {:?})",
                self.min.value, self.min.unit, self.max.value, self.max.unit
            )));
        }
        Ok(())
    }

    /// Pinecone / OpenAI-style preset: 512 target tokens, 8000 max.
    pub fn pinecone_openai() -> Self {
        Self {
            target: SizeLimit::new(512, Unit::Tokens, LimitType::Soft),
            min: SizeLimit::new(64, Unit::Tokens, LimitType::Soft),
            max: SizeLimit::new(8000, Unit::Tokens, LimitType::Hard),
            ..Self::default()
        }
    }

    /// Cohere preset: 256 target tokens, 512 max.
    pub fn cohere() -> Self {
        Self {
            target: SizeLimit::new(256, Unit::Tokens, LimitType::Soft),
            min: SizeLimit::new(32, Unit::Tokens, LimitType::Soft),
            max: SizeLimit::new(512, Unit::Tokens, LimitType::Hard),
            ..Self::default()
        }
    }

    /// Claude-context preset: 2000 target tokens, 8000 max.
    pub fn claude_context() -> Self {
        Self {
            target: SizeLimit::new(2000, Unit::Tokens, LimitType::Soft),
            min: SizeLimit::new(128, Unit::Tokens, LimitType::Soft),
            max: SizeLimit::new(8000, Unit::Tokens, LimitType::Hard),
            ..Self::default()
        }
    }
}

/// Closed list of abbreviations whose trailing period must not be mistaken
/// for a sentence terminator. Process-wide constant, initialised once.
static ABBREVIATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "vs", "etc", "e.g", "i.e", "inc", "ltd",
        "co", "corp", "st", "rd", "ave", "blvd", "no", "vol", "pp", "pg", "jan", "feb", "mar",
        "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
    ]
    .into_iter()
    .collect()
});

static PARAGRAPH_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());

/// Converts text to size metrics, checks it against a `SizeConfig`, and
/// finds split points. Stateless beyond its config — no mutable state, no
/// per-call allocation beyond the output.
#[derive(Debug, Clone)]
pub struct SizeCalculator {
    config: SizeConfig,
}

impl SizeCalculator {
    pub fn new(config: SizeConfig) -> Self {
        Self { config }
    }

    /// As `new`, but rejects a `min > max` configuration instead of
    /// silently constructing a calculator that can never report `valid`.
    pub fn try_new(config: SizeConfig) -> crate::error::ChunkResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SizeConfig {
        &self.config
    }

    /// Compute all five metrics for `text`. Empty text yields zero for
    /// every metric; there is no error path.
    pub fn calculate(&self, text: &str) -> SizeMetrics {
        let characters = text.chars().count();
        let tokens = (characters as f64 * self.config.tokens_per_char).floor() as usize;
        let words = count_words(text);
        let sentences = count_sentences(text);
        let paragraphs = count_paragraphs(text);
        SizeMetrics {
            characters,
            tokens,
            words,
            sentences,
            paragraphs,
        }
    }

    pub fn get_size(&self, text: &str, unit: Unit) -> usize {
        self.calculate(text).get(unit)
    }

    /// Soft targets accept `[0.8*target, 1.2*target]`; hard targets require
    /// exact equality.
    pub fn is_within_target(&self, text: &str) -> bool {
        let size = self.get_size(text, self.config.target.unit) as f64;
        let target = self.config.target.value as f64;
        match self.config.target.limit_type {
            LimitType::Soft => size >= 0.8 * target && size <= 1.2 * target,
            LimitType::Hard => size == target,
        }
    }

    pub fn is_below_min(&self, text: &str) -> bool {
        self.get_size(text, self.config.min.unit) < self.config.min.value
    }

    pub fn is_above_max(&self, text: &str) -> bool {
        self.get_size(text, self.config.max.unit) > self.config.max.value
    }

    /// Action policy from spec §4.1:
    /// 1. over max + hard -> truncate (invalid)
    /// 2. over max + soft -> split (invalid)
    /// 3. under min -> merge (valid unless min is hard)
    /// 4. otherwise -> none
    pub fn check(&self, text: &str) -> CheckResult {
        let metrics = self.calculate(text);
        let max_size = metrics.get(self.config.max.unit);
        let min_size = metrics.get(self.config.min.unit);
        let target_size = metrics.get(self.config.target.unit) as i64;

        let (is_valid, reason, suggested_action) = if max_size > self.config.max.value {
            match self.config.max.limit_type {
                LimitType::Hard => (
                    false,
                    Some(format!(
                        "exceeds hard max of {} {:?}",
                        self.config.max.value, self.config.max.unit
                    )),
                    SuggestedAction::Truncate,
                ),
                LimitType::Soft => (
                    false,
                    Some(format!(
                        "exceeds soft max of {} {:?}",
                        self.config.max.value, self.config.max.unit
                    )),
                    SuggestedAction::Split,
                ),
            }
        } else if min_size < self.config.min.value {
            let is_valid = self.config.min.limit_type != LimitType::Hard;
            (
                is_valid,
                Some(format!(
                    "below min of {} {:?}",
                    self.config.min.value, self.config.min.unit
                )),
                SuggestedAction::Merge,
            )
        } else {
            (true, None, SuggestedAction::None)
        };

        CheckResult {
            metrics,
            is_valid,
            reason,
            suggested_action,
            target_diff: target_size - self.config.target.value as i64,
        }
    }

    /// Approximate character offset for a target size in `unit`, using the
    /// ratios from spec §4.1 (tokens*4, words*6, sentences*80,
    /// paragraphs*400, characters*1).
    fn target_char_estimate(target: usize, unit: Unit) -> usize {
        match unit {
            Unit::Characters => target,
            Unit::Tokens => target * 4,
            Unit::Words => target * 6,
            Unit::Sentences => target * 80,
            Unit::Paragraphs => target * 400,
        }
    }

    /// Find the best place to split `text` near a target size.
    ///
    /// Strategy, per spec §4.1:
    /// 1. If boundaries are supplied and semantic splitting is enabled,
    ///    pick the highest-scoring boundary within ±target_pos/4.
    /// 2. Else scan backward up to 100 chars for a sentence terminator
    ///    followed by whitespace, then forward up to 100.
    /// 3. Else fall back to the nearest whitespace word boundary within
    ///    ±50.
    pub fn find_split_point(
        &self,
        text: &str,
        boundaries: &[Boundary],
        target: usize,
        unit: Unit,
    ) -> Option<usize> {
        if text.is_empty() {
            return None;
        }
        let len = text.len();
        let target_pos = Self::target_char_estimate(target, unit).min(len);

        if !boundaries.is_empty() && self.config.split_at_semantic_boundaries {
            let window = (target_pos / 4).max(1);
            if let Some(best) = best_boundary_in_window(boundaries, target_pos, window) {
                return Some(best.position.min(len));
            }
        }

        if let Some(pos) = scan_for_sentence_boundary(text, target_pos) {
            return Some(pos);
        }

        nearest_word_boundary(text, target_pos, 50)
    }

    /// Repeatedly split `text` at `max` (never `target`) using
    /// `find_split_point`. Stops when the remainder fits within max, or
    /// emits the remainder as-is when no further split point can be found
    /// (spec §7 `SplitFailure`: never silently drop content).
    pub fn split_to_size(&self, text: &str, boundaries: &[Boundary]) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let mut pieces = Vec::new();
        let mut remaining = trimmed;
        let mut consumed_offset = 0usize;
        // Shift boundaries to stay relative to `remaining` as we consume text.
        let mut live_boundaries: Vec<Boundary> = boundaries.to_vec();

        loop {
            let max_size = self.get_size(remaining, self.config.max.unit);
            if max_size <= self.config.max.value {
                pieces.push(remaining.to_string());
                break;
            }

            let relative_boundaries: Vec<Boundary> = live_boundaries
                .iter()
                .filter_map(|b| {
                    if b.position >= consumed_offset {
                        let mut shifted = b.clone();
                        shifted.position -= consumed_offset;
                        Some(shifted)
                    } else {
                        None
                    }
                })
                .collect();

            match self.find_split_point(
                remaining,
                &relative_boundaries,
                self.config.max.value,
                self.config.max.unit,
            ) {
                Some(split_at) if split_at > 0 && split_at < remaining.len() => {
                    let (head, tail) = remaining.split_at(split_at);
                    pieces.push(head.trim().to_string());
                    consumed_offset += split_at;
                    remaining = tail.trim_start();
                    // recompute consumed_offset to account for trimmed prefix
                    let trimmed_prefix = tail.len() - remaining.len();
                    consumed_offset += trimmed_prefix;
                    live_boundaries = relative_boundaries
                        .into_iter()
                        .map(|mut b| {
                            b.position = b.position.saturating_sub(split_at + trimmed_prefix);
                            b
                        })
                        .collect();
                }
                _ => {
                    // SplitFailure: no boundary found, emit remainder as-is.
                    tracing::warn!(len = remaining.len(), "no split boundary found, emitting oversize remainder");
                    pieces.push(remaining.to_string());
                    break;
                }
            }
        }

        pieces
    }

    /// Convert a size value between units, pivoting through characters.
    pub fn convert_size(&self, value: usize, from: Unit, to: Unit) -> usize {
        let chars = match from {
            Unit::Characters => value as f64,
            Unit::Tokens => value as f64 / self.config.tokens_per_char,
            Unit::Words => (value * 6) as f64,
            Unit::Sentences => (value * 80) as f64,
            Unit::Paragraphs => (value * 400) as f64,
        };
        let result = match to {
            Unit::Characters => chars,
            Unit::Tokens => chars * self.config.tokens_per_char,
            Unit::Words => chars / 6.0,
            Unit::Sentences => chars / 80.0,
            Unit::Paragraphs => chars / 400.0,
        };
        result.floor().max(0.0) as usize
    }
}

fn best_boundary_in_window(boundaries: &[Boundary], target: usize, window: usize) -> Option<&Boundary> {
    let low = target.saturating_sub(window);
    let high = target + window;
    boundaries
        .iter()
        .filter(|b| b.position >= low && b.position <= high && b.score > 0)
        .max_by(|a, b| {
            a.score
                .cmp(&b.score)
                .then_with(|| {
                    let da = (a.position as i64 - target as i64).abs();
                    let db = (b.position as i64 - target as i64).abs();
                    db.cmp(&da) // closer wins, so reverse
                })
        })
}

fn scan_for_sentence_boundary(text: &str, target_pos: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let target_pos = target_pos.min(len);

    let back_limit = target_pos.saturating_sub(100);
    for i in (back_limit..target_pos).rev() {
        if is_sentence_terminator_at(text, i) {
            return Some(i + 1);
        }
    }

    let fwd_limit = (target_pos + 100).min(len);
    for i in target_pos..fwd_limit {
        if is_sentence_terminator_at(text, i) {
            return Some(i + 1);
        }
    }

    None
}

pub(crate) fn is_sentence_terminator_at(text: &str, i: usize) -> bool {
    let bytes = text.as_bytes();
    if i >= bytes.len() {
        return false;
    }
    let c = bytes[i] as char;
    if c != '.' && c != '!' && c != '?' {
        return false;
    }
    let next_is_boundary = i + 1 >= bytes.len() || (bytes[i + 1] as char).is_whitespace();
    if !next_is_boundary {
        return false;
    }
    !is_abbreviation_or_decimal(text, i)
}

fn is_abbreviation_or_decimal(text: &str, i: usize) -> bool {
    let bytes = text.as_bytes();
    // Decimal number: digit . digit
    if i > 0 && i + 1 < bytes.len() {
        let prev = bytes[i - 1] as char;
        let next = bytes[i + 1] as char;
        if prev.is_ascii_digit() && next.is_ascii_digit() {
            return true;
        }
    }
    // Find the start of the word immediately preceding the period.
    let mut start = i;
    while start > 0 {
        let c = bytes[start - 1] as char;
        if c.is_whitespace() || c == '(' || c == '"' {
            break;
        }
        start -= 1;
    }
    let word = &text[start..i];
    if word.is_empty() {
        return false;
    }
    let lower = word.to_lowercase();
    if ABBREVIATIONS.contains(lower.as_str()) {
        return true;
    }
    // Single capital letter + period (initial), unless preceded by another
    // letter (e.g. the "c" in "McD." shouldn't count, but "J." on its own
    // should).
    if word.chars().count() == 1 {
        let c = word.chars().next().unwrap();
        if c.is_uppercase() {
            let preceded_by_letter = start > 0 && (bytes[start - 1] as char).is_alphabetic();
            return !preceded_by_letter;
        }
    }
    false
}

fn nearest_word_boundary(text: &str, target_pos: usize, tolerance: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let target_pos = target_pos.min(len);
    let low = target_pos.saturating_sub(tolerance);
    let high = (target_pos + tolerance).min(len);

    let mut best: Option<(usize, usize)> = None; // (distance, position)
    for i in low..=high {
        if i == 0 || i == len || (bytes[i.saturating_sub(1)] as char).is_whitespace() {
            let dist = (i as i64 - target_pos as i64).unsigned_abs() as usize;
            if best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, i));
            }
        }
    }
    best.map(|(_, pos)| pos)
}

/// Sentences end at `.`, `!`, `?` followed by whitespace/EOF, excluding
/// abbreviations and decimals.
pub fn count_sentences(text: &str) -> usize {
    if text.trim().is_empty() {
        return 0;
    }
    let mut count = 0;
    let bytes = text.as_bytes();
    for i in 0..bytes.len() {
        if is_sentence_terminator_at(text, i) {
            count += 1;
        }
    }
    // A trailing sentence with no terminal punctuation still counts as one.
    if count == 0 {
        1
    } else {
        count
    }
}

/// Paragraphs are runs of ≥2 consecutive newlines used as separators;
/// empty paragraphs are discarded.
pub fn count_paragraphs(text: &str) -> usize {
    PARAGRAPH_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .count()
}

/// Words are maximal runs of non-whitespace.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculate_empty_text_is_all_zero() {
        let calc = SizeCalculator::new(SizeConfig::default());
        let metrics = calc.calculate("");
        assert_eq!(metrics, SizeMetrics::default());
    }

    #[test]
    fn calculate_s1_single_paragraph() {
        let calc = SizeCalculator::new(SizeConfig::default());
        let metrics = calc.calculate("This is a single paragraph of text.");
        assert_eq!(metrics.characters, 36);
        assert_eq!(metrics.words, 8);
        assert_eq!(metrics.tokens, 9);
    }

    #[test]
    fn abbreviation_period_is_not_a_sentence_boundary() {
        assert_eq!(count_sentences("I met Dr. Smith today."), 1);
    }

    #[test]
    fn decimal_number_is_not_a_sentence_boundary() {
        assert_eq!(count_sentences("The value is 3.14 exactly."), 1);
    }

    #[test]
    fn single_capital_initial_is_abbreviation() {
        assert_eq!(count_sentences("See J. Smith for details."), 1);
    }

    #[test]
    fn two_real_sentences_are_counted() {
        assert_eq!(count_sentences("One sentence. Two sentences!"), 2);
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        assert_eq!(count_paragraphs("a\n\nb\n\n\nc"), 3);
        assert_eq!(count_paragraphs(""), 0);
    }

    #[test]
    fn check_reports_hard_max_as_truncate() {
        let config = SizeConfig {
            max: SizeLimit::new(10, Unit::Characters, LimitType::Hard),
            ..SizeConfig::default()
        };
        let calc = SizeCalculator::new(config);
        let result = calc.check("this text is definitely longer than ten chars");
        assert!(!result.is_valid);
        assert_eq!(result.suggested_action, SuggestedAction::Truncate);
    }

    #[test]
    fn check_reports_soft_max_as_split() {
        let config = SizeConfig {
            max: SizeLimit::new(10, Unit::Characters, LimitType::Soft),
            ..SizeConfig::default()
        };
        let calc = SizeCalculator::new(config);
        let result = calc.check("this text is definitely longer than ten chars");
        assert!(!result.is_valid);
        assert_eq!(result.suggested_action, SuggestedAction::Split);
    }

    #[test]
    fn check_reports_below_soft_min_as_valid_merge() {
        let calc = SizeCalculator::new(SizeConfig::default());
        let result = calc.check("short");
        assert!(result.is_valid);
        assert_eq!(result.suggested_action, SuggestedAction::Merge);
    }

    #[test]
    fn split_to_size_s3_oversize_paragraph() {
        let config = SizeConfig {
            max: SizeLimit::new(100, Unit::Characters, LimitType::Hard),
            ..SizeConfig::default()
        };
        let calc = SizeCalculator::new(config);
        let text = "Sentence one. ".repeat(30);
        let pieces = calc.split_to_size(text.trim(), &[]);
        assert!(pieces.len() >= 4);
        for piece in &pieces {
            assert!(piece.len() <= 100, "piece too long: {piece:?}");
        }
    }

    #[test]
    fn split_to_size_never_loses_content_when_no_boundary_found() {
        let config = SizeConfig {
            max: SizeLimit::new(5, Unit::Characters, LimitType::Hard),
            ..SizeConfig::default()
        };
        let calc = SizeCalculator::new(config);
        let text = "abcdefghijklmnopqrstuvwxyz";
        let pieces = calc.split_to_size(text, &[]);
        let joined: String = pieces.concat();
        assert_eq!(joined, text);
    }

    #[test]
    fn convert_size_round_trips_through_characters() {
        let calc = SizeCalculator::new(SizeConfig::default());
        let chars = calc.convert_size(10, Unit::Tokens, Unit::Characters);
        assert_eq!(chars, 40);
        let tokens = calc.convert_size(40, Unit::Characters, Unit::Tokens);
        assert_eq!(tokens, 10);
    }

    #[test]
    fn validate_rejects_min_exceeding_max_in_same_unit() {
        let config = SizeConfig {
            min: SizeLimit::new(500, Unit::Characters, LimitType::Soft),
            max: SizeLimit::new(100, Unit::Characters, LimitType::Hard),
            ..SizeConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(SizeCalculator::try_new(config).is_err());
    }

    #[test]
    fn validate_ignores_min_max_in_different_units() {
        let config = SizeConfig {
            min: SizeLimit::new(500, Unit::Tokens, LimitType::Soft),
            max: SizeLimit::new(100, Unit::Characters, LimitType::Hard),
            ..SizeConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn is_within_target_soft_band() {
        let calc = SizeCalculator::new(SizeConfig::default());
        let text = "x".repeat(1000);
        assert!(calc.is_within_target(&text));
        let too_short = "x".repeat(100);
        assert!(!calc.is_within_target(&too_short));
    }
}
