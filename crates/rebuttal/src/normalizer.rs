// crates/rebuttal/src/normalizer.rs

use regex::Regex;
use retort_core::{ReplySet, RetortError, RetortResult, REPLY_COUNT};
use std::sync::LazyLock;

/// Reply used to fill the set when the completion does not contain enough usable text.
pub const DEFAULT_FILLER_REPLY: &str = "你说得对，但我不接受。";

/// Sentence fragments this short or shorter are dropped by the sentence tier.
pub const MIN_SENTENCE_CHARS: usize = 5;

/// Terminal punctuation the sentence tier splits on. ASCII `.` is left out so decimals
/// and ellipses stay inside their sentence.
pub const SENTENCE_TERMINATORS: &[char] = &['。', '！', '？'];

// ASCII digits only, then at least one period or whitespace.
static ENUMERATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+[.\s]+").expect("enumeration pattern is valid"));

/// Which tier produced the final reply set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationTier {
    Lines,
    Sentences,
    Padded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub replies: ReplySet,
    pub tier: NormalizationTier,
}

#[derive(Debug, Clone, Copy)]
pub struct ResponseNormalizer {
    filler: &'static str,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self {
            filler: DEFAULT_FILLER_REPLY,
        }
    }

    /// Rejects a blank filler, since padding with it would yield empty replies.
    pub fn with_filler(filler: &'static str) -> RetortResult<Self> {
        let filler = filler.trim();
        if filler.is_empty() {
            return Err(RetortError::Config(
                "filler reply must not be blank".to_string(),
            ));
        }
        Ok(Self { filler })
    }

    pub fn normalize(&self, raw: &str) -> ReplySet {
        self.normalize_detailed(raw).replies
    }

    pub fn normalize_detailed(&self, raw: &str) -> Normalized {
        let mut replies = split_lines(raw);
        let mut tier = NormalizationTier::Lines;

        if replies.len() < REPLY_COUNT {
            replies = split_sentences(raw);
            tier = NormalizationTier::Sentences;
        }

        if replies.len() < REPLY_COUNT {
            pad(&mut replies, self.filler);
            tier = NormalizationTier::Padded;
        }

        Normalized {
            replies: truncate(replies, self.filler),
            tier,
        }
    }
}

/// Line tier: one reply per non-empty line, leading enumeration stripped.
pub fn split_lines(raw: &str) -> Vec<String> {
    raw.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(strip_enumeration)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Sentence tier: fragments between terminal punctuation, short ones dropped, at most three.
pub fn split_sentences(raw: &str) -> Vec<String> {
    raw.split(SENTENCE_TERMINATORS)
        .map(str::trim)
        .filter(|sentence| sentence.chars().count() > MIN_SENTENCE_CHARS)
        .take(REPLY_COUNT)
        .map(str::to_string)
        .collect()
}

pub fn pad(replies: &mut Vec<String>, filler: &str) {
    while replies.len() < REPLY_COUNT {
        replies.push(filler.to_string());
    }
}

/// Keeps the first three entries in their original order.
pub fn truncate(replies: Vec<String>, filler: &str) -> ReplySet {
    let mut iter = replies.into_iter();
    let mut next = || iter.next().unwrap_or_else(|| filler.to_string());
    ReplySet::new([next(), next(), next()])
}

/// Removes a leading "1." / "2 " / "3. " style marker. Bullets and "2)" are left alone.
pub fn strip_enumeration(line: &str) -> &str {
    match ENUMERATION_MARKER.find(line) {
        Some(marker) => &line[marker.end()..],
        None => line,
    }
}
