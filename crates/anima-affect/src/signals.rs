//! Lexical signal extraction.
//!
//! The affect engine does not understand language; it reacts to surface
//! cues. This module scans a message for those cues and reports them as a
//! [`MessageSignals`] bundle the engine turns into additive updates.
//! Word cues match whole words only (case-insensitive, punctuation
//! stripped); punctuation cues match anywhere in the text.

use std::collections::HashSet;

const POSITIVE_CUES: &[&str] = &["thanks", "thank", "great", "perfect", "excellent", "awesome"];
const NEGATIVE_CUES: &[&str] = &["wrong", "error", "no", "stop", "bad", "awful"];
const INTERROGATIVE_CUES: &[&str] = &["why", "how", "what"];
const DIRECTIVE_CUES: &[&str] = &["explain", "show", "make", "build", "teach", "create", "write"];

/// Word count above which a message counts as long.
const LONG_MESSAGE_WORDS: usize = 12;

/// Surface cues extracted from a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageSignals {
    /// Number of distinct positive cue words present.
    pub positive: usize,
    /// Number of distinct negative cue words present.
    pub negative: usize,
    /// A question mark or interrogative word is present.
    pub interrogative: bool,
    /// An exclamation mark is present.
    pub exclamation: bool,
    /// A directive verb (a request for action) is present.
    pub directive: bool,
    /// The message exceeds [`LONG_MESSAGE_WORDS`] words.
    pub long_message: bool,
}

/// Scan `text` for affect-relevant surface cues.
pub fn extract(text: &str) -> MessageSignals {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect();
    let word_set: HashSet<&str> = words.iter().copied().collect();

    MessageSignals {
        positive: POSITIVE_CUES
            .iter()
            .filter(|cue| word_set.contains(**cue))
            .count(),
        negative: NEGATIVE_CUES
            .iter()
            .filter(|cue| word_set.contains(**cue))
            .count(),
        interrogative: lowered.contains('?')
            || INTERROGATIVE_CUES.iter().any(|cue| word_set.contains(*cue)),
        exclamation: lowered.contains('!'),
        directive: DIRECTIVE_CUES.iter().any(|cue| word_set.contains(*cue)),
        long_message: words.len() > LONG_MESSAGE_WORDS,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
