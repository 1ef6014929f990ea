//! Lexical behavior extraction.
//!
//! Every message is reduced to four small integers:
//! - OC (openness / elaboration): length, reasons, novel vocabulary, answering
//! - IN (interpersonal engagement): acknowledging or answering the partner
//! - IQ (inquiry): asking a question
//! - RF (reflection): paraphrasing or summarizing
//!
//! Matching is case-insensitive substring and token matching only.

use crate::memory::{significant_tokens, TokenMemory};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Each component is in [0, 2].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorVector {
    pub openness: u8,
    pub engagement: u8,
    pub inquiry: u8,
    pub reflection: u8,
}

const REFLECTION_PHRASES: &[&str] = &["it sounds like", "in other words", "to summarize"];

const ENGAGEMENT_CUES: &[&str] = &[
    "you said",
    "you mentioned",
    "that makes sense",
    "i hear you",
    "good point",
];

const SELF_DISCLOSURE_MARKERS: &[&str] = &[
    "because",
    "for me",
    "i think",
    "i feel",
    "my favorite",
    "i prefer",
    "i like",
    "i have",
    "i'm ",
    "im ",
];

const ELABORATION_MARKERS: &[&str] = &["because", "for example", "in my experience"];

const ELABORATE_LENGTH: usize = 60;
const NOVEL_TOKEN_THRESHOLD: usize = 4;
const OVERLAP_THRESHOLD: usize = 2;

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| text.contains(p))
}

fn clamp02(value: i32) -> u8 {
    value.clamp(0, 2) as u8
}

/// True when the message discloses something about the speaker or contains a number.
pub fn answers_something(lowered: &str) -> bool {
    contains_any(lowered, SELF_DISCLOSURE_MARKERS) || lowered.chars().any(|c| c.is_ascii_digit())
}

/// Number of significant tokens in `a` that also appear in `b`.
/// Each token occurrence in `a` counts once, however often it appears in `b`.
pub fn overlap_score(a: &str, b: &str) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let partner_tokens: HashSet<&str> = significant_tokens(b).collect();
    significant_tokens(a)
        .filter(|tok| partner_tokens.contains(tok))
        .count()
}

/// Number of significant tokens in the message that the memory has not seen.
pub fn novel_token_count(lowered: &str, memory: &TokenMemory) -> usize {
    significant_tokens(lowered)
        .filter(|tok| !memory.contains(tok))
        .count()
}

/// Extract a behavior vector for `message` given the partner's previous message.
/// Neither input nor the memory is modified.
pub fn extract(message: &str, partner_last: &str, memory: &TokenMemory) -> BehaviorVector {
    let m = message.to_lowercase();
    let pl = partner_last.to_lowercase();

    let partner_asked = pl.contains('?');
    let i_asked = m.contains('?');

    let reflects = m.starts_with("so ") || contains_any(&m, REFLECTION_PHRASES);
    let cue = contains_any(&m, ENGAGEMENT_CUES);
    let answered = answers_something(&m);
    let overlap = overlap_score(&m, &pl);

    let engaged =
        cue || (partner_asked && answered) || (overlap >= OVERLAP_THRESHOLD && answered);

    let mut openness: i32 = 0;
    if m.chars().count() >= ELABORATE_LENGTH {
        openness += 1;
    }
    if contains_any(&m, ELABORATION_MARKERS) {
        openness += 1;
    }
    if novel_token_count(&m, memory) >= NOVEL_TOKEN_THRESHOLD {
        openness += 1;
    }
    if partner_asked && answered {
        openness += 1;
    }
    // Deflecting a question with another question.
    if partner_asked && !answered && i_asked {
        openness -= 1;
    }

    BehaviorVector {
        openness: clamp02(openness),
        engagement: clamp02(i32::from(engaged)),
        inquiry: clamp02(i32::from(i_asked)),
        reflection: clamp02(i32::from(reflects)),
    }
}
