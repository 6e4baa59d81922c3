//! Topic extraction from topic-gathering replies.
//!
//! The model is told to confirm the chosen topic out loud; we look for one of
//! a handful of confirmation phrases and take what follows it, up to the end
//! of the sentence.

/// Checked in this order. The first phrase that yields a non-empty topic wins.
pub const CONFIRMATION_PHRASES: [&str; 5] = [
    "so you want to learn about",
    "your chosen topic is",
    "you're interested in",
    "let's explore",
    "great! so your topic is",
];

const TERMINATORS: [char; 4] = ['.', '!', '?', '\n'];

/// Extract the confirmed topic from a model reply, if there is one.
///
/// Matching is ASCII case-insensitive. For each phrase, only its first
/// occurrence is considered; an empty candidate falls through to the next
/// phrase rather than being returned.
pub fn extract_topic(reply: &str) -> Option<String> {
    // ASCII folding keeps byte offsets identical to `reply`.
    let lowered = reply.to_ascii_lowercase();

    CONFIRMATION_PHRASES.iter().find_map(|phrase| {
        let start = lowered.find(phrase)? + phrase.len();
        let rest = &reply[start..];
        let end = rest.find(|c: char| TERMINATORS.contains(&c)).unwrap_or(rest.len());
        let topic = clean(&rest[..end]);
        if topic.is_empty() {
            None
        } else {
            Some(topic.to_string())
        }
    })
}

fn clean(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix(':')
        .or_else(|| trimmed.strip_prefix('-'))
        .unwrap_or(trimmed);
    trimmed.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '"' | '\''))
}

/// Upper-case the first letter of every word and lower-case the rest.
/// Words are separated by whitespace or hyphens.
pub fn title_case(topic: &str) -> String {
    let mut out = String::with_capacity(topic.len());
    let mut word_start = true;
    for c in topic.chars() {
        if c.is_whitespace() || c == '-' {
            out.push(c);
            word_start = true;
        } else if word_start {
            out.extend(c.to_uppercase());
            word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}
