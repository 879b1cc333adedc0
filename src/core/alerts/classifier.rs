// Alarm classification: decides whether a message is an alert and which
// severity class it belongs to.
//
// Primary criteria (sender number OR any phrase) are always evaluated before
// secondary ones, so a secondary match can never hold back a primary one.

use super::model::{ClassificationResult, Severity, TriggerConfig};

/// Classify an inbound message against the trigger configuration.
///
/// Total: empty sender or body simply fail to match.
pub fn classify(sender: &str, body: &str, config: &TriggerConfig) -> ClassificationResult {
    let words: Vec<String> = tokenize(body);
    let mut severity = Severity::None;
    let mut matched_phrases = Vec::new();

    if contains_number(&config.primary_numbers, sender) {
        severity = Severity::Primary;
    }

    let primary_hits = matching_phrases(&config.primary_phrases, &words);
    if !primary_hits.is_empty() {
        severity = Severity::Primary;
        matched_phrases.extend(primary_hits);
    }

    if severity != Severity::Primary {
        if contains_number(&config.secondary_numbers, sender) {
            severity = Severity::Secondary;
        }

        let secondary_hits = matching_phrases(&config.secondary_phrases, &words);
        if !secondary_hits.is_empty() {
            severity = Severity::Secondary;
            matched_phrases.extend(secondary_hits);
        }
    }

    ClassificationResult {
        severity,
        matched_phrases,
        sender: sender.to_string(),
        body: body.to_string(),
    }
}

/// Split on single literal spaces only. Consecutive spaces yield empty
/// tokens, and tabs or newlines stay inside a token.
fn tokenize(body: &str) -> Vec<String> {
    body.split(' ').map(str::to_lowercase).collect()
}

fn contains_number(numbers: &[String], sender: &str) -> bool {
    !sender.is_empty() && numbers.iter().any(|n| n == sender)
}

/// Phrases from `phrases` that appear as a whole word, in list order.
fn matching_phrases(phrases: &[String], words: &[String]) -> Vec<String> {
    phrases
        .iter()
        .filter(|phrase| !phrase.is_empty())
        .filter(|phrase| {
            let needle = phrase.to_lowercase();
            words.iter().any(|w| *w == needle)
        })
        .cloned()
        .collect()
}
