//! Response normalization for the daemons.
//!
//! Model output is free text. These helpers cut away the parts we did not ask
//! for (echoed input, lead-in headers) and dig the sentence/challenge pair out
//! of a reply that is only meant to be JSON.

use crate::error::NormalizeError;
use serde::{Deserialize, Serialize};

const LIST_MARKER: &str = ":\n\n";
const HEADER_OPENER: &str = "Here is a ";
const RESPONSE_MARKER: &str = "response:\n\n";
/// Longest header phrase accepted between `HEADER_OPENER` and `LIST_MARKER`.
const HEADER_PHRASE_MAX: usize = 40;

const SENTENCE_OPEN: &str = "\"sentence\": \"";
const SENTENCE_CLOSE: &str = "\",\n  \"challenge\": \"";
const CHALLENGE_OPEN: &str = "\"challenge\": \"";
const CHALLENGE_CLOSE: &str = "\"\n}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub sentence: String,
    pub challenge: String,
}

/// Removes the echoed input and any preamble before the feedback list.
pub fn strip_echo(original_text: &str, raw_response: &str) -> String {
    let echoed = format!("\n{}\n", original_text);
    let without_echo = raw_response.replacen(&echoed, "", 1);

    match without_echo.find(LIST_MARKER) {
        Some(pos) => without_echo[pos + LIST_MARKER.len()..].to_string(),
        None => without_echo,
    }
}

/// Removes a boilerplate lead-in such as `Here is a rewritten passage:\n\n`.
pub fn strip_header(raw_response: &str) -> String {
    let header = raw_response.rfind(HEADER_OPENER);
    let header_end = raw_response.rfind(LIST_MARKER);

    if let (Some(start), Some(end)) = (header, header_end) {
        let phrase_start = start + HEADER_OPENER.len();
        if phrase_start <= end {
            let phrase = &raw_response[phrase_start..end];
            if phrase.chars().count() <= HEADER_PHRASE_MAX && !phrase.contains('\n') {
                return raw_response[end + LIST_MARKER.len()..].to_string();
            }
        }
    }

    match raw_response.rfind(RESPONSE_MARKER) {
        Some(pos) => raw_response[pos + RESPONSE_MARKER.len()..].to_string(),
        None => raw_response.to_string(),
    }
}

/// Narrows `raw_response` to its first `{...}` block, inclusive.
pub fn narrow_to_object(raw_response: &str) -> Result<&str, NormalizeError> {
    let open = raw_response.find('{').ok_or(NormalizeError::NoJsonFound)?;
    let close = raw_response[open..]
        .find('}')
        .ok_or(NormalizeError::NoJsonFound)?;
    Ok(&raw_response[open..=open + close])
}

/// Rewrites every `'` followed by an even number of `"` to `"`.
///
/// Purely textual: an apostrophe inside a properly quoted value is followed
/// by an odd count and survives, one in an unbalanced value does not.
pub fn repair_quotes(block: &str) -> String {
    let mut quotes_after = 0usize;
    let mut repaired: Vec<char> = Vec::with_capacity(block.len());

    for c in block.chars().rev() {
        match c {
            '"' => {
                quotes_after += 1;
                repaired.push(c);
            }
            '\'' if quotes_after % 2 == 0 => repaired.push('"'),
            _ => repaired.push(c),
        }
    }

    repaired.into_iter().rev().collect()
}

/// Pulls the sentence/challenge pair out of a Devil's Advocate reply.
pub fn extract_challenge(raw_response: &str) -> Result<Challenge, NormalizeError> {
    let block = narrow_to_object(raw_response)?;
    let repaired = repair_quotes(block);

    match serde_json::from_str::<Challenge>(&repaired) {
        Ok(challenge) => Ok(challenge),
        Err(_) => extract_by_markers(&repaired),
    }
}

fn extract_by_markers(text: &str) -> Result<Challenge, NormalizeError> {
    let sentence = between(text, SENTENCE_OPEN, SENTENCE_CLOSE, "sentence")?;
    let challenge = between(text, CHALLENGE_OPEN, CHALLENGE_CLOSE, "challenge")?;

    Ok(Challenge {
        sentence: sentence.to_string(),
        challenge: challenge.to_string(),
    })
}

fn between<'a>(
    text: &'a str,
    open: &str,
    close: &str,
    field: &'static str,
) -> Result<&'a str, NormalizeError> {
    let start = text
        .find(open)
        .map(|pos| pos + open.len())
        .ok_or(NormalizeError::ExtractionAmbiguous(field))?;
    let end = text
        .find(close)
        .ok_or(NormalizeError::ExtractionAmbiguous(field))?;

    if end < start {
        return Err(NormalizeError::ExtractionAmbiguous(field));
    }
    Ok(&text[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_echo_removes_one_occurrence() {
        let original = "I like cake.";
        let response = "\nI like cake.\n1. Add detail.\n\nI like cake.\n";
        assert_eq!(strip_echo(original, response), "1. Add detail.\n\nI like cake.\n");
    }

    #[test]
    fn test_strip_echo_cuts_preamble_after_echo() {
        let response = "Sure, here are some tips:\n\n1. Vary sentence length.\n2. Cut adverbs.";
        assert_eq!(
            strip_echo("unrelated", response),
            "1. Vary sentence length.\n2. Cut adverbs."
        );
    }

    #[test]
    fn test_strip_echo_without_echo_or_marker_is_identity() {
        let response = "1. Use fewer commas.";
        assert_eq!(strip_echo("I write.", response), response);
    }

    #[test]
    fn test_strip_header_here_is_a() {
        let response = "Here is a rewritten passage:\n\nThe fox leaps swiftly.";
        assert_eq!(strip_header(response), "The fox leaps swiftly.");
    }

    #[test]
    fn test_strip_header_response_marker() {
        let response = "My creatively rewritten response:\n\nA storm of words.";
        assert_eq!(strip_header(response), "A storm of words.");
    }

    #[test]
    fn test_strip_header_far_apart_falls_back() {
        let response = "Here is a thought that runs on for quite a long while before it stops:\n\nBody.";
        assert_eq!(strip_header(response), response);
    }

    #[test]
    fn test_strip_header_is_idempotent() {
        let samples = [
            "Here is a rewritten passage:\n\nThe fox leaps swiftly.",
            "Your creatively rewritten response:\n\nNote:\n\nHere is a twist.",
            "Plain rewrite with no header.",
            "Here is a new version:\n\nLine one.\n\nHere is a rhyme:\n\nLine two.",
        ];
        for sample in samples {
            let once = strip_header(sample);
            assert_eq!(strip_header(&once), once, "sample: {sample:?}");
        }
    }

    #[test]
    fn test_narrow_requires_both_braces() {
        assert_eq!(narrow_to_object("no json here"), Err(NormalizeError::NoJsonFound));
        assert_eq!(narrow_to_object("{ unterminated"), Err(NormalizeError::NoJsonFound));
        assert_eq!(narrow_to_object("} before {"), Err(NormalizeError::NoJsonFound));
        assert_eq!(narrow_to_object("x {\"a\": 1} y {b}"), Ok("{\"a\": 1}"));
    }

    #[test]
    fn test_repair_single_quoted_object() {
        let block = "{'sentence': 'Cats bark.', 'challenge': 'They meow.'}";
        let repaired = repair_quotes(block);
        assert_eq!(repaired, r#"{"sentence": "Cats bark.", "challenge": "They meow."}"#);
        let parsed: Challenge = serde_json::from_str(&repaired).unwrap();
        assert_eq!(parsed.challenge, "They meow.");
    }

    #[test]
    fn test_repair_keeps_apostrophes_inside_values() {
        let block = r#"{"sentence": "It's late.", "challenge": "Isn't it early?"}"#;
        assert_eq!(repair_quotes(block), block);
    }

    #[test]
    fn test_extract_well_formed_with_surrounding_text() {
        let response = "Sure!\n{\"sentence\": \"Water is dry.\", \"challenge\": \"Water is wet.\"}\nHope this helps.";
        let challenge = extract_challenge(response).unwrap();
        assert_eq!(challenge.sentence, "Water is dry.");
        assert_eq!(challenge.challenge, "Water is wet.");
    }

    #[test]
    fn test_extract_falls_back_to_markers() {
        let response = "{\n  \"sentence\": \"She said \"no\" twice.\",\n  \"challenge\": \"Why \"twice\"?\"\n}";
        let challenge = extract_challenge(response).unwrap();
        assert_eq!(challenge.sentence, "She said \"no\" twice.");
        assert_eq!(challenge.challenge, "Why \"twice\"?");
    }

    #[test]
    fn test_extract_reports_missing_marker() {
        let response = "{\"sentence\": \"one\" \"two\"}";
        assert_eq!(
            extract_challenge(response),
            Err(NormalizeError::ExtractionAmbiguous("sentence"))
        );

        let response = "{\n  \"sentence\": \"a \"b\" c\",\n  \"challenge\": \"d\" }";
        assert_eq!(
            extract_challenge(response),
            Err(NormalizeError::ExtractionAmbiguous("challenge"))
        );
    }

    #[test]
    fn test_extract_without_object() {
        assert_eq!(
            extract_challenge("I could not find any faults."),
            Err(NormalizeError::NoJsonFound)
        );
    }
}
