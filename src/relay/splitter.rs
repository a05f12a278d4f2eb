//! Reply Splitter
//!
//! Parses a tutor completion into the English phrase to voice and the Russian
//! explanation to show under it. Completions do not always follow the requested
//! `phrase / --- / explanation` layout, so parsing falls back to a line scan and
//! the orchestrator may run [`repair`] on the result.

/// Token separating the phrase from the explanation, in replies and in our output.
pub const SEPARATOR: &str = "---";

/// Phrase used when nothing usable can be recovered from a reply.
pub const PLACEHOLDER_PHRASE: &str = "Translation not available";

/// A completion split into its two parts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedReply {
    pub phrase: String,
    /// Possibly empty. Line structure is kept as received.
    pub explanation: String,
}

impl ParsedReply {
    pub fn new(phrase: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            explanation: explanation.into(),
        }
    }

    /// The phrase is unusable for speech: empty or still carrying Cyrillic.
    pub fn needs_repair(&self) -> bool {
        self.phrase.trim().is_empty() || has_native(&self.phrase)
    }

    /// Text reply shown to the user.
    pub fn compose(&self) -> String {
        if self.explanation.is_empty() {
            self.phrase.clone()
        } else {
            format!("{}\n\n{}\n\n{}", self.phrase, SEPARATOR, self.explanation)
        }
    }
}

/// Cyrillic block, U+0400..=U+04FF.
pub fn is_native_char(c: char) -> bool {
    ('\u{0400}'..='\u{04FF}').contains(&c)
}

pub fn is_target_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

pub fn has_native(text: &str) -> bool {
    text.chars().any(is_native_char)
}

fn is_bracket(c: char) -> bool {
    c == '[' || c == ']'
}

/// Split a raw completion into phrase and explanation.
pub fn split(raw: &str) -> ParsedReply {
    let raw = raw.trim();

    let (phrase, explanation) = match raw.split_once(SEPARATOR) {
        Some((before, after)) => (before.trim().to_string(), after.trim().to_string()),
        None => split_by_lines(raw),
    };

    let phrase = clean_phrase(&phrase);
    let explanation = explanation.trim().to_string();

    tracing::debug!(
        "Split reply: phrase='{}', explanation='{}'",
        phrase,
        crate::utils::truncate_str(&explanation, 50)
    );

    ParsedReply {
        phrase,
        explanation,
    }
}

/// No separator: take the first line that looks like an English phrase.
fn split_by_lines(raw: &str) -> (String, String) {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let phrase_line = lines.iter().position(|line| {
        line.chars().any(is_target_letter) && !has_native(line) && !line.starts_with('[')
    });

    match phrase_line {
        Some(i) => (lines[i].to_string(), lines[i + 1..].join("\n")),
        None => match lines.split_first() {
            Some((first, rest)) => (first.to_string(), rest.join("\n")),
            None => (raw.to_string(), String::new()),
        },
    }
}

/// Drop surrounding brackets and collapse whitespace runs.
fn clean_phrase(phrase: &str) -> String {
    phrase
        .trim_matches(is_bracket)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best-effort recovery of a phrase that came out empty or with Cyrillic in it.
///
/// An empty phrase is replaced by whatever precedes the separator in `raw`
/// (or all of `raw`), then by [`PLACEHOLDER_PHRASE`]. A phrase with Cyrillic is
/// replaced by the first clean line of `raw`, if any; otherwise it is kept.
pub fn repair(parsed: ParsedReply, raw: &str) -> ParsedReply {
    let ParsedReply {
        mut phrase,
        explanation,
    } = parsed;

    if phrase.trim().is_empty() {
        tracing::warn!("Phrase is empty, falling back to raw reply: {}", raw);
        let head = raw.split_once(SEPARATOR).map_or(raw, |(before, _)| before);
        phrase = head.trim().to_string();
        if phrase.is_empty() {
            phrase = PLACEHOLDER_PHRASE.to_string();
        }
    }

    if has_native(&phrase) {
        tracing::warn!("Cyrillic found in phrase: {}", phrase);
        let candidate = raw.lines().map(str::trim).find(|line| {
            !line.is_empty()
                && !has_native(line)
                && line.chars().any(char::is_alphabetic)
                && !line.contains(SEPARATOR)
                && !line.starts_with('[')
        });
        match candidate {
            Some(line) => phrase = line.to_string(),
            None => tracing::warn!("No clean line to recover the phrase from"),
        }
    }

    ParsedReply {
        phrase,
        explanation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_on_separator() {
        let parsed = split("Hello world.\n---\nОбъяснение.");
        assert_eq!(parsed, ParsedReply::new("Hello world.", "Объяснение."));
        assert!(!parsed.needs_repair());
    }

    #[test]
    fn test_split_strips_brackets_without_separator() {
        let parsed = split("[I am fine]\n\nЯ в порядке.");
        assert_eq!(parsed.phrase, "I am fine");
        assert_eq!(parsed.explanation, "Я в порядке.");
    }

    #[test]
    fn test_split_native_only_keeps_first_line() {
        let parsed = split("Привет, как дела?");
        assert_eq!(parsed.phrase, "Привет, как дела?");
        assert_eq!(parsed.explanation, "");
        assert!(parsed.needs_repair());
    }

    #[test]
    fn test_split_only_first_separator_counts() {
        let parsed = split("I eat rice.\n---\nГлагол eat.\n---\nЕщё пример.");
        assert_eq!(parsed.phrase, "I eat rice.");
        assert_eq!(parsed.explanation, "Глагол eat.\n---\nЕщё пример.");
    }

    #[test]
    fn test_split_bracketed_phrase_with_separator() {
        let parsed = split("[I   like\n  buckwheat porridge.]\n\n---\n\n[Объяснение]\n  вторая строка");
        assert_eq!(parsed.phrase, "I like buckwheat porridge.");
        assert_eq!(parsed.explanation, "[Объяснение]\n  вторая строка");
    }

    #[test]
    fn test_split_scans_past_russian_preamble() {
        let raw = "Вот перевод:\nI drink milk every day.\nГлагол drink.\nНаречие every day.";
        let parsed = split(raw);
        assert_eq!(parsed.phrase, "I drink milk every day.");
        assert_eq!(parsed.explanation, "Глагол drink.\nНаречие every day.");
    }

    #[test]
    fn test_split_mixed_script_line_is_skipped() {
        let parsed = split("I like гречка.\nI like buckwheat.");
        assert_eq!(parsed.phrase, "I like buckwheat.");
        assert_eq!(parsed.explanation, "");
    }

    #[test]
    fn test_split_empty_reply() {
        let parsed = split("   \n  ");
        assert_eq!(parsed, ParsedReply::default());
        assert!(parsed.needs_repair());
    }

    #[test]
    fn test_split_separator_first() {
        let parsed = split("---\nТолько объяснение.");
        assert_eq!(parsed.phrase, "");
        assert_eq!(parsed.explanation, "Только объяснение.");
    }

    #[test]
    fn test_repair_empty_phrase_uses_placeholder() {
        let raw = "---\nТолько объяснение.";
        let repaired = repair(split(raw), raw);
        // nothing precedes the separator
        assert_eq!(repaired.phrase, PLACEHOLDER_PHRASE);
        assert_eq!(repaired.explanation, "Только объяснение.");
    }

    #[test]
    fn test_repair_empty_phrase_uses_raw_reply() {
        let parsed = ParsedReply::new("", "");
        let repaired = repair(parsed, "  Good morning!  ");
        assert_eq!(repaired.phrase, "Good morning!");
    }

    #[test]
    fn test_repair_replaces_native_phrase_with_clean_line() {
        let raw = "Перевод: I am tired\n\nI am tired.\n---\nУстал = tired.";
        let parsed = ParsedReply::new("Перевод: I am tired", "Устал = tired.");
        let repaired = repair(parsed, raw);
        assert_eq!(repaired.phrase, "I am tired.");
        assert_eq!(repaired.explanation, "Устал = tired.");
    }

    #[test]
    fn test_repair_skips_bracketed_and_separator_lines() {
        let raw = "Привет\n[Hello]\n--- ok\nHi there";
        let repaired = repair(split(raw), raw);
        assert_eq!(repaired.phrase, "Hi there");
    }

    #[test]
    fn test_repair_leaves_phrase_when_nothing_clean() {
        let raw = "Привет, как дела?";
        let repaired = repair(split(raw), raw);
        assert_eq!(repaired.phrase, "Привет, как дела?");
        assert!(repaired.needs_repair());
    }

    #[test]
    fn test_compose_with_and_without_explanation() {
        let reply = ParsedReply::new("I am fine", "Я в порядке.");
        assert_eq!(reply.compose(), "I am fine\n\n---\n\nЯ в порядке.");
        assert_eq!(ParsedReply::new("I am fine", "").compose(), "I am fine");
    }

    #[test]
    fn test_split_is_idempotent_on_composed_reply() {
        let first = split("[I like rice.]\n---\nRice = рис.\nПростое настоящее.");
        let again = split(&first.compose());
        assert_eq!(first, again);
        assert!(!again.needs_repair());
    }

    #[test]
    fn test_alphabet_membership() {
        assert!(is_native_char('Ж'));
        assert!(is_native_char('ё'));
        assert!(!is_native_char('e'));
        assert!(is_target_letter('Q'));
        assert!(!is_target_letter('é'));
        assert!(!is_target_letter('7'));
    }

    fn expected_phrase(raw: &str) -> String {
        raw.trim()
            .trim_matches(|c| c == '[' || c == ']')
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    proptest! {
        #[test]
        fn prop_single_separator_splits_in_two(
            phrase in "[A-Za-z\\[\\] ,.!?]{0,40}",
            explanation in "[а-яА-Яa-z \n.,]{0,60}",
        ) {
            let raw = format!("{}\n{}\n{}", phrase, SEPARATOR, explanation);
            let parsed = split(&raw);
            prop_assert_eq!(parsed.phrase, expected_phrase(&phrase));
            prop_assert_eq!(parsed.explanation, explanation.trim().to_string());
        }

        #[test]
        fn prop_plain_lines_take_first_as_phrase(
            lines in proptest::collection::vec("[A-Za-z]([A-Za-z ,]{0,20}[A-Za-z.])?", 1..6),
        ) {
            let raw = lines.join("\n");
            let parsed = split(&raw);
            prop_assert_eq!(parsed.phrase, expected_phrase(&lines[0]));
            prop_assert_eq!(parsed.explanation, lines[1..].join("\n"));
        }
    }
}
