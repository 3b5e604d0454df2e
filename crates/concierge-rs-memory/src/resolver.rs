//! Phrase classification for reference resolution.

const ORDINAL_WORDS: &[&str] = &[
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
];

/// Words that introduce an explicit list position ("item 2", "option 3").
const POSITION_PREFIXES: &[&str] = &["item", "number", "option", "choice"];

/// Nouns that turn an ordinal word into a list reference ("the second one").
const POSITION_NOUNS: &[&str] = &["one", "ones", "item", "option", "choice", "link", "product"];

/// Words that may surround a bare ordinal without changing its meaning.
const FILLER: &[&str] = &["the", "please", "one"];

/// Positional reference into the active list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdinalReference {
    /// 1-based position.
    Position(usize),
    /// Final item of the list.
    Last,
}

/// Classify a phrase as an ordinal/list reference.
///
/// Only explicit list phrasing counts: "item N", "number N", "#N", an
/// ordinal followed by a position noun ("the second one", "the 4th option"),
/// a phrase that is nothing but an ordinal ("second", "the last"), or one
/// ending in "the <ordinal>". Incidental words such as "how long does it
/// last" are left for alias matching. Positions are capped at two digits so
/// order numbers like "#12345" are not read as positions.
pub fn parse_ordinal(phrase: &str) -> Option<OrdinalReference> {
    let phrase = phrase.to_lowercase();
    let tokens = tokenize(&phrase);

    for (index, token) in tokens.iter().enumerate() {
        if let Some(digits) = token.strip_prefix('#') {
            if let Some(position) = parse_position(digits) {
                return Some(OrdinalReference::Position(position));
            }
            continue;
        }
        if POSITION_PREFIXES.contains(token)
            && let Some(position) = tokens.get(index + 1).and_then(|next| parse_position(next))
        {
            return Some(OrdinalReference::Position(position));
        }
        let Some(ordinal) = ordinal_token(token) else {
            continue;
        };
        let next = tokens.get(index + 1);
        let followed_by_noun = next.is_some_and(|next| POSITION_NOUNS.contains(next));
        let ends_after_article = next.is_none() && index > 0 && tokens[index - 1] == "the";
        if followed_by_noun || ends_after_article {
            return Some(ordinal);
        }
    }

    let mut significant = tokens.iter().filter(|token| !FILLER.contains(token));
    match (significant.next(), significant.next()) {
        (Some(token), None) => ordinal_token(token),
        _ => None,
    }
}

fn ordinal_token(token: &str) -> Option<OrdinalReference> {
    if token == "last" {
        return Some(OrdinalReference::Last);
    }
    ORDINAL_WORDS
        .iter()
        .position(|word| *word == token)
        .map(|offset| offset + 1)
        .or_else(|| parse_numeric_ordinal(token))
        .map(OrdinalReference::Position)
}

/// Split a lower-cased phrase into word tokens, keeping `#` and apostrophes.
pub(crate) fn tokenize(phrase: &str) -> Vec<&str> {
    phrase
        .split(|c: char| !(c.is_alphanumeric() || c == '#' || c == '\''))
        .filter(|token| !token.is_empty())
        .collect()
}

/// Whether every token of `alias` appears contiguously in `phrase_tokens`.
pub(crate) fn alias_matches(alias: &str, phrase_tokens: &[&str]) -> bool {
    let alias_tokens = tokenize(alias);
    if alias_tokens.is_empty() || alias_tokens.len() > phrase_tokens.len() {
        return false;
    }
    phrase_tokens
        .windows(alias_tokens.len())
        .any(|window| window == alias_tokens.as_slice())
}

fn parse_position(token: &str) -> Option<usize> {
    if token.is_empty() || token.len() > 2 || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse::<usize>().ok().filter(|position| *position > 0)
}

fn parse_numeric_ordinal(token: &str) -> Option<usize> {
    ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| token.strip_suffix(suffix))
        .and_then(parse_position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recognises_ordinal_forms() {
        let cases = [
            ("the second one", Some(OrdinalReference::Position(2))),
            ("item 3", Some(OrdinalReference::Position(3))),
            ("number 1 please", Some(OrdinalReference::Position(1))),
            ("#2", Some(OrdinalReference::Position(2))),
            ("the 4th one", Some(OrdinalReference::Position(4))),
            ("Tenth", Some(OrdinalReference::Position(10))),
            ("the last one", Some(OrdinalReference::Last)),
            ("it", None),
            ("where is #12345", None),
            ("item 0", None),
            ("what about the third", Some(OrdinalReference::Position(3))),
            ("2nd please", Some(OrdinalReference::Position(2))),
            ("how long does it last", None),
            ("is this the first time it ships", None),
            ("last", Some(OrdinalReference::Last)),
            ("no 2 sizes fit", None),
        ];
        for (phrase, expected) in cases {
            assert_eq!(parse_ordinal(phrase), expected, "phrase: {phrase}");
        }
    }

    #[test]
    fn alias_match_requires_contiguous_tokens() {
        let phrase = "where is the order now";
        let tokens = tokenize(phrase);
        assert!(alias_matches("the order", &tokens));
        assert!(!alias_matches("order the", &tokens));
        assert!(!alias_matches("it", &tokens));
        assert!(!alias_matches("", &tokens));
    }
}
