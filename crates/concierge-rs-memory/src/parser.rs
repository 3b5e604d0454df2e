//! Extraction of entities, lists, and corrections from a finished turn.
//!
//! The matching rules live behind [`ResponseExtractor`] so they can be
//! replaced without touching the store or the reasoning loop. Extraction never
//! fails: malformed input simply yields fewer (or no) records.

use crate::model::{ConversationEntity, Correction, EntityKind, ListEntry};
use crate::store::ConversationMemory;
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Everything extracted from one user/assistant exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResponse {
    pub entities: Vec<ConversationEntity>,
    pub corrections: Vec<Correction>,
    /// Qualifying lists in the order they appear.
    pub lists: Vec<Vec<ListEntry>>,
}

impl ParsedResponse {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.corrections.is_empty() && self.lists.is_empty()
    }
}

/// Swappable extraction rules.
pub trait ResponseExtractor: Send + Sync {
    fn extract(
        &self,
        user_message: &str,
        assistant_text: &str,
        turn_number: u32,
    ) -> ParsedResponse;
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!("skipping extraction rule (pattern={pattern}, error={err})");
            None
        }
    }
}

static LINK: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"\[([^\]\n]+)\]\((\S+?)\)"));
/// "#123", "order 12345", "order number 12345", "order no. 123".
static ORDER_NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(r"(?i)(?:#|\border\s+(?:number\s+|no\.?\s*)?#?)(\d{3,})\b")
});
static LIST_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"^(?:(\d+)[.)]|([-*•]))\s+(.*)$"));
static CORRECTIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bi\s+meant\s+(?P<right>[^.!?\n,]+?)\s*,?\s+not\s+(?P<wrong>[^.!?\n,]+)",
        r"(?i)\bnot\s+(?P<wrong>[^.!?\n,]+?)\s*,?\s*i\s+meant\s+(?P<right>[^.!?\n,]+)",
        r"(?i)\bactually,?\s+(?:i\s+want(?:ed)?\s+)?(?P<right>[^.!?\n,]+?)\s*,\s*not\s+(?P<wrong>[^.!?\n,]+)",
    ]
    .iter()
    .filter_map(|pattern| compile(pattern))
    .collect()
});

const MAX_CORRECTION_WORDS: usize = 6;

const CLAUSE_OPENERS: &[&str] = &[
    "i", "i'm", "i'd", "it", "it's", "he", "she", "he's", "she's", "we", "we're", "you",
    "you're", "they", "they're", "there", "there's", "that's", "what's",
];

const LABEL_STOPWORDS: &[&str] = &[
    "the", "and", "you", "your", "here", "this", "that", "link", "more", "view", "buy", "shop",
    "now", "order", "item", "product", "click", "details",
];

/// Link, list, order-number, and correction heuristics over markdown text.
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    default_aliases: Vec<String>,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self {
            default_aliases: vec!["it".to_string(), "that".to_string(), "this".to_string()],
        }
    }

    /// Replace the pronoun aliases attached to every extracted entity.
    pub fn with_default_aliases(mut self, aliases: Vec<String>) -> Self {
        self.default_aliases = aliases;
        self
    }

    fn link_entities(
        &self,
        text: &str,
        turn_number: u32,
        seen: &mut HashSet<String>,
    ) -> Vec<ConversationEntity> {
        let Some(link) = LINK.as_ref() else {
            return Vec::new();
        };
        let mut entities = Vec::new();
        for line in text.lines() {
            let kind = if contains(&ORDER_NUMBER, line) {
                EntityKind::Order
            } else {
                EntityKind::Product
            };
            for (label, url) in links_in(link, line) {
                let Some(slug) = slugify(label).or_else(|| slugify(url)) else {
                    continue;
                };
                let id = format!("{}_{slug}", kind.as_str());
                if !seen.insert(id.clone()) {
                    continue;
                }
                let mut entity = ConversationEntity::new(id, kind, label, turn_number)
                    .with_aliases(&self.default_aliases)
                    .with_metadata(json!({ "url": url }));
                if let Some(alias) = label_alias(label) {
                    entity.add_alias(&alias);
                }
                if kind == EntityKind::Order {
                    entity.add_alias("the order");
                }
                entities.push(entity);
            }
        }
        entities
    }

    /// Order numbers mentioned outside of links.
    fn order_entities(
        &self,
        text: &str,
        turn_number: u32,
        seen: &mut HashSet<String>,
    ) -> Vec<ConversationEntity> {
        let Some(order_number) = ORDER_NUMBER.as_ref() else {
            return Vec::new();
        };
        let mut entities = Vec::new();
        for line in text.lines() {
            if contains(&LINK, line) {
                continue;
            }
            for captures in order_number.captures_iter(line) {
                let Some(number) = captures.get(1).map(|m| m.as_str()) else {
                    continue;
                };
                let id = format!("order_{number}");
                if !seen.insert(id.clone()) {
                    continue;
                }
                let number_alias = format!("order {number}");
                let hash_alias = format!("#{number}");
                let entity = ConversationEntity::new(
                    id,
                    EntityKind::Order,
                    format!("Order #{number}"),
                    turn_number,
                )
                .with_aliases(&self.default_aliases)
                .with_aliases(["the order", number_alias.as_str(), hash_alias.as_str()]);
                entities.push(entity);
            }
        }
        entities
    }

    /// Runs of at least two top-level list lines that each carry a link.
    ///
    /// Indented lines and blank lines inside a run are skipped; any other
    /// line, or a change of marker style, ends the run.
    fn lists(&self, text: &str) -> Vec<Vec<ListEntry>> {
        let (Some(marker), Some(link)) = (LIST_MARKER.as_ref(), LINK.as_ref()) else {
            return Vec::new();
        };
        let mut lists = Vec::new();
        let mut current: Vec<ListEntry> = Vec::new();
        let mut current_numbered = false;

        for line in text.lines() {
            if line.trim().is_empty() || line.starts_with([' ', '\t']) {
                continue;
            }
            let entry = marker.captures(line.trim_end()).and_then(|captures| {
                let numbered = captures.get(1).is_some();
                let rest = captures.get(3).map_or("", |m| m.as_str());
                links_in(link, rest)
                    .into_iter()
                    .next()
                    .map(|(label, url)| (numbered, ListEntry::new(label, Some(url.to_string()))))
            });
            match entry {
                Some((numbered, entry)) if current.is_empty() || numbered == current_numbered => {
                    current_numbered = numbered;
                    current.push(entry);
                }
                Some((numbered, entry)) => {
                    flush_list(&mut lists, &mut current);
                    current_numbered = numbered;
                    current.push(entry);
                }
                None => flush_list(&mut lists, &mut current),
            }
        }
        flush_list(&mut lists, &mut current);
        lists
    }

    fn corrections(&self, user_message: &str, turn_number: u32) -> Vec<Correction> {
        for pattern in CORRECTIONS.iter() {
            let Some(captures) = pattern.captures(user_message) else {
                continue;
            };
            let right = captures.name("right").map_or("", |m| clean_phrase(m.as_str()));
            let wrong = captures.name("wrong").map_or("", |m| clean_phrase(m.as_str()));
            if !is_correction_phrase(right)
                || !is_correction_phrase(wrong)
                || right.eq_ignore_ascii_case(wrong)
            {
                continue;
            }
            return vec![Correction {
                wrong: wrong.to_string(),
                right: right.to_string(),
                context: user_message.to_string(),
                turn_number,
            }];
        }
        Vec::new()
    }
}

impl ResponseExtractor for HeuristicExtractor {
    fn extract(
        &self,
        user_message: &str,
        assistant_text: &str,
        turn_number: u32,
    ) -> ParsedResponse {
        let mut seen = HashSet::new();
        let mut entities = self.link_entities(assistant_text, turn_number, &mut seen);
        entities.extend(self.order_entities(user_message, turn_number, &mut seen));
        entities.extend(self.order_entities(assistant_text, turn_number, &mut seen));

        ParsedResponse {
            entities,
            corrections: self.corrections(user_message, turn_number),
            lists: self.lists(assistant_text),
        }
    }
}

fn flush_list(lists: &mut Vec<Vec<ListEntry>>, current: &mut Vec<ListEntry>) {
    if current.len() >= 2 {
        lists.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

fn contains(regex: &LazyLock<Option<Regex>>, text: &str) -> bool {
    regex.as_ref().is_some_and(|regex| regex.is_match(text))
}

/// Markdown links on a line, skipping images.
fn links_in<'a>(link: &Regex, line: &'a str) -> Vec<(&'a str, &'a str)> {
    link.captures_iter(line)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            if line[..whole.start()].ends_with('!') {
                return None;
            }
            let label = captures.get(1)?.as_str().trim();
            let url = captures.get(2)?.as_str();
            (!label.is_empty()).then_some((label, url))
        })
        .collect()
}

fn slugify(text: &str) -> Option<String> {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    (!slug.is_empty()).then(|| slug.to_string())
}

/// Lower-cased label usable as an alias, or `None` when it is too short or
/// too common to single out one entity.
fn label_alias(label: &str) -> Option<String> {
    let alias = label.to_lowercase();
    if alias.chars().filter(|c| c.is_alphanumeric()).count() < 3
        || LABEL_STOPWORDS.contains(&alias.as_str())
    {
        return None;
    }
    Some(alias)
}

/// A short noun phrase, not a clause opener like "it's" or "I".
fn is_correction_phrase(phrase: &str) -> bool {
    let normalized = phrase.to_lowercase().replace('\u{2019}', "'");
    let words = normalized.split_whitespace().collect::<Vec<_>>();
    let Some(first) = words.first() else {
        return false;
    };
    if words.len() > MAX_CORRECTION_WORDS || CLAUSE_OPENERS.contains(first) {
        return false;
    }
    !(words.len() == 1 && matches!(*first, "that" | "this"))
}

fn clean_phrase(text: &str) -> &str {
    text.trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '“' | '”'))
        .trim()
}

/// Extract records from one exchange with the default heuristics.
pub fn parse_response(
    user_message: &str,
    assistant_text: &str,
    turn_number: u32,
) -> ParsedResponse {
    HeuristicExtractor::new().extract(user_message, assistant_text, turn_number)
}

/// Parse an exchange at the memory's current turn and track the results.
pub fn parse_and_track_entities(
    extractor: &dyn ResponseExtractor,
    assistant_text: &str,
    user_message: &str,
    memory: &mut ConversationMemory,
) -> ParsedResponse {
    let parsed = extractor.extract(user_message, assistant_text, memory.current_turn());
    debug!(
        "parsed exchange (entities={}, lists={}, corrections={}, turn={})",
        parsed.entities.len(),
        parsed.lists.len(),
        parsed.corrections.len(),
        memory.current_turn()
    );
    for entity in &parsed.entities {
        memory.track_entity(entity.clone());
    }
    for list in &parsed.lists {
        memory.track_list(list.clone());
    }
    for correction in &parsed.corrections {
        memory.track_correction(
            correction.wrong.clone(),
            correction.right.clone(),
            correction.context.clone(),
        );
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_input_yields_nothing() {
        let parsed = parse_response("", "", 3);
        assert!(parsed.is_empty());
    }

    #[test]
    fn numbered_links_become_list_and_entities() {
        let text = "Here are some options:\n1. [A](u1)\n2. [B](u2)\n3. [C](u3)\n\nAnything else?";
        let parsed = parse_response("show me boots", text, 2);

        assert_eq!(parsed.lists.len(), 1);
        let names = parsed.lists[0].iter().map(|entry| entry.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(parsed.entities.len(), 3);
        assert_eq!(parsed.entities[1].id, "product_b");
        assert_eq!(parsed.entities[1].turn_number, 2);
        assert_eq!(parsed.entities[1].aliases, vec!["it", "that", "this"]);
        assert_eq!(parsed.entities[1].url(), Some("u2"));
    }

    #[test]
    fn single_item_run_is_not_a_list() {
        let parsed = parse_response("", "- [Only](https://shop.example/only)\n\nThat's it.", 0);
        assert!(parsed.lists.is_empty());
        assert_eq!(parsed.entities.len(), 1);
    }

    #[test]
    fn indented_detail_lines_do_not_break_a_list() {
        let text = "1. [Trail Boot](https://s/1)\n   $120, waterproof\n\n2. [City Boot](https://s/2)\n   $90\n- [Sock](https://s/3)\n- [Lace](https://s/4)";
        let parsed = parse_response("", text, 0);
        assert_eq!(parsed.lists.len(), 2);
        assert_eq!(parsed.lists[0].len(), 2);
        assert_eq!(parsed.lists[1][0].name, "Sock");
    }

    #[test]
    fn list_line_without_link_ends_the_run() {
        let text = "1. [A](u1)\n2. Plain text\n3. [C](u3)";
        let parsed = parse_response("", text, 0);
        assert!(parsed.lists.is_empty());
    }

    #[test]
    fn image_links_are_ignored() {
        let parsed = parse_response("", "![photo](https://img/1.png) [Boot](https://s/boot)", 0);
        let ids = parsed.entities.iter().map(|e| e.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["product_boot"]);
    }

    #[test]
    fn order_context_marks_link_as_order() {
        let parsed = parse_response("", "Your order [#10023](https://s/orders/10023) has shipped.", 1);
        assert_eq!(parsed.entities.len(), 1);
        assert_eq!(parsed.entities[0].kind, EntityKind::Order);
        assert!(parsed.entities[0].aliases.contains(&"the order".to_string()));
    }

    #[test]
    fn verb_order_keeps_link_a_product() {
        let parsed = parse_response("", "You can order [Trail Boot](https://s/boot) online today.", 0);
        assert_eq!(parsed.entities.len(), 1);
        assert_eq!(parsed.entities[0].id, "product_trail-boot");
        assert_eq!(parsed.entities[0].kind, EntityKind::Product);
        assert!(!parsed.entities[0].aliases.contains(&"the order".to_string()));

        let numbered = parse_response("", "Order 10023 contains [Trail Boot](https://s/boot).", 0);
        assert_eq!(numbered.entities[0].kind, EntityKind::Order);
    }

    #[test]
    fn short_or_common_labels_are_not_aliases() {
        let parsed = parse_response("", "[A](u1) [Here](u2) [Trail Boot](u3)", 0);
        let aliases = parsed
            .entities
            .iter()
            .map(|entity| entity.aliases.last().cloned().unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(aliases, vec!["this", "this", "trail boot"]);

        let mut memory = ConversationMemory::new();
        for entity in parsed.entities {
            memory.track_entity(entity);
        }
        let resolved = memory.resolve_reference("I want a refund").expect("entity");
        assert_eq!(resolved.id, "product_trail-boot");
    }

    #[test]
    fn bare_order_numbers_become_order_entities() {
        let parsed = parse_response("Where is order 55501?", "Order #55501 is on its way.", 4);
        assert_eq!(parsed.entities.len(), 1);
        let order = &parsed.entities[0];
        assert_eq!(order.id, "order_55501");
        assert_eq!(order.value, "Order #55501");
        assert!(order.aliases.contains(&"the order".to_string()));
        assert!(order.aliases.contains(&"#55501".to_string()));
    }

    #[test]
    fn corrections_are_extracted_from_user_message() {
        let cases = [
            ("I meant ZF4 not ZF5", "ZF4", "ZF5"),
            ("Sorry, I meant the blue one, not the red one. Thanks!", "the blue one", "the red one"),
            ("not the ZF5, I meant the ZF4", "the ZF4", "the ZF5"),
            ("Actually size 10, not size 9", "size 10", "size 9"),
        ];
        for (message, right, wrong) in cases {
            let parsed = parse_response(message, "", 0);
            assert_eq!(parsed.corrections.len(), 1, "message: {message}");
            assert_eq!(parsed.corrections[0].right, right, "message: {message}");
            assert_eq!(parsed.corrections[0].wrong, wrong, "message: {message}");
            assert_eq!(parsed.corrections[0].context, message);
        }
        for message in [
            "Is it not available?",
            "I meant it's not working",
            "I meant that, not this",
            "I meant to ask whether the boots you showed me earlier are waterproof, not leather",
        ] {
            assert!(parse_response(message, "", 0).corrections.is_empty(), "message: {message}");
        }
    }

    #[test]
    fn malformed_markup_is_tolerated() {
        let text = "1. [broken(link\n2. [](empty)\n[[nested]](x) ]( )\n".repeat(200);
        let parsed = parse_response("???", &text, 0);
        assert!(parsed.lists.is_empty());
    }

    #[test]
    fn parse_and_track_writes_into_memory_at_current_turn() {
        let mut memory = ConversationMemory::new();
        memory.increment_turn();
        memory.increment_turn();
        let extractor = HeuristicExtractor::new();

        parse_and_track_entities(
            &extractor,
            "1. [A](u1)\n2. [B](u2)\n3. [C](u3)",
            "I meant boots not shoes",
            &mut memory,
        );

        assert_eq!(memory.resolve_list_item(2).expect("item").name, "B");
        assert_eq!(memory.corrections()[0].turn_number, 2);
        assert_eq!(memory.resolve_reference("it").expect("entity").turn_number, 2);
        assert!(memory.generate_context_summary().contains("\"boots\", not \"shoes\""));
    }

    #[test]
    fn custom_default_aliases_are_applied() {
        let extractor = HeuristicExtractor::new().with_default_aliases(vec!["that one".to_string()]);
        let parsed = extractor.extract("", "[Boots](https://s/boots)", 0);
        assert_eq!(parsed.entities[0].aliases, vec!["that one", "boots"]);
    }
}
