//! System prompt composition from a static base prompt and conversation memory.

use concierge_rs_memory::ConversationMemory;

/// Separator between the static prompt and generated sections.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Base prompt used when the caller configures none.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful customer-service assistant for an online store. \
Answer questions about products, orders, and store policies. \
Use the available tools to look up facts instead of guessing, and include links to the pages you reference.";

const RESOLVING_REFERENCES: &str = "### Resolving References
- When the user says \"it\", \"that\", or \"this\", they mean the most recently mentioned item above unless they say otherwise.
- When the user says \"the first one\", \"item 2\", or \"the last one\", use the position in the Active Numbered List.
- If a reference is still ambiguous, ask a short clarifying question instead of guessing.";

const HANDLING_CORRECTIONS: &str = "### Handling Corrections
- Apply every correction listed above; never repeat the wrong value.
- Acknowledge a new correction briefly (for example \"Got it, you meant X.\") and continue with the corrected value.";

const TOPIC_SWITCHES: &str = "### Topic Switches
- If the user changes topic, answer the new question directly.
- Do not carry details from the earlier topic into the new answer unless the user refers back to them.";

/// Append the conversation-context block to `base`.
///
/// Returns `base` unchanged when there is no memory or nothing to summarize.
/// Memory is only read.
pub fn get_enhanced_prompt(base: &str, memory: Option<&ConversationMemory>) -> String {
    let Some(memory) = memory else {
        return base.to_string();
    };
    let summary = memory.generate_context_summary();
    if summary.is_empty() {
        return base.to_string();
    }

    let sections = [
        format!("## Conversation Context\n\n{summary}"),
        RESOLVING_REFERENCES.to_string(),
        HANDLING_CORRECTIONS.to_string(),
        TOPIC_SWITCHES.to_string(),
    ];
    format!("{base}{SECTION_SEPARATOR}{}", sections.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_rs_memory::{ConversationEntity, EntityKind, ListEntry};
    use pretty_assertions::assert_eq;

    #[test]
    fn without_memory_base_is_returned_verbatim() {
        let base = "  Base prompt with trailing whitespace \n\n";
        assert_eq!(get_enhanced_prompt(base, None), base);
        assert_eq!(get_enhanced_prompt(base, Some(&ConversationMemory::new())), base);
    }

    #[test]
    fn context_block_follows_base() {
        let mut memory = ConversationMemory::new();
        memory.increment_turn();
        memory.track_entity(
            ConversationEntity::new("product_boot", EntityKind::Product, "Trail Boot", 1)
                .with_aliases(["it"]),
        );
        memory.track_list(vec![
            ListEntry::new("Trail Boot", Some("https://shop.example.com/boot".to_string())),
            ListEntry::new("City Boot", Some("https://shop.example.com/city".to_string())),
        ]);

        let prompt = get_enhanced_prompt("BASE", Some(&memory));
        assert!(prompt.starts_with("BASE\n\n---\n\n## Conversation Context\n\n"));
        assert!(prompt.contains("### Recently Mentioned"));
        assert!(prompt.contains("2. City Boot (https://shop.example.com/city)"));
        assert!(prompt.contains("### Resolving References"));
        assert!(prompt.contains("### Handling Corrections"));
        assert!(prompt.ends_with(TOPIC_SWITCHES));
    }
}
