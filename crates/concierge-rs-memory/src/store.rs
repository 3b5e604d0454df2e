//! Per-conversation memory store.

use crate::model::{ConversationEntity, Correction, EntityKind, ListEntry, ListItem, TrackedList};
use crate::resolver::{self, OrdinalReference};
use log::debug;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

/// Entities older than this many turns are left out of the context summary.
pub const DEFAULT_DECAY_TURNS: u32 = 5;

#[derive(Debug, Clone)]
struct StoredEntity {
    entity: ConversationEntity,
    /// Monotonic insertion sequence used to break turn ties.
    sequence: u64,
}

impl StoredEntity {
    fn recency(&self) -> (u32, u64) {
        (self.entity.turn_number, self.sequence)
    }
}

/// Entities, lists, and corrections of one conversation.
///
/// The store has no internal locking; callers serialize turns per conversation.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    entities: HashMap<String, StoredEntity>,
    lists: Vec<TrackedList>,
    corrections: Vec<Correction>,
    current_turn: u32,
    next_sequence: u64,
    decay_turns: u32,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            lists: Vec::new(),
            corrections: Vec::new(),
            current_turn: 0,
            next_sequence: 0,
            decay_turns: DEFAULT_DECAY_TURNS,
        }
    }

    /// Override how many turns an entity stays in the context summary.
    pub fn with_decay_turns(mut self, decay_turns: u32) -> Self {
        self.decay_turns = decay_turns;
        self
    }

    pub fn increment_turn(&mut self) -> u32 {
        self.current_turn = self.current_turn.saturating_add(1);
        debug!("memory turn advanced (turn={})", self.current_turn);
        self.current_turn
    }

    pub fn current_turn(&self) -> u32 {
        self.current_turn
    }

    pub fn decay_turns(&self) -> u32 {
        self.decay_turns
    }

    /// Store an entity, replacing any entity with the same id.
    ///
    /// A turn number ahead of the current turn is clamped to the current turn.
    pub fn track_entity(&mut self, mut entity: ConversationEntity) {
        if entity.turn_number > self.current_turn {
            debug!(
                "clamping entity turn (id={}, turn={}, current={})",
                entity.id, entity.turn_number, self.current_turn
            );
            entity.turn_number = self.current_turn;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        debug!(
            "tracking entity (id={}, kind={}, turn={})",
            entity.id, entity.kind, entity.turn_number
        );
        self.entities
            .insert(entity.id.clone(), StoredEntity { entity, sequence });
    }

    /// Track a list at the current turn and make it the active list.
    ///
    /// Returns the new list id, or `None` when `items` is empty (the active
    /// list is left unchanged).
    pub fn track_list(&mut self, items: Vec<ListEntry>) -> Option<String> {
        if items.is_empty() {
            return None;
        }
        let id = format!("list_{}", Uuid::new_v4().simple());
        let items = items
            .into_iter()
            .enumerate()
            .map(|(index, entry)| ListItem {
                name: entry.name,
                url: entry.url,
                position: index + 1,
            })
            .collect::<Vec<_>>();
        debug!(
            "tracking list (id={}, items={}, turn={})",
            id,
            items.len(),
            self.current_turn
        );
        self.lists.push(TrackedList {
            id: id.clone(),
            items,
            turn_number: self.current_turn,
        });
        Some(id)
    }

    pub fn track_correction(
        &mut self,
        wrong: impl Into<String>,
        right: impl Into<String>,
        context: impl Into<String>,
    ) {
        let correction = Correction {
            wrong: wrong.into(),
            right: right.into(),
            context: context.into(),
            turn_number: self.current_turn,
        };
        debug!(
            "tracking correction (wrong={}, right={}, turn={})",
            correction.wrong, correction.right, correction.turn_number
        );
        self.corrections.push(correction);
    }

    /// Most recently tracked list.
    pub fn active_list(&self) -> Option<&TrackedList> {
        self.lists.last()
    }

    pub fn list_by_id(&self, id: &str) -> Option<&TrackedList> {
        self.lists.iter().find(|list| list.id == id)
    }

    pub fn lists(&self) -> &[TrackedList] {
        &self.lists
    }

    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    pub fn entity(&self, id: &str) -> Option<&ConversationEntity> {
        self.entities.get(id).map(|stored| &stored.entity)
    }

    /// All entities, most recent first.
    pub fn entities(&self) -> Vec<&ConversationEntity> {
        self.entities_by_recency()
            .into_iter()
            .map(|stored| &stored.entity)
            .collect()
    }

    /// Look up a 1-based position in the active list only.
    pub fn resolve_list_item(&self, position: usize) -> Option<&ListItem> {
        self.active_list().and_then(|list| list.item(position))
    }

    /// Resolve a free-form phrase to the entity it most likely refers to.
    ///
    /// Ordinal phrases resolve against the active list (and yield `None` when
    /// the position does not exist). Otherwise the most recent entity owning
    /// an alias found in the phrase wins; unrecognised phrases fall back to
    /// the most recent entity overall.
    pub fn resolve_reference(&self, phrase: &str) -> Option<ConversationEntity> {
        let normalized = phrase.trim().to_lowercase();

        if let Some(ordinal) = resolver::parse_ordinal(&normalized) {
            return self.resolve_ordinal(ordinal);
        }

        let tokens = resolver::tokenize(&normalized);
        let alias_match = self
            .entities
            .values()
            .filter(|stored| {
                stored
                    .entity
                    .aliases
                    .iter()
                    .any(|alias| resolver::alias_matches(alias, &tokens))
            })
            .max_by_key(|stored| stored.recency());
        if let Some(stored) = alias_match {
            return Some(stored.entity.clone());
        }

        self.entities
            .values()
            .max_by_key(|stored| stored.recency())
            .map(|stored| stored.entity.clone())
    }

    fn resolve_ordinal(&self, ordinal: OrdinalReference) -> Option<ConversationEntity> {
        let list = self.active_list()?;
        let item = match ordinal {
            OrdinalReference::Position(position) => list.item(position),
            OrdinalReference::Last => list.last(),
        }?;
        Some(
            ConversationEntity::new(
                format!("{}_item_{}", list.id, item.position),
                EntityKind::Product,
                item.name.clone(),
                list.turn_number,
            )
            .with_metadata(json!({
                "url": item.url,
                "position": item.position,
                "list_id": list.id,
            })),
        )
    }

    /// Render the memory snapshot as markdown for the system prompt.
    ///
    /// Returns an empty string when there is nothing worth mentioning.
    pub fn generate_context_summary(&self) -> String {
        let mut sections = Vec::new();

        if !self.corrections.is_empty() {
            let lines = self
                .corrections
                .iter()
                .map(|correction| {
                    format!(
                        "- The user meant \"{}\", not \"{}\"",
                        correction.right, correction.wrong
                    )
                })
                .collect::<Vec<_>>();
            sections.push(format!("### Corrections\n{}", lines.join("\n")));
        }

        let recent = self
            .entities_by_recency()
            .into_iter()
            .filter(|stored| {
                self.current_turn.saturating_sub(stored.entity.turn_number) <= self.decay_turns
            })
            .map(|stored| render_entity(&stored.entity))
            .collect::<Vec<_>>();
        if !recent.is_empty() {
            sections.push(format!("### Recently Mentioned\n{}", recent.join("\n")));
        }

        if let Some(list) = self.active_list() {
            let lines = list
                .items
                .iter()
                .map(|item| match item.url.as_deref() {
                    Some(url) => format!("{}. {} ({url})", item.position, item.name),
                    None => format!("{}. {}", item.position, item.name),
                })
                .collect::<Vec<_>>();
            sections.push(format!("### Active Numbered List\n{}", lines.join("\n")));
        }

        sections.join("\n\n")
    }

    fn entities_by_recency(&self) -> Vec<&StoredEntity> {
        let mut stored = self.entities.values().collect::<Vec<_>>();
        stored.sort_by_key(|entry| std::cmp::Reverse(entry.recency()));
        stored
    }
}

fn render_entity(entity: &ConversationEntity) -> String {
    match entity.url() {
        Some(url) => format!(
            "- {} ({}, turn {}): {url}",
            entity.value, entity.kind, entity.turn_number
        ),
        None => format!(
            "- {} ({}, turn {})",
            entity.value, entity.kind, entity.turn_number
        ),
    }
}
