//! Conversation memory for Concierge.
//!
//! Tracks the entities, numbered lists, and user corrections of a single
//! conversation so later turns can resolve references like "it" or
//! "the second one". One [`ConversationMemory`] belongs to one conversation.

pub mod model;
pub mod parser;
mod resolver;
pub mod store;

/// Memory record types.
pub use model::{Correction, ConversationEntity, EntityKind, ListEntry, ListItem, TrackedList};
/// Response parsing and the swappable extraction seam.
pub use parser::{
    HeuristicExtractor, ParsedResponse, ResponseExtractor, parse_and_track_entities,
    parse_response,
};
/// Ordinal phrase classification used by reference resolution.
pub use resolver::{OrdinalReference, parse_ordinal};
/// Per-conversation memory store.
pub use store::{ConversationMemory, DEFAULT_DECAY_TURNS};
