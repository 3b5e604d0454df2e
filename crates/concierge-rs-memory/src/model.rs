//! Records held by the conversation memory store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Category of a referenceable entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Product,
    Order,
    Other,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Product => "product",
            EntityKind::Order => "order",
            EntityKind::Other => "other",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something mentioned in the conversation that later turns may refer back to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationEntity {
    /// Stable identifier; tracking the same id again replaces the entry.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Display value, usually a product or order name.
    pub value: String,
    /// Lower-case phrases that refer to this entity.
    #[serde(default)]
    pub aliases: Vec<String>,
    pub turn_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ConversationEntity {
    pub fn new(
        id: impl Into<String>,
        kind: EntityKind,
        value: impl Into<String>,
        turn_number: u32,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            value: value.into(),
            aliases: Vec::new(),
            turn_number,
            metadata: None,
        }
    }

    /// Attach aliases; they are lower-cased, trimmed, and de-duplicated.
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for alias in aliases {
            self.add_alias(alias.as_ref());
        }
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn add_alias(&mut self, alias: &str) {
        let alias = alias.trim().to_lowercase();
        if !alias.is_empty() && !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
    }

    /// URL stored in metadata, if any.
    pub fn url(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.get("url"))
            .and_then(Value::as_str)
    }
}

/// Input item for [`crate::ConversationMemory::track_list`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ListEntry {
    pub fn new(name: impl Into<String>, url: Option<String>) -> Self {
        Self {
            name: name.into(),
            url,
        }
    }
}

/// Item of a tracked list. Positions are 1-indexed and dense.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub position: usize,
}

/// A numbered or bulleted list shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedList {
    /// `list_<uuid>`.
    pub id: String,
    pub items: Vec<ListItem>,
    pub turn_number: u32,
}

impl TrackedList {
    pub fn item(&self, position: usize) -> Option<&ListItem> {
        position
            .checked_sub(1)
            .and_then(|index| self.items.get(index))
    }

    pub fn last(&self) -> Option<&ListItem> {
        self.items.last()
    }
}

/// A user self-correction ("I meant X, not Y").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Correction {
    pub wrong: String,
    pub right: String,
    /// Message the correction was extracted from.
    pub context: String,
    pub turn_number: u32,
}
