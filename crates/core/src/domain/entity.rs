use serde::{Deserialize, Serialize};

pub const PARTY_NAME: &str = "party_name";
pub const PRODUCT_NAME: &str = "product_name";
pub const NUMBER: &str = "number";

/// A `(kind, value)` pair recognised by the NLU engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: String,
    pub value: String,
}

impl Entity {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self { kind: kind.into(), value: value.into() }
    }
}

/// Entities of one message in the order the NLU engine reported them.
///
/// Several entities may share a kind; lookups always answer with the first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityMap {
    entries: Vec<Entity>,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: Entity) {
        self.entries.push(entity);
    }

    pub fn first(&self, kind: &str) -> Option<&str> {
        self.entries.iter().find(|entity| entity.kind == kind).map(|entity| entity.value.as_str())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.first(kind).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entries.iter()
    }
}

impl FromIterator<Entity> for EntityMap {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// One user message after NLU parsing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedMessage {
    pub text: String,
    pub intent: String,
    pub entities: EntityMap,
}

impl ParsedMessage {
    pub fn new(text: impl Into<String>, intent: impl Into<String>, entities: EntityMap) -> Self {
        Self { text: text.into(), intent: intent.into(), entities }
    }
}
