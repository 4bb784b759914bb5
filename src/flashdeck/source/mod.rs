//! # Remote Collection Source
//!
//! This module defines the document-store abstraction flashdeck is written
//! against. The [`RemoteSource`] trait lets the rest of the crate work with any
//! store that offers live queries over named collections.
//!
//! ## Store Model
//!
//! - A **collection** is addressed by a slash-separated path (`decks`,
//!   `decks/{deckId}/flashcards`, `users/{uid}/likedDecks`).
//! - A **document** is an id plus a JSON object of fields.
//! - A **live subscription** delivers the *full* current result of a filtered
//!   query every time that result changes, until it is cancelled.
//!
//! ## Event Delivery
//!
//! Sources are push-style: callbacks arrive whenever the store decides. Here
//! that is modelled as a queue of [`SourceEvent`]s which the host drains with
//! [`RemoteSource::poll_events`] and routes to whoever owns the subscription.
//!
//! Cancellation is *not* retroactive. An event already queued for a
//! subscription stays in the queue after [`RemoteSource::unsubscribe`]; owners
//! must recognise such late deliveries by their [`SubscriptionId`] and drop
//! them.
//!
//! ## Writes
//!
//! Every write is a single, independent operation. There is no batching and no
//! transaction: callers composing several writes (a card plus its deck's
//! counter) must expect any prefix of them to have been applied when one fails.
//!
//! ## Implementations
//!
//! - [`memory::InMemorySource`]: In-process store with fault injection, used by
//!   tests and as the engine behind the file store.
//! - [`fs::FileSource`]: The in-memory store persisted to a JSON data file after
//!   every successful write.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub mod fs;
pub mod memory;

/// Document fields as stored: a JSON object.
pub type Fields = serde_json::Map<String, Value>;

/// A stored counter as an integer. Stores and exports may hand back whole
/// numbers as floats (`2.0`); those round to the nearest integer. Anything
/// that is not a number is `None`.
pub fn count_value(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64))
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.into(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Query filter supported by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// Every document in the collection.
    All,
    /// Documents whose `field` equals `value`.
    FieldEquals { field: String, value: Value },
    /// Documents whose id is one of the listed ids.
    IdIn(Vec<String>),
}

impl FilterSpec {
    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterSpec::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            FilterSpec::All => true,
            FilterSpec::FieldEquals { field, value } => doc.fields.get(field) == Some(value),
            FilterSpec::IdIn(ids) => ids.iter().any(|id| id == &doc.id),
        }
    }
}

/// Handle of one live subscription. Never reused by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// A callback delivered by the source for one subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// The full current result of the subscribed query.
    Snapshot {
        subscription: SubscriptionId,
        documents: Vec<Document>,
    },
    /// The subscription failed. The source delivers nothing more for it.
    Error {
        subscription: SubscriptionId,
        message: String,
    },
}

impl SourceEvent {
    pub fn subscription(&self) -> SubscriptionId {
        match self {
            SourceEvent::Snapshot { subscription, .. } => *subscription,
            SourceEvent::Error { subscription, .. } => *subscription,
        }
    }
}

/// Abstract interface for a remote document store.
///
/// All methods take `&self`: implementations handle their own interior
/// mutability, so several components can share one source.
pub trait RemoteSource {
    /// Open a live query. The first snapshot is delivered as an event, not
    /// returned here.
    fn subscribe(&self, collection: &CollectionPath, filter: FilterSpec) -> Result<SubscriptionId>;

    /// Cancel a live query. Unknown or already-cancelled ids are ignored.
    fn unsubscribe(&self, subscription: SubscriptionId);

    /// One-shot read of a query's current result.
    fn fetch(&self, collection: &CollectionPath, filter: &FilterSpec) -> Result<Vec<Document>>;

    /// Create or replace a document.
    fn write(&self, path: &DocumentPath, fields: Fields) -> Result<()>;

    /// Merge fields into an existing document. Fails if it does not exist.
    fn update(&self, path: &DocumentPath, fields: Fields) -> Result<()>;

    /// Delete a document. Deleting a missing document succeeds.
    fn delete(&self, path: &DocumentPath) -> Result<()>;

    /// Add `delta` to a numeric field without reading it first. A missing
    /// field counts as zero; a missing document is an error.
    fn increment_field(&self, path: &DocumentPath, field: &str, delta: i64) -> Result<()>;

    /// Drain the callbacks delivered since the last call, in delivery order.
    fn poll_events(&self) -> Vec<SourceEvent>;
}
