use super::{
    count_value, CollectionPath, Document, DocumentPath, Fields, FilterSpec, RemoteSource,
    SourceEvent, SubscriptionId,
};
use crate::error::{FlashdeckError, Result};
use log::debug;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet, VecDeque};

struct LiveQuery {
    collection: CollectionPath,
    filter: FilterSpec,
    last_delivered: Option<Vec<Document>>,
}

/// In-memory document store.
///
/// Uses `RefCell` for interior mutability since flashdeck is single-threaded.
/// Documents keep insertion order within a collection, which is the order
/// queries return them in.
///
/// A live query is only notified when its result actually changes, and every
/// notification is a full snapshot, queued until [`RemoteSource::poll_events`].
#[derive(Default)]
pub struct InMemorySource {
    collections: RefCell<BTreeMap<CollectionPath, Vec<Document>>>,
    queries: RefCell<BTreeMap<SubscriptionId, LiveQuery>>,
    events: RefCell<VecDeque<SourceEvent>>,
    next_subscription: Cell<u64>,
    issued: RefCell<Vec<(CollectionPath, FilterSpec)>>,
    simulate_write_error: Cell<bool>,
    failing_paths: RefCell<HashSet<DocumentPath>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_collections(collections: BTreeMap<CollectionPath, Vec<Document>>) -> Self {
        let source = Self::new();
        *source.collections.borrow_mut() = collections;
        source
    }

    pub fn collections(&self) -> BTreeMap<CollectionPath, Vec<Document>> {
        self.collections.borrow().clone()
    }

    /// Current contents of a collection, ignoring subscriptions.
    pub fn documents(&self, collection: &CollectionPath) -> Vec<Document> {
        self.collections
            .borrow()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains(&self, path: &DocumentPath) -> bool {
        self.find(path).is_some()
    }

    pub fn get(&self, path: &DocumentPath) -> Option<Document> {
        self.find(path)
    }

    /// Every query ever issued through `subscribe`, oldest first.
    pub fn issued_queries(&self) -> Vec<(CollectionPath, FilterSpec)> {
        self.issued.borrow().clone()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.queries.borrow().len()
    }

    /// Make every mutating call fail.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Make every mutating call on one document fail.
    pub fn fail_writes_to(&self, path: DocumentPath) {
        self.failing_paths.borrow_mut().insert(path);
    }

    /// Terminate a live query with an error, the way a store does when a
    /// listener is revoked.
    pub fn fail_subscription(&self, subscription: SubscriptionId, message: &str) {
        if self.queries.borrow_mut().remove(&subscription).is_some() {
            self.events.borrow_mut().push_back(SourceEvent::Error {
                subscription,
                message: message.to_string(),
            });
        }
    }

    fn find(&self, path: &DocumentPath) -> Option<Document> {
        self.collections
            .borrow()
            .get(path.collection())
            .and_then(|docs| docs.iter().find(|d| d.id == path.id()).cloned())
    }

    fn check_writable(&self, path: &DocumentPath) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(FlashdeckError::Write("Simulated write error".to_string()));
        }
        if self.failing_paths.borrow().contains(path) {
            return Err(FlashdeckError::Write(format!("Simulated write error: {}", path)));
        }
        Ok(())
    }

    fn query(&self, collection: &CollectionPath, filter: &FilterSpec) -> Vec<Document> {
        self.collections
            .borrow()
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default()
    }

    /// Queue a snapshot for every live query on `collection` whose result changed.
    pub(super) fn notify(&self, collection: &CollectionPath) {
        let mut queries = self.queries.borrow_mut();
        let mut events = self.events.borrow_mut();
        for (id, live) in queries.iter_mut() {
            if &live.collection != collection {
                continue;
            }
            let current = self.query(&live.collection, &live.filter);
            if live.last_delivered.as_ref() == Some(&current) {
                continue;
            }
            live.last_delivered = Some(current.clone());
            events.push_back(SourceEvent::Snapshot {
                subscription: *id,
                documents: current,
            });
        }
    }

    /// Apply one mutation to the stored documents without notifying anyone.
    /// Returns whether any document changed.
    pub(super) fn apply(&self, path: &DocumentPath, mutation: Mutation) -> Result<bool> {
        self.check_writable(path)?;
        let mut collections = self.collections.borrow_mut();
        match mutation {
            Mutation::Write(fields) => {
                let docs = collections.entry(path.collection().clone()).or_default();
                match docs.iter_mut().find(|d| d.id == path.id()) {
                    Some(existing) => existing.fields = fields,
                    None => docs.push(Document::new(path.id(), fields)),
                }
                Ok(true)
            }
            Mutation::Update(fields) => {
                let doc = document_mut(&mut collections, path)?;
                for (key, value) in fields {
                    doc.fields.insert(key, value);
                }
                Ok(true)
            }
            Mutation::Delete => Ok(match collections.get_mut(path.collection()) {
                Some(docs) => {
                    let before = docs.len();
                    docs.retain(|d| d.id != path.id());
                    docs.len() != before
                }
                None => false,
            }),
            Mutation::Increment { field, delta } => {
                let doc = document_mut(&mut collections, path)?;
                let current = doc.fields.get(&field).and_then(count_value).unwrap_or(0);
                doc.fields.insert(field, Value::from(current + delta));
                Ok(true)
            }
        }
    }

    /// Put back documents saved with [`InMemorySource::collections`]. Live
    /// queries are not notified.
    pub(super) fn restore(&self, collections: BTreeMap<CollectionPath, Vec<Document>>) {
        *self.collections.borrow_mut() = collections;
    }

    fn apply_and_notify(&self, path: &DocumentPath, mutation: Mutation) -> Result<()> {
        if self.apply(path, mutation)? {
            self.notify(path.collection());
        }
        Ok(())
    }
}

fn document_mut<'a>(
    collections: &'a mut BTreeMap<CollectionPath, Vec<Document>>,
    path: &DocumentPath,
) -> Result<&'a mut Document> {
    collections
        .get_mut(path.collection())
        .and_then(|docs| docs.iter_mut().find(|d| d.id == path.id()))
        .ok_or_else(|| FlashdeckError::NotFound(path.to_string()))
}

/// One write against a single document.
pub(super) enum Mutation {
    Write(Fields),
    Update(Fields),
    Delete,
    Increment { field: String, delta: i64 },
}

impl RemoteSource for InMemorySource {
    fn subscribe(&self, collection: &CollectionPath, filter: FilterSpec) -> Result<SubscriptionId> {
        let id = SubscriptionId(self.next_subscription.get() + 1);
        self.next_subscription.set(id.0);
        self.issued
            .borrow_mut()
            .push((collection.clone(), filter.clone()));

        let current = self.query(collection, &filter);
        self.queries.borrow_mut().insert(
            id,
            LiveQuery {
                collection: collection.clone(),
                filter,
                last_delivered: Some(current.clone()),
            },
        );
        self.events.borrow_mut().push_back(SourceEvent::Snapshot {
            subscription: id,
            documents: current,
        });
        debug!("{} opened on {}", id, collection);
        Ok(id)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        if self.queries.borrow_mut().remove(&subscription).is_some() {
            debug!("{} closed", subscription);
        }
    }

    fn fetch(&self, collection: &CollectionPath, filter: &FilterSpec) -> Result<Vec<Document>> {
        Ok(self.query(collection, filter))
    }

    fn write(&self, path: &DocumentPath, fields: Fields) -> Result<()> {
        self.apply_and_notify(path, Mutation::Write(fields))
    }

    fn update(&self, path: &DocumentPath, fields: Fields) -> Result<()> {
        self.apply_and_notify(path, Mutation::Update(fields))
    }

    fn delete(&self, path: &DocumentPath) -> Result<()> {
        self.apply_and_notify(path, Mutation::Delete)
    }

    fn increment_field(&self, path: &DocumentPath, field: &str, delta: i64) -> Result<()> {
        self.apply_and_notify(
            path,
            Mutation::Increment {
                field: field.to_string(),
                delta,
            },
        )
    }

    fn poll_events(&self) -> Vec<SourceEvent> {
        self.events.borrow_mut().drain(..).collect()
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{encode, paths, Deck, DeckId, Flashcard, CardId, UserId, UserProfile};

    pub struct SourceFixture {
        pub source: InMemorySource,
    }

    impl Default for SourceFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl SourceFixture {
        pub fn new() -> Self {
            Self {
                source: InMemorySource::new(),
            }
        }

        pub fn with_user(self, id: &str, display_name: Option<&str>, email: Option<&str>) -> Self {
            let profile = UserProfile {
                id: UserId::new(id),
                display_name: display_name.map(str::to_string),
                email: email.map(str::to_string),
            };
            self.source
                .write(&paths::user(&profile.id), encode(&profile).expect("encode user"))
                .expect("failed to seed user");
            self
        }

        /// A deck whose cached count matches the cards it is given.
        pub fn with_deck(self, id: &str, title: &str, owner: &str, cards: usize) -> Self {
            let deck = Deck {
                id: DeckId::new(id),
                title: title.to_string(),
                card_count: cards as i64,
                owner_id: UserId::new(owner),
                owner_email: format!("{}@example.com", owner),
                created_at: None,
            };
            self.source
                .write(&paths::deck(&deck.id), encode(&deck).expect("encode deck"))
                .expect("failed to seed deck");
            for i in 0..cards {
                let card = Flashcard {
                    id: CardId::new(format!("{}-c{}", id, i + 1)),
                    question: format!("Question {}", i + 1),
                    answer: format!("Answer {}", i + 1),
                };
                self.source
                    .write(&paths::flashcard(&deck.id, &card.id), encode(&card).expect("encode card"))
                    .expect("failed to seed card");
            }
            self
        }

        pub fn with_like(self, user: &str, deck: &str) -> Self {
            self.source
                .write(
                    &paths::liked_deck(&UserId::new(user), &DeckId::new(deck)),
                    Fields::new(),
                )
                .expect("failed to seed like");
            self
        }

        /// Fixture writes queue events too; drop them so tests start clean.
        pub fn settled(self) -> Self {
            self.source.poll_events();
            self
        }
    }
}
