//! # Subscription Manager
//!
//! Owns the three live queries behind the deck listing and their lifecycle:
//!
//! | Stream     | Query                                   | Lifetime                     |
//! |------------|-----------------------------------------|------------------------------|
//! | `Users`    | `users`, unfiltered                     | whole manager lifetime       |
//! | `LikedIds` | `users/{uid}/likedDecks`                | while a user is signed in    |
//! | `Decks`    | `decks`, filtered by the [`FilterMode`] | re-issued on every mode/set change |
//!
//! ## Stale Callbacks
//!
//! Each stream slot remembers the [`SubscriptionId`] of its *current* query.
//! Any event carrying a different id belongs to a superseded or cancelled query
//! and is dropped unseen. Closing a query therefore takes effect immediately,
//! even for callbacks the source has already queued.
//!
//! ## LIKED Mode
//!
//! The LIKED query is a membership filter over the liked-ids set, so it is
//! re-issued whenever that set's contents change, not only on a mode switch.
//! An empty set issues no query at all: the manager reports an empty decks
//! snapshot itself.
//!
//! ## Failures
//!
//! A failed stream stays failed (no further updates) until [`SubscriptionManager::restart`].
//! Whatever it delivered before remains with the consumer.

use crate::context::AppContext;
use crate::error::FlashdeckError;
use crate::model::{decode_all, paths, AuthUser, Deck, DeckId, UserId, UserProfile, OWNER_FIELD};
use crate::source::{CollectionPath, FilterSpec, RemoteSource, SourceEvent, SubscriptionId};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    Mine,
    Liked,
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterMode::All => "all",
            FilterMode::Mine => "mine",
            FilterMode::Liked => "liked",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Users,
    LikedIds,
    Decks,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stream::Users => "users",
            Stream::LikedIds => "liked decks",
            Stream::Decks => "decks",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Closed,
    Loading,
    Live,
    Failed(String),
}

/// What a stream delivered, in typed form.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChange {
    Users(HashMap<UserId, UserProfile>),
    LikedIds(HashSet<DeckId>),
    Decks(Vec<Deck>),
    Failed { stream: Stream, message: String },
}

impl StreamChange {
    /// The failure as an error value, for streams that failed.
    pub fn as_error(&self) -> Option<FlashdeckError> {
        match self {
            StreamChange::Failed { stream, message } => Some(FlashdeckError::Subscription {
                stream: stream.to_string(),
                message: message.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Slot {
    handle: Option<SubscriptionId>,
    generation: u64,
    status: StreamStatus,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            handle: None,
            generation: 0,
            status: StreamStatus::Closed,
        }
    }
}

pub struct SubscriptionManager<S: RemoteSource> {
    ctx: Rc<AppContext<S>>,
    user: Option<AuthUser>,
    mode: FilterMode,
    users: Slot,
    liked: Slot,
    decks: Slot,
    liked_ids: HashSet<DeckId>,
    // Ids the open LIKED query was built from, sorted.
    liked_query: Option<Vec<String>>,
}

impl<S: RemoteSource> SubscriptionManager<S> {
    /// Create a manager. Nothing is opened until [`start`](Self::start).
    pub fn new(ctx: Rc<AppContext<S>>, user: Option<AuthUser>, mode: FilterMode) -> Self {
        Self {
            ctx,
            user,
            mode,
            users: Slot::default(),
            liked: Slot::default(),
            decks: Slot::default(),
            liked_ids: HashSet::new(),
            liked_query: None,
        }
    }

    /// Open the users stream, the liked-ids stream (if signed in) and the
    /// decks stream for the current mode.
    pub fn start(&mut self) -> Vec<StreamChange> {
        let mut changes = Vec::new();
        changes.extend(self.open(Stream::Users));
        if self.user.is_some() {
            changes.extend(self.open(Stream::LikedIds));
        }
        changes.extend(self.open(Stream::Decks));
        changes
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.mode
    }

    pub fn liked_ids(&self) -> &HashSet<DeckId> {
        &self.liked_ids
    }

    pub fn status(&self, stream: Stream) -> &StreamStatus {
        &self.slot(stream).status
    }

    /// How many queries have been issued for a stream so far.
    pub fn generation(&self, stream: Stream) -> u64 {
        self.slot(stream).generation
    }

    /// True until the current decks query delivers its first snapshot.
    pub fn is_loading(&self) -> bool {
        self.decks.status == StreamStatus::Loading
    }

    /// Whether `subscription` is the current query of one of the streams.
    pub fn owns(&self, subscription: SubscriptionId) -> bool {
        self.stream_for(subscription).is_some()
    }

    /// Switch the decks query. The old query is closed before the new one is
    /// opened, even when the mode does not change.
    pub fn set_filter_mode(&mut self, mode: FilterMode) -> Vec<StreamChange> {
        debug!("filter mode {} -> {}", self.mode, mode);
        self.mode = mode;
        self.open(Stream::Decks)
    }

    /// Replace the signed-in identity. The liked-ids stream follows the new
    /// user and the decks query is re-issued.
    pub fn set_user(&mut self, user: Option<AuthUser>) -> Vec<StreamChange> {
        self.close(Stream::LikedIds);
        self.user = user;
        let mut changes = Vec::new();
        if !self.liked_ids.is_empty() {
            self.liked_ids.clear();
            changes.push(StreamChange::LikedIds(HashSet::new()));
        }
        if self.user.is_some() {
            changes.extend(self.open(Stream::LikedIds));
        }
        changes.extend(self.open(Stream::Decks));
        changes
    }

    /// Reopen a stream, typically one that failed.
    pub fn restart(&mut self, stream: Stream) -> Vec<StreamChange> {
        if stream == Stream::LikedIds && self.user.is_none() {
            return Vec::new();
        }
        self.open(stream)
    }

    /// Route one source event. Events for queries this manager does not
    /// currently hold are discarded.
    pub fn handle_event(&mut self, event: SourceEvent) -> Vec<StreamChange> {
        let subscription = event.subscription();
        let Some(stream) = self.stream_for(subscription) else {
            debug!("discarding stale callback from {}", subscription);
            return Vec::new();
        };

        match event {
            SourceEvent::Error { message, .. } => {
                warn!("{} stream failed: {}", stream, message);
                self.ctx.source().unsubscribe(subscription);
                let slot = self.slot_mut(stream);
                slot.handle = None;
                slot.status = StreamStatus::Failed(message.clone());
                vec![StreamChange::Failed { stream, message }]
            }
            SourceEvent::Snapshot { documents, .. } => {
                self.slot_mut(stream).status = StreamStatus::Live;
                match stream {
                    Stream::Users => {
                        let users = decode_all::<UserProfile>(&documents)
                            .into_iter()
                            .map(|profile| (profile.id.clone(), profile))
                            .collect();
                        vec![StreamChange::Users(users)]
                    }
                    Stream::LikedIds => {
                        // Membership is the document id alone; like fields are not read.
                        self.liked_ids = documents.iter().map(|doc| DeckId::new(&doc.id)).collect();
                        let mut changes = vec![StreamChange::LikedIds(self.liked_ids.clone())];
                        if self.mode == FilterMode::Liked
                            && self.liked_query.as_ref() != Some(&self.sorted_liked_ids())
                        {
                            changes.extend(self.open(Stream::Decks));
                        }
                        changes
                    }
                    Stream::Decks => vec![StreamChange::Decks(decode_all::<Deck>(&documents))],
                }
            }
        }
    }

    /// Close every open query.
    pub fn close_all(&mut self) {
        self.close(Stream::Users);
        self.close(Stream::LikedIds);
        self.close(Stream::Decks);
    }

    fn open(&mut self, stream: Stream) -> Vec<StreamChange> {
        self.close(stream);
        self.slot_mut(stream).generation += 1;

        let query = match stream {
            Stream::Users => Some((paths::users(), FilterSpec::All)),
            Stream::LikedIds => self
                .user
                .as_ref()
                .map(|user| (paths::liked_decks(&user.id), FilterSpec::All)),
            Stream::Decks => self.decks_query(),
        };

        let Some((collection, filter)) = query else {
            // Nothing to ask the store: the answer is known to be empty.
            self.slot_mut(stream).status = StreamStatus::Live;
            return match stream {
                Stream::Decks => vec![StreamChange::Decks(Vec::new())],
                _ => Vec::new(),
            };
        };

        match self.ctx.source().subscribe(&collection, filter) {
            Ok(id) => {
                debug!("{} stream opened as {} on {}", stream, id, collection);
                let slot = self.slot_mut(stream);
                slot.handle = Some(id);
                slot.status = StreamStatus::Loading;
                Vec::new()
            }
            Err(e) => {
                warn!("{} stream could not be opened: {}", stream, e);
                let message = e.to_string();
                self.slot_mut(stream).status = StreamStatus::Failed(message.clone());
                vec![StreamChange::Failed { stream, message }]
            }
        }
    }

    fn decks_query(&mut self) -> Option<(CollectionPath, FilterSpec)> {
        self.liked_query = None;
        let filter = match (self.mode, &self.user) {
            (FilterMode::All, _) => FilterSpec::All,
            (_, None) => return None,
            (FilterMode::Mine, Some(user)) => {
                FilterSpec::field_equals(OWNER_FIELD, user.id.as_str())
            }
            (FilterMode::Liked, Some(_)) => {
                let ids = self.sorted_liked_ids();
                self.liked_query = Some(ids.clone());
                if ids.is_empty() {
                    return None;
                }
                FilterSpec::IdIn(ids)
            }
        };
        Some((paths::decks(), filter))
    }

    fn sorted_liked_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .liked_ids
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();
        ids.sort();
        ids
    }

    fn close(&mut self, stream: Stream) {
        let slot = self.slot_mut(stream);
        let handle = slot.handle.take();
        slot.status = StreamStatus::Closed;
        if let Some(id) = handle {
            self.ctx.source().unsubscribe(id);
        }
    }

    fn stream_for(&self, subscription: SubscriptionId) -> Option<Stream> {
        [Stream::Users, Stream::LikedIds, Stream::Decks]
            .into_iter()
            .find(|stream| self.slot(*stream).handle == Some(subscription))
    }

    fn slot(&self, stream: Stream) -> &Slot {
        match stream {
            Stream::Users => &self.users,
            Stream::LikedIds => &self.liked,
            Stream::Decks => &self.decks,
        }
    }

    fn slot_mut(&mut self, stream: Stream) -> &mut Slot {
        match stream {
            Stream::Users => &mut self.users,
            Stream::LikedIds => &mut self.liked,
            Stream::Decks => &mut self.decks,
        }
    }
}

impl<S: RemoteSource> Drop for SubscriptionManager<S> {
    fn drop(&mut self) {
        self.close_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlashdeckConfig;
    use crate::source::memory::fixtures::SourceFixture;
    use crate::source::memory::InMemorySource;
    use crate::source::Fields;

    fn ctx(fixture: SourceFixture) -> Rc<AppContext<InMemorySource>> {
        AppContext::new(fixture.settled().source, FlashdeckConfig::default())
    }

    fn seeded() -> Rc<AppContext<InMemorySource>> {
        ctx(SourceFixture::new()
            .with_user("u1", Some("Ada"), Some("ada@example.com"))
            .with_deck("d1", "Spanish", "u1", 2)
            .with_deck("d2", "Kanji", "u2", 1)
            .with_deck("d3", "Chess", "u2", 0)
            .with_like("u1", "d2"))
    }

    fn pump(manager: &mut SubscriptionManager<InMemorySource>) -> Vec<StreamChange> {
        let mut changes = Vec::new();
        loop {
            let events = manager.ctx.source().poll_events();
            if events.is_empty() {
                return changes;
            }
            for event in events {
                changes.extend(manager.handle_event(event));
            }
        }
    }

    fn last_decks(changes: &[StreamChange]) -> Option<Vec<String>> {
        changes.iter().rev().find_map(|change| match change {
            StreamChange::Decks(decks) => {
                Some(decks.iter().map(|d| d.id.to_string()).collect())
            }
            _ => None,
        })
    }

    #[test]
    fn start_opens_three_streams() {
        let ctx = seeded();
        let mut manager =
            SubscriptionManager::new(ctx.clone(), Some(AuthUser::new("u1", None)), FilterMode::All);
        manager.start();
        assert_eq!(ctx.source().active_subscriptions(), 3);
        assert!(manager.is_loading());

        let changes = pump(&mut manager);
        assert!(!manager.is_loading());
        assert_eq!(
            last_decks(&changes),
            Some(vec!["d1".to_string(), "d2".to_string(), "d3".to_string()])
        );
        assert!(changes.contains(&StreamChange::LikedIds(
            [DeckId::new("d2")].into_iter().collect()
        )));
    }

    #[test]
    fn anonymous_session_opens_no_liked_stream() {
        let ctx = seeded();
        let mut manager = SubscriptionManager::new(ctx.clone(), None, FilterMode::All);
        manager.start();
        assert_eq!(ctx.source().active_subscriptions(), 2);
        assert_eq!(manager.status(Stream::LikedIds), &StreamStatus::Closed);
    }

    #[test]
    fn mine_filters_by_owner() {
        let ctx = seeded();
        let mut manager = SubscriptionManager::new(
            ctx.clone(),
            Some(AuthUser::new("u1", None)),
            FilterMode::Mine,
        );
        manager.start();
        let changes = pump(&mut manager);
        assert_eq!(last_decks(&changes), Some(vec!["d1".to_string()]));
    }

    #[test]
    fn switching_mode_closes_previous_query_first() {
        let ctx = seeded();
        let mut manager =
            SubscriptionManager::new(ctx.clone(), Some(AuthUser::new("u1", None)), FilterMode::All);
        manager.start();
        pump(&mut manager);

        manager.set_filter_mode(FilterMode::Mine);
        assert_eq!(ctx.source().active_subscriptions(), 3);
        assert_eq!(manager.generation(Stream::Decks), 2);
    }

    #[test]
    fn callbacks_from_superseded_query_are_discarded() {
        let ctx = seeded();
        let mut manager =
            SubscriptionManager::new(ctx.clone(), Some(AuthUser::new("u1", None)), FilterMode::All);
        manager.start();
        // The ALL snapshot is still queued when the mode changes.
        manager.set_filter_mode(FilterMode::Mine);

        let changes = pump(&mut manager);
        let decks: Vec<_> = changes
            .iter()
            .filter(|c| matches!(c, StreamChange::Decks(_)))
            .collect();
        assert_eq!(decks.len(), 1);
        assert_eq!(last_decks(&changes), Some(vec!["d1".to_string()]));
    }

    #[test]
    fn liked_with_empty_set_issues_no_query() {
        let ctx = ctx(SourceFixture::new().with_deck("d1", "Spanish", "u1", 0));
        let mut manager =
            SubscriptionManager::new(ctx.clone(), Some(AuthUser::new("u1", None)), FilterMode::All);
        manager.start();
        pump(&mut manager);
        let issued_before = ctx.source().issued_queries().len();

        let changes = manager.set_filter_mode(FilterMode::Liked);
        assert_eq!(changes, vec![StreamChange::Decks(Vec::new())]);
        assert_eq!(ctx.source().issued_queries().len(), issued_before);
        // users + liked ids; the ALL query was stopped
        assert_eq!(ctx.source().active_subscriptions(), 2);
        assert!(!manager.is_loading());
    }

    #[test]
    fn liked_query_follows_liked_set_changes() {
        let ctx = seeded();
        let mut manager = SubscriptionManager::new(
            ctx.clone(),
            Some(AuthUser::new("u1", None)),
            FilterMode::Liked,
        );
        manager.start();
        let changes = pump(&mut manager);
        // Liked ids were unknown at start, then the query was re-issued.
        assert_eq!(last_decks(&changes), Some(vec!["d2".to_string()]));

        ctx.source()
            .write(
                &paths::liked_deck(&UserId::new("u1"), &DeckId::new("d3")),
                Fields::new(),
            )
            .unwrap();
        let changes = pump(&mut manager);
        assert_eq!(
            last_decks(&changes),
            Some(vec!["d2".to_string(), "d3".to_string()])
        );
        let (_, filter) = ctx.source().issued_queries().last().cloned().unwrap();
        assert_eq!(filter, FilterSpec::IdIn(vec!["d2".into(), "d3".into()]));
    }

    #[test]
    fn unchanged_liked_set_does_not_reissue() {
        let ctx = seeded();
        let mut manager = SubscriptionManager::new(
            ctx.clone(),
            Some(AuthUser::new("u1", None)),
            FilterMode::Liked,
        );
        manager.start();
        pump(&mut manager);
        let generation = manager.generation(Stream::Decks);

        // Re-liking the same deck rewrites the relation but keeps the id set.
        let mut fields = Fields::new();
        fields.insert("likedAt".into(), serde_json::json!("2026-01-01T00:00:00Z"));
        ctx.source()
            .write(
                &paths::liked_deck(&UserId::new("u1"), &DeckId::new("d2")),
                fields,
            )
            .unwrap();
        pump(&mut manager);
        assert_eq!(manager.generation(Stream::Decks), generation);
    }

    #[test]
    fn like_with_unreadable_fields_still_counts() {
        let ctx = seeded();
        let mut fields = Fields::new();
        fields.insert("likedAt".into(), serde_json::json!(1700000000));
        ctx.source()
            .write(
                &paths::liked_deck(&UserId::new("u1"), &DeckId::new("d3")),
                fields,
            )
            .unwrap();
        ctx.source().poll_events();

        let mut manager = SubscriptionManager::new(
            ctx.clone(),
            Some(AuthUser::new("u1", None)),
            FilterMode::Liked,
        );
        manager.start();
        let changes = pump(&mut manager);
        assert!(manager.liked_ids().contains(&DeckId::new("d3")));
        assert_eq!(
            last_decks(&changes),
            Some(vec!["d2".to_string(), "d3".to_string()])
        );
    }

    #[test]
    fn failed_stream_stops_until_restart() {
        let ctx = seeded();
        let mut manager =
            SubscriptionManager::new(ctx.clone(), Some(AuthUser::new("u1", None)), FilterMode::All);
        manager.start();
        pump(&mut manager);

        let decks_sub = ctx
            .source()
            .issued_queries()
            .iter()
            .position(|(c, _)| c == &paths::decks())
            .map(|i| SubscriptionId(i as u64 + 1))
            .unwrap();
        ctx.source().fail_subscription(decks_sub, "permission denied");
        let changes = pump(&mut manager);
        assert_eq!(
            changes,
            vec![StreamChange::Failed {
                stream: Stream::Decks,
                message: "permission denied".to_string()
            }]
        );
        assert!(changes[0].as_error().is_some());
        assert_eq!(
            manager.status(Stream::Decks),
            &StreamStatus::Failed("permission denied".to_string())
        );

        manager.restart(Stream::Decks);
        let changes = pump(&mut manager);
        assert_eq!(last_decks(&changes).map(|d| d.len()), Some(3));
        assert_eq!(manager.status(Stream::Decks), &StreamStatus::Live);
    }

    #[test]
    fn set_user_moves_liked_stream() {
        let ctx = ctx(SourceFixture::new()
            .with_deck("d1", "Spanish", "u1", 0)
            .with_like("u1", "d1"));
        let mut manager =
            SubscriptionManager::new(ctx.clone(), Some(AuthUser::new("u1", None)), FilterMode::All);
        manager.start();
        pump(&mut manager);
        assert_eq!(manager.liked_ids().len(), 1);

        let changes = manager.set_user(Some(AuthUser::new("u2", None)));
        assert!(changes.contains(&StreamChange::LikedIds(HashSet::new())));
        pump(&mut manager);
        assert!(manager.liked_ids().is_empty());
    }

    #[test]
    fn drop_closes_every_query() {
        let ctx = seeded();
        {
            let mut manager = SubscriptionManager::new(
                ctx.clone(),
                Some(AuthUser::new("u1", None)),
                FilterMode::All,
            );
            manager.start();
            assert_eq!(ctx.source().active_subscriptions(), 3);
        }
        assert_eq!(ctx.source().active_subscriptions(), 0);
    }
}
