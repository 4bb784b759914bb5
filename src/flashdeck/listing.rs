//! Deck listing screen model.
//!
//! Wires the [`SubscriptionManager`] into the [`ViewAggregator`] and runs the
//! search filter over the result on every read. Stream failures are handed
//! back to the caller; the list keeps showing what it had.

use crate::aggregate::ViewAggregator;
use crate::context::AppContext;
use crate::error::FlashdeckError;
use crate::model::{AuthUser, DeckId, EnrichedDeckView};
use crate::search::apply_search;
use crate::source::{RemoteSource, SourceEvent, SubscriptionId};
use crate::subscriptions::{FilterMode, Stream, StreamChange, StreamStatus, SubscriptionManager};
use std::rc::Rc;

pub struct DeckListing<S: RemoteSource> {
    ctx: Rc<AppContext<S>>,
    manager: SubscriptionManager<S>,
    aggregator: ViewAggregator,
    query: String,
}

impl<S: RemoteSource> DeckListing<S> {
    /// Build the listing. Queries open on [`start`](Self::start).
    pub fn new(ctx: Rc<AppContext<S>>, user: Option<AuthUser>, mode: FilterMode) -> Self {
        let aggregator = ViewAggregator::new(
            user.as_ref().map(|u| u.id.clone()),
            ctx.config().unknown_creator.clone(),
        );
        Self {
            manager: SubscriptionManager::new(ctx.clone(), user, mode),
            ctx,
            aggregator,
            query: String::new(),
        }
    }

    pub fn context(&self) -> &AppContext<S> {
        &self.ctx
    }

    pub fn start(&mut self) -> Vec<FlashdeckError> {
        let changes = self.manager.start();
        self.absorb(changes)
    }

    /// The final list: aggregated, then filtered by the search query.
    pub fn visible(&self) -> Vec<EnrichedDeckView> {
        apply_search(&self.query, self.aggregator.views())
    }

    /// Every aggregated deck, ignoring the search query.
    pub fn all(&self) -> &[EnrichedDeckView] {
        self.aggregator.views()
    }

    pub fn is_loading(&self) -> bool {
        self.manager.is_loading()
    }

    pub fn is_liked(&self, deck: &DeckId) -> bool {
        self.aggregator.liked_ids().contains(deck)
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.manager.filter_mode()
    }

    pub fn status(&self, stream: Stream) -> &StreamStatus {
        self.manager.status(stream)
    }

    pub fn owns(&self, subscription: SubscriptionId) -> bool {
        self.manager.owns(subscription)
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) -> Vec<FlashdeckError> {
        let changes = self.manager.set_filter_mode(mode);
        self.absorb(changes)
    }

    pub fn set_user(&mut self, user: Option<AuthUser>) -> Vec<FlashdeckError> {
        self.aggregator.set_viewer(user.as_ref().map(|u| u.id.clone()));
        let changes = self.manager.set_user(user);
        self.absorb(changes)
    }

    pub fn restart(&mut self, stream: Stream) -> Vec<FlashdeckError> {
        let changes = self.manager.restart(stream);
        self.absorb(changes)
    }

    pub fn handle_event(&mut self, event: SourceEvent) -> Vec<FlashdeckError> {
        let changes = self.manager.handle_event(event);
        self.absorb(changes)
    }

    fn absorb(&mut self, changes: Vec<StreamChange>) -> Vec<FlashdeckError> {
        let mut failures = Vec::new();
        for change in changes {
            if let Some(err) = change.as_error() {
                failures.push(err);
            }
            self.aggregator.apply(change);
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlashdeckConfig;
    use crate::source::memory::fixtures::SourceFixture;
    use crate::source::memory::InMemorySource;

    fn listing(user: Option<AuthUser>, mode: FilterMode) -> DeckListing<InMemorySource> {
        let fixture = SourceFixture::new()
            .with_user("u1", Some("Ada"), None)
            .with_user("u2", None, Some("grace@example.com"))
            .with_deck("d1", "Cats 101", "u1", 1)
            .with_deck("d2", "Dog Facts", "u2", 0)
            .with_deck("d3", "Category Theory", "u3", 2)
            .with_like("u1", "d2")
            .settled();
        let ctx = AppContext::new(fixture.source, FlashdeckConfig::default());
        let mut listing = DeckListing::new(ctx, user, mode);
        assert!(listing.start().is_empty());
        listing
    }

    fn pump(listing: &mut DeckListing<InMemorySource>) -> Vec<FlashdeckError> {
        let mut failures = Vec::new();
        loop {
            let events = listing.context().source().poll_events();
            if events.is_empty() {
                return failures;
            }
            for event in events {
                failures.extend(listing.handle_event(event));
            }
        }
    }

    fn titles(views: &[EnrichedDeckView]) -> Vec<&str> {
        views.iter().map(|v| v.title()).collect()
    }

    #[test]
    fn enriches_and_searches() {
        let mut listing = listing(Some(AuthUser::new("u1", None)), FilterMode::All);
        assert!(listing.is_loading());
        pump(&mut listing);
        assert!(!listing.is_loading());

        let all = listing.visible();
        assert_eq!(titles(&all), vec!["Cats 101", "Dog Facts", "Category Theory"]);
        assert_eq!(all[0].creator_name, "Ada");
        assert_eq!(all[1].creator_name, "grace@example.com");
        assert_eq!(all[2].creator_name, "Unknown");
        assert!(all[1].is_liked);
        assert!(all[0].is_owner);

        listing.set_search_query("cat");
        assert_eq!(titles(&listing.visible()), vec!["Cats 101", "Category Theory"]);
        assert_eq!(listing.all().len(), 3);
    }

    #[test]
    fn search_applies_to_later_snapshots() {
        let mut listing = listing(Some(AuthUser::new("u1", None)), FilterMode::All);
        listing.set_search_query("CAT");
        pump(&mut listing);
        assert_eq!(titles(&listing.visible()), vec!["Cats 101", "Category Theory"]);

        listing
            .context()
            .source()
            .write(
                &crate::model::paths::deck(&DeckId::new("d4")),
                crate::source::Fields::from_iter([
                    ("title".to_string(), serde_json::json!("Catalan")),
                    ("userId".to_string(), serde_json::json!("u2")),
                ]),
            )
            .unwrap();
        pump(&mut listing);
        assert_eq!(
            titles(&listing.visible()),
            vec!["Cats 101", "Category Theory", "Catalan"]
        );
    }

    #[test]
    fn mode_switch_replaces_list() {
        let mut listing = listing(Some(AuthUser::new("u1", None)), FilterMode::All);
        pump(&mut listing);

        assert!(listing.set_filter_mode(FilterMode::Liked).is_empty());
        pump(&mut listing);
        assert_eq!(titles(&listing.visible()), vec!["Dog Facts"]);
        assert_eq!(listing.filter_mode(), FilterMode::Liked);

        listing.set_filter_mode(FilterMode::Mine);
        pump(&mut listing);
        assert_eq!(titles(&listing.visible()), vec!["Cats 101"]);
    }

    #[test]
    fn stream_failure_keeps_last_list() {
        let mut listing = listing(None, FilterMode::All);
        pump(&mut listing);
        let decks_sub = SubscriptionId(2);
        assert!(listing.owns(decks_sub));

        listing.context().source().fail_subscription(decks_sub, "quota exceeded");
        let failures = pump(&mut listing);
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], FlashdeckError::Subscription { .. }));
        assert_eq!(listing.visible().len(), 3);
        assert!(matches!(listing.status(Stream::Decks), StreamStatus::Failed(_)));

        assert!(listing.restart(Stream::Decks).is_empty());
        pump(&mut listing);
        assert_eq!(listing.status(Stream::Decks), &StreamStatus::Live);
    }

    #[test]
    fn signing_out_clears_likes_and_ownership() {
        let mut listing = listing(Some(AuthUser::new("u1", None)), FilterMode::All);
        pump(&mut listing);
        assert!(listing.is_liked(&DeckId::new("d2")));

        listing.set_user(None);
        pump(&mut listing);
        assert!(!listing.is_liked(&DeckId::new("d2")));
        assert!(listing.visible().iter().all(|v| !v.is_owner && !v.is_liked));
    }
}
