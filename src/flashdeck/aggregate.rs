//! # View Aggregator
//!
//! Combines the latest users map, liked-ids set and decks snapshot into the
//! enriched list the deck listing renders.
//!
//! Each input is replaced independently and the output is recomputed right
//! away from the newest value of all three. There is no barrier between
//! sources: whichever arrives, the result is `combine(users, liked, decks)` for
//! the latest of each, so delivery order across sources never matters.
//!
//! Output order is the order the decks source returned. Nothing is re-sorted.

use crate::model::{Deck, DeckId, EnrichedDeckView, UserId, UserProfile};
use crate::subscriptions::StreamChange;
use std::collections::{HashMap, HashSet};

/// Resolve the name shown as a deck's creator: display name, then email,
/// then `fallback`. Empty strings count as missing.
pub fn creator_name(users: &HashMap<UserId, UserProfile>, owner: &UserId, fallback: &str) -> String {
    users
        .get(owner)
        .and_then(|profile| {
            non_empty(profile.display_name.as_deref()).or(non_empty(profile.email.as_deref()))
        })
        .unwrap_or(fallback)
        .to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

pub fn combine(
    users: &HashMap<UserId, UserProfile>,
    liked: &HashSet<DeckId>,
    decks: &[Deck],
    viewer: Option<&UserId>,
    unknown_creator: &str,
) -> Vec<EnrichedDeckView> {
    decks
        .iter()
        .map(|deck| EnrichedDeckView {
            creator_name: creator_name(users, &deck.owner_id, unknown_creator),
            is_liked: liked.contains(&deck.id),
            is_owner: viewer == Some(&deck.owner_id),
            deck: deck.clone(),
        })
        .collect()
}

/// Holds the latest value of each input and the list derived from them.
#[derive(Debug, Default)]
pub struct ViewAggregator {
    users: HashMap<UserId, UserProfile>,
    liked: HashSet<DeckId>,
    decks: Vec<Deck>,
    viewer: Option<UserId>,
    unknown_creator: String,
    views: Vec<EnrichedDeckView>,
}

impl ViewAggregator {
    pub fn new(viewer: Option<UserId>, unknown_creator: impl Into<String>) -> Self {
        Self {
            viewer,
            unknown_creator: unknown_creator.into(),
            ..Default::default()
        }
    }

    pub fn views(&self) -> &[EnrichedDeckView] {
        &self.views
    }

    pub fn liked_ids(&self) -> &HashSet<DeckId> {
        &self.liked
    }

    pub fn set_users(&mut self, users: HashMap<UserId, UserProfile>) {
        self.users = users;
        self.recompute();
    }

    pub fn set_liked_ids(&mut self, liked: HashSet<DeckId>) {
        self.liked = liked;
        self.recompute();
    }

    pub fn set_decks(&mut self, decks: Vec<Deck>) {
        self.decks = decks;
        self.recompute();
    }

    pub fn set_viewer(&mut self, viewer: Option<UserId>) {
        self.viewer = viewer;
        self.recompute();
    }

    /// Apply one stream change. Returns false for failures, which leave the
    /// inputs (and so the visible list) untouched.
    pub fn apply(&mut self, change: StreamChange) -> bool {
        match change {
            StreamChange::Users(users) => self.set_users(users),
            StreamChange::LikedIds(liked) => self.set_liked_ids(liked),
            StreamChange::Decks(decks) => self.set_decks(decks),
            StreamChange::Failed { .. } => return false,
        }
        true
    }

    fn recompute(&mut self) {
        self.views = combine(
            &self.users,
            &self.liked,
            &self.decks,
            self.viewer.as_ref(),
            &self.unknown_creator,
        );
    }
}
