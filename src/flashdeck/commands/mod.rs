//! # Command Layer
//!
//! The write side of flashdeck. Each command lives in its own submodule and is
//! a plain function over a [`RemoteSource`](crate::source::RemoteSource).
//!
//! Commands never touch local view state. Their effect reaches the screens the
//! same way every other change does: through the live subscriptions, once the
//! store reports it.
//!
//! ## Card Counter Protocol
//!
//! `Deck.cardCount` is a cached total maintained by point updates:
//!
//! - [`create_card`]: write the card, then `cardCount += 1`.
//! - [`delete_card`]: delete the card, then `cardCount -= 1`.
//! - [`delete_deck`]: delete every card, then the deck.
//!
//! Each step is a separate store write. A failure between steps leaves the
//! counter off by one; nothing compensates for it and nothing clamps it at
//! zero. Anything that needs the real number of cards counts the live card
//! snapshot instead.
//!
//! ## Structured Returns
//!
//! Commands return [`CmdResult`], not strings: the ids they touched and
//! user-facing messages with levels. Rendering is the caller's job.
//!
//! ## Command Modules
//!
//! - [`create_deck`]: Create an empty deck
//! - [`create_card`]: Add a card and bump the counter
//! - [`update_card`]: Edit a card's text
//! - [`delete_card`]: Remove a card and drop the counter
//! - [`delete_deck`]: Cascading delete of a deck and its cards
//! - [`like`]: Like/unlike a deck
//! - [`profile`]: Set the display name
//! - [`stats`]: Per-user totals
//! - [`helpers`]: Shared validation

use crate::model::{CardId, DeckId};
use serde::Serialize;

pub mod create_card;
pub mod create_deck;
pub mod delete_card;
pub mod delete_deck;
pub mod helpers;
pub mod like;
pub mod profile;
pub mod stats;
pub mod update_card;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_decks: Vec<DeckId>,
    pub affected_cards: Vec<CardId>,
    pub stats: Option<stats::Stats>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn with_deck(mut self, deck: DeckId) -> Self {
        self.affected_decks.push(deck);
        self
    }

    pub fn with_card(mut self, card: CardId) -> Self {
        self.affected_cards.push(card);
        self
    }

    pub fn with_message(mut self, message: CmdMessage) -> Self {
        self.messages.push(message);
        self
    }
}
