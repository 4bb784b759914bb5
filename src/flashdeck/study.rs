//! # Study Session
//!
//! Per-visit state of the study screen for one deck:
//!
//! ```text
//! Loading --first snapshot--> Ready(cards, index, flipped) --flip/advance/snapshot--> Ready
//! ```
//!
//! [`StudyState`] is the pure state machine. [`StudySession`] binds it to the
//! live flashcards query of one deck and to the delete half of the card
//! counter protocol.
//!
//! The index is re-clamped on every snapshot, before anything can read it:
//! it stays in `[0, len)` for a non-empty deck and is `0` for an empty one.
//! Emptiness is decided from the snapshot, never from the deck's `cardCount`.

use crate::commands::{self, CmdResult};
use crate::context::AppContext;
use crate::error::{FlashdeckError, Result};
use crate::model::{decode_all, paths, CardId, DeckId, Flashcard};
use crate::source::{FilterSpec, RemoteSource, SourceEvent, SubscriptionId};
use log::{debug, warn};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StudyState {
    #[default]
    Loading,
    Ready {
        cards: Vec<Flashcard>,
        index: usize,
        flipped: bool,
    },
}

impl StudyState {
    /// Replace the card sequence and re-clamp the index. `flipped` is kept.
    pub fn on_snapshot(&mut self, new_cards: Vec<Flashcard>) {
        match self {
            StudyState::Loading => {
                *self = StudyState::Ready {
                    cards: new_cards,
                    index: 0,
                    flipped: false,
                };
            }
            StudyState::Ready { cards, index, .. } => {
                *cards = new_cards;
                if cards.is_empty() {
                    *index = 0;
                } else if *index >= cards.len() {
                    *index = cards.len() - 1;
                }
            }
        }
    }

    pub fn flip(&mut self) {
        if let StudyState::Ready { cards, flipped, .. } = self {
            if !cards.is_empty() {
                *flipped = !*flipped;
            }
        }
    }

    /// Move to the next card, wrapping around. Disabled for one card or fewer.
    pub fn advance(&mut self) {
        if let StudyState::Ready {
            cards,
            index,
            flipped,
        } = self
        {
            if cards.len() <= 1 {
                return;
            }
            *index = (*index + 1) % cards.len();
            *flipped = false;
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, StudyState::Loading)
    }

    pub fn len(&self) -> usize {
        match self {
            StudyState::Loading => 0,
            StudyState::Ready { cards, .. } => cards.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index(&self) -> usize {
        match self {
            StudyState::Loading => 0,
            StudyState::Ready { index, .. } => *index,
        }
    }

    pub fn is_flipped(&self) -> bool {
        matches!(self, StudyState::Ready { flipped: true, .. })
    }

    pub fn current(&self) -> Option<&Flashcard> {
        match self {
            StudyState::Loading => None,
            StudyState::Ready { cards, index, .. } => cards.get(*index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Question,
    Answer,
}

/// What the study screen renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyView {
    pub loading: bool,
    pub total: usize,
    /// 1-based position of the current card, 0 when there is none.
    pub position: usize,
    pub flipped: bool,
    pub card_id: Option<CardId>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub failed: Option<String>,
}

impl StudyView {
    pub fn face(&self) -> Face {
        if self.flipped {
            Face::Answer
        } else {
            Face::Question
        }
    }

    /// Text of the face currently showing.
    pub fn face_text(&self) -> Option<&str> {
        match self.face() {
            Face::Question => self.question.as_deref(),
            Face::Answer => self.answer.as_deref(),
        }
    }
}

pub struct StudySession<S: RemoteSource> {
    ctx: Rc<AppContext<S>>,
    deck: DeckId,
    handle: Option<SubscriptionId>,
    state: StudyState,
    failure: Option<String>,
}

impl<S: RemoteSource> StudySession<S> {
    /// Enter the study screen for `deck` and subscribe to its cards.
    pub fn open(ctx: Rc<AppContext<S>>, deck: DeckId) -> Self {
        let mut session = Self {
            ctx,
            deck,
            handle: None,
            state: StudyState::Loading,
            failure: None,
        };
        session.subscribe();
        session
    }

    pub fn deck(&self) -> &DeckId {
        &self.deck
    }

    pub fn state(&self) -> &StudyState {
        &self.state
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn owns(&self, subscription: SubscriptionId) -> bool {
        self.handle == Some(subscription)
    }

    pub fn flip(&mut self) {
        self.state.flip();
    }

    pub fn advance(&mut self) {
        self.state.advance();
    }

    /// Apply one source event. Returns the stream failure, if this event was one.
    pub fn handle_event(&mut self, event: SourceEvent) -> Option<FlashdeckError> {
        if !self.owns(event.subscription()) {
            debug!("study {}: discarding stale callback from {}", self.deck, event.subscription());
            return None;
        }
        match event {
            SourceEvent::Snapshot { documents, .. } => {
                self.state.on_snapshot(decode_all(&documents));
                None
            }
            SourceEvent::Error {
                subscription,
                message,
            } => {
                warn!("study {}: flashcards stream failed: {}", self.deck, message);
                self.ctx.source().unsubscribe(subscription);
                self.handle = None;
                self.failure = Some(message.clone());
                Some(FlashdeckError::Subscription {
                    stream: format!("flashcards of {}", self.deck),
                    message,
                })
            }
        }
    }

    /// Reopen a failed flashcards stream. The cards already shown stay until
    /// the new snapshot arrives.
    pub fn restart(&mut self) {
        self.subscribe();
    }

    /// Delete the card being shown. The local sequence is not touched: the
    /// card disappears when the resulting snapshot arrives.
    pub fn delete_current(&self) -> Result<CmdResult> {
        let card = self
            .state
            .current()
            .ok_or_else(|| FlashdeckError::Api("No card to delete".to_string()))?;
        commands::delete_card::run(self.ctx.source(), &self.deck, &card.id)
    }

    pub fn view(&self) -> StudyView {
        let current = self.state.current();
        StudyView {
            loading: self.state.is_loading(),
            total: self.state.len(),
            position: if current.is_some() {
                self.state.index() + 1
            } else {
                0
            },
            flipped: self.state.is_flipped(),
            card_id: current.map(|c| c.id.clone()),
            question: current.map(|c| c.question.clone()),
            answer: current.map(|c| c.answer.clone()),
            failed: self.failure.clone(),
        }
    }

    fn subscribe(&mut self) {
        self.unsubscribe();
        self.failure = None;
        match self
            .ctx
            .source()
            .subscribe(&paths::flashcards(&self.deck), FilterSpec::All)
        {
            Ok(id) => {
                debug!("study {}: flashcards stream opened as {}", self.deck, id);
                self.handle = Some(id);
            }
            Err(e) => {
                warn!("study {}: flashcards stream could not be opened: {}", self.deck, e);
                self.failure = Some(e.to_string());
            }
        }
    }

    fn unsubscribe(&mut self) {
        if let Some(id) = self.handle.take() {
            self.ctx.source().unsubscribe(id);
        }
    }
}

impl<S: RemoteSource> Drop for StudySession<S> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
