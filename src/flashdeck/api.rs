//! # API Facade
//!
//! The single entry point for every flashdeck action, whatever the UI.
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Dispatches** writes to the command layer (`commands/*.rs`)
//! - **Owns the screen models**: at most one [`DeckListing`] and one [`StudySession`]
//! - **Routes source events** to whichever model holds the subscription
//! - **Collects notifications** for failures that arrive asynchronously
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: That belongs in `commands/*.rs` and the screen models
//! - **I/O operations**: No stdout, stderr, or file formatting
//! - **Optimistic updates**: A write never touches a model directly. Its effect
//!   shows up once [`process_events`](FlashdeckApi::process_events) delivers the
//!   resulting snapshots.
//!
//! ## Generic Over RemoteSource
//!
//! `FlashdeckApi<S: RemoteSource>` is generic over the document store:
//! - Production: `FlashdeckApi<FileSource>`
//! - Testing: `FlashdeckApi<InMemorySource>`
//!
//! ## Errors
//!
//! Action failures come back as `Err` from the action itself. Stream failures
//! have no caller to return to; they are queued as error messages and drained
//! with [`take_notifications`](FlashdeckApi::take_notifications). Neither kind
//! leaves the facade unusable.

use crate::commands::{self, CmdMessage, CmdResult};
use crate::config::FlashdeckConfig;
use crate::context::AppContext;
use crate::error::{FlashdeckError, Result};
use crate::listing::DeckListing;
use crate::model::{paths, AuthUser, CardId, DeckId, EnrichedDeckView};
use crate::source::{FilterSpec, RemoteSource};
use crate::study::{StudySession, StudyView};
use crate::subscriptions::{FilterMode, Stream};
use log::debug;
use std::rc::Rc;

pub struct FlashdeckApi<S: RemoteSource> {
    ctx: Rc<AppContext<S>>,
    user: Option<AuthUser>,
    listing: Option<DeckListing<S>>,
    study: Option<StudySession<S>>,
    notifications: Vec<CmdMessage>,
}

impl<S: RemoteSource> FlashdeckApi<S> {
    pub fn new(source: S, config: FlashdeckConfig, user: Option<AuthUser>) -> Self {
        Self {
            ctx: AppContext::new(source, config),
            user,
            listing: None,
            study: None,
            notifications: Vec::new(),
        }
    }

    pub fn context(&self) -> &AppContext<S> {
        &self.ctx
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// Change the signed-in identity. An open listing follows it.
    pub fn set_user(&mut self, user: Option<AuthUser>) {
        self.user = user.clone();
        if let Some(listing) = self.listing.as_mut() {
            let failures = listing.set_user(user);
            self.notify_failures(failures);
        }
    }

    // --- Deck listing ---

    /// Open (or reopen) the deck listing in `mode`.
    pub fn open_listing(&mut self, mode: FilterMode) -> Result<()> {
        self.check_mode(mode)?;
        self.listing = None;
        let mut listing = DeckListing::new(self.ctx.clone(), self.user.clone(), mode);
        let failures = listing.start();
        self.listing = Some(listing);
        self.notify_failures(failures);
        Ok(())
    }

    pub fn close_listing(&mut self) {
        self.listing = None;
    }

    pub fn listing(&self) -> Option<&DeckListing<S>> {
        self.listing.as_ref()
    }

    /// The filtered, enriched decks. Empty when no listing is open.
    pub fn visible_decks(&self) -> Vec<EnrichedDeckView> {
        self.listing
            .as_ref()
            .map(DeckListing::visible)
            .unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.listing.as_ref().is_some_and(DeckListing::is_loading)
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) -> Result<()> {
        self.check_mode(mode)?;
        let listing = self.listing_mut()?;
        let failures = listing.set_filter_mode(mode);
        self.notify_failures(failures);
        Ok(())
    }

    pub fn set_search_query(&mut self, query: &str) -> Result<()> {
        self.listing_mut()?.set_search_query(query);
        Ok(())
    }

    pub fn restart_stream(&mut self, stream: Stream) -> Result<()> {
        let failures = self.listing_mut()?.restart(stream);
        self.notify_failures(failures);
        Ok(())
    }

    // --- Study session ---

    /// Enter study mode for `deck`, leaving any previous session.
    pub fn open_study(&mut self, deck: &DeckId) {
        self.study = None;
        let session = StudySession::open(self.ctx.clone(), deck.clone());
        if let Some(message) = session.failure() {
            self.notifications
                .push(CmdMessage::error(format!("Could not load cards: {}", message)));
        }
        self.study = Some(session);
    }

    pub fn close_study(&mut self) {
        self.study = None;
    }

    pub fn study_view(&self) -> Option<StudyView> {
        self.study.as_ref().map(StudySession::view)
    }

    pub fn flip(&mut self) -> Result<()> {
        self.study_mut()?.flip();
        Ok(())
    }

    pub fn advance(&mut self) -> Result<()> {
        self.study_mut()?.advance();
        Ok(())
    }

    pub fn restart_study(&mut self) -> Result<()> {
        self.study_mut()?.restart();
        Ok(())
    }

    pub fn delete_current_card(&self) -> Result<CmdResult> {
        self.study
            .as_ref()
            .ok_or_else(no_study)?
            .delete_current()
    }

    // --- Writes ---

    pub fn create_deck(&self, title: &str) -> Result<CmdResult> {
        commands::create_deck::run(self.ctx.source(), self.user.as_ref(), title)
    }

    pub fn create_flashcard(&self, deck: &DeckId, question: &str, answer: &str) -> Result<CmdResult> {
        commands::create_card::run(self.ctx.source(), deck, question, answer)
    }

    pub fn update_flashcard(
        &self,
        deck: &DeckId,
        card: &CardId,
        question: &str,
        answer: &str,
    ) -> Result<CmdResult> {
        commands::update_card::run(self.ctx.source(), deck, card, question, answer)
    }

    pub fn delete_flashcard(&self, deck: &DeckId, card: &CardId) -> Result<CmdResult> {
        commands::delete_card::run(self.ctx.source(), deck, card)
    }

    pub fn delete_deck(&self, deck: &DeckId) -> Result<CmdResult> {
        commands::delete_deck::run(self.ctx.source(), deck)
    }

    /// Like or unlike `deck`, deciding from the listing's liked set when one is
    /// open and from the store otherwise.
    pub fn toggle_like(&self, deck: &DeckId) -> Result<CmdResult> {
        let currently_liked = match (&self.listing, &self.user) {
            (Some(listing), _) => listing.is_liked(deck),
            (None, Some(user)) => !self
                .ctx
                .source()
                .fetch(
                    &paths::liked_decks(&user.id),
                    &FilterSpec::IdIn(vec![deck.to_string()]),
                )?
                .is_empty(),
            (None, None) => false,
        };
        commands::like::toggle(self.ctx.source(), self.user.as_ref(), deck, currently_liked)
    }

    pub fn set_display_name(&self, name: &str) -> Result<CmdResult> {
        commands::profile::set_display_name(
            self.ctx.source(),
            self.user.as_ref(),
            name,
            self.ctx.config().min_display_name_len,
        )
    }

    pub fn stats(&self) -> Result<CmdResult> {
        commands::stats::run(self.ctx.source(), self.user.as_ref())
    }

    // --- Event delivery ---

    /// Deliver every pending source event to the model that owns it, until
    /// the source has nothing left. Returns how many events were delivered.
    pub fn process_events(&mut self) -> usize {
        let mut delivered = 0;
        loop {
            let events = self.ctx.source().poll_events();
            if events.is_empty() {
                return delivered;
            }
            for event in events {
                let subscription = event.subscription();
                if let Some(listing) = self.listing.as_mut().filter(|l| l.owns(subscription)) {
                    let failures = listing.handle_event(event);
                    self.notify_failures(failures);
                } else if let Some(study) = self.study.as_mut().filter(|s| s.owns(subscription)) {
                    if let Some(err) = study.handle_event(event) {
                        self.notify_failures(vec![err]);
                    }
                } else {
                    debug!("no model holds {}, event dropped", subscription);
                    continue;
                }
                delivered += 1;
            }
        }
    }

    /// Drain messages queued by asynchronous failures.
    pub fn take_notifications(&mut self) -> Vec<CmdMessage> {
        std::mem::take(&mut self.notifications)
    }

    fn check_mode(&self, mode: FilterMode) -> Result<()> {
        if mode != FilterMode::All {
            commands::helpers::require_account(
                self.user.as_ref(),
                &format!("filter by {}", mode),
            )?;
        }
        Ok(())
    }

    fn listing_mut(&mut self) -> Result<&mut DeckListing<S>> {
        self.listing
            .as_mut()
            .ok_or_else(|| FlashdeckError::Api("Deck listing is not open".to_string()))
    }

    fn study_mut(&mut self) -> Result<&mut StudySession<S>> {
        self.study.as_mut().ok_or_else(no_study)
    }

    fn notify_failures(&mut self, failures: Vec<FlashdeckError>) {
        self.notifications
            .extend(failures.into_iter().map(|e| CmdMessage::error(e.to_string())));
    }
}

fn no_study() -> FlashdeckError {
    FlashdeckError::Api("No study session is open".to_string())
}
