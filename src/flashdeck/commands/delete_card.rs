use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{paths, CardId, DeckId, CARD_COUNT_FIELD};
use crate::source::RemoteSource;
use log::{debug, warn};

/// Delete a card, then drop the deck's cached count.
///
/// The decrement is not guarded: a count that has already drifted to zero
/// goes negative.
pub fn run<S: RemoteSource>(source: &S, deck: &DeckId, card: &CardId) -> Result<CmdResult> {
    source.delete(&paths::flashcard(deck, card))?;

    if let Err(e) = source.increment_field(&paths::deck(deck), CARD_COUNT_FIELD, -1) {
        warn!("card {} removed from {} but {} not decremented: {}", card, deck, CARD_COUNT_FIELD, e);
        return Err(e);
    }
    debug!("card {} removed from {}", card, deck);

    Ok(CmdResult::default()
        .with_deck(deck.clone())
        .with_card(card.clone())
        .with_message(CmdMessage::success("Card deleted")))
}
