use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{encode, paths, CardId, DeckId, Flashcard, CARD_COUNT_FIELD};
use crate::source::RemoteSource;
use log::{debug, warn};

use super::helpers::require_text;

/// Add a card, then bump the deck's cached count.
///
/// Two independent writes. If the increment fails the card stays and the
/// count is one short.
pub fn run<S: RemoteSource>(
    source: &S,
    deck: &DeckId,
    question: &str,
    answer: &str,
) -> Result<CmdResult> {
    require_text(question, "Question and answer cannot be empty")?;
    require_text(answer, "Question and answer cannot be empty")?;

    let card = Flashcard {
        id: CardId::generate(),
        question: question.to_string(),
        answer: answer.to_string(),
    };
    source.write(&paths::flashcard(deck, &card.id), encode(&card)?)?;

    if let Err(e) = source.increment_field(&paths::deck(deck), CARD_COUNT_FIELD, 1) {
        warn!("card {} added to {} but {} not incremented: {}", card.id, deck, CARD_COUNT_FIELD, e);
        return Err(e);
    }
    debug!("card {} added to {}", card.id, deck);

    Ok(CmdResult::default()
        .with_deck(deck.clone())
        .with_card(card.id)
        .with_message(CmdMessage::success("Card added")))
}
