use crate::commands::{CmdMessage, CmdResult};
use crate::error::{FlashdeckError, Result};
use crate::model::{paths, DeckId};
use crate::source::{FilterSpec, RemoteSource};
use log::{info, warn};

/// Cascading delete: every card of the deck, then the deck itself.
///
/// All card deletes are issued before any result is judged. If one or more
/// fail, the deck is kept and the cards already deleted stay deleted; the
/// caller gets a single [`FlashdeckError::CascadeDelete`] and may retry.
pub fn run<S: RemoteSource>(source: &S, deck: &DeckId) -> Result<CmdResult> {
    let cards = source.fetch(&paths::flashcards(deck), &FilterSpec::All)?;
    info!("deleting deck {} with {} card(s)", deck, cards.len());

    let mut deleted = 0;
    let mut failed = 0;
    for card in &cards {
        match source.delete(&paths::flashcards(deck).doc(card.id.as_str())) {
            Ok(()) => deleted += 1,
            Err(e) => {
                warn!("deleting card {} of deck {} failed: {}", card.id, deck, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(FlashdeckError::CascadeDelete {
            deck: deck.to_string(),
            failed,
            deleted,
        });
    }

    if let Err(e) = source.delete(&paths::deck(deck)) {
        warn!("deleting deck {} failed after its cards: {}", deck, e);
        return Err(FlashdeckError::CascadeDelete {
            deck: deck.to_string(),
            failed: 1,
            deleted,
        });
    }

    Ok(CmdResult::default()
        .with_deck(deck.clone())
        .with_message(CmdMessage::success(format!(
            "Deck deleted with {} card(s)",
            deleted
        ))))
}
