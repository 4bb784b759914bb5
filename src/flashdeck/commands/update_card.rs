use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{paths, CardId, DeckId};
use crate::source::{Fields, RemoteSource};
use serde_json::Value;

use super::helpers::require_text;

pub fn run<S: RemoteSource>(
    source: &S,
    deck: &DeckId,
    card: &CardId,
    question: &str,
    answer: &str,
) -> Result<CmdResult> {
    require_text(question, "Question and answer cannot be empty")?;
    require_text(answer, "Question and answer cannot be empty")?;

    let mut fields = Fields::new();
    fields.insert("question".to_string(), Value::from(question));
    fields.insert("answer".to_string(), Value::from(answer));
    source.update(&paths::flashcard(deck, card), fields)?;

    Ok(CmdResult::default()
        .with_deck(deck.clone())
        .with_card(card.clone())
        .with_message(CmdMessage::success("Card updated")))
}
