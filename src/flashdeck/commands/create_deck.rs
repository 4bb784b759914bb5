use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{encode, paths, AuthUser, Deck, DeckId};
use crate::source::RemoteSource;
use chrono::Utc;
use log::debug;

use super::helpers::{require_account, require_text};

pub fn run<S: RemoteSource>(source: &S, user: Option<&AuthUser>, title: &str) -> Result<CmdResult> {
    let owner = require_account(user, "create decks")?;
    require_text(title, "Deck title cannot be empty")?;

    let deck = Deck {
        id: DeckId::generate(),
        title: title.to_string(),
        card_count: 0,
        owner_id: owner.id.clone(),
        owner_email: owner.email.clone().unwrap_or_default(),
        created_at: Some(Utc::now()),
    };
    source.write(&paths::deck(&deck.id), encode(&deck)?)?;
    debug!("created deck {}", deck.id);

    Ok(CmdResult::default()
        .with_deck(deck.id.clone())
        .with_message(CmdMessage::success(format!(
            "Deck created: {} ({})",
            deck.title, deck.id
        ))))
}
