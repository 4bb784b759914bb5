use crate::commands::CmdResult;
use crate::error::Result;
use crate::model::{decode_all, paths, AuthUser, Deck, OWNER_FIELD};
use crate::source::{FilterSpec, RemoteSource};
use serde::Serialize;

use super::helpers::require_account;

/// Per-user totals. One-shot reads, not live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Stats {
    pub created_decks: usize,
    /// Sum of the cached `cardCount` of the user's decks, so it inherits
    /// any drift in those counters.
    pub total_cards: i64,
    pub liked_decks: usize,
}

pub fn run<S: RemoteSource>(source: &S, user: Option<&AuthUser>) -> Result<CmdResult> {
    let user = require_account(user, "see your stats")?;

    let owned = source.fetch(
        &paths::decks(),
        &FilterSpec::field_equals(OWNER_FIELD, user.id.as_str()),
    )?;
    let decks: Vec<Deck> = decode_all(&owned);
    let liked = source.fetch(&paths::liked_decks(&user.id), &FilterSpec::All)?;

    let stats = Stats {
        created_decks: decks.len(),
        total_cards: decks.iter().map(|d| d.card_count).sum(),
        liked_decks: liked.len(),
    };

    Ok(CmdResult {
        stats: Some(stats),
        ..Default::default()
    })
}
