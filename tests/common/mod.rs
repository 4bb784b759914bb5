#![allow(dead_code)]

use flashdeck::api::FlashdeckApi;
use flashdeck::config::FlashdeckConfig;
use flashdeck::model::{paths, AuthUser, DeckId};
use flashdeck::source::count_value;
use flashdeck::source::memory::fixtures::SourceFixture;
use flashdeck::source::memory::InMemorySource;

/// Two users, three decks and one like: `u1` (Ada) owns "Spanish" (2 cards),
/// `u2` (no display name) owns "Kanji" (1 card) and "Chess Openings" (empty),
/// and `u1` likes "Kanji".
pub fn library() -> SourceFixture {
    SourceFixture::new()
        .with_user("u1", Some("Ada"), Some("u1@example.com"))
        .with_user("u2", None, Some("u2@example.com"))
        .with_deck("d1", "Spanish", "u1", 2)
        .with_deck("d2", "Kanji", "u2", 1)
        .with_deck("d3", "Chess Openings", "u2", 0)
        .with_like("u1", "d2")
}

pub fn card_count(source: &InMemorySource, deck: &str) -> i64 {
    source
        .get(&paths::deck(&DeckId::new(deck)))
        .and_then(|doc| doc.fields.get("cardCount").and_then(count_value))
        .unwrap()
}

/// An API over a settled source signed in as `u1`.
pub fn api(fixture: SourceFixture) -> FlashdeckApi<InMemorySource> {
    FlashdeckApi::new(
        fixture.settled().source,
        FlashdeckConfig::default(),
        Some(AuthUser::new("u1", Some("u1@example.com".into()))),
    )
}
