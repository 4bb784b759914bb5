use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{encode, paths, AuthUser, DeckId, LikeRelation};
use crate::source::RemoteSource;
use chrono::Utc;
use log::debug;

use super::helpers::require_account;

/// Flip the like relation between the signed-in user and `deck`.
///
/// `currently_liked` is what the caller last saw; the store is not consulted.
pub fn toggle<S: RemoteSource>(
    source: &S,
    user: Option<&AuthUser>,
    deck: &DeckId,
    currently_liked: bool,
) -> Result<CmdResult> {
    let user = require_account(user, "like decks")?;
    let path = paths::liked_deck(&user.id, deck);

    if currently_liked {
        source.delete(&path)?;
        debug!("{} unliked {}", user.id, deck);
        return Ok(CmdResult::default()
            .with_deck(deck.clone())
            .with_message(CmdMessage::info("Removed from liked decks")));
    }

    let like = LikeRelation {
        deck_id: deck.clone(),
        liked_at: Some(Utc::now()),
    };
    source.write(&path, encode(&like)?)?;
    debug!("{} liked {}", user.id, deck);
    Ok(CmdResult::default()
        .with_deck(deck.clone())
        .with_message(CmdMessage::success("Added to liked decks")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlashdeckError;
    use crate::source::memory::fixtures::SourceFixture;

    #[test]
    fn like_then_unlike() {
        let fixture = SourceFixture::new().with_deck("d1", "Spanish", "u2", 0);
        let user = AuthUser::new("u1", None);
        let deck = DeckId::new("d1");
        let path = paths::liked_deck(&user.id, &deck);

        toggle(&fixture.source, Some(&user), &deck, false).unwrap();
        let stored = fixture.source.get(&path).unwrap();
        assert!(stored.fields.contains_key("likedAt"));

        toggle(&fixture.source, Some(&user), &deck, true).unwrap();
        assert!(!fixture.source.contains(&path));
    }

    #[test]
    fn anonymous_user_cannot_like() {
        let fixture = SourceFixture::new().with_deck("d1", "Spanish", "u2", 0);
        let anon = AuthUser::anonymous("a1");
        let result = toggle(&fixture.source, Some(&anon), &DeckId::new("d1"), false);
        assert!(matches!(result, Err(FlashdeckError::Unauthenticated(_))));
        assert!(fixture
            .source
            .documents(&paths::liked_decks(&anon.id))
            .is_empty());
    }
}
