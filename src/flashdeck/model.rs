//! Domain records and their mapping onto store documents.
//!
//! Records are stored with the field names the mobile clients use
//! (`userId`, `cardCount`, `likedAt`, ...). The document id is not a stored
//! field: [`decode`] injects it as `id` and [`encode`] strips it again.

use crate::error::{FlashdeckError, Result};
use crate::source::{Document, Fields};
use chrono::{DateTime, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const CARD_COUNT_FIELD: &str = "cardCount";
pub const OWNER_FIELD: &str = "userId";

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().simple().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(DeckId);
string_id!(CardId);
string_id!(UserId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: DeckId,
    pub title: String,
    /// Cached card total. Advisory only: it can drift from the real number of
    /// cards, and can even go negative.
    #[serde(default, deserialize_with = "lenient::count")]
    pub card_count: i64,
    #[serde(rename = "userId")]
    pub owner_id: UserId,
    #[serde(rename = "userEmail", default)]
    pub owner_email: String,
    #[serde(
        default,
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// A question/answer pair. Every card document decodes: a side that is
/// missing or not text reads as empty, so a study sequence always has one
/// entry per stored card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: CardId,
    #[serde(default, deserialize_with = "lenient::text")]
    pub question: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub answer: String,
}

/// "User likes deck". Stored under the liking user, keyed by deck id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRelation {
    #[serde(rename = "id")]
    pub deck_id: DeckId,
    #[serde(
        default,
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub liked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The signed-in identity as reported by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
    pub is_anonymous: bool,
}

impl AuthUser {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: UserId::new(id),
            email,
            is_anonymous: false,
        }
    }

    pub fn anonymous(id: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            email: None,
            is_anonymous: true,
        }
    }
}

/// A deck as the listing shows it. Derived on every recomputation, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedDeckView {
    pub deck: Deck,
    pub creator_name: String,
    pub is_liked: bool,
    pub is_owner: bool,
}

impl EnrichedDeckView {
    pub fn title(&self) -> &str {
        &self.deck.title
    }
}

/// Decode a store document into a record, injecting the document id as `id`.
pub fn decode<T: DeserializeOwned>(doc: &Document) -> Result<T> {
    let mut fields = doc.fields.clone();
    fields.insert("id".to_string(), Value::String(doc.id.clone()));
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| FlashdeckError::Decode(format!("{}: {}", doc.id, e)))
}

/// Decode every document that can be decoded. Malformed documents are
/// logged and skipped so one bad record cannot blank a whole list.
pub fn decode_all<T: DeserializeOwned>(docs: &[Document]) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match decode(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("skipping document: {}", e);
                None
            }
        })
        .collect()
}

/// Encode a record into store fields. The `id` field is dropped: it lives in
/// the document path.
pub fn encode<T: Serialize>(record: &T) -> Result<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(fields)
        }
        other => Err(FlashdeckError::Decode(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Field decoders that never reject a document over one odd value.
mod lenient {
    use crate::source::count_value;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Any number; anything else is zero.
    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(count_value(&value).unwrap_or(0))
    }

    /// Strings as-is, numbers and booleans as written, anything else empty.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        })
    }

    /// RFC 3339 strings; anything else (epoch numbers, store-specific
    /// timestamp objects) is treated as unknown.
    pub fn timestamp<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            _ => None,
        })
    }
}

/// Collection and document addresses used by flashdeck.
pub mod paths {
    use super::{CardId, DeckId, UserId};
    use crate::source::{CollectionPath, DocumentPath};

    pub fn users() -> CollectionPath {
        CollectionPath::new("users")
    }

    pub fn user(user: &UserId) -> DocumentPath {
        users().doc(user.as_str())
    }

    pub fn liked_decks(user: &UserId) -> CollectionPath {
        CollectionPath::new(format!("users/{}/likedDecks", user))
    }

    pub fn liked_deck(user: &UserId, deck: &DeckId) -> DocumentPath {
        liked_decks(user).doc(deck.as_str())
    }

    pub fn decks() -> CollectionPath {
        CollectionPath::new("decks")
    }

    pub fn deck(deck: &DeckId) -> DocumentPath {
        decks().doc(deck.as_str())
    }

    pub fn flashcards(deck: &DeckId) -> CollectionPath {
        CollectionPath::new(format!("decks/{}/flashcards", deck))
    }

    pub fn flashcard(deck: &DeckId, card: &CardId) -> DocumentPath {
        flashcards(deck).doc(card.as_str())
    }
}
