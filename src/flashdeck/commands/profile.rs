use crate::commands::{CmdMessage, CmdResult};
use crate::error::{FlashdeckError, Result};
use crate::model::{paths, AuthUser};
use crate::source::{Fields, RemoteSource};
use serde_json::Value;

use super::helpers::require_account;

/// Set the display name shown as creator on the user's decks.
///
/// Merges into the profile document, creating it if the user has none yet.
/// The length rule applies to the trimmed name; the name is stored as typed.
pub fn set_display_name<S: RemoteSource>(
    source: &S,
    user: Option<&AuthUser>,
    name: &str,
    min_len: usize,
) -> Result<CmdResult> {
    let user = require_account(user, "edit your profile")?;
    if name.trim().chars().count() < min_len {
        return Err(FlashdeckError::Validation(format!(
            "Display name must be at least {} characters",
            min_len
        )));
    }

    let mut fields = Fields::new();
    fields.insert("displayName".to_string(), Value::from(name));
    if let Some(email) = &user.email {
        fields.insert("email".to_string(), Value::from(email.as_str()));
    }

    let path = paths::user(&user.id);
    match source.update(&path, fields.clone()) {
        Err(FlashdeckError::NotFound(_)) => source.write(&path, fields)?,
        other => other?,
    }

    Ok(CmdResult::default().with_message(CmdMessage::success(format!(
        "Display name set to {}",
        name.trim()
    ))))
}
