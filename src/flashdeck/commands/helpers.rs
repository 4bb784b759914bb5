use crate::error::{FlashdeckError, Result};
use crate::model::AuthUser;

/// Trimmed-empty text is rejected with `message`.
pub fn require_text(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FlashdeckError::Validation(message.to_string()));
    }
    Ok(())
}

/// The signed-in, non-anonymous user, or an error naming `action`.
pub fn require_account<'a>(user: Option<&'a AuthUser>, action: &str) -> Result<&'a AuthUser> {
    match user {
        Some(user) if !user.is_anonymous => Ok(user),
        _ => Err(FlashdeckError::Unauthenticated(format!(
            "sign in to {}",
            action
        ))),
    }
}
