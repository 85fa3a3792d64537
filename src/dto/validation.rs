//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest display name a player may register with.
pub const MAX_DISPLAY_NAME_CHARS: usize = 32;

/// Validates a player display name: non-blank, at most 32 characters, no control characters.
///
/// # Examples
///
/// ```ignore
/// validate_display_name("Alice")   // Ok
/// validate_display_name("   ")     // Err - blank
/// validate_display_name("a\tb")    // Err - control character
/// ```
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("display_name_blank");
        err.message = Some("Display name must not be blank".into());
        return Err(err);
    }

    let count = trimmed.chars().count();
    if count > MAX_DISPLAY_NAME_CHARS {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some(
            format!("Display name must be at most {MAX_DISPLAY_NAME_CHARS} characters (got {count})")
                .into(),
        );
        return Err(err);
    }

    if trimmed.chars().any(char::is_control) {
        let mut err = ValidationError::new("display_name_format");
        err.message = Some("Display name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}
