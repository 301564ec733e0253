//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::lobby::LobbyCode;

/// Validates that a join code normalizes to six ASCII letters or digits.
///
/// # Examples
///
/// ```ignore
/// validate_lobby_code("AB12CD")   // Ok
/// validate_lobby_code(" ab12cd ") // Ok - trimmed and upper-cased later
/// validate_lobby_code("AB-12C")   // Err - punctuation
/// ```
pub fn validate_lobby_code(code: &str) -> Result<(), ValidationError> {
    LobbyCode::parse(code).map(|_| ()).map_err(|invalid| {
        let mut err = ValidationError::new("lobby_code");
        err.message = Some(invalid.reason.into());
        err
    })
}

/// Rejects strings that are empty once trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_lobby_code_valid() {
        assert!(validate_lobby_code("AB12CD").is_ok());
        assert!(validate_lobby_code("ab12cd").is_ok());
        assert!(validate_lobby_code("  000000 ").is_ok());
    }

    #[test]
    fn test_validate_lobby_code_invalid_length() {
        assert!(validate_lobby_code("AB12C").is_err()); // too short
        assert!(validate_lobby_code("AB12CDE").is_err()); // too long
        assert!(validate_lobby_code("").is_err()); // empty
    }

    #[test]
    fn test_validate_lobby_code_invalid_format() {
        let err = validate_lobby_code("AB 12C").unwrap_err();
        assert_eq!(err.code, "lobby_code");
        assert!(validate_lobby_code("AB_12C").is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Ada").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }
}
