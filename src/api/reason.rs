//! String-tagged reason codes
//!
//! Failed requests resolve with a payload carrying one of these codes;
//! `user_message` maps a code onto the operator-facing message shown by
//! front-ends.

use crate::error::TallyError;

pub const UNAUTHORIZED: &str = "unauthorized";
pub const TOKEN_EXPIRED: &str = "token-expired";
pub const USER_CANT_BE_EMPTY: &str = "user-cant-be-empty";
pub const ROLE_CANT_BE_EMPTY: &str = "role-cant-be-empty";
pub const USER_ALREADY_EXISTS: &str = "user-already-exists";
pub const NOT_ALL_DELETED: &str = "not-all-deleted";
pub const ROLE_DOES_NOT_EXISTS: &str = "role-does-not-exists";
pub const INVALID_PASSWORD: &str = "invalid-password";
pub const NOT_FOUND: &str = "not-found";
pub const INVALID_REQUEST: &str = "invalid-request";
pub const UNKNOWN_METHOD: &str = "unknown-method";
pub const INTERNAL_ERROR: &str = "internal-error";
pub const TIMEOUT: &str = "timeout";

/// Map an error onto the reason code a handler resolves with
pub fn from_error(error: &TallyError) -> String {
    match error {
        TallyError::Reason(code) => (*code).to_string(),
        TallyError::Duplicate {
            entity_type: "User", ..
        } => USER_ALREADY_EXISTS.to_string(),
        TallyError::NotFound { .. } => NOT_FOUND.to_string(),
        TallyError::Validation(_) | TallyError::Json(_) => INVALID_REQUEST.to_string(),
        _ => INTERNAL_ERROR.to_string(),
    }
}

/// The message shown to the operator for a reason code
///
/// Unknown codes get a generic internal-error message carrying the code.
pub fn user_message(reason: &str) -> String {
    match reason {
        UNAUTHORIZED => "You are not logged in.".to_string(),
        TOKEN_EXPIRED => "Login expired, please log in again.".to_string(),
        USER_CANT_BE_EMPTY => {
            "Please enter a value for the username; the field cannot be empty.".to_string()
        }
        ROLE_CANT_BE_EMPTY => "Select a role; the field cannot be empty.".to_string(),
        USER_ALREADY_EXISTS => {
            "The username you entered already exists. Please choose a different username."
                .to_string()
        }
        NOT_ALL_DELETED => {
            "Not all users were deleted. Check if one of the selected users is the server owner."
                .to_string()
        }
        ROLE_DOES_NOT_EXISTS => "Selected role does not exist, possibly a bug?".to_string(),
        INVALID_PASSWORD => "Invalid password.".to_string(),
        _ => format!("An internal error occurred, sorry! (ref: {})", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_error_passes_through() {
        let err = TallyError::Reason(TOKEN_EXPIRED);
        assert_eq!(from_error(&err), TOKEN_EXPIRED);
    }

    #[test]
    fn test_duplicate_user_maps_to_user_already_exists() {
        let err = TallyError::Duplicate {
            entity_type: "User",
            identifier: "alice".to_string(),
        };
        assert_eq!(from_error(&err), USER_ALREADY_EXISTS);

        // Other duplicates stay generic
        let err = TallyError::Duplicate {
            entity_type: "Category",
            identifier: "Groceries".to_string(),
        };
        assert_eq!(from_error(&err), INTERNAL_ERROR);
    }

    #[test]
    fn test_unknown_reason_gets_generic_message() {
        let message = user_message("something-odd");
        assert!(message.contains("something-odd"));
    }

    #[test]
    fn test_known_reason_messages() {
        assert_eq!(
            user_message(TOKEN_EXPIRED),
            "Login expired, please log in again."
        );
        assert!(user_message(NOT_ALL_DELETED).contains("server owner"));
    }
}
