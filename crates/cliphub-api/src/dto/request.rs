//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username. The column caps it at 25 characters.
    #[validate(length(min = 1, max = 25, message = "Username must be 1-25 characters"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Whether to issue a long-lived "remember me" session.
    #[serde(default)]
    pub remember: bool,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Whether to issue a long-lived "remember me" session.
    #[serde(default)]
    pub remember: bool,
}

/// Create clip request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateClipRequest {
    /// The clipboard text.
    #[validate(length(min = 1, message = "Clip text is required"))]
    pub text: String,
}

/// Repeated `?id=…&id=…` query for bulk deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdsQuery {
    /// Record ids to operate on.
    #[serde(default)]
    pub id: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_oversized_username() {
        let req = RegisterRequest {
            username: "x".repeat(26),
            password: "long-enough".to_string(),
            remember: false,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn remember_defaults_to_false() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"username":"alice","password":"pw"}"#).unwrap();
        assert!(!req.remember);
    }
}
