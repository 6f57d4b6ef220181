//! Identifier newtypes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable user identifier. Doubles as the broker fan-out key and the
/// per-user storage directory name, which must stay in agreement.
pub type UserId = Uuid;

/// Opaque session token minted at login.
///
/// The full value is only ever exposed through [`SessionToken::expose`]
/// (for the cookie); `Display` prints an abbreviated form suitable for
/// logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps an already-encoded token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The full token value, for transport to the client.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "{prefix}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_abbreviates_token() {
        let token = SessionToken::new("abcdefghijklmnop");
        assert_eq!(token.to_string(), "abcdefgh…");
        assert_eq!(token.expose(), "abcdefghijklmnop");
    }
}
