//! Lobby identity attached to a session: join code, role and connection mode.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Number of characters in a join code.
pub const LOBBY_CODE_LENGTH: usize = 6;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Whether the local process created the lobby or joined it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Created the lobby; provisions the document and drives phase transitions.
    #[default]
    Host,
    /// Joined an existing lobby by code.
    Guest,
}

/// Where the session's snapshots are exchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Through the remote document store.
    Online,
    /// Through the in-process cache only.
    #[default]
    Offline,
}

impl SessionMode {
    /// Whether the mode syncs through the remote store.
    pub fn is_online(self) -> bool {
        matches!(self, SessionMode::Online)
    }
}

/// Join code could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid lobby code `{input}`: {reason}")]
pub struct InvalidCode {
    /// Raw input supplied by the user.
    pub input: String,
    /// What was wrong with it.
    pub reason: &'static str,
}

/// Normalized join code: fixed length, uppercase ASCII alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LobbyCode(String);

impl LobbyCode {
    /// Parse user input, trimming whitespace and normalizing case.
    pub fn parse(input: &str) -> Result<Self, InvalidCode> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(InvalidCode {
                input: input.to_string(),
                reason: "code must not be empty",
            });
        }

        if trimmed.chars().count() != LOBBY_CODE_LENGTH {
            return Err(InvalidCode {
                input: input.to_string(),
                reason: "code must be exactly 6 characters",
            });
        }

        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InvalidCode {
                input: input.to_string(),
                reason: "code must only contain letters and digits",
            });
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Draw a random code from `A-Z0-9`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..LOBBY_CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LobbyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LobbyCode {
    type Error = InvalidCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LobbyCode> for String {
    fn from(value: LobbyCode) -> Self {
        value.0
    }
}
