//! Lobby codes and the navigation URLs used to create or join a lobby.

use std::{fmt, str::FromStr};

use rand::Rng;
use reqwest::Url;

use crate::error::ClientError;

const CODE_MIN: u16 = 1000;
const CODE_MAX: u16 = 9999;

/// Short numeric lobby identifier.
///
/// Codes are drawn uniformly; collisions between lobbies are possible and
/// accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LobbyCode(u16);

impl LobbyCode {
    /// Draw a random four-digit code
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Draw a code from the given random source
    pub fn generate_with<R: Rng>(rng: &mut R) -> Self {
        Self(rng.random_range(CODE_MIN..=CODE_MAX))
    }

    /// Parse a code typed by a user
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidLobbyCode`] unless `value` is exactly four
    /// ASCII digits not starting with `0`.
    pub fn parse(value: &str) -> Result<Self, ClientError> {
        let trimmed = value.trim();
        if trimmed.len() != 4 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ClientError::InvalidLobbyCode(value.to_string()));
        }
        match trimmed.parse::<u16>() {
            Ok(code) if (CODE_MIN..=CODE_MAX).contains(&code) => Ok(Self(code)),
            _ => Err(ClientError::InvalidLobbyCode(value.to_string())),
        }
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for LobbyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LobbyCode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// What the player asked to do from the start page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyAction {
    Create,
    Join,
}

impl LobbyAction {
    pub fn path(self) -> &'static str {
        match self {
            LobbyAction::Create => "/lobby",
            LobbyAction::Join => "/join",
        }
    }
}

/// Build the navigation URL for a lobby action.
///
/// Produces `<base>/lobby?name=..&room=..` or `<base>/join?name=..&room=..`
/// with the query values percent-encoded.
///
/// # Errors
///
/// Returns [`ClientError::InvalidUrl`] if `base_url` cannot be parsed.
pub fn navigation_url(
    base_url: &str,
    action: LobbyAction,
    name: &str,
    room: LobbyCode,
) -> Result<Url, ClientError> {
    let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
    let mut url = base
        .join(action.path())
        .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
    url.query_pairs_mut()
        .clear()
        .append_pair("name", name)
        .append_pair("room", &room.to_string());
    Ok(url)
}
