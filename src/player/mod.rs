pub mod actor;

use std::fmt::Display;

use rand::distributions::{Alphanumeric, DistString};

use crate::error::domain_error::DomainError;
use crate::error::Error;
use crate::room::team::Team;

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub id: String,
    pub nickname: String,
    pub team: Team,
    pub is_host: bool,
}

impl Player {
    pub fn new(id: &str, nickname: &str, team: Team) -> Self {
        Player {
            id: id.to_string(),
            nickname: nickname.to_string(),
            team,
            is_host: false,
        }
    }
}

/// Opaque per-connection identity. The transport layer does not hand us one, so
/// we mint it when the websocket is accepted and carry it through every command.
pub fn new_player_id() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), 12)
}

/// A display nickname of 2 to 10 characters.
#[derive(Clone, Debug, PartialEq)]
pub struct Nickname(String);

impl Nickname {
    const MIN_CHARS: usize = 2;
    const MAX_CHARS: usize = 10;

    pub fn parse(value: &str) -> Result<Nickname, Error> {
        let trimmed = value.trim();
        if trimmed.chars().count() < Nickname::MIN_CHARS {
            return Err(Error::Domain(DomainError::InvalidNickname(
                value.to_string(),
            )));
        }
        Ok(Nickname(trimmed.chars().take(Nickname::MAX_CHARS).collect()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Nickname {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
