use serde::{Deserialize, Serialize};

use crate::player::Player;
use crate::room::deck::{Card, Claim, Scores};
use crate::room::settings::RoomSettings;
use crate::room::team::Team;
use crate::room::{EndReason, Winner};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum WsMessageIn {
    StartGame,
    #[serde(rename_all = "camelCase")]
    SubmitWord { word: String },
    ChangeTeam,
    #[serde(rename_all = "camelCase")]
    UpdateSettings {
        max_team_size: Option<u8>,
        total_cards: Option<u8>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum WsMessageOut {
    Error {
        r#type: String,
        title: String,
        detail: String,
    },
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        room_id: String,
        player: PlayerDto,
        teams: TeamsDto,
        settings: RoomSettings,
    },
    PlayerJoined {
        player: PlayerDto,
        teams: TeamsDto,
    },
    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        player_id: String,
        teams: TeamsDto,
    },
    TeamsUpdated {
        teams: TeamsDto,
    },
    SettingsUpdated {
        settings: RoomSettings,
    },
    GameStarting,
    #[serde(rename_all = "camelCase")]
    GameStarted {
        cards: Vec<CardDto>,
        teams: TeamsDto,
        remaining_seconds: u32,
        settings: RoomSettings,
    },
    #[serde(rename_all = "camelCase")]
    TimerUpdate {
        remaining_seconds: u32,
    },
    #[serde(rename_all = "camelCase")]
    CardClaimed {
        card_index: usize,
        claimant: ClaimantDto,
        team: Team,
    },
    GameEnd {
        winner: Winner,
        scores: Scores,
        reason: EndReason,
    },
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub id: String,
    pub nickname: String,
    pub team: Team,
    pub is_host: bool,
}

impl From<&Player> for PlayerDto {
    fn from(player: &Player) -> Self {
        PlayerDto {
            id: player.id.clone(),
            nickname: player.nickname.clone(),
            team: player.team,
            is_host: player.is_host,
        }
    }
}

/// The two rosters, already split out so the board can render them directly.
#[derive(Serialize)]
pub struct TeamsDto {
    pub red: Vec<PlayerDto>,
    pub blue: Vec<PlayerDto>,
}

impl TeamsDto {
    pub fn from_players(players: &[Player]) -> Self {
        let dto = |team: Team| {
            players
                .iter()
                .filter(|player| player.team == team)
                .map(PlayerDto::from)
                .collect()
        };
        TeamsDto {
            red: dto(Team::Red),
            blue: dto(Team::Blue),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDto {
    pub index: usize,
    pub word: String,
    pub team: Team,
    pub claimed_by: Option<ClaimantDto>,
    pub claimed_team: Option<Team>,
}

impl From<&Card> for CardDto {
    fn from(card: &Card) -> Self {
        CardDto {
            index: card.index,
            word: card.word.clone(),
            team: card.owner,
            claimed_by: card.claim.as_ref().map(ClaimantDto::from),
            claimed_team: card.claim.as_ref().map(|claim| claim.team),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimantDto {
    pub id: String,
    pub nickname: String,
}

impl From<&Claim> for ClaimantDto {
    fn from(claim: &Claim) -> Self {
        ClaimantDto {
            id: claim.player_id.clone(),
            nickname: claim.nickname.clone(),
        }
    }
}
