use thiserror::Error;

use crate::room::room_fsm::RoomFsmState;
use crate::room::team::Team;

/// User-level rejections. Each one is reported only to the requester and leaves
/// the room state untouched.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("The nickname must have between 2 and 10 characters. Nickname: '{0}'.")]
    InvalidNickname(String),
    #[error("A player with the same nickname is already in the room. Nickname: '{0}'.")]
    PlayerAlreadyExists(String),
    #[error("The game is already in progress. RoomId: '{0}'.")]
    RoomAlreadyStarted(String),
    #[error("Both teams are full. RoomId: '{0}'.")]
    RoomFull(String),
    #[error("The {0} team is at its capacity.")]
    TeamFull(Team),
    #[error("The game can only be started while waiting. ActualState: '{0:?}'.")]
    InvalidStateForStart(RoomFsmState),
    #[error("Teams can only be changed while waiting. ActualState: '{0:?}'.")]
    InvalidStateForTeamChange(RoomFsmState),
    #[error("Settings can only be updated while waiting. ActualState: '{0:?}'.")]
    InvalidStateForSettingsUpdate(RoomFsmState),
    #[error("The game cannot start until both teams have at least one player.")]
    StartRequiresBothTeams,
    #[error("A non host player cannot start the game. Nickname: '{0}'.")]
    NonHostPlayerCannotStartGame(String),
    #[error("A non host player cannot update the room settings. Nickname: '{0}'.")]
    NonHostPlayerCannotUpdateSettings(String),
    #[error("The requested team capacity is below the current rosters. RequestedCapacity: '{0}', LargestRoster: '{1}'.")]
    TeamCapacityBelowRoster(u8, usize),
}
