pub mod message;

use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;

use crate::error::domain_error::DomainError;
use crate::error::Error;
use message::{WsMessageIn, WsMessageOut};

pub fn parse_message(message: &str) -> Result<WsMessageIn, Error> {
    serde_json::from_str(message).map_err(|error| {
        Error::UnprocessableMessage(error.to_string(), message.to_string())
    })
}

pub async fn send_message<T>(websocket: &mut WebSocket, value: &T) -> Result<(), Error>
where
    T: ?Sized + Serialize,
{
    let message = serde_json::to_string(value).map_err(|error| {
        Error::log_and_create_internal(&format!(
            "Could not serialize the message. Error: '{error}'."
        ))
    })?;
    send_message_string(websocket, &message).await
}

pub async fn send_message_string(websocket: &mut WebSocket, value: &str) -> Result<(), Error> {
    websocket
        .send(Message::Text(value.to_string()))
        .await
        .map_err(|error| Error::WebsocketClosed(error.to_string()))
}

pub async fn send_error(websocket: &mut WebSocket, error: &Error) {
    // The socket may be gone already, in that case there is nobody to tell
    let _ = send_message(websocket, &error_to_ws_error(error)).await;
}

pub async fn send_error_and_close(mut websocket: WebSocket, error: &Error) {
    send_error(&mut websocket, error).await;
    close(websocket).await;
}

pub async fn close(websocket: WebSocket) {
    if let Err(error) = websocket.close().await {
        log::debug!("Could not close the websocket. Error: '{error}'.");
    }
}

fn error_to_ws_error(error: &Error) -> WsMessageOut {
    let (r#type, title) = match error {
        Error::Domain(domain_error) => match domain_error {
            DomainError::InvalidNickname(_) => ("INVALID_NICKNAME", "The nickname is not valid"),
            DomainError::PlayerAlreadyExists(_) => {
                ("PLAYER_ALREADY_EXISTS", "The player already exists")
            }
            DomainError::RoomAlreadyStarted(_) => {
                ("ROOM_ALREADY_STARTED", "The game is already in progress")
            }
            DomainError::RoomFull(_) => ("ROOM_FULL", "The room is full"),
            DomainError::TeamFull(_) => ("TEAM_FULL", "The team is full"),
            DomainError::InvalidStateForStart(_)
            | DomainError::InvalidStateForTeamChange(_)
            | DomainError::InvalidStateForSettingsUpdate(_) => {
                ("INVALID_STATE", "The operation is not allowed right now")
            }
            DomainError::StartRequiresBothTeams => (
                "START_REQUIRES_BOTH_TEAMS",
                "Both teams need at least one player",
            ),
            DomainError::NonHostPlayerCannotStartGame(_)
            | DomainError::NonHostPlayerCannotUpdateSettings(_) => {
                ("COMMAND_NOT_ALLOWED", "Only the host can do that")
            }
            DomainError::TeamCapacityBelowRoster(_, _) => (
                "TEAM_CAPACITY_BELOW_ROSTER",
                "The teams are larger than the requested capacity",
            ),
        },
        Error::Internal(_) => ("INTERNAL_SERVER", "Internal server error"),
        Error::UnprocessableMessage(_, _) => (
            "UNPROCESSABLE_WEBSOCKET_MESSAGE",
            "The message cannot be processed",
        ),
        Error::WebsocketClosed(_) => ("WEBSOCKET_CLOSED", "The player websocket is closed"),
    };

    WsMessageOut::Error {
        r#type: r#type.to_string(),
        title: title.to_string(),
        detail: error_detail(error),
    }
}

fn error_detail(error: &Error) -> String {
    match error {
        Error::Domain(domain_error) => domain_error.to_string(),
        other => other.to_string(),
    }
}
