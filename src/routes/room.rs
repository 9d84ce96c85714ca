use std::sync::Arc;

use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::player::actor::PlayerActor;
use crate::player::{new_player_id, Nickname};
use crate::registry::actor_client::RegistryClient;
use crate::room::actor::RoomSummary;
use crate::room::settings::{RoomSettings, SettingsPatch};
use crate::websocket::send_error_and_close;

#[derive(Serialize)]
pub struct CreateRoomResponse {
    id: String,
}

pub async fn create(
    State(registry): State<Arc<RegistryClient>>,
    patch: Option<Json<SettingsPatch>>,
) -> Response {
    let Json(patch) = patch.unwrap_or_default();
    match registry.create_room(patch).await {
        Ok(room_id) => (StatusCode::OK, Json(CreateRoomResponse { id: room_id })).into_response(),
        Err(error) => {
            log::error!("Could not create a room. Error: '{error}'.");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListEntry {
    id: String,
    current_players: usize,
    max_players: usize,
    settings: RoomSettings,
}

impl From<RoomSummary> for RoomListEntry {
    fn from(summary: RoomSummary) -> Self {
        RoomListEntry {
            id: summary.id,
            current_players: summary.current_players,
            max_players: summary.max_players,
            settings: summary.settings,
        }
    }
}

pub async fn list(State(registry): State<Arc<RegistryClient>>) -> Response {
    match registry.list_rooms().await {
        Ok(rooms) => {
            let rooms: Vec<RoomListEntry> = rooms.into_iter().map(RoomListEntry::from).collect();
            (StatusCode::OK, Json(rooms)).into_response()
        }
        Err(error) => {
            log::error!("Could not list the rooms. Error: '{error}'.");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn connect_player_to_websocket(
    State(registry): State<Arc<RegistryClient>>,
    Path((room_id, nickname)): Path<(String, String)>,
    websocket_upgrade: WebSocketUpgrade,
) -> Response {
    websocket_upgrade.on_upgrade(move |websocket| async move {
        let nickname = match Nickname::parse(&nickname) {
            Ok(nickname) => nickname,
            Err(error) => return send_error_and_close(websocket, &error).await,
        };
        match registry.get_or_create_room(&room_id).await {
            Ok(room) => {
                PlayerActor::create(new_player_id(), nickname, room_id, room, websocket).await
            }
            Err(error) => send_error_and_close(websocket, &error).await,
        }
    })
}
