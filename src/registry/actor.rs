use std::fmt::{Display, Formatter};

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::oneshot::Sender as OneshotSender;

use crate::config::GameSettings;
use crate::error::Error;
use crate::registry::actor_client::RegistryClient;
use crate::registry::RoomRegistry;
use crate::room::actor::RoomSummary;
use crate::room::actor_client::RoomClient;
use crate::room::settings::{RoomSettings, SettingsPatch};

pub struct RegistryActor {
    registry: RoomRegistry,
    registry_rx: Receiver<RegistryCommand>,
    registry_tx: Sender<RegistryCommand>,
}

impl RegistryActor {
    /// Runs the registry in the background and returns a client to talk to it.
    pub fn spawn(game_settings: GameSettings) -> RegistryClient {
        let registry = RoomRegistry::new(game_settings);
        let (registry_tx, registry_rx): (Sender<RegistryCommand>, Receiver<RegistryCommand>) =
            mpsc::channel(512);

        tokio::spawn(
            RegistryActor {
                registry,
                registry_rx,
                registry_tx: registry_tx.clone(),
            }
            .start(),
        );

        RegistryClient { registry_tx }
    }

    async fn start(mut self) {
        while let Some(command) = self.registry_rx.recv().await {
            let response = match command {
                RegistryCommand::CreateRoom { patch, response_tx } => {
                    let settings = RoomSettings::default().apply(patch);
                    let room_id = self.registry.create_room(settings, self.client());
                    Some((Ok(RegistryResponse::RoomCreated { room_id }), response_tx))
                }
                RegistryCommand::GetOrCreateRoom {
                    room_id,
                    response_tx,
                } => {
                    let room = self.registry.get_or_create_room(&room_id, self.client());
                    Some((Ok(RegistryResponse::RoomActor { room }), response_tx))
                }
                RegistryCommand::RemoveRoom { room_id } => {
                    let _ = self.registry.remove_room(&room_id);
                    None
                }
                RegistryCommand::ListRooms { response_tx } => {
                    let rooms = self.list_joinable_rooms().await;
                    Some((Ok(RegistryResponse::RoomList { rooms }), response_tx))
                }
            };
            if let Some((result, response_tx)) = response {
                let event = match result {
                    Ok(event) => event,
                    Err(error) => RegistryResponse::Error { error },
                };
                if let Err(error) = response_tx.send(event) {
                    log::error!(
                        "Sent a RegistryResponse but the response channel is closed. Error: '{error}'."
                    );
                }
            }
        }
    }

    /// Rooms still in `waiting` with a free seat. Rooms that are tearing down
    /// simply fail to answer and are skipped.
    async fn list_joinable_rooms(&self) -> Vec<RoomSummary> {
        let clients: Vec<RoomClient> = self.registry.rooms().cloned().collect();
        let mut rooms = Vec::with_capacity(clients.len());
        for client in clients {
            if let Ok(summary) = client.summary().await {
                if summary.is_joinable {
                    rooms.push(summary);
                }
            }
        }
        rooms
    }

    fn client(&self) -> RegistryClient {
        RegistryClient {
            registry_tx: self.registry_tx.clone(),
        }
    }
}

pub(crate) enum RegistryCommand {
    CreateRoom {
        patch: SettingsPatch,
        response_tx: OneshotSender<RegistryResponse>,
    },
    GetOrCreateRoom {
        room_id: String,
        response_tx: OneshotSender<RegistryResponse>,
    },
    RemoveRoom {
        room_id: String,
    },
    ListRooms {
        response_tx: OneshotSender<RegistryResponse>,
    },
}

#[derive(Debug)]
pub(crate) enum RegistryResponse {
    RoomCreated { room_id: String },
    RoomActor { room: RoomClient },
    RoomList { rooms: Vec<RoomSummary> },
    Error { error: Error },
}

impl Display for RegistryResponse {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                RegistryResponse::RoomCreated { room_id } =>
                    format!("RoomCreated(room_id: {room_id})"),
                RegistryResponse::RoomActor { room: _ } => "RoomActor".to_string(),
                RegistryResponse::RoomList { rooms } =>
                    format!("RoomList({} rooms)", rooms.len()),
                RegistryResponse::Error { error } => format!("Error '{error}'"),
            }
        )
    }
}
