use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot::error::RecvError;
use tokio::sync::oneshot::{self, Receiver as OneshotReceiver, Sender as OneshotSender};

use crate::error::Error;
use crate::registry::actor::{RegistryCommand, RegistryResponse};
use crate::room::actor::RoomSummary;
use crate::room::actor_client::RoomClient;
use crate::room::settings::SettingsPatch;

#[derive(Clone)]
pub struct RegistryClient {
    pub(super) registry_tx: Sender<RegistryCommand>,
}

impl RegistryClient {
    pub async fn create_room(&self, patch: SettingsPatch) -> Result<String, Error> {
        let (tx, rx): (
            OneshotSender<RegistryResponse>,
            OneshotReceiver<RegistryResponse>,
        ) = oneshot::channel();

        self.send_command(
            RegistryCommand::CreateRoom {
                patch,
                response_tx: tx,
            },
            "The registry is not alive. Can't create a room",
        )
        .await?;

        match rx.await {
            Ok(RegistryResponse::RoomCreated { room_id }) => Ok(room_id),
            error => Err(RegistryClient::handle_response_error(error)),
        }
    }

    pub async fn get_or_create_room(&self, room_id: &str) -> Result<RoomClient, Error> {
        let (tx, rx): (
            OneshotSender<RegistryResponse>,
            OneshotReceiver<RegistryResponse>,
        ) = oneshot::channel();

        self.send_command(
            RegistryCommand::GetOrCreateRoom {
                room_id: room_id.to_string(),
                response_tx: tx,
            },
            "The registry channel is closed",
        )
        .await?;

        match rx.await {
            Ok(RegistryResponse::RoomActor { room }) => Ok(room),
            error => Err(RegistryClient::handle_response_error(error)),
        }
    }

    pub async fn remove_room(&self, room_id: &str) -> Result<(), Error> {
        self.send_command(
            RegistryCommand::RemoveRoom {
                room_id: room_id.to_string(),
            },
            "The registry channel is closed",
        )
        .await
    }

    pub async fn list_rooms(&self) -> Result<Vec<RoomSummary>, Error> {
        let (tx, rx): (
            OneshotSender<RegistryResponse>,
            OneshotReceiver<RegistryResponse>,
        ) = oneshot::channel();

        self.send_command(
            RegistryCommand::ListRooms { response_tx: tx },
            "The registry channel is closed",
        )
        .await?;

        match rx.await {
            Ok(RegistryResponse::RoomList { rooms }) => Ok(rooms),
            error => Err(RegistryClient::handle_response_error(error)),
        }
    }

    async fn send_command(
        &self,
        command: RegistryCommand,
        error_message: &str,
    ) -> Result<(), Error> {
        self.registry_tx.send(command).await.map_err(|error| {
            Error::log_and_create_internal(&format!("{error_message}. Error: '{error}'."))
        })
    }

    fn handle_response_error(error: Result<RegistryResponse, RecvError>) -> Error {
        match error {
            Ok(RegistryResponse::Error { error }) => error,
            Ok(unexpected_response) => Error::log_and_create_internal(&format!(
                "Received an unexpected RegistryResponse. RegistryResponse: '{unexpected_response}'."
            )),
            _ => Error::log_and_create_internal(
                "Sent a command to the registry actor, but the actor channel died.",
            ),
        }
    }
}
