use tokio::sync::broadcast;
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot::{self, Receiver as OneshotReceiver, Sender as OneshotSender};

use crate::error::Error;
use crate::room::actor::{RoomCommand, RoomEvent, RoomSnapshot, RoomSummary, RoomWideEvent};
use crate::room::settings::SettingsPatch;

#[derive(Clone, Debug)]
pub struct RoomClient {
    pub(super) room_tx: Sender<RoomCommand>,
}

/// What the joining connection gets back: the snapshot of the room and the
/// stream of everything that happens in it from this point on.
pub struct RoomJoin {
    pub snapshot: RoomSnapshot,
    pub events: RoomWideEventReceiver,
}

impl RoomClient {
    pub async fn add_player(&self, player_id: &str, nickname: &str) -> Result<RoomJoin, Error> {
        let (tx, rx): (OneshotSender<RoomEvent>, OneshotReceiver<RoomEvent>) = oneshot::channel();

        self.send_command(
            RoomCommand::AddPlayer {
                player_id: player_id.to_string(),
                nickname: nickname.to_string(),
                response_tx: tx,
            },
            "The room is not alive. Can't add the player",
        )
        .await?;

        match rx.await {
            Ok(RoomEvent::PlayerAdded {
                broadcast_rx,
                snapshot,
            }) => Ok(RoomJoin {
                snapshot,
                events: RoomWideEventReceiver { broadcast_rx },
            }),
            Ok(RoomEvent::Error { error }) => Err(error),
            _ => Err(Error::log_and_create_internal(
                "Sent a RoomCommand::AddPlayer but the room channel died.",
            )),
        }
    }

    pub async fn disconnect_player(&self, player_id: &str) -> Result<(), Error> {
        self.send_command(
            RoomCommand::DisconnectPlayer {
                player_id: player_id.to_string(),
            },
            "Tried to send RoomCommand::DisconnectPlayer but the room actor is not listening",
        )
        .await
    }

    pub async fn start_game(&self, player_id: &str) -> Result<(), Error> {
        self.request(|response_tx| RoomCommand::StartGame {
            player_id: player_id.to_string(),
            response_tx,
        })
        .await
    }

    pub async fn update_settings(&self, player_id: &str, patch: SettingsPatch) -> Result<(), Error> {
        self.request(|response_tx| RoomCommand::UpdateSettings {
            player_id: player_id.to_string(),
            patch,
            response_tx,
        })
        .await
    }

    pub async fn change_team(&self, player_id: &str) -> Result<(), Error> {
        self.request(|response_tx| RoomCommand::ChangeTeam {
            player_id: player_id.to_string(),
            response_tx,
        })
        .await
    }

    /// Fire-and-forget on purpose: misses and lost claim races are silent
    /// no-ops, a claim comes back through the broadcast channel.
    pub async fn submit_word(&self, player_id: &str, word: &str) -> Result<(), Error> {
        self.send_command(
            RoomCommand::SubmitWord {
                player_id: player_id.to_string(),
                word: word.to_string(),
            },
            "Tried to send RoomCommand::SubmitWord but the room actor is not listening",
        )
        .await
    }

    pub async fn summary(&self) -> Result<RoomSummary, Error> {
        let (tx, rx): (OneshotSender<RoomEvent>, OneshotReceiver<RoomEvent>) = oneshot::channel();

        self.send_command(
            RoomCommand::GetSummary { response_tx: tx },
            "Tried to send RoomCommand::GetSummary but the room actor is not listening",
        )
        .await?;

        match rx.await {
            Ok(RoomEvent::Summary { summary }) => Ok(summary),
            Ok(RoomEvent::Error { error }) => Err(error),
            _ => Err(Error::log_and_create_internal(
                "Sent a RoomCommand::GetSummary but the room channel died.",
            )),
        }
    }

    async fn request(
        &self,
        command: impl FnOnce(OneshotSender<RoomEvent>) -> RoomCommand,
    ) -> Result<(), Error> {
        let (tx, rx): (OneshotSender<RoomEvent>, OneshotReceiver<RoomEvent>) = oneshot::channel();

        self.send_command(
            command(tx),
            "Tried to send a room command but the room actor is not listening",
        )
        .await?;

        match rx.await {
            Ok(RoomEvent::Ok) => Ok(()),
            Ok(RoomEvent::Error { error }) => Err(error),
            _ => Err(Error::log_and_create_internal(
                "Sent a room command but the room channel died.",
            )),
        }
    }

    async fn send_command(&self, command: RoomCommand, error_message: &str) -> Result<(), Error> {
        self.room_tx.send(command).await.map_err(|error| {
            Error::log_and_create_internal(&format!("{error_message}. Error: '{error}'."))
        })
    }
}

pub struct RoomWideEventReceiver {
    broadcast_rx: broadcast::Receiver<RoomWideEvent>,
}

impl RoomWideEventReceiver {
    pub async fn next(&mut self) -> Result<RoomWideEvent, Error> {
        self.broadcast_rx.recv().await.map_err(|error| {
            Error::log_and_create_internal(&format!(
                "The broadcast channel with the room has been closed. Error: {error}."
            ))
        })
    }
}
