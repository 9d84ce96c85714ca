use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use tokio::select;
use tokio::time::error::Elapsed;
use tokio::time::timeout;

use crate::error::Error;
use crate::metrics::CONNECTED_PLAYERS;
use crate::player::Nickname;
use crate::room::actor::RoomWideEvent;
use crate::room::actor_client::{RoomClient, RoomWideEventReceiver};
use crate::room::settings::SettingsPatch;
use crate::websocket::message::{CardDto, ClaimantDto, PlayerDto, TeamsDto, WsMessageIn, WsMessageOut};
use crate::websocket::{close, parse_message, send_error, send_error_and_close, send_message, send_message_string};

/// Owns one websocket connection and the session data that belongs to it: the
/// minted player id, the nickname and the room the connection joined. Inbound
/// frames become room commands, room-wide events become outbound frames.
pub struct PlayerActor {
    player_id: String,
    room_id: String,
    room: RoomClient,
    room_events: RoomWideEventReceiver,
    websocket: WebSocket,
    inactivity_timeout: Duration,
}

impl PlayerActor {
    // Clients ping regularly; a silent connection this long is gone
    const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(30);

    pub async fn create(
        player_id: String,
        nickname: Nickname,
        room_id: String,
        room: RoomClient,
        mut websocket: WebSocket,
    ) {
        match room.add_player(&player_id, nickname.as_str()).await {
            Ok(join) => {
                let joined = WsMessageOut::RoomJoined {
                    room_id: room_id.clone(),
                    player: PlayerDto::from(&join.snapshot.player),
                    teams: TeamsDto::from_players(&join.snapshot.players),
                    settings: join.snapshot.settings,
                };
                if let Err(error) = send_message(&mut websocket, &joined).await {
                    log::info!("Player {player_id} left before the join completed. Error: '{error}'.");
                    let _ = room.disconnect_player(&player_id).await;
                    close(websocket).await;
                    return;
                }
                PlayerActor {
                    player_id,
                    room_id,
                    room,
                    room_events: join.events,
                    websocket,
                    inactivity_timeout: PlayerActor::INACTIVITY_TIMEOUT,
                }
                .start()
                .await
            }
            Err(error) => send_error_and_close(websocket, &error).await,
        }
    }

    async fn start(mut self) {
        CONNECTED_PLAYERS.inc();

        loop {
            select! {
                room_event = self.room_events.next() => {
                    if let Err(error) = self.receive_room_event(room_event).await {
                        send_error(&mut self.websocket, &error).await;
                        if PlayerActor::should_close_websocket(&error) {
                            break;
                        }
                    }
                },
                websocket_message = timeout(self.inactivity_timeout, self.websocket.recv()) => {
                    if let Err(error) = self.receive_websocket_message(websocket_message).await {
                        send_error(&mut self.websocket, &error).await;
                        if PlayerActor::should_close_websocket(&error) {
                            break;
                        }
                    }
                },
            }
        }

        let _ = self.room.disconnect_player(&self.player_id).await;
        close(self.websocket).await;
        CONNECTED_PLAYERS.dec();
    }

    fn should_close_websocket(error: &Error) -> bool {
        match error {
            Error::Internal(_) => true,
            Error::WebsocketClosed(_) => true,
            Error::UnprocessableMessage(_, _) => false,
            Error::Domain(_) => false,
        }
    }

    async fn receive_room_event(
        &mut self,
        room_event: Result<RoomWideEvent, Error>,
    ) -> Result<(), Error> {
        let message = match room_event? {
            RoomWideEvent::PlayerJoined { player, players } => {
                if player.id == self.player_id {
                    // Our own join was already answered with roomJoined
                    return Ok(());
                }
                WsMessageOut::PlayerJoined {
                    player: PlayerDto::from(&player),
                    teams: TeamsDto::from_players(&players),
                }
            }
            RoomWideEvent::PlayerLeft { player_id, players } => WsMessageOut::PlayerLeft {
                player_id,
                teams: TeamsDto::from_players(&players),
            },
            RoomWideEvent::TeamsUpdated { players } => WsMessageOut::TeamsUpdated {
                teams: TeamsDto::from_players(&players),
            },
            RoomWideEvent::SettingsUpdated { settings } => {
                WsMessageOut::SettingsUpdated { settings }
            }
            RoomWideEvent::GameStarting => WsMessageOut::GameStarting,
            RoomWideEvent::GameStarted {
                deck,
                players,
                remaining_seconds,
                settings,
            } => WsMessageOut::GameStarted {
                cards: deck.iter().map(CardDto::from).collect(),
                teams: TeamsDto::from_players(&players),
                remaining_seconds,
                settings,
            },
            RoomWideEvent::TimerUpdate { remaining_seconds } => {
                WsMessageOut::TimerUpdate { remaining_seconds }
            }
            RoomWideEvent::CardClaimed { card_index, claim } => WsMessageOut::CardClaimed {
                card_index,
                claimant: ClaimantDto::from(&claim),
                team: claim.team,
            },
            RoomWideEvent::GameEnd { outcome } => WsMessageOut::GameEnd {
                winner: outcome.winner,
                scores: outcome.scores,
                reason: outcome.reason,
            },
        };
        send_message(&mut self.websocket, &message).await
    }

    async fn receive_websocket_message(
        &mut self,
        websocket_message: Result<Option<Result<Message, axum::Error>>, Elapsed>,
    ) -> Result<(), Error> {
        match websocket_message {
            Ok(Some(Ok(Message::Text(text)))) => match text.as_str() {
                "ping" => send_message_string(&mut self.websocket, "pong").await,
                message => match parse_message(message)? {
                    WsMessageIn::StartGame => self.room.start_game(&self.player_id).await,
                    WsMessageIn::SubmitWord { word } => {
                        self.room.submit_word(&self.player_id, &word).await
                    }
                    WsMessageIn::ChangeTeam => self.room.change_team(&self.player_id).await,
                    WsMessageIn::UpdateSettings {
                        max_team_size,
                        total_cards,
                    } => {
                        self.room
                            .update_settings(
                                &self.player_id,
                                SettingsPatch {
                                    max_team_size,
                                    total_cards,
                                },
                            )
                            .await
                    }
                },
            },
            // browser said "close"
            Ok(Some(Ok(Message::Close(_)))) => {
                self.log_connection_lost("browser sent 'Close' websocket frame");
                Err(Error::WebsocketClosed(
                    "browser sent 'Close' websocket frame".to_string(),
                ))
            }
            // websocket was closed abruptly
            Ok(None) => {
                self.log_connection_lost("other end of websocket was closed abruptly");
                Err(Error::WebsocketClosed(
                    "other end of websocket was closed abruptly".to_string(),
                ))
            }
            // timeout without receiving anything from the player
            Err(_) => {
                self.log_connection_lost("connection timed out; missing 'ping' messages");
                Err(Error::WebsocketClosed(
                    "connection timed out; missing 'ping' messages".to_string(),
                ))
            }
            Ok(Some(Err(error))) => Err(Error::UnprocessableMessage(
                "Message cannot be loaded".to_string(),
                error.to_string(),
            )),
            Ok(Some(Ok(_))) => Err(Error::UnprocessableMessage(
                "Unsupported message type".to_string(),
                "Unsupported message type".to_string(),
            )),
        }
    }

    fn log_connection_lost(&self, reason: &str) {
        log::info!(
            "Connection with player {} in room {} lost due to: {}. Stopping player actor.",
            self.player_id,
            self.room_id,
            reason,
        );
    }
}
