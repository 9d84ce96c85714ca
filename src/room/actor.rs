use std::fmt::{Display, Formatter};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::oneshot::Sender as OneshotSender;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::GameSettings;
use crate::error::Error;
use crate::metrics::ACTIVE_ROOMS;
use crate::player::Player;
use crate::registry::actor_client::RegistryClient;
use crate::room::actor_client::RoomClient;
use crate::room::deck::{Card, Claim};
use crate::room::room_fsm::RoomFsmState;
use crate::room::settings::{RoomSettings, SettingsPatch};
use crate::room::{Room, RoundOutcome, SubmitOutcome, TickOutcome};
use crate::words::WordList;

/// Runs a Room in the background. The command mailbox is the room's
/// serialization point: every mutation - join, team switch, settings update,
/// submission, tick, disconnect - is applied in arrival order, and events are
/// broadcast only after the mutation committed.
pub struct RoomActor {
    room: Room,
    room_rx: Receiver<RoomCommand>,
    room_tx: Sender<RoomCommand>,
    broadcast_tx: broadcast::Sender<RoomWideEvent>,
    registry: RegistryClient,
    start_delay: Duration,
    inactivity_timeout: Duration,
    start_delay_handle: Option<JoinHandle<()>>,
    round_timer_handle: Option<JoinHandle<()>>,
}

enum Flow {
    Continue,
    Stop,
}

impl RoomActor {
    pub fn spawn(
        id: &str,
        room_settings: RoomSettings,
        game_settings: &GameSettings,
        words: WordList,
        registry: RegistryClient,
    ) -> RoomClient {
        let room = Room::new(id, room_settings, game_settings.round_seconds, words);
        let (room_tx, room_rx): (Sender<RoomCommand>, Receiver<RoomCommand>) =
            mpsc::channel(128);
        let (broadcast_tx, _): (
            broadcast::Sender<RoomWideEvent>,
            broadcast::Receiver<RoomWideEvent>,
        ) = broadcast::channel(32);

        tokio::spawn(
            RoomActor {
                room,
                room_rx,
                room_tx: room_tx.clone(),
                broadcast_tx,
                registry,
                start_delay: game_settings.start_delay(),
                inactivity_timeout: game_settings.inactivity_timeout(),
                start_delay_handle: None,
                round_timer_handle: None,
            }
            .start(),
        );

        RoomClient { room_tx }
    }

    async fn start(mut self) {
        ACTIVE_ROOMS.inc();

        loop {
            match time::timeout(self.inactivity_timeout, self.room_rx.recv()).await {
                Err(_) => {
                    if self.room.is_empty() {
                        log::info!(
                            "No activity in room {} after {} seconds. Stopping room actor.",
                            self.room.id(),
                            self.inactivity_timeout.as_secs()
                        );
                        break;
                    }
                }
                Ok(None) => {
                    log::info!("Room channel has been dropped. Stopping room actor.");
                    break;
                }
                Ok(Some(command)) => {
                    if let Flow::Stop = self.handle_command(command) {
                        break;
                    }
                }
            }
        }

        self.stop().await;
        ACTIVE_ROOMS.dec();
    }

    fn handle_command(&mut self, command: RoomCommand) -> Flow {
        match command {
            RoomCommand::AddPlayer {
                player_id,
                nickname,
                response_tx,
            } => self.add_player(&player_id, &nickname, response_tx),
            RoomCommand::DisconnectPlayer { player_id } => self.disconnect_player(&player_id),
            RoomCommand::StartGame {
                player_id,
                response_tx,
            } => {
                let result = self.room.request_start(&player_id);
                if result.is_ok() {
                    self.announce_game_starting();
                }
                self.respond(response_tx, result.map(|_| RoomEvent::Ok));
                Flow::Continue
            }
            RoomCommand::UpdateSettings {
                player_id,
                patch,
                response_tx,
            } => {
                let result = self.room.update_settings(&player_id, patch);
                match result {
                    Ok(settings) => {
                        self.broadcast(RoomWideEvent::SettingsUpdated { settings });
                        self.respond(response_tx, Ok(RoomEvent::Ok));
                    }
                    Err(error) => self.respond(response_tx, Err(error)),
                }
                Flow::Continue
            }
            RoomCommand::ChangeTeam {
                player_id,
                response_tx,
            } => {
                let result = self.room.change_team(&player_id);
                match result {
                    Ok(_) => {
                        self.broadcast(RoomWideEvent::TeamsUpdated {
                            players: self.room.players().to_vec(),
                        });
                        self.respond(response_tx, Ok(RoomEvent::Ok));
                    }
                    Err(error) => self.respond(response_tx, Err(error)),
                }
                Flow::Continue
            }
            RoomCommand::SubmitWord { player_id, word } => {
                if let SubmitOutcome::Claimed {
                    card_index,
                    claim,
                    outcome,
                } = self.room.submit_word(&player_id, &word)
                {
                    self.broadcast(RoomWideEvent::CardClaimed { card_index, claim });
                    if let Some(outcome) = outcome {
                        self.finish_round(outcome);
                    }
                }
                Flow::Continue
            }
            RoomCommand::BeginPlaying => {
                match self.room.begin_playing() {
                    Ok(forced_outcome) => {
                        self.broadcast(RoomWideEvent::GameStarted {
                            deck: self.room.deck().cards().to_vec(),
                            players: self.room.players().to_vec(),
                            remaining_seconds: self.room.remaining_seconds(),
                            settings: *self.room.settings(),
                        });
                        self.start_round_timer();
                        if let Some(outcome) = forced_outcome {
                            self.finish_round(outcome);
                        }
                    }
                    Err(error) => {
                        log::error!(
                            "Could not move the room to playing. RoomId: '{}', Error: '{error}'.",
                            self.room.id()
                        );
                    }
                }
                Flow::Continue
            }
            RoomCommand::Tick => {
                match self.room.tick() {
                    TickOutcome::Ignored => {}
                    TickOutcome::Running { remaining_seconds } => {
                        self.broadcast(RoomWideEvent::TimerUpdate { remaining_seconds });
                    }
                    TickOutcome::Finished {
                        remaining_seconds,
                        outcome,
                    } => {
                        self.broadcast(RoomWideEvent::TimerUpdate { remaining_seconds });
                        self.finish_round(outcome);
                    }
                }
                Flow::Continue
            }
            RoomCommand::GetSummary { response_tx } => {
                let summary = self.summary();
                self.respond(response_tx, Ok(RoomEvent::Summary { summary }));
                Flow::Continue
            }
        }
    }

    fn add_player(
        &mut self,
        player_id: &str,
        nickname: &str,
        response_tx: OneshotSender<RoomEvent>,
    ) -> Flow {
        match self.room.add_player(player_id, nickname) {
            Ok(player) => {
                let event = RoomEvent::PlayerAdded {
                    broadcast_rx: self.broadcast_tx.subscribe(),
                    snapshot: RoomSnapshot {
                        player: player.clone(),
                        players: self.room.players().to_vec(),
                        settings: *self.room.settings(),
                    },
                };
                if response_tx.send(event).is_err() {
                    log::error!(
                        "Added player {nickname} but the response channel is closed. Removing the player."
                    );
                    return self.disconnect_player(player_id);
                }
                self.broadcast(RoomWideEvent::PlayerJoined {
                    player,
                    players: self.room.players().to_vec(),
                });
                if self.room.is_ready_to_auto_start() {
                    match self.room.begin_starting() {
                        Ok(()) => self.announce_game_starting(),
                        Err(error) => log::error!(
                            "Auto-start failed. RoomId: '{}', Error: '{error}'.",
                            self.room.id()
                        ),
                    }
                }
                Flow::Continue
            }
            Err(error) => {
                self.respond(response_tx, Err(error));
                Flow::Continue
            }
        }
    }

    fn disconnect_player(&mut self, player_id: &str) -> Flow {
        match self.room.disconnect(player_id) {
            Ok(departure) => {
                self.broadcast(RoomWideEvent::PlayerLeft {
                    player_id: departure.player.id,
                    players: self.room.players().to_vec(),
                });
                if let Some(outcome) = departure.forced_outcome {
                    self.finish_round(outcome);
                }
                if departure.room_is_empty {
                    log::info!(
                        "The last player left room {}. Stopping room actor.",
                        self.room.id()
                    );
                    return Flow::Stop;
                }
                Flow::Continue
            }
            // Disconnects can race a teardown, nothing to clean up then
            Err(_) => Flow::Continue,
        }
    }

    /// Single entry into the pre-game delay; the `waiting -> starting` fsm edge
    /// guarantees it runs at most once per room.
    fn announce_game_starting(&mut self) {
        self.broadcast(RoomWideEvent::GameStarting);

        let room_tx = self.room_tx.clone();
        let delay = self.start_delay;
        self.start_delay_handle = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = room_tx.send(RoomCommand::BeginPlaying).await;
        }));
    }

    fn start_round_timer(&mut self) {
        // At most one countdown per room for its whole lifetime
        if self.round_timer_handle.is_some() {
            return;
        }
        let room_tx = self.room_tx.clone();
        self.round_timer_handle = Some(tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(1));
            interval.tick().await;
            loop {
                interval.tick().await;
                if room_tx.send(RoomCommand::Tick).await.is_err() {
                    break;
                }
            }
        }));
    }

    fn finish_round(&mut self, outcome: RoundOutcome) {
        self.broadcast(RoomWideEvent::GameEnd { outcome });
        self.stop_timers();
    }

    fn stop_timers(&mut self) {
        if let Some(handle) = self.start_delay_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.round_timer_handle.take() {
            handle.abort();
        }
    }

    fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.room.id().to_string(),
            current_players: self.room.players().len(),
            max_players: self.room.settings().required_players(),
            settings: *self.room.settings(),
            is_joinable: self.room.state() == &RoomFsmState::Waiting
                && self.room.players().len() < self.room.settings().required_players(),
        }
    }

    fn respond(&self, response_tx: OneshotSender<RoomEvent>, result: Result<RoomEvent, Error>) {
        let event = match result {
            Ok(event) => event,
            Err(error) => RoomEvent::Error { error },
        };
        if let Err(event) = response_tx.send(event) {
            log::error!(
                "Sent a RoomEvent but the response channel is closed. RoomId: '{}', Event: '{event}'.",
                self.room.id()
            );
        }
    }

    fn broadcast(&self, event: RoomWideEvent) {
        // A send error only means there is no subscriber right now
        let _ = self.broadcast_tx.send(event);
    }

    async fn stop(mut self) {
        self.stop_timers();
        let room_id = self.room.id();
        if let Err(error) = self.registry.remove_room(room_id).await {
            log::error!("The registry channel is closed, can't remove the room. RoomId: '{room_id}', Error: '{error}'.");
        }
    }
}

pub(crate) enum RoomCommand {
    AddPlayer {
        player_id: String,
        nickname: String,
        response_tx: OneshotSender<RoomEvent>,
    },
    DisconnectPlayer {
        player_id: String,
    },
    StartGame {
        player_id: String,
        response_tx: OneshotSender<RoomEvent>,
    },
    UpdateSettings {
        player_id: String,
        patch: SettingsPatch,
        response_tx: OneshotSender<RoomEvent>,
    },
    ChangeTeam {
        player_id: String,
        response_tx: OneshotSender<RoomEvent>,
    },
    SubmitWord {
        player_id: String,
        word: String,
    },
    BeginPlaying,
    Tick,
    GetSummary {
        response_tx: OneshotSender<RoomEvent>,
    },
}

#[derive(Debug)]
pub struct RoomSnapshot {
    pub player: Player,
    pub players: Vec<Player>,
    pub settings: RoomSettings,
}

#[derive(Clone, Debug)]
pub struct RoomSummary {
    pub id: String,
    pub current_players: usize,
    pub max_players: usize,
    pub settings: RoomSettings,
    pub is_joinable: bool,
}

#[derive(Debug)]
pub(crate) enum RoomEvent {
    PlayerAdded {
        broadcast_rx: broadcast::Receiver<RoomWideEvent>,
        snapshot: RoomSnapshot,
    },
    Ok,
    Summary {
        summary: RoomSummary,
    },
    Error {
        error: Error,
    },
}

impl Display for RoomEvent {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                RoomEvent::PlayerAdded { .. } => "RoomEvent::PlayerAdded".to_string(),
                RoomEvent::Ok => "RoomEvent::Ok".to_string(),
                RoomEvent::Summary { .. } => "RoomEvent::Summary".to_string(),
                RoomEvent::Error { error } => format!("Error '{error}'"),
            }
        )
    }
}

#[derive(Clone, Debug)]
pub enum RoomWideEvent {
    PlayerJoined {
        player: Player,
        players: Vec<Player>,
    },
    PlayerLeft {
        player_id: String,
        players: Vec<Player>,
    },
    TeamsUpdated {
        players: Vec<Player>,
    },
    SettingsUpdated {
        settings: RoomSettings,
    },
    GameStarting,
    GameStarted {
        deck: Vec<Card>,
        players: Vec<Player>,
        remaining_seconds: u32,
        settings: RoomSettings,
    },
    TimerUpdate {
        remaining_seconds: u32,
    },
    CardClaimed {
        card_index: usize,
        claim: Claim,
    },
    GameEnd {
        outcome: RoundOutcome,
    },
}
