pub mod actor;
pub mod actor_client;
pub mod deck;
pub mod room_fsm;
pub mod settings;
pub mod team;

use rust_fsm::StateMachine;
use serde::Serialize;

use crate::error::domain_error::DomainError;
use crate::error::Error;
use crate::player::Player;
use crate::room::deck::{Claim, Deck, Scores};
use crate::room::room_fsm::{RoomFsm, RoomFsmInput, RoomFsmState};
use crate::room::settings::{RoomSettings, SettingsPatch};
use crate::room::team::Team;
use crate::words::WordList;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Red,
    Blue,
    Draw,
}

impl From<Team> for Winner {
    fn from(team: Team) -> Self {
        match team {
            Team::Red => Winner::Red,
            Team::Blue => Winner::Blue,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    Sweep,
    Timeout,
    Depopulation,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundOutcome {
    pub winner: Winner,
    pub scores: Scores,
    pub reason: EndReason,
}

/// Result of a word submission. Misses are not errors: mistyped words and lost
/// claim races are expected and must not disrupt the player.
#[derive(Debug, PartialEq)]
pub enum SubmitOutcome {
    Ignored,
    Claimed {
        card_index: usize,
        claim: Claim,
        outcome: Option<RoundOutcome>,
    },
}

#[derive(Debug, PartialEq)]
pub enum TickOutcome {
    Ignored,
    Running { remaining_seconds: u32 },
    Finished { remaining_seconds: u32, outcome: RoundOutcome },
}

#[derive(Debug, PartialEq)]
pub struct Departure {
    pub player: Player,
    pub forced_outcome: Option<RoundOutcome>,
    pub room_is_empty: bool,
}

/// One isolated game instance: membership, settings, deck and clock. All
/// mutations come in through the room actor, one at a time.
pub struct Room {
    id: String,
    fsm: StateMachine<RoomFsm>,
    players: Vec<Player>,
    settings: RoomSettings,
    words: WordList,
    deck: Deck,
    remaining_seconds: u32,
    scores: Scores,
    outcome: Option<RoundOutcome>,
}

impl Room {
    pub fn new(id: &str, settings: RoomSettings, round_seconds: u32, words: WordList) -> Self {
        let deck = Deck::build(words.sample(usize::from(settings.total_cards)));
        Self {
            id: id.to_string(),
            fsm: StateMachine::default(),
            players: Vec::default(),
            settings,
            words,
            deck,
            remaining_seconds: round_seconds,
            scores: Scores::default(),
            outcome: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &RoomFsmState {
        self.fsm.state()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn roster(&self, team: Team) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|player| player.team == team)
            .collect()
    }

    /// Adds a connecting player, auto-assigning the emptier team (red on ties).
    pub fn add_player(&mut self, player_id: &str, nickname: &str) -> Result<Player, Error> {
        if self.state() != &RoomFsmState::Waiting {
            return Err(Error::Domain(DomainError::RoomAlreadyStarted(
                self.id.clone(),
            )));
        }
        if self
            .players
            .iter()
            .any(|player| player.nickname == nickname)
        {
            return Err(Error::Domain(DomainError::PlayerAlreadyExists(
                nickname.to_string(),
            )));
        }

        let team = self
            .pick_team()
            .ok_or(Error::Domain(DomainError::RoomFull(self.id.clone())))?;
        self.players.push(Player::new(player_id, nickname, team));
        self.assign_host();

        Ok(self.players.last().expect("player was just pushed").clone())
    }

    fn pick_team(&self) -> Option<Team> {
        let capacity = usize::from(self.settings.max_team_size);
        let red = self.roster(Team::Red).len();
        let blue = self.roster(Team::Blue).len();

        if red <= blue && red < capacity {
            Some(Team::Red)
        } else if blue < capacity {
            Some(Team::Blue)
        } else {
            None
        }
    }

    fn assign_host(&mut self) {
        if self.players.iter().all(|player| !player.is_host) {
            if let Some(player) = self.players.first_mut() {
                player.is_host = true;
            }
        }
    }

    fn is_host(&self, player_id: &str) -> bool {
        self.players
            .iter()
            .any(|player| player.id == player_id && player.is_host)
    }

    fn get_player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.id == player_id)
    }

    /// True when the room should leave `waiting` without an explicit start
    /// request, because every seat is taken.
    pub fn is_ready_to_auto_start(&self) -> bool {
        self.state() == &RoomFsmState::Waiting
            && self.players.len() == self.settings.required_players()
    }

    pub fn request_start(&mut self, player_id: &str) -> Result<(), Error> {
        if self.state() != &RoomFsmState::Waiting {
            return Err(Error::Domain(DomainError::InvalidStateForStart(
                self.state().clone(),
            )));
        }
        if !self.is_host(player_id) {
            let nickname = self
                .get_player(player_id)
                .map(|player| player.nickname.clone())
                .unwrap_or_default();
            return Err(Error::Domain(DomainError::NonHostPlayerCannotStartGame(
                nickname,
            )));
        }
        if self.roster(Team::Red).is_empty() || self.roster(Team::Blue).is_empty() {
            return Err(Error::Domain(DomainError::StartRequiresBothTeams));
        }
        self.begin_starting()
    }

    pub fn begin_starting(&mut self) -> Result<(), Error> {
        self.process_event(&RoomFsmInput::BeginStarting)
    }

    /// Leaves the pre-game delay. The deck and settings in place at this point
    /// are the snapshot the whole round plays against. A team that emptied
    /// during the delay loses immediately.
    pub fn begin_playing(&mut self) -> Result<Option<RoundOutcome>, Error> {
        self.process_event(&RoomFsmInput::BeginPlaying)?;
        Ok(self.check_depopulation())
    }

    pub fn update_settings(
        &mut self,
        player_id: &str,
        patch: SettingsPatch,
    ) -> Result<RoomSettings, Error> {
        if self.state() != &RoomFsmState::Waiting {
            return Err(Error::Domain(DomainError::InvalidStateForSettingsUpdate(
                self.state().clone(),
            )));
        }
        if !self.is_host(player_id) {
            let nickname = self
                .get_player(player_id)
                .map(|player| player.nickname.clone())
                .unwrap_or_default();
            return Err(Error::Domain(DomainError::NonHostPlayerCannotUpdateSettings(
                nickname,
            )));
        }

        let updated = self.settings.apply(patch);
        let largest_roster = self
            .roster(Team::Red)
            .len()
            .max(self.roster(Team::Blue).len());
        if usize::from(updated.max_team_size) < largest_roster {
            return Err(Error::Domain(DomainError::TeamCapacityBelowRoster(
                updated.max_team_size,
                largest_roster,
            )));
        }

        if updated.total_cards != self.settings.total_cards {
            // A resized deck is a brand new one, prior claims are gone
            self.deck = Deck::build(self.words.sample(usize::from(updated.total_cards)));
            self.scores = Scores::default();
        }
        self.settings = updated;
        Ok(updated)
    }

    pub fn change_team(&mut self, player_id: &str) -> Result<Team, Error> {
        if self.state() != &RoomFsmState::Waiting {
            return Err(Error::Domain(DomainError::InvalidStateForTeamChange(
                self.state().clone(),
            )));
        }
        let current = self
            .get_player(player_id)
            .map(|player| player.team)
            .ok_or_else(|| {
                Error::log_and_create_internal(&format!(
                    "Tried to change the team of player '{player_id}' but it is not in the room."
                ))
            })?;

        let target = current.opponent();
        if self.roster(target).len() >= usize::from(self.settings.max_team_size) {
            return Err(Error::Domain(DomainError::TeamFull(target)));
        }

        let player = self
            .players
            .iter_mut()
            .find(|player| player.id == player_id)
            .expect("player existed a moment ago");
        player.team = target;
        Ok(target)
    }

    pub fn submit_word(&mut self, player_id: &str, word: &str) -> SubmitOutcome {
        if self.state() != &RoomFsmState::Playing {
            return SubmitOutcome::Ignored;
        }
        let Some(player) = self.get_player(player_id).cloned() else {
            return SubmitOutcome::Ignored;
        };
        let Some(card) = self.deck.claim(word, &player) else {
            return SubmitOutcome::Ignored;
        };

        let card_index = card.index;
        let claim = card.claim.clone().expect("card was just claimed");
        let outcome = self.check_game_end(false);
        SubmitOutcome::Claimed {
            card_index,
            claim,
            outcome,
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.state() != &RoomFsmState::Playing {
            return TickOutcome::Ignored;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        let remaining_seconds = self.remaining_seconds;

        match self.check_game_end(remaining_seconds == 0) {
            Some(outcome) => TickOutcome::Finished {
                remaining_seconds,
                outcome,
            },
            None => TickOutcome::Running { remaining_seconds },
        }
    }

    pub fn disconnect(&mut self, player_id: &str) -> Result<Departure, Error> {
        let index = self
            .players
            .iter()
            .position(|player| player.id == player_id)
            .ok_or_else(|| {
                Error::log_and_create_internal(&format!(
                    "Tried to disconnect player '{player_id}' but it is not in the room."
                ))
            })?;

        let player = self.players.remove(index);
        self.assign_host();

        Ok(Departure {
            forced_outcome: self.check_depopulation(),
            room_is_empty: self.players.is_empty(),
            player,
        })
    }

    /// While playing, an emptied roster hands the win to the surviving team,
    /// independent of score and clock. An entirely empty room is handled by
    /// teardown instead, there is nobody left to notify.
    fn check_depopulation(&mut self) -> Option<RoundOutcome> {
        if self.state() != &RoomFsmState::Playing {
            return None;
        }
        let survivor = match (
            self.roster(Team::Red).is_empty(),
            self.roster(Team::Blue).is_empty(),
        ) {
            (true, false) => Team::Blue,
            (false, true) => Team::Red,
            _ => return None,
        };
        Some(self.finish(Winner::from(survivor), EndReason::Depopulation))
    }

    /// Recomputes scores and decides termination. One-way: past `finished`
    /// every call returns `None`.
    fn check_game_end(&mut self, clock_expired: bool) -> Option<RoundOutcome> {
        if self.state() != &RoomFsmState::Playing {
            return None;
        }
        self.scores = self.deck.scores();

        let cards_per_team = self.settings.cards_per_team();
        if self.deck.claimed_from_opponent(Team::Red) == cards_per_team {
            return Some(self.finish(Winner::Red, EndReason::Sweep));
        }
        if self.deck.claimed_from_opponent(Team::Blue) == cards_per_team {
            return Some(self.finish(Winner::Blue, EndReason::Sweep));
        }
        if clock_expired {
            let winner = match (self.scores.red, self.scores.blue) {
                (red, blue) if red > blue => Winner::Red,
                (red, blue) if blue > red => Winner::Blue,
                _ => Winner::Draw,
            };
            return Some(self.finish(winner, EndReason::Timeout));
        }
        None
    }

    fn finish(&mut self, winner: Winner, reason: EndReason) -> RoundOutcome {
        let outcome = RoundOutcome {
            winner,
            scores: self.deck.scores(),
            reason,
        };
        self.scores = outcome.scores;
        self.outcome = Some(outcome);
        if let Err(error) = self.process_event(&RoomFsmInput::Finish) {
            log::error!(
                "Could not transition the room to finished. RoomId: '{}', Error: '{error}'.",
                self.id
            );
        }
        outcome
    }

    fn process_event(&mut self, event: &RoomFsmInput) -> Result<(), Error> {
        self.fsm.consume(event).map(|_| ()).map_err(|error| {
            Error::log_and_create_internal(&format!(
                "The fsm in state {:?} can't transition with an event {:?}. Error: '{error}'.",
                self.fsm.state(),
                event
            ))
        })
    }
}
