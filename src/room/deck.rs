use rand::{seq::SliceRandom, thread_rng};
use serde::Serialize;

use crate::player::Player;
use crate::room::team::Team;

#[derive(Clone, Debug, PartialEq)]
pub struct Claim {
    pub player_id: String,
    pub nickname: String,
    pub team: Team,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub index: usize,
    pub word: String,
    pub owner: Team,
    pub claim: Option<Claim>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Scores {
    pub red: usize,
    pub blue: usize,
}

/// The shuffled, team-partitioned set of word-cards for one round.
#[derive(Clone, Debug, PartialEq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Builds a deck where half of the words belong to each team and the card
    /// order carries no information about ownership.
    pub fn build(words: Vec<String>) -> Self {
        debug_assert!(words.len() % 2 == 0, "decks always hold an even amount of cards");

        let half = words.len() / 2;
        let mut cards: Vec<Card> = words
            .into_iter()
            .enumerate()
            .map(|(position, word)| Card {
                index: 0,
                word,
                owner: if position < half { Team::Red } else { Team::Blue },
                claim: None,
            })
            .collect();

        let mut rng = thread_rng();
        cards.shuffle(&mut rng);
        for (index, card) in cards.iter_mut().enumerate() {
            card.index = index;
        }

        Deck { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Claims the card whose word matches exactly. Returns `None` on an unknown
    /// word or an already claimed card; an existing claim is never overwritten.
    pub fn claim(&mut self, word: &str, player: &Player) -> Option<&Card> {
        let card = self
            .cards
            .iter_mut()
            .find(|card| card.word == word && card.claim.is_none())?;
        card.claim = Some(Claim {
            player_id: player.id.clone(),
            nickname: player.nickname.clone(),
            team: player.team,
        });
        Some(card)
    }

    pub fn scores(&self) -> Scores {
        let mut scores = Scores::default();
        for card in &self.cards {
            match card.claim.as_ref().map(|claim| claim.team) {
                Some(Team::Red) => scores.red += 1,
                Some(Team::Blue) => scores.blue += 1,
                None => {}
            }
        }
        scores
    }

    /// Amount of cards owned by the opponent that `team` has claimed so far.
    pub fn claimed_from_opponent(&self, team: Team) -> usize {
        self.cards
            .iter()
            .filter(|card| {
                card.owner == team.opponent()
                    && card.claim.as_ref().is_some_and(|claim| claim.team == team)
            })
            .count()
    }

    pub fn words_owned_by(&self, owner: Team) -> Vec<String> {
        self.cards
            .iter()
            .filter(|card| card.owner == owner)
            .map(|card| card.word.clone())
            .collect()
    }
}
