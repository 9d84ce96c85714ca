use serde::{Deserialize, Serialize};

/// Per-room configuration, mutable only while the room is waiting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    pub max_team_size: u8,
    pub total_cards: u8,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub max_team_size: Option<u8>,
    pub total_cards: Option<u8>,
}

impl RoomSettings {
    pub const MIN_TEAM_SIZE: u8 = 1;
    pub const MAX_TEAM_SIZE: u8 = 7;
    pub const MIN_TOTAL_CARDS: u8 = 4;
    // Bounded by the amount of words shipped in the word list, see `words::WordList`.
    pub const MAX_TOTAL_CARDS: u8 = 100;

    const DEFAULT_TEAM_SIZE: u8 = 5;
    const DEFAULT_TOTAL_CARDS: u8 = 40;

    pub fn new(max_team_size: u8, total_cards: u8) -> Self {
        Self {
            max_team_size: Self::clamp_team_size(max_team_size),
            total_cards: Self::clamp_total_cards(total_cards),
        }
    }

    pub fn apply(&self, patch: SettingsPatch) -> Self {
        Self::new(
            patch.max_team_size.unwrap_or(self.max_team_size),
            patch.total_cards.unwrap_or(self.total_cards),
        )
    }

    pub fn cards_per_team(&self) -> usize {
        usize::from(self.total_cards) / 2
    }

    pub fn required_players(&self) -> usize {
        usize::from(self.max_team_size) * 2
    }

    fn clamp_team_size(max_team_size: u8) -> u8 {
        max_team_size.clamp(Self::MIN_TEAM_SIZE, Self::MAX_TEAM_SIZE)
    }

    fn clamp_total_cards(total_cards: u8) -> u8 {
        // Odd values are rounded up, so they stay reachable from the minimum
        let even = total_cards.saturating_add(total_cards % 2);
        even.clamp(Self::MIN_TOTAL_CARDS, Self::MAX_TOTAL_CARDS)
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        RoomSettings::new(Self::DEFAULT_TEAM_SIZE, Self::DEFAULT_TOTAL_CARDS)
    }
}
