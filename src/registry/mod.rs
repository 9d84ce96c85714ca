pub mod actor;
pub mod actor_client;

use std::collections::HashMap;

use rand::distributions::{Alphanumeric, DistString};

use crate::config::GameSettings;
use crate::registry::actor_client::RegistryClient;
use crate::room::actor::RoomActor;
use crate::room::actor_client::RoomClient;
use crate::room::settings::RoomSettings;
use crate::words::WordList;

/// Process-wide id -> room mapping. Entries are added on room creation and
/// removed by the room actors when the last player leaves, so no room ever
/// outlives its players.
pub struct RoomRegistry {
    rooms: HashMap<String, RoomClient>,
    game_settings: GameSettings,
    words: WordList,
}

impl RoomRegistry {
    pub fn new(game_settings: GameSettings) -> Self {
        let words = WordList::load(WordList::WORDS_FILE_PATH);
        RoomRegistry {
            rooms: HashMap::default(),
            game_settings,
            words,
        }
    }

    pub fn create_room(&mut self, settings: RoomSettings, registry: RegistryClient) -> String {
        let id = self.create_unique_room_id();
        self.spawn_room(&id, settings, registry);
        id
    }

    /// Looks up a room, creating it with default settings when the id is not
    /// known: joining a nonexistent room id is a valid way to open a room.
    pub fn get_or_create_room(&mut self, room_id: &str, registry: RegistryClient) -> RoomClient {
        if let Some(room) = self.rooms.get(room_id) {
            return room.clone();
        }
        self.spawn_room(room_id, RoomSettings::default(), registry)
    }

    pub fn remove_room(&mut self, room_id: &str) -> Option<RoomClient> {
        self.rooms.remove(room_id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &RoomClient> {
        self.rooms.values()
    }

    fn spawn_room(
        &mut self,
        id: &str,
        settings: RoomSettings,
        registry: RegistryClient,
    ) -> RoomClient {
        let room = RoomActor::spawn(
            id,
            settings,
            &self.game_settings,
            self.words.clone(),
            registry,
        );
        self.rooms.insert(id.to_string(), room.clone());
        room
    }

    fn create_unique_room_id(&self) -> String {
        loop {
            // Avoid characters that read ambiguously when shared out loud
            let id = Alphanumeric
                .sample_string(&mut rand::thread_rng(), 5)
                .replace('O', "P")
                .replace('0', "1")
                .replace('I', "J")
                .replace('l', "m");
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}
