use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use wordclash::config::Config;

pub type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
pub type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

pub struct TestApp {
    pub base_address: String,
    pub inactivity_timeout: Duration,
}

impl TestApp {
    pub async fn spawn() -> TestApp {
        TestApp::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
        // Binding to port 0 triggers an OS scan for an available port, this way
        // we can run tests in parallel where each runs its own application
        let random_port_address = SocketAddr::from(([0, 0, 0, 0], 0));
        let listener = TcpListener::bind(random_port_address)
            .await
            .expect("Failed to bind random port.");
        let address = listener.local_addr().unwrap();
        std::env::set_var("ENVIRONMENT", "dev");
        let config = {
            let mut config = Config::get().expect("Failed to read configuration.");
            config.game.inactivity_timeout_seconds = 2;
            config.game.start_delay_millis = 100;
            adjust(&mut config);
            config
        };

        let server = wordclash::startup::create_web_server(config.clone(), listener);
        let _ = tokio::spawn(server);

        TestApp {
            base_address: format!("localhost:{}", address.port()),
            inactivity_timeout: config.game.inactivity_timeout(),
        }
    }

    pub async fn create_room(&self) -> String {
        let response = reqwest::Client::new()
            .post(format!("http://{}/room", self.base_address))
            .send()
            .await
            .expect("Failed to execute request.");
        assert!(response.status().is_success());
        let created: RoomCreatedResponse = response.json().await.expect("Failed to parse response.");
        created.id
    }

    pub async fn create_room_with_settings(&self, settings: serde_json::Value) -> String {
        let response = reqwest::Client::new()
            .post(format!("http://{}/room", self.base_address))
            .json(&settings)
            .send()
            .await
            .expect("Failed to execute request.");
        assert!(response.status().is_success());
        let created: RoomCreatedResponse = response.json().await.expect("Failed to parse response.");
        created.id
    }

    pub async fn list_rooms(&self) -> Vec<RoomListEntry> {
        let response = reqwest::Client::new()
            .get(format!("http://{}/rooms", self.base_address))
            .send()
            .await
            .expect("Failed to execute request.");
        assert!(response.status().is_success());
        response.json().await.expect("Failed to parse response.")
    }

    pub async fn open_room_websocket(
        &self,
        room_id: &str,
        nickname: &str,
    ) -> WebSocketStream<MaybeTlsStream<TcpStream>> {
        tokio_tungstenite::connect_async(format!(
            "ws://{}/room/{room_id}/player/{nickname}/ws",
            self.base_address
        ))
        .await
        .expect("WebSocket could not be created.")
        .0
    }
}

pub async fn send_message(websocket: &mut WsSink, message: ClientMessage) {
    send_raw_message(
        websocket,
        Message::Text(serde_json::to_string(&message).expect("Could not serialize message")),
    )
    .await;
}

pub async fn send_raw_message(websocket: &mut WsSink, message: Message) {
    websocket
        .send(message)
        .await
        .expect("Could not send message");
}

// It's important for the receiver to be a reference, otherwise this method
// takes ownership of it and when it ends it closes the websocket
pub async fn receive_message(receiver: &mut WsStream) -> ServerMessage {
    match receiver.next().await {
        Some(Ok(message)) => {
            let text = message.to_text().expect("Message was not a text");
            serde_json::from_str(text)
                .unwrap_or_else(|error| panic!("Could not parse '{text}'. Error: '{error}'."))
        }
        Some(Err(error)) => panic!("Websocket returned an error {error}"),
        None => panic!("Websocket closed before expected."),
    }
}

pub async fn receive_error(receiver: &mut WsStream) -> String {
    match receive_message(receiver).await {
        ServerMessage::Error {
            r#type,
            title,
            detail,
        } => {
            assert!(!title.is_empty());
            assert!(!detail.is_empty());
            r#type
        }
        message => panic!("The message was not an Error: {message:?}"),
    }
}

/// Reads messages until the round ends, which lets tests ignore the exact
/// interleaving of timer updates and claims.
pub async fn receive_game_end(receiver: &mut WsStream) -> (String, Scores, String) {
    loop {
        if let ServerMessage::GameEnd {
            winner,
            scores,
            reason,
        } = receive_message(receiver).await
        {
            return (winner, scores, reason);
        }
    }
}

#[derive(Deserialize)]
pub struct RoomCreatedResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListEntry {
    pub id: String,
    pub current_players: usize,
    pub max_players: usize,
    pub settings: Settings,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub max_team_size: u8,
    pub total_cards: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: String,
    pub nickname: String,
    pub team: String,
    pub is_host: bool,
}

#[derive(Debug, Deserialize)]
pub struct Teams {
    pub red: Vec<PlayerInfo>,
    pub blue: Vec<PlayerInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    pub index: usize,
    pub word: String,
    pub team: String,
    pub claimed_by: Option<Claimant>,
    pub claimed_team: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Claimant {
    pub id: String,
    pub nickname: String,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct Scores {
    pub red: usize,
    pub blue: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ServerMessage {
    Error {
        r#type: String,
        title: String,
        detail: String,
    },
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        room_id: String,
        player: PlayerInfo,
        teams: Teams,
        settings: Settings,
    },
    PlayerJoined {
        player: PlayerInfo,
        teams: Teams,
    },
    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        player_id: String,
        teams: Teams,
    },
    TeamsUpdated {
        teams: Teams,
    },
    SettingsUpdated {
        settings: Settings,
    },
    GameStarting,
    #[serde(rename_all = "camelCase")]
    GameStarted {
        cards: Vec<CardInfo>,
        teams: Teams,
        remaining_seconds: u32,
        settings: Settings,
    },
    #[serde(rename_all = "camelCase")]
    TimerUpdate {
        remaining_seconds: u32,
    },
    #[serde(rename_all = "camelCase")]
    CardClaimed {
        card_index: usize,
        claimant: Claimant,
        team: String,
    },
    GameEnd {
        winner: String,
        scores: Scores,
        reason: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ClientMessage {
    StartGame,
    #[serde(rename_all = "camelCase")]
    SubmitWord { word: String },
    ChangeTeam,
    #[serde(rename_all = "camelCase")]
    UpdateSettings {
        #[serde(skip_serializing_if = "Option::is_none")]
        max_team_size: Option<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_cards: Option<u8>,
    },
}
