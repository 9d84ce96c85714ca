use std::time::Duration;

use futures_util::StreamExt;
use serde_json::json;
use tokio::time;
use tokio_tungstenite::tungstenite::Message;

use crate::helpers::{
    receive_error, receive_game_end, receive_message, send_message, send_raw_message,
    CardInfo, ClientMessage, PlayerInfo, Scores, ServerMessage, TestApp, WsSink, WsStream,
};

#[tokio::test]
async fn create_room_works() {
    let app = TestApp::spawn().await;

    let room_id = app.create_room().await;

    assert_eq!(room_id.len(), 5);
    assert!(room_id.chars().all(|char| char.is_ascii_alphanumeric()));
}

#[tokio::test]
async fn player_receives_the_room_snapshot_on_join() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (_, mut rx) = app.open_room_websocket(&room_id, "ana").await.split();

    match receive_message(&mut rx).await {
        ServerMessage::RoomJoined {
            room_id: joined_room_id,
            player,
            teams,
            settings,
        } => {
            assert_eq!(joined_room_id, room_id);
            assert_eq!(player.nickname, "ana");
            assert_eq!(player.team, "red");
            assert!(player.is_host);
            assert_eq!(teams.red.len(), 1);
            assert!(teams.blue.is_empty());
            assert_eq!(settings.max_team_size, 5);
            assert_eq!(settings.total_cards, 40);
        }
        message => panic!("The message was not a RoomJoined: {message:?}"),
    }
}

#[tokio::test]
async fn room_settings_are_clamped_on_creation() {
    let app = TestApp::spawn().await;
    let room_id = app
        .create_room_with_settings(json!({"maxTeamSize": 9, "totalCards": 7}))
        .await;

    let (_, mut rx) = app.open_room_websocket(&room_id, "ana").await.split();

    match receive_message(&mut rx).await {
        ServerMessage::RoomJoined { settings, .. } => {
            assert_eq!(settings.max_team_size, 7);
            assert_eq!(settings.total_cards, 8);
        }
        message => panic!("The message was not a RoomJoined: {message:?}"),
    }
}

#[tokio::test]
async fn players_alternate_teams_on_join() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (_ws1, mut rx1) = app.open_room_websocket(&room_id, "ana").await.split();
    let _ = receive_message(&mut rx1).await;

    let (_ws2, mut rx2) = app.open_room_websocket(&room_id, "beto").await.split();
    match receive_message(&mut rx2).await {
        ServerMessage::RoomJoined { player, teams, .. } => {
            assert_eq!(player.team, "blue");
            assert!(!player.is_host);
            assert_eq!(teams.red.len(), 1);
            assert_eq!(teams.blue.len(), 1);
        }
        message => panic!("The message was not a RoomJoined: {message:?}"),
    }

    match receive_message(&mut rx1).await {
        ServerMessage::PlayerJoined { player, teams } => {
            assert_eq!(player.nickname, "beto");
            assert_eq!(teams.blue.first().unwrap().nickname, "beto");
        }
        message => panic!("The message was not a PlayerJoined: {message:?}"),
    }
}

#[tokio::test]
async fn duplicated_nickname_is_rejected() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (_ws1, mut rx1) = app.open_room_websocket(&room_id, "ana").await.split();
    let _ = receive_message(&mut rx1).await;

    let (_, mut rx2) = app.open_room_websocket(&room_id, "ana").await.split();

    assert_eq!(receive_error(&mut rx2).await, "PLAYER_ALREADY_EXISTS");
}

#[tokio::test]
async fn too_short_nickname_is_rejected() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (_, mut rx) = app.open_room_websocket(&room_id, "a").await.split();

    assert_eq!(receive_error(&mut rx).await, "INVALID_NICKNAME");
}

#[tokio::test]
async fn host_can_update_the_settings() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (mut tx, mut rx) = app.open_room_websocket(&room_id, "ana").await.split();
    let _ = receive_message(&mut rx).await;

    send_message(
        &mut tx,
        ClientMessage::UpdateSettings {
            max_team_size: None,
            total_cards: Some(9),
        },
    )
    .await;

    match receive_message(&mut rx).await {
        ServerMessage::SettingsUpdated { settings } => {
            assert_eq!(settings.max_team_size, 5);
            // odd card counts round up so both teams get the same amount
            assert_eq!(settings.total_cards, 10);
        }
        message => panic!("The message was not a SettingsUpdated: {message:?}"),
    }
}

#[tokio::test]
async fn non_host_player_cannot_update_the_settings() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (_ws1, mut rx1) = app.open_room_websocket(&room_id, "ana").await.split();
    let _ = receive_message(&mut rx1).await;

    let (mut tx2, mut rx2) = app.open_room_websocket(&room_id, "beto").await.split();
    let _ = receive_message(&mut rx2).await;

    send_message(
        &mut tx2,
        ClientMessage::UpdateSettings {
            max_team_size: Some(2),
            total_cards: None,
        },
    )
    .await;

    assert_eq!(receive_error(&mut rx2).await, "COMMAND_NOT_ALLOWED");
}

#[tokio::test]
async fn player_can_change_team_while_waiting() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (mut tx, mut rx) = app.open_room_websocket(&room_id, "ana").await.split();
    let _ = receive_message(&mut rx).await;

    send_message(&mut tx, ClientMessage::ChangeTeam).await;

    match receive_message(&mut rx).await {
        ServerMessage::TeamsUpdated { teams } => {
            assert!(teams.red.is_empty());
            assert_eq!(teams.blue.first().unwrap().nickname, "ana");
        }
        message => panic!("The message was not a TeamsUpdated: {message:?}"),
    }
}

#[tokio::test]
async fn changing_into_a_full_team_is_rejected() {
    let app = TestApp::spawn().await;
    let room_id = app
        .create_room_with_settings(json!({"maxTeamSize": 3}))
        .await;

    let mut connections = Vec::new();
    for nickname in ["p1", "p2", "p3"] {
        let (tx, mut rx) = app.open_room_websocket(&room_id, nickname).await.split();
        let _ = receive_message(&mut rx).await;
        connections.push((tx, rx));
    }
    // p4 lands in blue, p5 fills the red team
    let (mut tx4, mut rx4) = app.open_room_websocket(&room_id, "p4").await.split();
    let _ = receive_message(&mut rx4).await;
    let (_tx5, mut rx5) = app.open_room_websocket(&room_id, "p5").await.split();
    let _ = receive_message(&mut rx5).await;
    match receive_message(&mut rx4).await {
        ServerMessage::PlayerJoined { teams, .. } => {
            assert_eq!(teams.red.len(), 3);
            assert_eq!(teams.blue.len(), 2);
        }
        message => panic!("The message was not a PlayerJoined: {message:?}"),
    }

    send_message(&mut tx4, ClientMessage::ChangeTeam).await;

    assert_eq!(receive_error(&mut rx4).await, "TEAM_FULL");
}

#[tokio::test]
async fn host_can_start_the_game_before_the_room_is_full() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (mut tx1, mut rx1) = app.open_room_websocket(&room_id, "ana").await.split();
    let _ = receive_message(&mut rx1).await;
    let _ws2 = app.open_room_websocket(&room_id, "beto").await;
    let _ = receive_message(&mut rx1).await;

    send_message(&mut tx1, ClientMessage::StartGame).await;

    assert!(matches!(
        receive_message(&mut rx1).await,
        ServerMessage::GameStarting
    ));
    match receive_message(&mut rx1).await {
        ServerMessage::GameStarted {
            cards,
            teams,
            remaining_seconds,
            ..
        } => {
            assert_eq!(cards.len(), 40);
            assert_eq!(teams.red.len(), 1);
            assert_eq!(teams.blue.len(), 1);
            assert_eq!(remaining_seconds, 300);
        }
        message => panic!("The message was not a GameStarted: {message:?}"),
    }
}

#[tokio::test]
async fn non_host_player_cannot_start_the_game() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (_ws1, mut rx1) = app.open_room_websocket(&room_id, "ana").await.split();
    let _ = receive_message(&mut rx1).await;
    let (mut tx2, mut rx2) = app.open_room_websocket(&room_id, "beto").await.split();
    let _ = receive_message(&mut rx2).await;

    send_message(&mut tx2, ClientMessage::StartGame).await;

    assert_eq!(receive_error(&mut rx2).await, "COMMAND_NOT_ALLOWED");
}

#[tokio::test]
async fn game_cannot_start_with_an_empty_team() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (mut tx, mut rx) = app.open_room_websocket(&room_id, "ana").await.split();
    let _ = receive_message(&mut rx).await;

    send_message(&mut tx, ClientMessage::StartGame).await;

    assert_eq!(receive_error(&mut rx).await, "START_REQUIRES_BOTH_TEAMS");
}

#[tokio::test]
async fn game_auto_starts_when_the_room_fills() {
    let app = TestApp::spawn().await;

    let game = start_duel(&app).await;

    assert_eq!(game.cards.len(), 8);
    assert_eq!(game.cards.iter().filter(|card| card.team == "red").count(), 4);
    assert_eq!(game.cards.iter().filter(|card| card.team == "blue").count(), 4);
    assert!(game.cards.iter().all(|card| card.claimed_by.is_none()));
    assert_eq!(game.remaining_seconds, 300);
}

#[tokio::test]
async fn claiming_a_card_is_broadcast_to_the_whole_room() {
    let app = TestApp::spawn().await;
    let mut game = start_duel(&app).await;

    let target = game
        .cards
        .iter()
        .find(|card| card.team == "blue")
        .unwrap();
    send_message(
        &mut game.host_tx,
        ClientMessage::SubmitWord {
            word: target.word.clone(),
        },
    )
    .await;

    match receive_message(&mut game.host_rx).await {
        ServerMessage::CardClaimed {
            card_index,
            claimant,
            team,
        } => {
            assert_eq!(card_index, target.index);
            assert_eq!(claimant.id, game.host.id);
            assert_eq!(claimant.nickname, "ana");
            assert_eq!(team, "red");
        }
        message => panic!("The message was not a CardClaimed: {message:?}"),
    }
    assert!(matches!(
        receive_message(&mut game.guest_rx).await,
        ServerMessage::CardClaimed { .. }
    ));
}

#[tokio::test]
async fn unknown_and_already_claimed_words_are_silently_ignored() {
    let app = TestApp::spawn().await;
    let mut game = start_duel(&app).await;

    let blue_words: Vec<String> = game
        .cards
        .iter()
        .filter(|card| card.team == "blue")
        .map(|card| card.word.clone())
        .collect();

    send_message(
        &mut game.host_tx,
        ClientMessage::SubmitWord {
            word: "azertyuiop".to_string(),
        },
    )
    .await;
    send_message(
        &mut game.host_tx,
        ClientMessage::SubmitWord {
            word: blue_words[0].clone(),
        },
    )
    .await;
    // losing the race for a taken card is also silent
    send_message(
        &mut game.guest_tx,
        ClientMessage::SubmitWord {
            word: blue_words[0].clone(),
        },
    )
    .await;
    send_message(
        &mut game.guest_tx,
        ClientMessage::SubmitWord {
            word: blue_words[1].clone(),
        },
    )
    .await;

    match receive_message(&mut game.guest_rx).await {
        ServerMessage::CardClaimed { claimant, .. } => assert_eq!(claimant.nickname, "ana"),
        message => panic!("The message was not a CardClaimed: {message:?}"),
    }
    match receive_message(&mut game.guest_rx).await {
        ServerMessage::CardClaimed { claimant, team, .. } => {
            assert_eq!(claimant.nickname, "beto");
            assert_eq!(team, "blue");
        }
        message => panic!("The message was not a CardClaimed: {message:?}"),
    }
}

#[tokio::test]
async fn claiming_every_opposing_card_wins_the_round() {
    let app = TestApp::spawn().await;
    let mut game = start_duel(&app).await;

    for card in game.cards.iter().filter(|card| card.team == "blue") {
        send_message(
            &mut game.host_tx,
            ClientMessage::SubmitWord {
                word: card.word.clone(),
            },
        )
        .await;
    }

    let (winner, scores, reason) = receive_game_end(&mut game.host_rx).await;
    assert_eq!(winner, "red");
    assert_eq!(scores, Scores { red: 4, blue: 0 });
    assert_eq!(reason, "sweep");

    let (winner, _, _) = receive_game_end(&mut game.guest_rx).await;
    assert_eq!(winner, "red");
}

#[tokio::test]
async fn round_times_out_to_the_team_with_the_higher_score() {
    let app = TestApp::spawn_with(|config| config.game.round_seconds = 2).await;
    let mut game = start_duel(&app).await;

    let target = game
        .cards
        .iter()
        .find(|card| card.team == "blue")
        .unwrap();
    send_message(
        &mut game.host_tx,
        ClientMessage::SubmitWord {
            word: target.word.clone(),
        },
    )
    .await;

    let (winner, scores, reason) = receive_game_end(&mut game.host_rx).await;
    assert_eq!(winner, "red");
    assert_eq!(scores, Scores { red: 1, blue: 0 });
    assert_eq!(reason, "timeout");
}

#[tokio::test]
async fn round_without_claims_times_out_to_a_draw() {
    let app = TestApp::spawn_with(|config| config.game.round_seconds = 2).await;
    let mut game = start_duel(&app).await;

    let (winner, scores, reason) = receive_game_end(&mut game.host_rx).await;
    assert_eq!(winner, "draw");
    assert_eq!(scores, Scores { red: 0, blue: 0 });
    assert_eq!(reason, "timeout");
}

#[tokio::test]
async fn timer_updates_are_broadcast_every_second() {
    let app = TestApp::spawn_with(|config| config.game.round_seconds = 2).await;
    let mut game = start_duel(&app).await;

    match receive_message(&mut game.host_rx).await {
        ServerMessage::TimerUpdate { remaining_seconds } => assert_eq!(remaining_seconds, 1),
        message => panic!("The message was not a TimerUpdate: {message:?}"),
    }
    match receive_message(&mut game.host_rx).await {
        ServerMessage::TimerUpdate { remaining_seconds } => assert_eq!(remaining_seconds, 0),
        message => panic!("The message was not a TimerUpdate: {message:?}"),
    }
    assert!(matches!(
        receive_message(&mut game.host_rx).await,
        ServerMessage::GameEnd { .. }
    ));
}

#[tokio::test]
async fn losing_a_whole_team_ends_the_round() {
    let app = TestApp::spawn().await;
    let mut game = start_duel(&app).await;

    // Close the guest's websocket so the server disconnects the blue player
    drop(game.guest_tx);
    drop(game.guest_rx);

    let (winner, _, reason) = receive_game_end(&mut game.host_rx).await;
    assert_eq!(winner, "red");
    assert_eq!(reason, "depopulation");
}

#[tokio::test]
async fn joining_a_started_room_is_rejected() {
    let app = TestApp::spawn().await;
    let game = start_duel(&app).await;

    let (_, mut rx) = app
        .open_room_websocket(&game.room_id, "carla")
        .await
        .split();

    assert_eq!(receive_error(&mut rx).await, "ROOM_ALREADY_STARTED");
}

#[tokio::test]
async fn the_lobby_lists_rooms_with_a_free_seat() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (_ws, mut rx) = app.open_room_websocket(&room_id, "ana").await.split();
    let _ = receive_message(&mut rx).await;

    let rooms = app.list_rooms().await;
    let entry = rooms
        .iter()
        .find(|room| room.id == room_id)
        .expect("The room was not listed");
    assert_eq!(entry.current_players, 1);
    assert_eq!(entry.max_players, 10);
    assert_eq!(entry.settings.max_team_size, 5);
}

#[tokio::test]
async fn started_rooms_are_not_listed_in_the_lobby() {
    let app = TestApp::spawn().await;
    let game = start_duel(&app).await;

    let rooms = app.list_rooms().await;

    assert!(rooms.iter().all(|room| room.id != game.room_id));
}

#[tokio::test]
async fn an_empty_room_is_closed_after_the_inactivity_timeout() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    assert!(app.list_rooms().await.iter().any(|room| room.id == room_id));

    sleep(app.inactivity_timeout + Duration::from_secs(1)).await;

    assert!(app.list_rooms().await.iter().all(|room| room.id != room_id));
}

#[tokio::test]
async fn a_room_is_removed_when_the_last_player_leaves() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (tx, mut rx) = app.open_room_websocket(&room_id, "ana").await.split();
    let _ = receive_message(&mut rx).await;

    drop(tx);
    drop(rx);
    sleep(Duration::from_millis(500)).await;

    assert!(app.list_rooms().await.iter().all(|room| room.id != room_id));
}

#[tokio::test]
async fn unknown_websocket_text_message_is_rejected_but_room_still_alive() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (mut tx, mut rx) = app.open_room_websocket(&room_id, "ana").await.split();
    let _ = receive_message(&mut rx).await;

    send_raw_message(&mut tx, Message::Text("invalid".to_string())).await;
    assert_eq!(
        receive_error(&mut rx).await,
        "UNPROCESSABLE_WEBSOCKET_MESSAGE"
    );

    send_message(&mut tx, ClientMessage::ChangeTeam).await;
    assert!(matches!(
        receive_message(&mut rx).await,
        ServerMessage::TeamsUpdated { .. }
    ));
}

#[tokio::test]
async fn ping_messages_are_answered_with_pong() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room().await;

    let (mut tx, mut rx) = app.open_room_websocket(&room_id, "ana").await.split();
    let _ = receive_message(&mut rx).await;

    send_raw_message(&mut tx, Message::Text("ping".to_string())).await;

    let message = rx
        .next()
        .await
        .expect("Websocket closed before expected.")
        .expect("Websocket returned an error");
    assert_eq!(message.to_text().unwrap(), "pong");
}

#[tokio::test]
async fn settings_cannot_change_after_the_game_started() {
    let app = TestApp::spawn().await;
    let mut game = start_duel(&app).await;

    send_message(
        &mut game.host_tx,
        ClientMessage::UpdateSettings {
            max_team_size: Some(2),
            total_cards: None,
        },
    )
    .await;

    assert_eq!(receive_error(&mut game.host_rx).await, "INVALID_STATE");
}

struct StartedDuel {
    room_id: String,
    host: PlayerInfo,
    host_tx: WsSink,
    host_rx: WsStream,
    guest_tx: WsSink,
    guest_rx: WsStream,
    cards: Vec<CardInfo>,
    remaining_seconds: u32,
}

/// Fills a one-player-per-team room so it auto-starts, and consumes every
/// message up to and including both gameStarted notifications.
async fn start_duel(app: &TestApp) -> StartedDuel {
    let room_id = app
        .create_room_with_settings(json!({"maxTeamSize": 1, "totalCards": 8}))
        .await;

    let (host_tx, mut host_rx) = app.open_room_websocket(&room_id, "ana").await.split();
    let host = match receive_message(&mut host_rx).await {
        ServerMessage::RoomJoined { player, .. } => player,
        message => panic!("The message was not a RoomJoined: {message:?}"),
    };

    let (guest_tx, mut guest_rx) = app.open_room_websocket(&room_id, "beto").await.split();
    assert!(matches!(
        receive_message(&mut guest_rx).await,
        ServerMessage::RoomJoined { .. }
    ));

    assert!(matches!(
        receive_message(&mut host_rx).await,
        ServerMessage::PlayerJoined { .. }
    ));
    assert!(matches!(
        receive_message(&mut host_rx).await,
        ServerMessage::GameStarting
    ));
    assert!(matches!(
        receive_message(&mut guest_rx).await,
        ServerMessage::GameStarting
    ));

    let (cards, remaining_seconds) = match receive_message(&mut host_rx).await {
        ServerMessage::GameStarted {
            cards,
            remaining_seconds,
            ..
        } => (cards, remaining_seconds),
        message => panic!("The message was not a GameStarted: {message:?}"),
    };
    assert!(matches!(
        receive_message(&mut guest_rx).await,
        ServerMessage::GameStarted { .. }
    ));

    StartedDuel {
        room_id,
        host,
        host_tx,
        host_rx,
        guest_tx,
        guest_rx,
        cards,
        remaining_seconds,
    }
}

async fn sleep(duration: Duration) {
    let mut timer = time::interval(duration);
    timer.tick().await;
    timer.tick().await;
}
