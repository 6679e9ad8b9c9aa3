// Integration smoke test for the session server.
//
// Starts a server on localhost and drives it with `NetClient`s through the
// whole lifecycle: handshake, lobby, a real turn on the star board, and a
// mid-match disconnect. Other tests play a human against a bot, and speak raw
// frames to check the handshake rejection path and that undecodable requests
// are dropped without costing anyone the match.

use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use halma_board::{BoardModel, BoardVariant, StarBoard};
use halma_protocol::framing::write_frame;
use halma_protocol::{
    ClientMessage, GameType, GameplayRequest, PROTOCOL_VERSION, Response, ServerMessage, recv,
    send,
};
use halma_server::client::NetClient;
use halma_server::{MatchOptions, ServerConfig, start_server};
use pretty_assertions::assert_eq;

fn test_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        rng_seed: Some(1),
        bot_move_delay_ms: 0,
        ..ServerConfig::default()
    }
}

fn start() -> (halma_server::ServerHandle, SocketAddr) {
    let config = test_config();
    let options: MatchOptions = config.match_options();
    start_server(&config, options).unwrap()
}

/// Skip messages until one matches, panicking after a few seconds of silence.
fn wait_for(client: &NetClient, what: &str, pred: impl Fn(&ServerMessage) -> bool) -> ServerMessage {
    loop {
        match client.recv_timeout(Duration::from_secs(5)) {
            Some(message) if pred(&message) => return message,
            Some(_) => {}
            None => panic!("{} timed out waiting for {what}", client.info().display_name),
        }
    }
}

fn wait_for_start_turn(client: &NetClient) -> halma_protocol::ClientInfo {
    match wait_for(client, "StartTurn", |m| {
        matches!(m, ServerMessage::Game(Response::StartTurn { .. }))
    }) {
        ServerMessage::Game(Response::StartTurn { player }) => player,
        _ => unreachable!(),
    }
}

#[test]
fn full_session_lifecycle() {
    let (handle, addr) = start();

    let mut alice = NetClient::connect(addr, "Alice").unwrap();
    let mut bob = NetClient::connect(addr, "Bob").unwrap();
    assert_ne!(alice.info().connection_id, bob.info().connection_id);

    // Lobby: Alice creates, Bob finds and joins.
    alice.create_game(GameType::TwoPlayers).unwrap();
    let game = match wait_for(&alice, "Joined", |m| matches!(m, ServerMessage::Joined { .. })) {
        ServerMessage::Joined { game } => game,
        _ => unreachable!(),
    };
    bob.list_games().unwrap();
    match wait_for(&bob, "GameList", |m| matches!(m, ServerMessage::GameList { .. })) {
        ServerMessage::GameList { games } => {
            assert_eq!(games.len(), 1);
            assert_eq!(games[0].id, game.id);
            assert_eq!(games[0].roster.len(), 1);
        }
        _ => unreachable!(),
    }
    bob.join_game(game.id).unwrap();

    match wait_for(&alice, "SomeoneJoined", |m| {
        matches!(m, ServerMessage::Game(Response::SomeoneJoined { .. }))
    }) {
        ServerMessage::Game(Response::SomeoneJoined { player }) => {
            assert_eq!(player.display_name, "Bob");
        }
        _ => unreachable!(),
    }

    // Both see the same first player.
    let first = wait_for_start_turn(&alice);
    assert_eq!(wait_for_start_turn(&bob), first);
    let (owner, other) = if first.connection_id == alice.info().connection_id {
        (&mut alice, &mut bob)
    } else {
        (&mut bob, &mut alice)
    };
    let seat = first.player_id.unwrap();

    // Find an opening move on a local copy of the starting position.
    let mut board = StarBoard::new(BoardVariant::TwoPlayers);
    board.add_player().unwrap();
    board.add_player().unwrap();
    let (from, destinations) = board
        .pawns_of(seat)
        .map(|p| (p.position, board.legal_destinations(seat, p.position)))
        .find(|(_, d)| !d.is_empty())
        .unwrap();

    owner
        .send_gameplay(GameplayRequest::PossibleMoves { pawn: from })
        .unwrap();
    let offered = wait_for(owner, "PossibleMoves", |m| {
        matches!(m, ServerMessage::Game(Response::PossibleMoves { .. }))
    });
    assert_eq!(
        offered,
        ServerMessage::Game(Response::PossibleMoves {
            from,
            destinations: destinations.clone(),
        })
    );

    let to = destinations[0];
    owner
        .send_gameplay(GameplayRequest::Move { from, to })
        .unwrap();
    match wait_for(other, "Move", |m| {
        matches!(m, ServerMessage::Game(Response::Move { .. }))
    }) {
        ServerMessage::Game(Response::Move { player, from: f, to: t }) => {
            assert_eq!(player.connection_id, first.connection_id);
            assert_eq!((f, t), (from, to));
        }
        _ => unreachable!(),
    }

    owner.send_gameplay(GameplayRequest::EndTurn).unwrap();
    let second = wait_for_start_turn(other);
    assert_eq!(second.connection_id, other.info().connection_id);

    // The player to move walks away: the match is over for everyone.
    other.disconnect();
    wait_for(owner, "SomeoneLeft", |m| {
        matches!(m, ServerMessage::Game(Response::SomeoneLeft { .. }))
    });
    assert_eq!(
        wait_for(owner, "GameEnded", |m| {
            matches!(m, ServerMessage::Game(Response::GameEnded { .. }))
        }),
        ServerMessage::Game(Response::GameEnded { placings: vec![] })
    );

    owner.list_games().unwrap();
    match wait_for(owner, "GameList", |m| matches!(m, ServerMessage::GameList { .. })) {
        ServerMessage::GameList { games } => assert!(games.is_empty()),
        _ => unreachable!(),
    }

    owner.disconnect();
    handle.stop();
}

#[test]
fn play_against_a_bot() {
    let (handle, addr) = start();
    let mut alice = NetClient::connect(addr, "Alice").unwrap();

    alice.create_game(GameType::TwoPlayers).unwrap();
    wait_for(&alice, "Joined", |m| matches!(m, ServerMessage::Joined { .. }));
    alice.add_bot().unwrap();
    wait_for(&alice, "GameStarted", |m| {
        matches!(m, ServerMessage::Game(Response::GameStarted { .. }))
    });

    let me = alice.info().connection_id;
    let mut bot_turns = 0;
    while bot_turns < 2 {
        match wait_for(&alice, "turn traffic", |m| matches!(m, ServerMessage::Game(_))) {
            ServerMessage::Game(Response::StartTurn { player }) if player.connection_id == me => {
                alice.send_gameplay(GameplayRequest::EndTurn).unwrap();
            }
            ServerMessage::Game(Response::EndTurn { player }) if player.connection_id != me => {
                bot_turns += 1;
            }
            _ => {}
        }
    }

    alice.leave_game().unwrap();
    wait_for(&alice, "Left", |m| matches!(m, ServerMessage::Left { .. }));
    assert!(handle.registry().is_empty());

    alice.disconnect();
    handle.stop();
}

#[test]
fn lobby_rejects_misuse() {
    let (handle, addr) = start();
    let mut alice = NetClient::connect(addr, "Alice").unwrap();

    alice.join_game(halma_protocol::SessionId(999)).unwrap();
    assert!(matches!(
        wait_for(&alice, "Rejected", |m| matches!(m, ServerMessage::Rejected { .. })),
        ServerMessage::Rejected { .. }
    ));

    alice.add_bot().unwrap();
    wait_for(&alice, "Rejected", |m| matches!(m, ServerMessage::Rejected { .. }));

    alice.create_game(GameType::ThreePlayers).unwrap();
    wait_for(&alice, "Joined", |m| matches!(m, ServerMessage::Joined { .. }));
    alice.create_game(GameType::TwoPlayers).unwrap();
    wait_for(&alice, "Rejected", |m| matches!(m, ServerMessage::Rejected { .. }));

    alice.disconnect();
    handle.stop();
}

#[test]
fn handshake_with_wrong_version_is_rejected() {
    let (handle, addr) = start();

    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = BufWriter::new(stream);
    send(
        &mut writer,
        &ClientMessage::Hello {
            protocol_version: 999,
            display_name: "Mallory".into(),
        },
    )
    .unwrap();

    let reply: ServerMessage = recv(&mut reader).unwrap();
    assert!(matches!(reply, ServerMessage::Rejected { .. }));

    handle.stop();
}

#[test]
fn undecodable_request_does_not_end_the_match() {
    let (handle, addr) = start();
    let mut alice = NetClient::connect(addr, "Alice").unwrap();
    alice.create_game(GameType::TwoPlayers).unwrap();
    let game = match wait_for(&alice, "Joined", |m| matches!(m, ServerMessage::Joined { .. })) {
        ServerMessage::Joined { game } => game,
        _ => unreachable!(),
    };

    // Bob speaks raw frames so he can send what no client would.
    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = BufWriter::new(stream);
    send(
        &mut writer,
        &ClientMessage::Hello {
            protocol_version: PROTOCOL_VERSION,
            display_name: "Bob".into(),
        },
    )
    .unwrap();
    let bob = match recv::<_, ServerMessage>(&mut reader).unwrap() {
        ServerMessage::Welcome { client } => client,
        other => panic!("expected Welcome, got {other:?}"),
    };
    send(&mut writer, &ClientMessage::JoinGame { game_id: game.id }).unwrap();

    let first = wait_for_start_turn(&alice);
    write_frame(&mut writer, br#"{"Gameplay":"Teleport"}"#).unwrap();
    write_frame(&mut writer, b"not json").unwrap();

    if first.connection_id == bob.connection_id {
        send(&mut writer, &ClientMessage::Gameplay(GameplayRequest::EndTurn)).unwrap();
    } else {
        alice.send_gameplay(GameplayRequest::EndTurn).unwrap();
    }

    // Nobody left and nothing ended on the way to the next turn.
    let second = loop {
        match alice.recv_timeout(Duration::from_secs(5)) {
            Some(ServerMessage::Game(Response::StartTurn { player })) => break player,
            Some(ServerMessage::Game(
                message @ (Response::SomeoneLeft { .. } | Response::GameEnded { .. }),
            )) => panic!("match disturbed: {message:?}"),
            Some(_) => {}
            None => panic!("timed out waiting for the second turn"),
        }
    };
    assert_ne!(second.connection_id, first.connection_id);
    assert_eq!(handle.registry().len(), 1);

    alice.disconnect();
    handle.stop();
}
