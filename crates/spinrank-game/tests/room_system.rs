//! Integration tests for rooms driven through the manager, the way the
//! server drives them.

use std::sync::Arc;

use spinrank_game::{Command, GameError, Phase, PromptPool, RoomConfig, RoomManager};
use spinrank_protocol::{PlayerId, RoomCode, ServerEvent};
use tokio::sync::mpsc::{self, UnboundedReceiver};

fn manager() -> RoomManager {
    RoomManager::with_seed(RoomConfig::default(), Arc::new(PromptPool::default()), 42)
}

/// Drains everything queued so far.
fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn seat(
    mgr: &mut RoomManager,
    code: &RoomCode,
    id: u64,
    name: &str,
) -> UnboundedReceiver<ServerEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    mgr.join_room(PlayerId(id), code, name.to_owned(), tx).await.unwrap();
    rx
}

#[tokio::test]
async fn test_full_round_scores_and_broadcasts_results() {
    let mut mgr = manager();
    let code = mgr.create_room(Some(2)).unwrap();
    let mut rx_a = seat(&mut mgr, &code, 1, "Ann").await;
    let mut rx_b = seat(&mut mgr, &code, 2, "Bob").await;
    let mut rx_c = seat(&mut mgr, &code, 3, "Cid").await;
    drain(&mut rx_a);
    drain(&mut rx_b);
    drain(&mut rx_c);

    let room = mgr.handle(&code).unwrap();
    room.apply(PlayerId(1), Command::StartGame).await.unwrap();
    room.apply(PlayerId(1), Command::SpinComplete { multiplier: 2 }).await.unwrap();

    let events = drain(&mut rx_b);
    assert!(matches!(events[0], ServerEvent::RoundStarted { round: 1, total_rounds: 6, .. }));
    assert!(matches!(
        events[1],
        ServerEvent::SpinningComplete {
            multiplier: 2,
            current_spinner_id: Some(PlayerId(2)),
            previous_spinner_id: Some(PlayerId(1)),
        }
    ));

    let ballots = [
        (1, vec![1, 2, 3, 4, 5]),
        (2, vec![1, 2, 3, 4, 5]),
        (3, vec![1, 2, 3, 5, 4]),
    ];
    for (id, votes) in ballots {
        room.apply(PlayerId(id), Command::SubmitVotes { votes, multiplier: 2 })
            .await
            .unwrap();
    }

    let results: Vec<ServerEvent> = drain(&mut rx_c)
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::RoundResults { .. }))
        .collect();
    assert_eq!(results.len(), 1, "round scored exactly once");
    let ServerEvent::RoundResults {
        scores_by_player_id,
        round_points_by_player_id,
        multiplier,
        ..
    } = &results[0]
    else {
        unreachable!()
    };
    assert_eq!(*multiplier, 2);
    // Bob holds the spin after the wheel stopped; Ann and Cid agree on 3.
    assert_eq!(round_points_by_player_id[&PlayerId(1)], 6);
    assert_eq!(round_points_by_player_id[&PlayerId(3)], 6);
    assert_eq!(round_points_by_player_id[&PlayerId(2)], 6);
    assert_eq!(scores_by_player_id, round_points_by_player_id);

    let info = mgr.get_room_info(&code).await.unwrap();
    assert_eq!(info.phase, Phase::Waiting);
    assert_eq!(info.rounds_completed, 1);
}

fn vote(ranks: [i64; 5]) -> Command {
    Command::SubmitVotes {
        votes: ranks.to_vec(),
        multiplier: 3,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_last_votes_score_once() {
    let mut mgr = manager();
    let code = mgr.create_room(Some(3)).unwrap();
    let mut receivers = vec![
        seat(&mut mgr, &code, 1, "Ann").await,
        seat(&mut mgr, &code, 2, "Bob").await,
        seat(&mut mgr, &code, 3, "Cid").await,
    ];
    let room = mgr.handle(&code).unwrap();

    for round in 1..=3 {
        room.apply(PlayerId(1), Command::StartGame).await.unwrap();
        room.apply(PlayerId(1), Command::SpinComplete { multiplier: 3 }).await.unwrap();
        room.apply(PlayerId(1), vote([1, 2, 3, 4, 5])).await.unwrap();

        let (bob, cid) = (room.clone(), room.clone());
        let (b, c) = tokio::join!(
            tokio::spawn(async move { bob.apply(PlayerId(2), vote([1, 2, 3, 4, 5])).await }),
            tokio::spawn(async move { cid.apply(PlayerId(3), vote([5, 4, 3, 2, 1])).await }),
        );
        b.unwrap().unwrap();
        c.unwrap().unwrap();

        for rx in &mut receivers {
            let results = drain(rx)
                .into_iter()
                .filter(|e| matches!(e, ServerEvent::RoundResults { .. }))
                .count();
            assert_eq!(results, 1, "round {round} scored {results} times");
        }

        let info = room.get_info().await.unwrap();
        assert_eq!(info.rounds_completed, round);
        assert_eq!(info.phase, Phase::Waiting);
    }
}

#[tokio::test]
async fn test_non_member_command_rejected() {
    let mut mgr = manager();
    let code = mgr.create_room(None).unwrap();
    let _rx = seat(&mut mgr, &code, 1, "Ann").await;

    let result = mgr.handle(&code).unwrap().apply(PlayerId(9), Command::StartGame).await;
    let err = result.unwrap_err();
    assert!(matches!(err, GameError::NotInRoom(PlayerId(9), _)));
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn test_join_room_different_room_conflicts() {
    let mut mgr = manager();
    let first = mgr.create_room(None).unwrap();
    let second = mgr.create_room(None).unwrap();
    let _rx = seat(&mut mgr, &first, 1, "Ann").await;

    let (tx, _rx2) = mpsc::unbounded_channel();
    let result = mgr.join_room(PlayerId(1), &second, "Ann".into(), tx).await;
    assert!(matches!(result, Err(GameError::AlreadyInRoom(PlayerId(1), ref c)) if *c == first));
}

#[tokio::test]
async fn test_rejoin_same_room_keeps_one_seat() {
    let mut mgr = manager();
    let code = mgr.create_room(None).unwrap();
    let _rx = seat(&mut mgr, &code, 1, "Ann").await;
    let _rx = seat(&mut mgr, &code, 1, "Annie").await;

    let session = mgr.handle(&code).unwrap().snapshot().await.unwrap();
    assert_eq!(session.player_count(), 1);
    assert_eq!(session.roster()[0].name, "Annie");
}

#[tokio::test]
async fn test_leave_room_last_player_destroys_room() {
    let mut mgr = manager();
    let code = mgr.create_room(None).unwrap();
    let mut rx_a = seat(&mut mgr, &code, 1, "Ann").await;
    let _rx_b = seat(&mut mgr, &code, 2, "Bob").await;
    drain(&mut rx_a);

    assert_eq!(mgr.leave_room(PlayerId(2)).await.unwrap(), Some(code.clone()));
    assert_eq!(mgr.room_count(), 1);
    let events = drain(&mut rx_a);
    assert!(matches!(
        &events[..],
        [ServerEvent::PlayerLeft {
            players,
            current_spinner_id: Some(PlayerId(1)),
        }] if players.len() == 1
    ));

    mgr.leave_room(PlayerId(1)).await.unwrap();
    assert_eq!(mgr.room_count(), 0);
    assert!(matches!(mgr.handle(&code), Err(GameError::RoomNotFound(_))));
    assert!(mgr.player_room(PlayerId(1)).is_none());
}

#[tokio::test]
async fn test_leave_room_by_last_non_voter_closes_round() {
    let mut mgr = manager();
    let code = mgr.create_room(Some(2)).unwrap();
    let mut rx_a = seat(&mut mgr, &code, 1, "Ann").await;
    let mut rx_b = seat(&mut mgr, &code, 2, "Bob").await;
    let _rx_c = seat(&mut mgr, &code, 3, "Cid").await;

    let room = mgr.handle(&code).unwrap();
    room.apply(PlayerId(1), Command::StartGame).await.unwrap();
    room.apply(PlayerId(1), Command::SpinComplete { multiplier: 3 }).await.unwrap();
    room.apply(PlayerId(1), vote([1, 2, 3, 4, 5])).await.unwrap();
    room.apply(PlayerId(2), vote([1, 2, 3, 4, 5])).await.unwrap();
    drain(&mut rx_a);
    drain(&mut rx_b);

    mgr.leave_room(PlayerId(3)).await.unwrap();

    for rx in [&mut rx_a, &mut rx_b] {
        let events = drain(rx);
        assert!(matches!(
            events[..],
            [ServerEvent::PlayerLeft { .. }, ServerEvent::RoundResults { multiplier: 3, .. }]
        ));
    }
    let info = mgr.get_room_info(&code).await.unwrap();
    assert_eq!(info.phase, Phase::Waiting);
    assert_eq!(info.player_count, 2);
}

#[tokio::test]
async fn test_leave_room_not_seated_is_noop() {
    let mut mgr = manager();
    assert_eq!(mgr.leave_room(PlayerId(5)).await.unwrap(), None);
}

#[tokio::test]
async fn test_remove_if_empty_only_removes_empty_rooms() {
    let mut mgr = manager();
    let empty = mgr.create_room(None).unwrap();
    let busy = mgr.create_room(None).unwrap();
    let _rx = seat(&mut mgr, &busy, 1, "Ann").await;

    assert!(mgr.remove_if_empty(&empty).await.unwrap());
    assert!(!mgr.remove_if_empty(&busy).await.unwrap());
    assert_eq!(mgr.room_codes(), vec![busy]);
}

#[tokio::test]
async fn test_game_over_after_round_budget() {
    let mut mgr = manager();
    let code = mgr.create_room(Some(2)).unwrap();
    let mut rx = seat(&mut mgr, &code, 1, "Ann").await;
    let _rx_b = seat(&mut mgr, &code, 2, "Bob").await;
    let room = mgr.handle(&code).unwrap();

    for _ in 0..5 {
        room.apply(PlayerId(1), Command::StartGame).await.unwrap();
    }
    let events = drain(&mut rx);
    let started = events.iter().filter(|e| matches!(e, ServerEvent::RoundStarted { .. })).count();
    assert_eq!(started, 4);
    assert!(matches!(events.last(), Some(ServerEvent::GameOver { winner: None })));
    assert_eq!(room.get_info().await.unwrap().phase, Phase::GameOver);
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    let mut mgr = manager();
    let first = mgr.create_room(None).unwrap();
    let second = mgr.create_room(None).unwrap();
    let mut rx_a = seat(&mut mgr, &first, 1, "Ann").await;
    let mut rx_b = seat(&mut mgr, &second, 2, "Bob").await;
    drain(&mut rx_a);
    drain(&mut rx_b);

    mgr.handle(&first).unwrap().apply(PlayerId(1), Command::StartGame).await.unwrap();
    mgr.handle(&second).unwrap().shutdown().await.unwrap();

    assert_eq!(drain(&mut rx_a).len(), 1);
    assert!(drain(&mut rx_b).is_empty());
    assert_eq!(mgr.get_room_info(&first).await.unwrap().rounds_completed, 1);
    assert_eq!(mgr.get_room_info(&second).await.unwrap_err().status_code(), 500);
}
