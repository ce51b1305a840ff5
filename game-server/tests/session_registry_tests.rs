
use chrono::{Duration, Utc};
use game_core::session::is_valid_session_code;
use game_types::{CoordinatorError, ServerMessage};
use test_helpers::{TestCoordinatorSetup, drain_messages};
use uuid::Uuid;

#[tokio::test]
async fn test_create_session_allocates_valid_code() {
    let setup = TestCoordinatorSetup::new();
    let (session, host, _) = setup.create_session_with_players(0).await;

    assert!(is_valid_session_code(&session.id));
    assert_eq!(session.host_id, host);
    assert!(setup.registry.session_exists(&session.id));
    assert_eq!(setup.registry.session_count(), 1);
}

#[tokio::test]
async fn test_join_unknown_session_is_not_found() {
    let setup = TestCoordinatorSetup::new();

    let err = setup
        .registry
        .join_session("ZZZZZZ", Uuid::new_v4(), "Guest", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::NotFound { .. }));
}

#[tokio::test]
async fn test_join_broadcasts_role_projected_update() {
    let setup = TestCoordinatorSetup::new();
    let (session, _host, _) = setup.create_session_with_players(0).await;

    let (_watcher, _conn, mut receiver) = setup.create_subscribed_player(&session.id).await;

    let guest = Uuid::new_v4();
    setup
        .registry
        .join_session(&session.id, guest, "Guest", None)
        .await
        .unwrap();

    let updates: Vec<_> = drain_messages(&mut receiver)
        .into_iter()
        .filter_map(|m| match m {
            ServerMessage::SessionUpdate { session } => Some(session),
            _ => None,
        })
        .collect();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].players.len(), 2);
    // The watcher is not the describer of anything; no words attached.
    assert!(updates[0].words.is_none());
}

#[tokio::test]
async fn test_round_start_attaches_words_only_for_describer() {
    let setup = TestCoordinatorSetup::new();
    let (session, host, guests) = setup.create_session_with_players(1).await;
    let guest = guests[0];

    // Subscribe a connection for each role.
    let host_conn = game_server::websocket::connection::ConnectionId::new();
    let mut host_rx = setup.connection_manager.create_connection(host_conn).await;
    setup
        .connection_manager
        .identify_connection(host_conn, host)
        .await;
    setup
        .connection_manager
        .set_connection_session(host_conn, Some(session.id.clone()))
        .await;

    let guest_conn = game_server::websocket::connection::ConnectionId::new();
    let mut guest_rx = setup.connection_manager.create_connection(guest_conn).await;
    setup
        .connection_manager
        .identify_connection(guest_conn, guest)
        .await;
    setup
        .connection_manager
        .set_connection_session(guest_conn, Some(session.id.clone()))
        .await;

    let started = setup
        .registry
        .start_round(&session.id, host, host)
        .await
        .unwrap();
    assert!(started.words.is_some());

    let host_round_words = drain_messages(&mut host_rx)
        .into_iter()
        .find_map(|m| match m {
            ServerMessage::RoundStarted { words, .. } => Some(words),
            _ => None,
        })
        .expect("describer should receive RoundStarted");
    assert_eq!(host_round_words.map(|w| w.len()), Some(16));

    let guest_round_words = drain_messages(&mut guest_rx)
        .into_iter()
        .find_map(|m| match m {
            ServerMessage::RoundStarted { words, .. } => Some(words),
            _ => None,
        })
        .expect("guesser should receive RoundStarted");
    assert!(guest_round_words.is_none());
}

#[tokio::test]
async fn test_concurrent_round_end_resolves_once() {
    let setup = TestCoordinatorSetup::new();
    let (session, host, guests) = setup.create_session_with_players(1).await;

    setup
        .registry
        .start_round(&session.id, host, host)
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        setup.registry.end_round(&session.id, host, Some(guests[0])),
        setup.registry.end_round(&session.id, host, Some(guests[0])),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    // Whichever order the lock granted, exactly one call did the work.
    assert_eq!(
        [first.already_ended, second.already_ended]
            .iter()
            .filter(|ended| !**ended)
            .count(),
        1
    );
    assert_eq!(
        [first.reveal.is_some(), second.reveal.is_some()]
            .iter()
            .filter(|r| **r)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_end_round_by_bystander_is_denied() {
    let setup = TestCoordinatorSetup::new();
    let (session, host, guests) = setup.create_session_with_players(1).await;

    setup
        .registry
        .start_round(&session.id, host, host)
        .await
        .unwrap();

    let err = setup
        .registry
        .end_round(&session.id, guests[0], None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::PermissionDenied { .. }));
}

#[tokio::test]
async fn test_guess_run_grants_exactly_one_bonus_batch() {
    let setup = TestCoordinatorSetup::new();
    let (session, host, guests) = setup.create_session_with_players(1).await;
    let guesser = guests[0];

    let started = setup
        .registry
        .start_round(&session.id, host, host)
        .await
        .unwrap();
    let words = started.words.expect("describer sees the words");
    assert_eq!(words.len(), 16);

    // floor(0.8 * 16) = 12: the twelfth distinct correct guess triggers the
    // batch, and no later guess re-triggers it at the same level.
    let mut total_bonus = 0;
    let mut final_word_count = 0;
    for entry in words.iter().take(13) {
        let outcome = setup
            .registry
            .submit_guess(&session.id, guesser, &entry.word)
            .await
            .unwrap();
        assert!(outcome.submission.is_correct);
        assert!(!outcome.already_guessed);
        total_bonus += outcome.bonus_words_added;
        final_word_count = outcome.word_count;
    }

    assert_eq!(total_bonus, 4);
    assert_eq!(final_word_count, 20);
}

#[tokio::test]
async fn test_racing_guessers_share_one_bonus_batch() {
    let setup = TestCoordinatorSetup::new();
    let (session, host, guests) = setup.create_session_with_players(3).await;

    let started = setup
        .registry
        .start_round(&session.id, host, host)
        .await
        .unwrap();
    let words = started.words.unwrap();

    // Three guessers hammer the same session with thirteen distinct correct
    // words at once; the session lock serializes them, so the threshold
    // crossing happens exactly once no matter the interleaving.
    let mut tasks = Vec::new();
    for (i, entry) in words.iter().take(13).enumerate() {
        let registry = setup.registry.clone();
        let code = session.id.clone();
        let guesser = guests[i % guests.len()];
        let word = entry.word.clone();
        tasks.push(tokio::spawn(async move {
            registry.submit_guess(&code, guesser, &word).await.unwrap()
        }));
    }

    let mut granting_outcomes = 0;
    let mut total_bonus = 0;
    for task in tasks {
        let outcome = task.await.unwrap();
        assert!(outcome.submission.is_correct);
        if outcome.bonus_words_added > 0 {
            granting_outcomes += 1;
        }
        total_bonus += outcome.bonus_words_added;
    }
    assert_eq!(granting_outcomes, 1);
    assert_eq!(total_bonus, 4);

    let snapshot = setup
        .registry
        .snapshot(&session.id, Some(host))
        .await
        .unwrap();
    assert_eq!(snapshot.words.map(|w| w.len()), Some(20));
}

#[tokio::test]
async fn test_repeat_guess_is_flagged_not_rescored() {
    let setup = TestCoordinatorSetup::new();
    let (session, host, guests) = setup.create_session_with_players(1).await;
    let guesser = guests[0];

    let started = setup
        .registry
        .start_round(&session.id, host, host)
        .await
        .unwrap();
    let word = started.words.unwrap()[0].word.clone();

    let first = setup
        .registry
        .submit_guess(&session.id, guesser, &word)
        .await
        .unwrap();
    assert!(first.submission.is_correct);
    assert!(first.submission.points > 0);

    let repeat = setup
        .registry
        .submit_guess(&session.id, guesser, &word.to_lowercase())
        .await
        .unwrap();
    assert!(repeat.already_guessed);
    assert_eq!(repeat.submission.points, 0);
}

#[tokio::test]
async fn test_last_player_leaving_removes_session() {
    let setup = TestCoordinatorSetup::new();
    let (session, host, guests) = setup.create_session_with_players(1).await;

    setup
        .registry
        .leave_session(&session.id, guests[0])
        .await
        .unwrap();
    assert!(setup.registry.session_exists(&session.id));

    setup.registry.leave_session(&session.id, host).await.unwrap();
    assert!(!setup.registry.session_exists(&session.id));
}

#[tokio::test]
async fn test_kick_notifies_target_and_detaches() {
    let setup = TestCoordinatorSetup::new();
    let (session, host, guests) = setup.create_session_with_players(1).await;
    let target = guests[0];

    let conn = game_server::websocket::connection::ConnectionId::new();
    let mut rx = setup.connection_manager.create_connection(conn).await;
    setup.connection_manager.identify_connection(conn, target).await;
    setup
        .connection_manager
        .set_connection_session(conn, Some(session.id.clone()))
        .await;

    setup
        .registry
        .kick_player(&session.id, host, target)
        .await
        .unwrap();

    let messages = drain_messages(&mut rx);
    assert!(
        messages
            .iter()
            .any(|m| matches!(m, ServerMessage::SessionLeft))
    );
    assert_eq!(setup.connection_manager.player_connection_count().await, 0);
}

#[tokio::test]
async fn test_cleanup_sweep_expires_old_sessions() {
    let setup = TestCoordinatorSetup::new();
    let (session, _host, _) = setup.create_session_with_players(1).await;

    // A populated, fresh session survives a sweep.
    setup.registry.cleanup_sweep(Utc::now()).await;
    assert!(setup.registry.session_exists(&session.id));

    // Past the retention window it goes, players or not.
    setup
        .registry
        .cleanup_sweep(Utc::now() + Duration::days(4))
        .await;
    assert!(!setup.registry.session_exists(&session.id));
}

#[tokio::test]
async fn test_cleanup_sweep_runs_alongside_leaves() {
    let setup = TestCoordinatorSetup::new();

    // Leaving holds a session lock while removing the emptied session from
    // the map; a sweep walking the map and locking sessions at the same
    // time must not wedge against it.
    let mut sessions = Vec::new();
    for _ in 0..16 {
        let (session, host, guests) = setup.create_session_with_players(1).await;
        sessions.push((session.id, host, guests[0]));
    }

    let mut tasks = Vec::new();
    for (code, host, guest) in sessions {
        let registry = setup.registry.clone();
        tasks.push(tokio::spawn(async move {
            registry.leave_session(&code, guest).await.unwrap();
            registry.leave_session(&code, host).await.unwrap();
        }));
        let registry = setup.registry.clone();
        tasks.push(tokio::spawn(async move {
            registry.cleanup_sweep(Utc::now()).await;
        }));
    }

    let drain = async {
        for task in tasks {
            task.await.unwrap();
        }
        setup.registry.cleanup_sweep(Utc::now()).await;
    };
    tokio::time::timeout(std::time::Duration::from_secs(10), drain)
        .await
        .expect("sweep and leaves must finish together");
    assert_eq!(setup.registry.session_count(), 0);
}

#[tokio::test]
async fn test_heartbeat_is_silent() {
    let setup = TestCoordinatorSetup::new();
    let (session, host, _) = setup.create_session_with_players(0).await;

    let (_watcher, _conn, mut receiver) = setup.create_subscribed_player(&session.id).await;

    setup.registry.heartbeat(&session.id, host).await.unwrap();
    assert!(drain_messages(&mut receiver).is_empty());

    // Unknown players get a liveness write refused, not silently upserted.
    let err = setup
        .registry
        .heartbeat(&session.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::NotFound { .. }));
}
