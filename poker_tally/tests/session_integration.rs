/// Integration tests for sessions against the in-process store
///
/// These cover commit races, expiry, and snapshot fan-out through the
/// actor-backed `TableManager`.
use async_trait::async_trait;
use chrono::{Duration, Utc};
use poker_tally::{
    Intent, SessionConfig, TableConfig, TableError, TableId, TableManager, TableSession,
    TableState, TableStore,
    entities::{Action, Award, Round},
    game::InvalidActionReason,
    table::{SnapshotStream, TablePatch},
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

fn table(seats: usize) -> TableState {
    let config = TableConfig::new(seats, 100, 5, Utc::now()).unwrap();
    TableState::with_default_players(config).unwrap()
}

/// Store that lets another writer sneak in ahead of the next `races` commits.
struct RacingStore {
    inner: TableManager,
    races: AtomicUsize,
}

impl RacingStore {
    fn new(races: usize) -> Self {
        Self {
            inner: TableManager::new(),
            races: AtomicUsize::new(races),
        }
    }
}

#[async_trait]
impl TableStore for RacingStore {
    async fn create(&self, initial: TableState) -> poker_tally::TableResult<TableId> {
        self.inner.create(initial).await
    }

    async fn snapshot(&self, table_id: &TableId) -> poker_tally::TableResult<TableState> {
        self.inner.snapshot(table_id).await
    }

    async fn commit(
        &self,
        table_id: &TableId,
        expected_version: u64,
        patch: TablePatch,
    ) -> poker_tally::TableResult<TableState> {
        let remaining = self.races.load(Ordering::SeqCst);
        if remaining > 0 {
            self.races.store(remaining - 1, Ordering::SeqCst);
            let current = self.inner.snapshot(table_id).await?;
            self.inner
                .commit(table_id, current.version, TablePatch::default())
                .await?;
        }
        self.inner.commit(table_id, expected_version, patch).await
    }

    async fn subscribe(&self, table_id: &TableId) -> poker_tally::TableResult<SnapshotStream> {
        self.inner.subscribe(table_id).await
    }
}

#[tokio::test]
async fn test_session_commits_and_bumps_version() {
    let store = Arc::new(TableManager::new());
    let session = TableSession::create(store, table(2), SessionConfig::default())
        .await
        .unwrap();

    let transition = session.start_hand(Some(0)).await.unwrap();
    assert_eq!(transition.state.version, 1);
    assert_eq!(transition.state.pot, 15);
    assert_eq!(session.snapshot().await.unwrap(), transition.state);
}

#[tokio::test]
async fn test_stale_commit_is_retried_against_fresh_snapshot() {
    let store = Arc::new(RacingStore::new(2));
    let session = TableSession::create(store, table(3), SessionConfig::default())
        .await
        .unwrap();

    let transition = session.start_hand(Some(0)).await.unwrap();
    // Two sneaked-in commits plus ours.
    assert_eq!(transition.state.version, 3);
    assert!(transition.state.hand_active());
}

#[tokio::test]
async fn test_stale_state_surfaces_after_retry_budget() {
    let store = Arc::new(RacingStore::new(10));
    let config = SessionConfig {
        max_commit_retries: 1,
    };
    let session = TableSession::create(store, table(2), config).await.unwrap();

    let err = session.start_hand(None).await.unwrap_err();
    assert!(matches!(err, TableError::StaleState { .. }));
    assert!(!err.is_terminal());
}

#[tokio::test]
async fn test_second_participant_out_of_turn_after_race() {
    let store = Arc::new(TableManager::new());
    let alice = TableSession::create(store.clone(), table(3), SessionConfig::default())
        .await
        .unwrap();
    let bob = TableSession::join(store, alice.table_id().clone(), SessionConfig::default())
        .await
        .unwrap();

    alice.start_hand(Some(0)).await.unwrap();
    alice.act(0, Action::Call).await.unwrap();

    // Seat 0 already acted, so acting for it again is out of turn.
    let err = bob.act(0, Action::Call).await.unwrap_err();
    assert_eq!(err, TableError::InvalidAction(InvalidActionReason::OutOfTurn));

    let transition = bob.act_current(Action::Call).await.unwrap();
    assert_eq!(transition.state.round, Round::Flop);
    assert_eq!(transition.state.to_act, Some(0));
}

#[tokio::test]
async fn test_subscribers_see_every_commit_in_order() {
    let store = Arc::new(TableManager::new());
    let session = TableSession::create(store, table(2), SessionConfig::default())
        .await
        .unwrap();
    let mut updates = session.watch().await.unwrap();

    let first = updates.recv().await.unwrap();
    assert_eq!(first.version, 0);

    session.start_hand(Some(0)).await.unwrap();
    session.act(0, Action::Fold).await.unwrap();

    let started = updates.recv().await.unwrap();
    assert_eq!(started.version, 1);
    assert!(started.hand_active());

    let folded = updates.recv().await.unwrap();
    assert_eq!(folded.version, 2);
    assert_eq!(folded.players[1].chips, 105);
}

#[tokio::test]
async fn test_full_hand_through_session() {
    let store = Arc::new(TableManager::new());
    let session = TableSession::create(store, table(2), SessionConfig::default())
        .await
        .unwrap();

    session.start_hand(Some(0)).await.unwrap();
    session.act_current(Action::AllIn).await.unwrap();
    let transition = session.act_current(Action::Call).await.unwrap();
    assert!(transition.state.phase.is_showdown_pending());

    let transition = session
        .distribute_pot(vec![Award::new(0, 100), Award::new(1, 100)])
        .await
        .unwrap();
    assert_eq!(transition.state.players[0].chips, 100);
    assert_eq!(transition.state.players[1].chips, 100);

    let err = session.buy_in(0).await.unwrap_err();
    assert_eq!(err, TableError::AlreadyFunded { seat: 0, chips: 100 });
}

#[tokio::test]
async fn test_expired_table_is_terminal() {
    let store = Arc::new(TableManager::new());
    let session = TableSession::create(store.clone(), table(2), SessionConfig::default())
        .await
        .unwrap();

    let swept = store.sweep_expired(Utc::now() + Duration::hours(25)).await;
    assert_eq!(swept, 1);

    let err = session.snapshot().await.unwrap_err();
    assert!(err.is_terminal());
    assert!(matches!(err, TableError::TableNotFound(_)));
}

#[tokio::test]
async fn test_store_refuses_already_expired_table() {
    let store = Arc::new(TableManager::new());
    let config = TableConfig::new(2, 100, 5, Utc::now() - Duration::hours(23)).unwrap();
    let mut state = TableState::with_default_players(config).unwrap();
    let session = TableSession::create(store.clone(), state.clone(), SessionConfig::default())
        .await
        .unwrap();
    assert!(session.snapshot().await.is_ok());

    state.config.expires_at = Utc::now() - Duration::seconds(1);
    let err = store.create(state).await.unwrap_err();
    assert_eq!(err, TableError::TableExpired);
}

#[tokio::test]
async fn test_invalid_intent_never_reaches_the_store() {
    let store = Arc::new(TableManager::new());
    let session = TableSession::create(store, table(2), SessionConfig::default())
        .await
        .unwrap();

    let err = session
        .submit(Intent::Act {
            seat: 0,
            action: Action::Check,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TableError::InvalidAction(InvalidActionReason::NoActiveHand)
    );
    assert_eq!(session.snapshot().await.unwrap().version, 0);
}
