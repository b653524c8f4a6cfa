//! The table store contract and its wire types.
//!
//! A store owns the canonical [`TableState`] of every table it knows about.
//! Clients read snapshots, commit patches guarded by the version they read,
//! and subscribe to a stream of full snapshots in commit order.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use url::Url;
use uuid::Uuid;

use crate::game::{
    entities::{Chips, LastAction, Player, Round, SeatIndex},
    errors::TableResult,
    state_machine::TableState,
    states::HandPhase,
};

/// Query parameter carrying the table id in a share link.
pub const SHARE_QUERY_KEY: &str = "table";

/// Receiving end of a subscription. The current snapshot arrives first.
pub type SnapshotStream = mpsc::UnboundedReceiver<TableState>;

/// Opaque table identifier.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct TableId(String);

impl TableId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `base` with `?table=<id>` attached, replacing any existing query.
    pub fn share_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair(SHARE_QUERY_KEY, self.as_str());
        url
    }

    /// Pull the table id out of a share link.
    pub fn from_share_url(link: &str) -> Option<Self> {
        let url = Url::parse(link).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == SHARE_QUERY_KEY)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(Self)
    }
}

impl Default for TableId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TableId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Partial update of a table. Absent fields are left alone; present fields
/// overwrite what the store holds.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TablePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<Player>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pot: Option<Chips>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<Round>,
    /// `Some(None)` clears the seat to act.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub to_act: Option<Option<SeatIndex>>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub dealer: Option<Option<SeatIndex>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub betting_round: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<HandPhase>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_action: Option<Option<LastAction>>,
}

/// Keeps an explicit `null` as `Some(None)` so a patch can clear a field.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn changed<T: Clone + PartialEq>(before: &T, after: &T) -> Option<T> {
    (before != after).then(|| after.clone())
}

impl TablePatch {
    /// Only the fields that differ between `before` and `after`.
    pub fn diff(before: &TableState, after: &TableState) -> Self {
        Self {
            players: changed(&before.players, &after.players),
            pot: changed(&before.pot, &after.pot),
            round: changed(&before.round, &after.round),
            to_act: changed(&before.to_act, &after.to_act),
            dealer: changed(&before.dealer, &after.dealer),
            betting_round: changed(&before.betting_round, &after.betting_round),
            phase: changed(&before.phase, &after.phase),
            last_action: changed(&before.last_action, &after.last_action),
        }
    }

    /// Every mutable field of `state`.
    pub fn full(state: &TableState) -> Self {
        Self {
            players: Some(state.players.clone()),
            pot: Some(state.pot),
            round: Some(state.round),
            to_act: Some(state.to_act),
            dealer: Some(state.dealer),
            betting_round: Some(state.betting_round),
            phase: Some(state.phase),
            last_action: Some(state.last_action.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the present fields of `state`. The version is left to the
    /// caller.
    pub fn merge_into(self, state: &mut TableState) {
        if let Some(players) = self.players {
            state.players = players;
        }
        if let Some(pot) = self.pot {
            state.pot = pot;
        }
        if let Some(round) = self.round {
            state.round = round;
        }
        if let Some(to_act) = self.to_act {
            state.to_act = to_act;
        }
        if let Some(dealer) = self.dealer {
            state.dealer = dealer;
        }
        if let Some(betting_round) = self.betting_round {
            state.betting_round = betting_round;
        }
        if let Some(phase) = self.phase {
            state.phase = phase;
        }
        if let Some(last_action) = self.last_action {
            state.last_action = last_action;
        }
    }
}

impl TableState {
    /// JSON wire form of a snapshot.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Shared table storage with compare-and-set commits and snapshot fan-out.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Register a new table and return its id.
    async fn create(&self, initial: TableState) -> TableResult<TableId>;

    /// Current snapshot. Fails with `TableExpired` once the table is past
    /// its expiry.
    async fn snapshot(&self, table_id: &TableId) -> TableResult<TableState>;

    /// Merge `patch` if the table is still at `expected_version`, bump the
    /// version, and return the committed snapshot.
    async fn commit(
        &self,
        table_id: &TableId,
        expected_version: u64,
        patch: TablePatch,
    ) -> TableResult<TableState>;

    /// Stream of snapshots, starting with the current one.
    async fn subscribe(&self, table_id: &TableId) -> TableResult<SnapshotStream>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state_machine::Intent;
    use crate::table::config::TableConfig;
    use chrono::Utc;

    fn state() -> TableState {
        let config = TableConfig::new(3, 100, 5, Utc::now()).unwrap();
        TableState::with_default_players(config).unwrap()
    }

    #[test]
    fn test_share_url_both_ways() {
        let id = TableId::from("abc123");
        let base = Url::parse("https://tally.example/play?old=1").unwrap();
        let link = id.share_url(&base);
        assert_eq!(link.as_str(), "https://tally.example/play?table=abc123");
        assert_eq!(TableId::from_share_url(link.as_str()), Some(id));
    }

    #[test]
    fn test_from_share_url_without_table() {
        assert_eq!(TableId::from_share_url("https://tally.example/?x=1"), None);
        assert_eq!(TableId::from_share_url("https://tally.example/?table="), None);
        assert_eq!(TableId::from_share_url("not a url"), None);
    }

    #[test]
    fn test_table_ids_unique() {
        assert_ne!(TableId::new(), TableId::new());
    }

    #[test]
    fn test_diff_of_identical_states_is_empty() {
        let state = state();
        assert!(TablePatch::diff(&state, &state).is_empty());
    }

    #[test]
    fn test_diff_then_merge_reproduces_transition() {
        let before = state();
        let after = before
            .apply(&Intent::StartHand { dealer: Some(1) }, Utc::now())
            .unwrap()
            .state;
        let patch = TablePatch::diff(&before, &after);
        assert!(patch.to_act.is_some());
        assert!(patch.round.is_none());

        let mut merged = before.clone();
        patch.merge_into(&mut merged);
        assert_eq!(merged, after);
    }

    #[test]
    fn test_patch_json_omits_absent_fields() {
        let patch = TablePatch {
            pot: Some(15),
            ..TablePatch::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"pot":15}"#);
        let back: TablePatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patch);
    }

    #[test]
    fn test_patch_json_null_clears_field() {
        let patch: TablePatch = serde_json::from_str(r#"{"to_act":null}"#).unwrap();
        assert_eq!(patch.to_act, Some(None));
        assert_eq!(patch.dealer, None);
    }

    #[test]
    fn test_snapshot_json() {
        let state = state();
        let json = state.to_json().unwrap();
        assert!(json.contains("\"pre-flop\""));
        assert_eq!(TableState::from_json(&json).unwrap(), state);
    }
}
