//! Hub State: the live connections, their roles and the broadcaster slot.
//!
//! The Hub is a plain value with no I/O. Every mutation returns the list of
//! connections that must be told about it so the caller can fan out after the
//! state change, in the same serialized step.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::{
    entity::Connection,
    error::HubError,
    value_object::{ConnectionId, Role, Timestamp},
};

/// Result of evicting a connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    /// The evicted connection.
    pub connection: Connection,
    /// Peers that must receive `disconnectPeer(connection.id)`.
    pub notify: Vec<ConnectionId>,
    /// Connection count after the eviction.
    pub remaining: usize,
}

/// Broadcaster displaced by a newer announcement.
#[derive(Debug, Clone, PartialEq)]
pub struct Takeover {
    pub previous: ConnectionId,
    /// Viewers that were routed to the previous broadcaster.
    pub audience: Vec<ConnectionId>,
}

/// Result of a broadcaster announcement.
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    /// Every connection except the announcer.
    pub recipients: Vec<ConnectionId>,
    pub takeover: Option<Takeover>,
}

/// Read-only copy of the Hub for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubSnapshot {
    pub connections: Vec<Connection>,
    pub current_broadcaster: Option<ConnectionId>,
}

impl HubSnapshot {
    pub fn viewer_count(&self) -> usize {
        self.connections.len()
    }
}

/// The process-wide Hub State.
///
/// Invariant: `current_broadcaster`, when set, names a connection in
/// `connections` whose role is [`Role::Broadcaster`].
#[derive(Debug, Clone, Default)]
pub struct Hub {
    connections: BTreeMap<ConnectionId, Connection>,
    current_broadcaster: Option<ConnectionId>,
    /// broadcaster -> viewers whose watch requests were routed to it
    audiences: HashMap<ConnectionId, BTreeSet<ConnectionId>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly opened channel and return the new connection count.
    pub fn open(&mut self, id: ConnectionId, connected_at: Timestamp) -> Result<usize, HubError> {
        if self.connections.contains_key(&id) {
            return Err(HubError::DuplicateConnection(id));
        }
        self.connections
            .insert(id.clone(), Connection::new(id, connected_at));
        Ok(self.connections.len())
    }

    /// Evict a closed channel.
    ///
    /// A departing broadcaster notifies its whole audience. Any other
    /// connection notifies the current broadcaster and every broadcaster
    /// whose audience lists it, each at most once.
    pub fn close(&mut self, id: &ConnectionId) -> Result<Departure, HubError> {
        let connection = self
            .connections
            .remove(id)
            .ok_or_else(|| HubError::ConnectionNotFound(id.clone()))?;

        let mut notify = BTreeSet::new();
        if connection.role == Role::Broadcaster {
            if self.current_broadcaster.as_ref() == Some(id) {
                self.current_broadcaster = None;
            }
            if let Some(audience) = self.audiences.remove(id) {
                notify.extend(
                    audience
                        .into_iter()
                        .filter(|viewer| self.connections.contains_key(viewer)),
                );
            }
        } else {
            if let Some(broadcaster) = &self.current_broadcaster {
                notify.insert(broadcaster.clone());
            }
            for (broadcaster, audience) in self.audiences.iter_mut() {
                if audience.remove(id) {
                    notify.insert(broadcaster.clone());
                }
            }
        }

        Ok(Departure {
            connection,
            notify: notify.into_iter().collect(),
            remaining: self.connections.len(),
        })
    }

    /// Make `id` the current broadcaster.
    ///
    /// An announcement from another connection replaces the current
    /// broadcaster unconditionally. The displaced one keeps its connection,
    /// role and audience until it closes; [`Takeover`] carries a copy of the
    /// audience.
    pub fn announce_broadcaster(&mut self, id: &ConnectionId) -> Result<Announcement, HubError> {
        self.connection_mut(id)?.assign_role(Role::Broadcaster)?;

        let takeover = match self.current_broadcaster.replace(id.clone()) {
            Some(previous) if &previous != id => {
                let audience = self.audience_of(&previous);
                Some(Takeover { previous, audience })
            }
            _ => None,
        };

        Ok(Announcement {
            recipients: self.ids_except(id),
            takeover,
        })
    }

    /// Mark `viewer` as a viewer and route its watch request.
    ///
    /// Returns the broadcaster to deliver the request to, or `None` when no
    /// broadcaster exists (the request is then dropped).
    pub fn request_watch(
        &mut self,
        viewer: &ConnectionId,
    ) -> Result<Option<ConnectionId>, HubError> {
        self.connection_mut(viewer)?.assign_role(Role::Viewer)?;

        let Some(broadcaster) = self.current_broadcaster.clone() else {
            return Ok(None);
        };
        self.audiences
            .entry(broadcaster.clone())
            .or_default()
            .insert(viewer.clone());
        Ok(Some(broadcaster))
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    #[cfg(test)]
    pub fn current_broadcaster(&self) -> Option<&ConnectionId> {
        self.current_broadcaster.as_ref()
    }

    #[cfg(test)]
    pub fn role_of(&self, id: &ConnectionId) -> Option<Role> {
        self.connections.get(id).map(|c| c.role)
    }

    /// All connection ids, in id order.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().cloned().collect()
    }

    /// All connection ids except `exclude`, in id order.
    pub fn ids_except(&self, exclude: &ConnectionId) -> Vec<ConnectionId> {
        self.connections
            .keys()
            .filter(|id| *id != exclude)
            .cloned()
            .collect()
    }

    /// Viewers whose watch requests were routed to `broadcaster`.
    pub fn audience_of(&self, broadcaster: &ConnectionId) -> Vec<ConnectionId> {
        self.audiences
            .get(broadcaster)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            connections: self.connections.values().cloned().collect(),
            current_broadcaster: self.current_broadcaster.clone(),
        }
    }

    fn connection_mut(&mut self, id: &ConnectionId) -> Result<&mut Connection, HubError> {
        self.connections
            .get_mut(id)
            .ok_or_else(|| HubError::ConnectionNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    fn hub_with(ids: &[&str]) -> Hub {
        let mut hub = Hub::new();
        for value in ids {
            hub.open(id(value), Timestamp::new(1000)).unwrap();
        }
        hub
    }

    #[test]
    fn test_open_returns_running_count() {
        // テスト項目: 接続を追加するたびに接続数が返される
        // given (前提条件):
        let mut hub = Hub::new();

        // when (操作):
        let first = hub.open(id("a"), Timestamp::new(1));
        let second = hub.open(id("b"), Timestamp::new(2));

        // then (期待する結果):
        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(2));
        assert_eq!(hub.role_of(&id("a")), Some(Role::Unknown));
    }

    #[test]
    fn test_open_duplicate_is_rejected() {
        // テスト項目: 同じ ID の二重登録は拒否される
        // given (前提条件):
        let mut hub = hub_with(&["a"]);

        // when (操作):
        let result = hub.open(id("a"), Timestamp::new(2));

        // then (期待する結果):
        assert_eq!(result, Err(HubError::DuplicateConnection(id("a"))));
        assert_eq!(hub.snapshot().viewer_count(), 1);
    }

    #[test]
    fn test_announce_broadcaster_targets_everyone_else() {
        // テスト項目: broadcaster 宣言は宣言者以外の全接続に配信される
        // given (前提条件):
        let mut hub = hub_with(&["b", "v1", "v2"]);

        // when (操作):
        let announcement = hub.announce_broadcaster(&id("b")).unwrap();

        // then (期待する結果):
        assert_eq!(announcement.recipients, vec![id("v1"), id("v2")]);
        assert_eq!(announcement.takeover, None);
        assert_eq!(hub.current_broadcaster(), Some(&id("b")));
        assert_eq!(hub.role_of(&id("b")), Some(Role::Broadcaster));
    }

    #[test]
    fn test_reannounce_is_not_a_takeover() {
        // テスト項目: 現在の broadcaster による再宣言は takeover にならない
        // given (前提条件):
        let mut hub = hub_with(&["b", "v"]);
        hub.announce_broadcaster(&id("b")).unwrap();
        hub.request_watch(&id("v")).unwrap();

        // when (操作):
        let announcement = hub.announce_broadcaster(&id("b")).unwrap();

        // then (期待する結果):
        assert_eq!(announcement.takeover, None);
        assert_eq!(hub.audience_of(&id("b")), vec![id("v")]);
    }

    #[test]
    fn test_second_broadcaster_takes_over_slot() {
        // テスト項目: 別の接続が broadcaster を宣言すると枠が上書きされ、旧 audience が返される
        // given (前提条件):
        let mut hub = hub_with(&["b1", "b2", "v"]);
        hub.announce_broadcaster(&id("b1")).unwrap();
        hub.request_watch(&id("v")).unwrap();

        // when (操作):
        let announcement = hub.announce_broadcaster(&id("b2")).unwrap();

        // then (期待する結果):
        assert_eq!(
            announcement.takeover,
            Some(Takeover {
                previous: id("b1"),
                audience: vec![id("v")],
            })
        );
        assert_eq!(hub.current_broadcaster(), Some(&id("b2")));
        assert_eq!(hub.role_of(&id("b1")), Some(Role::Broadcaster));
        assert_eq!(hub.audience_of(&id("b1")), vec![id("v")]);
    }

    #[test]
    fn test_displaced_broadcaster_close_still_notifies_its_audience() {
        // テスト項目: takeover された broadcaster が後で切断しても、旧 audience に disconnectPeer が届く
        // given (前提条件):
        let mut hub = hub_with(&["b1", "b2", "v"]);
        hub.announce_broadcaster(&id("b1")).unwrap();
        hub.request_watch(&id("v")).unwrap();
        hub.announce_broadcaster(&id("b2")).unwrap();

        // when (操作):
        let departure = hub.close(&id("b1")).unwrap();

        // then (期待する結果):
        assert_eq!(departure.notify, vec![id("v")]);
        assert_eq!(hub.current_broadcaster(), Some(&id("b2")));
        assert!(hub.audience_of(&id("b1")).is_empty());
    }

    #[test]
    fn test_viewer_cannot_announce_broadcaster() {
        // テスト項目: viewer になった接続は broadcaster を宣言できず、状態は変わらない
        // given (前提条件):
        let mut hub = hub_with(&["v"]);
        hub.request_watch(&id("v")).unwrap();

        // when (操作):
        let result = hub.announce_broadcaster(&id("v"));

        // then (期待する結果):
        assert!(matches!(result, Err(HubError::RoleConflict { .. })));
        assert_eq!(hub.current_broadcaster(), None);
    }

    #[test]
    fn test_watch_without_broadcaster_is_dropped() {
        // テスト項目: broadcaster 不在時の watch 要求は配送先なしになる
        // given (前提条件):
        let mut hub = hub_with(&["v"]);

        // when (操作):
        let result = hub.request_watch(&id("v"));

        // then (期待する結果):
        assert_eq!(result, Ok(None));
        assert_eq!(hub.role_of(&id("v")), Some(Role::Viewer));
    }

    #[test]
    fn test_watch_routes_to_current_broadcaster() {
        // テスト項目: watch 要求は現在の broadcaster に配送され、audience に登録される
        // given (前提条件):
        let mut hub = hub_with(&["b", "v"]);
        hub.announce_broadcaster(&id("b")).unwrap();

        // when (操作):
        let result = hub.request_watch(&id("v"));

        // then (期待する結果):
        assert_eq!(result, Ok(Some(id("b"))));
        assert_eq!(hub.audience_of(&id("b")), vec![id("v")]);
    }

    #[test]
    fn test_broadcaster_cannot_watch() {
        // テスト項目: broadcaster による watch 要求はロール衝突になる
        // given (前提条件):
        let mut hub = hub_with(&["b"]);
        hub.announce_broadcaster(&id("b")).unwrap();

        // when (操作):
        let result = hub.request_watch(&id("b"));

        // then (期待する結果):
        assert!(matches!(result, Err(HubError::RoleConflict { .. })));
    }

    #[test]
    fn test_close_viewer_notifies_current_broadcaster_once() {
        // テスト項目: viewer の切断は現在の broadcaster に一度だけ通知される
        // given (前提条件):
        let mut hub = hub_with(&["b", "v"]);
        hub.announce_broadcaster(&id("b")).unwrap();
        hub.request_watch(&id("v")).unwrap();

        // when (操作):
        let departure = hub.close(&id("v")).unwrap();

        // then (期待する結果):
        assert_eq!(departure.notify, vec![id("b")]);
        assert_eq!(departure.remaining, 1);
        assert!(hub.audience_of(&id("b")).is_empty());
    }

    #[test]
    fn test_close_unknown_role_still_notifies_broadcaster() {
        // テスト項目: ロール未宣言の接続の切断も broadcaster に通知される
        // given (前提条件):
        let mut hub = hub_with(&["b", "x"]);
        hub.announce_broadcaster(&id("b")).unwrap();

        // when (操作):
        let departure = hub.close(&id("x")).unwrap();

        // then (期待する結果):
        assert_eq!(departure.notify, vec![id("b")]);
        assert_eq!(departure.connection.role, Role::Unknown);
    }

    #[test]
    fn test_close_viewer_without_broadcaster_notifies_nobody() {
        // テスト項目: broadcaster 不在時の切断は誰にも通知されない
        // given (前提条件):
        let mut hub = hub_with(&["v1", "v2"]);

        // when (操作):
        let departure = hub.close(&id("v1")).unwrap();

        // then (期待する結果):
        assert!(departure.notify.is_empty());
        assert_eq!(departure.remaining, 1);
    }

    #[test]
    fn test_close_broadcaster_notifies_audience_and_clears_slot() {
        // テスト項目: broadcaster の切断で audience 全員に通知され、枠が空になる
        // given (前提条件):
        let mut hub = hub_with(&["b", "v1", "v2", "idle"]);
        hub.announce_broadcaster(&id("b")).unwrap();
        hub.request_watch(&id("v1")).unwrap();
        hub.request_watch(&id("v2")).unwrap();

        // when (操作):
        let departure = hub.close(&id("b")).unwrap();

        // then (期待する結果):
        assert_eq!(departure.notify, vec![id("v1"), id("v2")]);
        assert_eq!(hub.current_broadcaster(), None);
        assert_eq!(departure.remaining, 3);
    }

    #[test]
    fn test_close_viewer_after_takeover_notifies_each_broadcaster_once() {
        // テスト項目: takeover 後に再要求した viewer の切断は新旧の broadcaster にそれぞれ一度だけ通知される
        // given (前提条件):
        let mut hub = hub_with(&["b1", "b2", "v"]);
        hub.announce_broadcaster(&id("b1")).unwrap();
        hub.request_watch(&id("v")).unwrap();
        hub.announce_broadcaster(&id("b2")).unwrap();
        hub.request_watch(&id("v")).unwrap();

        // when (操作):
        let departure = hub.close(&id("v")).unwrap();

        // then (期待する結果):
        assert_eq!(departure.notify, vec![id("b1"), id("b2")]);
        assert!(hub.audience_of(&id("b1")).is_empty());
    }

    #[test]
    fn test_close_unknown_connection() {
        // テスト項目: 存在しない接続の切断はエラーになる
        // given (前提条件):
        let mut hub = Hub::new();

        // when (操作):
        let result = hub.close(&id("ghost"));

        // then (期待する結果):
        assert_eq!(result, Err(HubError::ConnectionNotFound(id("ghost"))));
    }

    #[test]
    fn test_snapshot_is_sorted_by_id() {
        // テスト項目: スナップショットは ID 順で現在の broadcaster を含む
        // given (前提条件):
        let mut hub = hub_with(&["c", "a", "b"]);
        hub.announce_broadcaster(&id("b")).unwrap();

        // when (操作):
        let snapshot = hub.snapshot();

        // then (期待する結果):
        let ids: Vec<&str> = snapshot.connections.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(snapshot.current_broadcaster, Some(id("b")));
        assert_eq!(snapshot.viewer_count(), 3);
    }
}
