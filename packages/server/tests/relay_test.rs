//! Integration tests for the signaling relay.
//!
//! Each test starts the relay in-process on an ephemeral port and talks to it
//! over real WebSocket and HTTP connections.

use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt};
use relaycast_server::{ServerConfig, build_server};
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Helper struct to manage the relay lifecycle
struct TestRelay {
    addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

impl TestRelay {
    async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    async fn start_with(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = build_server(&config);
        tokio::spawn(async move {
            let _ = server
                .serve(listener, async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });
        Self {
            addr,
            _shutdown: shutdown_tx,
        }
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    async fn get_json(&self, path: &str) -> Value {
        reqwest::get(format!("http://{}{}", self.addr, path))
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    /// Open a connection and wait until the relay has registered it.
    async fn connect(&self, expected_count: u64) -> TestClient {
        let (ws, _) = connect_async(self.ws_url()).await.unwrap();
        let mut client = TestClient { ws };
        assert_eq!(
            client.recv().await,
            json!({"event": "update-viewers", "data": expected_count})
        );
        client
    }

    /// Id of the current broadcaster.
    async fn broadcaster_id(&self) -> String {
        let status = self.get_json("/api/status").await;
        status["broadcaster"].as_str().unwrap().to_string()
    }

    /// Send `broadcaster` from `client` and wait until the slot changes hands.
    async fn announce(&self, client: &mut TestClient) -> String {
        let previous = self.get_json("/api/status").await["broadcaster"].clone();
        client.send(json!({"event": "broadcaster"})).await;
        for _ in 0..100 {
            let current = self.get_json("/api/status").await["broadcaster"].clone();
            if let Some(id) = current.as_str()
                && current != previous
            {
                return id.to_string();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("broadcaster announcement was not applied");
    }
}

/// Helper struct wrapping one participant's WebSocket
struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl TestClient {
    async fn send(&mut self, frame: Value) {
        self.ws.send(Message::text(frame.to_string())).await.unwrap();
    }

    async fn send_raw(&mut self, frame: &str) {
        self.ws.send(Message::text(frame.to_string())).await.unwrap();
    }

    /// Next text frame, as JSON
    async fn recv(&mut self) -> Value {
        self.try_recv(RECV_TIMEOUT)
            .await
            .expect("expected a frame from the relay")
    }

    async fn try_recv(&mut self, timeout: Duration) -> Option<Value> {
        loop {
            let msg = tokio::time::timeout(timeout, self.ws.next()).await.ok()??;
            match msg.ok()? {
                Message::Text(text) => return serde_json::from_str(text.as_str()).ok(),
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    /// Next frame whose event is `event`, skipping viewer count updates
    async fn recv_event(&mut self, event: &str) -> Value {
        loop {
            let frame = self.recv().await;
            if frame["event"] == event {
                return frame;
            }
            assert_eq!(
                frame["event"], "update-viewers",
                "unexpected frame while waiting for {}: {}",
                event, frame
            );
        }
    }

    /// Every frame received until the connection stays quiet
    async fn drain(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Some(frame) = self.try_recv(QUIET_PERIOD).await {
            frames.push(frame);
        }
        frames
    }

    async fn close(mut self) {
        self.ws.close(None).await.unwrap();
    }
}

fn events(frames: &[Value], name: &str) -> Vec<Value> {
    frames
        .iter()
        .filter(|frame| frame["event"] == name)
        .cloned()
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    // テスト項目: ヘルスチェックが ok を返す
    // given (前提条件):
    let relay = TestRelay::start().await;

    // when (操作):
    let body = relay.get_json("/api/health").await;

    // then (期待する結果):
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_kth_open_broadcasts_k_and_close_decrements() {
    // テスト項目: K 番目の接続で全員に K が届き、切断で減った値が届く
    // given (前提条件):
    let relay = TestRelay::start().await;

    // when (操作):
    let mut a = relay.connect(1).await;
    let mut b = relay.connect(2).await;
    let c = relay.connect(3).await;

    // then (期待する結果):
    assert_eq!(a.recv().await, json!({"event": "update-viewers", "data": 2}));
    assert_eq!(a.recv().await, json!({"event": "update-viewers", "data": 3}));
    assert_eq!(b.recv().await, json!({"event": "update-viewers", "data": 3}));

    // when (操作): 3 人目が切断
    c.close().await;

    // then (期待する結果):
    assert_eq!(a.recv().await, json!({"event": "update-viewers", "data": 2}));
    assert_eq!(b.recv().await, json!({"event": "update-viewers", "data": 2}));
}

#[tokio::test]
async fn test_watcher_without_broadcaster_is_dropped() {
    // テスト項目: broadcaster 宣言がなければ watcher は誰にも届かない
    // given (前提条件):
    let relay = TestRelay::start().await;
    let mut idle = relay.connect(1).await;
    let mut viewer = relay.connect(2).await;

    // when (操作):
    viewer.send(json!({"event": "watcher"})).await;

    // then (期待する結果):
    let frames = idle.drain().await;
    assert!(events(&frames, "watcher").is_empty());
    assert!(events(&frames, "offer").is_empty());
    assert!(viewer.drain().await.is_empty());
}

#[tokio::test]
async fn test_each_watcher_gets_exactly_one_offer() {
    // テスト項目: n 人の viewer の watcher に対して、broadcaster の ID 付きの offer がちょうど n 件届く
    // given (前提条件):
    let relay = TestRelay::start().await;
    let mut broadcaster = relay.connect(1).await;
    relay.announce(&mut broadcaster).await;
    let mut viewers = Vec::new();
    for k in 2..=4 {
        let mut viewer = relay.connect(k).await;
        viewer.send(json!({"event": "watcher"})).await;
        viewers.push(viewer);
    }

    // when (操作): broadcaster は受け取った watcher ごとに offer を返す
    let mut viewer_ids = Vec::new();
    for _ in 0..3 {
        let watcher = broadcaster.recv_event("watcher").await;
        let viewer_id = watcher["data"].as_str().unwrap().to_string();
        broadcaster
            .send(json!({"event": "offer", "data": [viewer_id, {"sdp": viewer_id}]}))
            .await;
        viewer_ids.push(viewer_id);
    }

    // then (期待する結果):
    let broadcaster_id = relay.broadcaster_id().await;
    viewer_ids.sort();
    viewer_ids.dedup();
    assert_eq!(viewer_ids.len(), 3);
    for viewer in viewers.iter_mut() {
        let offers = events(&viewer.drain().await, "offer");
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0]["data"][0], broadcaster_id.as_str());
    }
}

#[tokio::test]
async fn test_answer_and_candidates_reach_broadcaster() {
    // テスト項目: answer と candidate は送信者の ID 付きで broadcaster に届く
    // given (前提条件):
    let relay = TestRelay::start().await;
    let mut broadcaster = relay.connect(1).await;
    relay.announce(&mut broadcaster).await;
    let mut viewer = relay.connect(2).await;
    viewer.send(json!({"event": "watcher"})).await;
    let viewer_id = broadcaster.recv_event("watcher").await["data"].clone();
    let broadcaster_id = relay.broadcaster_id().await;

    // when (操作):
    viewer
        .send(json!({"event": "answer", "data": [broadcaster_id, {"type": "answer"}]}))
        .await;
    viewer
        .send(json!({"event": "candidate", "data": [broadcaster_id, {"candidate": "c1"}]}))
        .await;

    // then (期待する結果):
    assert_eq!(
        broadcaster.recv_event("answer").await,
        json!({"event": "answer", "data": [viewer_id, {"type": "answer"}]})
    );
    assert_eq!(
        broadcaster.recv_event("candidate").await,
        json!({"event": "candidate", "data": [viewer_id, {"candidate": "c1"}]})
    );
}

#[tokio::test]
async fn test_candidate_to_missing_target_is_dropped() {
    // テスト項目: 存在しない宛先への candidate は配送されず、送信者の接続も維持される
    // given (前提条件):
    let relay = TestRelay::start().await;
    let mut sender = relay.connect(1).await;
    let mut other = relay.connect(2).await;
    sender.recv().await;

    // when (操作):
    sender
        .send(json!({"event": "candidate", "data": ["ghost", {"candidate": "c"}]}))
        .await;
    sender
        .send(json!({"event": "send-message", "data": "still here"}))
        .await;

    // then (期待する結果):
    assert_eq!(
        sender.recv().await,
        json!({"event": "new-message", "data": "still here"})
    );
    assert_eq!(
        other.recv().await,
        json!({"event": "new-message", "data": "still here"})
    );
}

#[tokio::test]
async fn test_send_message_reaches_everyone_including_sender() {
    // テスト項目: チャットは送信者を含む全員に届く
    // given (前提条件):
    let relay = TestRelay::start().await;
    let mut a = relay.connect(1).await;
    let mut b = relay.connect(2).await;
    a.recv().await;

    // when (操作):
    a.send(json!({"event": "send-message", "data": "hello"})).await;

    // then (期待する結果):
    let expected = json!({"event": "new-message", "data": "hello"});
    assert_eq!(a.recv().await, expected);
    assert_eq!(b.recv().await, expected);
}

#[tokio::test]
async fn test_closing_viewer_notifies_broadcaster_once() {
    // テスト項目: viewer の切断で broadcaster に disconnectPeer がちょうど一件届く
    // given (前提条件):
    let relay = TestRelay::start().await;
    let mut broadcaster = relay.connect(1).await;
    relay.announce(&mut broadcaster).await;
    let mut viewer = relay.connect(2).await;
    viewer.send(json!({"event": "watcher"})).await;
    let viewer_id = broadcaster.recv_event("watcher").await["data"].clone();

    // when (操作):
    viewer.close().await;

    // then (期待する結果):
    let frames = broadcaster.drain().await;
    assert_eq!(
        events(&frames, "disconnectPeer"),
        vec![json!({"event": "disconnectPeer", "data": viewer_id})]
    );
    assert_eq!(
        events(&frames, "update-viewers"),
        vec![json!({"event": "update-viewers", "data": 1})]
    );
}

#[tokio::test]
async fn test_closing_broadcaster_notifies_its_viewers() {
    // テスト項目: broadcaster の切断で audience の viewer に disconnectPeer が届く
    // given (前提条件):
    let relay = TestRelay::start().await;
    let mut broadcaster = relay.connect(1).await;
    relay.announce(&mut broadcaster).await;
    let mut viewer = relay.connect(2).await;
    viewer.send(json!({"event": "watcher"})).await;
    broadcaster.recv_event("watcher").await;
    let broadcaster_id = relay.broadcaster_id().await;

    // when (操作):
    broadcaster.close().await;

    // then (期待する結果):
    assert_eq!(
        viewer.recv_event("disconnectPeer").await,
        json!({"event": "disconnectPeer", "data": broadcaster_id})
    );
    let status = relay.get_json("/api/status").await;
    assert_eq!(status["broadcaster"], Value::Null);
}

#[tokio::test]
async fn test_takeover_notifies_displaced_side_before_announce() {
    // テスト項目: 2 人目の broadcaster 宣言で旧 broadcaster と viewer に takeover、続いて broadcaster が届く
    // given (前提条件):
    let relay = TestRelay::start().await;
    let mut first = relay.connect(1).await;
    relay.announce(&mut first).await;
    let mut viewer = relay.connect(2).await;
    viewer.send(json!({"event": "watcher"})).await;
    first.recv_event("watcher").await;
    let mut second = relay.connect(3).await;
    first.recv().await;
    viewer.recv().await;

    // when (操作):
    let second_id = relay.announce(&mut second).await;

    // then (期待する結果):
    for client in [&mut first, &mut viewer] {
        assert_eq!(
            client.recv().await,
            json!({"event": "takeover", "data": second_id})
        );
        assert_eq!(client.recv().await, json!({"event": "broadcaster"}));
    }
    assert!(second.drain().await.is_empty());
}

#[tokio::test]
async fn test_takeover_notice_disabled() {
    // テスト項目: 通知を無効にすると takeover は送られない
    // given (前提条件):
    let relay = TestRelay::start_with(ServerConfig {
        takeover_notice: false,
        ..ServerConfig::default()
    })
    .await;
    let mut first = relay.connect(1).await;
    relay.announce(&mut first).await;
    let mut second = relay.connect(2).await;
    first.recv().await;

    // when (操作):
    relay.announce(&mut second).await;

    // then (期待する結果):
    assert_eq!(first.drain().await, vec![json!({"event": "broadcaster"})]);
}

#[tokio::test]
async fn test_displaced_broadcaster_close_reaches_its_viewers_without_notice() {
    // テスト項目: 通知無効で乗っ取られた旧 broadcaster が切断すると、その viewer に disconnectPeer が届く
    // given (前提条件):
    let relay = TestRelay::start_with(ServerConfig {
        takeover_notice: false,
        ..ServerConfig::default()
    })
    .await;
    let mut first = relay.connect(1).await;
    let first_id = relay.announce(&mut first).await;
    let mut viewer = relay.connect(2).await;
    viewer.send(json!({"event": "watcher"})).await;
    first.recv_event("watcher").await;
    let mut second = relay.connect(3).await;
    let second_id = relay.announce(&mut second).await;
    viewer.recv_event("broadcaster").await;

    // when (操作):
    first.close().await;

    // then (期待する結果):
    let frames = viewer.drain().await;
    assert_eq!(
        events(&frames, "disconnectPeer"),
        vec![json!({"event": "disconnectPeer", "data": first_id})]
    );
    assert!(events(&frames, "takeover").is_empty());
    assert_eq!(relay.broadcaster_id().await, second_id);
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    // テスト項目: パースできないフレームは捨てられ、接続は維持される
    // given (前提条件):
    let relay = TestRelay::start().await;
    let mut client = relay.connect(1).await;

    // when (操作):
    client.send_raw("not json").await;
    client.send_raw(r#"{"event":"upload","data":{}}"#).await;
    client
        .send(json!({"event": "send-message", "data": "ok"}))
        .await;

    // then (期待する結果):
    assert_eq!(
        client.recv().await,
        json!({"event": "new-message", "data": "ok"})
    );
}

#[tokio::test]
async fn test_status_reports_roles_sorted_by_id() {
    // テスト項目: status は接続を ID 順にロール付きで返す
    // given (前提条件):
    let relay = TestRelay::start().await;
    let mut broadcaster = relay.connect(1).await;
    relay.announce(&mut broadcaster).await;
    let mut viewer = relay.connect(2).await;
    viewer.send(json!({"event": "watcher"})).await;
    broadcaster.recv_event("watcher").await;

    // when (操作):
    let status = relay.get_json("/api/status").await;

    // then (期待する結果):
    assert_eq!(status["viewers"], 2);
    let connections = status["connections"].as_array().unwrap();
    assert_eq!(connections.len(), 2);
    assert!(connections[0]["id"].as_str() < connections[1]["id"].as_str());
    let mut roles: Vec<&str> = connections
        .iter()
        .map(|c| c["role"].as_str().unwrap())
        .collect();
    roles.sort();
    assert_eq!(roles, vec!["broadcaster", "viewer"]);
    assert!(connections[0]["connected_at"].as_str().unwrap().ends_with('Z'));
}
