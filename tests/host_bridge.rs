use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use presence_sync::bridge::{HostBridge, StorageBridge, PRESENCE_KEY_PREFIX, SHOW_BUTTON, SHOW_ON_PAUSE};
use presence_sync::player::{HostPlayerProvider, PlayerSnapshot, PlayerStateProvider};
use serde_json::{json, Value};
use tiny_http::{Header, Method, Response, Server};
use tokio_util::sync::CancellationToken;

/// Minimal stand-in for the host process
struct FakeHost {
    url: String,
    storage: Arc<Mutex<HashMap<String, Value>>>,
    player: Arc<Mutex<(u16, Value)>>,
}

fn json_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap()
}

fn spawn_host() -> FakeHost {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();

    let storage = Arc::new(Mutex::new(HashMap::new()));
    let player = Arc::new(Mutex::new((200, json!({"enabled": false}))));

    let host_storage = Arc::clone(&storage);
    let host_player = Arc::clone(&player);
    thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let path = request.url().to_string();
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body).ok();

            let (status, payload) = match (request.method(), path.as_str()) {
                (Method::Get, "/player") => host_player.lock().unwrap().clone(),
                (Method::Get, "/storage") => {
                    let values = host_storage.lock().unwrap().clone();
                    (200, json!(values))
                }
                (method, p) if p.starts_with("/storage/") => {
                    let key = p["/storage/".len()..].replace("%2F", "/");
                    if key == "broken" {
                        (500, json!({"error": "boom"}))
                    } else if *method == Method::Put {
                        let value: Value = serde_json::from_str(&body).unwrap();
                        host_storage.lock().unwrap().insert(key, value);
                        (200, json!({"ok": true}))
                    } else {
                        match host_storage.lock().unwrap().get(&key) {
                            Some(value) => (200, value.clone()),
                            None => (404, Value::Null),
                        }
                    }
                }
                _ => (404, Value::Null),
            };

            let response = Response::from_string(payload.to_string())
                .with_header(json_header())
                .with_status_code(status);
            let _ = request.respond(response);
        }
    });

    FakeHost {
        url: format!("http://127.0.0.1:{}", port),
        storage,
        player,
    }
}

fn bridge(host: &FakeHost) -> Arc<HostBridge> {
    Arc::new(HostBridge::new(&host.url, Duration::from_secs(2)).unwrap())
}

#[tokio::test]
async fn test_player_snapshot_from_host() {
    let host = spawn_host();
    *host.player.lock().unwrap() = (
        200,
        json!({
            "enabled": true,
            "data": {
                "isPlaying": true,
                "trackMeta": {
                    "id": 42,
                    "title": "Song",
                    "coverUri": "avatars.example.net/%%",
                    "artists": [{"name": "Artist"}]
                },
                "playback": {"position": 30, "duration": 180}
            }
        }),
    );

    let provider = HostPlayerProvider::new(bridge(&host));
    let PlayerSnapshot::Enabled(state) = provider.snapshot().await else {
        panic!("expected an enabled player");
    };
    assert!(state.is_playing);
    assert_eq!(state.track.id, "42");
    assert_eq!(state.playback.duration_seconds, 180.0);
}

#[tokio::test]
async fn test_player_errors_become_disabled() {
    let host = spawn_host();
    *host.player.lock().unwrap() = (500, json!({"error": "not ready"}));
    let provider = HostPlayerProvider::new(bridge(&host));
    assert_eq!(provider.snapshot().await, PlayerSnapshot::Disabled);

    let unreachable = HostBridge::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap();
    let provider = HostPlayerProvider::new(Arc::new(unreachable));
    assert_eq!(provider.snapshot().await, PlayerSnapshot::Disabled);
}

#[tokio::test]
async fn test_storage_round_trip_through_host() {
    let host = spawn_host();
    let storage = StorageBridge::new(bridge(&host));

    assert!(!storage.get(&SHOW_ON_PAUSE).await);
    assert!(storage.set(&SHOW_ON_PAUSE, true).await);
    assert!(storage.get(&SHOW_ON_PAUSE).await);
    assert_eq!(
        host.storage.lock().unwrap().get("discordRPC/showOnPause"),
        Some(&json!(true))
    );
}

#[tokio::test]
async fn test_storage_failures_use_defaults() {
    let host = spawn_host();
    let storage = StorageBridge::new(bridge(&host));
    let broken = presence_sync::bridge::Key::new("broken", 3u32);

    assert_eq!(storage.get(&broken).await, 3);
    assert!(!storage.set(&broken, 4).await);

    let unreachable = HostBridge::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap();
    let storage = StorageBridge::new(Arc::new(unreachable));
    assert!(storage.get(&SHOW_BUTTON).await);
}

#[tokio::test]
async fn test_change_feed_notifies_subscribers() {
    let host = spawn_host();
    host.storage
        .lock()
        .unwrap()
        .insert("discordRPC/showButton".to_string(), json!(true));

    let bridge = bridge(&host);
    let cancel = CancellationToken::new();
    let feed = bridge.spawn_change_feed(Duration::from_millis(20), cancel.clone());

    let storage = StorageBridge::new(bridge);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let _subscription = storage.subscribe(
        |key| key.starts_with(PRESENCE_KEY_PREFIX),
        move |change| {
            let _ = tx.send(change.clone());
        },
    );

    // Let the feed take its baseline first
    tokio::time::sleep(Duration::from_millis(100)).await;
    host.storage
        .lock()
        .unwrap()
        .insert("discordRPC/showButton".to_string(), json!(false));
    host.storage
        .lock()
        .unwrap()
        .insert("theme/accent".to_string(), json!("#fff"));

    let change = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(change.key, "discordRPC/showButton");
    assert_eq!(change.value, json!(false));

    cancel.cancel();
    feed.await.unwrap();
}
