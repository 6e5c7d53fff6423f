//! Integration tests for the HTTP API.
//!
//! Each test starts a real server on a free port, backed by the
//! in-memory record store and a pinned LLM provider (disabled, so no
//! test touches the network), then drives it with reqwest.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use campus_desk::config::Config;
use campus_desk::llm::{LlmClient, Provider, NOT_CONFIGURED_MESSAGE};
use campus_desk::models::{Collection, ListField, RawRecord, Record};
use campus_desk::normalize::GREETING_REPLY;
use campus_desk::server::run_server_with_backends;
use campus_desk::store::memory::MemoryStore;
use campus_desk::store::RecordStore;
use serde_json::{json, Value};

// ─── Helpers ────────────────────────────────────────────────────────

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn faculty_record(
    name: &str,
    designation: &str,
    department: &str,
    courses: &[&str],
) -> Record {
    Record::from_raw(
        RawRecord {
            name: Some(name.into()),
            designation: Some(designation.into()),
            department: Some(department.into()),
            course_list: ListField::Many(courses.iter().map(|c| c.to_string()).collect()),
            ..Default::default()
        },
        Collection::Faculty,
    )
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.seed(
        Collection::Faculty,
        vec![
            faculty_record(
                "Anita Rao",
                "Professor",
                "Computer Science",
                &["Operating Systems", "Distributed Systems"],
            ),
            faculty_record(
                "Vikram Shah",
                "Assistant Professor",
                "Mechanical Engineering",
                &["Thermodynamics"],
            ),
        ],
    );
    store
}

/// Start a server on a free port with the given store and a disabled
/// LLM provider. Returns the base URL and the task handle to abort.
async fn spawn_server(mut config: Config, store: MemoryStore) -> (String, tokio::task::JoinHandle<()>) {
    let port = find_free_port();
    config.server.bind = format!("127.0.0.1:{}", port);

    let store: Arc<dyn RecordStore> = Arc::new(store);
    let llm = Arc::new(LlmClient::with_provider(Provider::Disabled, &config).unwrap());

    let server_config = config.clone();
    let handle = tokio::spawn(async move {
        run_server_with_backends(&server_config, store, llm).await.ok();
    });

    wait_for_server(port).await;
    (format!("http://127.0.0.1:{}", port), handle)
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

// ─── /health ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_reports_version() {
    let (base, handle) = spawn_server(Config::default(), MemoryStore::new()).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    handle.abort();
}

// ─── /ask ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ask_requires_question() {
    let (base, handle) = spawn_server(Config::default(), MemoryStore::new()).await;
    let client = reqwest::Client::new();
    let url = format!("{}/ask", base);

    let resp = client.post(&url).json(&json!({})).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    // Whitespace-only is empty too
    let resp = client
        .post(&url)
        .json(&json!({"question": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    handle.abort();
}

#[tokio::test]
async fn test_ask_rejects_wrong_method() {
    let (base, handle) = spawn_server(Config::default(), MemoryStore::new()).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/ask", base)).send().await.unwrap();
    assert_eq!(resp.status(), 405);

    handle.abort();
}

#[tokio::test]
async fn test_ask_greets_without_touching_backends() {
    let (base, handle) = spawn_server(Config::default(), MemoryStore::new()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({"question": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["answer"], GREETING_REPLY);
    assert_eq!(body["source"], "generic");

    handle.abort();
}

#[tokio::test]
async fn test_ask_answers_from_records() {
    let (base, handle) = spawn_server(Config::default(), seeded_store()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({"question": "who teaches operating systems"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["source"], "faculty");
    let answer = body["answer"].as_str().unwrap();
    assert!(answer.contains("Anita Rao"), "answer: {}", answer);
    assert!(answer.contains("Operating Systems"), "answer: {}", answer);
    // No debug unless requested
    assert!(body.get("debug").is_none());

    handle.abort();
}

#[tokio::test]
async fn test_ask_debug_carries_diagnostics() {
    let (base, handle) = spawn_server(Config::default(), seeded_store()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({"question": "Who teaches Operating Systems?", "debug": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let debug = &body["debug"];
    assert!(debug["request_id"].as_str().is_some());
    assert_eq!(debug["normalized"], "who teaches operating systems");
    assert_eq!(debug["intent"], "people");
    assert!(debug["elapsed_ms"].as_u64().is_some());

    handle.abort();
}

#[tokio::test]
async fn test_ask_suggests_on_near_tie() {
    let store = MemoryStore::new();
    store.seed(
        Collection::Faculty,
        vec![
            faculty_record("Ravi Kumar", "Professor", "Computer Science", &[]),
            faculty_record("Ravi Sharma", "Professor", "Electronics", &[]),
        ],
    );
    let (base, handle) = spawn_server(Config::default(), store).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({"question": "ravi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 2);
    assert!(body["answer"].as_str().unwrap().contains("Did you mean"));

    handle.abort();
}

#[tokio::test]
async fn test_ask_degrades_when_nothing_matches() {
    // Placements is never seeded, and the LLM provider is disabled.
    let (base, handle) = spawn_server(Config::default(), seeded_store()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({"question": "what are the placement statistics"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["source"], "generic");
    assert_eq!(body["answer"], NOT_CONFIGURED_MESSAGE);

    handle.abort();
}

// ─── /describe-image ────────────────────────────────────────────────

#[tokio::test]
async fn test_describe_image_requires_payload() {
    let (base, handle) = spawn_server(Config::default(), MemoryStore::new()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/describe-image", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    handle.abort();
}

#[tokio::test]
async fn test_describe_image_rejects_garbage() {
    let (base, handle) = spawn_server(Config::default(), MemoryStore::new()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/describe-image", base))
        .json(&json!({"image": "!!!not-base64!!!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    handle.abort();
}

#[tokio::test]
async fn test_describe_image_enforces_size_cap() {
    let mut config = Config::default();
    config.server.max_image_bytes = 16;
    let (base, handle) = spawn_server(config, MemoryStore::new()).await;
    let client = reqwest::Client::new();

    let payload = STANDARD.encode([0u8; 32]);
    let resp = client
        .post(format!("{}/describe-image", base))
        .json(&json!({"image": payload}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "payload_too_large");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("32 bytes"), "message: {}", message);
    assert!(message.contains("16 byte"), "message: {}", message);

    handle.abort();
}

#[tokio::test]
async fn test_describe_image_accepts_in_cap_payload() {
    // 3 MiB decodes to ~4 MiB of base64, well past framework defaults but
    // inside the configured cap. Must reach the handler, not a 413.
    let (base, handle) = spawn_server(Config::default(), MemoryStore::new()).await;
    let client = reqwest::Client::new();

    let payload = STANDARD.encode(vec![0u8; 3 * 1024 * 1024]);
    let resp = client
        .post(format!("{}/describe-image", base))
        .json(&json!({"image": payload}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["source"], "generic");
    assert_eq!(body["answer"], NOT_CONFIGURED_MESSAGE);

    handle.abort();
}

#[tokio::test]
async fn test_describe_image_rejects_over_cap_payload() {
    // Just past the default cap: the rejection must still be the JSON
    // error envelope with the byte counts, not a bare framework response.
    let (base, handle) = spawn_server(Config::default(), MemoryStore::new()).await;
    let client = reqwest::Client::new();

    let cap = Config::default().server.max_image_bytes;
    let decoded = cap + 4096;
    let payload = STANDARD.encode(vec![0u8; decoded]);
    let resp = client
        .post(format!("{}/describe-image", base))
        .json(&json!({"image": payload}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "payload_too_large");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains(&format!("{} bytes", decoded)), "message: {}", message);
    assert!(message.contains(&format!("{} byte", cap)), "message: {}", message);

    handle.abort();
}

#[tokio::test]
async fn test_describe_image_degrades_without_provider() {
    let (base, handle) = spawn_server(Config::default(), MemoryStore::new()).await;
    let client = reqwest::Client::new();

    let payload = format!("data:image/png;base64,{}", STANDARD.encode(b"tiny"));
    let resp = client
        .post(format!("{}/describe-image", base))
        .json(&json!({"image": payload}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["source"], "generic");
    assert_eq!(body["answer"], NOT_CONFIGURED_MESSAGE);

    handle.abort();
}

// ─── /generate-image and /generate-audio ────────────────────────────

#[tokio::test]
async fn test_generate_image_requires_prompt() {
    let (base, handle) = spawn_server(Config::default(), MemoryStore::new()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/generate-image", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    handle.abort();
}

#[tokio::test]
async fn test_generate_image_reports_missing_provider() {
    let (base, handle) = spawn_server(Config::default(), MemoryStore::new()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/generate-image", base))
        .json(&json!({"prompt": "a campus map"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "provider_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("not configured"));

    handle.abort();
}

#[tokio::test]
async fn test_generate_audio_requires_text() {
    let (base, handle) = spawn_server(Config::default(), MemoryStore::new()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/generate-audio", base))
        .json(&json!({"text": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    handle.abort();
}
