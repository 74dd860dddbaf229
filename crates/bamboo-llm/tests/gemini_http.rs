//! End-to-end tests of the Gemini backend against a local HTTP responder.

use bamboo_config::Config;
use bamboo_llm::{LlmError, LlmInvocation, Message, RetryPolicy, Schema, from_config};
use serial_test::serial;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const KEY_ENV: &str = "BAMBOO_TEST_GEMINI_KEY";

/// Serve the canned `(status, body)` responses one connection each and
/// forward every raw request received.
async fn serve(responses: Vec<(u16, String)>) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let _ = tx.send(request);
            let reply = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    (format!("http://{addr}/v1beta"), rx)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .find_map(|l| {
                    let lower = l.to_ascii_lowercase();
                    lower
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn config(base_url: &str) -> Config {
    Config::builder()
        .api_key_env(KEY_ENV)
        .base_url(base_url)
        .model("gemini-test")
        .build()
        .unwrap()
}

fn invocation() -> LlmInvocation {
    LlmInvocation::new(
        "feed",
        "gemini-test",
        Duration::from_secs(10),
        vec![Message::user("게시글 써줘")],
    )
    .with_schema(Schema::object().property("title", Schema::string()))
}

#[tokio::test]
#[serial]
async fn test_structured_call_round_trip() {
    let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"title\":\"급식 후기\"}"}]},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":12,"candidatesTokenCount":5}}"#;
    let (url, mut requests) = serve(vec![(200, body.to_string())]).await;
    unsafe {
        std::env::set_var(KEY_ENV, "test-key-value");
    }

    let backend = from_config(&config(&url)).unwrap();
    let result = backend.invoke(invocation()).await.unwrap();

    assert_eq!(result.raw_response, r#"{"title":"급식 후기"}"#);
    assert_eq!(result.provider, "gemini");
    assert_eq!(result.tokens_input, Some(12));
    assert_eq!(result.tokens_output, Some(5));

    let request = requests.recv().await.unwrap();
    assert!(request.starts_with("POST /v1beta/models/gemini-test:generateContent"));
    assert!(request.to_ascii_lowercase().contains("x-goog-api-key: test-key-value"));
    assert!(request.contains("\"responseMimeType\":\"application/json\""));
    assert!(request.contains("\"responseSchema\""));

    unsafe {
        std::env::remove_var(KEY_ENV);
    }
}

#[tokio::test]
#[serial]
async fn test_quota_status_is_retried_by_policy_only() {
    let quota = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
    let ok = r#"{"candidates":[{"content":{"parts":[{"text":"{}"}]}}]}"#;
    let (url, mut requests) =
        serve(vec![(429, quota.to_string()), (200, ok.to_string())]).await;
    unsafe {
        std::env::set_var(KEY_ENV, "test-key-value");
    }

    let backend = from_config(&config(&url)).unwrap();

    // A single invoke surfaces the 429 without retrying
    let err = backend.invoke(invocation()).await.unwrap_err();
    assert!(matches!(err, LlmError::ProviderQuota(_)));
    assert!(err.is_rate_limited());

    let policy = RetryPolicy::new(2, Duration::from_millis(1));
    let result = policy
        .execute_with_retry("feed", || backend.invoke(invocation()))
        .await
        .unwrap();
    assert_eq!(result.raw_response, "{}");

    assert!(requests.recv().await.is_some());
    assert!(requests.recv().await.is_some());

    unsafe {
        std::env::remove_var(KEY_ENV);
    }
}

#[tokio::test]
#[serial]
async fn test_auth_failure_maps_to_provider_auth() {
    let (url, _requests) = serve(vec![(403, r#"{"error":{"code":403}}"#.to_string())]).await;
    unsafe {
        std::env::set_var(KEY_ENV, "test-key-value");
    }

    let backend = from_config(&config(&url)).unwrap();
    let err = backend.invoke(invocation()).await.unwrap_err();
    assert!(matches!(err, LlmError::ProviderAuth(_)));
    assert!(!err.is_rate_limited());

    unsafe {
        std::env::remove_var(KEY_ENV);
    }
}

#[test]
#[serial]
fn test_missing_key_is_misconfiguration() {
    unsafe {
        std::env::remove_var(KEY_ENV);
    }
    let err = from_config(&config("http://127.0.0.1:9/v1beta"))
        .err()
        .unwrap();
    assert!(matches!(err, LlmError::Misconfiguration(ref m) if m.contains(KEY_ENV)));
}

#[test]
#[serial]
fn test_unknown_provider_is_unsupported() {
    let mut config = Config::defaults();
    config.llm.provider = Some("openrouter".to_string());
    let err = from_config(&config).err().unwrap();
    assert!(matches!(err, LlmError::Unsupported(_)));
}
