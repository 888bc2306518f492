//! Telegram notifier against a local stand-in for the Bot API

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::routing::any;
use axum::Router;

use gabi::services::{Notifier, TelegramNotifier};

#[derive(Debug, Clone)]
struct Hit {
    method: Method,
    content_type: Option<String>,
    query: HashMap<String, String>,
    body: String,
}

#[derive(Clone)]
struct FakeBot {
    hits: Arc<Mutex<Vec<Hit>>>,
    /// Number of leading requests answered with 500
    failures: usize,
}

async fn send_message(
    State(bot): State<FakeBot>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> StatusCode {
    let mut hits = bot.hits.lock().unwrap();
    hits.push(Hit {
        method,
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        query,
        body,
    });
    if hits.len() <= bot.failures {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

/// Start the fake Bot API and return its base URL and request log
async fn start_bot(failures: usize) -> (String, Arc<Mutex<Vec<Hit>>>) {
    let hits = Arc::new(Mutex::new(Vec::new()));
    let bot = FakeBot {
        hits: hits.clone(),
        failures,
    };
    let app = Router::new()
        .route("/bottest-token/sendMessage", any(send_message))
        .with_state(bot);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), hits)
}

fn notifier(base: &str) -> TelegramNotifier {
    TelegramNotifier::new(base, "test-token", "-100200", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn get_success_stops_after_first_attempt() {
    let (base, hits) = start_bot(0).await;

    notifier(&base).send("<b>Заявка</b> & co").await.unwrap();

    let hits = hits.lock().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].method, Method::GET);
    assert_eq!(hits[0].query["chat_id"], "-100200");
    assert_eq!(hits[0].query["text"], "<b>Заявка</b> & co");
    assert_eq!(hits[0].query["parse_mode"], "HTML");
    assert_eq!(hits[0].query["disable_web_page_preview"], "true");
}

#[tokio::test]
async fn falls_back_to_json_post() {
    let (base, hits) = start_bot(1).await;

    notifier(&base).send("hello").await.unwrap();

    let hits = hits.lock().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[1].method, Method::POST);
    assert_eq!(
        hits[1].content_type.as_deref(),
        Some("application/json; charset=utf-8")
    );
    let payload: serde_json::Value = serde_json::from_str(&hits[1].body).unwrap();
    assert_eq!(payload["chat_id"], "-100200");
    assert_eq!(payload["text"], "hello");
    assert_eq!(payload["disable_web_page_preview"], true);
}

#[tokio::test]
async fn falls_back_to_form_post() {
    let (base, hits) = start_bot(2).await;

    notifier(&base).send("hello world").await.unwrap();

    let hits = hits.lock().unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[2].method, Method::POST);
    assert_eq!(
        hits[2].content_type.as_deref(),
        Some("application/x-www-form-urlencoded; charset=utf-8")
    );
    assert!(hits[2].body.contains("chat_id=-100200"));
    assert!(hits[2].body.contains("text=hello+world"));
}

#[tokio::test]
async fn reports_error_when_every_attempt_fails() {
    let (base, hits) = start_bot(usize::MAX).await;

    assert!(notifier(&base).send("lost").await.is_err());
    assert_eq!(hits.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn unreachable_api_is_an_error() {
    // nothing listens on the discard port
    let notifier = TelegramNotifier::new(
        "http://127.0.0.1:9",
        "test-token",
        "1",
        Duration::from_millis(500),
    )
    .unwrap();
    assert!(notifier.send("lost").await.is_err());
}
