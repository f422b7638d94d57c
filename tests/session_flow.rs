use chatbot_client::api::new_client;
use chatbot_client::auth;
use chatbot_client::config::{ parse_server_url, ClientConfig };
use chatbot_client::models::chat::ChatMessage;
use chatbot_client::session::{ SendOutcome, SessionManager };
use chatbot_client::storage::{ FileStore, LocalStore, AUTH_TOKEN_KEY };
use serde_json::json;
use std::sync::Arc;
use tempfile::{ tempdir, TempDir };
use wiremock::{
    matchers::{ body_partial_json, header, method, path, query_param },
    Mock,
    MockServer,
    ResponseTemplate,
};

struct Harness {
    _dir: TempDir,
    store: Arc<FileStore>,
    manager: SessionManager,
}

async fn harness(server: &MockServer, token: Option<&str>) -> Harness {
    let dir = tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path().join("local_storage.json")).unwrap());
    if let Some(t) = token {
        store.set(AUTH_TOKEN_KEY, t).unwrap();
    }

    let mut config = ClientConfig::default();
    config.server_url = parse_server_url(&server.uri()).unwrap();
    config.greeting = "Hi!".into();
    config.fallback_reply = "Sorry, something went wrong.".into();

    let api = new_client(&config, store.clone()).unwrap();
    let manager = SessionManager::new(api, store.clone(), &config).unwrap();
    Harness { _dir: dir, store, manager }
}

#[tokio::test]
async fn hi_hello_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("authorization", "Bearer tok"))
        .and(body_partial_json(json!({ "message": "hi", "history": [] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reply": "hello" })))
        .expect(1)
        .mount(&server).await;

    let mut h = harness(&server, Some("tok")).await;
    let outcome = h.manager.send_message("hi").await;
    assert!(matches!(outcome, SendOutcome::Replied(ref r) if r == "hello"));

    let session = h.manager.session();
    assert_eq!(session.transcript(), &[ChatMessage::user("hi"), ChatMessage::assistant("hello")]);
    let rendered: Vec<String> = session.view().iter().map(|e| e.to_string()).collect();
    assert_eq!(rendered, vec!["bot: Hi!", "user: hi", "bot: hello"]);
}

#[tokio::test]
async fn expired_token_is_cleared() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Token has expired" }))
        )
        .mount(&server).await;

    let mut h = harness(&server, Some("old")).await;
    let outcome = h.manager.send_message("hi").await;
    assert!(matches!(outcome, SendOutcome::Unauthorized));
    assert_eq!(h.store.get(AUTH_TOKEN_KEY).unwrap(), None);
    assert!(auth::require_token(h.store.as_ref()).is_err());
    assert_eq!(h.manager.session().transcript().len(), 1);
}

#[tokio::test]
async fn server_error_shows_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
        .mount(&server).await;

    let mut h = harness(&server, Some("tok")).await;
    let outcome = h.manager.send_message("hi").await;
    assert!(matches!(outcome, SendOutcome::Failed(_)));
    assert_eq!(h.manager.session().transcript().len(), 1);
    assert_eq!(
        h.manager.session().view().last().unwrap().to_string(),
        "bot: Sorry, something went wrong."
    );
    assert_eq!(h.store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("tok"));
}

#[tokio::test]
async fn save_list_and_reload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reply": "hello" })))
        .mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/save-chat"))
        .and(
            body_partial_json(
                json!({
                "history": [
                    { "role": "user", "content": "hi" },
                    { "role": "assistant", "content": "hello" }
                ]
            })
            )
        )
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "Chat saved successfully" }))
        )
        .expect(1)
        .mount(&server).await;

    let mut h = harness(&server, Some("tok")).await;
    let user_id = h.manager.session().user_id().to_string();
    h.manager.send_message("hi").await;
    let saved_chat_id = h.manager.session().chat_id().to_string();
    assert_eq!(h.manager.save_chat().await.unwrap(), "Chat saved successfully");

    Mock::given(method("GET"))
        .and(path("/get-conversations"))
        .and(query_param("user_id", user_id.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(
                json!({
                "conversations": [{
                    "chat_id": saved_chat_id,
                    "user_id": user_id,
                    "saved_at": "Fri, 01 Mar 2024 12:00:00 GMT",
                    "messages": [
                        { "role": "user", "content": "hi" },
                        { "role": "assistant", "content": "hello" }
                    ]
                }]
            })
            )
        )
        .mount(&server).await;

    h.manager.start_new_chat();
    assert!(h.manager.session().transcript().is_empty());

    let listed = h.manager.list_saved_conversations().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].summary.title, "hi");

    h.manager.select_saved(0).unwrap();
    assert_eq!(h.manager.session().chat_id(), saved_chat_id);
    assert_eq!(h.manager.session().transcript().len(), 2);
}

#[tokio::test]
async fn reset_survives_server_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/new-chat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "db down" })))
        .expect(1)
        .mount(&server).await;

    let mut h = harness(&server, Some("tok")).await;
    let chat_id = h.manager.session().chat_id().to_string();
    let outcome = h.manager.reset_all_history().await;

    assert!(outcome.warning.unwrap().contains("db down"));
    assert_ne!(h.manager.session().chat_id(), chat_id);
    assert_eq!(h.manager.session().view().len(), 1);
}

#[tokio::test]
async fn empty_save_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/save-chat"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server).await;

    let mut h = harness(&server, Some("tok")).await;
    assert!(h.manager.save_chat().await.is_err());
}
