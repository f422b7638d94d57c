use chatbot_client::api::new_client;
use chatbot_client::config::{ parse_server_url, ClientConfig };
use chatbot_client::shell::run_chat;
use chatbot_client::storage::{ LocalStore, MemoryStore, AUTH_TOKEN_KEY };
use serde_json::json;
use std::io;
use std::sync::Arc;
use wiremock::{
    matchers::{ body_partial_json, header, method, path },
    Mock,
    MockServer,
    ResponseTemplate,
};

fn config_for(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.server_url = parse_server_url(&server.uri()).unwrap();
    config.greeting = "Hi!".into();
    config.fallback_reply = "Sorry, something went wrong.".into();
    config
}

/// Runs the chat shell over `lines` and returns everything it printed.
async fn drive(server: &MockServer, store: Arc<MemoryStore>, lines: &[&str]) -> String {
    let config = config_for(server);
    let api = new_client(&config, store.clone()).unwrap();
    let mut input = tokio_stream::iter(
        lines
            .iter()
            .map(|l| Ok::<_, io::Error>(l.to_string()))
            .collect::<Vec<_>>()
    );
    let mut out = Vec::new();
    run_chat(api, store, &config, &mut input, &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn expired_token_prompts_login_and_resumes_with_a_fresh_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_partial_json(json!({ "message": "hi" })))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Token has expired" })))
        .expect(1)
        .mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_partial_json(json!({ "email": "a@b.c", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "fresh" })))
        .expect(1)
        .mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("authorization", "Bearer fresh"))
        .and(body_partial_json(json!({ "message": "again", "history": [] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reply": "hello" })))
        .expect(1)
        .mount(&server).await;

    let store = Arc::new(MemoryStore::new());
    store.set(AUTH_TOKEN_KEY, "stale").unwrap();
    let out = drive(&server, store.clone(), &["hi", "a@b.c", "pw", "again", "/quit"]).await;

    assert!(out.contains("bot: Sorry, something went wrong."));
    assert!(out.contains("Your session has expired. Please log in again."));
    assert!(out.contains("Please log in"));
    assert!(out.contains("Logged in."));
    assert!(out.contains("bot: hello"));
    // Greeting once at start, once more for the chat started after login.
    assert_eq!(out.matches("bot: Hi!").count(), 2);
    assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn saving_an_empty_chat_prints_a_notice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/save-chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "saved" })))
        .expect(0)
        .mount(&server).await;

    let store = Arc::new(MemoryStore::new());
    store.set(AUTH_TOKEN_KEY, "t").unwrap();
    let out = drive(&server, store, &["/save", "/quit"]).await;

    assert!(out.contains("There is no conversation to save."));
    assert!(!out.contains("Conversation saved!"));
}

#[tokio::test]
async fn logout_then_blank_email_ends_the_shell() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "unused" })))
        .expect(0)
        .mount(&server).await;

    let store = Arc::new(MemoryStore::new());
    store.set(AUTH_TOKEN_KEY, "t").unwrap();
    let out = drive(&server, store.clone(), &["/logout", "", "never read"]).await;

    assert!(out.contains("Logged out."));
    assert!(out.contains("Please log in"));
    assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap(), None);
}
