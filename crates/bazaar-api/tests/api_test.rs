//! Integration tests for the REST surface.

mod helpers;

use axum::http::StatusCode;

use bazaar_core::types::id::UserId;
use helpers::TestApp;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/conversations", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), Some("UNAUTHORIZED"));
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = TestApp::new();

    let response = app
        .request("GET", "/api/conversations", None, Some("not-a-jwt"))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_start_conversation_is_idempotent_and_symmetric() {
    let app = TestApp::new();
    let (buyer, seller) = (UserId::new(), UserId::new());
    let buyer_token = app.token_for(buyer, "Buyer");
    let seller_token = app.token_for(seller, "Seller");

    let first = app.start_conversation(&buyer_token, seller).await;
    let again = app.start_conversation(&buyer_token, seller).await;
    let reverse = app.start_conversation(&seller_token, buyer).await;

    assert_eq!(first, again);
    assert_eq!(first, reverse);
}

#[tokio::test]
async fn test_conversation_with_self_is_rejected() {
    let app = TestApp::new();
    let user = UserId::new();
    let token = app.token_for(user, "Solo");

    let response = app
        .request(
            "POST",
            "/api/conversations",
            Some(serde_json::json!({ "other_user_id": user })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), Some("VALIDATION"));
}

#[tokio::test]
async fn test_list_conversations_shows_other_participant() {
    let app = TestApp::new();
    let (buyer, seller, stranger) = (UserId::new(), UserId::new(), UserId::new());
    let buyer_token = app.token_for(buyer, "Buyer");
    let conversation = app.start_conversation(&buyer_token, seller).await;

    let response = app
        .request("GET", "/api/conversations", None, Some(&buyer_token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let items = response.data()["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], serde_json::json!(conversation));
    assert_eq!(items[0]["other_user_id"], serde_json::json!(seller));

    let stranger_token = app.token_for(stranger, "Stranger");
    let response = app
        .request("GET", "/api/conversations", None, Some(&stranger_token))
        .await;
    assert_eq!(response.data()["total_items"], 0);
}

#[tokio::test]
async fn test_page_far_past_the_end_is_empty() {
    let app = TestApp::new();
    let (buyer, seller) = (UserId::new(), UserId::new());
    let buyer_token = app.token_for(buyer, "Buyer");
    let conversation = app.start_conversation(&buyer_token, seller).await;
    app.seed_message(conversation, buyer, "hello").await;

    let last_page = u64::MAX;
    let listed = app
        .request(
            "GET",
            &format!("/api/conversations?page={last_page}"),
            None,
            Some(&buyer_token),
        )
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.data()["items"], serde_json::json!([]));
    assert_eq!(listed.data()["total_items"], 1);

    let history = app
        .request(
            "GET",
            &format!("/api/conversations/{conversation}/messages?page={last_page}&per_page=100"),
            None,
            Some(&buyer_token),
        )
        .await;
    assert_eq!(history.status, StatusCode::OK);
    assert_eq!(history.data()["items"], serde_json::json!([]));
}

#[tokio::test]
async fn test_message_history_is_oldest_first() {
    let app = TestApp::new();
    let (buyer, seller) = (UserId::new(), UserId::new());
    let buyer_token = app.token_for(buyer, "Buyer");
    let conversation = app.start_conversation(&buyer_token, seller).await;

    app.seed_message(conversation, buyer, "is this still available?")
        .await;
    app.seed_message(conversation, seller, "yes").await;

    let response = app
        .request(
            "GET",
            &format!("/api/conversations/{conversation}/messages"),
            None,
            Some(&buyer_token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let contents: Vec<&str> = response.data()["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|m| m["content"].as_str())
        .collect();
    assert_eq!(contents, vec!["is this still available?", "yes"]);
}

#[tokio::test]
async fn test_history_is_forbidden_for_non_participant() {
    let app = TestApp::new();
    let (buyer, seller, stranger) = (UserId::new(), UserId::new(), UserId::new());
    let conversation = app
        .start_conversation(&app.token_for(buyer, "Buyer"), seller)
        .await;

    let response = app
        .request(
            "GET",
            &format!("/api/conversations/{conversation}/messages"),
            None,
            Some(&app.token_for(stranger, "Stranger")),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), Some("ACCESS_DENIED"));
}

#[tokio::test]
async fn test_mark_read_clears_unread_count() {
    let app = TestApp::new();
    let (buyer, seller) = (UserId::new(), UserId::new());
    let buyer_token = app.token_for(buyer, "Buyer");
    let conversation = app.start_conversation(&buyer_token, seller).await;

    app.seed_message(conversation, seller, "first").await;
    app.seed_message(conversation, seller, "second").await;
    app.seed_message(conversation, buyer, "mine").await;

    let unread = app
        .request("GET", "/api/messages/unread-count", None, Some(&buyer_token))
        .await;
    assert_eq!(unread.status, StatusCode::OK);
    assert_eq!(unread.data()["count"], 2);

    let read = app
        .request(
            "POST",
            &format!("/api/conversations/{conversation}/read"),
            None,
            Some(&buyer_token),
        )
        .await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(
        read.data()["message_ids"].as_array().map(Vec::len),
        Some(2)
    );

    let unread = app
        .request("GET", "/api/messages/unread-count", None, Some(&buyer_token))
        .await;
    assert_eq!(unread.data()["count"], 0);

    let again = app
        .request(
            "POST",
            &format!("/api/conversations/{conversation}/read"),
            None,
            Some(&buyer_token),
        )
        .await;
    assert_eq!(
        again.data()["message_ids"].as_array().map(Vec::len),
        Some(0)
    );
}

#[tokio::test]
async fn test_deactivated_conversation_is_hidden_and_restarts_fresh() {
    let app = TestApp::new();
    let (buyer, seller) = (UserId::new(), UserId::new());
    let buyer_token = app.token_for(buyer, "Buyer");
    let conversation = app.start_conversation(&buyer_token, seller).await;

    let response = app
        .request(
            "DELETE",
            &format!("/api/conversations/{conversation}"),
            None,
            Some(&buyer_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let listed = app
        .request("GET", "/api/conversations", None, Some(&buyer_token))
        .await;
    assert_eq!(listed.data()["total_items"], 0);

    let restarted = app.start_conversation(&buyer_token, seller).await;
    assert_ne!(restarted, conversation);
}

#[tokio::test]
async fn test_online_users_requires_auth() {
    let app = TestApp::new();

    let anonymous = app.request("GET", "/api/presence/online", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let token = app.token_for(UserId::new(), "Viewer");
    let response = app
        .request("GET", "/api/presence/online", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data(), &serde_json::json!([]));
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let health = app.request("GET", "/api/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.data()["status"], "ok");

    let detailed = app.request("GET", "/api/health/detailed", None, None).await;
    assert_eq!(detailed.status, StatusCode::OK);
    assert_eq!(detailed.data()["database"], "memory");
    assert_eq!(detailed.data()["ws_connections"], 0);
}
