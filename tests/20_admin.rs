mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::TestApp;
use songbook_api::database::CredentialStore;

#[tokio::test]
async fn user_listing_requires_admin_claim() -> Result<()> {
    let app = TestApp::new();
    let user = app.register("u@x.com", "pw123", "User").await?;

    let (status, _) = app.get("/api/users", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/users", Some(&user)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn admin_lists_users_without_password_hashes() -> Result<()> {
    let app = TestApp::new();
    app.register("u@x.com", "pw123", "User").await?;
    let admin = app.register_admin("admin@x.com").await?;

    let (status, body) = app.get("/api/users", Some(&admin)).await?;
    assert_eq!(status, StatusCode::OK);

    let users = body.as_array().expect("list of users");
    assert_eq!(users.len(), 2);
    for user in users {
        assert!(user.get("passwordHash").is_none());
        assert!(user.get("password_hash").is_none());
        assert!(user["id"].is_string());
        assert!(user["isAdmin"].is_boolean());
    }
    Ok(())
}

#[tokio::test]
async fn admin_grants_rights_effective_at_next_login() -> Result<()> {
    let app = TestApp::new();
    let admin = app.register_admin("admin@x.com").await?;
    let stale = app.register("u@x.com", "pw123", "User").await?;
    let target = app.user_id("u@x.com").await?;

    let (status, body) = app
        .put(&format!("/api/users/{}/admin", target), Some(&admin), json!({ "isAdmin": true }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    // The token issued before the change still lacks the claim
    let (status, _) = app.get("/api/users", Some(&stale)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let fresh = app.login("u@x.com", "pw123").await?;
    let (status, _) = app.get("/api/users", Some(&fresh)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn admin_cannot_demote_self() -> Result<()> {
    let app = TestApp::new();
    let admin = app.register_admin("admin@x.com").await?;
    let id = app.user_id("admin@x.com").await?;

    let (status, body) = app
        .put(&format!("/api/users/{}/admin", id), Some(&admin), json!({ "isAdmin": false }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    // Flag is untouched
    let user = app.store.find_by_id(id).await?.expect("admin exists");
    assert!(user.is_admin);
    Ok(())
}

#[tokio::test]
async fn set_admin_on_unknown_user_is_not_found() -> Result<()> {
    let app = TestApp::new();
    let admin = app.register_admin("admin@x.com").await?;

    for id in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let (status, _) = app
            .put(&format!("/api/users/{}/admin", id), Some(&admin), json!({ "isAdmin": true }))
            .await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    Ok(())
}

#[tokio::test]
async fn set_admin_requires_boolean_flag() -> Result<()> {
    let app = TestApp::new();
    let admin = app.register_admin("admin@x.com").await?;
    app.register("u@x.com", "pw123", "User").await?;
    let target = app.user_id("u@x.com").await?;

    let (status, _) = app
        .put(&format!("/api/users/{}/admin", target), Some(&admin), json!({ "isAdmin": "yes" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn non_admin_cannot_set_admin() -> Result<()> {
    let app = TestApp::new();
    let user = app.register("u@x.com", "pw123", "User").await?;
    let id = app.user_id("u@x.com").await?;

    let (status, _) = app
        .put(&format!("/api/users/{}/admin", id), Some(&user), json!({ "isAdmin": true }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}
