mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn login_issues_bearer_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let Some(token) = common::admin_token(server).await? else {
        return Ok(());
    };

    let res = reqwest::Client::new()
        .post(server.api("/auth/login/test-token"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["role"], "super_admin");
    assert!(body["data"].get("hashed_password").is_none());
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;
    let Some(token) = common::admin_token(server).await? else {
        return Ok(());
    };
    let api = common::Api::new(server, token);

    let email = format!("op-{}@example.com", common::unique_suffix());
    let (status, _) = api
        .post(
            "/users",
            serde_json::json!({
                "email": email,
                "password": "operator-pass",
                "first_name": "Olive",
                "last_name": "Operator",
                "role": "operator"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let res = common::login(server, &email, "not-the-password").await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = common::login(server, &email, "operator-pass").await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["token_type"], "bearer");
    Ok(())
}

#[tokio::test]
async fn form_encoded_login_is_accepted() -> Result<()> {
    let server = common::ensure_server().await?;
    if common::admin_token(server).await?.is_none() {
        return Ok(());
    }

    let res = reqwest::Client::new()
        .post(server.api("/auth/login/access-token"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("username=nobody%40example.com&password=whatever1")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn password_recovery_for_unknown_email_is_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::database_available(server).await {
        return Ok(());
    }

    let res = reqwest::Client::new()
        .post(server.api("/auth/password-recovery/ghost-nobody@example.com"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
