mod common;

use common::*;
use jse_portal::{MockStorageService, create_router};
use reqwest::{StatusCode, header, redirect};
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

async fn spawn_app() -> TestApp {
    let router = create_router(test_state(seeded_repo(), MockStorageService::new()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Redirects are the subject under test, so never follow them.
    let client = reqwest::Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .unwrap();

    TestApp { address, client }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_signin_redirect_over_http() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(format!("{}/home/invoices", app.address))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/auth/signin?callbackUrl=%2Fhome%2Finvoices"
    );
}

#[tokio::test]
async fn test_admin_flow_over_http() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/admin", app.address))
        .header(header::COOKIE, format!("{SESSION_COOKIE}={}", admin_token()))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .get(format!("{}/api/auth/admin/users", app.address))
        .bearer_auth(client_token())
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");
}
