//! HTTP surface exercised through the full router.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::{app_config, mount_login, users_path};
use keycloak_provisioner::{AppResources, api::app, config::ProvisioningMode};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn test_server(server: &MockServer, realms: &[&str], mode: ProvisioningMode) -> TestServer {
    let resources = AppResources::from_config(app_config(server, realms, mode, true))
        .expect("build resources");
    TestServer::new(app(resources)).expect("start test server")
}

#[tokio::test]
async fn root_says_hello() {
    let idp = MockServer::start().await;
    let server = test_server(&idp, &["students"], ProvisioningMode::AllRealms);

    let response = server.get("/").await;
    response.assert_status_ok();
    response.assert_json(&json!({"Hello": "World"}));
}

#[tokio::test]
async fn health_check() {
    let idp = MockServer::start().await;
    let server = test_server(&idp, &["students"], ProvisioningMode::AllRealms);

    let response = server.get("/healthz").await;
    response.assert_status_ok();
    response.assert_text("ok");
}

#[tokio::test]
async fn api_docs_are_served() {
    let idp = MockServer::start().await;
    let server = test_server(&idp, &["students"], ProvisioningMode::AllRealms);

    server.get("/api-docs").await.assert_status_ok();
}

#[tokio::test]
async fn single_word_name_is_rejected() {
    let idp = MockServer::start().await;
    mount_login(&idp, 0).await;
    let server = test_server(&idp, &["students"], ProvisioningMode::AllRealms);

    let response = server
        .post("/add_user")
        .json(&json!({"full_name": "Иванов"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("Иванов"));
}

#[tokio::test]
async fn missing_full_name_is_unprocessable() {
    let idp = MockServer::start().await;
    let server = test_server(&idp, &["students"], ProvisioningMode::AllRealms);

    let response = server.post("/add_user").json(&json!({})).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn add_user_reports_every_realm() {
    let idp = MockServer::start().await;
    mount_login(&idp, 1).await;
    Mock::given(method("GET"))
        .and(path(users_path("students")))
        .and(query_param("username", "ivanov.p"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "11", "username": "ivanov.p", "enabled": true}
        ])))
        .mount(&idp)
        .await;
    Mock::given(method("GET"))
        .and(path(users_path("staff")))
        .and(query_param("username", "ivanov.p"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&idp)
        .await;
    Mock::given(method("POST"))
        .and(path(users_path("staff")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "7",
            "username": "ivanov.p",
            "enabled": true,
            "firstName": "Петр",
            "lastName": "Иванов",
            "email": "ivanov.p@kgeu.ru"
        })))
        .expect(1)
        .mount(&idp)
        .await;

    let server = test_server(&idp, &["students", "staff"], ProvisioningMode::AllRealms);
    let response = server
        .post("/add_user")
        .json(&json!({"full_name": "Иванов Петр"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["username"], "ivanov.p");
    assert_eq!(body["realms"][0]["realm"], "students");
    assert_eq!(body["realms"][0]["status"], "already_exists");
    assert!(body["realms"][0].get("user").is_none());
    assert_eq!(body["realms"][1]["realm"], "staff");
    assert_eq!(body["realms"][1]["status"], "created");
    assert_eq!(body["realms"][1]["user"]["id"], "7");
    assert_eq!(
        body["realms"][1]["user"]["credentials"][0]["value"],
        "ivanov.p123"
    );
}

#[tokio::test]
async fn add_user_in_first_realm_returns_null_for_existing_user() {
    let idp = MockServer::start().await;
    mount_login(&idp, 1).await;
    Mock::given(method("GET"))
        .and(path(users_path("students")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "11", "username": "ivanov.p", "enabled": true}
        ])))
        .mount(&idp)
        .await;

    let server = test_server(&idp, &["students"], ProvisioningMode::FirstRealm);
    let response = server
        .post("/add_user")
        .json(&json!({"full_name": "Иванов Петр"}))
        .await;

    response.assert_status_ok();
    response.assert_json(&Value::Null);
}

#[tokio::test]
async fn add_user_in_first_realm_returns_created_user() {
    let idp = MockServer::start().await;
    mount_login(&idp, 1).await;
    Mock::given(method("GET"))
        .and(path(users_path("students")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&idp)
        .await;
    Mock::given(method("POST"))
        .and(path(users_path("students")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "42",
            "username": "sidorov.ai",
            "enabled": true
        })))
        .mount(&idp)
        .await;

    let server = test_server(&idp, &["students"], ProvisioningMode::FirstRealm);
    let response = server
        .post("/add_user")
        .json(&json!({"full_name": "Сидоров Алексей Иванович"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"], "42");
    assert_eq!(body["username"], "sidorov.ai");
    assert_eq!(body["credentials"][0]["temporary"], true);
}

#[tokio::test]
async fn rejected_admin_login_is_bad_gateway() {
    let idp = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
        .mount(&idp)
        .await;

    let server = test_server(&idp, &["students"], ProvisioningMode::AllRealms);
    let response = server
        .post("/add_user")
        .json(&json!({"full_name": "Иванов Петр"}))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["upstream_status"], 401);
}

#[tokio::test]
async fn upstream_conflict_is_passed_through() {
    let idp = MockServer::start().await;
    mount_login(&idp, 1).await;
    Mock::given(method("GET"))
        .and(path(users_path("students")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&idp)
        .await;
    Mock::given(method("POST"))
        .and(path(users_path("students")))
        .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
        .mount(&idp)
        .await;

    let server = test_server(&idp, &["students"], ProvisioningMode::AllRealms);
    let response = server
        .post("/add_user")
        .json(&json!({"full_name": "Иванов Петр"}))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}
