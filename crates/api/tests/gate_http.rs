use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use warden_api::app::{AppServices, build_app};
use warden_api::config::AppConfig;
use warden_core::{PrincipalId, Role};
use warden_infra::{UserRecord, hash_password, seed_default_policies};

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory stores, ephemeral port.
        let config = AppConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            database_url: None,
            db_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            token_ttl: chrono::Duration::minutes(10),
            issuer: "warden-test".to_string(),
        };
        let services = Arc::new(AppServices::in_memory(&config));
        seed_default_policies(services.policies.as_ref())
            .await
            .expect("failed to seed default policies");

        let app = build_app(services.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
        }
    }

    async fn register(&self, client: &reqwest::Client, username: &str) {
        let res = client
            .post(format!("{}/api/auth/register", self.base_url))
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "display_name": username,
                "password": "hunter22",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    async fn login(&self, client: &reqwest::Client, username: &str) -> String {
        let res = client
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&json!({ "username": username, "password": "hunter22" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/api/health", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_and_malformed_authorization_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // No header at all.
    let res = client
        .get(format!("{}/api/dashboard", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let missing: serde_json::Value = res.json().await.unwrap();

    // Wrong scheme: same status, but a distinct header-shape message.
    let res = client
        .get(format!("{}/api/dashboard", srv.base_url))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let bad_scheme: serde_json::Value = res.json().await.unwrap();
    assert_ne!(missing["message"], bad_scheme["message"]);

    // Bearer with garbage token.
    let res = client
        .get(format!("{}/api/dashboard", srv.base_url))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_profile_flow() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    srv.register(&client, "alice").await;
    let token = srv.login(&client, "alice").await;

    let res = client
        .get(format!("{}/api/users/profile", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "user"));
}

#[tokio::test]
async fn login_does_not_reveal_which_credential_was_wrong() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    srv.register(&client, "bob").await;

    let unknown_user = client
        .post(format!("{}/api/auth/login", srv.base_url))
        .json(&json!({ "username": "nobody", "password": "hunter22" }))
        .send()
        .await
        .unwrap();
    let wrong_password = client
        .post(format!("{}/api/auth/login", srv.base_url))
        .json(&json!({ "username": "bob", "password": "wrong" }))
        .send()
        .await
        .unwrap();

    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let a: serde_json::Value = unknown_user.json().await.unwrap();
    let b: serde_json::Value = wrong_password.json().await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn plain_user_is_forbidden_on_admin_surface() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    srv.register(&client, "carol").await;
    let token = srv.login(&client, "carol").await;

    let res = client
        .get(format!("{}/api/users", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_grant_takes_effect_after_relogin() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    srv.register(&client, "dave").await;
    let old_token = srv.login(&client, "dave").await;

    srv.services
        .enforcer
        .grant_role(&PrincipalId::new("dave"), &Role::new("admin"))
        .await
        .unwrap();

    // The old token still carries the pre-grant role snapshot.
    let res = client
        .get(format!("{}/api/users", srv.base_url))
        .bearer_auth(&old_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let token = srv.login(&client, "dave").await;
    let res = client
        .get(format!("{}/api/users", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["total"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn placeholder_policy_admits_parameterized_paths() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    srv.register(&client, "erin").await;
    srv.register(&client, "frank").await;
    srv.services
        .enforcer
        .grant_role(&PrincipalId::new("erin"), &Role::new("admin"))
        .await
        .unwrap();
    let token = srv.login(&client, "erin").await;

    // Seeded as /api/users/:id — matches any concrete username.
    let res = client
        .get(format!("{}/api/users/frank", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["username"], "frank");
}

#[tokio::test]
async fn role_and_policy_administration_over_http() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    srv.register(&client, "grace").await;
    srv.services
        .enforcer
        .grant_role(&PrincipalId::new("grace"), &Role::new("admin"))
        .await
        .unwrap();
    let token = srv.login(&client, "grace").await;

    // auditor inherits user.
    let res = client
        .post(format!("{}/api/roles/auditor/inherits", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "parent": "user" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Closing the loop is rejected.
    let res = client
        .post(format!("{}/api/roles/user/inherits", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "parent": "auditor" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Add and list a policy tuple.
    let res = client
        .post(format!("{}/api/policies", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "role": "auditor", "resource": "/api/users", "action": "GET" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/api/policies?role=auditor", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["policies"].as_array().unwrap().len(), 1);

    // Grant the new role over HTTP; it becomes effective at next login.
    srv.register(&client, "heidi").await;
    let res = client
        .post(format!("{}/api/users/heidi/roles", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "role": "auditor" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let heidi_token = srv.login(&client, "heidi").await;
    let res = client
        .get(format!("{}/api/users", srv.base_url))
        .bearer_auth(&heidi_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn disabled_account_cannot_login() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    srv.services
        .users
        .create(&UserRecord {
            username: "mallory".to_string(),
            email: "mallory@example.com".to_string(),
            display_name: "mallory".to_string(),
            password_hash: hash_password("hunter22").unwrap(),
            active: false,
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let res = client
        .post(format!("{}/api/auth/login", srv.base_url))
        .json(&json!({ "username": "mallory", "password": "hunter22" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    srv.register(&client, "ivan").await;

    let res = client
        .post(format!("{}/api/auth/register", srv.base_url))
        .json(&json!({
            "username": "ivan",
            "email": "ivan2@example.com",
            "display_name": "ivan",
            "password": "hunter22",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Mint a short-lived token and wait out its window.
    let token = srv.services.codec.issue(
        &PrincipalId::new("judy"),
        &[Role::new("admin")],
        chrono::Duration::seconds(1),
        "warden-test",
    );
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    let res = client
        .get(format!("{}/api/dashboard", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
