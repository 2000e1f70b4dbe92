use std::net::SocketAddr;

use chrono::{Duration, SecondsFormat, Utc};
use reqwest::{Client, StatusCode, redirect};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use vigil_adapter_http::{AppState, serve};
use vigil_application::Services;
use vigil_domain::{AdminCredential, ComponentType, VigilConfig};
use vigil_ports::PortSet;

const ADMIN_TOKEN: &str = "admin-token";
const CRON_SECRET: &str = "cron-secret";

struct TestServer {
    addr: SocketAddr,
    client: Client,
}

impl TestServer {
    async fn start() -> Self {
        let mut config = VigilConfig::default();
        config.auth.cron_secret = Some(CRON_SECRET.into());
        config.auth.admins = vec![AdminCredential {
            token: ADMIN_TOKEN.into(),
            email: "ops@example.com".into(),
        }];
        config.notifications.auto_verify_without_mailer = true;

        let services = Services::new(PortSet::in_memory(), &config);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, AppState::new(services), std::future::pending()));

        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .unwrap();
        Self { addr, client }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn admin(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = self
            .client
            .request(method, self.url(path))
            .bearer_auth(ADMIN_TOKEN);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn location(&self, path: &str) -> String {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        response.headers()["location"].to_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn liveness_and_empty_status() {
    let server = TestServer::start().await;

    let (status, body) = server.get("/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = server.get("/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "operational");
    assert_eq!(body["components"].as_array().unwrap().len(), ComponentType::ALL.len());
    assert_eq!(body["activeIncidents"], 0);

    let (status, body) = server.get("/api/components").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["updatedAt"].is_string());
}

#[tokio::test]
async fn history_validates_component_and_clamps_days() {
    let server = TestServer::start().await;

    let (status, body) = server.get("/api/history?component=bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid component");

    let (status, body) = server.get("/api/history?component=database&days=500").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["days"], 90);
    assert_eq!(body["history"].as_array().unwrap().len(), 1);
    assert_eq!(body["history"][0]["history"].as_array().unwrap().len(), 90);

    let (_, body) = server.get("/api/history?days=0").await;
    assert_eq!(body["days"], 1);
}

#[tokio::test]
async fn huge_page_numbers_return_an_empty_page() {
    let server = TestServer::start().await;

    let (status, body) = server.get("/api/incidents?page=18446744073709551615").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["incidents"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn admin_endpoints_require_a_known_token() {
    let server = TestServer::start().await;

    let (status, body) = server.get("/api/admin/incidents").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let response = server
        .client
        .get(server.url("/api/admin/maintenance"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn incident_lifecycle() {
    let server = TestServer::start().await;

    let (status, body) = server
        .admin(
            reqwest::Method::POST,
            "/api/admin/incidents",
            Some(json!({
                "title": "Checkout errors",
                "severity": "major",
                "affectedComponents": ["payments", "api"],
                "message": "Card payments are failing",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let incident = &body["incident"];
    assert_eq!(incident["status"], "investigating");
    assert_eq!(incident["createdBy"], "ops@example.com");
    assert_eq!(incident["updates"][0]["message"], "Card payments are failing");
    assert_eq!(incident["updates"][0]["status"], "investigating");
    let id = incident["id"].as_str().unwrap().to_string();

    let (status, body) = server.get("/api/incidents?status=active").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["incidents"][0]["id"], id.as_str());

    let (status, body) = server
        .admin(
            reqwest::Method::PATCH,
            &format!("/api/admin/incidents/{id}"),
            Some(json!({ "status": "resolved", "message": "Fixed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "resolved");
    assert!(body["resolvedAt"].is_string());

    let (_, body) = server.get("/api/incidents?status=active").await;
    assert_eq!(body["pagination"]["total"], 0);
    let (_, body) = server.get("/api/incidents?status=resolved&limit=500").await;
    assert_eq!(body["pagination"]["limit"], 100);
    assert_eq!(body["pagination"]["pages"], 1);

    let (status, _) = server
        .admin(
            reqwest::Method::PATCH,
            &format!("/api/admin/incidents/{id}"),
            Some(json!({ "status": "exploded" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .admin(reqwest::Method::DELETE, &format!("/api/admin/incidents/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = server.get(&format!("/api/incidents/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Incident not found");
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/api/admin/incidents"))
        .bearer_auth(ADMIN_TOKEN)
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid JSON body");

    let (status, body) = server
        .admin(reqwest::Method::POST, "/api/admin/incidents", Some(json!({ "title": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Valid severity is required");
}

#[tokio::test]
async fn maintenance_flow() {
    let server = TestServer::start().await;
    let start = Utc::now() + Duration::hours(1);
    let end = start + Duration::hours(2);

    let (status, body) = server
        .admin(
            reqwest::Method::POST,
            "/api/admin/maintenance",
            Some(json!({
                "title": "Database upgrade",
                "description": "Minor version bump",
                "affectedComponents": ["database"],
                "scheduledStart": start.to_rfc3339_opts(SecondsFormat::Secs, true),
                "scheduledEnd": end.to_rfc3339_opts(SecondsFormat::Secs, true),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["maintenance"]["id"].as_str().unwrap().to_string();

    let (_, body) = server.get("/api/maintenance?status=upcoming").await;
    assert_eq!(body["maintenance"].as_array().unwrap().len(), 1);
    let (_, body) = server.get("/api/status").await;
    assert_eq!(body["upcomingMaintenance"], 1);

    let (status, body) = server
        .admin(
            reqwest::Method::PATCH,
            "/api/admin/maintenance",
            Some(json!({ "id": id, "status": "in_progress" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "in_progress");

    let (_, body) = server.get("/api/maintenance?status=active").await;
    assert_eq!(body["maintenance"][0]["id"], id.as_str());

    let (status, _) = server
        .admin(
            reqwest::Method::PATCH,
            "/api/admin/maintenance",
            Some(json!({ "id": id, "status": "scheduled" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .admin(reqwest::Method::DELETE, "/api/admin/maintenance", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ID is required");

    let (status, _) = server
        .admin(
            reqwest::Method::DELETE,
            &format!("/api/admin/maintenance?id={id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = server.admin(reqwest::Method::GET, "/api/admin/maintenance", None).await;
    assert!(body["maintenance"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn cron_check_needs_the_secret() {
    let server = TestServer::start().await;

    let (status, _) = server.get("/api/cron/check").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = server
        .client
        .post(server.url("/api/cron/check"))
        .bearer_auth(CRON_SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), ComponentType::ALL.len());
    assert!(results.iter().all(|r| r["status"] == "major_outage"));
    assert_eq!(body["changes"], ComponentType::ALL.len());

    let (_, body) = server.get("/api/status").await;
    assert_eq!(body["status"], "major_outage");
}

#[tokio::test]
async fn subscription_flow_without_mailer() {
    let server = TestServer::start().await;

    let subscribe = |email: &'static str| {
        server
            .client
            .post(server.url("/api/subscribe"))
            .json(&json!({ "email": email, "components": ["api"] }))
            .send()
    };

    let response = subscribe("Reader@Example.com").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Subscribed successfully!");

    let body: Value = subscribe("reader@example.com").await.unwrap().json().await.unwrap();
    assert_eq!(body["message"], "You are already subscribed to status updates.");

    let response = subscribe("not-an-email").await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn token_links_redirect_to_the_subscribe_page() {
    let server = TestServer::start().await;

    assert_eq!(
        server.location("/api/subscribe/verify").await,
        "/subscribe?error=invalid_token"
    );
    assert_eq!(
        server.location("/api/subscribe/verify?token=unknown").await,
        "/subscribe?error=invalid_token"
    );
    assert_eq!(
        server.location("/api/subscribe/unsubscribe").await,
        "/subscribe?error=invalid_token"
    );
    assert_eq!(
        server.location("/api/subscribe/unsubscribe?token=unknown").await,
        "/subscribe?error=not_found"
    );

    let response = server
        .client
        .post(server.url("/api/subscribe/unsubscribe"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Token is required");
}
