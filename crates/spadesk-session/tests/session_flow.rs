use std::sync::{Arc, Mutex};
use std::time::Duration;

use jsonwebtoken::{EncodingKey, Header};
use serde_json::json;
use spadesk_api::{DurableStorage, Navigator, Role, STORAGE_KEY_TOKEN, SpaError};
use spadesk_connectors::{MemoryStorage, ReqwestTransport, TracingNotifier};
use spadesk_core::ClientConfig;
use spadesk_session::SpaContext;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn mint(role: &str) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        &json!({"userId": 11, "role": role, "spaId": "7", "exp": i64::MAX}),
        &EncodingKey::from_secret(b"integration"),
    )
    .unwrap()
}

#[derive(Default)]
struct Paths(Mutex<Vec<String>>);

impl Navigator for Paths {
    fn navigate(&self, path: &str) {
        self.0.lock().unwrap().push(path.to_string());
    }
}

struct Client {
    ctx: SpaContext,
    storage: Arc<MemoryStorage>,
    paths: Arc<Paths>,
}

fn client(server: &MockServer, tenant: Option<&str>) -> Client {
    let config = ClientConfig {
        api_url: format!("{}/api", server.uri()),
        default_tenant: tenant.map(ToString::to_string),
        ..ClientConfig::default()
    };
    let storage = Arc::new(MemoryStorage::new());
    let paths = Arc::new(Paths::default());
    let transport = ReqwestTransport::new(&config.api_url, Duration::from_secs(5)).unwrap();
    let ctx = SpaContext::from_config(
        &config,
        storage.clone(),
        Arc::new(transport),
        Arc::new(TracingNotifier),
        paths.clone(),
    )
    .unwrap();
    Client {
        ctx,
        storage,
        paths,
    }
}

fn has_query(req: &Request, key: &str) -> bool {
    req.url.query_pairs().any(|(k, _)| k == key)
}

#[tokio::test]
async fn master_admin_login_then_platform_listing() {
    let server = MockServer::start().await;
    let token = mint("MasterAdmin");
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": token,
            "user": {"fullName": "Ana Ortiz", "email": "ana@example.com", "role": "MasterAdmin"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/master-admin/spas"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7}])))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server, Some("7"));
    let identity = c.ctx.login("ana@example.com", "secret1").await.unwrap();
    assert_eq!(identity.role, Role::MasterAdmin);
    assert_eq!(identity.subject_id, "11");
    assert_eq!(*c.paths.0.lock().unwrap(), vec!["/master-admin"]);

    let spas = c.ctx.storefront().master_spas().await.unwrap();
    assert_eq!(spas, json!([{"id": 7}]));

    for req in server.received_requests().await.unwrap() {
        assert!(!has_query(&req, "spaId"), "{}", req.url);
    }
}

#[tokio::test]
async fn booking_listing_is_scoped_to_tenant() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/my"))
        .and(query_param("spaId", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server, Some("7"));
    assert_eq!(c.ctx.storefront().my_bookings().await.unwrap(), json!([]));
}

#[tokio::test]
async fn explicit_tenant_beats_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/services"))
        .and(query_param("spaId", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server, Some("7"));
    c.ctx.tenants().set_explicit_from_query("?spaId=12&ref=home");

    c.ctx.storefront().list_services().await.unwrap();
}

#[tokio::test]
async fn unauthorized_drops_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": mint("SpaAdmin"), "user": {}})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/bookings"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})),
        )
        .mount(&server)
        .await;

    let c = client(&server, Some("7"));
    c.ctx.login("admin@lotus.example", "secret1").await.unwrap();
    assert_eq!(*c.paths.0.lock().unwrap(), vec!["/admin/dashboard"]);

    let err = c.ctx.storefront().admin_bookings().await.unwrap_err();

    assert!(matches!(err, SpaError::Unauthorized { .. }));
    assert!(!c.ctx.session().is_authenticated());
    assert!(c.storage.get(STORAGE_KEY_TOKEN).unwrap().is_none());
    assert!(c.storage.keys().is_empty());
    assert_eq!(c.paths.0.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn no_tenant_means_no_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server, None);
    assert_eq!(
        c.ctx.storefront().list_services().await.unwrap(),
        json!([{"id": 1}])
    );

    let received = server.received_requests().await.unwrap();
    assert!(!has_query(&received[0], "spaId"));
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn rejected_login_reports_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid email or password"})),
        )
        .mount(&server)
        .await;

    let c = client(&server, None);
    let err = c.ctx.login("ana@example.com", "wrong").await.unwrap_err();

    assert_eq!(
        err,
        SpaError::AuthenticationFailed {
            message: "Invalid email or password".to_string()
        }
    );
    assert!(c.paths.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let server = MockServer::start().await;
    let c = client(&server, None);
    drop(server);

    let err = c.ctx.storefront().list_services().await.unwrap_err();
    assert!(matches!(err, SpaError::Network { .. }));
}
