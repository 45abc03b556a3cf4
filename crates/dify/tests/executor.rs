//! Retry policy tests against a scripted authenticator.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use dify::error::{AuthError, Error};
use dify::executor::{Authenticator, Bearer, Executor};
use dify::http::{RequestDescriptor, Transport};
use dify::{ApiKey, BaseUrl, ClientConfig};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Hands out `token-<generation>` and bumps the generation on renew.
struct Scripted {
    generation: AtomicU64,
    renewals: AtomicUsize,
    renew_fails: bool,
}

impl Scripted {
    fn new(renew_fails: bool) -> Self {
        Self {
            generation: AtomicU64::new(1),
            renewals: AtomicUsize::new(0),
            renew_fails,
        }
    }
}

#[async_trait]
impl Authenticator for Scripted {
    async fn authorize(&self, transport: &Transport) -> dify::Result<Bearer> {
        Ok(match transport {
            Transport::Console => {
                let generation = self.generation.load(Ordering::SeqCst);
                Bearer::versioned(format!("token-{}", generation), generation)
            }
            Transport::App(key) => Bearer::fixed(key.as_str()),
            Transport::DatasetApiKey => Bearer::fixed("dataset-key"),
            Transport::Anonymous => Bearer::none(),
        })
    }

    async fn renew(&self, _expired: &Bearer) -> dify::Result<()> {
        self.renewals.fetch_add(1, Ordering::SeqCst);
        if self.renew_fails {
            return Err(AuthError::RefreshRejected {
                reason: "revoked".into(),
            }
            .into());
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn executor(server: &MockServer) -> Executor {
    Executor::new(&ClientConfig::new(BaseUrl::new(server.uri()).unwrap())).unwrap()
}

fn console_get() -> dify::Result<RequestDescriptor> {
    Ok(RequestDescriptor::get(Transport::Console, "apps"))
}

#[tokio::test]
async fn test_success_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/console/api/apps"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let auth = Scripted::new(false);
    executor(&server).execute(&auth, console_get).await.unwrap();
    assert_eq!(auth.renewals.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_replay_carries_renewed_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/console/api/apps"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/console/api/apps"))
        .and(header("authorization", "Bearer token-2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let auth = Scripted::new(false);
    executor(&server).execute(&auth, console_get).await.unwrap();
    assert_eq!(auth.renewals.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_at_most_two_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/console/api/apps"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let auth = Scripted::new(false);
    let err = executor(&server).execute(&auth, console_get).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(auth.renewals.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_renew_is_wrapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/console/api/apps"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let auth = Scripted::new(true);
    let err = executor(&server).execute(&auth, console_get).await.unwrap_err();

    assert!(err.is_auth_fatal());
    assert!(matches!(err, Error::Operation { operation, .. } if operation == "refresh console access token"));
}

#[tokio::test]
async fn test_static_transports_are_never_renewed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/workflows/run"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/datasets"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let auth = Scripted::new(false);
    let executor = executor(&server);

    let app = executor
        .execute(&auth, || {
            Ok(RequestDescriptor::post(
                Transport::App(ApiKey::new("app-key")),
                "workflows/run",
            ))
        })
        .await
        .unwrap_err();
    let dataset = executor
        .execute(&auth, || {
            Ok(RequestDescriptor::post(Transport::DatasetApiKey, "datasets"))
        })
        .await
        .unwrap_err();

    assert_eq!(app.status(), Some(401));
    assert_eq!(dataset.status(), Some(401));
    assert_eq!(auth.renewals.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_other_statuses_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/console/api/apps"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "code": "forbidden",
            "message": "no access",
            "status": 403
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = Scripted::new(false);
    let err = executor(&server).execute(&auth, console_get).await.unwrap_err();

    match err.root() {
        Error::Api(api) => {
            assert_eq!(api.status, 403);
            assert_eq!(api.code, "forbidden");
            assert_eq!(api.message, "no access");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(auth.renewals.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_transport_errors_are_returned_immediately() {
    // Bind and release a port so nothing is listening on it.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ClientConfig::new(BaseUrl::new(format!("http://127.0.0.1:{}", port)).unwrap());

    let auth = Scripted::new(false);
    let err = Executor::new(&config)
        .unwrap()
        .execute(&auth, console_get)
        .await
        .unwrap_err();

    assert!(matches!(err.root(), Error::Transport(_)));
    assert_eq!(auth.renewals.load(Ordering::SeqCst), 0);
}
