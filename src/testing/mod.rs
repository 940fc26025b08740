use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use crate::auth::{JwtSessionVerifier, SessionIssuer, SESSION_COOKIE};
use crate::config::AppConfig;
use crate::identity::{AuthorizationRequest, ExternalIdentity, IdentityError, IdentityProvider};
use crate::middleware::{RequestGate, ROUTES};
use crate::process::{Pm2Process, ProcessError, ProcessManager};
use crate::state::AppState;
use crate::storage::{BackupObject, BackupStore, BackupTrigger, StoreError, StoreOperation, TriggerError};

pub const TEST_SECRET: &str = "test-session-secret";
pub const OPERATOR_ID: &str = "operator-1";

/// In-memory backup store recording deletions.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Vec<BackupObject>,
    pub prefix: Option<String>,
    pub deleted: Mutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl BackupStore for MemoryStore {
    async fn list(&self, max_keys: usize) -> Result<Vec<BackupObject>, StoreError> {
        if self.fail {
            return Err(StoreError::backend(StoreOperation::List, "list failed"));
        }
        Ok(self.objects.iter().take(max_keys).cloned().collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::backend(StoreOperation::Delete, "delete failed"));
        }
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn download_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError> {
        if self.fail {
            return Err(StoreError::backend(StoreOperation::Sign, "Signing failed"));
        }
        Ok(format!("https://s3.example.com/test-bucket/{}?expires={}", key, ttl.as_secs()))
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

/// Backup trigger answering with a fixed outcome.
pub enum FakeTrigger {
    Message(Option<String>),
    UpstreamStatus(u16),
}

#[async_trait]
impl BackupTrigger for FakeTrigger {
    async fn trigger(&self) -> Result<Option<String>, TriggerError> {
        match self {
            FakeTrigger::Message(message) => Ok(message.clone()),
            FakeTrigger::UpstreamStatus(code) => Err(TriggerError::Status(*code)),
        }
    }
}

/// Process manager returning a canned `pm2 jlist` payload, or failing.
pub struct FakeProcesses {
    pub jlist: Option<serde_json::Value>,
}

#[async_trait]
impl ProcessManager for FakeProcesses {
    async fn list(&self) -> Result<Vec<Pm2Process>, ProcessError> {
        match &self.jlist {
            Some(value) => {
                let processes: Option<Vec<Pm2Process>> = serde_json::from_value(value.clone())?;
                Ok(processes.unwrap_or_default())
            }
            None => Err(ProcessError::Exit {
                code: Some(1),
                stderr: "PM2 daemon not running".to_string(),
            }),
        }
    }
}

pub const FAKE_STATE: &str = "fake-state";
pub const FAKE_VERIFIER: &str = "fake-verifier";

/// Identity provider that "authenticates" every code as a fixed identity,
/// provided the PKCE verifier it handed out comes back.
pub struct FakeIdentity {
    pub identity_id: String,
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn id(&self) -> &'static str {
        "discord"
    }

    fn begin(&self) -> Result<AuthorizationRequest, IdentityError> {
        Ok(AuthorizationRequest {
            url: format!("https://id.example.com/authorize?state={}", FAKE_STATE),
            state: FAKE_STATE.to_string(),
            pkce_verifier: FAKE_VERIFIER.to_string(),
        })
    }

    async fn exchange(&self, code: &str, pkce_verifier: &str) -> Result<ExternalIdentity, IdentityError> {
        if code == "bad-code" || pkce_verifier != FAKE_VERIFIER {
            return Err(IdentityError::Rejected(400));
        }
        Ok(ExternalIdentity {
            id: self.identity_id.clone(),
            display_name: None,
        })
    }
}

/// Builder for an `AppState` wired to test collaborators.
pub struct TestContext {
    pub config: AppConfig,
    pub store: Arc<MemoryStore>,
    pub trigger: FakeTrigger,
    pub jlist: Option<serde_json::Value>,
    pub identity_id: String,
}

impl TestContext {
    pub fn new() -> Self {
        let mut config = AppConfig::development();
        config.security.session_secret = TEST_SECRET.to_string();
        config.security.allowed_user_id = Some(OPERATOR_ID.to_string());

        Self {
            config,
            store: Arc::new(MemoryStore::default()),
            trigger: FakeTrigger::Message(None),
            jlist: Some(serde_json::json!([])),
            identity_id: OPERATOR_ID.to_string(),
        }
    }

    pub fn with_store(mut self, store: MemoryStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn state(self) -> AppState {
        let verifier = Arc::new(JwtSessionVerifier::new(&self.config.security));
        let gate = RequestGate::new(&ROUTES, verifier, self.config.security.test_mode_bypass);

        AppState {
            sessions: Arc::new(SessionIssuer::new(&self.config.security)),
            gate: Arc::new(gate),
            identity: Arc::new(FakeIdentity {
                identity_id: self.identity_id,
            }),
            backups: self.store,
            trigger: Arc::new(self.trigger),
            processes: Arc::new(FakeProcesses { jlist: self.jlist }),
            config: Arc::new(self.config),
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// `Cookie` header value holding a valid operator session.
pub fn session_cookie(state: &AppState) -> String {
    let token = state.sessions.issue(OPERATOR_ID).expect("issue session");
    format!("{}={}", SESSION_COOKIE, token)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Drive one request through the router, optionally as the signed-in operator.
pub async fn send(router: Router, method: &str, uri: &str, cookie: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let response = router
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse { status, headers, body }
}
