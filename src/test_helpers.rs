//! Scripted transport, recording hooks and a fixture guard for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::config::GuardConfig;
use crate::error::GuardError;
use crate::guard::{GuardHooks, SessionGuard};
use crate::hooks::{Navigator, Notifier};
use crate::net::{ApiResponse, GuardedClient, HttpTransport, OutboundRequest};
use crate::session::{KeyValueStore, MemoryStore, Session, SessionStorage, TOKEN_KEY};

pub const TEST_TOKEN: &str = "test-token";

// =========================================================================
// ScriptedTransport
// =========================================================================

enum Scripted {
    Reply(StatusCode, Vec<u8>),
    Fail(String),
}

/// Replies per URL path from a queue; an empty queue replies `200 {}`.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply_json(&self, path: &str, status: u16, body: &Value) {
        self.reply_raw(path, status, body.to_string().as_bytes());
    }

    pub fn reply_raw(&self, path: &str, status: u16, body: &[u8]) {
        let status = StatusCode::from_u16(status).unwrap();
        self.push(path, Scripted::Reply(status, body.to_vec()));
    }

    pub fn fail(&self, path: &str, message: &str) {
        self.push(path, Scripted::Fail(message.to_string()));
    }

    fn push(&self, path: &str, scripted: Scripted) {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(scripted);
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_for(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == path)
            .count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<ApiResponse, GuardError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .replies
            .lock()
            .unwrap()
            .get_mut(request.url.path())
            .and_then(VecDeque::pop_front);
        match next {
            Some(Scripted::Reply(status, body)) => Ok(ApiResponse { status, url: request.url, body }),
            Some(Scripted::Fail(message)) => Err(GuardError::Transport(message)),
            None => Ok(ApiResponse { status: StatusCode::OK, url: request.url, body: b"{}".to_vec() }),
        }
    }
}

// =========================================================================
// Recording hooks and store
// =========================================================================

#[derive(Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn replace(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Memory store that counts token removals (one per storage clear).
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    pub token_clears: AtomicUsize,
}

impl KeyValueStore for CountingStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), GuardError> {
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), GuardError> {
        if key == TOKEN_KEY {
            self.token_clears.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.remove_item(key)
    }
}

// =========================================================================
// Fixture
// =========================================================================

pub fn test_config() -> GuardConfig {
    let mut config = GuardConfig::from_lookup(|_| None).unwrap();
    config.poll_interval = Duration::from_secs(10);
    config.dedupe_window = Duration::from_secs(2);
    config.session_file = std::env::temp_dir().join("stickkery-unused.json");
    config
}

pub struct Fixture {
    pub guard: Arc<SessionGuard>,
    pub client: GuardedClient,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<CountingStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(&test_config())
    }

    pub fn with_config(config: &GuardConfig) -> Self {
        let transport = ScriptedTransport::new();
        let store = Arc::new(CountingStore::default());
        let storage = SessionStorage::new(store.clone());
        let navigator = Arc::new(RecordingNavigator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let hooks = GuardHooks { navigator: navigator.clone(), notifier: notifier.clone() };
        let guard = SessionGuard::new(config, storage.clone(), transport.clone(), hooks).unwrap();
        let client = GuardedClient::new(config.base_url.clone(), transport.clone(), storage);
        Self { guard, client, transport, store, navigator, notifier }
    }

    /// Store a session as a successful login would, without arming.
    pub fn store_session(&self) {
        let session = Session { token: TEST_TOKEN.into(), user: json!({ "name": "Test Admin" }) };
        self.guard.storage().save(&session).unwrap();
    }

    pub fn token_clears(&self) -> usize {
        self.store.token_clears.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigator.routes.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notifier.messages.lock().unwrap().clone()
    }
}
