//! Mock backend shared by the integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use skillatics::api::{ApiClient, RetryPolicy};
use skillatics::auth::{KeyValueStore, MemoryStore, Role, SessionStore, User};
use skillatics::config::ClientConfig;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One request as the mock saw it
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestLog(Arc<Mutex<Vec<Seen>>>);

impl RequestLog {
    pub fn all(&self) -> Vec<Seen> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.all().iter().filter(|s| s.path == path).count()
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn record(State(log): State<RequestLog>, request: Request, next: Next) -> Response {
    // Nothing borrowed from `request` may live across the await below
    let seen = Seen {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        authorization: header(request.headers(), "authorization"),
        request_id: header(request.headers(), "x-request-id"),
    };
    log.0.lock().unwrap().push(seen);
    next.run(request).await
}

/// Serve `routes` under `/api` on an ephemeral port
pub async fn serve(routes: Router) -> (String, RequestLog) {
    let log = RequestLog::default();
    let app = Router::new()
        .nest("/api", routes)
        .layer(middleware::from_fn_with_state(log.clone(), record));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/api"), log)
}

pub fn student() -> User {
    User {
        id: "64f0000000000000000000a1".to_string(),
        name: "Asha Rao".to_string(),
        email: "asha@college.edu".to_string(),
        role: Role::Student,
        department: Some("CSE".to_string()),
        mobile: None,
        gender: None,
        division: Some("A".to_string()),
        roll_no: None,
        year_of_study: None,
    }
}

pub fn fast_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        api_base_url: base_url.to_string(),
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        },
        ..ClientConfig::default()
    }
}

/// Client over an in-memory session, optionally logged in
pub fn client(base_url: &str, logged_in: Option<User>) -> (ApiClient, Arc<MemoryStore>) {
    let storage = Arc::new(MemoryStore::new());
    let session = SessionStore::hydrate(storage.clone() as Arc<dyn KeyValueStore>).unwrap();
    if let Some(user) = logged_in {
        session.save_auth("tok-1", &user).unwrap();
    }
    let client = ApiClient::new(&fast_config(base_url), Arc::new(session)).unwrap();
    (client, storage)
}
