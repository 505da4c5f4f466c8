//! In-process stand-in for the GitHub API used by the unit tests.
//!
//! Serves `/search/issues` keyed by the label in the `q` parameter and
//! `/repos/:owner/:name/languages` keyed by `owner/name`. The literal
//! `{base}` in any JSON reply is replaced by the server's own base URL so
//! fixtures can point `repository_url` back at the mock.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the mock answers one route.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 200 with this JSON body.
    Json(Value),
    /// 200 with this raw body.
    Raw(String),
    /// Empty body with this status.
    Status(u16),
    /// Never answers.
    Hang,
}

/// Builder for a mock GitHub server.
#[derive(Debug, Clone, Default)]
pub struct MockGitHub {
    searches: HashMap<String, MockReply>,
    languages: HashMap<String, MockReply>,
}

impl MockGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply for the search whose query names `label`.
    pub fn search(mut self, label: &str, reply: MockReply) -> Self {
        self.searches.insert(label.to_string(), reply);
        self
    }

    /// Reply for `GET /repos/<repo>/languages`.
    pub fn languages(mut self, repo: &str, reply: MockReply) -> Self {
        self.languages.insert(repo.to_string(), reply);
        self
    }

    /// Bind to an ephemeral local port and serve in the background.
    pub async fn start(self) -> MockServer {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let state = Arc::new(MockState {
            mock: self,
            base_url: base_url.clone(),
            hits: Mutex::new(HashMap::new()),
            authorizations: Mutex::new(Vec::new()),
            search_params: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/search/issues", get(search_handler))
            .route("/repos/:owner/:name/languages", get(languages_handler))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockServer { base_url, state }
    }
}

/// A running mock with request bookkeeping.
pub struct MockServer {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockServer {
    /// Requests seen for `search:<label>` or `languages:<owner>/<name>`.
    pub fn hits(&self, key: &str) -> usize {
        self.state.hits.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    /// `Authorization` header of every request, in arrival order.
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.state.authorizations.lock().unwrap().clone()
    }

    /// Query parameters of every search request, in arrival order.
    pub fn search_params(&self) -> Vec<HashMap<String, String>> {
        self.state.search_params.lock().unwrap().clone()
    }

    /// API URL of a repository on this server.
    pub fn repo_url(&self, repo: &str) -> String {
        format!("{}/repos/{}", self.base_url, repo)
    }
}

struct MockState {
    mock: MockGitHub,
    base_url: String,
    hits: Mutex<HashMap<String, usize>>,
    authorizations: Mutex<Vec<Option<String>>>,
    search_params: Mutex<Vec<HashMap<String, String>>>,
}

impl MockState {
    fn record(&self, key: String, headers: &HeaderMap) {
        *self.hits.lock().unwrap().entry(key).or_default() += 1;
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.authorizations.lock().unwrap().push(auth);
    }

    async fn reply(&self, reply: Option<MockReply>) -> Response {
        match reply {
            None => StatusCode::NOT_FOUND.into_response(),
            Some(MockReply::Json(value)) => {
                let body = value.to_string().replace("{base}", &self.base_url);
                ([(header::CONTENT_TYPE, "application/json")], body).into_response()
            }
            Some(MockReply::Raw(body)) => body.into_response(),
            Some(MockReply::Status(code)) => StatusCode::from_u16(code).unwrap().into_response(),
            Some(MockReply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                StatusCode::GATEWAY_TIMEOUT.into_response()
            }
        }
    }
}

/// Pull the label out of `label:"<label>"` in a search query.
fn label_from_query(q: &str) -> String {
    q.split_once("label:\"")
        .and_then(|(_, rest)| rest.split_once('"'))
        .map(|(label, _)| label.to_string())
        .unwrap_or_default()
}

async fn search_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let label = label_from_query(params.get("q").map(String::as_str).unwrap_or(""));
    state.record(format!("search:{}", label), &headers);
    state.search_params.lock().unwrap().push(params);

    let reply = state.mock.searches.get(&label).cloned();
    state.reply(reply).await
}

async fn languages_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path((owner, name)): Path<(String, String)>,
) -> Response {
    let repo = format!("{}/{}", owner, name);
    state.record(format!("languages:{}", repo), &headers);

    let reply = state.mock.languages.get(&repo).cloned();
    state.reply(reply).await
}

/// Search item fixture whose repository lives on the mock server.
pub fn search_item(title: &str, url: &str, repo: &str) -> Value {
    json!({
        "title": title,
        "created_at": "2024-10-01T12:00:00Z",
        "url": url,
        "html_url": url.replace("api.", ""),
        "repository_url": format!("{{base}}/repos/{}", repo),
    })
}

/// Search reply with the given items.
pub fn search_page(items: Vec<Value>) -> MockReply {
    let total = items.len();
    MockReply::Json(json!({ "total_count": total, "items": items }))
}
