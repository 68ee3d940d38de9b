//! A tiny in-process stand-in for a MediaWiki `api.php`.
//!
//! It implements just enough of the login handshake and `action=edit` to
//! exercise the real HTTP code: a pre-login cookie tied to the login token,
//! a session cookie set on login, csrf tokens only for logged-in sessions and
//! `createonly` page creation.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use url::Url;

pub const USERNAME: &str = "IEFBot@publisher";
pub const PASSWORD: &str = "correct horse";
pub const LOGIN_TOKEN: &str = "b1ab5ec2d3f0+\\";
pub const CSRF_TOKEN: &str = "9ed1499d99c0+\\";

/// Ways to make one handshake step misbehave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    LoginTokenStatus,
    LoginTokenMalformed,
    LoginTokenMissing,
    LoginStatus,
    LoginMalformed,
    /// Login succeeds but no session cookie is set.
    LoginForgetsCookie,
    CsrfStatus,
    CsrfMalformed,
    CsrfMissing,
}

#[derive(Default)]
struct Inner {
    pages: HashMap<String, String>,
    fault: Option<Fault>,
    /// Replaces the normal `action=edit` handling.
    edit_override: Option<(StatusCode, String)>,
    user_agents: Vec<String>,
    actions: Vec<String>,
    edits: Vec<HashMap<String, String>>,
    archived: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeWiki {
    inner: Arc<Mutex<Inner>>,
}

impl FakeWiki {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fault(self, fault: Fault) -> Self {
        self.inner.lock().unwrap().fault = Some(fault);
        self
    }

    pub fn override_edit(&self, status: StatusCode, body: impl Into<String>) {
        self.inner.lock().unwrap().edit_override = Some((status, body.into()));
    }

    pub fn add_page(&self, title: &str, text: &str) {
        self.inner
            .lock()
            .unwrap()
            .pages
            .insert(title.to_owned(), text.to_owned());
    }

    pub fn page(&self, title: &str) -> Option<String> {
        self.inner.lock().unwrap().pages.get(title).cloned()
    }

    pub fn user_agents(&self) -> Vec<String> {
        self.inner.lock().unwrap().user_agents.clone()
    }

    /// `action` of every request received, in order.
    pub fn actions(&self) -> Vec<String> {
        self.inner.lock().unwrap().actions.clone()
    }

    /// Form bodies of every `action=edit` request received.
    pub fn edits(&self) -> Vec<HashMap<String, String>> {
        self.inner.lock().unwrap().edits.clone()
    }

    /// URLs snapshot requests were made for, through `/save/<url>`.
    pub fn archived(&self) -> Vec<String> {
        self.inner.lock().unwrap().archived.clone()
    }

    /// Serves on an ephemeral port and returns the `api.php` URL.
    pub async fn spawn(&self) -> Url {
        let app = Router::new()
            .route("/w/api.php", get(api_get).post(api_post))
            .fallback(save)
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/w/api.php")).unwrap()
    }

    fn record(&self, headers: &HeaderMap, params: &HashMap<String, String>) {
        let mut inner = self.inner.lock().unwrap();
        let ua = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        inner.user_agents.push(ua);
        let action = params.get("action").cloned().unwrap_or_default();
        let action = match params.get("type") {
            Some(ty) => format!("{action}:{ty}"),
            None => action,
        };
        inner.actions.push(action);
    }

    fn fault(&self) -> Option<Fault> {
        self.inner.lock().unwrap().fault
    }
}

/// Archive base URL served next to `api`.
pub fn archive_base(api: &Url) -> String {
    format!("{}save/", api.join("/").unwrap())
}

async fn save(State(wiki): State<FakeWiki>, uri: Uri) -> StatusCode {
    match uri.path().strip_prefix("/save/") {
        Some(url) => {
            wiki.inner.lock().unwrap().archived.push(url.to_owned());
            StatusCode::OK
        }
        None => StatusCode::NOT_FOUND,
    }
}

fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|kv| kv.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_owned())
}

fn logged_in(headers: &HeaderMap) -> bool {
    cookie(headers, "wiki_session").as_deref() == Some("logged-in")
}

async fn api_get(
    State(wiki): State<FakeWiki>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    wiki.record(&headers, &params);

    let is_tokens = params.get("action").map(String::as_str) == Some("query")
        && params.get("meta").map(String::as_str) == Some("tokens");
    if !is_tokens {
        return Json(json!({ "error": { "code": "badvalue", "info": "unsupported" } }))
            .into_response();
    }

    if params.get("type").map(String::as_str) == Some("login") {
        return match wiki.fault() {
            Some(Fault::LoginTokenStatus) => {
                (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response()
            }
            Some(Fault::LoginTokenMalformed) => (StatusCode::OK, "<html>").into_response(),
            Some(Fault::LoginTokenMissing) => {
                Json(json!({ "batchcomplete": "", "query": { "tokens": {} } })).into_response()
            }
            _ => (
                [(header::SET_COOKIE, "wiki_prelogin=pending; Path=/; HttpOnly")],
                Json(json!({
                    "batchcomplete": "",
                    "query": { "tokens": { "logintoken": LOGIN_TOKEN } }
                })),
            )
                .into_response(),
        };
    }

    match wiki.fault() {
        Some(Fault::CsrfStatus) => {
            return (StatusCode::BAD_GATEWAY, "bad gateway").into_response()
        }
        Some(Fault::CsrfMalformed) => return (StatusCode::OK, "{\"query\"").into_response(),
        Some(Fault::CsrfMissing) => {
            return Json(json!({ "batchcomplete": "", "query": { "tokens": {} } }))
                .into_response()
        }
        _ => {}
    }

    let token = if logged_in(&headers) { CSRF_TOKEN } else { "+\\" };
    Json(json!({
        "batchcomplete": "",
        "query": { "tokens": { "csrftoken": token } }
    }))
    .into_response()
}

async fn api_post(
    State(wiki): State<FakeWiki>,
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    wiki.record(&headers, &params);
    match params.get("action").map(String::as_str) {
        Some("login") => login(&wiki, &headers, &params),
        Some("edit") => edit(&wiki, &headers, params),
        _ => Json(json!({ "error": { "code": "badvalue", "info": "unsupported" } }))
            .into_response(),
    }
}

fn login(wiki: &FakeWiki, headers: &HeaderMap, params: &HashMap<String, String>) -> Response {
    match wiki.fault() {
        Some(Fault::LoginStatus) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "oops").into_response()
        }
        Some(Fault::LoginMalformed) => return (StatusCode::OK, "{\"login\":").into_response(),
        _ => {}
    }

    // the login token is only valid together with the cookie it was issued with
    let token_ok = params.get("lgtoken").map(String::as_str) == Some(LOGIN_TOKEN)
        && cookie(headers, "wiki_prelogin").is_some();
    if !token_ok {
        return Json(json!({
            "login": {
                "result": "Failed",
                "reason": "Unable to continue login. Your session most likely timed out."
            }
        }))
        .into_response();
    }

    let creds_ok = params.get("lgname").map(String::as_str) == Some(USERNAME)
        && params.get("lgpassword").map(String::as_str) == Some(PASSWORD);
    if !creds_ok {
        return Json(json!({
            "login": {
                "result": "Failed",
                "reason": "Incorrect username or password entered. Please try again."
            }
        }))
        .into_response();
    }

    let body = Json(json!({
        "login": { "result": "Success", "lguserid": 7, "lgusername": "IEFBot" }
    }));
    if wiki.fault() == Some(Fault::LoginForgetsCookie) {
        return body.into_response();
    }
    (
        [(header::SET_COOKIE, "wiki_session=logged-in; Path=/; HttpOnly")],
        body,
    )
        .into_response()
}

fn edit(wiki: &FakeWiki, headers: &HeaderMap, params: HashMap<String, String>) -> Response {
    let mut inner = wiki.inner.lock().unwrap();
    inner.edits.push(params.clone());

    if let Some((status, body)) = inner.edit_override.clone() {
        return (status, body).into_response();
    }

    if !logged_in(headers) {
        return Json(json!({
            "error": {
                "code": "assertuserfailed",
                "info": "You are no longer logged in, so the action could not be completed."
            }
        }))
        .into_response();
    }
    if params.get("token").map(String::as_str) != Some(CSRF_TOKEN) {
        return Json(json!({ "error": { "code": "badtoken", "info": "Invalid CSRF token." } }))
            .into_response();
    }

    let title = params.get("title").cloned().unwrap_or_default();
    let text = params.get("text").cloned().unwrap_or_default();
    let create_only = params.contains_key("createonly");
    if create_only && inner.pages.contains_key(&title) {
        return Json(json!({
            "error": {
                "code": "articleexists",
                "info": "The article you tried to create has been created already."
            }
        }))
        .into_response();
    }
    inner.pages.insert(title.clone(), text);
    let pageid = inner.pages.len();
    Json(json!({
        "edit": {
            "new": "",
            "result": "Success",
            "pageid": pageid,
            "title": title,
            "contentmodel": "wikitext"
        }
    }))
    .into_response()
}
