//! Login token, login, csrf token. All through one client so the edit later
//! goes out with the same cookie jar.

use std::fmt;
use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::http_client_builder;

/// What MediaWiki hands out as a csrf token to logged-out users.
const ANONYMOUS_TOKEN: &str = "+\\";

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    LoginToken,
    Login,
    CsrfToken,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::LoginToken => "fetching login token",
            Step::Login => "logging in",
            Step::CsrfToken => "fetching csrf token",
        })
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("could not build HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("{step}: request failed")]
    Transport {
        step: Step,
        #[source]
        source: reqwest::Error,
    },
    #[error("{step}: server responded with {status}")]
    Status { step: Step, status: StatusCode },
    #[error("{step}: response is not valid JSON")]
    Malformed {
        step: Step,
        #[source]
        source: serde_json::Error,
    },
    #[error("{step}: response has no `{key}`")]
    MissingKey { step: Step, key: &'static str },
    #[error("login rejected: {0}")]
    LoginRejected(String),
    #[error("login did not stick, the wiki still treats us as anonymous")]
    Anonymous,
}

impl AuthError {
    pub fn step(&self) -> Option<Step> {
        match self {
            AuthError::Transport { step, .. }
            | AuthError::Status { step, .. }
            | AuthError::Malformed { step, .. }
            | AuthError::MissingKey { step, .. } => Some(*step),
            AuthError::LoginRejected(_) => Some(Step::Login),
            AuthError::Anonymous => Some(Step::CsrfToken),
            AuthError::Client(_) => None,
        }
    }
}

pub struct Session {
    client: reqwest::Client,
    api_url: Url,
    csrf_token: String,
}

impl Session {
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_url", &self.api_url.as_str())
            .finish_non_exhaustive()
    }
}

pub async fn authenticate(
    api_url: &Url,
    credentials: &Credentials,
    timeout: Duration,
) -> Result<Session, AuthError> {
    let client = http_client_builder(timeout)
        .cookie_store(true)
        .build()
        .map_err(AuthError::Client)?;

    let body = send(
        Step::LoginToken,
        client.get(api_url.clone()).query(&[
            ("action", "query"),
            ("meta", "tokens"),
            ("type", "login"),
            ("format", "json"),
        ]),
    )
    .await?;
    let login_token = string_at(Step::LoginToken, &body, "/query/tokens/logintoken")?;
    debug!("got login token");

    let body = send(
        Step::Login,
        client.post(api_url.clone()).form(&[
            ("action", "login"),
            ("lgname", &*credentials.username),
            ("lgpassword", &*credentials.password),
            ("lgtoken", &*login_token),
            ("format", "json"),
        ]),
    )
    .await?;
    let result = string_at(Step::Login, &body, "/login/result")?;
    if result != "Success" {
        let reason = match body.pointer("/login/reason") {
            Some(Value::String(reason)) => reason.clone(),
            Some(other) => other.to_string(),
            None => result,
        };
        return Err(AuthError::LoginRejected(reason));
    }
    debug!(user = %credentials.username, "login accepted");

    let body = send(
        Step::CsrfToken,
        client
            .get(api_url.clone())
            .query(&[("action", "query"), ("meta", "tokens"), ("format", "json")]),
    )
    .await?;
    let csrf_token = string_at(Step::CsrfToken, &body, "/query/tokens/csrftoken")?;
    if csrf_token == ANONYMOUS_TOKEN {
        return Err(AuthError::Anonymous);
    }

    Ok(Session {
        client,
        api_url: api_url.clone(),
        csrf_token,
    })
}

async fn send(step: Step, req: RequestBuilder) -> Result<Value, AuthError> {
    let resp = req
        .send()
        .await
        .map_err(|source| AuthError::Transport { step, source })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(AuthError::Status { step, status });
    }
    let text = resp
        .text()
        .await
        .map_err(|source| AuthError::Transport { step, source })?;
    serde_json::from_str(&text).map_err(|source| AuthError::Malformed { step, source })
}

fn string_at(step: Step, body: &Value, pointer: &'static str) -> Result<String, AuthError> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or(AuthError::MissingKey {
            step,
            key: pointer.rsplit('/').next().unwrap_or(pointer),
        })
}
