use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::article::WikiArticle;
use crate::session::Session;

#[derive(Clone, Debug, PartialEq)]
pub enum PublishOutcome {
    Success,
    AlreadyExists,
    AuthFailure(String),
    NetworkFailure(String),
    UnexpectedResponse(Value),
}

impl PublishOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self, PublishOutcome::Success | PublishOutcome::AlreadyExists)
    }
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishOutcome::Success => f.write_str("created"),
            PublishOutcome::AlreadyExists => f.write_str("already exists"),
            PublishOutcome::AuthFailure(detail) => write!(f, "not authorized: {detail}"),
            PublishOutcome::NetworkFailure(detail) => write!(f, "network error: {detail}"),
            PublishOutcome::UnexpectedResponse(payload) => {
                write!(f, "unexpected response: {payload}")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ErrorKind {
    Exists,
    Auth,
}

/// API error codes we know how to read. Anything else is reported as an
/// unexpected response.
const ERROR_CODES: &[(&str, ErrorKind)] = &[
    ("articleexists", ErrorKind::Exists),
    ("badtoken", ErrorKind::Auth),
    ("notloggedin", ErrorKind::Auth),
    ("assertuserfailed", ErrorKind::Auth),
    ("assertbotfailed", ErrorKind::Auth),
    ("permissiondenied", ErrorKind::Auth),
    ("blocked", ErrorKind::Auth),
    ("autoblocked", ErrorKind::Auth),
];

fn error_kind(code: &str) -> Option<ErrorKind> {
    ERROR_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, kind)| *kind)
}

pub fn classify(body: Value) -> PublishOutcome {
    if let Some(error) = body.get("error") {
        let code = error.get("code").and_then(Value::as_str).unwrap_or_default();
        return match error_kind(code) {
            Some(ErrorKind::Exists) => PublishOutcome::AlreadyExists,
            Some(ErrorKind::Auth) => {
                let info = error.get("info").and_then(Value::as_str).unwrap_or_default();
                PublishOutcome::AuthFailure(format!("{code}: {info}"))
            }
            None => PublishOutcome::UnexpectedResponse(body),
        };
    }

    if body.pointer("/edit/result").and_then(Value::as_str) == Some("Success") {
        PublishOutcome::Success
    } else {
        PublishOutcome::UnexpectedResponse(body)
    }
}

pub async fn publish(session: &Session, article: &WikiArticle, summary: &str) -> PublishOutcome {
    let resp = session
        .client()
        .post(session.api_url().clone())
        .form(&[
            ("action", "edit"),
            ("title", &*article.title),
            ("text", &*article.content),
            ("summary", summary),
            ("createonly", "1"),
            ("bot", "1"),
            ("assert", "user"),
            ("token", session.csrf_token()),
            ("format", "json"),
        ])
        .send()
        .await;

    let resp = match resp {
        Ok(resp) => resp,
        Err(e) => return PublishOutcome::NetworkFailure(e.to_string()),
    };
    let status = resp.status();
    let text = match resp.text().await {
        Ok(text) => text,
        Err(e) => return PublishOutcome::NetworkFailure(e.to_string()),
    };
    debug!(title = %article.title, %status, "edit response");

    match serde_json::from_str(&text) {
        Ok(body) => classify(body),
        Err(_) if !status.is_success() => {
            PublishOutcome::NetworkFailure(format!("server responded with {status}"))
        }
        Err(_) => PublishOutcome::UnexpectedResponse(Value::String(text)),
    }
}
