//! Best-effort Wayback Machine snapshots of project websites.

use std::time::Duration;

use tracing::{info, warn};

use crate::{http_client_builder, Result};

pub const WAYBACK_SAVE: &str = "https://web.archive.org/save/";

#[derive(Clone, Debug)]
pub struct Archiver {
    client: reqwest::Client,
    base: String,
}

impl Archiver {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base(WAYBACK_SAVE, timeout)
    }

    pub fn with_base(base: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Archiver {
            client: http_client_builder(timeout).build()?,
            base: base.into(),
        })
    }

    /// Failures are only logged.
    pub async fn archive(&self, url: &str) -> Option<String> {
        let archive_url = format!("{}{url}", self.base);
        match self.client.get(&archive_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(%url, "archived");
                Some(archive_url)
            }
            Ok(resp) => {
                warn!(%url, status = %resp.status(), "archiving failed");
                None
            }
            Err(e) => {
                warn!(%url, "error archiving: {e}");
                None
            }
        }
    }
}
