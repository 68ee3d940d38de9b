use std::time::Duration;

use tracing::{debug, error, info, warn};
use url::Url;

use crate::archive::Archiver;
use crate::article::{sanitize_title, WikiArticle};
use crate::dataset::ProjectRecord;
use crate::publish::{publish, PublishOutcome};
use crate::session::{authenticate, AuthError, Credentials};
use crate::summary::SummaryStore;

pub const DEFAULT_EDIT_SUMMARY: &str = "Creating an IEF Article automatically";
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Batch<S> {
    api_url: Url,
    credentials: Credentials,
    store: S,
    archiver: Option<Archiver>,
    edit_summary: String,
    delay: Duration,
    timeout: Duration,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<(ProjectRecord, PublishOutcome)>,
    pub skipped: usize,
}

impl RunReport {
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, PublishOutcome::Success))
    }

    pub fn already_existing(&self) -> usize {
        self.count(|o| matches!(o, PublishOutcome::AlreadyExists))
    }

    pub fn failed(&self) -> usize {
        self.count(PublishOutcome::is_failure)
    }

    fn count(&self, f: impl Fn(&PublishOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| f(o)).count()
    }

    pub fn log_summary(&self) {
        info!(
            created = self.created(),
            existing = self.already_existing(),
            failed = self.failed(),
            skipped = self.skipped,
            "run finished"
        );
    }
}

impl<S: SummaryStore> Batch<S> {
    pub fn new(api_url: Url, credentials: Credentials, store: S) -> Self {
        Batch {
            api_url,
            credentials,
            store,
            archiver: None,
            edit_summary: DEFAULT_EDIT_SUMMARY.to_owned(),
            delay: DEFAULT_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn archiver(mut self, archiver: Option<Archiver>) -> Self {
        self.archiver = archiver;
        self
    }

    pub fn edit_summary(mut self, summary: impl Into<String>) -> Self {
        self.edit_summary = summary.into();
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Only a failed login fails the run, per-page failures go in the report.
    pub async fn run(&self, records: &[ProjectRecord]) -> Result<RunReport, AuthError> {
        info!(api = %self.api_url, user = %self.credentials.username, "logging in");
        let session = authenticate(&self.api_url, &self.credentials, self.timeout).await?;
        info!("logged in");

        let mut report = RunReport::default();
        for (i, record) in records.iter().enumerate() {
            let title = sanitize_title(&record.name);
            let summary = match self.store.load(&title) {
                Ok(Some(summary)) => summary,
                Ok(None) => {
                    debug!(%title, "no summary, skipping");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(%title, "skipping, could not read summary: {e:#}");
                    report.skipped += 1;
                    continue;
                }
            };

            if !report.outcomes.is_empty() {
                tokio::time::sleep(self.delay).await;
            }

            if let Some(archiver) = &self.archiver {
                archiver.archive(&record.website).await;
            }

            let article = WikiArticle::compose(record, &summary);
            let outcome = publish(&session, &article, &self.edit_summary).await;
            log_outcome(i + 1, records.len(), &article.title, &outcome);
            report.outcomes.push((record.clone(), outcome));
        }

        Ok(report)
    }
}

fn log_outcome(row: usize, total: usize, title: &str, outcome: &PublishOutcome) {
    match outcome {
        PublishOutcome::Success => info!("[{row}/{total}] created page: {title}"),
        PublishOutcome::AlreadyExists => info!("[{row}/{total}] page already exists: {title}"),
        PublishOutcome::AuthFailure(_) | PublishOutcome::NetworkFailure(_) => {
            error!("[{row}/{total}] error creating {title}: {outcome}")
        }
        PublishOutcome::UnexpectedResponse(_) => {
            warn!("[{row}/{total}] {outcome} for {title}")
        }
    }
}
