use std::future::Future;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

pub mod archive;
pub mod article;
pub mod batch;
pub mod config;
pub mod dataset;
pub mod publish;
pub mod session;
pub mod summary;

/// Sent on every request, as asked of API clients by the wiki operators.
pub const UA: &str = concat!(
    "IERetrv/",
    env!("CARGO_PKG_VERSION"),
    " (impactevaluationfoundation@gmail.com)"
);

pub type Result<T, E = color_eyre::Report> = std::result::Result<T, E>;

pub fn http_client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    reqwest::Client::builder().user_agent(UA).timeout(timeout)
}

pub fn setup<F: Future<Output = color_eyre::Result<()>>>(
    x: impl FnOnce() -> F,
) -> color_eyre::Result<()> {
    color_eyre::install()?;
    // a missing .env is fine, credentials may come from the real environment
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(x())
}
