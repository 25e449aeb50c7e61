//! One mail check: load credentials, fetch the feed, count, decide.
//!
//! Each stage returns a typed error; [`run`] is the single place where they
//! collapse into [`MailStatus::NoMail`].
use crate::config::{Config, ConfigError};
use crate::credentials::{CredentialError, Credentials};
use crate::feed::{count_entries, fetch_feed, FetchError};
use crate::status::{decide, MailStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// HTTP client used for the feed request. No client-wide timeout: the
/// optional limit from [`Config::timeout`] is applied per fetch.
pub fn build_client() -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Count the unread entries in the configured feed.
///
/// The password file is read on every call, before any network traffic, so
/// a missing file fails the check even if the server never asks for it.
pub async fn unread_count(client: &reqwest::Client, config: &Config) -> Result<usize, CheckError> {
    let password_path = config.password_path()?;
    let credentials = Credentials::load(&config.username, &password_path)?;

    let body = fetch_feed(client, &config.feed_url, &credentials, config.timeout()).await?;
    Ok(count_entries(&body))
}

/// Run a full check and reduce it to a [`MailStatus`]. Failures are logged
/// at debug level and reported as [`MailStatus::NoMail`].
pub async fn run(client: &reqwest::Client, config: &Config) -> MailStatus {
    match unread_count(client, config).await {
        Ok(entries) => {
            let status = decide(entries);
            tracing::info!(entries, ?status, "Mail check complete");
            status
        }
        Err(e) => {
            tracing::debug!(error = %e, "Mail check failed, reporting no mail");
            MailStatus::NoMail
        }
    }
}
