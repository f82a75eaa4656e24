//! Bearer tokens for the Compute API.
//!
//! Either a token supplied through the environment, or one minted by the
//! `gcloud` CLI and cached until shortly before it expires.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::application::ports::{CommandRunner, TokenSource};
use crate::domain::HarnessError;

/// Environment variable holding a ready-made access token.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// gcloud tokens live for an hour; refresh a little early.
pub const GCLOUD_TOKEN_TTL: Duration = Duration::from_secs(55 * 60);

/// Where tokens come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    AccessToken(String),
    Gcloud,
}

impl Credentials {
    /// `GOOGLE_OAUTH_ACCESS_TOKEN` when set and non-empty, else gcloud.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(ACCESS_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Self::AccessToken(token.trim().to_string()),
            _ => Self::Gcloud,
        }
    }
}

/// A fixed token. Used for `GOOGLE_OAUTH_ACCESS_TOKEN` and in tests.
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String, HarnessError> {
        if self.0.trim().is_empty() {
            return Err(HarnessError::Auth("access token is empty".into()));
        }
        Ok(self.0.clone())
    }
}

struct CachedToken {
    value: String,
    fetched: Instant,
}

/// Tokens from `gcloud auth print-access-token`, run through a `CommandRunner`.
pub struct GcloudTokenSource<R: CommandRunner> {
    runner: R,
    cache: Mutex<Option<CachedToken>>,
}

impl<R: CommandRunner> GcloudTokenSource<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            cache: Mutex::new(None),
        }
    }
}

impl<R: CommandRunner> TokenSource for GcloudTokenSource<R> {
    async fn token(&self) -> Result<String, HarnessError> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref()
            && cached.fetched.elapsed() < GCLOUD_TOKEN_TTL
        {
            return Ok(cached.value.clone());
        }

        let out = self
            .runner
            .run("gcloud", &["auth", "print-access-token"])
            .await
            .map_err(|e| HarnessError::Auth(format!("gcloud: {e:#}")))?;
        if !out.status.success() {
            return Err(HarnessError::Auth(format!(
                "gcloud auth print-access-token failed: {}. Run 'gcloud auth login' first.",
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        let value = String::from_utf8_lossy(&out.stdout).trim().to_string();
        if value.is_empty() {
            return Err(HarnessError::Auth("gcloud returned an empty token".into()));
        }

        tracing::debug!("refreshed access token from gcloud");
        *cache = Some(CachedToken {
            value: value.clone(),
            fetched: Instant::now(),
        });
        Ok(value)
    }
}

/// Either kind of token source, chosen at startup.
pub enum AnyTokenSource<R: CommandRunner> {
    Static(StaticToken),
    Gcloud(GcloudTokenSource<R>),
}

impl<R: CommandRunner> AnyTokenSource<R> {
    pub fn new(credentials: Credentials, runner: R) -> Self {
        match credentials {
            Credentials::AccessToken(t) => Self::Static(StaticToken(t)),
            Credentials::Gcloud => Self::Gcloud(GcloudTokenSource::new(runner)),
        }
    }
}

impl<R: CommandRunner> TokenSource for AnyTokenSource<R> {
    async fn token(&self) -> Result<String, HarnessError> {
        match self {
            Self::Static(s) => s.token().await,
            Self::Gcloud(g) => g.token().await,
        }
    }
}
