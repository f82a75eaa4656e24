//! Compute Engine REST client — implements `InstanceInspector`.
//!
//! `GET {base}/compute/v1/projects/{project}/zones/{zone}/instances/{name}`
//! with bearer auth. Transient failures (429, 5xx, connect, timeout) are
//! retried with bounded linear backoff before they surface.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use provcheck_common::{PlacementConstraint, ResourceSnapshot, SecurityFlags};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::application::ports::{InstanceInspector, TokenSource};
use crate::domain::{HarnessError, RetrySettings};

/// Public Compute Engine endpoint.
pub const DEFAULT_COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com";

/// Per-request HTTP timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared, read-only Compute API client.
pub struct ComputeClient<T: TokenSource> {
    http: reqwest::Client,
    base: Url,
    tokens: Arc<T>,
    retry: RetrySettings,
}

impl<T: TokenSource> Clone for ComputeClient<T> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            base: self.base.clone(),
            tokens: Arc::clone(&self.tokens),
            retry: self.retry,
        }
    }
}

impl<T: TokenSource> ComputeClient<T> {
    /// # Errors
    ///
    /// Returns an error if `base` is not an absolute http(s) URL or the
    /// HTTP client cannot be built.
    pub fn new(base: &str, tokens: T, retry: RetrySettings) -> Result<Self> {
        let base = Url::parse(base).with_context(|| format!("invalid compute endpoint '{base}'"))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("invalid compute endpoint '{base}': not a base URL");
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("provcheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base,
            tokens: Arc::new(tokens),
            retry,
        })
    }

    /// Each identifier becomes exactly one percent-encoded path segment.
    fn instance_url(&self, project: &str, zone: &str, name: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "compute", "v1", "projects", project, "zones", zone, "instances", name,
            ]);
        }
        url
    }

    async fn fetch_once(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<ResourceSnapshot, HarnessError> {
        let token = self.tokens.token().await?;
        let response = self
            .http
            .get(self.instance_url(project, zone, name))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| send_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HarnessError::Transient(format!("reading response body: {e}")))?;

        if status.is_success() {
            return decode_instance(&body);
        }
        Err(status_error(status, &body, project, zone, name))
    }
}

impl<T: TokenSource> InstanceInspector for ComputeClient<T> {
    async fn get_instance(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<ResourceSnapshot, HarnessError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.fetch_once(project, zone, name).await {
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "compute request failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

fn send_error(err: &reqwest::Error) -> HarnessError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        HarnessError::Transient(format!("compute request failed: {err}"))
    } else {
        HarnessError::Api {
            status: 0,
            message: err.to_string(),
        }
    }
}

/// Map a non-2xx response.
fn status_error(
    status: StatusCode,
    body: &str,
    project: &str,
    zone: &str,
    name: &str,
) -> HarnessError {
    let message = error_message(body);
    match status {
        StatusCode::NOT_FOUND => HarnessError::NotFound {
            project: project.to_string(),
            zone: zone.to_string(),
            name: name.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            HarnessError::Auth(format!("{}: {message}", status.as_u16()))
        }
        StatusCode::TOO_MANY_REQUESTS => HarnessError::Transient(format!("429: {message}")),
        s if s.is_server_error() => HarnessError::Transient(format!("{}: {message}", s.as_u16())),
        s => HarnessError::Api {
            status: s.as_u16(),
            message,
        },
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// `error.message` from a Google API error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

// ── Response decoding ────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Instance {
    name: String,
    #[serde(default)]
    machine_type: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    network_interfaces: Vec<NetworkInterface>,
    #[serde(default)]
    shielded_instance_config: Option<ShieldedInstanceConfig>,
    #[serde(default)]
    confidential_instance_config: Option<ConfidentialInstanceConfig>,
    #[serde(default)]
    scheduling: Option<Scheduling>,
    #[serde(default)]
    disks: Vec<AttachedDisk>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkInterface {
    #[serde(rename = "networkIP", default)]
    network_ip: String,
    #[serde(default)]
    access_configs: Vec<AccessConfig>,
}

#[derive(Deserialize)]
struct AccessConfig {
    #[serde(rename = "natIP", default)]
    nat_ip: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ShieldedInstanceConfig {
    enable_secure_boot: bool,
    enable_vtpm: bool,
    enable_integrity_monitoring: bool,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ConfidentialInstanceConfig {
    enable_confidential_compute: bool,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Scheduling {
    node_affinities: Vec<NodeAffinity>,
}

#[derive(Deserialize)]
struct NodeAffinity {
    key: String,
    operator: String,
    #[serde(default)]
    values: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachedDisk {
    #[serde(default)]
    disk_encryption_key: Option<DiskEncryptionKey>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiskEncryptionKey {
    #[serde(default)]
    kms_key_name: Option<String>,
}

/// Decode an `instances.get` body into a snapshot. Missing optional blocks
/// read as `false` / empty.
///
/// # Errors
///
/// Returns `Api` when the body is not an instance resource.
pub fn decode_instance(body: &str) -> Result<ResourceSnapshot, HarnessError> {
    let instance: Instance = serde_json::from_str(body).map_err(|e| HarnessError::Api {
        status: 200,
        message: format!("cannot decode instance: {e}"),
    })?;

    let shielded = instance.shielded_instance_config.unwrap_or_default();
    let confidential = instance.confidential_instance_config.unwrap_or_default();

    let internal_address = instance
        .network_interfaces
        .first()
        .map(|nic| nic.network_ip.clone())
        .unwrap_or_default();
    let external_address = instance
        .network_interfaces
        .iter()
        .flat_map(|nic| &nic.access_configs)
        .find_map(|ac| ac.nat_ip.clone().filter(|ip| !ip.is_empty()));

    Ok(ResourceSnapshot {
        name: instance.name,
        machine_type: last_segment(&instance.machine_type).to_string(),
        internal_address,
        external_address,
        security_flags: SecurityFlags {
            secure_boot: shielded.enable_secure_boot,
            vtpm: shielded.enable_vtpm,
            integrity_monitoring: shielded.enable_integrity_monitoring,
            confidential_compute: confidential.enable_confidential_compute,
        },
        placement_constraints: instance
            .scheduling
            .unwrap_or_default()
            .node_affinities
            .into_iter()
            .map(|a| PlacementConstraint {
                key: a.key,
                operator: a.operator,
                values: a.values,
            })
            .collect(),
        disk_kms_keys: instance
            .disks
            .into_iter()
            .filter_map(|d| d.disk_encryption_key.and_then(|k| k.kms_key_name))
            .collect(),
        status: instance.status,
    })
}

fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
