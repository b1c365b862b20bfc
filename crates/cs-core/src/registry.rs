use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::package::PACKAGE_NAME;
use crate::version::{is_stable, is_valid_version};

const REGISTRY_URL: &str = "https://registry.npmjs.org/@jjuidev/cs";
const REGISTRY_TIMEOUT: Duration = Duration::from_secs(10);
const REGISTRY_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to build registry client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("Package {package} not found in registry")]
    PackageNotFound { package: &'static str },
    #[error("failed to reach registry: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Registry returned status {status}")]
    HttpStatus { status: reqwest::StatusCode },
    #[error("failed to parse registry response: {0}")]
    Parse(#[source] reqwest::Error),
    #[error("Registry has no valid latest version (dist-tags.latest = {found:?})")]
    InvalidLatest { found: String },
}

impl RegistryError {
    /// Whether another attempt could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::HttpStatus { .. } | Self::Parse(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: String,
    pub published_at: DateTime<Utc>,
    pub is_latest: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistTags {
    #[serde(default)]
    pub latest: String,
}

/// The subset of an npm packument that version selection needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageDocument {
    #[serde(default)]
    pub versions: HashMap<String, serde_json::Value>,
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: DistTags,
    #[serde(default)]
    pub time: HashMap<String, String>,
}

impl PackageDocument {
    #[must_use]
    pub fn latest(&self) -> &str {
        &self.dist_tags.latest
    }

    #[must_use]
    pub fn has_version(&self, version: &str) -> bool {
        self.versions.contains_key(version)
    }

    /// Newest `count` stable versions by publish time. Versions without a
    /// parseable publish time are skipped.
    #[must_use]
    pub fn stable_versions(&self, count: usize) -> Vec<VersionInfo> {
        let latest = self.latest();
        let mut versions: Vec<VersionInfo> = self
            .versions
            .keys()
            .filter(|version| is_stable(version))
            .filter_map(|version| {
                let published_at = self
                    .time
                    .get(version)
                    .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())?
                    .with_timezone(&Utc);
                Some(VersionInfo {
                    version: version.clone(),
                    published_at,
                    is_latest: version == latest,
                })
            })
            .collect();

        versions.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        versions.truncate(count);
        versions
    }
}

/// Client for the npm registry entry of `cs`.
///
/// Every query fetches the document again; nothing is cached between calls.
pub struct RegistryClient {
    client: reqwest::Client,
    url: String,
}

impl RegistryClient {
    /// Build a client for the public npm registry.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_url(REGISTRY_URL)
    }

    /// Build a client against a custom registry document URL.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_url(url: impl Into<String>) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .timeout(REGISTRY_TIMEOUT)
            .user_agent(format!("cs/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RegistryError::ClientBuild)?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Fetch the package document, retrying transient failures.
    ///
    /// # Errors
    /// Returns [`RegistryError::PackageNotFound`] immediately on HTTP 404, or
    /// the last transient error once all attempts are used.
    pub async fn fetch_package(&self) -> Result<PackageDocument, RegistryError> {
        with_retries(REGISTRY_MAX_ATTEMPTS, || self.fetch_once()).await
    }

    /// # Errors
    /// See [`RegistryClient::fetch_package`].
    pub async fn list_versions(&self, count: usize) -> Result<Vec<VersionInfo>, RegistryError> {
        Ok(self.fetch_package().await?.stable_versions(count))
    }

    /// # Errors
    /// See [`RegistryClient::fetch_package`]. Also fails with
    /// [`RegistryError::InvalidLatest`] when `dist-tags.latest` is missing or
    /// not semver.
    pub async fn latest_version(&self) -> Result<String, RegistryError> {
        let latest = self.fetch_package().await?.dist_tags.latest;
        if is_valid_version(&latest) {
            Ok(latest)
        } else {
            Err(RegistryError::InvalidLatest { found: latest })
        }
    }

    /// # Errors
    /// See [`RegistryClient::fetch_package`].
    pub async fn version_exists(&self, version: &str) -> Result<bool, RegistryError> {
        Ok(self.fetch_package().await?.has_version(version))
    }

    async fn fetch_once(&self) -> Result<PackageDocument, RegistryError> {
        debug!("Fetching registry document from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(RegistryError::Request)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::PackageNotFound {
                package: PACKAGE_NAME,
            });
        }
        if !status.is_success() {
            return Err(RegistryError::HttpStatus { status });
        }

        let document: PackageDocument = response.json().await.map_err(RegistryError::Parse)?;
        info!(
            "Registry lists {} versions, latest {}",
            document.versions.len(),
            document.latest()
        );
        Ok(document)
    }
}

/// Run `operation` up to `max_attempts` times. Before retry `n` the caller
/// waits `n` seconds. Non-transient errors are returned at once.
async fn with_retries<T, F, Fut>(max_attempts: u32, mut operation: F) -> Result<T, RegistryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RegistryError>>,
{
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if !error.is_transient() || attempt >= max_attempts => return Err(error),
            Err(error) => {
                warn!("Registry attempt {attempt}/{max_attempts} failed: {error}");
                tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use serde_json::json;

    use super::*;

    fn document() -> PackageDocument {
        serde_json::from_value(json!({
            "name": "@jjuidev/cs",
            "dist-tags": { "latest": "1.1.0" },
            "versions": {
                "1.0.0": {},
                "1.1.0": {},
                "2.0.0-beta": {}
            },
            "time": {
                "created": "2025-01-01T00:00:00.000Z",
                "modified": "2025-03-01T00:00:00.000Z",
                "1.0.0": "2025-01-01T00:00:00.000Z",
                "1.1.0": "2025-02-01T00:00:00.000Z",
                "2.0.0-beta": "2025-03-01T00:00:00.000Z"
            }
        }))
        .expect("registry document should deserialize")
    }

    #[test]
    fn stable_versions_exclude_prereleases_and_flag_latest() {
        let versions = document().stable_versions(10);

        let names: Vec<&str> = versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(names, vec!["1.1.0", "1.0.0"]);
        assert!(versions[0].is_latest);
        assert!(!versions[1].is_latest);
    }

    #[test]
    fn stable_versions_truncate_to_count() {
        let versions = document().stable_versions(1);
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, "1.1.0");
    }

    #[test]
    fn stable_versions_sort_by_publish_time_not_semver() {
        let doc: PackageDocument = serde_json::from_value(json!({
            "dist-tags": { "latest": "1.2.0" },
            "versions": { "1.2.0": {}, "0.9.5": {} },
            "time": {
                "1.2.0": "2025-01-01T00:00:00.000Z",
                "0.9.5": "2025-06-01T00:00:00.000Z"
            }
        }))
        .expect("registry document should deserialize");

        let versions = doc.stable_versions(10);
        assert_eq!(versions[0].version, "0.9.5");
        assert_eq!(versions[1].version, "1.2.0");
    }

    #[test]
    fn stable_versions_skip_entries_without_time() {
        let doc: PackageDocument = serde_json::from_value(json!({
            "dist-tags": { "latest": "1.0.0" },
            "versions": { "1.0.0": {}, "1.0.1": {} },
            "time": { "1.0.0": "2025-01-01T00:00:00.000Z" }
        }))
        .expect("registry document should deserialize");

        assert_eq!(doc.stable_versions(10).len(), 1);
    }

    #[test]
    fn version_lookup_and_latest() {
        let doc = document();
        assert_eq!(doc.latest(), "1.1.0");
        assert!(doc.has_version("2.0.0-beta"));
        assert!(!doc.has_version("3.0.0"));
    }

    #[test]
    fn not_found_is_not_transient() {
        let error = RegistryError::PackageNotFound {
            package: PACKAGE_NAME,
        };
        assert!(!error.is_transient());
        assert_eq!(error.to_string(), "Package @jjuidev/cs not found in registry");
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_with_linear_backoff() {
        let attempts = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<(), RegistryError> = with_retries(3, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(RegistryError::HttpStatus {
                    status: reqwest::StatusCode::BAD_GATEWAY,
                })
            }
        })
        .await;

        assert!(matches!(result, Err(RegistryError::HttpStatus { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_returned_without_retrying() {
        let attempts = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<(), RegistryError> = with_retries(3, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(RegistryError::PackageNotFound {
                    package: PACKAGE_NAME,
                })
            }
        })
        .await;

        assert!(matches!(result, Err(RegistryError::PackageNotFound { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_a_transient_failure() {
        let attempts = AtomicU32::new(0);

        let result = with_retries(3, || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(RegistryError::HttpStatus {
                        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    })
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.expect("second attempt should succeed"), 1);
    }

    /// Serves one canned HTTP response to every connection and returns the
    /// document URL to point a client at.
    async fn serve(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("listener should have an address");

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let response = format!(
                        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
                         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{addr}/@jjuidev/cs")
    }

    const DOCUMENT: &str = r#"{
        "dist-tags": { "latest": "1.1.0" },
        "versions": { "1.0.0": {}, "1.1.0": {}, "2.0.0-beta": {} },
        "time": {
            "1.0.0": "2025-01-01T00:00:00.000Z",
            "1.1.0": "2025-02-01T00:00:00.000Z",
            "2.0.0-beta": "2025-03-01T00:00:00.000Z"
        }
    }"#;

    #[tokio::test]
    async fn http_404_maps_to_package_not_found() {
        let url = serve("404 Not Found", "").await;
        let client = RegistryClient::with_url(url).expect("client should build");

        let result = client.fetch_package().await;

        assert!(matches!(
            result,
            Err(RegistryError::PackageNotFound { package: PACKAGE_NAME })
        ));
    }

    #[tokio::test]
    async fn http_503_maps_to_transient_status_error() {
        let url = serve("503 Service Unavailable", "").await;
        let client = RegistryClient::with_url(url).expect("client should build");

        let error = client
            .fetch_once()
            .await
            .expect_err("503 should be an error");

        assert!(error.is_transient());
        assert!(matches!(
            error,
            RegistryError::HttpStatus { status } if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn served_document_answers_queries() {
        let url = serve("200 OK", DOCUMENT).await;
        let client = RegistryClient::with_url(url).expect("client should build");

        let versions = client.list_versions(10).await.expect("versions should load");
        let names: Vec<&str> = versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(names, vec!["1.1.0", "1.0.0"]);

        assert_eq!(
            client.latest_version().await.expect("latest should load"),
            "1.1.0"
        );
        assert!(client.version_exists("1.0.0").await.expect("lookup should work"));
        assert!(!client.version_exists("9.9.9").await.expect("lookup should work"));
    }

    #[tokio::test]
    async fn missing_latest_tag_is_an_error() {
        let url = serve("200 OK", r#"{ "versions": { "1.0.0": {} } }"#).await;
        let client = RegistryClient::with_url(url).expect("client should build");

        let error = client
            .latest_version()
            .await
            .expect_err("empty latest should be rejected");

        assert!(matches!(error, RegistryError::InvalidLatest { ref found } if found.is_empty()));
        assert!(!error.is_transient());
    }
}
