//! HTTP download of runtime archives.
//!
//! A download streams the response body exactly once, feeding every chunk to
//! the destination file, a running digest and the optional progress callback.
//! Only the request phase is retried; a body that fails to verify is deleted
//! and reported, never silently fetched again.
//!
//! ## Features
//!
//! - Automatic retry with exponential backoff (3 attempts, 1s to 5s apart)
//! - Streaming SHA-256 or SHA-512 verification
//! - No file is left behind on any failure path

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use rand::Rng;
use sha2::{Digest, Sha256, Sha512};
use tokio::io::AsyncWriteExt;

use crate::errors::JvmanError;

/// Progress event emitted during downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The response headers arrived.
    Started {
        /// Total size from `Content-Length`, when the server sent one.
        total: Option<u64>,
    },
    /// More bytes were written.
    Progress {
        /// Bytes downloaded so far.
        downloaded: u64,
    },
    /// The body was fully written and verified.
    Completed,
}

/// Callback type for receiving progress updates during downloads.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Idle read timeout in seconds.
const READ_TIMEOUT_SECS: u64 = 60;

/// User-Agent header for HTTP requests.
const USER_AGENT: &str = concat!("jvman/", env!("CARGO_PKG_VERSION"));

/// Bounds for retrying the request phase of a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of request attempts, including the first.
    pub max_attempts: u32,
    /// Shortest wait between attempts.
    pub min_wait: Duration,
    /// Longest wait between attempts.
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `retry` (1 for the first retry).
    ///
    /// Doubles with each retry with +/- 25% jitter, clamped to
    /// `[min_wait, max_wait]`.
    fn delay(&self, retry: u32) -> Duration {
        let min = u64::try_from(self.min_wait.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.max_wait.as_millis()).unwrap_or(u64::MAX);
        let base = min.saturating_mul(2u64.saturating_pow(retry.saturating_sub(1)));
        let jitter_range = base / 4;
        let jitter = rand::rng().random_range(0..=jitter_range * 2);
        Duration::from_millis((base - jitter_range + jitter).clamp(min, max.max(min)))
    }
}

/// Digest algorithms accepted for release checksums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    /// SHA-256, the default.
    Sha256,
    /// SHA-512.
    Sha512,
}

impl ChecksumAlgorithm {
    /// Parses a vendor's checksum type identifier. Empty means SHA-256.
    ///
    /// # Errors
    ///
    /// Returns [`JvmanError::UnsupportedChecksum`] for any other identifier.
    pub fn parse(identifier: &str) -> Result<Self, JvmanError> {
        match identifier.trim().to_ascii_lowercase().as_str() {
            "" | "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            other => Err(JvmanError::unsupported_checksum(other)),
        }
    }

    fn hasher(self) -> RunningDigest {
        match self {
            Self::Sha256 => RunningDigest::Sha256(Sha256::new()),
            Self::Sha512 => RunningDigest::Sha512(Sha512::new()),
        }
    }
}

enum RunningDigest {
    Sha256(Sha256),
    Sha512(Sha512),
}

impl RunningDigest {
    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(hasher) => hasher.update(bytes),
            Self::Sha512(hasher) => hasher.update(bytes),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Sha256(hasher) => hex::encode(hasher.finalize()),
            Self::Sha512(hasher) => hex::encode(hasher.finalize()),
        }
    }
}

/// A verified file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// Where the file was written.
    pub file_path: PathBuf,
    /// Lowercase hex digest of the file.
    pub checksum: String,
}

/// Fetches remote artifacts into a local directory.
pub struct Downloader {
    client: reqwest::Client,
    retry: RetryPolicy,
    progress: Option<ProgressCallback>,
}

impl Downloader {
    /// Creates a downloader with the default retry policy and no progress
    /// reporting.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .read_timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            retry: RetryPolicy::default(),
            progress: None,
        })
    }

    /// Replaces the retry policy.
    #[allow(dead_code)]
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Reports progress through `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Downloads `url` to `dest_dir/filename` and verifies it.
    ///
    /// An empty `expected_checksum` skips verification; the computed digest
    /// is still returned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The destination directory cannot be created
    /// - The checksum algorithm is unknown
    /// - The request fails after all retries, or returns a non-retryable status
    /// - Writing the body fails
    /// - The computed checksum does not match
    pub async fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        filename: &str,
        expected_checksum: &str,
        checksum_algorithm: &str,
    ) -> Result<DownloadResult> {
        tokio::fs::create_dir_all(dest_dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

        let algorithm = ChecksumAlgorithm::parse(checksum_algorithm)?;
        let dest = dest_dir.join(filename);

        let response = self.send_with_retry(url).await?;

        match self.stream_to_file(response, &dest, algorithm).await {
            Ok(checksum) => {
                let expected = expected_checksum.trim().to_ascii_lowercase();
                if !expected.is_empty() && expected != checksum {
                    remove_partial(&dest).await;
                    return Err(JvmanError::checksum_mismatch(expected, checksum).into());
                }
                if expected.is_empty() {
                    tracing::warn!(url, "no checksum published, skipping verification");
                } else {
                    tracing::debug!(url, %checksum, "checksum verified");
                }
                self.emit(ProgressEvent::Completed);
                Ok(DownloadResult {
                    file_path: dest,
                    checksum,
                })
            }
            Err(e) => {
                remove_partial(&dest).await;
                Err(e)
            }
        }
    }

    async fn send_with_retry(&self, url: &str) -> Result<reqwest::Response> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let last_attempt = attempt >= self.retry.max_attempts;
            tracing::debug!(url, attempt, "requesting");

            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) if is_retryable(response.status()) && !last_attempt => {
                    tracing::warn!(url, status = %response.status(), attempt, "retrying download");
                }
                Ok(response) => {
                    return Err(JvmanError::download(format!(
                        "unexpected status code {} from {url}",
                        response.status()
                    ))
                    .into());
                }
                Err(e) if !last_attempt => {
                    tracing::warn!(url, error = %e, attempt, "retrying download");
                }
                Err(e) => {
                    return Err(JvmanError::download_with_source(
                        format!("failed to download {url} after {attempt} attempts"),
                        Box::new(e),
                    )
                    .into());
                }
            }

            tokio::time::sleep(self.retry.delay(attempt)).await;
        }
    }

    async fn stream_to_file(
        &self,
        response: reqwest::Response,
        dest: &Path,
        algorithm: ChecksumAlgorithm,
    ) -> Result<String> {
        self.emit(ProgressEvent::Started {
            total: response.content_length(),
        });

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create file: {}", dest.display()))?;
        let mut hasher = algorithm.hasher();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                JvmanError::download_with_source("failed to read response body", Box::new(e))
            })?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write to {}", dest.display()))?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;
            self.emit(ProgressEvent::Progress { downloaded });
        }

        file.flush()
            .await
            .with_context(|| format!("Failed to flush {}", dest.display()))?;

        tracing::debug!(path = %dest.display(), bytes = downloaded, "download written");
        Ok(hasher.finalize_hex())
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = &self.progress {
            callback(event);
        }
    }
}

/// Server errors and rate limiting are worth another attempt.
fn is_retryable(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove partial download");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use parking_lot::Mutex;

    const PAYLOAD: &[u8] = b"hello world\n";
    const PAYLOAD_SHA256: &str = "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447";

    fn fast_retries() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            min_wait: Duration::from_millis(1),
            max_wait: Duration::from_millis(5),
        }
    }

    /// Flips the lowest bit of the first hex digit.
    fn flip_one_bit(hex_digest: &str) -> String {
        let mut bytes = hex::decode(hex_digest).unwrap();
        bytes[0] ^= 1;
        hex::encode(bytes)
    }

    #[test]
    fn retry_delay_stays_within_bounds() {
        let policy = RetryPolicy::default();
        for retry in 1..=5 {
            let delay = policy.delay(retry);
            assert!(delay >= Duration::from_secs(1), "retry {retry}: {delay:?}");
            assert!(delay <= Duration::from_secs(5), "retry {retry}: {delay:?}");
        }
    }

    #[test]
    fn retry_delay_grows() {
        let policy = RetryPolicy::default();
        assert!(policy.delay(1) <= Duration::from_millis(1250));
        assert!(policy.delay(3) >= Duration::from_millis(3000));
    }

    #[test]
    fn checksum_algorithm_parses_known_identifiers() {
        assert_eq!(ChecksumAlgorithm::parse("").unwrap(), ChecksumAlgorithm::Sha256);
        assert_eq!(ChecksumAlgorithm::parse("SHA256").unwrap(), ChecksumAlgorithm::Sha256);
        assert_eq!(ChecksumAlgorithm::parse("sha512").unwrap(), ChecksumAlgorithm::Sha512);
        assert!(matches!(
            ChecksumAlgorithm::parse("md5"),
            Err(JvmanError::UnsupportedChecksum { .. })
        ));
    }

    #[tokio::test]
    async fn download_writes_verified_file() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jdk.tar.gz");
                then.status(200).body(PAYLOAD);
            })
            .await;
        let temp = tempfile::tempdir().unwrap();
        let dest_dir = temp.path().join("nested").join("dir");

        let result = Downloader::new()
            .unwrap()
            .download(
                &server.url("/jdk.tar.gz"),
                &dest_dir,
                "jdk.tar.gz",
                PAYLOAD_SHA256,
                "sha256",
            )
            .await
            .unwrap();

        assert_eq!(result.file_path, dest_dir.join("jdk.tar.gz"));
        assert_eq!(result.checksum, PAYLOAD_SHA256);
        assert_eq!(std::fs::read(&result.file_path).unwrap(), PAYLOAD);
    }

    #[tokio::test]
    async fn download_accepts_uppercase_expected_checksum() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jdk.zip");
                then.status(200).body(PAYLOAD);
            })
            .await;
        let temp = tempfile::tempdir().unwrap();

        let result = Downloader::new()
            .unwrap()
            .download(
                &server.url("/jdk.zip"),
                temp.path(),
                "jdk.zip",
                &PAYLOAD_SHA256.to_uppercase(),
                "",
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn checksum_mismatch_deletes_partial_file() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jdk.tar.gz");
                then.status(200).body(PAYLOAD);
            })
            .await;
        let temp = tempfile::tempdir().unwrap();
        let wrong = flip_one_bit(PAYLOAD_SHA256);

        let err = Downloader::new()
            .unwrap()
            .download(
                &server.url("/jdk.tar.gz"),
                temp.path(),
                "jdk.tar.gz",
                &wrong,
                "sha256",
            )
            .await
            .unwrap_err();

        match err.downcast_ref::<JvmanError>() {
            Some(JvmanError::ChecksumMismatch { expected, actual }) => {
                assert_eq!(expected, &wrong);
                assert_eq!(actual, PAYLOAD_SHA256);
            }
            other => panic!("expected checksum mismatch, got {other:?}"),
        }
        assert!(!temp.path().join("jdk.tar.gz").exists());
    }

    #[tokio::test]
    async fn empty_checksum_skips_verification() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/corretto.tar.gz");
                then.status(200).body(PAYLOAD);
            })
            .await;
        let temp = tempfile::tempdir().unwrap();

        let result = Downloader::new()
            .unwrap()
            .download(
                &server.url("/corretto.tar.gz"),
                temp.path(),
                "corretto.tar.gz",
                "",
                "",
            )
            .await
            .unwrap();

        assert_eq!(result.checksum, PAYLOAD_SHA256);
    }

    #[tokio::test]
    async fn sha512_is_supported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jdk.tar.gz");
                then.status(200).body(PAYLOAD);
            })
            .await;
        let temp = tempfile::tempdir().unwrap();
        let expected = hex::encode(Sha512::digest(PAYLOAD));

        let result = Downloader::new()
            .unwrap()
            .download(
                &server.url("/jdk.tar.gz"),
                temp.path(),
                "jdk.tar.gz",
                &expected,
                "sha512",
            )
            .await
            .unwrap();

        assert_eq!(result.checksum, expected);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.tar.gz");
                then.status(404);
            })
            .await;
        let temp = tempfile::tempdir().unwrap();

        let err = Downloader::new()
            .unwrap()
            .with_retry_policy(fast_retries())
            .download(
                &server.url("/missing.tar.gz"),
                temp.path(),
                "missing.tar.gz",
                "",
                "",
            )
            .await
            .unwrap_err();

        mock.assert_hits_async(1).await;
        assert!(matches!(
            err.downcast_ref::<JvmanError>(),
            Some(JvmanError::Download { .. })
        ));
        assert!(!temp.path().join("missing.tar.gz").exists());
    }

    #[tokio::test]
    async fn server_error_is_retried_up_to_the_bound() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/flaky.tar.gz");
                then.status(503);
            })
            .await;
        let temp = tempfile::tempdir().unwrap();

        let err = Downloader::new()
            .unwrap()
            .with_retry_policy(fast_retries())
            .download(
                &server.url("/flaky.tar.gz"),
                temp.path(),
                "flaky.tar.gz",
                "",
                "",
            )
            .await
            .unwrap_err();

        mock.assert_hits_async(3).await;
        assert!(err.to_string().contains("503"));
        assert!(!temp.path().join("flaky.tar.gz").exists());
    }

    #[tokio::test]
    async fn connection_failure_is_retried_up_to_the_bound() {
        let temp = tempfile::tempdir().unwrap();

        let err = Downloader::new()
            .unwrap()
            .with_retry_policy(fast_retries())
            .download(
                "http://127.0.0.1:9/jdk.tar.gz",
                temp.path(),
                "jdk.tar.gz",
                "",
                "",
            )
            .await
            .unwrap_err();

        match err.downcast_ref::<JvmanError>() {
            Some(JvmanError::Download { message, source }) => {
                assert!(message.contains("after 3 attempts"), "{message}");
                assert!(source.is_some());
            }
            other => panic!("expected download error, got {other:?}"),
        }
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn progress_callback_sees_whole_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jdk.tar.gz");
                then.status(200).body(PAYLOAD);
            })
            .await;
        let temp = tempfile::tempdir().unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        Downloader::new()
            .unwrap()
            .with_progress(Arc::new(move |event| sink.lock().push(event)))
            .download(
                &server.url("/jdk.tar.gz"),
                temp.path(),
                "jdk.tar.gz",
                "",
                "",
            )
            .await
            .unwrap();

        let events = events.lock();
        assert!(matches!(events.first(), Some(ProgressEvent::Started { .. })));
        assert_eq!(events.last(), Some(&ProgressEvent::Completed));
        assert!(events.contains(&ProgressEvent::Progress {
            downloaded: PAYLOAD.len() as u64
        }));
    }
}
