//! Sequential image download loop.
//!
//! [`DownloadEngine::run`] walks the candidates in order. For each one it
//! applies the URL filters, waits on the [`RateLimiter`], fetches the bytes,
//! applies the byte filters, and writes the file under a collision-free name.
//! The loop stops when the candidates run out or the maximum number of saved
//! images is reached. Per-image failures are recorded and never abort the run.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use imgfetch_core::download::{DownloadEngine, HttpClient, NoProgress};
//! use imgfetch_core::filter::FilterChain;
//! use imgfetch_core::parser::extract_candidates;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(Duration::from_secs(20))?;
//! let page = client.fetch_page("https://example.com/gallery").await?;
//! let candidates = extract_candidates(&page.html, &page.url);
//!
//! let engine = DownloadEngine::new("images", 10, Duration::from_millis(300));
//! let report = engine
//!     .run(candidates, &client, &FilterChain::new(), &mut NoProgress)
//!     .await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::client::HttpClient;
use super::error::{FetchError, FilesystemError};
use super::filename::{filename_from_url, unique_name};
use super::rate_limiter::RateLimiter;
use crate::filter::{FilterChain, FilterDecision};
use crate::parser::ImageCandidate;
use crate::report::{DownloadFailure, DownloadReport, SavedImage};

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Written to disk.
    Saved(SavedImage),
    /// Fetch or write failed; the run continues.
    Failed(DownloadFailure),
    /// Dropped by a filter; not written, not counted toward the maximum.
    Filtered(FilterDecision),
}

/// Receives progress events from the download loop.
///
/// All methods default to no-ops.
pub trait DownloadObserver: Send {
    /// Called once before the first candidate with the number of candidates.
    fn on_start(&mut self, _candidates: usize) {}

    /// Called when a candidate is picked up.
    fn on_candidate(&mut self, _candidate: &ImageCandidate) {}

    /// Called once per candidate with its outcome.
    fn on_outcome(&mut self, _outcome: &DownloadOutcome) {}

    /// Called after the loop ends.
    fn on_finish(&mut self, _report: &DownloadReport) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl DownloadObserver for NoProgress {}

/// Downloads candidates one at a time into a directory.
#[derive(Debug, Clone)]
pub struct DownloadEngine {
    output_dir: PathBuf,
    max_images: usize,
    delay: Duration,
}

impl DownloadEngine {
    /// Creates an engine writing into `output_dir`.
    ///
    /// `max_images` caps saved images; filtered and failed candidates do not
    /// count toward it. `delay` is slept before every request after the first.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, max_images: usize, delay: Duration) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_images,
            delay,
        }
    }

    /// Directory images are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Creates the output directory if needed and returns the file names
    /// already present in it.
    ///
    /// # Errors
    ///
    /// Returns [`FilesystemError::OutputDir`] if the directory cannot be
    /// created or listed.
    pub async fn prepare_output_dir(&self) -> Result<HashSet<String>, FilesystemError> {
        let dir = &self.output_dir;
        fs::create_dir_all(dir)
            .await
            .map_err(|e| FilesystemError::output_dir(dir, e))?;

        let mut existing = HashSet::new();
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| FilesystemError::output_dir(dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FilesystemError::output_dir(dir, e))?
        {
            if let Some(name) = entry.file_name().to_str() {
                existing.insert(name.to_string());
            }
        }
        debug!(dir = %dir.display(), existing = existing.len(), "output directory ready");
        Ok(existing)
    }

    /// Runs the download loop over `candidates`.
    ///
    /// # Errors
    ///
    /// Returns [`FilesystemError::OutputDir`] if the output directory cannot be
    /// prepared. Per-image failures are recorded in the report instead.
    #[instrument(skip_all, fields(dir = %self.output_dir.display(), max = self.max_images))]
    pub async fn run<I>(
        &self,
        candidates: I,
        client: &HttpClient,
        filters: &FilterChain,
        observer: &mut dyn DownloadObserver,
    ) -> Result<DownloadReport, FilesystemError>
    where
        I: IntoIterator<Item = ImageCandidate>,
    {
        let mut existing = self.prepare_output_dir().await?;
        let mut limiter = RateLimiter::new(self.delay);
        let mut report = DownloadReport::new();

        let candidates = candidates.into_iter();
        observer.on_start(candidates.size_hint().1.unwrap_or(0));

        for candidate in candidates {
            if report.succeeded() >= self.max_images {
                info!(max = self.max_images, "maximum image count reached");
                report.max_reached = true;
                break;
            }
            observer.on_candidate(&candidate);

            let decision = filters.screen_url(candidate);
            let outcome = if decision.passed {
                report.attempted += 1;
                self.download_one(decision.candidate, client, filters, &mut limiter, &mut existing)
                    .await
            } else {
                DownloadOutcome::Filtered(decision)
            };

            observer.on_outcome(&outcome);
            match outcome {
                DownloadOutcome::Saved(saved) => report.saved.push(saved),
                DownloadOutcome::Failed(failure) => report.failures.push(failure),
                DownloadOutcome::Filtered(decision) => report.filtered.push(decision),
            }
        }

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded(),
            failed = report.failed(),
            filtered = report.filtered_out(),
            paced_ms = limiter.total_delay().as_millis(),
            "download loop finished"
        );
        observer.on_finish(&report);
        Ok(report)
    }

    async fn download_one(
        &self,
        candidate: ImageCandidate,
        client: &HttpClient,
        filters: &FilterChain,
        limiter: &mut RateLimiter,
        existing: &mut HashSet<String>,
    ) -> DownloadOutcome {
        limiter.acquire().await;

        let body = match client.fetch_bytes(&candidate.url).await {
            Ok(body) => body,
            Err(error) => return failed_fetch(&candidate, &error),
        };
        if !body.declares_image() {
            let content_type = body.content_type.unwrap_or_default();
            return failed_fetch(
                &candidate,
                &FetchError::not_an_image(candidate.url.as_str(), content_type),
            );
        }

        let decision = filters.screen_bytes(candidate, &body.bytes);
        if !decision.passed {
            return DownloadOutcome::Filtered(decision);
        }
        let candidate = decision.candidate;

        let desired = filename_from_url(&candidate.url, body.content_type.as_deref());
        let name = unique_name(&desired, existing);
        let path = self.output_dir.join(&name);

        match write_file(&path, &body.bytes).await {
            Ok(()) => {
                existing.insert(name);
                debug!(url = %candidate.url, path = %path.display(), bytes = body.bytes.len(), "saved image");
                DownloadOutcome::Saved(SavedImage {
                    url: candidate.url,
                    path,
                    bytes: u64::try_from(body.bytes.len()).unwrap_or(u64::MAX),
                    source: candidate.source,
                })
            }
            Err(error) => {
                warn!(url = %candidate.url, error = %error, "failed to write image");
                DownloadOutcome::Failed(DownloadFailure {
                    url: candidate.url,
                    kind: "write".to_string(),
                    reason: error.to_string(),
                })
            }
        }
    }
}

fn failed_fetch(candidate: &ImageCandidate, error: &FetchError) -> DownloadOutcome {
    warn!(url = %candidate.url, kind = error.kind(), error = %error, "image fetch failed");
    DownloadOutcome::Failed(DownloadFailure {
        url: candidate.url.clone(),
        kind: error.kind().to_string(),
        reason: error.to_string(),
    })
}

/// Writes `bytes` to a new file at `path`, removing it again on failure.
async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), FilesystemError> {
    let result = async {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes).await?;
        writer.flush().await?;
        Ok::<(), std::io::Error>(())
    }
    .await;

    if let Err(error) = result {
        if error.kind() != std::io::ErrorKind::AlreadyExists {
            let _ = fs::remove_file(path).await;
        }
        return Err(FilesystemError::write(path, error));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::CandidateSource;
    use tempfile::TempDir;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    fn client() -> HttpClient {
        HttpClient::new(Duration::from_secs(5)).unwrap()
    }

    fn candidate(server: &MockServer, route: &str) -> ImageCandidate {
        let url = Url::parse(&format!("{}{route}", server.uri())).unwrap();
        ImageCandidate::new(url, CandidateSource::ImgSrc)
    }

    async fn serve_png(server: &MockServer, route: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(PNG_BYTES, "image/png"))
            .mount(server)
            .await;
    }

    #[derive(Default)]
    struct Recorder {
        started: Option<usize>,
        seen: usize,
        outcomes: Vec<&'static str>,
        finished: bool,
    }

    impl DownloadObserver for Recorder {
        fn on_start(&mut self, candidates: usize) {
            self.started = Some(candidates);
        }
        fn on_candidate(&mut self, _candidate: &ImageCandidate) {
            self.seen += 1;
        }
        fn on_outcome(&mut self, outcome: &DownloadOutcome) {
            self.outcomes.push(match outcome {
                DownloadOutcome::Saved(_) => "saved",
                DownloadOutcome::Failed(_) => "failed",
                DownloadOutcome::Filtered(_) => "filtered",
            });
        }
        fn on_finish(&mut self, _report: &DownloadReport) {
            self.finished = true;
        }
    }

    #[tokio::test]
    async fn test_prepare_output_dir_creates_nested_dir_and_lists_files() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b/c");
        let engine = DownloadEngine::new(&nested, 5, Duration::ZERO);
        assert!(engine.prepare_output_dir().await.unwrap().is_empty());

        std::fs::write(nested.join("cat.png"), b"x").unwrap();
        let existing = engine.prepare_output_dir().await.unwrap();
        assert!(existing.contains("cat.png"));
    }

    #[tokio::test]
    async fn test_prepare_output_dir_fails_when_path_is_a_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        let engine = DownloadEngine::new(&file, 5, Duration::ZERO);
        let err = engine.prepare_output_dir().await.unwrap_err();
        assert!(matches!(err, FilesystemError::OutputDir { .. }));
    }

    #[tokio::test]
    async fn test_run_saves_images_and_reports_events() {
        let server = MockServer::start().await;
        serve_png(&server, "/a.png").await;
        serve_png(&server, "/b.png").await;
        let temp = TempDir::new().unwrap();

        let engine = DownloadEngine::new(temp.path(), 10, Duration::ZERO);
        let mut recorder = Recorder::default();
        let report = engine
            .run(
                vec![candidate(&server, "/a.png"), candidate(&server, "/b.png")],
                &client(),
                &FilterChain::new(),
                &mut recorder,
            )
            .await
            .unwrap();

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.attempted, 2);
        assert_eq!(std::fs::read(temp.path().join("a.png")).unwrap(), PNG_BYTES);
        assert!(temp.path().join("b.png").exists());
        assert_eq!(recorder.started, Some(2));
        assert_eq!(recorder.seen, 2);
        assert_eq!(recorder.outcomes, vec!["saved", "saved"]);
        assert!(recorder.finished);
    }

    #[tokio::test]
    async fn test_run_suffixes_names_that_already_exist() {
        let server = MockServer::start().await;
        serve_png(&server, "/x/photo.png").await;
        serve_png(&server, "/y/photo.png").await;
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("photo.png"), b"old").unwrap();

        let engine = DownloadEngine::new(temp.path(), 10, Duration::ZERO);
        let report = engine
            .run(
                vec![candidate(&server, "/x/photo.png"), candidate(&server, "/y/photo.png")],
                &client(),
                &FilterChain::new(),
                &mut NoProgress,
            )
            .await
            .unwrap();

        let names: Vec<String> = report
            .saved
            .iter()
            .map(|s| s.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["photo_1.png", "photo_2.png"]);
        assert_eq!(std::fs::read(temp.path().join("photo.png")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_run_stops_at_max_images() {
        let server = MockServer::start().await;
        for route in ["/1.png", "/2.png", "/3.png"] {
            serve_png(&server, route).await;
        }
        let temp = TempDir::new().unwrap();

        let engine = DownloadEngine::new(temp.path(), 2, Duration::ZERO);
        let report = engine
            .run(
                ["/1.png", "/2.png", "/3.png"].map(|r| candidate(&server, r)),
                &client(),
                &FilterChain::new(),
                &mut NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(report.succeeded(), 2);
        assert!(report.max_reached);
        assert!(!temp.path().join("3.png").exists());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_records_non_image_content_as_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .mount(&server)
            .await;
        let temp = TempDir::new().unwrap();

        let engine = DownloadEngine::new(temp.path(), 10, Duration::ZERO);
        let report = engine
            .run(
                vec![candidate(&server, "/page.png")],
                &client(),
                &FilterChain::new(),
                &mut NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failures[0].kind, "not_an_image");
        assert!(!temp.path().join("page.png").exists());
    }

    /// Makes the output directory read-only while the first candidate is
    /// processed, then writable again.
    #[cfg(unix)]
    struct LockFirstWrite {
        dir: PathBuf,
        seen: usize,
    }

    #[cfg(unix)]
    impl DownloadObserver for LockFirstWrite {
        fn on_candidate(&mut self, _candidate: &ImageCandidate) {
            use std::os::unix::fs::PermissionsExt;
            let mode = if self.seen == 0 { 0o555 } else { 0o755 };
            std::fs::set_permissions(&self.dir, std::fs::Permissions::from_mode(mode)).unwrap();
            self.seen += 1;
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_records_write_failure_and_continues() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("out");
        std::fs::create_dir(&dir).unwrap();

        // Permission bits do not bind root; nothing to exercise there.
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();
        let writable_anyway = std::fs::write(dir.join(".check"), b"x").is_ok();
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();
        if writable_anyway {
            eprintln!("skipping: directory permissions are not enforced for this user");
            return;
        }

        let server = MockServer::start().await;
        serve_png(&server, "/a.png").await;
        serve_png(&server, "/b.png").await;

        let engine = DownloadEngine::new(&dir, 10, Duration::ZERO);
        let mut observer = LockFirstWrite {
            dir: dir.clone(),
            seen: 0,
        };
        let report = engine
            .run(
                vec![candidate(&server, "/a.png"), candidate(&server, "/b.png")],
                &client(),
                &FilterChain::new(),
                &mut observer,
            )
            .await
            .unwrap();

        assert_eq!(report.attempted, 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].kind, "write");
        assert_eq!(report.failures[0].url.path(), "/a.png");
        assert!(!dir.join("a.png").exists());
        assert_eq!(report.succeeded(), 1);
        assert_eq!(std::fs::read(dir.join("b.png")).unwrap(), PNG_BYTES);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_write_file_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.png");
        std::fs::write(&path, b"keep").unwrap();

        let err = write_file(&path, b"new").await.unwrap_err();
        assert!(matches!(err, FilesystemError::Write { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"keep");
    }
}
