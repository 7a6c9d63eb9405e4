//! Short-lived image files backing externally fetchable URLs.
//!
//! Images are written under a temp directory with time-stamped names and
//! reclaimed by [`Sweeper`] once they outlive the configured age.

mod payload;
mod sweeper;

pub use payload::{ImagePayload, strip_data_url_prefix};
pub use sweeper::Sweeper;

use crate::{
    Result,
    config::{ServerConfig, StorageConfig},
};
use chrono::{DateTime, Utc};
use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicI64, Ordering},
    time::{Duration, SystemTime},
};
use tracing::{debug, info, warn};

const FILE_PREFIX: &str = "math-";
const FILE_EXTENSION: &str = "png";

/// Route under which stored images are served.
pub const STATIC_ROUTE: &str = "/temp";

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub filename: String,
    pub filepath: PathBuf,
    pub created_at: DateTime<Utc>,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
    pub failed: usize,
}

pub struct ImageStore {
    dir: PathBuf,
    public_base_url: String,
    max_age: Duration,
    last_stamp: AtomicI64,
}

impl ImageStore {
    /// The directory must already exist; it is never created here.
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_age: DEFAULT_MAX_AGE,
            last_stamp: AtomicI64::new(0),
        }
    }

    pub fn from_config(storage: &StorageConfig, server: &ServerConfig) -> Self {
        Self::new(&storage.temp_dir, server.public_base_url())
            .with_max_age(Duration::from_secs(storage.max_age_secs))
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Decodes a base64 image (data-URL prefix optional) and writes it to disk.
    pub async fn save(&self, base64_data: &str) -> Result<StoredImage> {
        let payload = ImagePayload::parse(base64_data)?;
        self.save_payload(&payload).await
    }

    pub async fn save_payload(&self, payload: &ImagePayload) -> Result<StoredImage> {
        let filename = format!("{FILE_PREFIX}{}.{FILE_EXTENSION}", self.next_stamp());
        let filepath = self.dir.join(&filename);

        tokio::fs::write(&filepath, payload.bytes()).await?;

        let url = format!("{}{}/{}", self.public_base_url, STATIC_ROUTE, filename);
        debug!("Saved {} bytes to {}", payload.bytes().len(), filepath.display());

        Ok(StoredImage {
            filename,
            filepath,
            created_at: Utc::now(),
            url,
        })
    }

    /// Nanosecond timestamp, strictly increasing across calls on this store.
    fn next_stamp(&self) -> i64 {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        let advance = |prev: i64| now.max(prev.saturating_add(1));
        match self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| Some(advance(prev)))
        {
            Ok(prev) | Err(prev) => advance(prev),
        }
    }

    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(SystemTime::now()).await
    }

    /// Deletes every entry whose modification time is older than the max
    /// age relative to `now`. Failures are logged and counted; the sweep
    /// always continues with the remaining entries.
    pub async fn sweep_at(&self, now: SystemTime) -> SweepReport {
        let mut report = SweepReport::default();

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cleanup error: cannot list {}: {}", self.dir.display(), e);
                report.failed += 1;
                return report;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Cleanup error: cannot read entry in {}: {}", self.dir.display(), e);
                    report.failed += 1;
                    break;
                }
            };

            report.scanned += 1;
            let path = entry.path();
            match self.remove_if_expired(&path, now).await {
                Ok(true) => {
                    debug!("Removed expired image {}", path.display());
                    report.removed += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("Cleanup error: cannot remove {}: {}", path.display(), e);
                    report.failed += 1;
                }
            }
        }

        if report.removed > 0 || report.failed > 0 {
            info!(
                "Swept {}: scanned {}, removed {}, failed {}",
                self.dir.display(),
                report.scanned,
                report.removed,
                report.failed
            );
        }

        report
    }

    async fn remove_if_expired(&self, path: &Path, now: SystemTime) -> Result<bool> {
        let modified = tokio::fs::metadata(path).await?.modified()?;
        // Files stamped in the future count as fresh.
        let age = now.duration_since(modified).unwrap_or_default();
        if age <= self.max_age {
            return Ok(false);
        }

        tokio::fs::remove_file(path).await?;
        Ok(true)
    }
}
