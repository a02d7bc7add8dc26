//! Age-based removal of archived log files

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use oxidelog_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};

use crate::rotation::is_archive_of;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Outcome of one purge pass
#[derive(Debug, Default)]
pub struct PurgeReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Delete every archive of `base_name` in `folder` last modified before
/// `now - max_age_days`. The live file is never touched.
///
/// Only a failure to read the folder is returned; per-file failures are
/// logged and collected in the report.
pub fn purge_once(folder: &Path, base_name: &str, max_age_days: u32, now: SystemTime) -> Result<PurgeReport> {
    let max_age = Duration::from_secs(u64::from(max_age_days) * SECS_PER_DAY);
    let cutoff = now.checked_sub(max_age).unwrap_or(SystemTime::UNIX_EPOCH);
    let mut report = PurgeReport::default();

    let entries = fs::read_dir(folder).map_err(|e| Error::purge(folder, e))?;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Purge routine unable to read entry in [{}]: {}", folder.display(), e);
                continue;
            }
        };

        let name = entry.file_name();
        if !is_archive_of(&name.to_string_lossy(), base_name) {
            continue;
        }

        let path = entry.path();
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!("Purge routine unable to stat [{}]: {}", path.display(), e);
                report.failed.push(path);
                continue;
            }
        };

        if modified < cutoff {
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("Purge routine removed file [{}]", path.display());
                    report.removed.push(path);
                }
                Err(e) => {
                    error!("Purge routine unable to remove file [{}]: {}", path.display(), e);
                    report.failed.push(path);
                }
            }
        }
    }

    Ok(report)
}

/// Background purge loop for one stream.
///
/// Scans once on spawn, then once per interval. `stop` wakes the sleeping
/// loop; a scan already in progress finishes first.
pub struct PurgeScheduler {
    shutdown_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl PurgeScheduler {
    /// Start the loop, or return `None` when `max_age_days` is 0
    pub fn spawn(
        folder: &Path,
        base_name: &str,
        max_age_days: u32,
        interval: Duration,
    ) -> Result<Option<Self>> {
        if max_age_days == 0 {
            debug!("Purge disabled for {}", base_name);
            return Ok(None);
        }

        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let folder = folder.to_path_buf();
        let base_name = base_name.to_string();

        let handle = thread::Builder::new()
            .name(format!("oxidelog-purge-{}", base_name))
            .spawn(move || loop {
                if let Err(e) = purge_once(&folder, &base_name, max_age_days, SystemTime::now()) {
                    error!("Purge routine failed: {}", e);
                }
                match shutdown_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            })?;

        Ok(Some(Self { shutdown_tx, handle }))
    }

    /// Wake the loop and wait for it to exit
    pub fn stop(self) {
        drop(self.shutdown_tx);
        if self.handle.join().is_err() {
            error!("Purge routine panicked");
        }
    }
}
