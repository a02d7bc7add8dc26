//! A log stream: one live file with size-based rotation

use chrono::{Local, NaiveDate};
use oxidelog_core::{Error, Result};
use parking_lot::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info};

use crate::rotation::RotationState;

/// Live handle plus rotation counter, swapped together under the write lock
struct LiveFile {
    file: File,
    rotation: RotationState,
    /// Archive the handle points at after a rename whose reopen failed
    detached: Option<PathBuf>,
}

/// One logical log target (application or access).
///
/// Writers hold the lock in shared mode for the duration of a single write;
/// rotation holds it exclusively while the handle is swapped.
///
/// Rotation check: every write reserves its length against an in-memory byte
/// counter seeded from the file length when the handle is opened, so the hot
/// path never calls `stat()`. A write whose reservation starts past the limit
/// rotates first. The live file therefore ends at most one line above the
/// limit.
///
/// Rotation renames the live file while its handle is still open, which
/// requires POSIX rename semantics; on Windows the rename fails and the
/// stream keeps writing to the oversized file.
pub struct Stream {
    folder: PathBuf,
    base_name: String,
    path: PathBuf,
    max_size_bytes: u64,
    mirror_to_stdout: bool,
    live: RwLock<LiveFile>,
    written: AtomicU64,
}

impl Stream {
    /// Create the folder if needed and open `<folder>/<base_name>` for append
    pub fn open(
        folder: &Path,
        base_name: &str,
        max_size_bytes: u64,
        mirror_to_stdout: bool,
    ) -> Result<Self> {
        fs::create_dir_all(folder).map_err(|e| Error::startup_io(folder, e))?;

        let path = folder.join(base_name);
        let file = open_append(&path).map_err(|e| Error::startup_io(&path, e))?;
        let current_size = file
            .metadata()
            .map_err(|e| Error::startup_io(&path, e))?
            .len();

        debug!("Opened {} ({} bytes)", path.display(), current_size);

        Ok(Self {
            folder: folder.to_path_buf(),
            base_name: base_name.to_string(),
            path,
            max_size_bytes,
            mirror_to_stdout,
            live: RwLock::new(LiveFile {
                file,
                rotation: RotationState::new(Local::now().date_naive()),
                detached: None,
            }),
            written: AtomicU64::new(current_size),
        })
    }

    /// Append one finished line, rotating first when the limit is exceeded.
    ///
    /// A failed rotation is logged and the current handle keeps being used.
    pub fn write(&self, line: &str) -> Result<()> {
        let len = line.len() as u64;
        let mut rotation_failed = false;

        if self.mirror_to_stdout {
            mirror(line);
        }

        loop {
            let live = self.live.read();
            let offset = self.written.fetch_add(len, Ordering::AcqRel);

            if offset <= self.max_size_bytes || rotation_failed {
                return (&live.file)
                    .write_all(line.as_bytes())
                    .map_err(|e| Error::write(&self.path, e));
            }

            // Over the limit: give the reservation back and rotate
            self.written.fetch_sub(len, Ordering::AcqRel);
            drop(live);

            if let Err(e) = self.rotate_if_over_limit(Local::now().date_naive()) {
                error!("Rotation required and unable to rotate: {}", e);
                rotation_failed = true;
            }
        }
    }

    /// Rotate unconditionally, returning the archive path
    pub fn rotate(&self) -> Result<PathBuf> {
        let mut live = self.live.write();
        self.rotate_locked(&mut live, Local::now().date_naive())
    }

    /// Rotate if another writer has not done it already
    fn rotate_if_over_limit(&self, date: NaiveDate) -> Result<Option<PathBuf>> {
        let mut live = self.live.write();
        if self.written.load(Ordering::Acquire) <= self.max_size_bytes {
            return Ok(None);
        }
        self.rotate_locked(&mut live, date).map(Some)
    }

    fn rotate_locked(&self, live: &mut LiveFile, date: NaiveDate) -> Result<PathBuf> {
        // A previous rename already succeeded; only the reopen is retried
        let archive = match live.detached.clone() {
            Some(archive) => archive,
            None => self.detach_locked(live, date)?,
        };

        let fresh = open_append(&self.path).map_err(|e| Error::rotation(&self.path, e))?;
        let fresh_size = fresh.metadata().map(|m| m.len()).unwrap_or(0);

        // The previous handle is closed when it is dropped here
        live.file = fresh;
        live.detached = None;
        self.written.store(fresh_size, Ordering::Release);

        info!("Rotated {} to {}", self.path.display(), archive.display());
        Ok(archive)
    }

    /// Move the live file to its archive name and claim the suffix. Until a
    /// fresh handle is opened, writes land in the archive.
    fn detach_locked(&self, live: &mut LiveFile, date: NaiveDate) -> Result<PathBuf> {
        let archive = live.rotation.next_archive(&self.folder, &self.base_name, date)?;
        fs::rename(&self.path, &archive).map_err(|e| Error::rotation(&archive, e))?;
        live.rotation.commit();
        live.detached = Some(archive.clone());
        Ok(archive)
    }

    /// Path of the live file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written to the live file as tracked by the rotation counter
    pub fn current_size(&self) -> u64 {
        self.written.load(Ordering::Acquire)
    }

    /// Suffix the next archive will try first
    pub fn next_suffix(&self) -> u32 {
        self.live.read().rotation.suffix()
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
impl Stream {
    pub(crate) fn replace_handle(&self, file: File) {
        self.live.write().file = file;
    }
}

fn mirror(line: &str) {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let _ = out.write_all(line.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn archives(dir: &Path, base_name: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| crate::rotation::is_archive_of(n, base_name))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_stream_open_creates_folder() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("nested").join("logs");

        let stream = Stream::open(&folder, "application.log", 1024, false).unwrap();
        assert!(folder.join("application.log").exists());
        assert_eq!(stream.path(), folder.join("application.log"));
        assert_eq!(stream.current_size(), 0);
    }

    #[test]
    fn test_stream_open_fails_on_file_folder() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let result = Stream::open(&blocker, "application.log", 1024, false);
        assert!(matches!(result, Err(Error::StartupIo { .. })));
    }

    #[test]
    fn test_stream_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("access.log"), "previous\n").unwrap();

        let stream = Stream::open(dir.path(), "access.log", 1024, false).unwrap();
        assert_eq!(stream.current_size(), 9);
        stream.write("next\n").unwrap();

        let content = fs::read_to_string(dir.path().join("access.log")).unwrap();
        assert_eq!(content, "previous\nnext\n");
    }

    #[test]
    fn test_stream_rotates_past_limit() {
        let dir = TempDir::new().unwrap();
        let stream = Stream::open(dir.path(), "application.log", 100, false).unwrap();
        let line = format!("{}\n", "x".repeat(39));

        for _ in 0..10 {
            stream.write(&line).unwrap();
        }

        let names = archives(dir.path(), "application.log");
        assert!(!names.is_empty());
        for name in &names {
            let size = fs::metadata(dir.path().join(name)).unwrap().len();
            assert!(size <= 100 + line.len() as u64, "{} is {} bytes", name, size);
        }
        let live = fs::metadata(stream.path()).unwrap().len();
        assert!(live <= 100 + line.len() as u64);
        assert_eq!(live, stream.current_size());
    }

    #[test]
    fn test_rotate_twice_same_day_never_reuses_suffix() {
        let dir = TempDir::new().unwrap();
        let stream = Stream::open(dir.path(), "application.log", 1024, false).unwrap();

        stream.write("first\n").unwrap();
        let a = stream.rotate().unwrap();
        stream.write("second\n").unwrap();
        let b = stream.rotate().unwrap();

        assert_ne!(a, b);
        assert_eq!(fs::read_to_string(&a).unwrap(), "first\n");
        assert_eq!(fs::read_to_string(&b).unwrap(), "second\n");
        assert_eq!(stream.next_suffix(), 2);
    }

    #[test]
    fn test_rotate_skips_foreign_archive() {
        let dir = TempDir::new().unwrap();
        let today = Local::now().date_naive();
        let taken = dir
            .path()
            .join(crate::rotation::archive_file_name(today, 0, "access.log"));
        fs::write(&taken, "keep me").unwrap();

        let stream = Stream::open(dir.path(), "access.log", 1024, false).unwrap();
        stream.write("line\n").unwrap();
        let archive = stream.rotate().unwrap();

        assert_ne!(archive, taken);
        assert_eq!(fs::read_to_string(&taken).unwrap(), "keep me");
        assert_eq!(fs::read_to_string(&archive).unwrap(), "line\n");
    }

    #[test]
    fn test_failed_rotation_keeps_writing() {
        let dir = TempDir::new().unwrap();
        let stream = Stream::open(dir.path(), "application.log", 1, false).unwrap();
        stream.write("ab\n").unwrap();

        // Live file gone: rename fails, the stale handle keeps being used
        fs::remove_file(stream.path()).unwrap();
        assert!(stream.write("cd\n").is_ok());
        assert!(stream.current_size() > 1);
    }

    #[test]
    fn test_failed_reopen_retries_without_renaming_again() {
        let dir = TempDir::new().unwrap();
        let stream = Stream::open(dir.path(), "application.log", 1024, false).unwrap();
        stream.write("first\n").unwrap();

        let archive = {
            let mut live = stream.live.write();
            stream.detach_locked(&mut live, Local::now().date_naive()).unwrap()
        };
        // Reopen fails while a directory sits at the live path
        fs::create_dir(stream.path()).unwrap();
        assert!(matches!(stream.rotate(), Err(Error::Rotation { .. })));
        assert_eq!(stream.next_suffix(), 1);
        assert_eq!(archives(dir.path(), "application.log").len(), 1);

        fs::remove_dir(stream.path()).unwrap();
        assert_eq!(stream.rotate().unwrap(), archive);
        assert_eq!(stream.next_suffix(), 1);

        stream.write("second\n").unwrap();
        assert_eq!(fs::read_to_string(&archive).unwrap(), "first\n");
        assert_eq!(fs::read_to_string(stream.path()).unwrap(), "second\n");
    }

    #[test]
    fn test_write_error_is_returned() {
        let dir = TempDir::new().unwrap();
        let stream = Stream::open(dir.path(), "access.log", 1024, false).unwrap();

        stream.replace_handle(File::open(stream.path()).unwrap());
        assert!(matches!(stream.write("lost\n"), Err(Error::Write { .. })));

        stream.replace_handle(open_append(stream.path()).unwrap());
        stream.write("kept\n").unwrap();
        assert_eq!(fs::read_to_string(stream.path()).unwrap(), "kept\n");
    }
}
