//! Archive naming and suffix bookkeeping for size-based rotation

use chrono::NaiveDate;
use oxidelog_core::{Error, Result, ARCHIVE_DATE_FORMAT};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Archive file name: `<YYYY-MM-DD>-<suffix>-<base_name>`
pub fn archive_file_name(date: NaiveDate, suffix: u32, base_name: &str) -> String {
    format!("{}-{}-{}", date.format(ARCHIVE_DATE_FORMAT), suffix, base_name)
}

/// Whether `file_name` is an archive of `base_name`: `<YYYY-MM-DD>-<digits>-`
/// followed by the base name. The live file never matches.
pub fn is_archive_of(file_name: &str, base_name: &str) -> bool {
    let Some(prefix) = file_name.strip_suffix(base_name) else {
        return false;
    };
    let Some(prefix) = prefix.strip_suffix('-') else {
        return false;
    };
    let Some((date, suffix)) = prefix.rsplit_once('-') else {
        return false;
    };

    !suffix.is_empty()
        && suffix.bytes().all(|b| b.is_ascii_digit())
        && NaiveDate::parse_from_str(date, ARCHIVE_DATE_FORMAT).is_ok()
}

/// Rotation counter of one stream. The suffix restarts at 0 every new day.
#[derive(Debug, Clone)]
pub struct RotationState {
    date: NaiveDate,
    suffix: u32,
}

impl RotationState {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, suffix: 0 }
    }

    pub fn suffix(&self) -> u32 {
        self.suffix
    }

    /// Find the first free archive path for `date`, starting at the current
    /// suffix and moving past names that already exist.
    pub fn next_archive(&mut self, folder: &Path, base_name: &str, date: NaiveDate) -> Result<PathBuf> {
        if date != self.date {
            self.date = date;
            self.suffix = 0;
        }

        loop {
            let candidate = folder.join(archive_file_name(date, self.suffix, base_name));
            match fs::symlink_metadata(&candidate) {
                Ok(_) => self.suffix += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(candidate),
                Err(e) => return Err(Error::rotation(&candidate, e)),
            }
        }
    }

    /// Mark the suffix returned by `next_archive` as used
    pub fn commit(&mut self) {
        self.suffix += 1;
    }
}
