use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, NaiveDateTime};
use image::RgbImage;

use crate::error::{MenuError, Result};
use crate::export::{self, JPEG_QUALITY};
use crate::types::HistoryRecord;

pub const FILE_PREFIX: &str = "cardapio_";
pub const FILE_EXTENSION: &str = "jpg";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
pub const LABEL_FORMAT: &str = "%d/%m - %H:%M";
pub const MAX_HISTORY: usize = 30;

/// Rolling archive of saved boards, one JPEG per save, capped at `retention`.
pub struct HistoryManager {
    storage_dir: PathBuf,
    retention: usize,
    quality: u8,
}

struct StoredFile {
    path: PathBuf,
    file_name: String,
    modified: SystemTime,
    stamp: Option<NaiveDateTime>,
    sequence: u32,
}

impl StoredFile {
    fn to_record(&self) -> HistoryRecord {
        HistoryRecord {
            file_name: self.file_name.clone(),
            path: self.path.to_string_lossy().to_string(),
            modified_at: unix_seconds(self.modified),
            generated_at: self.stamp.map(|s| s.format(TIMESTAMP_FORMAT).to_string()),
            label: label_for(&self.file_name),
        }
    }
}

impl HistoryManager {
    pub fn new(storage_dir: impl Into<PathBuf>, retention: usize) -> Result<Self> {
        let storage_dir = storage_dir.into();

        if !storage_dir.exists() {
            fs::create_dir_all(&storage_dir)?;
        }

        log::info!("HistoryManager initialized with storage_dir: {}", storage_dir.display());

        Ok(Self {
            storage_dir,
            retention: retention.max(1),
            quality: JPEG_QUALITY,
        })
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn save(&self, image: &RgbImage) -> Result<HistoryRecord> {
        self.save_at(image, Local::now().naive_local())
    }

    /// Writes `image` under a name derived from `at`, then prunes. A name
    /// already taken within the same second gets a `_2`, `_3`, ... suffix.
    pub fn save_at(&self, image: &RgbImage, at: NaiveDateTime) -> Result<HistoryRecord> {
        let jpeg = export::encode_jpeg(image, self.quality)?;
        let stamp = at.format(TIMESTAMP_FORMAT).to_string();

        let mut sequence = 1u32;
        let (path, mut file) = loop {
            let file_name = if sequence == 1 {
                format!("{FILE_PREFIX}{stamp}.{FILE_EXTENSION}")
            } else {
                format!("{FILE_PREFIX}{stamp}_{sequence}.{FILE_EXTENSION}")
            };
            let path = self.storage_dir.join(&file_name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    log::debug!("[HistoryManager] {} already exists, trying next suffix", file_name);
                    sequence += 1;
                }
                Err(e) => {
                    log::error!("Failed to create history file {}: {}", path.display(), e);
                    return Err(e.into());
                }
            }
        };

        write_or_discard(&path, &mut file, &jpeg)?;
        drop(file);

        log::info!("Saved menu to history: {} ({} bytes)", path.display(), jpeg.len());

        let modified = fs::metadata(&path)?.modified()?;
        let file_name = file_name_of(&path);
        let record = StoredFile {
            stamp: Some(at),
            sequence,
            modified,
            file_name,
            path,
        }
        .to_record();

        self.prune()?;

        Ok(record)
    }

    /// Deletes the oldest files until at most `retention` remain. Returns how
    /// many were removed; running it again is a no-op.
    pub fn prune(&self) -> Result<usize> {
        let files = self.scan()?;
        let excess = files.len().saturating_sub(self.retention);

        for stored in files.iter().take(excess) {
            match fs::remove_file(&stored.path) {
                Ok(()) => log::debug!("[HistoryManager] Pruned {}", stored.file_name),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    log::error!("Failed to prune history file {}: {}", stored.path.display(), e);
                    return Err(e.into());
                }
            }
        }

        if excess > 0 {
            log::info!("Pruned {} old menu(s), {} kept", excess, self.retention);
        }
        Ok(excess)
    }

    /// Up to `limit` records, most recently modified first.
    pub fn list(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        let files = self.scan()?;
        Ok(files.iter().rev().take(limit).map(StoredFile::to_record).collect())
    }

    /// Bytes of a single history file, addressed by its bare file name.
    pub fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        if !is_plain_history_name(file_name) {
            return Err(MenuError::InvalidHistoryName(file_name.to_string()));
        }
        let path = self.storage_dir.join(file_name);
        fs::read(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                MenuError::HistoryNotFound(file_name.to_string())
            } else {
                log::error!("Failed to read history file {}: {}", path.display(), e);
                MenuError::Io(e)
            }
        })
    }

    /// All JPEG files in the directory, oldest first.
    fn scan(&self) -> Result<Vec<StoredFile>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.storage_dir).map_err(|e| {
            log::error!("Failed to read history directory: {}", e);
            e
        })? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => modified,
                // Removed between read_dir and stat.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let file_name = file_name_of(&path);
            let (stamp, sequence) = match parse_file_name(&file_name) {
                Some((stamp, sequence)) => (Some(stamp), sequence),
                None => (None, 0),
            };
            files.push(StoredFile {
                path,
                file_name,
                modified,
                stamp,
                sequence,
            });
        }

        files.sort_by(|a, b| {
            (a.modified, a.stamp, a.sequence, &a.file_name)
                .cmp(&(b.modified, b.stamp, b.sequence, &b.file_name))
        });
        Ok(files)
    }
}

/// Writes `bytes` to the freshly created `path`; on failure the partial file
/// is removed so it never shows up in listings or counts toward retention.
fn write_or_discard<W: Write>(path: &Path, out: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    if let Err(e) = out.write_all(bytes).and_then(|()| out.flush()) {
        log::error!("Failed to write history file {}: {}", path.display(), e);
        if let Err(remove_err) = fs::remove_file(path) {
            log::error!("Failed to remove partial file {}: {}", path.display(), remove_err);
        }
        return Err(e);
    }
    Ok(())
}

/// `cardapio_<stamp>.jpg` or `cardapio_<stamp>_<n>.jpg` to (stamp, n).
pub fn parse_file_name(file_name: &str) -> Option<(NaiveDateTime, u32)> {
    let stem = file_name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_EXTENSION)?
        .strip_suffix('.')?;

    if let Ok(stamp) = NaiveDateTime::parse_from_str(stem, TIMESTAMP_FORMAT) {
        return Some((stamp, 1));
    }

    let (stamp, sequence) = stem.rsplit_once('_')?;
    let sequence: u32 = sequence.parse().ok()?;
    let stamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    Some((stamp, sequence))
}

/// Human readable label, falling back to the raw file name.
pub fn label_for(file_name: &str) -> String {
    match parse_file_name(file_name) {
        Some((stamp, _)) => stamp.format(LABEL_FORMAT).to_string(),
        None => file_name.to_string(),
    }
}

fn is_plain_history_name(file_name: &str) -> bool {
    !file_name.is_empty()
        && !file_name.contains(|c: char| c == '/' || c == '\\')
        && file_name != ".."
        && Path::new(file_name).extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn unix_seconds(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
