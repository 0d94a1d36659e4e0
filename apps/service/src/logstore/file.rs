use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::LogStore;
use crate::error::LogStoreError;
use crate::locks::KeyedLocks;

const ACTIVE_EXTENSION: &str = "log";
const ARCHIVE_EXTENSION: &str = "gz";

/// Log files under one directory: `<name>.log` for active content and
/// `<name>-<epoch-ms>.gz` for archives.
///
/// Every operation on a given name runs under that name's async mutex, which
/// is what keeps rotation from losing or duplicating concurrent appends.
#[derive(Debug)]
pub struct FileLogStore {
    dir: PathBuf,
    locks: KeyedLocks,
}

impl FileLogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), locks: KeyedLocks::default() }
    }

    fn active_path(&self, name: &str) -> Result<PathBuf, LogStoreError> {
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
        if !valid {
            return Err(LogStoreError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.{ACTIVE_EXTENSION}")))
    }

    /// Current active content of `name`; empty when the log does not exist
    pub async fn read_active(&self, name: &str) -> Result<String, LogStoreError> {
        let path = self.active_path(name)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Archive ids produced for `name`, oldest first
    pub async fn list_archives(&self, name: &str) -> Result<Vec<String>, LogStoreError> {
        self.active_path(name)?;
        let prefix = format!("{name}-");
        let mut archives: Vec<(i64, String)> = self
            .file_stems(ARCHIVE_EXTENSION)
            .await?
            .into_iter()
            .filter_map(|(stem, _)| {
                let stamp = stem.strip_prefix(&prefix)?.parse::<i64>().ok()?;
                Some((stamp, stem))
            })
            .collect();
        archives.sort();
        Ok(archives.into_iter().map(|(_, stem)| stem).collect())
    }

    /// Decompressed content of an archive
    pub async fn read_archive(&self, archive_id: &str) -> Result<String, LogStoreError> {
        let bytes = fs::read(self.dir.join(format!("{archive_id}.{ARCHIVE_EXTENSION}"))).await?;
        let content = tokio::task::spawn_blocking(move || {
            let mut content = String::new();
            GzDecoder::new(bytes.as_slice()).read_to_string(&mut content)?;
            Ok::<_, std::io::Error>(content)
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(content)
    }

    async fn file_stems(&self, extension: &str) -> Result<Vec<(String, u64)>, LogStoreError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut stems = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != extension) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                stems.push((stem.to_string(), entry.metadata().await?.len()));
            }
        }
        Ok(stems)
    }

    async fn archive_locked(&self, name: &str) -> Result<Option<String>, LogStoreError> {
        let content = self.read_active(name).await?;
        if content.is_empty() {
            return Ok(None);
        }

        let compressed = tokio::task::spawn_blocking(move || {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(content.as_bytes())?;
            encoder.finish()
        })
        .await
        .map_err(std::io::Error::other)??;

        // Two rotations within the same millisecond get distinct stamps.
        let mut stamp = chrono::Utc::now().timestamp_millis();
        loop {
            let archive_id = format!("{name}-{stamp}");
            let path = self.dir.join(format!("{archive_id}.{ARCHIVE_EXTENSION}"));
            match fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => {
                    write_archive(file, &path, &compressed).await?;
                    debug!("Archived log {} into {}", name, archive_id);
                    return Ok(Some(archive_id));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => stamp += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn append_locked(&self, path: &Path, line: &str) -> Result<(), LogStoreError> {
        fs::create_dir_all(&self.dir).await?;
        let mut file = fs::OpenOptions::new().create(true).append(true).open(path).await?;
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn reset_locked(&self, name: &str) -> Result<(), LogStoreError> {
        let path = self.active_path(name)?;
        match fs::OpenOptions::new().write(true).truncate(true).open(&path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl LogStore for FileLogStore {
    async fn append(&self, name: &str, line: &str) -> Result<(), LogStoreError> {
        let path = self.active_path(name)?;
        self.locks.with(name, self.append_locked(&path, line)).await
    }

    async fn list_unrotated(&self) -> Result<Vec<String>, LogStoreError> {
        Ok(self
            .file_stems(ACTIVE_EXTENSION)
            .await?
            .into_iter()
            .filter(|(_, len)| *len > 0)
            .map(|(stem, _)| stem)
            .collect())
    }

    async fn archive(&self, name: &str) -> Result<Option<String>, LogStoreError> {
        self.active_path(name)?;
        self.locks.with(name, self.archive_locked(name)).await
    }

    async fn reset(&self, name: &str) -> Result<(), LogStoreError> {
        self.active_path(name)?;
        self.locks.with(name, self.reset_locked(name)).await
    }

    async fn rotate(&self, name: &str) -> Result<Option<String>, LogStoreError> {
        self.active_path(name)?;
        self.locks
            .with(name, async {
                let archived = self.archive_locked(name).await?;
                if archived.is_some() {
                    self.reset_locked(name).await?;
                }
                Ok::<_, LogStoreError>(archived)
            })
            .await
    }
}

/// Fill a freshly created archive. A partial archive is removed, so the lines
/// it would hold stay only in the active log.
async fn write_archive(mut file: fs::File, path: &Path, compressed: &[u8]) -> std::io::Result<()> {
    let written = async {
        file.write_all(compressed).await?;
        file.sync_all().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path).await {
            warn!("Could not remove partial archive {}: {}", path.display(), cleanup);
        }
        return Err(e);
    }
    Ok(())
}
