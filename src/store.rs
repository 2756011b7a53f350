use bincode::{deserialize_from, serialize_into};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::sorter::SizedEntry;

/// A stored row of the most recently sorted table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRecord {
    pub id: u32,
    #[serde(rename = "序号")]
    pub seq: u32,
    #[serde(rename = "姓名")]
    pub name: String,
    #[serde(rename = "尺码")]
    pub size: String,
    #[serde(rename = "创建时间")]
    pub created_at: DateTime<Utc>,
}

/// Holds the records of the last processed upload
///
/// Every upload replaces the whole table. When a snapshot path is given the
/// records are written to it as gzip-compressed bincode after each
/// replacement and reloaded on open, so downloads survive a restart.
pub struct RecordStore {
    path: Option<PathBuf>,
    records: RwLock<Vec<SizeRecord>>,
}

impl RecordStore {
    /// Store that lives only in memory.
    pub fn in_memory() -> Self {
        RecordStore {
            path: None,
            records: RwLock::new(Vec::new()),
        }
    }

    /// Open a store, loading the snapshot at `path` if one exists.
    pub fn open(path: Option<PathBuf>) -> Result<Self> {
        let Some(path) = path else {
            info!("record store running in memory");
            return Ok(Self::in_memory());
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let records = if path.exists() {
            let records = load_snapshot(&path)?;
            info!(
                "loaded {} size records from {}",
                records.len(),
                path.display()
            );
            records
        } else {
            info!("no snapshot at {}, starting empty", path.display());
            Vec::new()
        };

        Ok(RecordStore {
            path: Some(path),
            records: RwLock::new(records),
        })
    }

    /// Replace every stored record with `entries`
    ///
    /// Ids restart at 1 and all new records share one creation time. The
    /// snapshot is written before the in-memory table is swapped, so a failed
    /// write leaves the previous records in place.
    pub fn replace_all(&self, entries: &[SizedEntry]) -> Result<Vec<SizeRecord>> {
        let now = Utc::now();
        let records: Vec<SizeRecord> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| SizeRecord {
                id: (i + 1) as u32,
                seq: entry.seq,
                name: entry.name.clone(),
                size: entry.size.clone(),
                created_at: now,
            })
            .collect();

        let mut guard = self.write_guard()?;
        if let Some(path) = &self.path {
            save_snapshot(path, &records)?;
        }
        *guard = records.clone();
        info!("stored {} size records", records.len());

        Ok(records)
    }

    /// All records ordered by sequence number.
    pub fn records(&self) -> Result<Vec<SizeRecord>> {
        let mut records = self.read_guard()?.clone();
        records.sort_by_key(|r| r.seq);
        Ok(records)
    }

    /// Check that the backing snapshot can still be read.
    pub fn ping(&self) -> Result<()> {
        let _guard = self.read_guard()?;
        match &self.path {
            Some(path) if path.exists() => load_snapshot(path).map(|_| ()),
            Some(path) => {
                let dir = path.parent().filter(|d| !d.as_os_str().is_empty());
                match dir {
                    Some(dir) if !dir.is_dir() => Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("snapshot directory {} is missing", dir.display()),
                    ))),
                    _ => Ok(()),
                }
            }
            None => Ok(()),
        }
    }

    fn read_guard(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<SizeRecord>>> {
        self.records.read().map_err(|_| poisoned())
    }

    fn write_guard(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<SizeRecord>>> {
        self.records.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> Error {
    warn!("record store lock poisoned");
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "record store lock poisoned",
    ))
}

fn save_snapshot(path: &Path, records: &[SizeRecord]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let tmp = NamedTempFile::new_in(dir)?;

    {
        let encoder = GzEncoder::new(tmp.as_file(), Compression::default());
        let mut writer = BufWriter::new(encoder);
        serialize_into(&mut writer, records)?;
        let encoder = writer.into_inner().map_err(|e| e.into_error())?;
        encoder.finish()?.sync_all()?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<Vec<SizeRecord>> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut reader = BufReader::new(decoder);

    let records: Vec<SizeRecord> = deserialize_from(&mut reader)?;
    Ok(records)
}
