//! One JSON file per record inside a data directory.
//!
//! Writes go to `<record>.json.tmp` first, are synced, and then renamed over
//! the real file, followed by a sync of the directory so the rename survives a
//! crash. Readers therefore see either the old or the new document.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::schema::Record;
use crate::{Store, StoreError};

#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates the directory if it does not exist yet.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            record: "data directory",
            source,
        })?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, record: Record) -> PathBuf {
        self.dir.join(record.file_name())
    }

    fn write_atomic(&self, record: Record, bytes: &[u8]) -> io::Result<()> {
        let path = self.path(record);
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        sync_dir(&self.dir)
    }
}

fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

impl Store for FileStore {
    fn read(&self, record: Record) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.path(record)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                record: record.name(),
                source,
            }),
        }
    }

    fn write(&mut self, record: Record, bytes: &[u8]) -> Result<(), StoreError> {
        debug!("writing {} ({} bytes)", record.name(), bytes.len());
        self.write_atomic(record, bytes)
            .map_err(|source| StoreError::Io {
                record: record.name(),
                source,
            })
    }

    fn remove(&mut self, record: Record) -> Result<(), StoreError> {
        match fs::remove_file(self.path(record)) {
            Ok(()) => sync_dir(&self.dir).map_err(|source| StoreError::Io {
                record: record.name(),
                source,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                record: record.name(),
                source,
            }),
        }
    }
}
