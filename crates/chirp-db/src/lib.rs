pub mod document;
pub mod error;
pub mod queries;

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tempfile::NamedTempFile;
use tracing::{debug, info};

pub use document::Document;
pub use error::{Result, StoreError};
pub use queries::UserUpdate;

/// File-backed record store.
///
/// Every operation re-reads the whole document from disk. The lock guards
/// the full read-decode-mutate-encode-write cycle, not only the I/O, so two
/// writers can never both decode the same state and drop each other's
/// update. It only coordinates threads of this process.
pub struct Database {
    path: PathBuf,
    lock: RwLock<()>,
}

impl Database {
    /// Open the document at `path`, creating an empty one if none exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let db = Self {
            path: path.to_path_buf(),
            lock: RwLock::new(()),
        };

        {
            let _guard = db.lock.write().map_err(|_| StoreError::Poisoned)?;
            match fs::metadata(&db.path) {
                Ok(_) => {
                    // Fail fast on a corrupt file rather than on the first request.
                    let doc = db.load()?;
                    info!(
                        "Database opened at {} ({} users, {} chirps)",
                        db.path.display(),
                        doc.users.len(),
                        doc.chirps.len()
                    );
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    db.persist(&Document::default())?;
                    info!("Initialized empty database at {}", db.path.display());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against a freshly decoded document under the shared lock.
    pub fn with_doc<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Document) -> Result<T>,
    {
        let _guard = self.lock.read().map_err(|_| StoreError::Poisoned)?;
        let doc = self.load()?;
        f(&doc)
    }

    /// Read-modify-write under the exclusive lock. The document is written
    /// back only if `f` succeeds; on error the file is left untouched.
    pub fn with_doc_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let _guard = self.lock.write().map_err(|_| StoreError::Poisoned)?;
        let mut doc = self.load()?;
        let out = f(&mut doc)?;
        self.persist(&doc)?;
        Ok(out)
    }

    /// Replace the document with an empty one.
    pub fn reset(&self) -> Result<()> {
        let _guard = self.lock.write().map_err(|_| StoreError::Poisoned)?;
        self.persist(&Document::default())?;
        info!("Database reset at {}", self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Document> {
        let bytes = fs::read(&self.path)?;
        Document::decode(&bytes)
    }

    /// Write to a sibling temp file, fsync, then rename over the target so
    /// readers only ever see a complete document.
    fn persist(&self, doc: &Document) -> Result<()> {
        let bytes = doc.encode()?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(
            users = doc.users.len(),
            chirps = doc.chirps.len(),
            bytes = bytes.len(),
            "persisted document"
        );
        Ok(())
    }
}
