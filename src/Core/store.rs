// Out-of-band payload storage keyed by slot token.
// The buffer only ever holds tokens; payload bytes live here.

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{BufferError, Result};
use crate::SPSC::Structs::SlotToken;

/// Payload store trait shared by the in-process and network bindings.
pub trait PayloadStore: Send + Sync + Debug {
    /// Store `payload` under `token`, replacing any previous content.
    fn write(&self, token: SlotToken, payload: &[u8]) -> Result<()>;

    /// Read the payload for `token`.
    ///
    /// # Returns
    /// * `Err(BufferError::PayloadMissing)` if nothing is stored under `token`
    fn read(&self, token: SlotToken) -> Result<Vec<u8>>;

    /// Delete the payload for `token`. Deleting a missing payload is not an error.
    fn delete(&self, token: SlotToken) -> Result<()>;

    /// Read and delete in one step.
    fn take(&self, token: SlotToken) -> Result<Vec<u8>> {
        let payload = self.read(token)?;
        self.delete(token)?;
        Ok(payload)
    }

    /// Number of payloads currently stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Best-effort removal of every stored payload. Returns how many were removed.
    fn purge(&self) -> Result<usize>;
}

/// Stores one file per token in a shared directory.
#[derive(Debug)]
pub struct DirectoryStore {
    dir: PathBuf,
}

const FILE_PREFIX: &str = "student";
const FILE_SUFFIX: &str = ".xml";

impl DirectoryStore {
    /// Opens (creating if needed) the shared directory at `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to create shared directory {}: {e}", dir.display()),
            )
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a token, e.g. `student7.xml`.
    pub fn file_name(token: SlotToken) -> String {
        format!("{FILE_PREFIX}{token}{FILE_SUFFIX}")
    }

    /// Number of payload files, or the error from listing the directory.
    pub fn try_len(&self) -> Result<usize> {
        Ok(self.payload_files()?.len())
    }

    pub fn path_for(&self, token: SlotToken) -> PathBuf {
        self.dir.join(Self::file_name(token))
    }

    fn is_payload_file(name: &str) -> bool {
        name.strip_prefix(FILE_PREFIX)
            .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
            .map(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(false)
    }

    fn payload_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if Self::is_payload_file(name) {
                    files.push(path);
                }
            }
        }
        Ok(files)
    }
}

impl PayloadStore for DirectoryStore {
    fn write(&self, token: SlotToken, payload: &[u8]) -> Result<()> {
        fs::write(self.path_for(token), payload)?;
        debug!(token, bytes = payload.len(), "payload written");
        Ok(())
    }

    fn read(&self, token: SlotToken) -> Result<Vec<u8>> {
        match fs::read(self.path_for(token)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(BufferError::PayloadMissing(token)),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, token: SlotToken) -> Result<()> {
        match fs::remove_file(self.path_for(token)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Logs and reports 0 if the directory cannot be listed; see [`DirectoryStore::try_len`].
    fn len(&self) -> usize {
        match self.try_len() {
            Ok(len) => len,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "failed to list shared directory");
                0
            }
        }
    }

    fn purge(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.payload_files()? {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove payload file"),
            }
        }
        Ok(removed)
    }
}

/// In-memory payload store; same contract as [`DirectoryStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    payloads: Mutex<HashMap<SlotToken, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PayloadStore for MemoryStore {
    fn write(&self, token: SlotToken, payload: &[u8]) -> Result<()> {
        self.payloads.lock().insert(token, payload.to_vec());
        Ok(())
    }

    fn read(&self, token: SlotToken) -> Result<Vec<u8>> {
        self.payloads
            .lock()
            .get(&token)
            .cloned()
            .ok_or(BufferError::PayloadMissing(token))
    }

    fn delete(&self, token: SlotToken) -> Result<()> {
        self.payloads.lock().remove(&token);
        Ok(())
    }

    fn take(&self, token: SlotToken) -> Result<Vec<u8>> {
        self.payloads
            .lock()
            .remove(&token)
            .ok_or(BufferError::PayloadMissing(token))
    }

    fn len(&self) -> usize {
        self.payloads.lock().len()
    }

    fn purge(&self) -> Result<usize> {
        let mut payloads = self.payloads.lock();
        let removed = payloads.len();
        payloads.clear();
        Ok(removed)
    }
}
