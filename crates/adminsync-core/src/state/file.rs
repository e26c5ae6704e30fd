// # File Address Store
//
// File-based implementation of AddressStore.
//
// ## File Format
//
// The file holds exactly the last-seen IPv4 address as a bare string, with
// no trailing newline:
//
// ```text
// 203.0.113.7
// ```
//
// ## Crash Safety
//
// - Atomic writes: new content goes to a `.tmp` sibling, then is renamed over the file
// - Corruption handling: unparseable content loads as the empty record (first-run behavior)

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::address::AddressRecord;
use crate::traits::AddressStore;

/// Default file name, relative to the working directory
pub const DEFAULT_STATE_FILE: &str = "ipaddress.txt";

/// File-based address store
///
/// # Example
///
/// ```rust,no_run
/// use adminsync_core::state::FileAddressStore;
/// use adminsync_core::traits::AddressStore;
/// use adminsync_core::AddressRecord;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileAddressStore::new("ipaddress.txt");
///
///     store.save(&AddressRecord::parse("1.2.3.4")).await?;
///     assert_eq!(store.load().await?, AddressRecord::parse("1.2.3.4"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileAddressStore {
    path: PathBuf,
}

impl FileAddressStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl AddressStore for FileAddressStore {
    async fn load(&self) -> Result<AddressRecord, Error> {
        let content = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Address file does not exist: {}", self.path.display());
                return Ok(AddressRecord::empty());
            }
            Err(e) => {
                return Err(Error::state_store(format!(
                    "Failed to read address file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let record = AddressRecord::parse(&String::from_utf8_lossy(&content));
        if !record.is_valid() {
            tracing::warn!(
                "Address file {} does not hold a valid IPv4 address, ignoring it",
                self.path.display()
            );
        }
        Ok(record)
    }

    async fn save(&self, record: &AddressRecord) -> Result<(), Error> {
        let address = record
            .address()
            .ok_or_else(|| Error::state_store("Refusing to persist an empty address"))?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(address.to_string().as_bytes())
                .await
                .map_err(|e| {
                    Error::state_store(format!(
                        "Failed to write to temp file {}: {}",
                        temp_path.display(),
                        e
                    ))
                })?;

            file.flush().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Address written to file: {}", self.path.display());
        Ok(())
    }
}
