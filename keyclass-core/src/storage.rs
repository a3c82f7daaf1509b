use crate::error::{KeyclassError, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Separate id spaces inside one storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Uploaded dictionary files
    DictionaryFiles,
    /// Uploaded document files and raw text
    DocumentFiles,
    DictionaryRecords,
    DocumentRecords,
    ClassificationRecords,
    /// Pair key -> classification id
    ClassificationIndex,
}

impl Namespace {
    pub const ALL: [Namespace; 6] = [
        Namespace::DictionaryFiles,
        Namespace::DocumentFiles,
        Namespace::DictionaryRecords,
        Namespace::DocumentRecords,
        Namespace::ClassificationRecords,
        Namespace::ClassificationIndex,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Namespace::DictionaryFiles => "dictionaries",
            Namespace::DocumentFiles => "documents",
            Namespace::DictionaryRecords => "records/dictionaries",
            Namespace::DocumentRecords => "records/documents",
            Namespace::ClassificationRecords => "records/classifications",
            Namespace::ClassificationIndex => "index/classifications",
        }
    }
}

/// Blob storage keyed by generated id
pub trait BlobStorage: Send + Sync {
    fn put(&self, namespace: Namespace, id: &str, data: &[u8]) -> Result<()>;
    fn get(&self, namespace: Namespace, id: &str) -> Result<Option<Vec<u8>>>;
    /// Returns whether something was deleted
    fn delete(&self, namespace: Namespace, id: &str) -> Result<bool>;
    /// Ids currently stored in `namespace`, sorted
    fn list(&self, namespace: Namespace) -> Result<Vec<String>>;
}

/// Ids end up as file names, so only a conservative alphabet is allowed.
fn validate_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(KeyclassError::InvalidInput(format!("invalid storage id '{id}'")))
    }
}

/// File-based storage implementation using a local directory tree
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for namespace in Namespace::ALL {
            fs::create_dir_all(root.join(namespace.dir_name()))?;
        }
        Ok(Self { root })
    }

    fn blob_path(&self, namespace: Namespace, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self.root.join(namespace.dir_name()).join(id))
    }
}

impl BlobStorage for FileStorage {
    fn put(&self, namespace: Namespace, id: &str, data: &[u8]) -> Result<()> {
        let path = self.blob_path(namespace, id)?;
        fs::write(path, data)?;
        Ok(())
    }

    fn get(&self, namespace: Namespace, id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.blob_path(namespace, id)?;
        if path.exists() {
            Ok(Some(fs::read(path)?))
        } else {
            Ok(None)
        }
    }

    fn delete(&self, namespace: Namespace, id: &str) -> Result<bool> {
        let path = self.blob_path(namespace, id)?;
        if path.exists() {
            fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn list(&self, namespace: Namespace) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.root.join(namespace.dir_name()))? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// In-memory storage, used by tests and one-shot runs
#[derive(Default)]
pub struct MemoryStorage {
    blobs: RwLock<HashMap<(Namespace, String), Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStorage for MemoryStorage {
    fn put(&self, namespace: Namespace, id: &str, data: &[u8]) -> Result<()> {
        validate_id(id)?;
        let mut blobs = self.blobs.write().unwrap_or_else(|p| p.into_inner());
        blobs.insert((namespace, id.to_string()), data.to_vec());
        Ok(())
    }

    fn get(&self, namespace: Namespace, id: &str) -> Result<Option<Vec<u8>>> {
        validate_id(id)?;
        let blobs = self.blobs.read().unwrap_or_else(|p| p.into_inner());
        Ok(blobs.get(&(namespace, id.to_string())).cloned())
    }

    fn delete(&self, namespace: Namespace, id: &str) -> Result<bool> {
        validate_id(id)?;
        let mut blobs = self.blobs.write().unwrap_or_else(|p| p.into_inner());
        Ok(blobs.remove(&(namespace, id.to_string())).is_some())
    }

    fn list(&self, namespace: Namespace) -> Result<Vec<String>> {
        let blobs = self.blobs.read().unwrap_or_else(|p| p.into_inner());
        let mut ids: Vec<String> = blobs
            .keys()
            .filter(|(ns, _)| *ns == namespace)
            .map(|(_, id)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// SHA-256 of uploaded content, hex encoded
pub fn calculate_content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
