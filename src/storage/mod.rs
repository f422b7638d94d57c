mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use log::info;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use crate::config::ClientConfig;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const USER_ID_KEY: &str = "user_id";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Poisoned,
    UnsupportedType(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "Local storage IO error: {}", e),
            StorageError::Json(e) => write!(f, "Local storage JSON error: {}", e),
            StorageError::Poisoned => write!(f, "Local storage lock poisoned"),
            StorageError::UnsupportedType(t) => write!(f, "Unsupported storage type: {}", t),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Json(err)
    }
}

/// Persistent string key/value storage.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub fn create_local_store(config: &ClientConfig) -> Result<Arc<dyn LocalStore>, StorageError> {
    match config.storage_type.to_lowercase().as_str() {
        "file" => {
            info!("Local storage file: {}", config.storage_path.display());
            let store = FileStore::open(&config.storage_path)?;
            Ok(Arc::new(store))
        }
        "memory" => {
            info!("Local storage is in-memory; nothing will persist");
            Ok(Arc::new(MemoryStore::new()))
        }
        other => Err(StorageError::UnsupportedType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_rejects_unknown_type() {
        let mut config = ClientConfig::default();
        config.storage_type = "indexeddb".into();
        assert!(matches!(create_local_store(&config), Err(StorageError::UnsupportedType(_))));
    }

    #[test]
    fn factory_builds_memory_store() {
        let mut config = ClientConfig::default();
        config.storage_type = "Memory".into();
        let store = create_local_store(&config).unwrap();
        store.set(AUTH_TOKEN_KEY, "t").unwrap();
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("t"));
    }
}
