//! Lưu trạng thái phiên giữa các lần chạy
//!
//! Tương đương một kho key/value đồng bộ. `FileStore` ghi toàn bộ map ra file
//! JSON sau mỗi thay đổi.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::error::{Result, WalletError};

pub const ETH_CONNECTED: &str = "ethConnected";
pub const ETH_ADDRESS: &str = "ethAddress";
pub const POLKADOT_CONNECTED: &str = "polkadotConnected";
pub const POLKADOT_ADDRESS: &str = "polkadotAddress";

/// Kho key/value cho cờ kết nối
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;

    /// Cờ `"true"` đã lưu
    fn flag(&self, key: &str) -> bool {
        self.get(key).as_deref() == Some("true")
    }
}

/// Kho trong bộ nhớ
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| WalletError::Storage("memory store lock poisoned".to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| WalletError::Storage("memory store lock poisoned".to_string()))?
            .remove(key);
        Ok(())
    }
}

/// Kho lưu ra file JSON
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStore {
    /// Mở kho; file hỏng hoặc chưa có thì bắt đầu rỗng
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("File phiên {:?} không hợp lệ, bỏ qua: {}", path, e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        debug!("Mở kho phiên {:?} với {} mục", path, entries.len());
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| WalletError::Storage(e.to_string()))?;
            }
        }
        let content = serde_json::to_string_pretty(entries).map_err(|e| WalletError::Storage(e.to_string()))?;
        fs::write(&self.path, content).map_err(|e| WalletError::Storage(format!("{:?}: {}", self.path, e)))
    }

    fn update<F: FnOnce(&mut HashMap<String, String>)>(&self, apply: F) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| WalletError::Storage("file store lock poisoned".to_string()))?;
        apply(&mut entries);
        self.persist(&entries)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
