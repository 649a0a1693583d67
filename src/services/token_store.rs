use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use super::config_service::get_app_data_dir;

/// Durable storage for the bearer token. The session controller takes this as
/// an injected dependency so it can run against a plain in-memory store in
/// tests.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, String>;
    fn save(&self, token: &str) -> Result<(), String>;
    fn clear(&self) -> Result<(), String>;
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct TokenFile {
    #[serde(default)]
    token: Option<String>,
}

/// Token storage in a single file under the app data directory.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new() -> Result<Self, String> {
        Ok(Self {
            path: get_app_data_dir()?.join("session.json"),
        })
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, String> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| format!("Failed to read session file: {}", e))?;
        let file: TokenFile = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse session file: {}", e))?;
        Ok(file.token)
    }

    fn save(&self, token: &str) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
        }

        let file = TokenFile {
            token: Some(token.to_string()),
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| format!("Failed to serialize session: {}", e))?;
        fs::write(&self.path, content).map_err(|e| format!("Failed to write session file: {}", e))
    }

    fn clear(&self) -> Result<(), String> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, String> {
        Ok(self.token.lock().map_err(|e| e.to_string())?.clone())
    }

    fn save(&self, token: &str) -> Result<(), String> {
        *self.token.lock().map_err(|e| e.to_string())? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), String> {
        *self.token.lock().map_err(|e| e.to_string())? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::at_path(dir.path().join("session.json"));

        assert_eq!(store.load().unwrap(), None);

        store.save("tok123").unwrap();
        assert_eq!(store.load().unwrap(), Some("tok123".to_string()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing an already-empty store is fine.
        store.clear().unwrap();
    }

    #[test]
    fn file_store_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::at_path(dir.path().join("nested").join("session.json"));

        store.save("tok456").unwrap();
        assert_eq!(store.load().unwrap(), Some("tok456".to_string()));
    }
}
