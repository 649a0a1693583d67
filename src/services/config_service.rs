use std::fs;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};

/// Default service address; the backend binds here out of the box.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Environment override for the API host, checked before the config file.
pub const API_BASE_ENV: &str = "AGENT_CONSOLE_API_BASE";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
}

pub fn get_app_data_dir() -> Result<PathBuf, String> {
    let data_dir = dirs::data_dir()
        .ok_or("Could not find data directory")?
        .join("AgentConsole");

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir).map_err(|e| e.to_string())?;
    }

    Ok(data_dir)
}

fn get_config_path() -> Result<PathBuf, String> {
    Ok(get_app_data_dir()?.join("config.json"))
}

pub fn load_config() -> Result<Config, String> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)
        .map_err(|e| format!("Failed to read config: {}", e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse config: {}", e))
}

pub fn save_config(config: &Config) -> Result<(), String> {
    let config_path = get_config_path()?;
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(&config_path, content)
        .map_err(|e| format!("Failed to write config: {}", e))?;
    Ok(())
}

pub fn set_base_url(url: &str) -> Result<(), String> {
    let mut config = load_config().unwrap_or_default();
    config.base_url = Some(url.to_string());
    save_config(&config)
}

/// API base URL: environment variable, then config file, then the default.
pub fn resolve_base_url() -> String {
    let from_env = std::env::var(API_BASE_ENV).ok();
    let from_file = load_config().ok().and_then(|config| config.base_url);
    pick_base_url(from_env, from_file)
}

fn pick_base_url(from_env: Option<String>, from_file: Option<String>) -> String {
    from_env
        .into_iter()
        .chain(from_file)
        .find(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_beats_config_file_beats_default() {
        assert_eq!(
            pick_base_url(
                Some("http://env:9000".to_string()),
                Some("http://file:9001".to_string())
            ),
            "http://env:9000"
        );
        assert_eq!(
            pick_base_url(None, Some("http://file:9001".to_string())),
            "http://file:9001"
        );
        assert_eq!(pick_base_url(None, None), DEFAULT_API_BASE);
        // Blank overrides don't shadow the fallbacks.
        assert_eq!(
            pick_base_url(Some("  ".to_string()), None),
            DEFAULT_API_BASE
        );
    }
}
