//! Configuration Vault – reads/writes `~/.anima/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted user configuration stored in `~/.anima/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Ollama instance.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Chat model used for generation (e.g. "llama3").
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Embedding model used for memory (e.g. "nomic-embed-text").
    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    /// Output dimension of the embedding model.
    #[serde(default = "default_embed_dim")]
    pub embed_dim: usize,

    /// Root directory for persisted engine state.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Minimum importance for long-term storage.
    #[serde(default = "default_min_importance")]
    pub min_importance: f32,

    /// Memories retrieved per interaction.
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,

    /// Turns held in the short-term window.
    #[serde(default = "default_short_term_capacity")]
    pub short_term_capacity: usize,

    /// Generation timeout in seconds.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_chat_model() -> String {
    "llama3".to_string()
}
fn default_embed_model() -> String {
    "nomic-embed-text".to_string()
}
fn default_embed_dim() -> usize {
    768
}
fn default_data_dir() -> PathBuf {
    PathBuf::from(home_dir()).join(".anima").join("data")
}
fn default_min_importance() -> f32 {
    0.3
}
fn default_retrieval_k() -> usize {
    5
}
fn default_short_term_capacity() -> usize {
    20
}
fn default_generation_timeout_secs() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            chat_model: default_chat_model(),
            embed_model: default_embed_model(),
            embed_dim: default_embed_dim(),
            data_dir: default_data_dir(),
            min_importance: default_min_importance(),
            retrieval_k: default_retrieval_k(),
            short_term_capacity: default_short_term_capacity(),
            generation_timeout_secs: default_generation_timeout_secs(),
        }
    }
}

fn home_dir() -> String {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string())
}

/// Return the path to `~/.anima/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(&home_dir())
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".anima").join("config.toml")
}

/// Load the config from disk. Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `ANIMA_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `ANIMA_OLLAMA_URL` | `ollama_url` |
/// | `ANIMA_MODEL` | `chat_model` |
/// | `ANIMA_EMBED_MODEL` | `embed_model` |
/// | `ANIMA_DATA_DIR` | `data_dir` |
/// | `ANIMA_MIN_IMPORTANCE` | `min_importance` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("ANIMA_OLLAMA_URL") {
        cfg.ollama_url = v;
    }
    if let Ok(v) = std::env::var("ANIMA_MODEL") {
        cfg.chat_model = v;
    }
    if let Ok(v) = std::env::var("ANIMA_EMBED_MODEL") {
        cfg.embed_model = v;
    }
    if let Ok(v) = std::env::var("ANIMA_DATA_DIR") {
        cfg.data_dir = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("ANIMA_MIN_IMPORTANCE")
        && let Ok(min) = v.parse::<f32>()
    {
        cfg.min_importance = min.clamp(0.0, 1.0);
    }
}

/// Save the config to disk, creating `~/.anima/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Restrict the config directory to the owner only (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    // Write the file with owner-only read/write (rw-------) on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config::default();
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.ollama_url, "http://localhost:11434");
        assert_eq!(loaded.chat_model, "llama3");
        assert_eq!(loaded.embed_model, "nomic-embed-text");
        assert_eq!(loaded.embed_dim, 768);
        assert!((loaded.min_importance - 0.3).abs() < 1e-6);
    }

    #[test]
    fn config_path_points_to_anima_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".anima"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        let result = load_from(&path).expect("no error");
        assert!(result.is_none());
    }

    #[test]
    fn partial_file_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "chat_model = \"mistral\"").unwrap();

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.chat_model, "mistral");
        assert_eq!(loaded.embed_dim, 768);
    }

    #[test]
    fn apply_env_overrides_changes_ollama_url() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("ANIMA_OLLAMA_URL", "http://other-host:11434") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.ollama_url, "http://other-host:11434");
        unsafe { std::env::remove_var("ANIMA_OLLAMA_URL") };
    }

    #[test]
    fn apply_env_overrides_changes_model() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("ANIMA_MODEL", "qwen") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.chat_model, "qwen");
        unsafe { std::env::remove_var("ANIMA_MODEL") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_min_importance() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("ANIMA_MIN_IMPORTANCE", "not-a-number") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert!((cfg.min_importance - 0.3).abs() < 1e-6);
        unsafe { std::env::remove_var("ANIMA_MIN_IMPORTANCE") };
    }

    #[test]
    fn apply_env_overrides_clamps_min_importance() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("ANIMA_MIN_IMPORTANCE", "3.5") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.min_importance, 1.0);
        unsafe { std::env::remove_var("ANIMA_MIN_IMPORTANCE") };
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config::default();
        save_to(&cfg, &path).expect("save");

        let file_meta = std::fs::metadata(&path).expect("file metadata");
        assert_eq!(file_meta.permissions().mode() & 0o777, 0o600);

        let dir_meta = std::fs::metadata(path.parent().unwrap()).expect("dir metadata");
        assert_eq!(dir_meta.permissions().mode() & 0o777, 0o700);
    }
}
