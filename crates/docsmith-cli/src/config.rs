use std::path::{Path, PathBuf};
use std::time::Duration;

use docsmith_render::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

pub const ENV_RENDER_URL: &str = "DOCSMITH_RENDER_URL";
pub const ENV_MODIFY_URL: &str = "DOCSMITH_MODIFY_URL";
pub const ENV_API_KEY: &str = "DOCSMITH_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsmithConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    pub config_version: u32,
    pub render_base_url: String,
    pub modify_base_url: String,
    /// Sample data set used for by-name renders.
    pub sample_type: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Where the wizard session lives. Defaults to the user data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_path: Option<PathBuf>,
}

impl Default for DocsmithConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            render_base_url: "http://localhost:8890/velocity-engine-app".to_string(),
            modify_base_url: "http://localhost:8000".to_string(),
            sample_type: "invoice".to_string(),
            request_timeout_secs: 30,
            max_retries: 2,
            retry_base_delay_ms: 1000,
            api_key: None,
            session_path: None,
        }
    }
}

impl DocsmithConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_base_delay_ms))
    }

    pub fn session_path(&self) -> eyre::Result<PathBuf> {
        match &self.session_path {
            Some(path) => Ok(path.clone()),
            None => {
                let base = dirs::data_dir().ok_or_else(|| eyre::eyre!("no data directory found"))?;
                Ok(base.join("docsmith").join("session.json"))
            }
        }
    }

    /// Apply `DOCSMITH_*` overrides. `lookup` is `std::env::var` in the
    /// binary; tests pass a map.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_RENDER_URL) {
            self.render_base_url = url;
        }
        if let Some(url) = non_empty(ENV_MODIFY_URL) {
            self.modify_base_url = url;
        }
        if let Some(key) = non_empty(ENV_API_KEY) {
            self.api_key = Some(key);
        }
    }
}

/// Redacted config info safe to print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigInfo {
    pub config_version: u32,
    pub render_base_url: String,
    pub modify_base_url: String,
    pub sample_type: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub api_key_hint: Option<String>,
    pub session_path: Option<String>,
}

pub fn config_info(config: &DocsmithConfig) -> ConfigInfo {
    ConfigInfo {
        config_version: config.config_version,
        render_base_url: config.render_base_url.clone(),
        modify_base_url: config.modify_base_url.clone(),
        sample_type: config.sample_type.clone(),
        request_timeout_secs: config.request_timeout_secs,
        max_retries: config.max_retries,
        retry_base_delay_ms: config.retry_base_delay_ms,
        api_key_hint: config.api_key.as_deref().map(redact_api_key),
        session_path: config
            .session_path()
            .ok()
            .map(|p| p.display().to_string()),
    }
}

pub fn redact_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}

fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("docsmith"))
}

pub fn config_path() -> eyre::Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Load from the default location and apply environment overrides.
pub fn load_config() -> eyre::Result<DocsmithConfig> {
    let mut config = load_config_from(&config_path()?)?;
    config.apply_env(|name| std::env::var(name).ok());
    Ok(config)
}

/// Load `path`, or defaults if it does not exist.
pub fn load_config_from(path: &Path) -> eyre::Result<DocsmithConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(DocsmithConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
        .unwrap_or(0);

    let migrated = migrate(json, on_disk_version)?;
    let config: DocsmithConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
pub fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update docsmith."
        ));
    }

    // v0 → v1: backend_url became render_base_url; retry settings added.
    if from_version < 1 {
        let defaults = DocsmithConfig::default();
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        if let Some(url) = obj.remove("backend_url") {
            obj.entry("render_base_url").or_insert(url);
        }
        obj.entry("max_retries")
            .or_insert(serde_json::Value::from(defaults.max_retries));
        obj.entry("retry_base_delay_ms")
            .or_insert(serde_json::Value::from(defaults.retry_base_delay_ms));
        obj.insert("config_version".to_string(), serde_json::Value::from(1));
        tracing::info!("migrated config v0 → v1 (renamed backend_url, added retry settings)");
    }

    Ok(json)
}

pub fn save_config(config: &DocsmithConfig) -> eyre::Result<PathBuf> {
    let path = config_path()?;
    save_config_to(&path, config)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, config: &DocsmithConfig) -> eyre::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;
    let json = serde_json::to_string_pretty(&stamped)?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}
