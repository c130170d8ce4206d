use glossa_core::SettingsError;
use glossa_core::settings::{Settings, SettingsStore};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("home directory not found; set HOME or GLOSSA_HOME")]
    HomeMissing,
    #[error("config io error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

impl From<SettingsError> for ConfigError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Validation(message) | SettingsError::Store(message) => {
                ConfigError::Validation(message)
            }
        }
    }
}

impl From<ConfigError> for SettingsError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation(message) => SettingsError::Validation(message),
            other => SettingsError::Store(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
}

impl ConfigPaths {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(dir) = std::env::var("GLOSSA_HOME")
            && !dir.trim().is_empty()
        {
            return Ok(Self::from_base(PathBuf::from(dir)));
        }
        let home = std::env::var("HOME").map_err(|_| ConfigError::HomeMissing)?;
        Ok(Self::from_base(PathBuf::from(home).join(".glossa")))
    }

    pub fn from_base(base_dir: PathBuf) -> Self {
        let config_path = base_dir.join("config.toml");
        Self {
            base_dir,
            config_path,
        }
    }
}

/// Settings persisted as TOML, merged over defaults on load.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    paths: ConfigPaths,
}

impl FileSettingsStore {
    pub fn new(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn load_or_create(&self) -> Result<Settings, ConfigError> {
        fs::create_dir_all(&self.paths.base_dir)?;
        if self.paths.config_path.exists() {
            return self.read();
        }

        let settings = Settings::default();
        self.write(&settings)?;
        Ok(settings)
    }

    fn read(&self) -> Result<Settings, ConfigError> {
        let content = fs::read_to_string(&self.paths.config_path)?;
        let mut settings: Settings = toml::from_str(&content)?;
        warn_if_loose_permissions(&self.paths.config_path)?;
        settings.normalize_hotkey();
        settings.validate().map_err(|err| {
            ConfigError::Validation(format!("{}: {err}", self.paths.config_path.display()))
        })?;
        Ok(settings)
    }

    pub fn write(&self, settings: &Settings) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.paths.base_dir)?;
        let content = toml::to_string_pretty(settings)?;
        write_atomic(&self.paths.config_path, content.as_bytes())?;
        Ok(())
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        Ok(self.load_or_create()?)
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        settings.validate()?;
        Ok(self.write(settings)?)
    }
}

/// Write a sibling temp file, restrict it to the owner, then rename it over `path`.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ConfigError> {
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)?;
    #[cfg(unix)]
    fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn warn_if_loose_permissions(path: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        let mode = fs::metadata(path)?.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                mode = %format!("{mode:o}"),
                "settings file with the API key is readable by others; run `chmod 600` on it or re-save with `glossa config --set`"
            );
        }
    }
    Ok(())
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Environment values win over the settings file.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(value) = env_override("GLOSSA_API_KEY") {
        settings.api_key = value;
    }
    if settings.api_key.trim().is_empty()
        && let Some(value) = env_override("OPENAI_API_KEY")
    {
        settings.api_key = value;
    }
    if let Some(value) = env_override("GLOSSA_BASE_URL") {
        settings.base_url = value;
    }
    if let Some(value) = env_override("GLOSSA_MODEL") {
        settings.model = value;
    }
    if let Some(value) = env_override("GLOSSA_LANGUAGE") {
        settings.language = value;
    }
}
