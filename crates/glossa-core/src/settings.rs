use crate::SettingsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LANGUAGE: &str = "Chinese";
pub const DEFAULT_HOTKEY_KEY: char = 'd';
pub const DEFAULT_NOTE_DIRECTORY: &str = "Explanations";

/// Languages offered by hosts; any free text is still accepted.
pub const KNOWN_LANGUAGES: [&str; 6] = [
    "Chinese", "English", "Spanish", "French", "German", "Japanese",
];

/// A hotkey modifier name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    Alt,
    Ctrl,
    Meta,
    Shift,
}

impl Modifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Alt => "Alt",
            Modifier::Ctrl => "Ctrl",
            Modifier::Meta => "Meta",
            Modifier::Shift => "Shift",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modifier {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "alt" => Ok(Modifier::Alt),
            "ctrl" => Ok(Modifier::Ctrl),
            "meta" | "cmd" | "win" => Ok(Modifier::Meta),
            "shift" => Ok(Modifier::Shift),
            other => Err(SettingsError::Validation(format!(
                "unknown hotkey modifier {other}"
            ))),
        }
    }
}

/// Persisted configuration threaded through prompt building and completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub hotkey_modifiers: Vec<Modifier>,
    pub hotkey_key: char,
    pub note_directory: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            hotkey_modifiers: vec![Modifier::Alt],
            hotkey_key: DEFAULT_HOTKEY_KEY,
            note_directory: DEFAULT_NOTE_DIRECTORY.to_string(),
        }
    }
}

impl Settings {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Accepts only single-character input, stored lowercase.
    pub fn set_hotkey_key(&mut self, value: &str) -> Result<(), SettingsError> {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if !ch.is_whitespace() && !ch.is_control() => {
                self.hotkey_key = ch.to_lowercase().next().unwrap_or(ch);
                Ok(())
            }
            _ => Err(SettingsError::Validation(format!(
                "hotkey key must be a single character (got {value:?})"
            ))),
        }
    }

    /// Parses a comma list such as `Alt,Shift`, keeping first-seen order.
    pub fn set_hotkey_modifiers(&mut self, value: &str) -> Result<(), SettingsError> {
        let mut modifiers = Vec::new();
        for part in value.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let modifier: Modifier = part.parse()?;
            if !modifiers.contains(&modifier) {
                modifiers.push(modifier);
            }
        }
        if modifiers.is_empty() {
            return Err(SettingsError::Validation(
                "hotkey modifiers must include at least one modifier".into(),
            ));
        }
        self.hotkey_modifiers = modifiers;
        Ok(())
    }

    /// Bring hand-edited values into canonical form: lowercase key and
    /// modifiers without repeats.
    pub fn normalize_hotkey(&mut self) {
        self.hotkey_key = self
            .hotkey_key
            .to_lowercase()
            .next()
            .unwrap_or(self.hotkey_key);
        let mut seen = Vec::with_capacity(self.hotkey_modifiers.len());
        self.hotkey_modifiers.retain(|modifier| {
            if seen.contains(modifier) {
                false
            } else {
                seen.push(*modifier);
                true
            }
        });
    }

    pub fn hotkey_label(&self) -> String {
        let mut parts: Vec<String> = self
            .hotkey_modifiers
            .iter()
            .map(|modifier| modifier.to_string())
            .collect();
        parts.push(self.hotkey_key.to_string());
        parts.join("+")
    }

    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        if redacted.has_api_key() {
            redacted.api_key = "<redacted>".to_string();
        }
        redacted
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.model.trim().is_empty() {
            return Err(SettingsError::Validation("model must not be empty".into()));
        }
        let base_url = self.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(SettingsError::Validation(format!(
                "base_url must be an http(s) URL (got {base_url})"
            )));
        }
        if self.language.trim().is_empty() {
            return Err(SettingsError::Validation(
                "language must not be empty".into(),
            ));
        }
        if self.hotkey_modifiers.is_empty() {
            return Err(SettingsError::Validation(
                "hotkey_modifiers must include at least one modifier".into(),
            ));
        }
        for (index, modifier) in self.hotkey_modifiers.iter().enumerate() {
            if self.hotkey_modifiers[..index].contains(modifier) {
                return Err(SettingsError::Validation(format!(
                    "hotkey_modifiers lists {modifier} twice"
                )));
            }
        }
        let key = self.hotkey_key;
        if key.is_whitespace() || key.is_control() || key.is_uppercase() {
            return Err(SettingsError::Validation(format!(
                "hotkey_key must be a single lowercase character (got {key:?})"
            )));
        }
        if self.note_directory.trim().is_empty() {
            return Err(SettingsError::Validation(
                "note_directory must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Persistence capability for settings, injected by the host.
pub trait SettingsStore {
    /// Stored settings merged over defaults.
    fn load(&self) -> Result<Settings, SettingsError>;
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.hotkey_label(), "Alt+d");
        assert!(!settings.has_api_key());
    }

    #[test]
    fn hotkey_key_is_lowercased_and_single() {
        let mut settings = Settings::default();
        settings.set_hotkey_key("E").unwrap();
        assert_eq!(settings.hotkey_key, 'e');
        assert!(settings.set_hotkey_key("ab").is_err());
        assert!(settings.set_hotkey_key("").is_err());
        assert_eq!(settings.hotkey_key, 'e');
    }

    #[test]
    fn hotkey_modifiers_parse_in_order_without_duplicates() {
        let mut settings = Settings::default();
        settings.set_hotkey_modifiers("Ctrl, shift,ctrl").unwrap();
        assert_eq!(settings.hotkey_modifiers, vec![Modifier::Ctrl, Modifier::Shift]);
        assert!(settings.set_hotkey_modifiers(" , ").is_err());
        assert!(settings.set_hotkey_modifiers("Hyper").is_err());
    }

    #[test]
    fn validate_rejects_uppercase_key_and_empty_modifiers() {
        let mut settings = Settings::default();
        settings.hotkey_key = 'D';
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.hotkey_modifiers.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn normalize_hotkey_lowercases_and_dedups() {
        let mut settings = Settings {
            hotkey_key: 'D',
            hotkey_modifiers: vec![Modifier::Shift, Modifier::Alt, Modifier::Shift],
            ..Settings::default()
        };
        settings.normalize_hotkey();
        assert_eq!(settings.hotkey_key, 'd');
        assert_eq!(settings.hotkey_modifiers, vec![Modifier::Shift, Modifier::Alt]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_settings_merge_over_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"language": "German", "api_key": "sk-1"}"#).unwrap();
        assert_eq!(settings.language, "German");
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.hotkey_modifiers, vec![Modifier::Alt]);
        assert_eq!(settings.redacted().api_key, "<redacted>");
    }
}
