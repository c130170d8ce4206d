use crate::config::{ConfigError, FileSettingsStore};
use clap::Args;
use glossa_core::settings::{KNOWN_LANGUAGES, Settings};

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Print settings with secrets redacted
    #[arg(long)]
    pub print: bool,

    /// List the languages offered for explanations
    #[arg(long)]
    pub languages: bool,

    /// Set a settings value (key=value)
    #[arg(long, value_name = "key=value")]
    pub set: Vec<String>,
}

pub fn run(args: &ConfigArgs, store: &FileSettingsStore) -> Result<(), ConfigError> {
    if args.languages {
        for language in KNOWN_LANGUAGES {
            println!("{language}");
        }
        println!("any other language name is accepted as free text");
        return Ok(());
    }

    let mut settings = store.load_or_create()?;

    if !args.set.is_empty() {
        for assignment in &args.set {
            apply_set(&mut settings, assignment)?;
        }
        settings.validate()?;
        store.write(&settings)?;
    }

    if args.print || args.set.is_empty() {
        let output = toml::to_string_pretty(&settings.redacted())?;
        println!("{output}");
    }

    Ok(())
}

fn apply_set(settings: &mut Settings, assignment: &str) -> Result<(), ConfigError> {
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| ConfigError::Validation("expected key=value for --set".into()))?;
    let value = value.trim();
    match key.trim() {
        "model" => settings.model = value.to_string(),
        "api_key" => settings.api_key = value.to_string(),
        "base_url" => settings.base_url = value.to_string(),
        "language" => settings.language = value.to_string(),
        "note_directory" => settings.note_directory = value.to_string(),
        "hotkey.modifiers" | "hotkey_modifiers" => settings.set_hotkey_modifiers(value)?,
        "hotkey.key" | "hotkey_key" => settings.set_hotkey_key(value)?,
        other => {
            return Err(ConfigError::Validation(format!(
                "unknown settings key {other}"
            )));
        }
    }
    Ok(())
}
