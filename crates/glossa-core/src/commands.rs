use crate::context::{Selection, extract};
use crate::session::ExplainSession;
use crate::settings::{Modifier, Settings};

pub const EXPLAIN_COMMAND_ID: &str = "explain-selected-text";
pub const EXPLAIN_HOTKEY_COMMAND_ID: &str = "explain-text-hotkey";

pub const NO_SELECTION_NOTICE: &str = "No text selected";
pub const MISSING_API_KEY_NOTICE: &str = "Please configure your API key in settings";

/// User-facing notices, supplied by the host.
pub trait NotificationSink {
    fn notify(&mut self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    pub modifiers: Vec<Modifier>,
    pub key: char,
}

/// A command the host should register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub hotkey: Option<Hotkey>,
}

/// Commands to register; call again after hotkey settings change.
pub fn command_specs(settings: &Settings) -> Vec<CommandSpec> {
    vec![
        CommandSpec {
            id: EXPLAIN_COMMAND_ID,
            name: "Explain selected text",
            hotkey: None,
        },
        CommandSpec {
            id: EXPLAIN_HOTKEY_COMMAND_ID,
            name: "Explain text (hotkey)",
            hotkey: Some(Hotkey {
                modifiers: settings.hotkey_modifiers.clone(),
                key: settings.hotkey_key,
            }),
        },
    ]
}

/// Entry point behind both explain commands.
///
/// Returns `None`, after telling the user why, when there is no usable
/// selection or no API key.
pub fn explain_selected_text(
    selection: Option<Selection<'_>>,
    settings: &Settings,
    notifications: &mut dyn NotificationSink,
) -> Option<ExplainSession> {
    let Some(captured) = selection.and_then(extract) else {
        notifications.notify(NO_SELECTION_NOTICE);
        return None;
    };
    if !settings.has_api_key() {
        notifications.notify(MISSING_API_KEY_NOTICE);
        return None;
    }
    Some(ExplainSession::new(captured, settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CursorSelection, Position, TextDocument};

    #[derive(Default)]
    struct Notices(Vec<String>);

    impl NotificationSink for Notices {
        fn notify(&mut self, message: &str) {
            self.0.push(message.to_string());
        }
    }

    fn keyed() -> Settings {
        Settings {
            api_key: "sk-test".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn no_selection_is_reported_and_noops() {
        let doc = TextDocument::new("text");
        let caret = CursorSelection {
            from: Position::new(0, 1),
            to: Position::new(0, 1),
        };
        let mut notices = Notices::default();
        assert!(explain_selected_text(None, &keyed(), &mut notices).is_none());
        assert!(
            explain_selected_text(Some(Selection::Cursor(&doc, caret)), &keyed(), &mut notices)
                .is_none()
        );
        assert_eq!(notices.0, vec![NO_SELECTION_NOTICE, NO_SELECTION_NOTICE]);
    }

    #[test]
    fn missing_api_key_is_reported() {
        let doc = TextDocument::new("text");
        let selection = CursorSelection {
            from: Position::new(0, 0),
            to: Position::new(0, 4),
        };
        let mut notices = Notices::default();
        let session = explain_selected_text(
            Some(Selection::Cursor(&doc, selection)),
            &Settings::default(),
            &mut notices,
        );
        assert!(session.is_none());
        assert_eq!(notices.0, vec![MISSING_API_KEY_NOTICE]);
    }

    #[test]
    fn valid_selection_starts_session() {
        let doc = TextDocument::new("text");
        let selection = CursorSelection {
            from: Position::new(0, 0),
            to: Position::new(0, 4),
        };
        let mut notices = Notices::default();
        let session =
            explain_selected_text(Some(Selection::Cursor(&doc, selection)), &keyed(), &mut notices)
                .unwrap();
        assert_eq!(session.context().selected_text, "text");
        assert!(notices.0.is_empty());
    }

    #[test]
    fn hotkey_command_follows_settings() {
        let mut settings = Settings::default();
        settings.set_hotkey_modifiers("Ctrl,Shift").unwrap();
        settings.set_hotkey_key("E").unwrap();
        let specs = command_specs(&settings);
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].id, EXPLAIN_COMMAND_ID);
        assert!(specs[0].hotkey.is_none());
        assert_eq!(
            specs[1].hotkey,
            Some(Hotkey {
                modifiers: vec![Modifier::Ctrl, Modifier::Shift],
                key: 'e',
            })
        );
    }
}
