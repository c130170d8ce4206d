use clap::Args;
use glossa_core::commands::{NO_SELECTION_NOTICE, NotificationSink, explain_selected_text};
use glossa_core::completion::ChatCompletionsClient;
use glossa_core::context::{
    CursorSelection, DocumentAccessor, Position, Selection, TextDocument, extract,
};
use glossa_core::normalize::strip_markup;
use glossa_core::note::FsStorage;
use glossa_core::prompt::build_prompt;
use glossa_core::session::error_markup;
use glossa_core::settings::Settings;
use glossa_core::types::LinkOutcome;
use glossa_core::{CompletionError, DocumentError, MatchConfidence, NoteError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("document io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid position {0:?}; expected LINE:COLUMN with a 1-based line")]
    Position(String),
    #[error("{0}")]
    Notice(String),
    #[error("{}", strip_markup(&error_markup(.0)))]
    Completion(#[from] CompletionError),
    #[error("note creation failed: {0}")]
    Note(#[from] NoteError),
    #[error("link insertion failed: {0}")]
    Document(#[from] DocumentError),
    #[error("--link requires --save-note")]
    LinkWithoutNote,
}

#[derive(Args, Debug, Clone)]
pub struct ExplainArgs {
    /// Markdown document containing the selection
    pub file: PathBuf,

    /// Selection start as LINE:COLUMN (1-based line, 0-based character column)
    #[arg(long, value_name = "line:col")]
    pub from: String,

    /// Selection end as LINE:COLUMN (exclusive)
    #[arg(long, value_name = "line:col")]
    pub to: String,

    /// Print the prompt that would be sent and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Save the explanation as a note
    #[arg(long)]
    pub save_note: bool,

    /// Replace the selection in the document with a link to the saved note
    #[arg(long)]
    pub link: bool,

    /// Vault root for notes (defaults to the document's directory)
    #[arg(long)]
    pub vault: Option<PathBuf>,

    /// Response language override for this run
    #[arg(long)]
    pub language: Option<String>,

    /// Model override for this run
    #[arg(long)]
    pub model: Option<String>,
}

/// Notices collected during a run and reported once through `CliError`.
#[derive(Default)]
struct Notices(Vec<String>);

impl NotificationSink for Notices {
    fn notify(&mut self, message: &str) {
        self.0.push(message.to_string());
    }
}

pub fn run(args: &ExplainArgs, settings: &Settings) -> Result<(), CliError> {
    if args.link && !args.save_note {
        return Err(CliError::LinkWithoutNote);
    }

    let mut settings = settings.clone();
    if let Some(language) = &args.language {
        settings.language = language.clone();
    }
    if let Some(model) = &args.model {
        settings.model = model.clone();
    }

    let mut document = TextDocument::new(fs::read_to_string(&args.file)?);
    let selection = CursorSelection {
        from: parse_position(&args.from)?,
        to: parse_position(&args.to)?,
    };

    if args.dry_run {
        let captured = extract(Selection::Cursor(&document, selection))
            .ok_or_else(|| CliError::Notice(NO_SELECTION_NOTICE.into()))?;
        let bundle = build_prompt(&captured.context, &settings.language);
        println!("strategy: {:?}\n", bundle.strategy);
        println!("--- system ---\n{}\n", bundle.system_prompt);
        println!("--- prompt ---\n{}", bundle.prompt);
        return Ok(());
    }

    let mut notices = Notices::default();
    let mut session = explain_selected_text(
        Some(Selection::Cursor(&document, selection)),
        &settings,
        &mut notices,
    )
    .ok_or_else(|| CliError::Notice(notices.0.join("; ")))?;

    let mut client = ChatCompletionsClient::new(&settings);
    let markup = session.run(&mut client, &mut |markup| {
        debug!(bytes = markup.len(), "explanation updated");
    })?;
    match markup {
        Some(markup) => println!("{}", strip_markup(markup)),
        None => {
            println!("(the model returned an empty explanation)");
            return Ok(());
        }
    }

    if !args.save_note {
        return Ok(());
    }

    let vault = args.vault.clone().unwrap_or_else(|| document_dir(&args.file));
    let mut storage = FsStorage::new(&vault);
    let today = OffsetDateTime::now_utc().date();
    let note = session.save_note(&mut storage, &settings.note_directory, today)?;
    println!("\nnote created: {}", vault.join(&note.path).display());

    if !args.link {
        return Ok(());
    }

    match session.link_note(&mut document)? {
        LinkOutcome::Linked {
            offset,
            token,
            confidence,
        } => {
            write_document(&args.file, &document.text())?;
            println!("linked {token} at byte {offset}");
            if confidence == MatchConfidence::FirstOccurrence {
                eprintln!("warning: surrounding text changed; link placed at the first match");
            }
        }
        LinkOutcome::Unlinked => {
            println!("note created but not linked: selection no longer found in document");
        }
    }
    Ok(())
}

fn parse_position(value: &str) -> Result<Position, CliError> {
    let invalid = || CliError::Position(value.to_string());
    let (line, ch) = value.trim().split_once(':').ok_or_else(invalid)?;
    let line: usize = line.trim().parse().map_err(|_| invalid())?;
    let ch: usize = ch.trim().parse().map_err(|_| invalid())?;
    if line == 0 {
        return Err(invalid());
    }
    Ok(Position::new(line - 1, ch))
}

fn document_dir(file: &Path) -> PathBuf {
    file.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn write_document(path: &Path, contents: &str) -> Result<(), io::Error> {
    let parent = document_dir(path);
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other("document path has no file name"))?;
    let tmp_path = parent.join(format!(".{}.glossa-tmp", name.to_string_lossy()));
    fs::write(&tmp_path, contents)?;
    fs::rename(tmp_path, path)?;
    Ok(())
}
