use crate::NoteError;
use crate::normalize::{strip_markup, strip_tags};
use std::fs;
use std::path::{Component, Path, PathBuf};
use time::Date;
use time::format_description::well_known::Iso8601;
use tracing::info;

const MAX_FILENAME_CHARS: usize = 100;
const FALLBACK_FILENAME: &str = "Untitled explanation";
const NOTE_EXTENSION: &str = "md";
const INVALID_FILENAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// A persisted explanation note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub path: String,
    pub content: String,
}

impl NoteRecord {
    /// File name without directory or extension.
    pub fn stem(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        name.strip_suffix(".md").unwrap_or(name)
    }

    pub fn link_token(&self) -> String {
        format!("[[{}]]", self.stem())
    }
}

/// Storage capability for notes. Paths are vault-relative and `/`-separated.
pub trait StorageBackend {
    fn exists(&self, path: &str) -> Result<bool, NoteError>;
    fn create_dir(&mut self, path: &str) -> Result<(), NoteError>;
    /// Create a new file; must fail rather than overwrite.
    fn create_file(&mut self, path: &str, content: &str) -> Result<(), NoteError>;
}

/// Filesystem storage rooted at a vault directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, NoteError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(NoteError::InvalidDirectory(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl StorageBackend for FsStorage {
    fn exists(&self, path: &str) -> Result<bool, NoteError> {
        Ok(self.resolve(path)?.exists())
    }

    fn create_dir(&mut self, path: &str) -> Result<(), NoteError> {
        fs::create_dir_all(self.resolve(path)?)?;
        Ok(())
    }

    fn create_file(&mut self, path: &str, content: &str) -> Result<(), NoteError> {
        use std::io::Write;

        let target = self.resolve(path)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)?;
        let written = file
            .write_all(content.as_bytes())
            .and_then(|()| file.sync_all());
        if let Err(err) = written {
            drop(file);
            let _ = fs::remove_file(&target);
            return Err(NoteError::Io(err));
        }
        Ok(())
    }
}

/// Derive a file-system safe note name from arbitrary selected text.
pub fn sanitize_filename(text: &str) -> String {
    let without_tags = strip_tags(text);
    let mut out = String::with_capacity(without_tags.len());
    let mut prev_space = true;
    for ch in without_tags.chars() {
        if INVALID_FILENAME_CHARS.contains(&ch) || (ch.is_control() && !ch.is_whitespace()) {
            continue;
        }
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    let capped: String = out.trim().chars().take(MAX_FILENAME_CHARS).collect();
    let capped = capped.trim();
    if capped.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        capped.to_string()
    }
}

pub fn note_content(
    selected_text: &str,
    explanation_markup: &str,
    created: Date,
) -> Result<String, NoteError> {
    let quoted = selected_text
        .trim()
        .lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    let explanation = strip_markup(explanation_markup);
    let created = created.format(&Iso8601::DATE)?;
    Ok(format!(
        "# {title}

## Selected text

{quoted}

## Explanation

{explanation}

---
Created: {created}
",
        title = sanitize_filename(selected_text),
    ))
}

fn normalize_directory(directory: &str) -> Result<String, NoteError> {
    let trimmed = directory.trim().trim_matches('/');
    if trimmed.split('/').any(|part| part == "..") {
        return Err(NoteError::InvalidDirectory(directory.to_string()));
    }
    Ok(trimmed.to_string())
}

fn join_path(directory: &str, name: &str) -> String {
    if directory.is_empty() {
        name.to_string()
    } else {
        format!("{directory}/{name}")
    }
}

/// First `{dir}/{name}.md`, `{dir}/{name}-1.md`, ... that does not exist yet.
///
/// Probes one candidate at a time so two callers never settle on the same
/// suffix from a stale batch of checks.
pub fn unique_note_path(
    storage: &dyn StorageBackend,
    directory: &str,
    filename: &str,
) -> Result<String, NoteError> {
    let mut candidate = join_path(directory, &format!("{filename}.{NOTE_EXTENSION}"));
    let mut suffix = 0usize;
    while storage.exists(&candidate)? {
        suffix += 1;
        candidate = join_path(directory, &format!("{filename}-{suffix}.{NOTE_EXTENSION}"));
    }
    Ok(candidate)
}

fn ensure_directory(storage: &mut dyn StorageBackend, directory: &str) -> Result<(), NoteError> {
    if directory.is_empty() || storage.exists(directory)? {
        return Ok(());
    }
    storage.create_dir(directory)
}

/// Persist a new explanation note and return what was written.
pub fn materialize(
    storage: &mut dyn StorageBackend,
    directory: &str,
    selected_text: &str,
    explanation_markup: &str,
    created: Date,
) -> Result<NoteRecord, NoteError> {
    let directory = normalize_directory(directory)?;
    ensure_directory(storage, &directory)?;

    let filename = sanitize_filename(selected_text);
    let path = unique_note_path(storage, &directory, &filename)?;
    let content = note_content(selected_text, explanation_markup, created)?;
    storage.create_file(&path, &content)?;
    info!(path = %path, "created explanation note");
    Ok(NoteRecord { path, content })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io;
    use time::Month;

    #[derive(Default)]
    struct MemoryStorage {
        dirs: Vec<String>,
        files: BTreeMap<String, String>,
    }

    impl StorageBackend for MemoryStorage {
        fn exists(&self, path: &str) -> Result<bool, NoteError> {
            Ok(self.dirs.iter().any(|dir| dir == path) || self.files.contains_key(path))
        }

        fn create_dir(&mut self, path: &str) -> Result<(), NoteError> {
            self.dirs.push(path.to_string());
            Ok(())
        }

        fn create_file(&mut self, path: &str, content: &str) -> Result<(), NoteError> {
            if self.files.contains_key(path) {
                return Err(NoteError::Io(io::Error::from(io::ErrorKind::AlreadyExists)));
            }
            self.files.insert(path.to_string(), content.to_string());
            Ok(())
        }
    }

    fn date() -> Date {
        Date::from_calendar_date(2024, Month::March, 7).unwrap()
    }

    #[test]
    fn sanitize_strips_markup_and_invalid_chars() {
        let name = sanitize_filename("What is <b>RAII</b>???");
        assert_eq!(name, "What is RAII");
        assert!(!name.contains(['<', '>', '?', '/', '\\', ':', '*', '|', '"']));
        assert!(name.chars().count() <= MAX_FILENAME_CHARS);
    }

    #[test]
    fn sanitize_collapses_whitespace_caps_and_defaults() {
        assert_eq!(sanitize_filename("  a\t\n b\u{0007}  c  "), "a b c");
        assert_eq!(sanitize_filename(&"x".repeat(250)).chars().count(), 100);
        assert_eq!(sanitize_filename("???"), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("<i></i>"), FALLBACK_FILENAME);
    }

    #[test]
    fn repeated_notes_get_incrementing_suffixes() {
        let mut storage = MemoryStorage::default();
        storage
            .files
            .insert("Explanations/borrow.md".to_string(), String::new());

        let first = materialize(&mut storage, "Explanations", "borrow", "<p>a</p>", date()).unwrap();
        let second =
            materialize(&mut storage, "Explanations/", "borrow", "<p>b</p>", date()).unwrap();

        assert_eq!(first.path, "Explanations/borrow-1.md");
        assert_eq!(second.path, "Explanations/borrow-2.md");
        assert_eq!(storage.dirs, vec!["Explanations".to_string()]);
        assert_eq!(second.link_token(), "[[borrow-2]]");
    }

    #[test]
    fn content_embeds_selection_plain_explanation_and_date() {
        let mut storage = MemoryStorage::default();
        let note = materialize(
            &mut storage,
            "",
            "ownership",
            "<p><b>Ownership</b> means one owner.</p>",
            date(),
        )
        .unwrap();
        assert_eq!(note.path, "ownership.md");
        assert!(note.content.contains("> ownership"));
        assert!(note.content.contains("Ownership means one owner."));
        assert!(!note.content.contains("<b>"));
        assert!(note.content.contains("Created: 2024-03-07\n"));
        assert_eq!(storage.files.get("ownership.md"), Some(&note.content));
    }

    #[test]
    fn rejects_parent_directory_escape() {
        let mut storage = MemoryStorage::default();
        let result = materialize(&mut storage, "../outside", "x", "y", date());
        assert!(matches!(result, Err(NoteError::InvalidDirectory(_))));
        assert!(storage.files.is_empty());
    }

    #[test]
    fn fs_storage_creates_directory_once_and_never_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        let mut storage = FsStorage::new(temp.path());

        let first = materialize(&mut storage, "Notes/Deep", "lifetime", "<p>x</p>", date()).unwrap();
        let second = materialize(&mut storage, "Notes/Deep", "lifetime", "<p>y</p>", date()).unwrap();

        assert_eq!(first.path, "Notes/Deep/lifetime.md");
        assert_eq!(second.path, "Notes/Deep/lifetime-1.md");
        let on_disk = fs::read_to_string(temp.path().join("Notes/Deep/lifetime.md")).unwrap();
        assert_eq!(on_disk, first.content);
        assert!(storage.create_file("Notes/Deep/lifetime.md", "z").is_err());
    }
}
