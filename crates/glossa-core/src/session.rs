use crate::completion::CompletionClient;
use crate::context::DocumentAccessor;
use crate::note::{self, NoteRecord, StorageBackend};
use crate::normalize::normalize;
use crate::prompt::build_prompt;
use crate::relocate::{locate, surroundings_match};
use crate::settings::Settings;
use crate::types::{
    CapturedSelection, CompletionEvent, LinkOutcome, MatchConfidence, PromptBundle,
    SelectionContext,
};
use crate::{CompletionError, DocumentError, NoteError, RelocateError};
use time::Date;
use tracing::{debug, info, warn};

/// One explain invocation: owns its captured selection and result.
#[derive(Debug)]
pub struct ExplainSession {
    captured: CapturedSelection,
    bundle: PromptBundle,
    raw: Option<String>,
    markup: Option<String>,
    note: Option<NoteRecord>,
}

impl ExplainSession {
    pub fn new(captured: CapturedSelection, settings: &Settings) -> Self {
        let bundle = build_prompt(&captured.context, &settings.language);
        Self {
            captured,
            bundle,
            raw: None,
            markup: None,
            note: None,
        }
    }

    pub fn context(&self) -> &SelectionContext {
        &self.captured.context
    }

    pub fn bundle(&self) -> &PromptBundle {
        &self.bundle
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn markup(&self) -> Option<&str> {
        self.markup.as_deref()
    }

    pub fn note(&self) -> Option<&NoteRecord> {
        self.note.as_ref()
    }

    /// Request the explanation and push every displayable update to
    /// `on_display`. Empty output leaves the previous display untouched.
    pub fn run(
        &mut self,
        client: &mut dyn CompletionClient,
        on_display: &mut dyn FnMut(&str),
    ) -> Result<Option<&str>, CompletionError> {
        debug!(
            client = client.name(),
            strategy = ?self.bundle.strategy,
            "requesting explanation"
        );
        let mut latest = self.markup.take();
        let raw = client.complete(&self.bundle, &mut |event| match event {
            CompletionEvent::Progress { chunk, full_text } => {
                let current = if full_text.is_empty() { chunk } else { full_text };
                if let Some(markup) = normalize(&current) {
                    on_display(&markup);
                    latest = Some(markup);
                }
            }
        });
        let raw = match raw {
            Ok(raw) => raw,
            Err(err) => {
                self.markup = latest;
                return Err(err);
            }
        };

        if let Some(markup) = normalize(&raw) {
            if latest.as_deref() != Some(markup.as_str()) {
                on_display(&markup);
            }
            latest = Some(markup);
        }
        self.raw = Some(raw);
        self.markup = latest;
        Ok(self.markup.as_deref())
    }

    /// Persist the explanation as a note. Runs at most once per session;
    /// later calls return the note already created.
    pub fn save_note(
        &mut self,
        storage: &mut dyn StorageBackend,
        directory: &str,
        created: Date,
    ) -> Result<&NoteRecord, NoteError> {
        if self.note.is_none() {
            let markup = self.markup.as_deref().ok_or(NoteError::NothingToSave)?;
            let record = note::materialize(
                storage,
                directory,
                &self.captured.context.selected_text,
                markup,
                created,
            )?;
            self.note = Some(record);
        }
        self.note.as_ref().ok_or(NoteError::NothingToSave)
    }

    /// Replace the original selection with a link to the saved note.
    ///
    /// Uses the live span when it still covers the selected text with the
    /// captured surroundings, otherwise relocates the selection in the
    /// current document body.
    pub fn link_note(
        &self,
        document: &mut dyn DocumentAccessor,
    ) -> Result<LinkOutcome, DocumentError> {
        let Some(note) = self.note.as_ref() else {
            return Ok(LinkOutcome::Unlinked);
        };
        let token = note.link_token();
        let selected = self.captured.context.selected_text.as_str();
        let text = document.text();

        if let Some(span) = self.captured.span.clone()
            && text.get(span.clone()) == Some(selected)
            && surroundings_match(&text, span.start, span.end, &self.captured.context)
        {
            document.replace_range(span.clone(), &token)?;
            info!(offset = span.start, link = %token, "linked note at live selection");
            return Ok(LinkOutcome::Linked {
                offset: span.start,
                token,
                confidence: MatchConfidence::Context,
            });
        }

        match locate(&text, &self.captured.context) {
            Ok(found) => {
                document.replace_range(found.offset..found.offset + selected.len(), &token)?;
                info!(
                    offset = found.offset,
                    confidence = ?found.confidence,
                    link = %token,
                    "linked note at relocated selection"
                );
                Ok(LinkOutcome::Linked {
                    offset: found.offset,
                    token,
                    confidence: found.confidence,
                })
            }
            Err(RelocateError::NotFound) => {
                warn!(path = %note.path, "selection not found; note created but not linked");
                Ok(LinkOutcome::Unlinked)
            }
        }
    }
}

/// Inline markup shown in place of an explanation when a request fails.
pub fn error_markup(err: &CompletionError) -> String {
    format!("<strong>Error:</strong> {err}")
}
