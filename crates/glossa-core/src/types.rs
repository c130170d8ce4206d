use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Text captured around a user selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionContext {
    pub selected_text: String,
    pub text_before: String,
    pub text_after: String,
    pub paragraph_text: String,
}

/// A selection context plus where it lives in an editable document.
///
/// `span` is `None` when the selection came from a read-only surface, in
/// which case the selection cannot be replaced in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedSelection {
    pub context: SelectionContext,
    pub span: Option<Range<usize>>,
}

/// How a selection is turned into an instruction for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptStrategy {
    Summary,
    Translation,
    Explain,
}

/// Prompt text and system directive for one completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptBundle {
    pub strategy: PromptStrategy,
    pub prompt: String,
    pub system_prompt: String,
}

/// Events emitted by a completion client before it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEvent {
    Progress { chunk: String, full_text: String },
}

/// How trustworthy a relocated offset is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchConfidence {
    /// Surrounding text matched on both sides.
    Context,
    /// Found inside the recorded paragraph.
    Paragraph,
    /// First raw occurrence; context drifted.
    FirstOccurrence,
}

/// A relocated selection inside a document body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub offset: usize,
    pub confidence: MatchConfidence,
}

/// Result of trying to splice a note link into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked {
        offset: usize,
        token: String,
        confidence: MatchConfidence,
    },
    Unlinked,
}
