use thiserror::Error;

/// Errors from completion providers.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Please set up your API key in the settings.")]
    Auth,

    #[error("API request failed: {status} {status_text}. {body}")]
    Request {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("No response received from the model")]
    EmptyResponse,

    #[error("network error: {0}")]
    Network(String),
}

/// Errors from relocating a captured selection inside a document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelocateError {
    #[error("selected text not found in document")]
    NotFound,
}

/// Errors from document accessors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("range {start}..{end} is outside the document (len {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },

}

/// Errors from note creation.
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("note io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("note date formatting failed: {0}")]
    Date(#[from] time::error::Format),

    #[error("invalid note directory: {0}")]
    InvalidDirectory(String),

    #[error("no explanation to save yet")]
    NothingToSave,
}

/// Errors from settings validation and persistence.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings validation error: {0}")]
    Validation(String),

    #[error("settings store error: {0}")]
    Store(String),
}
