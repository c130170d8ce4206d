use crate::RelocateError;
use crate::types::{MatchConfidence, Relocation, SelectionContext};
use tracing::{debug, warn};

/// Re-find a captured selection inside a document that may have changed
/// since capture.
///
/// Tries, in order: an occurrence whose surrounding text matches the
/// captured context, an occurrence inside the captured paragraph, and the
/// first raw occurrence. The returned confidence says which one won.
pub fn locate(document: &str, context: &SelectionContext) -> Result<Relocation, RelocateError> {
    let selected = context.selected_text.as_str();
    if selected.is_empty() {
        return Err(RelocateError::NotFound);
    }
    let first = document.find(selected).ok_or(RelocateError::NotFound)?;

    let before = context.text_before.trim();
    let after = context.text_after.trim();
    for (offset, _) in document.match_indices(selected) {
        let end = offset + selected.len();
        if context_matches(document, offset, end, before, after) {
            debug!(offset, "relocated selection by surrounding context");
            return Ok(Relocation {
                offset,
                confidence: MatchConfidence::Context,
            });
        }
    }

    let paragraph = context.paragraph_text.as_str();
    if !paragraph.trim().is_empty()
        && let Some(paragraph_start) = document.find(paragraph)
        && let Some(within) = paragraph.find(selected)
    {
        let offset = paragraph_start + within;
        debug!(offset, "relocated selection inside recorded paragraph");
        return Ok(Relocation {
            offset,
            confidence: MatchConfidence::Paragraph,
        });
    }

    warn!(
        offset = first,
        "selection context drifted; falling back to first occurrence"
    );
    Ok(Relocation {
        offset: first,
        confidence: MatchConfidence::FirstOccurrence,
    })
}

/// Whether the text around `start..end` still reads like the captured context.
pub(crate) fn surroundings_match(
    document: &str,
    start: usize,
    end: usize,
    context: &SelectionContext,
) -> bool {
    context_matches(
        document,
        start,
        end,
        context.text_before.trim(),
        context.text_after.trim(),
    )
}

fn context_matches(document: &str, start: usize, end: usize, before: &str, after: &str) -> bool {
    let before_ok = before.is_empty() || document[..start].trim_end().ends_with(before);
    let after_ok = after.is_empty() || document[end..].trim_start().starts_with(after);
    before_ok && after_ok
}
