use crate::types::{PromptBundle, PromptStrategy, SelectionContext};
use tracing::debug;

/// Selections with at least this many words get a structured summary.
pub const SUMMARY_MIN_WORDS: usize = 500;
/// Selections with at least this many words (and below the summary bound) get translated.
pub const TRANSLATION_MIN_WORDS: usize = 5;

/// The logographic target that needs phonetic hints and no romanization.
const LOGOGRAPHIC_LANGUAGE: &str = "Chinese";
const ASCII_FALLBACK_LANGUAGE: &str = "English";
const IGNORED_CHARS: [char; 11] = ['.', ',', '-', '_', '\'', '"', '!', '?', '(', ')', ' '];

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn classify(selected_text: &str) -> PromptStrategy {
    let words = word_count(selected_text);
    if words >= SUMMARY_MIN_WORDS {
        PromptStrategy::Summary
    } else if words >= TRANSLATION_MIN_WORDS {
        PromptStrategy::Translation
    } else {
        PromptStrategy::Explain
    }
}

pub fn system_prompt(language: &str) -> String {
    format!(
        "Respond in {language} with HTML tags to improve readability.
- Prioritize clarity and conciseness
- Use bullet points when appropriate"
    )
}

/// Language for example sentences: English when the selection is pure
/// ASCII once punctuation and whitespace are ignored.
pub fn sample_sentence_language<'a>(selected_text: &str, language: &'a str) -> &'a str {
    let mut stripped = selected_text
        .chars()
        .filter(|ch| !ch.is_whitespace() && !IGNORED_CHARS.contains(ch));
    if stripped.all(|ch| ch.is_ascii()) {
        ASCII_FALLBACK_LANGUAGE
    } else {
        language
    }
}

pub fn build_prompt(context: &SelectionContext, language: &str) -> PromptBundle {
    let strategy = classify(&context.selected_text);
    debug!(
        ?strategy,
        words = word_count(&context.selected_text),
        "selected prompt strategy"
    );
    let prompt = match strategy {
        PromptStrategy::Summary => summary_prompt(&context.selected_text, language),
        PromptStrategy::Translation => translation_prompt(&context.selected_text, language),
        PromptStrategy::Explain => explain_prompt(context, language),
    };
    PromptBundle {
        strategy,
        prompt,
        system_prompt: system_prompt(language),
    }
}

fn summary_prompt(selected_text: &str, language: &str) -> String {
    format!(
        "Create a structured summary in {language}:
- Identify key themes and concepts
- Extract 3-5 main points
- Use nested <ul> lists for hierarchy
- Keep bullets concise
- Do not translate the text itself

for the following selected text:

{selected_text}
"
    )
}

fn translation_prompt(selected_text: &str, language: &str) -> String {
    format!(
        "Translate exactly to {language} without commentary:
- Preserve technical terms and names
- Maintain original punctuation
- Match formal/informal tone of source

for the following selected text:

{selected_text}
"
    )
}

fn context_block(context: &SelectionContext) -> String {
    if context.text_before.is_empty() && context.text_after.is_empty() {
        return context.paragraph_text.clone();
    }
    let or_none = |value: &str| {
        if value.is_empty() {
            "None".to_string()
        } else {
            value.to_string()
        }
    };
    format!(
        "# Context:
## Before selected text:
{before}
## Selected text:
{selected}
## After selected text:
{after}",
        before = or_none(&context.text_before),
        selected = context.selected_text,
        after = or_none(&context.text_after),
    )
}

fn explain_prompt(context: &SelectionContext, language: &str) -> String {
    let logographic = language == LOGOGRAPHIC_LANGUAGE;
    let phonetic_hint = if logographic {
        "(with IPA if necessary)"
    } else {
        ""
    };
    let romanization_rule = if logographic {
        " DO NOT add Pinyin for it."
    } else {
        ""
    };
    let sample_language = sample_sentence_language(&context.selected_text, language);
    let selected = &context.selected_text;

    format!(
        r#"Provide an explanation for the word: "{selected}{phonetic_hint}" in {language} without commentary.{romanization_rule}

Use the context from the surrounding paragraph to inform your explanation when relevant:

{context_block}

# Consider these scenarios:

## Names
If "{selected}" is a person's name, company name, or organization name, provide a brief description (e.g., who they are or what they do).

## Technical Terms
If "{selected}" is a technical term or jargon
- give a concise definition and explain.
- Some best practice of using it
- Explain how it works.
- No need example sentence for the technical term.

## Normal Words
- For any other word, explain its meaning and provide 1-2 example sentences with the word in {sample_language}.

# Format
- Output the words first, then the explanation, and then the example sentences if necessary.
- No extra explanation
- Remember to using proper html format like <p> <b> <i> <a> <li> <ol> <ul> to improve readability.
"#,
        context_block = context_block(context),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(selected: &str, before: &str, after: &str, paragraph: &str) -> SelectionContext {
        SelectionContext {
            selected_text: selected.to_string(),
            text_before: before.to_string(),
            text_after: after.to_string(),
            paragraph_text: paragraph.to_string(),
        }
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn summary_starts_at_five_hundred_words() {
        assert_eq!(classify(&words(500)), PromptStrategy::Summary);
        assert_eq!(classify(&words(1200)), PromptStrategy::Summary);
        assert_eq!(classify(&words(499)), PromptStrategy::Translation);
    }

    #[test]
    fn translation_starts_at_five_words() {
        assert_eq!(classify(&words(5)), PromptStrategy::Translation);
        assert_eq!(classify(&words(4)), PromptStrategy::Explain);
        assert_eq!(classify("  spaced\n\tout   words here  now "), PromptStrategy::Translation);
    }

    #[test]
    fn summary_and_translation_prompts_embed_selection() {
        let long = words(600);
        let bundle = build_prompt(&context(&long, "", "", ""), "German");
        assert_eq!(bundle.strategy, PromptStrategy::Summary);
        assert!(bundle.prompt.starts_with("Create a structured summary in German:"));
        assert!(bundle.prompt.contains("Extract 3-5 main points"));
        assert!(bundle.prompt.ends_with(&format!("{long}\n")));

        let sentence = "The borrow checker enforces aliasing rules.";
        let bundle = build_prompt(&context(sentence, "", "", ""), "French");
        assert_eq!(bundle.strategy, PromptStrategy::Translation);
        assert!(bundle.prompt.starts_with("Translate exactly to French without commentary:"));
        assert!(bundle.prompt.contains(sentence));
    }

    #[test]
    fn system_prompt_is_shared_across_strategies() {
        let summary = build_prompt(&context(&words(500), "", "", ""), "Spanish");
        let translation = build_prompt(&context(&words(10), "", "", ""), "Spanish");
        let explain = build_prompt(&context("hola", "", "", ""), "Spanish");
        assert_eq!(summary.system_prompt, translation.system_prompt);
        assert_eq!(translation.system_prompt, explain.system_prompt);
        assert!(explain.system_prompt.starts_with("Respond in Spanish with HTML tags"));
    }

    #[test]
    fn ascii_word_uses_english_examples() {
        assert_eq!(sample_sentence_language("hello", "Chinese"), "English");
        assert_eq!(sample_sentence_language("don't-stop!", "German"), "English");
        let bundle = build_prompt(&context("hello", "", "", "say hello"), "Chinese");
        assert!(bundle.prompt.contains("example sentences with the word in English."));
    }

    #[test]
    fn non_ascii_word_uses_configured_language() {
        assert_eq!(sample_sentence_language("你好", "Chinese"), "Chinese");
        assert_eq!(sample_sentence_language("café", "French"), "French");
        let bundle = build_prompt(&context("你好", "", "", ""), "Japanese");
        assert!(bundle.prompt.contains("example sentences with the word in Japanese."));
    }

    #[test]
    fn phonetic_hint_only_for_chinese() {
        let chinese = build_prompt(&context("serendipity", "", "", ""), "Chinese");
        assert!(chinese.prompt.contains("\"serendipity(with IPA if necessary)\""));
        assert!(chinese.prompt.contains("DO NOT add Pinyin for it."));

        let german = build_prompt(&context("serendipity", "", "", ""), "German");
        assert!(german.prompt.contains("\"serendipity\" in German"));
        assert!(!german.prompt.contains("IPA"));
        assert!(!german.prompt.contains("Pinyin"));
    }

    #[test]
    fn explain_uses_labeled_context_when_available() {
        let bundle = build_prompt(
            &context("latch", "Acquire the", "", "Acquire the latch first."),
            "English",
        );
        assert!(bundle.prompt.contains(
            "## Before selected text:\nAcquire the\n## Selected text:\nlatch\n## After selected text:\nNone"
        ));
        assert!(!bundle.prompt.contains("Acquire the latch first."));
    }

    #[test]
    fn explain_falls_back_to_paragraph() {
        let bundle = build_prompt(
            &context("latch", "", "", "Acquire the latch first."),
            "English",
        );
        assert!(!bundle.prompt.contains("# Context:"));
        assert!(bundle.prompt.contains("\n\nAcquire the latch first.\n\n# Consider"));
        assert!(bundle.prompt.contains("## Technical Terms"));
        assert!(bundle.prompt.contains("<p> <b> <i> <a> <li> <ol> <ul>"));
    }
}
