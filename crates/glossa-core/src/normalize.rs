use once_cell::sync::Lazy;
use regex::Regex;

const FENCE: &str = "```";

static RE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static RE_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<li(\s[^>]*)?>").expect("valid regex"));
static RE_BLOCK_CLOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</(p|div|h[1-6]|ul|ol|blockquote|pre)\s*>").expect("valid regex")
});
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]+>").expect("valid regex"));

/// Turn raw model output into display markup.
///
/// Returns `None` when there is nothing to show, in which case the caller
/// keeps whatever it displayed before.
pub fn normalize(raw: &str) -> Option<String> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let text = strip_fence(text);
    let text = text.trim();
    if text.is_empty() {
        None
    } else if text.starts_with('<') {
        Some(text.to_string())
    } else {
        Some(wrap_plain(text))
    }
}

fn strip_fence(text: &str) -> String {
    if !text.starts_with(FENCE) {
        return text.to_string();
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let closed = text.ends_with(FENCE) && lines.len() > 1;
    let end = if closed { lines.len() - 1 } else { lines.len() };
    lines[1..end].join("\n")
}

fn wrap_plain(text: &str) -> String {
    format!("<p>{}</p>", text.replace('\n', "<br>"))
}

/// Plain-text rendition of markup: tags removed, line-level tags turned into
/// line breaks, common entities decoded.
pub fn strip_markup(markup: &str) -> String {
    let text = RE_BREAK.replace_all(markup, "\n");
    let text = RE_ITEM.replace_all(&text, "\n- ");
    let text = RE_BLOCK_CLOSE.replace_all(&text, "\n\n");
    collapse_blank_lines(&decode_entities(&strip_tags(&text)))
}

/// Remove every tag, keeping the text between them.
pub fn strip_tags(text: &str) -> String {
    RE_TAG.replace_all(text, "").into_owned()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn collapse_blank_lines(text: &str) -> String {
    let mut lines = Vec::new();
    let mut blank_run = 0;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
            lines.push("");
        } else {
            blank_run = 0;
            lines.push(line);
        }
    }
    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_markup_is_unwrapped() {
        assert_eq!(
            normalize("```\n<p>hi</p>\n```").as_deref(),
            Some("<p>hi</p>")
        );
        assert_eq!(
            normalize("```html\n<ul><li>a</li></ul>\n```").as_deref(),
            Some("<ul><li>a</li></ul>")
        );
    }

    #[test]
    fn unterminated_fence_drops_only_opening_line() {
        assert_eq!(
            normalize("```html\n<p>partial</p>\n<p>more").as_deref(),
            Some("<p>partial</p>\n<p>more")
        );
    }

    #[test]
    fn plain_text_is_wrapped_with_breaks() {
        assert_eq!(
            normalize("plain\ntext").as_deref(),
            Some("<p>plain<br>text</p>")
        );
        assert_eq!(
            normalize("```\nfenced plain\n```").as_deref(),
            Some("<p>fenced plain</p>")
        );
    }

    #[test]
    fn empty_output_means_no_update() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("  \n\t "), None);
        assert_eq!(normalize("```html\n```"), None);
    }

    #[test]
    fn markup_is_kept_as_is() {
        assert_eq!(
            normalize("  <b>RAII</b> ties resources to scope\n").as_deref(),
            Some("<b>RAII</b> ties resources to scope")
        );
    }

    #[test]
    fn strip_markup_produces_readable_text() {
        let plain = strip_markup(
            "<p><b>RAII</b> &amp; scope</p><ul><li>one</li><li>two</li></ul><p>a<br>b</p>",
        );
        assert_eq!(plain, "RAII & scope\n\n- one\n- two\n\na\nb");
    }

    #[test]
    fn strip_markup_keeps_stray_angle_bracket() {
        assert_eq!(strip_markup("1 < 2"), "1 < 2");
        assert_eq!(strip_markup("<b>a</b> < <i>b</i>"), "a < b");
    }

    #[test]
    fn strip_tags_handles_attributes_and_self_closing() {
        assert_eq!(
            strip_tags(r#"<a href="x">link</a><br/><img src="y" />done"#),
            "linkdone"
        );
    }
}
