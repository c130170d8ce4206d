use crate::types::{CapturedSelection, SelectionContext};
use crate::DocumentError;
use std::ops::Range;

/// Characters of surrounding text captured on each side of a selection.
pub const CONTEXT_WINDOW_CHARS: usize = 200;

const BLOCK_TAGS: [&str; 21] = [
    "p", "div", "li", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "td", "th",
    "section", "article", "header", "footer", "table", "tr", "ul", "ol",
];

/// A line/column position; `ch` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub ch: usize,
}

impl Position {
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }
}

/// Editable document capability supplied by the host.
pub trait DocumentAccessor {
    /// Whole-document read.
    fn text(&self) -> String;
    fn line(&self, line: usize) -> Option<String>;
    /// Byte offset of `pos`, or `None` when the line does not exist.
    fn pos_to_offset(&self, pos: Position) -> Option<usize>;
    fn replace_range(&mut self, range: Range<usize>, replacement: &str)
    -> Result<(), DocumentError>;
}

/// In-memory document backed by a `String`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextDocument {
    text: String,
}

impl TextDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl DocumentAccessor for TextDocument {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn line(&self, line: usize) -> Option<String> {
        self.text.split('\n').nth(line).map(str::to_string)
    }

    fn pos_to_offset(&self, pos: Position) -> Option<usize> {
        let mut line_start = 0;
        for (index, line) in self.text.split('\n').enumerate() {
            if index == pos.line {
                let within = line
                    .char_indices()
                    .nth(pos.ch)
                    .map(|(byte, _)| byte)
                    .unwrap_or(line.len());
                return Some(line_start + within);
            }
            line_start += line.len() + 1;
        }
        None
    }

    fn replace_range(
        &mut self,
        range: Range<usize>,
        replacement: &str,
    ) -> Result<(), DocumentError> {
        let len = self.text.len();
        if range.start > range.end
            || range.end > len
            || !self.text.is_char_boundary(range.start)
            || !self.text.is_char_boundary(range.end)
        {
            return Err(DocumentError::OutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        self.text.replace_range(range, replacement);
        Ok(())
    }
}

/// Selection made through a live editor cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorSelection {
    pub from: Position,
    pub to: Position,
}

/// Selection made on a read-only rendered surface.
///
/// `offset` is the character offset of the selection start inside the
/// `anchor` node's text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSelection {
    pub anchor: NodeId,
    pub offset: usize,
    pub text: String,
}

/// The two ways a host can hand over a selection.
pub enum Selection<'a> {
    Cursor(&'a dyn DocumentAccessor, CursorSelection),
    Range(&'a RenderedTree, RangeSelection),
}

/// Capture the selection and its surrounding context.
///
/// Returns `None` when nothing meaningful is selected.
pub fn extract(selection: Selection<'_>) -> Option<CapturedSelection> {
    match selection {
        Selection::Cursor(document, cursor) => capture_cursor(document, cursor),
        Selection::Range(tree, range) => capture_range(tree, &range),
    }
}

fn capture_cursor(
    document: &dyn DocumentAccessor,
    cursor: CursorSelection,
) -> Option<CapturedSelection> {
    let (from, to) = if cursor.from <= cursor.to {
        (cursor.from, cursor.to)
    } else {
        (cursor.to, cursor.from)
    };
    let text = document.text();
    let start = document.pos_to_offset(from)?;
    let end = document.pos_to_offset(to)?;
    let paragraph = document.line(from.line).unwrap_or_default();
    let context = SelectionContext::from_span(&text, start..end, paragraph)?;
    Some(CapturedSelection {
        context,
        span: Some(start..end),
    })
}

fn capture_range(tree: &RenderedTree, range: &RangeSelection) -> Option<CapturedSelection> {
    let text = tree.text_content(tree.root());
    let anchor_start = tree.char_offset_of(range.anchor)?;
    let start_char = anchor_start + range.offset;
    let start = char_to_byte(&text, start_char);
    let selected_len = range.text.chars().count();
    let end = char_to_byte(&text, start_char + selected_len);

    let block = tree.nearest_block(range.anchor);
    let paragraph = tree.text_content(block);

    let mut context = SelectionContext::from_span(&text, start..end, paragraph)?;
    // The rendered string is authoritative over what the offsets cover.
    context.selected_text = range.text.clone();
    if context.selected_text.trim().is_empty() {
        return None;
    }
    Some(CapturedSelection {
        context,
        span: None,
    })
}

impl SelectionContext {
    /// Build a context from a byte span of `document`.
    pub fn from_span(
        document: &str,
        span: Range<usize>,
        paragraph_text: String,
    ) -> Option<Self> {
        if span.start > span.end
            || span.end > document.len()
            || !document.is_char_boundary(span.start)
            || !document.is_char_boundary(span.end)
        {
            return None;
        }
        let selected_text = &document[span.clone()];
        if selected_text.trim().is_empty() {
            return None;
        }
        let text_before = tail_chars(&document[..span.start], CONTEXT_WINDOW_CHARS).trim();
        let text_after = head_chars(&document[span.end..], CONTEXT_WINDOW_CHARS).trim();
        Some(Self {
            selected_text: selected_text.to_string(),
            text_before: text_before.to_string(),
            text_after: text_after.to_string(),
            paragraph_text,
        })
    }
}

/// Last `n` characters of `text`.
pub(crate) fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((byte, _)) => &text[byte..],
        None => text,
    }
}

/// First `n` characters of `text`.
pub(crate) fn head_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

fn char_to_byte(text: &str, n: usize) -> usize {
    text.char_indices()
        .nth(n)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Handle to a node inside a [`RenderedTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element(String),
    Text(String),
}

#[derive(Debug, Clone)]
struct RenderedNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Minimal DOM-like tree of a rendered, read-only document.
#[derive(Debug, Clone)]
pub struct RenderedTree {
    nodes: Vec<RenderedNode>,
}

impl RenderedTree {
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![RenderedNode {
                kind: NodeKind::Element(root_tag.to_ascii_lowercase()),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.push(parent, NodeKind::Element(tag.to_ascii_lowercase()))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, NodeKind::Text(text.to_string()))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn is_block(&self, id: NodeId) -> bool {
        match self.nodes.get(id.0).map(|node| &node.kind) {
            Some(NodeKind::Element(tag)) => BLOCK_TAGS.contains(&tag.as_str()),
            _ => false,
        }
    }

    /// Walk up from `id` to the closest block-level element, or the root.
    pub fn nearest_block(&self, id: NodeId) -> NodeId {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_block(node) {
                return node;
            }
            current = self.parent(node);
        }
        self.root()
    }

    /// Text of `id` and its descendants, with block elements on their own
    /// lines.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = RenderedText::default();
        self.render(id, &mut out, &mut |_: NodeId, _: usize| {});
        let len = out.text.trim_end_matches('\n').len();
        out.text.truncate(len);
        out.text
    }

    /// Character offset where `id` starts inside the root's text content.
    pub fn char_offset_of(&self, id: NodeId) -> Option<usize> {
        let mut offset = None;
        let mut out = RenderedText::default();
        self.render(self.root(), &mut out, &mut |current: NodeId, chars: usize| {
            if current == id && offset.is_none() {
                offset = Some(chars);
            }
        });
        offset
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(RenderedNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.push(id);
        }
        id
    }

    /// Pre-order rendering; `visit` sees each node with the character count
    /// emitted before it.
    fn render(&self, id: NodeId, out: &mut RenderedText, visit: &mut dyn FnMut(NodeId, usize)) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        let block = self.is_block(id);
        if block {
            out.break_line();
        }
        visit(id, out.chars);
        if let NodeKind::Text(text) = &node.kind {
            out.push(text);
        }
        for &child in &node.children {
            self.render(child, out, visit);
        }
        if block {
            out.break_line();
        }
    }
}

#[derive(Debug, Default)]
struct RenderedText {
    text: String,
    chars: usize,
}

impl RenderedText {
    fn push(&mut self, text: &str) {
        self.text.push_str(text);
        self.chars += text.chars().count();
    }

    fn break_line(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.push("\n");
        }
    }
}
