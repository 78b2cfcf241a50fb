//! Tree-sitter based extraction for TypeScript and JavaScript sources.
//!
//! Parses source files, finds the definition of a requested symbol and
//! reports the symbols its body refers to.
mod imports;
mod ts_extractor;

pub use imports::{collect_imports, ImportTable};
pub use ts_extractor::{Match, TsExtractor};

use std::collections::HashMap;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tree_sitter::{Language, Node as TsNode, Parser, Tree};

use crate::errors::{GrabError, Result};

/// Grammar used for a source file, picked from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    TypeScript,
    Tsx,
    JavaScript,
}

impl Grammar {
    pub fn for_path(path: &Path) -> Grammar {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts" | "mts" | "cts") => Grammar::TypeScript,
            Some("tsx") => Grammar::Tsx,
            _ => Grammar::JavaScript,
        }
    }

    pub fn language(&self) -> Language {
        match self {
            Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Grammar::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

/// Returns `true` for files whose dialect allows JSX.
pub fn is_jsx_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tsx" | "jsx")
    )
}

/// Parse source code into a tree-sitter AST without rejecting syntax errors.
pub fn parse_tree(grammar: Grammar, source: &str) -> std::result::Result<Tree, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&grammar.language())
        .map_err(|e| format!("failed to load {grammar:?} grammar: {e}"))?;
    parser
        .parse(source, None)
        .ok_or_else(|| "tree-sitter parse returned None".to_string())
}

/// A source file together with its syntax tree.
pub struct ParsedFile {
    pub path: PathBuf,
    pub source: String,
    pub tree: Tree,
    /// Byte ranges of string and template literals, in document order.
    literals: Vec<Range<usize>>,
}

impl ParsedFile {
    /// Reads and parses a file, failing on unreadable files and on trees
    /// that contain syntax errors.
    pub fn open(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| GrabError::File {
            message: e.to_string(),
            path: path.display().to_string(),
        })?;
        Self::parse(path, source)
    }

    pub fn parse(path: &Path, source: String) -> Result<Self> {
        let tree = parse_tree(Grammar::for_path(path), &source).map_err(|message| {
            GrabError::Parse {
                message,
                path: path.display().to_string(),
                line: None,
            }
        })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(GrabError::Parse {
                message: "syntax error".to_string(),
                path: path.display().to_string(),
                line: first_error_line(root),
            });
        }

        let mut literals = Vec::new();
        collect_literals(root, &mut literals);
        Ok(Self {
            path: path.to_path_buf(),
            source,
            tree,
            literals,
        })
    }

    pub fn root(&self) -> TsNode<'_> {
        self.tree.root_node()
    }

    /// Gets the text of a tree-sitter node from the source.
    pub fn text(&self, node: TsNode<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Dedented source text between two byte offsets. See [`block_text`].
    pub(crate) fn block(&self, start: usize, end: usize) -> TextBlock {
        block_text(&self.source, start, end, &self.literals)
    }
}

/// Gathers the ranges of `string` and `template_string` nodes. Nested
/// literals inside template substitutions lie within the outer range.
fn collect_literals(node: TsNode<'_>, out: &mut Vec<Range<usize>>) {
    if matches!(node.kind(), "string" | "template_string") {
        out.push(node.start_byte()..node.end_byte());
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_literals(child, out);
    }
}

/// Finds the 1-based line of the first error or missing node.
fn first_error_line(node: TsNode<'_>) -> Option<u32> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row as u32 + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(line) = first_error_line(child) {
                return Some(line);
            }
        }
    }
    None
}

/// Per-run cache of parsed files keyed by absolute path.
///
/// Files are read-only during a run, so a file is parsed at most once no
/// matter how many of its symbols are visited.
#[derive(Default)]
pub struct SourceCache {
    files: HashMap<PathBuf, ParsedFile>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_parse(&mut self, path: &Path) -> Result<&ParsedFile> {
        if !self.files.contains_key(path) {
            let parsed = ParsedFile::open(path)?;
            self.files.insert(path.to_path_buf(), parsed);
        }
        Ok(&self.files[path])
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Returns the text of a string literal node without its quotes.
pub(crate) fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.len() >= 2 {
        let first = trimmed.as_bytes()[0];
        let last = trimmed.as_bytes()[trimmed.len() - 1];
        if first == last && matches!(first, b'"' | b'\'' | b'`') {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

/// Comment text directly preceding `node`, in source order.
///
/// A comment sharing a line with the previous statement belongs to that
/// statement and ends the run.
pub(crate) fn leading_comments<'t>(node: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut comments = Vec::new();
    let mut current = node.prev_sibling();
    while let Some(sibling) = current {
        if sibling.kind() != "comment" {
            break;
        }
        if let Some(before) = sibling.prev_sibling() {
            if before.kind() != "comment"
                && before.end_position().row == sibling.start_position().row
            {
                break;
            }
        }
        comments.push(sibling);
        current = sibling.prev_sibling();
    }
    comments.reverse();
    comments
}

/// A comment on the same line right after `node`.
pub(crate) fn trailing_comment<'t>(node: TsNode<'t>) -> Option<TsNode<'t>> {
    node.next_sibling().filter(|next| {
        next.kind() == "comment" && next.start_position().row == node.end_position().row
    })
}

/// Dedented symbol text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    pub text: String,
    /// Indices of lines in `text` that begin inside a string or template
    /// literal. Their leading whitespace belongs to the literal and must never
    /// be changed when the text is re-indented.
    pub literal_lines: Vec<usize>,
}

impl TextBlock {
    /// Places `self` below `head`, shifting literal line indices accordingly.
    pub(crate) fn below(self, head: TextBlock) -> TextBlock {
        let offset = head.text.split('\n').count();
        let mut literal_lines = head.literal_lines;
        literal_lines.extend(self.literal_lines.iter().map(|i| i + offset));
        TextBlock {
            text: format!("{}\n{}", head.text, self.text),
            literal_lines,
        }
    }
}

/// Source text between two byte offsets, widened to the start of the line
/// when only whitespace precedes `start`, then dedented.
///
/// Lines that begin inside one of `literals` keep their text unchanged and do
/// not count towards the common indent.
pub(crate) fn block_text(
    source: &str,
    start: usize,
    end: usize,
    literals: &[Range<usize>],
) -> TextBlock {
    let line_start = source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let from = if source[line_start..start].trim().is_empty() {
        line_start
    } else {
        start
    };
    let text = &source[from..end];

    let mut literal_lines = Vec::new();
    let mut offset = from;
    for (i, line) in text.split('\n').enumerate() {
        if literals.iter().any(|r| r.start < offset && offset < r.end) {
            literal_lines.push(i);
        }
        offset += line.len() + 1;
    }

    TextBlock {
        text: dedent(text, &literal_lines),
        literal_lines,
    }
}

/// Removes the common leading whitespace of all non-blank lines, leaving the
/// lines listed in `verbatim` untouched.
pub(crate) fn dedent(text: &str, verbatim: &[usize]) -> String {
    let indent = text
        .lines()
        .enumerate()
        .filter(|(i, l)| !verbatim.contains(i) && !l.trim().is_empty())
        .map(|(_, l)| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    text.lines()
        .enumerate()
        .map(|(i, l)| {
            if verbatim.contains(&i) {
                l
            } else {
                l.get(indent..).unwrap_or_else(|| l.trim_start())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
