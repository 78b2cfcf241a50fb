use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::formatter::Formatter;
use super::imports::consolidate_imports;
use crate::clipboard::Clipboard;
use crate::config::{Dialect, GrabConfig, OUTPUT_STEM};
use crate::errors::{GrabError, Result};
use crate::extraction::is_jsx_path;
use crate::types::{Entity, EntityKey, EntityKind, ResolvedSet};

/// Closes each file group in the types and functions sections.
pub const FILE_SEPARATOR: &str = "// ======================";

/// The rendered context document, before formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    /// Extension of the artifact: `ts`, `tsx`, `js` or `jsx`.
    pub extension: &'static str,
}

impl Document {
    pub fn file_name(&self) -> String {
        format!("{}.{}", OUTPUT_STEM, self.extension)
    }
}

/// Renders a resolved set into one document, sections in configured order.
///
/// Entities without contents are left out. Within each section entities are
/// ordered by path; entities from the same file keep their discovery order.
pub fn render_document(set: &ResolvedSet, config: &GrabConfig, dialect: Dialect) -> Result<Document> {
    let sections = config.sections()?;

    let mut symbols: Vec<&Entity> = set.entities().filter(|e| e.has_contents()).collect();
    symbols.sort_by(|a, b| a.path().cmp(b.path()));
    let mut imports: Vec<&Entity> = set.imports().filter(|e| e.has_contents()).collect();
    imports.sort_by(|a, b| a.path().cmp(b.path()));

    let containers: Vec<&Entity> = symbols
        .iter()
        .copied()
        .filter(|e| e.kind == EntityKind::Container)
        .collect();
    let contained: HashSet<&EntityKey> = containers.iter().flat_map(|c| c.members.iter()).collect();

    let mut parts: Vec<String> = Vec::new();
    for section in sections {
        let text = match section {
            EntityKind::Import => {
                if !config.include_imports {
                    continue;
                }
                let inlined: HashSet<&str> = symbols.iter().map(|e| e.name()).collect();
                let lines = consolidate_imports(imports.iter().copied(), &inlined);
                if lines.is_empty() {
                    String::new()
                } else {
                    format!("{}\n", lines.join("\n"))
                }
            }
            EntityKind::Container => render_containers(set, &containers),
            kind => render_grouped(&standalone(&symbols, &contained, kind)),
        };
        if !text.is_empty() {
            parts.push(text);
        }
    }

    let jsx = symbols.iter().any(|e| is_jsx_path(e.path()));
    Ok(Document {
        text: parts.join("\n"),
        extension: dialect.output_extension(jsx),
    })
}

/// Entities of `kind` that are not rendered inside a container.
fn standalone<'a>(
    symbols: &[&'a Entity],
    contained: &HashSet<&EntityKey>,
    kind: EntityKind,
) -> Vec<&'a Entity> {
    symbols
        .iter()
        .copied()
        .filter(|e| e.kind == kind && !contained.contains(&e.key))
        .collect()
}

/// `// file`, the container header, then every member with contents indented
/// inside braces. Lines that begin inside a literal are copied as they are.
fn render_containers(set: &ResolvedSet, containers: &[&Entity]) -> String {
    let mut out = String::new();
    for container in containers {
        if !out.is_empty() {
            out.push('\n');
        }
        let header = container.contents.as_deref().unwrap_or_default();
        out.push_str(&format!("// {}\n{} {{\n", container.file_name, header));
        let members: Vec<(&str, &[usize])> = container
            .members
            .iter()
            .filter_map(|key| set.get(key))
            .filter_map(|member| {
                member
                    .contents
                    .as_deref()
                    .map(|body| (body, member.literal_lines.as_slice()))
            })
            .collect();
        for (i, (body, literal_lines)) in members.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for (n, line) in body.lines().enumerate() {
                if literal_lines.contains(&n) {
                    out.push_str(line);
                } else if !line.trim().is_empty() {
                    out.push_str("  ");
                    out.push_str(line);
                }
                out.push('\n');
            }
        }
        out.push_str("}\n");
    }
    out
}

/// Entities grouped by file: a `// file` comment opens each group and the
/// separator closes it.
fn render_grouped(entities: &[&Entity]) -> String {
    let mut out = String::new();
    let mut current: Option<&str> = None;
    for entity in entities {
        let file_name = entity.file_name.as_str();
        if current != Some(file_name) {
            if current.is_some() {
                out.push_str(FILE_SEPARATOR);
                out.push_str("\n\n");
            }
            out.push_str(&format!("// {}\n", file_name));
            current = Some(file_name);
        } else {
            out.push('\n');
        }
        if let Some(contents) = entity.contents.as_deref() {
            out.push_str(contents.trim_end());
            out.push('\n');
        }
    }
    if current.is_some() {
        out.push_str(FILE_SEPARATOR);
        out.push('\n');
    }
    out
}

/// Result of publishing a document.
#[derive(Debug, Clone)]
pub struct Published {
    /// Final, formatted text.
    pub text: String,
    /// Location of the artifact, `None` when it was removed after copying.
    pub path: Option<PathBuf>,
}

/// Writes the document to the project root, formats it and hands the result
/// to the clipboard.
pub struct Assembler<F, C> {
    root: PathBuf,
    formatter: F,
    clipboard: Option<C>,
    keep_file: bool,
}

impl<F: Formatter, C: Clipboard> Assembler<F, C> {
    /// `clipboard` is `None` when copying is disabled.
    pub fn new(root: &Path, formatter: F, clipboard: Option<C>, keep_file: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            formatter,
            clipboard,
            keep_file,
        }
    }

    /// Publishes `document` as `<root>/grab.<ext>`.
    ///
    /// Formatter and clipboard failures are logged and do not fail the run;
    /// the unformatted text is used when formatting fails.
    pub async fn publish(&self, document: &Document) -> Result<Published> {
        let path = self.root.join(document.file_name());
        tokio::fs::write(&path, &document.text)
            .await
            .map_err(|e| file_error(&path, e))?;

        if let Err(e) = self.formatter.format(&path).await {
            warn!(error = %e, "formatting failed, keeping unformatted output");
        }

        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| file_error(&path, e))?;

        if let Some(clipboard) = &self.clipboard {
            match clipboard.copy(&text) {
                Ok(()) => info!(bytes = text.len(), "copied context to clipboard"),
                Err(e) => warn!(error = %e, "clipboard copy failed"),
            }
        }

        if self.keep_file {
            info!(path = %path.display(), "wrote context file");
            return Ok(Published {
                text,
                path: Some(path),
            });
        }

        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| file_error(&path, e))?;
        Ok(Published { text, path: None })
    }
}

fn file_error(path: &Path, e: std::io::Error) -> GrabError {
    GrabError::File {
        message: e.to_string(),
        path: path.display().to_string(),
    }
}
