use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use crate::clipboard::Clipboard;
use crate::config::{load_config, GrabConfig};
use crate::context::{render_document, Assembler, Document, Formatter};
use crate::errors::{GrabError, Result};
use crate::graph::ClosureEngine;
use crate::resolution::{find_aliases, normalize_path, AliasTable, ModuleResolver};
use crate::types::*;

/// Coordinates one grab: alias discovery, the closure walk, rendering and
/// publishing.
pub struct ContextGrab {
    config: GrabConfig,
    project_root: PathBuf,
    aliases: AliasTable,
}

/// Result of a complete grab.
#[derive(Debug, Clone)]
pub struct GrabResult {
    /// Key of the requested entry symbol.
    pub entry: EntityKey,
    /// Whether the entry symbol was defined in the entry file.
    pub entry_found: bool,
    /// Number of resolved symbols, containers included.
    pub entity_count: usize,
    /// Number of registered import bindings.
    pub import_count: usize,
    /// Final document text, after formatting.
    pub text: String,
    /// Location of the generated file, if it was kept.
    pub path: Option<PathBuf>,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

impl ContextGrab {
    /// Prepares a grab over `project_root` with the given configuration.
    ///
    /// A non-empty `aliasConfig` is used as is; otherwise aliases are
    /// discovered from the project's config files.
    pub fn new(project_root: &Path, config: GrabConfig) -> Result<Self> {
        config.validate()?;
        let project_root = fs::canonicalize(project_root).map_err(|e| GrabError::File {
            message: format!("invalid project root: {}", e),
            path: project_root.display().to_string(),
        })?;

        let aliases = if config.alias_config.is_empty() {
            find_aliases(&project_root).unwrap_or_default()
        } else {
            config.alias_config.clone()
        };

        Ok(Self {
            config,
            project_root,
            aliases,
        })
    }

    /// Prepares a grab using the configuration file found at the project root.
    pub fn open(project_root: &Path) -> Result<Self> {
        let config = load_config(project_root)?;
        Self::new(project_root, config)
    }

    pub fn config(&self) -> &GrabConfig {
        &self.config
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }
}

// ---------------------------------------------------------------------------
// Grabbing
// ---------------------------------------------------------------------------

impl ContextGrab {
    /// Turns a file path given relative to the project root into an absolute
    /// path, failing with a usage error when no such file exists.
    pub fn resolve_entry(&self, relative: &Path) -> Result<PathBuf> {
        let path = normalize_path(&self.project_root.join(relative));
        if !path.is_file() {
            return Err(GrabError::Usage {
                message: format!("invalid path {}", path.display()),
            });
        }
        Ok(path)
    }

    /// Walks the symbol closure of `symbol` defined in `entry`.
    pub fn collect(&self, entry: &Path, symbol: &str) -> Result<ResolvedSet> {
        let dialect = self.config.dialect_for(entry);
        let resolver = ModuleResolver::new(&self.project_root, self.aliases.clone(), dialect);
        ClosureEngine::new(&resolver, &self.project_root, self.config.depth).run(entry, symbol)
    }

    /// Renders a collected set without touching the disk.
    pub fn render(&self, set: &ResolvedSet, entry: &Path) -> Result<Document> {
        render_document(set, &self.config, self.config.dialect_for(entry))
    }

    /// Runs a full grab: collect, render, then write, format and copy.
    ///
    /// `clipboard` is ignored when the configuration disables copying.
    pub async fn run<F, C>(
        &self,
        relative: &Path,
        symbol: &str,
        formatter: F,
        clipboard: Option<C>,
    ) -> Result<GrabResult>
    where
        F: Formatter,
        C: Clipboard,
    {
        let start = Instant::now();
        let entry_path = self.resolve_entry(relative)?;
        let entry = EntityKey::new(symbol, entry_path.clone());

        let set = self.collect(&entry_path, symbol)?;
        let entry_found = set.contains(&entry);
        if !entry_found {
            warn!(symbol, file = %entry_path.display(), "entry symbol not found");
        }

        let document = self.render(&set, &entry_path)?;
        let clipboard = clipboard.filter(|_| self.config.clipboard);
        let assembler = Assembler::new(&self.project_root, formatter, clipboard, self.config.file);
        let published = assembler.publish(&document).await?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            entities = set.len(),
            imports = set.imports().count(),
            duration_ms,
            "grab complete"
        );

        Ok(GrabResult {
            entry,
            entry_found,
            entity_count: set.len(),
            import_count: set.imports().count(),
            text: published.text,
            path: published.path,
            duration_ms,
        })
    }
}
