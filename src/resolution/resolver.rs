use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::AliasTable;
use crate::config::Dialect;

/// Resolves import specifiers to files on disk.
///
/// Aliased specifiers are rewritten against the project root; everything else
/// is taken relative to the importing file. Candidates are probed in order:
/// `<path>.<ext>`, `<path>/index.<ext>`, then `<path>` itself.
pub struct ModuleResolver {
    root: PathBuf,
    aliases: AliasTable,
    dialect: Dialect,
}

impl ModuleResolver {
    pub fn new(root: &Path, aliases: AliasTable, dialect: Dialect) -> Self {
        Self {
            root: root.to_path_buf(),
            aliases,
            dialect,
        }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Resolves `specifier` as written in `current_file`.
    ///
    /// Returns `None` when no file matches; external packages end up here by
    /// design and are not reported.
    pub fn resolve(&self, specifier: &str, current_file: &Path) -> Option<PathBuf> {
        let candidate = self.candidate_path(specifier, current_file);

        for ext in self.dialect.extensions() {
            let path = with_suffix(&candidate, &format!(".{ext}"));
            if path.is_file() {
                return Some(path);
            }
        }

        for ext in self.dialect.extensions() {
            let path = candidate.join(format!("index.{ext}"));
            if path.is_file() {
                return Some(path);
            }
        }

        if candidate.is_file() {
            return Some(candidate);
        }

        if specifier.contains("./") || specifier.contains('@') {
            debug!(
                specifier,
                candidate = %candidate.display(),
                "could not resolve import path"
            );
        }
        None
    }

    /// Builds the unprobed candidate path for a specifier.
    fn candidate_path(&self, specifier: &str, current_file: &Path) -> PathBuf {
        if let Some((alias, target)) = self.match_alias(specifier) {
            let rest = specifier[alias.len()..].trim_start_matches('/');
            let base = self.root.join(target.trim_start_matches('/'));
            let joined = if rest.is_empty() { base } else { base.join(rest) };
            return normalize_path(&joined);
        }

        let dir = current_file.parent().unwrap_or_else(|| Path::new(""));
        normalize_path(&dir.join(specifier))
    }

    /// Finds the alias whose key covers the specifier's leading path segments.
    ///
    /// A key matches when it equals the specifier or is followed by `/` in it;
    /// the longest key wins, so a first-segment key like `@` matches `@/utils`.
    fn match_alias(&self, specifier: &str) -> Option<(&str, &str)> {
        self.aliases
            .iter()
            .filter(|(alias, _)| {
                !alias.is_empty()
                    && specifier.starts_with(alias.as_str())
                    && (specifier.len() == alias.len()
                        || specifier.as_bytes()[alias.len()] == b'/')
            })
            .max_by_key(|(alias, _)| alias.len())
            .map(|(alias, target)| (alias.as_str(), target.as_str()))
    }
}

/// Appends a raw suffix to the path's last component (`a/b.service` + `.ts`).
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

/// Lexically normalizes `.` and `..` components without touching the disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
