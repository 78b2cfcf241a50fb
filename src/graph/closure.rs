use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::extraction::{collect_imports, ImportTable, SourceCache, TsExtractor};
use crate::resolution::ModuleResolver;
use crate::types::*;

/// Computes the depth-bounded set of symbols reachable from an entry symbol.
pub struct ClosureEngine<'a> {
    resolver: &'a ModuleResolver,
    root: PathBuf,
    max_depth: u32,
}

impl<'a> ClosureEngine<'a> {
    /// Creates an engine resolving imports with `resolver`. File names in the
    /// result are reported relative to `root`.
    pub fn new(resolver: &'a ModuleResolver, root: &Path, max_depth: u32) -> Self {
        Self {
            resolver,
            root: root.to_path_buf(),
            max_depth,
        }
    }

    /// Runs a breadth-first walk starting at `entry_name` in `entry_path`.
    ///
    /// A reference to a symbol in the same file keeps its parent's depth; a
    /// reference into another file goes one level deeper. References beyond
    /// the maximum depth are never enqueued. Files that cannot be read or
    /// parsed are logged and skipped, the entry file included, so the
    /// returned set may lack the entry symbol.
    pub fn run(&self, entry_path: &Path, entry_name: &str) -> Result<ResolvedSet> {
        let mut set = ResolvedSet::new();
        let mut cache = SourceCache::new();
        let mut import_tables: HashMap<PathBuf, ImportTable> = HashMap::new();
        let mut attempted: HashSet<EntityKey> = HashSet::new();

        let mut queue: VecDeque<SymbolRef> = VecDeque::new();
        queue.push_back(SymbolRef::new(entry_name, entry_path, EntityKind::Function));

        while let Some(current) = queue.pop_front() {
            let key = current.key();
            if set.contains(&key) || !attempted.insert(key.clone()) {
                continue;
            }
            if current.kind == EntityKind::Container {
                continue;
            }

            let file = match cache.get_or_parse(&current.path) {
                Ok(file) => file,
                Err(e) => {
                    warn!(symbol = %key, error = %e, "skipping unreadable source");
                    continue;
                }
            };

            if !import_tables.contains_key(&current.path) {
                let table = collect_imports(file, self.resolver);
                for binding in table.bindings() {
                    let file_name = display_name(&binding.source_path(), &self.root);
                    set.insert_import(binding.clone(), file_name, current.depth);
                }
                import_tables.insert(current.path.clone(), table);
            }
            let Some(imports) = import_tables.get(&current.path) else {
                continue;
            };

            let Some(found) = TsExtractor::extract(file, &current.name, imports) else {
                debug!(symbol = %key, "symbol not defined in file");
                continue;
            };

            let file_name = display_name(&current.path, &self.root);
            let mut entity = Entity::new(key.clone(), found.kind, current.depth, file_name.clone());
            entity.contents = Some(found.contents);
            entity.literal_lines = found.literal_lines;
            set.insert(entity);

            if let Some(container) = found.container {
                let container_key = EntityKey::new(container, current.path.clone());
                if !set.add_member(container_key.clone(), file_name, current.depth, key.clone()) {
                    debug!(container = %container_key, member = %key, "container name taken by another symbol");
                }
            }

            for mut child in found.references {
                child.depth = if child.path == current.path {
                    current.depth
                } else {
                    current.depth + 1
                };
                if child.depth > self.max_depth || set.contains(&child.key()) {
                    continue;
                }
                queue.push_back(child);
            }
        }

        for container in set.containers_mut() {
            match cache.get_or_parse(&container.key.path) {
                Ok(file) => {
                    container.contents = TsExtractor::find_container_header(file, &container.key.name);
                    if container.contents.is_none() {
                        debug!(container = %container.key, "container header not found");
                    }
                }
                Err(e) => warn!(container = %container.key, error = %e, "skipping container header"),
            }
        }

        info!(
            entities = set.len(),
            files = cache.len(),
            "resolved symbol closure"
        );
        Ok(set)
    }
}
