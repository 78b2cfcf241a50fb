use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};

/// Kinds of symbols discovered during a grab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Import,
    Type,
    Container,
    Function,
}

#[allow(clippy::should_implement_trait)]
impl EntityKind {
    /// Returns the string representation of this entity kind.
    ///
    /// These are also the section names accepted in the `order` option.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Import => "imports",
            EntityKind::Type => "types",
            EntityKind::Container => "classes",
            EntityKind::Function => "functions",
        }
    }

    /// Parses a section name into an `EntityKind`, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<EntityKind> {
        match s {
            "imports" => Some(EntityKind::Import),
            "types" => Some(EntityKind::Type),
            "classes" => Some(EntityKind::Container),
            "functions" => Some(EntityKind::Function),
            _ => None,
        }
    }
}

/// Unique identity of a symbol: its name plus the file that defines it.
///
/// Two functions called `helper` in different files get different keys, and
/// the same symbol reached through different routes collapses to one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub name: String,
    pub path: PathBuf,
}

impl EntityKey {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<>{}", self.name, self.path.display())
    }
}

/// A reference discovered in some symbol's body that has not been looked up yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRef {
    pub name: String,
    pub path: PathBuf,
    /// The kind the referencing site implies; the final kind is decided by the match.
    pub kind: EntityKind,
    pub depth: u32,
}

impl SymbolRef {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
            depth: 1,
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.name.clone(), self.path.clone())
    }
}

/// How an import statement introduces a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportForm {
    /// `import Foo from "x"`
    Default,
    /// `import { foo }` or `import { foo as bar }`; holds the specifier as written.
    Named(String),
    /// `import * as ns from "x"`
    Namespace,
}

/// One binding introduced by an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Local name visible in the importing file.
    pub local: String,
    pub form: ImportForm,
    /// The module specifier exactly as written, without quotes.
    pub specifier: String,
    /// The file the specifier resolves to; `None` for external packages.
    pub resolved: Option<PathBuf>,
    /// Statement text including leading comments.
    pub statement: String,
}

impl ImportBinding {
    /// Path used to key and group this binding: the resolved file, or the bare
    /// specifier when it could not be resolved.
    pub fn source_path(&self) -> PathBuf {
        self.resolved
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.specifier))
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.local.clone(), self.source_path())
    }
}

/// A symbol resolved during the grab.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub key: EntityKey,
    pub kind: EntityKind,
    pub contents: Option<String>,
    /// Lines of `contents` that begin inside a string or template literal;
    /// re-indenting leaves them untouched.
    pub literal_lines: Vec<usize>,
    pub file_name: String,
    /// Member keys, only populated for containers. Insertion-ordered, never shrinks.
    pub members: IndexSet<EntityKey>,
    pub depth: u32,
    /// Present only for import entities.
    pub binding: Option<ImportBinding>,
}

impl Entity {
    pub fn new(key: EntityKey, kind: EntityKind, depth: u32, file_name: String) -> Self {
        Self {
            key,
            kind,
            contents: None,
            literal_lines: Vec::new(),
            file_name,
            members: IndexSet::new(),
            depth,
            binding: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn path(&self) -> &Path {
        &self.key.path
    }

    pub fn has_contents(&self) -> bool {
        self.contents.as_deref().is_some_and(|c| !c.trim().is_empty())
    }
}

/// Derives the display name used to group entities in the output.
///
/// Uses the path relative to the project root when possible so that two
/// `index.ts` files in different folders stay apart.
pub fn display_name(path: &Path, root: &Path) -> String {
    if let Ok(rel) = path.strip_prefix(root) {
        if !rel.as_os_str().is_empty() {
            return rel.to_string_lossy().replace('\\', "/");
        }
    }
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// The set of entities resolved during one run.
///
/// Symbols and import bindings live in separate maps: the import of `bar`
/// from `./b` and the inlined definition of `bar` in `b.ts` share a key.
/// Both maps keep insertion order so output is deterministic.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSet {
    entities: IndexMap<EntityKey, Entity>,
    imports: IndexMap<EntityKey, Entity>,
}

impl ResolvedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    pub fn get(&self, key: &EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// Stores a resolved entity. The first resolution of a key wins; returns
    /// `false` when the key was already present.
    pub fn insert(&mut self, entity: Entity) -> bool {
        if self.entities.contains_key(&entity.key) {
            return false;
        }
        self.entities.insert(entity.key.clone(), entity);
        true
    }

    /// Adds `member` to the container identified by `container`, creating the
    /// container entry on first sight.
    ///
    /// Returns `false` when the key is already taken by a non-container entity.
    pub fn add_member(
        &mut self,
        container: EntityKey,
        file_name: String,
        depth: u32,
        member: EntityKey,
    ) -> bool {
        let entry = self
            .entities
            .entry(container.clone())
            .or_insert_with(|| Entity::new(container, EntityKind::Container, depth, file_name));
        if entry.kind != EntityKind::Container {
            return false;
        }
        entry.members.insert(member);
        true
    }

    /// Registers an import binding; the first binding for a key wins.
    pub fn insert_import(&mut self, binding: ImportBinding, file_name: String, depth: u32) -> bool {
        let key = binding.key();
        if self.imports.contains_key(&key) {
            return false;
        }
        let mut entity = Entity::new(key.clone(), EntityKind::Import, depth, file_name);
        entity.contents = Some(binding.statement.clone());
        entity.binding = Some(binding);
        self.imports.insert(key, entity);
        true
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn imports(&self) -> impl Iterator<Item = &Entity> {
        self.imports.values()
    }

    pub fn containers_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities
            .values_mut()
            .filter(|e| e.kind == EntityKind::Container)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
