/// Import specifier resolution: alias discovery and file probing.
mod aliases;
mod resolver;

pub use aliases::{find_aliases, AliasTable, ALIAS_SOURCES};
pub use resolver::{normalize_path, ModuleResolver};
