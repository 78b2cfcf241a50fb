use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{GrabError, Result};
use crate::types::EntityKind;

/// Configuration file names probed at the project root, first match wins.
pub const CONFIG_FILENAMES: &[&str] = &["grab.json", "context-grab.json"];

/// Base name of the generated artifact (`grab.ts`, `grab.jsx`, ...).
pub const OUTPUT_STEM: &str = "grab";

/// Source dialect of the project being grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(alias = "typed", alias = "ts")]
    TypeScript,
    #[serde(alias = "untyped", alias = "js")]
    JavaScript,
}

impl Dialect {
    /// Extensions probed when resolving an import specifier, in priority order.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Dialect::TypeScript => &["ts", "tsx"],
            Dialect::JavaScript => &["jsx", "js"],
        }
    }

    /// Extension of the generated artifact.
    pub fn output_extension(&self, jsx: bool) -> &'static str {
        match (self, jsx) {
            (Dialect::TypeScript, false) => "ts",
            (Dialect::TypeScript, true) => "tsx",
            (Dialect::JavaScript, false) => "js",
            (Dialect::JavaScript, true) => "jsx",
        }
    }

    /// Infers the dialect from a source file's extension.
    pub fn from_path(path: &Path) -> Dialect {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts" | "tsx" | "mts" | "cts") => Dialect::TypeScript,
            _ => Dialect::JavaScript,
        }
    }
}

/// Run configuration, merged over the built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrabConfig {
    /// Source dialect; inferred from the entry file when absent.
    #[serde(alias = "type")]
    pub dialect: Option<Dialect>,
    #[serde(alias = "isDebug")]
    pub debug: bool,
    pub silent: bool,
    pub info: bool,
    /// Whether to emit the consolidated imports section.
    pub include_imports: bool,
    /// Section order; a permutation of `imports`, `types`, `classes`, `functions`.
    pub order: Vec<String>,
    /// Alias prefix to path prefix. Discovered from project config files when empty.
    #[serde(alias = "aliases")]
    pub alias_config: BTreeMap<String, String>,
    /// Maximum traversal depth; the entry symbol sits at depth 1.
    pub depth: u32,
    /// Formatter option overrides, in prettier's option names.
    #[serde(alias = "formatter")]
    pub prettier: Map<String, Value>,
    /// Keep the generated file on disk after copying it.
    #[serde(alias = "keepFile")]
    pub file: bool,
    /// Copy the final document to the system clipboard.
    pub clipboard: bool,
    pub formatter_timeout_secs: u64,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            dialect: None,
            debug: false,
            silent: false,
            info: false,
            include_imports: true,
            order: ["imports", "types", "classes", "functions"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            alias_config: BTreeMap::new(),
            depth: 3,
            prettier: Map::new(),
            file: true,
            clipboard: true,
            formatter_timeout_secs: 30,
        }
    }
}

impl GrabConfig {
    /// Checks value ranges and the section order.
    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(GrabError::Config {
                message: "depth must be at least 1".to_string(),
            });
        }
        self.sections()?;
        Ok(())
    }

    /// Returns the configured section order as entity kinds.
    pub fn sections(&self) -> Result<Vec<EntityKind>> {
        let mut sections = Vec::with_capacity(self.order.len());
        for name in &self.order {
            let kind = EntityKind::from_str(name).ok_or_else(|| GrabError::Config {
                message: format!(
                    "unknown section '{}' in order (expected imports, types, classes, functions)",
                    name
                ),
            })?;
            if sections.contains(&kind) {
                return Err(GrabError::Config {
                    message: format!("section '{}' appears twice in order", name),
                });
            }
            sections.push(kind);
        }
        if sections.len() != 4 {
            return Err(GrabError::Config {
                message: "order must list imports, types, classes and functions exactly once"
                    .to_string(),
            });
        }
        Ok(sections)
    }

    /// Returns the configured dialect, or the one implied by the entry file.
    pub fn dialect_for(&self, entry: &Path) -> Dialect {
        self.dialect.unwrap_or_else(|| Dialect::from_path(entry))
    }

    /// Default log directive implied by the verbosity flags.
    pub fn log_directive(&self) -> &'static str {
        if self.silent {
            "off"
        } else if self.debug {
            "debug"
        } else if self.info {
            "info"
        } else {
            "warn"
        }
    }

    /// Turns the formatter options into prettier command-line flags.
    ///
    /// Overrides are merged over `singleQuote`, `trailingComma: "all"` and
    /// `endOfLine: "lf"`. `true` becomes `--flag`, `false` becomes `--no-flag`,
    /// strings and numbers become `--flag value`.
    pub fn formatter_args(&self) -> Vec<String> {
        let mut options = Map::new();
        options.insert("singleQuote".to_string(), Value::Bool(true));
        options.insert("trailingComma".to_string(), Value::String("all".to_string()));
        options.insert("endOfLine".to_string(), Value::String("lf".to_string()));
        for (key, value) in &self.prettier {
            options.insert(key.clone(), value.clone());
        }

        let mut args = Vec::new();
        for (key, value) in &options {
            let flag = kebab_case(key);
            match value {
                Value::Bool(true) => args.push(format!("--{flag}")),
                Value::Bool(false) => args.push(format!("--no-{flag}")),
                Value::String(s) => {
                    args.push(format!("--{flag}"));
                    args.push(s.clone());
                }
                Value::Number(n) => {
                    args.push(format!("--{flag}"));
                    args.push(n.to_string());
                }
                _ => tracing::warn!(option = %key, "ignoring non-scalar formatter option"),
            }
        }
        args
    }
}

fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Returns the first configuration file present at the project root.
pub fn find_config_path(project_root: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| project_root.join(name))
        .find(|p| p.is_file())
}

/// Loads the run configuration from disk.
///
/// If no configuration file exists, returns the default configuration.
pub fn load_config(project_root: &Path) -> Result<GrabConfig> {
    let Some(config_path) = find_config_path(project_root) else {
        return Ok(GrabConfig::default());
    };

    let contents = fs::read_to_string(&config_path).map_err(|e| GrabError::Config {
        message: format!(
            "failed to read config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    let config: GrabConfig = serde_json::from_str(&contents).map_err(|e| GrabError::Config {
        message: format!(
            "failed to parse config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    config.validate()?;
    Ok(config)
}
