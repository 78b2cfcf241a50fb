use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use tree_sitter::Node as TsNode;

use crate::errors::{GrabError, Result};
use crate::extraction::{parse_tree, unquote, Grammar};

/// Alias prefix to real path prefix, relative to the project root.
pub type AliasTable = BTreeMap<String, String>;

/// Project files probed for alias definitions, in priority order.
pub const ALIAS_SOURCES: &[&str] = &[
    "tsconfig.json",
    "tsconfig.app.json",
    "package.json",
    "vite.config.js",
    "vite.config.ts",
    "webpack.config.js",
    "webpack.config.ts",
    "jest.config.js",
    "jest.config.ts",
    ".babelrc",
    "babel.config.js",
];

/// Babel plugin names that carry an `alias` option.
const MODULE_RESOLVER_PLUGINS: &[&str] = &["module-resolver", "babel-plugin-module-resolver"];

/// Discovers path aliases from the first project config file that defines any.
///
/// Files are not merged: the first one that exists and yields a non-empty
/// table wins. Files that fail to parse are logged and skipped.
pub fn find_aliases(root: &Path) -> Option<AliasTable> {
    for name in ALIAS_SOURCES {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        match read_aliases(&path, name) {
            Ok(table) if !table.is_empty() => {
                info!(source = name, count = table.len(), "discovered path aliases");
                return Some(table);
            }
            Ok(_) => debug!(source = name, "no aliases defined"),
            Err(e) => warn!(source = name, error = %e, "skipping alias source"),
        }
    }
    None
}

/// Reads the alias section of one config file.
fn read_aliases(path: &Path, name: &str) -> Result<AliasTable> {
    let contents = fs::read_to_string(path).map_err(|e| GrabError::File {
        message: e.to_string(),
        path: path.display().to_string(),
    })?;

    let table = if name.starts_with("tsconfig") {
        tsconfig_aliases(&parse_json(path, &strip_jsonc(&contents))?)
    } else if name == "package.json" {
        let config = parse_json(path, &contents)?;
        config
            .get("_moduleAliases")
            .map(|v| clean(raw_entries(v)))
            .unwrap_or_default()
    } else if name == ".babelrc" {
        babel_aliases(&parse_json(path, &strip_jsonc(&contents))?)
    } else {
        script_aliases(path, name, &contents)?
    };
    Ok(table)
}

fn parse_json(path: &Path, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| GrabError::Parse {
        message: e.to_string(),
        path: path.display().to_string(),
        line: u32::try_from(e.line()).ok(),
    })
}

/// `compilerOptions.paths`, with targets joined onto `baseUrl` when set.
fn tsconfig_aliases(config: &Value) -> AliasTable {
    let Some(options) = config.get("compilerOptions") else {
        return AliasTable::new();
    };
    let Some(paths) = options.get("paths") else {
        return AliasTable::new();
    };
    let base = options
        .get("baseUrl")
        .and_then(Value::as_str)
        .map(|b| b.trim_start_matches("./").trim_end_matches('/'))
        .filter(|b| !b.is_empty() && *b != ".");

    let mut table = clean(raw_entries(paths));
    if let Some(base) = base {
        for target in table.values_mut() {
            let rest = target.trim_start_matches("./");
            *target = if rest.is_empty() || rest == "." {
                base.to_string()
            } else {
                format!("{base}/{rest}")
            };
        }
    }
    table
}

/// The `alias` option of a `module-resolver` entry in `plugins`.
fn babel_aliases(config: &Value) -> AliasTable {
    let Some(plugins) = config.get("plugins").and_then(Value::as_array) else {
        return AliasTable::new();
    };
    plugins
        .iter()
        .filter_map(Value::as_array)
        .find(|entry| {
            entry
                .first()
                .and_then(Value::as_str)
                .is_some_and(|name| MODULE_RESOLVER_PLUGINS.contains(&name))
        })
        .and_then(|entry| entry.get(1))
        .and_then(|options| options.get("alias"))
        .map(|alias| clean(raw_entries(alias)))
        .unwrap_or_default()
}

/// Aliases from a JavaScript or TypeScript config module, read from its
/// syntax tree without evaluating it.
fn script_aliases(path: &Path, name: &str, contents: &str) -> Result<AliasTable> {
    let tree = parse_tree(Grammar::for_path(path), contents).map_err(|message| {
        GrabError::Parse {
            message,
            path: path.display().to_string(),
            line: None,
        }
    })?;
    let root = tree.root_node();
    let value_of = |key: &str| find_pair_value(root, contents, key).map(|v| literal(v, contents));

    let table = if name.starts_with("jest") {
        value_of("moduleNameMapper")
            .map(|v| {
                raw_entries(&v)
                    .into_iter()
                    .map(|(k, t)| (jest_key(&k), jest_target(&t)))
                    .collect::<Vec<_>>()
            })
            .map(clean)
            .unwrap_or_default()
    } else if name.starts_with("babel") {
        let mut config = Map::new();
        if let Some(plugins) = value_of("plugins") {
            config.insert("plugins".to_string(), plugins);
        }
        babel_aliases(&Value::Object(config))
    } else {
        value_of("resolve")
            .and_then(|resolve| resolve.get("alias").map(|a| clean(raw_entries(a))))
            .unwrap_or_default()
    };
    Ok(table)
}

/// Alias entries of an object (`{ "@": "src" }`), or of vite's array form
/// (`[{ find: "@", replacement: "src" }]`). Array values use their first
/// element.
fn raw_entries(value: &Value) -> Vec<(String, String)> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, target)| {
                let target = match target {
                    Value::String(s) => s.as_str(),
                    Value::Array(items) => items.first()?.as_str()?,
                    _ => return None,
                };
                Some((key.clone(), target.to_string()))
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let find = item.get("find")?.as_str()?;
                let replacement = item.get("replacement")?.as_str()?;
                Some((find.to_string(), replacement.to_string()))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Strips the `/*` wildcard marker from keys and targets and drops entries
/// whose key ends up empty.
fn clean(entries: Vec<(String, String)>) -> AliasTable {
    entries
        .into_iter()
        .map(|(key, target)| (strip_wildcard(&key), strip_wildcard(&target)))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn strip_wildcard(s: &str) -> String {
    s.strip_suffix("/*").unwrap_or(s).to_string()
}

/// Reduces a `moduleNameMapper` regex such as `^@/(.*)$` to its literal
/// prefix (`@`).
fn jest_key(pattern: &str) -> String {
    let body = pattern.trim_start_matches('^').trim_end_matches('$');
    let end = body
        .find(|c: char| "()[]{}.*+?|\\".contains(c))
        .unwrap_or(body.len());
    body[..end].trim_end_matches('/').to_string()
}

/// Reduces a mapper target such as `<rootDir>/src/$1` to its path prefix
/// (`src`).
fn jest_target(target: &str) -> String {
    let body = target.trim_start_matches("<rootDir>").trim_start_matches('/');
    let end = body.find('$').unwrap_or(body.len());
    body[..end].trim_end_matches('/').to_string()
}

/// Removes `//` and `/* */` comments and trailing commas, leaving string
/// literals untouched.
pub(crate) fn strip_jsonc(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut in_string = false;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match (c, chars.get(i + 1)) {
            ('"', _) => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            ('/', Some('/')) => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            (',', _) => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

// ----------------------------
// Static reading of config modules
// ----------------------------

/// Value node of the first `key: value` pair named `key`, in document order.
fn find_pair_value<'t>(node: TsNode<'t>, source: &str, key: &str) -> Option<TsNode<'t>> {
    if node.kind() == "pair" {
        let matches = node
            .child_by_field_name("key")
            .is_some_and(|k| property_name(k, source) == key);
        if matches {
            return node.child_by_field_name("value");
        }
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(|child| find_pair_value(child, source, key))
}

fn property_name<'s>(key: TsNode<'_>, source: &'s str) -> &'s str {
    let text = key.utf8_text(source.as_bytes()).unwrap_or("");
    unquote(text)
}

/// Converts a literal expression into JSON. Calls such as
/// `path.resolve(__dirname, "src")` become their last string argument;
/// anything that needs evaluation becomes `null`.
fn literal(node: TsNode<'_>, source: &str) -> Value {
    let text = node.utf8_text(source.as_bytes()).unwrap_or("");
    match node.kind() {
        "string" => Value::String(unquote(text).to_string()),
        "template_string" if !text.contains("${") => Value::String(unquote(text).to_string()),
        "number" => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "object" => {
            let mut map = Map::new();
            let mut cursor = node.walk();
            for pair in node.named_children(&mut cursor) {
                if pair.kind() != "pair" {
                    continue;
                }
                let (Some(key), Some(value)) = (
                    pair.child_by_field_name("key"),
                    pair.child_by_field_name("value"),
                ) else {
                    continue;
                };
                map.insert(property_name(key, source).to_string(), literal(value, source));
            }
            Value::Object(map)
        }
        "array" => {
            let mut cursor = node.walk();
            let items = node
                .named_children(&mut cursor)
                .filter(|c| c.kind() != "comment")
                .map(|c| literal(c, source))
                .collect();
            Value::Array(items)
        }
        "call_expression" => {
            let Some(args) = node.child_by_field_name("arguments") else {
                return Value::Null;
            };
            let mut cursor = args.walk();
            let last = args
                .named_children(&mut cursor)
                .filter_map(|arg| match literal(arg, source) {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .last();
            last.map(Value::String).unwrap_or(Value::Null)
        }
        "parenthesized_expression" | "as_expression" | "satisfies_expression" => node
            .named_child(0)
            .map(|inner| literal(inner, source))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
