use context_grab::config::Dialect;
use context_grab::graph::ClosureEngine;
use context_grab::resolution::{AliasTable, ModuleResolver};
use context_grab::types::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, source: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, source).unwrap();
    path
}

fn run(root: &Path, aliases: AliasTable, entry: &Path, name: &str, depth: u32) -> ResolvedSet {
    let resolver = ModuleResolver::new(root, aliases, Dialect::TypeScript);
    ClosureEngine::new(&resolver, root, depth)
        .run(entry, name)
        .unwrap()
}

/// `a.ts: foo -> bar (./b) -> baz (./c)`, plus a same-file helper in `a.ts`.
fn chain_project(root: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let a = write(
        root,
        "a.ts",
        r#"import { bar } from "./b";

export function foo() {
  return bar() + local();
}

function local() {
  return 1;
}
"#,
    );
    let b = write(
        root,
        "b.ts",
        r#"import { baz } from "./c";

export function bar() {
  return baz();
}
"#,
    );
    let c = write(root, "c.ts", "export function baz() {\n  return 2;\n}\n");
    (a, b, c)
}

#[test]
fn test_cross_file_reference_is_one_level_deeper() {
    let dir = TempDir::new().unwrap();
    let (a, b, _) = chain_project(dir.path());
    let set = run(dir.path(), AliasTable::new(), &a, "foo", 2);

    let foo = set.get(&EntityKey::new("foo", a.clone())).unwrap();
    assert_eq!(foo.kind, EntityKind::Function);
    assert_eq!(foo.depth, 1);
    assert_eq!(foo.file_name, "a.ts");

    let bar = set.get(&EntityKey::new("bar", b.clone())).unwrap();
    assert_eq!(bar.depth, 2);
    assert!(bar.contents.as_deref().unwrap().contains("return baz();"));

    let import = set
        .imports()
        .find(|e| e.name() == "bar")
        .expect("import of bar registered");
    assert_eq!(import.path(), b.as_path());
    assert_eq!(import.kind, EntityKind::Import);
}

#[test]
fn test_depth_bound() {
    let dir = TempDir::new().unwrap();
    let (a, b, c) = chain_project(dir.path());

    let set = run(dir.path(), AliasTable::new(), &a, "foo", 2);
    assert!(set.contains(&EntityKey::new("bar", b.clone())));
    assert!(!set.contains(&EntityKey::new("baz", c.clone())));
    assert!(set.entities().all(|e| e.depth <= 2));

    let set = run(dir.path(), AliasTable::new(), &a, "foo", 3);
    assert_eq!(set.get(&EntityKey::new("baz", c)).unwrap().depth, 3);
}

#[test]
fn test_depth_one_keeps_same_file_references() {
    let dir = TempDir::new().unwrap();
    let (a, b, _) = chain_project(dir.path());
    let set = run(dir.path(), AliasTable::new(), &a, "foo", 1);

    let names: Vec<&str> = set.entities().map(|e| e.name()).collect();
    assert_eq!(names, vec!["foo", "local"]);
    assert!(!set.contains(&EntityKey::new("bar", b)));
    assert_eq!(set.get(&EntityKey::new("local", a)).unwrap().depth, 1);
}

#[test]
fn test_class_method_builds_container() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let m = write(
        root,
        "m.ts",
        r#"export class M {
  run() {
    return this.step();
  }

  step() {
    return 1;
  }

  unused() {}
}
"#,
    );
    let set = run(root, AliasTable::new(), &m, "run", 3);

    let container = set.get(&EntityKey::new("M", m.clone())).unwrap();
    assert_eq!(container.kind, EntityKind::Container);
    assert_eq!(container.contents.as_deref(), Some("class M"));
    let members: Vec<&str> = container.members.iter().map(|k| k.name.as_str()).collect();
    assert_eq!(members, vec!["run", "step"]);
    assert!(!set.contains(&EntityKey::new("unused", m)));
}

#[test]
fn test_external_import_is_not_followed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(
        root,
        "a.ts",
        r#"import { useState } from "react";

export function Counter() {
  const [n] = useState(0);
  return n;
}
"#,
    );
    let set = run(root, AliasTable::new(), &a, "Counter", 3);
    assert_eq!(set.len(), 1);
    let import = set.imports().next().unwrap();
    assert_eq!(import.name(), "useState");
    assert_eq!(import.path(), Path::new("react"));
}

#[test]
fn test_same_name_in_two_files_stays_distinct() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let x = write(
        root,
        "x.ts",
        "export function helper() {\n  return 'x';\n}\n",
    );
    let y = write(
        root,
        "y.ts",
        "export function helper() {\n  return 'y';\n}\n",
    );
    let a = write(
        root,
        "a.ts",
        r#"import { helper } from "./x";
import * as ys from "./y";

export function both() {
  return helper() + ys.helper();
}
"#,
    );
    let set = run(root, AliasTable::new(), &a, "both", 3);

    let hx = set.get(&EntityKey::new("helper", x)).unwrap();
    let hy = set.get(&EntityKey::new("helper", y)).unwrap();
    assert!(hx.contents.as_deref().unwrap().contains("'x'"));
    assert!(hy.contents.as_deref().unwrap().contains("'y'"));

    let keys: HashSet<&EntityKey> = set.entities().map(|e| &e.key).collect();
    assert_eq!(keys.len(), set.len());
}

#[test]
fn test_alias_import_is_followed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let util = write(
        root,
        "src/shared/util.ts",
        "export type Id = string;\nexport function makeId(): Id {\n  return '1';\n}\n",
    );
    let a = write(
        root,
        "src/features/a.ts",
        r#"import { makeId } from "@/shared/util";

export function create() {
  return makeId();
}
"#,
    );
    let mut aliases = AliasTable::new();
    aliases.insert("@".to_string(), "src".to_string());
    let set = run(root, aliases, &a, "create", 3);

    let make_id = set.get(&EntityKey::new("makeId", util.clone())).unwrap();
    assert_eq!(make_id.depth, 2);
    assert_eq!(make_id.file_name, "src/shared/util.ts");
    // Same-file type reference keeps depth 2.
    let id = set.get(&EntityKey::new("Id", util)).unwrap();
    assert_eq!(id.kind, EntityKind::Type);
    assert_eq!(id.depth, 2);
}

#[test]
fn test_missing_entry_symbol_yields_no_entities() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(root, "a.ts", "import { x } from \"./x\";\nexport function foo() {}\n");
    let set = run(root, AliasTable::new(), &a, "nope", 3);
    assert!(set.is_empty());
    // Imports of a visited file are registered regardless.
    assert_eq!(set.imports().count(), 1);
}

#[test]
fn test_broken_dependency_is_skipped() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "b.ts", "export function bar( {\n");
    let a = write(
        root,
        "a.ts",
        "import { bar } from \"./b\";\nexport function foo() {\n  return bar();\n}\n",
    );
    let set = run(root, AliasTable::new(), &a, "foo", 3);
    assert_eq!(set.len(), 1);
    assert!(set.contains(&EntityKey::new("foo", a)));
}

#[test]
fn test_cyclic_imports_terminate() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(
        root,
        "a.ts",
        "import { pong } from \"./b\";\nexport function ping(n: number): number {\n  return pong(n - 1);\n}\n",
    );
    let b = write(
        root,
        "b.ts",
        "import { ping } from \"./a\";\nexport function pong(n: number): number {\n  return ping(n);\n}\n",
    );
    let set = run(root, AliasTable::new(), &a, "ping", 10);
    assert_eq!(set.len(), 2);
    assert!(set.contains(&EntityKey::new("pong", b)));
}

#[test]
fn test_runs_are_deterministic() {
    let dir = TempDir::new().unwrap();
    let (a, _, _) = chain_project(dir.path());
    let first = run(dir.path(), AliasTable::new(), &a, "foo", 3);
    let second = run(dir.path(), AliasTable::new(), &a, "foo", 3);
    let keys = |set: &ResolvedSet| set.entities().map(|e| e.key.clone()).collect::<Vec<_>>();
    assert_eq!(keys(&first), keys(&second));
}
