use context_grab::config::Dialect;
use context_grab::extraction::*;
use context_grab::resolution::{AliasTable, ModuleResolver};
use context_grab::types::{EntityKind, ImportForm, SymbolRef};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, source: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, source).unwrap();
    path
}

fn resolver(root: &Path) -> ModuleResolver {
    ModuleResolver::new(root, AliasTable::new(), Dialect::TypeScript)
}

fn extract(root: &Path, path: &Path, name: &str) -> Option<Match> {
    let file = ParsedFile::open(path).unwrap();
    let imports = collect_imports(&file, &resolver(root));
    TsExtractor::extract(&file, name, &imports)
}

fn names(refs: &[SymbolRef]) -> Vec<&str> {
    refs.iter().map(|r| r.name.as_str()).collect()
}

#[test]
fn test_function_declaration_with_doc_comment() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let b = write(root, "b.ts", "export function bar(x: number) { return x; }\n");
    let a = write(
        root,
        "a.ts",
        r#"import { bar } from "./b";

/** Adds things. */
export function foo(x: Options): Result {
  return bar(x) + helper();
}

function helper() {
  return 1;
}
"#,
    );

    let found = extract(root, &a, "foo").unwrap();
    assert_eq!(found.kind, EntityKind::Function);
    assert_eq!(found.container, None);
    assert_eq!(
        found.contents,
        "/** Adds things. */\nfunction foo(x: Options): Result {\n  return bar(x) + helper();\n}"
    );
    assert_eq!(names(&found.references), vec!["Options", "Result", "bar", "helper"]);

    let bar = found.references.iter().find(|r| r.name == "bar").unwrap();
    assert_eq!(bar.path, b);
    assert_eq!(bar.kind, EntityKind::Function);
    let helper = found.references.iter().find(|r| r.name == "helper").unwrap();
    assert_eq!(helper.path, a);
    let options = found.references.iter().find(|r| r.name == "Options").unwrap();
    assert_eq!(options.kind, EntityKind::Type);
}

#[test]
fn test_arrow_function_keeps_whole_declaration() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(
        root,
        "a.ts",
        "export const greet = (name: string): string => {\n  return format(name);\n};\n\nconst other = 1;\n",
    );

    let found = extract(root, &a, "greet").unwrap();
    assert_eq!(found.kind, EntityKind::Function);
    assert!(found.contents.starts_with("const greet = (name: string): string => {"));
    assert!(found.contents.contains("return format(name);"));
    assert!(!found.contents.contains("other"));
    assert_eq!(names(&found.references), vec!["format"]);

    // Plain values are not functions.
    assert!(extract(root, &a, "other").is_none());
}

#[test]
fn test_class_method_reports_container() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(
        root,
        "service.ts",
        r#"export class Service extends Base {
  private repo: Repo;

  // Runs the job.
  run(input: Job): void {
    this.repo.save(input);
    validate(input);
  }
}
"#,
    );

    let found = extract(root, &a, "run").unwrap();
    assert_eq!(found.kind, EntityKind::Function);
    assert_eq!(found.container.as_deref(), Some("Service"));
    assert_eq!(
        found.contents,
        "// Runs the job.\nrun(input: Job): void {\n  this.repo.save(input);\n  validate(input);\n}"
    );
    assert_eq!(names(&found.references), vec!["Job", "save", "validate"]);

    let file = ParsedFile::open(&a).unwrap();
    assert_eq!(
        TsExtractor::find_container_header(&file, "Service").as_deref(),
        Some("class Service extends Base")
    );
    assert!(TsExtractor::find_container_header(&file, "Missing").is_none());
}

#[test]
fn test_class_expression_is_container() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(
        root,
        "store.ts",
        "export const Store = class {\n  get(id: Id) {\n    return load(id);\n  }\n};\n",
    );

    let found = extract(root, &a, "get").unwrap();
    assert_eq!(found.kind, EntityKind::Function);
    assert_eq!(found.container.as_deref(), Some("Store"));
    assert_eq!(found.contents, "get(id: Id) {\n  return load(id);\n}");
    assert_eq!(names(&found.references), vec!["Id", "load"]);

    let file = ParsedFile::open(&a).unwrap();
    assert_eq!(
        TsExtractor::find_container_header(&file, "Store").as_deref(),
        Some("const Store = class")
    );
}

#[test]
fn test_object_method_in_function_is_contained() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(
        root,
        "comp.ts",
        r#"export function Comp(props: Props) {
  const handlers = {
    go() {
      return 1;
    },
  };
  return handlers;
}
"#,
    );

    let found = extract(root, &a, "go").unwrap();
    assert_eq!(found.kind, EntityKind::Function);
    assert_eq!(found.container.as_deref(), Some("Comp"));
    assert_eq!(found.contents, "go() {\n  return 1;\n}");

    let file = ParsedFile::open(&a).unwrap();
    assert_eq!(
        TsExtractor::find_container_header(&file, "Comp").as_deref(),
        Some("function Comp(props: Props)")
    );
}

#[test]
fn test_template_literal_lines_keep_their_indent() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(
        root,
        "sql.ts",
        "export class Repo {\n  query() {\n    return `\nSELECT id\n        FROM users`;\n  }\n}\n",
    );

    let found = extract(root, &a, "query").unwrap();
    assert_eq!(
        found.contents,
        "query() {\n  return `\nSELECT id\n        FROM users`;\n}"
    );
    assert_eq!(found.literal_lines, vec![2, 3]);
}

#[test]
fn test_decorated_method_keeps_decorator() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(
        root,
        "ctrl.ts",
        r#"class Controller {
  @Get()
  list() {
    return [];
  }
}
"#,
    );
    let found = extract(root, &a, "list").unwrap();
    assert!(found.contents.contains("@Get()"));
    assert!(found.contents.contains("list() {"));
    assert_eq!(found.container.as_deref(), Some("Controller"));
}

#[test]
fn test_class_field_arrow_function() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(
        root,
        "widget.ts",
        r#"class Widget {
  handle = (e: ClickEvent) => {
    track(e);
  };
}
"#,
    );
    let found = extract(root, &a, "handle").unwrap();
    assert_eq!(found.kind, EntityKind::Function);
    assert_eq!(found.container.as_deref(), Some("Widget"));
    assert_eq!(names(&found.references), vec!["ClickEvent", "track"]);
}

#[test]
fn test_interface_and_type_alias() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(
        root,
        "types.ts",
        r#"export interface User {
  id: string;
  profile: Profile;
}

// A user's public profile.
export type Profile = { name: string; tags: Tag[] };

export enum Tag {
  A,
  B,
}
"#,
    );

    let user = extract(root, &a, "User").unwrap();
    assert_eq!(user.kind, EntityKind::Type);
    assert!(user.contents.starts_with("interface User {"));
    assert_eq!(names(&user.references), vec!["Profile"]);

    let profile = extract(root, &a, "Profile").unwrap();
    assert_eq!(profile.kind, EntityKind::Type);
    assert!(profile.contents.starts_with("// A user's public profile.\ntype Profile"));
    assert_eq!(names(&profile.references), vec!["Tag"]);

    let tag = extract(root, &a, "Tag").unwrap();
    assert_eq!(tag.kind, EntityKind::Type);
}

#[test]
fn test_first_definition_in_document_order_wins() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(
        root,
        "a.ts",
        "class A {\n  run() { return 1; }\n}\nclass B {\n  run() { return 2; }\n}\n",
    );
    let found = extract(root, &a, "run").unwrap();
    assert_eq!(found.container.as_deref(), Some("A"));
}

#[test]
fn test_missing_symbol() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(root, "a.ts", "export function foo() {}\n");
    assert!(extract(root, &a, "bar").is_none());
}

#[test]
fn test_references_to_external_packages_are_dropped() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(
        root,
        "a.ts",
        r#"import { z } from "zod";
import React from "react";

export function schema(): Local {
  React.createElement("div");
  return z.object({});
}
"#,
    );
    let found = extract(root, &a, "schema").unwrap();
    assert_eq!(names(&found.references), vec!["Local"]);
}

#[test]
fn test_member_call_on_namespace_import() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let utils = write(root, "lib/utils.ts", "export function format() {}\n");
    let a = write(
        root,
        "a.ts",
        r#"import * as utils from "./lib/utils";

export function run() {
  utils.format();
  utils.format();
}
"#,
    );
    let found = extract(root, &a, "run").unwrap();
    assert_eq!(found.references.len(), 1);
    assert_eq!(found.references[0].name, "format");
    assert_eq!(found.references[0].path, utils);
}

#[test]
fn test_collect_imports() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let b = write(root, "b.ts", "export default 1;\n");
    let a = write(
        root,
        "a.ts",
        r#"// shared helpers
import Default, { a, b as c } from "./b";
import * as ns from "./b";
import "./side-effect";
import { T } from "external";
"#,
    );

    let file = ParsedFile::open(&a).unwrap();
    let imports = collect_imports(&file, &resolver(root));
    let locals: Vec<&str> = imports.bindings().iter().map(|b| b.local.as_str()).collect();
    assert_eq!(locals, vec!["Default", "a", "c", "ns", "T"]);

    let default = imports.lookup("Default").unwrap();
    assert_eq!(default.form, ImportForm::Default);
    assert_eq!(default.resolved.as_deref(), Some(b.as_path()));
    assert_eq!(
        default.statement,
        "// shared helpers\nimport Default, { a, b as c } from \"./b\";"
    );

    assert_eq!(imports.lookup("c").unwrap().form, ImportForm::Named("b as c".to_string()));
    assert_eq!(imports.lookup("ns").unwrap().form, ImportForm::Namespace);

    let external = imports.lookup("T").unwrap();
    assert_eq!(external.resolved, None);
    assert_eq!(external.source_path(), PathBuf::from("external"));
}

#[test]
fn test_syntax_error_is_reported() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "bad.ts", "export function broken( {\n");
    assert!(ParsedFile::open(&a).is_err());
}

#[test]
fn test_source_cache_parses_once() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.ts", "export function foo() {}\n");
    let mut cache = SourceCache::new();
    assert!(cache.is_empty());
    cache.get_or_parse(&a).unwrap();
    cache.get_or_parse(&a).unwrap();
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_jsx_component() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let a = write(
        root,
        "Button.tsx",
        r#"export const Button = (props: ButtonProps) => {
  return <button onClick={() => track()}>{props.label}</button>;
};
"#,
    );
    let found = extract(root, &a, "Button").unwrap();
    assert_eq!(found.kind, EntityKind::Function);
    assert_eq!(names(&found.references), vec!["ButtonProps", "track"]);
    assert!(is_jsx_path(&a));
}
