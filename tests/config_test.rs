use context_grab::config::*;
use context_grab::errors::GrabError;
use context_grab::types::EntityKind;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = GrabConfig::default();
    assert!(config.include_imports);
    assert_eq!(config.depth, 3);
    assert!(config.file);
    assert!(config.clipboard);
    assert_eq!(config.order, vec!["imports", "types", "classes", "functions"]);
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load_config(dir.path()).unwrap();
    assert_eq!(config, GrabConfig::default());
}

#[test]
fn test_load_context_grab_json_with_legacy_keys() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("context-grab.json"),
        r#"{
            "type": "typed",
            "isDebug": true,
            "depth": 5,
            "includeImports": false,
            "aliasConfig": { "@": "src" },
            "prettier": { "semi": false }
        }"#,
    )
    .unwrap();

    let config = load_config(dir.path()).unwrap();
    assert_eq!(config.dialect, Some(Dialect::TypeScript));
    assert!(config.debug);
    assert_eq!(config.depth, 5);
    assert!(!config.include_imports);
    assert_eq!(config.alias_config.get("@").map(String::as_str), Some("src"));
    assert!(config.formatter_args().contains(&"--no-semi".to_string()));
    // Unset keys keep their defaults.
    assert!(config.file);
}

#[test]
fn test_grab_json_takes_precedence() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("grab.json"), r#"{ "depth": 2 }"#).unwrap();
    fs::write(dir.path().join("context-grab.json"), r#"{ "depth": 7 }"#).unwrap();
    assert_eq!(
        find_config_path(dir.path()).unwrap(),
        dir.path().join("grab.json")
    );
    assert_eq!(load_config(dir.path()).unwrap().depth, 2);
}

#[test]
fn test_invalid_json_is_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("grab.json"), "{ depth: ").unwrap();
    match load_config(dir.path()) {
        Err(GrabError::Config { message }) => assert!(message.contains("grab.json")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_zero_depth_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("grab.json"), r#"{ "depth": 0 }"#).unwrap();
    assert!(matches!(
        load_config(dir.path()),
        Err(GrabError::Config { .. })
    ));
}

#[test]
fn test_order_must_be_permutation() {
    let mut config = GrabConfig::default();
    config.order = vec!["functions".into(), "types".into(), "classes".into(), "imports".into()];
    assert_eq!(
        config.sections().unwrap(),
        vec![
            EntityKind::Function,
            EntityKind::Type,
            EntityKind::Container,
            EntityKind::Import
        ]
    );

    config.order = vec!["functions".into(), "functions".into()];
    assert!(config.validate().is_err());

    config.order = vec!["imports".into(), "types".into(), "classes".into(), "methods".into()];
    assert!(config.validate().is_err());
}

#[test]
fn test_dialect_inferred_from_entry() {
    let config = GrabConfig::default();
    assert_eq!(config.dialect_for(Path::new("a.tsx")), Dialect::TypeScript);
    assert_eq!(config.dialect_for(Path::new("a.jsx")), Dialect::JavaScript);

    let config = GrabConfig {
        dialect: Some(Dialect::JavaScript),
        ..GrabConfig::default()
    };
    assert_eq!(config.dialect_for(Path::new("a.ts")), Dialect::JavaScript);
}

#[test]
fn test_dialect_extensions() {
    assert_eq!(Dialect::TypeScript.extensions(), &["ts", "tsx"]);
    assert_eq!(Dialect::JavaScript.extensions(), &["jsx", "js"]);
    assert_eq!(Dialect::TypeScript.output_extension(true), "tsx");
    assert_eq!(Dialect::JavaScript.output_extension(false), "js");
}

#[test]
fn test_default_formatter_args() {
    let args = GrabConfig::default().formatter_args();
    assert!(args.contains(&"--single-quote".to_string()));
    let pos = args.iter().position(|a| a == "--end-of-line").unwrap();
    assert_eq!(args[pos + 1], "lf");
}
