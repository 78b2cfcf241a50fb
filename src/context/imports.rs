use std::collections::HashSet;
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::types::{Entity, ImportBinding, ImportForm};

/// Bindings from one source module, collected in first-seen order.
#[derive(Default)]
struct ImportGroup<'a> {
    specifier: &'a str,
    defaults: Vec<&'a str>,
    named: Vec<&'a str>,
    namespaces: Vec<&'a str>,
    locals: Vec<&'a str>,
}

/// Merges import entities into one statement per source module.
///
/// Groups are keyed by resolved path, or by specifier for external packages,
/// and come out in the order of `imports`. A group that imports any name in
/// `inlined` is dropped whole, since the definition itself is in the document.
pub fn consolidate_imports<'a, I>(imports: I, inlined: &HashSet<&str>) -> Vec<String>
where
    I: IntoIterator<Item = &'a Entity>,
{
    let mut groups: IndexMap<PathBuf, ImportGroup<'a>> = IndexMap::new();
    for binding in imports.into_iter().filter_map(|e| e.binding.as_ref()) {
        let group = groups
            .entry(binding.source_path())
            .or_insert_with(|| ImportGroup {
                specifier: &binding.specifier,
                ..ImportGroup::default()
            });
        add_binding(group, binding);
    }

    let mut lines = Vec::new();
    for group in groups.values() {
        if group.locals.iter().any(|local| inlined.contains(local)) {
            continue;
        }
        lines.extend(render_group(group));
    }
    lines
}

fn add_binding<'a>(group: &mut ImportGroup<'a>, binding: &'a ImportBinding) {
    let local = binding.local.as_str();
    if group.locals.contains(&local) {
        return;
    }
    group.locals.push(local);
    match &binding.form {
        ImportForm::Default => group.defaults.push(local),
        ImportForm::Named(spec) => {
            if !group.named.contains(&spec.as_str()) {
                group.named.push(spec);
            }
        }
        ImportForm::Namespace => group.namespaces.push(local),
    }
}

fn render_group(group: &ImportGroup<'_>) -> Vec<String> {
    let from = format!("from \"{}\";", group.specifier);
    let mut lines = Vec::new();

    let mut head = Vec::new();
    if let Some(first) = group.defaults.first() {
        head.push(first.to_string());
    }
    if !group.named.is_empty() {
        head.push(format!("{{ {} }}", group.named.join(", ")));
    }
    if !head.is_empty() {
        lines.push(format!("import {} {}", head.join(", "), from));
    }
    for extra in group.defaults.iter().skip(1) {
        lines.push(format!("import {} {}", extra, from));
    }
    for ns in &group.namespaces {
        lines.push(format!("import * as {} {}", ns, from));
    }
    lines
}
