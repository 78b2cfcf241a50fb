use tree_sitter::Node as TsNode;

use super::{leading_comments, unquote, ParsedFile};
use crate::resolution::ModuleResolver;
use crate::types::{ImportBinding, ImportForm};

/// Import bindings of one file, in source order.
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    bindings: Vec<ImportBinding>,
}

impl ImportTable {
    /// Returns the binding that introduced `local`, if any.
    pub fn lookup(&self, local: &str) -> Option<&ImportBinding> {
        self.bindings.iter().find(|b| b.local == local)
    }

    pub fn bindings(&self) -> &[ImportBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Collects the default, named and namespace bindings of every top-level
/// import statement, resolving each specifier once.
///
/// Side-effect imports (`import "./styles.css"`) introduce no binding and are
/// skipped.
pub fn collect_imports(file: &ParsedFile, resolver: &ModuleResolver) -> ImportTable {
    let mut table = ImportTable::default();
    let root = file.root();
    let mut cursor = root.walk();
    for statement in root.children(&mut cursor) {
        if statement.kind() == "import_statement" {
            collect_statement(file, resolver, statement, &mut table);
        }
    }
    table
}

fn collect_statement(
    file: &ParsedFile,
    resolver: &ModuleResolver,
    statement: TsNode<'_>,
    table: &mut ImportTable,
) {
    let Some(source) = statement.child_by_field_name("source") else {
        return;
    };
    let Some(clause) = find_child(statement, "import_clause") else {
        return;
    };

    let specifier = unquote(file.text(source)).to_string();
    let resolved = resolver.resolve(&specifier, &file.path);
    let statement_text = statement_with_comments(file, statement);

    let mut push = |local: String, form: ImportForm| {
        table.bindings.push(ImportBinding {
            local,
            form,
            specifier: specifier.clone(),
            resolved: resolved.clone(),
            statement: statement_text.clone(),
        });
    };

    let mut cursor = clause.walk();
    for part in clause.named_children(&mut cursor) {
        match part.kind() {
            "identifier" => push(file.text(part).to_string(), ImportForm::Default),
            "named_imports" => {
                let mut inner = part.walk();
                for spec in part.named_children(&mut inner) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    let local = spec
                        .child_by_field_name("alias")
                        .or_else(|| spec.child_by_field_name("name"))
                        .map(|n| unquote(file.text(n)).to_string());
                    if let Some(local) = local {
                        push(local, ImportForm::Named(file.text(spec).to_string()));
                    }
                }
            }
            "namespace_import" => {
                if let Some(ident) = find_child(part, "identifier") {
                    push(file.text(ident).to_string(), ImportForm::Namespace);
                }
            }
            _ => {}
        }
    }
}

fn statement_with_comments(file: &ParsedFile, statement: TsNode<'_>) -> String {
    let comments = leading_comments(statement);
    let text = file.block(statement.start_byte(), statement.end_byte());
    match (comments.first(), comments.last()) {
        (Some(first), Some(last)) => text.below(file.block(first.start_byte(), last.end_byte())).text,
        _ => text.text,
    }
}

fn find_child<'t>(node: TsNode<'t>, kind: &str) -> Option<TsNode<'t>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|c| c.kind() == kind);
    found
}
