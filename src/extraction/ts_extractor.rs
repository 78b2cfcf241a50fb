//! Tree-sitter based TypeScript/JavaScript symbol extractor.
//!
//! Finds the definition of one named symbol inside a parsed file and reports
//! the types and functions that definition refers to.
use std::collections::HashSet;

use tree_sitter::Node as TsNode;

use super::{leading_comments, trailing_comment, ImportTable, ParsedFile, TextBlock};
use crate::types::{EntityKey, EntityKind, SymbolRef};

/// Node kinds whose value makes a variable or class field a function.
const FUNCTION_VALUES: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

/// The definition found for a requested symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Final classification of the symbol.
    pub kind: EntityKind,
    /// Source text, leading comments first.
    pub contents: String,
    /// Lines of `contents` that begin inside a string or template literal.
    pub literal_lines: Vec<usize>,
    /// Name of the enclosing class (or function-style component) for methods.
    pub container: Option<String>,
    /// Types and functions referenced from the definition, deduplicated.
    pub references: Vec<SymbolRef>,
}

/// Extracts symbol definitions and their outgoing references.
pub struct TsExtractor;

/// Internal state used while harvesting references from a matched subtree.
struct ReferenceState<'a> {
    file: &'a ParsedFile,
    imports: &'a ImportTable,
    seen: HashSet<EntityKey>,
    references: Vec<SymbolRef>,
}

impl<'a> ReferenceState<'a> {
    /// Records a reference to `name`, attributed to the file that `owner`
    /// was imported from, or to the current file.
    ///
    /// Names imported from unresolvable specifiers (external packages) are
    /// dropped.
    fn push(&mut self, name: &str, owner: &str, kind: EntityKind) {
        if name.is_empty() {
            return;
        }
        let path = match self.imports.lookup(owner) {
            Some(binding) => match &binding.resolved {
                Some(path) => path.clone(),
                None => return,
            },
            None => self.file.path.clone(),
        };
        let reference = SymbolRef::new(name, path, kind);
        if self.seen.insert(reference.key()) {
            self.references.push(reference);
        }
    }
}

impl TsExtractor {
    /// Looks up `name` in the file and, on success, returns its definition.
    ///
    /// The first definition in document order wins. Returns `None` when the
    /// file does not define the symbol.
    pub fn extract(file: &ParsedFile, name: &str, imports: &ImportTable) -> Option<Match> {
        let (kind, node, contents, container) = Self::find_definition(file, file.root(), name)?;

        let mut state = ReferenceState {
            file,
            imports,
            seen: HashSet::new(),
            references: Vec::new(),
        };
        Self::collect_references(&mut state, node);

        Some(Match {
            kind,
            contents: contents.text,
            literal_lines: contents.literal_lines,
            container,
            references: state.references,
        })
    }

    /// Returns the header of the container named `name`: the class or
    /// function text up to its body.
    pub fn find_container_header(file: &ParsedFile, name: &str) -> Option<String> {
        Self::find_header(file, file.root(), name)
    }

    // ----------------------------
    // Definition lookup
    // ----------------------------

    /// Depth-first search in document order for the first node defining `name`.
    #[allow(clippy::type_complexity)]
    fn find_definition<'t>(
        file: &ParsedFile,
        node: TsNode<'t>,
        name: &str,
    ) -> Option<(EntityKind, TsNode<'t>, TextBlock, Option<String>)> {
        if let Some(found) = Self::match_node(file, node, name) {
            return Some(found);
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        children
            .into_iter()
            .find_map(|child| Self::find_definition(file, child, name))
    }

    /// Checks whether a single node defines `name`.
    ///
    /// Returns the kind, the subtree to harvest references from, the contents
    /// and the container name.
    #[allow(clippy::type_complexity)]
    fn match_node<'t>(
        file: &ParsedFile,
        node: TsNode<'t>,
        name: &str,
    ) -> Option<(EntityKind, TsNode<'t>, TextBlock, Option<String>)> {
        match node.kind() {
            "method_definition" => {
                let key = node.child_by_field_name("name")?;
                if file.text(key) != name {
                    return None;
                }
                let contents = Self::member_contents(file, node);
                Some((EntityKind::Function, node, contents, Self::find_container(file, node)))
            }
            "public_field_definition" | "field_definition" => {
                let key = node
                    .child_by_field_name("name")
                    .or_else(|| node.child_by_field_name("property"))?;
                let value = node.child_by_field_name("value")?;
                if file.text(key) != name || !FUNCTION_VALUES.contains(&value.kind()) {
                    return None;
                }
                let contents = Self::member_contents(file, node);
                Some((EntityKind::Function, node, contents, Self::find_container(file, node)))
            }
            "function_declaration" | "generator_function_declaration" => {
                let ident = node.child_by_field_name("name")?;
                if file.text(ident) != name {
                    return None;
                }
                Some((EntityKind::Function, node, Self::node_contents(file, node), None))
            }
            "function_expression" | "function" | "generator_function" => {
                let ident = node.child_by_field_name("name")?;
                if file.text(ident) != name {
                    return None;
                }
                Some((EntityKind::Function, node, Self::node_contents(file, node), None))
            }
            "variable_declarator" => {
                let ident = node.child_by_field_name("name")?;
                let value = node.child_by_field_name("value")?;
                if ident.kind() != "identifier"
                    || file.text(ident) != name
                    || !FUNCTION_VALUES.contains(&value.kind())
                {
                    return None;
                }
                // The whole declaration statement, so `const`/`let` and type
                // annotations survive.
                let declaration = node
                    .parent()
                    .filter(|p| matches!(p.kind(), "lexical_declaration" | "variable_declaration"))
                    .unwrap_or(node);
                Some((
                    EntityKind::Function,
                    declaration,
                    Self::node_contents(file, declaration),
                    None,
                ))
            }
            "type_alias_declaration" | "interface_declaration" | "enum_declaration" => {
                let ident = node.child_by_field_name("name")?;
                if file.text(ident) != name {
                    return None;
                }
                Some((EntityKind::Type, node, Self::node_contents(file, node), None))
            }
            _ => None,
        }
    }

    /// Node text with its comments. Comments sitting before an `export`
    /// keyword belong to the exported declaration.
    fn node_contents(file: &ParsedFile, node: TsNode<'_>) -> TextBlock {
        let anchor = node
            .parent()
            .filter(|p| p.kind() == "export_statement")
            .unwrap_or(node);
        let text = file.block(node.start_byte(), node.end_byte());
        Self::with_comments(file, anchor, text)
    }

    /// Class member text including the decorators that precede it.
    fn member_contents(file: &ParsedFile, node: TsNode<'_>) -> TextBlock {
        let mut first = node;
        while let Some(prev) = first.prev_sibling() {
            if prev.kind() != "decorator" {
                break;
            }
            first = prev;
        }
        let text = file.block(first.start_byte(), node.end_byte());
        Self::with_comments(file, first, text)
    }

    fn with_comments(file: &ParsedFile, anchor: TsNode<'_>, mut text: TextBlock) -> TextBlock {
        let comments = leading_comments(anchor);
        if let (Some(first), Some(last)) = (comments.first(), comments.last()) {
            return text.below(file.block(first.start_byte(), last.end_byte()));
        }
        if let Some(comment) = trailing_comment(anchor) {
            text.text = format!("{} {}", text.text, file.text(comment));
        }
        text
    }

    /// Finds the nearest enclosing class or function declaration of a member.
    fn find_container(file: &ParsedFile, node: TsNode<'_>) -> Option<String> {
        let mut current = node.parent();
        while let Some(ancestor) = current {
            match ancestor.kind() {
                "class_declaration"
                | "abstract_class_declaration"
                | "function_declaration"
                | "generator_function_declaration" => {
                    return ancestor
                        .child_by_field_name("name")
                        .map(|n| file.text(n).to_string());
                }
                "class" => {
                    if let Some(n) = ancestor.child_by_field_name("name") {
                        return Some(file.text(n).to_string());
                    }
                    // `const Foo = class { ... }`
                    if let Some(declarator) = ancestor
                        .parent()
                        .filter(|p| p.kind() == "variable_declarator")
                    {
                        return declarator
                            .child_by_field_name("name")
                            .map(|n| file.text(n).to_string());
                    }
                }
                _ => {}
            }
            current = ancestor.parent();
        }
        None
    }

    /// Depth-first search for the header of the container named `name`.
    fn find_header(file: &ParsedFile, node: TsNode<'_>, name: &str) -> Option<String> {
        let header = match node.kind() {
            "class_declaration"
            | "abstract_class_declaration"
            | "function_declaration"
            | "generator_function_declaration" => node
                .child_by_field_name("name")
                .filter(|n| file.text(*n) == name)
                .and_then(|_| Self::text_before_body(file, node, node)),
            "lexical_declaration" | "variable_declaration" => {
                let mut cursor = node.walk();
                let declarator = node
                    .named_children(&mut cursor)
                    .find(|c| c.kind() == "variable_declarator");
                declarator
                    .filter(|d| {
                        d.child_by_field_name("name")
                            .is_some_and(|n| file.text(n) == name)
                    })
                    .and_then(|d| d.child_by_field_name("value"))
                    .and_then(|value| Self::text_before_body(file, node, value))
            }
            _ => None,
        };
        if header.is_some() {
            return header;
        }

        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        children
            .into_iter()
            .find_map(|child| Self::find_header(file, child, name))
    }

    /// Text from `start` up to the `body` of `owner`, or all of `start` when
    /// `owner` has no body.
    fn text_before_body(file: &ParsedFile, start: TsNode<'_>, owner: TsNode<'_>) -> Option<String> {
        let end = owner
            .child_by_field_name("body")
            .map(|b| b.start_byte())
            .unwrap_or(start.end_byte());
        let text = file.source.get(start.start_byte()..end)?.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.trim_end_matches(';').trim_end().to_string())
        }
    }

    // ----------------------------
    // Reference harvesting
    // ----------------------------

    /// Recursively collect type references and call targets under `node`.
    fn collect_references(state: &mut ReferenceState<'_>, node: TsNode<'_>) {
        match node.kind() {
            "type_identifier" => {
                if Self::is_type_use(node) {
                    let name = state.file.text(node).to_string();
                    state.push(&name, &name, EntityKind::Type);
                }
            }
            "call_expression" => {
                if let Some(callee) = node.child_by_field_name("function") {
                    Self::record_call(state, callee);
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            Self::collect_references(state, child);
        }
    }

    /// `f()` refers to `f`; `obj.m()` refers to `m` in whatever file `obj`
    /// was imported from. The receiver's type is not tracked, so a call is
    /// attributed by property name only.
    ///
    /// Calls use the local name: after `import { foo as bar }`, `bar()` is
    /// looked up as `bar` in the imported file, so a renamed import is not
    /// followed to `foo`.
    fn record_call(state: &mut ReferenceState<'_>, callee: TsNode<'_>) {
        match callee.kind() {
            "identifier" => {
                let name = state.file.text(callee).to_string();
                state.push(&name, &name, EntityKind::Function);
            }
            "member_expression" => {
                let (Some(object), Some(property)) = (
                    callee.child_by_field_name("object"),
                    callee.child_by_field_name("property"),
                ) else {
                    return;
                };
                let name = state.file.text(property).to_string();
                let owner = state.file.text(object).to_string();
                state.push(&name, &owner, EntityKind::Function);
            }
            _ => {}
        }
    }

    /// A `type_identifier` is a use unless it names the declaration it sits in
    /// or is the tail of a qualified `ns.Type`.
    fn is_type_use(node: TsNode<'_>) -> bool {
        let Some(parent) = node.parent() else {
            return true;
        };
        match parent.kind() {
            "nested_type_identifier" => false,
            "type_alias_declaration"
            | "interface_declaration"
            | "class_declaration"
            | "abstract_class_declaration"
            | "class"
            | "type_parameter" => parent
                .child_by_field_name("name")
                .map_or(true, |n| n.id() != node.id()),
            _ => true,
        }
    }
}
