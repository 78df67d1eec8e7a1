//! Tree-sitter based TypeScript / TSX / JavaScript extraction strategy.
//!
//! The three dialects share one walker; only the grammar differs.

use tree_sitter::Node as TsNode;

use crate::types::SymbolKind;

use super::{extract_heuristic, node_line, node_text, parse_with, strip_quotes, Extraction};

pub fn extract_typescript(source: &str) -> Extraction {
    extract_with(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(), source)
}

pub fn extract_tsx(source: &str) -> Extraction {
    extract_with(&tree_sitter_typescript::LANGUAGE_TSX.into(), source)
}

pub fn extract_javascript(source: &str) -> Extraction {
    extract_with(&tree_sitter_javascript::LANGUAGE.into(), source)
}

fn extract_with(language: &tree_sitter::Language, source: &str) -> Extraction {
    let tree = match parse_with(language, source) {
        Some(tree) => tree,
        None => return extract_heuristic(source),
    };

    let mut out = Extraction::default();
    let src = source.as_bytes();

    let root = tree.root_node();
    let mut cursor = root.walk();
    if cursor.goto_first_child() {
        loop {
            visit_statement(cursor.node(), src, &mut out, false);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

/// Visits one top-level (or exported) statement.
fn visit_statement(node: TsNode<'_>, src: &[u8], out: &mut Extraction, exported: bool) {
    match node.kind() {
        "import_statement" => {
            if let Some(source_node) = node.child_by_field_name("source") {
                out.push_import(strip_quotes(&node_text(source_node, src)));
            }
        }
        "export_statement" => visit_export(node, src, out),
        "function_declaration" | "generator_function_declaration" => {
            push_named(node, src, out, SymbolKind::Function, exported);
        }
        "class_declaration" | "abstract_class_declaration" => {
            push_named(node, src, out, SymbolKind::Class, exported);
            visit_class_body(node, src, out);
        }
        "interface_declaration" => {
            push_named(node, src, out, SymbolKind::Interface, exported);
        }
        "type_alias_declaration" => {
            push_named(node, src, out, SymbolKind::TypeAlias, exported);
        }
        "enum_declaration" => {
            push_named(node, src, out, SymbolKind::Enum, exported);
        }
        "lexical_declaration" | "variable_declaration" => {
            visit_variable_declaration(node, src, out, exported);
        }
        _ => {}
    }
}

/// Handles `export ...` statements: exported declarations, re-export lists,
/// and `export ... from "spec"` (which is also an import edge).
fn visit_export(node: TsNode<'_>, src: &[u8], out: &mut Extraction) {
    if let Some(source_node) = node.child_by_field_name("source") {
        out.push_import(strip_quotes(&node_text(source_node, src)));
    }

    if let Some(decl) = node.child_by_field_name("declaration") {
        visit_statement(decl, src, out, true);
        // `export default <expr>` carries no named declaration.
        if decl.child_by_field_name("name").is_none() && !decl.kind().ends_with("declaration") {
            out.push_export("default");
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "export_clause" => {
                let mut inner = child.walk();
                for spec in child.children(&mut inner) {
                    if spec.kind() == "export_specifier" {
                        // `export { a as b }` exposes the alias when present.
                        let name = spec
                            .child_by_field_name("alias")
                            .or_else(|| spec.child_by_field_name("name"))
                            .map(|n| node_text(n, src))
                            .unwrap_or_default();
                        out.push_export(&name);
                    }
                }
            }
            "default" => out.push_export("default"),
            _ => {}
        }
    }
}

/// Records class methods. Method names stay unexported; the class itself
/// carries the export.
fn visit_class_body(class_node: TsNode<'_>, src: &[u8], out: &mut Extraction) {
    let Some(body) = class_node.child_by_field_name("body") else {
        return;
    };
    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        if member.kind() == "method_definition" {
            if let Some(name) = member.child_by_field_name("name") {
                out.push_symbol(
                    &node_text(name, src),
                    SymbolKind::Method,
                    node_line(member),
                    false,
                );
            }
        }
    }
}

/// Records top-level `const`/`let`/`var` declarators. Declarators whose value
/// is a function expression count as functions, which matters for symbol
/// matching against queries like "the handler function".
fn visit_variable_declaration(node: TsNode<'_>, src: &[u8], out: &mut Extraction, exported: bool) {
    let is_const = node
        .child(0)
        .map(|c| c.kind() == "const")
        .unwrap_or(false);

    let mut cursor = node.walk();
    for declarator in node.children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name) = declarator.child_by_field_name("name") else {
            continue;
        };
        if name.kind() != "identifier" {
            continue; // destructuring patterns
        }
        let is_fn = declarator
            .child_by_field_name("value")
            .map(|v| matches!(v.kind(), "arrow_function" | "function_expression" | "function"))
            .unwrap_or(false);
        let kind = if is_fn {
            SymbolKind::Function
        } else if is_const {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };
        out.push_symbol(&node_text(name, src), kind, node_line(declarator), exported);
    }
}

fn push_named(
    node: TsNode<'_>,
    src: &[u8],
    out: &mut Extraction,
    kind: SymbolKind,
    exported: bool,
) {
    if let Some(name) = node.child_by_field_name("name") {
        out.push_symbol(&node_text(name, src), kind, node_line(node), exported);
    }
}
