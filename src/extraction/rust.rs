//! Tree-sitter based Rust extraction strategy.

use tree_sitter::Node as TsNode;

use crate::types::SymbolKind;

use super::{extract_heuristic, node_line, node_text, parse_with, Extraction};

/// Extracts symbols, imports, and exports from Rust source.
///
/// `mod name;` declarations are emitted as `./name` import specifiers so the
/// import graph can link module files; `use` paths are kept as written.
pub fn extract(source: &str) -> Extraction {
    let language = tree_sitter_rust::LANGUAGE;
    let tree = match parse_with(&language.into(), source) {
        Some(tree) => tree,
        None => return extract_heuristic(source),
    };

    let mut out = Extraction::default();
    visit_children(tree.root_node(), source.as_bytes(), &mut out, false);
    out
}

fn visit_children(node: TsNode<'_>, source: &[u8], out: &mut Extraction, in_impl: bool) {
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            visit_node(cursor.node(), source, out, in_impl);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

fn visit_node(node: TsNode<'_>, source: &[u8], out: &mut Extraction, in_impl: bool) {
    match node.kind() {
        "function_item" | "function_signature_item" => {
            if let Some(name) = field_text(node, "name", source) {
                let kind = if in_impl {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                };
                out.push_symbol(&name, kind, node_line(node), is_pub(node));
            }
        }
        "struct_item" => push_named(node, source, out, SymbolKind::Struct),
        "enum_item" => push_named(node, source, out, SymbolKind::Enum),
        "trait_item" => {
            push_named(node, source, out, SymbolKind::Trait);
            // Default methods declared in the trait body.
            if let Some(body) = node.child_by_field_name("body") {
                visit_children(body, source, out, true);
            }
        }
        "type_item" => push_named(node, source, out, SymbolKind::TypeAlias),
        "const_item" => push_named(node, source, out, SymbolKind::Constant),
        "static_item" => push_named(node, source, out, SymbolKind::Constant),
        "mod_item" => {
            if let Some(name) = field_text(node, "name", source) {
                out.push_symbol(&name, SymbolKind::Module, node_line(node), is_pub(node));
                match node.child_by_field_name("body") {
                    // Inline module: index its items too.
                    Some(body) => visit_children(body, source, out, false),
                    // `mod name;` points at a sibling file.
                    None => out.push_import(&format!("./{}", name)),
                }
            }
        }
        "impl_item" => {
            if let Some(body) = node.child_by_field_name("body") {
                visit_children(body, source, out, true);
            }
        }
        "use_declaration" => {
            if let Some(arg) = node.child_by_field_name("argument") {
                out.push_import(&node_text(arg, source));
            }
        }
        "macro_definition" => {
            if let Some(name) = field_text(node, "name", source) {
                out.push_symbol(&name, SymbolKind::Function, node_line(node), is_pub(node));
            }
        }
        _ => {}
    }
}

fn push_named(node: TsNode<'_>, source: &[u8], out: &mut Extraction, kind: SymbolKind) {
    if let Some(name) = field_text(node, "name", source) {
        out.push_symbol(&name, kind, node_line(node), is_pub(node));
    }
}

fn field_text(node: TsNode<'_>, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .map(|n| node_text(n, source))
        .filter(|t| !t.is_empty())
}

/// An item is treated as exported when it carries any `pub` modifier.
fn is_pub(node: TsNode<'_>) -> bool {
    let mut cursor = node.walk();
    let has_modifier = node
        .children(&mut cursor)
        .any(|c| c.kind() == "visibility_modifier");
    has_modifier
}
