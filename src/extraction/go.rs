//! Tree-sitter based Go extraction strategy.

use tree_sitter::Node as TsNode;

use crate::types::SymbolKind;

use super::{extract_heuristic, node_line, node_text, parse_with, strip_quotes, Extraction};

/// Extracts symbols and imports from Go source.
///
/// Go has no export keyword: identifiers starting with an uppercase letter
/// are exported.
pub fn extract(source: &str) -> Extraction {
    let language = tree_sitter_go::LANGUAGE;
    let tree = match parse_with(&language.into(), source) {
        Some(tree) => tree,
        None => return extract_heuristic(source),
    };

    let mut out = Extraction::default();
    let src = source.as_bytes();

    let root = tree.root_node();
    let mut cursor = root.walk();
    if cursor.goto_first_child() {
        loop {
            visit_declaration(cursor.node(), src, &mut out);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

fn visit_declaration(node: TsNode<'_>, src: &[u8], out: &mut Extraction) {
    match node.kind() {
        "function_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                let name = node_text(name, src);
                let exported = is_exported(&name);
                out.push_symbol(&name, SymbolKind::Function, node_line(node), exported);
            }
        }
        "method_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                let name = node_text(name, src);
                let exported = is_exported(&name);
                out.push_symbol(&name, SymbolKind::Method, node_line(node), exported);
            }
        }
        "type_declaration" => {
            let mut cursor = node.walk();
            for spec in node.children(&mut cursor) {
                if spec.kind() != "type_spec" && spec.kind() != "type_alias" {
                    continue;
                }
                let Some(name) = spec.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(name, src);
                let kind = match spec.child_by_field_name("type").map(|t| t.kind()) {
                    Some("struct_type") => SymbolKind::Struct,
                    Some("interface_type") => SymbolKind::Interface,
                    _ => SymbolKind::TypeAlias,
                };
                out.push_symbol(&name, kind, node_line(spec), is_exported(&name));
            }
        }
        "const_declaration" => push_value_specs(node, src, out, SymbolKind::Constant),
        "var_declaration" => push_value_specs(node, src, out, SymbolKind::Variable),
        "import_declaration" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "import_spec" => push_import_spec(child, src, out),
                    "import_spec_list" => {
                        let mut inner = child.walk();
                        for spec in child.children(&mut inner) {
                            if spec.kind() == "import_spec" {
                                push_import_spec(spec, src, out);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn push_value_specs(node: TsNode<'_>, src: &[u8], out: &mut Extraction, kind: SymbolKind) {
    let mut cursor = node.walk();
    for spec in node.children(&mut cursor) {
        if !matches!(spec.kind(), "const_spec" | "var_spec") {
            continue;
        }
        // A spec may declare several names: `var a, b int`.
        let mut inner = spec.walk();
        for child in spec.children(&mut inner) {
            if child.kind() == "identifier" {
                let name = node_text(child, src);
                out.push_symbol(&name, kind, node_line(spec), is_exported(&name));
            }
        }
    }
}

fn push_import_spec(spec: TsNode<'_>, src: &[u8], out: &mut Extraction) {
    if let Some(path) = spec.child_by_field_name("path") {
        out.push_import(strip_quotes(&node_text(path, src)));
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}
