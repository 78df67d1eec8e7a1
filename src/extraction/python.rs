//! Tree-sitter based Python extraction strategy.

use tree_sitter::Node as TsNode;

use crate::types::SymbolKind;

use super::{extract_heuristic, node_line, node_text, parse_with, Extraction};

/// Extracts symbols and imports from Python source.
///
/// Top-level names not starting with an underscore are treated as exported.
/// Relative imports (`from .utils import x`) are normalized to `./`-style
/// specifiers so the shared resolver can link them to sibling modules.
pub fn extract(source: &str) -> Extraction {
    let language = tree_sitter_python::LANGUAGE;
    let tree = match parse_with(&language.into(), source) {
        Some(tree) => tree,
        None => return extract_heuristic(source),
    };

    let mut out = Extraction::default();
    visit_block(tree.root_node(), source.as_bytes(), &mut out, false);
    out
}

fn visit_block(node: TsNode<'_>, src: &[u8], out: &mut Extraction, in_class: bool) {
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            visit_statement(cursor.node(), src, out, in_class);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

fn visit_statement(node: TsNode<'_>, src: &[u8], out: &mut Extraction, in_class: bool) {
    match node.kind() {
        "function_definition" => {
            if let Some(name) = node.child_by_field_name("name") {
                let name = node_text(name, src);
                let kind = if in_class {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                };
                let exported = !in_class && !name.starts_with('_');
                out.push_symbol(&name, kind, node_line(node), exported);
            }
        }
        "class_definition" => {
            if let Some(name) = node.child_by_field_name("name") {
                let name = node_text(name, src);
                let exported = !in_class && !name.starts_with('_');
                out.push_symbol(&name, SymbolKind::Class, node_line(node), exported);
            }
            if !in_class {
                if let Some(body) = node.child_by_field_name("body") {
                    visit_block(body, src, out, true);
                }
            }
        }
        "decorated_definition" => {
            if let Some(definition) = node.child_by_field_name("definition") {
                visit_statement(definition, src, out, in_class);
            }
        }
        "import_statement" => {
            // `import a.b as c, d`
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "dotted_name" => out.push_import(&node_text(child, src)),
                    "aliased_import" => {
                        if let Some(name) = child.child_by_field_name("name") {
                            out.push_import(&node_text(name, src));
                        }
                    }
                    _ => {}
                }
            }
        }
        "import_from_statement" => {
            if let Some(module) = node.child_by_field_name("module_name") {
                let spec = normalize_module(&node_text(module, src));
                out.push_import(&spec);
            }
        }
        "expression_statement" if !in_class => {
            // Module-level assignments: `NAME = ...`
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.kind() != "assignment" {
                    continue;
                }
                let Some(left) = child.child_by_field_name("left") else {
                    continue;
                };
                if left.kind() != "identifier" {
                    continue;
                }
                let name = node_text(left, src);
                let kind = if name.chars().all(|c| !c.is_ascii_lowercase()) {
                    SymbolKind::Constant
                } else {
                    SymbolKind::Variable
                };
                out.push_symbol(&name, kind, node_line(child), !name.starts_with('_'));
            }
        }
        _ => {}
    }
}

/// Converts a Python module path to a resolver-friendly specifier.
///
/// `.utils` → `./utils`, `..pkg.mod` → `../pkg/mod`; absolute paths keep
/// their dotted form and are dropped by the resolver unless a matching file
/// exists.
fn normalize_module(module: &str) -> String {
    let dots = module.chars().take_while(|c| *c == '.').count();
    if dots == 0 {
        return module.to_string();
    }
    let rest = module[dots..].replace('.', "/");
    let mut prefix = if dots == 1 {
        "./".to_string()
    } else {
        "../".repeat(dots - 1)
    };
    prefix.push_str(&rest);
    // `from . import x` leaves an empty tail: point at the package itself.
    if rest.is_empty() {
        prefix.push_str("__init__");
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::normalize_module;

    #[test]
    fn relative_modules_become_paths() {
        assert_eq!(normalize_module(".utils"), "./utils");
        assert_eq!(normalize_module("..pkg.mod"), "../pkg/mod");
        assert_eq!(normalize_module("os.path"), "os.path");
        assert_eq!(normalize_module("."), "./__init__");
    }
}
