//! Line-based fallback extraction for unknown languages and parser failures.
//!
//! Deliberately forgiving: files are often saved mid-edit, so this scanner
//! recognizes common declaration shapes without requiring balanced syntax.

use crate::types::SymbolKind;

use super::{strip_quotes, Extraction};

/// Extracts symbols and import specifiers by scanning lines for familiar
/// declaration keywords. Never fails; unrecognized lines are skipped.
pub fn extract_heuristic(source: &str) -> Extraction {
    let mut out = Extraction::default();

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx as u32 + 1;
        let line = raw_line.trim_start();

        let exported = line.starts_with("export ") || line.starts_with("pub ");
        let body = line
            .strip_prefix("export default ")
            .or_else(|| line.strip_prefix("export "))
            .or_else(|| line.strip_prefix("pub(crate) "))
            .or_else(|| line.strip_prefix("pub "))
            .unwrap_or(line);

        if let Some(spec) = import_specifier(body) {
            out.push_import(spec);
            continue;
        }

        if let Some((name, kind)) = declaration(body) {
            out.push_symbol(name, kind, line_no, exported);
        } else if exported && line.starts_with("export ") {
            // `export { a, b }` style re-export lists.
            if let Some(names) = body.strip_prefix('{').and_then(|r| r.split('}').next()) {
                for name in names.split(',') {
                    let name = name.trim().split_whitespace().next().unwrap_or("");
                    if is_identifier(name) {
                        out.push_export(name);
                    }
                }
            }
        }
    }

    out
}

/// Pulls an import specifier out of a line, if the line looks like an import.
fn import_specifier(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix("import ") {
        // `import x from "spec"` / `import "spec"` / `import a.b.c`
        if let Some(pos) = rest.find(" from ") {
            return Some(strip_quotes(rest[pos + 6..].trim_end_matches([';', ' '])));
        }
        let spec = rest.trim_end_matches([';', ' ']);
        if spec.starts_with('"') || spec.starts_with('\'') {
            return Some(strip_quotes(spec));
        }
        let first = spec.split_whitespace().next()?;
        return is_module_path(first).then_some(first);
    }
    if let Some(rest) = line.strip_prefix("from ") {
        // `from pkg import x`
        let module = rest.split_whitespace().next()?;
        return is_module_path(module).then_some(module);
    }
    if let Some(rest) = line.strip_prefix("use ") {
        let spec = rest.trim_end_matches(';').trim();
        return (!spec.is_empty()).then_some(spec);
    }
    if let Some(pos) = line.find("require(") {
        let rest = &line[pos + 8..];
        let end = rest.find(')')?;
        return Some(strip_quotes(&rest[..end]));
    }
    None
}

/// Matches a line prefix against known declaration keywords.
fn declaration(line: &str) -> Option<(&str, SymbolKind)> {
    const PREFIXES: &[(&str, SymbolKind)] = &[
        ("async fn ", SymbolKind::Function),
        ("fn ", SymbolKind::Function),
        ("async function ", SymbolKind::Function),
        ("function ", SymbolKind::Function),
        ("async def ", SymbolKind::Function),
        ("def ", SymbolKind::Function),
        ("func ", SymbolKind::Function),
        ("class ", SymbolKind::Class),
        ("struct ", SymbolKind::Struct),
        ("enum ", SymbolKind::Enum),
        ("trait ", SymbolKind::Trait),
        ("interface ", SymbolKind::Interface),
        ("type ", SymbolKind::TypeAlias),
        ("const ", SymbolKind::Constant),
        ("static ", SymbolKind::Constant),
        ("let ", SymbolKind::Variable),
        ("var ", SymbolKind::Variable),
        ("mod ", SymbolKind::Module),
    ];

    for (prefix, kind) in PREFIXES {
        if let Some(rest) = line.strip_prefix(prefix) {
            let name = identifier_prefix(rest);
            if !name.is_empty() {
                return Some((name, *kind));
            }
        }
    }
    None
}

/// Longest leading identifier of `s`.
fn identifier_prefix(s: &str) -> &str {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_alphanumeric() && *c != '_')
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[..end]
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// A module path: identifiers joined by `.`, `/` or `::`, or a quoted path.
fn is_module_path(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '/' | ':' | '-' | '@'))
}
