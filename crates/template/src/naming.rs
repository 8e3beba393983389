/// Move keywords, which cannot name a module.
const RESERVED: &[&str] = &[
    "abort", "acquires", "as", "break", "const", "continue", "copy", "else", "enum", "false",
    "for", "friend", "fun", "has", "if", "invariant", "let", "loop", "macro", "match", "module",
    "move", "mut", "native", "public", "return", "spec", "struct", "true", "type", "use", "while",
];

/// Convert a token name into a valid Move module identifier.
///
/// Lowercases, collapses whitespace runs into `_`, drops everything outside
/// `[a-z0-9_]`, trims underscores, and prefixes `token_` when the result is
/// empty, does not start with a letter, or is a Move keyword.
pub fn sanitize_module_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            out.push(c);
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.starts_with(|c: char| c.is_ascii_lowercase()) && !RESERVED.contains(&trimmed) {
        trimmed.to_string()
    } else {
        format!("token_{trimmed}")
    }
}
