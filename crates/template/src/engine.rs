//! Placeholder and conditional-section engine.
//!
//! Syntax:
//!
//! ```text
//! {{key}}            replaced by the bound value, left verbatim when unbound
//! {{#flag}} ... {{/flag}}
//!                    kept (markers stripped) when `flag` is on, removed when off
//! ```
//!
//! A section marker alone on its line consumes the whole line, so disabled
//! sections leave no blank lines behind. Markers for names that are not in
//! the flag set are passed through untouched.

use std::collections::HashMap;

use suiforge_core::error::TemplateError;

/// Placeholder values by key.
pub type Bindings = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    /// `span` is the exact source text the marker consumed.
    Open { name: &'a str, span: &'a str },
    Close { name: &'a str, span: &'a str },
    Var { key: &'a str, raw: &'a str },
}

fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find("{{") {
        let start = cursor + offset;
        let Some(len) = template[start + 2..].find("}}") else {
            break;
        };
        let end = start + 2 + len + 2;
        let raw = &template[start..end];
        let inner = raw[2..raw.len() - 2].trim();

        let is_marker = inner.starts_with('#') || inner.starts_with('/');
        let (text_end, next) = if is_marker {
            standalone_line(template, start, end).unwrap_or((start, end))
        } else {
            (start, end)
        };
        let span = &template[text_end..next];

        if text_end > cursor {
            tokens.push(Token::Text(&template[cursor..text_end]));
        }
        tokens.push(if let Some(name) = inner.strip_prefix('#') {
            Token::Open { name: name.trim(), span }
        } else if let Some(name) = inner.strip_prefix('/') {
            Token::Close { name: name.trim(), span }
        } else {
            Token::Var { key: inner, raw }
        });
        cursor = next;
    }

    if cursor < template.len() {
        tokens.push(Token::Text(&template[cursor..]));
    }
    tokens
}

/// If the tag at `start..end` is the only thing on its line, the byte range
/// of that whole line including its newline.
fn standalone_line(src: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let line_start = src[..start].rfind('\n').map_or(0, |i| i + 1);
    if !src[line_start..start].chars().all(|c| c == ' ' || c == '\t') {
        return None;
    }

    let rest = &src[end..];
    let (line_end, trailing) = match rest.find('\n') {
        Some(i) => (end + i + 1, &rest[..i]),
        None => (src.len(), rest),
    };
    if !trailing.chars().all(char::is_whitespace) {
        return None;
    }
    Some((line_start, line_end))
}

fn malformed(section: &str, reason: impl Into<String>) -> TemplateError {
    TemplateError::Malformed {
        section: section.to_string(),
        reason: reason.into(),
    }
}

/// Render `template`: resolve every section named in `flags`, then substitute
/// bound placeholders in the surviving text.
///
/// Bound values are inserted as-is and never re-scanned, so a value that
/// looks like a marker stays literal.
pub fn render(
    template: &str,
    bindings: &Bindings,
    flags: &[(&str, bool)],
) -> Result<String, TemplateError> {
    let flag = |name: &str| flags.iter().find(|(n, _)| *n == name).map(|(_, on)| *on);

    let mut out = String::with_capacity(template.len());
    // (section name, emitting state outside it)
    let mut open: Vec<(&str, bool)> = Vec::new();
    let mut emitting = true;

    for token in tokenize(template) {
        match token {
            Token::Text(text) => {
                if emitting {
                    out.push_str(text);
                }
            }
            Token::Var { key, raw } => {
                if emitting {
                    out.push_str(bindings.get(key).map_or(raw, String::as_str));
                }
            }
            Token::Open { name, span } => match flag(name) {
                Some(enabled) => {
                    open.push((name, emitting));
                    emitting = emitting && enabled;
                }
                None if emitting => out.push_str(span),
                None => {}
            },
            Token::Close { name, span } => match flag(name) {
                Some(_) => match open.pop() {
                    Some((opened, outer)) if opened == name => emitting = outer,
                    Some((opened, _)) => {
                        return Err(malformed(
                            opened,
                            format!("'{{{{/{name}}}}}' appears before this section is closed"),
                        ));
                    }
                    None => {
                        return Err(malformed(name, "close marker without a matching open marker"));
                    }
                },
                None if emitting => out.push_str(span),
                None => {}
            },
        }
    }

    if let Some((name, _)) = open.pop() {
        return Err(malformed(name, "open marker without a matching close marker"));
    }
    Ok(out)
}
