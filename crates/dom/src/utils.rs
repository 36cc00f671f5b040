//! Utility functions for inline style and class-token strings

use cssparser::{serialize_identifier, Parser, ParserInput, SourcePosition, Token};

/// Cap text length (in characters) to keep log lines short
pub fn cap_text_length(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
    }
}

/// Convert a script-style property name (`backgroundColor`) to CSS
/// (`background-color`). Names that already contain a dash are only
/// lowercased; custom properties (`--x`) are left alone.
pub fn css_property_name(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("--") {
        return name.to_string();
    }
    if name.contains('-') {
        return name.to_ascii_lowercase();
    }
    if name == "cssFloat" {
        return "float".to_string();
    }

    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Split a `style` attribute into ordered (property, value) pairs.
///
/// Only top-level `;` ends a declaration and only the first top-level `:`
/// splits it, so strings and `url(...)`/function arguments stay intact.
/// Values are kept as written.
pub fn parse_style_declarations(style: Option<&str>) -> Vec<(String, String)> {
    let Some(style) = style else {
        return Vec::new();
    };

    let mut input = ParserInput::new(style);
    let mut parser = Parser::new(&mut input);
    let mut decls = Vec::new();
    let mut start = parser.position();
    let mut colon: Option<(SourcePosition, SourcePosition)> = None;

    loop {
        let before = parser.position();
        // Blocks and functions come back as one token; their contents are skipped
        let separator = match parser.next_including_whitespace_and_comments() {
            Ok(Token::Semicolon) => Some(';'),
            Ok(Token::Colon) => Some(':'),
            Ok(_) => None,
            Err(_) => break,
        };
        match separator {
            Some(';') => {
                push_declaration(&parser, start, colon, before, &mut decls);
                start = parser.position();
                colon = None;
            }
            Some(':') if colon.is_none() => colon = Some((before, parser.position())),
            _ => {}
        }
    }
    let end = parser.position();
    push_declaration(&parser, start, colon, end, &mut decls);
    decls
}

fn push_declaration(
    parser: &Parser<'_, '_>,
    start: SourcePosition,
    colon: Option<(SourcePosition, SourcePosition)>,
    end: SourcePosition,
    decls: &mut Vec<(String, String)>,
) {
    let Some((name_end, value_start)) = colon else {
        return;
    };
    let name = parser.slice(start..name_end).trim();
    let value = parser.slice(value_start..end).trim();
    if name.is_empty() || value.is_empty() {
        return;
    }
    decls.push((css_property_name(name), value.to_string()));
}

/// Inverse of [`parse_style_declarations`], in `cssText` form
pub fn serialize_style_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{}: {};", format_ident(name), value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escape a property name as a CSS identifier
pub fn format_ident(ident: &str) -> String {
    let mut out = String::new();
    let _ = serialize_identifier(ident, &mut out);
    out
}

/// Whitespace-separated class tokens
pub fn class_tokens(class_name: &str) -> Vec<&str> {
    class_name.split_ascii_whitespace().collect()
}

pub fn has_class_token(class_name: &str, token: &str) -> bool {
    class_tokens(class_name).contains(&token)
}

/// Append `token` unless present; output is single-space joined
pub fn add_class_token(class_name: &str, token: &str) -> String {
    let mut tokens = class_tokens(class_name);
    if !tokens.contains(&token) {
        tokens.push(token);
    }
    tokens.join(" ")
}

/// Drop every occurrence of `token`
pub fn remove_class_token(class_name: &str, token: &str) -> String {
    class_tokens(class_name)
        .into_iter()
        .filter(|existing| *existing != token)
        .collect::<Vec<_>>()
        .join(" ")
}
