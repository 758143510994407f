//! Splitting of `[a, b, c]` and `{"k": v}` literals into element literals.
//!
//! Commas and colons only separate at the top level: anything inside nested
//! brackets or double-quoted strings stays part of the current element.

use std::borrow::Cow;

use crate::DefaultsErrorKind;

fn malformed(msg: impl Into<String>) -> DefaultsErrorKind {
    DefaultsErrorKind::MalformedComposite(msg.into())
}

/// Splits a `[...]` literal into trimmed element literals.
///
/// `[]` yields no elements.
pub fn split_sequence(literal: &str) -> Result<Vec<&str>, DefaultsErrorKind> {
    let inner = strip_enclosing(literal, '[', ']')?;
    split_elements(inner)
}

/// Splits a `{...}` literal into trimmed `(key, value)` literals.
///
/// Each entry is split on its first top-level `:`.
pub fn split_mapping(literal: &str) -> Result<Vec<(&str, &str)>, DefaultsErrorKind> {
    let inner = strip_enclosing(literal, '{', '}')?;
    split_elements(inner)?
        .into_iter()
        .map(|entry| {
            let colon = *top_level_positions(entry, ':')?
                .first()
                .ok_or_else(|| malformed(format!("entry `{entry}` has no `:`")))?;
            let key = entry[..colon].trim();
            let value = entry[colon + 1..].trim();
            if key.is_empty() || value.is_empty() {
                return Err(malformed(format!("entry `{entry}` needs both key and value")));
            }
            Ok((key, value))
        })
        .collect()
}

/// Strips surrounding double quotes from an element and decodes its escapes.
///
/// Unquoted elements are returned as they are.
pub fn unquote(element: &str) -> Result<Cow<'_, str>, DefaultsErrorKind> {
    let Some(body) = element
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return Ok(Cow::Borrowed(element));
    };
    if !body.contains('\\') {
        return Ok(Cow::Borrowed(body));
    }

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let c = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| malformed(format!("bad escape \\u{hex} in {element}")))?;
                out.push(c);
            }
            Some(other) => return Err(malformed(format!("unknown escape \\{other} in {element}"))),
            None => return Err(malformed(format!("dangling `\\` in {element}"))),
        }
    }
    Ok(Cow::Owned(out))
}

fn strip_enclosing(literal: &str, open: char, close: char) -> Result<&str, DefaultsErrorKind> {
    literal
        .trim()
        .strip_prefix(open)
        .and_then(|rest| rest.strip_suffix(close))
        .ok_or_else(|| malformed(format!("expected `{open}`...`{close}`")))
}

fn split_elements(inner: &str) -> Result<Vec<&str>, DefaultsErrorKind> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut elements = Vec::new();
    let mut start = 0;
    let commas = top_level_positions(inner, ',')?;
    for end in commas.into_iter().chain(std::iter::once(inner.len())) {
        let element = inner[start..end].trim();
        if element.is_empty() {
            return Err(malformed("empty element"));
        }
        elements.push(element);
        start = end + 1;
    }
    Ok(elements)
}

/// Byte offsets of `separator` outside any brackets or quoted strings.
fn top_level_positions(text: &str, separator: char) -> Result<Vec<usize>, DefaultsErrorKind> {
    let mut positions = Vec::new();
    let mut closers = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => closers.push(']'),
            '{' => closers.push('}'),
            ']' | '}' => {
                if closers.pop() != Some(c) {
                    return Err(malformed(format!("unbalanced `{c}`")));
                }
            }
            _ if c == separator && closers.is_empty() => positions.push(idx),
            _ => {}
        }
    }

    if in_string {
        return Err(malformed("unterminated string"));
    }
    if let Some(closer) = closers.last() {
        return Err(malformed(format!("missing `{closer}`")));
    }
    Ok(positions)
}
