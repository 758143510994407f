//! Reading `#[facet(default_value = "...")]` off a field.

use facet_core::{Field, FieldAttribute};

use crate::DefaultsErrorKind;

/// Attribute key carrying a field's default literal.
pub const ANNOTATION_KEY: &str = "default_value";

/// Annotation value that marks a boxed record as intentionally left unallocated.
pub const DISABLED_SENTINEL: &str = "-";

/// What a field declares as its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultSpec {
    /// No `default_value` annotation.
    Absent,
    /// `default_value = "-"`.
    Disabled,
    /// Any other literal, possibly a `$NAME` indirection.
    Literal(String),
}

impl DefaultSpec {
    /// Looks up the annotation on `field`.
    pub fn of(field: &Field) -> Result<Self, DefaultsErrorKind> {
        let mut found = None;
        for FieldAttribute::Arbitrary(text) in field.attributes {
            if let Some(spec) = Self::from_attribute(text)? {
                if found.is_some() {
                    return Err(DefaultsErrorKind::MalformedAnnotation(format!(
                        "`{ANNOTATION_KEY}` given more than once"
                    )));
                }
                found = Some(spec);
            }
        }
        Ok(found.unwrap_or(DefaultSpec::Absent))
    }

    /// Parses the text of one arbitrary facet attribute.
    ///
    /// Returns `Ok(None)` when the attribute is not a `default_value` one.
    pub fn from_attribute(text: &str) -> Result<Option<Self>, DefaultsErrorKind> {
        let Some(rest) = text.trim().strip_prefix(ANNOTATION_KEY) else {
            return Ok(None);
        };
        if rest.starts_with(|c: char| c == '_' || c.is_alphanumeric()) {
            // some other key that merely starts with ours
            return Ok(None);
        }
        let Some(value) = rest.trim_start().strip_prefix('=') else {
            return Err(DefaultsErrorKind::MalformedAnnotation(
                "expected `= \"<literal>\"`".into(),
            ));
        };
        let literal = parse_string_literal(value.trim())?;
        if literal == DISABLED_SENTINEL {
            Ok(Some(DefaultSpec::Disabled))
        } else {
            Ok(Some(DefaultSpec::Literal(literal)))
        }
    }

    /// The declared literal, unless absent or disabled.
    pub fn literal(&self) -> Option<&str> {
        match self {
            DefaultSpec::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// Whether the field carries the disabled sentinel.
    pub fn is_disabled(&self) -> bool {
        matches!(self, DefaultSpec::Disabled)
    }
}

/// Decodes a Rust string literal token, plain or raw.
fn parse_string_literal(token: &str) -> Result<String, DefaultsErrorKind> {
    if let Some(raw) = token.strip_prefix('r') {
        let hashes = raw.len() - raw.trim_start_matches('#').len();
        let fence = &raw[..hashes];
        let body = raw[hashes..]
            .strip_prefix('"')
            .and_then(|body| body.strip_suffix(fence))
            .and_then(|body| body.strip_suffix('"'))
            .ok_or_else(|| {
                DefaultsErrorKind::MalformedAnnotation(format!("unterminated raw string {token}"))
            })?;
        return Ok(body.to_string());
    }

    let body = token
        .strip_prefix('"')
        .and_then(|body| body.strip_suffix('"'))
        .ok_or_else(|| {
            DefaultsErrorKind::MalformedAnnotation(format!("expected a string literal, got {token}"))
        })?;

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next().ok_or_else(|| {
            DefaultsErrorKind::MalformedAnnotation("dangling `\\` in string literal".into())
        })?;
        match escaped {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '0' => out.push('\0'),
            '\\' | '"' | '\'' => out.push(escaped),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                let code = u8::from_str_radix(&hex, 16)
                    .ok()
                    .filter(u8::is_ascii)
                    .ok_or_else(|| {
                        DefaultsErrorKind::MalformedAnnotation(format!("bad escape \\x{hex}"))
                    })?;
                out.push(char::from(code));
            }
            'u' => {
                let mut hex = String::new();
                if chars.next() != Some('{') {
                    return Err(DefaultsErrorKind::MalformedAnnotation(
                        "expected `{` after \\u".into(),
                    ));
                }
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    hex.push(c);
                }
                let c = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        DefaultsErrorKind::MalformedAnnotation(format!("bad escape \\u{{{hex}}}"))
                    })?;
                out.push(c);
            }
            '\n' => {
                // line continuation swallows leading whitespace of the next line
                while chars.next_if(|c| c.is_whitespace()).is_some() {}
            }
            other => {
                return Err(DefaultsErrorKind::MalformedAnnotation(format!(
                    "unknown escape \\{other}"
                )));
            }
        }
    }
    Ok(out)
}
