//! Template parser - split template text into literal and reference segments
//!
//! Expressions are delimited by `{{` and `}}`. Inside the delimiters the token
//! is trimmed; `plugin.function` names a plugin function (split on the first
//! `.`), while a bare `name` or `$name` names a variable. Nesting is rejected.

use crate::error::{KernelError, Result};

use super::segment::{CLOSE, OPEN, Reference, Segment};

/// Parse template text into an ordered list of segments
///
/// Empty literals are never emitted, so an empty input yields no segments.
pub fn parse(text: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while let Some(found) = text[pos..].find(OPEN) {
        let start = pos + found;
        if start > pos {
            segments.push(Segment::Literal(text[pos..start].to_string()));
        }

        let inner_start = start + OPEN.len();
        let rest = &text[inner_start..];
        let close = rest.find(CLOSE);
        let reopen = rest.find(OPEN);

        let close = match (close, reopen) {
            (Some(c), Some(o)) if o < c => {
                return Err(KernelError::NestedExpressionNotAllowed { offset: inner_start + o });
            }
            (None, Some(o)) => {
                return Err(KernelError::NestedExpressionNotAllowed { offset: inner_start + o });
            }
            (None, None) => return Err(KernelError::UnterminatedExpression { offset: start }),
            (Some(c), _) => c,
        };

        let raw = &rest[..close];
        segments.push(Segment::Reference(parse_reference(raw, start)?));
        pos = inner_start + close + CLOSE.len();
    }

    if pos < text.len() {
        segments.push(Segment::Literal(text[pos..].to_string()));
    }

    log::debug!("Parsed template into {} segments", segments.len());
    Ok(segments)
}

/// Interpret the text between one pair of delimiters
fn parse_reference(raw: &str, offset: usize) -> Result<Reference> {
    let token = raw.trim();
    let invalid = |reason: &str| KernelError::InvalidExpression {
        offset,
        reason: reason.to_string(),
    };

    if token.is_empty() {
        return Err(invalid("empty expression"));
    }

    if let Some(name) = token.strip_prefix('$') {
        if name.is_empty() {
            return Err(invalid("empty variable name"));
        }
        return Ok(Reference::with_raw(None, name.to_string(), raw));
    }

    match token.split_once('.') {
        Some((plugin, function)) => {
            let plugin = plugin.trim();
            let function = function.trim();
            if plugin.is_empty() {
                return Err(invalid("empty plugin name"));
            }
            if function.is_empty() {
                return Err(invalid("empty function name"));
            }
            Ok(Reference::with_raw(Some(plugin.to_string()), function.to_string(), raw))
        }
        None => Ok(Reference::with_raw(None, token.to_string(), raw)),
    }
}
