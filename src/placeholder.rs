//! Placeholder strings: lexing and rendering.
//!
//! `{metric.key}` (or a reserved bare token such as `{weather}`) is replaced by
//! the text its resolver returns. `{{` and `}}` are escapes for literal braces.
//! Everything else is copied verbatim.
//!
//! Strings are assumed well formed; a `{` with no closing `}` is kept as text
//! rather than reported. Only resolution can make rendering fail.

use crate::error::ResolveError;

/// A lexed piece of a placeholder string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text to copy, with escapes already collapsed.
    Literal(String),
    /// Placeholder token without its braces.
    Placeholder(&'a str),
}

/// Split a placeholder string into literal text and placeholder tokens.
pub fn lex(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    literal.push('{');
                    continue;
                }
                let start = i + 1;
                let Some(len) = template[start..].find('}') else {
                    literal.push_str(&template[i..]);
                    break;
                };
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                let close = start + len;
                segments.push(Segment::Placeholder(&template[start..close]));
                while chars.next_if(|&(j, _)| j <= close).is_some() {}
            }
            '}' => {
                chars.next_if(|&(_, next)| next == '}');
                literal.push('}');
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Render a placeholder string, resolving each token with `resolve`.
///
/// Stops at the first token that fails to resolve.
pub fn render<F>(template: &str, mut resolve: F) -> Result<String, ResolveError>
where
    F: FnMut(&str) -> Result<String, ResolveError>,
{
    let mut rendered = String::with_capacity(template.len());
    for segment in lex(template) {
        match segment {
            Segment::Literal(text) => rendered.push_str(&text),
            Segment::Placeholder(token) => rendered.push_str(&resolve(token)?),
        }
    }
    Ok(rendered)
}
