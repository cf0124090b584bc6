//! Line templates for delimited output
//!
//! A template is literal text with `{field}` placeholders naming connection
//! fields (`src`, `spt`, `dst`, `dpt`, `dur`, `proto`). `{{` and `}}` produce
//! literal braces. Templates are compiled once; rendering a record then only
//! fails if a field value would break the line structure.

use crate::conn::{ConnField, ConnRecord};
use crate::error::RenderError;

/// Default connection line: comma separated, newline terminated
pub const CONN_LINE_TEMPLATE: &str = "{src},{spt},{dst},{dpt},{dur},{proto}\n";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(ConnField),
}

/// A compiled line template
#[derive(Debug, Clone)]
pub struct LineTemplate {
    segments: Vec<Segment>,
    /// Characters a field value must not contain
    reserved: Vec<char>,
}

impl LineTemplate {
    /// Compile a template
    ///
    /// # Errors
    /// Returns a structural `RenderError` for unknown fields or unbalanced braces.
    pub fn parse(template: &str) -> Result<Self, RenderError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().is_some_and(|&(_, next)| next == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        name.push(inner);
                    }
                    if !closed {
                        return Err(RenderError::UnterminatedPlaceholder { offset });
                    }
                    let field = ConnField::from_name(&name)
                        .ok_or_else(|| RenderError::UnknownPlaceholder(name.clone()))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' => return Err(RenderError::UnexpectedBrace { offset }),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let mut reserved: Vec<char> = vec!['\n', '\r'];
        for segment in &segments {
            if let Segment::Literal(text) = segment {
                for c in text.chars() {
                    if !reserved.contains(&c) {
                        reserved.push(c);
                    }
                }
            }
        }

        Ok(Self { segments, reserved })
    }

    /// Render one record
    ///
    /// # Errors
    /// Returns `FieldContainsDelimiter` if a value contains template literal
    /// text characters or a line break.
    pub fn render(&self, record: &ConnRecord) -> Result<String, RenderError> {
        let mut line = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => line.push_str(text),
                Segment::Field(field) => {
                    let value = record.field_text(*field);
                    if value.contains(self.reserved.as_slice()) {
                        return Err(RenderError::FieldContainsDelimiter {
                            field: field.name(),
                            value,
                        });
                    }
                    line.push_str(&value);
                }
            }
        }
        Ok(line)
    }
}
