// SPDX-License-Identifier: Apache-2.0 OR MIT
use serde_json::{Map, Value};

use crate::analyze::{structure, TemplateToken};
use crate::error::Error;
use crate::tokenizer;

/// Renders a result map back into a canonical shorthand line.
///
/// Literals appear verbatim, variables are looked up by dotted path and
/// re-quoted when needed, and an optional block is included when its
/// presence flag is true (or, with no flag, when every variable directly
/// inside it is bound). Tokens are joined with single spaces.
pub(crate) fn render_tokens(tokens: &[String], values: &Map<String, Value>) -> Result<String, Error> {
    let stream = structure(tokens);
    let mut pieces = Vec::new();
    render_stream(&stream, values, &mut pieces)?;
    Ok(pieces.join(" "))
}

fn render_stream(
    stream: &[TemplateToken],
    values: &Map<String, Value>,
    pieces: &mut Vec<String>,
) -> Result<(), Error> {
    let mut index = 0;
    while index < stream.len() {
        match &stream[index] {
            TemplateToken::Literal(text) => pieces.push(text.clone()),
            TemplateToken::Variable(path) => {
                let value = lookup(values, path).ok_or_else(|| {
                    Error::no_match(format!("No value bound for variable {path}"))
                })?;
                let text = value_text(value);
                if tokenizer::needs_quoting(&text) {
                    pieces.push(tokenizer::quote_token(&text));
                } else {
                    pieces.push(text);
                }
            }
            TemplateToken::OptionalOpen => {
                let close = matching_close(stream, index);
                let inner = &stream[index + 1..close];
                if optional_included(inner, values) {
                    let body = match inner.first() {
                        Some(TemplateToken::PresenceFlag(_)) => &inner[1..],
                        _ => inner,
                    };
                    render_stream(body, values, pieces)?;
                }
                index = close;
            }
            TemplateToken::PresenceFlag(_) | TemplateToken::OptionalClose => {}
        }
        index += 1;
    }
    Ok(())
}

fn matching_close(stream: &[TemplateToken], open: usize) -> usize {
    let mut depth = 0usize;
    for (at, token) in stream.iter().enumerate().skip(open) {
        match token {
            TemplateToken::OptionalOpen => depth += 1,
            TemplateToken::OptionalClose => {
                depth -= 1;
                if depth == 0 {
                    return at;
                }
            }
            _ => {}
        }
    }
    stream.len()
}

fn optional_included(inner: &[TemplateToken], values: &Map<String, Value>) -> bool {
    if let Some(TemplateToken::PresenceFlag(flag)) = inner.first() {
        return matches!(values.get(flag), Some(Value::Bool(true)));
    }
    // no flag: include when every variable directly in the block is bound;
    // nested blocks decide for themselves
    let mut depth = 0usize;
    for token in inner {
        match token {
            TemplateToken::OptionalOpen => depth += 1,
            TemplateToken::OptionalClose => depth = depth.saturating_sub(1),
            TemplateToken::Variable(path) if depth == 0 => {
                if lookup(values, path).is_none() {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}

fn lookup<'v>(values: &'v Map<String, Value>, path: &str) -> Option<&'v Value> {
    let mut map = values;
    let mut current: Option<&Value> = None;
    for key in path.split('.') {
        if let Some(value) = current {
            map = match value {
                Value::Object(inner) => inner,
                _ => return None,
            };
        }
        current = Some(map.get(key)?);
    }
    current
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}
