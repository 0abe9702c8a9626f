// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::VecDeque;

use serde_json::{Map, Value};

use crate::error::Error;
use crate::tokenizer::{self, QuotedTokenizer};

/// Tokenizer settings shared by the template and the input: quotes kept in
/// token text, delimiters dropped, internal quotes preserved, open quotes
/// rejected.
pub(crate) fn shorthand_tokenizer(text: &str) -> QuotedTokenizer<'_> {
    QuotedTokenizer::builder()
        .include_quotes(true)
        .include_delimiters(false)
        .keep_internal_quotes(true)
        .fail_on_open_quote(true)
        .build(text)
}

pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

pub(crate) fn is_valid_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(is_valid_name)
}

/// Checks template tokens for structural defects without consuming input:
/// token shapes, variable-name grammar, presence-flag syntax, and `]`
/// balance. Mirrors the normalization the matcher performs, so anything
/// accepted here is processable.
pub(crate) fn validate_tokens(template: &str, tokens: &[String]) -> Result<(), Error> {
    let mut work: VecDeque<String> = tokens.iter().cloned().collect();
    let mut depth = 0usize;
    while let Some(mut token) = work.pop_front() {
        if let Some(rest) = token.strip_prefix('[') {
            depth += 1;
            if !rest.is_empty() {
                work.push_front(rest.to_string());
            }
            if let Some(name) = take_presence_flag(template, &mut work)? {
                if !is_valid_name(&name) {
                    return Err(Error::template(
                        format!("Invalid presence variable name '{name}' in shorthand pattern '{template}'"),
                        template,
                    ));
                }
            }
            continue;
        }

        let closes = match token.strip_suffix(']') {
            Some(body) => {
                token = body.to_string();
                true
            }
            None => false,
        };

        if !token.is_empty() {
            if let Some(path) = token.strip_prefix("${").and_then(|t| t.strip_suffix('}')) {
                if !is_valid_path(path) {
                    return Err(Error::template(
                        format!("Invalid variable name '${{{path}}}' in shorthand pattern '{template}'"),
                        template,
                    ));
                }
            } else if !tokenizer::is_quoted(&token) {
                return Err(Error::template(
                    format!("Unexpected token in shorthand pattern '{template}'"),
                    template,
                ));
            }
        }

        if closes {
            if depth == 0 {
                return Err(Error::template("Unexpected optional block closure", template));
            }
            depth -= 1;
        }
    }
    Ok(())
}

fn take_presence_flag(
    template: &str,
    tokens: &mut VecDeque<String>,
) -> Result<Option<String>, Error> {
    match tokens.front() {
        Some(front) if front.starts_with('?') => {}
        _ => return Ok(None),
    }
    let token = tokens.pop_front().unwrap_or_default();
    match token.strip_prefix("?${").and_then(|t| t.strip_suffix('}')) {
        Some(name) => Ok(Some(name.to_string())),
        None => Err(Error::template(
            format!(
                "? after [ should indicate optional presence variable using syntax '?${{var}}', not '{token}'"
            ),
            template,
        )),
    }
}

/// One match attempt over one input line.
///
/// The attempt owns its working state (template-token queue, input
/// remainder, result map) and is consumed by [`Matcher::run`], so it cannot
/// be replayed. Optional blocks snapshot that state and restore it
/// wholesale when the body fails to match.
pub(crate) struct Matcher<'t> {
    template: &'t str,
    final_match_raw: bool,
    tokens: VecDeque<String>,
    input: String,
    result: Map<String, Value>,
    depth: usize,
    skipping: bool,
}

impl<'t> Matcher<'t> {
    pub(crate) fn new(
        template: &'t str,
        tokens: &[String],
        final_match_raw: bool,
        input: &str,
    ) -> Self {
        Self {
            template,
            final_match_raw,
            tokens: tokens.iter().cloned().collect(),
            input: input.to_string(),
            result: Map::new(),
            depth: 0,
            skipping: false,
        }
    }

    pub(crate) fn run(mut self) -> Result<Map<String, Value>, Error> {
        self.match_tokens()?;
        if !self.input.trim().is_empty() {
            return Err(Error::no_match(format!(
                "Input has trailing characters after template is matched: '{}'",
                self.input
            )));
        }
        Ok(self.result)
    }

    /// Consumes template tokens until the template runs out or, while
    /// draining a skipped optional block, until its closing `]`. Each
    /// optional block re-enters this function, so failure inside a block
    /// unwinds exactly to the frame that opened it.
    fn match_tokens(&mut self) -> Result<(), Error> {
        let mut at_optional_close = false;
        loop {
            if at_optional_close {
                if self.depth == 0 {
                    return Err(Error::template(
                        "Unexpected optional block closure",
                        self.template,
                    ));
                }
                self.depth -= 1;
                if self.skipping {
                    // the skipped block is fully drained; the caller resumes
                    return Ok(());
                }
                at_optional_close = false;
            }

            let Some(mut token) = self.tokens.pop_front() else {
                return Ok(());
            };

            if let Some(rest) = token.strip_prefix('[') {
                if !rest.is_empty() {
                    self.tokens.push_front(rest.to_string());
                }
                self.enter_optional()?;
                continue;
            }

            if let Some(body) = token.strip_suffix(']') {
                at_optional_close = true;
                if body.is_empty() {
                    continue;
                }
                token = body.to_string();
            }

            if tokenizer::is_quoted(&token) {
                if !self.skipping {
                    self.match_literal(&token)?;
                }
                continue;
            }

            if let Some(path) = token.strip_prefix("${").and_then(|t| t.strip_suffix('}')) {
                if !self.skipping {
                    let path = path.to_string();
                    self.capture_variable(&path)?;
                }
                continue;
            }

            return Err(Error::template(
                format!("Unexpected token in shorthand pattern '{}'", self.template),
                self.template,
            ));
        }
    }

    fn enter_optional(&mut self) -> Result<(), Error> {
        let presence = take_presence_flag(self.template, &mut self.tokens)?;

        if self.skipping {
            if let Some(flag) = &presence {
                self.result.insert(flag.clone(), Value::Bool(false));
            }
            self.depth += 1;
            return self.match_tokens();
        }

        let saved_result = self.result.clone();
        let saved_input = self.input.clone();
        let saved_tokens = self.tokens.clone();

        self.depth += 1;
        match self.match_tokens() {
            Ok(()) => {
                if let Some(flag) = &presence {
                    self.result.insert(flag.clone(), Value::Bool(true));
                }
                Ok(())
            }
            Err(err) if err.is_template_error() => Err(err),
            Err(_) => {
                self.result = saved_result;
                self.input = saved_input;
                self.tokens = saved_tokens;
                if let Some(flag) = &presence {
                    self.result.insert(flag.clone(), Value::Bool(false));
                }
                // drain the block syntactically without consuming input
                self.skipping = true;
                self.depth += 1;
                self.match_tokens()?;
                self.skipping = false;
                Ok(())
            }
        }
    }

    fn match_literal(&mut self, token: &str) -> Result<(), Error> {
        let literal = tokenizer::unwrap_quoted(token);
        // leading spaces were delimiter noise in both template and input,
        // but their absence matters for intra-token searching below
        let expected = literal.trim_start();
        if let Some(rest) = self.input.trim_start().strip_prefix(expected) {
            self.input = rest.to_string();
            return Ok(());
        }
        if self.input.is_empty() {
            return Err(Error::no_match(format!(
                "Literal '{literal}' expected, when end of input reached"
            )));
        }
        Err(Error::no_match(format!(
            "Literal '{literal}' expected, when encountered '{}'",
            self.input
        )))
    }

    fn capture_variable(&mut self, path: &str) -> Result<(), Error> {
        self.input = self.input.trim().to_string();
        if self.input.is_empty() {
            return Err(Error::no_match(format!(
                "End of input when looking for variable {path}"
            )));
        }

        let value = if self.only_closers_remain() {
            // the last capture takes the whole tail
            let mut input_tokens = shorthand_tokenizer(&self.input);
            let text = if self.final_match_raw {
                input_tokens.remainder_raw().to_string()
            } else {
                let parts = input_tokens
                    .tokens()
                    .map_err(|err| Error::no_match(err.to_string()))?;
                parts
                    .iter()
                    .map(|part| tokenizer::unwrap_quoted(part))
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            self.input.clear();
            text
        } else {
            let mut input_tokens = shorthand_tokenizer(&self.input);
            let first = input_tokens
                .next_token()
                .map_err(|err| Error::no_match(err.to_string()))?
                .ok_or_else(|| {
                    Error::no_match(format!("End of input when looking for variable {path}"))
                })?;
            if tokenizer::is_quoted(&first) {
                // quoted input wins over any delimiter inside it
                let text = tokenizer::unwrap_quoted(&first);
                self.input.drain(..first.len());
                text
            } else {
                let consumed = match self.tokens.front() {
                    Some(next) if tokenizer::is_quoted(next) => {
                        let literal = tokenizer::unwrap_quoted(next);
                        match first.find(&literal) {
                            Some(at) if at > 0 => at,
                            _ => first.len(),
                        }
                    }
                    _ => first.len(),
                };
                let text = first[..consumed].to_string();
                self.input.drain(..text.len());
                text
            }
        };

        self.assign(path, value)
    }

    fn only_closers_remain(&self) -> bool {
        self.tokens.iter().all(|token| token == "]")
    }

    fn assign(&mut self, path: &str, value: String) -> Result<(), Error> {
        let keys: Vec<&str> = path.split('.').collect();
        let mut target = &mut self.result;
        for key in &keys[..keys.len() - 1] {
            let slot = target
                .entry((*key).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            target = match slot {
                Value::Object(map) => map,
                other => {
                    return Err(Error::no_match(format!(
                        "Cannot process shorthand for [{}] because entry '{key}' is not a map ({})",
                        keys.join(", "),
                        value_display(other),
                    )));
                }
            };
        }
        let last = keys[keys.len() - 1];
        if let Some(existing @ Value::Object(_)) = target.get(last) {
            return Err(Error::no_match(format!(
                "Cannot process shorthand for [{}] because entry '{last}' is already a map ({})",
                keys.join(", "),
                value_display(existing),
            )));
        }
        target.insert(last.to_string(), Value::String(value));
        Ok(())
    }
}

fn value_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
