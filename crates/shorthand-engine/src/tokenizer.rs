// SPDX-License-Identifier: Apache-2.0 OR MIT
use thiserror::Error;

const QUOTE: char = '"';

/// Error raised when a quoted run is opened but never closed.
#[derive(Debug, Clone, Error)]
#[error("Unterminated quoted string in '{text}'")]
pub struct TokenizeError {
    pub text: String,
}

/// Configures a [`QuotedTokenizer`] before binding it to an input string.
///
/// The defaults split on whitespace, drop delimiters, strip the outer quote
/// characters from quoted tokens, and tolerate an unterminated quote at the
/// end of input. Each knob can be flipped independently.
#[derive(Debug, Clone, Copy)]
pub struct TokenizerBuilder {
    include_quotes: bool,
    include_delimiters: bool,
    keep_internal_quotes: bool,
    fail_on_open_quote: bool,
}

impl Default for TokenizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenizerBuilder {
    pub fn new() -> Self {
        Self {
            include_quotes: false,
            include_delimiters: false,
            keep_internal_quotes: false,
            fail_on_open_quote: false,
        }
    }

    /// Keep the outer quote characters of a quoted token in the emitted text.
    pub fn include_quotes(mut self, include: bool) -> Self {
        self.include_quotes = include;
        self
    }

    /// Emit delimiter runs as tokens of their own.
    pub fn include_delimiters(mut self, include: bool) -> Self {
        self.include_delimiters = include;
        self
    }

    /// Keep quote characters that open a run in the middle of a token.
    pub fn keep_internal_quotes(mut self, keep: bool) -> Self {
        self.keep_internal_quotes = keep;
        self
    }

    /// Treat a quote that is opened and never closed as a hard failure
    /// instead of silently consuming the rest of the input.
    pub fn fail_on_open_quote(mut self, fail: bool) -> Self {
        self.fail_on_open_quote = fail;
        self
    }

    pub fn build(self, text: &str) -> QuotedTokenizer<'_> {
        QuotedTokenizer {
            rest: text,
            options: self,
        }
    }
}

/// Splits a string into whitespace-separated tokens while respecting
/// double-quoted runs.
///
/// Quotes protect whitespace: a quote that opens a token ends it when the
/// run closes, while a quote opened mid-token keeps the token going until
/// an unquoted delimiter. Backslash escapes inside quotes are carried
/// through verbatim; [`unwrap_quoted`] decodes them.
#[derive(Debug, Clone)]
pub struct QuotedTokenizer<'a> {
    rest: &'a str,
    options: TokenizerBuilder,
}

impl<'a> QuotedTokenizer<'a> {
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::new()
    }

    /// Whether another token (or delimiter run, when those are emitted) is
    /// available.
    pub fn has_more_tokens(&self) -> bool {
        if self.options.include_delimiters {
            !self.rest.is_empty()
        } else {
            !self.rest.trim_start().is_empty()
        }
    }

    /// The unconsumed input, spacing and quoting preserved.
    pub fn remainder_raw(&self) -> &'a str {
        self.rest
    }

    /// Pops the next token, or `None` when the input is exhausted.
    pub fn next_token(&mut self) -> Result<Option<String>, TokenizeError> {
        let delimiter_len = self
            .rest
            .char_indices()
            .find(|(_, ch)| !ch.is_whitespace())
            .map(|(at, _)| at)
            .unwrap_or(self.rest.len());
        if delimiter_len > 0 {
            let (delimiter, tail) = self.rest.split_at(delimiter_len);
            self.rest = tail;
            if self.options.include_delimiters {
                return Ok(Some(delimiter.to_string()));
            }
        }
        if self.rest.is_empty() {
            return Ok(None);
        }
        let (consumed, token) = self.scan_token()?;
        self.rest = &self.rest[consumed..];
        Ok(Some(token))
    }

    /// Drains the remaining tokens into a list.
    pub fn tokens(&mut self) -> Result<Vec<String>, TokenizeError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn scan_token(&self) -> Result<(usize, String), TokenizeError> {
        let text = self.rest;
        let mut token = String::new();
        let mut end = text.len();
        let mut chars = text.char_indices();
        let mut in_quotes = false;
        let mut opened_leading = false;

        while let Some((at, ch)) = chars.next() {
            if in_quotes {
                match ch {
                    '\\' => {
                        token.push(ch);
                        if let Some((_, escaped)) = chars.next() {
                            token.push(escaped);
                        }
                    }
                    QUOTE => {
                        in_quotes = false;
                        let keep = if opened_leading {
                            self.options.include_quotes
                        } else {
                            self.options.keep_internal_quotes
                        };
                        if keep {
                            token.push(ch);
                        }
                        // a token that began with a quote is exactly that run
                        if opened_leading {
                            end = at + ch.len_utf8();
                            break;
                        }
                    }
                    _ => token.push(ch),
                }
            } else {
                match ch {
                    QUOTE => {
                        in_quotes = true;
                        opened_leading = at == 0;
                        let keep = if opened_leading {
                            self.options.include_quotes
                        } else {
                            self.options.keep_internal_quotes
                        };
                        if keep {
                            token.push(ch);
                        }
                    }
                    _ if ch.is_whitespace() => {
                        end = at;
                        break;
                    }
                    _ => token.push(ch),
                }
            }
        }

        if in_quotes && self.options.fail_on_open_quote {
            return Err(TokenizeError {
                text: text.to_string(),
            });
        }
        Ok((end, token))
    }
}

/// True iff `token` is exactly one balanced double-quoted run, so that
/// [`unwrap_quoted`] removes a single quoting layer.
pub fn is_quoted(token: &str) -> bool {
    let Some(interior) = token.strip_prefix(QUOTE) else {
        return false;
    };
    let mut chars = interior.chars();
    let mut closed = false;
    while let Some(ch) = chars.next() {
        if closed {
            // content after the closing quote
            return false;
        }
        match ch {
            '\\' => {
                if chars.next().is_none() {
                    return false;
                }
            }
            QUOTE => closed = true,
            _ => {}
        }
    }
    closed
}

/// Strips one layer of quoting and decodes escape sequences; a token that
/// is not quoted comes back unchanged.
pub fn unwrap_quoted(token: &str) -> String {
    if !is_quoted(token) {
        return token.to_string();
    }
    let interior = &token[1..token.len() - 1];
    let mut out = String::with_capacity(interior.len());
    let mut chars = interior.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Wraps `text` in quotes, escaping so the result survives re-tokenization
/// as a single token.
pub fn quote_token(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(QUOTE);
    for ch in text.chars() {
        match ch {
            QUOTE => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push(QUOTE);
    out
}

/// Whether `text` must be quoted to survive re-tokenization intact.
pub fn needs_quoting(text: &str) -> bool {
    text.is_empty() || text.chars().any(|ch| ch.is_whitespace() || ch == QUOTE)
}
