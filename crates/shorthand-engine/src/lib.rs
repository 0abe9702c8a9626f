#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Shorthand template matching for one-line human input.
//!
//! A shorthand template describes how to pull named fields out of a line
//! of text, so callers can accept `integer foo = 3` instead of a verbose
//! structured object. A template is a sequence of space-separated tokens:
//!
//! - `${VAR}` captures input into `VAR`; dotted names (`${sensor.type}`)
//!   write into nested maps. A variable takes a quoted string if one is
//!   supplied, else up to the next literal if one follows, else the next
//!   word; the last variable absorbs the whole tail.
//! - `"LITERAL"` must appear verbatim in the input (quotes included in the
//!   template, spaces included if spaces are required).
//! - `[ TOKEN... ]` marks the enclosed tokens optional: matching is
//!   attempted with them first, then without.
//! - `[ ?${VAR} TOKEN... ]` additionally records in `VAR` whether the
//!   optional section matched.
//!
//! ```
//! use shorthand_engine::ShorthandTemplate;
//!
//! let template = ShorthandTemplate::parse(
//!     "[ ?${type_set} ${sensor.type} ] ${sensor.name} \"=\" ${value}",
//! )?;
//! let result = template.process("integer foo=3")?;
//! assert_eq!(result["sensor"]["type"], "integer");
//! assert_eq!(result["sensor"]["name"], "foo");
//! assert_eq!(result["value"], "3");
//! assert_eq!(result["type_set"], true);
//! # Ok::<(), shorthand_engine::Error>(())
//! ```

pub mod analyze;
mod error;
mod matcher;
mod render;
pub mod telemetry;
pub mod tokenizer;

pub use analyze::{TemplateAnalysis, VariableUsage};
pub use error::Error;
pub use tokenizer::{
    is_quoted, needs_quoting, quote_token, unwrap_quoted, QuotedTokenizer, TokenizeError,
    TokenizerBuilder,
};

use std::time::Instant;

use serde_json::{Map, Value};

/// A parsed shorthand template, reusable across match attempts.
///
/// The template is tokenized and checked once at [`parse`] time and is
/// immutable afterwards, so it can be shared freely between threads. Each
/// [`process`] call builds its own working state; nothing is carried over
/// from one attempt to the next.
///
/// [`parse`]: ShorthandTemplate::parse
/// [`process`]: ShorthandTemplate::process
#[derive(Debug, Clone)]
pub struct ShorthandTemplate {
    source: String,
    tokens: Vec<String>,
    final_match_raw: bool,
}

impl ShorthandTemplate {
    /// Parses template source into a reusable template.
    ///
    /// Fails when a quoted run is left open or the token structure is
    /// defective (bad variable name, malformed `?${var}` flag, stray `]`,
    /// or a token that is neither literal, variable, nor bracket).
    pub fn parse(source: &str) -> Result<Self, Error> {
        let started = Instant::now();
        let outcome = Self::parse_checked(source);
        telemetry::record_parse(source.len(), started.elapsed(), outcome.is_ok());
        outcome
    }

    fn parse_checked(source: &str) -> Result<Self, Error> {
        let tokens = matcher::shorthand_tokenizer(source)
            .tokens()
            .map_err(|err| Error::template(err.to_string(), source))?;
        matcher::validate_tokens(source, &tokens)?;
        Ok(Self {
            source: source.to_string(),
            tokens,
            final_match_raw: false,
        })
    }

    /// Whether the last capture should keep the tail verbatim, spacing and
    /// quoting preserved, instead of re-joining its tokens with single
    /// spaces. Off by default.
    pub fn with_final_match_raw(mut self, final_match_raw: bool) -> Self {
        self.final_match_raw = final_match_raw;
        self
    }

    /// The original template source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The template's tokens, quotes retained.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Runs one match attempt against `input`.
    ///
    /// On success the returned map binds every variable the match passed
    /// through (strings, or sub-maps for dotted names) and every declared
    /// presence flag (booleans). On failure the error carries a
    /// human-readable reason; the input never causes a panic.
    pub fn process(&self, input: &str) -> Result<Map<String, Value>, Error> {
        let started = Instant::now();
        let outcome =
            matcher::Matcher::new(&self.source, &self.tokens, self.final_match_raw, input).run();
        telemetry::record_process(self.source.len(), started.elapsed(), outcome.is_ok());
        outcome
    }

    /// Summarizes the template's structure: variables, presence flags,
    /// literals, and optional-block nesting.
    pub fn analyze(&self) -> TemplateAnalysis {
        analyze::analyze_tokens(&self.tokens)
    }

    /// Renders a result map back into a canonical shorthand line.
    ///
    /// The inverse of [`process`] up to whitespace normalization: literals
    /// appear verbatim, captured values are re-quoted when they would
    /// otherwise split, and optional blocks follow their presence flags.
    ///
    /// [`process`]: ShorthandTemplate::process
    pub fn render(&self, values: &Map<String, Value>) -> Result<String, Error> {
        render::render_tokens(&self.tokens, values)
    }
}
