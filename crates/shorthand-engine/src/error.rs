// SPDX-License-Identifier: Apache-2.0 OR MIT
use thiserror::Error;

/// Unified error type for shorthand templates.
///
/// Errors come in two classes. `Template` means the template itself is
/// defective (a bug in whoever wrote the pattern) and carries the raw
/// template string for diagnosis. `Match` means the input did not satisfy
/// the template. The distinction matters to the matcher: optional-block
/// backtracking suppresses `Match` failures and retries without the block,
/// while `Template` errors always propagate.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("{message}")]
    Template { message: String, template: String },
    #[error("{message}")]
    Match { message: String },
}

impl Error {
    pub fn template(message: impl Into<String>, template: impl Into<String>) -> Self {
        Error::Template {
            message: message.into(),
            template: template.into(),
        }
    }

    pub fn no_match(message: impl Into<String>) -> Self {
        Error::Match {
            message: message.into(),
        }
    }

    /// True when the template itself is defective, as opposed to the input
    /// merely failing to match.
    pub fn is_template_error(&self) -> bool {
        matches!(self, Error::Template { .. })
    }

    /// The offending template source, when this is a template defect.
    pub fn template_source(&self) -> Option<&str> {
        match self {
            Error::Template { template, .. } => Some(template),
            Error::Match { .. } => None,
        }
    }
}
