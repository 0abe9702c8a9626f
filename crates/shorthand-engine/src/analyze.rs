// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::VecDeque;

/// Structural view of one template token after bracket normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TemplateToken {
    OptionalOpen,
    OptionalClose,
    PresenceFlag(String),
    Literal(String),
    Variable(String),
}

/// Flattens raw template tokens into a structural stream: glued brackets
/// are split off, literals unwrapped, variable paths extracted. Assumes the
/// tokens already passed validation.
pub(crate) fn structure(tokens: &[String]) -> Vec<TemplateToken> {
    let mut work: VecDeque<String> = tokens.iter().cloned().collect();
    let mut stream = Vec::new();
    while let Some(mut token) = work.pop_front() {
        if let Some(rest) = token.strip_prefix('[') {
            stream.push(TemplateToken::OptionalOpen);
            if !rest.is_empty() {
                work.push_front(rest.to_string());
            }
            if let Some(front) = work.front() {
                if let Some(name) = front
                    .strip_prefix("?${")
                    .and_then(|flag| flag.strip_suffix('}'))
                {
                    stream.push(TemplateToken::PresenceFlag(name.to_string()));
                    work.pop_front();
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

        if let Some(path) = token.strip_prefix("${").and_then(|t| t.strip_suffix('}')) {
            stream.push(TemplateToken::Variable(path.to_string()));
        } else if !token.is_empty() {
            stream.push(TemplateToken::Literal(crate::tokenizer::unwrap_quoted(
                &token,
            )));
        }

        if closes {
            stream.push(TemplateToken::OptionalClose);
        }
    }
    stream
}

/// A variable referenced by a template, with whether it sits inside an
/// optional block (and so may be absent from a successful result).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableUsage {
    pub path: String,
    pub optional: bool,
}

/// Structural summary of a parsed template.
///
/// Lists the variables a match can bind, the presence flags it always
/// binds, the literal texts the input must contain, and how deeply
/// optional blocks nest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateAnalysis {
    pub variables: Vec<VariableUsage>,
    pub presence_flags: Vec<String>,
    pub literals: Vec<String>,
    pub max_optional_depth: usize,
}

pub(crate) fn analyze_tokens(tokens: &[String]) -> TemplateAnalysis {
    let mut analysis = TemplateAnalysis::default();
    let mut depth = 0usize;
    for token in structure(tokens) {
        match token {
            TemplateToken::OptionalOpen => {
                depth += 1;
                analysis.max_optional_depth = analysis.max_optional_depth.max(depth);
            }
            TemplateToken::OptionalClose => depth = depth.saturating_sub(1),
            TemplateToken::PresenceFlag(name) => analysis.presence_flags.push(name),
            TemplateToken::Literal(text) => analysis.literals.push(text),
            TemplateToken::Variable(path) => analysis.variables.push(VariableUsage {
                path,
                optional: depth > 0,
            }),
        }
    }
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::shorthand_tokenizer;

    fn analyze(template: &str) -> TemplateAnalysis {
        let tokens = shorthand_tokenizer(template).tokens().unwrap();
        analyze_tokens(&tokens)
    }

    #[test]
    fn lists_variables_flags_and_literals() {
        let analysis = analyze("[ ?${type_set} ${sensor.type} ] ${sensor.name} \"=\" ${value}");
        assert_eq!(
            analysis.variables,
            vec![
                VariableUsage {
                    path: "sensor.type".into(),
                    optional: true
                },
                VariableUsage {
                    path: "sensor.name".into(),
                    optional: false
                },
                VariableUsage {
                    path: "value".into(),
                    optional: false
                },
            ]
        );
        assert_eq!(analysis.presence_flags, vec!["type_set"]);
        assert_eq!(analysis.literals, vec!["="]);
        assert_eq!(analysis.max_optional_depth, 1);
    }

    #[test]
    fn tracks_nesting_depth() {
        let analysis = analyze("[ ${a} [ ${b} ] ] ${c}");
        assert_eq!(analysis.max_optional_depth, 2);
        let optional: Vec<bool> = analysis.variables.iter().map(|v| v.optional).collect();
        assert_eq!(optional, vec![true, true, false]);
    }

    #[test]
    fn handles_glued_brackets() {
        let analysis = analyze("[?${f} ${a}] ${b}");
        assert_eq!(analysis.presence_flags, vec!["f"]);
        assert_eq!(analysis.variables.len(), 2);
        assert!(analysis.variables[0].optional);
        assert!(!analysis.variables[1].optional);
    }
}
