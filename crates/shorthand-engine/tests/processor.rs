// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use serde_json::Value;
use shorthand_engine::ShorthandTemplate;

#[test]
fn template_is_shareable_across_threads() {
    let template = Arc::new(ShorthandTemplate::parse("${name} \"=\" ${value}").unwrap());
    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let template = Arc::clone(&template);
            thread::spawn(move || {
                for round in 0..50 {
                    let input = format!("w{worker}-{round} = {round}");
                    let result = template.process(&input).unwrap();
                    assert_eq!(result["value"], round.to_string().as_str());
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
}

// -- Strategy helpers --

/// Template structure without names; names are assigned positionally so
/// variables and presence flags never collide.
#[derive(Debug, Clone)]
enum Shape {
    Variable,
    Literal(String),
    Optional { flagged: bool, body: Vec<Shape> },
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        2 => Just(Shape::Variable),
        // literal alphabet is disjoint from the value alphabet used below,
        // so a literal can never be found inside a captured token
        1 => "[n-z]{1,4}".prop_map(Shape::Literal),
    ];
    leaf.prop_recursive(2, 8, 3, |inner| {
        (any::<bool>(), prop::collection::vec(inner, 1..3))
            .prop_map(|(flagged, body)| Shape::Optional { flagged, body })
    })
}

fn arb_shapes() -> impl Strategy<Value = Vec<Shape>> {
    prop::collection::vec(arb_shape(), 1..4)
}

fn arb_value() -> impl Strategy<Value = String> {
    "[a-m]{1,6}"
}

fn template_text(shapes: &[Shape]) -> (String, usize, Vec<String>) {
    fn walk(shape: &Shape, out: &mut Vec<String>, vars: &mut usize, flags: &mut Vec<String>) {
        match shape {
            Shape::Variable => {
                out.push(format!("${{v{vars}}}"));
                *vars += 1;
            }
            Shape::Literal(text) => out.push(format!("\"{text}\"")),
            Shape::Optional { flagged, body } => {
                out.push("[".to_string());
                if *flagged {
                    let name = format!("f{}", flags.len());
                    out.push(format!("?${{{name}}}"));
                    flags.push(name);
                }
                for inner in body {
                    walk(inner, out, vars, flags);
                }
                out.push("]".to_string());
            }
        }
    }
    let mut out = Vec::new();
    let mut vars = 0;
    let mut flags = Vec::new();
    for shape in shapes {
        walk(shape, &mut out, &mut vars, &mut flags);
    }
    (out.join(" "), vars, flags)
}

proptest! {
    /// Every template drawn from the grammar parses, and its analysis sees
    /// exactly the variables and flags the generator planted.
    #[test]
    fn grammar_templates_always_parse(shapes in arb_shapes()) {
        let (source, vars, flags) = template_text(&shapes);
        let template = ShorthandTemplate::parse(&source).unwrap();
        let analysis = template.analyze();
        prop_assert_eq!(analysis.variables.len(), vars);
        prop_assert_eq!(analysis.presence_flags, flags);
    }

    /// Arbitrary input never panics, and a successful match binds every
    /// declared presence flag to a boolean and every required variable.
    #[test]
    fn matching_never_panics_and_binds_declared_keys(
        shapes in arb_shapes(),
        input in ".{0,40}",
    ) {
        let (source, _, flags) = template_text(&shapes);
        let template = ShorthandTemplate::parse(&source).unwrap();
        let analysis = template.analyze();
        if let Ok(result) = template.process(&input) {
            for flag in &flags {
                prop_assert!(
                    matches!(result.get(flag), Some(Value::Bool(_))),
                    "presence flag {flag} not bound to a boolean in {result:?}"
                );
            }
            for usage in analysis.variables.iter().filter(|usage| !usage.optional) {
                prop_assert!(
                    matches!(result.get(&usage.path), Some(Value::String(_))),
                    "required variable {} not bound in {result:?}",
                    usage.path
                );
            }
        }
    }

    /// Two runs over the same template and input agree structurally.
    #[test]
    fn matching_is_deterministic(shapes in arb_shapes(), input in ".{0,40}") {
        let (source, _, _) = template_text(&shapes);
        let template = ShorthandTemplate::parse(&source).unwrap();
        let first = template.process(&input);
        let second = template.process(&input);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            (a, b) => prop_assert!(false, "diverging outcomes: {a:?} vs {b:?}"),
        }
    }

    /// A flat template matched against an input assembled from its own
    /// pieces captures exactly the chosen values, and rendering the result
    /// reproduces the input.
    #[test]
    fn constructed_inputs_round_trip(
        pieces in prop::collection::vec(
            prop_oneof![
                arb_value().prop_map(|value| (true, value)),
                "[n-z]{1,4}".prop_map(|literal| (false, literal)),
            ],
            1..6,
        ),
    ) {
        let mut template_tokens = Vec::new();
        let mut input_tokens = Vec::new();
        let mut expected = Vec::new();
        let mut vars = 0usize;
        for (is_variable, text) in &pieces {
            if *is_variable {
                template_tokens.push(format!("${{v{vars}}}"));
                expected.push((format!("v{vars}"), text.clone()));
                vars += 1;
            } else {
                template_tokens.push(format!("\"{text}\""));
            }
            input_tokens.push(text.clone());
        }
        let template = ShorthandTemplate::parse(&template_tokens.join(" ")).unwrap();
        let input = input_tokens.join(" ");

        let result = template.process(&input).unwrap();
        prop_assert_eq!(result.len(), vars);
        for (name, value) in &expected {
            prop_assert_eq!(result.get(name), Some(&Value::String(value.clone())));
        }

        let rendered = template.render(&result).unwrap();
        prop_assert_eq!(&rendered, &input);
        prop_assert_eq!(template.process(&rendered).unwrap(), result);
    }

    /// Raw mode changes only what the terminal variable captures.
    #[test]
    fn raw_mode_only_changes_the_tail(
        head in arb_value(),
        tail in prop::collection::vec(arb_value(), 1..4),
        spacing in "[ ]{2,3}",
    ) {
        let source = "${head} ${tail}";
        let input = format!("{head} {}", tail.join(&spacing));

        let cooked = ShorthandTemplate::parse(source).unwrap();
        let raw = ShorthandTemplate::parse(source)
            .unwrap()
            .with_final_match_raw(true);

        let cooked_result = cooked.process(&input).unwrap();
        let raw_result = raw.process(&input).unwrap();

        prop_assert_eq!(&cooked_result["head"], &raw_result["head"]);
        prop_assert_eq!(&cooked_result["tail"], &Value::String(tail.join(" ")));
        prop_assert_eq!(&raw_result["tail"], &Value::String(tail.join(&spacing)));
    }
}
