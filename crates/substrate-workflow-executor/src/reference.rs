//! `${ref:stepId.field}` resolution over a step's input tree (§4.5, §9:
//! "a pure function over the deserialised input tree; do not eval untrusted
//! expressions").

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::executor::StepOutcome;

static REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{ref:([^.}]+)\.([^}]+)\}$").expect("valid regex"));

/// Replaces every string of the exact shape `${ref:stepId.field}` with
/// `results[stepId].data[field]`, provided that step succeeded. A reference
/// to a failed or unknown step, or an unknown field, keeps its literal form
/// — it does not fail the step (§4.5). Recurses through nested maps and
/// arrays; non-string, non-container values pass through unchanged.
pub fn resolve(value: &Value, results: &HashMap<String, StepOutcome>) -> Value {
    match value {
        Value::String(s) => resolve_string(s, results),
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve(v, results)).collect()),
        Value::Object(map) => {
            Value::Object(map.iter().map(|(k, v)| (k.clone(), resolve(v, results))).collect())
        }
        other => other.clone(),
    }
}

fn resolve_string(s: &str, results: &HashMap<String, StepOutcome>) -> Value {
    let Some(captures) = REF_PATTERN.captures(s) else {
        return Value::String(s.to_string());
    };
    let step_id = &captures[1];
    let field = &captures[2];

    let resolved = results
        .get(step_id)
        .filter(|outcome| outcome.succeeded())
        .and_then(|outcome| outcome.data())
        .and_then(|data| data.get(field));

    match resolved {
        Some(v) => v.clone(),
        None => Value::String(s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome_with_data(data: Value) -> StepOutcome {
        StepOutcome::Completed { data }
    }

    #[test]
    fn resolves_top_level_reference() {
        let mut results = HashMap::new();
        results.insert("a".to_string(), outcome_with_data(json!({"text": "hello"})));

        let input = json!({"prompt": "${ref:a.text}"});
        let resolved = resolve(&input, &results);
        assert_eq!(resolved, json!({"prompt": "hello"}));
    }

    #[test]
    fn unresolved_reference_keeps_literal_form() {
        let results = HashMap::new();
        let input = json!({"prompt": "${ref:missing.text}"});
        let resolved = resolve(&input, &results);
        assert_eq!(resolved, json!({"prompt": "${ref:missing.text}"}));
    }

    #[test]
    fn reference_to_failed_step_keeps_literal_form() {
        let mut results = HashMap::new();
        results.insert(
            "a".to_string(),
            StepOutcome::Failed {
                failure: crate::error::StepFailure::new(
                    crate::error::FailureCode::ServiceError,
                    "boom",
                ),
            },
        );
        let input = json!("${ref:a.text}");
        assert_eq!(resolve(&input, &results), json!("${ref:a.text}"));
    }

    #[test]
    fn recurses_through_nested_arrays_and_maps() {
        let mut results = HashMap::new();
        results.insert("a".to_string(), outcome_with_data(json!({"n": 42})));

        let input = json!({"items": [{"value": "${ref:a.n}"}, "literal"]});
        let resolved = resolve(&input, &results);
        assert_eq!(resolved, json!({"items": [{"value": 42}, "literal"]}));
    }
}
