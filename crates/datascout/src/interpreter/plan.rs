//! Parsing of plan text into a [`CleaningPlan`].

use crate::types::{CleaningPlan, CleaningStep};
use serde_json::{Map, Value};

/// Parse plan text.
///
/// Returns `None` when the text is not JSON at all. Anything that is JSON is
/// accepted leniently: a missing or non-list `cleaning_plan` gives an empty
/// plan, and steps that are not objects, or whose `operation` is not a
/// string, are kept as steps without an operation so they can be reported
/// as skipped.
pub fn parse_plan(text: &str) -> Option<CleaningPlan> {
    let value: Value = serde_json::from_str(text.trim()).ok()?;

    let steps = value
        .get("cleaning_plan")
        .and_then(Value::as_array)
        .map(|steps| steps.iter().map(parse_step).collect())
        .unwrap_or_default();

    Some(CleaningPlan { steps })
}

fn parse_step(value: &Value) -> CleaningStep {
    let Some(object) = value.as_object() else {
        return CleaningStep::default();
    };

    CleaningStep {
        operation: object
            .get("operation")
            .and_then(Value::as_str)
            .map(str::to_string),
        details: object
            .get("details")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_else(Map::new),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Operation;

    #[test]
    fn test_parse_plan() {
        let plan = parse_plan(
            r#"{"cleaning_plan": [
                {"operation": "map_values", "details": {"column": "g", "mapping": {"M": "male"}}},
                {"operation": "remove_duplicates", "details": {}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.steps[0].kind(), Some(Operation::MapValues));
        assert!(plan.steps[0].detail_object("mapping").is_some());
        assert_eq!(plan.steps[1].kind(), Some(Operation::RemoveDuplicates));
    }

    #[test]
    fn test_invalid_json() {
        assert!(parse_plan("{not json").is_none());
        assert!(parse_plan("").is_none());
        assert!(parse_plan("Here is your plan: {}").is_none());
    }

    #[test]
    fn test_lenient_shapes() {
        assert!(parse_plan("[]").unwrap().is_empty());
        assert!(parse_plan(r#"{"steps": []}"#).unwrap().is_empty());
        assert!(parse_plan(r#"{"cleaning_plan": "drop everything"}"#).unwrap().is_empty());

        let plan = parse_plan(r#"{"cleaning_plan": [42, {"operation": 7}, {"operation": "x", "details": "y"}]}"#)
            .unwrap();
        assert_eq!(plan.len(), 3);
        assert!(plan.steps[0].operation.is_none());
        assert!(plan.steps[1].operation.is_none());
        assert_eq!(plan.steps[2].operation.as_deref(), Some("x"));
        assert!(plan.steps[2].details.is_empty());
    }
}
