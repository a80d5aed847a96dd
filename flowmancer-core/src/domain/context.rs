//! Stage context
//!
//! The accumulating key/value state threaded through the stages of one run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields produced by one stage, merged field-by-field into the context
pub type StageOutput = Map<String, Value>;

/// Key under which a non-object input payload is exposed to stages
pub const INPUT_KEY: &str = "input";

/// Key under which the workflow definition's `config` is exposed to stages
///
/// Always owned by the definition: an input field with this name is dropped.
pub const CONFIG_KEY: &str = "_config";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    fields: Map<String, Value>,
}

impl Context {
    /// Seeds a context from an execution input and the definition config
    pub fn seed(input: &Value, config: &Value) -> Self {
        let mut fields = match input {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert(INPUT_KEY.to_string(), other.clone());
                map
            }
        };
        let config = match config {
            Value::Null => Value::Object(Map::new()),
            other => other.clone(),
        };
        fields.insert(CONFIG_KEY.to_string(), config);
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Resolves a dotted path such as `extracted.total_amount`
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.fields.get(first)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Merges a stage output, overwriting fields with the same name
    pub fn merge(mut self, output: StageOutput) -> Self {
        for (key, value) in output {
            self.fields.insert(key, value);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(value: Value) -> StageOutput {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_seed_from_object_and_config() {
        let ctx = Context::seed(&json!({"subject": "hi"}), &json!({"team": "support"}));
        assert_eq!(ctx.get("subject"), Some(&json!("hi")));
        assert_eq!(ctx.lookup("_config.team"), Some(&json!("support")));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_seed_wraps_scalar_input() {
        let ctx = Context::seed(&json!("raw text"), &Value::Null);
        assert_eq!(ctx.get(INPUT_KEY), Some(&json!("raw text")));
        assert_eq!(ctx.get(CONFIG_KEY), Some(&json!({})));
    }

    #[test]
    fn test_input_cannot_supply_config() {
        let input = json!({"amount": 5, "_config": {"approval_threshold": 1e12}});

        let ctx = Context::seed(&input, &Value::Null);
        assert_eq!(ctx.get(CONFIG_KEY), Some(&json!({})));
        assert_eq!(ctx.lookup("_config.approval_threshold"), None);

        let ctx = Context::seed(&input, &json!({"approval_threshold": 250}));
        assert_eq!(ctx.lookup("_config.approval_threshold"), Some(&json!(250)));
        assert_eq!(ctx.get("amount"), Some(&json!(5)));
    }

    #[test]
    fn test_merge_overwrites_and_keeps_upstream_fields() {
        let ctx = Context::seed(&json!({"a": 1, "b": 2}), &Value::Null)
            .merge(output(json!({"b": 3, "c": 4})));
        assert_eq!(ctx.into_value(), json!({"a": 1, "b": 3, "c": 4, "_config": {}}));
    }

    #[test]
    fn test_lookup_nested_paths() {
        let ctx = Context::seed(
            &json!({"extracted": {"lines": [{"amount": 10}]}}),
            &Value::Null,
        );
        assert_eq!(ctx.lookup("extracted.lines.0.amount"), Some(&json!(10)));
        assert_eq!(ctx.lookup("extracted.missing"), None);
        assert_eq!(ctx.lookup("extracted.lines.x"), None);
    }
}
