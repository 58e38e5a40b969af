use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Stage name used when an API declares none
pub const DEFAULT_STAGE_NAME: &str = "Prod";

/// Canonical CORS policy of an API surface
///
/// `allow_methods` is a comma-joined, sorted verb list that always contains
/// `OPTIONS`. `max_age` is kept as header text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorsPolicy {
    pub allow_origin: Option<String>,
    pub allow_methods: Option<String>,
    pub allow_headers: Option<String>,
    pub max_age: Option<String>,
}

/// Stage, binary media and CORS settings of an API surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiPolicy {
    pub stage_name: String,
    pub stage_variables: Option<BTreeMap<String, String>>,
    pub binary_media_types: BTreeSet<String>,
    pub cors: Option<CorsPolicy>,
}

impl Default for ApiPolicy {
    fn default() -> Self {
        Self {
            stage_name: DEFAULT_STAGE_NAME.to_string(),
            stage_variables: None,
            binary_media_types: BTreeSet::new(),
            cors: None,
        }
    }
}

impl ApiPolicy {
    /// Binary media types as a sorted list
    #[must_use]
    pub fn binary_media_types(&self) -> Vec<&str> {
        self.binary_media_types.iter().map(String::as_str).collect()
    }
}

/// Normalise a single binary media type declaration
///
/// `~1` is the JSON-pointer escape for `/` used by the gateway extension.
/// Non-string values (unresolved intrinsics) are skipped.
#[must_use]
pub fn normalize_binary_media_type(value: &Value) -> Option<String> {
    match value.as_str() {
        Some(s) => Some(s.replace("~1", "/")),
        None => {
            debug!(value = %value, "Skipping binary media type that is not a plain string");
            None
        }
    }
}

/// Normalise a list of binary media types into `into`
pub fn collect_binary_media_types(value: Option<&Value>, into: &mut BTreeSet<String>) {
    let Some(items) = value.and_then(Value::as_array) else {
        return;
    };
    into.extend(items.iter().filter_map(normalize_binary_media_type));
}

/// Read a stage-variables mapping
///
/// Numbers and booleans are stringified; other values are dropped. An
/// undeclared mapping stays `None`.
#[must_use]
pub fn stage_variables(value: Option<&Value>) -> Option<BTreeMap<String, String>> {
    let map = value?.as_object()?;
    let vars = map
        .iter()
        .filter_map(|(k, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    debug!(variable = %k, "Skipping stage variable that is not a literal");
                    return None;
                }
            };
            Some((k.clone(), text))
        })
        .collect();
    Some(vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_binary_media_types_unescape_and_dedupe() {
        let mut types = BTreeSet::new();
        collect_binary_media_types(
            Some(&json!(["image~1gif", "image~1png", "image~1png"])),
            &mut types,
        );
        let got: Vec<&str> = types.iter().map(String::as_str).collect();
        assert_eq!(got, vec!["image/gif", "image/png"]);
    }

    #[test]
    fn test_binary_media_types_skip_intrinsics() {
        let mut types = BTreeSet::new();
        collect_binary_media_types(
            Some(&json!(["image/gif", {"Fn::If": ["c", "a", "b"]}])),
            &mut types,
        );
        assert_eq!(types.len(), 1);
    }

    #[test]
    fn test_default_policy() {
        let policy = ApiPolicy::default();
        assert_eq!(policy.stage_name, "Prod");
        assert!(policy.stage_variables.is_none());
        assert!(policy.binary_media_types().is_empty());
        assert!(policy.cors.is_none());
    }

    #[test]
    fn test_stage_variables() {
        assert!(stage_variables(None).is_none());
        let vars = stage_variables(Some(&json!({"vis": "data", "n": 3, "dyn": {"Ref": "X"}}))).unwrap();
        assert_eq!(vars.get("vis").map(String::as_str), Some("data"));
        assert_eq!(vars.get("n").map(String::as_str), Some("3"));
        assert!(!vars.contains_key("dyn"));
    }
}
