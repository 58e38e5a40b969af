//! Recover Lambda function logical ids from integration URIs and ARNs.
//!
//! Proxy integrations point at a function through an invocation URI of the
//! form `arn:aws:apigateway:<region>:lambda:path/<date>/functions/<arn>/invocations`,
//! usually written with `Fn::Sub` so the function ARN is `${Func.Arn}`.
//! Only references that can be tied back to a logical id in the same
//! template are recognised; everything else yields `None`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

static INVOCATION_URI_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r".*:lambda:path/.*/functions/(.*)/invocations.*")
        .expect("invocation URI regex should be valid")
});

static SUB_REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z0-9]+)\.(?:Arn|Alias)\}").expect("Fn::Sub reference regex should be valid")
});

static FUNCTION_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-]+$").expect("function name regex should be valid")
});

const FUNCTION_ARN_MARKER: &str = ":function:";

/// Placeholder ARN for a logical id referenced inside `Fn::Sub`
fn placeholder_arn(logical_id: &str) -> String {
    format!("arn:aws:lambda:${{AWS::Region}}:123456789012:function:{logical_id}")
}

/// Function logical id targeted by a proxy-integration `uri`
///
/// Accepts a plain string or an `Fn::Sub` (string or `[string, variables]`).
#[must_use]
pub fn function_name_from_integration_uri(uri: &Value) -> Option<String> {
    let resolved = resolve_sub(uri)?;
    let captures = INVOCATION_URI_REGEX.captures(&resolved);
    let Some(function_arn) = captures.and_then(|c| c.get(1)) else {
        debug!(uri = %resolved, "Integration URI does not reference a Lambda invocation");
        return None;
    };
    function_name_from_arn(function_arn.as_str())
}

/// Logical id from a `...:function:<name>[:qualifier]` ARN
///
/// Names made of stage variables or other placeholders are rejected.
#[must_use]
pub fn function_name_from_arn(arn: &str) -> Option<String> {
    let Some((_, rest)) = arn.split_once(FUNCTION_ARN_MARKER) else {
        debug!(arn = %arn, "Not a Lambda function ARN");
        return None;
    };
    let name = rest.split(':').next().unwrap_or_default();
    if FUNCTION_NAME_REGEX.is_match(name) {
        Some(name.to_string())
    } else {
        debug!(arn = %arn, "Unsupported Lambda function name in ARN");
        None
    }
}

/// Function logical id referenced by an authorizer's `FunctionArn`
///
/// Understands ARN strings, `Fn::GetAtt` (list or dotted form), `Ref` and
/// `Fn::Sub` ARN templates.
#[must_use]
pub fn function_target(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => function_name_from_arn(s),
        Value::Object(map) => {
            if let Some(att) = map.get("Fn::GetAtt") {
                return get_att_logical_id(att).map(str::to_string);
            }
            if let Some(id) = map.get("Ref").and_then(Value::as_str) {
                return Some(id.to_string());
            }
            if map.contains_key("Fn::Sub") {
                return resolve_sub(value).and_then(|arn| function_name_from_arn(&arn));
            }
            None
        }
        _ => None,
    }
}

fn get_att_logical_id(att: &Value) -> Option<&str> {
    match att {
        Value::Array(parts) => match parts.as_slice() {
            [Value::String(id), Value::String(attr)] if attr == "Arn" => Some(id.as_str()),
            _ => None,
        },
        Value::String(dotted) => dotted.strip_suffix(".Arn"),
        _ => None,
    }
}

/// Substitute logical-id references of an `Fn::Sub` with placeholder ARNs
///
/// Strings pass through unchanged. Other intrinsics are left unresolved.
fn resolve_sub(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => {
            let (template, variables) = match map.get("Fn::Sub")? {
                Value::String(s) => (s.as_str(), None),
                Value::Array(parts) => match parts.as_slice() {
                    [Value::String(s), Value::Object(vars)] => (s.as_str(), Some(vars)),
                    [Value::String(s)] => (s.as_str(), None),
                    _ => return None,
                },
                _ => return None,
            };

            let mut text = SUB_REFERENCE_REGEX
                .replace_all(template, |caps: &regex::Captures<'_>| placeholder_arn(&caps[1]))
                .into_owned();
            if let Some(vars) = variables {
                for (name, var) in vars {
                    if let Some(id) = function_target(var) {
                        text = text.replace(&format!("${{{name}}}"), &placeholder_arn(&id));
                    }
                }
            }
            Some(text)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sub_with_arn_reference() {
        let uri = json!({
            "Fn::Sub": "arn:aws:apigateway:${AWS::Region}:lambda:path/2015-03-31/functions/${NoApiEventFunction.Arn}/invocations"
        });
        assert_eq!(
            function_name_from_integration_uri(&uri).as_deref(),
            Some("NoApiEventFunction")
        );
    }

    #[test]
    fn test_sub_with_alias_reference() {
        let uri = json!({
            "Fn::Sub": "arn:aws:apigateway:${AWS::Region}:lambda:path/2015-03-31/functions/${MyFunc.Alias}/invocations"
        });
        assert_eq!(function_name_from_integration_uri(&uri).as_deref(), Some("MyFunc"));
    }

    #[test]
    fn test_sub_list_form_with_variables() {
        let uri = json!({
            "Fn::Sub": [
                "arn:aws:apigateway:us-east-1:lambda:path/2015-03-31/functions/${Target}/invocations",
                {"Target": {"Fn::GetAtt": ["ListFunc", "Arn"]}}
            ]
        });
        assert_eq!(function_name_from_integration_uri(&uri).as_deref(), Some("ListFunc"));
    }

    #[test]
    fn test_plain_string_with_alias_qualifier() {
        let uri = json!(
            "arn:aws:apigateway:us-east-1:lambda:path/2015-03-31/functions/arn:aws:lambda:us-east-1:123456789012:function:Plain:live/invocations"
        );
        assert_eq!(function_name_from_integration_uri(&uri).as_deref(), Some("Plain"));
    }

    #[test]
    fn test_stage_variable_names_are_unsupported() {
        let uri = json!(
            "arn:aws:apigateway:us-east-1:lambda:path/2015-03-31/functions/arn:aws:lambda:us-east-1:123456789012:function:${stageVariables.fn}/invocations"
        );
        assert_eq!(function_name_from_integration_uri(&uri), None);
    }

    #[test]
    fn test_non_lambda_uri() {
        assert_eq!(function_name_from_integration_uri(&json!("https://example.com")), None);
        assert_eq!(function_name_from_integration_uri(&json!({"Fn::Join": ["", []]})), None);
    }

    #[test]
    fn test_function_target_forms() {
        assert_eq!(
            function_target(&json!({"Fn::GetAtt": ["AuthFunc", "Arn"]})).as_deref(),
            Some("AuthFunc")
        );
        assert_eq!(function_target(&json!({"Fn::GetAtt": "AuthFunc.Arn"})).as_deref(), Some("AuthFunc"));
        assert_eq!(function_target(&json!({"Ref": "AuthFunc"})).as_deref(), Some("AuthFunc"));
        assert_eq!(
            function_target(&json!("arn:aws:lambda:us-east-1:123456789012:function:AuthFunc")).as_deref(),
            Some("AuthFunc")
        );
        assert_eq!(function_target(&json!("")), None);
        assert_eq!(function_target(&json!({"Fn::GetAtt": ["AuthFunc", "Name"]})), None);
    }
}
