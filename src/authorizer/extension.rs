use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{
    AuthorizerDeclaration, AuthorizerShape, HttpAuthorizer, IdentitySources, RestAuthorizer,
    DEFAULT_TOKEN_HEADER,
};
use crate::route::GatewayKind;
use crate::swagger::integration::function_name_from_integration_uri;
use crate::template::declared_string;

/// Gateway extension holding Lambda authorizer settings in a security scheme
pub const AUTHORIZER_EXTENSION_KEY: &str = "x-amazon-apigateway-authorizer";

/// Parse one security scheme carrying an `x-amazon-apigateway-authorizer` block
///
/// Schemes without the extension (API keys, OAuth flows) are not Lambda
/// authorizers and yield `None`, as do unsupported types and authorizer
/// URIs that do not point at a function of the stack.
#[must_use]
pub fn parse_extension_authorizer(
    kind: GatewayKind,
    name: &str,
    scheme: &Map<String, Value>,
) -> Option<AuthorizerDeclaration> {
    let Some(ext) = scheme.get(AUTHORIZER_EXTENSION_KEY).and_then(Value::as_object) else {
        debug!(scheme = %name, "Security scheme is not a Lambda authorizer");
        return None;
    };

    let authorizer_type = ext
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let function_name = ext.get("authorizerUri").and_then(function_name_from_integration_uri);
    let Some(function_name) = function_name else {
        warn!(authorizer = %name, "Skipping authorizer, unable to parse its authorizerUri");
        return None;
    };

    let identity = IdentitySources::Literal(identity_sources(ext.get("identitySource")));
    let shape = match (kind, authorizer_type.as_str()) {
        (GatewayKind::Rest, "token") => AuthorizerShape::Rest(RestAuthorizer::Token {
            header: scheme
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_TOKEN_HEADER)
                .to_string(),
            validation_expression: ext
                .get("identityValidationExpression")
                .and_then(Value::as_str)
                .map(str::to_string),
        }),
        (GatewayKind::Rest, "request") => AuthorizerShape::Rest(RestAuthorizer::Request { identity }),
        (GatewayKind::Http, "request") => AuthorizerShape::Http(HttpAuthorizer {
            payload_version: declared_string(ext.get("authorizerPayloadFormatVersion")),
            enable_simple_responses: ext
                .get("enableSimpleResponses")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            identity,
        }),
        (_, other) => {
            warn!(
                authorizer = %name,
                authorizer_type = %other,
                gateway = %kind,
                "Skipping authorizer with unsupported type"
            );
            return None;
        }
    };

    Some(AuthorizerDeclaration {
        name: name.to_string(),
        function_name,
        shape,
    })
}

/// `identitySource` as written: a comma-separated string or a list
fn identity_sources(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorizer::AuthorizerKind;
    use serde_json::json;

    const AUTH_URI: &str =
        "arn:aws:apigateway:us-east-1:lambda:path/2015-03-31/functions/arn:aws:lambda:us-east-1:123456789012:function:AuthFunc/invocations";

    fn scheme(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_rest_token_reads_header_from_scheme_name() {
        let s = scheme(json!({
            "type": "apiKey",
            "name": "X-Auth",
            "in": "header",
            "x-amazon-apigateway-authorizer": {
                "type": "token",
                "authorizerUri": AUTH_URI,
                "identityValidationExpression": "^x$"
            }
        }));
        let auth = parse_extension_authorizer(GatewayKind::Rest, "TokenAuth", &s)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(auth.kind, AuthorizerKind::Token);
        assert_eq!(auth.function_name, "AuthFunc");
        assert_eq!(auth.identity_sources, vec!["method.request.header.X-Auth"]);
        assert_eq!(auth.validation_expression.as_deref(), Some("^x$"));
    }

    #[test]
    fn test_rest_request_keeps_literal_sources() {
        let s = scheme(json!({
            "x-amazon-apigateway-authorizer": {
                "type": "REQUEST",
                "authorizerUri": AUTH_URI,
                "identitySource": "method.request.header.a, method.request.querystring.b"
            }
        }));
        let auth = parse_extension_authorizer(GatewayKind::Rest, "ReqAuth", &s)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(
            auth.identity_sources,
            vec!["method.request.header.a", "method.request.querystring.b"]
        );
    }

    #[test]
    fn test_http_request_validates_payload_version() {
        let s = scheme(json!({
            "x-amazon-apigateway-authorizer": {
                "type": "request",
                "authorizerUri": AUTH_URI,
                "identitySource": "$request.header.Authorization",
                "enableSimpleResponses": true
            }
        }));
        let decl = parse_extension_authorizer(GatewayKind::Http, "HttpAuth", &s).unwrap();
        let err = decl.validate().unwrap_err();
        assert!(err.to_string().contains("'HttpAuth' must contain a valid"));
    }

    #[test]
    fn test_non_lambda_and_unsupported_schemes_are_skipped() {
        let api_key = scheme(json!({"type": "apiKey", "name": "x-api-key", "in": "header"}));
        assert!(parse_extension_authorizer(GatewayKind::Rest, "ApiKey", &api_key).is_none());

        let http_token = scheme(json!({
            "x-amazon-apigateway-authorizer": {"type": "token", "authorizerUri": AUTH_URI}
        }));
        assert!(parse_extension_authorizer(GatewayKind::Http, "Tok", &http_token).is_none());

        let bad_uri = scheme(json!({
            "x-amazon-apigateway-authorizer": {"type": "request", "authorizerUri": "https://auth"}
        }));
        assert!(parse_extension_authorizer(GatewayKind::Rest, "Bad", &bad_uri).is_none());
    }
}
