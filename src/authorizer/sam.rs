use serde_json::{Map, Value};
use tracing::warn;

use super::{
    AuthorizerDeclaration, AuthorizerShape, HttpAuthorizer, IdentityGroups, IdentitySources,
    RestAuthorizer, DEFAULT_TOKEN_HEADER,
};
use crate::route::GatewayKind;
use crate::swagger::integration::function_target;
use crate::template::{declared_string, string_list};

const TOKEN_PAYLOAD: &str = "TOKEN";
const REQUEST_PAYLOAD: &str = "REQUEST";

/// Parse the `Auth.Authorizers` map of an API resource
///
/// Entries without a recognisable `FunctionArn`, or with an unsupported
/// `FunctionPayloadType`, are skipped with a warning. Validation of the
/// returned declarations happens in [`AuthorizerDeclaration::validate`].
#[must_use]
pub fn parse_sam_authorizers(kind: GatewayKind, authorizers: &Map<String, Value>) -> Vec<AuthorizerDeclaration> {
    authorizers
        .iter()
        .filter_map(|(name, props)| parse_one(kind, name, props))
        .collect()
}

fn parse_one(kind: GatewayKind, name: &str, props: &Value) -> Option<AuthorizerDeclaration> {
    let Some(props) = props.as_object() else {
        warn!(authorizer = %name, "Skipping authorizer whose properties are not a mapping");
        return None;
    };

    let Some(function_name) = props.get("FunctionArn").and_then(function_target) else {
        warn!(
            authorizer = %name,
            "Skipping authorizer, it does not contain a valid FunctionArn"
        );
        return None;
    };

    let identity = props.get("Identity").and_then(Value::as_object);
    let shape = match kind {
        GatewayKind::Rest => AuthorizerShape::Rest(rest_shape(name, props, identity)?),
        GatewayKind::Http => AuthorizerShape::Http(HttpAuthorizer {
            payload_version: declared_string(props.get("AuthorizerPayloadFormatVersion")),
            enable_simple_responses: props
                .get("EnableSimpleResponses")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            identity: IdentitySources::Groups(identity_groups(identity)),
        }),
    };

    Some(AuthorizerDeclaration {
        name: name.to_string(),
        function_name,
        shape,
    })
}

fn rest_shape(
    name: &str,
    props: &Map<String, Value>,
    identity: Option<&Map<String, Value>>,
) -> Option<RestAuthorizer> {
    let payload_type = props
        .get("FunctionPayloadType")
        .and_then(Value::as_str)
        .unwrap_or(TOKEN_PAYLOAD)
        .to_ascii_uppercase();

    match payload_type.as_str() {
        TOKEN_PAYLOAD => {
            let field = |key: &str| identity.and_then(|i| i.get(key)).and_then(Value::as_str);
            Some(RestAuthorizer::Token {
                header: field("Header").unwrap_or(DEFAULT_TOKEN_HEADER).to_string(),
                validation_expression: field("ValidationExpression").map(str::to_string),
            })
        }
        REQUEST_PAYLOAD => Some(RestAuthorizer::Request {
            identity: IdentitySources::Groups(identity_groups(identity)),
        }),
        other => {
            warn!(
                authorizer = %name,
                payload_type = %other,
                "Skipping authorizer with unsupported FunctionPayloadType"
            );
            None
        }
    }
}

fn identity_groups(identity: Option<&Map<String, Value>>) -> IdentityGroups {
    let list = |key: &str| string_list(identity.and_then(|i| i.get(key)));
    IdentityGroups {
        headers: list("Headers"),
        query_strings: list("QueryStrings"),
        context: list("Context"),
        stage_variables: list("StageVariables"),
    }
}
