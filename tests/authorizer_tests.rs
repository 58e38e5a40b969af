#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use http::Method;
use serde_json::{json, Value};
use stack_routes::authorizer::{AuthorizerKind, PayloadVersion};
use stack_routes::{ResolveError, ResolverConfig, Stack};

fn linked_event(path: &str, api: &str, auth: Option<&str>) -> Value {
    let mut props = json!({"Path": path, "Method": "get", "RestApiId": {"Ref": api}});
    if let Some(name) = auth {
        props["Auth"] = json!({"Authorizer": name});
    }
    json!({"Type": "Api", "Properties": props})
}

fn rest_api_with_auth(auth: Value) -> Value {
    json!({
        "Type": "AWS::Serverless::Api",
        "Properties": {
            "StageName": "Prod",
            "DefinitionBody": make_swagger(&[("/doc", "get", "DocFunc")]),
            "Auth": auth
        }
    })
}

fn http_api_with_authorizer(authorizer: Value) -> Value {
    json!({
        "Type": "AWS::Serverless::HttpApi",
        "Properties": {
            "DefinitionBody": {"openapi": "3.0.1", "paths": {"/h": {"get": operation("HttpFunc")}}},
            "Auth": {"Authorizers": {"HttpAuth": authorizer}, "DefaultAuthorizer": "HttpAuth"}
        }
    })
}

#[test]
fn test_rest_token_authorizer_as_api_default() {
    let root = template(json!({
        "MyApi": rest_api_with_auth(json!({
            "DefaultAuthorizer": "TokenAuth",
            "Authorizers": {
                "TokenAuth": {
                    "FunctionArn": {"Fn::GetAtt": ["AuthFunc", "Arn"]},
                    "Identity": {"Header": "X-Token", "ValidationExpression": "^Bearer .+$"}
                }
            }
        })),
        "Func": {
            "Type": "AWS::Serverless::Function",
            "Properties": {"Events": {
                "Default": linked_event("/default", "MyApi", None),
                "Open": linked_event("/open", "MyApi", Some("NONE"))
            }}
        }
    }));
    let resolution = resolve(&[Stack::root(&root)]).unwrap();

    let doc = resolution.find("", "/doc", &Method::GET).unwrap();
    let authorizer = doc.authorizer.as_ref().unwrap();
    assert_eq!(authorizer.name, "TokenAuth");
    assert_eq!(authorizer.kind, AuthorizerKind::Token);
    assert_eq!(authorizer.payload_version, PayloadVersion::V1);
    assert_eq!(authorizer.function_name, "AuthFunc");
    assert_eq!(authorizer.identity_sources, ["method.request.header.X-Token"]);
    assert_eq!(authorizer.validation_expression.as_deref(), Some("^Bearer .+$"));

    let default = resolution.find("", "/default", &Method::GET).unwrap();
    assert_eq!(default.authorizer_name.as_deref(), Some("TokenAuth"));
    assert!(default.authorizer.is_some());

    let open = resolution.find("", "/open", &Method::GET).unwrap();
    assert_eq!(open.authorizer_name.as_deref(), Some("NONE"));
    assert!(open.authorizer.is_none());
}

#[test]
fn test_rest_request_identity_source_order() {
    let root = template(json!({
        "MyApi": rest_api_with_auth(json!({
            "DefaultAuthorizer": "ReqAuth",
            "Authorizers": {
                "ReqAuth": {
                    "FunctionArn": "arn:aws:lambda:us-east-1:123456789012:function:ReqFunc",
                    "FunctionPayloadType": "REQUEST",
                    "Identity": {
                        "StageVariables": ["stage"],
                        "Context": ["identity.sourceIp"],
                        "QueryStrings": ["token"],
                        "Headers": ["Auth1", "Auth2"]
                    }
                }
            }
        }))
    }));
    let resolution = resolve(&[Stack::root(&root)]).unwrap();

    let authorizer = resolution.routes[0].authorizer.as_ref().unwrap();
    assert_eq!(authorizer.kind, AuthorizerKind::Request);
    assert_eq!(authorizer.function_name, "ReqFunc");
    assert_eq!(
        authorizer.identity_sources,
        [
            "method.request.header.Auth1",
            "method.request.header.Auth2",
            "method.request.querystring.token",
            "context.identity.sourceIp",
            "stageVariables.stage"
        ]
    );
}

#[test]
fn test_http_authorizer_requires_payload_version() {
    let root = template(json!({
        "Api": http_api_with_authorizer(json!({"FunctionArn": {"Fn::GetAtt": ["AuthFunc", "Arn"]}}))
    }));
    let err = resolve(&[Stack::root(&root)]).unwrap_err();
    assert!(matches!(err, ResolveError::InvalidDocument { .. }));
    assert_eq!(
        err.to_string(),
        "Lambda Authorizer 'HttpAuth' must contain a valid 'AuthorizerPayloadFormatVersion' for HTTP APIs."
    );
}

#[test]
fn test_http_authorizer_rejects_unknown_or_non_string_version() {
    let unknown = template(json!({
        "Api": http_api_with_authorizer(json!({
            "FunctionArn": {"Fn::GetAtt": ["AuthFunc", "Arn"]},
            "AuthorizerPayloadFormatVersion": "3.0"
        }))
    }));
    assert!(resolve(&[Stack::root(&unknown)])
        .unwrap_err()
        .to_string()
        .contains("must contain a valid 'AuthorizerPayloadFormatVersion'"));

    let numeric = template(json!({
        "Api": http_api_with_authorizer(json!({
            "FunctionArn": {"Fn::GetAtt": ["AuthFunc", "Arn"]},
            "AuthorizerPayloadFormatVersion": 2.0
        }))
    }));
    assert_eq!(
        resolve(&[Stack::root(&numeric)]).unwrap_err().to_string(),
        "'AuthorizerPayloadFormatVersion' must be of type string for Lambda Authorizer 'HttpAuth'."
    );
}

#[test]
fn test_simple_responses_require_version_two() {
    let v1 = template(json!({
        "Api": http_api_with_authorizer(json!({
            "FunctionArn": {"Fn::GetAtt": ["AuthFunc", "Arn"]},
            "AuthorizerPayloadFormatVersion": "1.0",
            "EnableSimpleResponses": true
        }))
    }));
    assert_eq!(
        resolve(&[Stack::root(&v1)]).unwrap_err().to_string(),
        "EnableSimpleResponses must be used with the 2.0 payload format version in Lambda Authorizer 'HttpAuth'."
    );

    let v2 = template(json!({
        "Api": http_api_with_authorizer(json!({
            "FunctionArn": {"Fn::GetAtt": ["AuthFunc", "Arn"]},
            "AuthorizerPayloadFormatVersion": "2.0",
            "EnableSimpleResponses": true,
            "Identity": {"Headers": ["Authorization"], "Context": ["requestId"]}
        }))
    }));
    let resolution = resolve(&[Stack::root(&v2)]).unwrap();
    let authorizer = resolution.routes[0].authorizer.as_ref().unwrap();
    assert!(authorizer.use_simple_responses);
    assert_eq!(authorizer.payload_version, PayloadVersion::V2);
    assert_eq!(authorizer.identity_sources, ["$request.header.Authorization", "$context.requestId"]);
}

#[test]
fn test_authorizer_without_target_is_dropped_alone() {
    let root = template(json!({
        "MyApi": rest_api_with_auth(json!({
            "DefaultAuthorizer": "Good",
            "Authorizers": {
                "Broken": {"Identity": {"Header": "X"}},
                "Good": {"FunctionArn": {"Fn::GetAtt": ["GoodFunc", "Arn"]}}
            }
        }))
    }));
    let resolution = resolve(&[Stack::root(&root)]).unwrap();
    let authorizer = resolution.routes[0].authorizer.as_ref().unwrap();
    assert_eq!(authorizer.name, "Good");
    assert_eq!(authorizer.identity_sources, ["method.request.header.Authorization"]);
}

#[test]
fn test_unknown_authorizer_name_is_kept_without_descriptor() {
    let root = template(json!({
        "MyApi": rest_api_with_auth(json!({"Authorizers": {}})),
        "Func": {
            "Type": "AWS::Serverless::Function",
            "Properties": {"Events": {"E": linked_event("/missing", "MyApi", Some("Nope"))}}
        }
    }));
    let resolution = resolve(&[Stack::root(&root)]).unwrap();
    let route = resolution.find("", "/missing", &Method::GET).unwrap();
    assert_eq!(route.authorizer_name.as_deref(), Some("Nope"));
    assert!(route.authorizer.is_none());
}

#[test]
fn test_document_security_schemes() {
    let swagger = json!({
        "swagger": "2.0",
        "security": [{"DocAuth": []}],
        "securityDefinitions": {
            "DocAuth": {
                "type": "apiKey",
                "name": "X-Doc-Token",
                "in": "header",
                "x-amazon-apigateway-authorizer": {
                    "type": "token",
                    "authorizerUri": integration_uri("DocAuthFunc")
                }
            }
        },
        "paths": {
            "/guarded": {"get": operation("Func")},
            "/public": {"get": {
                "security": [],
                "x-amazon-apigateway-integration": operation("Func")["x-amazon-apigateway-integration"]
            }}
        }
    });
    let root = template(json!({
        "MyApi": {"Type": "AWS::Serverless::Api", "Properties": {"DefinitionBody": swagger}}
    }));
    let resolution = resolve(&[Stack::root(&root)]).unwrap();

    let guarded = resolution.find("", "/guarded", &Method::GET).unwrap();
    let authorizer = guarded.authorizer.as_ref().unwrap();
    assert_eq!(authorizer.name, "DocAuth");
    assert_eq!(authorizer.function_name, "DocAuthFunc");
    assert_eq!(authorizer.identity_sources, ["method.request.header.X-Doc-Token"]);

    let public = resolution.find("", "/public", &Method::GET).unwrap();
    assert!(public.authorizer.is_none());
}

#[test]
fn test_disabled_authorizers_skip_validation_and_linking() {
    let root = template(json!({
        "Api": http_api_with_authorizer(json!({"FunctionArn": {"Fn::GetAtt": ["AuthFunc", "Arn"]}}))
    }));
    let config = ResolverConfig::default().with_disable_authorizer(true);
    let resolution = resolve_with(&config, &[Stack::root(&root)]).unwrap();

    let route = &resolution.routes[0];
    assert!(route.authorizer.is_none());
    assert_eq!(route.authorizer_name, None);
}
