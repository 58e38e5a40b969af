use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

use super::integration::function_name_from_integration_uri;
use crate::authorizer::{parse_extension_authorizer, AuthorizerDeclaration};
use crate::error::{ResolveError, ResolveResult};
use crate::methods::{self, ANY_METHOD, ANY_METHOD_EXTENSION_KEY};
use crate::policy::collect_binary_media_types;
use crate::route::{GatewayKind, Route};

/// Integration extension binding an operation to a backend
pub const INTEGRATION_EXTENSION_KEY: &str = "x-amazon-apigateway-integration";
/// Document-level binary media types extension
pub const BINARY_MEDIA_TYPES_EXTENSION_KEY: &str = "x-amazon-apigateway-binary-media-types";

const PROXY_INTEGRATION_TYPE: &str = "aws_proxy";

/// Reads routes, binary media types and authorizers out of a Swagger 2.0 or
/// OpenAPI 3.0 document
#[derive(Debug, Clone, Copy)]
pub struct SwaggerParser<'a> {
    document: &'a Value,
    stack_path: &'a str,
}

impl<'a> SwaggerParser<'a> {
    #[must_use]
    pub fn new(stack_path: &'a str, document: &'a Value) -> Self {
        Self { document, stack_path }
    }

    /// Routes bound to Lambda proxy integrations
    ///
    /// One route is emitted per path and method, in document order. Operations
    /// without a recognisable proxy integration are skipped. With
    /// `disable_authorizer` set, operation-level `security` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidDocument`] when an operation's `security`
    /// is not a list.
    pub fn routes(&self, kind: GatewayKind, disable_authorizer: bool) -> ResolveResult<Vec<Route>> {
        let Some(paths) = self.document.get("paths").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };

        let mut routes = Vec::new();
        for (path, item) in paths {
            let Some(item) = item.as_object() else {
                continue;
            };
            for (key, operation) in item {
                let Some(operation) = operation.as_object() else {
                    continue;
                };
                let method = if key == ANY_METHOD_EXTENSION_KEY { ANY_METHOD } else { key.as_str() };
                let verbs: Vec<_> = methods::expand(method)
                    .into_iter()
                    .filter(methods::is_supported)
                    .collect();
                if verbs.is_empty() {
                    continue;
                }

                let Some(integration) = proxy_integration(operation) else {
                    debug!(path = %path, method = %key, "Skipping operation without a Lambda proxy integration");
                    continue;
                };
                let Some(function_name) = integration.get("uri").and_then(function_name_from_integration_uri) else {
                    debug!(
                        path = %path,
                        method = %key,
                        "Skipping operation, unable to parse the Lambda function from the integration URI"
                    );
                    continue;
                };

                let (authorizer_name, use_default_authorizer) = if disable_authorizer {
                    (None, true)
                } else {
                    operation_authorizer(path, key, operation)?
                };

                routes.push(Route {
                    path: path.clone(),
                    methods: verbs,
                    function_name,
                    stack_path: self.stack_path.to_string(),
                    event_type: kind,
                    payload_format_version: string_field(integration, "payloadFormatVersion"),
                    operation_name: string_field(operation, "operationId"),
                    api_id: None,
                    authorizer_name,
                    use_default_authorizer,
                    authorizer: None,
                });
            }
        }
        Ok(routes)
    }

    /// Document-level binary media types, `~1` unescaped
    #[must_use]
    pub fn binary_media_types(&self) -> BTreeSet<String> {
        let mut types = BTreeSet::new();
        collect_binary_media_types(self.document.get(BINARY_MEDIA_TYPES_EXTENSION_KEY), &mut types);
        types
    }

    /// Lambda authorizers declared as security schemes
    ///
    /// Swagger `2.x` documents keep them under `securityDefinitions`, OpenAPI
    /// `3.x` under `components.securitySchemes`. Documents with neither
    /// version marker yield nothing.
    #[must_use]
    pub fn authorizers(&self, kind: GatewayKind) -> Vec<AuthorizerDeclaration> {
        let Some(schemes) = self.security_schemes() else {
            return Vec::new();
        };
        schemes
            .iter()
            .filter_map(|(name, scheme)| {
                scheme
                    .as_object()
                    .and_then(|s| parse_extension_authorizer(kind, name, s))
            })
            .collect()
    }

    /// Authorizer named by the first entry of the top-level `security` list
    #[must_use]
    pub fn default_authorizer(&self) -> Option<String> {
        first_security_name(self.document.get("security")?.as_array()?)
    }

    fn security_schemes(&self) -> Option<&'a Map<String, Value>> {
        let version = |key: &str| self.document.get(key).and_then(Value::as_str);
        if version("swagger").is_some_and(|v| v.starts_with("2.")) {
            return self.document.get("securityDefinitions").and_then(Value::as_object);
        }
        if version("openapi").is_some_and(|v| v.starts_with("3.")) {
            return self
                .document
                .get("components")
                .and_then(|c| c.get("securitySchemes"))
                .and_then(Value::as_object);
        }
        debug!("API document has no swagger or openapi version, skipping authorizers");
        None
    }
}

fn proxy_integration(operation: &Map<String, Value>) -> Option<&Map<String, Value>> {
    let integration = operation.get(INTEGRATION_EXTENSION_KEY)?.as_object()?;
    let kind = integration.get("type")?.as_str()?;
    kind.eq_ignore_ascii_case(PROXY_INTEGRATION_TYPE).then_some(integration)
}

/// Authorizer binding from an operation's `security` list
///
/// Absent keeps the API default; an empty list opts out of it; otherwise
/// the first requirement's scheme name is used.
fn operation_authorizer(
    path: &str,
    method: &str,
    operation: &Map<String, Value>,
) -> ResolveResult<(Option<String>, bool)> {
    match operation.get("security") {
        None | Some(Value::Null) => Ok((None, true)),
        Some(Value::Array(items)) if items.is_empty() => Ok((None, false)),
        Some(Value::Array(items)) => Ok((first_security_name(items), true)),
        Some(_) => Err(ResolveError::invalid(format!(
            "Invalid security definition for '{method}' on path '{path}', 'security' must be a list"
        ))),
    }
}

fn first_security_name(items: &[Value]) -> Option<String> {
    items.first()?.as_object()?.keys().next().cloned()
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}
