//! Routes declared inline on function resources.
//!
//! Every `Api` or `HttpApi` event of an `AWS::Serverless::Function` becomes a
//! candidate route. An event may point at an explicit API resource through
//! `RestApiId` / `ApiId`; the route then belongs to that API's surface for
//! binary media types, CORS and authorizers, while still counting as an
//! implicit route when conflicts are resolved.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::methods;
use crate::route::{GatewayKind, Route, AUTHORIZER_NONE};
use crate::template::{logical_id_ref, properties};

/// Extracts candidate routes from a function's events
#[derive(Debug, Clone, Copy)]
pub struct ImplicitRouteExtractor<'a> {
    stack_path: &'a str,
    disable_authorizer: bool,
}

impl<'a> ImplicitRouteExtractor<'a> {
    #[must_use]
    pub fn new(stack_path: &'a str, disable_authorizer: bool) -> Self {
        Self {
            stack_path,
            disable_authorizer,
        }
    }

    /// Routes of one function resource, in event declaration order
    ///
    /// Events without `Path` or `Method` are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidDocument`] when an event references its
    /// API with something other than a logical id string or a `Ref`.
    pub fn extract(&self, function_id: &str, resource: &Value) -> ResolveResult<Vec<Route>> {
        let Some(events) = properties(resource)
            .and_then(|p| p.get("Events"))
            .and_then(Value::as_object)
        else {
            return Ok(Vec::new());
        };

        let mut routes = Vec::new();
        for (event_id, event) in events {
            let Some(kind) = event
                .get("Type")
                .and_then(Value::as_str)
                .and_then(GatewayKind::from_event_type)
            else {
                continue;
            };
            let empty = Map::new();
            let props = event.get("Properties").and_then(Value::as_object).unwrap_or(&empty);
            if let Some(route) = self.event_route(function_id, event_id, kind, props)? {
                routes.push(route);
            }
        }
        Ok(routes)
    }

    fn event_route(
        &self,
        function_id: &str,
        event_id: &str,
        kind: GatewayKind,
        props: &Map<String, Value>,
    ) -> ResolveResult<Option<Route>> {
        let path = props.get("Path").and_then(Value::as_str);
        let method = props.get("Method").and_then(Value::as_str);
        let (Some(path), Some(method)) = (path, method) else {
            debug!(
                function = %function_id,
                event = %event_id,
                "Skipping event without Path or Method"
            );
            return Ok(None);
        };

        let verbs = methods::expand(method);
        if verbs.is_empty() {
            return Ok(None);
        }

        let api_id = match props.get(kind.api_id_property()) {
            None | Some(Value::Null) => None,
            Some(reference) => Some(
                logical_id_ref(reference)
                    .ok_or_else(|| invalid_api_reference(kind, function_id))?
                    .to_string(),
            ),
        };

        let (authorizer_name, use_default_authorizer) = self.event_authorizer(function_id, props);

        Ok(Some(Route {
            path: path.to_string(),
            methods: verbs,
            function_name: function_id.to_string(),
            stack_path: self.stack_path.to_string(),
            event_type: kind,
            payload_format_version: match kind {
                GatewayKind::Http => props
                    .get("PayloadFormatVersion")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                GatewayKind::Rest => None,
            },
            operation_name: None,
            api_id,
            authorizer_name,
            use_default_authorizer,
            authorizer: None,
        }))
    }

    /// `Auth.Authorizer` of an event
    ///
    /// `NONE` switches authorization off, a name selects that authorizer and
    /// absence inherits the API default.
    fn event_authorizer(&self, function_id: &str, props: &Map<String, Value>) -> (Option<String>, bool) {
        if self.disable_authorizer {
            debug!(function = %function_id, "Authorizer not found or disabled, returning early");
            return (None, true);
        }
        match props
            .get("Auth")
            .and_then(|a| a.get("Authorizer"))
            .and_then(Value::as_str)
        {
            Some(AUTHORIZER_NONE) => (Some(AUTHORIZER_NONE.to_string()), false),
            Some(name) => (Some(name.to_string()), true),
            None => (None, true),
        }
    }
}

fn invalid_api_reference(kind: GatewayKind, function_id: &str) -> ResolveError {
    ResolveError::invalid(format!(
        "{} property of resource with logicalId '{function_id}' is invalid. \
         It should either be a LogicalId string or a Ref of a Logical Id string",
        kind.api_id_property()
    ))
}
