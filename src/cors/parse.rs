use serde_json::{Map, Value};
use tracing::warn;

use super::{CorsDeclaration, HttpCors, RestCors};
use crate::error::{ResolveError, ResolveResult};
use crate::route::GatewayKind;
use crate::template::{declared_string, declared_string_list, Declared};

/// Parse a raw CORS declaration of the given gateway kind
///
/// Returns `Ok(None)` for absent, empty or unrecognised shapes. Unquoted REST
/// strings are rejected here, before any method validation.
pub fn parse_cors(kind: GatewayKind, value: Option<&Value>) -> ResolveResult<Option<CorsDeclaration>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match kind {
        GatewayKind::Rest => parse_rest(value).map(|c| c.map(CorsDeclaration::Rest)),
        GatewayKind::Http => Ok(parse_http(value).map(CorsDeclaration::Http)),
    }
}

fn parse_rest(value: &Value) -> ResolveResult<Option<RestCors>> {
    match value {
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => {
            let origin = unquote(s).ok_or_else(|| {
                ResolveError::invalid(
                    "Cors Properties must be a quoted string (i.e. \"'*'\" is correct, but \"*\" is not).",
                )
            })?;
            Ok(Some(RestCors::Origin(origin.to_string())))
        }
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => Ok(Some(RestCors::Fields {
            allow_origin: quoted_field(map, "AllowOrigin")?,
            allow_methods: quoted_field(map, "AllowMethods")?,
            allow_headers: quoted_field(map, "AllowHeaders")?,
            max_age: quoted_field(map, "MaxAge")?,
        })),
        Value::Null => Ok(None),
        other => {
            warn!(value = %other, "Ignoring CORS declaration that is neither a string nor an object");
            Ok(None)
        }
    }
}

fn parse_http(value: &Value) -> Option<HttpCors> {
    match value {
        Value::Bool(enabled) => Some(HttpCors::Toggle(*enabled)),
        Value::Object(map) if map.is_empty() => None,
        Value::Object(map) => Some(HttpCors::Fields {
            allow_origins: list_field(map, "AllowOrigins"),
            allow_methods: list_field(map, "AllowMethods"),
            allow_headers: list_field(map, "AllowHeaders"),
            max_age: match map.get("MaxAge") {
                None | Some(Value::Null) => Declared::Absent,
                Some(v) => v.as_u64().map_or_else(
                    || {
                        warn_unresolved("MaxAge");
                        Declared::Unresolved(v.clone())
                    },
                    Declared::Value,
                ),
            },
        }),
        Value::Null => None,
        other => {
            warn!(value = %other, "Ignoring CorsConfiguration that is neither a boolean nor an object");
            None
        }
    }
}

fn quoted_field(map: &Map<String, Value>, name: &str) -> ResolveResult<Declared<String>> {
    match declared_string(map.get(name)) {
        Declared::Value(raw) => match unquote(&raw) {
            Some(inner) => Ok(Declared::Value(inner.to_string())),
            None => Err(ResolveError::invalid(format!(
                "{name} must be a quoted string (i.e. \"'value'\" is correct, but \"value\" is not)."
            ))),
        },
        Declared::Unresolved(v) => {
            warn_unresolved(name);
            Ok(Declared::Unresolved(v))
        }
        Declared::Absent => Ok(Declared::Absent),
    }
}

fn list_field(map: &Map<String, Value>, name: &str) -> Declared<Vec<String>> {
    let declared = declared_string_list(map.get(name));
    if declared.is_unresolved() {
        warn_unresolved(name);
    }
    declared
}

fn warn_unresolved(name: &str) {
    warn!(
        property = %name,
        "CORS Property was not fully resolved. Will proceed as if the Property was not defined."
    );
}

/// Strip the single quotes REST CORS values must be wrapped in
fn unquote(value: &str) -> Option<&str> {
    value
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
}
