//! # CORS Resolution Module
//!
//! Turns the CORS declarations of REST and HTTP API resources into one
//! canonical [`CorsPolicy`].
//!
//! ## Declaration Shapes
//!
//! REST APIs (`Cors` property, `Globals.Api.Cors`):
//!
//! - String: `Cors: "'*'"` sets the allowed origin only. The value must be
//!   wrapped in single quotes.
//! - Object: `AllowOrigin`, `AllowMethods`, `AllowHeaders`, `MaxAge`, each a
//!   single-quoted string.
//!
//! HTTP APIs (`CorsConfiguration` property, `Globals.HttpApi.CorsConfiguration`):
//!
//! - Boolean: `true` allows any origin and every verb; `false` disables CORS.
//! - Object: `AllowOrigins`, `AllowMethods`, `AllowHeaders` as plain lists,
//!   `MaxAge` as a number.
//!
//! ## Canonical Form
//!
//! - `allow_methods` is always populated. Missing or unresolved method lists
//!   default to every supported verb; `*` expands to the same set.
//! - `OPTIONS` is always part of `allow_methods`, and the list is sorted and
//!   comma-joined (`GET,OPTIONS,POST`).
//! - An unrecognised verb is an error, quoted or not.
//!
//! Fields still holding an intrinsic function are logged and treated as not
//! set, except that an unresolved method list still defaults to every verb.

mod parse;

use http::Method;

use crate::error::{ResolveError, ResolveResult};
use crate::methods::{self, ANY_HTTP_METHODS};
use crate::policy::CorsPolicy;
use crate::template::Declared;

pub use parse::parse_cors;

/// A CORS declaration as written on a resource or in `Globals`
#[derive(Debug, Clone, PartialEq)]
pub enum CorsDeclaration {
    /// REST API `Cors` property
    Rest(RestCors),
    /// HTTP API `CorsConfiguration` property
    Http(HttpCors),
}

/// REST CORS shapes; quoted strings are stored with their quotes removed
#[derive(Debug, Clone, PartialEq)]
pub enum RestCors {
    /// `Cors: "'origin'"`
    Origin(String),
    /// `Cors: { AllowOrigin: ..., ... }`
    Fields {
        allow_origin: Declared<String>,
        allow_methods: Declared<String>,
        allow_headers: Declared<String>,
        max_age: Declared<String>,
    },
}

/// HTTP CORS shapes
#[derive(Debug, Clone, PartialEq)]
pub enum HttpCors {
    /// `CorsConfiguration: true | false`
    Toggle(bool),
    /// `CorsConfiguration: { AllowOrigins: [...], ... }`
    Fields {
        allow_origins: Declared<Vec<String>>,
        allow_methods: Declared<Vec<String>>,
        allow_headers: Declared<Vec<String>>,
        max_age: Declared<u64>,
    },
}

/// Common intermediate both shapes reduce to before validation
struct CorsFields {
    origin: Option<String>,
    methods: Declared<Vec<String>>,
    headers: Option<String>,
    max_age: Option<String>,
}

impl CorsDeclaration {
    /// Resolve into the canonical policy
    ///
    /// Returns `Ok(None)` when the declaration switches CORS off.
    pub fn resolve(&self) -> ResolveResult<Option<CorsPolicy>> {
        let fields = match self {
            CorsDeclaration::Rest(rest) => rest.fields(),
            CorsDeclaration::Http(http) => http.fields(),
        };
        let Some(fields) = fields else {
            return Ok(None);
        };

        let allow_methods = match &fields.methods {
            Declared::Value(list) => normalize_allow_methods(list)?,
            Declared::Absent | Declared::Unresolved(_) => methods::canonical_list(&ANY_HTTP_METHODS),
        };

        Ok(Some(CorsPolicy {
            allow_origin: fields.origin,
            allow_methods: Some(allow_methods),
            allow_headers: fields.headers,
            max_age: fields.max_age,
        }))
    }
}

impl RestCors {
    fn fields(&self) -> Option<CorsFields> {
        Some(match self {
            RestCors::Origin(origin) => CorsFields {
                origin: Some(origin.clone()),
                methods: Declared::Absent,
                headers: None,
                max_age: None,
            },
            RestCors::Fields {
                allow_origin,
                allow_methods,
                allow_headers,
                max_age,
            } => CorsFields {
                origin: allow_origin.value().cloned(),
                methods: allow_methods.clone().map(|m| m.split(',').map(str::to_string).collect()),
                headers: allow_headers.value().cloned(),
                max_age: max_age.value().cloned(),
            },
        })
    }
}

impl HttpCors {
    fn fields(&self) -> Option<CorsFields> {
        match self {
            HttpCors::Toggle(false) => None,
            HttpCors::Toggle(true) => Some(CorsFields {
                origin: Some("*".to_string()),
                methods: Declared::Absent,
                headers: None,
                max_age: None,
            }),
            HttpCors::Fields {
                allow_origins,
                allow_methods,
                allow_headers,
                max_age,
            } => Some(CorsFields {
                origin: allow_origins.value().map(|o| o.join(",")),
                methods: allow_methods.clone(),
                headers: allow_headers.value().map(|h| h.join(",")),
                max_age: max_age.value().map(u64::to_string),
            }),
        }
    }
}

/// Validate and canonicalise an `AllowMethods` list
///
/// `*` selects every supported verb. `OPTIONS` is added when missing.
pub fn normalize_allow_methods(items: &[String]) -> ResolveResult<String> {
    if items.iter().any(|m| m.trim() == "*") {
        return Ok(methods::canonical_list(&ANY_HTTP_METHODS));
    }

    let mut verbs = Vec::with_capacity(items.len() + 1);
    for item in items {
        let upper = item.trim().to_ascii_uppercase();
        let verb = Method::from_bytes(upper.as_bytes())
            .ok()
            .filter(methods::is_supported)
            .ok_or_else(|| ResolveError::invalid(format!("The method {upper} is not a valid CORS method")))?;
        verbs.push(verb);
    }
    if !verbs.contains(&Method::OPTIONS) {
        verbs.push(Method::OPTIONS);
    }
    Ok(methods::canonical_list(&verbs))
}
