//! # Lambda Authorizer Module
//!
//! Extracts Lambda authorizer descriptors from two places:
//!
//! - the `Auth.Authorizers` map of an API resource ([`parse_sam_authorizers`])
//! - `x-amazon-apigateway-authorizer` blocks in an API document's security
//!   schemes ([`parse_extension_authorizer`])
//!
//! Both produce an [`AuthorizerDeclaration`], tagged by gateway kind, which
//! [`AuthorizerDeclaration::validate`] turns into a [`LambdaAuthorizer`].
//!
//! ## Validation Tiers
//!
//! An entry without a usable target function, or with an unsupported
//! authorizer type, is dropped with a warning and its siblings survive.
//! HTTP authorizers with a missing or invalid payload format version, or
//! with simple responses on version `1.0`, fail the whole resolution.
//!
//! ## Identity Sources
//!
//! Request authorizers list identity sources in a fixed group order:
//! headers, query strings, context, stage variables.
//!
//! | Group | REST | HTTP |
//! |---|---|---|
//! | header | `method.request.header.<h>` | `$request.header.<h>` |
//! | query string | `method.request.querystring.<q>` | `$request.querystring.<q>` |
//! | context | `context.<c>` | `$context.<c>` |
//! | stage variable | `stageVariables.<s>` | `$stageVariables.<s>` |

mod extension;
mod sam;

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::route::GatewayKind;
use crate::template::Declared;

pub use extension::parse_extension_authorizer;
pub use sam::parse_sam_authorizers;

/// Header a REST token authorizer reads when none is declared
pub const DEFAULT_TOKEN_HEADER: &str = "Authorization";

/// Token or request authorizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizerKind {
    Token,
    Request,
}

/// Shape of the event delivered to the authorizer function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PayloadVersion {
    #[serde(rename = "1.0")]
    V1,
    #[serde(rename = "2.0")]
    V2,
}

impl PayloadVersion {
    /// Parse the literal `"1.0"` or `"2.0"`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1.0" => Some(PayloadVersion::V1),
            "2.0" => Some(PayloadVersion::V2),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadVersion::V1 => "1.0",
            PayloadVersion::V2 => "2.0",
        }
    }
}

impl fmt::Display for PayloadVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated Lambda authorizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LambdaAuthorizer {
    pub name: String,
    pub kind: AuthorizerKind,
    pub payload_version: PayloadVersion,
    /// Logical id of the authorizer function
    pub function_name: String,
    pub identity_sources: Vec<String>,
    pub validation_expression: Option<String>,
    pub use_simple_responses: bool,
}

/// Identity sources grouped the way resource templates declare them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityGroups {
    pub headers: Vec<String>,
    pub query_strings: Vec<String>,
    pub context: Vec<String>,
    pub stage_variables: Vec<String>,
}

impl IdentityGroups {
    /// Render the groups in gateway syntax, in fixed group order
    #[must_use]
    pub fn sources(&self, kind: GatewayKind) -> Vec<String> {
        let (header, query, context, stage) = match kind {
            GatewayKind::Rest => (
                "method.request.header.",
                "method.request.querystring.",
                "context.",
                "stageVariables.",
            ),
            GatewayKind::Http => (
                "$request.header.",
                "$request.querystring.",
                "$context.",
                "$stageVariables.",
            ),
        };
        let groups = [
            (header, &self.headers),
            (query, &self.query_strings),
            (context, &self.context),
            (stage, &self.stage_variables),
        ];
        groups
            .iter()
            .flat_map(|(prefix, names)| names.iter().map(move |n| format!("{prefix}{n}")))
            .collect()
    }
}

/// Where an authorizer's identity sources come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySources {
    /// Grouped names that still need gateway formatting
    Groups(IdentityGroups),
    /// Sources already written in gateway syntax
    Literal(Vec<String>),
}

impl IdentitySources {
    fn render(&self, kind: GatewayKind) -> Vec<String> {
        match self {
            IdentitySources::Groups(groups) => groups.sources(kind),
            IdentitySources::Literal(sources) => sources.clone(),
        }
    }
}

/// REST authorizer shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestAuthorizer {
    Token {
        header: String,
        validation_expression: Option<String>,
    },
    Request {
        identity: IdentitySources,
    },
}

/// HTTP authorizer fields; HTTP APIs only have request authorizers
#[derive(Debug, Clone, PartialEq)]
pub struct HttpAuthorizer {
    /// Raw payload format version; non-strings are `Unresolved`
    pub payload_version: Declared<String>,
    pub enable_simple_responses: bool,
    pub identity: IdentitySources,
}

/// An authorizer as declared, prior to validation
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizerDeclaration {
    pub name: String,
    /// Logical id of the authorizer function
    pub function_name: String,
    pub shape: AuthorizerShape,
}

/// Gateway-specific part of an [`AuthorizerDeclaration`]
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorizerShape {
    Rest(RestAuthorizer),
    Http(HttpAuthorizer),
}

impl AuthorizerDeclaration {
    /// Validate into a [`LambdaAuthorizer`]
    ///
    /// REST authorizers always use payload version `1.0`.
    pub fn validate(self) -> ResolveResult<LambdaAuthorizer> {
        let AuthorizerDeclaration {
            name,
            function_name,
            shape,
        } = self;

        let (kind, payload_version, identity_sources, validation_expression, use_simple_responses) =
            match shape {
                AuthorizerShape::Rest(RestAuthorizer::Token {
                    header,
                    validation_expression,
                }) => {
                    let groups = IdentityGroups {
                        headers: vec![header],
                        ..IdentityGroups::default()
                    };
                    (
                        AuthorizerKind::Token,
                        PayloadVersion::V1,
                        groups.sources(GatewayKind::Rest),
                        validation_expression,
                        false,
                    )
                }
                AuthorizerShape::Rest(RestAuthorizer::Request { identity }) => (
                    AuthorizerKind::Request,
                    PayloadVersion::V1,
                    identity.render(GatewayKind::Rest),
                    None,
                    false,
                ),
                AuthorizerShape::Http(http) => {
                    let version = validate_http_payload_version(&name, &http.payload_version)?;
                    if http.enable_simple_responses && version != PayloadVersion::V2 {
                        return Err(ResolveError::invalid(format!(
                            "EnableSimpleResponses must be used with the 2.0 payload format version in Lambda Authorizer '{name}'."
                        )));
                    }
                    (
                        AuthorizerKind::Request,
                        version,
                        http.identity.render(GatewayKind::Http),
                        None,
                        http.enable_simple_responses,
                    )
                }
            };

        debug!(authorizer = %name, function = %function_name, ?kind, "Extracted Lambda authorizer");
        Ok(LambdaAuthorizer {
            name,
            kind,
            payload_version,
            function_name,
            identity_sources,
            validation_expression,
            use_simple_responses,
        })
    }
}

fn validate_http_payload_version(name: &str, declared: &Declared<String>) -> ResolveResult<PayloadVersion> {
    match declared {
        Declared::Unresolved(_) => Err(ResolveError::invalid(format!(
            "'AuthorizerPayloadFormatVersion' must be of type string for Lambda Authorizer '{name}'."
        ))),
        Declared::Value(v) => PayloadVersion::parse(v).ok_or_else(|| missing_payload_version(name)),
        Declared::Absent => Err(missing_payload_version(name)),
    }
}

fn missing_payload_version(name: &str) -> ResolveError {
    ResolveError::invalid(format!(
        "Lambda Authorizer '{name}' must contain a valid 'AuthorizerPayloadFormatVersion' for HTTP APIs."
    ))
}
