use http::Method;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::authorizer::LambdaAuthorizer;
use crate::methods;

/// Authorizer name that explicitly disables authorization for a route
pub const AUTHORIZER_NONE: &str = "NONE";

/// Gateway flavour a route or API surface belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GatewayKind {
    /// REST API (`AWS::Serverless::Api`, `Api` events)
    Rest,
    /// HTTP API (`AWS::Serverless::HttpApi`, `HttpApi` events)
    Http,
}

impl GatewayKind {
    /// Event `Type` value declaring a route of this kind
    #[must_use]
    pub fn event_type(self) -> &'static str {
        match self {
            GatewayKind::Rest => "Api",
            GatewayKind::Http => "HttpApi",
        }
    }

    /// Key of this kind's section under `Globals`
    #[must_use]
    pub fn globals_key(self) -> &'static str {
        self.event_type()
    }

    /// Event property that references the owning API resource
    #[must_use]
    pub fn api_id_property(self) -> &'static str {
        match self {
            GatewayKind::Rest => "RestApiId",
            GatewayKind::Http => "ApiId",
        }
    }

    /// Resource property holding this kind's CORS declaration
    #[must_use]
    pub fn cors_property(self) -> &'static str {
        match self {
            GatewayKind::Rest => "Cors",
            GatewayKind::Http => "CorsConfiguration",
        }
    }

    /// Resource property holding this kind's stage variables
    #[must_use]
    pub fn stage_variables_property(self) -> &'static str {
        match self {
            GatewayKind::Rest => "Variables",
            GatewayKind::Http => "StageVariables",
        }
    }

    /// Parse an event `Type` value
    #[must_use]
    pub fn from_event_type(value: &str) -> Option<Self> {
        match value {
            "Api" => Some(GatewayKind::Rest),
            "HttpApi" => Some(GatewayKind::Http),
            _ => None,
        }
    }
}

impl fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_type())
    }
}

/// A resolved route: one path, its verbs and the function answering them
///
/// Equality compares path, function, stack path and the verb *set*; the
/// supplementary metadata (gateway kind, payload version, operation name,
/// owning API and authorizer binding) does not take part.
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub path: String,
    #[serde(serialize_with = "serialize_methods")]
    pub methods: Vec<Method>,
    pub function_name: String,
    pub stack_path: String,
    pub event_type: GatewayKind,
    pub payload_format_version: Option<String>,
    pub operation_name: Option<String>,
    /// Logical id of the explicit API owning the route; `None` for the implicit surface
    pub api_id: Option<String>,
    /// `None` inherits the default, [`AUTHORIZER_NONE`] disables authorization
    pub authorizer_name: Option<String>,
    pub use_default_authorizer: bool,
    pub authorizer: Option<LambdaAuthorizer>,
}

impl Route {
    /// Create a root-stack REST route with default authorizer inheritance
    ///
    /// `ANY` is expanded and duplicate verbs are dropped.
    #[must_use]
    pub fn new<'a, I>(path: impl Into<String>, methods: I, function_name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            path: path.into(),
            methods: methods::normalize(methods),
            function_name: function_name.into(),
            stack_path: String::new(),
            event_type: GatewayKind::Rest,
            payload_format_version: None,
            operation_name: None,
            api_id: None,
            authorizer_name: None,
            use_default_authorizer: true,
            authorizer: None,
        }
    }

    #[must_use]
    pub fn with_stack_path(mut self, stack_path: impl Into<String>) -> Self {
        self.stack_path = stack_path.into();
        self
    }

    #[must_use]
    pub fn with_event_type(mut self, kind: GatewayKind) -> Self {
        self.event_type = kind;
        self
    }

    #[must_use]
    pub fn with_authorizer(mut self, name: Option<String>, use_default: bool) -> Self {
        self.authorizer_name = name;
        self.use_default_authorizer = use_default;
        self
    }

    /// Whether authorization was explicitly switched off for this route
    #[must_use]
    pub fn authorizer_disabled(&self) -> bool {
        self.authorizer_name.as_deref() == Some(AUTHORIZER_NONE)
            || (self.authorizer_name.is_none() && !self.use_default_authorizer)
    }

    /// Whether the route answers `method`
    #[must_use]
    pub fn handles(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    fn same_method_set(&self, other: &Route) -> bool {
        self.methods.iter().all(|m| other.methods.contains(m))
            && other.methods.iter().all(|m| self.methods.contains(m))
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.function_name == other.function_name
            && self.stack_path == other.stack_path
            && self.same_method_set(other)
    }
}

impl Eq for Route {}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verbs: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
        write!(f, "{} {} -> {}", verbs.join(","), self.path, self.function_name)?;
        if !self.stack_path.is_empty() {
            write!(f, " [{}]", self.stack_path)?;
        }
        Ok(())
    }
}

fn serialize_methods<S: Serializer>(methods: &[Method], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(methods.iter().map(Method::as_str))
}
