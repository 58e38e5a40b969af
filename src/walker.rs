//! # Stack Walker Module
//!
//! Entry point of a resolution pass. The walker visits the caller's stacks in
//! order (root first), feeds each resource through the extractors and hands
//! the candidates to a [`RouteCollector`].
//!
//! ## Resource Types
//!
//! | Type | Contributes |
//! |---|---|
//! | `AWS::Serverless::Api` | REST surface, routes from its document |
//! | `AWS::Serverless::HttpApi` | HTTP surface, routes from its document |
//! | `AWS::Serverless::Function` | implicit routes from `Api` / `HttpApi` events |
//!
//! Resources are visited in declaration order within a stack.
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use stack_routes::{FsDocumentReader, ResolverConfig, Stack, StackWalker};
//!
//! let template = json!({
//!     "Resources": {
//!         "HelloFunction": {
//!             "Type": "AWS::Serverless::Function",
//!             "Properties": {
//!                 "Events": {"Hello": {"Type": "Api", "Properties": {"Path": "/hello", "Method": "get"}}}
//!             }
//!         }
//!     }
//! });
//!
//! let config = ResolverConfig::default();
//! let walker = StackWalker::new(&config, &FsDocumentReader);
//! let resolution = walker.resolve(&[Stack::root(&template)]).unwrap();
//! assert_eq!(resolution.routes().len(), 1);
//! ```

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::authorizer::{parse_sam_authorizers, AuthorizerDeclaration};
use crate::collector::{ExplicitApi, RouteCollector, SurfaceCors};
use crate::config::ResolverConfig;
use crate::cors::parse_cors;
use crate::error::{ResolveError, ResolveResult};
use crate::implicit::ImplicitRouteExtractor;
use crate::policy::{collect_binary_media_types, stage_variables, DEFAULT_STAGE_NAME};
use crate::resolution::Resolution;
use crate::route::GatewayKind;
use crate::swagger::{DocumentReader, DocumentSource, SwaggerParser};
use crate::template::{properties, Stack, FUNCTION_RESOURCE, HTTP_API_RESOURCE, REST_API_RESOURCE};

/// Resolves an ordered stack list into a [`Resolution`]
pub struct StackWalker<'a, R: DocumentReader + ?Sized> {
    config: &'a ResolverConfig,
    reader: &'a R,
}

impl<'a, R: DocumentReader + ?Sized> StackWalker<'a, R> {
    #[must_use]
    pub fn new(config: &'a ResolverConfig, reader: &'a R) -> Self {
        Self { config, reader }
    }

    /// Run a full resolution pass
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidDocument`] for invalid CORS or authorizer
    ///   declarations and malformed API references
    /// - [`ResolveError::DocumentRead`] when the reader fails
    pub fn resolve(&self, stacks: &[Stack]) -> ResolveResult<Resolution> {
        let mut collector = RouteCollector::new();
        for stack in stacks {
            self.walk_stack(stack, &mut collector)?;
        }
        let resolution = collector.finish();
        info!(
            stacks = resolution.stacks.len(),
            routes = resolution.routes.len(),
            "Resolved API routes"
        );
        Ok(resolution)
    }

    fn walk_stack(&self, stack: &Stack, collector: &mut RouteCollector) -> ResolveResult<()> {
        debug!(stack = %stack.stack_path, resources = stack.resources.len(), "Walking stack");
        collector.begin_stack(stack)?;

        let implicit = ImplicitRouteExtractor::new(&stack.stack_path, self.config.disable_authorizer);
        for (logical_id, resource) in &stack.resources {
            match resource.get("Type").and_then(Value::as_str) {
                Some(REST_API_RESOURCE) => {
                    self.extract_explicit_api(stack, logical_id, GatewayKind::Rest, resource, collector)?;
                }
                Some(HTTP_API_RESOURCE) => {
                    self.extract_explicit_api(stack, logical_id, GatewayKind::Http, resource, collector)?;
                }
                Some(FUNCTION_RESOURCE) => {
                    collector.add_implicit_routes(implicit.extract(logical_id, resource)?);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn extract_explicit_api(
        &self,
        stack: &Stack,
        logical_id: &str,
        kind: GatewayKind,
        resource: &Value,
        collector: &mut RouteCollector,
    ) -> ResolveResult<()> {
        let empty = serde_json::Map::new();
        let props = properties(resource).unwrap_or(&empty);

        let cors = parse_cors(kind, props.get(kind.cors_property()))?;
        let cors = SurfaceCors::from_declaration(cors.as_ref())?;

        let source = DocumentSource::from_properties(props);
        if source.is_empty() {
            debug!(
                resource = %logical_id,
                "Skipping resource. Swagger document not found in DefinitionBody and DefinitionUri"
            );
            return Ok(());
        }
        let document = self
            .reader
            .read(&source, self.config.working_dir())
            .map_err(ResolveError::DocumentRead)?
            .unwrap_or(Value::Null);

        let parser = SwaggerParser::new(&stack.stack_path, &document);
        let routes = parser.routes(kind, self.config.disable_authorizer)?;

        let mut binary_media_types = parser.binary_media_types();
        if kind == GatewayKind::Rest {
            collect_binary_media_types(props.get("BinaryMediaTypes"), &mut binary_media_types);
        }

        let (authorizers, default_authorizer) = if self.config.disable_authorizer {
            debug!(resource = %logical_id, "Authorizer not found or disabled, returning early");
            (BTreeMap::new(), None)
        } else {
            self.extract_authorizers(kind, props, &parser)?
        };

        let api = ExplicitApi {
            api_id: logical_id.to_string(),
            kind,
            stage_name: props
                .get("StageName")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_STAGE_NAME)
                .to_string(),
            stage_variables: stage_variables(props.get(kind.stage_variables_property())),
            binary_media_types,
            cors,
            authorizers,
            default_authorizer,
        };
        debug!(
            resource = %logical_id,
            gateway = %kind,
            routes = routes.len(),
            stage = %api.stage_name,
            "Extracted explicit API"
        );
        collector.add_explicit_api(&stack.stack_path, api, routes);
        Ok(())
    }

    /// Document-level authorizers overlaid with the resource's `Auth` section
    fn extract_authorizers(
        &self,
        kind: GatewayKind,
        props: &serde_json::Map<String, Value>,
        parser: &SwaggerParser<'_>,
    ) -> ResolveResult<(BTreeMap<String, crate::authorizer::LambdaAuthorizer>, Option<String>)> {
        let auth = props.get("Auth").and_then(Value::as_object);

        let mut declarations: Vec<AuthorizerDeclaration> = parser.authorizers(kind);
        if let Some(sam) = auth.and_then(|a| a.get("Authorizers")).and_then(Value::as_object) {
            declarations.extend(parse_sam_authorizers(kind, sam));
        }

        let mut authorizers = BTreeMap::new();
        for declaration in declarations {
            let authorizer = declaration.validate()?;
            authorizers.insert(authorizer.name.clone(), authorizer);
        }

        let default_authorizer = auth
            .and_then(|a| a.get("DefaultAuthorizer"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| parser.default_authorizer());

        Ok((authorizers, default_authorizer))
    }
}
