//! # stack-routes
//!
//! **stack-routes** resolves a tree of nested serverless stack templates into a
//! single, conflict-free HTTP routing table for local API-gateway emulation.
//!
//! ## Overview
//!
//! Routes reach a template in two ways: implicitly, as `Api` / `HttpApi`
//! events on function resources, and explicitly, as operations in the
//! Swagger / OpenAPI document of an `AWS::Serverless::Api` or
//! `AWS::Serverless::HttpApi` resource. Stacks nest; a child stack's routes
//! live in the same routing space as its parent's. This crate merges all of
//! them deterministically and attaches the per-surface metadata an emulator
//! needs to serve requests: stage, stage variables, binary media types, CORS
//! and Lambda authorizers.
//!
//! ## Architecture
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant Walker as walker::StackWalker
//!     participant Implicit as implicit::ImplicitRouteExtractor
//!     participant Reader as swagger::DocumentReader
//!     participant Parser as swagger::SwaggerParser
//!     participant Collector as collector::RouteCollector
//!
//!     Caller->>Walker: resolve(&[Stack])
//!     loop every stack, root first
//!         Walker->>Collector: begin_stack (Globals)
//!         Walker->>Implicit: extract(function)
//!         Implicit-->>Collector: implicit routes
//!         Walker->>Reader: read(DefinitionBody, DefinitionUri)
//!         Reader-->>Parser: document
//!         Parser-->>Collector: explicit routes + surface metadata
//!     end
//!     Walker->>Collector: finish()
//!     Collector-->>Caller: Resolution
//! ```
//!
//! - **[`methods`]** - HTTP verb normalization and `ANY` expansion
//! - **[`template`]** - stack model and intrinsic-aware value readers
//! - **[`implicit`]** - routes declared on function events
//! - **[`swagger`]** - document loading and route/authorizer parsing
//! - **[`cors`]** - CORS declarations for REST and HTTP APIs
//! - **[`authorizer`]** - Lambda authorizer declarations and validation
//! - **[`collector`]** - precedence merge and metadata attachment
//! - **[`walker`]** - the resolution pass over a stack list
//! - **[`table`]** - lock-free swappable table for re-resolution
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use stack_routes::{FsDocumentReader, ResolverConfig, Stack, StackWalker};
//!
//! let root = json!({
//!     "Resources": {
//!         "Child": {"Type": "AWS::Serverless::Application"},
//!         "RootFunction": {
//!             "Type": "AWS::Serverless::Function",
//!             "Properties": {
//!                 "Events": {"Get": {"Type": "Api", "Properties": {"Path": "/items", "Method": "any"}}}
//!             }
//!         }
//!     }
//! });
//! let child = json!({
//!     "Resources": {
//!         "ChildFunction": {
//!             "Type": "AWS::Serverless::Function",
//!             "Properties": {
//!                 "Events": {"Get": {"Type": "Api", "Properties": {"Path": "/items", "Method": "get"}}}
//!             }
//!         }
//!     }
//! });
//!
//! let config = ResolverConfig::from_env();
//! let stacks = [Stack::root(&root), Stack::new("Child", &child)];
//! let resolution = StackWalker::new(&config, &FsDocumentReader).resolve(&stacks).unwrap();
//!
//! // The root stack keeps every method of /items
//! let owner = resolution.find("", "/items", &http::Method::GET).unwrap();
//! assert_eq!(owner.function_name, "RootFunction");
//! assert_eq!(resolution.stacks.len(), 1);
//! ```
//!
//! ## Configuration
//!
//! See [`config::ResolverConfig`]. Authorizer extraction can be switched off
//! with `STACK_ROUTES_DISABLE_AUTHORIZER`; relative `DefinitionUri` values are
//! resolved against `STACK_ROUTES_WORKING_DIR`.

pub mod authorizer;
pub mod collector;
pub mod config;
pub mod cors;
pub mod error;
pub mod implicit;
pub mod methods;
pub mod policy;
pub mod resolution;
pub mod route;
pub mod swagger;
pub mod table;
pub mod template;
pub mod walker;

pub use authorizer::LambdaAuthorizer;
pub use config::ResolverConfig;
pub use error::{ResolveError, ResolveResult};
pub use policy::{ApiPolicy, CorsPolicy};
pub use resolution::{Resolution, StackRoutes, SurfacePolicy};
pub use route::{GatewayKind, Route};
pub use swagger::{DocumentReader, DocumentSource, FsDocumentReader};
pub use table::RouteTable;
pub use template::Stack;
pub use walker::StackWalker;
