//! # Swagger Module
//!
//! Explicit API resources embed (or reference) a Swagger 2.0 / OpenAPI 3.0
//! document whose operations are bound to Lambda functions through the
//! `x-amazon-apigateway-integration` extension.
//!
//! - [`load`] obtains the document through a [`DocumentReader`]
//! - [`parse`] extracts routes, binary media types and authorizers
//! - [`integration`] maps integration URIs back to function logical ids

pub mod integration;
pub mod load;
pub mod parse;

pub use load::{load_document, DocumentReader, DocumentSource, FsDocumentReader};
pub use parse::SwaggerParser;
