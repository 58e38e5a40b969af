#![allow(dead_code)]

use serde_json::{json, Map, Value};
use stack_routes::{FsDocumentReader, Resolution, ResolveResult, ResolverConfig, Stack, StackWalker};

/// Proxy-integration URI for a function logical id, in `Fn::Sub` form
pub fn integration_uri(function: &str) -> Value {
    json!({
        "Fn::Sub": format!(
            "arn:aws:apigateway:${{AWS::Region}}:lambda:path/2015-03-31/functions/${{{function}.Arn}}/invocations"
        )
    })
}

/// Plain string integration URI for a function logical id
pub fn plain_integration_uri(function: &str) -> String {
    format!(
        "arn:aws:apigateway:us-east-1:lambda:path/2015-03-31/functions/\
         arn:aws:lambda:us-east-1:123456789012:function:{function}/invocations"
    )
}

/// Swagger operation proxied to `function`
pub fn operation(function: &str) -> Value {
    json!({
        "x-amazon-apigateway-integration": {
            "type": "aws_proxy",
            "httpMethod": "POST",
            "uri": integration_uri(function)
        }
    })
}

/// Swagger 2.0 document from `(path, method, function)` triples
pub fn make_swagger(routes: &[(&str, &str, &str)]) -> Value {
    let mut paths = Map::new();
    for (path, method, function) in routes {
        let item = paths
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(item) = item {
            item.insert(method.to_string(), operation(function));
        }
    }
    json!({
        "swagger": "2.0",
        "info": {"title": "test", "version": "1.0"},
        "paths": paths
    })
}

/// Function resource with one event per `(type, path, method)` triple
pub fn function_with_events(events: &[(&str, &str, &str)]) -> Value {
    let mut map = Map::new();
    for (i, (kind, path, method)) in events.iter().enumerate() {
        map.insert(
            format!("Event{i}"),
            json!({"Type": kind, "Properties": {"Path": path, "Method": method}}),
        );
    }
    json!({
        "Type": "AWS::Serverless::Function",
        "Properties": {"Runtime": "python3.12", "Handler": "index.handler", "Events": map}
    })
}

pub fn template(resources: Value) -> Value {
    json!({"Resources": resources})
}

pub fn resolve(stacks: &[Stack]) -> ResolveResult<Resolution> {
    resolve_with(&ResolverConfig::default(), stacks)
}

pub fn resolve_with(config: &ResolverConfig, stacks: &[Stack]) -> ResolveResult<Resolution> {
    StackWalker::new(config, &FsDocumentReader).resolve(stacks)
}

/// Method names of a route, sorted
pub fn method_names(methods: &[http::Method]) -> Vec<String> {
    let mut names: Vec<String> = methods.iter().map(|m| m.as_str().to_string()).collect();
    names.sort();
    names
}

pub const ALL_METHODS: [&str; 7] = ["DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT"];
