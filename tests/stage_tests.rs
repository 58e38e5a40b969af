#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use serde_json::{json, Value};
use stack_routes::{GatewayKind, Stack};
use std::collections::BTreeMap;

fn api(stage: &str, variables: Option<Value>, routes: &[(&str, &str, &str)]) -> Value {
    let mut props = json!({"StageName": stage, "DefinitionBody": make_swagger(routes)});
    if let Some(vars) = variables {
        props["Variables"] = vars;
    }
    json!({"Type": "AWS::Serverless::Api", "Properties": props})
}

#[test]
fn test_stage_name_defaults_to_prod() {
    let root = template(json!({
        "MyApi": {"Type": "AWS::Serverless::Api", "Properties": {"DefinitionBody": make_swagger(&[("/p", "get", "F")])}}
    }));
    let resolution = resolve(&[Stack::root(&root)]).unwrap();
    assert_eq!(resolution.policy.stage_name, "Prod");
    assert_eq!(resolution.policy.stage_variables, None);
}

#[test]
fn test_stage_variables_are_captured() {
    let root = template(json!({
        "MyApi": api("dev", Some(json!({"table": "items", "mode": "debug"})), &[("/p", "get", "F")])
    }));
    let resolution = resolve(&[Stack::root(&root)]).unwrap();

    let expected: BTreeMap<String, String> = [("mode", "debug"), ("table", "items")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(resolution.policy.stage_name, "dev");
    assert_eq!(resolution.policy.stage_variables, Some(expected));
}

#[test]
fn test_http_api_reads_stage_variables_property() {
    let root = template(json!({
        "MyHttpApi": {
            "Type": "AWS::Serverless::HttpApi",
            "Properties": {
                "StageName": "beta",
                "StageVariables": {"flag": "on"},
                "DefinitionBody": {"openapi": "3.0.1", "paths": {"/h": {"get": operation("F")}}}
            }
        }
    }));
    let resolution = resolve(&[Stack::root(&root)]).unwrap();
    assert_eq!(resolution.policy.stage_name, "beta");
    assert_eq!(
        resolution.policy.stage_variables.as_ref().and_then(|v| v.get("flag")).map(String::as_str),
        Some("on")
    );
}

#[test]
fn test_aggregate_policy_is_last_processed_api() {
    let root = template(json!({
        "First": api("Dev", Some(json!({"v": "1"})), &[("/a", "get", "FuncA")]),
        "Second": api("Production", None, &[("/b", "get", "FuncB")])
    }));
    let resolution = resolve(&[Stack::root(&root)]).unwrap();

    // routes are the union of both APIs
    let paths: Vec<&str> = resolution.routes.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, ["/a", "/b"]);
    assert_eq!(resolution.stacks.len(), 1);

    // metadata comes from the last one only
    assert_eq!(resolution.policy.stage_name, "Production");
    assert_eq!(resolution.policy.stage_variables, None);
    assert_eq!(resolution.stacks[0].policy.stage_name, "Production");

    // per-surface policies are still available
    let first = resolution
        .surfaces
        .iter()
        .find(|s| s.api_id.as_deref() == Some("First"))
        .unwrap();
    assert_eq!(first.kind, GatewayKind::Rest);
    assert_eq!(first.policy.stage_name, "Dev");
    let route_a = resolution.routes.iter().find(|r| r.path == "/a").unwrap();
    assert_eq!(resolution.policy_for(route_a).unwrap().stage_name, "Dev");
}

#[test]
fn test_aggregate_policy_spans_stacks() {
    let root = template(json!({"RootApi": api("root", None, &[("/r", "get", "RootFunc")])}));
    let child = template(json!({"ChildApi": api("child", None, &[("/c", "get", "ChildFunc")])}));
    let resolution = resolve(&[Stack::root(&root), Stack::new("Child", &child)]).unwrap();

    assert_eq!(resolution.stacks[0].policy.stage_name, "root");
    assert_eq!(resolution.stacks[1].policy.stage_name, "child");
    assert_eq!(resolution.policy.stage_name, "child");
}

#[test]
fn test_implicit_only_stack_uses_global_binary_types() {
    let root = json!({
        "Globals": {"Api": {"BinaryMediaTypes": ["image~1gif", "image~1png", "image~1png"]}},
        "Resources": {"Func": function_with_events(&[("Api", "/p", "get")])}
    });
    let resolution = resolve(&[Stack::root(&root)]).unwrap();
    assert_eq!(resolution.policy.stage_name, "Prod");
    assert_eq!(resolution.policy.binary_media_types(), ["image/gif", "image/png"]);
}

#[test]
fn test_resolution_serializes_to_json() {
    let root = template(json!({"Func": function_with_events(&[("Api", "/p", "any")])}));
    let resolution = resolve(&[Stack::root(&root)]).unwrap();
    let value = serde_json::to_value(&resolution).unwrap();

    assert_eq!(value["policy"]["stage_name"], "Prod");
    assert_eq!(value["routes"][0]["path"], "/p");
    assert_eq!(value["routes"][0]["methods"].as_array().unwrap().len(), 7);
    assert_eq!(value["stacks"][0]["stack_path"], "");
}
