//! Stack snapshots and helpers for reading template values.
//!
//! A [`Stack`] is an immutable view over one template: its hierarchical path,
//! its `Resources` map in declaration order and its `Globals` section. The
//! helpers here classify raw template values so the resolvers can tell an
//! absent field from one that still holds an unresolved intrinsic function.

use serde_json::{Map, Value};

use crate::route::GatewayKind;

/// Resource type carrying implicit routes on its events
pub const FUNCTION_RESOURCE: &str = "AWS::Serverless::Function";
/// Resource type for an explicit REST API surface
pub const REST_API_RESOURCE: &str = "AWS::Serverless::Api";
/// Resource type for an explicit HTTP API surface
pub const HTTP_API_RESOURCE: &str = "AWS::Serverless::HttpApi";

/// One stack of the nested set, identified by its path from the root
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stack {
    /// `/`-separated path of logical ids; empty for the root stack
    pub stack_path: String,
    /// `Resources` section in declaration order
    pub resources: Map<String, Value>,
    /// `Globals` section
    pub globals: Map<String, Value>,
}

impl Stack {
    /// Build a stack from a parsed template
    ///
    /// Missing `Resources` or `Globals` sections are treated as empty.
    #[must_use]
    pub fn new(stack_path: impl Into<String>, template: &Value) -> Self {
        Self {
            stack_path: stack_path.into(),
            resources: section(template, "Resources"),
            globals: section(template, "Globals"),
        }
    }

    /// The root stack of a nested set
    #[must_use]
    pub fn root(template: &Value) -> Self {
        Self::new("", template)
    }

    /// Whether this is the root stack
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.stack_path.is_empty()
    }

    /// Global defaults for one gateway type (`Globals.Api` or `Globals.HttpApi`)
    #[must_use]
    pub fn global_section(&self, kind: GatewayKind) -> Option<&Map<String, Value>> {
        self.globals.get(kind.globals_key()).and_then(Value::as_object)
    }
}

fn section(template: &Value, key: &str) -> Map<String, Value> {
    template
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Whether `ancestor` strictly contains `descendant` in the stack hierarchy
///
/// The root (`""`) is an ancestor of every other stack. Paths are compared
/// by whole segments, so `"A"` contains `"A/B"` but not `"AB"`.
#[must_use]
pub fn is_ancestor(ancestor: &str, descendant: &str) -> bool {
    if ancestor == descendant {
        return false;
    }
    if ancestor.is_empty() {
        return true;
    }
    descendant
        .strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// A template field as it was declared
///
/// `Unresolved` holds values that still carry an intrinsic function (or any
/// other shape the resolver cannot interpret). It defaults differently from
/// `Absent` in places, so the two are never collapsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Declared<T> {
    /// Field not present (or empty)
    Absent,
    /// Field present but not a literal of the expected shape
    Unresolved(Value),
    /// Field present with a usable value
    Value(T),
}

impl<T> Declared<T> {
    /// The literal value, if any
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Declared::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the field holds an unresolved expression
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Declared::Unresolved(_))
    }

    /// Apply `f` to a literal value, keeping the other variants
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Declared<U> {
        match self {
            Declared::Absent => Declared::Absent,
            Declared::Unresolved(v) => Declared::Unresolved(v),
            Declared::Value(v) => Declared::Value(f(v)),
        }
    }
}

/// Classify a string field
///
/// Null, missing and empty strings are `Absent`; objects, arrays, numbers
/// and strings still spelling an intrinsic (`Fn::...`) are `Unresolved`.
#[must_use]
pub fn declared_string(value: Option<&Value>) -> Declared<String> {
    match value {
        None | Some(Value::Null) => Declared::Absent,
        Some(Value::String(s)) if s.is_empty() => Declared::Absent,
        Some(Value::String(s)) if s.starts_with("Fn::") => Declared::Unresolved(Value::String(s.clone())),
        Some(Value::String(s)) => Declared::Value(s.clone()),
        Some(other) => Declared::Unresolved(other.clone()),
    }
}

/// Classify a list-of-strings field
///
/// A list containing anything other than strings is `Unresolved`.
#[must_use]
pub fn declared_string_list(value: Option<&Value>) -> Declared<Vec<String>> {
    match value {
        None | Some(Value::Null) => Declared::Absent,
        Some(Value::Array(items)) if items.is_empty() => Declared::Absent,
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map_or_else(|| Declared::Unresolved(Value::Array(items.clone())), Declared::Value),
        Some(other) => Declared::Unresolved(other.clone()),
    }
}

/// Read a list of plain strings, ignoring non-string entries
#[must_use]
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Logical id referenced by a string or a `{"Ref": id}` wrapper
#[must_use]
pub fn logical_id_ref(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) if map.len() == 1 => map.get("Ref").and_then(Value::as_str),
        _ => None,
    }
}

/// `Properties` of a resource, if it is an object
#[must_use]
pub fn properties(resource: &Value) -> Option<&Map<String, Value>> {
    resource.get("Properties").and_then(Value::as_object)
}
