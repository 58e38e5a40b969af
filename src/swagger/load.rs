use anyhow::Context;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where an explicit API resource keeps its document
///
/// `DefinitionBody` holds an inline document; `DefinitionUri` references an
/// external one. Both are handed to the reader, which prefers the body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentSource<'a> {
    pub body: Option<&'a Value>,
    pub uri: Option<&'a Value>,
}

impl<'a> DocumentSource<'a> {
    /// Read `DefinitionBody` / `DefinitionUri` from resource properties
    #[must_use]
    pub fn from_properties(properties: &'a Map<String, Value>) -> Self {
        let field = |key: &str| properties.get(key).filter(|v| !v.is_null());
        Self {
            body: field("DefinitionBody"),
            uri: field("DefinitionUri"),
        }
    }

    /// Whether neither an inline nor an external document is declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_none() && self.uri.is_none()
    }
}

/// Produces parsed API documents for explicit API resources
///
/// `Ok(None)` means no document could be obtained and the API contributes no
/// routes. Errors abort resolution and are propagated unchanged.
pub trait DocumentReader {
    fn read(&self, source: &DocumentSource<'_>, working_dir: Option<&Path>) -> anyhow::Result<Option<Value>>;
}

impl<F> DocumentReader for F
where
    F: Fn(&DocumentSource<'_>, Option<&Path>) -> anyhow::Result<Option<Value>>,
{
    fn read(&self, source: &DocumentSource<'_>, working_dir: Option<&Path>) -> anyhow::Result<Option<Value>> {
        self(source, working_dir)
    }
}

/// Reads inline bodies as-is and local `DefinitionUri` files from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocumentReader;

impl DocumentReader for FsDocumentReader {
    fn read(&self, source: &DocumentSource<'_>, working_dir: Option<&Path>) -> anyhow::Result<Option<Value>> {
        if let Some(body) = source.body {
            if body.is_object() {
                return Ok(Some(body.clone()));
            }
            warn!("DefinitionBody is not a mapping, falling back to DefinitionUri");
        }

        match source.uri {
            Some(Value::String(location)) => {
                let path = resolve_location(location, working_dir);
                debug!(path = %path.display(), "Reading API document");
                load_document(&path).map(Some)
            }
            Some(other) => {
                warn!(uri = %other, "Remote DefinitionUri locations are not supported, skipping document");
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

fn resolve_location(location: &str, working_dir: Option<&Path>) -> PathBuf {
    let path = Path::new(location);
    match working_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

/// Load a YAML or JSON document, picking the parser by file extension
pub fn load_document(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read API document {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let value = if is_yaml {
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML document {}", path.display()))?;
        yaml_to_json(yaml)
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON document {}", path.display()))?
    };
    Ok(value)
}

/// Convert parsed YAML into a JSON value, expanding short-form intrinsics
///
/// `!Ref X` becomes `{"Ref": "X"}`, `!Sub s` becomes `{"Fn::Sub": s}` and
/// `!GetAtt a.b` becomes `{"Fn::GetAtt": ["a", "b"]}`.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                let Some(key) = mapping_key(key) else {
                    continue;
                };
                map.insert(key, yaml_to_json(value));
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => {
            let serde_yaml::value::TaggedValue { tag, value } = *tagged;
            expand_intrinsic(&tag.to_string(), yaml_to_json(value))
        }
    }
}

fn mapping_key(key: serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        other => {
            debug!(key = ?other, "Skipping YAML mapping key that is not a scalar");
            None
        }
    }
}

fn expand_intrinsic(tag: &str, value: Value) -> Value {
    let name = tag.trim_start_matches('!');
    let key = match name {
        "Ref" | "Condition" => name.to_string(),
        _ => format!("Fn::{name}"),
    };
    let value = match (name, value) {
        ("GetAtt", Value::String(dotted)) => match dotted.split_once('.') {
            Some((resource, attribute)) => Value::Array(vec![resource.into(), attribute.into()]),
            None => Value::String(dotted),
        },
        (_, value) => value,
    };
    let mut map = Map::with_capacity(1);
    map.insert(key, value);
    Value::Object(map)
}
