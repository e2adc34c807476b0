use joey_common::{JoeyError, Value};
use std::path::Path;
use tracing::debug;

/// Read a JSON or YAML document into a [`Value`].
///
/// The format follows the file extension: `.yaml`/`.yml` are read as YAML,
/// anything else as JSON. Object member order is preserved.
pub fn load_document(path: &Path) -> Result<Value, JoeyError> {
    let content = std::fs::read_to_string(path).map_err(|e| JoeyError::Parse {
        path: path.display().to_string(),
        message: format!("Failed to read file: {}", e),
    })?;

    debug!("Loaded {} ({} bytes)", path.display(), content.len());

    if is_yaml_file(path) {
        parse_yaml(path, &content)
    } else {
        parse_json(path, &content)
    }
}

fn parse_json(path: &Path, content: &str) -> Result<Value, JoeyError> {
    let json: serde_json::Value = serde_json::from_str(content).map_err(|e| JoeyError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(Value::from(json))
}

#[cfg(feature = "yaml")]
fn parse_yaml(path: &Path, content: &str) -> Result<Value, JoeyError> {
    let yaml: serde_yml::Value = serde_yml::from_str(content).map_err(|e| JoeyError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(yaml_to_value(yaml))
}

#[cfg(not(feature = "yaml"))]
fn parse_yaml(path: &Path, _content: &str) -> Result<Value, JoeyError> {
    Err(JoeyError::InvalidInput(format!(
        "{}: YAML support is not enabled",
        path.display()
    )))
}

/// Tagged nodes become foreign values so they reach the extended types differ
#[cfg(feature = "yaml")]
fn yaml_to_value(yaml: serde_yml::Value) -> Value {
    use serde_yml::Value as YamlValue;

    match yaml {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else if let Some(f) = n.as_f64() {
                Value::from(f)
            } else {
                Value::Null
            }
        }
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_value).collect()),
        YamlValue::Mapping(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_value(v)))
                .collect(),
        ),
        YamlValue::Tagged(tagged) => {
            let tagged = *tagged;
            Value::from(joey_common::Foreign::new(
                tagged.tag.to_string(),
                yaml_to_value(tagged.value),
            ))
        }
    }
}

#[cfg(feature = "yaml")]
fn yaml_key(key: serde_yml::Value) -> String {
    use serde_yml::Value as YamlValue;

    match key {
        YamlValue::String(s) => s,
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Null => "null".to_string(),
        other => format!("{:?}", other),
    }
}

/// Check if a file path appears to be JSON based on extension
pub fn is_json_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        matches!(ext.as_str(), "json" | "jsonc" | "json5")
    } else {
        false
    }
}

/// Check if a file path appears to be YAML based on extension
pub fn is_yaml_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        matches!(ext.as_str(), "yaml" | "yml")
    } else {
        false
    }
}
