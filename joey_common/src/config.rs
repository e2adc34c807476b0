use crate::{DiffConfig, JoeyError, PreprocessorKind, Value};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "joey.toml";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: DiffConfig,
    pub path: Option<PathBuf>,
    pub exists: bool,
}

/// Load the differ configuration.
///
/// An explicit path must point at an existing file. Without one, the file in
/// the platform config directory is used when present, defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, JoeyError> {
    let path = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(JoeyError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path.to_path_buf())
        }
        None => default_config_path(),
    };

    let Some(path) = path else {
        return Ok(LoadedConfig {
            config: DiffConfig::default(),
            path: None,
            exists: false,
        });
    };

    let exists = path.exists();
    let config = if exists {
        parse_config(&fs::read_to_string(&path)?)
            .map_err(|e| JoeyError::Config(format!("{}: {}", path.display(), e)))?
    } else {
        DiffConfig::default()
    };

    Ok(LoadedConfig {
        config,
        path: Some(path),
        exists,
    })
}

pub fn parse_config(data: &str) -> Result<DiffConfig, JoeyError> {
    toml::from_str(data).map_err(|e| JoeyError::Config(e.to_string()))
}

/// Write `config` as TOML. Fails before touching the disk when a `default`
/// preprocessor carries a null, which TOML cannot represent.
pub fn save_config(path: &Path, config: &DiffConfig) -> Result<(), JoeyError> {
    for rule in &config.preprocessors {
        if let PreprocessorKind::Default { value } = &rule.kind {
            if contains_null(value) {
                return Err(JoeyError::Config(format!(
                    "Preprocessor \"{}\": default value cannot contain null in TOML",
                    rule.pattern
                )));
            }
        }
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| JoeyError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

/// Undefined object members are dropped on output, everything else that
/// serializes as unit counts.
fn contains_null(value: &Value) -> bool {
    match value {
        Value::Null | Value::Undefined => true,
        Value::Array(items) => items.iter().any(contains_null),
        Value::Object(map) => map.values().filter(|v| !v.is_undefined()).any(contains_null),
        Value::Foreign(foreign) => contains_null(&foreign.value),
        _ => false,
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "joey", "joey").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
