use crate::{Path, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of change carried by a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    /// Value exists only in the target
    Add,
    /// Value exists only in the source
    Remove,
    /// Value exists on both sides but differs
    Replace,
}

/// A source/target pair after preprocessing
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Processed {
    #[serde(skip_serializing_if = "Value::is_undefined")]
    pub source: Value,
    #[serde(skip_serializing_if = "Value::is_undefined")]
    pub target: Value,
}

impl Processed {
    pub fn new(source: impl Into<Value>, target: impl Into<Value>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Why a change was reported.
///
/// Custom differs author their own metadata; anything beyond `op` and
/// `reason` goes into `extra` and is flattened into `meta` on output.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<Op>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
    /// Processed values, present when a preprocessor ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preprocessor: Option<Processed>,
}

impl Meta {
    pub fn new(op: Op, reason: impl Into<String>) -> Self {
        Self {
            op: Some(op),
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Location reported in a change record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChangePath {
    /// Dot-joined rendering ("genres.0.name")
    Joined(String),
    /// Raw key sequence (["genres", "0", "name"])
    Segments(Path),
}

impl ChangePath {
    pub fn new(path: &Path, as_sequence: bool) -> Self {
        if as_sequence {
            ChangePath::Segments(path.clone())
        } else {
            ChangePath::Joined(path.joined())
        }
    }
}

impl fmt::Display for ChangePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangePath::Joined(joined) => f.write_str(joined),
            ChangePath::Segments(path) => path.fmt(f),
        }
    }
}

impl PartialEq<&str> for ChangePath {
    fn eq(&self, other: &&str) -> bool {
        match self {
            ChangePath::Joined(joined) => joined == other,
            ChangePath::Segments(_) => false,
        }
    }
}

/// One reported difference. `source` and `target` always hold the values as
/// they were before any preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub path: ChangePath,
    #[serde(skip_serializing_if = "Value::is_undefined")]
    pub source: Value,
    #[serde(skip_serializing_if = "Value::is_undefined")]
    pub target: Value,
    pub meta: Meta,
}

/// Changes found between one pair of files
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDiff {
    pub source: PathBuf,
    pub target: PathBuf,
    pub changes: Vec<Change>,
}

/// Differ configuration as stored in `joey.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Accept properties that only exist in the target
    #[serde(default)]
    pub allow_new_target_properties: bool,

    /// Report paths as key sequences instead of dot-joined strings
    #[serde(default)]
    pub return_path_as_sequence: bool,

    /// Path patterns whose subtrees are skipped
    #[serde(default)]
    pub blacklist: Vec<String>,

    #[serde(default)]
    pub preprocessors: Vec<PreprocessorRule>,

    #[serde(default)]
    pub differs: Vec<DifferRule>,

    /// Differ used for values outside the JSON type set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_types: Option<ExtendedTypesRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessorRule {
    pub pattern: String,
    #[serde(flatten)]
    pub kind: PreprocessorKind,
}

/// Built-in transforms applied to both sides before comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreprocessorKind {
    /// Replace a missing or null value with `value`. The value itself may not
    /// contain null, since TOML has no way to write it.
    Default { value: Value },
    Lowercase,
    Trim,
    /// Numbers and booleans become strings
    Stringify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferRule {
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub kind: DifferKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedTypesRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub kind: DifferKind,
}

/// Built-in comparators replacing strict equality at a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DifferKind {
    /// Numbers may grow but not shrink
    NonDecreasing,
    /// Strings compared ignoring case
    CaseInsensitive,
    /// Numbers equal when within `epsilon` of each other
    Tolerance { epsilon: f64 },
    /// Whole subtree compared at once and reported as a single change
    Strict,
}
