//! Declarative rules that can be stored in a config file.
//!
//! Each [`PreprocessorKind`] and [`DifferKind`] is turned into the closure
//! form the comparator works with.

use crate::json_diff::DiffOptions;
use crate::rules::{CustomDiffer, DifferOutcome, Preprocessor};
use joey_common::{DiffConfig, DifferKind, Meta, Op, Path, PreprocessorKind, Processed, Value};
use std::sync::Arc;

pub fn preprocessor(kind: &PreprocessorKind) -> Preprocessor {
    match kind.clone() {
        PreprocessorKind::Default { value } => Arc::new(move |s: &Value, t: &Value| {
            let fill = |v: &Value| match v {
                Value::Undefined | Value::Null => value.clone(),
                other => other.clone(),
            };
            Processed::new(fill(s), fill(t))
        }),
        PreprocessorKind::Lowercase => per_side(|v| match v {
            Value::String(s) => Value::String(s.to_lowercase()),
            other => other.clone(),
        }),
        PreprocessorKind::Trim => per_side(|v| match v {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other.clone(),
        }),
        PreprocessorKind::Stringify => per_side(|v| match v {
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            other => other.clone(),
        }),
    }
}

fn per_side<F>(transform: F) -> Preprocessor
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    Arc::new(move |s: &Value, t: &Value| Processed::new(transform(s), transform(t)))
}

pub fn default_reason(kind: &DifferKind) -> &'static str {
    match kind {
        DifferKind::NonDecreasing => "value decreased",
        DifferKind::CaseInsensitive => "different strings ignoring case",
        DifferKind::Tolerance { .. } => "difference exceeds tolerance",
        DifferKind::Strict => "different values",
    }
}

pub fn differ(kind: &DifferKind, reason: Option<&str>) -> CustomDiffer {
    let reason = reason.unwrap_or_else(|| default_reason(kind)).to_string();

    match kind.clone() {
        DifferKind::NonDecreasing => Arc::new(move |s: &Value, t: &Value, _: &Path| {
            match (s.as_f64(), t.as_f64()) {
                (Some(source), Some(target)) if source <= target => DifferOutcome::equal(),
                (Some(source), Some(target)) => DifferOutcome::different(
                    Meta::new(Op::Replace, reason.clone()).with_extra("delta", delta(s, t, source, target)),
                ),
                _ => strict(s, t, &reason),
            }
        }),
        DifferKind::CaseInsensitive => Arc::new(move |s: &Value, t: &Value, _: &Path| {
            match (s.as_str(), t.as_str()) {
                (Some(source), Some(target)) if source.to_lowercase() == target.to_lowercase() => {
                    DifferOutcome::equal()
                }
                (Some(_), Some(_)) => DifferOutcome::different(Meta::new(Op::Replace, reason.clone())),
                _ => strict(s, t, &reason),
            }
        }),
        DifferKind::Tolerance { epsilon } => Arc::new(move |s: &Value, t: &Value, _: &Path| {
            match (s.as_f64(), t.as_f64()) {
                (Some(source), Some(target)) if (target - source).abs() <= epsilon => {
                    DifferOutcome::equal()
                }
                (Some(source), Some(target)) => DifferOutcome::different(
                    Meta::new(Op::Replace, reason.clone()).with_extra("delta", delta(s, t, source, target)),
                ),
                _ => strict(s, t, &reason),
            }
        }),
        DifferKind::Strict => Arc::new(move |s: &Value, t: &Value, _: &Path| strict(s, t, &reason)),
    }
}

/// Deep equality with the generic add/remove/replace op
fn strict(source: &Value, target: &Value, reason: &str) -> DifferOutcome {
    if source.deep_eq(target) {
        return DifferOutcome::equal();
    }

    let op = match (source, target) {
        (Value::Undefined, _) => Op::Add,
        (_, Value::Undefined) => Op::Remove,
        _ => Op::Replace,
    };
    DifferOutcome::different(Meta::new(op, reason))
}

/// `target - source`, kept integral when both sides are integers
fn delta(source: &Value, target: &Value, source_f: f64, target_f: f64) -> serde_json::Value {
    if let (Value::Number(s), Value::Number(t)) = (source, target) {
        if let (Some(s), Some(t)) = (s.as_i64(), t.as_i64()) {
            if let Some(d) = t.checked_sub(s) {
                return d.into();
            }
        }
    }

    serde_json::Number::from_f64(target_f - source_f)
        .map_or(serde_json::Value::Null, serde_json::Value::Number)
}

impl DiffOptions {
    /// Build options from the declarative configuration
    pub fn from_config(config: &DiffConfig) -> Self {
        let mut options = DiffOptions::new()
            .with_blacklist(config.blacklist.iter().cloned())
            .with_allow_new_target_properties(config.allow_new_target_properties)
            .with_path_as_sequence(config.return_path_as_sequence);

        options.preprocessors = config
            .preprocessors
            .iter()
            .map(|rule| (rule.pattern.clone(), preprocessor(&rule.kind)))
            .collect();

        options.differs = config
            .differs
            .iter()
            .map(|rule| (rule.pattern.clone(), differ(&rule.kind, rule.reason.as_deref())))
            .collect();

        options.extended_types_differ = config
            .extended_types
            .as_ref()
            .map(|rule| differ(&rule.kind, rule.reason.as_deref()));

        options
    }
}
