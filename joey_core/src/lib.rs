pub mod builtin;
pub mod classify;
pub mod files_diff;
pub mod json_diff;
pub mod loader;
pub mod rules;

pub use classify::{classify, ValueType};
pub use files_diff::{DiffEvent, FilesDiffer, ProgressCallback};
pub use json_diff::{DiffOptions, JsonDiffer, PrimitiveEquality};
pub use loader::{is_json_file, is_yaml_file, load_document};
pub use rules::{CustomDiffer, DifferOutcome, Preprocessor, Resolution, Rule, RuleSet};
