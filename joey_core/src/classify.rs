use joey_common::{JoeyError, Path, Value};
use std::fmt;

/// The closed set of value types the differ knows how to compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Undefined,
    Null,
    Object,
    Array,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Undefined => "undefined",
            ValueType::Null => "null",
            ValueType::Object => "object",
            ValueType::Array => "array",
        }
    }

    /// Everything but objects and arrays
    pub fn is_primitive(self) -> bool {
        !matches!(self, ValueType::Object | ValueType::Array)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a value found at `path`. Foreign values are not classifiable.
pub fn classify(value: &Value, path: &Path) -> Result<ValueType, JoeyError> {
    match value {
        Value::String(_) => Ok(ValueType::String),
        Value::Number(_) => Ok(ValueType::Number),
        Value::Bool(_) => Ok(ValueType::Boolean),
        Value::Undefined => Ok(ValueType::Undefined),
        Value::Null => Ok(ValueType::Null),
        Value::Object(_) => Ok(ValueType::Object),
        Value::Array(_) => Ok(ValueType::Array),
        Value::Foreign(foreign) => Err(JoeyError::UnsupportedType {
            type_name: foreign.tag.clone(),
            path: path.joined(),
        }),
    }
}
