use thiserror::Error;

#[derive(Error, Debug)]
pub enum JoeyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A value outside the JSON type set reached the comparator with no
    /// extended-types differ configured.
    #[error("Unknown type \"{type_name}\" at path \"{path}\"!")]
    UnsupportedType { type_name: String, path: String },

    #[error("Invalid rule pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, JoeyError>;
