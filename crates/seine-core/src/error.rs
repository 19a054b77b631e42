//! Error types for pipeline construction and template compilation.
//!
//! Construction-time problems are [`ConfigError`]s and surface synchronously
//! to whoever built the component. Per-field conversion problems at runtime
//! are never errors: converters log a warning and substitute a null value so
//! one malformed field cannot bring down the stream.

use crate::format::Format;
use thiserror::Error;

/// A pipeline component was configured inconsistently and refused to start.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A format tag name did not resolve against the known tag set.
    #[error("unknown format tag '{0}'")]
    UnknownFormat(String),

    /// A per-position lock list did not line up with the transform chain.
    #[error("lock policy lists {got} guard flags but the chain has {expected} transforms")]
    LockPolicyLength { got: usize, expected: usize },

    /// A stage's declared input format cannot consume its upstream's output.
    #[error("'{consumer}' expects {expects} records but '{producer}' produces {produces}")]
    FormatMismatch {
        producer: String,
        produces: Format,
        consumer: String,
        expects: Format,
    },

    /// Two sources' post-chain output formats share no common tag.
    #[error("source output formats {0} and {1} share no common format")]
    IncompatibleSources(Format, Format),

    /// A format template failed to compile.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// A `{name:type}` format template could not be compiled.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The placeholder's type name is not in the converter registry.
    #[error("unknown field type '{field_type}' in placeholder '{{{name}:{field_type}}}'")]
    UnknownType { name: String, field_type: String },

    /// A `{` opened a placeholder that never closed.
    #[error("unterminated placeholder starting at byte {0}")]
    Unterminated(usize),

    /// A placeholder had no `:type` suffix.
    #[error("placeholder '{{{0}}}' is missing a ':type' suffix")]
    MissingType(String),

    /// The assembled expression was rejected by the regex engine.
    #[error("template produced an invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
