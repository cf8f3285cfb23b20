//! Error types for record parsing and validation.

/// Record-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The file has no frontmatter block at all.
    #[error("missing frontmatter block (file must start with ---)")]
    MissingFrontmatter,

    /// A frontmatter line is not a `key: value` pair.
    #[error("malformed frontmatter line {line}: `{text}`")]
    MalformedLine { line: usize, text: String },

    /// A field required for the record's target stage is absent.
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    /// A timestamp field does not parse as RFC 3339.
    #[error("invalid timestamp in `{field}`: `{value}`")]
    InvalidTimestamp { field: &'static str, value: String },

    /// A field holds a value outside its recognized set.
    #[error("invalid value for `{field}`: `{value}`")]
    InvalidValue { field: &'static str, value: String },
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, RecordError>;
