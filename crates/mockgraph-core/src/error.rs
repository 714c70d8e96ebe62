use thiserror::Error;

/// Errors raised while generating a table.
///
/// Every variant is fatal to the table being built. Callers that orchestrate
/// several tables decide whether to continue with the remaining ones.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// A categorical draw was requested against a pool with no candidates.
    #[error("cannot draw from an empty pool")]
    EmptyPool,
    /// A without-replacement draw asked for more items than the pool holds.
    #[error("requested {requested} distinct items from a pool of {available}")]
    InsufficientPoolSize { requested: usize, available: usize },
    /// Numeric bounds are inverted, not finite, or admit no value at the
    /// requested precision.
    #[error("invalid range: {0}")]
    InvalidRange(String),
    /// A conditional lookup found no policy entry for the driver value.
    #[error("no policy for driver value '{value}' of field '{field}'")]
    UnknownDriverValue { field: String, value: String },
    /// No unique identifier could be allocated in the namespace.
    #[error("identifier space exhausted in namespace '{namespace}' after {attempts} attempts")]
    CapacityExhausted { namespace: String, attempts: u32 },
    /// An identifier pattern is malformed or references an unbound field.
    #[error("invalid identifier pattern: {0}")]
    InvalidPattern(String),
    /// A field plan or table spec is inconsistent.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    /// Failure while evaluating a specific field of a record.
    #[error("field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<GenerationError>,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    /// Attach the name of the field being evaluated.
    pub fn in_field(self, field: &str) -> Self {
        GenerationError::Field {
            field: field.to_string(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping field context wrappers.
    pub fn root_cause(&self) -> &GenerationError {
        match self {
            GenerationError::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Stable short code used in reports and logs.
    pub fn code(&self) -> &'static str {
        match self.root_cause() {
            GenerationError::EmptyPool => "empty_pool",
            GenerationError::InsufficientPoolSize { .. } => "insufficient_pool_size",
            GenerationError::InvalidRange(_) => "invalid_range",
            GenerationError::UnknownDriverValue { .. } => "unknown_driver_value",
            GenerationError::CapacityExhausted { .. } => "capacity_exhausted",
            GenerationError::InvalidPattern(_) => "invalid_pattern",
            GenerationError::InvalidPlan(_) => "invalid_plan",
            GenerationError::Field { .. } => "field",
            GenerationError::Io(_) => "io",
            GenerationError::Json(_) => "json",
        }
    }
}

/// Convenience alias for results returned by mockgraph crates.
pub type Result<T> = std::result::Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_cause_unwraps_nested_field_context() {
        let err = GenerationError::UnknownDriverValue {
            field: "defect_rate".to_string(),
            value: "successful".to_string(),
        }
        .in_field("avg_defect_rate")
        .in_field("outer");

        assert!(matches!(
            err.root_cause(),
            GenerationError::UnknownDriverValue { .. }
        ));
        assert_eq!(err.code(), "unknown_driver_value");
        assert_eq!(
            err.to_string(),
            "field 'outer': field 'avg_defect_rate': no policy for driver value 'successful' of field 'defect_rate'"
        );
    }
}
