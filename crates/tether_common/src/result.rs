//! The error type for states Tether itself should never produce.

/// An internal error indicating a bug in Tether, not a user input problem.
///
/// User-facing problems (a probe that cannot be rewired, a drifted
/// parameter) travel through a diagnostic sink instead.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("net index out of sync");
        assert_eq!(err.to_string(), "internal error: net index out of sync");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "from string".to_string().into();
        assert_eq!(err.message, "from string");
    }

    #[test]
    fn boxes_as_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(InternalError::new("probe pin lost its net"));
        assert!(err.to_string().ends_with("probe pin lost its net"));
    }
}
