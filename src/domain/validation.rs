use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    InvalidUrl { input: String, reason: &'static str },
    InvalidId { field: &'static str, input: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::InvalidUrl { input, reason } => write!(f, "invalid url {input:?}: {reason}"),
            Self::InvalidId { field, input } => write!(f, "invalid {field}: {input}"),
        }
    }
}

impl std::error::Error for ValidationError {}
