use std::fmt::{self, Display};

use miette::Diagnostic;
use thiserror::Error;


/// Which rule a configuration value broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    Required,
    MalformedUri,
    MalformedJson,
    NotJsonObject,
    MalformedIdentifier,
}

impl Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ValidationReason::Required => "is required",
            ValidationReason::MalformedUri => "not a well-formed URI",
            ValidationReason::MalformedJson => "not valid JSON",
            ValidationReason::NotJsonObject => "not a JSON object",
            ValidationReason::MalformedIdentifier => "not a valid identifier",
        };

        f.write_str(message)
    }
}


/// The first rule violation found while validating a [`ServerConfig`][super::ServerConfig].
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ValidationError {
    #[error("field {path}: {reason}")]
    #[diagnostic(
        code(brokerpak::invalid_field),
        help("check the value of `{path}` in the brokerpak settings")
    )]
    InvalidField {
        path: String,
        reason: ValidationReason,
    },

    #[error("brokerpak name {name:?}: {reason}")]
    #[diagnostic(
        code(brokerpak::invalid_key),
        help("brokerpak names may only contain lowercase letters, digits, '-', '_' and '.', starting with a letter or digit")
    )]
    InvalidKey {
        name: String,
        reason: ValidationReason,
    },
}

impl ValidationError {
    pub(crate) fn invalid_field<P>(path: P, reason: ValidationReason) -> Self
    where
        P: Into<String>,
    {
        Self::InvalidField {
            path: path.into(),
            reason,
        }
    }

    pub(crate) fn invalid_key<N>(name: N, reason: ValidationReason) -> Self
    where
        N: Into<String>,
    {
        Self::InvalidKey {
            name: name.into(),
            reason,
        }
    }

    /// The rule that was broken.
    pub fn reason(&self) -> ValidationReason {
        match self {
            ValidationError::InvalidField { reason, .. } => *reason,
            ValidationError::InvalidKey { reason, .. } => *reason,
        }
    }
}


/// Errors returned when assembling a [`ServerConfig`][super::ServerConfig] from settings.
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("couldn't deserialize brokerpak source config: {0}")]
    #[diagnostic(
        code(brokerpak::malformed_sources),
        help("`brokerpak.sources` must be a JSON object mapping brokerpak names to source objects")
    )]
    Malformed(#[source] serde_json::Error),

    #[error("brokerpak config was invalid: {0}")]
    #[diagnostic(code(brokerpak::invalid_config))]
    Invalid(
        #[source]
        #[diagnostic_source]
        ValidationError,
    ),
}

impl From<ValidationError> for LoadError {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}
