use super::error::ValidationError;

/// Represents a configuration that can be checked against its rules.
pub trait ValidatableConfiguration {
    /// Validate the configuration.
    /// If any rule is broken, return `Err` with the first violation found.
    fn validate(&self) -> Result<(), ValidationError>;
}


/// Represents a configuration that can be checked against its rules,
/// but where that process requires some additional context
/// (e.g. the name it is registered under, for error reporting).
pub trait ValidatableConfigurationWithContext {
    type Context: ?Sized;

    /// Validate the configuration.
    /// If any rule is broken, return `Err` with the first violation found.
    fn validate(&self, context: &Self::Context) -> Result<(), ValidationError>;
}
