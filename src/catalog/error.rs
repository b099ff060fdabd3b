//! Error types for metadata catalogs

use thiserror::Error;

/// Errors raised while building or querying a metadata catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Lookup of a variable the catalog does not hold
    ///
    /// Carries the name exactly as the caller spelled it.
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// Two variables share a name after case folding
    #[error("Duplicate variable: {0}")]
    DuplicateVariable(String),

    /// A variable has a blank name
    #[error("Blank variable name")]
    BlankVariableName,

    /// A variable does not have exactly one type
    #[error("Variable {variable} has {count} types set, expected exactly one")]
    AmbiguousType { variable: String, count: usize },

    /// One or more variables failed the completeness check
    #[error("Incomplete metadata for variables: {}", .variables.join(", "))]
    Incomplete { variables: Vec<String> },

    /// A temporal variable has no datetime format
    #[error("Missing datetime format for variable: {0}")]
    MissingDatetimeFormat(String),
}

impl CatalogError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::UnknownVariable(name) => format!(
                "Unknown variable: {name}\n\nHint: Check the spelling against the dictionary's variable names."
            ),
            CatalogError::Incomplete { variables } => format!(
                "Incomplete metadata for variables: {}\n\n\
                Hint: Every variable needs exactly one type, and a datetime format if it is a date, time or timestamp.",
                variables.join(", ")
            ),
            CatalogError::MissingDatetimeFormat(name) => format!(
                "Missing datetime format for variable: {name}\n\nHint: Add a format such as yyyy-MM-dd to the dictionary."
            ),
            _ => self.to_string(),
        }
    }
}
