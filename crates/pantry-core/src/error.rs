use thiserror::Error;

/// Rejected list registry changes. The registry is untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("A list with this name already exists: {name}")]
    DuplicateName { name: String },

    #[error("List name cannot be empty")]
    InvalidName,

    #[error("No list named {name}")]
    NotFound { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_name_mentions_the_name() {
        let err = RegistryError::DuplicateName {
            name: "Groceries".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "A list with this name already exists: Groceries"
        );
    }
}
