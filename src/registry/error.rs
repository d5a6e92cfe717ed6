//! Registry error types

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Another online session already uses this name
    NameTaken(String),
    /// No online session has this name
    NotFound(String),
    /// The session is not in the registry
    NotOnline(u64),
    /// The session is already in the registry
    AlreadyOnline(u64),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::NameTaken(name) => write!(f, "Name already taken: {}", name),
            RegistryError::NotFound(name) => write!(f, "User not found: {}", name),
            RegistryError::NotOnline(id) => write!(f, "Session {} is not online", id),
            RegistryError::AlreadyOnline(id) => write!(f, "Session {} is already online", id),
        }
    }
}

impl std::error::Error for RegistryError {}
