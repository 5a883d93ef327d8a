//! Consolidates rusqlite and validation errors under a common error type

use std::fmt;

#[derive(Debug)]
pub enum PersistenceError {
    // No character row exists for the given name
    CharacterNotFound(String),
    // An error occurred while establishing a db connection
    DatabaseConnectionError(rusqlite::Error),
    // An error occurred when performing a database action
    DatabaseError(rusqlite::Error),
    ConversionError(String),
    OtherError(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            Self::CharacterNotFound(name) => format!("No character exists with the name {}", name),
            Self::DatabaseConnectionError(error) => error.to_string(),
            Self::DatabaseError(error) => error.to_string(),
            Self::ConversionError(error) => error.to_string(),
            Self::OtherError(error) => error.to_string(),
        })
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(error: rusqlite::Error) -> PersistenceError { PersistenceError::DatabaseError(error) }
}
