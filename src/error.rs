use std::fmt;

use sea_orm::{DbErr, TransactionError};

use crate::genres::GenreCodecError;

/// The listable record kinds. Shows are addressed through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Venue,
    Artist,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Venue => write!(f, "Venue"),
            EntityKind::Artist => write!(f, "Artist"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// A required field was missing or empty on create
    #[error("Invalid submission: {0}")]
    Validation(String),
    /// A write (or a stored show) points at a record that does not exist
    #[error("{kind} {id} does not exist")]
    Referential { kind: EntityKind, id: i64 },
    /// A detail view asked for a record that does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },
    #[error("Data integrity fault: {0}")]
    DataIntegrity(#[from] GenreCodecError),
    #[error("Storage fault: {0}")]
    Storage(#[from] DbErr),
}

impl BookingError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<TransactionError<BookingError>> for BookingError {
    fn from(err: TransactionError<BookingError>) -> Self {
        match err {
            TransactionError::Connection(db_err) => BookingError::Storage(db_err),
            TransactionError::Transaction(inner) => inner,
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
