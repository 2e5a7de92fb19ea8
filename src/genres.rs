//! Serialization of the genre list stored alongside venues and artists.
//!
//! Genres live in a single text column as a JSON array of strings. The empty
//! list encodes to `[]`, which is also the column default.

/// The stored genre column could not be read back as a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenreCodecError {
    #[error("Malformed genre data {stored:?}: {reason}")]
    MalformedGenreData { stored: String, reason: String },
}

/// Encoded form of an empty genre list.
pub const EMPTY_GENRES: &str = "[]";

pub fn encode(genres: &[String]) -> String {
    // A slice of strings always serializes; fall back to the empty list anyway
    serde_json::to_string(genres).unwrap_or_else(|_| EMPTY_GENRES.to_string())
}

pub fn decode(stored: &str) -> Result<Vec<String>, GenreCodecError> {
    serde_json::from_str::<Vec<String>>(stored).map_err(|e| GenreCodecError::MalformedGenreData {
        stored: stored.to_string(),
        reason: e.to_string(),
    })
}
