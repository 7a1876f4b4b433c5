//! Error types for dnr-trackers

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid tracker dataset: {0}")]
    InvalidDataset(#[from] serde_json::Error),

    #[error("Tracker {domain} is listed under a different key {key}")]
    DomainMismatch { key: String, domain: String },

    #[error("Invalid lookup table: {message}")]
    InvalidLookup { message: String },
}

impl From<Error> for dnr_rules::Error {
    fn from(err: Error) -> Self {
        dnr_rules::Error::generation(err.to_string())
    }
}
