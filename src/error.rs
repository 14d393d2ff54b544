use thiserror::Error;

/// Conditions that stop a run before any result page is fetched. Everything
/// after that point degrades to missing data instead of failing.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("cannot resolve search location {city:?}: {reason}")]
    LocationUnresolved { city: String, reason: String },

    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),
}
