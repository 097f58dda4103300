/// Core error type for the relay.
///
/// Adapter crates map their transport errors into this type so handlers can
/// tell a missing target (`NotFound`) from one that refuses us (`Forbidden`).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Error::Forbidden(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// The underlying reason without the category prefix, for user-facing text.
    pub fn detail(&self) -> &str {
        match self {
            Error::Config(m) | Error::NotFound(m) | Error::Forbidden(m) | Error::External(m) => m,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
