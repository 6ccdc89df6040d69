pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    UtilsError(#[from] statement_utils::Error),

    #[error("Failed to encode the statement as JSON. (Error: {0})")]
    JsonEncodeFailed(#[from] serde_json::Error),

    #[error("Date {0} cannot be turned into a statement boundary.")]
    InvalidDate(chrono::NaiveDate),
}

impl From<statement_common::Error> for Error {
    fn from(err: statement_common::Error) -> Self {
        Self::UtilsError(err.into())
    }
}

impl Error {
    /// The fetch did not go through, running again may succeed.
    pub fn is_fetch_failure(&self) -> bool {
        match self {
            Self::UtilsError(err) => {
                err.is_connect()
                    || err.is_retryable()
                    || matches!(
                        err,
                        statement_utils::Error::FetchFailed(_)
                            | statement_utils::Error::FetchCancelled
                    )
            }
            _ => false,
        }
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::UtilsError(err) if err.is_integrity())
    }
}
