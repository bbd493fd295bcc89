/// Failures surfaced by the sale store and service.
#[derive(thiserror::Error, Debug)]
pub enum SaleError {
    #[error("sale not found")]
    NotFound,
    #[error("empty sale ID")]
    EmptyKey,
    #[error("sale amount must be positive")]
    InvalidAmount,
    #[error("user not found for sale")]
    UserNotFound,
    #[error("invalid sale status: {0:?}")]
    InvalidStatus(String),
    #[error("sale status must be pending to be updated")]
    SaleMustBePending,
    #[error("invalid state transition for sale: {0:?}")]
    InvalidTransition(String),
    #[error("storage failure: {0}")]
    Storage(#[from] sled::Error),
    #[error("failed to encode or decode sale record: {0}")]
    Codec(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure shape of a [`crate::user::UserLookup`].
#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<LookupError> for SaleError {
    fn from(value: LookupError) -> Self {
        match value {
            LookupError::NotFound => SaleError::UserNotFound,
            LookupError::Other(e) => SaleError::Other(e),
        }
    }
}
