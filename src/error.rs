use thiserror::Error;

pub type Result<T> = std::result::Result<T, RefundError>;
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Errors surfaced to callers of the refund engine.
///
/// Setup failures (`NotFound`, `Conflict`, `Validation`, `Config`) abort
/// an operation before any ledger mutation. Gateway failures reach this
/// type only for operations outside the batch loop; inside a batch they
/// are absorbed into the failing `RefundDetail`.
#[derive(Error, Debug)]
pub enum RefundError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for RefundError {
    fn from(e: rocksdb::Error) -> Self {
        RefundError::Internal(Box::new(e))
    }
}

/// Classified failure causes from the payment gateway.
///
/// The live implementation maps the gateway's structured error body
/// (code + description) onto these variants; `Generic` is the fallback
/// bucket when no code is available.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("gateway credentials are not configured")]
    MissingCredentials,
    #[error("gateway call timed out after {0}s")]
    Timeout(u64),
    #[error("{0}")]
    Generic(String),
}
