use thiserror::Error;
use tonic::{Code, Status};

/// Errors produced by the coordinator, the ledger backends and the RPC layer.
///
/// The variants mirror the error kinds exposed on the wire. `Conflict` is a
/// transient ledger condition that the coordinator retries internally, so
/// callers of [`crate::Coordinator`] never observe it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerdictError {
    /// Malformed or out-of-range input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The transaction id is already registered.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The transaction id is not registered.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The ledger could not be reached, or a mutation could not be applied
    /// within the retry budget.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// A conditional write lost against a concurrent update.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The ledger backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A ledger value could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, VerdictError>;

impl VerdictError {
    /// Prefixes the message with `context`, keeping the error kind.
    pub fn context(self, context: &str) -> Self {
        match self {
            VerdictError::InvalidArgument(m) => {
                VerdictError::InvalidArgument(format!("{context}: {m}"))
            }
            VerdictError::AlreadyExists(m) => {
                VerdictError::AlreadyExists(format!("{context}: {m}"))
            }
            VerdictError::NotFound(m) => VerdictError::NotFound(format!("{context}: {m}")),
            VerdictError::Unavailable(m) => VerdictError::Unavailable(format!("{context}: {m}")),
            VerdictError::Conflict(m) => VerdictError::Conflict(format!("{context}: {m}")),
            VerdictError::Storage(m) => VerdictError::Storage(format!("{context}: {m}")),
            VerdictError::Serialization(m) => {
                VerdictError::Serialization(format!("{context}: {m}"))
            }
        }
    }
}

impl From<bincode::Error> for VerdictError {
    fn from(e: bincode::Error) -> Self {
        VerdictError::Serialization(e.to_string())
    }
}

impl From<VerdictError> for Status {
    fn from(e: VerdictError) -> Self {
        match e {
            VerdictError::InvalidArgument(m) => Status::invalid_argument(m),
            VerdictError::AlreadyExists(m) => Status::already_exists(m),
            VerdictError::NotFound(m) => Status::not_found(m),
            // Conflicts only reach this point if they escaped the retry loop.
            VerdictError::Unavailable(m) | VerdictError::Conflict(m) | VerdictError::Storage(m) => {
                Status::unavailable(m)
            }
            VerdictError::Serialization(m) => Status::internal(m),
        }
    }
}

impl From<Status> for VerdictError {
    fn from(status: Status) -> Self {
        let message = status.message().to_string();
        match status.code() {
            Code::InvalidArgument | Code::OutOfRange => VerdictError::InvalidArgument(message),
            Code::AlreadyExists => VerdictError::AlreadyExists(message),
            Code::NotFound => VerdictError::NotFound(message),
            Code::Aborted => VerdictError::Conflict(message),
            Code::Internal | Code::DataLoss => VerdictError::Serialization(message),
            // Transport failures, deadlines and cancellations all mean the
            // coordinator could not be reached in time.
            _ => VerdictError::Unavailable(message),
        }
    }
}
