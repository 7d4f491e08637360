//! Error types surfaced by the service layer.

use thiserror::Error;

use binvault_broker::BrokerError;
use binvault_core::CoreError;

/// Errors surfaced to service callers.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Failure in a core component (codec, allocator, store).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Failure in the log writer or tier router.
    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// Result alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
