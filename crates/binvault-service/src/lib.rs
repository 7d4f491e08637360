#![warn(missing_docs)]

//! binvault service: configuration, the application context wiring every
//! component together, and the write/read orchestrator.

pub mod config;
pub mod context;
pub mod error;
pub mod service;

pub use config::ServiceConfig;
pub use context::{AppContext, Collaborators};
pub use error::{Result, ServiceError};
pub use service::BinVault;
