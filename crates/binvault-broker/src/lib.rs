#![warn(missing_docs)]

//! binvault broker: the partitioned append-only log writer, the record
//! envelope codec, and the hot/cold tier router fed by the coordination
//! collaborator.

pub mod backend;
pub mod coord;
pub mod envelope;
pub mod error;
pub mod partitions;
pub mod router;
pub mod writer;

pub use error::{BrokerError, Result};

use std::future::Future;
use std::pin::Pin;

/// Boxed future type for async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
