#![warn(missing_docs)]

//! binvault core: content fingerprinting, collision-free id allocation,
//! the opaque key codec, the dedup index, and the scratch-buffer pool.

pub mod buffer;
pub mod dedup;
pub mod error;
pub mod fingerprint;
pub mod idalloc;
pub mod keycodec;
pub mod store;
pub mod types;

pub use error::{CoreError, Result};

use std::future::Future;
use std::pin::Pin;

/// Boxed future type for async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
