//! Everything that talks to the remote service.
//!
//! The [`Client`] trait is the raw, record-level collaborator. The
//! [`Adapter`] wraps a client with typed entities, request counting and the
//! local graph effects of mutating requests.

use thiserror::Error;

use crate::domain::{LinkError, RecordError};

mod adapter;
pub use adapter::Adapter;

mod client;
pub use client::{CaseFilter, Client, NewSection};

/// An in-memory [`Client`] for offline use and tests.
pub mod memory;

mod pagination;
pub use pagination::Pages;

mod stats;
pub use stats::{Request, RequestStats};

/// Errors from requests issued through the [`Adapter`].
#[derive(Debug, Error)]
pub enum Error<E> {
    /// The client reported an error.
    #[error(transparent)]
    Client(E),

    /// A returned record could not be decoded.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// The result could not be linked into the local suite.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// A section path had an empty component.
    #[error("invalid section path '{0}'")]
    InvalidPath(String),
}
