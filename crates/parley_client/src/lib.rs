//! Client for a Parley relay.
//!
//! [`Client`] runs single exchanges. [`Submitter`] adds the request lifecycle
//! of an interactive front end, where a new submission supersedes the one in
//! flight.

mod client;
pub mod error;
pub mod lifecycle;

pub use client::{Client, DEFAULT_MAX_BYTES, SESSION_HEADER, Submission};
pub use error::{Error, Result};
pub use lifecycle::{Lifecycle, SubmissionId, Submitter};
