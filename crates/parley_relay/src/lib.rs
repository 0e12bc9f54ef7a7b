//! The Parley relay endpoint.
//!
//! Keeps one transcript per session and forwards every exchange to an
//! [`Upstream`] model service. The HTTP surface lives in [`server`].

pub mod error;
pub mod page;
pub mod payload;
pub mod relay;
pub mod server;
pub mod staging;
pub mod store;
pub mod upstream;

pub use error::{Error, Result};
pub use relay::Relay;
pub use server::{AppState, Session, router, serve};
pub use store::SessionStore;
pub use upstream::{FragmentStream, GeminiUpstream, RemoteFile, Upstream, mock::MockUpstream};
