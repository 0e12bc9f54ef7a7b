//! Minimal client for the Gemini generative-language REST API.
//!
//! Only the calls the relay needs are covered: streamed and single-shot
//! content generation, and file uploads.

mod client;
mod error;
pub mod types;

pub use client::{Client, DEFAULT_API_VERSION, DEFAULT_BASE_URL, ResponseStream};
pub use error::{Error, Result};
