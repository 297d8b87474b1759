//! HTTP adapters for the remote authority: client, auth gate, submission
//! and reference-data clients.

pub mod auth;
pub mod client;
pub mod reference;
pub mod submission;

pub use auth::{LoginFlow, SessionAuthGate, SessionToken, SessionTokenStore};
pub use client::{ApiClient, ApiClientConfig};
pub use reference::CodeTableClient;
pub use submission::{RemoteIdSink, ShiftSubmissionClient};
