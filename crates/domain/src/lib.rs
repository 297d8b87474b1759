//! # FieldSync Domain
//!
//! Business domain types and models for FieldSync.
//!
//! This crate contains:
//! - Record types (`ShiftRecord`, `InspectionRecord`) and their lifecycle
//! - Sync session and bootstrap state
//! - Configuration structures
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other FieldSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use constants::*;
pub use errors::*;
pub use types::*;
