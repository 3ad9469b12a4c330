//! # relayguard-core
//!
//! Core types, traits, and abstractions for relayguard spam detection.
//!
//! This crate provides the message and verdict data model and the
//! [`SpamDetector`] contract that every detector implements, plus the
//! [`FileFetcher`] collaborator used to pull attachment bytes from the
//! chat transport.

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
