//! # consilia-core
//!
//! Core types, traits, and abstractions for the consilia case retrieval
//! system.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other consilia crates depend on: the conversation domain model,
//! the closed error taxonomy, the embedding backend and conversation
//! repository seams, and the centralized default constants.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
