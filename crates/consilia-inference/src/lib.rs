//! Embedding inference backends for consilia.
//!
//! The OpenAI-compatible backend is the production path. The mock backend
//! (behind the `mock` feature) produces deterministic vectors for tests that
//! must not touch a live provider.

pub mod openai;

#[cfg(feature = "mock")]
pub mod mock;

pub use openai::{OpenAIBackend, OpenAIConfig};
