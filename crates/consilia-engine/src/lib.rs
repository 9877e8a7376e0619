//! # consilia-engine
//!
//! Retrieval-augmented guidance over the conversation corpus: full-replace
//! embedding ingest, similarity search, and deterministic synthesis of
//! advisory guidance from retrieved cases.
//!
//! The engine is storage- and provider-agnostic; it works through the
//! [`consilia_core::ConversationRepository`] and
//! [`consilia_core::EmbeddingBackend`] traits, so tests can swap in stub
//! stores and mock providers.

pub mod engine;
pub mod guidance;

pub use engine::GuidanceEngine;
