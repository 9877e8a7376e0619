//! # consilia-dataset
//!
//! Offline transform pipeline for the consilia conversation corpus.
//!
//! Takes raw (context, response) pairs from a tabular file and produces
//! cleaned, quality-scored, categorized [`ConversationRecord`]s ready for
//! embedding, plus corpus-level statistics for reporting. The whole pipeline
//! is deterministic: the same input file always produces the same records
//! and the same stats.
//!
//! [`ConversationRecord`]: consilia_core::ConversationRecord

pub mod category;
pub mod clean;
pub mod io;
pub mod pipeline;
pub mod quality;

pub use category::detect_category;
pub use clean::TextCleaner;
pub use io::{read_raw_pairs, read_records, write_records, write_stats_report};
pub use pipeline::{transform_pairs, RawPair, TransformStats};
pub use quality::quality_score;
