//! Entity extraction module
//!
//! Deterministic lexical pattern matching over a fixed vocabulary,
//! intentionally not a statistical NER model. Good enough to seed the
//! knowledge graph with technology names, dates, and domain concepts.

pub mod extractor;

pub use extractor::{extract, EntityType, ExtractedEntity, PATTERN_CONFIDENCE};
