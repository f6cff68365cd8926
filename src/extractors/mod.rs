// src/extractors/mod.rs
pub mod boundary;
pub mod index;
pub mod noise;
pub mod number;
pub mod range;
pub mod section;

// Re-export key extraction types for convenience
pub use number::SectionNumber;
pub use section::{outcome_text, SectionExtractor};
