// src/document/mod.rs
pub mod convert;
pub mod models;

pub use convert::converter_for;
pub use models::Document;
