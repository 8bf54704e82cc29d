// src/lib.rs
pub mod clustering;
pub mod document;
pub mod errors;
pub mod extraction;
pub mod matching;
pub mod models;
pub mod pipeline;
pub mod rendering;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use errors::{ConsolidationError, Result};
