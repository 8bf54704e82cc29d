// src/clustering/mod.rs
pub mod engine;
pub mod render_groups;

pub use engine::ClusteringEngine;
pub use render_groups::{RenderGroup, RenderGroupRegistry};
