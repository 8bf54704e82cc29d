// src/rendering/mod.rs
pub mod transcript;
pub mod xlsx;

use std::path::Path;

use crate::clustering::render_groups::RenderGroup;
use crate::errors::Result;
use crate::models::{OutcomeStore, TrialSummary};

pub use xlsx::XlsxRenderer;

/// Everything a renderer needs once clustering is finished.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pub summary: &'a TrialSummary,
    /// In registry (creation) order.
    pub render_groups: &'a [RenderGroup],
    pub outcomes: &'a OutcomeStore,
}

pub trait ReportRenderer {
    fn render(&self, report: &Report<'_>, destination: &Path) -> Result<()>;
}
