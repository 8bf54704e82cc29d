// src/models/stats.rs

use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMethod {
    TitleSimilarity,
    ClassUsage,
    Singleton,
}

impl MatchMethod {
    pub fn label(&self) -> &'static str {
        match self {
            MatchMethod::TitleSimilarity => "TITLE",
            MatchMethod::ClassUsage => "CLASS-USAGE",
            MatchMethod::Singleton => "SINGLETON",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchMethodStats {
    pub method: MatchMethod,
    /// Candidate sets the method put forward.
    pub proposals: usize,
    /// Calls made to `associate`.
    pub associations: usize,
    pub elapsed: Duration,
}

impl MatchMethodStats {
    pub fn new(method: MatchMethod) -> Self {
        Self {
            method,
            proposals: 0,
            associations: 0,
            elapsed: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClusteringStats {
    pub started_at: DateTime<Utc>,
    pub total_outcomes: usize,
    pub total_render_groups: usize,
    pub singleton_groups: usize,
    pub method_stats: Vec<MatchMethodStats>,
    pub clustering_time: Duration,
}

impl ClusteringStats {
    pub fn new(total_outcomes: usize) -> Self {
        Self {
            started_at: Utc::now(),
            total_outcomes,
            total_render_groups: 0,
            singleton_groups: 0,
            method_stats: Vec::new(),
            clustering_time: Duration::ZERO,
        }
    }

    pub fn method(&self, method: MatchMethod) -> Option<&MatchMethodStats> {
        self.method_stats.iter().find(|s| s.method == method)
    }
}
