pub mod application;
pub mod job;
pub mod preferences;
pub mod resume;

use std::collections::BTreeMap;

use serde::Serialize;

/// Aggregate counts shown on the dashboard landing page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub total_jobs: usize,
    pub new_jobs: usize,
    pub total_applications: usize,
    pub applications_by_status: BTreeMap<String, usize>,
    pub average_match_score: Option<f64>,
    pub resumes: usize,
}
