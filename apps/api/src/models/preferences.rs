use serde::{Deserialize, Serialize};

use crate::models::job::JobSource;

/// Saved search criteria used by the scheduled search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPreferences {
    pub keywords: String,
    pub location: String,
    pub sources: Vec<JobSource>,
    #[serde(default)]
    pub remote_only: bool,
    /// Threshold (0..=100) for counting a scheduled run's new job as a good match.
    /// Job status is never changed by it.
    #[serde(default)]
    pub min_match_score: u32,
}

impl Default for SearchPreferences {
    fn default() -> Self {
        Self {
            keywords: "software engineer".to_string(),
            location: "Remote".to_string(),
            sources: JobSource::SCRAPABLE.to_vec(),
            remote_only: false,
            min_match_score: 0,
        }
    }
}

impl SearchPreferences {
    pub fn validate(&self) -> Result<(), String> {
        if self.keywords.trim().is_empty() {
            return Err("keywords cannot be empty".to_string());
        }
        if self.min_match_score > 100 {
            return Err("min_match_score must be between 0 and 100".to_string());
        }
        if self.sources.contains(&JobSource::Manual) {
            return Err("'manual' is not a searchable source".to_string());
        }
        Ok(())
    }
}
