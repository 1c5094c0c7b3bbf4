//! Match Scoring: pluggable, trait-based scorer that measures a resume against a job.
//!
//! `KeywordMatchScorer` is the pure-Rust heuristic (deterministic, no network).
//! `LlmMatchScorer` asks the provider chain and drops to the keyword scorer when
//! no provider answers. `AppState` holds an `Arc<dyn MatchScorer>`.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::prompts::{
    fill_template, truncate_for_prompt, JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION,
};
use crate::llm_client::LlmClient;
use crate::matching::prompts::MATCH_PROMPT_TEMPLATE;
use crate::matching::skills::extract_skills_fallback;
use crate::models::job::Job;
use crate::models::resume::Resume;

const MAX_PROMPT_CHARS: usize = 8_000;

// ────────────────────────────────────────────────────────────────────────────
// Output data model (shared across all scorer backends)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub score: u32, // 0..=100
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub recommendation: String,
    pub reasoning: Option<String>,
    pub scorer_backend: String, // "keyword" | "llm:<provider>"
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(&self, resume: &Resume, job: &Job) -> Result<MatchReport, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordMatchScorer
// ────────────────────────────────────────────────────────────────────────────

/// Set-intersection scorer.
///
/// Algorithm:
/// 1. J = fallback skills found in the job title + description
/// 2. R = the resume's stored skills ∪ fallback skills found in its content (case-insensitive)
/// 3. score = round(100 × |R ∩ J| / |J|), or 0 when J is empty
pub struct KeywordMatchScorer;

#[async_trait]
impl MatchScorer for KeywordMatchScorer {
    async fn score(&self, resume: &Resume, job: &Job) -> Result<MatchReport, AppError> {
        Ok(compute_keyword_match(resume, job))
    }
}

pub fn compute_keyword_match(resume: &Resume, job: &Job) -> MatchReport {
    let job_skills = extract_skills_fallback(&format!("{}\n{}", job.title, job.description));

    if job_skills.is_empty() {
        return MatchReport {
            score: 0,
            matched_skills: vec![],
            missing_skills: vec![],
            recommendation: "No recognizable skills in the job description. Review it manually."
                .to_string(),
            reasoning: None,
            scorer_backend: "keyword".to_string(),
        };
    }

    let resume_skills: HashSet<String> = resume
        .skills
        .iter()
        .cloned()
        .chain(extract_skills_fallback(&resume.content))
        .map(|s| s.to_lowercase())
        .collect();

    let (matched_skills, missing_skills): (Vec<String>, Vec<String>) = job_skills
        .into_iter()
        .partition(|skill| resume_skills.contains(&skill.to_lowercase()));

    let total = matched_skills.len() + missing_skills.len();
    let score = ((matched_skills.len() as f64 / total as f64) * 100.0).round() as u32;

    MatchReport {
        recommendation: build_recommendation(score, &missing_skills),
        score,
        matched_skills,
        missing_skills,
        reasoning: None,
        scorer_backend: "keyword".to_string(),
    }
}

/// Builds a human-readable recommendation string from score and missing skills.
fn build_recommendation(score: u32, missing: &[String]) -> String {
    let top_missing: Vec<&str> = missing.iter().take(3).map(String::as_str).collect();

    if score >= 80 {
        "Strong match. Your resume covers the key requirements.".to_string()
    } else if score >= 50 {
        format!(
            "Moderate match ({score}/100). Consider highlighting: {}.",
            top_missing.join(", ")
        )
    } else {
        format!(
            "Weak match ({score}/100). Missing: {}. Apply only if you can speak to these.",
            top_missing.join(", ")
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmMatchScorer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LlmMatch {
    score: f64,
    #[serde(default)]
    matched_skills: Vec<String>,
    #[serde(default)]
    missing_skills: Vec<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Semantic scorer via the provider chain, keyword scorer when the chain is exhausted.
pub struct LlmMatchScorer {
    llm: LlmClient,
}

impl LlmMatchScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl MatchScorer for LlmMatchScorer {
    async fn score(&self, resume: &Resume, job: &Job) -> Result<MatchReport, AppError> {
        let prompt = build_match_prompt(resume, job);

        match self.llm.complete_json::<LlmMatch>(&prompt, JSON_ONLY_SYSTEM).await {
            Ok(output) => {
                let answer = output.value;
                let score = if answer.score.is_finite() {
                    answer.score.round().clamp(0.0, 100.0) as u32
                } else {
                    0
                };
                Ok(MatchReport {
                    recommendation: build_recommendation(score, &answer.missing_skills),
                    score,
                    matched_skills: answer.matched_skills,
                    missing_skills: answer.missing_skills,
                    reasoning: answer.reasoning,
                    scorer_backend: format!("llm:{}", output.provider),
                })
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "LLM match scoring failed, using keyword scorer");
                Ok(compute_keyword_match(resume, job))
            }
        }
    }
}

fn build_match_prompt(resume: &Resume, job: &Job) -> String {
    let skills = resume.skills.join(", ");
    fill_template(
        MATCH_PROMPT_TEMPLATE,
        &[
            ("no_invention", NO_INVENTION_INSTRUCTION),
            ("resume_skills", skills.as_str()),
            ("resume_text", truncate_for_prompt(&resume.content, MAX_PROMPT_CHARS)),
            ("job_title", job.title.as_str()),
            ("company", job.company.as_str()),
            ("job_description", truncate_for_prompt(&job.description, MAX_PROMPT_CHARS)),
        ],
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
