//! Cover letter generation: provider chain first, filled-in template when it is exhausted.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::prompts::{fill_template, truncate_for_prompt, NO_INVENTION_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::matching::fit_scoring::compute_keyword_match;
use crate::matching::prompts::{COVER_LETTER_PROMPT_TEMPLATE, COVER_LETTER_SYSTEM};
use crate::models::job::Job;
use crate::models::resume::Resume;

const MAX_PROMPT_CHARS: usize = 8_000;
const MAX_TEMPLATE_SKILLS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverLetterTone {
    #[default]
    Professional,
    Enthusiastic,
    Concise,
}

impl CoverLetterTone {
    fn instruction(&self) -> &'static str {
        match self {
            CoverLetterTone::Professional => "professional and confident, no clichés",
            CoverLetterTone::Enthusiastic => "warm and enthusiastic while staying specific",
            CoverLetterTone::Concise => "direct and brief; aim for the low end of the length",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverLetter {
    pub content: String,
    /// "llm:<provider>" or "template".
    pub source: String,
}

pub async fn generate_cover_letter(
    llm: &LlmClient,
    resume: &Resume,
    job: &Job,
    tone: CoverLetterTone,
) -> CoverLetter {
    let prompt = build_cover_letter_prompt(resume, job, tone);

    match llm.complete(&prompt, COVER_LETTER_SYSTEM).await {
        Ok(output) => CoverLetter {
            content: output.value,
            source: format!("llm:{}", output.provider),
        },
        Err(e) => {
            warn!(job_id = %job.id, error = %e, "Cover letter via LLM failed, using template");
            CoverLetter {
                content: template_cover_letter(resume, job),
                source: "template".to_string(),
            }
        }
    }
}

fn build_cover_letter_prompt(resume: &Resume, job: &Job, tone: CoverLetterTone) -> String {
    fill_template(
        COVER_LETTER_PROMPT_TEMPLATE,
        &[
            ("no_invention", NO_INVENTION_INSTRUCTION),
            ("tone", tone.instruction()),
            ("resume_text", truncate_for_prompt(&resume.content, MAX_PROMPT_CHARS)),
            ("job_title", job.title.as_str()),
            ("company", job.company.as_str()),
            ("job_description", truncate_for_prompt(&job.description, MAX_PROMPT_CHARS)),
        ],
    )
}

/// Static letter naming the role, the company, and up to five overlapping skills.
pub fn template_cover_letter(resume: &Resume, job: &Job) -> String {
    let report = compute_keyword_match(resume, job);
    let skills: Vec<&str> = if report.matched_skills.is_empty() {
        resume.skills.iter().map(String::as_str).collect()
    } else {
        report.matched_skills.iter().map(String::as_str).collect()
    };
    let skills: Vec<&str> = skills.into_iter().take(MAX_TEMPLATE_SKILLS).collect();

    let company = if job.company.trim().is_empty() {
        "your company"
    } else {
        job.company.as_str()
    };

    let skills_paragraph = match skills.as_slice() {
        [] => "My background has prepared me to contribute from day one, and I am eager to \
               learn the specifics of your stack."
            .to_string(),
        [only] => format!("My experience with {only} maps directly onto what this role needs."),
        [rest @ .., last] => format!(
            "My experience with {} and {last} maps directly onto what this role needs.",
            rest.join(", ")
        ),
    };

    format!(
        "Dear Hiring Manager,\n\n\
         I am writing to apply for the {title} position at {company}. \
         The role stood out to me because it lines up closely with the work I have been doing.\n\n\
         {skills_paragraph}\n\n\
         I would welcome the chance to discuss how I can help {company} succeed. \
         Thank you for your time and consideration.\n\n\
         Sincerely,\n",
        title = job.title,
    )
}
