// All LLM prompt constants for the Matching module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for skill extraction: enforces a bare JSON array.
pub const SKILLS_SYSTEM: &str = "You are an expert technical recruiter who reads resumes. \
    You MUST respond with a JSON array of strings only. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences.";

/// Skill extraction prompt. Replace `{resume_text}` before sending.
pub const SKILLS_PROMPT_TEMPLATE: &str = r#"Extract the professional skills from the resume below.

Return a JSON array of skill names, for example:
["Rust", "PostgreSQL", "Kubernetes", "Team Leadership"]

Rules:
- Include programming languages, frameworks, databases, cloud platforms, tools, and notable soft skills
- Use the canonical spelling of each skill ("JavaScript", not "javascript" or "JS")
- Each skill appears once
- At most 40 skills, most prominent first

RESUME:
{resume_text}"#;

/// Match scoring prompt.
/// Replace: {no_invention}, {resume_text}, {resume_skills}, {job_title}, {company}, {job_description}
pub const MATCH_PROMPT_TEMPLATE: &str = r#"Score how well this candidate matches the job.

{no_invention}

Return a JSON object with this EXACT schema:
{
  "score": 72,
  "matched_skills": ["Rust", "PostgreSQL"],
  "missing_skills": ["Kafka"],
  "reasoning": "Two or three sentences explaining the score."
}

Scoring guide:
- 90-100: meets every hard requirement and most nice-to-haves
- 70-89: meets the core requirements with minor gaps
- 40-69: partial overlap, notable gaps in required skills
- 0-39: different field or seniority

CANDIDATE SKILLS: {resume_skills}

RESUME:
{resume_text}

JOB: {job_title} at {company}

JOB DESCRIPTION:
{job_description}"#;

/// System prompt for cover letters: plain prose, no JSON.
pub const COVER_LETTER_SYSTEM: &str = "You are an expert career coach writing cover letters. \
    Write plain text only: no markdown, no headings, no placeholders in square brackets.";

/// Cover letter prompt.
/// Replace: {no_invention}, {tone}, {resume_text}, {job_title}, {company}, {job_description}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a cover letter for the job below.

{no_invention}

TONE: {tone}
LENGTH: 200 to 300 words, three or four paragraphs.
Open with a specific hook about the role, highlight three or four matching strengths from the
resume, and close with a short call to action. Sign off without inventing a name if the resume
does not contain one.

RESUME:
{resume_text}

JOB: {job_title} at {company}

JOB DESCRIPTION:
{job_description}"#;
