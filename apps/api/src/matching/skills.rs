//! Skill extraction: LLM first, fixed regex list as the fallback.
//!
//! The fallback is also what the keyword scorer uses on job descriptions, so the
//! canonical names here are the vocabulary of heuristic matching.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::llm_client::prompts::{fill_template, truncate_for_prompt};
use crate::llm_client::LlmClient;
use crate::matching::prompts::{SKILLS_PROMPT_TEMPLATE, SKILLS_SYSTEM};

const MAX_SKILLS: usize = 50;
const MAX_PROMPT_CHARS: usize = 12_000;

/// Canonical skill name and the spellings that count as a mention of it.
const SKILL_ALIASES: &[(&str, &[&str])] = &[
    // languages
    ("JavaScript", &["javascript", "ecmascript"]),
    ("TypeScript", &["typescript"]),
    ("Python", &["python"]),
    ("Java", &["java"]),
    ("C++", &["c++", "cpp"]),
    ("C#", &["c#", "csharp"]),
    ("Go", &["golang"]),
    ("Rust", &["rust"]),
    ("Ruby", &["ruby"]),
    ("PHP", &["php"]),
    ("Swift", &["swift"]),
    ("Kotlin", &["kotlin"]),
    ("Scala", &["scala"]),
    ("SQL", &["sql"]),
    // frontend
    ("React", &["react", "reactjs", "react.js"]),
    ("Angular", &["angular"]),
    ("Vue", &["vue", "vuejs", "vue.js"]),
    ("Next.js", &["next.js", "nextjs"]),
    ("HTML", &["html", "html5"]),
    ("CSS", &["css", "css3", "sass", "scss"]),
    ("Tailwind CSS", &["tailwind", "tailwindcss"]),
    // backend
    ("Node.js", &["node.js", "nodejs"]),
    ("Express", &["express.js", "expressjs"]),
    ("Django", &["django"]),
    ("Flask", &["flask"]),
    ("Spring Boot", &["spring boot", "springboot"]),
    ("Ruby on Rails", &["rails", "ruby on rails"]),
    (".NET", &[".net", "asp.net", "dotnet"]),
    ("GraphQL", &["graphql"]),
    ("REST APIs", &["rest api", "rest apis", "restful"]),
    // data
    ("PostgreSQL", &["postgresql", "postgres"]),
    ("MySQL", &["mysql"]),
    ("MongoDB", &["mongodb", "mongo"]),
    ("Redis", &["redis"]),
    ("Elasticsearch", &["elasticsearch"]),
    ("Kafka", &["kafka"]),
    // cloud and devops
    ("AWS", &["aws", "amazon web services"]),
    ("Azure", &["azure"]),
    ("GCP", &["gcp", "google cloud"]),
    ("Docker", &["docker"]),
    ("Kubernetes", &["kubernetes", "k8s"]),
    ("Terraform", &["terraform"]),
    ("CI/CD", &["ci/cd", "continuous integration", "continuous delivery"]),
    ("Git", &["git"]),
    ("Linux", &["linux"]),
    ("Jenkins", &["jenkins"]),
    // ml
    ("Machine Learning", &["machine learning"]),
    ("TensorFlow", &["tensorflow"]),
    ("PyTorch", &["pytorch"]),
    ("Pandas", &["pandas"]),
    ("NLP", &["nlp", "natural language processing"]),
    // practices and soft skills
    ("Agile", &["agile", "scrum", "kanban"]),
    ("Leadership", &["leadership", "team lead", "mentoring"]),
    ("Communication", &["communication"]),
    ("Project Management", &["project management"]),
];

fn compiled_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        SKILL_ALIASES
            .iter()
            .filter_map(|(canonical, aliases)| {
                let alternatives: Vec<String> = aliases.iter().map(|a| regex::escape(a)).collect();
                // alnum boundaries rather than \b so "c++", "c#" and ".net" still anchor
                let pattern = format!(
                    r"(?i)(?:^|[^a-z0-9])(?:{})(?:$|[^a-z0-9+#])",
                    alternatives.join("|")
                );
                match Regex::new(&pattern) {
                    Ok(re) => Some((*canonical, re)),
                    Err(e) => {
                        warn!(skill = canonical, error = %e, "Skipping invalid skill pattern");
                        None
                    }
                }
            })
            .collect()
    })
}

/// Regex-based skill extraction. Canonical names, deduplicated, in list order.
pub fn extract_skills_fallback(text: &str) -> Vec<String> {
    compiled_patterns()
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(canonical, _)| canonical.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillExtraction {
    pub skills: Vec<String>,
    /// "llm:<provider>" or "fallback".
    pub source: String,
}

/// Extracts skills via the LLM chain, falling back to the regex list.
pub async fn extract_skills(resume_text: &str, llm: &LlmClient) -> SkillExtraction {
    let prompt = fill_template(
        SKILLS_PROMPT_TEMPLATE,
        &[("resume_text", truncate_for_prompt(resume_text, MAX_PROMPT_CHARS))],
    );

    match llm.complete_json::<Vec<String>>(&prompt, SKILLS_SYSTEM).await {
        Ok(output) => {
            let skills = normalize_skills(output.value);
            if !skills.is_empty() {
                return SkillExtraction {
                    skills,
                    source: format!("llm:{}", output.provider),
                };
            }
            warn!(provider = output.provider, "LLM returned no skills, using fallback");
        }
        Err(e) => warn!(error = %e, "Skill extraction via LLM failed, using fallback"),
    }

    SkillExtraction {
        skills: extract_skills_fallback(resume_text),
        source: "fallback".to_string(),
    }
}

/// Trims, drops empties, and deduplicates case-insensitively keeping first spelling.
pub fn normalize_skills(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s.len() <= 60)
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(MAX_SKILLS)
        .collect()
}
