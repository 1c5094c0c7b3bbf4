// Resumes API: text and file uploads, skill extraction on create.

pub mod handlers;
pub mod pdf;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::matching::skills::{extract_skills, normalize_skills};
use crate::models::resume::{NewResume, Resume};
use crate::storage::Storage;

pub fn validate_new_resume(mut new_resume: NewResume) -> Result<NewResume, AppError> {
    new_resume.name = new_resume.name.trim().to_string();
    if new_resume.content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }
    if new_resume.name.is_empty() {
        new_resume.name = "Resume".to_string();
    }
    Ok(new_resume)
}

/// Stores a resume. When no skills were supplied they are extracted from the content.
pub async fn create_with_skills(
    storage: &dyn Storage,
    llm: &LlmClient,
    new_resume: NewResume,
) -> Result<(Resume, Option<String>), AppError> {
    let mut new_resume = validate_new_resume(new_resume)?;

    let skills_source = if new_resume.skills.is_empty() {
        let extraction = extract_skills(&new_resume.content, llm).await;
        new_resume.skills = extraction.skills;
        Some(extraction.source)
    } else {
        new_resume.skills = normalize_skills(new_resume.skills);
        None
    };

    let resume = storage.create_resume(new_resume).await?;
    tracing::info!(
        resume_id = %resume.id,
        skills = resume.skills.len(),
        is_default = resume.is_default,
        "Resume created"
    );
    Ok((resume, skills_source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::chain;
    use crate::storage::MemStorage;

    fn new_resume(name: &str, content: &str, skills: &[&str]) -> NewResume {
        NewResume {
            name: name.to_string(),
            content: content.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            is_default: false,
        }
    }

    #[test]
    fn test_empty_content_is_rejected() {
        let err = validate_new_resume(new_resume("cv", "  \n", &[])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_blank_name_gets_placeholder() {
        let resume = validate_new_resume(new_resume(" ", "Rust", &[])).unwrap();
        assert_eq!(resume.name, "Resume");
    }

    #[tokio::test]
    async fn test_skills_extracted_when_missing() {
        let storage = MemStorage::new();
        let (resume, source) = create_with_skills(&storage, &chain(&[]), new_resume("cv", "Rust and Kafka", &[]))
            .await
            .unwrap();
        assert_eq!(source.as_deref(), Some("fallback"));
        assert_eq!(resume.skills, vec!["Rust".to_string(), "Kafka".to_string()]);
        assert!(resume.is_default);
    }

    #[tokio::test]
    async fn test_supplied_skills_are_kept() {
        let storage = MemStorage::new();
        let (resume, source) = create_with_skills(
            &storage,
            &chain(&[]),
            new_resume("cv", "Rust and Kafka", &["Leadership", "leadership"]),
        )
        .await
        .unwrap();
        assert!(source.is_none());
        assert_eq!(resume.skills, vec!["Leadership".to_string()]);
    }
}
