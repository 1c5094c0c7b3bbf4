//! Axum route handlers for the Resumes API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::skills::extract_skills;
use crate::models::resume::{NewResume, Resume, ResumePatch};
use crate::resumes::create_with_skills;
use crate::resumes::pdf::{detect_kind, extract_text};
use crate::state::AppState;
use crate::storage::resume_not_found;

#[derive(Debug, Serialize)]
pub struct ResumeResponse {
    #[serde(flatten)]
    pub resume: Resume,
    /// Where the skills came from when they were extracted on this request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills_source: Option<String>,
}

/// GET /api/resumes
pub async fn handle_list_resumes(State(state): State<AppState>) -> Result<Json<Vec<Resume>>, AppError> {
    Ok(Json(state.storage.list_resumes().await?))
}

/// POST /api/resumes
///
/// Creates a resume from plain text. Skills are extracted unless supplied.
pub async fn handle_create_resume(
    State(state): State<AppState>,
    Json(new_resume): Json<NewResume>,
) -> Result<(StatusCode, Json<ResumeResponse>), AppError> {
    let (resume, skills_source) =
        create_with_skills(state.storage.as_ref(), &state.llm, new_resume).await?;
    Ok((
        StatusCode::CREATED,
        Json(ResumeResponse {
            resume,
            skills_source,
        }),
    ))
}

/// POST /api/resumes/upload
///
/// Multipart form: `file` (PDF or text, required), `name`, `is_default`.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeResponse>), AppError> {
    let mut file: Option<(Option<String>, Option<String>, Bytes)> = None;
    let mut name: Option<String> = None;
    let mut is_default = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                file = Some((file_name, content_type, data));
            }
            "name" => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?,
                );
            }
            "is_default" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                is_default = matches!(value.trim(), "true" | "1" | "on");
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::Validation("multipart field 'file' is required".to_string()))?;
    if data.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }

    let kind = detect_kind(file_name.as_deref(), content_type.as_deref(), &data).ok_or_else(|| {
        AppError::UnprocessableEntity("Only PDF and plain text resumes are supported".to_string())
    })?;
    let content = extract_text(kind, data).await?;

    let name = name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| {
            file_name
                .as_deref()
                .map(|f| f.rsplit_once('.').map_or(f, |(stem, _)| stem).to_string())
        })
        .unwrap_or_default();

    let new_resume = NewResume {
        name,
        content,
        skills: Vec::new(),
        is_default,
    };
    let (resume, skills_source) =
        create_with_skills(state.storage.as_ref(), &state.llm, new_resume).await?;

    Ok((
        StatusCode::CREATED,
        Json(ResumeResponse {
            resume,
            skills_source,
        }),
    ))
}

/// GET /api/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<Resume>, AppError> {
    let resume = state
        .storage
        .get_resume(resume_id)
        .await?
        .ok_or_else(|| resume_not_found(resume_id))?;
    Ok(Json(resume))
}

/// PATCH /api/resumes/:id
///
/// Setting `is_default: true` clears the flag on every other resume.
pub async fn handle_update_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    Json(patch): Json<ResumePatch>,
) -> Result<Json<Resume>, AppError> {
    if patch.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }
    Ok(Json(state.storage.update_resume(resume_id, patch).await?))
}

/// DELETE /api/resumes/:id
///
/// Refused with 400 while any application references the resume.
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.storage.delete_resume(resume_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/resumes/:id/extract-skills
///
/// Re-runs extraction on the stored content and replaces the skill list.
pub async fn handle_extract_skills(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ResumeResponse>, AppError> {
    let resume = state
        .storage
        .get_resume(resume_id)
        .await?
        .ok_or_else(|| resume_not_found(resume_id))?;

    let extraction = extract_skills(&resume.content, &state.llm).await;
    let resume = state
        .storage
        .update_resume(
            resume_id,
            ResumePatch {
                skills: Some(extraction.skills),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(ResumeResponse {
        resume,
        skills_source: Some(extraction.source),
    }))
}
