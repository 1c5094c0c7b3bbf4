pub mod health;
pub mod preferences;
pub mod stats;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::applications::handlers as applications;
use crate::jobs::handlers as jobs;
use crate::matching::handlers as matching;
use crate::resumes::handlers as resumes;
use crate::scheduler::handlers as scheduler;
use crate::errors::AppError;
use crate::state::AppState;

const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Parses an optional JSON request body. Only an empty body means "use the defaults";
/// anything else must deserialize as `T` or the request is rejected with 400.
pub(crate) fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/stats", get(stats::stats_handler))
        // Jobs
        .route(
            "/api/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/api/jobs/search", post(jobs::handle_search_jobs))
        .route("/api/jobs/match-all", post(matching::handle_match_all))
        .route(
            "/api/jobs/:id",
            get(jobs::handle_get_job)
                .patch(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route("/api/jobs/:id/match", post(matching::handle_match_job))
        // Resumes
        .route(
            "/api/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_create_resume),
        )
        .route(
            "/api/resumes/upload",
            post(resumes::handle_upload_resume).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/api/resumes/:id",
            get(resumes::handle_get_resume)
                .patch(resumes::handle_update_resume)
                .delete(resumes::handle_delete_resume),
        )
        .route(
            "/api/resumes/:id/extract-skills",
            post(resumes::handle_extract_skills),
        )
        // Applications
        .route(
            "/api/applications",
            get(applications::handle_list_applications)
                .post(applications::handle_create_application),
        )
        .route(
            "/api/applications/:id",
            get(applications::handle_get_application)
                .patch(applications::handle_update_application)
                .delete(applications::handle_delete_application),
        )
        // Matching and LLM
        .route("/api/cover-letter", post(matching::handle_cover_letter))
        .route("/api/llm/status", get(matching::handle_llm_status))
        // Search preferences and scheduler
        .route(
            "/api/search-preferences",
            get(preferences::get_preferences_handler).put(preferences::put_preferences_handler),
        )
        .route("/api/scheduler", get(scheduler::handle_status))
        .route("/api/scheduler/start", post(scheduler::handle_start))
        .route("/api/scheduler/stop", post(scheduler::handle_stop))
        .route("/api/scheduler/run", post(scheduler::handle_run))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::testing::chain;
    use crate::matching::fit_scoring::LlmMatchScorer;
    use crate::models::job::JobSource;
    use crate::scraping::testing::{canned_scraper, CannedBoard};
    use crate::storage::MemStorage;

    fn app() -> Router {
        let llm = chain(&[]);
        let scraper = canned_scraper(vec![
            CannedBoard {
                source: JobSource::Indeed,
                body: Ok("Rust Engineer\nKafka Engineer".to_string()),
            },
            CannedBoard {
                source: JobSource::Linkedin,
                body: Err(999),
            },
        ]);
        let state = AppState::new(
            Arc::new(MemStorage::new()),
            llm.clone(),
            Arc::new(LlmMatchScorer::new(llm)),
            Arc::new(scraper),
            &Config::for_tests(),
        );
        build_router(state)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn job_body(title: &str, url: &str) -> Value {
        json!({
            "title": title,
            "company": "Acme",
            "description": "Rust, Docker and Kafka",
            "url": url
        })
    }

    async fn create_resume(app: &Router, content: &str) -> Value {
        let (status, resume) = send(
            app,
            Method::POST,
            "/api/resumes",
            Some(json!({ "name": "main", "content": content })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        resume
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "hirebot-api");
    }

    #[tokio::test]
    async fn test_create_job_dedups_by_url() {
        let app = app();
        let (status, first) = send(
            &app,
            Method::POST,
            "/api/jobs",
            Some(job_body("Rust Engineer", "https://acme.dev/1")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["source"], "manual");
        assert_eq!(first["status"], "new");

        let (status, second) = send(
            &app,
            Method::POST,
            "/api/jobs",
            Some(job_body("Renamed", "https://acme.dev/1")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["id"], first["id"]);
        assert_eq!(second["title"], "Rust Engineer");

        let (_, list) = send(&app, Method::GET, "/api/jobs", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_job_validation_error() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/jobs",
            Some(job_body("  ", "https://acme.dev/1")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_job_is_404() {
        let uri = format!("/api/jobs/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&app(), Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_jobs_filters() {
        let app = app();
        send(&app, Method::POST, "/api/jobs", Some(job_body("Rust Engineer", "https://a.dev/1"))).await;
        let (_, other) = send(
            &app,
            Method::POST,
            "/api/jobs",
            Some(json!({"title": "Designer", "company": "Studio", "url": "https://a.dev/2"})),
        )
        .await;
        let uri = format!("/api/jobs/{}", other["id"].as_str().unwrap());
        send(&app, Method::PATCH, &uri, Some(json!({"status": "ignored"}))).await;

        let (_, found) = send(&app, Method::GET, "/api/jobs?search=rust", None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (_, ignored) = send(&app, Method::GET, "/api/jobs?status=ignored", None).await;
        assert_eq!(ignored[0]["title"], "Designer");
    }

    #[tokio::test]
    async fn test_list_jobs_rejects_out_of_range_min_score() {
        let app = app();
        let (status, _) = send(&app, Method::GET, "/api/jobs?min_score=100", None).await;
        assert_eq!(status, StatusCode::OK);

        for uri in ["/api/jobs?min_score=101", "/api/jobs?min_score=4294967295"] {
            let (status, body) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_resume_skills_match_and_cover_letter() {
        let app = app();
        let resume = create_resume(&app, "Rust and Docker developer").await;
        assert_eq!(resume["skills_source"], "fallback");
        assert_eq!(resume["is_default"], true);
        assert_eq!(resume["skills"], json!(["Rust", "Docker"]));

        let (_, job) = send(
            &app,
            Method::POST,
            "/api/jobs",
            Some(job_body("Backend Engineer", "https://acme.dev/9")),
        )
        .await;
        let job_id = job["id"].as_str().unwrap();

        let (status, matched) =
            send(&app, Method::POST, &format!("/api/jobs/{job_id}/match"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(matched["report"]["scorer_backend"], "keyword");
        assert_eq!(matched["report"]["score"], 67);
        assert_eq!(matched["job"]["match_score"], 67);

        let (status, letter) = send(
            &app,
            Method::POST,
            "/api/cover-letter",
            Some(json!({ "job_id": job_id, "tone": "concise" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(letter["source"], "template");
        assert!(letter["content"].as_str().unwrap().contains("Backend Engineer position at Acme"));
    }

    #[tokio::test]
    async fn test_match_without_resume_is_422() {
        let app = app();
        let (_, job) = send(&app, Method::POST, "/api/jobs", Some(job_body("SRE", "https://a.dev/s"))).await;
        let uri = format!("/api/jobs/{}/match", job["id"].as_str().unwrap());
        let (status, _) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_malformed_match_body_is_400_and_not_scored() {
        let app = app();
        let resume = create_resume(&app, "Rust and Docker developer").await;
        let (_, job) = send(&app, Method::POST, "/api/jobs", Some(job_body("SRE", "https://a.dev/m"))).await;
        let job_id = job["id"].as_str().unwrap();

        let truncated = &resume["id"].as_str().unwrap()[..8];
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/jobs/{job_id}/match"),
            Some(json!({ "resume_id": truncated })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (_, stored) = send(&app, Method::GET, &format!("/api/jobs/{job_id}"), None).await;
        assert!(stored["match_score"].is_null());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/jobs/match-all",
            Some(json!({ "resume_id": 7 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_with_mistyped_body_is_400() {
        let app = app();
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/jobs/search",
            Some(json!({ "keywords": 42 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, stats) = send(&app, Method::GET, "/api/stats", None).await;
        assert_eq!(stats["total_jobs"], 0);
    }

    #[tokio::test]
    async fn test_empty_resume_content_is_400() {
        let (status, _) = send(
            &app(),
            Method::POST,
            "/api/resumes",
            Some(json!({ "name": "cv", "content": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_application_lifecycle() {
        let app = app();
        let resume = create_resume(&app, "Rust").await;
        let (_, job) = send(&app, Method::POST, "/api/jobs", Some(job_body("Rust Dev", "https://a.dev/r"))).await;
        let job_id = job["id"].as_str().unwrap();

        let (status, application) = send(
            &app,
            Method::POST,
            "/api/applications",
            Some(json!({ "job_id": job_id, "status": "applied" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(application["resume_id"], resume["id"]);
        assert!(application["applied_at"].is_string());

        let (_, job) = send(&app, Method::GET, &format!("/api/jobs/{job_id}"), None).await;
        assert_eq!(job["status"], "applied");

        let app_uri = format!("/api/applications/{}", application["id"].as_str().unwrap());
        let (status, _) = send(&app, Method::PATCH, &app_uri, Some(json!({"status": "draft"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, updated) =
            send(&app, Method::PATCH, &app_uri, Some(json!({"status": "interviewing"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "interviewing");

        let resume_uri = format!("/api/resumes/{}", resume["id"].as_str().unwrap());
        let (status, _) = send(&app, Method::DELETE, &resume_uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, filtered) =
            send(&app, Method::GET, &format!("/api/applications?job_id={job_id}"), None).await;
        assert_eq!(filtered.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::DELETE, &format!("/api/jobs/{job_id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, &app_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_preferences_validation() {
        let app = app();
        let (status, prefs) = send(&app, Method::GET, "/api/search-preferences", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(prefs["keywords"], "software engineer");

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/search-preferences",
            Some(json!({
                "keywords": "rust", "location": "Remote",
                "sources": ["remoteok"], "min_match_score": 101
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, saved) = send(
            &app,
            Method::PUT,
            "/api/search-preferences",
            Some(json!({
                "keywords": " rust ", "location": "Berlin",
                "sources": ["remoteok", "remoteok"], "min_match_score": 60
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["keywords"], "rust");
        assert_eq!(saved["sources"], json!(["remoteok"]));
    }

    #[tokio::test]
    async fn test_search_jobs_reports_per_source() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/jobs/search",
            Some(json!({ "keywords": "rust", "sources": ["indeed", "linkedin"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["found"], 2);
        assert_eq!(body["new_jobs"], 2);
        assert!(body["per_source"][1]["error"].is_string());

        let (_, again) = send(
            &app,
            Method::POST,
            "/api/jobs/search",
            Some(json!({ "keywords": "rust", "sources": ["indeed"] })),
        )
        .await;
        assert_eq!(again["new_jobs"], 0);

        let (_, stats) = send(&app, Method::GET, "/api/stats", None).await;
        assert_eq!(stats["total_jobs"], 2);
        assert_eq!(stats["new_jobs"], 2);
    }

    #[tokio::test]
    async fn test_match_all_scores_unscored_jobs() {
        let app = app();
        create_resume(&app, "Rust").await;
        send(&app, Method::POST, "/api/jobs/search", Some(json!({ "sources": ["indeed"] }))).await;

        let (status, body) = send(&app, Method::POST, "/api/jobs/match-all", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scored"], 2);

        let (_, again) = send(&app, Method::POST, "/api/jobs/match-all", None).await;
        assert_eq!(again["scored"], 0);
    }

    #[tokio::test]
    async fn test_scheduler_controls() {
        let app = app();
        let (_, status) = send(&app, Method::GET, "/api/scheduler", None).await;
        assert_eq!(status["running"], false);
        assert_eq!(status["interval_hours"], 6);

        let (_, started) = send(&app, Method::POST, "/api/scheduler/start", None).await;
        assert_eq!(started["changed"], true);
        assert_eq!(started["status"]["running"], true);

        let (_, again) = send(&app, Method::POST, "/api/scheduler/start", None).await;
        assert_eq!(again["changed"], false);

        let (_, stopped) = send(&app, Method::POST, "/api/scheduler/stop", None).await;
        assert_eq!(stopped["status"]["running"], false);

        let (status, run) = send(&app, Method::POST, "/api/scheduler/run", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(run["new_jobs"], 2);

        let (_, after) = send(&app, Method::GET, "/api/scheduler", None).await;
        assert_eq!(after["runs"], 1);
        assert_eq!(after["last_new_jobs"], 2);
    }

    #[tokio::test]
    async fn test_llm_status_without_providers() {
        let (status, body) = send(&app(), Method::GET, "/api/llm/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["active"].is_null());
        assert_eq!(body["providers"], json!([]));
    }

    #[tokio::test]
    async fn test_upload_text_resume() {
        let boundary = "hirebot-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"jane.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             Jane Doe\n\nPython and Kubernetes\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"is_default\"\r\n\r\n\
             true\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/resumes/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let resume: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(resume["name"], "jane");
        assert_eq!(resume["content"], "Jane Doe\n\nPython and Kubernetes");
        assert_eq!(resume["skills"], json!(["Python", "Kubernetes"]));
    }

    #[tokio::test]
    async fn test_upload_without_file_is_400() {
        let boundary = "b";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\ncv\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/resumes/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
