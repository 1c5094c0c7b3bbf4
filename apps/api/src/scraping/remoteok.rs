use reqwest::{Client, RequestBuilder};
use scraper::Html;
use serde::Deserialize;

use super::html::clean_text;
use super::{JobBoard, ScrapeError, ScrapedJob, SearchQuery};
use crate::models::job::JobSource;

const API_URL: &str = "https://remoteok.com/api";

/// One element of the RemoteOK feed. The first element is a legal notice with
/// none of these fields, so everything is optional.
#[derive(Debug, Deserialize)]
struct Posting {
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    salary_min: Option<u64>,
    #[serde(default)]
    salary_max: Option<u64>,
}

pub struct RemoteOk;

impl JobBoard for RemoteOk {
    fn source(&self) -> JobSource {
        JobSource::Remoteok
    }

    fn request(&self, client: &Client, _query: &SearchQuery) -> RequestBuilder {
        client.get(API_URL).header("Accept", "application/json")
    }

    /// The feed is not searchable server-side, so keywords are applied here.
    fn parse(&self, body: &str, query: &SearchQuery) -> Result<Vec<ScrapedJob>, ScrapeError> {
        let jobs = parse_remoteok(body).map_err(|e| ScrapeError::Parse {
            board: JobSource::Remoteok,
            message: e.to_string(),
        })?;
        Ok(jobs
            .into_iter()
            .filter(|job| matches_keywords(job, &query.keywords))
            .collect())
    }
}

/// Reads postings from the RemoteOK JSON feed.
pub fn parse_remoteok(json: &str) -> Result<Vec<ScrapedJob>, serde_json::Error> {
    let items: Vec<serde_json::Value> = serde_json::from_str(json)?;

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<Posting>(item).ok())
        .filter_map(|posting| {
            let title = posting.position.map(|p| clean_text(&p)).filter(|p| !p.is_empty())?;
            let url = posting.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;

            let mut description = posting
                .description
                .map(|d| html_to_text(&d))
                .unwrap_or_default();
            if !posting.tags.is_empty() {
                if !description.is_empty() {
                    description.push_str("\n\n");
                }
                description.push_str("Tags: ");
                description.push_str(&posting.tags.join(", "));
            }

            Some(ScrapedJob {
                title,
                company: posting.company.map(|c| clean_text(&c)).unwrap_or_default(),
                location: posting
                    .location
                    .map(|l| clean_text(&l))
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| "Remote".to_string()),
                description,
                url,
                source: JobSource::Remoteok,
                salary: format_salary(posting.salary_min, posting.salary_max),
                job_type: None,
                posted_at: posting.date,
            })
        })
        .collect())
}

fn html_to_text(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    clean_text(&parsed.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Every keyword word must appear somewhere in the title or description.
fn matches_keywords(job: &ScrapedJob, keywords: &str) -> bool {
    let haystack = format!("{} {}", job.title, job.description).to_lowercase();
    keywords
        .split_whitespace()
        .map(str::to_lowercase)
        .all(|word| haystack.contains(&word))
}

fn format_salary(min: Option<u64>, max: Option<u64>) -> Option<String> {
    match (min.filter(|v| *v > 0), max.filter(|v| *v > 0)) {
        (Some(min), Some(max)) if max > min => Some(format!("${} - ${}", thousands(min), thousands(max))),
        (Some(min), _) => Some(format!("${}+", thousands(min))),
        (None, Some(max)) => Some(format!("up to ${}", thousands(max))),
        (None, None) => None,
    }
}

fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"[
        {"last_updated": 1715000000, "legal": "API Terms of Service: ..."},
        {
            "id": "101", "slug": "rust-backend-engineer-acme-101",
            "position": "Rust Backend Engineer", "company": "Acme",
            "location": "", "date": "2024-05-01T12:00:00+00:00",
            "description": "<p>Build <b>async</b> services.</p><ul><li>Tokio</li><li>PostgreSQL</li></ul>",
            "tags": ["rust", "backend"], "salary_min": 120000, "salary_max": 160000,
            "url": "https://remoteok.com/remote-jobs/rust-backend-engineer-acme-101"
        },
        {
            "id": "102", "position": "Frontend Developer", "company": "Globex",
            "location": "Europe", "description": "React and TypeScript", "tags": [],
            "salary_min": 0, "salary_max": 0,
            "url": "https://remoteok.com/remote-jobs/frontend-developer-globex-102"
        },
        {"id": "103", "position": "Missing Url", "company": "Nowhere"}
    ]"#;

    fn query(keywords: &str) -> SearchQuery {
        SearchQuery {
            keywords: keywords.to_string(),
            location: String::new(),
            remote_only: true,
            limit: 25,
        }
    }

    #[test]
    fn test_skips_legal_notice_and_incomplete_postings() {
        let jobs = parse_remoteok(FEED).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].title, "Rust Backend Engineer");
        assert_eq!(jobs[1].company, "Globex");
    }

    #[test]
    fn test_description_is_plain_text_with_tags() {
        let jobs = parse_remoteok(FEED).unwrap();
        assert_eq!(
            jobs[0].description,
            "Build async services. Tokio PostgreSQL\n\nTags: rust, backend"
        );
        assert_eq!(jobs[0].location, "Remote");
        assert_eq!(jobs[1].location, "Europe");
    }

    #[test]
    fn test_salary_range_formatting() {
        let jobs = parse_remoteok(FEED).unwrap();
        assert_eq!(jobs[0].salary.as_deref(), Some("$120,000 - $160,000"));
        assert!(jobs[1].salary.is_none());
        assert_eq!(format_salary(Some(90_000), None).as_deref(), Some("$90,000+"));
        assert_eq!(thousands(1_250_000), "1,250,000");
        assert_eq!(thousands(999), "999");
    }

    #[test]
    fn test_board_filters_by_keywords() {
        let jobs = RemoteOk.parse(FEED, &query("rust engineer")).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company, "Acme");

        let all = RemoteOk.parse(FEED, &query("")).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_invalid_json_is_a_parse_error() {
        let err = RemoteOk.parse("<html>rate limited</html>", &query("rust")).unwrap_err();
        assert!(matches!(err, ScrapeError::Parse { .. }));
        assert!(err.to_string().contains("remoteok"));
    }
}
