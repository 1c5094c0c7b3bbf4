use reqwest::{Client, RequestBuilder};
use scraper::Html;

use super::html::{absolutize, find_attr, find_text, select_cards, strip_query};
use super::{JobBoard, ScrapeError, ScrapedJob, SearchQuery};
use crate::models::job::JobSource;

const BASE_URL: &str = "https://www.linkedin.com";
const GUEST_SEARCH_PATH: &str = "/jobs-guest/jobs/api/seeMoreJobPostings/search";

const CARD_SELECTORS: &[&str] = &["div.base-card", "li div.job-search-card", "li.result-card"];
const TITLE_SELECTORS: &[&str] = &["h3.base-search-card__title", "h3.result-card__title", "h3"];
const COMPANY_SELECTORS: &[&str] = &[
    "h4.base-search-card__subtitle",
    "h4.result-card__subtitle",
    "h4",
];
const LOCATION_SELECTORS: &[&str] = &["span.job-search-card__location", "span.job-result-card__location"];
const LINK_SELECTORS: &[&str] = &["a.base-card__full-link", "a.result-card__full-card-link", "a[href]"];
const SALARY_SELECTORS: &[&str] = &["span.job-search-card__salary-info"];

pub struct LinkedIn;

impl JobBoard for LinkedIn {
    fn source(&self) -> JobSource {
        JobSource::Linkedin
    }

    fn request(&self, client: &Client, query: &SearchQuery) -> RequestBuilder {
        let mut params = vec![
            ("keywords", query.keywords.clone()),
            ("location", query.location.clone()),
            ("start", "0".to_string()),
        ];
        if query.remote_only {
            // f_WT=2 is LinkedIn's "remote" workplace type
            params.push(("f_WT", "2".to_string()));
        }
        client.get(format!("{BASE_URL}{GUEST_SEARCH_PATH}")).query(&params)
    }

    fn parse(&self, body: &str, _query: &SearchQuery) -> Result<Vec<ScrapedJob>, ScrapeError> {
        Ok(parse_linkedin(body))
    }
}

/// Reads cards from LinkedIn's guest job search fragment.
/// The listing has no description; it stays empty until the job is edited.
pub fn parse_linkedin(html: &str) -> Vec<ScrapedJob> {
    let document = Html::parse_document(html);

    select_cards(&document, CARD_SELECTORS)
        .into_iter()
        .filter_map(|card| {
            let title = find_text(card, TITLE_SELECTORS)?;
            let href = find_attr(card, LINK_SELECTORS, "href")?;
            let url = strip_query(&absolutize(BASE_URL, &href)).to_string();

            Some(ScrapedJob {
                title,
                company: find_text(card, COMPANY_SELECTORS).unwrap_or_default(),
                location: find_text(card, LOCATION_SELECTORS).unwrap_or_default(),
                description: String::new(),
                url,
                source: JobSource::Linkedin,
                salary: find_text(card, SALARY_SELECTORS),
                job_type: None,
                posted_at: find_attr(card, &["time[datetime]"], "datetime"),
            })
        })
        .collect()
}
