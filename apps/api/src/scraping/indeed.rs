use reqwest::{Client, RequestBuilder};
use scraper::Html;

use super::html::{absolutize, find_attr, find_text, select_cards};
use super::{JobBoard, ScrapeError, ScrapedJob, SearchQuery};
use crate::models::job::JobSource;

const BASE_URL: &str = "https://www.indeed.com";

const CARD_SELECTORS: &[&str] = &[
    "div.job_seen_beacon",
    "div.jobsearch-SerpJobCard",
    "li div.cardOutline",
    "a.tapItem",
];
const TITLE_SELECTORS: &[&str] = &["h2.jobTitle span[title]", "h2.jobTitle a span", "h2.jobTitle", "h2"];
const COMPANY_SELECTORS: &[&str] = &[
    "span[data-testid='company-name']",
    "span.companyName",
    "span.company",
];
const LOCATION_SELECTORS: &[&str] = &[
    "div[data-testid='text-location']",
    "div.companyLocation",
    "span.location",
];
const SNIPPET_SELECTORS: &[&str] = &["div.job-snippet", "div[data-testid='jobsnippet_footer']", "td.snippet"];
const SALARY_SELECTORS: &[&str] = &[
    "div.salary-snippet-container",
    "div.metadata.salary-snippet-container",
    "span.salaryText",
];
const DATE_SELECTORS: &[&str] = &["span[data-testid='myJobsStateDate']", "span.date"];

pub struct Indeed;

impl JobBoard for Indeed {
    fn source(&self) -> JobSource {
        JobSource::Indeed
    }

    fn request(&self, client: &Client, query: &SearchQuery) -> RequestBuilder {
        let mut params = vec![("q", query.keywords.clone()), ("l", query.location.clone())];
        if query.remote_only {
            // Indeed's "remote" attribute filter
            params.push(("sc", "0kf:attr(DSQF7);".to_string()));
        }
        client.get(format!("{BASE_URL}/jobs")).query(&params)
    }

    fn parse(&self, body: &str, _query: &SearchQuery) -> Result<Vec<ScrapedJob>, ScrapeError> {
        Ok(parse_indeed(body))
    }
}

/// Reads job cards off an Indeed search result page.
pub fn parse_indeed(html: &str) -> Vec<ScrapedJob> {
    let document = Html::parse_document(html);

    select_cards(&document, CARD_SELECTORS)
        .into_iter()
        .filter_map(|card| {
            let title = find_text(card, TITLE_SELECTORS)?;
            let url = match find_attr(card, &["a[data-jk]", "[data-jk]"], "data-jk") {
                Some(jk) => format!("{BASE_URL}/viewjob?jk={jk}"),
                None => absolutize(BASE_URL, &find_attr(card, &["h2 a[href]", "a[href]"], "href")?),
            };

            Some(ScrapedJob {
                title,
                company: find_text(card, COMPANY_SELECTORS).unwrap_or_default(),
                location: find_text(card, LOCATION_SELECTORS).unwrap_or_default(),
                description: find_text(card, SNIPPET_SELECTORS).unwrap_or_default(),
                url,
                source: JobSource::Indeed,
                salary: find_text(card, SALARY_SELECTORS),
                job_type: None,
                posted_at: find_text(card, DATE_SELECTORS),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body><ul>
          <li><div class="job_seen_beacon">
            <h2 class="jobTitle"><a data-jk="abc123" href="/rc/clk?jk=abc123&from=serp">
              <span title="Senior Rust Engineer">Senior Rust Engineer</span></a></h2>
            <span data-testid="company-name">Ferrous Systems</span>
            <div data-testid="text-location">Remote
               in Berlin</div>
            <div class="salary-snippet-container">$150,000 - $180,000 a year</div>
            <div class="job-snippet"><ul><li>Build async services with Tokio</li>
              <li>Own PostgreSQL schemas</li></ul></div>
            <span class="date">Posted 3 days ago</span>
          </div></li>
          <li><div class="job_seen_beacon">
            <h2 class="jobTitle"><a href="/company/Acme/jobs/Backend-Dev-77">
              <span title="Backend Developer">Backend Developer</span></a></h2>
            <span class="companyName">Acme</span>
          </div></li>
          <li><div class="job_seen_beacon">
            <span class="companyName">No Title Inc</span>
          </div></li>
        </ul></body></html>
    "#;

    #[test]
    fn test_parses_cards_and_builds_viewjob_url() {
        let jobs = parse_indeed(PAGE);
        assert_eq!(jobs.len(), 2);

        let first = &jobs[0];
        assert_eq!(first.title, "Senior Rust Engineer");
        assert_eq!(first.company, "Ferrous Systems");
        assert_eq!(first.location, "Remote in Berlin");
        assert_eq!(first.url, "https://www.indeed.com/viewjob?jk=abc123");
        assert_eq!(first.salary.as_deref(), Some("$150,000 - $180,000 a year"));
        assert_eq!(
            first.description,
            "Build async services with Tokio Own PostgreSQL schemas"
        );
        assert_eq!(first.posted_at.as_deref(), Some("Posted 3 days ago"));
        assert_eq!(first.source, JobSource::Indeed);
    }

    #[test]
    fn test_relative_href_is_resolved_when_no_job_key() {
        let jobs = parse_indeed(PAGE);
        assert_eq!(jobs[1].url, "https://www.indeed.com/company/Acme/jobs/Backend-Dev-77");
        assert_eq!(jobs[1].company, "Acme");
        assert!(jobs[1].salary.is_none());
    }

    #[test]
    fn test_legacy_card_markup() {
        let page = r#"<div class="jobsearch-SerpJobCard">
            <h2><a href="/viewjob?jk=old1">Data Engineer</a></h2>
            <span class="company">OldCo</span></div>"#;
        let jobs = parse_indeed(page);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Data Engineer");
        assert_eq!(jobs[0].url, "https://www.indeed.com/viewjob?jk=old1");
    }

    #[test]
    fn test_page_without_cards_is_empty() {
        assert!(parse_indeed("<html><body>blocked</body></html>").is_empty());
    }
}
