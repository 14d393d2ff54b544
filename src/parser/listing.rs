use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::record::JobRecord;

static LISTING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li.jl").unwrap());
static JOBS_COUNT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p.jobsCount").unwrap());
static NEXT_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li.next a").unwrap());
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.jobContainer > a.jobTitle").unwrap());
// Glassdoor's own spelling.
static COMPANY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.jobEmpolyerName").unwrap());
static DATE_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.jobLabels span.jobLabel.nowrap").unwrap());
static LOGO_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.logoWrap a").unwrap());
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// What a search result page yields before any record is built.
#[derive(Debug, Default)]
pub struct ResultPage {
    /// Outer HTML of every listing on the page.
    pub fragments: Vec<String>,
    pub total_results: Option<usize>,
    pub next_href: Option<String>,
}

pub fn parse_result_page(html: &str) -> ResultPage {
    let doc = Html::parse_document(html);

    let fragments = doc.select(&LISTING).map(|el| el.html()).collect();

    let total_results = doc
        .select(&JOBS_COUNT)
        .next()
        .and_then(|el| parse_count(&element_text(el)));

    let next_href = doc
        .select(&NEXT_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    ResultPage {
        fragments,
        total_results,
        next_href,
    }
}

/// "1,234 Jobs" -> 1234
fn parse_count(text: &str) -> Option<usize> {
    let digits = text.replace(',', "");
    NUMBER_RE.find(&digits)?.as_str().parse().ok()
}

/// Build a record from one listing fragment. `None` when title, company or
/// location is missing; date, id and link fall back to empty strings.
pub fn extract_record(fragment: &str, base_url: &str) -> Option<JobRecord> {
    let doc = Html::parse_fragment(fragment);
    let listing = doc.select(&LISTING).next()?;

    let title = first_text(listing, &TITLE);
    let company = first_text(listing, &COMPANY);
    let location = listing
        .value()
        .attr("data-job-loc")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let (Some(title), Some(company), Some(location)) = (title, company, location) else {
        debug!("Dropping listing without title, company or location");
        return None;
    };

    let mut job = JobRecord::new(title, company, location);
    job.raw_date = first_text(listing, &DATE_LABEL).unwrap_or_default();
    job.id = listing
        .value()
        .attr("data-id")
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    job.link = listing
        .select(&LOGO_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| format!("{}{}", base_url, href))
        .unwrap_or_default();

    Some(job)
}

/// Extract every fragment in parallel, keeping input order and dropping rejects.
pub fn extract_records(fragments: &[String], base_url: &str) -> Vec<JobRecord> {
    fragments
        .par_iter()
        .filter_map(|f| extract_record(f, base_url))
        .collect()
}

fn first_text(scope: ElementRef, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.glassdoor.ca";

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn result_page_summary() {
        let page = parse_result_page(&fixture("search_page1"));
        assert_eq!(page.fragments.len(), 6);
        assert_eq!(page.total_results, Some(36));
        assert_eq!(
            page.next_href.as_deref(),
            Some("/Job/toronto-python-jobs-SRCH_IL.0,7_IC2281069_KO8,14_IP2.htm")
        );
    }

    #[test]
    fn empty_page_has_nothing() {
        let page = parse_result_page("<html><body><p>No jobs</p></body></html>");
        assert!(page.fragments.is_empty());
        assert_eq!(page.total_results, None);
        assert_eq!(page.next_href, None);
    }

    #[test]
    fn full_listing() {
        let page = parse_result_page(&fixture("search_page1"));
        let job = extract_record(&page.fragments[0], BASE).unwrap();
        assert_eq!(job.title, "Senior Python Developer");
        assert_eq!(job.company, "Northwind Analytics");
        assert_eq!(job.location, "Toronto, ON");
        assert_eq!(job.raw_date, "3d");
        assert_eq!(job.id, "3101");
        assert_eq!(
            job.link,
            "https://www.glassdoor.ca/partner/jobListing.htm?jobListingId=3101"
        );
        assert_eq!(job.blurb, "");
        assert_eq!(job.status, "new");
    }

    #[test]
    fn missing_company_is_rejected() {
        let fragment = r#"<li class="jl" data-id="9" data-job-loc="Ottawa, ON">
            <div class="jobContainer"><a class="jobLink jobInfoItem jobTitle" href="/x">Data Engineer</a></div>
        </li>"#;
        assert!(extract_record(fragment, BASE).is_none());
    }

    #[test]
    fn missing_link_keeps_record() {
        let fragment = r#"<li class="jl" data-id="10" data-job-loc="Ottawa, ON">
            <div class="jobContainer">
              <a class="jobLink jobInfoItem jobTitle" href="/x">Data Engineer</a>
              <div class="jobInfoItem jobEmpolyerName">Contoso</div>
            </div>
        </li>"#;
        let job = extract_record(fragment, BASE).unwrap();
        assert_eq!(job.id, "10");
        assert_eq!(job.link, "");
        assert_eq!(job.raw_date, "");
    }

    #[test]
    fn nested_title_link_is_not_the_title() {
        // The title anchor must be a direct child of the job container.
        let fragment = r#"<li class="jl" data-job-loc="Ottawa, ON">
            <div class="jobContainer">
              <span><a class="jobLink jobInfoItem jobTitle" href="/x">Nested</a></span>
              <div class="jobInfoItem jobEmpolyerName">Contoso</div>
            </div>
        </li>"#;
        assert!(extract_record(fragment, BASE).is_none());
    }

    #[test]
    fn fixture_page_yields_five_records() {
        let page = parse_result_page(&fixture("search_page1"));
        let jobs = extract_records(&page.fragments, BASE);
        assert_eq!(jobs.len(), 5);
        assert!(jobs.iter().all(|j| j.company != "Ghost Listing Inc"));
    }

    #[test]
    fn counts_with_separators() {
        assert_eq!(parse_count("1,234 Jobs"), Some(1234));
        assert_eq!(parse_count("Jobs"), None);
    }
}
