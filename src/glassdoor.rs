use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::Fetcher;
use crate::crawl;
use crate::dedup::{self, MasterDataset};
use crate::error::ScrapeError;
use crate::parser::{extract_records, parse_result_page, DateNormalizer};
use crate::record::{JobMap, PROVIDER};
use crate::search::{PageUrlTemplate, PaginationPlan, SearchQuery};

/// One scrape of Glassdoor for a single query.
pub struct GlassdoorScraper {
    fetcher: Arc<dyn Fetcher>,
    query: SearchQuery,
    max_concurrency: usize,
    anchor: NaiveDateTime,
}

impl GlassdoorScraper {
    /// Relative post ages are resolved against the moment of construction.
    pub fn new(fetcher: Arc<dyn Fetcher>, query: SearchQuery, max_concurrency: usize) -> Self {
        GlassdoorScraper {
            fetcher,
            query,
            max_concurrency,
            anchor: chrono::Local::now().naive_local(),
        }
    }

    #[cfg(test)]
    pub fn with_anchor(mut self, anchor: NaiveDateTime) -> Self {
        self.anchor = anchor;
        self
    }

    /// Look up Glassdoor's location id for the configured city.
    pub async fn resolve_location(&self) -> Result<String, ScrapeError> {
        let unresolved = |reason: String| ScrapeError::LocationUnresolved {
            city: self.query.city.clone(),
            reason,
        };

        let body = self
            .fetcher
            .post_form(&self.query.location_url(), &self.query.location_form())
            .await
            .map_err(|e| unresolved(format!("{:#}", e)))?;

        let json: Value =
            serde_json::from_str(&body).map_err(|e| unresolved(e.to_string()))?;

        match json.get(0).and_then(|loc| loc.get("locationId")) {
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            _ => Err(unresolved("no locationId in response".into())),
        }
    }

    /// Run the whole pipeline. Only location resolution can fail; every later
    /// problem shows up as fewer records or empty fields.
    pub async fn scrape(&self, master: Option<&MasterDataset>) -> Result<JobMap, ScrapeError> {
        info!("glassdoor scrape running @ {}", self.anchor.format("%Y-%m-%d %H:%M"));

        let location_id = self.resolve_location().await?;
        let form = self.query.search_form(&location_id);
        let query = self.query.keyword_query();

        let first = match self.fetcher.post_form(&self.query.search_url(), &form).await {
            Ok(body) => body,
            Err(e) => {
                warn!("First results page failed for query={}: {:#}", query, e);
                return Ok(JobMap::new());
            }
        };
        let page1 = parse_result_page(&first);

        let total = page1.total_results.unwrap_or_else(|| {
            warn!("No result count on first page, using its {} listings", page1.fragments.len());
            page1.fragments.len()
        });
        let plan = PaginationPlan::new(total, self.query.page_size);
        info!(
            "Found {} glassdoor results for query={} ({} pages)",
            plan.total_results, query, plan.page_count
        );

        let mut fragments = page1.fragments;
        if plan.page_count > 1 {
            let template = page1
                .next_href
                .as_deref()
                .and_then(|href| PageUrlTemplate::from_next_href(&self.query.base_url(), href));
            match template {
                Some(template) => {
                    let batches = crawl::fetch_pages(
                        Arc::clone(&self.fetcher),
                        &template,
                        plan.remaining_pages(),
                        form,
                        self.max_concurrency,
                    )
                    .await;
                    fragments.extend(batches.into_iter().flatten());
                }
                None => warn!("No next-page link on first page; keeping page 1 only"),
            }
        }

        let normalizer = DateNormalizer::new(self.anchor);
        let mut jobs = JobMap::new();
        for mut job in extract_records(&fragments, &self.query.base_url()) {
            normalizer.apply(&mut job);
            jobs.insert(job.id.clone(), job);
        }
        info!("Extracted {} jobs from {} listings", jobs.len(), fragments.len());

        if let Some(master) = master {
            dedup::remove_known(&mut jobs, master, PROVIDER);
        }

        crawl::fetch_blurbs(Arc::clone(&self.fetcher), &mut jobs, PROVIDER, self.max_concurrency)
            .await;

        Ok(jobs)
    }
}
