use std::future::Future;
use std::ops::RangeInclusive;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::client::Fetcher;
use crate::parser::{extract_blurb, parse_result_page};
use crate::record::JobMap;
use crate::search::PageUrlTemplate;

fn progress(len: usize, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{msg} [{elapsed_precise}] {bar:40} {pos}/{len}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(label.to_string());
    pb
}

/// Run every task on the runtime with at most `limit` in flight, then wait for
/// all of them. Results come back in submission order; a task that panics
/// yields `None`.
async fn run_bounded<T, Fut>(tasks: Vec<Fut>, limit: usize, pb: &ProgressBar) -> Vec<Option<T>>
where
    T: Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));

    let handles: Vec<_> = tasks
        .into_iter()
        .map(|task| {
            let sem = Arc::clone(&semaphore);
            let pb = pb.clone();
            tokio::spawn(async move {
                let _permit = sem.acquire().await.ok()?;
                let out = task.await;
                pb.inc(1);
                Some(out)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(out) => results.push(out),
            Err(e) => {
                warn!("Task aborted: {}", e);
                results.push(None);
            }
        }
    }
    results
}

/// Fetch result pages `pages` concurrently. Each page returns its own batch of
/// listing fragments; a page that fails contributes an empty batch.
pub async fn fetch_pages(
    fetcher: Arc<dyn Fetcher>,
    template: &PageUrlTemplate,
    pages: RangeInclusive<usize>,
    form: Vec<(String, String)>,
    limit: usize,
) -> Vec<Vec<String>> {
    let form = Arc::new(form);
    let tasks: Vec<_> = pages
        .map(|page| {
            let fetcher = Arc::clone(&fetcher);
            let form = Arc::clone(&form);
            let url = template.url_for(page);
            async move {
                info!("Getting glassdoor page {}: {}", page, url);
                match fetcher.post_form(&url, &form).await {
                    Ok(body) => parse_result_page(&body).fragments,
                    Err(e) => {
                        warn!("Page {} failed: {:#}", page, e);
                        Vec::new()
                    }
                }
            }
        })
        .collect();

    let pb = progress(tasks.len(), "pages");
    let batches: Vec<Vec<String>> = run_bounded(tasks, limit, &pb)
        .await
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();
    pb.finish_and_clear();

    let fragments: usize = batches.iter().map(Vec::len).sum();
    info!("Fetched {} pages ({} listings)", batches.len(), fragments);
    batches
}

/// Fill in `blurb` for every record of `provider` from its detail page.
/// Records whose detail page can't be fetched or parsed keep an empty blurb.
pub async fn fetch_blurbs(
    fetcher: Arc<dyn Fetcher>,
    jobs: &mut JobMap,
    provider: &str,
    limit: usize,
) {
    let targets: Vec<(String, String)> = jobs
        .iter()
        .filter(|(_, job)| job.provider == provider)
        .map(|(key, job)| (key.clone(), job.link.clone()))
        .collect();

    let keys: Vec<String> = targets.iter().map(|(key, _)| key.clone()).collect();
    let tasks: Vec<_> = targets
        .into_iter()
        .map(|(key, link)| {
            let fetcher = Arc::clone(&fetcher);
            async move {
                if link.is_empty() {
                    return String::new();
                }
                info!("Getting glassdoor search: {}", link);
                match fetcher.post_form(&link, &[]).await {
                    Ok(body) => extract_blurb(&body).unwrap_or_else(|| {
                        warn!("No description on detail page for {}", key);
                        String::new()
                    }),
                    Err(e) => {
                        warn!("Blurb fetch failed for {}: {:#}", key, e);
                        String::new()
                    }
                }
            }
        })
        .collect();

    let pb = progress(tasks.len(), "blurbs");
    let blurbs = run_bounded(tasks, limit, &pb).await;
    pb.finish_and_clear();

    let total = keys.len();
    let mut filled = 0usize;
    for (key, blurb) in keys.into_iter().zip(blurbs) {
        if let Some(job) = jobs.get_mut(&key) {
            let blurb = blurb.unwrap_or_default();
            if !blurb.is_empty() {
                filled += 1;
            }
            job.blurb = blurb;
        }
    }
    info!("Fetched blurbs for {}/{} jobs", filled, total);
}
