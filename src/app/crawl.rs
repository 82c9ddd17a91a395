use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;

use crate::config::CrawlSettings;
use crate::page::FetchedPage;
use crate::scrape::{PageOutcome, Scraper};

use super::types::CrawlEvent;

const STATUS_TRANSPORT: u16 = 600;
const STATUS_TIMEOUT: u16 = 601;
const STATUS_CONNECT: u16 = 602;
const STATUS_REDIRECT: u16 = 603;
const STATUS_BODY: u16 = 604;
const STATUS_REQUEST: u16 = 605;

const MAX_REDIRECTS: usize = 10;
const SHUTDOWN_POLL: Duration = Duration::from_millis(120);

pub(crate) struct AbortTaskOnDrop(pub(crate) tokio::task::AbortHandle);

impl Drop for AbortTaskOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn send_status(tx: &UnboundedSender<CrawlEvent>, message: impl Into<String>) {
    let _ = tx.send(CrawlEvent::Status(message.into()));
}

pub fn build_client(settings: &CrawlSettings) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(settings.user_agent.clone())
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .pool_max_idle_per_host(32)
        .build()
}

/// Breadth-first crawl from `seeds` until the frontier drains, `max_pages`
/// fetches have been issued, or `shutdown` is raised. Returns the number of
/// pages fetched. Always sends [`CrawlEvent::Finished`] last.
pub async fn run_crawler(
    scraper: Arc<Scraper>,
    client: reqwest::Client,
    settings: CrawlSettings,
    seeds: Vec<String>,
    shutdown: Arc<AtomicBool>,
    tx: UnboundedSender<CrawlEvent>,
) -> usize {
    let fetched = crawl_frontier(&scraper, &client, &settings, seeds, &shutdown, &tx).await;
    let _ = tx.send(CrawlEvent::Finished);
    fetched
}

async fn crawl_frontier(
    scraper: &Arc<Scraper>,
    client: &reqwest::Client,
    settings: &CrawlSettings,
    seeds: Vec<String>,
    shutdown: &AtomicBool,
    tx: &UnboundedSender<CrawlEvent>,
) -> usize {
    let concurrency = settings.sanitized_concurrency();
    let mut queue = VecDeque::new();
    let mut queued = HashSet::new();

    for seed in seeds {
        let canonical = scraper.canonicalize(&seed);
        if !scraper.is_valid(&canonical) {
            let _ = tx.send(CrawlEvent::Error(format!("seed rejected: {seed}")));
            continue;
        }
        if queued.insert(canonical.clone()) {
            queue.push_back(canonical);
        }
    }
    if queue.is_empty() {
        let _ = tx.send(CrawlEvent::Error("no valid seed URLs".to_string()));
        return 0;
    }
    send_status(
        tx,
        format!("crawling {} seed(s) with {concurrency} workers", queue.len()),
    );

    let mut set: JoinSet<(String, u16, Vec<String>, PageOutcome)> = JoinSet::new();
    let mut fetched = 0usize;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            send_status(tx, "shutdown requested, stopping crawl");
            set.abort_all();
            while set.join_next().await.is_some() {}
            break;
        }

        while set.len() < concurrency && fetched < settings.max_pages {
            let Some(url) = queue.pop_front() else {
                break;
            };
            fetched += 1;
            set.spawn(process_single_url(url, client.clone(), scraper.clone()));
        }

        if set.is_empty() {
            if fetched >= settings.max_pages && !queue.is_empty() {
                send_status(
                    tx,
                    format!("page limit {} reached, {} URL(s) left", settings.max_pages, queue.len()),
                );
            }
            break;
        }

        let joined = tokio::select! {
            joined = set.join_next() => joined,
            _ = tokio::time::sleep(SHUTDOWN_POLL) => continue,
        };
        let Some(joined) = joined else {
            continue;
        };
        match joined {
            Ok((url, status, links, outcome)) => {
                let mut discovered = 0;
                for link in links {
                    if queued.insert(link.clone()) {
                        queue.push_back(link);
                        discovered += 1;
                    }
                }
                let _ = tx.send(CrawlEvent::Page {
                    url,
                    status,
                    outcome,
                    discovered,
                });
            }
            Err(err) => {
                let _ = tx.send(CrawlEvent::Error(format!("fetch worker failed: {err}")));
            }
        }
    }
    fetched
}

async fn process_single_url(
    url: String,
    client: reqwest::Client,
    scraper: Arc<Scraper>,
) -> (String, u16, Vec<String>, PageOutcome) {
    let page = fetch_page(&client, &url).await;
    let status = page.status;
    let requested = url.clone();
    let scraped =
        tokio::task::spawn_blocking(move || scraper.scrape_with_outcome(&requested, Some(&page)))
            .await;
    match scraped {
        Ok((links, outcome)) => (url, status, links, outcome),
        Err(err) => {
            tracing::warn!(%url, error = %err, "scrape task failed");
            (url, status, Vec::new(), PageOutcome::Missing)
        }
    }
}

/// Fetch `url` into a [`FetchedPage`]. Transport failures become a page
/// with a synthetic 6xx status and an empty body.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> FetchedPage {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(%url, error = %err, "request failed");
            return FetchedPage::new(url, transport_status(&err)).with_body(Vec::new());
        }
    };

    let status = response.status().as_u16();
    let mut page = FetchedPage::new(url, status).with_final_url(response.url().as_str());
    for (name, value) in response.headers() {
        if let Ok(value) = value.to_str() {
            page = page.with_header(name.as_str(), value);
        }
    }

    match response.bytes().await {
        Ok(bytes) => page.with_body(bytes.to_vec()),
        Err(err) => {
            tracing::warn!(%url, error = %err, "body read failed");
            FetchedPage {
                status: STATUS_BODY,
                ..page
            }
            .with_body(Vec::new())
        }
    }
}

pub fn transport_status(err: &reqwest::Error) -> u16 {
    if err.is_timeout() {
        STATUS_TIMEOUT
    } else if err.is_connect() {
        STATUS_CONNECT
    } else if err.is_redirect() {
        STATUS_REDIRECT
    } else if err.is_body() || err.is_decode() {
        STATUS_BODY
    } else if err.is_builder() || err.is_request() {
        STATUS_REQUEST
    } else {
        STATUS_TRANSPORT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::Analytics;
    use crate::config::CrawlPolicy;
    use tokio::sync::mpsc;

    fn scraper() -> Arc<Scraper> {
        let policy = Arc::new(CrawlPolicy::default());
        Arc::new(Scraper::new(policy.clone(), Arc::new(Analytics::new(policy))))
    }

    #[test]
    fn test_transport_statuses_are_bad() {
        let policy = CrawlPolicy::default();
        for status in [
            STATUS_TRANSPORT,
            STATUS_TIMEOUT,
            STATUS_CONNECT,
            STATUS_REDIRECT,
            STATUS_BODY,
            STATUS_REQUEST,
        ] {
            assert!(policy.is_bad_status(status), "{status} not treated as bad");
        }
    }

    #[tokio::test]
    async fn test_rejected_seeds_finish_without_fetching() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let client = build_client(&CrawlSettings::default()).unwrap();
        let fetched = run_crawler(
            scraper(),
            client,
            CrawlSettings::default(),
            vec!["https://example.com/".to_string(), "ftp://ics.uci.edu/".to_string()],
            Arc::new(AtomicBool::new(false)),
            tx,
        )
        .await;
        assert_eq!(fetched, 0);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(events.last(), Some(CrawlEvent::Finished)));
        let errors = events
            .iter()
            .filter(|e| matches!(e, CrawlEvent::Error(_)))
            .count();
        assert_eq!(errors, 3);
    }

    #[tokio::test]
    async fn test_shutdown_before_start_fetches_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let client = build_client(&CrawlSettings::default()).unwrap();
        run_crawler(
            scraper(),
            client,
            CrawlSettings::default(),
            vec!["https://www.ics.uci.edu/".to_string()],
            Arc::new(AtomicBool::new(true)),
            tx,
        )
        .await;
        let mut saw_page = false;
        let mut finished = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                CrawlEvent::Page { .. } => saw_page = true,
                CrawlEvent::Finished => finished = true,
                _ => {}
            }
        }
        assert!(!saw_page);
        assert!(finished);
    }
}
