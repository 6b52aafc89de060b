//! Detail-page enrichment.
//!
//! [`Enricher`] turns one candidate into one record; [`EnrichService`]
//! runs it over a whole listing on a bounded pool and hands back records
//! in discovery order.

mod types;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::extract::DetailParser;
use crate::models::{CandidateItem, EnrichedRecord};
use crate::scrapers::{FetchResponse, PageFetcher};

pub use types::{EnrichConfig, EnrichEvent};

/// Fetches and parses a single detail page.
pub struct Enricher {
    fetcher: Arc<dyn PageFetcher>,
    parser: DetailParser,
    timeout: Duration,
}

impl Enricher {
    pub fn new(fetcher: Arc<dyn PageFetcher>, parser: DetailParser, timeout: Duration) -> Self {
        Self {
            fetcher,
            parser,
            timeout,
        }
    }

    /// Enrich `candidate`. Never fails: problems land on the record's
    /// error list and the fields they would have filled stay empty.
    pub async fn enrich(&self, candidate: CandidateItem) -> EnrichedRecord {
        let mut record = EnrichedRecord::from_candidate(candidate);
        let url = record.candidate.detail_url.clone();

        let response = match self
            .fetcher
            .get(&url, self.timeout)
            .await
            .and_then(FetchResponse::error_for_status)
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                record.errors.push(format!("fetch_error:{}", e));
                return record;
            }
        };

        match self.parser.parse(&response.text(), &url) {
            Ok(fields) => fields.apply_to(&mut record),
            Err(e) => {
                warn!("Failed to parse {}: {}", url, e);
                record.errors.push(format!("parse_error:{}", e));
            }
        }
        debug!("Enriched {}", url);
        record
    }
}

/// Drop repeated candidates, keeping the first occurrence of each key.
pub fn dedup_candidates(candidates: Vec<CandidateItem>) -> Vec<CandidateItem> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.dedup_key.clone()))
        .collect()
}

/// Runs an [`Enricher`] over many candidates with bounded concurrency.
pub struct EnrichService {
    enricher: Arc<Enricher>,
    workers: usize,
}

impl EnrichService {
    pub fn new(fetcher: Arc<dyn PageFetcher>, parser: DetailParser, config: EnrichConfig) -> Self {
        Self {
            enricher: Arc::new(Enricher::new(fetcher, parser, config.request_timeout)),
            workers: config.workers.max(1),
        }
    }

    /// Enrich every distinct candidate exactly once.
    ///
    /// The output holds one record per deduplicated candidate, in input
    /// order. A worker that panics yields an unenriched record carrying
    /// `worker_error:<detail>`.
    pub async fn enrich_all(
        &self,
        candidates: Vec<CandidateItem>,
        event_tx: Option<mpsc::Sender<EnrichEvent>>,
    ) -> Vec<EnrichedRecord> {
        let candidates = dedup_candidates(candidates);
        info!(
            "Enriching {} items with {} workers",
            candidates.len(),
            self.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let handles: Vec<_> = candidates
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, candidate)| {
                let enricher = self.enricher.clone();
                let semaphore = semaphore.clone();
                let event_tx = event_tx.clone();

                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    let url = candidate.detail_url.clone();
                    if let Some(tx) = &event_tx {
                        let _ = tx
                            .send(EnrichEvent::Started {
                                index,
                                url: url.clone(),
                            })
                            .await;
                    }

                    let record = enricher.enrich(candidate).await;

                    if let Some(tx) = &event_tx {
                        let _ = tx
                            .send(EnrichEvent::Completed {
                                index,
                                url,
                                errors: record.errors.len(),
                            })
                            .await;
                    }
                    record
                })
            })
            .collect();

        let outcomes = join_all(handles).await;

        let mut records = Vec::with_capacity(candidates.len());
        for (index, (outcome, candidate)) in outcomes.into_iter().zip(candidates).enumerate() {
            match outcome {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Worker for {} failed: {}", candidate.detail_url, e);
                    if let Some(tx) = &event_tx {
                        let _ = tx
                            .send(EnrichEvent::Failed {
                                index,
                                url: candidate.detail_url.clone(),
                                error: e.to_string(),
                            })
                            .await;
                    }
                    records.push(EnrichedRecord::failed(
                        candidate,
                        format!("worker_error:{}", e),
                    ));
                }
            }
        }

        let failed = records.iter().filter(|r| !r.errors.is_empty()).count();
        info!(
            "Enrichment finished: {} records, {} with errors",
            records.len(),
            failed
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::DetailSelectors;
    use crate::scrapers::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Serves canned pages, with an optional per-URL delay.
    struct FakeFetcher {
        pages: HashMap<String, (u16, String)>,
        delays: HashMap<String, u64>,
        panic_on: Option<String>,
    }

    impl FakeFetcher {
        fn new() -> Self {
            Self {
                pages: HashMap::new(),
                delays: HashMap::new(),
                panic_on: None,
            }
        }

        fn page(mut self, url: &str, status: u16, body: &str) -> Self {
            self.pages.insert(url.to_string(), (status, body.to_string()));
            self
        }

        fn delay(mut self, url: &str, millis: u64) -> Self {
            self.delays.insert(url.to_string(), millis);
            self
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn get(&self, url: &str, _timeout: Duration) -> Result<FetchResponse, FetchError> {
            if let Some(millis) = self.delays.get(url) {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
            if self.panic_on.as_deref() == Some(url) {
                panic!("fetcher blew up");
            }
            let (status, body) = self.pages.get(url).cloned().unwrap_or((404, String::new()));
            Ok(FetchResponse {
                url: url.to_string(),
                status,
                body: body.into_bytes(),
            })
        }
    }

    fn parser() -> DetailParser {
        DetailParser::new(&DetailSelectors::default()).unwrap()
    }

    fn enricher(fetcher: FakeFetcher) -> Enricher {
        Enricher::new(Arc::new(fetcher), parser(), Duration::from_secs(1))
    }

    fn service(fetcher: FakeFetcher, workers: usize) -> EnrichService {
        let config = EnrichConfig {
            workers,
            request_timeout: Duration::from_secs(1),
        };
        EnrichService::new(Arc::new(fetcher), parser(), config)
    }

    fn candidate(n: usize) -> CandidateItem {
        CandidateItem::new(format!("https://shop.test/p/{}/", n))
    }

    fn price_page(price: &str) -> String {
        format!(r#"<p class="price"><span>{}</span></p>"#, price)
    }

    #[tokio::test]
    async fn test_enrich_parses_fields() {
        let fetcher = FakeFetcher::new().page(
            "https://shop.test/p/1/",
            200,
            r#"<p class="price"><del>20</del><ins>15</ins></p>
               <div class="star-rating" aria-label="Rated 4,5 out of 5"></div>
               <div class="product"><img src="/full.jpg"></div>"#,
        );
        let record = enricher(fetcher).enrich(candidate(1)).await;
        assert!(record.errors.is_empty());
        assert_eq!(record.price.as_deref(), Some("20"));
        assert_eq!(record.discount_price.as_deref(), Some("15"));
        assert_eq!(record.rating.as_deref(), Some("4.5"));
        assert_eq!(record.asset_url.as_deref(), Some("https://shop.test/full.jpg"));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_record_unenriched() {
        let record = enricher(FakeFetcher::new()).enrich(candidate(7)).await;
        assert_eq!(record.errors.len(), 1);
        assert!(record.errors[0].starts_with("fetch_error:"));
        assert!(record.errors[0].contains("404"));
        assert!(record.price.is_none());
        assert!(record.rating.is_none());
        assert!(record.attributes.is_empty());
        assert!(record.asset_url.is_none());
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let first = CandidateItem::new("https://shop.test/p/1/").with_title(Some("first".into()));
        let again = CandidateItem::new("https://shop.test/p/1/#reviews")
            .with_title(Some("again".into()));
        let other = candidate(2);

        let deduped = dedup_candidates(vec![first.clone(), other.clone(), again]);
        assert_eq!(deduped, vec![first, other]);
    }

    #[tokio::test]
    async fn test_order_preserved_under_uneven_delays() {
        let mut fetcher = FakeFetcher::new();
        for n in 0..20 {
            let url = format!("https://shop.test/p/{}/", n);
            fetcher = fetcher
                .page(&url, 200, &price_page(&n.to_string()))
                .delay(&url, ((n * 37) % 11) as u64 * 3);
        }
        let service = service(fetcher, 4);

        let candidates: Vec<_> = (0..20).map(candidate).collect();
        let records = service.enrich_all(candidates.clone(), None).await;

        assert_eq!(records.len(), 20);
        for (n, (record, candidate)) in records.iter().zip(&candidates).enumerate() {
            assert_eq!(&record.candidate, candidate);
            assert_eq!(record.price.as_deref(), Some(n.to_string().as_str()));
        }
    }

    #[tokio::test]
    async fn test_duplicates_enriched_once() {
        let fetcher = FakeFetcher::new().page("https://shop.test/p/1/", 200, &price_page("9"));
        let service = service(fetcher, 2);

        let records = service
            .enrich_all(vec![candidate(1), candidate(1), candidate(1)], None)
            .await;
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_panicking_worker_is_isolated() {
        let mut fetcher = FakeFetcher::new()
            .page("https://shop.test/p/0/", 200, &price_page("1"))
            .page("https://shop.test/p/2/", 200, &price_page("3"));
        fetcher.panic_on = Some("https://shop.test/p/1/".to_string());

        let (tx, mut rx) = mpsc::channel(32);
        let service = service(fetcher, 3);
        let records = service
            .enrich_all((0..3).map(candidate).collect(), Some(tx))
            .await;

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].price.as_deref(), Some("1"));
        assert_eq!(records[2].price.as_deref(), Some("3"));
        assert_eq!(records[1].candidate, candidate(1));
        assert_eq!(records[1].errors.len(), 1);
        assert!(records[1].errors[0].starts_with("worker_error:"));

        let mut failed = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let EnrichEvent::Failed { index, .. } = event {
                failed.push(index);
            }
        }
        assert_eq!(failed, vec![1]);
    }

    #[tokio::test]
    async fn test_zero_workers_still_runs() {
        let fetcher = FakeFetcher::new().page("https://shop.test/p/1/", 200, &price_page("5"));
        let config = EnrichConfig {
            workers: 0,
            ..Default::default()
        };
        assert_eq!(EnrichConfig::default().workers, 12);

        let service = EnrichService::new(Arc::new(fetcher), parser(), config);
        let records = service.enrich_all(vec![candidate(1)], None).await;
        assert_eq!(records[0].price.as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let service = service(FakeFetcher::new(), 12);
        assert!(service.enrich_all(Vec::new(), None).await.is_empty());
    }
}
