//! Background logo fetching
//!
//! Each request walks a fixed list of candidate URLs and stops at the first
//! one that yields a decodable image. Fetching happens on a worker thread;
//! the GUI drains finished outcomes once per frame.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use tiny_skia::Pixmap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::constants::logos::{AVATAR, CLEARBIT, MAX_BYTES, REQUEST_TIMEOUT_SECS, UPLEAD};
use crate::render::{decode_image, LogoCache};
use crate::store::CardStore;
use crate::types::CardId;

/// Lowercased company name with all whitespace removed
pub fn slug(company: &str) -> String {
    company
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Fallback chain: explicit URL, the two logo services, then the generated initials avatar
pub fn candidate_urls(company: &str, explicit: Option<&str>) -> Vec<String> {
    let mut urls = Vec::with_capacity(4);
    if let Some(url) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
        urls.push(url.to_string());
    }

    let slug = slug(company);
    if !slug.is_empty() {
        urls.push(format!("{CLEARBIT}{slug}.com"));
        urls.push(format!("{UPLEAD}{slug}.com"));
    }

    let avatar = reqwest::Url::parse_with_params(
        AVATAR,
        &[
            ("name", company),
            ("size", "128"),
            ("background", "1f2937"),
            ("color", "ffffff"),
            ("bold", "true"),
            ("format", "png"),
        ],
    );
    match avatar {
        Ok(url) => urls.push(url.into()),
        Err(e) => warn!(company = company, error = %e, "Could not build avatar URL"),
    }
    urls
}

/// Where logo bytes come from
pub trait ImageSource: Send + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned an error status"))?;
        if let Some(length) = response.content_length()
            && length as usize > MAX_BYTES
        {
            anyhow::bail!("Logo at {url} is too large ({length} bytes)");
        }
        let bytes = response.bytes().await.with_context(|| format!("Failed to read body of {url}"))?;
        if bytes.len() > MAX_BYTES {
            anyhow::bail!("Logo at {url} is too large ({} bytes)", bytes.len());
        }
        Ok(bytes.to_vec())
    }
}

/// Result of one request, as seen by the GUI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoOutcome {
    Loaded { card: CardId, url: String },
    Exhausted { card: CardId },
}

/// What applying a batch of outcomes changed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AppliedLogos {
    /// At least one card now shows its logo
    pub repaint: bool,
    /// A stored logo url changed, so the document needs saving
    pub persist: bool,
}

/// Mark loaded cards in `store`. Re-resolving a url the card already stores
/// only repaints; the loaded flag alone is never persisted.
pub fn apply_outcomes(store: &mut CardStore, outcomes: Vec<LogoOutcome>) -> AppliedLogos {
    let mut applied = AppliedLogos::default();
    for outcome in outcomes {
        match outcome {
            LogoOutcome::Loaded { card, url } => {
                if let Some(url_changed) = store.mark_logo_loaded(card, &url) {
                    applied.repaint = true;
                    applied.persist |= url_changed;
                }
            }
            LogoOutcome::Exhausted { card } => debug!(card = card, "Card keeps initials"),
        }
    }
    applied
}

struct Job {
    company: String,
    urls: Vec<String>,
}

struct Fetched {
    company: String,
    result: Option<(String, Pixmap)>,
}

pub struct LogoLoader {
    jobs: mpsc::UnboundedSender<Job>,
    fetched: std_mpsc::Receiver<Fetched>,
    cache: LogoCache,
    /// Source URL per cached company
    sources: HashMap<String, String>,
    /// Companies that already ran out of candidates
    exhausted: HashSet<String>,
    /// Cards waiting on an in-flight company
    waiting: HashMap<String, Vec<CardId>>,
    ready: VecDeque<LogoOutcome>,
    worker: Option<JoinHandle<()>>,
}

impl LogoLoader {
    pub fn spawn<S: ImageSource>(source: S) -> Result<Self> {
        let (jobs, job_rx) = mpsc::unbounded_channel();
        let (fetched_tx, fetched) = std_mpsc::channel();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build logo runtime")?;
        let worker = thread::Builder::new()
            .name("logo-loader".into())
            .spawn(move || runtime.block_on(run_loader(source, job_rx, fetched_tx)))
            .context("Failed to spawn logo loader thread")?;

        Ok(Self {
            jobs,
            fetched,
            cache: LogoCache::new(),
            sources: HashMap::new(),
            exhausted: HashSet::new(),
            waiting: HashMap::new(),
            ready: VecDeque::new(),
            worker: Some(worker),
        })
    }

    pub fn cache(&self) -> &LogoCache {
        &self.cache
    }

    /// Queue a fetch for `card`; cached companies resolve on the next `poll`
    pub fn request(&mut self, card: CardId, company: &str, explicit_url: Option<&str>) {
        if let Some(url) = self.sources.get(company) {
            self.ready.push_back(LogoOutcome::Loaded { card, url: url.clone() });
            return;
        }
        if self.exhausted.contains(company) {
            self.ready.push_back(LogoOutcome::Exhausted { card });
            return;
        }
        if let Some(cards) = self.waiting.get_mut(company) {
            cards.push(card);
            return;
        }

        let job = Job {
            company: company.to_string(),
            urls: candidate_urls(company, explicit_url),
        };
        if self.jobs.send(job).is_err() {
            warn!(company = company, "Logo loader stopped, request dropped");
            self.ready.push_back(LogoOutcome::Exhausted { card });
            return;
        }
        debug!(card = card, company = company, "Requested logo");
        self.waiting.insert(company.to_string(), vec![card]);
    }

    /// Drain finished fetches; decoded images land in `cache()`
    pub fn poll(&mut self) -> Vec<LogoOutcome> {
        while let Ok(fetched) = self.fetched.try_recv() {
            let cards = self.waiting.remove(&fetched.company).unwrap_or_default();
            match fetched.result {
                Some((url, image)) => {
                    self.cache.insert(fetched.company.clone(), image);
                    self.sources.insert(fetched.company, url.clone());
                    self.ready
                        .extend(cards.into_iter().map(|card| LogoOutcome::Loaded { card, url: url.clone() }));
                }
                None => {
                    self.exhausted.insert(fetched.company);
                    self.ready.extend(cards.into_iter().map(|card| LogoOutcome::Exhausted { card }));
                }
            }
        }
        self.ready.drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.waiting.is_empty() || !self.ready.is_empty()
    }
}

impl Drop for LogoLoader {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop
        let (closed, _) = mpsc::unbounded_channel();
        self.jobs = closed;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

async fn run_loader<S: ImageSource>(
    source: S,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    fetched: std_mpsc::Sender<Fetched>,
) {
    while let Some(job) = jobs.recv().await {
        let result = fetch_first(&source, &job).await;
        if fetched.send(Fetched { company: job.company, result }).is_err() {
            break;
        }
    }
}

async fn fetch_first<S: ImageSource>(source: &S, job: &Job) -> Option<(String, Pixmap)> {
    for url in &job.urls {
        let image = match source.fetch(url).await {
            Ok(bytes) => decode_image(&bytes),
            Err(e) => Err(e),
        };
        match image {
            Ok(image) => {
                info!(company = %job.company, url = %url, "Loaded logo");
                return Some((url.clone(), image));
            }
            Err(e) => debug!(company = %job.company, url = %url, error = %e, "Logo source failed"),
        }
    }
    info!(company = %job.company, "No logo found, keeping initials");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{NewCard, Snapshot};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeSource {
        images: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        requested: Arc<Mutex<Vec<String>>>,
    }

    impl FakeSource {
        fn serve(&self, url: &str, bytes: Vec<u8>) {
            self.images.lock().unwrap().insert(url.to_string(), bytes);
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl ImageSource for FakeSource {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.requested.lock().unwrap().push(url.to_string());
            self.images
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("404 for {url}"))
        }
    }

    fn red_png() -> Vec<u8> {
        let mut pixmap = Pixmap::new(1, 1).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(255, 0, 0, 255));
        pixmap.encode_png().unwrap()
    }

    fn blue_jpeg() -> Vec<u8> {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(16, 16, image::Rgb([20, 40, 220])))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    fn wait_for(loader: &mut LogoLoader, count: usize) -> Vec<LogoOutcome> {
        let mut outcomes = Vec::new();
        for _ in 0..200 {
            outcomes.extend(loader.poll());
            if outcomes.len() >= count {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        outcomes
    }

    #[test]
    fn test_candidate_urls() {
        let urls = candidate_urls("Acme Corp", Some("https://example.com/acme.png"));
        assert_eq!(urls[0], "https://example.com/acme.png");
        assert_eq!(urls[1], "https://logo.clearbit.com/acmecorp.com");
        assert_eq!(urls[2], "https://logo.uplead.com/acmecorp.com");
        assert!(urls[3].starts_with("https://ui-avatars.com/api/?name=Acme"));
        assert!(urls[3].contains("background=1f2937"));
        assert!(urls[3].ends_with("format=png"));

        let urls = candidate_urls("Gusto", Some("  "));
        assert_eq!(urls.len(), 3);
        assert_eq!(urls[0], "https://logo.clearbit.com/gusto.com");
    }

    #[test]
    fn test_falls_through_to_first_working_source() {
        let source = FakeSource::default();
        source.serve("https://logo.uplead.com/rippling.com", red_png());
        // Undecodable bytes count as a failure
        source.serve("https://logo.clearbit.com/rippling.com", b"<html>".to_vec());
        let mut loader = LogoLoader::spawn(source.clone()).unwrap();

        loader.request(7, "Rippling", None);
        let outcomes = wait_for(&mut loader, 1);

        assert_eq!(
            outcomes,
            vec![LogoOutcome::Loaded {
                card: 7,
                url: "https://logo.uplead.com/rippling.com".into()
            }]
        );
        assert_eq!(source.requested().len(), 2);
        assert_eq!(loader.cache().get("Rippling").unwrap().data(), &[255, 0, 0, 255]);
    }

    #[test]
    fn test_exhausted_chain() {
        let source = FakeSource::default();
        let mut loader = LogoLoader::spawn(source.clone()).unwrap();
        loader.request(1, "Nobody Inc", None);
        assert_eq!(wait_for(&mut loader, 1), vec![LogoOutcome::Exhausted { card: 1 }]);
        assert_eq!(source.requested().len(), 3);
        assert!(loader.cache().is_empty());
    }

    #[test]
    fn test_cached_company_resolves_without_fetch() {
        let source = FakeSource::default();
        source.serve("https://logo.clearbit.com/ramp.com", red_png());
        let mut loader = LogoLoader::spawn(source.clone()).unwrap();

        loader.request(1, "Ramp", None);
        // Second card for the same company while the first is in flight
        loader.request(2, "Ramp", None);
        let outcomes = wait_for(&mut loader, 2);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(source.requested().len(), 1);

        loader.request(3, "Ramp", None);
        assert_eq!(
            loader.poll(),
            vec![LogoOutcome::Loaded {
                card: 3,
                url: "https://logo.clearbit.com/ramp.com".into()
            }]
        );
        assert_eq!(source.requested().len(), 1);
        assert!(!loader.has_pending());
    }

    #[test]
    fn test_explicit_jpeg_url_is_used() {
        let source = FakeSource::default();
        source.serve("https://cdn.example.com/brex.jpg", blue_jpeg());
        let mut loader = LogoLoader::spawn(source.clone()).unwrap();

        loader.request(4, "Brex", Some("https://cdn.example.com/brex.jpg"));
        assert_eq!(
            wait_for(&mut loader, 1),
            vec![LogoOutcome::Loaded {
                card: 4,
                url: "https://cdn.example.com/brex.jpg".into()
            }]
        );
        assert_eq!(source.requested(), vec!["https://cdn.example.com/brex.jpg".to_string()]);
        assert_eq!(loader.cache().get("Brex").unwrap().width(), 16);
    }

    #[test]
    fn test_reloading_known_urls_does_not_persist() {
        let url = "https://logo.clearbit.com/gusto.com";
        let mut store = CardStore::new();
        let id = store.create(NewCard::new("Gusto").logo_url(Some(url.into()))).id;
        // A document arriving from elsewhere comes back with every logo unloaded
        store.import_snapshot(Snapshot {
            cards: store.cards().to_vec(),
            id_counter: store.next_id(),
            timestamp: time::OffsetDateTime::now_utc(),
        });
        assert!(!store.get(id).unwrap().logo_loaded);

        let applied = apply_outcomes(&mut store, vec![LogoOutcome::Loaded { card: id, url: url.into() }]);
        assert_eq!(applied, AppliedLogos { repaint: true, persist: false });
        assert!(store.get(id).unwrap().logo_loaded);

        let fresh = store.create(NewCard::new("Ramp")).id;
        let applied = apply_outcomes(
            &mut store,
            vec![
                LogoOutcome::Loaded {
                    card: fresh,
                    url: "https://logo.clearbit.com/ramp.com".into(),
                },
                LogoOutcome::Exhausted { card: id },
                LogoOutcome::Loaded { card: 999, url: url.into() },
            ],
        );
        assert_eq!(applied, AppliedLogos { repaint: true, persist: true });
    }

    #[test]
    fn test_outcomes_for_missing_cards_change_nothing() {
        let mut store = CardStore::new();
        let applied = apply_outcomes(&mut store, vec![LogoOutcome::Loaded { card: 5, url: "u".into() }]);
        assert_eq!(applied, AppliedLogos::default());
    }
}
