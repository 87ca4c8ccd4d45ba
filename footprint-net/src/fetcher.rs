//! Compliant fetcher
//!
//! A single fetch walks a fixed pipeline, each step an early return:
//! rate-limit check, robots.txt check, politeness spacing, a bounded retry
//! loop, content-type parsing, field filtering and provenance. Policy
//! denials and network failures come back as [`FetchOutcome`] values, never
//! as errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use footprint_core::{
    normalize_url, AttributionReport, CollectedRecord, DataSource, InMemoryProvenance,
    PolitenessConfig, ProvenanceStore, SourceType,
};
use rand::Rng;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::{
    create_client, domain_key, extract_html_fields, extract_json_fields, filter_public_fields,
    parse_http_url, read_body_limited, ContentKind, NetError, RateLimiter, RobotsPolicyCache,
};

/// Upper bound on per-domain spacing, whatever robots.txt declares
const MAX_SPACING_SECS: f64 = 300.0;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub requested_url: String,
    /// URL after redirects
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: String,
    /// Filtered public fields; `None` when the body could not be parsed
    pub record: Option<CollectedRecord>,
}

impl FetchedPage {
    pub fn was_redirected(&self) -> bool {
        normalize_url(&self.requested_url) != normalize_url(&self.final_url)
    }
}

/// Result of a single fetch
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched(FetchedPage),
    /// The domain's request window is full
    RateLimited,
    /// robots.txt disallows the URL
    RobotsBlocked,
    /// 403/404, other client errors, or retries exhausted
    NotFound(String),
    InvalidUrl(String),
}

impl FetchOutcome {
    pub fn page(self) -> Option<FetchedPage> {
        match self {
            FetchOutcome::Fetched(page) => Some(page),
            _ => None,
        }
    }

    pub fn is_robots_blocked(&self) -> bool {
        matches!(self, FetchOutcome::RobotsBlocked)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Fetched(_) => "fetched",
            FetchOutcome::RateLimited => "rate_limited",
            FetchOutcome::RobotsBlocked => "robots_blocked",
            FetchOutcome::NotFound(_) => "not_found",
            FetchOutcome::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// Classification of one HTTP attempt
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    Success(T),
    Retry(Duration),
    PermanentFailure(String),
}

/// Page source used by discovery and collection
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str, data_type: &str, platform: &str) -> FetchOutcome;
}

/// Shared page fetcher handle
pub type SharedFetcher = Arc<dyn PageFetcher>;

struct RawResponse {
    status: u16,
    final_url: String,
    content_type: Option<String>,
    body: String,
}

/// Fetcher enforcing rate limits, robots.txt and field filtering
pub struct CompliantFetcher {
    client: Client,
    config: PolitenessConfig,
    rate_limiter: Arc<RateLimiter>,
    robots: Arc<RobotsPolicyCache>,
    provenance: Arc<dyn ProvenanceStore>,
}

impl CompliantFetcher {
    pub fn new(config: PolitenessConfig) -> Result<Self, NetError> {
        let client = create_client(&config)?;
        let robots = Arc::new(RobotsPolicyCache::new(client.clone(), &config));
        let rate_limiter = Arc::new(RateLimiter::from_config(&config));

        Ok(Self {
            client,
            config,
            rate_limiter,
            robots,
            provenance: Arc::new(InMemoryProvenance::new()),
        })
    }

    /// Use a caller-supplied provenance store
    pub fn with_provenance(mut self, provenance: Arc<dyn ProvenanceStore>) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn robots(&self) -> &RobotsPolicyCache {
        &self.robots
    }

    pub fn provenance(&self) -> Arc<dyn ProvenanceStore> {
        Arc::clone(&self.provenance)
    }

    /// Every provenance record so far, in insertion order
    pub fn data_sources(&self) -> Vec<DataSource> {
        self.provenance.all()
    }

    pub fn attribution_report(&self) -> AttributionReport {
        AttributionReport::from_store(self.provenance.as_ref())
    }

    /// Fetch a URL and return its filtered public record
    pub async fn fetch(&self, url: &str, data_type: &str, platform: &str) -> Option<CollectedRecord> {
        self.fetch_outcome(url, data_type, platform)
            .await
            .page()
            .and_then(|page| page.record)
    }

    pub async fn fetch_outcome(&self, url: &str, data_type: &str, platform: &str) -> FetchOutcome {
        let parsed = match parse_http_url(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Skipping {}", e);
                return FetchOutcome::InvalidUrl(url.to_string());
            }
        };
        let domain = domain_key(&parsed);

        // Cheap early exit; the binding check is the reservation in `execute`
        if !self.rate_limiter.allow(&domain) {
            warn!("Rate limit reached for {}; skipping {}", domain, url);
            return FetchOutcome::RateLimited;
        }

        let user_agent = self.config.user_agent.as_str();
        if !self.robots.can_fetch(url, user_agent).await {
            self.provenance
                .record(DataSource::blocked(url, platform, data_type, "robots_txt_blocked"));
            return FetchOutcome::RobotsBlocked;
        }

        let crawl_delay = self.robots.crawl_delay(url, user_agent).await;
        let spacing = Duration::from_secs_f64(
            crawl_delay
                .max(self.config.min_request_delay_secs)
                .clamp(0.0, MAX_SPACING_SECS),
        );

        let raw = match self.execute(&domain, url, spacing).await {
            Ok(raw) => raw,
            Err(outcome) => return outcome,
        };

        let kind = ContentKind::from_content_type(raw.content_type.as_deref());
        let source_type = match kind {
            ContentKind::Json => SourceType::PublicApi,
            _ => SourceType::PublicWebpage,
        };
        let record = self.build_record(url, platform, kind, source_type, &raw.body);

        self.provenance
            .record(DataSource::public(url, platform, data_type, source_type));
        info!("Fetched {} ({})", url, raw.status);

        FetchOutcome::Fetched(FetchedPage {
            status: raw.status,
            requested_url: url.to_string(),
            final_url: raw.final_url,
            content_type: raw.content_type,
            body: raw.body,
            record,
        })
    }

    /// Bounded retry loop; every attempt claims its own rate-limit slot
    async fn execute(&self, domain: &str, url: &str, spacing: Duration) -> Result<RawResponse, FetchOutcome> {
        let max_attempts = self.config.max_retries + 1;
        let mut attempt = 0;

        loop {
            let Some(reservation) = self.rate_limiter.try_reserve(domain, spacing) else {
                warn!("Rate limit reached for {}; skipping {}", domain, url);
                return Err(FetchOutcome::RateLimited);
            };
            reservation.wait().await;

            match self.attempt(url, attempt).await {
                AttemptOutcome::Success(raw) => return Ok(raw),
                AttemptOutcome::PermanentFailure(reason) => {
                    debug!("Giving up on {}: {}", url, reason);
                    return Err(FetchOutcome::NotFound(reason));
                }
                AttemptOutcome::Retry(delay) => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        warn!("Retries exhausted for {}", url);
                        return Err(FetchOutcome::NotFound(format!(
                            "retries exhausted after {} attempts",
                            max_attempts
                        )));
                    }
                    debug!("Retrying {} in {:?} (attempt {}/{})", url, delay, attempt + 1, max_attempts);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt(&self, url: &str, attempt: u32) -> AttemptOutcome<RawResponse> {
        debug!("GET {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request to {} failed: {}", url, e);
                return AttemptOutcome::Retry(self.backoff(attempt));
            }
        };

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_retry_after(v, Utc::now()));

        match classify_status(status) {
            StatusClass::Ok => {}
            StatusClass::Permanent => {
                return AttemptOutcome::PermanentFailure(format!("not found ({})", status.as_u16()));
            }
            StatusClass::Throttled => {
                let max = Duration::from_secs(self.config.max_retry_after_secs);
                let delay = retry_after.map(|d| d.min(max)).unwrap_or_else(|| self.backoff(attempt));
                warn!("{} answered 429; waiting {:?}", url, delay);
                return AttemptOutcome::Retry(delay);
            }
            StatusClass::Transient => {
                warn!("{} answered {}", url, status);
                return AttemptOutcome::Retry(self.backoff(attempt));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match read_body_limited(response, self.config.max_body_bytes).await {
            Ok(body) => AttemptOutcome::Success(RawResponse {
                status: status.as_u16(),
                final_url,
                content_type,
                body,
            }),
            Err(e) => {
                warn!("Reading body of {} failed: {}", url, e);
                AttemptOutcome::Retry(self.backoff(attempt))
            }
        }
    }

    /// Exponential backoff with jitter
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.backoff_base_ms;
        let exp = base.saturating_mul(1u64 << attempt.min(10));
        let jitter = rand::thread_rng().gen_range(0..=base / 4);
        Duration::from_millis(exp.saturating_add(jitter))
    }

    fn build_record(
        &self,
        url: &str,
        platform: &str,
        kind: ContentKind,
        source_type: SourceType,
        body: &str,
    ) -> Option<CollectedRecord> {
        let fields = match kind {
            ContentKind::Json => match extract_json_fields(body) {
                Ok(fields) => fields,
                Err(e) => {
                    error!("Failed to parse payload from {}: {}", url, e);
                    return None;
                }
            },
            ContentKind::Html => extract_html_fields(body),
            ContentKind::Other => {
                debug!("Unsupported content type at {}", url);
                return None;
            }
        };

        let (fields, sensitivity) = filter_public_fields(fields, platform);
        Some(CollectedRecord {
            url: url.to_string(),
            platform: platform.to_string(),
            source_type,
            fields,
            sensitivity,
            collected_at: Utc::now(),
        })
    }
}

#[async_trait]
impl PageFetcher for CompliantFetcher {
    async fn fetch_page(&self, url: &str, data_type: &str, platform: &str) -> FetchOutcome {
        self.fetch_outcome(url, data_type, platform).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
    Ok,
    Throttled,
    Transient,
    Permanent,
}

fn classify_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Ok
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        StatusClass::Throttled
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        StatusClass::Transient
    } else {
        StatusClass::Permanent
    }
}

/// Parse a Retry-After value: delta seconds or an HTTP date
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}
