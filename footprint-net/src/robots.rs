//! robots.txt policy
//!
//! A small parser for user-agent groups with allow/disallow rules
//! (longest match wins, `*` and `$` supported) and Crawl-delay, plus a
//! per-domain TTL cache. Each domain has its own async lock held across
//! the fetch, so concurrent callers trigger at most one fetch per TTL.

use dashmap::DashMap;
use footprint_core::PolitenessConfig;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::{domain_key, parse_http_url, robots_url};

/// Largest robots.txt body we parse
const MAX_ROBOTS_BYTES: usize = 512 * 1024;

#[derive(Debug, Clone, PartialEq)]
struct PathRule {
    pattern: String,
    allow: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct RobotsGroup {
    agents: Vec<String>,
    rules: Vec<PathRule>,
    crawl_delay: Option<f64>,
}

/// Parsed robots.txt rule set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsRules {
    groups: Vec<RobotsGroup>,
}

impl RobotsRules {
    /// Rule set that allows everything (used when robots.txt is unavailable)
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn parse(body: &str) -> Self {
        let mut groups: Vec<RobotsGroup> = Vec::new();
        let mut current: Option<RobotsGroup> = None;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    let in_header = current
                        .as_ref()
                        .map(|g| g.rules.is_empty() && g.crawl_delay.is_none())
                        .unwrap_or(false);
                    if !in_header {
                        if let Some(group) = current.take() {
                            groups.push(group);
                        }
                        current = Some(RobotsGroup::default());
                    }
                    if let Some(group) = current.as_mut() {
                        group.agents.push(value.to_lowercase());
                    }
                }
                "allow" | "disallow" => {
                    let Some(group) = current.as_mut() else {
                        continue;
                    };
                    // An empty Disallow allows everything
                    if value.is_empty() {
                        continue;
                    }
                    group.rules.push(PathRule {
                        pattern: value.to_string(),
                        allow: key == "allow",
                    });
                }
                "crawl-delay" => {
                    if let (Some(group), Ok(delay)) = (current.as_mut(), value.parse::<f64>()) {
                        if delay.is_finite() && delay >= 0.0 {
                            group.crawl_delay = Some(delay);
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some(group) = current {
            groups.push(group);
        }

        Self { groups }
    }

    /// The group addressing this user agent: a named group whose token
    /// appears in the agent string, else the `*` group
    fn group_for(&self, user_agent: &str) -> Option<&RobotsGroup> {
        let agent = user_agent.to_lowercase();

        let named = self
            .groups
            .iter()
            .filter_map(|g| {
                g.agents
                    .iter()
                    .filter(|a| a.as_str() != "*" && !a.is_empty() && agent.contains(a.as_str()))
                    .map(|a| a.len())
                    .max()
                    .map(|len| (len, g))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, g)| g);

        named.or_else(|| self.groups.iter().find(|g| g.agents.iter().any(|a| a == "*")))
    }

    /// Whether `path` (path plus optional query) may be fetched
    pub fn is_allowed(&self, path: &str, user_agent: &str) -> bool {
        if path == "/robots.txt" {
            return true;
        }
        let Some(group) = self.group_for(user_agent) else {
            return true;
        };

        let mut best: Option<(usize, bool)> = None;
        for rule in &group.rules {
            if !pattern_matches(&rule.pattern, path) {
                continue;
            }
            let len = rule.pattern.len();
            best = match best {
                Some((best_len, best_allow)) if best_len > len || (best_len == len && best_allow) => {
                    Some((best_len, best_allow))
                }
                _ => Some((len, rule.allow)),
            };
        }

        best.map(|(_, allow)| allow).unwrap_or(true)
    }

    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        self.group_for(user_agent).and_then(|g| g.crawl_delay)
    }
}

/// Match a robots path pattern supporting `*` wildcards and a trailing `$`
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };

    let parts: Vec<&str> = pattern.split('*').collect();
    let first = parts[0];
    if !path.starts_with(first) {
        return false;
    }
    if parts.len() == 1 {
        return !anchored || path.len() == first.len();
    }

    let mut pos = first.len();
    for (i, part) in parts.iter().enumerate().skip(1) {
        let last = i == parts.len() - 1;
        if last && anchored {
            return path.len() >= pos + part.len() && path.ends_with(part);
        }
        match path[pos..].find(part) {
            Some(idx) => pos += idx + part.len(),
            None => return false,
        }
    }
    true
}

/// Cached rule set for one domain
#[derive(Debug, Clone)]
pub struct RobotsCacheEntry {
    pub rules: Arc<RobotsRules>,
    pub expires_at: Instant,
}

/// TTL cache of robots.txt policies, one entry per domain
pub struct RobotsPolicyCache {
    client: Client,
    ttl: Duration,
    default_crawl_delay: f64,
    enabled: bool,
    entries: DashMap<String, Arc<Mutex<Option<RobotsCacheEntry>>>>,
}

impl RobotsPolicyCache {
    pub fn new(client: Client, config: &PolitenessConfig) -> Self {
        Self {
            client,
            ttl: config.robots_ttl(),
            default_crawl_delay: config.default_crawl_delay_secs.max(0.0),
            enabled: config.respect_robots_txt,
            entries: DashMap::new(),
        }
    }

    /// Whether `url` may be fetched by `user_agent`; fails open
    pub async fn can_fetch(&self, url: &str, user_agent: &str) -> bool {
        if !self.enabled {
            return true;
        }
        let Ok(parsed) = parse_http_url(url) else {
            return false;
        };

        let mut path = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            path.push('?');
            path.push_str(query);
        }

        let allowed = self.rules_for(&parsed).await.is_allowed(&path, user_agent);
        if !allowed {
            info!("robots.txt disallows {}", url);
        }
        allowed
    }

    /// Declared Crawl-delay for the URL's domain, or the configured default
    pub async fn crawl_delay(&self, url: &str, user_agent: &str) -> f64 {
        if !self.enabled {
            return self.default_crawl_delay;
        }
        let Ok(parsed) = parse_http_url(url) else {
            return self.default_crawl_delay;
        };

        self.rules_for(&parsed)
            .await
            .crawl_delay(user_agent)
            .unwrap_or(self.default_crawl_delay)
    }

    /// Number of domains with a cache slot
    pub fn cached_domains(&self) -> usize {
        self.entries.len()
    }

    async fn rules_for(&self, url: &Url) -> Arc<RobotsRules> {
        let key = domain_key(url);
        let slot = Arc::clone(&self.entries.entry(key.clone()).or_default());

        let mut entry = slot.lock().await;
        if let Some(cached) = entry.as_ref() {
            if cached.expires_at > Instant::now() {
                return Arc::clone(&cached.rules);
            }
            debug!("robots.txt cache expired for {}", key);
        }

        let rules = Arc::new(self.fetch_rules(url).await);
        *entry = Some(RobotsCacheEntry {
            rules: Arc::clone(&rules),
            expires_at: Instant::now() + self.ttl,
        });
        rules
    }

    async fn fetch_rules(&self, url: &Url) -> RobotsRules {
        let location = robots_url(url);
        debug!("Fetching {}", location);

        let response = match self.client.get(&location).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("robots.txt fetch failed for {}: {}; allowing all", location, e);
                return RobotsRules::allow_all();
            }
        };

        if !response.status().is_success() {
            warn!(
                "robots.txt at {} returned {}; allowing all",
                location,
                response.status()
            );
            return RobotsRules::allow_all();
        }

        match crate::read_body_limited(response, MAX_ROBOTS_BYTES).await {
            Ok(body) => RobotsRules::parse(&body),
            Err(e) => {
                warn!("robots.txt body unreadable at {}: {}; allowing all", location, e);
                RobotsRules::allow_all()
            }
        }
    }
}
