//! robots.txt fetching and evaluation for polite scraping.
//!
//! Supports `User-agent` groups, `Allow` / `Disallow` rules with `*` and `$`
//! patterns, and longest-match precedence (ties go to `Allow`). An unreachable
//! or missing robots.txt allows everything; a 401, 403 or 5xx answer denies
//! everything.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::HttpClient;
use super::error::FetchError;
use crate::user_agent;

/// Result of checking a URL against robots.txt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotsDecision {
    /// URL is allowed.
    Allowed,
    /// URL is disallowed by robots.txt.
    Disallowed,
}

/// Decides whether the tool may fetch a URL.
///
/// Injected into the scrape pipeline so robots handling can be swapped out
/// (or switched off with [`AllowAll`]).
#[async_trait]
pub trait RobotsPolicy: Send + Sync + std::fmt::Debug {
    /// Checks `url` against the policy.
    async fn check(&self, url: &Url) -> RobotsDecision;
}

/// Policy used with `--no-robots`: everything is allowed.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

#[async_trait]
impl RobotsPolicy for AllowAll {
    async fn check(&self, _url: &Url) -> RobotsDecision {
        RobotsDecision::Allowed
    }
}

/// Policy that fetches `/robots.txt` from the URL's origin.
#[derive(Debug, Clone)]
pub struct HttpRobotsPolicy {
    client: HttpClient,
    agent_token: String,
}

impl HttpRobotsPolicy {
    /// Creates a policy matching groups against the client's User-Agent token.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        let agent_token = user_agent::product_token(client.user_agent());
        Self {
            client,
            agent_token,
        }
    }

    /// Product token robots.txt groups are matched against.
    #[must_use]
    pub fn agent_token(&self) -> &str {
        &self.agent_token
    }

    /// Fetches and parses robots.txt for the URL's origin.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of the robots.txt request, or
    /// [`FetchError::InvalidUrl`] when `url` has no host.
    pub async fn fetch_rules(&self, url: &Url) -> Result<RobotsRules, FetchError> {
        let robots_url = robots_url_for(url).ok_or_else(|| FetchError::invalid_url(url.as_str()))?;
        let body = self.client.fetch_text(&robots_url).await?;
        Ok(RobotsRules::parse(&body))
    }
}

/// Decision when robots.txt could not be read.
///
/// 401/403 mean the site restricts crawlers; 5xx means the rules are
/// temporarily unknown. Both deny everything. Network failures, timeouts and
/// other statuses (404 and friends) allow everything.
fn decision_without_rules(error: &FetchError) -> RobotsDecision {
    match error {
        FetchError::HttpStatus {
            status: 401 | 403 | 500..=599,
            ..
        } => {
            warn!(error = %error, "robots.txt refused; disallowing all");
            RobotsDecision::Disallowed
        }
        _ => {
            info!(error = %error, "robots.txt unavailable; allowing all");
            RobotsDecision::Allowed
        }
    }
}

#[async_trait]
impl RobotsPolicy for HttpRobotsPolicy {
    #[instrument(skip(self), fields(url = %url, agent = %self.agent_token))]
    async fn check(&self, url: &Url) -> RobotsDecision {
        let rules = match self.fetch_rules(url).await {
            Ok(rules) => rules,
            Err(error) => return decision_without_rules(&error),
        };
        let path = path_for_matching(url);
        if rules.is_allowed(&self.agent_token, &path) {
            debug!(path = %path, "robots.txt allows path");
            RobotsDecision::Allowed
        } else {
            warn!(path = %path, "robots.txt disallows path");
            RobotsDecision::Disallowed
        }
    }
}

/// Parsed robots.txt rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    groups: Vec<Group>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    allow: bool,
    pattern: String,
}

impl RobotsRules {
    /// Parses a robots.txt body. Unknown directives and malformed lines are ignored.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let mut groups = Vec::new();
        let mut current: Option<Group> = None;
        let mut last_was_agent = false;

        for raw_line in body.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !last_was_agent {
                        groups.extend(current.take());
                        current = Some(Group::default());
                    }
                    if let Some(group) = current.as_mut() {
                        group.agents.push(value.to_ascii_lowercase());
                    }
                    last_was_agent = true;
                }
                "allow" | "disallow" => {
                    last_was_agent = false;
                    // Empty `Disallow:` allows everything, which is the default anyway.
                    if value.is_empty() {
                        continue;
                    }
                    if let Some(group) = current.as_mut() {
                        let rule = Rule {
                            allow: key == "allow",
                            pattern: normalize_pattern(value),
                        };
                        if !group.rules.contains(&rule) {
                            group.rules.push(rule);
                        }
                    }
                }
                _ => last_was_agent = false,
            }
        }
        groups.extend(current);

        Self { groups }
    }

    /// Whether `agent_token` may fetch `path` (path plus optional `?query`).
    #[must_use]
    pub fn is_allowed(&self, agent_token: &str, path: &str) -> bool {
        if path == "/robots.txt" {
            return true;
        }

        let token = agent_token.to_ascii_lowercase();
        let specific: Vec<&Group> = self
            .groups
            .iter()
            .filter(|g| g.agents.iter().any(|a| *a == token))
            .collect();
        let selected = if specific.is_empty() {
            self.groups
                .iter()
                .filter(|g| g.agents.iter().any(|a| a == "*"))
                .collect()
        } else {
            specific
        };

        let mut best: Option<(usize, bool)> = None;
        for rule in selected.iter().flat_map(|g| g.rules.iter()) {
            if !pattern_matches(&rule.pattern, path) {
                continue;
            }
            let len = rule.pattern.len();
            let better = match best {
                None => true,
                Some((best_len, best_allow)) => {
                    len > best_len || (len == best_len && rule.allow && !best_allow)
                }
            };
            if better {
                best = Some((len, rule.allow));
            }
        }

        best.is_none_or(|(_, allow)| allow)
    }
}

/// URL of the robots.txt governing `url` (same scheme, host and port).
#[must_use]
pub fn robots_url_for(url: &Url) -> Option<Url> {
    url.host_str()?;
    url.join("/robots.txt").ok()
}

fn path_for_matching(url: &Url) -> String {
    let path = if url.path().is_empty() { "/" } else { url.path() };
    match url.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    }
}

fn normalize_pattern(pattern: &str) -> String {
    if pattern.starts_with('/') || pattern.starts_with('*') {
        pattern.to_string()
    } else {
        format!("/{pattern}")
    }
}

/// Matches a robots.txt path pattern: prefix match, `*` wildcard, `$` end anchor.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(stripped) => (stripped, true),
        None => (pattern, false),
    };

    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or("");
    let Some(mut rest) = path.strip_prefix(first) else {
        return false;
    };

    let remaining: Vec<&str> = parts.collect();
    if remaining.is_empty() {
        return !anchored || rest.is_empty();
    }

    for (i, part) in remaining.iter().enumerate() {
        if anchored && i == remaining.len() - 1 {
            return rest.ends_with(part);
        }
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    true
}
