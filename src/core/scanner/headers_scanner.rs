// src/core/scanner/headers_scanner.rs

use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::core::knowledge_base::{self, NOT_DISCLOSED, SECURITY_HEADERS};
use crate::core::models::HeaderFinding;
use crate::error::{describe_transport_error, Result, ScanError};

const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const MAX_REDIRECTS: usize = 10;

/// Response metadata the grader needs from a fetch.
#[derive(Debug, Clone)]
pub struct HttpResponseMeta {
    pub status: StatusCode,
    pub final_url: String,
    pub headers: HeaderMap,
}

/// Picks the client identity for each request from a fixed pool.
pub struct UserAgentPool {
    agents: Vec<String>,
    rng: Mutex<StdRng>,
}

impl UserAgentPool {
    /// A seeded pool yields the same sequence on every run.
    pub fn new(agents: Vec<String>, seed: Option<u64>) -> Result<Self> {
        if agents.is_empty() {
            return Err(ScanError::Config("user agent pool is empty".into()));
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self { agents, rng: Mutex::new(rng) })
    }

    pub fn choose(&self) -> String {
        // A poisoned lock still holds a usable RNG.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.agents
            .choose(&mut *rng)
            .cloned()
            .unwrap_or_default()
    }

    pub fn agents(&self) -> &[String] {
        &self.agents
    }
}

/// Issues the single HEAD request a header scan is based on.
pub struct HeaderFetcher {
    client: reqwest::Client,
    user_agents: UserAgentPool,
    retry_transient: bool,
}

impl HeaderFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(settings.fetch_timeout_secs))
            .build()
            .map_err(|e| {
                error!(error = %e, "Failed to build HTTP client for headers scan.");
                ScanError::Config(format!("Failed to build HTTP client: {}", e))
            })?;
        let user_agents = UserAgentPool::new(settings.user_agents.clone(), settings.user_agent_seed)?;
        Ok(Self { client, user_agents, retry_transient: settings.retry_transient })
    }

    pub fn user_agents(&self) -> &UserAgentPool {
        &self.user_agents
    }

    /// Fetches the response headers for a header scan.
    ///
    /// Sends a single HEAD request with a user agent drawn from the pool,
    /// following up to ten redirects within the configured timeout. When
    /// `retry_transient` is set, a timeout or connect error is retried once.
    ///
    /// # Arguments
    /// * `url` - The normalized target URL, scheme included.
    ///
    /// # Returns
    /// The final response's status, URL and headers. HTTP error statuses are
    /// returned like any other response; DNS, TCP, TLS, timeout and redirect
    /// failures become `ScanError::Transport` carrying the cause chain.
    pub async fn fetch(&self, url: &str) -> Result<HttpResponseMeta> {
        match self.fetch_once(url).await {
            Err(e) if self.retry_transient && is_transient(&e) => {
                warn!(url, error = %e, "Transient failure fetching headers, retrying once.");
                self.fetch_once(url).await.map_err(|e| ScanError::Transport(describe_transport_error(&e)))
            }
            other => other.map_err(|e| ScanError::Transport(describe_transport_error(&e))),
        }
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<HttpResponseMeta, reqwest::Error> {
        let user_agent = self.user_agents.choose();
        debug!(url, user_agent = %user_agent, "Sending HEAD request.");

        let response = self
            .client
            .head(url)
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, ACCEPT_VALUE)
            .send()
            .await?;

        info!(status = %response.status(), final_url = %response.url(), "Received HTTP response for headers scan.");
        Ok(HttpResponseMeta {
            status: response.status(),
            final_url: response.url().to_string(),
            headers: response.headers().clone(),
        })
    }
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}

/// Reads one header by case-insensitive name. Values that are not valid UTF-8
/// still count as present.
fn check_header(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?;
    match value.to_str() {
        Ok(s) => {
            debug!(header_name = name, value = s, "Header found.");
            Some(s.to_string())
        }
        Err(_) => {
            warn!(header_name = name, "Header found but contained invalid UTF-8.");
            Some("[Invalid UTF-8]".to_string())
        }
    }
}

/// Grades a response's headers against the fixed security header set.
///
/// Each present header adds its weight to the score and the total maps to a
/// letter grade. Lookup is case-insensitive (`HeaderMap` normalizes names)
/// while findings use the canonical spelling. Pure: no I/O, same input, same
/// finding.
///
/// # Arguments
/// * `headers` - The response headers, as returned by `HeaderFetcher::fetch`.
///
/// # Returns
/// A `HeaderFinding` whose found and missing lists partition the header set,
/// with the score, grade, its explanation and one recommendation per
/// missing header.
pub fn grade(headers: &HeaderMap) -> HeaderFinding {
    let mut found_headers = Map::new();
    let mut missing_headers = Vec::new();
    let mut score: u8 = 0;

    for header in SECURITY_HEADERS {
        match check_header(headers, header.name) {
            Some(value) => {
                score += header.weight;
                found_headers.insert(header.name.to_string(), Value::String(value));
            }
            None => {
                debug!(header_name = header.name, "Header not found.");
                missing_headers.push(header.name.to_string());
            }
        }
    }

    let recommendations = missing_headers
        .iter()
        .filter_map(|name| knowledge_base::remediation_for(name))
        .map(str::to_string)
        .collect();

    let security_grade = knowledge_base::grade_for_score(score);
    debug!(score, grade = %security_grade, "Header grading complete.");

    HeaderFinding {
        status: "success",
        found_headers,
        missing_headers,
        server_info: check_header(headers, "server").unwrap_or_else(|| NOT_DISCLOSED.to_string()),
        powered_by: check_header(headers, "x-powered-by").unwrap_or_else(|| NOT_DISCLOSED.to_string()),
        security_grade,
        score,
        grade_explanation: knowledge_base::grade_explanation(security_grade).to_string(),
        recommendations,
    }
}

/// Grades a plain list of `(name, value)` pairs. Pairs whose name or value is
/// not a legal HTTP header are skipped.
pub fn grade_pairs<'a, I>(pairs: I) -> HeaderFinding
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => warn!(header_name = name, "Skipping header that is not valid HTTP."),
        }
    }
    grade(&headers)
}
