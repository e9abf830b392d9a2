// src/core/scanner/dns_scanner.rs

use std::collections::BTreeSet;
use std::net::IpAddr;

use async_trait::async_trait;
use futures::future::join_all;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::core::models::{FindingRecord, Section, SectionFailure};
use crate::core::scanner::providers::FindingProvider;
use crate::core::scanner::target::Target;

/// The host's own resolver configuration (`/etc/resolv.conf` and friends).
/// Falls back to the built-in public upstreams when that cannot be read.
fn system_resolver() -> TokioAsyncResolver {
    TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
        warn!(error = %e, "System resolver configuration unavailable, using public DNS.");
        TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
    })
}

/// Strips a leading `www.` so the wordlist is tried against the registrable name.
fn root_domain(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Enumerates subdomains by resolving each word of a wordlist under the target.
pub struct SubdomainResolver {
    words: Vec<String>,
    resolver: TokioAsyncResolver,
}

impl SubdomainResolver {
    pub fn new(words: Vec<String>) -> Self {
        Self { words, resolver: system_resolver() }
    }

    /// The addresses `name` resolves to, or `None` when it does not resolve.
    async fn resolve(&self, name: &str) -> Option<BTreeSet<IpAddr>> {
        match self.resolver.lookup_ip(name).await {
            Ok(lookup) => {
                let ips: BTreeSet<IpAddr> = lookup.iter().collect();
                (!ips.is_empty()).then_some(ips)
            }
            Err(e) => {
                debug!(subdomain = %name, error = %e, "Subdomain does not resolve.");
                None
            }
        }
    }
}

#[async_trait]
impl FindingProvider for SubdomainResolver {
    fn section(&self) -> Section {
        Section::Subdomains
    }

    async fn scan(&self, target: &Target) -> FindingRecord {
        let root = root_domain(target.host());
        info!(target = %root, words = self.words.len(), "Starting subdomain enumeration.");

        // A label nobody registered only resolves under a wildcard record.
        let canary = format!("{:016x}.{root}", rand::random::<u64>());
        let wildcard = self.resolve(&canary).await;
        if let Some(ips) = &wildcard {
            warn!(target = %root, addresses = ips.len(), "Wildcard DNS detected, matching candidates are discarded.");
        }

        let candidates: Vec<String> = self.words.iter().map(|w| format!("{w}.{root}")).collect();
        let resolved = join_all(candidates.iter().map(|name| self.resolve(name))).await;
        let found = distinct_from_wildcard(candidates.iter().zip(resolved), wildcard.as_ref());

        info!(found = found.len(), wildcard = wildcard.is_some(), "Subdomain enumeration finished.");
        json!({
            "status": if found.is_empty() { "secure" } else { "found" },
            "found_subdomains": found,
            "total_tested": self.words.len(),
            "wildcard_dns": wildcard.is_some(),
            "recommendation": if found.is_empty() {
                "No additional subdomains found"
            } else {
                "Monitor all subdomains for security issues"
            },
        })
    }
}

/// Keeps the candidates that resolved, dropping those whose address set is
/// exactly the wildcard's. Order follows the input.
fn distinct_from_wildcard<'a, I>(resolved: I, wildcard: Option<&BTreeSet<IpAddr>>) -> Vec<&'a String>
where
    I: IntoIterator<Item = (&'a String, Option<BTreeSet<IpAddr>>)>,
{
    resolved
        .into_iter()
        .filter_map(|(name, ips)| {
            let ips = ips?;
            if wildcard.is_some_and(|w| *w == ips) {
                debug!(subdomain = %name, "Subdomain only matches the wildcard record.");
                return None;
            }
            debug!(subdomain = %name, "Subdomain resolves.");
            Some(name)
        })
        .collect()
}

/// Resolves the target to its address. Location, ISP and threat data need an
/// external intelligence source and are reported as unknown.
pub struct GeoIpResolver {
    resolver: TokioAsyncResolver,
}

impl GeoIpResolver {
    pub fn new() -> Self {
        Self { resolver: system_resolver() }
    }
}

impl Default for GeoIpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FindingProvider for GeoIpResolver {
    fn section(&self) -> Section {
        Section::Geoip
    }

    async fn scan(&self, target: &Target) -> FindingRecord {
        let host = target.host();
        info!(target = %host, "Resolving target address.");

        // IP literals need no lookup.
        if let Ok(ip) = host.trim_matches(|c| c == '[' || c == ']').parse::<std::net::IpAddr>() {
            return geoip_record(&ip.to_string());
        }

        match self.resolver.lookup_ip(host).await {
            Ok(ips) => match ips.iter().next() {
                Some(ip) => {
                    debug!(ip = %ip, "Target resolved.");
                    geoip_record(&ip.to_string())
                }
                None => {
                    warn!(target = %host, "Lookup returned no addresses.");
                    json!(SectionFailure::new(format!("no address records for {host}")))
                }
            },
            Err(e) => {
                warn!(target = %host, error = %e, "Address lookup failed.");
                json!(SectionFailure::new(format!("DNS Error: {e}")))
            }
        }
    }
}

fn geoip_record(ip: &str) -> FindingRecord {
    json!({
        "status": "resolved",
        "ip": ip,
        "location": "Unknown",
        "isp": "Unknown",
        "threat_level": "Unknown",
        "threat_description": "No threat intelligence source configured",
    })
}
