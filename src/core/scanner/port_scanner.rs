// src/core/scanner/port_scanner.rs

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::core::models::{FindingRecord, Section};
use crate::core::scanner::providers::{service_for_port, FindingProvider};
use crate::core::scanner::target::Target;

/// TCP connect probe over a fixed port list. A port counts as open when the
/// handshake completes within the per-port timeout.
pub struct TcpPortProbe {
    ports: Vec<u16>,
    timeout: Duration,
}

impl TcpPortProbe {
    pub fn new(ports: Vec<u16>, timeout_ms: u64) -> Self {
        Self { ports, timeout: Duration::from_millis(timeout_ms) }
    }

    async fn is_open(&self, host: &str, port: u16) -> bool {
        match timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_)) => {
                debug!(host, port, "Port open.");
                true
            }
            Ok(Err(e)) => {
                debug!(host, port, error = %e, "Port closed.");
                false
            }
            Err(_) => {
                debug!(host, port, "Port probe timed out.");
                false
            }
        }
    }
}

#[async_trait]
impl FindingProvider for TcpPortProbe {
    fn section(&self) -> Section {
        Section::Ports
    }

    async fn scan(&self, target: &Target) -> FindingRecord {
        let host = target.host().trim_matches(|c| c == '[' || c == ']');
        info!(target = %host, ports = self.ports.len(), "Starting port probe.");

        let probes = self.ports.iter().map(|port| self.is_open(host, *port));
        let states = join_all(probes).await;

        let open_ports: Vec<_> = self
            .ports
            .iter()
            .zip(states)
            .filter(|(_, open)| *open)
            .map(|(port, _)| json!({"port": port, "service": service_for_port(*port)}))
            .collect();

        info!(open = open_ports.len(), "Port probe finished.");
        json!({
            "status": if open_ports.is_empty() { "secure" } else { "open_ports_found" },
            "total_scanned": self.ports.len(),
            "recommendation": if open_ports.is_empty() {
                "No unnecessary open ports found"
            } else {
                "Close unnecessary ports and secure services"
            },
            "open_ports": open_ports,
        })
    }
}
