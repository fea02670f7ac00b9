use std::net::SocketAddr;

use serde::Deserialize;
use tripmeter_core::error::{Result, TripmeterError};
use tripmeter_core::metrics::{Buckets, DEFAULT_BUCKETS};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TripmeterError::UnsupportedVersion);
        }
        self.server.validate()?;
        self.metrics.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Allow any origin, method and header (matches the stock `cors()` setup).
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            cors_permissive: default_cors_permissive(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            TripmeterError::BadRequest(format!(
                "server.listen must be a valid socket address ({}): {e}",
                self.listen
            ))
        })
    }

    /// Replace the port of `listen`, keeping its host.
    pub fn override_port(&mut self, port: u16) -> Result<()> {
        let mut addr = self.listen_addr()?;
        addr.set_port(port);
        self.listen = addr.to_string();
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:3001".into()
}
fn default_cors_permissive() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Request duration bucket bounds, in seconds.
    #[serde(default = "default_buckets")]
    pub buckets: Vec<f64>,

    #[serde(default = "default_requests_total")]
    pub requests_total: String,

    #[serde(default = "default_errors_total")]
    pub errors_total: String,

    #[serde(default = "default_request_duration")]
    pub request_duration: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            buckets: default_buckets(),
            requests_total: default_requests_total(),
            errors_total: default_errors_total(),
            request_duration: default_request_duration(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        self.buckets()?;
        let names = [&self.requests_total, &self.errors_total, &self.request_duration];
        for (i, n) in names.iter().enumerate() {
            if n.is_empty() {
                return Err(TripmeterError::BadRequest("metric names must not be empty".into()));
            }
            if names[..i].contains(n) {
                return Err(TripmeterError::BadRequest(format!(
                    "metric name {n} is used twice"
                )));
            }
        }
        Ok(())
    }

    pub fn buckets(&self) -> Result<Buckets> {
        Buckets::new(&self.buckets)
    }
}

fn default_buckets() -> Vec<f64> {
    DEFAULT_BUCKETS.to_vec()
}
fn default_requests_total() -> String {
    "http_requests_total".into()
}
fn default_errors_total() -> String {
    "http_error_count".into()
}
fn default_request_duration() -> String {
    "http_request_duration_seconds".into()
}
