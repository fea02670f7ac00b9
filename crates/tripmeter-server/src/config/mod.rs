//! Server config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use tripmeter_core::error::{Result, TripmeterError};

pub use schema::{MetricsSection, ServerConfig, ServerSection};

pub fn load_from_file(path: impl AsRef<Path>) -> Result<ServerConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|e| {
        TripmeterError::Internal(format!("read config {} failed: {e}", path.display()))
    })?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServerConfig> {
    let cfg: ServerConfig = serde_yaml::from_str(s)
        .map_err(|e| TripmeterError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load `path` if it exists, otherwise fall back to built-in defaults.
/// A `PORT` value overrides the port of `server.listen`.
pub fn load_or_default(path: impl AsRef<Path>, port: Option<&str>) -> Result<ServerConfig> {
    let path = path.as_ref();
    let mut cfg = if path.exists() {
        load_from_file(path)?
    } else {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        ServerConfig::default()
    };

    if let Some(port) = port {
        let port: u16 = port
            .parse()
            .map_err(|e| TripmeterError::BadRequest(format!("invalid PORT {port}: {e}")))?;
        cfg.server.override_port(port)?;
    }
    Ok(cfg)
}
