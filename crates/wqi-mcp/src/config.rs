use std::path::PathBuf;

use wqi_catalog::{Catalog, CatalogError, SPRINGS_SET};

pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_MAX_BATCH_ROWS: usize = 100_000;
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;
const MIN_BODY_BYTES: usize = 1024;
const MAX_BODY_BYTES: usize = 256 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub transport: Transport,
    pub http_addr: String,
    pub default_set: String,
    pub parameter_sets_file: Option<PathBuf>,
    pub max_batch_rows: usize,
    /// Largest request body accepted on either transport.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Stdio,
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            default_set: SPRINGS_SET.to_string(),
            parameter_sets_file: None,
            max_batch_rows: DEFAULT_MAX_BATCH_ROWS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Reads `WQID_TRANSPORT`, `WQI_HTTP_ADDR`, `WQI_DEFAULT_SET`,
    /// `WQI_PARAMETER_SETS`, `WQI_MAX_BATCH_ROWS` and `WQI_MAX_BODY_BYTES`.
    pub fn from_env() -> Result<Self, String> {
        let transport = match env_trimmed("WQID_TRANSPORT")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("stdio") => Transport::Stdio,
            Some("http") => Transport::Http,
            Some(other) => {
                return Err(format!(
                    "WQID_TRANSPORT must be stdio or http, got `{other}`"
                ))
            }
        };
        let defaults = Self::default();
        Ok(Self {
            transport,
            http_addr: env_trimmed("WQI_HTTP_ADDR").unwrap_or(defaults.http_addr),
            default_set: env_trimmed("WQI_DEFAULT_SET").unwrap_or(defaults.default_set),
            parameter_sets_file: env_trimmed("WQI_PARAMETER_SETS").map(PathBuf::from),
            max_batch_rows: env_usize("WQI_MAX_BATCH_ROWS", DEFAULT_MAX_BATCH_ROWS, 1, 1_000_000),
            max_body_bytes: env_usize(
                "WQI_MAX_BODY_BYTES",
                DEFAULT_MAX_BODY_BYTES,
                MIN_BODY_BYTES,
                MAX_BODY_BYTES,
            ),
        })
    }

    /// Built-in sets, overlaid with the configured catalog file if any.
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog::builtin()?;
        if let Some(path) = &self.parameter_sets_file {
            catalog.load_json_file(path)?;
        }
        Ok(catalog)
    }
}

fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_usize(name: &str, default: usize, min: usize, max: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}
