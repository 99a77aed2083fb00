use std::io;

use tracing::error;
use tracing_subscriber::EnvFilter;
use wqi_mcp::{Transport, WqiServer};

fn main() -> io::Result<()> {
    let filter = EnvFilter::try_from_env("WQI_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let server = WqiServer::from_env().map_err(|err| {
        error!(error = %err, "failed to start wqi-mcp");
        io::Error::new(io::ErrorKind::InvalidInput, err)
    })?;
    match server.config().transport {
        Transport::Stdio => server.serve_stdio(),
        Transport::Http => {
            let addr = server.config().http_addr.clone();
            server.serve_http(&addr)
        }
    }
}
