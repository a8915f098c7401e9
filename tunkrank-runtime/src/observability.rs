use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;
use tunkrank_common::error::{TunkRankError, TunkRankResult};

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Installs the global metrics recorder and serves `/metrics` on `addr`.
pub fn init_prometheus(addr: SocketAddr) -> TunkRankResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| TunkRankError::Internal(format!("prometheus init: {e}")))
}
