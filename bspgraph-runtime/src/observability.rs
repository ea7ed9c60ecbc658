use bspgraph_common::error::{BspError, BspResult};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Serves `/metrics` on `addr`. Must be called inside a tokio runtime.
pub fn init_prometheus(addr: SocketAddr) -> BspResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| BspError::Internal(format!("prometheus init: {e}")))
}
