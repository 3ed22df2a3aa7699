use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "bookkeeping_core=info";

/// Installs the global fmt subscriber. `RUST_LOG` wins over `fallback`,
/// which wins over the crate default. A subscriber installed earlier by the
/// host is left in place.
pub fn init_tracing(fallback: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = fmt().with_env_filter(filter).try_init();
}
