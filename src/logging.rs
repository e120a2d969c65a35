use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

/// Default directives when `RUST_LOG` is unset. HTTP request spans from the
/// server's trace layer stay at `info`.
const DEFAULT_FILTER: &str = "info,tower_http=info";

/// Installs the stderr subscriber. Stdout is reserved for command output.
pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    tracing::debug!(
        backend = crate::backend::is_backend_configured(),
        "logging initialized"
    );
    Ok(())
}
