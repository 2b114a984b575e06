//! Tracing subscriber setup for process bootstrap events.

use hybrid_rag_config::{LogFormat, LogLevelSetting};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber on stderr.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(level: LogLevelSetting, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
