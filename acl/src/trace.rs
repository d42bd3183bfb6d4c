use tracing::Level;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, util::TryInitError, EnvFilter};

use crate::args::LogFormat;

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
/// Events go to stderr so command output on stdout stays clean.
pub fn setup_tracing(level: Level, format: LogFormat) -> Result<(), TryInitError> {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
    });

    let registry = tracing_subscriber::registry().with(filter_layer);

    match format {
        LogFormat::Full => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    }
}
