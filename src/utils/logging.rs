use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

pub const CLI_PREFIX: &str = "cli";

/// Installs the global subscriber. Logs always go into daily files under `<dir>/logs`, stdout
/// only receives them when `show_std` is set.
pub fn enable_logging(
    prefix: &str,
    application_data_path: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(prefix)
        .build(application_data_path.join("logs"))?;

    let stdout = std::io::stdout.with_filter(move |_| show_std);

    let target = env!("CARGO_PKG_NAME").replace("-", "_");
    // An explicit level wins, otherwise RUST_LOG directives are taken as they are.
    let filter = match log_level {
        Some(level) => EnvFilter::new(format!("{target}={level}")),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{target}=info"))),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stdout.and(appender))
        .pretty()
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
